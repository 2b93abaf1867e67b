//! Operation verbs
//!
//! A verb selects which handler of a scheme is run. The set is fixed;
//! anything else is rejected before a handler is looked up.

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Operation requested on a URL
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Verb {
    Read,
    Write,
    Delete,
    List,
    Auth,
    Buckets,
}

impl Verb {
    /// All verbs, in configuration order
    pub const ALL: [Verb; 6] = [
        Verb::Read,
        Verb::Write,
        Verb::Delete,
        Verb::List,
        Verb::Auth,
        Verb::Buckets,
    ];

    /// Configuration key for this verb
    pub const fn as_str(self) -> &'static str {
        match self {
            Verb::Read => "read",
            Verb::Write => "write",
            Verb::Delete => "delete",
            Verb::List => "list",
            Verb::Auth => "auth",
            Verb::Buckets => "buckets",
        }
    }

    /// Whether the handler consumes data on stdin instead of producing it on stdout
    pub const fn is_writable(self) -> bool {
        matches!(self, Verb::Write)
    }
}

impl FromStr for Verb {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Verb::ALL
            .into_iter()
            .find(|verb| verb.as_str() == s)
            .ok_or_else(|| Error::InvalidVerb(s.to_string()))
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
