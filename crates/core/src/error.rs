//! Error types for objio-core
//!
//! Provides a unified error type that can be converted to appropriate exit codes.

use thiserror::Error;

/// Result type alias for objio operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for objio operations
#[derive(Error, Debug)]
pub enum Error {
    /// Verb outside of read/write/delete/list/auth/buckets
    #[error("Invalid verb: {0} (expected one of: read write delete list auth buckets)")]
    InvalidVerb(String),

    /// Scheme has no entry in the configuration
    #[error("{url}: no handler found for scheme '{scheme}' (known: {known})")]
    UnknownScheme {
        url: String,
        scheme: String,
        known: String,
    },

    /// Scheme is configured but the verb is not
    #[error("{url}: no handler found for scheme '{scheme}', verb '{verb}'")]
    UnsupportedVerb {
        url: String,
        scheme: String,
        verb: String,
    },

    /// Handler has neither `cmd` nor `message`
    #[error("{scheme}.{verb}: configuration specifies neither message nor cmd")]
    MissingCommand { scheme: String, verb: String },

    /// `cmd` is neither a string nor a list of strings
    #[error("{scheme}.{verb}: cmd must be a string or a list of strings, found {found}")]
    InvalidCommandType {
        scheme: String,
        verb: String,
        found: String,
    },

    /// Placeholder substitution failed
    #[error("Substitution failed in '{template}': {reason}")]
    Substitution { template: String, reason: String },

    /// The child's stdin/stdout could not be obtained
    #[error("{command}: no stream (open)")]
    StreamUnavailable { command: String },

    /// The child exited with a non-zero status
    #[error("{command}: exit {status}")]
    CommandFailed { command: String, status: i32 },

    /// Unsupported open mode
    #[error("Invalid mode: {0} (expected a mode starting with 'r' or 'w')")]
    InvalidMode(String),

    /// URL parsing error
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Configuration file error
    #[error("Configuration error: {0}")]
    Config(String),

    /// YAML parsing error
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// IO error
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Get the appropriate exit code for this error
    pub const fn exit_code(&self) -> i32 {
        match self {
            Error::InvalidVerb(_) | Error::InvalidMode(_) | Error::InvalidUrl(_) => 2, // UsageError
            Error::Config(_)
            | Error::Yaml(_)
            | Error::MissingCommand { .. }
            | Error::InvalidCommandType { .. }
            | Error::Substitution { .. } => 3, // ConfigError
            Error::CommandFailed { .. } | Error::StreamUnavailable { .. } => 4, // CommandFailed
            Error::UnknownScheme { .. } | Error::UnsupportedVerb { .. } => 5, // UnsupportedFeature
            Error::Io(_) => 1,                                                 // GeneralError
        }
    }

    /// Wrap this error so it can travel through `std::io::Read`/`Write`.
    pub fn into_io(self) -> std::io::Error {
        match self {
            Error::Io(err) => err,
            other => std::io::Error::other(other),
        }
    }

    /// Recover an objio error from an `io::Error` produced by [`Error::into_io`].
    ///
    /// Plain I/O errors come back as [`Error::Io`].
    pub fn from_io(err: std::io::Error) -> Self {
        match err.downcast::<Error>() {
            Ok(inner) => inner,
            Err(err) => Error::Io(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_exit_codes() {
        assert_eq!(Error::InvalidVerb("explode".into()).exit_code(), 2);
        assert_eq!(Error::InvalidMode("x".into()).exit_code(), 2);
        assert_eq!(Error::Config("test".into()).exit_code(), 3);
        assert_eq!(
            Error::MissingCommand {
                scheme: "gs".into(),
                verb: "read".into()
            }
            .exit_code(),
            3
        );
        assert_eq!(
            Error::CommandFailed {
                command: "false".into(),
                status: 1
            }
            .exit_code(),
            4
        );
        assert_eq!(
            Error::UnknownScheme {
                url: "s3://x".into(),
                scheme: "s3".into(),
                known: "file gs".into()
            }
            .exit_code(),
            5
        );
        assert_eq!(Error::Io(std::io::Error::other("boom")).exit_code(), 1);
    }

    #[test]
    fn test_error_display() {
        let err = Error::UnknownScheme {
            url: "s3://bucket/key".into(),
            scheme: "s3".into(),
            known: "az file gs".into(),
        };
        assert_eq!(
            err.to_string(),
            "s3://bucket/key: no handler found for scheme 's3' (known: az file gs)"
        );

        let err = Error::CommandFailed {
            command: "sh -c exit 1".into(),
            status: 1,
        };
        assert_eq!(err.to_string(), "sh -c exit 1: exit 1");
    }

    #[test]
    fn test_io_round_trip_keeps_variant() {
        let err = Error::CommandFailed {
            command: "false".into(),
            status: 3,
        };
        let io = err.into_io();
        assert!(matches!(
            Error::from_io(io),
            Error::CommandFailed { status: 3, .. }
        ));

        let plain = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        assert!(matches!(Error::from_io(plain), Error::Io(_)));
    }
}
