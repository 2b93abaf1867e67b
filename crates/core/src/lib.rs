//! objio-core: Core library for the objio storage CLI
//!
//! This crate provides the core functionality for objio, including:
//! - Configuration management (built-in handler table, search path, deep merge)
//! - URL variable extraction and `{placeholder}` substitution
//! - Handler resolution for a (URL, verb) pair
//!
//! This crate never spawns processes; see `objio-pipe` for that.

pub mod config;
pub mod error;
pub mod handler;
pub mod template;
pub mod vars;
pub mod verb;

pub use config::{Command, Config, ConfigLoader, Handler, Settings};
pub use error::{Error, Result};
pub use handler::Invocation;
pub use vars::{UrlVars, normalize_url, scheme_of};
pub use verb::Verb;
