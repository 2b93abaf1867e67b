//! objio-pipe: subprocess adapter for objio
//!
//! This crate runs the handlers resolved by `objio-core` and exposes their
//! stdin/stdout as ordinary `Read`/`Write` streams. It is the only crate that
//! spawns processes.

pub mod open;
pub mod pipe;

pub use open::{GenericStream, OpenMode, Opened, generic_open, object_open, object_open_with};
pub use pipe::{Direction, Pipe, PipeOptions, exit_code};
