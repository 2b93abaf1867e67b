//! Opening storage objects by URL
//!
//! [`object_open`] always goes through the configured handler;
//! [`generic_open`] short-cuts `-` and local files to ordinary I/O and only
//! spawns a handler for remote schemes.

use std::fs::File;
use std::io::{self, Read, Write};
use std::process::Stdio;

use objio_core::{Config, Error, Invocation, Result, UrlVars, Verb, normalize_url, scheme_of};

use crate::pipe::{Direction, Pipe, PipeOptions};

/// Result of an open: a stream, or guidance text from a message-only handler
#[derive(Debug)]
pub enum Opened<T> {
    Stream(T),
    Message(String),
}

impl<T> Opened<T> {
    /// The stream, if one was opened
    pub fn into_stream(self) -> Option<T> {
        match self {
            Opened::Stream(stream) => Some(stream),
            Opened::Message(_) => None,
        }
    }

    /// The guidance text, if the handler only provides a message
    pub fn message(&self) -> Option<&str> {
        match self {
            Opened::Message(text) => Some(text),
            Opened::Stream(_) => None,
        }
    }
}

/// Open `url` for `verb` by spawning its configured handler.
///
/// `write` connects the caller to the handler's stdin, every other verb to
/// its stdout. With `external`, the handler uses that handle directly.
pub fn object_open(
    config: &Config,
    url: &str,
    verb: Verb,
    external: Option<Stdio>,
) -> Result<Opened<Pipe>> {
    object_open_with(config, url, verb, external, PipeOptions::from_settings(config.settings()))
}

/// [`object_open`] with explicit pipe options; the handler's
/// `ignore_errors` setting still applies on top of `options`.
pub fn object_open_with(
    config: &Config,
    url: &str,
    verb: Verb,
    external: Option<Stdio>,
    options: PipeOptions,
) -> Result<Opened<Pipe>> {
    let url = normalize_url(url);
    let handler = config.resolve(&url, verb)?;

    match config.build_command(handler, &url)? {
        Invocation::Message(text) => Ok(Opened::Message(text)),
        Invocation::Spawn(argv) => {
            let direction = if verb.is_writable() {
                Direction::Write
            } else {
                Direction::Read
            };
            let ignore_errors = options.ignore_errors || handler.ignore_errors;
            let options = options.with_ignore_errors(ignore_errors);
            Pipe::spawn(argv, direction, external, options).map(Opened::Stream)
        }
    }
}

/// Parsed `open(2)`-style mode such as `"rb"` or `"w"`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpenMode {
    /// Read or write
    pub direction: Direction,
    /// `b` was given; bytes pass through unchanged either way
    pub binary: bool,
}

impl std::str::FromStr for OpenMode {
    type Err = Error;

    fn from_str(mode: &str) -> Result<Self> {
        let invalid = || Error::InvalidMode(mode.to_string());
        let mut chars = mode.chars();
        let direction = match chars.next() {
            Some('r') => Direction::Read,
            Some('w') => Direction::Write,
            _ => return Err(invalid()),
        };

        let mut binary = false;
        for flag in chars {
            match flag {
                'b' => binary = true,
                't' => binary = false,
                _ => return Err(invalid()),
            }
        }
        Ok(Self { direction, binary })
    }
}

/// Stream returned by [`generic_open`]
#[derive(Debug)]
pub enum GenericStream {
    Stdin(io::Stdin),
    Stdout(io::Stdout),
    File(File),
    Pipe(Pipe),
}

impl GenericStream {
    /// Flush and release the stream; for pipes, wait for the handler
    pub fn close(self) -> Result<()> {
        match self {
            GenericStream::Pipe(mut pipe) => pipe.close().map(|_| ()),
            GenericStream::Stdout(mut out) => Ok(out.flush()?),
            GenericStream::File(file) => Ok(file.sync_all().or_else(ignore_unsupported)?),
            GenericStream::Stdin(_) => Ok(()),
        }
    }
}

fn ignore_unsupported(err: io::Error) -> io::Result<()> {
    match err.kind() {
        io::ErrorKind::InvalidInput | io::ErrorKind::Unsupported => Ok(()),
        _ => Err(err),
    }
}

fn not_open_for(what: &str) -> io::Error {
    io::Error::new(
        io::ErrorKind::Unsupported,
        format!("stream is not open for {what}"),
    )
}

impl Read for GenericStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            GenericStream::Stdin(input) => input.read(buf),
            GenericStream::File(file) => file.read(buf),
            GenericStream::Pipe(pipe) => pipe.read(buf),
            GenericStream::Stdout(_) => Err(not_open_for("reading")),
        }
    }
}

impl Write for GenericStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            GenericStream::Stdout(out) => out.write(buf),
            GenericStream::File(file) => file.write(buf),
            GenericStream::Pipe(pipe) => pipe.write(buf),
            GenericStream::Stdin(_) => Err(not_open_for("writing")),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            GenericStream::Stdout(out) => out.flush(),
            GenericStream::File(file) => file.flush(),
            GenericStream::Pipe(pipe) => pipe.flush(),
            GenericStream::Stdin(_) => Ok(()),
        }
    }
}

/// Open `url` with a file mode.
///
/// `-` is this process's stdin (`r`) or stdout (`w`); plain paths and
/// `file:` URLs are opened directly; other schemes go through
/// [`object_open`] with `read` or `write`.
pub fn generic_open(config: &Config, url: &str, mode: &str) -> Result<Opened<GenericStream>> {
    let mode: OpenMode = mode.parse()?;

    if url == "-" {
        let stream = match mode.direction {
            Direction::Read => GenericStream::Stdin(io::stdin()),
            Direction::Write => GenericStream::Stdout(io::stdout()),
        };
        return Ok(Opened::Stream(stream));
    }

    let local_path = match scheme_of(url).as_deref() {
        None => Some(url.to_string()),
        Some("file") => Some(UrlVars::parse(url)?.path().to_string()),
        Some(_) => None,
    };

    if let Some(path) = local_path {
        let file = match mode.direction {
            Direction::Read => File::open(&path),
            Direction::Write => File::create(&path),
        }
        .map_err(|e| Error::Io(io::Error::new(e.kind(), format!("{path}: {e}"))))?;
        return Ok(Opened::Stream(GenericStream::File(file)));
    }

    let verb = match mode.direction {
        Direction::Read => Verb::Read,
        Direction::Write => Verb::Write,
    };
    Ok(match object_open(config, url, verb, None)? {
        Opened::Stream(pipe) => Opened::Stream(GenericStream::Pipe(pipe)),
        Opened::Message(text) => Opened::Message(text),
    })
}
