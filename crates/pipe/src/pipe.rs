//! Subprocess-backed streams
//!
//! A [`Pipe`] owns one spawned handler process and the end of its stdin or
//! stdout that the caller talks to. Every read and write polls the process
//! so a failing handler is reported close to where it failed; [`Pipe::close`]
//! (or dropping the pipe) closes the stream and reaps the process.

use std::io::{self, BufReader, BufWriter, Read, Write};
use std::process::{Child, ChildStdin, ChildStdout, ExitStatus, Stdio};
use std::time::{Duration, Instant};

use objio_core::config::{DEFAULT_BUFSIZE, DEFAULT_TIMEOUT_SECS, Settings};
use objio_core::{Error, Result};

/// Interval between liveness polls while waiting for a handler
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Pause between SIGTERM and SIGKILL
const TERMINATE_GRACE: Duration = Duration::from_millis(100);

/// Final wait after SIGKILL
const KILL_WAIT: Duration = Duration::from_secs(1);

/// Which end of the handler the caller holds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Caller reads the handler's stdout
    Read,
    /// Caller writes the handler's stdin
    Write,
}

/// Tuning for a spawned pipe
#[derive(Debug, Clone, PartialEq)]
pub struct PipeOptions {
    /// Buffer size of the caller-side stream
    pub bufsize: usize,
    /// How long `close` waits before terminating the handler
    pub timeout: Duration,
    /// Tolerate a non-zero exit status
    pub ignore_errors: bool,
}

impl PipeOptions {
    /// Options taken from the `config:` section
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            bufsize: settings.bufsize.max(1),
            timeout: settings.timeout(),
            ignore_errors: false,
        }
    }

    /// Override the close timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the exit-status policy
    pub fn with_ignore_errors(mut self, ignore_errors: bool) -> Self {
        self.ignore_errors = ignore_errors;
        self
    }
}

impl Default for PipeOptions {
    fn default() -> Self {
        Self {
            bufsize: DEFAULT_BUFSIZE,
            timeout: Duration::from_secs_f64(DEFAULT_TIMEOUT_SECS),
            ignore_errors: false,
        }
    }
}

enum Stream {
    Reader(BufReader<ChildStdout>),
    Writer(BufWriter<ChildStdin>),
    /// The handler is connected to a caller-supplied handle
    External,
    Closed,
}

/// A spawned handler process and its stream
pub struct Pipe {
    argv: Vec<String>,
    direction: Direction,
    child: Child,
    stream: Stream,
    status: Option<ExitStatus>,
    options: PipeOptions,
    failure_reported: bool,
    closed: bool,
}

impl Pipe {
    /// Spawn `argv` and connect to its stdout (`Read`) or stdin (`Write`).
    ///
    /// With `external`, the handler uses that handle instead and the pipe
    /// exposes no stream; it still tracks and reaps the process.
    pub fn spawn(
        argv: Vec<String>,
        direction: Direction,
        external: Option<Stdio>,
        options: PipeOptions,
    ) -> Result<Self> {
        let Some((program, args)) = argv.split_first() else {
            return Err(Error::Io(io::Error::new(
                io::ErrorKind::InvalidInput,
                "empty argument vector",
            )));
        };

        let mut command = std::process::Command::new(program);
        command.args(args);

        let is_external = external.is_some();
        let handle = external.unwrap_or_else(Stdio::piped);
        match direction {
            Direction::Read => command.stdout(handle),
            Direction::Write => command.stdin(handle),
        };

        let mut child = command.spawn().map_err(|e| {
            Error::Io(io::Error::new(e.kind(), format!("{}: {e}", argv.join(" "))))
        })?;
        tracing::debug!(?argv, pid = child.id(), ?direction, "spawned handler");

        let stream = if is_external {
            Some(Stream::External)
        } else {
            match direction {
                Direction::Read => child
                    .stdout
                    .take()
                    .map(|out| Stream::Reader(BufReader::with_capacity(options.bufsize, out))),
                Direction::Write => child
                    .stdin
                    .take()
                    .map(|input| Stream::Writer(BufWriter::with_capacity(options.bufsize, input))),
            }
        };

        let Some(stream) = stream else {
            let _ = child.kill();
            let _ = child.wait();
            return Err(Error::StreamUnavailable {
                command: argv.join(" "),
            });
        };

        Ok(Self {
            argv,
            direction,
            child,
            stream,
            status: None,
            options,
            failure_reported: false,
            closed: false,
        })
    }

    /// The argument vector that was spawned
    pub fn argv(&self) -> &[String] {
        &self.argv
    }

    /// Which end of the handler this pipe holds
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Last observed exit status, if the handler has been reaped
    pub fn status(&self) -> Option<ExitStatus> {
        self.status
    }

    /// OS process id of the handler
    pub fn id(&self) -> u32 {
        self.child.id()
    }

    fn command_line(&self) -> String {
        self.argv.join(" ")
    }

    /// Poll the handler without blocking and report a failed exit
    fn check_status(&mut self) -> Result<()> {
        if self.status.is_none() {
            self.status = self.child.try_wait()?;
        }
        self.handle_status()
    }

    /// Report a non-zero exit once, unless the pipe ignores errors
    fn handle_status(&mut self) -> Result<()> {
        match self.status {
            Some(status)
                if !status.success() && !self.options.ignore_errors && !self.failure_reported =>
            {
                self.failure_reported = true;
                Err(Error::CommandFailed {
                    command: self.command_line(),
                    status: exit_code(status),
                })
            }
            _ => Ok(()),
        }
    }

    /// Close the stream and wait for the handler using the configured timeout
    pub fn close(&mut self) -> Result<ExitStatus> {
        self.close_with_timeout(self.options.timeout)
    }

    /// Close the stream and wait up to `timeout` for the handler to exit.
    ///
    /// A handler that outlives the timeout gets SIGTERM, then SIGKILL.
    /// Calling this again after the pipe is closed returns the recorded status.
    pub fn close_with_timeout(&mut self, timeout: Duration) -> Result<ExitStatus> {
        if self.closed {
            if let Some(status) = self.status {
                return Ok(status);
            }
        }

        let flushed = match std::mem::replace(&mut self.stream, Stream::Closed) {
            Stream::Writer(mut writer) => match writer.flush() {
                Err(e) if e.kind() == io::ErrorKind::BrokenPipe => Ok(()),
                other => other,
            },
            _ => Ok(()),
        };

        let status = match self.status {
            Some(status) => status,
            None => self.wait_or_kill(timeout)?,
        };
        self.status = Some(status);
        self.closed = true;

        self.handle_status()?;
        flushed?;
        Ok(status)
    }

    fn wait_or_kill(&mut self, timeout: Duration) -> Result<ExitStatus> {
        if let Some(status) = wait_timeout(&mut self.child, timeout)? {
            return Ok(status);
        }

        tracing::warn!(command = %self.command_line(), ?timeout, "handler did not exit in time, terminating");
        terminate(&mut self.child);
        std::thread::sleep(TERMINATE_GRACE);
        let _ = self.child.kill();

        wait_timeout(&mut self.child, KILL_WAIT)?.ok_or_else(|| {
            Error::Io(io::Error::new(
                io::ErrorKind::TimedOut,
                format!("{}: did not exit after kill", self.command_line()),
            ))
        })
    }

    fn unavailable(&self, what: &str) -> io::Error {
        let reason = match self.stream {
            Stream::External => "stream is attached to an external handle",
            Stream::Closed => "pipe is closed",
            _ => match self.direction {
                Direction::Read => "pipe is open for reading",
                Direction::Write => "pipe is open for writing",
            },
        };
        io::Error::new(
            io::ErrorKind::Unsupported,
            format!("{}: cannot {what}: {reason}", self.command_line()),
        )
    }
}

impl Read for Pipe {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.handle_status().map_err(Error::into_io)?;

        let n = match &mut self.stream {
            Stream::Reader(reader) => reader.read(buf)?,
            _ => return Err(self.unavailable("read")),
        };

        if n > 0 {
            // A failure seen here is raised on the next call so these bytes reach the caller.
            if self.status.is_none() {
                self.status = self.child.try_wait()?;
            }
        } else {
            self.check_status().map_err(Error::into_io)?;
        }
        Ok(n)
    }
}

impl Write for Pipe {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.handle_status().map_err(Error::into_io)?;

        let result = match &mut self.stream {
            Stream::Writer(writer) => writer.write(buf),
            _ => return Err(self.unavailable("write")),
        };
        self.after_write(result)
    }

    fn flush(&mut self) -> io::Result<()> {
        let result = match &mut self.stream {
            Stream::Writer(writer) => writer.flush(),
            _ => return Ok(()),
        };
        self.after_write(result)
    }
}

impl Pipe {
    fn after_write<T>(&mut self, result: io::Result<T>) -> io::Result<T> {
        match result {
            Ok(value) => {
                self.check_status().map_err(Error::into_io)?;
                Ok(value)
            }
            Err(e) if e.kind() == io::ErrorKind::BrokenPipe => {
                // The handler closed its stdin; its exit status explains why.
                if self.status.is_none() {
                    self.status = wait_timeout(&mut self.child, KILL_WAIT)?;
                }
                self.handle_status().map_err(Error::into_io)?;
                Err(e)
            }
            Err(e) => Err(e),
        }
    }
}

impl Drop for Pipe {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        if let Err(e) = self.close() {
            tracing::warn!(command = %self.command_line(), error = %e, "failed to close pipe");
        }
    }
}

impl std::fmt::Debug for Pipe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipe")
            .field("argv", &self.argv)
            .field("direction", &self.direction)
            .field("pid", &self.child.id())
            .field("status", &self.status)
            .field("closed", &self.closed)
            .finish()
    }
}

/// Poll `child` until it exits or `timeout` elapses
fn wait_timeout(child: &mut Child, timeout: Duration) -> io::Result<Option<ExitStatus>> {
    let start = Instant::now();
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        if start.elapsed() >= timeout {
            return Ok(None);
        }
        std::thread::sleep(POLL_INTERVAL);
    }
}

#[cfg(unix)]
fn terminate(child: &mut Child) {
    let Ok(pid) = libc::pid_t::try_from(child.id()) else {
        return;
    };
    // SAFETY: kill(2) has no memory-safety requirements; the child is not reaped yet.
    unsafe {
        libc::kill(pid, libc::SIGTERM);
    }
}

#[cfg(not(unix))]
fn terminate(child: &mut Child) {
    let _ = child.kill();
}

/// Numeric exit status; signals map to 128 + signal number
pub fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    -1
}
