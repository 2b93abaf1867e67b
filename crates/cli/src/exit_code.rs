//! Exit code definitions for the obj CLI
//!
//! Scripts rely on these values; changing one is a breaking change.

/// Exit codes for the obj CLI application.
///
/// These codes follow a consistent convention to allow scripts and automation
/// to handle different error scenarios appropriately.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Operation completed successfully
    Success = 0,

    /// General/unspecified error, including local I/O failures
    GeneralError = 1,

    /// User input error: invalid arguments, verb, mode or URL
    UsageError = 2,

    /// Configuration could not be loaded or a handler is malformed
    ConfigError = 3,

    /// A handler command exited with a non-zero status
    CommandFailed = 4,

    /// Scheme unknown, or verb not configured for the scheme
    UnsupportedFeature = 5,

    /// Operation was interrupted (e.g., Ctrl+C)
    Interrupted = 130,
}

impl ExitCode {
    /// Convert exit code to i32 for use with std::process::exit
    #[inline]
    pub const fn as_i32(self) -> i32 {
        self as i32
    }

    /// Create exit code from i32 value
    ///
    /// Returns None if the value doesn't correspond to a known exit code.
    pub const fn from_i32(code: i32) -> Option<Self> {
        match code {
            0 => Some(Self::Success),
            1 => Some(Self::GeneralError),
            2 => Some(Self::UsageError),
            3 => Some(Self::ConfigError),
            4 => Some(Self::CommandFailed),
            5 => Some(Self::UnsupportedFeature),
            130 => Some(Self::Interrupted),
            _ => None,
        }
    }

    /// Pick the exit code for a failed command.
    ///
    /// Looks through the error chain for an `objio_core::Error`, including one
    /// carried inside an `io::Error` raised by a pipe.
    pub fn from_error(err: &anyhow::Error) -> Self {
        if err.downcast_ref::<crate::commands::Interrupted>().is_some() {
            return Self::Interrupted;
        }

        for cause in err.chain() {
            let core = cause.downcast_ref::<objio_core::Error>().or_else(|| {
                cause
                    .downcast_ref::<std::io::Error>()
                    .and_then(|io| io.get_ref())
                    .and_then(|inner| inner.downcast_ref::<objio_core::Error>())
            });
            if let Some(core) = core {
                return Self::from_i32(core.exit_code()).unwrap_or(Self::GeneralError);
            }
        }
        Self::GeneralError
    }

    /// Get a human-readable description of the exit code
    pub const fn description(self) -> &'static str {
        match self {
            Self::Success => "Operation completed successfully",
            Self::GeneralError => "General error",
            Self::UsageError => "Invalid arguments, verb, mode or URL",
            Self::ConfigError => "Configuration error",
            Self::CommandFailed => "Handler command failed",
            Self::UnsupportedFeature => "Scheme or verb not supported",
            Self::Interrupted => "Operation interrupted",
        }
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code.as_i32()
    }
}

impl std::fmt::Display for ExitCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.description(), self.as_i32())
    }
}
