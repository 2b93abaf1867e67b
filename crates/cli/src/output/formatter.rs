//! Status and result output
//!
//! Object data never goes through the formatter; it is copied to stdout byte
//! for byte. Status lines go to stderr so they never mix with object data,
//! except for the final success line of a command that produced no data.

use serde::Serialize;

use super::OutputConfig;

/// Leading symbol of a status line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Marker {
    Success,
    Failure,
    Warning,
}

impl Marker {
    fn symbol(self) -> &'static str {
        match self {
            Marker::Success => "✓",
            Marker::Failure => "✗",
            Marker::Warning => "⚠",
        }
    }

    /// ANSI foreground color
    fn color(self) -> u8 {
        match self {
            Marker::Success => 32,
            Marker::Failure => 31,
            Marker::Warning => 33,
        }
    }
}

/// Writes command results in human or JSON form
#[derive(Debug, Clone)]
pub struct Formatter {
    config: OutputConfig,
}

impl Formatter {
    pub fn new(config: OutputConfig) -> Self {
        Self { config }
    }

    /// Results are printed as JSON documents
    pub fn is_json(&self) -> bool {
        self.config.json
    }

    /// The flags this formatter was built from
    pub fn config(&self) -> &OutputConfig {
        &self.config
    }

    /// Status lines are suppressed by `--quiet` and `--json`
    fn chatty(&self) -> bool {
        !self.config.quiet && !self.config.json
    }

    fn render(&self, marker: Marker, message: &str) -> String {
        if self.config.no_color {
            format!("{} {message}", marker.symbol())
        } else {
            format!("\x1b[{}m{}\x1b[0m {message}", marker.color(), marker.symbol())
        }
    }

    /// Final line of a command that completed
    pub fn success(&self, message: &str) {
        if self.chatty() {
            println!("{}", self.render(Marker::Success, message));
        }
    }

    /// A failure; printed even with `--quiet`, as `{"error": ...}` with `--json`
    pub fn error(&self, message: &str) {
        if self.config.json {
            eprintln!("{}", serde_json::json!({ "error": message }));
        } else {
            eprintln!("{}", self.render(Marker::Failure, message));
        }
    }

    /// Guidance the user should act on, such as a message-only handler's text
    pub fn warning(&self, message: &str) {
        if self.chatty() {
            eprintln!("{}", self.render(Marker::Warning, message));
        }
    }

    /// Unmarked status line on stderr
    pub fn info(&self, message: &str) {
        if self.chatty() {
            eprintln!("{message}");
        }
    }

    pub fn json<T: Serialize>(&self, value: &T) {
        match serde_json::to_string_pretty(value) {
            Ok(json) => println!("{json}"),
            Err(e) => eprintln!("Error serializing output: {e}"),
        }
    }

    /// Result line on stdout; dropped with `--quiet`
    pub fn println(&self, message: &str) {
        if !self.config.quiet {
            println!("{message}");
        }
    }
}
