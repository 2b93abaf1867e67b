//! Progress indication for object transfers
//!
//! Handler streams have no known length, so transfers show a byte-counting
//! spinner on stderr rather than a bar.

use std::io::{self, Read, Write};
use std::time::Duration;

use super::OutputConfig;

/// Byte spinner wrapper
///
/// In quiet or JSON mode, or with `--no-progress`, the spinner is suppressed.
#[derive(Debug, Clone)]
pub struct ProgressBar {
    bar: Option<indicatif::ProgressBar>,
}

impl ProgressBar {
    /// Create a spinner counting transferred bytes.
    ///
    /// `allowed` lets the caller veto the spinner, e.g. when object data is
    /// being written to the same terminal.
    pub fn bytes(config: &OutputConfig, message: &str, allowed: bool) -> Self {
        let bar = if config.quiet || config.json || config.no_progress || !allowed {
            None
        } else {
            let bar = indicatif::ProgressBar::new_spinner();
            let style = indicatif::ProgressStyle::with_template(
                "{spinner:.green} {msg} {bytes} ({binary_bytes_per_sec})",
            )
            .unwrap_or_else(|_| indicatif::ProgressStyle::default_spinner());
            bar.set_style(style);
            bar.set_message(message.to_string());
            bar.enable_steady_tick(Duration::from_millis(100));
            Some(bar)
        };

        Self { bar }
    }

    /// A spinner that never draws
    pub fn hidden() -> Self {
        Self { bar: None }
    }

    /// Increment progress
    pub fn inc(&self, delta: u64) {
        if let Some(bar) = &self.bar {
            bar.inc(delta);
        }
    }

    /// Current byte count
    pub fn position(&self) -> u64 {
        self.bar.as_ref().map_or(0, indicatif::ProgressBar::position)
    }

    /// Finish and clear the spinner
    pub fn finish_and_clear(&self) {
        if let Some(bar) = &self.bar {
            bar.finish_and_clear();
        }
    }

    /// Check if the spinner is visible
    pub fn is_visible(&self) -> bool {
        self.bar.is_some()
    }
}

/// Copy `reader` into `writer` in `bufsize` chunks, advancing `progress`.
///
/// Returns the number of bytes copied. `writer` is flushed at the end.
pub fn copy_with_progress<R: Read + ?Sized, W: Write + ?Sized>(
    reader: &mut R,
    writer: &mut W,
    progress: &ProgressBar,
    bufsize: usize,
) -> io::Result<u64> {
    let mut buf = vec![0u8; bufsize.max(1)];
    let mut total = 0u64;
    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        writer.write_all(&buf[..n])?;
        total += n as u64;
        progress.inc(n as u64);
    }
    writer.flush()?;
    Ok(total)
}
