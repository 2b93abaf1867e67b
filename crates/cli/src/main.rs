//! obj - open storage objects by URL
//!
//! A command-line interface that reads and writes local files, Google Cloud
//! Storage, HTTP(S) and Azure Blob Storage through configurable handlers.

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use objio_cli::commands::{self, Cli};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(&cli);

    let exit_code = commands::execute(cli).await;
    std::process::exit(exit_code.as_i32());
}

/// `RUST_LOG` wins; otherwise `--debug` or `OBJIO_DEBUG` select `debug`.
fn init_tracing(cli: &Cli) {
    let filter = if std::env::var_os(EnvFilter::DEFAULT_ENV).is_some() {
        EnvFilter::from_default_env()
    } else if cli.debug || objio_core::config::debug_enabled() {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(!cli.no_color),
        )
        .with(filter)
        .init();
}
