//! cat command - Write object contents to stdout
//!
//! Runs each URL's `read` handler in turn and copies its output to stdout
//! unchanged.

use std::io::{self, IsTerminal};

use anyhow::Context as _;
use clap::Args;
use objio_core::{Error, Verb};
use objio_pipe::{Opened, object_open_with};

use super::{Context, TimeoutArgs, run_blocking};
use crate::output::{ProgressBar, copy_with_progress};

/// Write object contents to stdout
#[derive(Args, Debug)]
pub struct CatArgs {
    /// Object URLs (schemeless paths are local files)
    #[arg(required = true)]
    pub urls: Vec<String>,

    #[command(flatten)]
    pub timeout: TimeoutArgs,
}

/// Execute the cat command
pub async fn execute(args: CatArgs, ctx: Context) -> anyhow::Result<()> {
    // Object data and the spinner must not share a terminal.
    let show_progress = !io::stdout().is_terminal();
    let report = show_progress && io::stderr().is_terminal();
    let options = ctx.pipe_options(args.timeout);

    for url in args.urls {
        let progress = ProgressBar::bytes(ctx.formatter.config(), &url, show_progress);
        let config = ctx.config.clone();
        let task_url = url.clone();
        let task_progress = progress.clone();
        let options = options.clone();

        let outcome = run_blocking(move || {
            let mut pipe = match object_open_with(&config, &task_url, Verb::Read, None, options)? {
                Opened::Stream(pipe) => pipe,
                Opened::Message(text) => return Ok(Opened::Message(text)),
            };
            let mut stdout = io::stdout().lock();
            let bytes = copy_with_progress(&mut pipe, &mut stdout, &task_progress, config.settings().bufsize)
                .map_err(Error::from_io)
                .with_context(|| format!("reading {task_url}"))?;
            pipe.close().with_context(|| format!("reading {task_url}"))?;
            Ok(Opened::Stream(bytes))
        })
        .await;

        progress.finish_and_clear();
        match outcome? {
            Opened::Message(text) => ctx.formatter.warning(text.trim_end()),
            Opened::Stream(bytes) => {
                if report {
                    ctx.formatter.info(&format!(
                        "Read {} from {url}",
                        humansize::format_size(bytes, humansize::BINARY)
                    ));
                }
            }
        }
    }

    Ok(())
}
