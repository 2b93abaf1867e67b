//! put command - Store stdin as an object
//!
//! Streams stdin into the URL's `write` handler. Useful for piping output
//! from other commands.

use std::io;

use anyhow::Context as _;
use clap::Args;
use objio_core::{Error, Verb};
use objio_pipe::{Opened, object_open_with};
use serde::Serialize;

use super::{Context, TimeoutArgs, print_message, run_blocking};
use crate::output::{ProgressBar, copy_with_progress};

/// Store stdin as an object
#[derive(Args, Debug)]
pub struct PutArgs {
    /// Destination URL (schemeless paths are local files)
    pub url: String,

    #[command(flatten)]
    pub timeout: TimeoutArgs,
}

#[derive(Debug, Serialize)]
struct PutOutput {
    status: &'static str,
    url: String,
    size_bytes: u64,
    size_human: String,
}

/// Execute the put command
pub async fn execute(args: PutArgs, ctx: Context) -> anyhow::Result<()> {
    let progress = ProgressBar::bytes(ctx.formatter.config(), &args.url, true);
    let options = ctx.pipe_options(args.timeout);
    let config = ctx.config.clone();
    let url = args.url.clone();
    let task_progress = progress.clone();

    let outcome = run_blocking(move || {
        let mut pipe = match object_open_with(&config, &url, Verb::Write, None, options)? {
            Opened::Stream(pipe) => pipe,
            Opened::Message(text) => return Ok(Opened::Message(text)),
        };
        let mut stdin = io::stdin().lock();
        let bytes = copy_with_progress(&mut stdin, &mut pipe, &task_progress, config.settings().bufsize)
            .map_err(Error::from_io)
            .with_context(|| format!("writing {url}"))?;
        pipe.close().with_context(|| format!("writing {url}"))?;
        Ok(Opened::Stream(bytes))
    })
    .await;
    progress.finish_and_clear();

    let size_bytes = match outcome? {
        Opened::Message(text) => {
            print_message(&ctx.formatter, &args.url, &text);
            return Ok(());
        }
        Opened::Stream(bytes) => bytes,
    };
    let size_human = humansize::format_size(size_bytes, humansize::BINARY);

    if ctx.formatter.is_json() {
        ctx.formatter.json(&PutOutput {
            status: "success",
            url: args.url,
            size_bytes,
            size_human,
        });
    } else {
        ctx.formatter
            .success(&format!("Wrote {size_human} to {}", args.url));
    }
    Ok(())
}
