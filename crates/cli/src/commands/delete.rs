//! delete command - Delete objects
//!
//! Runs the `delete` handler for every URL, keeps going past failures and
//! reports a summary at the end.

use std::io;

use anyhow::Context as _;
use clap::Args;
use objio_core::{Error, Verb};
use objio_pipe::{Opened, object_open_with};
use serde::Serialize;

use super::{Context, Interrupted, TimeoutArgs, print_message, run_blocking};

/// Delete objects
#[derive(Args, Debug)]
pub struct DeleteArgs {
    /// Object URLs to delete
    #[arg(required = true)]
    pub urls: Vec<String>,

    #[command(flatten)]
    pub timeout: TimeoutArgs,
}

#[derive(Debug, Serialize)]
struct DeleteOutput {
    status: &'static str,
    deleted: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    failed: Option<Vec<String>>,
    total: usize,
}

/// Execute the delete command
pub async fn execute(args: DeleteArgs, ctx: Context) -> anyhow::Result<()> {
    let options = ctx.pipe_options(args.timeout);
    let mut deleted = Vec::new();
    let mut failures: Vec<(String, anyhow::Error)> = Vec::new();

    for url in args.urls {
        let config = ctx.config.clone();
        let task_url = url.clone();
        let options = options.clone();

        let outcome = run_blocking(move || {
            let mut pipe = match object_open_with(&config, &task_url, Verb::Delete, None, options)? {
                Opened::Stream(pipe) => pipe,
                Opened::Message(text) => return Ok(Opened::Message(text)),
            };
            io::copy(&mut pipe, &mut io::sink())
                .map_err(Error::from_io)
                .with_context(|| format!("deleting {task_url}"))?;
            pipe.close().with_context(|| format!("deleting {task_url}"))?;
            Ok(Opened::Stream(()))
        })
        .await;

        match outcome {
            Ok(Opened::Stream(())) => deleted.push(url),
            Ok(Opened::Message(text)) => print_message(&ctx.formatter, &url, &text),
            Err(e) if e.downcast_ref::<Interrupted>().is_some() => return Err(e),
            Err(e) => failures.push((url, e)),
        }
    }

    if ctx.formatter.is_json() {
        let failed: Vec<String> = failures.iter().map(|(url, _)| url.clone()).collect();
        ctx.formatter.json(&DeleteOutput {
            status: if failed.is_empty() { "success" } else { "partial" },
            total: deleted.len(),
            deleted,
            failed: (!failed.is_empty()).then_some(failed),
        });
    } else if !deleted.is_empty() {
        ctx.formatter
            .success(&format!("Deleted {} object(s).", deleted.len()));
    }

    let Some((_, last)) = failures.pop() else {
        return Ok(());
    };
    for (_, err) in &failures {
        ctx.formatter.error(&format!("{err:#}"));
    }
    Err(last)
}
