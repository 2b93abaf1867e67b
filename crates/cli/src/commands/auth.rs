//! auth command - Authenticate for a scheme
//!
//! Most schemes only print instructions; a configured auth command runs
//! attached to the terminal so it can prompt.

use std::process::Stdio;

use anyhow::Context as _;
use clap::Args;
use objio_core::Verb;
use objio_pipe::{Opened, object_open_with};

use super::{Context, TimeoutArgs, print_message, run_blocking, scheme_or_url};

/// Authenticate for a scheme
#[derive(Args, Debug)]
pub struct AuthArgs {
    /// Scheme name (`gs`) or any URL of that scheme
    pub target: String,

    #[command(flatten)]
    pub timeout: TimeoutArgs,
}

/// Execute the auth command
pub async fn execute(args: AuthArgs, ctx: Context) -> anyhow::Result<()> {
    let url = scheme_or_url(&args.target);
    let options = ctx.pipe_options(args.timeout);
    let config = ctx.config.clone();
    let task_url = url.clone();

    let outcome = run_blocking(move || {
        let opened = object_open_with(&config, &task_url, Verb::Auth, Some(Stdio::inherit()), options)?;
        match opened {
            Opened::Stream(mut pipe) => {
                pipe.close()
                    .with_context(|| format!("authenticating for {task_url}"))?;
                Ok(None)
            }
            Opened::Message(text) => Ok(Some(text)),
        }
    })
    .await?;

    if let Some(text) = outcome {
        print_message(&ctx.formatter, &url, &text);
    }
    Ok(())
}
