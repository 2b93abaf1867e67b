//! buckets command - List the buckets of a scheme
//!
//! For `file`, the buckets are the mounted disks.

use clap::Args;
use objio_core::Verb;
use objio_pipe::Opened;

use super::{
    Context, TimeoutArgs, print_items, print_message, read_lines, run_blocking, scheme_or_url,
};

/// List the buckets of a scheme
#[derive(Args, Debug)]
pub struct BucketsArgs {
    /// Scheme name (`gs`) or any URL of that scheme
    pub target: String,

    #[command(flatten)]
    pub timeout: TimeoutArgs,
}

/// Execute the buckets command
pub async fn execute(args: BucketsArgs, ctx: Context) -> anyhow::Result<()> {
    let url = scheme_or_url(&args.target);
    let options = ctx.pipe_options(args.timeout);
    let config = ctx.config.clone();
    let task_url = url.clone();

    match run_blocking(move || read_lines(&config, &task_url, Verb::Buckets, options)).await? {
        Opened::Stream(items) => print_items(&ctx.formatter, &url, &items),
        Opened::Message(text) => print_message(&ctx.formatter, &url, &text),
    }
    Ok(())
}
