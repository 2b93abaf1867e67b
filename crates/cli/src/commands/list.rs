//! list command - List the objects under a URL

use clap::Args;
use objio_core::Verb;
use objio_pipe::Opened;

use super::{Context, TimeoutArgs, print_items, print_message, read_lines, run_blocking};

/// List the objects under a URL
#[derive(Args, Debug)]
pub struct ListArgs {
    /// Directory, bucket or prefix URL
    pub url: String,

    #[command(flatten)]
    pub timeout: TimeoutArgs,
}

/// Execute the list command
pub async fn execute(args: ListArgs, ctx: Context) -> anyhow::Result<()> {
    let options = ctx.pipe_options(args.timeout);
    let config = ctx.config.clone();
    let url = args.url.clone();

    match run_blocking(move || read_lines(&config, &url, Verb::List, options)).await? {
        Opened::Stream(items) => print_items(&ctx.formatter, &args.url, &items),
        Opened::Message(text) => print_message(&ctx.formatter, &args.url, &text),
    }
    Ok(())
}
