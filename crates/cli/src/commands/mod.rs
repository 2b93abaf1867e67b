//! CLI command definitions and execution
//!
//! Every command that spawns a handler runs its blocking I/O on tokio's
//! blocking pool, raced against Ctrl-C.

use std::io::{BufRead, BufReader, Read};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};
use objio_core::config::default_search_path;
use objio_core::{Config, ConfigLoader, Error, Verb, scheme_of};
use objio_pipe::{Opened, PipeOptions, object_open_with};
use serde::Serialize;

use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

mod auth;
mod buckets;
mod cat;
mod completions;
mod config;
mod delete;
mod list;
mod put;

/// obj - open storage objects by URL
///
/// Reads, writes, lists and deletes objects on local disk, Google Cloud
/// Storage, HTTP(S) and Azure Blob Storage by running the command-line tool
/// configured for each URL scheme.
#[derive(Parser, Debug)]
#[command(name = "obj")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output format: human-readable or JSON
    #[arg(long, global = true, default_value = "false")]
    pub json: bool,

    /// Disable colored output
    #[arg(long, global = true, default_value = "false")]
    pub no_color: bool,

    /// Disable progress spinner
    #[arg(long, global = true, default_value = "false")]
    pub no_progress: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true, default_value = "false")]
    pub quiet: bool,

    /// Enable debug logging
    #[arg(long, global = true, default_value = "false")]
    pub debug: bool,

    /// Colon-separated configuration files merged over the built-in handlers
    #[arg(long, global = true, env = "OBJIO_PATH", value_name = "PATHS")]
    pub config_path: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write object contents to stdout
    Cat(cat::CatArgs),

    /// Store stdin as an object
    Put(put::PutArgs),

    /// List the objects under a URL
    List(list::ListArgs),

    /// Delete objects
    Delete(delete::DeleteArgs),

    /// Authenticate for a scheme
    Auth(auth::AuthArgs),

    /// List the buckets of a scheme
    Buckets(buckets::BucketsArgs),

    /// Show the merged configuration
    Config(config::ConfigArgs),

    /// Generate shell completions
    Completions(completions::CompletionsArgs),
}

/// Handler close timeout shared by commands that spawn handlers
#[derive(Args, Debug, Clone, Copy, Default)]
pub struct TimeoutArgs {
    /// Seconds to wait for the handler to exit before terminating it
    #[arg(long, value_name = "SECONDS", value_parser = parse_timeout)]
    pub timeout: Option<Duration>,
}

fn parse_timeout(value: &str) -> Result<Duration, String> {
    let seconds: f64 = value
        .parse()
        .map_err(|_| format!("'{value}' is not a number of seconds"))?;
    Duration::try_from_secs_f64(seconds).map_err(|e| format!("invalid timeout '{value}': {e}"))
}

/// Raised when Ctrl-C interrupts a running command
#[derive(Debug, thiserror::Error)]
#[error("interrupted")]
pub struct Interrupted;

/// State shared by all commands
#[derive(Debug, Clone)]
pub struct Context {
    pub config: Arc<Config>,
    pub loader: ConfigLoader,
    pub formatter: Formatter,
}

impl Context {
    /// Pipe options from the configuration, with `--timeout` applied
    pub fn pipe_options(&self, timeout: TimeoutArgs) -> PipeOptions {
        let options = PipeOptions::from_settings(self.config.settings());
        match timeout.timeout {
            Some(timeout) => options.with_timeout(timeout),
            None => options,
        }
    }
}

/// Execute the CLI command and return an exit code
pub async fn execute(cli: Cli) -> ExitCode {
    let output_config = OutputConfig {
        json: cli.json,
        no_color: cli.no_color,
        no_progress: cli.no_progress,
        quiet: cli.quiet,
    };
    let formatter = Formatter::new(output_config);

    let command = match cli.command {
        Commands::Completions(args) => return completions::execute(args),
        command => command,
    };

    let search_path = cli.config_path.unwrap_or_else(default_search_path);
    let loader = ConfigLoader::from_search_path(&search_path);
    let result = match loader.load() {
        Ok(config) => {
            let ctx = Context {
                config: Arc::new(config),
                loader,
                formatter: formatter.clone(),
            };
            dispatch(command, ctx).await
        }
        Err(e) => Err(anyhow::Error::new(e).context("failed to load configuration")),
    };

    match result {
        Ok(()) => ExitCode::Success,
        Err(e) => {
            formatter.error(&format!("{e:#}"));
            ExitCode::from_error(&e)
        }
    }
}

async fn dispatch(command: Commands, ctx: Context) -> anyhow::Result<()> {
    match command {
        Commands::Cat(args) => cat::execute(args, ctx).await,
        Commands::Put(args) => put::execute(args, ctx).await,
        Commands::List(args) => list::execute(args, ctx).await,
        Commands::Delete(args) => delete::execute(args, ctx).await,
        Commands::Auth(args) => auth::execute(args, ctx).await,
        Commands::Buckets(args) => buckets::execute(args, ctx).await,
        Commands::Config(args) => config::execute(args, ctx),
        Commands::Completions(args) => {
            completions::execute(args);
            Ok(())
        }
    }
}

/// Run blocking handler I/O off the async runtime, giving up on Ctrl-C
pub(crate) async fn run_blocking<T, F>(task: F) -> anyhow::Result<T>
where
    F: FnOnce() -> anyhow::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let handle = tokio::task::spawn_blocking(task);
    tokio::select! {
        joined = handle => joined.context("handler task failed")?,
        signal = tokio::signal::ctrl_c() => {
            signal.context("failed to listen for Ctrl-C")?;
            Err(Interrupted.into())
        }
    }
}

/// Treat a bare scheme name such as `gs` as the URL `gs:`
pub(crate) fn scheme_or_url(target: &str) -> String {
    let bare_scheme = scheme_of(target).is_none()
        && target.chars().next().is_some_and(|c| c.is_ascii_alphabetic())
        && target
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
    if bare_scheme {
        format!("{target}:")
    } else {
        target.to_string()
    }
}

/// Run the handler for `verb` on `url` and collect its output lines
pub(crate) fn read_lines(
    config: &Config,
    url: &str,
    verb: Verb,
    options: PipeOptions,
) -> anyhow::Result<Opened<Vec<String>>> {
    let mut pipe = match object_open_with(config, url, verb, None, options)? {
        Opened::Stream(pipe) => pipe,
        Opened::Message(text) => return Ok(Opened::Message(text)),
    };

    let items = collect_lines(&mut pipe).with_context(|| format!("{verb} {url}"))?;
    pipe.close().with_context(|| format!("{verb} {url}"))?;
    Ok(Opened::Stream(items))
}

/// Non-blank lines of `reader`; bytes that are not UTF-8 are replaced
fn collect_lines<R: Read>(reader: R) -> objio_core::Result<Vec<String>> {
    let mut reader = BufReader::new(reader);
    let mut items = Vec::new();
    let mut buf = Vec::new();
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf).map_err(Error::from_io)? == 0 {
            break;
        }
        let line = String::from_utf8_lossy(&buf);
        let line = line.trim_end_matches(['\n', '\r']);
        if !line.trim().is_empty() {
            items.push(line.to_string());
        }
    }
    Ok(items)
}

#[derive(Debug, Serialize)]
struct ItemsOutput<'a> {
    url: &'a str,
    items: &'a [String],
}

#[derive(Debug, Serialize)]
struct MessageOutput<'a> {
    url: &'a str,
    message: &'a str,
}

/// Print `list`/`buckets` results, one item per line or as JSON
pub(crate) fn print_items(formatter: &Formatter, url: &str, items: &[String]) {
    if formatter.is_json() {
        formatter.json(&ItemsOutput { url, items });
    } else {
        for item in items {
            formatter.println(item);
        }
    }
}

/// Print guidance text from a message-only handler
pub(crate) fn print_message(formatter: &Formatter, url: &str, message: &str) {
    let message = message.trim_end();
    if formatter.is_json() {
        formatter.json(&MessageOutput { url, message });
    } else {
        formatter.println(message);
    }
}
