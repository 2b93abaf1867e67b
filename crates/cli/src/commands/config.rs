//! config command - Show the merged configuration

use clap::Args;
use serde::Serialize;

use super::Context;

/// Show the merged configuration
#[derive(Args, Debug)]
pub struct ConfigArgs {
    /// Show the configuration files consulted instead of their merged content
    #[arg(long)]
    pub search_path: bool,
}

#[derive(Debug, Serialize)]
struct SearchPathEntry {
    path: String,
    exists: bool,
}

/// Execute the config command
pub fn execute(args: ConfigArgs, ctx: Context) -> anyhow::Result<()> {
    if args.search_path {
        let entries: Vec<SearchPathEntry> = ctx
            .loader
            .search_path()
            .iter()
            .map(|path| SearchPathEntry {
                path: path.display().to_string(),
                exists: path.exists(),
            })
            .collect();

        if ctx.formatter.is_json() {
            ctx.formatter.json(&entries);
        } else {
            for entry in &entries {
                let marker = if entry.exists { "*" } else { " " };
                ctx.formatter.println(&format!("{marker} {}", entry.path));
            }
        }
        return Ok(());
    }

    if ctx.formatter.is_json() {
        ctx.formatter.json(ctx.config.tree());
    } else {
        ctx.formatter.println(ctx.config.to_yaml()?.trim_end());
    }
    Ok(())
}
