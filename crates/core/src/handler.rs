//! Handler resolution and command building
//!
//! Turns a (URL, verb) pair into either an argument vector to spawn or a
//! guidance message for operations that are intentionally not automated.

use crate::config::{Command, Config, Handler};
use crate::error::{Error, Result};
use crate::template;
use crate::vars::{UrlVars, scheme_of};
use crate::verb::Verb;

/// What carrying out a handler amounts to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invocation {
    /// Nothing to run; show this text to the user
    Message(String),
    /// Spawn this argument vector
    Spawn(Vec<String>),
}

impl Invocation {
    /// The argument vector, if there is one
    pub fn argv(&self) -> Option<&[String]> {
        match self {
            Invocation::Spawn(argv) => Some(argv),
            Invocation::Message(_) => None,
        }
    }
}

impl Command {
    /// Replace every `{placeholder}` using `vars`
    pub fn substitute(&self, vars: &UrlVars) -> Result<Command> {
        let lookup = |name: &str| vars.get(name);
        match self {
            Command::Shell(line) => Ok(Command::Shell(template::substitute(line, lookup)?)),
            Command::Argv(args) => args
                .iter()
                .map(|arg| template::substitute(arg, lookup))
                .collect::<Result<Vec<_>>>()
                .map(Command::Argv),
        }
    }

    /// Argument vector to execute; shell lines are prefixed with `shell`
    pub fn into_argv(self, shell: &[String]) -> Vec<String> {
        match self {
            Command::Shell(line) => {
                let mut argv = shell.to_vec();
                argv.push(line);
                argv
            }
            Command::Argv(args) => args,
        }
    }
}

impl Config {
    /// Find the handler for `verb` under the scheme of `url`.
    ///
    /// URLs without a scheme resolve under `file`.
    pub fn resolve(&self, url: &str, verb: Verb) -> Result<&Handler> {
        let scheme = scheme_of(url).unwrap_or_else(|| "file".to_string());
        let handlers = self.handlers(&scheme).ok_or_else(|| Error::UnknownScheme {
            url: url.to_string(),
            scheme: scheme.clone(),
            known: self.scheme_names().collect::<Vec<_>>().join(" "),
        })?;

        handlers.get(&verb).ok_or_else(|| Error::UnsupportedVerb {
            url: url.to_string(),
            scheme,
            verb: verb.to_string(),
        })
    }

    /// Build the invocation for `handler` applied to `url`
    pub fn build_command(&self, handler: &Handler, url: &str) -> Result<Invocation> {
        if let Some(message) = handler.message.as_deref().filter(|m| !m.trim().is_empty()) {
            tracing::info!(url, verb = %handler.verb, "handler only provides a message");
            return Ok(Invocation::Message(message.to_string()));
        }

        let command = handler
            .command
            .as_ref()
            .filter(|command| !command.is_empty())
            .ok_or_else(|| Error::MissingCommand {
                scheme: handler.scheme.clone(),
                verb: handler.verb.to_string(),
            })?;

        let command = if handler.substitute {
            command.substitute(&UrlVars::parse(url)?)?
        } else {
            command.clone()
        };

        let argv = command.into_argv(&self.settings().shell);
        tracing::debug!(?argv, url, verb = %handler.verb, "resolved command");
        Ok(Invocation::Spawn(argv))
    }

    /// Resolve and build in one step
    pub fn plan(&self, url: &str, verb: Verb) -> Result<Invocation> {
        let handler = self.resolve(url, verb)?;
        self.build_command(handler, url)
    }
}
