//! Configuration management
//!
//! The handler table is a YAML tree: built-in defaults, deep-merged with every
//! configuration file found on the search path. The merged tree is converted
//! once into a typed [`Config`] that callers pass around by reference.
//!
//! ```yaml
//! config:
//!   bufsize: 8192
//! schemes:
//!   gs:
//!     read:
//!       cmd: ["gsutil", "cat", "{url}"]
//! ```

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;
use serde_yaml::Value;

use crate::error::{Error, Result};
use crate::verb::Verb;

/// Prefix of every environment variable read by objio
pub const ENV_PREFIX: &str = "OBJIO_";

/// Default stream buffer size in bytes
pub const DEFAULT_BUFSIZE: usize = 8192;

/// Default time to wait for a handler to exit after its stream is closed
pub const DEFAULT_TIMEOUT_SECS: f64 = 60.0;

/// Built-in handler table
pub const DEFAULT_CONFIG: &str = r#"
config:
  bufsize: 8192
  timeout: 60
  shell: ["/bin/sh", "-c"]

schemes:

  file:
    read:
      cmd: ["dd", "if={path}", "bs=4M"]
    write:
      cmd: ["dd", "of={path}", "bs=4M"]
    delete:
      cmd: ["rm", "{path}"]
    list:
      cmd: "ls -1d {abspath}/*"
    buckets:
      cmd: "mount | awk '/^\\/dev\\/sd/{print $3}'"
      substitute: false
    auth:
      message: |
        No authentication for local files.

  gs:
    read:
      cmd: ["gsutil", "cat", "{url}"]
    write:
      cmd: ["gsutil", "cp", "-", "{url}"]
    delete:
      cmd: ["gsutil", "rm", "{url}"]
    buckets:
      cmd: ["gsutil", "ls"]
    list:
      cmd: ["gsutil", "ls", "{url}"]
    auth:
      message: |
        Use "gcloud auth login" to authenticate.

  http:
    read:
      cmd: ["curl", "--fail", "-L", "-s", "{url}", "--output", "-"]
    auth:
      message: |
        No separate authentication for HTTP; put credentials into the URL.

  https:
    read:
      cmd: ["curl", "--fail", "-L", "-s", "{url}", "--output", "-"]
    auth:
      message: |
        No separate authentication for HTTPS; put credentials into the URL.

  az:
    read:
      cmd: "az storage blob download --container-name '{netloc}' --name '{path}' --file -"
    delete:
      cmd: "az storage blob delete --container-name '{netloc}' --name '{path}'"
    buckets:
      cmd: "az storage container list"
    list:
      cmd: "az storage blob list --container-name '{netloc}'"
    auth:
      message: |
        Use "az login" to authenticate.
"#;

/// Whether `OBJIO_DEBUG` asks for verbose diagnostics
pub fn debug_enabled() -> bool {
    std::env::var(format!("{ENV_PREFIX}DEBUG"))
        .map(|value| {
            let value = value.trim();
            !value.is_empty() && value != "0"
        })
        .unwrap_or(false)
}

/// Colon-separated list of configuration files consulted by default
pub fn default_search_path() -> String {
    let yaml = "/usr/local/etc/objio.yaml:~/.objio.yaml:./objio.yaml";
    format!("{yaml}:{}", yaml.replace("yaml", "yml"))
}

/// Deep-merge `source` into `target`.
///
/// Mappings merge key by key; any other value in `source` replaces the one in
/// `target` outright.
pub fn merge_yaml(target: &mut Value, source: Value) {
    match (target, source) {
        (Value::Mapping(target), Value::Mapping(source)) => {
            for (key, value) in source {
                match target.get_mut(&key) {
                    Some(existing) => merge_yaml(existing, value),
                    None => {
                        target.insert(key, value);
                    }
                }
            }
        }
        (target, source) => *target = source,
    }
}

/// A command template
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Shell command line, run through the configured shell
    Shell(String),
    /// Argument vector, run directly
    Argv(Vec<String>),
}

impl Command {
    fn from_yaml(value: Value, scheme: &str, verb: &str) -> Result<Self> {
        let invalid = |found: &Value| Error::InvalidCommandType {
            scheme: scheme.to_string(),
            verb: verb.to_string(),
            found: describe(found).to_string(),
        };

        match value {
            Value::String(line) => Ok(Command::Shell(line)),
            Value::Sequence(items) => items
                .into_iter()
                .map(|item| match item {
                    Value::String(arg) => Ok(arg),
                    other => Err(invalid(&other)),
                })
                .collect::<Result<Vec<_>>>()
                .map(Command::Argv),
            other => Err(invalid(&other)),
        }
    }

    /// Whether the template has nothing to run
    pub fn is_empty(&self) -> bool {
        match self {
            Command::Shell(line) => line.trim().is_empty(),
            Command::Argv(args) => args.is_empty(),
        }
    }
}

fn describe(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a list",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}

/// How one (scheme, verb) combination is carried out
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Handler {
    /// Scheme this handler is configured under
    pub scheme: String,
    /// Verb this handler serves
    pub verb: Verb,
    /// Command template to spawn
    pub command: Option<Command>,
    /// Guidance text shown instead of running anything
    pub message: Option<String>,
    /// Whether `{placeholder}` substitution is applied to the command
    pub substitute: bool,
    /// Whether a non-zero exit status is tolerated
    pub ignore_errors: bool,
}

#[derive(Debug, Deserialize)]
struct RawHandler {
    #[serde(default)]
    cmd: Option<Value>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default = "default_true")]
    substitute: bool,
    #[serde(default)]
    ignore_errors: bool,
}

fn default_true() -> bool {
    true
}

/// Process-level settings from the `config:` section
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Stream buffer size in bytes
    pub bufsize: usize,
    /// Seconds to wait for a handler to exit on close
    pub timeout: f64,
    /// Interpreter prefix for string commands
    pub shell: Vec<String>,
}

impl Settings {
    /// Close timeout as a `Duration`
    pub fn timeout(&self) -> Duration {
        Duration::try_from_secs_f64(self.timeout)
            .unwrap_or_else(|_| Duration::from_secs_f64(DEFAULT_TIMEOUT_SECS))
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bufsize: DEFAULT_BUFSIZE,
            timeout: DEFAULT_TIMEOUT_SECS,
            shell: vec!["/bin/sh".to_string(), "-c".to_string()],
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawConfig {
    #[serde(default)]
    config: Settings,
    schemes: BTreeMap<String, Option<BTreeMap<String, RawHandler>>>,
}

/// Merged, typed configuration
#[derive(Debug, Clone)]
pub struct Config {
    settings: Settings,
    schemes: BTreeMap<String, BTreeMap<Verb, Handler>>,
    tree: Value,
}

impl Config {
    /// Built-in defaults only
    pub fn builtin() -> Result<Self> {
        Self::from_yaml_str(DEFAULT_CONFIG)
    }

    /// Parse a complete configuration document
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        Self::from_tree(serde_yaml::from_str(content)?)
    }

    /// Convert a merged YAML tree into a typed configuration
    pub fn from_tree(tree: Value) -> Result<Self> {
        if tree.get("schemes").and_then(Value::as_mapping).is_none() {
            return Err(Error::Config(
                "configuration has no 'schemes' mapping".into(),
            ));
        }

        let raw: RawConfig = serde_yaml::from_value(tree.clone())?;
        let mut schemes = BTreeMap::new();

        for (scheme, verbs) in raw.schemes {
            let scheme = scheme.to_ascii_lowercase();
            let mut handlers = BTreeMap::new();
            for (verb_name, raw_handler) in verbs.unwrap_or_default() {
                let verb = match verb_name.parse::<Verb>() {
                    Ok(verb) => verb,
                    Err(_) => {
                        tracing::warn!(scheme = %scheme, verb = %verb_name, "ignoring unknown verb in configuration");
                        continue;
                    }
                };
                let command = raw_handler
                    .cmd
                    .filter(|cmd| !cmd.is_null())
                    .map(|cmd| Command::from_yaml(cmd, &scheme, &verb_name))
                    .transpose()?;
                handlers.insert(
                    verb,
                    Handler {
                        scheme: scheme.clone(),
                        verb,
                        command,
                        message: raw_handler.message,
                        substitute: raw_handler.substitute,
                        ignore_errors: raw_handler.ignore_errors,
                    },
                );
            }
            schemes.insert(scheme, handlers);
        }

        Ok(Self {
            settings: raw.config,
            schemes,
            tree,
        })
    }

    /// Process-level settings
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Names of all configured schemes
    pub fn scheme_names(&self) -> impl Iterator<Item = &str> {
        self.schemes.keys().map(String::as_str)
    }

    /// Handlers configured for `scheme`
    pub fn handlers(&self, scheme: &str) -> Option<&BTreeMap<Verb, Handler>> {
        self.schemes.get(scheme)
    }

    /// The merged YAML tree this configuration was built from
    pub fn tree(&self) -> &Value {
        &self.tree
    }

    /// Render the merged tree as YAML
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(&self.tree)?)
    }
}

/// Loads configuration files along a search path
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    search_path: Vec<PathBuf>,
}

impl ConfigLoader {
    /// Use `OBJIO_PATH` if set, otherwise the default search path
    pub fn from_env() -> Self {
        let path = std::env::var(format!("{ENV_PREFIX}PATH"))
            .unwrap_or_else(|_| default_search_path());
        Self::from_search_path(&path)
    }

    /// Use a colon-separated list of files; `~/` expands to the home directory
    pub fn from_search_path(search_path: &str) -> Self {
        let search_path = search_path
            .split(':')
            .filter(|entry| !entry.is_empty())
            .map(expand_home)
            .collect();
        Self { search_path }
    }

    /// Use an explicit list of files (useful for testing)
    pub fn with_paths(search_path: Vec<PathBuf>) -> Self {
        Self { search_path }
    }

    /// Files consulted, in merge order
    pub fn search_path(&self) -> &[PathBuf] {
        &self.search_path
    }

    /// Load the built-in defaults and merge every existing file over them
    pub fn load(&self) -> Result<Config> {
        let mut tree: Value = serde_yaml::from_str(DEFAULT_CONFIG)?;

        for path in &self.search_path {
            if !path.exists() {
                continue;
            }
            tracing::debug!(path = %path.display(), "merging configuration file");

            let content = std::fs::read_to_string(path)?;
            let updates: Value = serde_yaml::from_str(&content)
                .map_err(|e| Error::Config(format!("{}: {e}", path.display())))?;
            if updates.is_null() {
                continue;
            }
            merge_yaml(&mut tree, updates);
        }

        if tracing::enabled!(tracing::Level::DEBUG) {
            if let Ok(rendered) = serde_yaml::to_string(&tree) {
                tracing::debug!("merged configuration:\n{rendered}");
            }
        }
        Config::from_tree(tree)
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::from_env()
    }
}

fn expand_home(entry: &str) -> PathBuf {
    match (entry.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(entry),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn yaml(text: &str) -> Value {
        serde_yaml::from_str(text).unwrap()
    }

    #[test]
    fn test_builtin_config() {
        let config = Config::builtin().unwrap();
        assert_eq!(config.settings().bufsize, 8192);
        assert_eq!(config.settings().timeout(), Duration::from_secs(60));
        assert_eq!(config.settings().shell, vec!["/bin/sh", "-c"]);

        let schemes: Vec<_> = config.scheme_names().collect();
        assert_eq!(schemes, vec!["az", "file", "gs", "http", "https"]);

        let file = config.handlers("file").unwrap();
        assert_eq!(
            file[&Verb::Read].command,
            Some(Command::Argv(vec![
                "dd".into(),
                "if={path}".into(),
                "bs=4M".into()
            ]))
        );
        assert!(!file[&Verb::Buckets].substitute);
        assert!(file[&Verb::Auth].message.is_some());
        assert!(file[&Verb::Auth].command.is_none());
    }

    #[test]
    fn test_builtin_buckets_command_unescapes() {
        let config = Config::builtin().unwrap();
        let buckets = &config.handlers("file").unwrap()[&Verb::Buckets];
        assert_eq!(
            buckets.command,
            Some(Command::Shell(
                "mount | awk '/^\\/dev\\/sd/{print $3}'".to_string()
            ))
        );
    }

    #[test]
    fn test_merge_is_idempotent() {
        let base: Value = serde_yaml::from_str(DEFAULT_CONFIG).unwrap();
        let mut merged = base.clone();
        merge_yaml(&mut merged, base.clone());
        assert_eq!(merged, base);
    }

    #[test]
    fn test_merge_adds_scheme_without_touching_others() {
        let base: Value = serde_yaml::from_str(DEFAULT_CONFIG).unwrap();
        let mut merged = base.clone();
        merge_yaml(
            &mut merged,
            yaml("schemes:\n  s3:\n    read:\n      cmd: [\"aws\", \"s3\", \"cp\", \"{url}\", \"-\"]\n"),
        );

        for scheme in ["file", "gs", "http", "https", "az"] {
            assert_eq!(merged["schemes"][scheme], base["schemes"][scheme]);
        }
        assert!(merged["schemes"]["s3"]["read"]["cmd"].is_sequence());
    }

    #[test]
    fn test_merge_replaces_leaves() {
        let mut target = yaml("a:\n  b: 1\n  c: [1, 2]\n");
        merge_yaml(&mut target, yaml("a:\n  c: [3]\n  d: x\n"));
        assert_eq!(target, yaml("a:\n  b: 1\n  c: [3]\n  d: x\n"));

        let mut target = yaml("a: scalar\n");
        merge_yaml(&mut target, yaml("a:\n  nested: true\n"));
        assert_eq!(target, yaml("a:\n  nested: true\n"));
    }

    #[test]
    fn test_invalid_command_type() {
        let err = Config::from_yaml_str("schemes:\n  x:\n    read:\n      cmd: 42\n").unwrap_err();
        match err {
            Error::InvalidCommandType { scheme, verb, found } => {
                assert_eq!(scheme, "x");
                assert_eq!(verb, "read");
                assert_eq!(found, "a number");
            }
            other => panic!("unexpected error: {other}"),
        }

        let err =
            Config::from_yaml_str("schemes:\n  x:\n    read:\n      cmd: [\"cat\", {a: 1}]\n")
                .unwrap_err();
        assert!(matches!(err, Error::InvalidCommandType { .. }));
    }

    #[test]
    fn test_missing_schemes_section() {
        let err = Config::from_yaml_str("config:\n  bufsize: 10\n").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_unknown_verbs_are_skipped() {
        let config =
            Config::from_yaml_str("schemes:\n  x:\n    stat:\n      cmd: ls\n    read:\n      cmd: cat\n")
                .unwrap();
        let handlers = config.handlers("x").unwrap();
        assert_eq!(handlers.len(), 1);
        assert!(handlers.contains_key(&Verb::Read));
    }

    #[test]
    fn test_empty_scheme_entry() {
        let config = Config::from_yaml_str("schemes:\n  x:\n").unwrap();
        assert!(config.handlers("x").unwrap().is_empty());
    }

    #[test]
    fn test_search_path_parsing() {
        let loader = ConfigLoader::from_search_path("/etc/a.yaml::./b.yml");
        assert_eq!(
            loader.search_path(),
            &[PathBuf::from("/etc/a.yaml"), PathBuf::from("./b.yml")]
        );
    }

    #[test]
    fn test_default_search_path_has_both_spellings() {
        let path = default_search_path();
        let entries: Vec<_> = path.split(':').collect();
        assert_eq!(entries.len(), 6);
        assert!(entries.contains(&"./objio.yaml"));
        assert!(entries.contains(&"./objio.yml"));
        assert!(entries.contains(&"~/.objio.yml"));
    }

    #[test]
    fn test_loader_merges_files_in_order() {
        let temp_dir = TempDir::new().unwrap();
        let first = temp_dir.path().join("first.yaml");
        let second = temp_dir.path().join("second.yml");
        let empty = temp_dir.path().join("empty.yaml");
        std::fs::write(
            &first,
            "config:\n  bufsize: 1024\nschemes:\n  s3:\n    read:\n      cmd: first\n",
        )
        .unwrap();
        std::fs::write(&second, "schemes:\n  s3:\n    read:\n      cmd: second\n").unwrap();
        std::fs::write(&empty, "").unwrap();

        let loader = ConfigLoader::with_paths(vec![
            first,
            temp_dir.path().join("missing.yaml"),
            empty,
            second,
        ]);
        let config = loader.load().unwrap();

        assert_eq!(config.settings().bufsize, 1024);
        assert_eq!(
            config.handlers("s3").unwrap()[&Verb::Read].command,
            Some(Command::Shell("second".into()))
        );
        // defaults survive
        assert!(config.handlers("gs").is_some());
    }

    #[test]
    fn test_loader_reports_bad_file() {
        let temp_dir = TempDir::new().unwrap();
        let bad = temp_dir.path().join("bad.yaml");
        std::fs::write(&bad, "schemes: [unclosed\n").unwrap();

        let err = ConfigLoader::with_paths(vec![bad.clone()]).load().unwrap_err();
        assert!(err.to_string().contains("bad.yaml"));
    }

    #[test]
    fn test_scheme_keys_are_lowercased() {
        let config = Config::from_yaml_str("schemes:\n  MEM:\n    read:\n      cmd: cat\n").unwrap();
        assert_eq!(config.scheme_names().collect::<Vec<_>>(), vec!["mem"]);
        assert_eq!(config.handlers("mem").unwrap()[&Verb::Read].scheme, "mem");
    }

    #[test]
    fn test_to_yaml_contains_schemes() {
        let config = Config::builtin().unwrap();
        let text = config.to_yaml().unwrap();
        assert!(text.contains("schemes:"));
        assert!(text.contains("gsutil"));
    }
}
