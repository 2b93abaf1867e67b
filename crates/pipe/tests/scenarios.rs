//! End-to-end scenarios against the built-in handler table
//!
//! These spawn real local tools (`ls`, `dd`, `/bin/sh`) but never touch the
//! network.

use std::io::{Read, Write};

use objio_core::{Config, Error, Verb};
use objio_pipe::{GenericStream, Opened, generic_open, object_open};

fn builtin() -> Config {
    Config::builtin().expect("built-in configuration parses")
}

fn read_all(config: &Config, url: &str, verb: Verb) -> objio_core::Result<String> {
    let mut pipe = object_open(config, url, verb, None)?
        .into_stream()
        .expect("handler spawns a command");
    let mut out = String::new();
    pipe.read_to_string(&mut out).map_err(Error::from_io)?;
    pipe.close()?;
    Ok(out)
}

#[test]
#[cfg(unix)]
fn list_local_directory() {
    let listing = read_all(&builtin(), "file:/etc", Verb::List).unwrap();
    assert!(listing.lines().any(|line| line.ends_with("passwd")), "{listing}");
}

#[test]
fn write_then_read_local_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("test.txt");
    let url = format!("file:{}", path.display());
    let config = builtin();

    let mut writer = object_open(&config, &url, Verb::Write, None)
        .unwrap()
        .into_stream()
        .unwrap();
    writer.write_all(b"hello world").unwrap();
    assert!(writer.close().unwrap().success());

    assert_eq!(std::fs::read_to_string(&path).unwrap(), "hello world");
    assert_eq!(read_all(&config, &url, Verb::Read).unwrap(), "hello world");
}

#[test]
fn semicolon_is_part_of_local_file_name() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("report;v2.txt");
    let url = format!("file:{}", path.display());
    let config = builtin();

    let mut writer = object_open(&config, &url, Verb::Write, None)
        .unwrap()
        .into_stream()
        .unwrap();
    writer.write_all(b"second draft").unwrap();
    assert!(writer.close().unwrap().success());

    assert!(!dir.path().join("report").exists());
    assert_eq!(read_all(&config, &url, Verb::Read).unwrap(), "second draft");
}

#[test]
fn uppercase_scheme_resolves() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("upper.txt");
    std::fs::write(&path, "shouting").unwrap();

    let url = format!("FILE:{}", path.display());
    assert_eq!(read_all(&builtin(), &url, Verb::Read).unwrap(), "shouting");
}

#[test]
fn delete_local_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("gone.txt");
    std::fs::write(&path, "bye").unwrap();

    let url = format!("file:{}", path.display());
    read_all(&builtin(), &url, Verb::Delete).unwrap();
    assert!(!path.exists());
}

#[test]
fn unknown_verb_is_rejected() {
    let err = "explode".parse::<Verb>().unwrap_err();
    assert!(matches!(err, Error::InvalidVerb(ref verb) if verb == "explode"));
    assert_eq!(err.exit_code(), 2);
}

#[test]
fn auth_is_message_only() {
    let opened = object_open(&builtin(), "gs://bucket", Verb::Auth, None).unwrap();
    match opened {
        Opened::Message(text) => assert!(text.contains("gcloud auth login")),
        Opened::Stream(pipe) => panic!("expected a message, spawned {:?}", pipe.argv()),
    }
}

#[test]
fn failing_handler_is_reported() {
    let config = Config::from_yaml_str(
        "schemes:\n  broken:\n    read:\n      cmd: \"exit 1\"\n",
    )
    .unwrap();

    let err = read_all(&config, "broken://anything", Verb::Read).unwrap_err();
    assert!(
        matches!(err, Error::CommandFailed { status: 1, .. }),
        "unexpected error: {err}"
    );
    assert_eq!(err.exit_code(), 4);
}

#[test]
fn unsupported_verb_for_scheme() {
    let err = object_open(&builtin(), "https://example.com/x", Verb::Write, None).unwrap_err();
    assert!(matches!(err, Error::UnsupportedVerb { .. }));
    assert_eq!(err.exit_code(), 5);
}

#[test]
fn generic_open_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data.bin");
    let path = path.to_str().unwrap();
    let config = builtin();
    let payload: Vec<u8> = (0..=255u8).cycle().take(100_000).collect();

    let mut out = generic_open(&config, path, "wb").unwrap().into_stream().unwrap();
    out.write_all(&payload).unwrap();
    out.close().unwrap();

    let mut input = generic_open(&config, path, "rb").unwrap().into_stream().unwrap();
    assert!(matches!(input, GenericStream::File(_)));
    let mut back = Vec::new();
    input.read_to_end(&mut back).unwrap();
    input.close().unwrap();
    assert_eq!(back, payload);
}

#[test]
fn user_file_overrides_builtin_handler() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("objio.yaml");
    std::fs::write(
        &config_path,
        "schemes:\n  gs:\n    read:\n      cmd: [\"echo\", \"{netloc}/{filename}\"]\n",
    )
    .unwrap();

    let config = objio_core::ConfigLoader::with_paths(vec![config_path]).load().unwrap();
    let out = read_all(&config, "gs://bucket/dir/obj.txt", Verb::Read).unwrap();
    assert_eq!(out.trim(), "bucket/obj.txt");

    // Untouched handlers of the same scheme survive the merge.
    let handler = config.resolve("gs://bucket", Verb::Buckets).unwrap();
    assert!(handler.command.is_some());
}
