// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for source order, aliases and environment redirection.

mod common;

use common::{EnvGuard, MockSource};
use layercfg::prelude::*;
use serial_test::serial;
use std::io::Write;
use tempfile::NamedTempFile;

fn json_file(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{}", content).unwrap();
    file
}

#[test]
#[serial]
fn test_precedence_env_over_json() {
    let mut env_guard = EnvGuard::new();
    env_guard.set("PRECEDENCE_TEST_KEY", "env_value");
    let file = json_file(r#"{"precedence-test-key": "json_value", "json-only": "json"}"#);

    let reader = Reader::builder()
        .with_env_vars()
        .with_json_file(file.path())
        .unwrap()
        .build()
        .unwrap();

    // the environment source sanitizes and upper-cases the key
    assert_eq!(reader.string("precedence-test-key"), "env_value");
    assert_eq!(reader.string("json-only"), "json");
}

#[test]
#[serial]
fn test_precedence_json_over_env_when_registered_first() {
    let mut env_guard = EnvGuard::new();
    env_guard.set("PRECEDENCE_ORDER_KEY", "env_value");
    let file = json_file(r#"{"precedence_order_key": "json_value"}"#);

    let reader = Reader::builder()
        .with_json_file(file.path())
        .unwrap()
        .with_env_vars()
        .build()
        .unwrap();

    assert_eq!(reader.string("precedence_order_key"), "json_value");
}

#[test]
#[serial]
fn test_env_prefix() {
    let mut env_guard = EnvGuard::new();
    env_guard.set("MYAPP_DATABASE_URL", "postgres://db/app");
    env_guard.set("DATABASE_URL", "postgres://other/app");

    let reader = Reader::builder()
        .with_env_prefix("MYAPP_")
        .build()
        .unwrap();

    let url = reader.url("database-url").unwrap();
    assert_eq!(url.host_str(), Some("db"));
}

#[test]
#[serial]
fn test_env_redirection() {
    let mut env_guard = EnvGuard::new();
    env_guard.set("FOO", "baz");

    let reader = Reader::builder()
        .with_source(MockSource::new("a").with_value("bar", "env:FOO"))
        .with_env_vars()
        .build()
        .unwrap();

    assert_eq!(reader.string("bar"), "baz");
}

#[test]
#[serial]
fn test_env_redirection_to_unset_variable_falls_through() {
    std::env::remove_var("REDIRECT_TARGET_UNSET");

    let reader = Reader::builder()
        .with_source(MockSource::new("a").with_value("bar", "env:REDIRECT_TARGET_UNSET"))
        .with_env_vars()
        .with_source(DefaultSource::new().with("bar", "default"))
        .build()
        .unwrap();

    // later sources are asked for the redirected key, which only the
    // environment understands
    assert!(reader.string_error("bar").unwrap_err().is_key_not_found());
}

#[test]
fn test_alias_resolves_across_sources() {
    let reader = Reader::builder()
        .with_source(MockSource::new("first").with_value("legacy-port", "1111"))
        .with_source(DefaultSource::new().with("port", 8080))
        .with_alias("port", "legacy-port")
        .build()
        .unwrap();

    // the canonical key is tried against every source before its alias
    assert_eq!(reader.int("port"), 8080);
    assert_eq!(reader.int("legacy-port"), 1111);
}

#[test]
fn test_alias_used_when_canonical_missing() {
    let reader = Reader::builder()
        .with_source(MockSource::new("first").with_value("string", "asdf"))
        .with_alias("string", "string2")
        .with_alias("string", "string3")
        .build()
        .unwrap();

    assert_eq!(reader.strings("string2"), vec!["asdf"]);
    assert_eq!(reader.strings("string3"), vec!["asdf"]);
    assert!(reader.strings_error("string4").is_err());
}

#[test]
#[should_panic]
fn test_alias_conflict_panics() {
    let mut reader = Reader::builder().build().unwrap();
    reader.register_alias("string", "string2");
    reader.register_alias("other", "string2");
}

#[test]
fn test_defaults_are_last_resort() {
    let reader = Reader::builder()
        .with_source(JsonSource::from_content(r#"{"timeout": "30s"}"#).unwrap())
        .with_source(
            DefaultSource::new()
                .with("timeout", std::time::Duration::from_secs(5))
                .with("retries", 3),
        )
        .build()
        .unwrap();

    assert_eq!(reader.duration("timeout"), std::time::Duration::from_secs(30));
    assert_eq!(reader.int("retries"), 3);
}
