// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the configuration sources behind a reader.

mod common;

use common::MockSource;
use layercfg::adapters::{
    first_or_nop, ConditionalSource, DefaultSource, DirectorySource, JsonSource, MultiSource,
    NoopSource,
};
use layercfg::domain::ConfigError;
use layercfg::service::Reader;
use std::fs;
use std::io::Write;
use std::sync::atomic::Ordering;
use tempfile::{NamedTempFile, TempDir};

#[test]
fn test_json_content() {
    let reader = Reader::builder()
        .with_source(JsonSource::from_content(r#"{"key": "value"}"#).unwrap())
        .build()
        .unwrap();

    assert_eq!(reader.strings("key"), vec!["value"]);
    assert!(matches!(
        reader.strings_error("missing"),
        Err(ConfigError::KeyNotFound { .. })
    ));
}

#[test]
fn test_json_numbers_and_arrays() {
    let reader = Reader::builder()
        .with_source(
            JsonSource::from_content(concat!(
                r#"{"list": [1, 2, 3], "float": 1234.5678, "#,
                r#""big": 12345678901234, "nested": {"a": 1}}"#,
            ))
            .unwrap(),
        )
        .build()
        .unwrap();

    assert_eq!(reader.strings("list"), vec!["1", "2", "3"]);
    assert_eq!(reader.ints("list"), vec![1, 2, 3]);
    assert_eq!(reader.strings("float"), vec!["1234.5678"]);
    assert_eq!(reader.string("big"), "12345678901234");
    assert_eq!(reader.string_error("nested").unwrap(), "");
}

#[test]
fn test_json_file() {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, r#"{{"database-host": "db.internal", "workers": 8}}"#).unwrap();

    let reader = Reader::builder()
        .with_json_file(file.path())
        .unwrap()
        .build()
        .unwrap();
    assert_eq!(reader.string("database-host"), "db.internal");
    assert_eq!(reader.int("workers"), 8);
}

#[test]
fn test_required_json_file_missing() {
    assert!(Reader::builder()
        .with_json_file("/nonexistent/config.json")
        .is_err());
    assert!(JsonSource::from_optional_file("/nonexistent/config.json")
        .unwrap()
        .is_none());
}

#[test]
fn test_int_errors() {
    let reader = Reader::builder()
        .with_source(DefaultSource::new().with("int-bad", "not an integer"))
        .build()
        .unwrap();

    assert!(reader.ints_error("int-bad").unwrap_err().is_malformed());
    assert!(reader.ints_error("int-missing").unwrap_err().is_key_not_found());
}

#[test]
fn test_defaults_append() {
    let reader = Reader::builder()
        .with_source(DefaultSource::new().with("key", "v1").with("key", "v2"))
        .build()
        .unwrap();
    assert_eq!(reader.strings("key"), vec!["v1", "v2"]);
    assert_eq!(reader.string("key"), "v1");
}

#[test]
fn test_conditional_defaults() {
    let reader = Reader::builder()
        .with_source(ConditionalSource::new(
            || false,
            DefaultSource::new().with("key", "hidden"),
        ))
        .with_source(ConditionalSource::new(
            || true,
            DefaultSource::new().with("key", "shown"),
        ))
        .build()
        .unwrap();
    assert_eq!(reader.string("key"), "shown");
}

#[test]
fn test_directory_source() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("File1"), "My file contents").unwrap();
    fs::write(dir.path().join("db.password"), "s3cret").unwrap();

    let reader = Reader::builder()
        .with_source(DirectorySource::required(dir.path()))
        .build()
        .unwrap();

    assert_eq!(reader.strings("file1"), vec!["My file contents"]);
    assert_eq!(reader.string("db.password"), "s3cret");
}

#[test]
fn test_required_directory_missing_fails_build() {
    let result = Reader::builder()
        .with_source(DirectorySource::required("/nonexistent/secrets"))
        .build();
    assert!(matches!(result, Err(ConfigError::SourceError { .. })));

    let reader = Reader::builder()
        .with_source(DirectorySource::optional("/nonexistent/secrets"))
        .build()
        .unwrap();
    assert!(reader.strings_error("anything").is_err());
}

#[test]
fn test_optional_directories() {
    let first = TempDir::new().unwrap();
    let second = TempDir::new().unwrap();
    fs::write(first.path().join("shared"), "first").unwrap();
    fs::write(second.path().join("shared"), "second").unwrap();
    fs::write(second.path().join("only-second"), "second").unwrap();

    let dirs = [
        first.path().to_path_buf(),
        "/nonexistent".into(),
        second.path().to_path_buf(),
    ];
    let reader = Reader::builder()
        .with_source(DirectorySource::from_optional_directories(&dirs))
        .build()
        .unwrap();

    assert_eq!(reader.string("shared"), "first");
    assert_eq!(reader.string("only_second"), "second");
}

#[test]
fn test_multi_source_is_one_layer() {
    let multi = MultiSource::new()
        .with_source(DefaultSource::new().with("a", "multi-a"))
        .with_optional_source(None::<DefaultSource>)
        .with_source(DefaultSource::new().with("b", "multi-b"));

    let reader = Reader::builder()
        .with_source(multi)
        .with_source(DefaultSource::new().with("a", "later").with("c", "later-c"))
        .build()
        .unwrap();

    assert_eq!(reader.string("a"), "multi-a");
    assert_eq!(reader.string("b"), "multi-b");
    assert_eq!(reader.string("c"), "later-c");
}

#[test]
fn test_first_or_nop() {
    let reader = Reader::builder()
        .with_source(first_or_nop([
            None,
            Some(DefaultSource::new().with("key", "first")),
            Some(DefaultSource::new().with("key", "second")),
        ]))
        .with_source(first_or_nop(Vec::<Option<DefaultSource>>::new()))
        .with_source(NoopSource)
        .build()
        .unwrap();

    assert_eq!(reader.string("key"), "first");
    assert_eq!(reader.len(), 3);
}

#[test]
fn test_each_source_initialized_once() {
    let first = MockSource::new("first").with_value("key", "value");
    let second = MockSource::new("second");
    let (first_count, second_count) = (first.counter(), second.counter());

    let reader = Reader::builder()
        .with_source(first)
        .with_source(second)
        .build()
        .unwrap();
    for _ in 0..3 {
        assert_eq!(reader.string("key"), "value");
    }

    assert_eq!(first_count.load(Ordering::SeqCst), 1);
    assert_eq!(second_count.load(Ordering::SeqCst), 1);
}

#[test]
fn test_found_with_no_values() {
    let reader = Reader::builder()
        .with_source(MockSource::new("mock").with_values("empty", &[]))
        .with_source(DefaultSource::new().with("empty", "fallback"))
        .build()
        .unwrap();

    assert!(reader.strings("empty").is_empty());
    assert_eq!(reader.string_error("empty").unwrap(), "");
    assert!(reader.int_error("empty").unwrap_err().is_malformed());
}

#[test]
fn test_reader_shared_between_threads() {
    let reader = std::sync::Arc::new(
        Reader::builder()
            .with_source(DefaultSource::new().with("key", "value"))
            .build()
            .unwrap(),
    );

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let reader = std::sync::Arc::clone(&reader);
            std::thread::spawn(move || reader.string("key"))
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.join().unwrap(), "value");
    }
}

#[cfg(feature = "cli")]
mod cli {
    use super::*;
    use layercfg::adapters::{CliConfigFileSource, CliSource, ErrorMode};

    #[test]
    fn test_cli_flags_and_override_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"host": "from-override", "port": "1"}}"#).unwrap();
        let path = file.path().to_string_lossy().to_string();

        let args = vec![
            "./app".to_string(),
            "--port=9000".to_string(),
            "--config".to_string(),
            path,
        ];

        let reader = Reader::builder()
            .with_source(
                CliSource::new()
                    .flag("port", "Port to listen on")
                    .error_mode(ErrorMode::Panic)
                    .args(args.clone()),
            )
            .with_source(CliConfigFileSource::default().args(args))
            .with_source(DefaultSource::new().with("host", "localhost"))
            .build()
            .unwrap();

        assert_eq!(reader.int("port"), 9000);
        assert_eq!(reader.string("host"), "from-override");
    }
}
