//! Integration tests for the logging system

use async_trait::async_trait;
use bridge_traits::error::Result as SinkResult;
use bridge_traits::{LogEntry, LogLevel, LoggerSink};
use core_runtime::logging::{init_logging, redact_uri, strip_path, LogFormat, LoggingConfig};
use core_runtime::Error;
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct RecordingSink {
    entries: Mutex<Vec<LogEntry>>,
}

#[async_trait]
impl LoggerSink for RecordingSink {
    async fn log(&self, entry: LogEntry) -> SinkResult<()> {
        self.entries.lock().unwrap().push(entry);
        Ok(())
    }

    fn min_level(&self) -> LogLevel {
        LogLevel::Debug
    }
}

// The global subscriber can only be installed once per process, so a single
// test owns initialization.
#[test]
fn test_init_logging_mirrors_into_sink_once() {
    let sink = Arc::new(RecordingSink::default());
    let config = LoggingConfig::default()
        .with_format(LogFormat::Compact)
        .with_level(LogLevel::Debug)
        .with_logger_sink(sink.clone());

    init_logging(config).expect("first initialization succeeds");

    tracing::debug!(
        target: "core_slideshow::session",
        uri = "content://media/external/images/media/7",
        "slide changed"
    );
    // Outside the workspace targets and below warn
    tracing::info!(target: "sqlx::query", "select 1");

    {
        let entries = sink.entries.lock().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].message, "slide changed");
        assert_eq!(
            entries[0].fields.get("uri").map(String::as_str),
            Some("content://…/7")
        );
    }

    let second = init_logging(LoggingConfig::default());
    assert!(matches!(second, Err(Error::Logging(_))));
}

#[test]
fn test_uri_redaction() {
    assert_eq!(
        redact_uri("file:///storage/emulated/0/DCIM/Camera/IMG_0001.jpg"),
        "file://…/IMG_0001.jpg"
    );
    assert_eq!(redact_uri("not a uri/holiday.png"), "holiday.png");
}

#[test]
fn test_path_stripping() {
    assert_eq!(strip_path("/home/user/Pictures/cat.png"), "cat.png");
    assert_eq!(strip_path("D:\\Photos\\dog.jpg"), "dog.jpg");
    assert_eq!(strip_path("filename.jpg"), "filename.jpg");
    assert_eq!(strip_path(""), "");
}

#[test]
fn test_config_chaining() {
    let config = LoggingConfig::default()
        .with_format(LogFormat::Json)
        .with_level(LogLevel::Warn)
        .with_uri_redaction(false)
        .with_spans(false)
        .with_target(false)
        .with_thread_info(true);

    assert_eq!(config.format, LogFormat::Json);
    assert_eq!(config.level, LogLevel::Warn);
    assert!(!config.redact_uris);
    assert!(!config.enable_spans);
    assert!(!config.display_target);
    assert!(config.display_thread_info);
}
