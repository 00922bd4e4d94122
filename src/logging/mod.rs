//! Structured JSON-lines logging for booking sessions.
//!
//! A [`Logger`] forwards [`LogEvent`]s to a shared [`LogSink`]. Events below
//! the logger's minimum level are dropped before they reach the sink.

use serde::Serialize;
use serde_json::{Map, Value};
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use thiserror::Error;

pub type LogFields = Map<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

#[derive(Debug, Clone, Serialize)]
pub struct LogEvent {
    pub ts_ms: u128,
    pub level: LogLevel,
    pub target: String,
    pub message: String,
    #[serde(skip_serializing_if = "LogFields::is_empty", default)]
    pub fields: LogFields,
}

impl LogEvent {
    pub fn new(level: LogLevel, target: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            ts_ms: now_ms(),
            level,
            target: target.into(),
            message: message.into(),
            fields: LogFields::new(),
        }
    }

    pub fn field(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }
}

fn now_ms() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0)
}

pub type LoggingResult<T> = std::result::Result<T, LoggingError>;

/// Errors raised while writing log events.
#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("log sink lock poisoned")]
    Poisoned,
}

/// Destination for structured log events.
pub trait LogSink: Send + Sync {
    fn log(&self, event: &LogEvent) -> LoggingResult<()>;
}

/// Level-filtering front end over a shared [`LogSink`].
#[derive(Clone)]
pub struct Logger {
    sink: Arc<dyn LogSink>,
    min_level: LogLevel,
}

impl Logger {
    pub fn new<S>(sink: S) -> Self
    where
        S: LogSink + 'static,
    {
        Self::from_shared(Arc::new(sink))
    }

    /// Log into a sink the caller keeps a handle to (e.g. a [`MemorySink`]).
    pub fn from_shared(sink: Arc<dyn LogSink>) -> Self {
        Self {
            sink,
            min_level: LogLevel::Trace,
        }
    }

    pub fn with_min_level(mut self, level: LogLevel) -> Self {
        self.min_level = level;
        self
    }

    pub fn enabled(&self, level: LogLevel) -> bool {
        level >= self.min_level
    }

    pub fn log(&self, level: LogLevel, target: &str, message: &str) -> LoggingResult<()> {
        self.log_event(LogEvent::new(level, target, message))
    }

    pub fn log_event(&self, event: LogEvent) -> LoggingResult<()> {
        if !self.enabled(event.level) {
            return Ok(());
        }
        self.sink.log(&event)
    }
}

/// Appends one JSON object per line, truncating the file once it would grow
/// past `max_bytes` (zero disables the cap).
pub struct FileSink {
    path: PathBuf,
    max_bytes: u64,
    writer: Mutex<BufWriter<File>>,
}

impl FileSink {
    pub fn new(path: impl AsRef<Path>, max_bytes: u64) -> LoggingResult<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            path,
            max_bytes,
            writer: Mutex::new(BufWriter::new(file)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn over_cap(&self, file: &File, incoming: u64) -> std::io::Result<bool> {
        if self.max_bytes == 0 {
            return Ok(false);
        }
        Ok(file.metadata()?.len() + incoming > self.max_bytes)
    }
}

impl LogSink for FileSink {
    fn log(&self, event: &LogEvent) -> LoggingResult<()> {
        let mut line = serde_json::to_string(event)?;
        line.push('\n');

        let mut writer = self.writer.lock().map_err(|_| LoggingError::Poisoned)?;
        if self.over_cap(writer.get_ref(), line.len() as u64)? {
            let file = OpenOptions::new()
                .write(true)
                .truncate(true)
                .open(&self.path)?;
            *writer = BufWriter::new(file);
        }
        writer.write_all(line.as_bytes())?;
        writer.flush()?;
        Ok(())
    }
}

/// Keeps events in memory so hosts can forward or inspect them.
#[derive(Default)]
pub struct MemorySink {
    events: Mutex<Vec<LogEvent>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<LogEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    pub fn messages(&self) -> Vec<String> {
        self.events().into_iter().map(|event| event.message).collect()
    }
}

impl LogSink for MemorySink {
    fn log(&self, event: &LogEvent) -> LoggingResult<()> {
        self.events
            .lock()
            .map_err(|_| LoggingError::Poisoned)?
            .push(event.clone());
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl LogSink for NullSink {
    fn log(&self, _event: &LogEvent) -> LoggingResult<()> {
        Ok(())
    }
}

pub fn event_with_fields(
    level: LogLevel,
    target: &str,
    message: &str,
    fields: impl IntoIterator<Item = (String, Value)>,
) -> LogEvent {
    let mut event = LogEvent::new(level, target, message);
    event.fields.extend(fields);
    event
}

pub fn json_kv(key: &str, value: impl Into<Value>) -> (String, Value) {
    (key.to_string(), value.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn min_level_filters_events() {
        let sink = Arc::new(MemorySink::new());
        let logger = Logger::from_shared(sink.clone()).with_min_level(LogLevel::Info);

        logger.log(LogLevel::Debug, "sqft::test", "hidden").unwrap();
        logger.log(LogLevel::Warn, "sqft::test", "shown").unwrap();

        assert_eq!(sink.messages(), vec!["shown".to_string()]);
    }

    #[test]
    fn events_serialize_with_fields() {
        let event = event_with_fields(
            LogLevel::Info,
            "sqft::session",
            "unit_toggled",
            [json_kv("unit", "R1C1"), json_kv("selected", true)],
        );
        let line = serde_json::to_value(&event).unwrap();
        assert_eq!(line["level"], "info");
        assert_eq!(line["fields"]["unit"], "R1C1");
        assert_eq!(event.field("selected"), Some(&Value::Bool(true)));

        let bare = serde_json::to_value(LogEvent::new(LogLevel::Warn, "t", "m")).unwrap();
        assert!(bare.get("fields").is_none());
    }

    #[test]
    fn file_sink_truncates_past_cap() {
        let path = std::env::temp_dir().join(format!("sqft_grid_log_{}.jsonl", std::process::id()));
        let _ = fs::remove_file(&path);

        let sink = FileSink::new(&path, 200).unwrap();
        let event = LogEvent::new(LogLevel::Info, "sqft::test", "x".repeat(60));
        for _ in 0..5 {
            sink.log(&event).unwrap();
        }

        let contents = fs::read_to_string(sink.path()).unwrap();
        assert!(contents.len() <= 200);
        assert!(contents.lines().count() >= 1);
        let _ = fs::remove_file(&path);
    }
}
