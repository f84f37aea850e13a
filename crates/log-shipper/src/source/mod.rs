// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Row sources.
//!
//! A source produces the complete, ordered list of rows for one time window.
//! Records arrive as JSON objects and are flattened into [`Row`]s: string
//! values are kept verbatim, `null` becomes an empty string and any other
//! value (numbers, booleans, nested objects, arrays) is stored as its compact
//! JSON text.

pub mod file;
pub mod http;

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use log_chunker::Row;
use serde_json::{Map, Value};

use crate::config::{SourceConfig, SourceKind};

pub use file::FileSource;
pub use http::HttpSource;

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} answered with status {status}: {body}")]
    Status {
        url: String,
        status: u16,
        body: String,
    },

    #[error("could not decode response: {0}")]
    Decode(String),

    #[error("record {index} is not a JSON object")]
    NotAnObject { index: usize },

    #[error("stopped after {0} pages, the cursor never ran out")]
    TooManyPages(u32),

    #[error("could not read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no bearer token available for the source")]
    MissingToken,

    #[error("could not build HTTP client: {0}")]
    Client(String),
}

/// Half-open time range `[start, end)` of events to fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    #[must_use]
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        TimeWindow { start, end }
    }

    /// The window of length `lookback` that ends now.
    #[must_use]
    pub fn ending_now(lookback: Duration) -> Self {
        let end = Utc::now();
        let lookback = chrono::Duration::from_std(lookback).unwrap_or(chrono::Duration::zero());
        TimeWindow {
            start: end - lookback,
            end,
        }
    }

    /// Start formatted as RFC 3339 with millisecond precision.
    #[must_use]
    pub fn start_param(&self) -> String {
        self.start.to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    #[must_use]
    pub fn end_param(&self) -> String {
        self.end.to_rfc3339_opts(SecondsFormat::Millis, true)
    }
}

#[async_trait]
pub trait RowSource: Send + Sync {
    /// Short name used in log lines.
    fn name(&self) -> &str;

    /// Fetches every row of `window`, in the order the source returns them.
    async fn fetch(&self, window: &TimeWindow) -> Result<Vec<Row>, SourceError>;
}

/// Converts one JSON value to the string stored in a row.
#[must_use]
pub fn value_to_field(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Flattens a JSON object into a row.
#[must_use]
pub fn flatten_object(object: Map<String, Value>) -> Row {
    object
        .into_iter()
        .map(|(key, value)| (key, value_to_field(value)))
        .collect()
}

/// Flattens the `index`-th record of a batch, which must be a JSON object.
///
/// # Errors
///
/// Returns [`SourceError::NotAnObject`] for any other JSON value.
pub fn flatten_record(index: usize, record: Value) -> Result<Row, SourceError> {
    match record {
        Value::Object(object) => Ok(flatten_object(object)),
        _ => Err(SourceError::NotAnObject { index }),
    }
}

/// Builds the source selected by `config.kind`.
///
/// # Errors
///
/// Fails when the HTTP client cannot be built or a required setting is
/// missing for the selected kind.
pub fn build_source(config: &SourceConfig) -> Result<Box<dyn RowSource>, SourceError> {
    match config.kind {
        SourceKind::Http => Ok(Box::new(HttpSource::from_config(config)?)),
        SourceKind::File => {
            let path = config.path.clone().ok_or_else(|| SourceError::Io {
                path: PathBuf::new(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "no source path set"),
            })?;
            Ok(Box::new(FileSource::new(path)))
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn test_value_to_field() {
        assert_eq!(value_to_field(json!("plain")), "plain");
        assert_eq!(value_to_field(json!(null)), "");
        assert_eq!(value_to_field(json!(42)), "42");
        assert_eq!(value_to_field(json!(true)), "true");
        assert_eq!(
            value_to_field(json!({"id": "u1", "type": "user"})),
            r#"{"id":"u1","type":"user"}"#
        );
        assert_eq!(value_to_field(json!([1, "a"])), r#"[1,"a"]"#);
    }

    #[test]
    fn test_flatten_record() {
        let record = json!({
            "createdAt": "2024-03-01T10:00:00.000Z",
            "event": "sign_in",
            "createdBy": {"email": "alice@example.com"},
            "rxBytes": 1024,
        });

        let row = flatten_record(0, record).unwrap();

        assert_eq!(row["createdAt"], "2024-03-01T10:00:00.000Z");
        assert_eq!(row["event"], "sign_in");
        assert_eq!(row["createdBy"], r#"{"email":"alice@example.com"}"#);
        assert_eq!(row["rxBytes"], "1024");
    }

    #[test]
    fn test_flatten_record_rejects_non_objects() {
        let err = flatten_record(7, json!(["not", "an", "object"])).unwrap_err();
        assert!(matches!(err, SourceError::NotAnObject { index: 7 }));
    }

    #[test]
    fn test_time_window_params() {
        let window = TimeWindow::new(
            Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 3, 1, 9, 12, 0).unwrap(),
        );
        assert_eq!(window.start_param(), "2024-03-01T08:00:00.000Z");
        assert_eq!(window.end_param(), "2024-03-01T09:12:00.000Z");
    }

    #[test]
    fn test_time_window_ending_now() {
        let window = TimeWindow::ending_now(Duration::from_secs(4_320));
        assert_eq!((window.end - window.start).num_seconds(), 4_320);
        assert!(window.end <= Utc::now());
    }

    #[test]
    fn test_build_file_source() {
        let config = SourceConfig {
            kind: SourceKind::File,
            path: Some(PathBuf::from("/tmp/rows.ndjson")),
            ..SourceConfig::default()
        };
        let source = build_source(&config).unwrap();
        assert_eq!(source.name(), "file");
    }
}
