// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Newline-delimited JSON file source. The whole file is one batch; the time
//! window is not applied.

use std::path::PathBuf;

use async_trait::async_trait;
use log_chunker::Row;
use serde_json::Value;
use tracing::debug;

use crate::source::{flatten_record, RowSource, SourceError, TimeWindow};

#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    #[must_use]
    pub fn new(path: PathBuf) -> Self {
        FileSource { path }
    }

    fn parse(contents: &str) -> Result<Vec<Row>, SourceError> {
        let mut rows = Vec::new();
        for (number, line) in contents.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let record: Value = serde_json::from_str(line)
                .map_err(|e| SourceError::Decode(format!("line {}: {e}", number + 1)))?;
            rows.push(flatten_record(rows.len(), record)?);
        }
        Ok(rows)
    }
}

#[async_trait]
impl RowSource for FileSource {
    fn name(&self) -> &str {
        "file"
    }

    async fn fetch(&self, _window: &TimeWindow) -> Result<Vec<Row>, SourceError> {
        let contents =
            tokio::fs::read_to_string(&self.path)
                .await
                .map_err(|source| SourceError::Io {
                    path: self.path.clone(),
                    source,
                })?;

        let rows = Self::parse(&contents)?;
        debug!("SOURCE | Read {} rows from {}", rows.len(), self.path.display());
        Ok(rows)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::time::Duration;

    fn window() -> TimeWindow {
        TimeWindow::ending_now(Duration::from_secs(60))
    }

    #[tokio::test]
    async fn test_reads_rows_and_skips_blank_lines() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, r#"{{"user":"alice","action":"login"}}"#).unwrap();
        writeln!(file).unwrap();
        writeln!(file, r#"{{"user":"bob","bytes":512,"tags":null}}"#).unwrap();

        let source = FileSource::new(file.path().to_path_buf());
        let rows = source.fetch(&window()).await.unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["action"], "login");
        assert_eq!(rows[1]["bytes"], "512");
        assert_eq!(rows[1]["tags"], "");
    }

    #[tokio::test]
    async fn test_malformed_line_reports_line_number() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, r#"{{"user":"alice"}}"#).unwrap();
        writeln!(file).unwrap();
        writeln!(file, r#"{{"user":"#).unwrap();

        let source = FileSource::new(file.path().to_path_buf());
        let err = source.fetch(&window()).await.unwrap_err();

        match err {
            SourceError::Decode(message) => assert!(message.starts_with("line 3:"), "{message}"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let source = FileSource::new(dir.path().join("absent.ndjson"));

        let err = source.fetch(&window()).await.unwrap_err();
        assert!(matches!(err, SourceError::Io { .. }));
    }

    #[test]
    fn test_non_object_line() {
        let err = FileSource::parse("{\"a\":\"1\"}\n[1,2]\n").unwrap_err();
        assert!(matches!(err, SourceError::NotAnObject { index: 1 }));
    }
}
