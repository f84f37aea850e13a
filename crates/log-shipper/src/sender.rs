// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Sequential shipping of a chunk plan.
//!
//! Chunks go out one after another in plan order. The first failing chunk
//! stops the run: later chunks are not attempted and chunks already accepted
//! by the sink stay shipped. Cancellation is observed between chunks only.

use log_chunker::ChunkPlan;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::sink::{ChunkSink, SinkError};

#[derive(Debug, thiserror::Error)]
pub enum SendError {
    /// `index` is zero-based.
    #[error("chunk {} of {total} was rejected: {source}", .index + 1)]
    Sink {
        index: usize,
        total: usize,
        #[source]
        source: SinkError,
    },

    #[error("cancelled after sending {sent} of {total} chunks")]
    Cancelled { sent: usize, total: usize },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SendReport {
    pub chunks: usize,
    pub rows: usize,
    pub bytes: usize,
}

pub struct BatchSender<'a> {
    sink: &'a dyn ChunkSink,
}

impl<'a> BatchSender<'a> {
    #[must_use]
    pub fn new(sink: &'a dyn ChunkSink) -> Self {
        BatchSender { sink }
    }

    /// Sends every chunk of `plan` in order.
    ///
    /// # Errors
    ///
    /// [`SendError::Sink`] for the first chunk the sink rejects and
    /// [`SendError::Cancelled`] when `cancel` fires before the plan is done.
    pub async fn send_all(
        &self,
        plan: &ChunkPlan,
        cancel: &CancellationToken,
    ) -> Result<SendReport, SendError> {
        let total = plan.len();
        let mut report = SendReport::default();

        for (index, chunk) in plan.iter().enumerate() {
            if cancel.is_cancelled() {
                info!("SEND | Cancelled after {}/{} chunks", report.chunks, total);
                return Err(SendError::Cancelled {
                    sent: report.chunks,
                    total,
                });
            }

            debug!(
                "SEND | Sending chunk {}/{} ({} rows, {} bytes)",
                index + 1,
                total,
                chunk.len(),
                chunk.size_bytes()
            );

            if let Err(source) = self.sink.send(chunk).await {
                error!("SEND | Chunk {}/{} failed: {}", index + 1, total, source);
                return Err(SendError::Sink {
                    index,
                    total,
                    source,
                });
            }

            report.chunks += 1;
            report.rows += chunk.len();
            report.bytes += chunk.size_bytes();
            info!("SEND | Sent chunk {}/{}", index + 1, total);
        }

        Ok(report)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use super::*;
    use async_trait::async_trait;
    use log_chunker::{plan_chunks, Chunk, Row};
    use std::sync::Mutex;

    /// Records the rows of every chunk it receives and fails on request.
    #[derive(Default)]
    pub(crate) struct RecordingSink {
        pub(crate) received: Mutex<Vec<usize>>,
        pub(crate) fail_at: Option<usize>,
        pub(crate) cancel_after: Option<(usize, CancellationToken)>,
    }

    #[async_trait]
    impl ChunkSink for RecordingSink {
        async fn send(&self, chunk: &Chunk) -> Result<(), SinkError> {
            let mut received = self.received.lock().unwrap();
            let call = received.len();
            if self.fail_at == Some(call) {
                return Err(SinkError::Status {
                    status: 500,
                    body: "boom".to_string(),
                });
            }
            received.push(chunk.len());
            if let Some((after, token)) = &self.cancel_after {
                if received.len() == *after {
                    token.cancel();
                }
            }
            Ok(())
        }
    }

    pub(crate) fn rows(n: usize) -> Vec<Row> {
        (0..n)
            .map(|i| [("n".to_string(), format!("{i:02}"))].into_iter().collect())
            .collect()
    }

    // Each row is `{"n":"00"}`, 10 bytes; a bound of 25 fits two per chunk.
    fn plan(n: usize) -> ChunkPlan {
        plan_chunks(rows(n), 25).unwrap()
    }

    #[tokio::test]
    async fn test_sends_every_chunk_in_order() {
        let sink = RecordingSink::default();
        let plan = plan(5);

        let report = BatchSender::new(&sink)
            .send_all(&plan, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(*sink.received.lock().unwrap(), vec![2, 2, 1]);
        assert_eq!(
            report,
            SendReport {
                chunks: 3,
                rows: 5,
                bytes: plan.total_bytes(),
            }
        );
    }

    #[tokio::test]
    async fn test_empty_plan_sends_nothing() {
        let sink = RecordingSink::default();
        let report = BatchSender::new(&sink)
            .send_all(&plan(0), &CancellationToken::new())
            .await
            .unwrap();

        assert!(sink.received.lock().unwrap().is_empty());
        assert_eq!(report, SendReport::default());
    }

    #[tokio::test]
    async fn test_stops_at_first_failure() {
        let sink = RecordingSink {
            fail_at: Some(1),
            ..RecordingSink::default()
        };

        let err = BatchSender::new(&sink)
            .send_all(&plan(6), &CancellationToken::new())
            .await
            .unwrap_err();

        assert_eq!(*sink.received.lock().unwrap(), vec![2]);
        match err {
            SendError::Sink { index, total, .. } => {
                assert_eq!(index, 1);
                assert_eq!(total, 3);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_error_message_is_one_based() {
        let err = SendError::Sink {
            index: 0,
            total: 4,
            source: SinkError::MissingToken,
        };
        assert!(err.to_string().starts_with("chunk 1 of 4 was rejected"));
    }

    #[tokio::test]
    async fn test_cancellation_between_chunks() {
        let token = CancellationToken::new();
        let sink = RecordingSink {
            cancel_after: Some((1, token.clone())),
            ..RecordingSink::default()
        };

        let err = BatchSender::new(&sink)
            .send_all(&plan(6), &token)
            .await
            .unwrap_err();

        assert_eq!(sink.received.lock().unwrap().len(), 1);
        assert!(matches!(err, SendError::Cancelled { sent: 1, total: 3 }));
    }

    #[tokio::test]
    async fn test_already_cancelled_sends_nothing() {
        let token = CancellationToken::new();
        token.cancel();
        let sink = RecordingSink::default();

        let err = BatchSender::new(&sink)
            .send_all(&plan(2), &token)
            .await
            .unwrap_err();

        assert!(sink.received.lock().unwrap().is_empty());
        assert!(matches!(err, SendError::Cancelled { sent: 0, total: 1 }));
    }
}
