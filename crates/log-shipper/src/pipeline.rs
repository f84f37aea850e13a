// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! One shipping run: fetch, plan, send.
//!
//! The whole window is fetched and planned before the first request goes out,
//! so a row that can never fit is reported without shipping anything.

use std::time::Duration;

use log_chunker::{ChunkError, ChunkObserver, Chunker};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::error::ShipperError;
use crate::sender::BatchSender;
use crate::sink::ChunkSink;
use crate::source::{RowSource, TimeWindow};

/// Forwards chunk planning events to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl ChunkObserver for TracingObserver {
    fn chunk_closed(&self, index: usize, rows: usize, size_bytes: usize) {
        debug!(
            "CHUNK | Chunk {} holds {} rows ({} bytes)",
            index + 1,
            rows,
            size_bytes
        );
    }

    fn planning_failed(&self, error: &ChunkError) {
        error!("CHUNK | Planning failed: {}", error);
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunReport {
    pub rows: usize,
    pub chunks: usize,
    pub bytes: usize,
}

pub struct Pipeline {
    source: Box<dyn RowSource>,
    sink: Box<dyn ChunkSink>,
    max_chunk_bytes: usize,
    lookback: Duration,
}

impl Pipeline {
    #[must_use]
    pub fn new(
        source: Box<dyn RowSource>,
        sink: Box<dyn ChunkSink>,
        max_chunk_bytes: usize,
        lookback: Duration,
    ) -> Self {
        Pipeline {
            source,
            sink,
            max_chunk_bytes,
            lookback,
        }
    }

    /// Ships the window of `lookback` that ends now.
    ///
    /// # Errors
    ///
    /// See [`Pipeline::run_window`].
    pub async fn run_once(&self, cancel: &CancellationToken) -> Result<RunReport, ShipperError> {
        self.run_window(&TimeWindow::ending_now(self.lookback), cancel)
            .await
    }

    /// Fetches every row of `window`, plans them and sends the chunks in order.
    ///
    /// # Errors
    ///
    /// Fails on the first fetch, planning or send error. A planning error
    /// means no chunk was sent.
    pub async fn run_window(
        &self,
        window: &TimeWindow,
        cancel: &CancellationToken,
    ) -> Result<RunReport, ShipperError> {
        let rows = self.source.fetch(window).await?;
        let total_rows = rows.len();
        info!(
            "PIPELINE | Fetched {} rows from the {} source",
            total_rows,
            self.source.name()
        );

        if rows.is_empty() {
            return Ok(RunReport::default());
        }

        let plan = Chunker::new(self.max_chunk_bytes)?
            .with_observer(&TracingObserver)
            .plan(rows)?;
        info!(
            "PIPELINE | Planned {} chunks ({} bytes) for {} rows",
            plan.len(),
            plan.total_bytes(),
            total_rows
        );

        let sent = BatchSender::new(self.sink.as_ref())
            .send_all(&plan, cancel)
            .await?;
        info!(
            "PIPELINE | Shipped {} rows in {} chunks",
            sent.rows, sent.chunks
        );

        Ok(RunReport {
            rows: sent.rows,
            chunks: sent.chunks,
            bytes: sent.bytes,
        })
    }
}
