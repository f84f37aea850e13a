// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use log_chunker::ChunkError;

use crate::config::ConfigError;
use crate::sender::SendError;
use crate::sink::SinkError;
use crate::source::SourceError;

/// Errors that can end a shipping run.
#[derive(Debug, thiserror::Error)]
#[allow(clippy::module_name_repetitions)]
pub enum ShipperError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to fetch rows: {0}")]
    Source(#[from] SourceError),

    #[error("failed to plan chunks: {0}")]
    Chunk(#[from] ChunkError),

    #[error("failed to set up the sink: {0}")]
    Sink(#[from] SinkError),

    #[error("failed to ship chunks: {0}")]
    Send(#[from] SendError),
}

impl ShipperError {
    /// Whether the run was stopped by a shutdown request rather than a fault.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ShipperError::Send(SendError::Cancelled { .. }))
    }
}
