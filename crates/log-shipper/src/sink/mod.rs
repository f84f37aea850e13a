// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Destinations for planned chunks.

pub mod ingestion;

use async_trait::async_trait;
use log_chunker::{Chunk, SerializationError};

pub use ingestion::IngestionSink;

#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("failed to send request: {0}")]
    Request(#[from] reqwest::Error),

    #[error("ingestion endpoint answered with status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("failed to encode chunk: {0}")]
    Encode(#[from] SerializationError),

    #[error("no bearer token available for the sink")]
    MissingToken,

    #[error("could not build HTTP client: {0}")]
    Client(String),
}

/// Delivers one chunk per call. Implementations make a single attempt and
/// report the outcome; whether to continue is the caller's decision.
#[async_trait]
pub trait ChunkSink: Send + Sync {
    async fn send(&self, chunk: &Chunk) -> Result<(), SinkError>;
}
