// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::time::{Duration, Instant};

use async_trait::async_trait;
use log_chunker::Chunk;
use reqwest::header::CONTENT_TYPE;
use tracing::debug;

use crate::config::SinkConfig;
use crate::sink::{ChunkSink, SinkError};
use crate::token::TokenFactory;

/// Posts chunks to a data collection rule stream of a logs ingestion API.
#[derive(Debug, Clone)]
pub struct IngestionSink {
    client: reqwest::Client,
    url: String,
    token: TokenFactory,
}

impl IngestionSink {
    /// # Errors
    ///
    /// Fails when the HTTP client cannot be built.
    pub fn from_config(config: &SinkConfig) -> Result<Self, SinkError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| SinkError::Client(e.to_string()))?;

        Ok(IngestionSink {
            client,
            url: ingestion_url(config),
            token: TokenFactory::new(config.token.expose()),
        })
    }

    #[must_use]
    pub fn with_token_factory(mut self, token: TokenFactory) -> Self {
        self.token = token;
        self
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }
}

fn ingestion_url(config: &SinkConfig) -> String {
    format!(
        "{}/dataCollectionRules/{}/streams/{}?api-version={}",
        config.endpoint.trim_end_matches('/'),
        config.rule_id,
        config.stream_name,
        config.api_version
    )
}

#[async_trait]
impl ChunkSink for IngestionSink {
    async fn send(&self, chunk: &Chunk) -> Result<(), SinkError> {
        let token = self.token.get_token().await.ok_or(SinkError::MissingToken)?;
        let body = chunk.encode()?;

        let start = Instant::now();
        let response = self
            .client
            .post(&self.url)
            .bearer_auth(token)
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await?;
        let elapsed = start.elapsed();

        let status = response.status();
        if status.is_success() {
            debug!(
                "SINK | Sent {} rows ({} bytes) in {}ms, status {}",
                chunk.len(),
                chunk.size_bytes(),
                elapsed.as_millis(),
                status.as_u16()
            );
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(SinkError::Status {
            status: status.as_u16(),
            body,
        })
    }
}
