// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Cursor-paginated JSON API source.
//!
//! Each page is requested with the window bounds, a page size and, after the
//! first page, the cursor returned by the previous one:
//!
//! ```text
//! GET {url}?createdAfter=..&createdBefore=..&limit=100[&cursor=..]
//! Authorization: Bearer <token>
//!
//! {"data": [{...}, {...}], "cursor": "next-page-token"}
//! ```
//!
//! Paging stops when the cursor is missing, null or empty.

use std::time::Duration;

use async_trait::async_trait;
use log_chunker::Row;
use reqwest::header::ACCEPT;
use serde_json::Value;
use tracing::{debug, enabled, trace, Level};

use crate::config::SourceConfig;
use crate::source::{flatten_record, RowSource, SourceError, TimeWindow};
use crate::token::TokenFactory;

#[derive(Debug, Clone)]
pub struct HttpSource {
    client: reqwest::Client,
    url: String,
    token: TokenFactory,
    page_size: u32,
    max_pages: u32,
    data_field: String,
    cursor_field: String,
    start_param: String,
    end_param: String,
    limit_param: String,
    cursor_param: String,
}

#[derive(Debug, PartialEq)]
struct Page {
    records: Vec<Value>,
    cursor: Option<String>,
}

impl HttpSource {
    /// # Errors
    ///
    /// Fails when the HTTP client cannot be built.
    pub fn from_config(config: &SourceConfig) -> Result<Self, SourceError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| SourceError::Client(e.to_string()))?;

        Ok(HttpSource {
            client,
            url: config.url.clone(),
            token: TokenFactory::new(config.token.expose()),
            page_size: config.page_size,
            max_pages: config.max_pages,
            data_field: config.data_field.clone(),
            cursor_field: config.cursor_field.clone(),
            start_param: config.start_param.clone(),
            end_param: config.end_param.clone(),
            limit_param: config.limit_param.clone(),
            cursor_param: config.cursor_param.clone(),
        })
    }

    /// Replaces the configured static token.
    #[must_use]
    pub fn with_token_factory(mut self, token: TokenFactory) -> Self {
        self.token = token;
        self
    }

    async fn fetch_page(
        &self,
        token: &str,
        window: &TimeWindow,
        cursor: Option<&str>,
    ) -> Result<Page, SourceError> {
        let mut query = vec![
            (self.start_param.as_str(), window.start_param()),
            (self.end_param.as_str(), window.end_param()),
            (self.limit_param.as_str(), self.page_size.to_string()),
        ];
        if let Some(cursor) = cursor {
            query.push((self.cursor_param.as_str(), cursor.to_string()));
        }

        let response = self
            .client
            .get(&self.url)
            .query(&query)
            .bearer_auth(token)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|source| SourceError::Request {
                url: self.url.clone(),
                source,
            })?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|source| SourceError::Request {
                url: self.url.clone(),
                source,
            })?;

        if enabled!(Level::TRACE) {
            trace!("SOURCE | {}", String::from_utf8_lossy(&body));
        }

        if !status.is_success() {
            debug!("SOURCE | {}", String::from_utf8_lossy(&body));
            return Err(SourceError::Status {
                url: self.url.clone(),
                status: status.as_u16(),
                body: String::from_utf8_lossy(&body).into_owned(),
            });
        }

        self.parse_page(&body)
    }

    fn parse_page(&self, body: &[u8]) -> Result<Page, SourceError> {
        let mut response: Value =
            serde_json::from_slice(body).map_err(|e| SourceError::Decode(e.to_string()))?;

        let records = match response.get_mut(&self.data_field).map(Value::take) {
            Some(Value::Array(records)) => records,
            None | Some(Value::Null) => Vec::new(),
            Some(other) => {
                return Err(SourceError::Decode(format!(
                    "expected an array under '{}', got {}",
                    self.data_field, other
                )))
            }
        };

        let cursor = match response.get(&self.cursor_field) {
            Some(Value::String(cursor)) if !cursor.is_empty() => Some(cursor.clone()),
            _ => None,
        };

        Ok(Page { records, cursor })
    }
}

#[async_trait]
impl RowSource for HttpSource {
    fn name(&self) -> &str {
        "http"
    }

    async fn fetch(&self, window: &TimeWindow) -> Result<Vec<Row>, SourceError> {
        let token = self.token.get_token().await.ok_or(SourceError::MissingToken)?;

        debug!(
            "SOURCE | Fetching {} from {} to {}",
            self.url,
            window.start_param(),
            window.end_param()
        );

        let mut rows = Vec::new();
        let mut cursor: Option<String> = None;

        for step in 0..self.max_pages {
            let page = self.fetch_page(token, window, cursor.as_deref()).await?;
            debug!(
                "SOURCE | Page {} returned {} records",
                step,
                page.records.len()
            );

            for record in page.records {
                rows.push(flatten_record(rows.len(), record)?);
            }

            match page.cursor {
                Some(next) => {
                    debug!("SOURCE | Fetching next page with cursor {}", next);
                    cursor = Some(next);
                }
                None => {
                    debug!("SOURCE | Cursor empty, fetched {} rows", rows.len());
                    return Ok(rows);
                }
            }
        }

        Err(SourceError::TooManyPages(self.max_pages))
    }
}
