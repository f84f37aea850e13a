// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Periodic log shipper.
//!
//! Each run pulls the rows of a recent time window from a [`source`], plans
//! them into size-bounded chunks with [`log_chunker`] and posts the chunks
//! one by one to a logs ingestion [`sink`]:
//!
//! ```text
//!   RowSource::fetch ──> Chunker::plan ──> BatchSender::send_all ──> ChunkSink::send
//! ```

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

pub mod config;
pub mod error;
pub mod logger;
pub mod pipeline;
pub mod sender;
pub mod sink;
pub mod source;
pub mod token;

pub use error::ShipperError;
pub use pipeline::{Pipeline, RunReport};
