// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Size-bounded chunking of normalized log rows.
//!
//! Rows are flat string-keyed maps. Before they are shipped to an ingestion
//! endpoint that enforces a hard payload ceiling, the whole input is planned
//! into chunks whose compact JSON array encoding stays within a byte bound:
//!
//! ```text
//!   rows ──> Chunker::plan ──> ChunkPlan [chunk 1, chunk 2, ...] ──> sink
//! ```
//!
//! Planning is pure and synchronous. It either succeeds for every row or
//! returns an error without producing any chunk, so nothing is shipped for a
//! doomed input.

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

pub mod chunker;
pub mod error;
pub mod size;

use std::collections::BTreeMap;

pub use chunker::{plan_chunks, Chunk, ChunkObserver, ChunkPlan, Chunker, NoopObserver};
pub use error::ChunkError;
pub use size::{array_size, serialized_size, SerializationError};

/// One normalized log record.
///
/// A `BTreeMap` keeps the encoded key order stable, which keeps chunk sizes
/// and request bodies reproducible.
pub type Row = BTreeMap<String, String>;
