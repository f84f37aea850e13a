// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Chunk planning.
//!
//! The planner walks the rows once, in input order, and tracks the running
//! chunk size from per-row marginal costs:
//!
//! ```text
//!   [row0,row1,row2]
//!   ^    ^    ^    ^
//!   |    |    |    └─ closing bracket, paid by the first row
//!   |    └────┴────── one comma per following row
//!   └──────────────── opening bracket, paid by the first row
//! ```
//!
//! Each row is encoded exactly once, so planning is linear in the input size
//! and the recorded chunk sizes equal the encoded request bodies byte for byte.

use std::mem;

use serde::Serialize;

use crate::error::ChunkError;
use crate::size::{marginal_size, serialized_size, SerializationError};
use crate::Row;

/// Receives planning events.
///
/// The planner itself never logs. Callers that want instrumentation pass an
/// observer; every method has a no-op default.
pub trait ChunkObserver {
    /// Called when a chunk is closed and appended to the plan.
    fn chunk_closed(&self, _index: usize, _rows: usize, _size_bytes: usize) {}

    /// Called once when planning is aborted.
    fn planning_failed(&self, _error: &ChunkError) {}
}

/// Observer that ignores every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl ChunkObserver for NoopObserver {}

static NOOP_OBSERVER: NoopObserver = NoopObserver;

/// A non-empty, ordered group of rows destined for one ingestion call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk<T = Row> {
    rows: Vec<T>,
    size_bytes: usize,
}

impl<T> Chunk<T> {
    #[must_use]
    pub fn rows(&self) -> &[T] {
        &self.rows
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Always false for chunks produced by the planner.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Exact size in bytes of the JSON array encoding of this chunk.
    #[must_use]
    pub fn size_bytes(&self) -> usize {
        self.size_bytes
    }

    #[must_use]
    pub fn into_rows(self) -> Vec<T> {
        self.rows
    }
}

impl<T: Serialize> Chunk<T> {
    /// Encodes the chunk as the JSON array sent on the wire.
    ///
    /// # Errors
    ///
    /// Fails only if a row cannot be encoded, which planning already ruled out.
    pub fn encode(&self) -> Result<Vec<u8>, SerializationError> {
        let mut body = Vec::with_capacity(self.size_bytes);
        serde_json::to_writer(&mut body, &self.rows)?;
        Ok(body)
    }
}

/// The ordered chunks for one input, computed before anything is sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkPlan<T = Row> {
    chunks: Vec<Chunk<T>>,
    max_bytes: usize,
}

impl<T> ChunkPlan<T> {
    #[must_use]
    pub fn chunks(&self) -> &[Chunk<T>] {
        &self.chunks
    }

    /// Number of chunks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    #[must_use]
    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    #[must_use]
    pub fn total_rows(&self) -> usize {
        self.chunks.iter().map(Chunk::len).sum()
    }

    #[must_use]
    pub fn total_bytes(&self) -> usize {
        self.chunks.iter().map(Chunk::size_bytes).sum()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Chunk<T>> {
        self.chunks.iter()
    }

    #[must_use]
    pub fn into_chunks(self) -> Vec<Chunk<T>> {
        self.chunks
    }

    /// Concatenates the chunks back into the original row sequence.
    #[must_use]
    pub fn into_rows(self) -> Vec<T> {
        self.chunks.into_iter().flat_map(Chunk::into_rows).collect()
    }
}

impl<T> IntoIterator for ChunkPlan<T> {
    type Item = Chunk<T>;
    type IntoIter = std::vec::IntoIter<Chunk<T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.chunks.into_iter()
    }
}

impl<'a, T> IntoIterator for &'a ChunkPlan<T> {
    type Item = &'a Chunk<T>;
    type IntoIter = std::slice::Iter<'a, Chunk<T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.chunks.iter()
    }
}

/// Plans rows into chunks whose encoded size stays within `max_bytes`.
#[derive(Clone, Copy)]
pub struct Chunker<'a> {
    max_bytes: usize,
    observer: &'a dyn ChunkObserver,
}

impl std::fmt::Debug for Chunker<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Chunker")
            .field("max_bytes", &self.max_bytes)
            .finish_non_exhaustive()
    }
}

impl Chunker<'static> {
    /// # Errors
    ///
    /// Returns [`ChunkError::InvalidBound`] when `max_bytes` is zero.
    pub fn new(max_bytes: usize) -> Result<Self, ChunkError> {
        if max_bytes == 0 {
            return Err(ChunkError::InvalidBound);
        }
        Ok(Chunker {
            max_bytes,
            observer: &NOOP_OBSERVER,
        })
    }
}

impl<'a> Chunker<'a> {
    #[must_use]
    pub fn with_observer<'b>(self, observer: &'b dyn ChunkObserver) -> Chunker<'b> {
        Chunker {
            max_bytes: self.max_bytes,
            observer,
        }
    }

    #[must_use]
    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    /// Splits `rows` into an ordered plan of size-bounded chunks.
    ///
    /// Concatenating the chunks reproduces `rows` exactly. An empty input
    /// yields an empty plan.
    ///
    /// # Errors
    ///
    /// - [`ChunkError::RowTooLarge`] when a row does not fit in a chunk on its
    ///   own. No row is ever split or dropped.
    /// - [`ChunkError::Serialization`] when a row cannot be encoded.
    ///
    /// In both cases no partial plan is returned.
    pub fn plan<T: Serialize>(&self, rows: Vec<T>) -> Result<ChunkPlan<T>, ChunkError> {
        self.build(rows).inspect_err(|e| self.observer.planning_failed(e))
    }

    fn build<T: Serialize>(&self, rows: Vec<T>) -> Result<ChunkPlan<T>, ChunkError> {
        let mut chunks: Vec<Chunk<T>> = Vec::new();
        let mut current: Vec<T> = Vec::new();
        let mut current_size = 0;

        for (index, row) in rows.into_iter().enumerate() {
            let row_size =
                serialized_size(&row).map_err(|source| ChunkError::Serialization { index, source })?;

            if !current.is_empty() && current_size + marginal_size(row_size, false) > self.max_bytes
            {
                self.close(&mut chunks, &mut current, &mut current_size);
            }

            let cost = marginal_size(row_size, current.is_empty());
            if current.is_empty() && cost > self.max_bytes {
                return Err(ChunkError::RowTooLarge {
                    index,
                    size: cost,
                    max_bytes: self.max_bytes,
                });
            }

            current.push(row);
            current_size += cost;
        }

        if !current.is_empty() {
            self.close(&mut chunks, &mut current, &mut current_size);
        }

        Ok(ChunkPlan {
            chunks,
            max_bytes: self.max_bytes,
        })
    }

    fn close<T>(&self, chunks: &mut Vec<Chunk<T>>, current: &mut Vec<T>, current_size: &mut usize) {
        let chunk = Chunk {
            rows: mem::take(current),
            size_bytes: mem::take(current_size),
        };
        self.observer
            .chunk_closed(chunks.len(), chunk.len(), chunk.size_bytes);
        chunks.push(chunk);
    }
}

/// Shorthand for `Chunker::new(max_bytes)?.plan(rows)`.
///
/// # Errors
///
/// See [`Chunker::new`] and [`Chunker::plan`].
pub fn plan_chunks<T: Serialize>(rows: Vec<T>, max_bytes: usize) -> Result<ChunkPlan<T>, ChunkError> {
    Chunker::new(max_bytes)?.plan(rows)
}
