// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use crate::size::SerializationError;

/// Errors raised while planning chunks.
///
/// Every variant aborts the whole plan. Planning is deterministic, so none of
/// them is worth retrying with the same input.
#[derive(Debug, thiserror::Error)]
pub enum ChunkError {
    #[error("chunk size bound must be greater than zero")]
    InvalidBound,

    #[error("row {index} needs {size} bytes on its own, more than the {max_bytes} byte chunk limit")]
    RowTooLarge {
        index: usize,
        /// Encoded size of a chunk holding only this row.
        size: usize,
        max_bytes: usize,
    },

    #[error("could not encode row {index}: {source}")]
    Serialization {
        index: usize,
        #[source]
        source: SerializationError,
    },
}

impl ChunkError {
    /// Index of the input row that caused the failure, if any.
    #[must_use]
    pub fn row_index(&self) -> Option<usize> {
        match self {
            ChunkError::InvalidBound => None,
            ChunkError::RowTooLarge { index, .. } | ChunkError::Serialization { index, .. } => {
                Some(*index)
            }
        }
    }
}
