// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Exact payload size estimation.
//!
//! Sizes are measured against the same compact JSON encoding that goes on the
//! wire. The serializer writes into a counter instead of a buffer, so no
//! payload is materialized just to be measured.

use serde::Serialize;
use std::io;

pub type SerializationError = serde_json::Error;

/// Bytes added by the `[` and `]` around a JSON array.
pub(crate) const ARRAY_BRACKETS_SIZE: usize = 2;

/// Bytes added by the `,` between two array elements.
pub(crate) const SEPARATOR_SIZE: usize = 1;

#[derive(Debug, Default)]
struct ByteCounter {
    count: usize,
}

impl io::Write for ByteCounter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.count += buf.len();
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Returns the number of bytes `value` occupies once encoded as compact JSON.
///
/// # Errors
///
/// Fails when `value` cannot be represented as JSON, e.g. a map whose keys
/// are not strings.
pub fn serialized_size<T: Serialize + ?Sized>(value: &T) -> Result<usize, SerializationError> {
    let mut counter = ByteCounter::default();
    serde_json::to_writer(&mut counter, value)?;
    Ok(counter.count)
}

/// Returns the encoded size of a JSON array holding `items`.
///
/// Equivalent to `serialized_size(items)` for slices, computed element by
/// element the same way the chunker accumulates it.
///
/// # Errors
///
/// Fails when any item cannot be encoded.
pub fn array_size<T: Serialize>(items: &[T]) -> Result<usize, SerializationError> {
    if items.is_empty() {
        return Ok(ARRAY_BRACKETS_SIZE);
    }
    let mut total = 0;
    for (i, item) in items.iter().enumerate() {
        total += marginal_size(serialized_size(item)?, i == 0);
    }
    Ok(total)
}

/// Cost of appending an element of `item_size` bytes to an array.
///
/// The first element pays for the brackets, every later one for its comma.
#[inline]
pub(crate) fn marginal_size(item_size: usize, first: bool) -> usize {
    if first {
        item_size + ARRAY_BRACKETS_SIZE
    } else {
        item_size + SEPARATOR_SIZE
    }
}
