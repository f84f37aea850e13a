// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Log output of the shipper.
//!
//! Every line is prefixed so the shipper's own diagnostics can be told apart
//! from the rows it ships when both end up in the same place:
//!
//! ```text
//! LOG_SHIPPER | INFO | PIPELINE | Fetched 250 rows from the http source
//! LOG_SHIPPER | ERROR | run{attempt=3}: SEND | Chunk 2/3 failed: ...
//! ```

use std::fmt;

use tracing_core::{Event, Subscriber};
use tracing_subscriber::fmt::{
    format::{self, FormatEvent, FormatFields},
    FmtContext, FormattedFields,
};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::EnvFilter;

use crate::config::log_level::LogLevel;

pub const LOG_PREFIX: &str = "LOG_SHIPPER";

/// HTTP stack crates that are silenced whatever the configured level.
const MUTED_TARGETS: &[&str] = &["h2", "hyper", "hyper_util", "rustls", "reqwest"];

#[derive(Debug, Clone, Copy)]
pub struct Formatter;

impl<S, N> FormatEvent<S, N> for Formatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: format::Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        write!(&mut writer, "{LOG_PREFIX} | {} | ", event.metadata().level())?;

        if let Some(scope) = ctx.event_scope() {
            for span in scope.from_root() {
                write!(writer, "{}", span.name())?;

                let ext = span.extensions();
                if let Some(fields) = ext.get::<FormattedFields<N>>() {
                    if !fields.is_empty() {
                        write!(writer, "{{{fields}}}")?;
                    }
                }
                write!(writer, ": ")?;
            }
        }

        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

/// Filter directives for `level`, with the HTTP stack muted.
#[must_use]
pub fn filter_directives(level: LogLevel) -> String {
    let mut directives: Vec<String> = MUTED_TARGETS
        .iter()
        .map(|target| format!("{target}=off"))
        .collect();
    directives.push(level.to_string());
    directives.join(",")
}

/// Installs the global subscriber.
///
/// # Errors
///
/// Fails when the filter cannot be parsed or a global subscriber is already
/// set.
pub fn init(level: LogLevel) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let subscriber = tracing_subscriber::fmt::Subscriber::builder()
        .with_env_filter(EnvFilter::try_new(filter_directives(level))?)
        .with_ansi(false)
        .event_format(Formatter)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}
