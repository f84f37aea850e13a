// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use log_shipper::{
    config, logger,
    sink::IngestionSink,
    source::build_source,
    Pipeline,
};

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// YAML configuration file
    #[arg(long, env = "LOG_SHIPPER_CONFIG")]
    config: Option<PathBuf>,

    /// Run a single time even when an interval is configured
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = config::get_config(cli.config.as_deref()).context("could not load configuration")?;
    logger::init(config.log_level).map_err(|e| anyhow!("could not set up logging: {e}"))?;
    debug!("Logging subsystem enabled");
    debug!("Loaded configuration: {:?}", config);

    let source = build_source(&config.source).context("could not build source")?;
    let sink = IngestionSink::from_config(&config.sink).context("could not build sink")?;
    info!("Shipping to {}", sink.url());

    let pipeline = Pipeline::new(
        source,
        Box::new(sink),
        config.max_chunk_bytes,
        config.lookback(),
    );

    let cancel = CancellationToken::new();
    let shutdown = cancel.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Shutdown requested, stopping after the current chunk");
                shutdown.cancel();
            }
            Err(e) => error!("Could not listen for shutdown signal: {}", e),
        }
    });

    let period = match config.interval() {
        Some(period) if !cli.once => period,
        _ => {
            let report = pipeline.run_once(&cancel).await?;
            info!(
                "Run finished: {} rows in {} chunks ({} bytes)",
                report.rows, report.chunks, report.bytes
            );
            return Ok(());
        }
    };

    info!("Running every {}s", period.as_secs());
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            () = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }

        match pipeline.run_once(&cancel).await {
            Ok(report) => info!(
                "Run finished: {} rows in {} chunks ({} bytes)",
                report.rows, report.chunks, report.bytes
            ),
            Err(e) if e.is_cancelled() => info!("{}", e),
            Err(e) => error!("Run failed: {}", e),
        }
    }

    info!("Shut down");
    Ok(())
}
