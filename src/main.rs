// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

mod args;

use args::Args;
use clap::Parser;
use lidar_markers::{
    Error,
    byte_source::SerialSource,
    pipeline::{LogSink, Pipeline},
    reader::ReaderHandle,
};
use std::time::Instant;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_max_level(args.rust_log)
        .with_thread_names(true)
        .init();

    let config = args.pipeline_config();
    if let Err(e) = config.validate() {
        error!("{}", e);
        return Err(e.into());
    }

    let source = match SerialSource::open(&args.port, &args.serial_config()) {
        Ok(source) => source,
        Err(e) => {
            error!("failed to open serial port {}: {}", args.port, e);
            return Err(e.into());
        }
    };

    let (tx, rx) = kanal::unbounded();
    let reader = ReaderHandle::spawn(source, tx)?;

    info!(
        "convention {}, clustering {}, threshold {} m, marker lifetime {:?}",
        config.convention, config.clustering, config.threshold, config.marker_lifetime
    );
    let mut pipeline = Pipeline::new(config);
    let mut sink = LogSink;

    let mut interval = tokio::time::interval(args.tick());
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = interval.tick() => {
                pipeline.tick(&rx, Instant::now(), &mut sink);
                if reader.is_finished() {
                    break;
                }
            }
            _ = &mut ctrl_c => {
                info!("interrupted");
                break;
            }
        }
    }

    // Joining blocks until the current serial read times out
    let result = tokio::task::spawn_blocking(move || reader.shutdown())
        .await
        .unwrap_or_else(|_| Err(Error::ThreadPanic));

    // Frames sent after the last tick
    pipeline.tick(&rx, Instant::now(), &mut sink);

    match result {
        Ok(stats) => {
            info!(
                "read {} bytes: {} frames, {} resyncs, {} bad windows, {} bytes dropped",
                stats.bytes_read,
                stats.framer.frames,
                stats.framer.resyncs,
                stats.framer.bad_windows,
                stats.framer.discarded_bytes
            );
            Ok(())
        }
        Err(e) => {
            error!("lidar reader stopped: {}", e);
            Err(e.into())
        }
    }
}
