// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

use clap::{ArgAction, Parser};
use lidar_markers::{
    byte_source::{DEFAULT_BAUD_RATE, SerialConfig},
    cluster::DEFAULT_THRESHOLD,
    pipeline::PipelineConfig,
    projection::SignConvention,
};
use std::time::Duration;
use tracing::level_filters::LevelFilter;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Serial port the LiDAR is connected to, for example /dev/ttyUSB0 or
    /// COM5.
    #[arg(env)]
    pub port: String,

    /// Serial baud rate.
    #[arg(long, env, default_value_t = DEFAULT_BAUD_RATE)]
    pub baud: u32,

    /// Serial read timeout in milliseconds.  The reader notices shutdown
    /// requests within one timeout.
    #[arg(long, env, default_value = "500")]
    pub read_timeout_ms: u64,

    /// Display tick interval in milliseconds.  Pending frames are drained
    /// and processed once per tick.
    #[arg(long, env, default_value = "16")]
    pub tick_ms: u64,

    /// Axis convention of the projected points.  The default keeps +X as
    /// seen from above the sensor; use mirror-x to flip X the way the
    /// clustering display draws it.
    #[arg(long, env, value_enum, default_value_t = SignConvention::Standard)]
    pub convention: SignConvention,

    /// Enable marker clustering.
    #[arg(long, env, default_value = "true", action = ArgAction::Set)]
    pub clustering: bool,

    /// Maximum distance between points of one cluster, in meters.
    #[arg(long, env, default_value_t = DEFAULT_THRESHOLD)]
    pub clustering_threshold: f32,

    /// How long a marker stays alive, in milliseconds.
    #[arg(long, env, default_value = "100")]
    pub marker_lifetime_ms: u64,

    /// Application log level
    #[arg(long, env, default_value = "info")]
    pub rust_log: LevelFilter,
}

impl Args {
    pub fn serial_config(&self) -> SerialConfig {
        SerialConfig {
            baud_rate: self.baud,
            read_timeout: Duration::from_millis(self.read_timeout_ms),
        }
    }

    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            convention: self.convention,
            clustering: self.clustering,
            threshold: self.clustering_threshold,
            marker_lifetime: Duration::from_millis(self.marker_lifetime_ms),
        }
    }

    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from(["lidar-markers", "/dev/ttyUSB0"]).unwrap();
        assert_eq!(args.port, "/dev/ttyUSB0");
        assert_eq!(args.serial_config(), SerialConfig::default());
        assert_eq!(args.pipeline_config(), PipelineConfig::default());
        assert_eq!(args.tick(), Duration::from_millis(16));
        assert_eq!(args.rust_log, LevelFilter::INFO);
    }

    #[test]
    fn test_overrides() {
        let args = Args::try_parse_from([
            "lidar-markers",
            "COM16",
            "--baud",
            "115200",
            "--convention",
            "mirror-x",
            "--clustering",
            "false",
            "--clustering-threshold",
            "0.25",
            "--marker-lifetime-ms",
            "250",
        ])
        .unwrap();

        assert_eq!(args.serial_config().baud_rate, 115_200);
        let config = args.pipeline_config();
        assert_eq!(config.convention, SignConvention::MirrorX);
        assert!(!config.clustering);
        assert_eq!(config.threshold, 0.25);
        assert_eq!(config.marker_lifetime, Duration::from_millis(250));
    }

    #[test]
    fn test_convention_help_names_mirror() {
        let help = Args::command().render_long_help().to_string();
        assert!(help.contains("use mirror-x to flip X"));
        assert!(help.contains("[default: standard]"));
    }
}
