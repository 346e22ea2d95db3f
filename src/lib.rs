// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! Serial 2D LiDAR frame decoder with marker clustering.
//!
//! This library turns the byte stream of a spinning 2D LiDAR into positioned
//! range samples and detects retro-reflective markers among them.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐     ┌───────────────┐     ┌─────────────────┐
//! │  ByteSource     │ ──► │  Framer       │ ──► │  Frame          │
//! │  (serial/replay)│     │  (47B frames) │     │  (12 samples)   │
//! └─────────────────┘     └───────────────┘     └─────────────────┘
//!        reader thread                                  │ kanal
//!                                                       ▼
//!                 ┌───────────────┐     ┌─────────────────────────────┐
//!                 │  MarkerSink   │ ◄── │  Pipeline                   │
//!                 │  (renderer)   │     │  project → cluster → marker │
//!                 └───────────────┘     └─────────────────────────────┘
//! ```
//!
//! The reader thread owns the byte source and the framer and only ever
//! appends to the channel. The consumer drains the channel once per display
//! tick and processes the drained frames in arrival order.
//!
//! # Modules
//!
//! - [`buffer`]: FIFO byte accumulator
//! - [`framer`]: Frame recovery and resynchronization
//! - [`protocol`]: 47-byte wire format
//! - [`projection`]: Polar to Cartesian projection
//! - [`cluster`]: Greedy triplet clustering
//! - [`markers`]: Short-lived detection markers
//! - [`byte_source`]: Byte source abstraction (serial port, replay)
//! - [`reader`]: Producer thread and cancellation
//! - [`pipeline`]: Consumer side processing
//! - [`lidar`]: Common types and error handling
//!
//! # Example
//!
//! ```
//! use lidar_markers::{
//!     framer::Framer,
//!     lidar::{Frame, Point, POINTS_PER_FRAME},
//!     projection::{project, SignConvention},
//!     protocol,
//! };
//!
//! let frame = Frame::new(0, 1200, [Point { distance: 1000, intensity: 200 }; POINTS_PER_FRAME]);
//! let mut stream = vec![0xFF, 0xFF];
//! stream.extend_from_slice(&protocol::encode(&frame));
//!
//! let mut framer = Framer::new();
//! let frames = framer.process(&stream);
//! assert_eq!(frames, vec![frame]);
//!
//! let points = project(&frames[0], SignConvention::Standard).into_points();
//! assert_eq!(points.len(), POINTS_PER_FRAME);
//! ```

pub mod buffer;
pub mod byte_source;
pub mod cluster;
pub mod framer;
pub mod lidar;
pub mod markers;
pub mod pipeline;
pub mod projection;
pub mod protocol;
pub mod reader;

// Re-exports for convenience
pub use byte_source::{ByteSource, ReplaySource, SerialSource};
pub use framer::{FrameEvent, Framer, RejectReason};
pub use lidar::{Cluster, Error, Frame, Point, ProjectedPoint, StampedFrame};
pub use pipeline::{MarkerSink, Pipeline, PipelineConfig};
pub use reader::{CancelToken, ReaderHandle};
