// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! Common LiDAR types and error handling.
//!
//! These types flow through every stage of the pipeline: the framer produces
//! [`Frame`]s, the projector turns their [`Point`]s into [`ProjectedPoint`]s
//! and the clusterer reduces those to [`Cluster`]s.

use std::fmt;

/// Number of range samples carried by one frame.
pub const POINTS_PER_FRAME: usize = 12;

/// A single range/intensity sample.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Point {
    /// Distance in millimeters
    pub distance: u16,
    /// Return strength
    pub intensity: u8,
}

/// One decoded 47-byte measurement frame.
///
/// Frames are built atomically by [`crate::protocol::decode`] and never
/// modified afterwards.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Frame {
    /// Header sentinel, always [`crate::protocol::HEADER`]
    pub header: u8,
    /// Version/length sentinel, always [`crate::protocol::VER_LEN`]
    pub ver_len: u8,
    /// Rotation speed as reported by the sensor
    pub speed: u16,
    /// Sweep start angle in hundredths of a degree
    pub start_angle: u16,
    /// Samples in sweep order
    pub points: [Point; POINTS_PER_FRAME],
    /// Sweep end angle in hundredths of a degree
    pub end_angle: u16,
    /// Sensor timestamp
    pub timestamp: u16,
    /// Checksum byte as received. Not verified.
    pub checksum: u8,
}

/// A frame tagged with the host time it was decoded at.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StampedFrame {
    /// Host monotonic time in nanoseconds, see [`timestamp`]
    pub received_ns: u64,
    pub frame: Frame,
}

/// A sample positioned in the sensor plane.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProjectedPoint {
    /// X position in meters
    pub x: f32,
    /// Y position in meters
    pub y: f32,
    pub intensity: u8,
    /// Index of the sample within its frame
    pub index: usize,
}

impl ProjectedPoint {
    pub fn new(x: f32, y: f32) -> Self {
        Self {
            x,
            y,
            intensity: 0,
            index: 0,
        }
    }

    /// Euclidean distance to another point.
    #[inline]
    pub fn distance(&self, other: &ProjectedPoint) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// Three mutually close points reduced to their centroid.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Cluster {
    /// Centroid X in meters
    pub x: f32,
    /// Centroid Y in meters
    pub y: f32,
    /// Indices of the member points in the clustering input
    pub members: [usize; 3],
}

/// Common error type for LiDAR operations
#[derive(Debug)]
pub enum Error {
    /// I/O error reading the byte source
    Io(std::io::Error),
    /// Serial port could not be opened or configured
    Serial(serialport::Error),
    /// The frame channel was closed by the other side
    ChannelClosed,
    /// The reader thread panicked
    ThreadPanic,
    /// Configuration error
    Config(String),
}

impl std::error::Error for Error {}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Io(err) => write!(f, "I/O error: {}", err),
            Error::Serial(err) => write!(f, "serial port error: {}", err),
            Error::ChannelClosed => write!(f, "frame channel closed"),
            Error::ThreadPanic => write!(f, "reader thread panicked"),
            Error::Config(msg) => write!(f, "configuration error: {}", msg),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<serialport::Error> for Error {
    fn from(err: serialport::Error) -> Self {
        Error::Serial(err)
    }
}

impl From<kanal::SendError> for Error {
    fn from(_: kanal::SendError) -> Self {
        Error::ChannelClosed
    }
}

/// Get current timestamp in nanoseconds.
///
/// On Linux, uses `CLOCK_MONOTONIC_RAW` for best accuracy.
/// On other platforms, falls back to `SystemTime`.
#[cfg(target_os = "linux")]
pub fn timestamp() -> Result<u64, Error> {
    let mut tp = libc::timespec {
        tv_sec: 0,
        tv_nsec: 0,
    };
    let err = unsafe { libc::clock_gettime(libc::CLOCK_MONOTONIC_RAW, &mut tp) };
    if err != 0 {
        return Err(std::io::Error::last_os_error().into());
    }

    Ok(tp.tv_sec as u64 * 1_000_000_000 + tp.tv_nsec as u64)
}

#[cfg(not(target_os = "linux"))]
pub fn timestamp() -> Result<u64, Error> {
    let now = std::time::SystemTime::now();
    let duration = now
        .duration_since(std::time::UNIX_EPOCH)
        .map_err(|e| Error::Io(std::io::Error::other(e)))?;
    Ok(duration.as_nanos() as u64)
}
