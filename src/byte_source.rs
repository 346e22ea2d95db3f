// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! Byte source abstraction for the serial stream.
//!
//! This module provides a [`ByteSource`] trait that abstracts where the
//! sensor bytes come from, enabling:
//!
//! - **Live operation**: Reading from a serial port ([`SerialSource`])
//! - **Testing**: Replaying pre-recorded chunks ([`ReplaySource`])
//!
//! # Example
//!
//! ```ignore
//! use lidar_markers::byte_source::{ByteSource, SerialConfig, SerialSource};
//!
//! let mut source = SerialSource::open("/dev/ttyUSB0", &SerialConfig::default())?;
//! let mut buf = [0u8; 512];
//! loop {
//!     let len = source.read_bytes(&mut buf)?;
//!     // Feed buf[..len] to a Framer
//! }
//! ```

use crate::lidar::Error;
use serialport::{DataBits, FlowControl, Parity, SerialPort, StopBits};
use std::{io::Read, thread, time::Duration};
use tracing::{debug, info};

/// Sensor serial baud rate
pub const DEFAULT_BAUD_RATE: u32 = 230_400;

/// Serial read timeout
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_millis(500);

/// Trait for byte sources.
///
/// Implementations deliver the raw sensor stream in whatever chunk sizes the
/// underlying transport produces.
pub trait ByteSource: Send {
    /// Number of bytes that can be read without blocking.
    fn bytes_available(&mut self) -> Result<usize, Error>;

    /// Read up to `buf.len()` bytes.
    ///
    /// Blocks for at most the source's read timeout. Returns `Ok(0)` when the
    /// timeout elapsed without data.
    fn read_bytes(&mut self, buf: &mut [u8]) -> Result<usize, Error>;

    /// Check if more bytes can arrive.
    ///
    /// For live sources this is always `true`. Finite sources return `false`
    /// once exhausted.
    fn has_more(&self) -> bool {
        true
    }
}

/// Serial port settings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SerialConfig {
    pub baud_rate: u32,
    pub read_timeout: Duration,
}

impl SerialConfig {
    /// Reject settings the port can never be opened with.
    pub fn validate(&self) -> Result<(), Error> {
        if self.baud_rate == 0 {
            return Err(Error::Config("baud rate must be non-zero".to_string()));
        }
        if self.read_timeout.is_zero() {
            return Err(Error::Config("read timeout must be non-zero".to_string()));
        }
        Ok(())
    }
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            baud_rate: DEFAULT_BAUD_RATE,
            read_timeout: DEFAULT_READ_TIMEOUT,
        }
    }
}

/// Serial port byte source, 8N1 without flow control.
pub struct SerialSource {
    port: Box<dyn SerialPort>,
}

impl SerialSource {
    /// Open and configure a serial port.
    ///
    /// # Arguments
    /// * `path` - Serial port path (e.g., "/dev/ttyUSB0" or "COM5")
    /// * `config` - Baud rate and read timeout
    pub fn open(path: &str, config: &SerialConfig) -> Result<Self, Error> {
        config.validate()?;
        let port = serialport::new(path, config.baud_rate)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .timeout(config.read_timeout)
            .open()?;

        info!(
            "opened serial port {} at {} baud, {:?} timeout",
            path, config.baud_rate, config.read_timeout
        );
        Ok(Self { port })
    }
}

impl ByteSource for SerialSource {
    fn bytes_available(&mut self) -> Result<usize, Error> {
        Ok(self.port.bytes_to_read()? as usize)
    }

    fn read_bytes(&mut self, buf: &mut [u8]) -> Result<usize, Error> {
        match self.port.read(buf) {
            Ok(n) => Ok(n),
            Err(e) if e.kind() == std::io::ErrorKind::TimedOut => Ok(0),
            Err(e) => Err(e.into()),
        }
    }
}

/// Replay source for unit testing.
///
/// Delivers a sequence of pre-defined chunks, one per read. Once exhausted
/// it behaves like an idle line: reads sleep for `idle` and return zero
/// bytes.
pub struct ReplaySource {
    chunks: Vec<Vec<u8>>,
    index: usize,
    offset: usize,
    idle: Duration,
}

impl ReplaySource {
    /// Create a new replay source with the given chunks.
    pub fn new(chunks: Vec<Vec<u8>>) -> Self {
        Self {
            chunks,
            index: 0,
            offset: 0,
            idle: Duration::from_millis(1),
        }
    }

    /// Split `stream` into chunks of at most `chunk_size` bytes.
    pub fn chunked(stream: &[u8], chunk_size: usize) -> Self {
        Self::new(stream.chunks(chunk_size.max(1)).map(<[u8]>::to_vec).collect())
    }

    /// Set how long an exhausted source blocks per read.
    pub fn with_idle(mut self, idle: Duration) -> Self {
        self.idle = idle;
        self
    }

    /// Reset the source to the beginning.
    pub fn reset(&mut self) {
        self.index = 0;
        self.offset = 0;
    }

    /// Get the number of chunks.
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }
}

impl ByteSource for ReplaySource {
    fn bytes_available(&mut self) -> Result<usize, Error> {
        Ok(self
            .chunks
            .get(self.index)
            .map_or(0, |chunk| chunk.len() - self.offset))
    }

    fn read_bytes(&mut self, buf: &mut [u8]) -> Result<usize, Error> {
        let Some(chunk) = self.chunks.get(self.index) else {
            debug!("replay source exhausted");
            thread::sleep(self.idle);
            return Ok(0);
        };

        let remaining = &chunk[self.offset..];
        let len = remaining.len().min(buf.len());
        buf[..len].copy_from_slice(&remaining[..len]);
        self.offset += len;
        if self.offset == chunk.len() {
            self.index += 1;
            self.offset = 0;
        }
        Ok(len)
    }

    fn has_more(&self) -> bool {
        self.index < self.chunks.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replay_source() {
        let chunks = vec![vec![1, 2, 3, 4], vec![5, 6, 7, 8, 9, 10], vec![11, 12]];
        let mut source = ReplaySource::new(chunks);

        assert!(source.has_more());
        assert_eq!(source.len(), 3);

        let mut buf = [0u8; 100];

        assert_eq!(source.bytes_available().unwrap(), 4);
        let len = source.read_bytes(&mut buf).unwrap();
        assert_eq!(&buf[..len], &[1, 2, 3, 4]);

        let len = source.read_bytes(&mut buf).unwrap();
        assert_eq!(&buf[..len], &[5, 6, 7, 8, 9, 10]);

        assert!(source.has_more());
        let len = source.read_bytes(&mut buf).unwrap();
        assert_eq!(&buf[..len], &[11, 12]);

        // Exhausted sources idle instead of failing
        assert!(!source.has_more());
        assert_eq!(source.bytes_available().unwrap(), 0);
        assert_eq!(source.read_bytes(&mut buf).unwrap(), 0);
    }

    #[test]
    fn test_replay_source_partial_reads() {
        let mut source = ReplaySource::new(vec![vec![1, 2, 3, 4, 5, 6, 7, 8]]);

        let mut buf = [0u8; 3];
        let len = source.read_bytes(&mut buf).unwrap();
        assert_eq!(&buf[..len], &[1, 2, 3]);
        assert_eq!(source.bytes_available().unwrap(), 5);

        let len = source.read_bytes(&mut buf).unwrap();
        assert_eq!(&buf[..len], &[4, 5, 6]);
        let len = source.read_bytes(&mut buf).unwrap();
        assert_eq!(&buf[..len], &[7, 8]);
        assert!(!source.has_more());
    }

    #[test]
    fn test_replay_source_reset() {
        let mut source = ReplaySource::chunked(&[1, 2, 3, 4], 2);
        assert_eq!(source.len(), 2);
        let mut buf = [0u8; 100];

        source.read_bytes(&mut buf).unwrap();
        source.read_bytes(&mut buf).unwrap();
        assert!(!source.has_more());

        source.reset();
        assert!(source.has_more());
        let len = source.read_bytes(&mut buf).unwrap();
        assert_eq!(&buf[..len], &[1, 2]);
    }

    #[test]
    fn test_empty_replay_source() {
        let mut source = ReplaySource::new(Vec::new()).with_idle(Duration::ZERO);
        assert!(!source.has_more());
        assert!(source.is_empty());

        let mut buf = [0u8; 16];
        assert_eq!(source.read_bytes(&mut buf).unwrap(), 0);
    }

    #[test]
    fn test_serial_config_defaults() {
        let config = SerialConfig::default();
        assert_eq!(config.baud_rate, 230_400);
        assert_eq!(config.read_timeout, Duration::from_millis(500));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_serial_config_rejects_zero() {
        let config = SerialConfig {
            baud_rate: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(Error::Config(_))));
        assert!(matches!(
            SerialSource::open("/dev/null", &config),
            Err(Error::Config(_))
        ));

        let config = SerialConfig {
            read_timeout: Duration::ZERO,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }
}
