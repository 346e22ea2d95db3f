// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! Stream framer recovering 47-byte frames from the serial byte stream.
//!
//! The serial link delivers bytes in arbitrary chunks and may drop or
//! corrupt some of them. The [`Framer`] accumulates bytes and repeatedly
//! applies the following pass while at least one frame worth of bytes is
//! buffered:
//!
//! 1. If the head byte is not [`HEADER`], skip forward to the next
//!    [`HEADER`]. If there is none, drop everything buffered.
//! 2. Wait for more input if fewer than [`FRAME_SIZE`] bytes remain.
//! 3. Take [`FRAME_SIZE`] bytes as a candidate window.
//! 4. Drop the window if its second byte is not [`VER_LEN`]. The dropped
//!    bytes are not re-scanned.
//! 5. Otherwise decode it.
//!
//! A header byte appearing inside point data can cause a false
//! resynchronization. That frame is lost and alignment recovers on a later
//! header.
//!
//! Every step that throws bytes away is reported as a
//! [`FrameEvent::Rejected`] and counted in [`FramerStats`]; the reader only
//! logs them.

use crate::{
    buffer::ByteAccumulator,
    lidar::Frame,
    protocol::{self, FRAME_SIZE, HEADER, VER_LEN},
};
use std::fmt;
use tracing::trace;

/// Initial accumulator capacity, enough for a few serial reads
const DEFAULT_CAPACITY: usize = 4096;

/// Why buffered bytes were thrown away.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RejectReason {
    /// No header byte anywhere in the buffer; all of it was dropped.
    NoHeader { discarded: usize },
    /// Noise before the next header byte was dropped.
    Resync { discarded: usize },
    /// An aligned window had the wrong version/length byte and was dropped.
    BadVersion { found: u8 },
}

impl RejectReason {
    /// Number of bytes this rejection removed from the stream.
    pub fn discarded(&self) -> usize {
        match self {
            RejectReason::NoHeader { discarded } | RejectReason::Resync { discarded } => {
                *discarded
            }
            RejectReason::BadVersion { .. } => FRAME_SIZE,
        }
    }
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RejectReason::NoHeader { discarded } => {
                write!(f, "no header found, dropped {} bytes", discarded)
            }
            RejectReason::Resync { discarded } => {
                write!(f, "resynchronized, skipped {} bytes", discarded)
            }
            RejectReason::BadVersion { found } => {
                write!(f, "bad version/length byte {:#04x}", found)
            }
        }
    }
}

/// Outcome of one framing step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameEvent {
    Frame(Frame),
    Rejected(RejectReason),
}

/// Running counters for a framer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FramerStats {
    /// Frames decoded
    pub frames: u64,
    /// Aligned windows dropped for a bad version/length byte
    pub bad_windows: u64,
    /// Times the framer skipped forward to a header
    pub resyncs: u64,
    /// Total bytes dropped for any reason
    pub discarded_bytes: u64,
}

/// Frame extractor owning the byte accumulator.
#[derive(Debug, Default)]
pub struct Framer {
    buffer: ByteAccumulator,
    stats: FramerStats,
}

impl Framer {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Create a framer whose accumulator starts with `capacity` bytes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: ByteAccumulator::with_capacity(capacity),
            stats: FramerStats::default(),
        }
    }

    /// Append bytes received from the source.
    pub fn push(&mut self, bytes: &[u8]) {
        self.buffer.append(bytes);
    }

    /// Number of bytes waiting to be framed.
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    pub fn stats(&self) -> FramerStats {
        self.stats
    }

    /// Run one framing step.
    ///
    /// Returns `None` once fewer than [`FRAME_SIZE`] bytes are buffered, or
    /// right after the whole buffer was dropped for lack of a header.
    pub fn next_event(&mut self) -> Option<FrameEvent> {
        if self.buffer.len() < FRAME_SIZE {
            return None;
        }

        if self.buffer.first() != Some(HEADER) {
            let reason = match self.buffer.find(HEADER) {
                Some(offset) => {
                    self.buffer.consume(offset);
                    self.stats.resyncs += 1;
                    RejectReason::Resync { discarded: offset }
                }
                None => RejectReason::NoHeader {
                    discarded: self.buffer.clear(),
                },
            };
            self.stats.discarded_bytes += reason.discarded() as u64;
            trace!("framer: {}", reason);
            return Some(FrameEvent::Rejected(reason));
        }

        let window: [u8; FRAME_SIZE] = self.buffer.take_array()?;

        if window[1] != VER_LEN {
            let reason = RejectReason::BadVersion { found: window[1] };
            self.stats.bad_windows += 1;
            self.stats.discarded_bytes += FRAME_SIZE as u64;
            trace!("framer: {}", reason);
            return Some(FrameEvent::Rejected(reason));
        }

        self.stats.frames += 1;
        Some(FrameEvent::Frame(protocol::decode(&window)))
    }

    /// Iterate framing steps until more input is needed.
    pub fn events(&mut self) -> Events<'_> {
        Events { framer: self }
    }

    /// Push `bytes` and collect every frame that becomes available.
    pub fn process(&mut self, bytes: &[u8]) -> Vec<Frame> {
        self.push(bytes);
        self.events()
            .filter_map(|event| match event {
                FrameEvent::Frame(frame) => Some(frame),
                FrameEvent::Rejected(_) => None,
            })
            .collect()
    }
}

/// Iterator returned by [`Framer::events`].
pub struct Events<'a> {
    framer: &'a mut Framer,
}

impl Iterator for Events<'_> {
    type Item = FrameEvent;

    fn next(&mut self) -> Option<Self::Item> {
        self.framer.next_event()
    }
}
