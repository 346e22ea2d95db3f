// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! Byte accumulator for the serial stream.
//!
//! The [`ByteAccumulator`] is a FIFO byte buffer owned by the framer. The
//! reader appends whatever the byte source delivers at the tail and the
//! framer consumes frames from the head.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      ByteAccumulator                        │
//! │                                                             │
//! │   consumed        pending (len)              spare          │
//! │  ┌─────────┬──────────────────────────┬──────────────────┐  │
//! │  │ x x x x │ 54 2c .. .. .. .. .. ..  │                  │  │
//! │  └─────────┴──────────────────────────┴──────────────────┘  │
//! │            ▲ head                     ▲ tail                │
//! │            consume(n) / peek(n)       append(bytes)         │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Consuming only advances the head index. The consumed prefix is reclaimed
//! lazily on the next append once it makes up at least half of the storage,
//! so steady-state operation does not shift bytes on every frame.
//!
//! There is no upper bound on the buffer size. If the producer outpaces the
//! framer the buffer grows; keeping it drained is the caller's job.
//!
//! # Example
//!
//! ```
//! use lidar_markers::buffer::ByteAccumulator;
//!
//! let mut acc = ByteAccumulator::with_capacity(1024);
//! acc.append(&[0xff, 0x54, 0x2c]);
//! assert_eq!(acc.find(0x54), Some(1));
//!
//! acc.consume(1);
//! assert_eq!(acc.peek(2), Some(&[0x54, 0x2c][..]));
//! ```

/// Growable FIFO byte buffer.
#[derive(Debug, Clone, Default)]
pub struct ByteAccumulator {
    data: Vec<u8>,
    head: usize,
}

impl ByteAccumulator {
    /// Create an empty accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty accumulator with room for `capacity` bytes before the
    /// first reallocation.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: Vec::with_capacity(capacity),
            head: 0,
        }
    }

    /// Number of buffered, unconsumed bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len() - self.head
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Append newly received bytes at the tail.
    pub fn append(&mut self, bytes: &[u8]) {
        if self.head > 0 && self.head * 2 >= self.data.len() {
            self.data.drain(..self.head);
            self.head = 0;
        }
        self.data.extend_from_slice(bytes);
    }

    /// All pending bytes, head first.
    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.data[self.head..]
    }

    /// The byte at the head, if any.
    #[inline]
    pub fn first(&self) -> Option<u8> {
        self.as_slice().first().copied()
    }

    /// The first `n` pending bytes, or `None` if fewer are buffered.
    #[inline]
    pub fn peek(&self, n: usize) -> Option<&[u8]> {
        self.as_slice().get(..n)
    }

    /// Offset from the head of the next occurrence of `byte`.
    pub fn find(&self, byte: u8) -> Option<usize> {
        self.as_slice().iter().position(|&b| b == byte)
    }

    /// Drop up to `n` bytes from the head. Returns the number dropped.
    pub fn consume(&mut self, n: usize) -> usize {
        let n = n.min(self.len());
        self.head += n;
        if self.head == self.data.len() {
            self.data.clear();
            self.head = 0;
        }
        n
    }

    /// Remove exactly `N` bytes from the head, or nothing if fewer are
    /// buffered.
    pub fn take_array<const N: usize>(&mut self) -> Option<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.peek(N)?);
        self.consume(N);
        Some(out)
    }

    /// Drop every pending byte. Returns the number dropped.
    pub fn clear(&mut self) -> usize {
        let n = self.len();
        self.data.clear();
        self.head = 0;
        n
    }
}
