// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! Producer thread turning a byte source into a stream of frames.
//!
//! The reader thread owns the byte source and the [`Framer`]. It reads
//! whatever bytes are available, frames them and sends each decoded frame on
//! a channel. It never waits on the consumer; the channel is unbounded.
//!
//! The thread stops when its [`CancelToken`] is cancelled (checked after
//! every read, so within one read timeout), when a finite source runs dry,
//! or when the source reports an error. Bytes still buffered in the framer
//! at that point are discarded.

use crate::{
    byte_source::ByteSource,
    framer::{FrameEvent, Framer, FramerStats},
    lidar::{Error, StampedFrame, timestamp},
};
use kanal::Sender;
use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    thread::{self, JoinHandle},
};
use tracing::{debug, error, info};

/// Size of the read buffer handed to the byte source
const READ_BUFFER_SIZE: usize = 512;

/// Shared cancellation flag for the reader thread.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Counters reported when the reader thread ends.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReaderStats {
    /// Bytes read from the source
    pub bytes_read: u64,
    /// Framer counters at exit
    pub framer: FramerStats,
}

/// Owned handle to a running reader thread.
///
/// Dropping the handle cancels and joins the thread.
pub struct ReaderHandle {
    cancel: CancelToken,
    handle: Option<JoinHandle<Result<ReaderStats, Error>>>,
}

impl ReaderHandle {
    /// Spawn a reader thread feeding frames from `source` into `tx`.
    pub fn spawn<S>(source: S, tx: Sender<StampedFrame>) -> Result<Self, Error>
    where
        S: ByteSource + 'static,
    {
        Self::spawn_with_token(source, tx, CancelToken::new())
    }

    /// Spawn a reader thread observing an existing cancellation token.
    pub fn spawn_with_token<S>(
        source: S,
        tx: Sender<StampedFrame>,
        cancel: CancelToken,
    ) -> Result<Self, Error>
    where
        S: ByteSource + 'static,
    {
        let token = cancel.clone();
        let handle = thread::Builder::new()
            .name("lidar-reader".to_string())
            .spawn(move || read_loop(source, tx, token))?;

        info!("lidar reader thread started");
        Ok(Self {
            cancel,
            handle: Some(handle),
        })
    }

    /// The token observed by the reader thread.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Whether the reader thread has exited.
    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().is_none_or(|h| h.is_finished())
    }

    /// Wait for the thread to exit on its own, without cancelling it.
    pub fn join(mut self) -> Result<ReaderStats, Error> {
        self.join_inner()
    }

    /// Cancel the reader thread and wait for it to exit.
    ///
    /// Returns the reader's counters, or the source error that stopped it.
    pub fn shutdown(mut self) -> Result<ReaderStats, Error> {
        info!("shutting down lidar reader");
        self.cancel.cancel();
        self.join_inner()
    }

    fn join_inner(&mut self) -> Result<ReaderStats, Error> {
        match self.handle.take() {
            Some(handle) => handle.join().map_err(|_| Error::ThreadPanic)?,
            None => Ok(ReaderStats::default()),
        }
    }
}

impl Drop for ReaderHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
        let _ = self.join_inner();
    }
}

/// Reader loop body, run on the reader thread.
///
/// Public so callers with their own threading can drive a source directly.
pub fn read_loop<S: ByteSource>(
    mut source: S,
    tx: Sender<StampedFrame>,
    cancel: CancelToken,
) -> Result<ReaderStats, Error> {
    let mut framer = Framer::new();
    let mut buf = [0u8; READ_BUFFER_SIZE];
    let mut stats = ReaderStats::default();

    while !cancel.is_cancelled() && source.has_more() {
        let result = source.bytes_available().and_then(|available| {
            let want = available.clamp(1, READ_BUFFER_SIZE);
            source.read_bytes(&mut buf[..want])
        });

        let len = match result {
            Ok(len) => len,
            Err(e) => {
                error!("lidar read error, stopping reader: {}", e);
                return Err(e);
            }
        };
        if len == 0 {
            continue;
        }
        stats.bytes_read += len as u64;

        framer.push(&buf[..len]);
        for event in framer.events() {
            match event {
                FrameEvent::Frame(frame) => {
                    let received_ns = timestamp()?;
                    tx.send(StampedFrame { received_ns, frame }).map_err(|e| {
                        info!("frame receiver dropped, stopping reader");
                        Error::from(e)
                    })?;
                }
                FrameEvent::Rejected(reason) => debug!("dropped bytes: {}", reason),
            }
        }
    }

    stats.framer = framer.stats();
    if framer.buffered() > 0 {
        debug!("discarding {} unframed bytes", framer.buffered());
    }
    info!(
        "lidar reader exiting: {} bytes, {} frames, {} bytes dropped",
        stats.bytes_read, stats.framer.frames, stats.framer.discarded_bytes
    );
    Ok(stats)
}
