// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! Short-lived markers placed at cluster centroids.
//!
//! Each detected cluster becomes a marker that stays alive for a fixed
//! lifetime and is then removed, so a display only shows detections from the
//! last few sweeps.

use crate::lidar::Cluster;
use std::time::{Duration, Instant};

/// Default marker lifetime.
pub const DEFAULT_LIFETIME: Duration = Duration::from_millis(100);

/// A detection marker.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Marker {
    pub x: f32,
    pub y: f32,
    pub placed_at: Instant,
    pub expires_at: Instant,
}

impl Marker {
    pub fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// Set of live markers.
#[derive(Debug, Clone)]
pub struct MarkerSet {
    lifetime: Duration,
    markers: Vec<Marker>,
}

impl MarkerSet {
    pub fn new(lifetime: Duration) -> Self {
        Self {
            lifetime,
            markers: Vec::new(),
        }
    }

    pub fn lifetime(&self) -> Duration {
        self.lifetime
    }

    /// Place a marker at the centroid of `cluster`.
    pub fn place(&mut self, cluster: &Cluster, now: Instant) -> Marker {
        let marker = Marker {
            x: cluster.x,
            y: cluster.y,
            placed_at: now,
            expires_at: now + self.lifetime,
        };
        self.markers.push(marker);
        marker
    }

    /// Remove expired markers, returning how many were removed.
    pub fn expire(&mut self, now: Instant) -> usize {
        let before = self.markers.len();
        self.markers.retain(|m| !m.is_expired(now));
        before - self.markers.len()
    }

    /// Markers still alive as of the last [`Self::expire`].
    pub fn live(&self) -> &[Marker] {
        &self.markers
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }
}

impl Default for MarkerSet {
    fn default() -> Self {
        Self::new(DEFAULT_LIFETIME)
    }
}
