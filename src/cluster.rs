// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! Greedy triplet clustering of projected points.
//!
//! A retro-reflective marker returns exactly three adjacent beam hits, so a
//! marker is detected as three points lying within a small distance of each
//! other. The clusterer makes a single forward pass over the input:
//!
//! - Skip point `i` if it already belongs to a cluster.
//! - Collect `i` plus every later unused point `j` closer to `i` than the
//!   threshold, stopping at three members.
//! - With exactly three members, emit their centroid and mark all three
//!   used. Otherwise emit nothing and leave them free.
//!
//! The pass never revisits earlier points, so the input order decides which
//! triplets form when groups are ambiguous. Groups of one or two points never
//! produce a cluster and groups larger than three are split greedily.

use crate::lidar::{Cluster, ProjectedPoint};
use tracing::trace;

/// Number of points making up one marker.
pub const CLUSTER_SIZE: usize = 3;

/// Default neighbor distance in meters.
pub const DEFAULT_THRESHOLD: f32 = 0.1;

/// Reusable clustering state.
///
/// Holding on to one `ClusterData` across calls avoids reallocating the
/// scratch buffers for every frame.
#[derive(Debug, Clone)]
pub struct ClusterData {
    threshold_sq: f32,
    used: Vec<bool>,
    members: Vec<usize>,
}

impl ClusterData {
    /// Create clustering state for the given neighbor distance in meters.
    ///
    /// A threshold that is not a positive finite distance matches nothing.
    pub fn new(threshold_m: f32) -> Self {
        let threshold_sq = if threshold_m.is_finite() && threshold_m > 0.0 {
            threshold_m * threshold_m
        } else {
            0.0
        };
        Self {
            threshold_sq,
            used: Vec::new(),
            members: Vec::with_capacity(CLUSTER_SIZE),
        }
    }

    /// Neighbor distance in meters.
    pub fn threshold(&self) -> f32 {
        self.threshold_sq.sqrt()
    }
}

impl Default for ClusterData {
    fn default() -> Self {
        Self::new(DEFAULT_THRESHOLD)
    }
}

/// Run the triplet clustering pass over `points`.
///
/// Clusters are returned in the order their first member appears in the
/// input. Member indices refer to positions in `points`.
pub fn cluster_triplets(data: &mut ClusterData, points: &[ProjectedPoint]) -> Vec<Cluster> {
    let n = points.len();
    data.used.clear();
    data.used.resize(n, false);

    let mut clusters = Vec::new();

    for i in 0..n {
        if data.used[i] {
            continue;
        }

        data.members.clear();
        data.members.push(i);

        let seed = &points[i];
        for j in (i + 1)..n {
            if data.used[j] {
                continue;
            }
            let dx = points[j].x - seed.x;
            let dy = points[j].y - seed.y;
            if dx * dx + dy * dy < data.threshold_sq {
                data.members.push(j);
                if data.members.len() == CLUSTER_SIZE {
                    break;
                }
            }
        }

        if data.members.len() != CLUSTER_SIZE {
            continue;
        }

        let mut sum_x = 0.0f32;
        let mut sum_y = 0.0f32;
        for &m in &data.members {
            sum_x += points[m].x;
            sum_y += points[m].y;
            data.used[m] = true;
        }

        let cluster = Cluster {
            x: sum_x / CLUSTER_SIZE as f32,
            y: sum_y / CLUSTER_SIZE as f32,
            members: [data.members[0], data.members[1], data.members[2]],
        };
        trace!(?cluster, "cluster");
        clusters.push(cluster);
    }

    clusters
}
