// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! Consumer side: projection, clustering and marker placement.
//!
//! The consumer runs on the display cadence. Each tick it drains every frame
//! the reader has queued, without blocking, and processes the private batch
//! in arrival order:
//!
//! ```text
//! ┌──────────────┐   kanal   ┌────────────┐   ┌────────────┐   ┌──────────────┐
//! │ reader thread│ ────────► │ drain_     │ ─►│ project()  │ ─►│ cluster_     │
//! │  (producer)  │ unbounded │ pending()  │   │ per frame  │   │ triplets()   │
//! └──────────────┘           └────────────┘   └────────────┘   └──────┬───────┘
//!                                                                     ▼
//!                                                              ┌──────────────┐
//!                                                              │ MarkerSink   │
//!                                                              └──────────────┘
//! ```
//!
//! Clustering runs on one frame's points at a time.

use crate::{
    cluster::{ClusterData, DEFAULT_THRESHOLD, cluster_triplets},
    lidar::{Cluster, Error, ProjectedPoint, StampedFrame},
    markers::{DEFAULT_LIFETIME, Marker, MarkerSet},
    projection::{Projection, SignConvention, project},
};
use kanal::Receiver;
use std::time::{Duration, Instant};
use tracing::{debug, info, info_span, instrument, trace};

/// Receiver of pipeline output, typically a renderer.
pub trait MarkerSink {
    /// Projected points of one frame, for direct drawing.
    fn points(&mut self, _frame: &StampedFrame, _points: &[ProjectedPoint]) {}

    /// A cluster was detected and a marker placed for it.
    fn marker(&mut self, cluster: &Cluster, marker: &Marker);
}

/// Sink that reports through `tracing`.
#[derive(Debug, Default)]
pub struct LogSink;

impl MarkerSink for LogSink {
    fn points(&mut self, frame: &StampedFrame, points: &[ProjectedPoint]) {
        trace!(
            start_angle = frame.frame.start_angle,
            end_angle = frame.frame.end_angle,
            n_points = points.len(),
            "frame"
        );
    }

    fn marker(&mut self, cluster: &Cluster, _marker: &Marker) {
        info!("marker at ({:.3}, {:.3})", cluster.x, cluster.y);
    }
}

/// Pipeline settings.
#[derive(Clone, Debug, PartialEq)]
pub struct PipelineConfig {
    /// Axis convention of the projected points
    pub convention: SignConvention,
    /// Run the clusterer; when off only points are emitted
    pub clustering: bool,
    /// Cluster neighbor distance in meters
    pub threshold: f32,
    /// How long a marker lives
    pub marker_lifetime: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            convention: SignConvention::default(),
            clustering: true,
            threshold: DEFAULT_THRESHOLD,
            marker_lifetime: DEFAULT_LIFETIME,
        }
    }
}

impl PipelineConfig {
    /// Reject a neighbor distance that is not a positive finite number.
    pub fn validate(&self) -> Result<(), Error> {
        if !(self.threshold.is_finite() && self.threshold > 0.0) {
            return Err(Error::Config(format!(
                "clustering threshold must be positive, got {}",
                self.threshold
            )));
        }
        Ok(())
    }
}

/// Counters for one processed batch.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BatchSummary {
    /// Frames in the batch
    pub frames: usize,
    /// Frames skipped for a non-increasing sweep
    pub skipped: usize,
    /// Points projected
    pub points: usize,
    /// Clusters found
    pub clusters: usize,
    /// Markers that expired this tick
    pub expired: usize,
}

/// Non-blocking drain of everything currently queued on `rx`.
///
/// Returns items in send order. A closed channel simply ends the drain.
pub fn drain_pending<T>(rx: &Receiver<T>) -> Vec<T> {
    let mut pending = Vec::new();
    while let Ok(Some(item)) = rx.try_recv() {
        pending.push(item);
    }
    pending
}

/// Consumer state carried across ticks.
pub struct Pipeline {
    config: PipelineConfig,
    cluster_data: ClusterData,
    markers: MarkerSet,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            cluster_data: ClusterData::new(config.threshold),
            markers: MarkerSet::new(config.marker_lifetime),
            config,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Live markers.
    pub fn markers(&self) -> &MarkerSet {
        &self.markers
    }

    /// Project and cluster one frame, placing a marker per cluster.
    ///
    /// Skipped frames reach neither the sink nor the clusterer.
    pub fn process_frame<K: MarkerSink>(
        &mut self,
        frame: &StampedFrame,
        now: Instant,
        sink: &mut K,
    ) -> Projection {
        let projection = project(&frame.frame, self.config.convention);

        match &projection {
            Projection::Points(points) => {
                sink.points(frame, points);

                if self.config.clustering {
                    for cluster in cluster_triplets(&mut self.cluster_data, points) {
                        let marker = self.markers.place(&cluster, now);
                        sink.marker(&cluster, &marker);
                    }
                }
            }
            Projection::Skipped(reason) => trace!(?reason, "frame skipped"),
        }

        projection
    }

    /// Expire old markers and process a batch of frames in order.
    #[instrument(skip_all, fields(frames = frames.len()))]
    pub fn process_batch<K: MarkerSink>(
        &mut self,
        frames: &[StampedFrame],
        now: Instant,
        sink: &mut K,
    ) -> BatchSummary {
        let mut summary = BatchSummary {
            frames: frames.len(),
            expired: self.markers.expire(now),
            ..Default::default()
        };

        let live_before = self.markers.len();
        for frame in frames {
            match self.process_frame(frame, now, sink) {
                Projection::Points(points) => summary.points += points.len(),
                Projection::Skipped(_) => summary.skipped += 1,
            }
        }
        summary.clusters = self.markers.len() - live_before;

        if summary.frames > 0 {
            debug!(?summary, "batch");
        }
        summary
    }

    /// Drain the channel and process everything pending.
    pub fn tick<K: MarkerSink>(
        &mut self,
        rx: &Receiver<StampedFrame>,
        now: Instant,
        sink: &mut K,
    ) -> BatchSummary {
        let frames = info_span!("drain").in_scope(|| drain_pending(rx));
        self.process_batch(&frames, now, sink)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lidar::{Frame, POINTS_PER_FRAME, Point};

    #[derive(Default)]
    struct Collect {
        frames: usize,
        points: Vec<ProjectedPoint>,
        clusters: Vec<Cluster>,
    }

    impl MarkerSink for Collect {
        fn points(&mut self, _frame: &StampedFrame, points: &[ProjectedPoint]) {
            self.frames += 1;
            self.points.extend_from_slice(points);
        }

        fn marker(&mut self, cluster: &Cluster, _marker: &Marker) {
            self.clusters.push(*cluster);
        }
    }

    /// Frame sweeping 0°..12° with a three-sample reflector at samples 4..6.
    fn reflector_frame(start: u16, end: u16) -> StampedFrame {
        let mut points = [Point {
            distance: 8000,
            intensity: 10,
        }; POINTS_PER_FRAME];
        for p in &mut points[4..7] {
            p.distance = 1000;
            p.intensity = 250;
        }
        StampedFrame {
            received_ns: 0,
            frame: Frame::new(start, end, points),
        }
    }

    #[test]
    fn test_reflector_yields_one_marker() {
        let mut pipeline = Pipeline::new(PipelineConfig::default());
        let mut sink = Collect::default();
        let now = Instant::now();

        let summary = pipeline.process_batch(&[reflector_frame(0, 1200)], now, &mut sink);
        assert_eq!(summary.frames, 1);
        assert_eq!(summary.points, POINTS_PER_FRAME);
        assert_eq!(summary.skipped, 0);
        // Samples at 8 m are 0.14 m apart and never cluster; the three
        // samples at 1 m are 0.017 m apart
        assert_eq!(summary.clusters, 1);
        assert_eq!(sink.clusters.len(), 1);
        assert_eq!(sink.clusters[0].members, [4, 5, 6]);

        let expected_x = (4..7).map(|i| (i as f32).to_radians().cos()).sum::<f32>() / 3.0;
        assert!((sink.clusters[0].x - expected_x).abs() < 1e-5);
        assert_eq!(pipeline.markers().len(), 1);
    }

    #[test]
    fn test_mirror_convention_flips_markers() {
        let config = PipelineConfig {
            convention: SignConvention::MirrorX,
            ..Default::default()
        };
        let mut pipeline = Pipeline::new(config);
        let mut sink = Collect::default();
        pipeline.process_batch(&[reflector_frame(0, 1200)], Instant::now(), &mut sink);
        assert_eq!(sink.clusters.len(), 1);
        assert!(sink.clusters[0].x < 0.0);
        assert!(sink.points.iter().all(|p| p.x <= 0.0));
    }

    #[test]
    fn test_wrapping_sweep_yields_nothing() {
        let mut pipeline = Pipeline::new(PipelineConfig::default());
        let mut sink = Collect::default();
        let summary = pipeline.process_batch(
            &[reflector_frame(35500, 300), reflector_frame(1200, 1200)],
            Instant::now(),
            &mut sink,
        );
        assert_eq!(summary.skipped, 2);
        assert_eq!(summary.points, 0);
        assert_eq!(summary.clusters, 0);
        assert_eq!(sink.frames, 0);
        assert!(sink.clusters.is_empty());
    }

    #[test]
    fn test_clustering_disabled() {
        let config = PipelineConfig {
            clustering: false,
            ..Default::default()
        };
        let mut pipeline = Pipeline::new(config);
        let mut sink = Collect::default();
        let summary = pipeline.process_batch(&[reflector_frame(0, 1200)], Instant::now(), &mut sink);
        assert_eq!(summary.points, POINTS_PER_FRAME);
        assert_eq!(summary.clusters, 0);
        assert!(sink.clusters.is_empty());
        assert_eq!(sink.points.len(), POINTS_PER_FRAME);
    }

    #[test]
    fn test_frames_clustered_separately() {
        // Two samples at the end of one frame and one at the start of the
        // next never form a cluster together
        let mut a = [Point {
            distance: 9000,
            intensity: 0,
        }; POINTS_PER_FRAME];
        a[10].distance = 1000;
        a[11].distance = 1000;
        let mut b = [Point {
            distance: 9000,
            intensity: 0,
        }; POINTS_PER_FRAME];
        b[0].distance = 1000;

        let frames = [
            StampedFrame {
                received_ns: 0,
                frame: Frame::new(0, 1200, a),
            },
            StampedFrame {
                received_ns: 1,
                frame: Frame::new(1200, 2400, b),
            },
        ];
        let mut pipeline = Pipeline::new(PipelineConfig::default());
        let mut sink = Collect::default();
        let summary = pipeline.process_batch(&frames, Instant::now(), &mut sink);
        assert_eq!(summary.clusters, 0);
    }

    #[test]
    fn test_tick_drains_in_order_and_expires() {
        let (tx, rx) = kanal::unbounded();
        for start in [0u16, 1200, 2400] {
            tx.send(reflector_frame(start, start + 1200)).unwrap();
        }

        let mut pipeline = Pipeline::new(PipelineConfig::default());
        let mut sink = Collect::default();
        let now = Instant::now();

        let summary = pipeline.tick(&rx, now, &mut sink);
        assert_eq!(summary.frames, 3);
        assert_eq!(summary.clusters, 3);
        // Markers appear in frame order, sweeping counter-clockwise
        assert!(sink.clusters[0].y < sink.clusters[1].y);
        assert!(sink.clusters[1].y < sink.clusters[2].y);

        // Nothing pending: empty batch, markers still alive
        let summary = pipeline.tick(&rx, now + Duration::from_millis(10), &mut sink);
        assert_eq!(summary, BatchSummary::default());
        assert_eq!(pipeline.markers().len(), 3);

        let summary = pipeline.tick(&rx, now + DEFAULT_LIFETIME, &mut sink);
        assert_eq!(summary.expired, 3);
        assert!(pipeline.markers().is_empty());
        drop(tx);
    }

    #[test]
    fn test_drain_pending_empty() {
        let (_tx, rx) = kanal::unbounded::<u32>();
        assert!(drain_pending(&rx).is_empty());
    }

    #[test]
    fn test_config_rejects_bad_threshold() {
        assert!(PipelineConfig::default().validate().is_ok());

        for threshold in [-0.5, 0.0, f32::NAN, f32::INFINITY] {
            let config = PipelineConfig {
                threshold,
                ..Default::default()
            };
            assert!(
                matches!(config.validate(), Err(Error::Config(_))),
                "accepted threshold {}",
                threshold
            );
        }
    }
}
