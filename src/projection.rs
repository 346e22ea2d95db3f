// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! Polar to Cartesian projection of frame samples.
//!
//! Sample `i` of a frame sits at
//!
//! ```text
//! step  = (end_angle - start_angle) / 12        integer division, once per frame
//! angle = (start_angle + step * i) / 100.0      degrees
//! ```
//!
//! The step is truncated, so samples are not spread evenly when the sweep is
//! not a multiple of 12 hundredths of a degree. Frames whose end angle is not
//! strictly greater than the start angle (a sweep crossing 0° or a degenerate
//! one) are skipped as a whole.

use crate::lidar::{Frame, POINTS_PER_FRAME, ProjectedPoint};
use clap::ValueEnum;
use std::fmt;

/// Axis convention of the projected coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum SignConvention {
    /// x = d·cos(θ), y = d·sin(θ)
    #[default]
    Standard,
    /// x = -d·cos(θ), y = d·sin(θ)
    MirrorX,
}

impl SignConvention {
    #[inline]
    fn x_sign(self) -> f32 {
        match self {
            SignConvention::Standard => 1.0,
            SignConvention::MirrorX => -1.0,
        }
    }
}

impl fmt::Display for SignConvention {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SignConvention::Standard => write!(f, "standard"),
            SignConvention::MirrorX => write!(f, "mirror-x"),
        }
    }
}

/// Why a frame produced no points.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SkipReason {
    /// End angle not strictly greater than start angle
    NonIncreasingSweep { start_angle: u16, end_angle: u16 },
}

/// Result of projecting one frame.
#[derive(Clone, Debug, PartialEq)]
pub enum Projection {
    Points(Vec<ProjectedPoint>),
    Skipped(SkipReason),
}

impl Projection {
    /// The projected points, empty when the frame was skipped.
    pub fn points(&self) -> &[ProjectedPoint] {
        match self {
            Projection::Points(points) => points,
            Projection::Skipped(_) => &[],
        }
    }

    pub fn into_points(self) -> Vec<ProjectedPoint> {
        match self {
            Projection::Points(points) => points,
            Projection::Skipped(_) => Vec::new(),
        }
    }
}

/// Angular step between samples in hundredths of a degree.
///
/// `None` for sweeps that do not increase.
#[inline]
pub fn angle_step(frame: &Frame) -> Option<u16> {
    if frame.end_angle > frame.start_angle {
        Some((frame.end_angle - frame.start_angle) / POINTS_PER_FRAME as u16)
    } else {
        None
    }
}

/// Angle of sample `index` in degrees.
#[inline]
pub fn sample_angle_deg(frame: &Frame, step: u16, index: usize) -> f32 {
    (frame.start_angle as u32 + step as u32 * index as u32) as f32 / 100.0
}

/// Project every sample of `frame`.
pub fn project(frame: &Frame, convention: SignConvention) -> Projection {
    let Some(step) = angle_step(frame) else {
        return Projection::Skipped(SkipReason::NonIncreasingSweep {
            start_angle: frame.start_angle,
            end_angle: frame.end_angle,
        });
    };

    let x_sign = convention.x_sign();
    let points = frame
        .points
        .iter()
        .enumerate()
        .map(|(index, point)| {
            let angle = sample_angle_deg(frame, step, index).to_radians();
            let distance = point.distance as f32 / 1000.0;
            let (sin, cos) = angle.sin_cos();
            ProjectedPoint {
                x: x_sign * distance * cos,
                y: distance * sin,
                intensity: point.intensity,
                index,
            }
        })
        .collect();

    Projection::Points(points)
}
