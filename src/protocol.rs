// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! Wire format of the 2D LiDAR measurement frame.
//!
//! # Frame Structure
//!
//! Every frame is exactly 47 bytes, multi-byte fields little-endian:
//!
//! | Offset | Size | Field                                   |
//! |--------|------|-----------------------------------------|
//! | 0      | 1    | header, always `0x54`                   |
//! | 1      | 1    | version/length, always `0x2C`           |
//! | 2      | 2    | rotation speed                          |
//! | 4      | 2    | start angle, 0.01°                      |
//! | 6      | 36   | 12 × (distance u16 mm + intensity u8)   |
//! | 42     | 2    | end angle, 0.01°                        |
//! | 44     | 2    | timestamp                               |
//! | 46     | 1    | checksum (carried, never verified)      |

use crate::lidar::{Frame, POINTS_PER_FRAME, Point};

/// Header sentinel byte
pub const HEADER: u8 = 0x54;

/// Version/length sentinel byte
pub const VER_LEN: u8 = 0x2C;

/// Total frame size in bytes
pub const FRAME_SIZE: usize = 47;

/// Size of one point record
const POINT_SIZE: usize = 3;

/// Byte offsets of the fixed fields
const SPEED_OFFSET: usize = 2;
const START_ANGLE_OFFSET: usize = 4;
const POINTS_OFFSET: usize = 6;
const END_ANGLE_OFFSET: usize = 42;
const TIMESTAMP_OFFSET: usize = 44;
const CHECKSUM_OFFSET: usize = 46;

#[inline]
fn u16_at(data: &[u8; FRAME_SIZE], offset: usize) -> u16 {
    u16::from_le_bytes([data[offset], data[offset + 1]])
}

/// Decode a validated frame window.
///
/// The sentinels are copied as found; checking them is the framer's job.
/// Decoding cannot fail.
pub fn decode(data: &[u8; FRAME_SIZE]) -> Frame {
    let mut points = [Point::default(); POINTS_PER_FRAME];
    for (i, point) in points.iter_mut().enumerate() {
        let base = POINTS_OFFSET + i * POINT_SIZE;
        *point = Point {
            distance: u16_at(data, base),
            intensity: data[base + 2],
        };
    }

    Frame {
        header: data[0],
        ver_len: data[1],
        speed: u16_at(data, SPEED_OFFSET),
        start_angle: u16_at(data, START_ANGLE_OFFSET),
        points,
        end_angle: u16_at(data, END_ANGLE_OFFSET),
        timestamp: u16_at(data, TIMESTAMP_OFFSET),
        checksum: data[CHECKSUM_OFFSET],
    }
}

/// Serialize a frame back into its 47-byte wire form.
pub fn encode(frame: &Frame) -> [u8; FRAME_SIZE] {
    let mut data = [0u8; FRAME_SIZE];
    data[0] = frame.header;
    data[1] = frame.ver_len;
    data[SPEED_OFFSET..SPEED_OFFSET + 2].copy_from_slice(&frame.speed.to_le_bytes());
    data[START_ANGLE_OFFSET..START_ANGLE_OFFSET + 2]
        .copy_from_slice(&frame.start_angle.to_le_bytes());
    for (i, point) in frame.points.iter().enumerate() {
        let base = POINTS_OFFSET + i * POINT_SIZE;
        data[base..base + 2].copy_from_slice(&point.distance.to_le_bytes());
        data[base + 2] = point.intensity;
    }
    data[END_ANGLE_OFFSET..END_ANGLE_OFFSET + 2].copy_from_slice(&frame.end_angle.to_le_bytes());
    data[TIMESTAMP_OFFSET..TIMESTAMP_OFFSET + 2].copy_from_slice(&frame.timestamp.to_le_bytes());
    data[CHECKSUM_OFFSET] = frame.checksum;
    data
}

impl Frame {
    /// Build a frame with valid sentinels and the given sweep.
    pub fn new(start_angle: u16, end_angle: u16, points: [Point; POINTS_PER_FRAME]) -> Self {
        Self {
            header: HEADER,
            ver_len: VER_LEN,
            start_angle,
            end_angle,
            points,
            ..Default::default()
        }
    }
}
