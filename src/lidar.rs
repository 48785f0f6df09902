// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! Common RS-LiDAR-16 constants, angle helpers and error handling.
//!
//! Everything here is shared by the MSOP and DIFOP decoders. Sensor
//! geometry and timing are fixed per model and kept as constants rather
//! than runtime configuration.

use std::{f64::consts::TAU, fmt};

/// Number of lasers fired per subblock.
pub const LASER_COUNT: usize = 16;

/// Number of subblocks (firing sequences) per block.
pub const SUBBLOCK_COUNT: usize = 2;

/// Number of blocks per MSOP packet.
pub const BLOCK_COUNT: usize = 12;

/// Number of samples produced by one valid MSOP packet.
pub const SAMPLES_PER_PACKET: usize = BLOCK_COUNT * SUBBLOCK_COUNT * LASER_COUNT;

/// Time between two consecutive laser firings, in seconds.
pub const LASER_FIRING_INTERVAL: f64 = 3.0e-6;

/// Time covered by one block (two 55.5µs firing sequences), in seconds.
pub const BLOCK_FIRING_INTERVAL: f64 = 111.0e-6;

/// Encoder ticks per degree (azimuth unit is 0.01°).
pub const TICKS_PER_DEGREE: f64 = 100.0;

/// Largest raw block azimuth accepted for a usable packet.
pub const MAX_RAW_AZIMUTH: u16 = 36000;

/// Convert raw encoder ticks (0.01°) to radians.
#[inline]
pub fn ticks_to_radians(ticks: u16) -> f64 {
    (f64::from(ticks) / TICKS_PER_DEGREE).to_radians()
}

/// Wrap an angle into `[0, 2π)`.
///
/// `rem_euclid` can round up to exactly `2π` for tiny negative inputs, so
/// that case is folded back to zero.
#[inline]
pub fn normalize_angle(angle: f64) -> f64 {
    let wrapped = angle.rem_euclid(TAU);
    if wrapped >= TAU { 0.0 } else { wrapped }
}

/// Common error type for packet decoding.
#[derive(Debug)]
pub enum Error {
    /// I/O error (capture files)
    Io(std::io::Error),
    /// Buffer length does not match the fixed packet size
    PacketSize { expected: usize, actual: usize },
    /// Invalid packet data (unknown sync bytes, malformed capture)
    InvalidPacket(String),
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Io(err) => write!(f, "I/O error: {}", err),
            Error::PacketSize { expected, actual } => write!(
                f,
                "packet size mismatch: {} bytes, expected {}",
                actual, expected
            ),
            Error::InvalidPacket(msg) => write!(f, "invalid packet: {}", msg),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}
