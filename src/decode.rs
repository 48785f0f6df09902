// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! MSOP packet decoding.
//!
//! The sensor transmits one azimuth per block, but 32 firings happen while
//! the head keeps turning. Per-laser azimuths are reconstructed by linear
//! interpolation between neighbouring blocks:
//!
//! ```text
//!  block i azimuth                 block i+1 azimuth
//!  │ subblock 0 ──────► │ subblock 1 ──────► │
//!  t                    t + Δ/2             t + Δ
//!  lasers step by (Δ/2) · laser_interval / block_interval
//! ```
//!
//! The last block has no successor, so its Δ is mirrored from the
//! preceding block. All angles wrap into `[0, 2π)`.
//!
//! # Example
//!
//! ```ignore
//! use edgefirst_rslidar::decode::decode;
//!
//! let decoded = decode(&buf[..len])?;
//! if decoded.valid {
//!     for sample in decoded.samples.filter(|s| s.is_valid()) {
//!         let meters = calibration.table.distance(sample.range);
//!         // sample.azimuth, sample.delay, sample.id
//!     }
//! }
//! ```

use std::{f64::consts::TAU, iter::FusedIterator};

use crate::{
    filter::RangeGate,
    lidar::{
        BLOCK_COUNT, BLOCK_FIRING_INTERVAL, Error, LASER_COUNT, LASER_FIRING_INTERVAL,
        SAMPLES_PER_PACKET, SUBBLOCK_COUNT, normalize_angle, ticks_to_radians,
    },
    msop::MsopPacket,
};

/// One decoded laser firing.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Sample {
    /// Laser id, `0..LASER_COUNT`
    pub id: usize,
    /// Block the firing belongs to
    pub block: usize,
    /// Subblock (firing sequence) within the block
    pub subblock: usize,
    /// Raw range in sensor units
    pub range: u16,
    /// Raw reflectivity
    pub reflectivity: u8,
    /// Azimuth in radians, `[0, 2π)`
    pub azimuth: f64,
    /// Firing time in seconds, relative to the start of the block
    pub delay: f64,
}

impl Sample {
    /// True when the range lies inside the sensor's default valid window.
    #[inline]
    pub fn is_valid(&self) -> bool {
        RangeGate::default().contains(self.range)
    }

    /// Firing time in seconds relative to the first block of the packet.
    #[inline]
    pub fn packet_delay(&self) -> f64 {
        self.block as f64 * BLOCK_FIRING_INTERVAL + self.delay
    }

    /// Range in meters for the given resolution (meters per raw unit).
    #[inline]
    pub fn distance(&self, resolution: f64) -> f64 {
        f64::from(self.range) * resolution
    }
}

/// Position of the decoder within a packet.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct Cursor {
    pub block: usize,
    pub subblock: usize,
    pub laser: usize,
}

/// Outcome of advancing a [`Cursor`] by one laser.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Transition {
    /// Next laser in the same subblock
    Laser(Cursor),
    /// First laser of the next subblock in the same block
    Subblock(Cursor),
    /// First laser of the next block
    Block(Cursor),
    /// Past the last laser of the last block
    Done,
}

impl Cursor {
    pub const START: Cursor = Cursor {
        block: 0,
        subblock: 0,
        laser: 0,
    };

    /// Step to the next laser firing.
    pub fn advance(self) -> Transition {
        let laser = self.laser + 1;
        if laser < LASER_COUNT {
            return Transition::Laser(Cursor { laser, ..self });
        }

        let subblock = self.subblock + 1;
        if subblock < SUBBLOCK_COUNT {
            return Transition::Subblock(Cursor {
                block: self.block,
                subblock,
                laser: 0,
            });
        }

        let block = self.block + 1;
        if block < BLOCK_COUNT {
            Transition::Block(Cursor {
                block,
                subblock: 0,
                laser: 0,
            })
        } else {
            Transition::Done
        }
    }

    /// Linear index of this position in iteration order.
    #[inline]
    pub fn index(&self) -> usize {
        (self.block * SUBBLOCK_COUNT + self.subblock) * LASER_COUNT + self.laser
    }
}

/// Interpolation baseline of one block.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BlockAzimuth {
    /// Azimuth of the first laser of subblock 0
    pub start: f64,
    /// Azimuth of the first laser of subblock 1
    pub middle: f64,
    /// Azimuth increment between consecutive lasers
    pub step: f64,
}

/// Forward rotation from `from` to `to`, adding a revolution when `to`
/// has wrapped past zero.
#[inline]
fn forward_delta(from: f64, to: f64) -> f64 {
    if to < from { to + TAU - from } else { to - from }
}

/// Compute the interpolation baseline of `block`.
///
/// The neighbour is block `block + 1`, except for the last block which is
/// mirrored onto block `block - 1`.
///
/// Only block 0 goes through the packet validity check. A later block
/// carrying a raw azimuth of 36000 or more is converted as is, so the
/// delta into a following in-range block can come out negative and the
/// lasers of that block step backwards.
pub fn block_azimuth(packet: &MsopPacket, block: usize) -> BlockAzimuth {
    let t = ticks_to_radians(packet.azimuth(block));
    let delta = if block + 1 == BLOCK_COUNT {
        forward_delta(ticks_to_radians(packet.azimuth(block - 1)), t)
    } else {
        forward_delta(t, ticks_to_radians(packet.azimuth(block + 1)))
    };
    let half = delta / 2.0;

    BlockAzimuth {
        start: normalize_angle(t),
        middle: normalize_angle(t + half),
        step: half * (LASER_FIRING_INTERVAL / BLOCK_FIRING_INTERVAL),
    }
}

#[derive(Clone, Copy, Debug)]
enum State {
    Start,
    Active {
        cursor: Cursor,
        azimuth: f64,
        baseline: BlockAzimuth,
    },
    Done,
}

/// Lazy sequence of samples over one MSOP packet.
///
/// Cloning the iterator, or creating a new one over the same buffer,
/// replays the identical sequence.
#[derive(Clone, Debug)]
pub struct Samples<'a> {
    packet: MsopPacket<'a>,
    state: State,
}

impl<'a> Samples<'a> {
    /// Iterate `packet`. Packets failing the packet-level validity check
    /// produce no samples.
    pub fn new(packet: MsopPacket<'a>) -> Self {
        let state = if packet.is_valid() {
            State::Start
        } else {
            State::Done
        };
        Self { packet, state }
    }

    /// Packet being decoded.
    pub fn packet(&self) -> &MsopPacket<'a> {
        &self.packet
    }

    #[inline]
    fn sample(&self, cursor: Cursor, azimuth: f64) -> Sample {
        let r = self
            .packet
            .laser_return(cursor.block, cursor.subblock, cursor.laser);
        let offset = if cursor.subblock == 0 {
            0.0
        } else {
            BLOCK_FIRING_INTERVAL / 2.0
        };

        Sample {
            id: cursor.laser,
            block: cursor.block,
            subblock: cursor.subblock,
            range: r.range,
            reflectivity: r.reflectivity,
            azimuth,
            delay: LASER_FIRING_INTERVAL * cursor.laser as f64 + offset,
        }
    }

    fn remaining(&self) -> usize {
        match self.state {
            State::Start => SAMPLES_PER_PACKET,
            State::Active { cursor, .. } => SAMPLES_PER_PACKET - cursor.index() - 1,
            State::Done => 0,
        }
    }
}

impl Iterator for Samples<'_> {
    type Item = Sample;

    fn next(&mut self) -> Option<Sample> {
        let (cursor, azimuth, baseline) = match self.state {
            State::Start => {
                let baseline = block_azimuth(&self.packet, 0);
                (Cursor::START, baseline.start, baseline)
            }
            State::Active {
                cursor,
                azimuth,
                baseline,
            } => match cursor.advance() {
                Transition::Laser(next) => (next, normalize_angle(azimuth + baseline.step), baseline),
                Transition::Subblock(next) => (next, baseline.middle, baseline),
                Transition::Block(next) => {
                    let baseline = block_azimuth(&self.packet, next.block);
                    (next, baseline.start, baseline)
                }
                Transition::Done => {
                    self.state = State::Done;
                    return None;
                }
            },
            State::Done => return None,
        };

        self.state = State::Active {
            cursor,
            azimuth,
            baseline,
        };
        Some(self.sample(cursor, azimuth))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.remaining();
        (n, Some(n))
    }
}

impl ExactSizeIterator for Samples<'_> {}

impl FusedIterator for Samples<'_> {}

impl<'a> MsopPacket<'a> {
    /// Iterate the decoded samples of this packet.
    pub fn samples(&self) -> Samples<'a> {
        Samples::new(*self)
    }
}

/// Result of [`decode`]: packet validity plus the lazy sample sequence.
#[derive(Clone, Debug)]
pub struct Decoded<'a> {
    /// Packet-level validity; invalid packets yield no samples
    pub valid: bool,
    pub samples: Samples<'a>,
}

/// Decode one received MSOP datagram.
///
/// Fails only when `data` is not exactly one MSOP packet long.
pub fn decode(data: &[u8]) -> Result<Decoded<'_>, Error> {
    let packet = MsopPacket::new(data)?;
    Ok(Decoded {
        valid: packet.is_valid(),
        samples: packet.samples(),
    })
}
