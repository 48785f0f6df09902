// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! Packet and sample validity checks.
//!
//! Decoding never drops samples on its own: out-of-range returns (dropouts,
//! noise floor) stay in the sequence and are only flagged. Callers that
//! want clean points layer [`ValidSamples::valid_only`] on top, which
//! keeps the iteration order intact.

use std::iter::FusedIterator;

use crate::{decode::Sample, lidar::MAX_RAW_AZIMUTH};

/// Smallest raw range (exclusive) reported for a real return.
pub const MIN_RANGE: u16 = 2;

/// Largest raw range (exclusive) reported for a real return.
pub const MAX_RANGE: u16 = 20000;

/// Packet-level check on the block 0 raw azimuth.
///
/// 0xFFFF marks a packet without a usable encoder reading. The bound is
/// inclusive: a raw 36000 still passes.
#[inline]
pub fn packet_azimuth_valid(raw: u16) -> bool {
    raw <= MAX_RAW_AZIMUTH
}

/// Exclusive raw range window for valid samples.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RangeGate {
    pub min: u16,
    pub max: u16,
}

impl Default for RangeGate {
    fn default() -> Self {
        Self {
            min: MIN_RANGE,
            max: MAX_RANGE,
        }
    }
}

impl RangeGate {
    pub fn new(min: u16, max: u16) -> Self {
        Self { min, max }
    }

    /// `min < range < max`
    #[inline]
    pub fn contains(&self, range: u16) -> bool {
        range > self.min && range < self.max
    }

    #[inline]
    pub fn accepts(&self, sample: &Sample) -> bool {
        self.contains(sample.range)
    }
}

/// Iterator adapter yielding only samples inside a [`RangeGate`].
#[derive(Clone, Debug)]
pub struct ValidOnly<I> {
    inner: I,
    gate: RangeGate,
}

impl<I: Iterator<Item = Sample>> Iterator for ValidOnly<I> {
    type Item = Sample;

    #[inline]
    fn next(&mut self) -> Option<Sample> {
        let gate = self.gate;
        self.inner.find(|s| gate.accepts(s))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, self.inner.size_hint().1)
    }
}

impl<I: FusedIterator<Item = Sample>> FusedIterator for ValidOnly<I> {}

/// Extension trait adding range filtering to any sample iterator.
pub trait ValidSamples: Iterator<Item = Sample> + Sized {
    /// Keep samples inside the sensor's default range window.
    fn valid_only(self) -> ValidOnly<Self> {
        self.with_gate(RangeGate::default())
    }

    /// Keep samples inside a custom range window.
    fn with_gate(self, gate: RangeGate) -> ValidOnly<Self> {
        ValidOnly { inner: self, gate }
    }
}

impl<I: Iterator<Item = Sample>> ValidSamples for I {}
