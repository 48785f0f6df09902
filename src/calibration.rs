// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! Calibration constants decoded from DIFOP packets.
//!
//! A [`CalibrationTable`] is an immutable value. The table in force is
//! published through a [`CalibrationHandle`], which swaps whole snapshots
//! atomically so concurrent decoders observe either the previous or the
//! new table, never a mix.
//!
//! ```text
//!  DIFOP ──► decode_calibration ──► CalibrationHandle::apply
//!                                          │ (ArcSwap)
//!              decoder threads ◄── load() ─┘  Arc<Calibration { version, table }>
//! ```

use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::{
    difop::DifopPacket,
    lidar::{Error, LASER_COUNT},
};

/// Factory vertical angles in degrees, indexed by laser id.
///
/// Used when a unit ships without per-unit calibration.
pub const FACTORY_VERTICAL_ANGLES: [f64; LASER_COUNT] = [
    -15.0, -13.0, -11.0, -9.0, -7.0, -5.0, -3.0, -1.0, 15.0, 13.0, 11.0, 9.0, 7.0, 5.0, 3.0, 1.0,
];

/// Factory vertical angles in radians, indexed by laser id.
pub fn factory_vertical_angles() -> [f64; LASER_COUNT] {
    FACTORY_VERTICAL_ANGLES.map(f64::to_radians)
}

/// Size of one raw range unit, selected by firmware generation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RangeResolution {
    /// 1cm per unit (older firmware)
    #[default]
    Coarse,
    /// 5mm per unit
    Fine,
}

impl RangeResolution {
    /// Meters per raw range unit.
    pub fn meters(self) -> f64 {
        match self {
            RangeResolution::Coarse => 0.01,
            RangeResolution::Fine => 0.005,
        }
    }
}

/// Per-laser vertical angles, or the absence of device calibration.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum VerticalAngles {
    /// Angles in radians read from the device
    Device([f64; LASER_COUNT]),
    /// Device table empty; callers fall back to the factory table
    Absent,
}

/// Calibration constants in force for decoding.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CalibrationTable {
    pub vertical_angles: VerticalAngles,
    pub range_resolution: RangeResolution,
}

impl Default for CalibrationTable {
    fn default() -> Self {
        Self::factory()
    }
}

impl CalibrationTable {
    /// Table used before any DIFOP packet has been seen.
    pub fn factory() -> Self {
        Self {
            vertical_angles: VerticalAngles::Absent,
            range_resolution: RangeResolution::Coarse,
        }
    }

    /// Extract calibration from a DIFOP packet.
    pub fn from_difop(packet: &DifopPacket) -> Self {
        let angles = packet.corrected_vertical_angles();
        let vertical_angles = if angles.is_empty() {
            VerticalAngles::Absent
        } else {
            VerticalAngles::Device(angles.to_radians())
        };

        Self {
            vertical_angles,
            range_resolution: packet.range_resolution(),
        }
    }

    /// True when the device reported no per-unit vertical angles.
    pub fn is_absent(&self) -> bool {
        matches!(self.vertical_angles, VerticalAngles::Absent)
    }

    /// Vertical angles in radians, falling back to the factory table.
    pub fn vertical_angles(&self) -> [f64; LASER_COUNT] {
        match self.vertical_angles {
            VerticalAngles::Device(angles) => angles,
            VerticalAngles::Absent => factory_vertical_angles(),
        }
    }

    /// Vertical angle of `laser` in radians.
    pub fn vertical_angle(&self, laser: usize) -> f64 {
        match &self.vertical_angles {
            VerticalAngles::Device(angles) => angles[laser],
            VerticalAngles::Absent => FACTORY_VERTICAL_ANGLES[laser].to_radians(),
        }
    }

    /// Raw range converted to meters.
    #[inline]
    pub fn distance(&self, range: u16) -> f64 {
        f64::from(range) * self.range_resolution.meters()
    }
}

/// Decode the calibration constants of a DIFOP datagram.
pub fn decode_calibration(data: &[u8]) -> Result<CalibrationTable, Error> {
    let packet = DifopPacket::new(data)?;
    Ok(CalibrationTable::from_difop(&packet))
}

/// Versioned calibration snapshot.
#[derive(Clone, Debug, PartialEq)]
pub struct Calibration {
    /// Zero for the factory table, incremented on every replacement
    pub version: u64,
    pub table: CalibrationTable,
}

/// Outcome of [`CalibrationHandle::apply`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Update {
    /// Table already in force at this version
    Unchanged(u64),
    /// Table swapped in as this new version
    Replaced(u64),
}

impl Update {
    pub fn version(self) -> u64 {
        match self {
            Update::Unchanged(version) | Update::Replaced(version) => version,
        }
    }
}

/// Shared handle to the calibration currently in force.
#[derive(Debug)]
pub struct CalibrationHandle {
    current: ArcSwap<Calibration>,
}

impl Default for CalibrationHandle {
    fn default() -> Self {
        Self::new(CalibrationTable::factory())
    }
}

impl CalibrationHandle {
    /// Create a handle holding `table` as version 0.
    pub fn new(table: CalibrationTable) -> Self {
        Self {
            current: ArcSwap::from_pointee(Calibration { version: 0, table }),
        }
    }

    /// Snapshot of the calibration in force.
    pub fn load(&self) -> Arc<Calibration> {
        self.current.load_full()
    }

    /// Version of the calibration in force.
    pub fn version(&self) -> u64 {
        self.current.load().version
    }

    /// Replace the whole table, returning the new version.
    pub fn replace(&self, table: CalibrationTable) -> u64 {
        let previous = self.current.rcu(|current| Calibration {
            version: current.version + 1,
            table,
        });
        previous.version + 1
    }

    /// Swap in `table` unless it is already in force.
    ///
    /// The comparison and the swap happen in one `rcu` step, so writers
    /// racing with the same table bump the version once.
    pub fn apply(&self, table: CalibrationTable) -> Update {
        let previous = self.current.rcu(|current| {
            if current.table == table {
                Arc::clone(current)
            } else {
                Arc::new(Calibration {
                    version: current.version + 1,
                    table,
                })
            }
        });

        if previous.table == table {
            Update::Unchanged(previous.version)
        } else {
            Update::Replaced(previous.version + 1)
        }
    }
}
