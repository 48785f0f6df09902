// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! RS-LiDAR-16 decoding session.
//!
//! The sensor sends two UDP streams: MSOP data packets on port 6699 and
//! DIFOP device information packets on port 7788, about once per second.
//! [`RobosenseDecoder`] accepts datagrams from either stream, keeps the
//! calibration handle current from DIFOP, and turns MSOP packets into
//! lazily decoded [`Scan`]s.
//!
//! # Example
//!
//! ```ignore
//! use edgefirst_rslidar::driver::{Output, RobosenseDecoder};
//!
//! let mut decoder = RobosenseDecoder::new();
//! loop {
//!     let len = socket.recv(&mut buf)?;
//!     match decoder.process(&buf[..len])? {
//!         Output::Scan(scan) => {
//!             for sample in scan.samples.valid_only() {
//!                 let r = scan.calibration.table.distance(sample.range);
//!                 let omega = scan.calibration.table.vertical_angle(sample.id);
//!             }
//!         }
//!         Output::Calibration(version) => {}
//!         Output::Invalid => {}
//!     }
//! }
//! ```

use std::sync::Arc;

use log::{debug, trace, warn};

use crate::{
    calibration::{Calibration, CalibrationHandle, CalibrationTable, Update},
    decode::Samples,
    difop::{DIFOP_PACKET_SIZE, DIFOP_SYNC, DeviceInfo, DifopPacket},
    lidar::Error,
    msop::{MSOP_PACKET_SIZE, MSOP_SYNC, MsopHeader, MsopPacket},
};

/// Kind of a received datagram, identified by its sync bytes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PacketKind {
    Msop,
    Difop,
}

/// Identify a datagram by sync bytes, then check its length.
pub fn classify(data: &[u8]) -> Result<PacketKind, Error> {
    let (kind, expected) = if data.starts_with(&MSOP_SYNC) {
        (PacketKind::Msop, MSOP_PACKET_SIZE)
    } else if data.starts_with(&DIFOP_SYNC) {
        (PacketKind::Difop, DIFOP_PACKET_SIZE)
    } else {
        return Err(Error::InvalidPacket(format!(
            "unknown sync bytes in {} byte packet",
            data.len()
        )));
    };

    if data.len() != expected {
        return Err(Error::PacketSize {
            expected,
            actual: data.len(),
        });
    }

    Ok(kind)
}

/// One MSOP packet ready to be iterated.
#[derive(Clone, Debug)]
pub struct Scan<'a> {
    pub header: MsopHeader,
    /// Calibration in force when the packet was processed
    pub calibration: Arc<Calibration>,
    pub samples: Samples<'a>,
}

/// Result of processing one datagram.
#[derive(Debug)]
pub enum Output<'a> {
    /// DIFOP applied; carries the calibration version now in force
    Calibration(u64),
    /// Valid MSOP packet
    Scan(Scan<'a>),
    /// MSOP packet failing the packet-level validity check
    Invalid,
}

/// Packet counters of a [`RobosenseDecoder`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DecoderStats {
    /// MSOP packets accepted, including invalid ones
    pub msop: u64,
    /// DIFOP packets accepted
    pub difop: u64,
    /// MSOP packets dropped by the validity check
    pub invalid: u64,
    /// Datagrams rejected with an error
    pub rejected: u64,
}

/// RS-LiDAR-16 packet decoder.
pub struct RobosenseDecoder {
    calibration: Arc<CalibrationHandle>,
    device_info: Option<DeviceInfo>,
    stats: DecoderStats,
}

impl Default for RobosenseDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl RobosenseDecoder {
    /// Create a decoder starting from the factory calibration.
    pub fn new() -> Self {
        Self::with_calibration(Arc::new(CalibrationHandle::default()))
    }

    /// Create a decoder sharing an existing calibration handle.
    ///
    /// Decoders on other threads holding the same handle see every
    /// calibration this decoder applies.
    pub fn with_calibration(calibration: Arc<CalibrationHandle>) -> Self {
        Self {
            calibration,
            device_info: None,
            stats: DecoderStats::default(),
        }
    }

    pub fn calibration(&self) -> &Arc<CalibrationHandle> {
        &self.calibration
    }

    /// Device information from the most recent DIFOP packet.
    pub fn device_info(&self) -> Option<&DeviceInfo> {
        self.device_info.as_ref()
    }

    pub fn stats(&self) -> DecoderStats {
        self.stats
    }

    /// Process one received datagram.
    pub fn process<'a>(&mut self, data: &'a [u8]) -> Result<Output<'a>, Error> {
        let result = match classify(data) {
            Ok(PacketKind::Msop) => self.process_msop(data),
            Ok(PacketKind::Difop) => self.process_difop(data).map(Output::Calibration),
            Err(err) => Err(err),
        };

        if let Err(err) = &result {
            self.stats.rejected += 1;
            trace!("rejected packet: {}", err);
        }
        result
    }

    /// Apply a DIFOP packet, returning the calibration version in force.
    ///
    /// A table identical to the current one keeps the current version.
    pub fn process_difop(&mut self, data: &[u8]) -> Result<u64, Error> {
        let packet = DifopPacket::new(data)?;
        if !packet.has_sync() {
            return Err(Error::InvalidPacket("invalid DIFOP sync bytes".to_string()));
        }
        self.stats.difop += 1;

        let info = packet.device_info();
        if self.device_info.as_ref() != Some(&info) {
            debug!(
                "device serial={} top={} bottom={} rpm={} return_mode={:?}",
                info.serial_string(),
                info.top_firmware,
                info.bottom_firmware,
                info.motor_speed,
                info.return_mode
            );
            self.device_info = Some(info);
        }

        let table = CalibrationTable::from_difop(&packet);
        let version = match self.calibration.apply(table) {
            Update::Unchanged(version) => return Ok(version),
            Update::Replaced(version) => version,
        };

        if table.is_absent() {
            warn!("device reports no vertical angle calibration, using factory angles");
        }
        debug!(
            "calibration v{}: resolution {:?}, vertical angles {}",
            version,
            table.range_resolution,
            if table.is_absent() { "factory" } else { "device" }
        );
        Ok(version)
    }

    /// Wrap an MSOP packet into a [`Scan`] with the calibration in force.
    pub fn process_msop<'a>(&mut self, data: &'a [u8]) -> Result<Output<'a>, Error> {
        let packet = MsopPacket::new(data)?;
        if !packet.has_sync() {
            return Err(Error::InvalidPacket("invalid MSOP sync bytes".to_string()));
        }
        self.stats.msop += 1;

        if !packet.is_valid() {
            self.stats.invalid += 1;
            debug!("dropping MSOP packet with block 0 azimuth {}", packet.azimuth(0));
            return Ok(Output::Invalid);
        }

        Ok(Output::Scan(Scan {
            header: packet.header(),
            calibration: self.calibration.load(),
            samples: packet.samples(),
        }))
    }
}
