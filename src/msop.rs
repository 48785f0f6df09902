// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! MSOP (Main data Stream Output Protocol) packet layout.
//!
//! # Packet Structure
//!
//! 1248 bytes, port 6699:
//! - Header: 42 bytes (sync, UTC timestamp, lidar model)
//! - Data: 12 blocks × 100 bytes = 1200 bytes
//!   - Flag: 2 bytes (`0xff 0xee`)
//!   - Azimuth: 2 bytes, little-endian, 0.01° ticks
//!   - 2 subblocks × 16 lasers × 3 bytes (range u16 LE, reflectivity u8)
//! - Tail: 6 bytes
//!
//! [`MsopPacket`] is a borrowed view over one received datagram. It never
//! copies the buffer; every accessor reads straight from the caller's
//! bytes.

use chrono::{DateTime, NaiveDate, Utc};

use crate::{
    filter::packet_azimuth_valid,
    lidar::{BLOCK_COUNT, Error, LASER_COUNT, SUBBLOCK_COUNT},
};

/// MSOP packet sync bytes
pub const MSOP_SYNC: [u8; 8] = [0x55, 0xaa, 0x05, 0x0a, 0x5a, 0xa5, 0x50, 0xa0];

/// MSOP packet total size in bytes
pub const MSOP_PACKET_SIZE: usize = 1248;

/// MSOP header size in bytes
pub const MSOP_HEADER_SIZE: usize = 42;

/// MSOP tail size in bytes
pub const MSOP_TAIL_SIZE: usize = 6;

/// Size of each data block in bytes
pub const BLOCK_SIZE: usize = 100;

/// Flag at the start of every data block
pub const BLOCK_FLAG: [u8; 2] = [0xff, 0xee];

/// Size of a single laser return in bytes
pub const LASER_RETURN_SIZE: usize = 3;

/// Offset of the first laser return within a block (after flag + azimuth)
const BLOCK_RETURNS_OFFSET: usize = 4;

/// Offset of the UTC timestamp within the header
const TIMESTAMP_OFFSET: usize = 20;

/// Offset of the lidar model byte within the header
const LIDAR_MODEL_OFFSET: usize = 30;

const _: () = assert!(
    MSOP_HEADER_SIZE + BLOCK_COUNT * BLOCK_SIZE + MSOP_TAIL_SIZE == MSOP_PACKET_SIZE
);
const _: () = assert!(
    BLOCK_RETURNS_OFFSET + SUBBLOCK_COUNT * LASER_COUNT * LASER_RETURN_SIZE == BLOCK_SIZE
);

/// Raw range and reflectivity of one laser firing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LaserReturn {
    /// Range in sensor units (scaled by the DIFOP range resolution)
    pub range: u16,
    /// Raw reflectivity
    pub reflectivity: u8,
}

/// UTC time stamped by the sensor into the MSOP header.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct UtcTime {
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
    pub millisecond: u16,
    pub microsecond: u16,
}

impl UtcTime {
    fn from_bytes(b: &[u8]) -> Self {
        Self {
            year: 2000 + u16::from(b[0]),
            month: b[1],
            day: b[2],
            hour: b[3],
            minute: b[4],
            second: b[5],
            millisecond: u16::from_be_bytes([b[6], b[7]]),
            microsecond: u16::from_be_bytes([b[8], b[9]]),
        }
    }

    /// Nanoseconds since the Unix epoch.
    ///
    /// Returns `None` when the sensor has not filled a plausible date, which
    /// is the case before its clock is set.
    pub fn unix_nanos(&self) -> Option<u64> {
        if self.millisecond > 999 || self.microsecond > 999 {
            return None;
        }

        let micros = u32::from(self.millisecond) * 1_000 + u32::from(self.microsecond);
        let time = NaiveDate::from_ymd_opt(
            i32::from(self.year),
            u32::from(self.month),
            u32::from(self.day),
        )?
        .and_hms_micro_opt(
            u32::from(self.hour),
            u32::from(self.minute),
            u32::from(self.second),
            micros,
        )?;

        u64::try_from(time.and_utc().timestamp_nanos_opt()?).ok()
    }

    /// Sensor time as a UTC date-time.
    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        let nanos = i64::try_from(self.unix_nanos()?).ok()?;
        Some(DateTime::from_timestamp_nanos(nanos))
    }
}

/// Parsed MSOP header information
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MsopHeader {
    /// Sensor timestamp of the packet
    pub timestamp: UtcTime,
    /// Lidar model identifier
    pub lidar_model: u8,
}

/// Borrowed view over a 1248-byte MSOP packet.
#[derive(Clone, Copy, Debug)]
pub struct MsopPacket<'a> {
    data: &'a [u8; MSOP_PACKET_SIZE],
}

impl<'a> MsopPacket<'a> {
    /// Wrap a received datagram.
    ///
    /// Fails with [`Error::PacketSize`] unless the buffer is exactly
    /// [`MSOP_PACKET_SIZE`] bytes. Sync bytes are not checked here, see
    /// [`MsopPacket::has_sync`].
    pub fn new(data: &'a [u8]) -> Result<Self, Error> {
        let data = <&[u8; MSOP_PACKET_SIZE]>::try_from(data).map_err(|_| Error::PacketSize {
            expected: MSOP_PACKET_SIZE,
            actual: data.len(),
        })?;
        Ok(Self { data })
    }

    /// The underlying packet bytes.
    pub fn as_bytes(&self) -> &'a [u8] {
        self.data
    }

    /// True when the header starts with [`MSOP_SYNC`].
    pub fn has_sync(&self) -> bool {
        self.data[..MSOP_SYNC.len()] == MSOP_SYNC
    }

    /// Packet-level validity, judged on the block 0 azimuth.
    ///
    /// Invalid packets must be dropped, not iterated.
    pub fn is_valid(&self) -> bool {
        packet_azimuth_valid(self.azimuth(0))
    }

    /// Parse the packet header.
    pub fn header(&self) -> MsopHeader {
        MsopHeader {
            timestamp: UtcTime::from_bytes(&self.data[TIMESTAMP_OFFSET..TIMESTAMP_OFFSET + 10]),
            lidar_model: self.data[LIDAR_MODEL_OFFSET],
        }
    }

    #[inline]
    fn block(&self, block: usize) -> &'a [u8] {
        assert!(block < BLOCK_COUNT, "block {} out of range", block);
        let data: &'a [u8; MSOP_PACKET_SIZE] = self.data;
        let start = MSOP_HEADER_SIZE + block * BLOCK_SIZE;
        &data[start..start + BLOCK_SIZE]
    }

    /// Flag bytes of `block`, [`BLOCK_FLAG`] on a well-formed packet.
    pub fn block_flag(&self, block: usize) -> [u8; 2] {
        let b = self.block(block);
        [b[0], b[1]]
    }

    /// Raw azimuth of `block` in 0.01° encoder ticks.
    #[inline]
    pub fn azimuth(&self, block: usize) -> u16 {
        let b = self.block(block);
        u16::from_le_bytes([b[2], b[3]])
    }

    /// Raw return of `laser` in `subblock` of `block`.
    ///
    /// # Panics
    ///
    /// Panics if any index is outside the packet layout.
    #[inline]
    pub fn laser_return(&self, block: usize, subblock: usize, laser: usize) -> LaserReturn {
        assert!(subblock < SUBBLOCK_COUNT, "subblock {} out of range", subblock);
        assert!(laser < LASER_COUNT, "laser {} out of range", laser);
        let offset = BLOCK_RETURNS_OFFSET + (subblock * LASER_COUNT + laser) * LASER_RETURN_SIZE;
        let r = &self.block(block)[offset..offset + LASER_RETURN_SIZE];
        LaserReturn {
            range: u16::from_le_bytes([r[0], r[1]]),
            reflectivity: r[2],
        }
    }
}
