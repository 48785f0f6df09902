// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! DIFOP (Device Information Output Protocol) packet layout.
//!
//! # Packet Structure
//!
//! 1248 bytes, port 7788, sent about once per second:
//! - Sync: 8 bytes
//! - Motor speed, network configuration, FOV, firmware versions
//! - Intensity curve coefficients (unused here)
//! - Serial number, return mode, UTC time, status and diagnostics
//! - Corrected vertical angles: 16 lasers × 3 bytes
//! - Tail: 2 bytes
//!
//! Two fields carry sentinel byte patterns rather than plain values: the
//! vertical angle table is all `0x00`/`0xff` on units shipped without
//! per-unit calibration, and the top board firmware version selects the
//! range resolution.

use std::{fmt, net::Ipv4Addr};

use crate::{
    calibration::RangeResolution,
    lidar::{Error, LASER_COUNT},
};

/// DIFOP packet sync bytes
pub const DIFOP_SYNC: [u8; 8] = [0xa5, 0xff, 0x00, 0x5a, 0x11, 0x11, 0x55, 0x55];

/// DIFOP packet size
pub const DIFOP_PACKET_SIZE: usize = 1248;

pub const MOTOR_SPEED_OFFSET: usize = 8;
pub const LIDAR_IP_OFFSET: usize = 10;
pub const DEST_IP_OFFSET: usize = 14;
pub const MAC_OFFSET: usize = 18;
pub const MSOP_PORT_OFFSET: usize = 24;
pub const DIFOP_PORT_OFFSET: usize = 28;
pub const FOV_OFFSET: usize = 32;
pub const TOP_FIRMWARE_OFFSET: usize = 40;
pub const BOTTOM_FIRMWARE_OFFSET: usize = 45;
pub const SERIAL_NUMBER_OFFSET: usize = 292;
pub const RETURN_MODE_OFFSET: usize = 300;
pub const VERTICAL_ANGLES_OFFSET: usize = 1164;

/// Size of a firmware version field
pub const FIRMWARE_VERSION_SIZE: usize = 5;

/// Size of one corrected vertical angle entry (sign + u16)
pub const VERTICAL_ANGLE_ENTRY_SIZE: usize = 3;

/// Size of the corrected vertical angle table
pub const VERTICAL_ANGLES_SIZE: usize = LASER_COUNT * VERTICAL_ANGLE_ENTRY_SIZE;

const _: () = assert!(VERTICAL_ANGLES_OFFSET + VERTICAL_ANGLES_SIZE + 36 == DIFOP_PACKET_SIZE);

/// Echo mode the sensor is configured for.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ReturnMode {
    Dual,
    #[default]
    Strongest,
    Last,
    Unknown(u8),
}

impl From<u8> for ReturnMode {
    fn from(value: u8) -> Self {
        match value {
            0x00 => ReturnMode::Dual,
            0x01 => ReturnMode::Strongest,
            0x02 => ReturnMode::Last,
            other => ReturnMode::Unknown(other),
        }
    }
}

/// Five-byte board firmware version.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FirmwareVersion {
    bytes: [u8; FIRMWARE_VERSION_SIZE],
}

impl FirmwareVersion {
    pub fn new(bytes: [u8; FIRMWARE_VERSION_SIZE]) -> Self {
        Self { bytes }
    }

    pub fn bytes(&self) -> [u8; FIRMWARE_VERSION_SIZE] {
        self.bytes
    }

    /// Range resolution implied by this (top board) firmware version.
    ///
    /// Bytes 1..=3 equal to one of the legacy patterns mean the older
    /// firmware generation with 1cm range units; anything else reports
    /// 5mm units.
    pub fn range_resolution(&self) -> RangeResolution {
        match [self.bytes[1], self.bytes[2], self.bytes[3]] {
            [0x00, 0x00, 0x00] | [0xff, 0xff, 0xff] | [0x55, 0xaa, 0x5a] => RangeResolution::Coarse,
            _ => RangeResolution::Fine,
        }
    }
}

impl fmt::Display for FirmwareVersion {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let b = &self.bytes;
        write!(
            f,
            "{:02X}.{:02X}.{:02X}.{:02X}.{:02X}",
            b[0], b[1], b[2], b[3], b[4]
        )
    }
}

/// Borrowed view over the corrected vertical angle table.
#[derive(Clone, Copy, Debug)]
pub struct CorrectedVerticalAngles<'a> {
    raw: &'a [u8],
}

impl<'a> CorrectedVerticalAngles<'a> {
    pub fn new(raw: &'a [u8; VERTICAL_ANGLES_SIZE]) -> Self {
        Self { raw }
    }

    /// True when the table holds no per-unit calibration.
    ///
    /// Only the first four bytes are inspected; each must be `0x00` or
    /// `0xff` for the table to count as empty.
    pub fn is_empty(&self) -> bool {
        self.raw[..4].iter().all(|&b| matches!(b, 0x00 | 0xff))
    }

    /// Signed vertical angle of `laser` in 0.01°.
    pub fn hundredths(&self, laser: usize) -> i32 {
        let e = &self.raw[laser * VERTICAL_ANGLE_ENTRY_SIZE..(laser + 1) * VERTICAL_ANGLE_ENTRY_SIZE];
        let magnitude = i32::from(u16::from_be_bytes([e[1], e[2]]));
        match e[0] {
            0x00 => magnitude,
            _ => -magnitude,
        }
    }

    /// Vertical angle of `laser` in radians.
    pub fn radians(&self, laser: usize) -> f64 {
        (f64::from(self.hundredths(laser)) / 100.0).to_radians()
    }

    /// All vertical angles in radians, indexed by laser id.
    pub fn to_radians(&self) -> [f64; LASER_COUNT] {
        std::array::from_fn(|laser| self.radians(laser))
    }
}

/// Device information from DIFOP packets
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DeviceInfo {
    /// Device serial number
    pub serial_number: [u8; 6],
    /// Top board firmware version
    pub top_firmware: FirmwareVersion,
    /// Bottom board firmware version
    pub bottom_firmware: FirmwareVersion,
    /// Motor speed in RPM
    pub motor_speed: u16,
    /// Sensor IP address
    pub lidar_ip: [u8; 4],
    /// Destination IP address
    pub dest_ip: [u8; 4],
    /// Sensor MAC address
    pub mac: [u8; 6],
    /// MSOP destination port
    pub msop_port: u16,
    /// DIFOP destination port
    pub difop_port: u16,
    /// Horizontal FOV start and end, 0.01°
    pub fov: (u16, u16),
    /// Configured echo mode
    pub return_mode: ReturnMode,
}

impl DeviceInfo {
    /// Get serial number as a hex string
    pub fn serial_string(&self) -> String {
        self.serial_number
            .iter()
            .map(|b| format!("{:02X}", b))
            .collect()
    }

    /// Get MAC address as colon separated hex
    pub fn mac_string(&self) -> String {
        self.mac
            .iter()
            .map(|b| format!("{:02x}", b))
            .collect::<Vec<_>>()
            .join(":")
    }

    pub fn lidar_addr(&self) -> Ipv4Addr {
        Ipv4Addr::from(self.lidar_ip)
    }

    pub fn dest_addr(&self) -> Ipv4Addr {
        Ipv4Addr::from(self.dest_ip)
    }
}

/// Borrowed view over a 1248-byte DIFOP packet.
#[derive(Clone, Copy, Debug)]
pub struct DifopPacket<'a> {
    data: &'a [u8; DIFOP_PACKET_SIZE],
}

impl<'a> DifopPacket<'a> {
    /// Wrap a received datagram; the length must be exactly
    /// [`DIFOP_PACKET_SIZE`].
    pub fn new(data: &'a [u8]) -> Result<Self, Error> {
        let data = <&[u8; DIFOP_PACKET_SIZE]>::try_from(data).map_err(|_| Error::PacketSize {
            expected: DIFOP_PACKET_SIZE,
            actual: data.len(),
        })?;
        Ok(Self { data })
    }

    pub fn as_bytes(&self) -> &'a [u8] {
        self.data
    }

    /// True when the packet starts with [`DIFOP_SYNC`].
    pub fn has_sync(&self) -> bool {
        self.data[..DIFOP_SYNC.len()] == DIFOP_SYNC
    }

    #[inline]
    fn array<const N: usize>(&self, offset: usize) -> [u8; N] {
        let mut out = [0u8; N];
        out.copy_from_slice(&self.data[offset..offset + N]);
        out
    }

    #[inline]
    fn u16_be(&self, offset: usize) -> u16 {
        u16::from_be_bytes(self.array(offset))
    }

    pub fn motor_speed(&self) -> u16 {
        self.u16_be(MOTOR_SPEED_OFFSET)
    }

    pub fn top_board_firmware(&self) -> FirmwareVersion {
        FirmwareVersion::new(self.array(TOP_FIRMWARE_OFFSET))
    }

    pub fn bottom_board_firmware(&self) -> FirmwareVersion {
        FirmwareVersion::new(self.array(BOTTOM_FIRMWARE_OFFSET))
    }

    /// Range resolution selected by the top board firmware.
    pub fn range_resolution(&self) -> RangeResolution {
        self.top_board_firmware().range_resolution()
    }

    pub fn corrected_vertical_angles(&self) -> CorrectedVerticalAngles<'a> {
        let data: &'a [u8; DIFOP_PACKET_SIZE] = self.data;
        CorrectedVerticalAngles {
            raw: &data[VERTICAL_ANGLES_OFFSET..VERTICAL_ANGLES_OFFSET + VERTICAL_ANGLES_SIZE],
        }
    }

    /// Parse the device information fields.
    pub fn device_info(&self) -> DeviceInfo {
        DeviceInfo {
            serial_number: self.array(SERIAL_NUMBER_OFFSET),
            top_firmware: self.top_board_firmware(),
            bottom_firmware: self.bottom_board_firmware(),
            motor_speed: self.motor_speed(),
            lidar_ip: self.array(LIDAR_IP_OFFSET),
            dest_ip: self.array(DEST_IP_OFFSET),
            mac: self.array(MAC_OFFSET),
            msop_port: self.u16_be(MSOP_PORT_OFFSET),
            difop_port: self.u16_be(DIFOP_PORT_OFFSET),
            fov: (self.u16_be(FOV_OFFSET), self.u16_be(FOV_OFFSET + 2)),
            return_mode: ReturnMode::from(self.data[RETURN_MODE_OFFSET]),
        }
    }
}
