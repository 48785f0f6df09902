// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! Synthetic packet builders for unit tests.

use crate::{
    difop::{
        DIFOP_PACKET_SIZE, DIFOP_SYNC, SERIAL_NUMBER_OFFSET, TOP_FIRMWARE_OFFSET,
        VERTICAL_ANGLES_OFFSET, VERTICAL_ANGLE_ENTRY_SIZE,
    },
    lidar::{BLOCK_COUNT, LASER_COUNT},
    msop::{BLOCK_FLAG, BLOCK_SIZE, LASER_RETURN_SIZE, MSOP_HEADER_SIZE, MSOP_PACKET_SIZE, MSOP_SYNC},
};

pub struct MsopBuilder {
    data: Vec<u8>,
}

impl MsopBuilder {
    pub fn new() -> Self {
        let mut data = vec![0u8; MSOP_PACKET_SIZE];
        data[..MSOP_SYNC.len()].copy_from_slice(&MSOP_SYNC);
        for block in 0..BLOCK_COUNT {
            let start = MSOP_HEADER_SIZE + block * BLOCK_SIZE;
            data[start..start + 2].copy_from_slice(&BLOCK_FLAG);
        }
        Self { data }
    }

    pub fn azimuth(mut self, block: usize, raw: u16) -> Self {
        let start = MSOP_HEADER_SIZE + block * BLOCK_SIZE + 2;
        self.data[start..start + 2].copy_from_slice(&raw.to_le_bytes());
        self
    }

    /// Block azimuths `start`, `start + step`, ... wrapped at 36000 ticks.
    pub fn azimuths(mut self, start: u16, step: u16) -> Self {
        for block in 0..BLOCK_COUNT {
            let raw = (u32::from(start) + block as u32 * u32::from(step)) % 36000;
            self = self.azimuth(block, raw as u16);
        }
        self
    }

    pub fn laser(
        mut self,
        block: usize,
        subblock: usize,
        laser: usize,
        range: u16,
        reflectivity: u8,
    ) -> Self {
        let start = MSOP_HEADER_SIZE
            + block * BLOCK_SIZE
            + 4
            + (subblock * LASER_COUNT + laser) * LASER_RETURN_SIZE;
        self.data[start..start + 2].copy_from_slice(&range.to_le_bytes());
        self.data[start + 2] = reflectivity;
        self
    }

    pub fn timestamp(mut self, bytes: [u8; 10]) -> Self {
        self.data[20..30].copy_from_slice(&bytes);
        self
    }

    pub fn lidar_model(mut self, model: u8) -> Self {
        self.data[30] = model;
        self
    }

    pub fn build(self) -> Vec<u8> {
        self.data
    }
}

pub struct DifopBuilder {
    data: Vec<u8>,
}

impl DifopBuilder {
    pub fn new() -> Self {
        let mut data = vec![0u8; DIFOP_PACKET_SIZE];
        data[..DIFOP_SYNC.len()].copy_from_slice(&DIFOP_SYNC);
        Self { data }
    }

    pub fn bytes(mut self, offset: usize, bytes: &[u8]) -> Self {
        self.data[offset..offset + bytes.len()].copy_from_slice(bytes);
        self
    }

    pub fn top_firmware(self, version: [u8; 5]) -> Self {
        self.bytes(TOP_FIRMWARE_OFFSET, &version)
    }

    pub fn serial_number(self, serial: [u8; 6]) -> Self {
        self.bytes(SERIAL_NUMBER_OFFSET, &serial)
    }

    /// Vertical angle of `laser` in 0.01° (negative values set the sign byte).
    pub fn vertical_angle(self, laser: usize, hundredths: i32) -> Self {
        let sign = if hundredths < 0 { 0x01 } else { 0x00 };
        let magnitude = hundredths.unsigned_abs() as u16;
        let [hi, lo] = magnitude.to_be_bytes();
        self.bytes(
            VERTICAL_ANGLES_OFFSET + laser * VERTICAL_ANGLE_ENTRY_SIZE,
            &[sign, hi, lo],
        )
    }

    pub fn build(self) -> Vec<u8> {
        self.data
    }
}
