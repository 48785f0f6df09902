// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! Integration tests for RS-LiDAR-16 decoding using synthetic packets.

use std::f64::consts::TAU;

use edgefirst_rslidar::{
    RobosenseDecoder,
    calibration::{RangeResolution, decode_calibration},
    decode::{Sample, decode},
    difop::{DIFOP_PACKET_SIZE, DIFOP_SYNC, TOP_FIRMWARE_OFFSET, VERTICAL_ANGLES_OFFSET},
    driver::Output,
    filter::ValidSamples,
    lidar::{BLOCK_COUNT, LASER_COUNT, SAMPLES_PER_PACKET, SUBBLOCK_COUNT},
    msop::{BLOCK_FLAG, BLOCK_SIZE, LASER_RETURN_SIZE, MSOP_HEADER_SIZE, MSOP_PACKET_SIZE, MSOP_SYNC},
};

const EPS: f64 = 1e-9;

/// MSOP packet with the given block azimuths and every return set to
/// `range`.
fn msop_packet(azimuths: [u16; BLOCK_COUNT], range: u16) -> Vec<u8> {
    let mut data = vec![0u8; MSOP_PACKET_SIZE];
    data[..MSOP_SYNC.len()].copy_from_slice(&MSOP_SYNC);
    for (block, azimuth) in azimuths.iter().enumerate() {
        let start = MSOP_HEADER_SIZE + block * BLOCK_SIZE;
        data[start..start + 2].copy_from_slice(&BLOCK_FLAG);
        data[start + 2..start + 4].copy_from_slice(&azimuth.to_le_bytes());
        for i in 0..SUBBLOCK_COUNT * LASER_COUNT {
            let r = start + 4 + i * LASER_RETURN_SIZE;
            data[r..r + 2].copy_from_slice(&range.to_le_bytes());
            data[r + 2] = (i % 256) as u8;
        }
    }
    data
}

fn stepped(start: u16, step: u16) -> [u16; BLOCK_COUNT] {
    std::array::from_fn(|i| ((u32::from(start) + i as u32 * u32::from(step)) % 36000) as u16)
}

fn set_range(data: &mut [u8], block: usize, subblock: usize, laser: usize, range: u16) {
    let r = MSOP_HEADER_SIZE
        + block * BLOCK_SIZE
        + 4
        + (subblock * LASER_COUNT + laser) * LASER_RETURN_SIZE;
    data[r..r + 2].copy_from_slice(&range.to_le_bytes());
}

fn difop_packet(firmware: [u8; 5], angles: Option<[i32; LASER_COUNT]>) -> Vec<u8> {
    let mut data = vec![0u8; DIFOP_PACKET_SIZE];
    data[..DIFOP_SYNC.len()].copy_from_slice(&DIFOP_SYNC);
    data[TOP_FIRMWARE_OFFSET..TOP_FIRMWARE_OFFSET + 5].copy_from_slice(&firmware);
    if let Some(angles) = angles {
        for (laser, angle) in angles.iter().enumerate() {
            let e = VERTICAL_ANGLES_OFFSET + laser * 3;
            data[e] = if *angle < 0 { 0x01 } else { 0x00 };
            data[e + 1..e + 3].copy_from_slice(&(angle.unsigned_abs() as u16).to_be_bytes());
        }
    }
    data
}

fn angle_diff(a: f64, b: f64) -> f64 {
    let d = (a - b).rem_euclid(TAU);
    d.min(TAU - d)
}

#[test]
fn test_full_packet_order_and_count() {
    let packet = msop_packet(stepped(12000, 20), 1000);
    let decoded = decode(&packet).unwrap();
    assert!(decoded.valid);

    let samples: Vec<Sample> = decoded.samples.collect();
    assert_eq!(samples.len(), BLOCK_COUNT * SUBBLOCK_COUNT * LASER_COUNT);

    let keys: Vec<(usize, usize, usize)> =
        samples.iter().map(|s| (s.block, s.subblock, s.id)).collect();
    assert!(keys.windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn test_deterministic_replay() {
    let packet = msop_packet(stepped(35500, 45), 777);
    let first: Vec<Sample> = decode(&packet).unwrap().samples.collect();
    let second: Vec<Sample> = decode(&packet).unwrap().samples.collect();
    assert_eq!(first.len(), SAMPLES_PER_PACKET);
    for (a, b) in first.iter().zip(&second) {
        assert_eq!(a.azimuth.to_bits(), b.azimuth.to_bits());
        assert_eq!(a.delay.to_bits(), b.delay.to_bits());
        assert_eq!((a.id, a.range, a.reflectivity), (b.id, b.range, b.reflectivity));
    }
}

#[test]
fn test_subblock_midpoint() {
    let mut azimuths = stepped(1000, 1000);
    azimuths[1] = 2000;
    let packet = msop_packet(azimuths, 1000);
    let samples: Vec<Sample> = decode(&packet).unwrap().samples.collect();

    let first = samples[0];
    assert!((first.azimuth - 10f64.to_radians()).abs() < EPS);
    let middle = samples[LASER_COUNT];
    assert_eq!((middle.block, middle.subblock, middle.id), (0, 1, 0));
    assert!((middle.azimuth - 15f64.to_radians()).abs() < EPS);
}

#[test]
fn test_wraparound_through_zero() {
    let mut azimuths = stepped(100, 200);
    azimuths[0] = 35900;
    azimuths[1] = 100;
    let packet = msop_packet(azimuths, 1000);
    let samples: Vec<Sample> = decode(&packet).unwrap().samples.collect();

    // Delta is 2°: the midpoint lands on 0°, and every laser of block 0
    // stays within 2° of 359°..1°
    let middle = samples[LASER_COUNT];
    assert!(angle_diff(middle.azimuth, 0.0) < EPS);
    for s in &samples[..2 * LASER_COUNT] {
        assert!(angle_diff(s.azimuth, 0.0) < 1.5f64.to_radians(), "{}", s.azimuth);
    }
    for s in &samples {
        assert!((0.0..TAU).contains(&s.azimuth));
    }
}

#[test]
fn test_invalid_packet_sentinel() {
    let mut azimuths = stepped(0, 20);
    azimuths[0] = 0xffff;
    let packet = msop_packet(azimuths, 1000);
    let decoded = decode(&packet).unwrap();
    assert!(!decoded.valid);
    assert_eq!(decoded.samples.count(), 0);

    azimuths[0] = 36001;
    assert!(!decode(&msop_packet(azimuths, 1000)).unwrap().valid);

    // Documented assumption: the threshold is inclusive
    azimuths[0] = 36000;
    let packet = msop_packet(azimuths, 1000);
    let decoded = decode(&packet).unwrap();
    assert!(decoded.valid);
    assert_eq!(decoded.samples.count(), SAMPLES_PER_PACKET);
}

#[test]
fn test_invalid_samples_kept_in_sequence() {
    let mut packet = msop_packet(stepped(0, 20), 1000);
    set_range(&mut packet, 0, 0, 0, 2);
    set_range(&mut packet, 4, 1, 7, 20000);
    set_range(&mut packet, 11, 1, 15, 0);

    let decoded = decode(&packet).unwrap();
    assert!(decoded.valid);
    let samples: Vec<Sample> = decoded.samples.clone().collect();
    assert_eq!(samples.len(), SAMPLES_PER_PACKET);
    assert_eq!(samples.iter().filter(|s| !s.is_valid()).count(), 3);
    assert!(!samples[0].is_valid());
    assert!(!samples[SAMPLES_PER_PACKET - 1].is_valid());

    assert_eq!(decoded.samples.valid_only().count(), SAMPLES_PER_PACKET - 3);
}

#[test]
fn test_calibration_resolution_truth_table() {
    for triple in [[0x00, 0x00, 0x00], [0xff, 0xff, 0xff], [0x55, 0xaa, 0x5a]] {
        let packet = difop_packet([0x01, triple[0], triple[1], triple[2], 0x01], None);
        let table = decode_calibration(&packet).unwrap();
        assert_eq!(table.range_resolution, RangeResolution::Coarse, "{:02x?}", triple);
        assert!(table.is_absent());
    }

    let packet = difop_packet([0x01, 0x01, 0x02, 0x03, 0x01], None);
    assert_eq!(
        decode_calibration(&packet).unwrap().range_resolution,
        RangeResolution::Fine
    );
}

#[test]
fn test_session_applies_calibration() {
    let mut angles = [0i32; LASER_COUNT];
    for (laser, angle) in angles.iter_mut().enumerate() {
        *angle = if laser < 8 { -1490 + laser as i32 * 200 } else { 1510 - (laser as i32 - 8) * 200 };
    }
    let difop = difop_packet([0x00, 0x01, 0x02, 0x03, 0x00], Some(angles));
    let msop = msop_packet(stepped(0, 20), 400);

    let mut decoder = RobosenseDecoder::new();
    assert!(matches!(decoder.process(&difop).unwrap(), Output::Calibration(1)));

    let scan = match decoder.process(&msop).unwrap() {
        Output::Scan(scan) => scan,
        other => panic!("expected scan, got {:?}", other),
    };
    let table = scan.calibration.table;
    assert!(!table.is_absent());
    assert!((table.vertical_angle(0) + 14.9f64.to_radians()).abs() < 1e-12);
    assert!((table.vertical_angle(8) - 15.1f64.to_radians()).abs() < 1e-12);

    for sample in scan.samples.valid_only() {
        assert!((table.distance(sample.range) - 2.0).abs() < EPS);
    }

    let stats = decoder.stats();
    assert_eq!((stats.msop, stats.difop, stats.invalid, stats.rejected), (1, 1, 0, 0));
}
