// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

mod args;

use args::Args;
use clap::Parser as _;
use edgefirst_rslidar::{
    PcapSource,
    driver::{Output, RobosenseDecoder},
    filter::{RangeGate, ValidSamples as _},
};
use log::{debug, error, info, warn};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    env_logger::Builder::new()
        .filter_level(args.rust_log)
        .parse_default_env()
        .init();

    if args.min_range >= args.max_range {
        error!(
            "empty range window: min {} >= max {}",
            args.min_range, args.max_range
        );
        return Err("invalid range window".into());
    }
    let gate = RangeGate::new(args.min_range, args.max_range);

    let source = PcapSource::from_file(&args.target, &[args.msop_port, args.difop_port])?;
    info!(
        "replaying {} packets from {}",
        source.len(),
        args.target.display()
    );

    let mut decoder = RobosenseDecoder::new();
    let mut samples = 0usize;
    let mut valid = 0usize;
    let mut farthest = 0.0f64;

    for payload in source.iter() {
        match decoder.process(payload) {
            Ok(Output::Scan(scan)) => {
                let table = scan.calibration.table;
                samples += scan.samples.len();
                let mut n = 0;
                for sample in scan.samples.with_gate(gate) {
                    farthest = farthest.max(table.distance(sample.range));
                    n += 1;
                }
                valid += n;
                debug!(
                    "scan t={:?} calibration v{} valid={}",
                    scan.header.timestamp.unix_nanos(),
                    scan.calibration.version,
                    n
                );
            }
            Ok(Output::Calibration(version)) => debug!("calibration v{} in force", version),
            Ok(Output::Invalid) => {}
            Err(err) => warn!("skipping packet: {}", err),
        }
    }

    if let Some(info) = decoder.device_info() {
        info!(
            "device {} ({}) firmware {}/{} at {} rpm",
            info.serial_string(),
            info.lidar_addr(),
            info.top_firmware,
            info.bottom_firmware,
            info.motor_speed
        );
    } else {
        warn!("no DIFOP packet in capture, decoded with factory calibration");
    }

    let stats = decoder.stats();
    info!(
        "msop={} difop={} invalid={} rejected={} calibration=v{}",
        stats.msop,
        stats.difop,
        stats.invalid,
        stats.rejected,
        decoder.calibration().version()
    );
    info!(
        "samples={} valid={} farthest={:.2}m",
        samples, valid, farthest
    );

    Ok(())
}
