// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

use std::path::PathBuf;

use clap::Parser;
use log::LevelFilter;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// PCAP or PCAPNG capture of an RS-LiDAR-16 session.
    #[arg(env)]
    pub target: PathBuf,

    /// UDP port of the MSOP data stream
    #[arg(long, env, default_value = "6699")]
    pub msop_port: u16,

    /// UDP port of the DIFOP device information stream
    #[arg(long, env, default_value = "7788")]
    pub difop_port: u16,

    /// Smallest raw range (exclusive) counted as a valid sample
    #[arg(long, env, default_value = "2")]
    pub min_range: u16,

    /// Largest raw range (exclusive) counted as a valid sample
    #[arg(long, env, default_value = "20000")]
    pub max_range: u16,

    /// Application log level
    #[arg(long, env, default_value = "info")]
    pub rust_log: LevelFilter,
}
