// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! EdgeFirst RoboSense RS-LiDAR-16 Decoder Library
//!
//! Zero-copy decoding of the two UDP streams of the RS-LiDAR-16: MSOP data
//! packets carrying range returns, and DIFOP device information packets
//! carrying calibration.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐     ┌────────────────────┐     ┌──────────────────┐
//! │  UDP / pcap     │ ──► │  RobosenseDecoder  │ ──► │  Scan            │
//! │  (caller owned) │     │  classify + stats  │     │  Samples<'a>     │
//! └─────────────────┘     └────────────────────┘     └──────────────────┘
//!                                   │ DIFOP                   ▲
//!                                   ▼                         │ snapshot
//!                         ┌──────────────────────────────────────┐
//!                         │  CalibrationHandle (ArcSwap)         │
//!                         └──────────────────────────────────────┘
//! ```
//!
//! Packet buffers are always owned by the caller. [`msop::MsopPacket`] and
//! [`difop::DifopPacket`] are borrowed views, and [`decode::Samples`]
//! lazily yields one [`decode::Sample`] per laser firing without
//! allocating.
//!
//! # Modules
//!
//! - [`msop`]: MSOP packet layout
//! - [`decode`]: Per-laser azimuth interpolation and sample iteration
//! - [`difop`]: DIFOP packet layout and device information
//! - [`calibration`]: Calibration tables and the shared handle
//! - [`filter`]: Packet and sample validity checks
//! - [`driver`]: Decoding session over both streams
//! - [`lidar`]: Sensor constants and error type
//! - `pcap_source`: Capture replay (feature `pcap`)
//!
//! # Example
//!
//! ```ignore
//! use edgefirst_rslidar::{decode::decode, filter::ValidSamples};
//!
//! let decoded = decode(&buf[..len])?;
//! for sample in decoded.samples.valid_only() {
//!     println!("laser {} az {:.4} range {}", sample.id, sample.azimuth, sample.range);
//! }
//! ```

pub mod calibration;
pub mod decode;
pub mod difop;
pub mod driver;
pub mod filter;
pub mod lidar;
pub mod msop;
#[cfg(feature = "pcap")]
pub mod pcap_source;

#[cfg(test)]
pub(crate) mod testutil;

// Re-exports for convenience
pub use calibration::{Calibration, CalibrationHandle, CalibrationTable, RangeResolution, Update};
pub use decode::{Decoded, Sample, Samples, decode};
pub use driver::{Output, RobosenseDecoder, Scan};
pub use lidar::Error;
pub use msop::MsopPacket;
#[cfg(feature = "pcap")]
pub use pcap_source::PcapSource;
