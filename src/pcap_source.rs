// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! Offline replay of RS-LiDAR-16 captures.
//!
//! [`PcapSource`] loads a PCAP or PCAPNG file into memory and hands out the
//! UDP payloads in capture order, filtered by port. Replaying both the
//! MSOP (6699) and DIFOP (7788) streams through one
//! [`RobosenseDecoder`](crate::driver::RobosenseDecoder) reproduces a live
//! session without hardware.
//!
//! # Example
//!
//! ```ignore
//! use edgefirst_rslidar::{PcapSource, driver::RobosenseDecoder};
//!
//! let source = PcapSource::from_file("rs16.pcap", &[6699, 7788])?;
//! let mut decoder = RobosenseDecoder::new();
//! for payload in source.iter() {
//!     decoder.process(payload)?;
//! }
//! ```

use std::path::Path;

use etherparse::{SlicedPacket, TransportSlice};
use log::debug;
use pcap_parser::{
    Block, LegacyPcapReader, PcapBlockOwned, PcapError, PcapNGReader,
    traits::PcapReaderIterator,
};

use crate::lidar::Error;

/// PCAPNG section header block magic
const PCAPNG_MAGIC: [u8; 4] = [0x0a, 0x0d, 0x0d, 0x0a];

/// In-memory UDP payloads of a capture file.
pub struct PcapSource {
    packets: Vec<Vec<u8>>,
    index: usize,
}

impl PcapSource {
    /// Load a capture from disk, keeping payloads whose source or
    /// destination port is in `ports`. An empty list keeps every UDP
    /// payload.
    pub fn from_file<P: AsRef<Path>>(path: P, ports: &[u16]) -> Result<Self, Error> {
        let data = std::fs::read(path.as_ref())?;
        debug!("loaded {} bytes from {}", data.len(), path.as_ref().display());
        Self::from_bytes(&data, ports)
    }

    /// Load a capture from memory with the same filtering as
    /// [`PcapSource::from_file`].
    pub fn from_bytes(data: &[u8], ports: &[u16]) -> Result<Self, Error> {
        let mut packets = Vec::new();

        if data.starts_with(&PCAPNG_MAGIC) {
            let reader = PcapNGReader::new(data.len(), data)
                .map_err(|e| Error::InvalidPacket(format!("pcapng reader: {:?}", e)))?;
            read_blocks(reader, ports, &mut packets)?;
        } else {
            let reader = LegacyPcapReader::new(data.len(), data)
                .map_err(|e| Error::InvalidPacket(format!("pcap reader: {:?}", e)))?;
            read_blocks(reader, ports, &mut packets)?;
        }

        debug!("extracted {} UDP payloads (ports {:?})", packets.len(), ports);
        Ok(Self { packets, index: 0 })
    }

    /// Next payload in capture order, or `None` when exhausted.
    pub fn next_packet(&mut self) -> Option<&[u8]> {
        let packet = self.packets.get(self.index)?;
        self.index += 1;
        Some(packet)
    }

    /// Copy the next payload into `buf`, truncating to its length.
    ///
    /// Fails with an `UnexpectedEof` I/O error once the capture is
    /// exhausted.
    pub fn recv(&mut self, buf: &mut [u8]) -> Result<usize, Error> {
        let packet = self.next_packet().ok_or_else(|| {
            Error::Io(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "no more packets in capture",
            ))
        })?;
        let len = packet.len().min(buf.len());
        buf[..len].copy_from_slice(&packet[..len]);
        Ok(len)
    }

    pub fn has_more(&self) -> bool {
        self.index < self.packets.len()
    }

    /// Rewind to the first payload.
    pub fn reset(&mut self) {
        self.index = 0;
    }

    pub fn len(&self) -> usize {
        self.packets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packets.is_empty()
    }

    pub fn current_index(&self) -> usize {
        self.index
    }

    pub fn remaining(&self) -> usize {
        self.packets.len().saturating_sub(self.index)
    }

    /// All payloads in capture order, independent of the replay position.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = &[u8]> + '_ {
        self.packets.iter().map(Vec::as_slice)
    }
}

/// Drain every packet block of `reader` into `packets`.
fn read_blocks<R: PcapReaderIterator>(
    mut reader: R,
    ports: &[u16],
    packets: &mut Vec<Vec<u8>>,
) -> Result<(), Error> {
    loop {
        match reader.next() {
            Ok((offset, block)) => {
                let frame = match block {
                    PcapBlockOwned::Legacy(packet) => Some(packet.data),
                    PcapBlockOwned::NG(Block::EnhancedPacket(epb)) => Some(epb.data),
                    PcapBlockOwned::NG(Block::SimplePacket(spb)) => Some(spb.data),
                    _ => None,
                };
                if let Some(payload) = frame.and_then(|f| udp_payload(f, ports)) {
                    packets.push(payload.to_vec());
                }
                reader.consume(offset);
            }
            Err(PcapError::Eof) => break,
            // Whole file is buffered, a truncated trailing record ends the replay
            Err(PcapError::Incomplete(_)) => break,
            Err(e) => return Err(Error::InvalidPacket(format!("pcap parse error: {:?}", e))),
        }
    }
    Ok(())
}

/// UDP payload of an Ethernet frame, if its source or destination port is
/// in `ports` (or `ports` is empty).
fn udp_payload<'a>(frame: &'a [u8], ports: &[u16]) -> Option<&'a [u8]> {
    let packet = SlicedPacket::from_ethernet(frame).ok()?;
    let udp = match packet.transport {
        Some(TransportSlice::Udp(udp)) => udp,
        _ => return None,
    };

    if !ports.is_empty()
        && !ports.contains(&udp.source_port())
        && !ports.contains(&udp.destination_port())
    {
        return None;
    }

    let payload = udp.payload();
    if payload.is_empty() { None } else { Some(payload) }
}
