// Coda
// Copyright (c) 2026 The Project Coda Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Audio Data Transport Stream (ADTS) headers (ISO/IEC 13818-7, 6.2).

use coda_core::errors::{decode_error, Result};
use coda_core::io::{BitReaderLtr, ReadBitsLtr};

use crate::common::{M4AType, AAC_SAMPLE_RATES};

/// A parsed ADTS fixed and variable header.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AdtsHeader {
    /// True for MPEG-2, false for MPEG-4.
    pub mpeg2: bool,
    pub protection_absent: bool,
    pub profile: M4AType,
    pub sample_rate_index: usize,
    pub sample_rate: u32,
    pub channel_config: u32,
    /// Length of the ADTS frame, including the header.
    pub frame_len: usize,
    pub buffer_fullness: u32,
    pub num_raw_blocks: usize,
}

impl AdtsHeader {
    /// Size of the header without a CRC.
    pub const SIZE: usize = 7;

    /// Reads the header at the start of `buf`.
    pub fn read(buf: &[u8]) -> Result<AdtsHeader> {
        let mut bs = BitReaderLtr::new(buf);

        if bs.read_bits_leq32(12)? != 0xfff {
            return decode_error("adts: missing sync word");
        }

        let mpeg2 = bs.read_bool()?;

        if bs.read_bits_leq32(2)? != 0 {
            return decode_error("adts: invalid layer");
        }

        let protection_absent = bs.read_bool()?;

        // The profile is the object type minus one.
        let profile = M4AType::from_index(bs.read_bits_leq32(2)? + 1);

        let sample_rate_index = bs.read_bits_leq32(4)? as usize;

        let sample_rate = match sample_rate_index {
            13..=15 => return decode_error("adts: reserved sample rate"),
            idx => AAC_SAMPLE_RATES[idx],
        };

        // Private bit.
        bs.ignore_bit()?;

        let channel_config = bs.read_bits_leq32(3)?;

        // Originality, home, copyright identification bit and start.
        bs.ignore_bits(4)?;

        let frame_len = bs.read_bits_leq32(13)? as usize;
        let buffer_fullness = bs.read_bits_leq32(11)?;
        let num_raw_blocks = bs.read_bits_leq32(2)? as usize + 1;

        let header = AdtsHeader {
            mpeg2,
            protection_absent,
            profile,
            sample_rate_index,
            sample_rate,
            channel_config,
            frame_len,
            buffer_fullness,
            num_raw_blocks,
        };

        if frame_len < header.header_len() {
            return decode_error("adts: invalid frame length");
        }

        Ok(header)
    }

    /// The length of the header, including the CRC if present.
    pub fn header_len(&self) -> usize {
        if self.protection_absent {
            AdtsHeader::SIZE
        }
        else {
            AdtsHeader::SIZE + 2
        }
    }
}
