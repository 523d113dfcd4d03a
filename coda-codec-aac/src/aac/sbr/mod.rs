// Coda
// Copyright (c) 2026 The Project Coda Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Spectral band replication (ISO/IEC 14496-3, 4.6.18).
//!
//! SBR reconstructs the upper half of the spectrum from the core signal, guided by envelope and
//! noise floor data carried in fill elements. The output runs at twice the core sampling rate.

mod data;
mod freq;
mod hf;
mod qmf;
mod tables;

use coda_core::errors::{decode_error, Result};
use coda_core::io::{BitReaderLtr, ReadBitsLtr};

use log::{debug, warn};

use crate::aac::element::SbrPayload;

use data::{dequantize, dequantize_coupled, read_pair, read_single, ChannelData, Energies};
use freq::FreqTables;
use hf::{Envelope, SbrChannel};

pub use freq::is_supported_rate;

const EXT_SBR_DATA_CRC: u32 = 0xe;

/// The SBR header. Fields absent from the bitstream take their default values.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SbrHeader {
    pub amp_res: bool,
    pub start_freq: u8,
    pub stop_freq: u8,
    pub xover_band: u8,
    pub freq_scale: u8,
    pub alter_scale: bool,
    pub noise_bands: u8,
    pub limiter_bands: u8,
    pub limiter_gains: u8,
    pub interpol_freq: bool,
    pub smoothing_mode: bool,
}

impl Default for SbrHeader {
    fn default() -> Self {
        SbrHeader {
            amp_res: false,
            start_freq: 0,
            stop_freq: 0,
            xover_band: 0,
            freq_scale: 2,
            alter_scale: true,
            noise_bands: 2,
            limiter_bands: 2,
            limiter_gains: 2,
            interpol_freq: true,
            smoothing_mode: true,
        }
    }
}

impl SbrHeader {
    fn read<B: ReadBitsLtr>(bs: &mut B) -> Result<SbrHeader> {
        let mut header = SbrHeader {
            amp_res: bs.read_bool()?,
            start_freq: bs.read_bits_leq32(4)? as u8,
            stop_freq: bs.read_bits_leq32(4)? as u8,
            xover_band: bs.read_bits_leq32(3)? as u8,
            ..Default::default()
        };

        // Reserved.
        bs.ignore_bits(2)?;

        let extra_1 = bs.read_bool()?;
        let extra_2 = bs.read_bool()?;

        if extra_1 {
            header.freq_scale = bs.read_bits_leq32(2)? as u8;
            header.alter_scale = bs.read_bool()?;
            header.noise_bands = bs.read_bits_leq32(2)? as u8;
        }

        if extra_2 {
            header.limiter_bands = bs.read_bits_leq32(2)? as u8;
            header.limiter_gains = bs.read_bits_leq32(2)? as u8;
            header.interpol_freq = bs.read_bool()?;
            header.smoothing_mode = bs.read_bool()?;
        }

        Ok(header)
    }

    /// Returns true if the frequency tables derived from the headers differ.
    fn tables_differ(&self, other: &SbrHeader) -> bool {
        self.start_freq != other.start_freq
            || self.stop_freq != other.stop_freq
            || self.xover_band != other.xover_band
            || self.freq_scale != other.freq_scale
            || self.alter_scale != other.alter_scale
            || self.noise_bands != other.noise_bands
            || self.limiter_bands != other.limiter_bands
    }
}

/// The SBR decoder of one SCE or CPE.
pub struct SbrDecoder {
    sample_rate: u32,
    header: Option<SbrHeader>,
    tables: Option<FreqTables>,
    channels: Vec<SbrChannel>,
}

impl SbrDecoder {
    /// Instantiates the decoder for an element of `num_channels` channels (1 or 2) at the output
    /// sampling rate.
    pub fn new(sample_rate: u32, num_channels: usize) -> Self {
        SbrDecoder {
            sample_rate,
            header: None,
            tables: None,
            channels: (0..num_channels).map(|_| SbrChannel::default()).collect(),
        }
    }

    /// Decodes one frame. `core` holds 1024 samples per channel of the element, `out` receives
    /// 2048 samples per channel. Malformed SBR data degrades the frame to plain upsampling.
    pub fn apply(
        &mut self,
        frame: &[u8],
        payload: Option<&SbrPayload>,
        core: &[Vec<f32>],
        out: &mut [Vec<f32>],
    ) {
        let parsed = match payload {
            Some(payload) => match self.read(frame, payload) {
                Ok(parsed) => parsed,
                Err(err) => {
                    warn!("sbr: {}, upsampling only", err);
                    None
                }
            },
            None => None,
        };

        match (parsed, &self.header, &self.tables) {
            (Some(parsed), Some(header), Some(tables)) => {
                for (((ch, (data, energies)), src), dst) in
                    self.channels.iter_mut().zip(parsed.iter()).zip(core).zip(out.iter_mut())
                {
                    let env = Envelope { header, tables, data, energies };
                    ch.process(src, Some(env), dst);
                }
            }
            _ => {
                for ((ch, src), dst) in self.channels.iter_mut().zip(core).zip(out.iter_mut()) {
                    ch.process(src, None, dst);
                }
            }
        }
    }

    /// Reads the SBR extension payload. Returns `None` if the payload carries no data.
    fn read(
        &mut self,
        frame: &[u8],
        payload: &SbrPayload,
    ) -> Result<Option<Vec<(ChannelData, Energies)>>> {
        let mut bs = BitReaderLtr::new(frame);
        bs.seek_to(payload.start);

        if bs.read_bits_leq32(4)? == EXT_SBR_DATA_CRC {
            // The CRC is not verified.
            bs.ignore_bits(10)?;
        }

        if bs.read_bool()? {
            self.update_header(SbrHeader::read(&mut bs)?)?;
        }

        let (header, tables) = match (&self.header, &self.tables) {
            (Some(header), Some(tables)) => (header, tables),
            _ => {
                debug!("sbr: data before the first header");
                return Ok(None);
            }
        };

        let parsed = match self.channels.as_slice() {
            [ch] => {
                let data = read_single(&mut bs, tables, header.amp_res, ch.history())?;
                let energies = dequantize(&data, tables)?;
                vec![(data, energies)]
            }
            [ch0, ch1] => {
                let hist = [ch0.history(), ch1.history()];
                let (left, right, coupled) = read_pair(&mut bs, tables, header.amp_res, hist)?;

                let (el, er) = if coupled {
                    dequantize_coupled(&left, &right, tables)?
                }
                else {
                    (dequantize(&left, tables)?, dequantize(&right, tables)?)
                };

                vec![(left, el), (right, er)]
            }
            _ => return decode_error("sbr: invalid channel count"),
        };

        if payload.start.bits_until(bs.pos()) > payload.len {
            return decode_error("sbr: data exceeds the extension payload");
        }

        Ok(Some(parsed))
    }

    fn update_header(&mut self, header: SbrHeader) -> Result<()> {
        let changed = match &self.header {
            Some(prev) => prev.tables_differ(&header) || self.tables.is_none(),
            None => true,
        };

        self.header = Some(header);

        if changed {
            debug!("sbr: new header {:?}", header);

            self.tables = None;

            for ch in self.channels.iter_mut() {
                ch.restart();
            }

            let tables = FreqTables::new(&header, self.sample_rate)?;

            debug!(
                "sbr: k0={}, k2={}, kx={}, m={}, {} master bands, {} patches",
                tables.k0,
                tables.k2,
                tables.kx,
                tables.m,
                tables.master.len() - 1,
                tables.patches.len()
            );

            self.tables = Some(tables);
        }

        Ok(())
    }

    /// Clears all state, as at the start of a stream.
    pub fn reset(&mut self) {
        *self = SbrDecoder::new(self.sample_rate, self.channels.len());
    }
}
