// Coda
// Copyright (c) 2026 The Project Coda Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Individual channel stream (ICS) parsing: the spectral decoder.

use coda_core::errors::{decode_error, unsupported_error, Result};
use coda_core::io::vlc::{Codebook, Entry8x16};
use coda_core::io::ReadBitsLtr;

use log::trace;

use crate::aac::codebooks;
use crate::aac::common::*;

pub mod pulse;
pub mod tns;

pub const ZERO_HCB: u8 = 0;
pub const RESERVED_HCB: u8 = 12;
pub const NOISE_HCB: u8 = 13;
pub const INTENSITY_HCB2: u8 = 14;
pub const INTENSITY_HCB: u8 = 15;

const INTENSITY_SCALE_MIN: i16 = -155;
const NOISE_SCALE_MIN: i16 = -100;

/// The window configuration of an individual channel stream.
#[derive(Clone, Copy, Debug)]
pub struct IcsInfo {
    pub window_sequence: WindowSequence,
    /// Kaiser-Bessel derived window if true, sine window otherwise.
    pub window_shape: bool,
    pub max_sfb: usize,
    pub num_windows: usize,
    pub window_groups: usize,
    /// The number of windows in each window group.
    pub group_len: [usize; MAX_WINDOWS],
}

impl Default for IcsInfo {
    fn default() -> Self {
        IcsInfo {
            window_sequence: WindowSequence::OnlyLong,
            window_shape: false,
            max_sfb: 0,
            num_windows: 1,
            window_groups: 1,
            group_len: [1, 0, 0, 0, 0, 0, 0, 0],
        }
    }
}

impl IcsInfo {
    pub fn read<B: ReadBitsLtr>(bs: &mut B, sbinfo: &GASubbandInfo) -> Result<Self> {
        if bs.read_bool()? {
            return decode_error("aac: ics reserved bit set");
        }

        let window_sequence = WindowSequence::from_bits(bs.read_bits_leq32(2)?);
        let window_shape = bs.read_bool()?;

        let mut info = IcsInfo { window_sequence, window_shape, ..Default::default() };

        if window_sequence == WindowSequence::EightShort {
            info.num_windows = 8;
            info.max_sfb = bs.read_bits_leq32(4)? as usize;

            // Each grouping bit merges the next window into the current group.
            for _ in 0..MAX_WINDOWS - 1 {
                if bs.read_bool()? {
                    info.group_len[info.window_groups - 1] += 1;
                }
                else {
                    info.group_len[info.window_groups] = 1;
                    info.window_groups += 1;
                }
            }
        }
        else {
            info.max_sfb = bs.read_bits_leq32(6)? as usize;

            let predictor_data_present = bs.read_bool()?;

            if predictor_data_present {
                return unsupported_error("aac: prediction");
            }
        }

        validate!(info.max_sfb < sbinfo.bands(info.is_long()).len());

        Ok(info)
    }

    #[inline(always)]
    pub fn is_long(&self) -> bool {
        self.window_sequence != WindowSequence::EightShort
    }
}

/// A parsed individual channel stream: side information and the quantized spectrum.
#[derive(Clone)]
pub struct Ics {
    pub info: IcsInfo,
    pub global_gain: u8,
    /// Codebook of each scale factor band, per window group.
    pub sfb_cb: [[u8; MAX_SFBS]; MAX_WINDOWS],
    /// Scale factor, noise energy, or intensity position of each band, per window group,
    /// depending on the band's codebook.
    pub sf: [[i16; MAX_SFBS]; MAX_WINDOWS],
    pub pulse: Option<pulse::Pulse>,
    pub tns: Option<tns::Tns>,
    /// Quantized spectral lines, window after window.
    pub quant: [i16; 1024],
}

impl Ics {
    /// Reads an individual channel stream. If the stream belongs to a channel pair with a common
    /// window, `common` is the shared window configuration.
    pub fn read<B: ReadBitsLtr>(
        bs: &mut B,
        sbinfo: &GASubbandInfo,
        common: Option<&IcsInfo>,
    ) -> Result<Box<Ics>> {
        let global_gain = bs.read_bits_leq32(8)? as u8;

        let info = match common {
            Some(info) => *info,
            None => IcsInfo::read(bs, sbinfo)?,
        };

        let mut ics = Box::new(Ics {
            info,
            global_gain,
            sfb_cb: [[ZERO_HCB; MAX_SFBS]; MAX_WINDOWS],
            sf: [[0; MAX_SFBS]; MAX_WINDOWS],
            pulse: None,
            tns: None,
            quant: [0; 1024],
        });

        ics.read_section_data(bs)?;
        ics.read_scale_factor_data(bs)?;

        let bands = ics.bands(sbinfo);

        ics.pulse = pulse::Pulse::read(bs)?;

        if let Some(pulse) = &ics.pulse {
            validate!(info.is_long());
            pulse.validate(bands, info.max_sfb)?;
        }

        ics.tns = tns::Tns::read(bs, &ics.info)?;

        let gain_control_data_present = bs.read_bool()?;

        if gain_control_data_present {
            return unsupported_error("aac: gain control");
        }

        ics.read_spectral_data(bs, bands)?;

        if let Some(pulse) = ics.pulse {
            pulse.apply(bands, &mut ics.quant);
        }

        trace!(
            "ics: seq={:?}, max_sfb={}, groups={}, gain={}",
            info.window_sequence,
            info.max_sfb,
            info.window_groups,
            global_gain
        );

        Ok(ics)
    }

    pub fn bands(&self, sbinfo: &GASubbandInfo) -> &'static [usize] {
        sbinfo.bands(self.info.is_long())
    }

    fn read_section_data<B: ReadBitsLtr>(&mut self, bs: &mut B) -> Result<()> {
        let sect_bits = if self.info.is_long() { 5 } else { 3 };
        let sect_esc_val = (1 << sect_bits) - 1;

        for g in 0..self.info.window_groups {
            let mut k = 0;

            while k < self.info.max_sfb {
                let sect_cb = bs.read_bits_leq32(4)? as u8;

                if sect_cb == RESERVED_HCB {
                    return decode_error("aac: invalid band type");
                }

                let mut sect_len = 0;

                loop {
                    let sect_len_incr = bs.read_bits_leq32(sect_bits)? as usize;

                    sect_len += sect_len_incr;

                    if sect_len_incr < sect_esc_val {
                        break;
                    }
                }

                validate!(sect_len > 0 && k + sect_len <= self.info.max_sfb);

                self.sfb_cb[g][k..k + sect_len].fill(sect_cb);

                k += sect_len;
            }
        }

        Ok(())
    }

    fn read_scale_factor_data<B: ReadBitsLtr>(&mut self, bs: &mut B) -> Result<()> {
        let mut noise_pcm_flag = true;
        let mut scf_intensity = 0i16;
        let mut scf_noise = i16::from(self.global_gain) - 90;
        let mut scf_normal = i16::from(self.global_gain);

        let scf_cb: &Codebook<Entry8x16> = &codebooks::SCALEFACTORS;

        for g in 0..self.info.window_groups {
            for sfb in 0..self.info.max_sfb {
                self.sf[g][sfb] = if self.is_zero(g, sfb) {
                    0
                }
                else if self.is_intensity(g, sfb) {
                    scf_intensity += i16::from(bs.read_codebook(scf_cb)?.0) - 60;

                    validate!(
                        (scf_intensity >= INTENSITY_SCALE_MIN)
                            && (scf_intensity < INTENSITY_SCALE_MIN + 256)
                    );

                    scf_intensity
                }
                else if self.is_noise(g, sfb) {
                    if noise_pcm_flag {
                        noise_pcm_flag = false;
                        scf_noise += (bs.read_bits_leq32(9)? as i16) - 256;
                    }
                    else {
                        scf_noise += i16::from(bs.read_codebook(scf_cb)?.0) - 60;
                    }

                    validate!(
                        (scf_noise >= NOISE_SCALE_MIN) && (scf_noise < NOISE_SCALE_MIN + 256)
                    );

                    scf_noise
                }
                else {
                    scf_normal += i16::from(bs.read_codebook(scf_cb)?.0) - 60;

                    validate!((scf_normal >= 0) && (scf_normal < 256));

                    scf_normal
                }
            }
        }

        Ok(())
    }

    fn read_spectral_data<B: ReadBitsLtr>(&mut self, bs: &mut B, bands: &[usize]) -> Result<()> {
        let mut w = 0;

        for g in 0..self.info.window_groups {
            let group_len = self.info.group_len[g];

            for sfb in 0..self.info.max_sfb {
                let cb = self.sfb_cb[g][sfb];

                // Zero, noise, and intensity bands carry no spectral data.
                if cb == ZERO_HCB || cb > RESERVED_HCB {
                    continue;
                }

                let spectral = &codebooks::SPECTRAL[usize::from(cb) - 1];

                for win in w..w + group_len {
                    let band = &mut self.quant[win * 128 + bands[sfb]..win * 128 + bands[sfb + 1]];

                    for lines in band.chunks_exact_mut(spectral.dim()) {
                        spectral.read(bs, lines)?;
                    }
                }
            }

            w += group_len;
        }

        Ok(())
    }

    #[inline(always)]
    pub fn is_zero(&self, g: usize, sfb: usize) -> bool {
        self.sfb_cb[g][sfb] == ZERO_HCB
    }

    #[inline(always)]
    pub fn is_intensity(&self, g: usize, sfb: usize) -> bool {
        (self.sfb_cb[g][sfb] == INTENSITY_HCB) || (self.sfb_cb[g][sfb] == INTENSITY_HCB2)
    }

    #[inline(always)]
    pub fn is_noise(&self, g: usize, sfb: usize) -> bool {
        self.sfb_cb[g][sfb] == NOISE_HCB
    }

    /// Gets the direction of an intensity band: true for in-phase, false for out-of-phase.
    #[inline(always)]
    pub fn intensity_dir(&self, g: usize, sfb: usize) -> bool {
        self.sfb_cb[g][sfb] == INTENSITY_HCB
    }
}
