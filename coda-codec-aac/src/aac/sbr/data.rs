// Coda
// Copyright (c) 2026 The Project Coda Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! SBR data: the time/frequency grid, envelope and noise floor scale factors, and sinusoidal
//! coding of one channel for one frame.

use coda_core::errors::{decode_error, Result};
use coda_core::io::ReadBitsLtr;

use super::freq::FreqTables;
use super::tables::*;

/// The number of SBR time slots in a frame of 1024 core samples.
pub const NUM_TIME_SLOTS: usize = 16;
pub const MAX_ENVELOPES: usize = 5;
pub const MAX_NOISE_ENVELOPES: usize = 2;
/// The maximum number of envelope bands, and of QMF subbands generated by SBR.
pub const MAX_BANDS: usize = 48;
pub const MAX_NOISE_BANDS: usize = 5;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameClass {
    FixFix,
    FixVar,
    VarFix,
    VarVar,
}

/// The time/frequency grid of a channel for one frame.
#[derive(Clone, Copy, Debug)]
pub struct Grid {
    pub class: FrameClass,
    pub num_env: usize,
    /// Envelope borders, in time slots.
    pub t_env: [usize; MAX_ENVELOPES + 1],
    /// True if the envelope uses the high frequency resolution table.
    pub freq_res: [bool; MAX_ENVELOPES],
    pub num_noise: usize,
    /// Noise floor borders, in time slots.
    pub t_noise: [usize; MAX_NOISE_ENVELOPES + 1],
    /// The envelope at which a transient starts.
    pub transient: Option<usize>,
    /// The amplitude resolution of the frame, true for 3.0 dB steps.
    pub amp_res: bool,
}

impl Grid {
    fn read<B: ReadBitsLtr>(bs: &mut B, amp_res: bool) -> Result<Grid> {
        let mut grid = Grid {
            class: FrameClass::FixFix,
            num_env: 1,
            t_env: [0; MAX_ENVELOPES + 1],
            freq_res: [false; MAX_ENVELOPES],
            num_noise: 1,
            t_noise: [0; MAX_NOISE_ENVELOPES + 1],
            transient: None,
            amp_res,
        };

        // Borders are computed in signed arithmetic and checked for monotonicity afterwards.
        let mut borders = [0isize; MAX_ENVELOPES + 1];
        let trail = NUM_TIME_SLOTS as isize;

        let pointer;

        match bs.read_bits_leq32(2)? {
            0 => {
                grid.class = FrameClass::FixFix;
                grid.num_env = 1 << bs.read_bits_leq32(2)?;

                if grid.num_env > 4 {
                    return decode_error("sbr: too many envelopes");
                }

                // A single envelope is always coded with 1.5 dB steps.
                if grid.num_env == 1 {
                    grid.amp_res = false;
                }

                let step = (trail + (grid.num_env as isize >> 1)) / grid.num_env as isize;

                for l in 1..grid.num_env {
                    borders[l] = borders[l - 1] + step;
                }
                borders[grid.num_env] = trail;

                let freq_res = bs.read_bool()?;
                grid.freq_res[..grid.num_env].fill(freq_res);

                pointer = 0;
            }
            1 => {
                grid.class = FrameClass::FixVar;

                let abs_bord_trail = trail + bs.read_bits_leq32(2)? as isize;
                let num_rel_trail = bs.read_bits_leq32(2)? as usize;

                grid.num_env = num_rel_trail + 1;
                borders[grid.num_env] = abs_bord_trail;

                for i in 0..num_rel_trail {
                    let rel = 2 * bs.read_bits_leq32(2)? as isize + 2;
                    borders[grid.num_env - 1 - i] = borders[grid.num_env - i] - rel;
                }

                pointer = read_pointer(bs, grid.num_env)?;

                for i in 0..grid.num_env {
                    grid.freq_res[grid.num_env - 1 - i] = bs.read_bool()?;
                }
            }
            2 => {
                grid.class = FrameClass::VarFix;

                borders[0] = bs.read_bits_leq32(2)? as isize;
                let num_rel_lead = bs.read_bits_leq32(2)? as usize;

                grid.num_env = num_rel_lead + 1;
                borders[grid.num_env] = trail;

                for i in 0..num_rel_lead {
                    let rel = 2 * bs.read_bits_leq32(2)? as isize + 2;
                    borders[i + 1] = borders[i] + rel;
                }

                pointer = read_pointer(bs, grid.num_env)?;

                for res in grid.freq_res[..grid.num_env].iter_mut() {
                    *res = bs.read_bool()?;
                }
            }
            _ => {
                grid.class = FrameClass::VarVar;

                borders[0] = bs.read_bits_leq32(2)? as isize;
                let abs_bord_trail = trail + bs.read_bits_leq32(2)? as isize;
                let num_rel_lead = bs.read_bits_leq32(2)? as usize;
                let num_rel_trail = bs.read_bits_leq32(2)? as usize;

                grid.num_env = num_rel_lead + num_rel_trail + 1;

                if grid.num_env > MAX_ENVELOPES {
                    return decode_error("sbr: too many envelopes");
                }

                borders[grid.num_env] = abs_bord_trail;

                for i in 0..num_rel_lead {
                    let rel = 2 * bs.read_bits_leq32(2)? as isize + 2;
                    borders[i + 1] = borders[i] + rel;
                }

                for i in 0..num_rel_trail {
                    let rel = 2 * bs.read_bits_leq32(2)? as isize + 2;
                    borders[grid.num_env - 1 - i] = borders[grid.num_env - i] - rel;
                }

                pointer = read_pointer(bs, grid.num_env)?;

                for res in grid.freq_res[..grid.num_env].iter_mut() {
                    *res = bs.read_bool()?;
                }
            }
        }

        if pointer > grid.num_env + 1 {
            return decode_error("sbr: invalid transient pointer");
        }

        if borders[0] < 0 || borders[..=grid.num_env].windows(2).any(|w| w[0] >= w[1]) {
            return decode_error("sbr: envelope borders not strictly increasing");
        }

        for (t, &b) in grid.t_env.iter_mut().zip(borders[..=grid.num_env].iter()) {
            *t = b as usize;
        }

        let num_env = grid.num_env;

        grid.transient = match grid.class {
            FrameClass::FixVar | FrameClass::VarVar if pointer > 0 => Some(num_env + 1 - pointer),
            FrameClass::VarFix if pointer > 1 => Some(pointer - 1),
            _ => None,
        };

        // Two noise floors when there is more than one envelope, split at an envelope border.
        grid.num_noise = if num_env > 1 { 2 } else { 1 };

        grid.t_noise[0] = grid.t_env[0];
        grid.t_noise[grid.num_noise] = grid.t_env[num_env];

        if grid.num_noise > 1 {
            let idx = match grid.class {
                FrameClass::FixFix => num_env >> 1,
                FrameClass::FixVar | FrameClass::VarVar => {
                    num_env - pointer.saturating_sub(1).max(1)
                }
                FrameClass::VarFix => match pointer {
                    0 => 1,
                    1 => num_env - 1,
                    _ => pointer - 1,
                },
            };

            grid.t_noise[1] = grid.t_env[idx];
        }

        Ok(grid)
    }

    /// The first QMF slot of the frame covered by the grid.
    pub fn first_slot(&self) -> usize {
        2 * self.t_env[0]
    }

    /// The QMF slot after the last covered by the grid.
    pub fn last_slot(&self) -> usize {
        2 * self.t_env[self.num_env]
    }
}

fn read_pointer<B: ReadBitsLtr>(bs: &mut B, num_env: usize) -> Result<usize> {
    // ceil(log2(num_env + 1)) bits.
    let bits = usize::BITS - num_env.leading_zeros();
    Ok(bs.read_bits_leq32(bits)? as usize)
}

/// The last envelope and noise floor scale factors of the previous frame. Delta coding in the
/// time direction refers to them.
#[derive(Clone, Debug)]
pub struct DeltaHistory {
    pub env: [i32; MAX_BANDS],
    pub freq_res: bool,
    pub noise: [i32; MAX_NOISE_BANDS],
}

impl Default for DeltaHistory {
    fn default() -> Self {
        DeltaHistory { env: [0; MAX_BANDS], freq_res: false, noise: [0; MAX_NOISE_BANDS] }
    }
}

/// The parsed SBR data of a channel.
#[derive(Clone, Debug)]
pub struct ChannelData {
    pub grid: Grid,
    df_env: [bool; MAX_ENVELOPES],
    df_noise: [bool; MAX_NOISE_ENVELOPES],
    pub invf_mode: [u8; MAX_NOISE_BANDS],
    /// Quantized envelope scale factors (or balance, for the second channel of a coupled
    /// pair), per envelope and band.
    pub env: [[i32; MAX_BANDS]; MAX_ENVELOPES],
    /// Quantized noise floor scale factors (or balance), per noise floor and band.
    pub noise: [[i32; MAX_NOISE_BANDS]; MAX_NOISE_ENVELOPES],
    /// Additional sinusoids per high resolution band, if any are signalled.
    pub harmonics: Option<[bool; MAX_BANDS]>,
}

impl ChannelData {
    pub(super) fn new(grid: Grid) -> Self {
        ChannelData {
            grid,
            df_env: [false; MAX_ENVELOPES],
            df_noise: [false; MAX_NOISE_ENVELOPES],
            invf_mode: [0; MAX_NOISE_BANDS],
            env: [[0; MAX_BANDS]; MAX_ENVELOPES],
            noise: [[0; MAX_NOISE_BANDS]; MAX_NOISE_ENVELOPES],
            harmonics: None,
        }
    }

    fn read_dtdf<B: ReadBitsLtr>(&mut self, bs: &mut B) -> Result<()> {
        for df in self.df_env[..self.grid.num_env].iter_mut() {
            *df = bs.read_bool()?;
        }
        for df in self.df_noise[..self.grid.num_noise].iter_mut() {
            *df = bs.read_bool()?;
        }
        Ok(())
    }

    fn read_invf<B: ReadBitsLtr>(&mut self, bs: &mut B, tables: &FreqTables) -> Result<()> {
        for mode in self.invf_mode[..tables.num_noise_bands()].iter_mut() {
            *mode = bs.read_bits_leq32(2)? as u8;
        }
        Ok(())
    }

    fn read_envelope<B: ReadBitsLtr>(
        &mut self,
        bs: &mut B,
        tables: &FreqTables,
        hist: &DeltaHistory,
        balance: bool,
    ) -> Result<()> {
        let (t_cb, f_cb, start_bits): (&SbrCodebook, &SbrCodebook, u32) =
            match (balance, self.grid.amp_res) {
                (true, true) => (&T_ENV_BAL_3_0, &F_ENV_BAL_3_0, 5),
                (true, false) => (&T_ENV_BAL_1_5, &F_ENV_BAL_1_5, 6),
                (false, true) => (&T_ENV_3_0, &F_ENV_3_0, 6),
                (false, false) => (&T_ENV_1_5, &F_ENV_1_5, 7),
            };

        // Balance values are coded with twice the step size.
        let step = if balance { 2 } else { 1 };

        let odd = tables.num_env_bands(true) & 1;

        for l in 0..self.grid.num_env {
            let high_res = self.grid.freq_res[l];
            let num_bands = tables.num_env_bands(high_res);

            if self.df_env[l] {
                let (prev, prev_high_res) = if l == 0 {
                    (hist.env, hist.freq_res)
                }
                else {
                    (self.env[l - 1], self.grid.freq_res[l - 1])
                };

                for k in 0..num_bands {
                    // Map the band onto the band of the previous envelope's resolution.
                    let j = match (prev_high_res, high_res) {
                        (false, true) => (k + odd) >> 1,
                        (true, false) if k > 0 => 2 * k - odd,
                        (true, false) => 0,
                        _ => k,
                    };

                    self.env[l][k] = prev[j] + step * read_delta(bs, t_cb)?;
                }
            }
            else {
                self.env[l][0] = step * bs.read_bits_leq32(start_bits)? as i32;

                for k in 1..num_bands {
                    self.env[l][k] = self.env[l][k - 1] + step * read_delta(bs, f_cb)?;
                }
            }
        }

        Ok(())
    }

    fn read_noise<B: ReadBitsLtr>(
        &mut self,
        bs: &mut B,
        tables: &FreqTables,
        hist: &DeltaHistory,
        balance: bool,
    ) -> Result<()> {
        let (t_cb, f_cb): (&SbrCodebook, &SbrCodebook) = if balance {
            (&T_NOISE_BAL_3_0, &F_ENV_BAL_3_0)
        }
        else {
            (&T_NOISE_3_0, &F_ENV_3_0)
        };

        let step = if balance { 2 } else { 1 };

        let num_bands = tables.num_noise_bands();

        for l in 0..self.grid.num_noise {
            if self.df_noise[l] {
                let prev = if l == 0 { hist.noise } else { self.noise[l - 1] };

                for k in 0..num_bands {
                    self.noise[l][k] = prev[k] + step * read_delta(bs, t_cb)?;
                }
            }
            else {
                self.noise[l][0] = step * bs.read_bits_leq32(5)? as i32;

                for k in 1..num_bands {
                    self.noise[l][k] = self.noise[l][k - 1] + step * read_delta(bs, f_cb)?;
                }
            }
        }

        Ok(())
    }

    fn read_harmonics<B: ReadBitsLtr>(&mut self, bs: &mut B, tables: &FreqTables) -> Result<()> {
        if bs.read_bool()? {
            let mut harmonics = [false; MAX_BANDS];

            for h in harmonics[..tables.num_env_bands(true)].iter_mut() {
                *h = bs.read_bool()?;
            }

            self.harmonics = Some(harmonics);
        }

        Ok(())
    }

    /// The values later frames refer to when delta coding in time.
    pub fn history(&self) -> DeltaHistory {
        let last = self.grid.num_env - 1;

        DeltaHistory {
            env: self.env[last],
            freq_res: self.grid.freq_res[last],
            noise: self.noise[self.grid.num_noise - 1],
        }
    }
}

fn read_delta<B: ReadBitsLtr>(bs: &mut B, cb: &SbrCodebook) -> Result<i32> {
    let (value, _) = bs.read_codebook(&cb.codebook)?;
    Ok(i32::from(value) - cb.lav)
}

fn skip_extended_data<B: ReadBitsLtr>(bs: &mut B) -> Result<()> {
    if bs.read_bool()? {
        let mut count = bs.read_bits_leq32(4)?;

        if count == 15 {
            count += bs.read_bits_leq32(8)?;
        }

        // Parametric stereo and other extensions are not decoded.
        bs.ignore_bits(8 * count)?;
    }

    Ok(())
}

/// Reads the SBR data of a single channel element.
pub fn read_single<B: ReadBitsLtr>(
    bs: &mut B,
    tables: &FreqTables,
    amp_res: bool,
    hist: &DeltaHistory,
) -> Result<ChannelData> {
    if bs.read_bool()? {
        bs.ignore_bits(4)?;
    }

    let mut data = ChannelData::new(Grid::read(bs, amp_res)?);

    data.read_dtdf(bs)?;
    data.read_invf(bs, tables)?;
    data.read_envelope(bs, tables, hist, false)?;
    data.read_noise(bs, tables, hist, false)?;
    data.read_harmonics(bs, tables)?;

    skip_extended_data(bs)?;

    Ok(data)
}

/// Reads the SBR data of a channel pair element. Returns the data of both channels, and whether
/// the second channel carries the balance of a coupled pair.
pub fn read_pair<B: ReadBitsLtr>(
    bs: &mut B,
    tables: &FreqTables,
    amp_res: bool,
    hist: [&DeltaHistory; 2],
) -> Result<(ChannelData, ChannelData, bool)> {
    if bs.read_bool()? {
        bs.ignore_bits(8)?;
    }

    let coupled = bs.read_bool()?;

    let (mut left, mut right) = if coupled {
        let grid = Grid::read(bs, amp_res)?;

        let mut left = ChannelData::new(grid);
        let mut right = ChannelData::new(grid);

        left.read_dtdf(bs)?;
        right.read_dtdf(bs)?;

        left.read_invf(bs, tables)?;
        right.invf_mode = left.invf_mode;

        left.read_envelope(bs, tables, hist[0], false)?;
        left.read_noise(bs, tables, hist[0], false)?;
        right.read_envelope(bs, tables, hist[1], true)?;
        right.read_noise(bs, tables, hist[1], true)?;

        (left, right)
    }
    else {
        let mut left = ChannelData::new(Grid::read(bs, amp_res)?);
        let mut right = ChannelData::new(Grid::read(bs, amp_res)?);

        left.read_dtdf(bs)?;
        right.read_dtdf(bs)?;

        left.read_invf(bs, tables)?;
        right.read_invf(bs, tables)?;

        left.read_envelope(bs, tables, hist[0], false)?;
        right.read_envelope(bs, tables, hist[1], false)?;
        left.read_noise(bs, tables, hist[0], false)?;
        right.read_noise(bs, tables, hist[1], false)?;

        (left, right)
    };

    left.read_harmonics(bs, tables)?;
    right.read_harmonics(bs, tables)?;

    skip_extended_data(bs)?;

    Ok((left, right, coupled))
}

/// Dequantized envelope energies and noise floors of a channel.
#[derive(Clone)]
pub struct Energies {
    pub env: [[f32; MAX_BANDS]; MAX_ENVELOPES],
    pub noise: [[f32; MAX_NOISE_BANDS]; MAX_NOISE_ENVELOPES],
}

impl Default for Energies {
    fn default() -> Self {
        Energies {
            env: [[0.0; MAX_BANDS]; MAX_ENVELOPES],
            noise: [[0.0; MAX_NOISE_BANDS]; MAX_NOISE_ENVELOPES],
        }
    }
}

const NOISE_FLOOR_OFFSET: f32 = 6.0;

/// The largest envelope energy accepted.
const MAX_ENERGY: f32 = 1e20;

/// Dequantizes the data of an uncoupled channel.
pub fn dequantize(data: &ChannelData, tables: &FreqTables) -> Result<Energies> {
    let alpha = if data.grid.amp_res { 1.0 } else { 0.5 };

    let mut out = Energies::default();

    for l in 0..data.grid.num_env {
        for k in 0..tables.num_env_bands(data.grid.freq_res[l]) {
            let e = (alpha * data.env[l][k] as f32 + 6.0).exp2();

            if e > MAX_ENERGY {
                return decode_error("sbr: envelope energy out of range");
            }

            out.env[l][k] = e;
        }
    }

    for l in 0..data.grid.num_noise {
        for k in 0..tables.num_noise_bands() {
            out.noise[l][k] = (NOISE_FLOOR_OFFSET - data.noise[l][k] as f32).exp2();
        }
    }

    Ok(out)
}

/// Dequantizes the data of a coupled pair, where the first channel carries the level and the
/// second the balance.
pub fn dequantize_coupled(
    left: &ChannelData,
    right: &ChannelData,
    tables: &FreqTables,
) -> Result<(Energies, Energies)> {
    let alpha = if left.grid.amp_res { 1.0 } else { 0.5 };
    let pan_offset = if left.grid.amp_res { 12.0 } else { 24.0 };

    let mut out_l = Energies::default();
    let mut out_r = Energies::default();

    for l in 0..left.grid.num_env {
        for k in 0..tables.num_env_bands(left.grid.freq_res[l]) {
            let level = (alpha * left.env[l][k] as f32 + 7.0).exp2();
            let pan = (alpha * (pan_offset - right.env[l][k] as f32)).exp2();

            if level > MAX_ENERGY {
                return decode_error("sbr: envelope energy out of range");
            }

            out_l.env[l][k] = level / (1.0 + pan);
            out_r.env[l][k] = out_l.env[l][k] * pan;
        }
    }

    for l in 0..left.grid.num_noise {
        for k in 0..tables.num_noise_bands() {
            let level = (NOISE_FLOOR_OFFSET - left.noise[l][k] as f32 + 1.0).exp2();
            let pan = (12.0 - right.noise[l][k] as f32).exp2();

            out_l.noise[l][k] = level / (1.0 + pan);
            out_r.noise[l][k] = out_l.noise[l][k] * pan;
        }
    }

    Ok((out_l, out_r))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aac::sbr::SbrHeader;
    use coda_core::io::BitReaderLtr;

    /// Packs `(value, bits)` fields MSB first.
    fn pack(fields: &[(u32, u32)]) -> Vec<u8> {
        let mut buf = vec![0u8; 16];
        let mut pos = 0;

        for &(value, bits) in fields {
            for i in (0..bits).rev() {
                if (value >> i) & 1 == 1 {
                    buf[pos >> 3] |= 0x80 >> (pos & 7);
                }
                pos += 1;
            }
        }

        buf
    }

    #[test]
    fn verify_grid_fixfix() {
        // FIXFIX, 2 envelopes, high frequency resolution.
        let buf = [0b0001_1000];
        let mut bs = BitReaderLtr::new(&buf);

        let grid = Grid::read(&mut bs, true).unwrap();

        assert_eq!(grid.class, FrameClass::FixFix);
        assert_eq!(grid.num_env, 2);
        assert_eq!(&grid.t_env[..3], &[0, 8, 16]);
        assert_eq!(&grid.freq_res[..2], &[true, true]);
        assert_eq!(grid.num_noise, 2);
        assert_eq!(&grid.t_noise[..3], &[0, 8, 16]);
        assert_eq!(grid.transient, None);
        assert!(grid.amp_res);
        assert_eq!(bs.bits_read(), 5);
    }

    #[test]
    fn verify_grid_single_envelope_amp_res() {
        // FIXFIX, 1 envelope: the amplitude resolution falls back to 1.5 dB.
        let buf = [0b0000_0000];
        let mut bs = BitReaderLtr::new(&buf);

        let grid = Grid::read(&mut bs, true).unwrap();

        assert_eq!(grid.num_env, 1);
        assert_eq!(&grid.t_env[..2], &[0, 16]);
        assert!(!grid.amp_res);
    }

    #[test]
    fn verify_grid_varvar() {
        // VARVAR: lead border 1, trail border 16 + 2, one relative border of each kind, pointer 2.
        //
        //   class 11, bord0 01, bord1 10, num_rel0 01, num_rel1 01, rel0 01 (4), rel1 00 (2),
        //   pointer 10, freq_res 1 0 1
        let buf = [0b1101_1001, 0b0101_0010, 0b1010_0000];
        let mut bs = BitReaderLtr::new(&buf);

        let grid = Grid::read(&mut bs, true).unwrap();

        assert_eq!(grid.class, FrameClass::VarVar);
        assert_eq!(grid.num_env, 3);
        assert_eq!(&grid.t_env[..4], &[1, 5, 16, 18]);
        assert_eq!(&grid.freq_res[..3], &[true, false, true]);
        assert_eq!(grid.transient, Some(2));
        assert_eq!(&grid.t_noise[..3], &[1, 16, 18]);
        assert_eq!(grid.last_slot(), 36);
    }

    #[test]
    fn verify_grid_rejects_bad_borders() {
        // FIXFIX with 8 envelopes.
        let buf = [0b0011_0000];
        assert!(Grid::read(&mut BitReaderLtr::new(&buf), false).is_err());

        // VARFIX with relative borders past the end of the frame:
        //   class 10, bord0 11, num_rel0 11, rel 11 11 11 (8 each)
        let buf = [0b1011_1111, 0b1111_0000, 0x00];
        assert!(Grid::read(&mut BitReaderLtr::new(&buf), false).is_err());
    }

    #[test]
    fn verify_time_deltas_from_history() {
        let header = SbrHeader { start_freq: 5, stop_freq: 9, ..Default::default() };
        let tables = FreqTables::new(&header, 48000).unwrap();

        assert_eq!((tables.num_env_bands(true), tables.num_noise_bands()), (16, 4));

        // FIXFIX, 2 envelopes, high frequency resolution, 3.0 dB steps.
        let grid = Grid::read(&mut BitReaderLtr::new(&[0b0001_1000]), true).unwrap();

        let mut data = ChannelData::new(grid);
        data.df_env[..2].copy_from_slice(&[true, false]);
        data.df_noise[..2].copy_from_slice(&[true, true]);

        let mut fields = vec![(0x3ffec, 18)];
        // Zero deltas are the single bit 0 in both directions.
        fields.extend([(0, 1); 15]);
        fields.push((20, 6));
        fields.extend([(0, 1); 15]);
        fields.push((0x1fcd, 13));
        fields.extend([(0, 1); 7]);

        let buf = pack(&fields);
        let mut bs = BitReaderLtr::new(&buf);

        // Time deltas of the first envelope and noise floor refer to an empty history.
        let hist = DeltaHistory::default();

        data.read_envelope(&mut bs, &tables, &hist, false).unwrap();
        data.read_noise(&mut bs, &tables, &hist, false).unwrap();

        assert_eq!(bs.bits_read(), 18 + 15 + 6 + 15 + 13 + 7);

        let mut env0 = [0; 16];
        env0[0] = 12;

        assert_eq!(&data.env[0][..16], &env0);
        assert_eq!(&data.env[1][..16], &[20; 16]);
        assert_eq!(&data.noise[0][..4], &[11, 0, 0, 0]);
        assert_eq!(&data.noise[1][..4], &[11, 0, 0, 0]);

        let next = data.history();
        assert_eq!(&next.env[..16], &[20; 16]);
        assert_eq!(&next.noise[..4], &[11, 0, 0, 0]);
        assert!(next.freq_res);
    }
}
