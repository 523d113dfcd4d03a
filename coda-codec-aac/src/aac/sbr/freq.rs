// Coda
// Copyright (c) 2026 The Project Coda Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Frequency band tables: the master table and the tables derived from it, and the patches used
//! for high frequency generation (ISO/IEC 14496-3, 4.6.18.3).

use coda_core::errors::{decode_error, unsupported_error, Result};

use super::tables::{LIMITER_BANDS_WARPED, START_FREQ_OFFSETS};
use super::SbrHeader;

/// A patch: `len` consecutive QMF subbands copied up from the low band starting at `start`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Patch {
    pub start: usize,
    pub len: usize,
}

/// The frequency band tables of a SBR header. All tables hold QMF subband borders.
#[derive(Clone, Debug)]
pub struct FreqTables {
    /// The first QMF subband of the master table.
    pub k0: usize,
    /// The QMF subband after the last of the master table.
    pub k2: usize,
    /// The first QMF subband generated by SBR.
    pub kx: usize,
    /// The number of QMF subbands generated by SBR.
    pub m: usize,
    pub master: Vec<usize>,
    pub high: Vec<usize>,
    pub low: Vec<usize>,
    pub noise: Vec<usize>,
    pub limiter: Vec<usize>,
    pub patches: Vec<Patch>,
}

/// Returns the index of the start frequency offset row for an output sampling rate.
fn rate_class(sample_rate: u32) -> Option<usize> {
    match sample_rate {
        16000 => Some(0),
        22050 => Some(1),
        24000 => Some(2),
        32000 => Some(3),
        44100 | 48000 | 64000 => Some(4),
        88200 | 96000 => Some(5),
        _ => None,
    }
}

/// Returns true if SBR can be decoded at the output sampling rate.
pub fn is_supported_rate(sample_rate: u32) -> bool {
    rate_class(sample_rate).is_some()
}

/// Divides the range `start..stop` into `num_bands` logarithmically spaced bands, returning the
/// width of each band.
fn make_bands(start: usize, stop: usize, num_bands: usize) -> Vec<usize> {
    let base = (stop as f64 / start as f64).powf(1.0 / num_bands as f64);

    let mut widths = Vec::with_capacity(num_bands);
    let mut prod = start as f64;
    let mut prev = start;

    for _ in 0..num_bands - 1 {
        prod *= base;
        let present = prod.round() as usize;
        widths.push(present - prev);
        prev = present;
    }

    widths.push(stop - prev);
    widths
}

/// Accumulates band widths onto `start`, yielding band borders.
fn accumulate(start: usize, widths: &[usize], borders: &mut Vec<usize>) {
    let mut border = start;

    for &w in widths {
        border += w;
        borders.push(border);
    }
}

impl FreqTables {
    pub fn new(header: &SbrHeader, sample_rate: u32) -> Result<FreqTables> {
        let class = match rate_class(sample_rate) {
            Some(class) => class,
            None => return unsupported_error("sbr: unsupported sample rate"),
        };

        let min_freq = if sample_rate < 32000 {
            3000
        }
        else if sample_rate < 64000 {
            4000
        }
        else {
            5000
        };

        let start_min = ((min_freq << 7) + (sample_rate >> 1)) / sample_rate;
        let stop_min = ((min_freq << 8) + (sample_rate >> 1)) / sample_rate;

        let offset = START_FREQ_OFFSETS[class][header.start_freq as usize];
        let k0 = start_min as i32 + i32::from(offset);

        if k0 <= 0 {
            return decode_error("sbr: invalid start frequency");
        }

        let k0 = k0 as usize;
        let stop_min = stop_min as usize;

        let k2 = match header.stop_freq {
            14 => 2 * k0,
            15 => 3 * k0,
            stop_freq => {
                let mut widths = make_bands(stop_min, 64, 13);
                widths.sort_unstable();
                stop_min + widths[..stop_freq as usize].iter().sum::<usize>()
            }
        }
        .min(64);

        let max_subbands = if sample_rate <= 32000 {
            48
        }
        else if sample_rate == 44100 {
            35
        }
        else {
            32
        };

        if k2 <= k0 || k2 - k0 > max_subbands {
            return decode_error("sbr: invalid frequency range");
        }

        let master = if header.freq_scale == 0 {
            master_linear(k0, k2, header.alter_scale)
        }
        else {
            master_log(k0, k2, header.freq_scale, header.alter_scale)?
        };

        let n_master = master.len() - 1;
        let xover = usize::from(header.xover_band);

        if n_master == 0 || xover >= n_master {
            return decode_error("sbr: invalid master frequency table");
        }

        // The high resolution table starts at the crossover band, the low resolution table
        // takes every other border of it.
        let high = master[xover..].to_vec();

        let n_high = high.len() - 1;
        let n_low = (n_high + 1) / 2;

        let mut low = Vec::with_capacity(n_low + 1);
        low.push(high[0]);
        low.extend((1..=n_low).map(|k| high[2 * k - (n_high & 1)]));

        let kx = high[0];
        let m = high[n_high] - kx;

        if kx > 32 || kx + m > 64 {
            return decode_error("sbr: invalid high frequency table");
        }

        let octaves = (k2 as f64 / kx as f64).log2();
        let n_noise = ((f64::from(header.noise_bands) * octaves).round() as usize).max(1);

        if n_noise > 5 {
            return decode_error("sbr: too many noise floor bands");
        }

        let mut noise = Vec::with_capacity(n_noise + 1);
        noise.push(low[0]);

        let mut i = 0;
        for k in 1..=n_noise {
            i += (n_low - i) / (n_noise + 1 - k);
            noise.push(low[i]);
        }

        let patches = make_patches(&master, k0, kx, m, sample_rate)?;
        let limiter = make_limiter(&low, &patches, kx, header.limiter_bands);

        Ok(FreqTables { k0, k2, kx, m, master, high, low, noise, limiter, patches })
    }

    /// The envelope band borders for the frequency resolution.
    pub fn env_bands(&self, high_res: bool) -> &[usize] {
        if high_res {
            &self.high
        }
        else {
            &self.low
        }
    }

    pub fn num_env_bands(&self, high_res: bool) -> usize {
        self.env_bands(high_res).len() - 1
    }

    pub fn num_noise_bands(&self) -> usize {
        self.noise.len() - 1
    }
}

fn master_linear(k0: usize, k2: usize, alter_scale: bool) -> Vec<usize> {
    let dk = if alter_scale { 2 } else { 1 };

    let num_bands = if alter_scale { ((k2 - k0 + 2) >> 2) << 1 } else { ((k2 - k0) >> 1) << 1 };

    let mut widths = vec![dk; num_bands];

    // Spread the difference between the achieved and desired stop band over the first or last
    // bands.
    let mut diff = k2 as isize - (k0 + num_bands * dk) as isize;

    if diff < 0 {
        for w in widths.iter_mut() {
            if diff == 0 {
                break;
            }
            *w -= 1;
            diff += 1;
        }
    }
    else {
        for w in widths.iter_mut().rev() {
            if diff == 0 {
                break;
            }
            *w += 1;
            diff -= 1;
        }
    }

    let mut master = vec![k0];
    accumulate(k0, &widths, &mut master);
    master
}

fn master_log(k0: usize, k2: usize, freq_scale: u8, alter_scale: bool) -> Result<Vec<usize>> {
    let half_bands = 7.0 - f64::from(freq_scale);

    let two_regions = 49 * k2 > 110 * k0;
    let k1 = if two_regions { 2 * k0 } else { k2 };

    let num_bands0 = 2 * (half_bands * (k1 as f64 / k0 as f64).log2()).round() as usize;

    if num_bands0 == 0 {
        return decode_error("sbr: invalid master frequency table");
    }

    let mut widths0 = make_bands(k0, k1, num_bands0);
    widths0.sort_unstable();

    if widths0[0] == 0 {
        return decode_error("sbr: invalid master frequency table");
    }

    let mut master = vec![k0];
    accumulate(k0, &widths0, &mut master);

    if two_regions {
        let warp = if alter_scale { 1.3 } else { 1.0 };

        let num_bands1 = 2 * (half_bands / warp * (k2 as f64 / k1 as f64).log2()).round() as usize;

        if num_bands1 == 0 {
            return decode_error("sbr: invalid master frequency table");
        }

        let mut widths1 = make_bands(k1, k2, num_bands1);
        widths1.sort_unstable();

        // The bands of the upper region may not be narrower than the widest band of the lower
        // region.
        let max0 = widths0[num_bands0 - 1];

        if widths1[0] < max0 {
            let change = (max0 - widths1[0]).min((widths1[num_bands1 - 1] - widths1[0]) >> 1);
            widths1[0] += change;
            widths1[num_bands1 - 1] -= change;
            widths1.sort_unstable();
        }

        if widths1[0] == 0 {
            return decode_error("sbr: invalid master frequency table");
        }

        accumulate(k1, &widths1, &mut master);
    }

    Ok(master)
}

fn make_patches(
    master: &[usize],
    k0: usize,
    kx: usize,
    m: usize,
    sample_rate: u32,
) -> Result<Vec<Patch>> {
    let n_master = master.len() - 1;

    // The QMF subband at roughly 16 kHz.
    let goal_sb = ((2_048_000 + (sample_rate >> 1)) / sample_rate) as usize;

    let mut k = if goal_sb < kx + m {
        master.iter().position(|&f| f >= goal_sb).unwrap_or(n_master)
    }
    else {
        n_master
    };

    let mut patches: Vec<Patch> = Vec::with_capacity(6);

    let mut msb = k0;
    let mut usb = kx;
    let mut last = None;

    loop {
        if last == Some((k, msb)) {
            return decode_error("sbr: patch construction failed");
        }

        last = Some((k, msb));

        let mut i = k;

        let (sb, odd) = loop {
            let sb = master[i];
            let odd = (sb + k0) & 1;

            if i == 0 || sb + odd <= k0 + msb - 1 {
                break (sb, odd);
            }

            i -= 1;
        };

        if patches.len() > 5 {
            return decode_error("sbr: too many patches");
        }

        let len = sb.saturating_sub(usb);

        if len > 0 {
            if len + odd > k0 {
                return decode_error("sbr: invalid patch");
            }

            patches.push(Patch { start: k0 - odd - len, len });
            usb = sb;
            msb = sb;
        }
        else {
            msb = kx;
        }

        if master[k] - sb < 3 {
            k = n_master;
        }

        if sb == kx + m {
            break;
        }
    }

    // A trailing patch narrower than 3 subbands is dropped.
    if patches.len() > 1 && patches[patches.len() - 1].len < 3 {
        patches.pop();
    }

    Ok(patches)
}

fn make_limiter(low: &[usize], patches: &[Patch], kx: usize, limiter_bands: u8) -> Vec<usize> {
    if limiter_bands == 0 {
        return vec![low[0], low[low.len() - 1]];
    }

    let warped = LIMITER_BANDS_WARPED[usize::from(limiter_bands) - 1];

    let mut borders = Vec::with_capacity(patches.len() + 1);
    borders.push(kx);
    for patch in patches {
        borders.push(borders[borders.len() - 1] + patch.len);
    }

    // Interior patch borders are candidate limiter band borders.
    let mut lim = low.to_vec();
    if patches.len() > 1 {
        lim.extend_from_slice(&borders[1..patches.len()]);
    }
    lim.sort_unstable();

    // Merge bands narrower than the limiter band width, keeping patch borders where possible.
    let mut n_lim = lim.len() - 1;
    let mut out = 0;
    let mut inp = 1;

    while out < n_lim {
        let (lo, hi) = (lim[out], lim[inp]);

        if hi as f32 >= lo as f32 * warped {
            out += 1;
            lim[out] = hi;
        }
        else if hi == lo || !borders.contains(&hi) {
            n_lim -= 1;
        }
        else if !borders.contains(&lo) {
            lim[out] = hi;
            n_lim -= 1;
        }
        else {
            out += 1;
            lim[out] = hi;
        }

        inp += 1;
    }

    lim.truncate(n_lim + 1);
    lim
}
