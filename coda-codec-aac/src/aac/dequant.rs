// Coda
// Copyright (c) 2026 The Project Coda Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The dequantizer: inverse quantization, scaling, and perceptual noise substitution.

use lazy_static::lazy_static;

use crate::aac::codebooks::MAX_QUANT;
use crate::aac::common::*;
use crate::aac::element::ChannelPair;
use crate::aac::ics::Ics;

lazy_static! {
    /// Pre-computed table of y = x^(4/3).
    static ref POW43_TABLE: Vec<f32> = {
        (0..=MAX_QUANT as usize).map(|i| f32::powf(i as f32, 4.0 / 3.0)).collect()
    };
}

/// Gets the gain of a scale factor in quarter-steps of 6 dB. The offset of 56 normalizes a
/// full-scale spectrum so that the output of the filterbank lies in [-1, 1].
#[inline(always)]
pub fn get_scale(scale: i16) -> f32 {
    2.0f32.powf(0.25 * f32::from(scale - 56))
}

/// Gets the gain of an intensity stereo position.
#[inline(always)]
pub fn get_intensity_scale(scale: i16) -> f32 {
    0.5f32.powf(0.25 * f32::from(scale))
}

/// Computes `sign(q) * |q|^(4/3)`.
#[inline(always)]
pub fn iquant(q: i16) -> f32 {
    let mag = q.unsigned_abs();

    let val = match POW43_TABLE.get(usize::from(mag)) {
        Some(&val) => val,
        // Pulses may push a line slightly beyond the table.
        None => f32::powf(f32::from(mag), 4.0 / 3.0),
    };

    if q < 0 {
        -val
    }
    else {
        val
    }
}

/// Dequantizes the spectrum of an individual channel stream into `out`. Noise bands are filled
/// from `lcg`. Zero and intensity bands are left at zero.
pub fn dequantize(ics: &Ics, sbinfo: &GASubbandInfo, lcg: &mut Lcg, out: &mut [f32; 1024]) {
    dequantize_bands(ics, sbinfo, lcg, out, |_, _| false);
}

/// Dequantizes both spectra of a channel pair. Noise bands shared by both channels are only
/// generated for the left channel, and are left at zero in `right` for the stereo stage to fill.
pub fn dequantize_pair(
    pair: &ChannelPair,
    sbinfo: &GASubbandInfo,
    lcg: &mut Lcg,
    left: &mut [f32; 1024],
    right: &mut [f32; 1024],
) {
    dequantize(&pair.ics[0], sbinfo, lcg, left);
    dequantize_bands(&pair.ics[1], sbinfo, lcg, right, |g, sfb| pair.shares_noise(g, sfb));
}

fn dequantize_bands<F>(
    ics: &Ics,
    sbinfo: &GASubbandInfo,
    lcg: &mut Lcg,
    out: &mut [f32; 1024],
    skip: F,
) where
    F: Fn(usize, usize) -> bool,
{
    out.fill(0.0);

    let bands = ics.bands(sbinfo);

    let mut w = 0;

    for g in 0..ics.info.window_groups {
        let group_len = ics.info.group_len[g];

        for sfb in 0..ics.info.max_sfb {
            if ics.is_zero(g, sfb) || ics.is_intensity(g, sfb) || skip(g, sfb) {
                continue;
            }

            let noise = ics.is_noise(g, sfb);

            let scale =
                if noise { get_scale(ics.sf[g][sfb]) } else { get_scale(ics.sf[g][sfb] - 100) };

            for win in w..w + group_len {
                let range = win * 128 + bands[sfb]..win * 128 + bands[sfb + 1];

                if noise {
                    fill_noise(lcg, scale, &mut out[range]);
                }
                else {
                    for (o, &q) in out[range.clone()].iter_mut().zip(&ics.quant[range]) {
                        *o = iquant(q) * scale;
                    }
                }
            }
        }

        w += group_len;
    }
}

/// Perceptual noise substitution (ISO/IEC 14496-3, 4.6.13.3). Fills a band with random values of
/// unit energy times the band's scale.
fn fill_noise(lcg: &mut Lcg, scale: f32, dst: &mut [f32]) {
    let mut energy = 0.0;

    for spec in dst.iter_mut() {
        // Only the upper 16 bits of the generator output are used.
        *spec = f32::from((lcg.next() >> 16) as i16);
        energy += *spec * *spec;
    }

    if energy > 0.0 {
        let scale = scale / energy.sqrt();

        for spec in dst.iter_mut() {
            *spec *= scale;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aac::ics::{IcsInfo, NOISE_HCB};

    fn long_ics(max_sfb: usize) -> Box<Ics> {
        Box::new(Ics {
            info: IcsInfo { max_sfb, ..Default::default() },
            global_gain: 100,
            sfb_cb: [[0; MAX_SFBS]; MAX_WINDOWS],
            sf: [[0; MAX_SFBS]; MAX_WINDOWS],
            pulse: None,
            tns: None,
            quant: [0; 1024],
        })
    }

    #[test]
    fn verify_iquant() {
        assert_eq!(iquant(0), 0.0);
        assert_eq!(iquant(1), 1.0);
        assert!((iquant(-8) + 16.0).abs() < 1e-4);
        assert!((iquant(8191) - 165113.5).abs() < 0.5);
        assert!((iquant(8200) - f32::powf(8200.0, 4.0 / 3.0)).abs() < 0.5);
    }

    #[test]
    fn verify_dequantize_band() {
        let sbinfo = GASubbandInfo::find(44100);

        let mut ics = long_ics(2);
        ics.sfb_cb[0][1] = 1;
        ics.sf[0][1] = 100 + 56;
        ics.quant[4] = 1;
        ics.quant[5] = -1;
        ics.quant[6] = 2;

        let mut lcg = Lcg::new(Lcg::SEED);
        let mut out = [1f32; 1024];

        dequantize(&ics, &sbinfo, &mut lcg, &mut out);

        let expected = [0.0, 0.0, 0.0, 0.0, 1.0, -1.0, 2.5198421, 0.0];

        for (&x, &y) in out[..8].iter().zip(expected.iter()) {
            assert!((x - y).abs() < 1e-5);
        }

        assert!(out[8..].iter().all(|&x| x == 0.0));
    }

    #[test]
    fn verify_noise_energy() {
        let sbinfo = GASubbandInfo::find(44100);

        let mut ics = long_ics(1);
        ics.sfb_cb[0][0] = NOISE_HCB;
        ics.sf[0][0] = 56 + 8;

        let mut lcg = Lcg::new(Lcg::SEED);
        let mut out = [0f32; 1024];

        dequantize(&ics, &sbinfo, &mut lcg, &mut out);

        // The band has an energy equal to the square of its scale, 2^(0.25 * 8) = 4.
        let energy: f32 = out[..4].iter().map(|x| x * x).sum();
        assert!((energy - 16.0).abs() < 1e-3);
    }

    #[test]
    fn verify_shared_noise_draws_once() {
        let sbinfo = GASubbandInfo::find(44100);

        let mut ics = long_ics(2);
        ics.sfb_cb[0][..2].fill(NOISE_HCB);
        ics.sf[0][..2].fill(56);

        let mut pair = ChannelPair {
            common_window: true,
            ms_mask_present: 1,
            ms_used: [[false; MAX_SFBS]; MAX_WINDOWS],
            ics: [ics.clone(), ics],
        };
        pair.ms_used[0][0] = true;

        let mut lcg = Lcg::new(Lcg::SEED);
        let mut left = [0f32; 1024];
        let mut right = [0f32; 1024];

        dequantize_pair(&pair, &sbinfo, &mut lcg, &mut left, &mut right);

        // The shared band is left to the stereo stage. The next band is generated normally.
        assert!(right[..4].iter().all(|&x| x == 0.0));
        assert!(right[4..8].iter().any(|&x| x != 0.0));

        // Three bands of four lines each were drawn from the generator.
        let mut expected = Lcg::new(Lcg::SEED);

        for _ in 0..12 {
            expected.next();
        }

        assert_eq!(lcg.next(), expected.next());
    }
}
