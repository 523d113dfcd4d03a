// Coda
// Copyright (c) 2026 The Project Coda Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Joint-stereo tools of a channel pair: mid/side and intensity stereo (ISO/IEC 14496-3,
//! 4.6.8).

use crate::aac::common::*;
use crate::aac::dequant::{get_intensity_scale, get_scale};
use crate::aac::element::ChannelPair;

/// Applies joint-stereo decoding to the dequantized spectra of a channel pair.
pub fn apply(
    pair: &ChannelPair,
    sbinfo: &GASubbandInfo,
    left: &mut [f32; 1024],
    right: &mut [f32; 1024],
) {
    if !pair.common_window {
        return;
    }

    let [ics0, ics1] = &pair.ics;

    let info = &ics0.info;
    let bands = ics0.bands(sbinfo);

    let mut w = 0;

    for g in 0..info.window_groups {
        let group_len = info.group_len[g];

        for sfb in 0..info.max_sfb {
            let ms_used = pair.ms_used[g][sfb];

            for win in w..w + group_len {
                let start = win * 128 + bands[sfb];
                let end = win * 128 + bands[sfb + 1];

                let l = &mut left[start..end];
                let r = &mut right[start..end];

                if ics1.is_intensity(g, sfb) {
                    // The mask bit inverts the direction of intensity bands.
                    let invert = pair.ms_mask_present == 1 && ms_used;
                    let dir = if ics1.intensity_dir(g, sfb) != invert { 1.0 } else { -1.0 };

                    let scale = dir * get_intensity_scale(ics1.sf[g][sfb]);

                    for (l, r) in l.iter().zip(r.iter_mut()) {
                        *r = scale * l;
                    }
                }
                else if pair.shares_noise(g, sfb) {
                    // The right channel's band was left empty by the dequantizer.
                    let scale = get_scale(ics1.sf[g][sfb]) / get_scale(ics0.sf[g][sfb]);

                    for (l, r) in l.iter().zip(r.iter_mut()) {
                        *r = scale * l;
                    }
                }
                else if ics0.is_noise(g, sfb) || ics1.is_noise(g, sfb) {
                    // Noise bands are never mid/side coded.
                }
                else if ms_used {
                    for (m, s) in l.iter_mut().zip(r.iter_mut()) {
                        let side = *s;
                        *s = *m - side;
                        *m += side;
                    }
                }
            }
        }

        w += group_len;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aac::ics::{Ics, IcsInfo, INTENSITY_HCB, INTENSITY_HCB2, NOISE_HCB};

    fn pair(max_sfb: usize, ms_mask_present: u8) -> ChannelPair {
        let ics = Box::new(Ics {
            info: IcsInfo { max_sfb, ..Default::default() },
            global_gain: 100,
            sfb_cb: [[1; MAX_SFBS]; MAX_WINDOWS],
            sf: [[100; MAX_SFBS]; MAX_WINDOWS],
            pulse: None,
            tns: None,
            quant: [0; 1024],
        });

        ChannelPair {
            common_window: true,
            ms_mask_present,
            ms_used: [[false; MAX_SFBS]; MAX_WINDOWS],
            ics: [ics.clone(), ics],
        }
    }

    #[test]
    fn verify_mid_side() {
        let sbinfo = GASubbandInfo::find(48000);

        let mut pair = pair(2, 1);
        pair.ms_used[0][1] = true;

        let mut left = [0f32; 1024];
        let mut right = [0f32; 1024];

        left[0] = 1.0;
        right[0] = 0.5;
        left[4] = 1.0;
        right[4] = 0.25;

        apply(&pair, &sbinfo, &mut left, &mut right);

        assert_eq!((left[0], right[0]), (1.0, 0.5));
        assert_eq!((left[4], right[4]), (1.25, 0.75));
    }

    #[test]
    fn verify_intensity() {
        let sbinfo = GASubbandInfo::find(48000);

        let mut pair = pair(2, 1);
        pair.ics[1].sfb_cb[0][0] = INTENSITY_HCB;
        pair.ics[1].sf[0][0] = 4;
        pair.ics[1].sfb_cb[0][1] = INTENSITY_HCB2;
        pair.ics[1].sf[0][1] = 0;

        let mut left = [0f32; 1024];
        let mut right = [0f32; 1024];

        left[0] = 1.0;
        left[4] = 1.0;

        apply(&pair, &sbinfo, &mut left, &mut right);

        assert_eq!(right[0], 0.5);
        assert_eq!(right[4], -1.0);

        // The mask bit inverts the direction.
        pair.ms_used[0][0] = true;

        apply(&pair, &sbinfo, &mut left, &mut right);

        assert_eq!(right[0], -0.5);
        assert_eq!(left[0], 1.0);
    }

    #[test]
    fn verify_shared_noise() {
        let sbinfo = GASubbandInfo::find(48000);

        let mut pair = pair(1, 1);
        pair.ms_used[0][0] = true;
        pair.ics[0].sfb_cb[0][0] = NOISE_HCB;
        pair.ics[1].sfb_cb[0][0] = NOISE_HCB;
        pair.ics[1].sf[0][0] = 104;

        let mut left = [0f32; 1024];
        let mut right = [0f32; 1024];

        left[..4].copy_from_slice(&[0.5, -0.25, 0.125, 1.0]);

        apply(&pair, &sbinfo, &mut left, &mut right);

        assert_eq!(right[..4], [1.0, -0.5, 0.25, 2.0]);
        assert_eq!(left[..4], [0.5, -0.25, 0.125, 1.0]);
    }
}
