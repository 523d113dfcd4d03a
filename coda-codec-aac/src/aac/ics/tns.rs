// Coda
// Copyright (c) 2026 The Project Coda Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::f32::consts;

use coda_core::errors::Result;
use coda_core::io::ReadBitsLtr;

use crate::aac::common::*;
use crate::aac::ics::IcsInfo;

/// Maximum filter order for AAC-LC long and short windows (ISO/IEC 14496-3, Table 4.156).
const TNS_MAX_ORDER_LONG: usize = 12;
const TNS_MAX_ORDER_SHORT: usize = 7;

const TNS_MAX_LONG_BANDS: [usize; 12] = [31, 31, 34, 40, 42, 51, 46, 46, 42, 42, 42, 39];
const TNS_MAX_SHORT_BANDS: [usize; 12] = [9, 9, 10, 14, 14, 14, 14, 14, 14, 14, 14, 14];

#[derive(Copy, Clone, Debug, Default)]
struct TnsFilter {
    /// Length of the filtered region in scale factor bands.
    length: usize,
    order: usize,
    /// Filter downwards in frequency if true.
    downward: bool,
    /// Direct-form LPC coefficients.
    lpc: [f32; TNS_MAX_ORDER_LONG],
}

impl TnsFilter {
    fn read<B: ReadBitsLtr>(
        bs: &mut B,
        long_win: bool,
        coef_res: bool,
        max_order: usize,
    ) -> Result<Self> {
        let mut filter = TnsFilter {
            length: bs.read_bits_leq32(if long_win { 6 } else { 4 })? as usize,
            order: bs.read_bits_leq32(if long_win { 5 } else { 3 })? as usize,
            ..Default::default()
        };

        validate!(filter.order <= max_order);

        if filter.order == 0 {
            return Ok(filter);
        }

        filter.downward = bs.read_bool()?;

        let coef_compress = bs.read_bool()?;

        // The transmitted resolution is 4 bits if coef_res is set, 3 bits otherwise. Compression
        // drops the most significant bit.
        let coef_bits = if coef_res { 4 } else { 3 } - u32::from(coef_compress);

        // Inverse quantization factors for the positive and negative halves of the range.
        let fac_base = if coef_res { 8.0 } else { 4.0 };
        let iqfac = (fac_base - 0.5) / consts::FRAC_PI_2;
        let iqfac_m = (fac_base + 0.5) / consts::FRAC_PI_2;

        let mut parcor = [0f32; TNS_MAX_ORDER_LONG];

        for k in parcor[..filter.order].iter_mut() {
            let c = bs.read_bits_leq32_signed(coef_bits)? as f32;
            *k = (if c >= 0.0 { c / iqfac } else { c / iqfac_m }).sin();
        }

        // Convert the reflection (PARCOR) coefficients to direct-form LPC coefficients.
        let mut tmp = [0f32; TNS_MAX_ORDER_LONG];

        for m in 1..=filter.order {
            for i in 1..m {
                tmp[i] = filter.lpc[i - 1] + parcor[m - 1] * filter.lpc[m - i - 1];
            }

            filter.lpc[..(m - 1)].copy_from_slice(&tmp[1..m]);
            filter.lpc[m - 1] = parcor[m - 1];
        }

        Ok(filter)
    }
}

/// Temporal noise shaping data of one individual channel stream.
#[derive(Copy, Clone, Debug)]
pub struct Tns {
    n_filt: [usize; MAX_WINDOWS],
    filters: [[TnsFilter; 4]; MAX_WINDOWS],
}

impl Tns {
    pub fn read<B: ReadBitsLtr>(bs: &mut B, info: &IcsInfo) -> Result<Option<Self>> {
        let tns_data_present = bs.read_bool()?;

        if !tns_data_present {
            return Ok(None);
        }

        let long_win = info.is_long();

        let max_order = if long_win { TNS_MAX_ORDER_LONG } else { TNS_MAX_ORDER_SHORT };

        let mut tns =
            Tns { n_filt: [0; MAX_WINDOWS], filters: [[Default::default(); 4]; MAX_WINDOWS] };

        for w in 0..info.num_windows {
            let n_filt = bs.read_bits_leq32(if long_win { 2 } else { 1 })? as usize;

            let coef_res = if n_filt != 0 { bs.read_bool()? } else { false };

            for filter in tns.filters[w][..n_filt].iter_mut() {
                *filter = TnsFilter::read(bs, long_win, coef_res, max_order)?;
            }

            tns.n_filt[w] = n_filt;
        }

        Ok(Some(tns))
    }

    /// Applies the all-pole inverse filters to the dequantized spectrum of each window.
    pub fn synth(&self, info: &IcsInfo, bands: &[usize], rate_idx: usize, coeffs: &mut [f32]) {
        let max_bands = if info.is_long() {
            TNS_MAX_LONG_BANDS[rate_idx]
        }
        else {
            TNS_MAX_SHORT_BANDS[rate_idx]
        };

        let max_bands = max_bands.min(info.max_sfb);

        for w in 0..info.num_windows {
            let spec = &mut coeffs[w * 128..];

            // Filters are listed from the top of the spectrum downwards.
            let mut bottom = bands.len() - 1;

            for filter in &self.filters[w][..self.n_filt[w]] {
                let top = bottom;

                bottom = top.saturating_sub(filter.length);

                let order = filter.order;

                if order == 0 {
                    continue;
                }

                let start = bands[bottom.min(max_bands)];
                let end = bands[top.min(max_bands)];

                let lpc = &filter.lpc;

                if !filter.downward {
                    for (m, i) in (start..end).enumerate() {
                        for j in 0..order.min(m) {
                            spec[i] -= spec[i - j - 1] * lpc[j];
                        }
                    }
                }
                else {
                    for (m, i) in (start..end).rev().enumerate() {
                        for j in 0..order.min(m) {
                            spec[i] -= spec[i + j + 1] * lpc[j];
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aac::common::WindowSequence;
    use coda_core::io::BitReaderLtr;

    #[test]
    fn verify_tns_first_order_filter() {
        let info = IcsInfo {
            window_sequence: WindowSequence::OnlyLong,
            num_windows: 1,
            window_groups: 1,
            max_sfb: 3,
            ..Default::default()
        };

        // present, n_filt 1, coef_res 1, length 3, order 1, upward, no compression, coef 0100
        // 1 01 1 000011 00001 0 0 0100
        let buf = [0b1011_0000, 0b1100_0010, 0b0010_0000];
        let mut bs = BitReaderLtr::new(&buf);

        let tns = Tns::read(&mut bs, &info).unwrap().unwrap();

        assert_eq!(bs.bits_read(), 21);

        let bands = [0, 4, 8, 12];
        let mut coeffs = [0f32; 1024];
        coeffs[0] = 1.0;

        tns.synth(&info, &bands, 4, &mut coeffs);

        // A first-order all-pole filter turns an impulse into a geometric sequence.
        let k = (4.0f32 / (7.5 / consts::FRAC_PI_2)).sin();

        assert!((coeffs[1] + k).abs() < 1e-6);
        assert!((coeffs[2] - k * k).abs() < 1e-6);
        assert!((coeffs[11] + k.powi(11)).abs() < 1e-6);

        // The filter ends at the top of the last coded band.
        assert_eq!(coeffs[12], 0.0);
    }

    #[test]
    fn verify_tns_order_limit() {
        let info = IcsInfo {
            window_sequence: WindowSequence::EightShort,
            num_windows: 8,
            window_groups: 1,
            max_sfb: 2,
            ..Default::default()
        };

        // present, n_filt 1, coef_res 0, length 1, order 7 is allowed.
        // 1 1 0 0001 111 ...
        let buf = [0b1100_0011, 0b1100_0000, 0, 0, 0, 0, 0, 0, 0, 0];
        let mut bs = BitReaderLtr::new(&buf);

        assert!(Tns::read(&mut bs, &info).is_ok());
    }
}
