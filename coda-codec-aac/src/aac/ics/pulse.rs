// Coda
// Copyright (c) 2026 The Project Coda Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use coda_core::errors::Result;
use coda_core::io::ReadBitsLtr;

use crate::aac::common::validate;

/// Pulse data. Up to 4 pulses add small magnitudes to individual quantized spectral lines of a
/// long window.
#[derive(Clone, Copy, Debug)]
pub struct Pulse {
    number_pulse: usize,
    pulse_start_sfb: usize,
    pulse_offset: [u8; 4],
    pulse_amp: [u8; 4],
}

impl Pulse {
    pub fn read<B: ReadBitsLtr>(bs: &mut B) -> Result<Option<Self>> {
        let pulse_data_present = bs.read_bool()?;

        if !pulse_data_present {
            return Ok(None);
        }

        let number_pulse = bs.read_bits_leq32(2)? as usize + 1;
        let pulse_start_sfb = bs.read_bits_leq32(6)? as usize;

        let mut pulse_offset: [u8; 4] = [0; 4];
        let mut pulse_amp: [u8; 4] = [0; 4];

        for i in 0..number_pulse {
            pulse_offset[i] = bs.read_bits_leq32(5)? as u8;
            pulse_amp[i] = bs.read_bits_leq32(4)? as u8;
        }

        Ok(Some(Self { number_pulse, pulse_start_sfb, pulse_offset, pulse_amp }))
    }

    /// Checks that every pulse lands within the spectrum of the coded bands.
    pub fn validate(&self, bands: &[usize], max_sfb: usize) -> Result<()> {
        validate!(self.pulse_start_sfb < max_sfb);

        let mut k = bands[self.pulse_start_sfb];

        for &offset in &self.pulse_offset[..self.number_pulse] {
            k += usize::from(offset);
        }

        validate!(k < bands[max_sfb]);

        Ok(())
    }

    /// Adds the pulses to the quantized spectrum. The magnitude of a line grows away from zero,
    /// a zero line takes the sign of a positive pulse.
    pub fn apply(&self, bands: &[usize], quant: &mut [i16]) {
        let mut k = bands[self.pulse_start_sfb];

        for pno in 0..self.number_pulse {
            k += usize::from(self.pulse_offset[pno]);

            let amp = i16::from(self.pulse_amp[pno]);

            if quant[k] < 0 {
                quant[k] -= amp;
            }
            else {
                quant[k] += amp;
            }
        }
    }
}
