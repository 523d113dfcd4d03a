// Coda
// Copyright (c) 2026 The Project Coda Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The output assembler: interleaves rendered channels into a `PcmBlock`.

use coda_core::audio::{Layout, PcmBlock};

/// Converts a normalized sample to a signed 16-bit sample, rounding to nearest and saturating.
#[inline(always)]
fn to_i16(sample: f32) -> i16 {
    let scaled = (sample * 32768.0).round();

    if scaled >= 32767.0 {
        i16::MAX
    }
    else if scaled <= -32768.0 {
        i16::MIN
    }
    else {
        scaled as i16
    }
}

/// Interleaves the first `frames` samples of each channel buffer, in the order given, into a new
/// `PcmBlock`.
pub fn assemble(bufs: &[Vec<f32>], frames: usize, layout: &Layout, sample_rate: u32) -> PcmBlock {
    debug_assert_eq!(bufs.len(), layout.len());

    let num_channels = bufs.len();
    let mut samples = vec![0i16; frames * num_channels];

    for (ch, buf) in bufs.iter().enumerate() {
        for (frame, &s) in buf[..frames].iter().enumerate() {
            samples[frame * num_channels + ch] = to_i16(s);
        }
    }

    PcmBlock::new(sample_rate, layout.clone(), samples)
}

#[cfg(test)]
mod tests {
    use super::*;
    use coda_core::audio::Position;
    use smallvec::smallvec;

    #[test]
    fn verify_to_i16() {
        assert_eq!(to_i16(0.0), 0);
        assert_eq!(to_i16(0.5), 16384);
        assert_eq!(to_i16(-1.0), -32768);
        assert_eq!(to_i16(1.0), 32767);
        assert_eq!(to_i16(3.0), 32767);
        assert_eq!(to_i16(-3.0), -32768);
        assert_eq!(to_i16(1.4 / 32768.0), 1);
        assert_eq!(to_i16(-1.6 / 32768.0), -2);
    }

    #[test]
    fn verify_assemble_interleaves() {
        let layout: Layout = smallvec![Position::FRONT_LEFT, Position::FRONT_RIGHT];
        let bufs = vec![vec![0.25, 0.5, 0.75], vec![-0.25, -0.5, -0.75]];

        let block = assemble(&bufs, 2, &layout, 48000);

        assert_eq!(block.num_channels(), 2);
        assert_eq!(block.frames(), 2);
        assert_eq!(block.sample_rate(), 48000);
        assert_eq!(block.samples(), &[8192, -8192, 16384, -16384]);
    }
}
