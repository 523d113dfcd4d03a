// Coda
// Copyright (c) 2026 The Project Coda Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use coda_core::errors::{Error, Result};

use crate::common::sample_rate_index;

pub const MAX_WINDOWS: usize = 8;
pub const MAX_SFBS: usize = 64;

/// The window sequence of an individual channel stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WindowSequence {
    OnlyLong = 0,
    LongStart = 1,
    EightShort = 2,
    LongStop = 3,
}

impl WindowSequence {
    pub fn from_bits(bits: u32) -> WindowSequence {
        match bits & 0x3 {
            0 => WindowSequence::OnlyLong,
            1 => WindowSequence::LongStart,
            2 => WindowSequence::EightShort,
            _ => WindowSequence::LongStop,
        }
    }

    /// Checks that this window sequence may follow the window sequence `prev` of the previous
    /// frame (ISO/IEC 14496-3, 4.6.11.3.2). A sequence following a stream start or reset, where
    /// `prev` is `None`, is unconstrained.
    pub fn check_transition(self, prev: Option<WindowSequence>) -> Result<()> {
        use WindowSequence::*;

        let valid = match prev {
            None => true,
            Some(OnlyLong) | Some(LongStop) => matches!(self, OnlyLong | LongStart),
            Some(LongStart) | Some(EightShort) => matches!(self, EightShort | LongStop),
        };

        if valid {
            Ok(())
        }
        else {
            log::error!("invalid window sequence transition {:?} -> {:?}", prev, self);
            Err(Error::InvalidWindowSequenceTransition {
                prev: prev.map_or(0, |seq| seq as u8),
                next: self as u8,
            })
        }
    }
}

pub const SWB_OFFSET_48K_LONG: [usize; 49 + 1] = [
    0, 4, 8, 12, 16, 20, 24, 28, 32, 36, 40, 48, 56, 64, 72, 80, 88, 96, 108, 120, 132, 144, 160,
    176, 196, 216, 240, 264, 292, 320, 352, 384, 416, 448, 480, 512, 544, 576, 608, 640, 672, 704,
    736, 768, 800, 832, 864, 896, 928, 1024,
];

pub const SWB_OFFSET_48K_SHORT: [usize; 14 + 1] =
    [0, 4, 8, 12, 16, 20, 28, 36, 44, 56, 68, 80, 96, 112, 128];

pub const SWB_OFFSET_32K_LONG: [usize; 51 + 1] = [
    0, 4, 8, 12, 16, 20, 24, 28, 32, 36, 40, 48, 56, 64, 72, 80, 88, 96, 108, 120, 132, 144, 160,
    176, 196, 216, 240, 264, 292, 320, 352, 384, 416, 448, 480, 512, 544, 576, 608, 640, 672, 704,
    736, 768, 800, 832, 864, 896, 928, 960, 992, 1024,
];

pub const SWB_OFFSET_8K_LONG: [usize; 40 + 1] = [
    0, 12, 24, 36, 48, 60, 72, 84, 96, 108, 120, 132, 144, 156, 172, 188, 204, 220, 236, 252, 268,
    288, 308, 328, 348, 372, 396, 420, 448, 476, 508, 544, 580, 620, 664, 712, 764, 820, 880, 944,
    1024,
];

pub const SWB_OFFSET_8K_SHORT: [usize; 15 + 1] =
    [0, 4, 8, 12, 16, 20, 24, 28, 36, 44, 52, 60, 72, 88, 108, 128];

pub const SWB_OFFSET_16K_LONG: [usize; 43 + 1] = [
    0, 8, 16, 24, 32, 40, 48, 56, 64, 72, 80, 88, 100, 112, 124, 136, 148, 160, 172, 184, 196, 212,
    228, 244, 260, 280, 300, 320, 344, 368, 396, 424, 456, 492, 532, 572, 616, 664, 716, 772, 832,
    896, 960, 1024,
];

pub const SWB_OFFSET_16K_SHORT: [usize; 15 + 1] =
    [0, 4, 8, 12, 16, 20, 24, 28, 32, 40, 48, 60, 72, 88, 108, 128];

pub const SWB_OFFSET_24K_LONG: [usize; 47 + 1] = [
    0, 4, 8, 12, 16, 20, 24, 28, 32, 36, 40, 44, 52, 60, 68, 76, 84, 92, 100, 108, 116, 124, 136,
    148, 160, 172, 188, 204, 220, 240, 260, 284, 308, 336, 364, 396, 432, 468, 508, 552, 600, 652,
    704, 768, 832, 896, 960, 1024,
];

pub const SWB_OFFSET_24K_SHORT: [usize; 15 + 1] =
    [0, 4, 8, 12, 16, 20, 24, 28, 36, 44, 52, 64, 76, 92, 108, 128];

pub const SWB_OFFSET_64K_LONG: [usize; 47 + 1] = [
    0, 4, 8, 12, 16, 20, 24, 28, 32, 36, 40, 44, 48, 52, 56, 64, 72, 80, 88, 100, 112, 124, 140,
    156, 172, 192, 216, 240, 268, 304, 344, 384, 424, 464, 504, 544, 584, 624, 664, 704, 744, 784,
    824, 864, 904, 944, 984, 1024,
];

pub const SWB_OFFSET_64K_SHORT: [usize; 12 + 1] =
    [0, 4, 8, 12, 16, 20, 24, 32, 40, 48, 64, 92, 128];

pub const SWB_OFFSET_96K_LONG: [usize; 41 + 1] = [
    0, 4, 8, 12, 16, 20, 24, 28, 32, 36, 40, 44, 48, 52, 56, 64, 72, 80, 88, 96, 108, 120, 132,
    144, 156, 172, 188, 212, 240, 276, 320, 384, 448, 512, 576, 640, 704, 768, 832, 896, 960, 1024,
];

/// A Linear Congruential Generator (LCG) pseudo-random number generator from Numerical Recipes.
#[derive(Clone)]
pub struct Lcg {
    state: u32,
}

impl Lcg {
    /// The seed of the noise generator at the start of a stream.
    pub const SEED: u32 = 0x1f2e3d4c;

    pub fn new(state: u32) -> Self {
        Lcg { state }
    }

    #[inline(always)]
    pub fn next(&mut self) -> i32 {
        self.state = self.state.wrapping_mul(1664525).wrapping_add(1013904223);
        self.state as i32
    }
}

/// Scale factor band boundaries for a sample rate.
#[derive(Clone, Copy, Debug)]
pub struct GASubbandInfo {
    /// Index of the band tables (0 to 11) for per-rate constants such as TNS limits.
    pub rate_idx: usize,
    pub long_bands: &'static [usize],
    pub short_bands: &'static [usize],
}

impl GASubbandInfo {
    pub fn find(srate: u32) -> GASubbandInfo {
        let rate_idx = sample_rate_index(srate);
        let (long_bands, short_bands) = AAC_SUBBAND_INFO[rate_idx];
        GASubbandInfo { rate_idx, long_bands, short_bands }
    }

    /// Gets the band boundaries for long or short windows.
    pub fn bands(&self, long_win: bool) -> &'static [usize] {
        if long_win {
            self.long_bands
        }
        else {
            self.short_bands
        }
    }
}

const AAC_SUBBAND_INFO: [(&[usize], &[usize]); 12] = [
    (&SWB_OFFSET_96K_LONG, &SWB_OFFSET_64K_SHORT), // 96K
    (&SWB_OFFSET_96K_LONG, &SWB_OFFSET_64K_SHORT), // 88.2K
    (&SWB_OFFSET_64K_LONG, &SWB_OFFSET_64K_SHORT), // 64K
    (&SWB_OFFSET_48K_LONG, &SWB_OFFSET_48K_SHORT), // 48K
    (&SWB_OFFSET_48K_LONG, &SWB_OFFSET_48K_SHORT), // 44.1K
    (&SWB_OFFSET_32K_LONG, &SWB_OFFSET_48K_SHORT), // 32K
    (&SWB_OFFSET_24K_LONG, &SWB_OFFSET_24K_SHORT), // 24K
    (&SWB_OFFSET_24K_LONG, &SWB_OFFSET_24K_SHORT), // 22.05K
    (&SWB_OFFSET_16K_LONG, &SWB_OFFSET_16K_SHORT), // 16K
    (&SWB_OFFSET_16K_LONG, &SWB_OFFSET_16K_SHORT), // 12K
    (&SWB_OFFSET_16K_LONG, &SWB_OFFSET_16K_SHORT), // 11.025K
    (&SWB_OFFSET_8K_LONG, &SWB_OFFSET_8K_SHORT),   // 8K
];

macro_rules! validate {
    ($a:expr) => {
        if !$a {
            log::error!("check failed at {}:{}", file!(), line!());
            return coda_core::errors::decode_error("aac: invalid data");
        }
    };
}

pub(crate) use validate;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_window_sequence_transitions() {
        use WindowSequence::*;

        assert!(EightShort.check_transition(None).is_ok());
        assert!(LongStart.check_transition(Some(OnlyLong)).is_ok());
        assert!(EightShort.check_transition(Some(LongStart)).is_ok());
        assert!(EightShort.check_transition(Some(EightShort)).is_ok());
        assert!(LongStop.check_transition(Some(EightShort)).is_ok());
        assert!(OnlyLong.check_transition(Some(LongStop)).is_ok());

        assert_eq!(
            EightShort.check_transition(Some(OnlyLong)),
            Err(Error::InvalidWindowSequenceTransition { prev: 0, next: 2 })
        );
        assert_eq!(
            OnlyLong.check_transition(Some(EightShort)),
            Err(Error::InvalidWindowSequenceTransition { prev: 2, next: 0 })
        );
    }

    #[test]
    fn verify_band_tables() {
        for &(long, short) in AAC_SUBBAND_INFO.iter() {
            assert_eq!(long.last(), Some(&1024));
            assert_eq!(short.last(), Some(&128));
            assert!(long.windows(2).all(|w| w[0] < w[1]));
            assert!(short.windows(2).all(|w| w[0] < w[1]));
        }

        assert_eq!(GASubbandInfo::find(44100).long_bands.len(), 50);
        assert_eq!(GASubbandInfo::find(8000).rate_idx, 11);
    }
}
