// Coda
// Copyright (c) 2026 The Project Coda Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Huffman codebooks and constant tables of spectral band replication (ISO/IEC 14496-3, Annex
//! 4.A.6).

use lazy_static::lazy_static;

use coda_core::dsp::Complex;
use coda_core::io::vlc::{Codebook, CodebookBuilder, Entry8x16};

use crate::aac::common::Lcg;

/// A Huffman codebook for envelope or noise floor deltas. The decoded value is the delta plus
/// `lav`.
pub struct SbrCodebook {
    pub codebook: Codebook<Entry8x16>,
    pub lav: i32,
}

impl SbrCodebook {
    fn new(codes: &[u32], lens: &[u8], lav: i32) -> Self {
        let values: Vec<u8> = (0..codes.len() as u8).collect();
        let codebook = CodebookBuilder::new().bits_per_read(8).make(codes, lens, &values);
        SbrCodebook { codebook, lav }
    }
}

const T_ENV_1_5_CODES: [u32; 121] = [
    0x3ffd6, 0x3ffd7, 0x3ffd8, 0x3ffd9, 0x3ffda, 0x3ffdb, 0x7ffb8, 0x7ffb9, 0x7ffba, 0x7ffbb,
    0x7ffbc, 0x7ffbd, 0x7ffbe, 0x7ffbf, 0x7ffc0, 0x7ffc1, 0x7ffc2, 0x7ffc3, 0x7ffc4, 0x7ffc5,
    0x7ffc6, 0x7ffc7, 0x7ffc8, 0x7ffc9, 0x7ffca, 0x7ffcb, 0x7ffcc, 0x7ffcd, 0x7ffce, 0x7ffcf,
    0x7ffd0, 0x7ffd1, 0x7ffd2, 0x7ffd3, 0x1ffe6, 0x3ffd4, 0x0fff0, 0x1ffe9, 0x3ffd5, 0x1ffe7,
    0x0fff1, 0x0ffec, 0x0ffed, 0x0ffee, 0x07ff4, 0x03ff9, 0x03ff7, 0x01ffa, 0x01ff9, 0x00ffb,
    0x007fc, 0x003fc, 0x001fd, 0x000fd, 0x0007d, 0x0003d, 0x0001d, 0x0000d, 0x00005, 0x00001,
    0x00000, 0x00004, 0x0000c, 0x0001c, 0x0003c, 0x0007c, 0x000fc, 0x001fc, 0x003fd, 0x00ffa,
    0x01ff8, 0x03ff6, 0x03ff8, 0x07ff5, 0x0ffef, 0x1ffe8, 0x0fff2, 0x7ffd4, 0x7ffd5, 0x7ffd6,
    0x7ffd7, 0x7ffd8, 0x7ffd9, 0x7ffda, 0x7ffdb, 0x7ffdc, 0x7ffdd, 0x7ffde, 0x7ffdf, 0x7ffe0,
    0x7ffe1, 0x7ffe2, 0x7ffe3, 0x7ffe4, 0x7ffe5, 0x7ffe6, 0x7ffe7, 0x7ffe8, 0x7ffe9, 0x7ffea,
    0x7ffeb, 0x7ffec, 0x7ffed, 0x7ffee, 0x7ffef, 0x7fff0, 0x7fff1, 0x7fff2, 0x7fff3, 0x7fff4,
    0x7fff5, 0x7fff6, 0x7fff7, 0x7fff8, 0x7fff9, 0x7fffa, 0x7fffb, 0x7fffc, 0x7fffd, 0x7fffe,
    0x7ffff,
];

const T_ENV_1_5_LENS: [u8; 121] = [
    18, 18, 18, 18, 18, 18, 19, 19, 19, 19, 19, 19, 19, 19, 19, 19, 19, 19, 19, 19, 19, 19, 19, 19,
    19, 19, 19, 19, 19, 19, 19, 19, 19, 19, 17, 18, 16, 17, 18, 17, 16, 16, 16, 16, 15, 14, 14, 13,
    13, 12, 11, 10, 9, 8, 7, 6, 5, 4, 3, 2, 2, 3, 4, 5, 6, 7, 8, 9, 10, 12, 13, 14, 14, 15, 16, 17,
    16, 19, 19, 19, 19, 19, 19, 19, 19, 19, 19, 19, 19, 19, 19, 19, 19, 19, 19, 19, 19, 19, 19, 19,
    19, 19, 19, 19, 19, 19, 19, 19, 19, 19, 19, 19, 19, 19, 19, 19, 19, 19, 19, 19, 19,
];

const F_ENV_1_5_CODES: [u32; 121] = [
    0x7ffe7, 0x7ffe8, 0xfffd2, 0xfffd3, 0xfffd4, 0xfffd5, 0xfffd6, 0xfffd7, 0xfffd8, 0x7ffda,
    0xfffd9, 0xfffda, 0xfffdb, 0xfffdc, 0x7ffdb, 0xfffdd, 0x7ffdc, 0x7ffdd, 0xfffde, 0x3ffe4,
    0xfffdf, 0xfffe0, 0xfffe1, 0x7ffde, 0xfffe2, 0xfffe3, 0xfffe4, 0x7ffdf, 0xfffe5, 0x7ffe0,
    0x3ffe8, 0x7ffe1, 0x3ffe0, 0x3ffe9, 0x1ffef, 0x3ffe5, 0x1ffec, 0x1ffed, 0x1ffee, 0x0fff4,
    0x0fff3, 0x0fff0, 0x07ff7, 0x07ff6, 0x03ffa, 0x01ffa, 0x01ff9, 0x00ffa, 0x00ff8, 0x007f9,
    0x003fb, 0x001fc, 0x001fa, 0x000fb, 0x0007c, 0x0003c, 0x0001c, 0x0000c, 0x00005, 0x00001,
    0x00000, 0x00004, 0x0000d, 0x0001d, 0x0003d, 0x000fa, 0x000fc, 0x001fb, 0x003fa, 0x007f8,
    0x007fa, 0x007fb, 0x00ff9, 0x00ffb, 0x01ff8, 0x01ffb, 0x03ff8, 0x03ff9, 0x0fff1, 0x0fff2,
    0x1ffea, 0x1ffeb, 0x3ffe1, 0x3ffe2, 0x3ffea, 0x3ffe3, 0x3ffe6, 0x3ffe7, 0x3ffeb, 0xfffe6,
    0x7ffe2, 0xfffe7, 0xfffe8, 0xfffe9, 0xfffea, 0xfffeb, 0xfffec, 0x7ffe3, 0xfffed, 0xfffee,
    0xfffef, 0xffff0, 0x7ffe4, 0xffff1, 0x3ffec, 0xffff2, 0xffff3, 0x7ffe5, 0x7ffe6, 0xffff4,
    0xffff5, 0xffff6, 0xffff7, 0xffff8, 0xffff9, 0xffffa, 0xffffb, 0xffffc, 0xffffd, 0xffffe,
    0xfffff,
];

const F_ENV_1_5_LENS: [u8; 121] = [
    19, 19, 20, 20, 20, 20, 20, 20, 20, 19, 20, 20, 20, 20, 19, 20, 19, 19, 20, 18, 20, 20, 20, 19,
    20, 20, 20, 19, 20, 19, 18, 19, 18, 18, 17, 18, 17, 17, 17, 16, 16, 16, 15, 15, 14, 13, 13, 12,
    12, 11, 10, 9, 9, 8, 7, 6, 5, 4, 3, 2, 2, 3, 4, 5, 6, 8, 8, 9, 10, 11, 11, 11, 12, 12, 13, 13,
    14, 14, 16, 16, 17, 17, 18, 18, 18, 18, 18, 18, 18, 20, 19, 20, 20, 20, 20, 20, 20, 19, 20, 20,
    20, 20, 19, 20, 18, 20, 20, 19, 19, 20, 20, 20, 20, 20, 20, 20, 20, 20, 20, 20, 20,
];

const T_ENV_BAL_1_5_CODES: [u32; 49] = [
    0x0ffe4, 0x0ffe5, 0x0ffe6, 0x0ffe7, 0x0ffe8, 0x0ffe9, 0x0ffea, 0x0ffeb, 0x0ffec, 0x0ffed,
    0x0ffee, 0x0ffef, 0x0fff0, 0x0fff1, 0x0fff2, 0x0fff3, 0x0fff4, 0x0ffe2, 0x00ffc, 0x007fc,
    0x001fe, 0x0007e, 0x0001e, 0x00006, 0x00000, 0x00002, 0x0000e, 0x0003e, 0x000fe, 0x007fd,
    0x00ffd, 0x07ff0, 0x0ffe3, 0x0fff5, 0x0fff6, 0x0fff7, 0x0fff8, 0x0fff9, 0x0fffa, 0x1fff6,
    0x1fff7, 0x1fff8, 0x1fff9, 0x1fffa, 0x1fffb, 0x1fffc, 0x1fffd, 0x1fffe, 0x1ffff,
];

const T_ENV_BAL_1_5_LENS: [u8; 49] = [
    16, 16, 16, 16, 16, 16, 16, 16, 16, 16, 16, 16, 16, 16, 16, 16, 16, 16, 12, 11, 9, 7, 5, 3, 1,
    2, 4, 6, 8, 11, 12, 15, 16, 16, 16, 16, 16, 16, 16, 17, 17, 17, 17, 17, 17, 17, 17, 17, 17,
];

const F_ENV_BAL_1_5_CODES: [u32; 49] = [
    0x3ffe2, 0x3ffe3, 0x3ffe4, 0x3ffe5, 0x3ffe6, 0x3ffe7, 0x3ffe8, 0x3ffe9, 0x3ffea, 0x3ffeb,
    0x3ffec, 0x3ffed, 0x3ffee, 0x3ffef, 0x3fff0, 0x0fff7, 0x1fff0, 0x03ffc, 0x007fe, 0x007fc,
    0x000fe, 0x0007e, 0x0000e, 0x00002, 0x00000, 0x00006, 0x0001e, 0x0003e, 0x001fe, 0x007fd,
    0x00ffe, 0x07ffa, 0x0fff6, 0x3fff1, 0x3fff2, 0x3fff3, 0x3fff4, 0x3fff5, 0x3fff6, 0x3fff7,
    0x3fff8, 0x3fff9, 0x3fffa, 0x3fffb, 0x3fffc, 0x3fffd, 0x3fffe, 0x7fffe, 0x7ffff,
];

const F_ENV_BAL_1_5_LENS: [u8; 49] = [
    18, 18, 18, 18, 18, 18, 18, 18, 18, 18, 18, 18, 18, 18, 18, 16, 17, 14, 11, 11, 8, 7, 4, 2, 1,
    3, 5, 6, 9, 11, 12, 15, 16, 18, 18, 18, 18, 18, 18, 18, 18, 18, 18, 18, 18, 18, 18, 19, 19,
];

const T_ENV_3_0_CODES: [u32; 63] = [
    0x3ffed, 0x3ffee, 0x7ffde, 0x7ffdf, 0x7ffe0, 0x7ffe1, 0x7ffe2, 0x7ffe3, 0x7ffe4, 0x7ffe5,
    0x7ffe6, 0x7ffe7, 0x7ffe8, 0x7ffe9, 0x7ffea, 0x7ffeb, 0x7ffec, 0x1fff4, 0x0fff7, 0x0fff9,
    0x0fff8, 0x03ffb, 0x03ffa, 0x03ff8, 0x01ffa, 0x00ffc, 0x007fc, 0x000fe, 0x0003e, 0x0000e,
    0x00002, 0x00000, 0x00006, 0x0001e, 0x0007e, 0x001fe, 0x007fd, 0x01ffb, 0x03ff9, 0x03ffc,
    0x07ffa, 0x0fff6, 0x1fff5, 0x3ffec, 0x7ffed, 0x7ffee, 0x7ffef, 0x7fff0, 0x7fff1, 0x7fff2,
    0x7fff3, 0x7fff4, 0x7fff5, 0x7fff6, 0x7fff7, 0x7fff8, 0x7fff9, 0x7fffa, 0x7fffb, 0x7fffc,
    0x7fffd, 0x7fffe, 0x7ffff,
];

const T_ENV_3_0_LENS: [u8; 63] = [
    18, 18, 19, 19, 19, 19, 19, 19, 19, 19, 19, 19, 19, 19, 19, 19, 19, 17, 16, 16, 16, 14, 14, 14,
    13, 12, 11, 8, 6, 4, 2, 1, 3, 5, 7, 9, 11, 13, 14, 14, 15, 16, 17, 18, 19, 19, 19, 19, 19, 19,
    19, 19, 19, 19, 19, 19, 19, 19, 19, 19, 19, 19, 19,
];

const F_ENV_3_0_CODES: [u32; 63] = [
    0xffff0, 0xffff1, 0xffff2, 0xffff3, 0xffff4, 0xffff5, 0xffff6, 0x3fff3, 0x7fff5, 0x7ffee,
    0x7ffef, 0x7fff6, 0x3fff4, 0x3fff2, 0xffff7, 0x7fff0, 0x1fff5, 0x3fff0, 0x1fff4, 0x0fff7,
    0x0fff6, 0x07ff8, 0x03ffb, 0x00ffd, 0x007fd, 0x003fd, 0x001fd, 0x000fd, 0x0003e, 0x0000e,
    0x00002, 0x00000, 0x00006, 0x0001e, 0x000fc, 0x001fc, 0x003fc, 0x007fc, 0x00ffc, 0x01ffc,
    0x03ffa, 0x07ff9, 0x07ffa, 0x0fff8, 0x0fff9, 0x1fff6, 0x1fff7, 0x3fff5, 0x3fff6, 0x3fff1,
    0xffff8, 0x7fff1, 0x7fff2, 0x7fff3, 0xffff9, 0x7fff7, 0x7fff4, 0xffffa, 0xffffb, 0xffffc,
    0xffffd, 0xffffe, 0xfffff,
];

const F_ENV_3_0_LENS: [u8; 63] = [
    20, 20, 20, 20, 20, 20, 20, 18, 19, 19, 19, 19, 18, 18, 20, 19, 17, 18, 17, 16, 16, 15, 14, 12,
    11, 10, 9, 8, 6, 4, 2, 1, 3, 5, 8, 9, 10, 11, 12, 13, 14, 15, 15, 16, 16, 17, 17, 18, 18, 18,
    20, 19, 19, 19, 20, 19, 19, 20, 20, 20, 20, 20, 20,
];

const T_ENV_BAL_3_0_CODES: [u32; 25] = [
    0x01ff2, 0x01ff3, 0x01ff4, 0x01ff5, 0x01ff6, 0x01ff7, 0x01ff8, 0x00ff8, 0x000fe, 0x0007e,
    0x0000e, 0x00006, 0x00000, 0x00002, 0x0001e, 0x0003e, 0x001fe, 0x01ff9, 0x01ffa, 0x01ffb,
    0x01ffc, 0x01ffd, 0x01ffe, 0x03ffe, 0x03fff,
];

const T_ENV_BAL_3_0_LENS: [u8; 25] = [
    13, 13, 13, 13, 13, 13, 13, 12, 8, 7, 4, 3, 1, 2, 5, 6, 9, 13, 13, 13, 13, 13, 13, 14, 14,
];

const F_ENV_BAL_3_0_CODES: [u32; 25] = [
    0x01ff7, 0x01ff8, 0x01ff9, 0x01ffa, 0x01ffb, 0x03ff8, 0x03ff9, 0x007fc, 0x000fe, 0x0007e,
    0x0000e, 0x00002, 0x00000, 0x00006, 0x0001e, 0x0003e, 0x001fe, 0x00ffa, 0x01ff6, 0x03ffa,
    0x03ffb, 0x03ffc, 0x03ffd, 0x03ffe, 0x03fff,
];

const F_ENV_BAL_3_0_LENS: [u8; 25] = [
    13, 13, 13, 13, 13, 14, 14, 11, 8, 7, 4, 2, 1, 3, 5, 6, 9, 12, 13, 14, 14, 14, 14, 14, 14,
];

const T_NOISE_3_0_CODES: [u32; 63] = [
    0x01fce, 0x01fcf, 0x01fd0, 0x01fd1, 0x01fd2, 0x01fd3, 0x01fd4, 0x01fd5, 0x01fd6, 0x01fd7,
    0x01fd8, 0x01fd9, 0x01fda, 0x01fdb, 0x01fdc, 0x01fdd, 0x01fde, 0x01fdf, 0x01fe0, 0x01fe1,
    0x01fe2, 0x01fe3, 0x01fe4, 0x01fe5, 0x01fe6, 0x01fe7, 0x007f2, 0x000fd, 0x0003e, 0x0000e,
    0x00006, 0x00000, 0x00002, 0x0001e, 0x000fc, 0x003f8, 0x01fcc, 0x01fe8, 0x01fe9, 0x01fea,
    0x01feb, 0x01fec, 0x01fcd, 0x01fed, 0x01fee, 0x01fef, 0x01ff0, 0x01ff1, 0x01ff2, 0x01ff3,
    0x01ff4, 0x01ff5, 0x01ff6, 0x01ff7, 0x01ff8, 0x01ff9, 0x01ffa, 0x01ffb, 0x01ffc, 0x01ffd,
    0x01ffe, 0x03ffe, 0x03fff,
];

const T_NOISE_3_0_LENS: [u8; 63] = [
    13, 13, 13, 13, 13, 13, 13, 13, 13, 13, 13, 13, 13, 13, 13, 13, 13, 13, 13, 13, 13, 13, 13, 13,
    13, 13, 11, 8, 6, 4, 3, 1, 2, 5, 8, 10, 13, 13, 13, 13, 13, 13, 13, 13, 13, 13, 13, 13, 13, 13,
    13, 13, 13, 13, 13, 13, 13, 13, 13, 13, 13, 14, 14,
];

const T_NOISE_BAL_3_0_CODES: [u32; 25] = [
    0x000ec, 0x000ed, 0x000ee, 0x000ef, 0x000f0, 0x000f1, 0x000f2, 0x000f3, 0x000f4, 0x000f5,
    0x0001c, 0x00002, 0x00000, 0x00006, 0x0003a, 0x000f6, 0x000f7, 0x000f8, 0x000f9, 0x000fa,
    0x000fb, 0x000fc, 0x000fd, 0x000fe, 0x000ff,
];

const T_NOISE_BAL_3_0_LENS: [u8; 25] = [
    8, 8, 8, 8, 8, 8, 8, 8, 8, 8, 5, 2, 1, 3, 6, 8, 8, 8, 8, 8, 8, 8, 8, 8, 8,
];
lazy_static! {
    pub static ref T_ENV_1_5: SbrCodebook = SbrCodebook::new(&T_ENV_1_5_CODES, &T_ENV_1_5_LENS, 60);
    pub static ref F_ENV_1_5: SbrCodebook = SbrCodebook::new(&F_ENV_1_5_CODES, &F_ENV_1_5_LENS, 60);
    pub static ref T_ENV_BAL_1_5: SbrCodebook =
        SbrCodebook::new(&T_ENV_BAL_1_5_CODES, &T_ENV_BAL_1_5_LENS, 24);
    pub static ref F_ENV_BAL_1_5: SbrCodebook =
        SbrCodebook::new(&F_ENV_BAL_1_5_CODES, &F_ENV_BAL_1_5_LENS, 24);
    pub static ref T_ENV_3_0: SbrCodebook = SbrCodebook::new(&T_ENV_3_0_CODES, &T_ENV_3_0_LENS, 31);
    pub static ref F_ENV_3_0: SbrCodebook = SbrCodebook::new(&F_ENV_3_0_CODES, &F_ENV_3_0_LENS, 31);
    pub static ref T_ENV_BAL_3_0: SbrCodebook =
        SbrCodebook::new(&T_ENV_BAL_3_0_CODES, &T_ENV_BAL_3_0_LENS, 12);
    pub static ref F_ENV_BAL_3_0: SbrCodebook =
        SbrCodebook::new(&F_ENV_BAL_3_0_CODES, &F_ENV_BAL_3_0_LENS, 12);
    pub static ref T_NOISE_3_0: SbrCodebook =
        SbrCodebook::new(&T_NOISE_3_0_CODES, &T_NOISE_3_0_LENS, 31);
    pub static ref T_NOISE_BAL_3_0: SbrCodebook =
        SbrCodebook::new(&T_NOISE_BAL_3_0_CODES, &T_NOISE_BAL_3_0_LENS, 12);
}

/// Start frequency offsets per output sampling rate class, indexed by `bs_start_freq`.
pub const START_FREQ_OFFSETS: [[i8; 16]; 6] = [
    [-8, -7, -6, -5, -4, -3, -2, -1, 0, 1, 2, 3, 4, 5, 6, 7],
    [-5, -4, -3, -2, -1, 0, 1, 2, 3, 4, 5, 6, 7, 9, 11, 13],
    [-5, -3, -2, -1, 0, 1, 2, 3, 4, 5, 6, 7, 9, 11, 13, 16],
    [-6, -4, -2, -1, 0, 1, 2, 3, 4, 5, 6, 7, 9, 11, 13, 16],
    [-4, -2, -1, 0, 1, 2, 3, 4, 5, 6, 7, 9, 11, 13, 16, 20],
    [-2, -1, 0, 1, 2, 3, 4, 5, 6, 7, 9, 11, 13, 16, 20, 24],
];

/// Limiter gains, indexed by `bs_limiter_gains`.
pub const LIMITER_GAINS: [f32; 4] = [0.70795, 1.0, 1.41254, 1e10];

/// Limiter bands per octave, warped, indexed by `bs_limiter_bands - 1`.
pub const LIMITER_BANDS_WARPED: [f32; 3] =
    [1.32715174233856803909, 1.18509277094158210129, 1.11987160404675912501];

/// Gain smoothing filter taps, newest first.
pub const H_SMOOTH: [f32; 5] =
    [0.33333333333333, 0.30150283239582, 0.21816949906249, 0.11516383427084, 0.03183050093751];

/// Chirp factors for each inverse filtering mode.
pub const CHIRP_FACTORS: [f32; 4] = [0.0, 0.75, 0.9, 0.98];

lazy_static! {
    /// 512 complex noise values of unit mean energy, used to fill the noise floor.
    pub static ref NOISE_TABLE: [Complex<f32>; 512] = {
        let mut lcg = Lcg::new(Lcg::SEED);
        let mut table = [Complex::new(0.0, 0.0); 512];

        let mut energy = 0.0;

        for v in table.iter_mut() {
            let re = lcg.next() as f32 / i32::MAX as f32;
            let im = lcg.next() as f32 / i32::MAX as f32;
            *v = Complex::new(re, im);
            energy += v.norm_sqr();
        }

        let scale = (table.len() as f32 / energy).sqrt();

        for v in table.iter_mut() {
            *v *= scale;
        }

        table
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use coda_core::io::{BitReaderLtr, ReadBitsLtr};

    #[test]
    fn verify_codebooks_complete() {
        for cb in [
            &*T_ENV_1_5,
            &*F_ENV_1_5,
            &*T_ENV_BAL_1_5,
            &*F_ENV_BAL_1_5,
            &*T_ENV_3_0,
            &*F_ENV_3_0,
            &*T_ENV_BAL_3_0,
            &*F_ENV_BAL_3_0,
            &*T_NOISE_3_0,
            &*T_NOISE_BAL_3_0,
        ] {
            assert!(cb.codebook.is_complete());
        }
    }

    #[test]
    fn verify_zero_delta() {
        // The zero delta is the shortest code of the 3.0 dB envelope codebook.
        let buf = [0b0110_0000];
        let mut bs = BitReaderLtr::new(&buf);

        let (val, len) = bs.read_codebook(&F_ENV_3_0.codebook).unwrap();
        assert_eq!((i32::from(val) - F_ENV_3_0.lav, len), (0, 1));

        let (val, len) = bs.read_codebook(&F_ENV_3_0.codebook).unwrap();
        assert_eq!((i32::from(val) - F_ENV_3_0.lav, len), (1, 3));
    }

    /// Decodes one codeword, returning the delta and the number of bits consumed.
    fn decode(cb: &SbrCodebook, code: u32, len: u32) -> (i32, u32) {
        let mut buf = [0u8; 8];
        buf[..4].copy_from_slice(&(code << (32 - len)).to_be_bytes());

        let mut bs = BitReaderLtr::new(&buf);
        let (val, read) = bs.read_codebook(&cb.codebook).unwrap();

        (i32::from(val) - cb.lav, read)
    }

    #[test]
    fn verify_3_0_db_codewords() {
        // Codes of equal length are not assigned in symbol order in these tables.
        assert_eq!(decode(&T_ENV_3_0, 0x3ffed, 18), (-31, 18));
        assert_eq!(decode(&T_ENV_3_0, 0x3ffec, 18), (12, 18));
        assert_eq!(decode(&T_ENV_3_0, 0x0fff9, 16), (-12, 16));
        assert_eq!(decode(&T_ENV_3_0, 0x03ff8, 14), (-8, 14));

        assert_eq!(decode(&T_ENV_BAL_3_0, 0x0ff8, 12), (-5, 12));
        assert_eq!(decode(&T_ENV_BAL_3_0, 0x0006, 3), (-1, 3));
        assert_eq!(decode(&T_ENV_BAL_3_0, 0x3fff, 14), (12, 14));

        assert_eq!(decode(&F_ENV_BAL_3_0, 0x07fc, 11), (-5, 11));
        assert_eq!(decode(&F_ENV_BAL_3_0, 0x0002, 2), (-1, 2));
        assert_eq!(decode(&F_ENV_BAL_3_0, 0x0ffa, 12), (5, 12));

        assert_eq!(decode(&T_NOISE_3_0, 0x1fcc, 13), (5, 13));
        assert_eq!(decode(&T_NOISE_3_0, 0x1fcd, 13), (11, 13));
        assert_eq!(decode(&T_NOISE_3_0, 0x00fd, 8), (-4, 8));
        assert_eq!(decode(&T_NOISE_3_0, 0x3ffe, 14), (30, 14));

        assert_eq!(decode(&T_NOISE_BAL_3_0, 0x001c, 5), (-2, 5));
        assert_eq!(decode(&T_NOISE_BAL_3_0, 0x003a, 6), (2, 6));
    }

    #[test]
    fn verify_noise_table_energy() {
        let energy: f32 = NOISE_TABLE.iter().map(|v| v.norm_sqr()).sum();
        assert!((energy / 512.0 - 1.0).abs() < 1e-3);
    }
}
