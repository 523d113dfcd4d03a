// Coda
// Copyright (c) 2026 The Project Coda Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The filterbank: IMDCT, windowing, and overlap-add.

use coda_core::dsp::mdct::Imdct;

use crate::aac::common::*;
use crate::aac::ics::IcsInfo;
use crate::aac::window::*;

const SHORT_WIN_POINT0: usize = 512 - 64;
const SHORT_WIN_POINT1: usize = 512 + 64;

/// The overlap state of one output channel: the windowed second half of the previous frame's
/// inverse transform, and the window used to produce it.
#[derive(Clone)]
pub struct ChannelOverlap {
    pub delay: [f32; 1024],
    /// The window sequence of the previous frame. `None` at the start of a stream.
    pub prev_sequence: Option<WindowSequence>,
    pub prev_shape: bool,
}

impl Default for ChannelOverlap {
    fn default() -> Self {
        ChannelOverlap { delay: [0.0; 1024], prev_sequence: None, prev_shape: false }
    }
}

/// The overlap state of a decoding session, carried from each frame to the next.
///
/// Holds one tail per output channel, in output order. A fresh state, or one cleared with
/// [`OverlapState::reset`], is the state at the start of a stream.
#[derive(Clone, Default)]
pub struct OverlapState {
    channels: Vec<ChannelOverlap>,
}

impl OverlapState {
    /// Instantiates the starting state of a stream with `num_channels` output channels.
    pub fn new(num_channels: usize) -> Self {
        OverlapState { channels: vec![Default::default(); num_channels] }
    }

    pub fn num_channels(&self) -> usize {
        self.channels.len()
    }

    /// Clears every channel, as after a discontinuity in the stream.
    pub fn reset(&mut self) {
        self.channels.fill(Default::default());
    }

    /// Gets the tail of a channel that the next frame adds to the start of its output.
    pub fn tail(&self, ch: usize) -> &[f32] {
        &self.channels[ch].delay
    }

    pub(crate) fn channel(&self, ch: usize) -> &ChannelOverlap {
        &self.channels[ch]
    }

    pub(crate) fn channel_mut(&mut self, ch: usize) -> &mut ChannelOverlap {
        &mut self.channels[ch]
    }
}

pub struct Filterbank {
    kbd_long_win: [f32; 1024],
    kbd_short_win: [f32; 128],
    sine_long_win: [f32; 1024],
    sine_short_win: [f32; 128],
    imdct_long: Imdct,
    imdct_short: Imdct,
    pcm_long: [f32; 2048],
    pcm_short: [f32; 1152],
}

impl Filterbank {
    pub fn new() -> Self {
        let mut kbd_long_win = [0.0; 1024];
        let mut kbd_short_win = [0.0; 128];
        let mut sine_long_win = [0.0; 1024];
        let mut sine_short_win = [0.0; 128];

        generate_window(WindowType::KaiserBessel(4.0), &mut kbd_long_win);
        generate_window(WindowType::KaiserBessel(6.0), &mut kbd_short_win);
        generate_window(WindowType::Sine, &mut sine_long_win);
        generate_window(WindowType::Sine, &mut sine_short_win);

        Filterbank {
            kbd_long_win,
            kbd_short_win,
            sine_long_win,
            sine_short_win,
            imdct_long: Imdct::new_scaled(1024, 1.0 / 2048.0),
            imdct_short: Imdct::new_scaled(128, 1.0 / 256.0),
            pcm_long: [0.0; 2048],
            pcm_short: [0.0; 1152],
        }
    }

    fn windows(&self, kbd: bool) -> (&[f32; 1024], &[f32; 128]) {
        if kbd {
            (&self.kbd_long_win, &self.kbd_short_win)
        }
        else {
            (&self.sine_long_win, &self.sine_short_win)
        }
    }

    /// Synthesizes 1024 time-domain samples into `dst` from the spectrum `coeffs` of one frame,
    /// and advances `overlap` to this frame.
    pub fn synth(
        &mut self,
        coeffs: &[f32; 1024],
        info: &IcsInfo,
        overlap: &mut ChannelOverlap,
        dst: &mut [f32],
    ) {
        let seq = info.window_sequence;

        if seq != WindowSequence::EightShort {
            self.imdct_long.imdct(coeffs, &mut self.pcm_long);
        }
        else {
            for (ain, aout) in coeffs.chunks_exact(128).zip(self.pcm_long.chunks_exact_mut(256)) {
                self.imdct_short.imdct(ain, aout);
            }
        }

        // Copy the windows so that the scratch buffers may be borrowed mutably.
        let (long_win, short_win) = self.windows(info.window_shape);
        let (long_win, short_win) = (*long_win, *short_win);

        let (prev_long_win, prev_short_win) = self.windows(overlap.prev_shape);
        let (prev_long_win, prev_short_win) = (*prev_long_win, *prev_short_win);

        let pcm_long = &self.pcm_long;
        let pcm_short = &mut self.pcm_short;
        let delay = &mut overlap.delay;

        if seq == WindowSequence::EightShort {
            // Window and overlap-add the eight short transforms.
            pcm_short.fill(0.0);

            for (w, src) in pcm_long.chunks_exact(256).enumerate() {
                let rising = if w > 0 { &short_win } else { &prev_short_win };
                let out = &mut pcm_short[w * 128..w * 128 + 256];

                for i in 0..128 {
                    out[i] += src[i] * rising[i];
                    out[i + 128] += src[i + 128] * short_win[127 - i];
                }
            }
        }

        // Output new audio samples.
        match seq {
            WindowSequence::OnlyLong | WindowSequence::LongStart => {
                for i in 0..1024 {
                    dst[i] = delay[i] + pcm_long[i] * prev_long_win[i];
                }
            }
            WindowSequence::EightShort => {
                dst[..SHORT_WIN_POINT0].copy_from_slice(&delay[..SHORT_WIN_POINT0]);

                for i in SHORT_WIN_POINT0..1024 {
                    dst[i] = delay[i] + pcm_short[i - SHORT_WIN_POINT0];
                }
            }
            WindowSequence::LongStop => {
                dst[..SHORT_WIN_POINT0].copy_from_slice(&delay[..SHORT_WIN_POINT0]);

                for i in SHORT_WIN_POINT0..SHORT_WIN_POINT1 {
                    dst[i] = delay[i] + pcm_long[i] * prev_short_win[i - SHORT_WIN_POINT0];
                }
                for i in SHORT_WIN_POINT1..1024 {
                    dst[i] = delay[i] + pcm_long[i];
                }
            }
        }

        // Save the second half for the next frame.
        match seq {
            WindowSequence::OnlyLong | WindowSequence::LongStop => {
                for i in 0..1024 {
                    delay[i] = pcm_long[i + 1024] * long_win[1023 - i];
                }
            }
            WindowSequence::EightShort => {
                // The last part is already windowed.
                delay[..SHORT_WIN_POINT1].copy_from_slice(&pcm_short[SHORT_WIN_POINT1..]);
                delay[SHORT_WIN_POINT1..].fill(0.0);
            }
            WindowSequence::LongStart => {
                delay[..SHORT_WIN_POINT0]
                    .copy_from_slice(&pcm_long[1024..(SHORT_WIN_POINT0 + 1024)]);

                for i in SHORT_WIN_POINT0..SHORT_WIN_POINT1 {
                    delay[i] = pcm_long[i + 1024] * short_win[127 - (i - SHORT_WIN_POINT0)];
                }

                delay[SHORT_WIN_POINT1..].fill(0.0);
            }
        }

        overlap.prev_sequence = Some(seq);
        overlap.prev_shape = info.window_shape;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts;

    /// A forward MDCT of 2048 samples, windowed by a sine window, scaled to invert the decoder's
    /// IMDCT.
    fn mdct_sine(x: &[f64]) -> [f32; 1024] {
        let mut spec = [0f32; 1024];

        for (k, s) in spec.iter_mut().enumerate() {
            let mut acc = 0.0;

            for (n, &xn) in x.iter().enumerate() {
                let win = (consts::PI / 2048.0 * (n as f64 + 0.5)).sin();
                let phase = consts::PI / 1024.0 * (n as f64 + 0.5 + 512.0) * (k as f64 + 0.5);
                acc += xn * win * phase.cos();
            }

            *s = (4.0 * acc) as f32;
        }

        spec
    }

    #[test]
    fn verify_long_window_reconstruction() {
        let x: Vec<f64> = (0..3072).map(|i| (i as f64 * 0.05).sin() * 0.5).collect();

        let info = IcsInfo::default();

        let mut fb = Filterbank::new();
        let mut overlap = ChannelOverlap::default();
        let mut out = [0f32; 1024];

        fb.synth(&mdct_sine(&x[0..2048]), &info, &mut overlap, &mut out);
        fb.synth(&mdct_sine(&x[1024..3072]), &info, &mut overlap, &mut out);

        for (i, &y) in out.iter().enumerate() {
            assert!((f64::from(y) - x[1024 + i]).abs() < 1e-3, "sample {}", i);
        }

        assert_eq!(overlap.prev_sequence, Some(WindowSequence::OnlyLong));
    }

    #[test]
    fn verify_silence() {
        let mut fb = Filterbank::new();
        let mut overlap = ChannelOverlap::default();
        let mut out = [1f32; 1024];

        let spec = [0f32; 1024];

        for seq in [
            WindowSequence::OnlyLong,
            WindowSequence::LongStart,
            WindowSequence::EightShort,
            WindowSequence::LongStop,
        ] {
            let info = IcsInfo { window_sequence: seq, window_shape: true, ..Default::default() };

            fb.synth(&spec, &info, &mut overlap, &mut out);

            assert!(out.iter().all(|&x| x == 0.0));
            assert!(overlap.delay.iter().all(|&x| x == 0.0));
        }

        assert!(overlap.prev_shape);
    }

    #[test]
    fn verify_overlap_carried() {
        let mut fb = Filterbank::new();
        let mut overlap = ChannelOverlap::default();
        let mut out = [0f32; 1024];

        let mut spec = [0f32; 1024];
        spec[10] = 1.0;

        let info = IcsInfo::default();

        fb.synth(&spec, &info, &mut overlap, &mut out);

        let delay = overlap.delay;
        assert!(delay.iter().any(|&x| x != 0.0));

        // A silent frame outputs exactly the tail of the previous frame.
        fb.synth(&[0f32; 1024], &info, &mut overlap, &mut out);
        assert_eq!(&out[..], &delay[..]);
    }
}
