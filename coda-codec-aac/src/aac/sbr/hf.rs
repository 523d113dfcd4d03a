// Coda
// Copyright (c) 2026 The Project Coda Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Per-channel SBR synthesis: QMF analysis of the core signal, high frequency generation,
//! envelope adjustment, and QMF synthesis at twice the core sampling rate.

use coda_core::dsp::Complex;

use super::data::{ChannelData, DeltaHistory, Energies, MAX_BANDS, MAX_ENVELOPES};
use super::data::{MAX_NOISE_BANDS, NUM_TIME_SLOTS};
use super::freq::FreqTables;
use super::qmf::{QmfAnalysis, QmfSynthesis};
use super::tables::{CHIRP_FACTORS, H_SMOOTH, LIMITER_GAINS, NOISE_TABLE};
use super::SbrHeader;

/// QMF slots per frame.
const NUM_SLOTS: usize = 2 * NUM_TIME_SLOTS;
/// Slots of the previous frame kept for high frequency generation.
const T_HF_GEN: usize = 8;
/// Offset of the first envelope adjusted slot.
const T_HF_ADJ: usize = 2;
const X_LOW_SLOTS: usize = NUM_SLOTS + T_HF_GEN;
/// Envelope borders extend at most 3 time slots into the next frame.
const Y_SLOTS: usize = NUM_SLOTS + 6;
const SMOOTH_LEN: usize = 4;

/// Scale between the core decoder output and the signal domain envelope energies refer to.
const PCM_SCALE: f32 = 32768.0;

const ZERO: Complex<f32> = Complex::new(0.0, 0.0);

const PHI_RE: [f32; 4] = [1.0, 0.0, -1.0, 0.0];
const PHI_IM: [f32; 4] = [0.0, 1.0, 0.0, -1.0];

type LowSlot = [Complex<f32>; 32];
type Slot = [Complex<f32>; 64];

/// The parameters of one channel for one frame.
pub struct Envelope<'a> {
    pub header: &'a SbrHeader,
    pub tables: &'a FreqTables,
    pub data: &'a ChannelData,
    pub energies: &'a Energies,
}

struct Buffers {
    /// Analysis output of the current frame.
    w: [LowSlot; NUM_SLOTS],
    /// The last `T_HF_GEN` analysis slots of the previous frame.
    w_hist: [LowSlot; T_HF_GEN],
    x_low: [LowSlot; X_LOW_SLOTS],
    x_high: [Slot; X_LOW_SLOTS],
    y: [Slot; Y_SLOTS],
    /// Envelope adjusted slots of the previous frame that extend into the current frame.
    y_hist: [Slot; Y_SLOTS - NUM_SLOTS],
    g_temp: [[f32; MAX_BANDS]; Y_SLOTS + SMOOTH_LEN],
    q_temp: [[f32; MAX_BANDS]; Y_SLOTS + SMOOTH_LEN],
}

impl Buffers {
    fn new() -> Box<Self> {
        Box::new(Buffers {
            w: [[ZERO; 32]; NUM_SLOTS],
            w_hist: [[ZERO; 32]; T_HF_GEN],
            x_low: [[ZERO; 32]; X_LOW_SLOTS],
            x_high: [[ZERO; 64]; X_LOW_SLOTS],
            y: [[ZERO; 64]; Y_SLOTS],
            y_hist: [[ZERO; 64]; Y_SLOTS - NUM_SLOTS],
            g_temp: [[0.0; MAX_BANDS]; Y_SLOTS + SMOOTH_LEN],
            q_temp: [[0.0; MAX_BANDS]; Y_SLOTS + SMOOTH_LEN],
        })
    }
}

/// Gains of one frame, per envelope and generated subband.
struct Gains {
    gain: [[f32; MAX_BANDS]; MAX_ENVELOPES],
    noise: [[f32; MAX_BANDS]; MAX_ENVELOPES],
    sine: [[f32; MAX_BANDS]; MAX_ENVELOPES],
}

/// The SBR state of one channel.
pub struct SbrChannel {
    analysis: QmfAnalysis,
    synthesis: QmfSynthesis,
    buf: Box<Buffers>,
    /// Chirp factors per noise floor band.
    bw: [f32; MAX_NOISE_BANDS],
    invf_prev: [u8; MAX_NOISE_BANDS],
    /// Sinusoids present in the last envelope of the previous frame, per QMF subband.
    sine_prev: [bool; 64],
    kx_prev: usize,
    m_prev: usize,
    /// The last envelope border of the previous frame, in time slots.
    t_last_prev: usize,
    /// True if the previous frame ended with a transient envelope.
    transient_prev: bool,
    noise_idx: usize,
    sine_idx: usize,
    history: DeltaHistory,
    reset: bool,
}

impl Default for SbrChannel {
    fn default() -> Self {
        SbrChannel {
            analysis: Default::default(),
            synthesis: Default::default(),
            buf: Buffers::new(),
            bw: [0.0; MAX_NOISE_BANDS],
            invf_prev: [0; MAX_NOISE_BANDS],
            sine_prev: [false; 64],
            kx_prev: 32,
            m_prev: 0,
            t_last_prev: NUM_TIME_SLOTS,
            transient_prev: false,
            noise_idx: 0,
            sine_idx: 0,
            history: Default::default(),
            reset: true,
        }
    }
}

impl SbrChannel {
    /// Scale factors of the previous frame, for delta decoding in time.
    pub fn history(&self) -> &DeltaHistory {
        &self.history
    }

    /// Restarts gain smoothing. Called when the frequency tables change.
    pub fn restart(&mut self) {
        self.reset = true;
    }

    /// Processes one frame of 1024 core samples into 2048 output samples. Without an envelope,
    /// the core signal is only upsampled.
    pub fn process(&mut self, core: &[f32], env: Option<Envelope<'_>>, out: &mut [f32]) {
        debug_assert!(core.len() == 32 * NUM_SLOTS);
        debug_assert!(out.len() == 64 * NUM_SLOTS);

        let mut scaled = [0.0; 32];

        for (src, w) in core.chunks_exact(32).zip(self.buf.w.iter_mut()) {
            for (s, &c) in scaled.iter_mut().zip(src) {
                *s = c * PCM_SCALE;
            }
            self.analysis.analyze(&scaled, w);
        }

        let (kx, m) = env.as_ref().map_or((32, 0), |env| (env.tables.kx, env.tables.m));

        self.fill_low(kx);

        for slot in self.buf.y.iter_mut() {
            *slot = [ZERO; 64];
        }

        if let Some(env) = &env {
            self.generate_high(env);
            self.adjust(env);
        }

        self.synthesize(kx, m, out);

        // Carry the state into the next frame.
        let buf = &mut *self.buf;
        buf.w_hist.copy_from_slice(&buf.w[NUM_SLOTS - T_HF_GEN..]);
        buf.y_hist.copy_from_slice(&buf.y[NUM_SLOTS..]);

        self.kx_prev = kx;
        self.m_prev = m;

        match env {
            Some(env) => {
                let grid = &env.data.grid;

                self.t_last_prev = grid.t_env[grid.num_env];
                self.transient_prev = grid.transient == Some(grid.num_env);
                self.history = env.data.history();
                self.reset = false;
            }
            None => {
                self.t_last_prev = NUM_TIME_SLOTS;
                self.transient_prev = false;
                self.sine_prev = [false; 64];
                self.history = Default::default();
                self.reset = true;
            }
        }
    }

    /// Fills the low band from the analysis output of the previous and current frames.
    fn fill_low(&mut self, kx: usize) {
        let buf = &mut *self.buf;

        for slot in buf.x_low.iter_mut() {
            *slot = [ZERO; 32];
        }

        for (dst, src) in buf.x_low[..T_HF_GEN].iter_mut().zip(buf.w_hist.iter()) {
            dst[..self.kx_prev].copy_from_slice(&src[..self.kx_prev]);
        }

        for (dst, src) in buf.x_low[T_HF_GEN..].iter_mut().zip(buf.w.iter()) {
            dst[..kx].copy_from_slice(&src[..kx]);
        }
    }

    /// Generates the high band by patching and inverse filtering the low band.
    fn generate_high(&mut self, env: &Envelope<'_>) {
        let tables = env.tables;
        let data = env.data;
        let buf = &mut *self.buf;

        let mut alpha0 = [ZERO; 32];
        let mut alpha1 = [ZERO; 32];

        for k in 0..tables.k0 {
            let (a0, a1) = predictor(&buf.x_low, k);
            alpha0[k] = a0;
            alpha1[k] = a1;
        }

        // Update the chirp factors from the inverse filtering modes.
        for i in 0..tables.num_noise_bands() {
            let mode = data.invf_mode[i];

            let new_bw = if mode + self.invf_prev[i] == 1 {
                0.6
            }
            else {
                CHIRP_FACTORS[usize::from(mode)]
            };

            let bw = if new_bw < self.bw[i] {
                0.75 * new_bw + 0.25 * self.bw[i]
            }
            else {
                0.90625 * new_bw + 0.09375 * self.bw[i]
            };

            self.bw[i] = if bw < 0.015625 { 0.0 } else { bw };
        }

        self.invf_prev = data.invf_mode;

        let first = data.grid.first_slot();
        let last = data.grid.last_slot();
        let num_noise_bands = tables.num_noise_bands();

        let mut k = tables.kx;

        for patch in tables.patches.iter() {
            for p in patch.start..patch.start + patch.len {
                let g = tables.noise[1..]
                    .iter()
                    .position(|&border| k < border)
                    .unwrap_or(num_noise_bands - 1);

                let bw = self.bw[g];
                let a0 = alpha0[p] * bw;
                let a1 = alpha1[p] * (bw * bw);

                for l in first + T_HF_ADJ..last + T_HF_ADJ {
                    buf.x_high[l][k] =
                        buf.x_low[l][p] + a0 * buf.x_low[l - 1][p] + a1 * buf.x_low[l - 2][p];
                }

                k += 1;
            }
        }
    }

    /// Adjusts the envelope of the high band and adds noise and sinusoids.
    fn adjust(&mut self, env: &Envelope<'_>) {
        let header = env.header;
        let tables = env.tables;
        let grid = &env.data.grid;
        let kx = tables.kx;
        let m = tables.m;
        let num_env = grid.num_env;

        let mut e_orig = [[0.0; MAX_BANDS]; MAX_ENVELOPES];
        let mut q_mapped = [[0.0; MAX_BANDS]; MAX_ENVELOPES];
        let mut e_curr = [[0.0; MAX_BANDS]; MAX_ENVELOPES];
        let mut sine_index = [[false; MAX_BANDS]; MAX_ENVELOPES];
        let mut sine_mapped = [[false; MAX_BANDS]; MAX_ENVELOPES];

        for e in 0..num_env {
            let bands = tables.env_bands(grid.freq_res[e]);

            for (i, b) in bands.windows(2).enumerate() {
                e_orig[e][b[0] - kx..b[1] - kx].fill(env.energies.env[e][i]);
            }

            let q = usize::from(grid.num_noise > 1 && grid.t_env[e] >= grid.t_noise[1]);

            for (i, b) in tables.noise.windows(2).enumerate() {
                q_mapped[e][b[0] - kx..b[1] - kx].fill(env.energies.noise[q][i]);
            }

            if let Some(harmonics) = &env.data.harmonics {
                for (i, b) in tables.high.windows(2).enumerate() {
                    let mid = (b[0] + b[1]) >> 1;

                    sine_index[e][mid - kx] = harmonics[i]
                        && (grid.transient.map_or(true, |t| e >= t) || self.sine_prev[mid]);
                }
            }

            for b in bands.windows(2) {
                let band = b[0] - kx..b[1] - kx;
                let present = sine_index[e][band.clone()].iter().any(|&s| s);
                sine_mapped[e][band].fill(present);
            }

            // Estimate the energy of the generated high band.
            let lo = 2 * grid.t_env[e] + T_HF_ADJ;
            let hi = 2 * grid.t_env[e + 1] + T_HF_ADJ;

            let x_high = &self.buf.x_high[lo..hi];
            let energy = |k: usize| x_high.iter().map(|slot| slot[k].norm_sqr()).sum::<f32>();

            if header.interpol_freq {
                for k in kx..kx + m {
                    e_curr[e][k - kx] = energy(k) / (hi - lo) as f32;
                }
            }
            else {
                for b in bands.windows(2) {
                    let sum = (b[0]..b[1]).map(&energy).sum::<f32>();
                    let avg = sum / ((hi - lo) * (b[1] - b[0])) as f32;
                    e_curr[e][b[0] - kx..b[1] - kx].fill(avg);
                }
            }
        }

        self.sine_prev = [false; 64];
        for k in kx..kx + m {
            self.sine_prev[k] = sine_index[num_env - 1][k - kx];
        }

        // Transient envelopes are neither smoothed nor given a noise floor.
        let mut transient = [false; MAX_ENVELOPES];
        for (e, t) in transient[..num_env].iter_mut().enumerate() {
            *t = grid.transient == Some(e) || (e == 0 && self.transient_prev);
        }

        let mut gains = Gains {
            gain: [[0.0; MAX_BANDS]; MAX_ENVELOPES],
            noise: [[0.0; MAX_BANDS]; MAX_ENVELOPES],
            sine: [[0.0; MAX_BANDS]; MAX_ENVELOPES],
        };

        let limiter_gain = LIMITER_GAINS[usize::from(header.limiter_gains)];

        for e in 0..num_env {
            let delta = if transient[e] { 0.0 } else { 1.0 };

            for b in tables.limiter.windows(2) {
                let band = b[0] - kx..b[1] - kx;

                for k in band.clone() {
                    let orig = e_orig[e][k];
                    let q = q_mapped[e][k];
                    let curr = e_curr[e][k];
                    let temp = orig / (1.0 + q);

                    gains.noise[e][k] = (temp * q).sqrt();
                    gains.sine[e][k] = if sine_index[e][k] { temp.sqrt() } else { 0.0 };

                    let gain = if sine_mapped[e][k] {
                        (orig * q / ((1.0 + curr) * (1.0 + q))).sqrt()
                    }
                    else {
                        (orig / ((1.0 + curr) * (1.0 + q * delta))).sqrt()
                    };

                    gains.gain[e][k] = gain + f32::MIN_POSITIVE;
                }

                // Limit the gain to the energy of the limiter band.
                let sum_orig = e_orig[e][band.clone()].iter().sum::<f32>();
                let sum_curr = e_curr[e][band.clone()].iter().sum::<f32>();

                let ratio = (f32::EPSILON + sum_orig) / (f32::EPSILON + sum_curr);
                let gain_max = (limiter_gain * ratio.sqrt()).min(1e5);

                for k in band.clone() {
                    let noise_max = gains.noise[e][k] * gain_max / gains.gain[e][k];
                    gains.noise[e][k] = gains.noise[e][k].min(noise_max);
                    gains.gain[e][k] = gains.gain[e][k].min(gain_max);
                }

                // Compensate the energy lost by limiting.
                let mut sum_adj = 0.0;

                for k in band.clone() {
                    let gain = gains.gain[e][k];
                    let sine = gains.sine[e][k];

                    sum_adj += e_curr[e][k] * gain * gain + sine * sine;

                    if delta != 0.0 && sine == 0.0 {
                        sum_adj += gains.noise[e][k] * gains.noise[e][k];
                    }
                }

                let boost = ((f32::EPSILON + sum_orig) / (f32::EPSILON + sum_adj)).sqrt();
                let boost = boost.min(1.584893192);

                for k in band {
                    gains.gain[e][k] *= boost;
                    gains.noise[e][k] *= boost;
                    gains.sine[e][k] *= boost;
                }
            }
        }

        self.assemble(env, &gains, &transient);
    }

    /// Applies the gains to the high band, smoothing them over time, and adds the noise floor
    /// and sinusoids.
    fn assemble(
        &mut self,
        env: &Envelope<'_>,
        gains: &Gains,
        transient: &[bool; MAX_ENVELOPES],
    ) {
        let grid = &env.data.grid;
        let kx = env.tables.kx;
        let m = env.tables.m;
        let buf = &mut *self.buf;

        let h_sl = if env.header.smoothing_mode { 0 } else { SMOOTH_LEN };

        let t0 = grid.first_slot();

        if self.reset {
            for i in 0..h_sl {
                buf.g_temp[t0 + i] = gains.gain[0];
                buf.q_temp[t0 + i] = gains.noise[0];
            }
        }
        else if h_sl > 0 {
            let t_prev = 2 * self.t_last_prev;

            for i in 0..SMOOTH_LEN {
                buf.g_temp[t0 + i] = buf.g_temp[t_prev + i];
                buf.q_temp[t0 + i] = buf.q_temp[t_prev + i];
            }
        }

        for e in 0..grid.num_env {
            for i in 2 * grid.t_env[e]..2 * grid.t_env[e + 1] {
                buf.g_temp[h_sl + i] = gains.gain[e];
                buf.q_temp[h_sl + i] = gains.noise[e];
            }
        }

        for e in 0..grid.num_env {
            let transient = transient[e];

            for i in 2 * grid.t_env[e]..2 * grid.t_env[e + 1] {
                let mut g_filt = buf.g_temp[h_sl + i];
                let mut q_filt = buf.q_temp[h_sl + i];

                if h_sl > 0 && !transient {
                    for k in 0..m {
                        g_filt[k] = 0.0;
                        q_filt[k] = 0.0;

                        for (j, h) in H_SMOOTH.iter().enumerate() {
                            g_filt[k] += buf.g_temp[h_sl + i - j][k] * h;
                            q_filt[k] += buf.q_temp[h_sl + i - j][k] * h;
                        }
                    }
                }

                let x_high = &buf.x_high[i + T_HF_ADJ];
                let y = &mut buf.y[i];

                for k in 0..m {
                    let mut sample = x_high[kx + k] * g_filt[k];
                    let sine = gains.sine[e][k];

                    if sine != 0.0 {
                        let sign = if (k + kx) & 1 == 1 { -1.0 } else { 1.0 };
                        sample.re += sine * PHI_RE[self.sine_idx];
                        sample.im += sine * PHI_IM[self.sine_idx] * sign;
                    }
                    else if !transient {
                        sample += NOISE_TABLE[(self.noise_idx + k + 1) & 511] * q_filt[k];
                    }

                    y[kx + k] = sample;
                }

                self.noise_idx = (self.noise_idx + m) & 511;
                self.sine_idx = (self.sine_idx + 1) & 3;
            }
        }
    }

    /// Combines the low and high bands and runs QMF synthesis.
    fn synthesize(&mut self, kx: usize, m: usize, out: &mut [f32]) {
        let buf = &*self.buf;

        // Slots covered by the last envelope of the previous frame.
        let i_temp = (2 * self.t_last_prev).saturating_sub(NUM_SLOTS);

        for (l, dst) in out.chunks_exact_mut(64).enumerate() {
            let mut x = [ZERO; 64];

            let (kx, m, high) = if l < i_temp {
                (self.kx_prev, self.m_prev, &buf.y_hist[l])
            }
            else {
                (kx, m, &buf.y[l])
            };

            x[..kx].copy_from_slice(&buf.x_low[l + T_HF_ADJ][..kx]);
            x[kx..kx + m].copy_from_slice(&high[kx..kx + m]);

            self.synthesis.synthesize(&x, dst);
        }

        for s in out.iter_mut() {
            *s *= 1.0 / PCM_SCALE;
        }
    }
}

/// Computes the second order linear prediction coefficients of a low band subband.
fn predictor(x_low: &[LowSlot; X_LOW_SLOTS], k: usize) -> (Complex<f32>, Complex<f32>) {
    let phi = |i: usize, j: usize| -> Complex<f32> {
        (0..X_LOW_SLOTS - 2).map(|n| x_low[n + 2 - i][k] * x_low[n + 2 - j][k].conj()).sum()
    };

    let p01 = phi(0, 1);
    let p02 = phi(0, 2);
    let p11 = phi(1, 1).re;
    let p12 = phi(1, 2);
    let p22 = phi(2, 2).re;

    let det = p22 * p11 - p12.norm_sqr() / (1.0 + 1e-6);

    let a1 = if det != 0.0 { (p01 * p12 - p02 * p11) / det } else { ZERO };
    let a0 = if p11 != 0.0 { -(p01 + a1 * p12.conj()) / p11 } else { ZERO };

    if a0.norm_sqr() >= 16.0 || a1.norm_sqr() >= 16.0 {
        (ZERO, ZERO)
    }
    else {
        (a0, a1)
    }
}
