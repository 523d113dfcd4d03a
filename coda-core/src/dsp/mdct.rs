// Coda
// Copyright (c) 2026 The Project Coda Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `mdct` module implements the Inverse Modified Discrete Cosine Transform (IMDCT).
//!
//! The IMDCT in this module is computed with a half-length complex FFT.

use std::sync::Arc;

use rustfft::{Fft, FftPlanner};

use super::Complex;

/// An N-point Inverse Modified Discrete Cosine Transform (IMDCT), computed with an N/2-point
/// complex FFT.
///
/// The transform produces 2N samples from N spectral coefficients:
/// `y[n] = scale * sum_k X[k] * cos(pi / 4N * (2n + 1 + N) * (2k + 1))`.
pub struct Imdct {
    plan: Arc<dyn Fft<f32>>,
    work: Box<[Complex<f32>]>,
    buf: Box<[Complex<f32>]>,
    /// `sqrt(scale) * exp(i * pi / N * (k + 1/8))`, with a half-turn added for negative scales.
    twiddle: Box<[Complex<f32>]>,
}

impl Imdct {
    /// Instantiates an unscaled N-point IMDCT. `n` must be a power of two.
    pub fn new(n: usize) -> Self {
        Imdct::new_scaled(n, 1.0)
    }

    /// Instantiates an N-point IMDCT whose output is multiplied by `scale`. `n` must be a power
    /// of two.
    pub fn new_scaled(n: usize, scale: f64) -> Self {
        assert!(n.is_power_of_two(), "imdct: n must be a power of two");

        let half = n / 2;

        // The twiddles are applied twice, so each carries the square root of the scale.
        let gain = scale.abs().sqrt();
        let phase = if scale < 0.0 { half as f64 } else { 0.0 } + 0.125;
        let step = std::f64::consts::PI / n as f64;

        let twiddle = (0..half)
            .map(|k| {
                let (sin, cos) = (step * (k as f64 + phase)).sin_cos();
                Complex::new((gain * cos) as f32, (gain * sin) as f32)
            })
            .collect();

        let plan = FftPlanner::<f32>::new().plan_fft_forward(half);

        let work = vec![Complex::default(); plan.get_inplace_scratch_len()].into_boxed_slice();
        let buf = vec![Complex::default(); half].into_boxed_slice();

        Imdct { plan, work, buf, twiddle }
    }

    /// The number of spectral coefficients, N.
    pub fn len(&self) -> usize {
        2 * self.plan.len()
    }

    /// Always false for a constructed transform.
    pub fn is_empty(&self) -> bool {
        self.plan.len() == 0
    }

    /// Transforms N coefficients in `spec` into 2N samples in `out`.
    ///
    /// Panics if the buffer lengths do not match the size of the transform.
    pub fn imdct(&mut self, spec: &[f32], out: &mut [f32]) {
        let n = self.len();
        let half = n / 2;
        let quarter = n / 4;

        assert_eq!(spec.len(), n);
        assert_eq!(out.len(), 2 * n);

        // Pair the even coefficients with the reversed odd coefficients, then rotate.
        for (i, (z, w)) in self.buf.iter_mut().zip(self.twiddle.iter()).enumerate() {
            *z = -(Complex::new(spec[2 * i], spec[n - 1 - 2 * i]) * w.conj());
        }

        self.plan.process_with_scratch(&mut self.buf, &mut self.work);

        let (q0, rest) = out.split_at_mut(half);
        let (q1, rest) = rest.split_at_mut(half);
        let (q2, q3) = rest.split_at_mut(half);

        // Every FFT output yields one sample in each quarter of the output. The first half of the
        // outputs fills the quarters from opposite ends to the second half.
        for (i, (z, w)) in self.buf.iter().zip(self.twiddle.iter()).enumerate() {
            let v = w * z.conj();

            let (u, s, a, b) = if i < quarter {
                (v.im, v.re, half - 1 - 2 * i, 2 * i)
            }
            else {
                let j = i - quarter;
                (v.re, v.im, 2 * j, half - 1 - 2 * j)
            };

            q0[a] = -u;
            q1[b] = u;
            q2[a] = s;
            q3[b] = s;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::{Rng, SeedableRng};
    use std::f64::consts;

    /// The IMDCT by definition, in double precision.
    fn reference(spec: &[f32], scale: f64) -> Vec<f64> {
        let n = spec.len();

        (0..2 * n)
            .map(|t| {
                let sum: f64 = spec
                    .iter()
                    .enumerate()
                    .map(|(k, &x)| {
                        let arg = consts::PI / (4 * n) as f64
                            * (2 * t + 1 + n) as f64
                            * (2 * k + 1) as f64;
                        f64::from(x) * arg.cos()
                    })
                    .sum();
                scale * sum
            })
            .collect()
    }

    fn check(n: usize, scale: f64, spec: &[f32], tolerance: f64) {
        let mut imdct = Imdct::new_scaled(n, scale);
        assert_eq!(imdct.len(), n);

        let mut out = vec![0f32; 2 * n];
        imdct.imdct(spec, &mut out);

        for (t, (&y, r)) in out.iter().zip(reference(spec, scale)).enumerate() {
            assert!((f64::from(y) - r).abs() < tolerance, "n={} sample {}", n, t);
        }
    }

    #[test]
    fn verify_imdct_ramp() {
        let spec: Vec<f32> = (1..=32).map(|x| x as f32).collect();
        check(32, (2.0f64 / 64.0).sqrt(), &spec, 1e-4);
    }

    #[test]
    fn verify_imdct_negative_scale() {
        let spec: Vec<f32> = (0..64).map(|x| (x as f32 * 0.37).sin()).collect();
        check(64, -0.5, &spec, 1e-4);
    }

    #[test]
    fn verify_imdct_aac_sizes() {
        let mut rng = SmallRng::seed_from_u64(0x5eed);

        for (n, scale) in [(128usize, 1.0 / 256.0), (1024usize, 1.0 / 2048.0)] {
            let spec: Vec<f32> = (0..n).map(|_| rng.random_range(-1.0f32..1.0)).collect();
            check(n, scale, &spec, 1e-4);
        }
    }

    #[test]
    fn verify_imdct_zero_spectrum() {
        let spec = [0f32; 256];
        let mut out = [1f32; 512];

        Imdct::new(256).imdct(&spec, &mut out);

        assert!(out.iter().all(|&x| x == 0.0));
    }
}
