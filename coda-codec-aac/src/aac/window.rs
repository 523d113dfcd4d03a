// Coda
// Copyright (c) 2026 The Project Coda Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::f64::consts;

/// Window shapes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WindowType {
    /// Sine window.
    Sine,
    /// Kaiser-Bessel derived window with the given alpha.
    KaiserBessel(f64),
}

/// Generates the rising half of a `2 * dst.len()` point window. The falling half is the rising
/// half reversed.
pub fn generate_window(mode: WindowType, dst: &mut [f32]) {
    let n = dst.len();

    match mode {
        WindowType::Sine => {
            let step = consts::PI / (2 * n) as f64;

            for (i, w) in dst.iter_mut().enumerate() {
                *w = ((i as f64 + 0.5) * step).sin() as f32;
            }
        }
        WindowType::KaiserBessel(alpha) => {
            // The window is the normalized running sum of an N + 1 point Kaiser window.
            let beta = (alpha * consts::PI / n as f64).powi(2);

            let kaiser: Vec<f64> =
                (0..=n).map(|j| bessel_i0_sq((j * (n - j)) as f64 * beta)).collect();

            let total: f64 = kaiser.iter().sum();

            let mut sum = 0.0;

            for (w, k) in dst.iter_mut().zip(kaiser.iter()) {
                sum += k;
                *w = (sum / total).sqrt() as f32;
            }
        }
    }
}

/// The zeroth-order modified Bessel function of the first kind, I0(x), given (x / 2)^2.
fn bessel_i0_sq(x_half_sq: f64) -> f64 {
    let mut val = 1.0;

    for k in (1..64).rev() {
        val = 1.0 + val * x_half_sq / f64::from(k * k);
    }

    val
}
