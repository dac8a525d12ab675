// BRR Suite
// Copyright (c) 2022-2025 The BRR Suite Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `resample` module provides the interpolation kernels used by the encoder's resampling
//! stage.
//!
//! Every kernel is a pure function of `(input, in_len, out_len)`. Kernels are selected through
//! [`ResampleMethod`], which also owns the argument validation and the mandatory fast-copy path
//! taken when the input and output lengths are equal.

use std::f64::consts::PI;

use brrsuite_core::errors::{invalid_argument_error, Result};
use brrsuite_core::util::clamp::clamp_i16;

/// The width of the band-limited kernel on either side of the output position.
const SINC_WIDTH: usize = 15;

/// An interpolation kernel for the encoder's resampling stage.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ResampleMethod {
    /// Nearest-neighbor: each output sample copies the closest input sample.
    Nearest,
    /// Two-point linear interpolation.
    Linear,
    /// Two-point raised-cosine interpolation.
    Sine,
    /// Four-point cubic interpolation with edge replication.
    #[default]
    Cubic,
    /// Windowed-sinc reconstruction with an antialiasing low-pass when downsampling.
    BandLimited,
}

impl ResampleMethod {
    /// Resamples the first `in_len` samples of `input` to `out_len` samples.
    ///
    /// Both lengths must be positive and `in_len` must not exceed the input length. Equal
    /// lengths take a fast-copy path and never touch a kernel.
    pub fn resample(&self, input: &[i16], in_len: usize, out_len: usize) -> Result<Vec<i16>> {
        if in_len == 0 || out_len == 0 {
            return invalid_argument_error("resample: lengths must be positive");
        }
        if in_len > input.len() {
            return invalid_argument_error("resample: in_len exceeds the input length");
        }

        let input = &input[..in_len];

        if in_len == out_len {
            return Ok(input.to_vec());
        }

        let output = match *self {
            ResampleMethod::Nearest => nearest(input, out_len),
            ResampleMethod::Linear => linear(input, out_len),
            ResampleMethod::Sine => sine(input, out_len),
            ResampleMethod::Cubic => cubic(input, out_len),
            ResampleMethod::BandLimited => band_limited(input, out_len),
        };

        Ok(output)
    }
}

/// The normalized sinc function, `sin(pi x) / (pi x)`, with `sinc(0) = 1`.
pub(crate) fn sinc(x: f64) -> f64 {
    if x == 0.0 {
        1.0
    }
    else {
        (PI * x).sin() / (PI * x)
    }
}

/// Rounds and saturates an interpolated value back to a PCM sample. The cubic and sinc kernels
/// overshoot, so saturation is required.
#[inline]
fn quantize(value: f64) -> i16 {
    clamp_i16(value.round() as i32)
}

#[inline]
fn position(index: usize, step: f64) -> (usize, f64) {
    let t = index as f64 * step;
    let base = t as usize;
    (base, t - base as f64)
}

fn nearest(input: &[i16], out_len: usize) -> Vec<i16> {
    let step = input.len() as f64 / out_len as f64;
    let last = input.len() - 1;

    (0..out_len).map(|i| input[((i as f64 * step) as usize).min(last)]).collect()
}

fn linear(input: &[i16], out_len: usize) -> Vec<i16> {
    let step = input.len() as f64 / out_len as f64;
    let last = input.len() - 1;

    (0..out_len)
        .map(|i| {
            let (base, frac) = position(i, step);
            let s0 = f64::from(input[base.min(last)]);
            let s1 = f64::from(input[(base + 1).min(last)]);
            quantize(s0 + (s1 - s0) * frac)
        })
        .collect()
}

fn sine(input: &[i16], out_len: usize) -> Vec<i16> {
    let step = input.len() as f64 / out_len as f64;
    let last = input.len() - 1;

    (0..out_len)
        .map(|i| {
            let (base, frac) = position(i, step);
            let s0 = f64::from(input[base.min(last)]);
            let s1 = f64::from(input[(base + 1).min(last)]);
            // Raised-cosine weight in place of the linear fraction.
            let c = (1.0 - (PI * frac).cos()) / 2.0;
            quantize(s0 + (s1 - s0) * c)
        })
        .collect()
}

fn cubic(input: &[i16], out_len: usize) -> Vec<i16> {
    let step = input.len() as f64 / out_len as f64;
    let last = input.len() - 1;

    (0..out_len)
        .map(|i| {
            let (base, t) = position(i, step);

            // Edge replication: the first sample stands in for its missing predecessor and the
            // last sample for everything past the tail.
            let p0 = f64::from(input[base.saturating_sub(1)]);
            let p1 = f64::from(input[base.min(last)]);
            let p2 = f64::from(input[(base + 1).min(last)]);
            let p3 = f64::from(input[(base + 2).min(last)]);

            let a0 = p3 - p2 - p0 + p1;
            let a1 = p0 - p1 - a0;
            let a2 = p2 - p0;
            let a3 = p1;

            quantize(((a0 * t + a1) * t + a2) * t + a3)
        })
        .collect()
}

fn band_limited(input: &[i16], out_len: usize) -> Vec<i16> {
    let ratio = input.len() as f64 / out_len as f64;
    let last = input.len() - 1;

    let mut source: Vec<f64> = input.iter().map(|&s| f64::from(s)).collect();

    // When downsampling, remove content above the new Nyquist limit first. The kernel is a
    // 16-tap half filter mirrored around the center tap, with edges clamped to the endpoint
    // samples.
    if ratio > 1.0 {
        let mut kernel = [0.0f64; SINC_WIDTH + 1];
        for (k, coeff) in kernel.iter_mut().enumerate() {
            *coeff = sinc(k as f64 / ratio) / ratio;
        }

        let filtered: Vec<f64> = (0..source.len())
            .map(|i| {
                let mut acc = source[i] * kernel[0];
                for (k, &coeff) in kernel.iter().enumerate().skip(1) {
                    let lo = source[i.saturating_sub(k)];
                    let hi = source[(i + k).min(last)];
                    acc += (lo + hi) * coeff;
                }
                acc
            })
            .collect();

        source = filtered;
    }

    (0..out_len)
        .map(|i| {
            let t = i as f64 * ratio;
            let base = t as isize;

            let mut acc = 0.0;
            for j in (base - SINC_WIDTH as isize)..=(base + SINC_WIDTH as isize) {
                let sample = source[j.clamp(0, last as isize) as usize];
                acc += sample * sinc(t - j as f64);
            }

            quantize(acc)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const RAMP: [i16; 8] = [0, 1000, 2000, 3000, 4000, 5000, 6000, 7000];

    #[test]
    fn verify_argument_validation() {
        for method in
            [ResampleMethod::Nearest, ResampleMethod::Cubic, ResampleMethod::BandLimited]
        {
            assert!(method.resample(&RAMP, 0, 8).is_err());
            assert!(method.resample(&RAMP, 8, 0).is_err());
            assert!(method.resample(&RAMP, 9, 8).is_err());
        }
    }

    #[test]
    fn verify_fast_copy() {
        for method in [
            ResampleMethod::Nearest,
            ResampleMethod::Linear,
            ResampleMethod::Sine,
            ResampleMethod::Cubic,
            ResampleMethod::BandLimited,
        ] {
            assert_eq!(method.resample(&RAMP, 8, 8).unwrap(), &RAMP);
            assert_eq!(method.resample(&RAMP, 4, 4).unwrap(), &RAMP[..4]);
        }
    }

    #[test]
    fn verify_sinc() {
        assert_eq!(sinc(0.0), 1.0);
        for k in 1..8 {
            assert!(sinc(f64::from(k)).abs() < 1e-12);
            assert!(sinc(f64::from(-k)).abs() < 1e-12);
        }
    }

    #[test]
    fn verify_nearest() {
        let out = ResampleMethod::Nearest.resample(&RAMP, 8, 4).unwrap();
        assert_eq!(out, vec![0, 2000, 4000, 6000]);

        let out = ResampleMethod::Nearest.resample(&RAMP, 4, 8).unwrap();
        assert_eq!(out, vec![0, 0, 1000, 1000, 2000, 2000, 3000, 3000]);
    }

    #[test]
    fn verify_linear_midpoints() {
        let out = ResampleMethod::Linear.resample(&RAMP, 4, 8).unwrap();
        assert_eq!(out, vec![0, 500, 1000, 1500, 2000, 2500, 3000, 3000]);
    }

    #[test]
    fn verify_interpolators_preserve_constants() {
        let input = [500i16; 16];

        for method in [ResampleMethod::Linear, ResampleMethod::Sine, ResampleMethod::Cubic] {
            let out = method.resample(&input, 16, 11).unwrap();
            assert_eq!(out.len(), 11);
            for &s in &out {
                assert!((s - 500).abs() <= 1, "{:?} produced {}", method, s);
            }
        }

        // The truncated sinc kernel passes DC with about 1% of ripple.
        let out = ResampleMethod::BandLimited.resample(&input, 16, 11).unwrap();
        for &s in &out {
            assert!((s - 500).abs() <= 8, "band-limited produced {}", s);
        }
    }
}
