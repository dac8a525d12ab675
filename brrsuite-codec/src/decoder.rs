// BRR Suite
// Copyright (c) 2022-2025 The BRR Suite Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `decoder` module emulates the S-DSP's sample playback: nibble decoding through the
//! prediction filters, a pitch accumulator driving sample consumption, and 4-tap Gaussian
//! interpolation of the output.
//!
//! The emulation is faithful to the documented DSP behavior but is not guaranteed to be
//! cycle-exact against silicon.

use log::warn;

use brrsuite_core::common::{DEFAULT_VX_PITCH, DSP_FREQUENCY, PCM_BLOCK_SIZE};
use brrsuite_core::dsp::{self, gauss::GAUSS_TABLE};
use brrsuite_core::errors::Result;
use brrsuite_core::sample::BrrSample;

/// The highest valid VxPITCH register value.
const MAX_PITCH: u16 = 0x3fff;

/// The cap on the requested output duration in seconds.
const MAX_SECONDS: f64 = 10.0;

/// The cap on loop unrolling.
const MAX_LOOP_ITERATIONS: usize = 777;

/// The decoder's playback state: the decode position within the sample and the four most
/// recently decoded history values feeding the Gaussian interpolator.
struct Playback<'a> {
    sample: &'a BrrSample,
    pos: usize,
    loop_start: Option<usize>,
    ended: bool,
    p1: i32,
    p2: i32,
    p3: i32,
    p4: i32,
}

impl<'a> Playback<'a> {
    fn new(sample: &'a BrrSample) -> Playback<'a> {
        Playback {
            sample,
            pos: 0,
            loop_start: sample.loop_block().map(|block| block * PCM_BLOCK_SIZE),
            ended: false,
            // Arbitrary garbage emulating the DSP's undefined power-up state. Flushed by the
            // priming reads before any output is produced.
            p1: 0xbebe,
            p2: 5656,
            p3: 0x4040,
            p4: -0x7171,
        }
    }

    /// Decodes the sample at the current position into the history, advancing the position and
    /// wrapping to the loop point at the end of a looping sample. Consumption past the end of a
    /// one-shot sample freezes the history.
    fn consume(&mut self) -> Result<()> {
        if self.ended {
            return Ok(());
        }

        let block = self.sample.block(self.pos / PCM_BLOCK_SIZE)?;
        let residual = block.sample(self.pos % PCM_BLOCK_SIZE)?;
        let predict = dsp::prediction_filter(block.filter())?;

        let value = dsp::apply_range(residual, block.range()) + predict(self.p1, self.p2);

        self.p4 = self.p3;
        self.p3 = self.p2;
        self.p2 = self.p1;
        self.p1 = value;

        self.pos += 1;
        if self.pos >= self.sample.block_count() * PCM_BLOCK_SIZE {
            match self.loop_start {
                Some(start) => self.pos = start,
                None => self.ended = true,
            }
        }

        Ok(())
    }

    /// Mixes the history through the Gaussian table at the given interpolation index.
    fn interpolate(&self, x: usize) -> i16 {
        let mix = (GAUSS_TABLE[0xff - x] * self.p4
            + GAUSS_TABLE[0x1ff - x] * self.p3
            + GAUSS_TABLE[0x100 + x] * self.p2
            + GAUSS_TABLE[x] * self.p1)
            >> 10;

        dsp::clip(mix >> 1) as i16
    }
}

/// Decodes a BRR sample into PCM at 32000 Hz, emulating DSP playback at the given pitch.
///
/// `pitch` is a VxPITCH register value; values outside [1, 0x3FFF] fall back to 0x1000 (unity).
/// For looping samples the loop is unrolled until the output covers `min_seconds` of audio
/// (capped at 10 seconds) at the pitch-scaled consumption rate, with at least one and at most
/// 777 iterations.
pub fn decode(sample: &BrrSample, pitch: u16, min_seconds: f64) -> Result<Vec<i16>> {
    let pitch = if pitch == 0 || pitch > MAX_PITCH {
        warn!("decode: pitch {:#06x} out of range, using {:#06x}", pitch, DEFAULT_VX_PITCH);
        DEFAULT_VX_PITCH
    }
    else {
        pitch
    };

    let block_count = sample.block_count();

    let output_len = match sample.loop_block() {
        None => block_count * PCM_BLOCK_SIZE,
        Some(loop_block) => {
            let loop_blocks = block_count - loop_block;

            // Samples consumed per second of output at this pitch.
            let rate =
                f64::from(DSP_FREQUENCY) * f64::from(pitch) / f64::from(DEFAULT_VX_PITCH);
            let needed = (min_seconds.clamp(0.0, MAX_SECONDS) * rate).ceil() as usize;

            let base = block_count * PCM_BLOCK_SIZE;
            let loop_len = loop_blocks * PCM_BLOCK_SIZE;

            let iterations = if needed > base {
                (needed - base + loop_len - 1) / loop_len
            }
            else {
                0
            };
            let iterations = iterations.clamp(1, MAX_LOOP_ITERATIONS);

            (block_count + iterations * loop_blocks) * PCM_BLOCK_SIZE
        }
    };

    let mut playback = Playback::new(sample);

    // Prime the interpolator: four samples enter the history before any output is produced.
    for _ in 0..4 {
        playback.consume()?;
    }

    let mut output = vec![0i16; output_len];
    let mut accumulator: u32 = 0;

    for slot in output.iter_mut() {
        *slot = playback.interpolate(((accumulator >> 4) & 0xff) as usize);

        accumulator += u32::from(pitch);
        while accumulator >= 0x1000 {
            accumulator -= 0x1000;
            playback.consume()?;
        }
    }

    Ok(output)
}

#[cfg(test)]
mod tests {
    use crate::encoder::{BrrEncoder, EncoderOptions};

    use super::*;

    fn tone(len: usize) -> Vec<i16> {
        (0..len).map(|i| ((i as f64 * 0.2).sin() * 18000.0) as i16).collect()
    }

    #[test]
    fn verify_output_length_one_shot() {
        let sample = BrrEncoder::new(EncoderOptions::default()).encode(&tone(160), None).unwrap();

        let output = decode(&sample, DEFAULT_VX_PITCH, 0.0).unwrap();
        assert_eq!(output.len(), 160);
    }

    #[test]
    fn verify_output_length_looping() {
        let sample =
            BrrEncoder::new(EncoderOptions::default()).encode(&tone(160), Some(96)).unwrap();
        assert_eq!(sample.loop_block(), Some(6));

        // A minimal request still unrolls the loop once.
        let output = decode(&sample, DEFAULT_VX_PITCH, 0.0).unwrap();
        assert_eq!(output.len(), (10 + 4) * PCM_BLOCK_SIZE);

        // Half a second at 32 kHz is 16000 samples: 160 base plus ceil(15840 / 64) = 248 loops.
        let output = decode(&sample, DEFAULT_VX_PITCH, 0.5).unwrap();
        assert_eq!(output.len(), (10 + 248 * 4) * PCM_BLOCK_SIZE);
    }

    #[test]
    fn verify_loop_iteration_cap() {
        let sample =
            BrrEncoder::new(EncoderOptions::default()).encode(&tone(160), Some(96)).unwrap();

        // Ten seconds would need thousands of iterations of a 64-sample loop; the cap holds.
        let output = decode(&sample, DEFAULT_VX_PITCH, 10.0).unwrap();
        assert_eq!(output.len(), (10 + 777 * 4) * PCM_BLOCK_SIZE);
    }

    #[test]
    fn verify_silent_lead_in_decodes_to_silence() {
        let opts = EncoderOptions {
            leading_zeros: Some(32),
            force_filter0_on_loop: true,
            ..Default::default()
        };
        let sample = BrrEncoder::new(opts).encode(&tone(160), Some(96)).unwrap();

        let output = decode(&sample, DEFAULT_VX_PITCH, 0.0).unwrap();

        // The forced zeros cover the priming reads and the first block of output.
        for (i, &value) in output.iter().take(16).enumerate() {
            assert_eq!(value, 0, "sample {} is not silent", i);
        }
    }

    #[test]
    fn verify_pitch_fallback() {
        let sample = BrrEncoder::new(EncoderOptions::default()).encode(&tone(96), None).unwrap();

        let unity = decode(&sample, DEFAULT_VX_PITCH, 0.0).unwrap();
        let fallback = decode(&sample, 0, 0.0).unwrap();
        let too_high = decode(&sample, 0x4000, 0.0).unwrap();

        assert_eq!(unity, fallback);
        assert_eq!(unity, too_high);
    }

    #[test]
    fn verify_determinism() {
        let sample = BrrEncoder::new(EncoderOptions::default()).encode(&tone(320), None).unwrap();

        let a = decode(&sample, 0x0800, 0.0).unwrap();
        let b = decode(&sample, 0x0800, 0.0).unwrap();
        assert_eq!(a, b);
    }
}
