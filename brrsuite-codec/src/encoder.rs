// BRR Suite
// Copyright (c) 2022-2025 The BRR Suite Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `encoder` module implements the BRR encoder pipeline: truncation, resampling, external
//! pre-filters, leading-zero normalization, and the exhaustive per-block search over the
//! (filter, range) space.
//!
//! The per-sample quantization arithmetic intentionally reproduces the reference encoder
//! bit-for-bit, including its error-wrapping and overflow quirks. Do not "fix" it; decoders
//! replay exactly this arithmetic.

use log::debug;

use brrsuite_core::block::BrrBlockMut;
use brrsuite_core::common::{MAX_BLOCKS, MAX_LEADING_ZEROS, MAX_RANGE, PCM_BLOCK_SIZE};
use brrsuite_core::dsp;
use brrsuite_core::errors::{invalid_argument_error, Result};
use brrsuite_core::sample::BrrSample;

use crate::resample::ResampleMethod;

/// An external waveform filter applied in place between resampling and encoding.
pub type PcmFilter = fn(&mut [i16]);

/// Configuration for [`BrrEncoder`].
#[derive(Clone)]
pub struct EncoderOptions {
    /// The interpolation kernel used by the resampling stage.
    pub resample_method: ResampleMethod,
    /// External pre-filters, applied in order after resampling.
    pub filters: Vec<PcmFilter>,
    /// The ratio of the input rate to the target rate. Must be positive.
    pub resample_factor: f64,
    /// Upper bound on the number of input samples used, if set.
    pub truncate: Option<usize>,
    /// Forced number of leading zero samples at the start of the output, if set. Capped at
    /// [`MAX_LEADING_ZEROS`]. When unset, only block alignment zeros are added.
    pub leading_zeros: Option<u32>,
    /// Which prediction filters the search may choose for blocks past the first.
    pub enabled_filters: [bool; 4],
    /// Pins filter 0 at the loop block so playback can re-enter the loop from any state.
    pub force_filter0_on_loop: bool,
}

impl Default for EncoderOptions {
    fn default() -> Self {
        EncoderOptions {
            resample_method: ResampleMethod::default(),
            filters: Vec::new(),
            resample_factor: 1.0,
            truncate: None,
            leading_zeros: None,
            enabled_filters: [true; 4],
            force_filter0_on_loop: false,
        }
    }
}

/// The prediction history carried across samples and blocks.
#[derive(Clone, Copy, Default)]
struct PredictorState {
    p1: i32,
    p2: i32,
}

/// The history and filter captured at the loop block, used to score how well the final block
/// hands playback back to the loop point.
#[derive(Clone, Copy)]
struct LoopState {
    p1: i32,
    p2: i32,
    filter: u8,
}

/// A configurable BRR encoder.
pub struct BrrEncoder {
    opts: EncoderOptions,
}

impl BrrEncoder {
    pub fn new(opts: EncoderOptions) -> BrrEncoder {
        BrrEncoder { opts }
    }

    /// Encodes 16-bit PCM into a BRR sample.
    ///
    /// `loop_point` is a sample index into `pcm` marking the start of the loop region, or `None`
    /// for a one-shot sample. The resampling ratio is adjusted so a loop region always covers a
    /// whole number of blocks.
    pub fn encode(&self, pcm: &[i16], loop_point: Option<usize>) -> Result<BrrSample> {
        if pcm.is_empty() {
            return invalid_argument_error("encode: no input samples");
        }
        if !(self.opts.resample_factor > 0.0) {
            return invalid_argument_error("encode: resample factor must be positive");
        }

        // Stage 1: truncate.
        let pcm = match self.opts.truncate {
            Some(count) if count >= 1 && count <= pcm.len() => &pcm[..count],
            _ => pcm,
        };

        if let Some(point) = loop_point {
            if point >= pcm.len() {
                return invalid_argument_error("encode: loop point lies past the end of the input");
            }
        }

        // Stage 2: derive the output length. For looping input the ratio is adjusted so that
        // the loop region resamples to a whole number of blocks.
        let factor = self.opts.resample_factor;
        let in_len = pcm.len() as f64;

        let (target_len, loop_size) = match loop_point {
            None => ((in_len / factor).round() as usize, None),
            Some(point) => {
                let old_loop = (pcm.len() - point) as f64 / factor;
                let new_loop = (old_loop / PCM_BLOCK_SIZE as f64).ceil() * PCM_BLOCK_SIZE as f64;
                let target = (in_len / factor * (new_loop / old_loop)).round() as usize;
                (target, Some(new_loop as usize))
            }
        };
        let target_len = target_len.max(1);

        // Stage 3: resample.
        let mut data = self.opts.resample_method.resample(pcm, pcm.len(), target_len)?;

        // Stage 4: external pre-filters.
        for filter in &self.opts.filters {
            filter(&mut data);
        }

        // Stage 5: leading-zero normalization.
        let pad = match self.opts.leading_zeros {
            None => (PCM_BLOCK_SIZE - data.len() % PCM_BLOCK_SIZE) % PCM_BLOCK_SIZE,
            Some(zeros) => {
                let zeros = zeros.min(MAX_LEADING_ZEROS) as usize;

                let existing = data.iter().take_while(|&&s| s == 0).count();
                // Trimming must never reach into the loop region at the tail.
                let existing = match loop_size {
                    Some(size) => existing.min(data.len() - size),
                    None => existing,
                };
                data.drain(..existing);

                let mut pad = (PCM_BLOCK_SIZE - data.len() % PCM_BLOCK_SIZE) % PCM_BLOCK_SIZE;
                if pad < zeros {
                    // Zeros past the alignment requirement grow in whole blocks.
                    pad += (zeros - pad + PCM_BLOCK_SIZE - 1) / PCM_BLOCK_SIZE * PCM_BLOCK_SIZE;
                }
                if data.is_empty() && pad == 0 {
                    // The input was silence and no zeros were requested; keep one silent block.
                    pad = PCM_BLOCK_SIZE;
                }
                pad
            }
        };

        if pad > 0 {
            let mut padded = vec![0i16; pad];
            padded.extend_from_slice(&data);
            data = padded;
        }

        // Stage 6: the brute-force search.
        let block_count = data.len() / PCM_BLOCK_SIZE;
        if block_count > MAX_BLOCKS {
            return invalid_argument_error("encode: output exceeds the maximum block count");
        }

        let loop_block = loop_size.map(|size| (data.len() - size) / PCM_BLOCK_SIZE);

        debug!(
            "encode: {} samples -> {} blocks, loop block {:?}",
            pcm.len(),
            block_count,
            loop_block
        );

        let mut sample = BrrSample::new(block_count)?;
        sample.set_loop_block(loop_block);

        self.search(&data, loop_block, &mut sample)?;

        Ok(sample)
    }

    /// Runs the exhaustive (filter, range) search over every block of `data` and writes the
    /// winning encodings into `sample`.
    fn search(&self, data: &[i16], loop_block: Option<usize>, sample: &mut BrrSample) -> Result<()> {
        let block_count = data.len() / PCM_BLOCK_SIZE;
        let looping = loop_block.is_some();

        let mut state = PredictorState::default();
        let mut loop_state: Option<LoopState> = None;

        for n in 0..block_count {
            let samples = &data[n * PCM_BLOCK_SIZE..(n + 1) * PCM_BLOCK_SIZE];
            let is_final = n + 1 == block_count;
            let at_loop = loop_block == Some(n);

            let entry = state;

            // The closure state used to score final-block candidates of a looping sample. When
            // the loop block is the final block itself, the candidate's own filter stands in.
            let closure = move |candidate: u8| -> Option<LoopState> {
                if !(is_final && looping) {
                    return None;
                }
                match loop_state {
                    Some(ls) => Some(ls),
                    None => Some(LoopState { p1: entry.p1, p2: entry.p2, filter: candidate }),
                }
            };

            // Seed the search with a (filter 0, range 0) baseline. Candidates must strictly
            // beat the incumbent, so an all-ties block (silence) keeps the baseline encoding.
            let (mut best_filter, mut best_range) = (0u8, 0u8);
            let mut best_error = {
                let mut trial = entry;
                let sum = encode_block(samples, 0, 0, &mut trial, None)?;
                scored_error(sum, &trial, closure(0))
            };

            for filter in 0..4u8 {
                let allowed = if n == 0 {
                    filter == 0
                }
                else if at_loop && self.opts.force_filter0_on_loop {
                    filter == 0
                }
                else {
                    self.opts.enabled_filters[usize::from(filter)]
                };

                if !allowed {
                    continue;
                }

                for range in 1..=MAX_RANGE {
                    let mut trial = entry;
                    let sum = encode_block(samples, filter, range, &mut trial, None)?;
                    let error = scored_error(sum, &trial, closure(filter));

                    if error < best_error {
                        best_error = error;
                        best_filter = filter;
                        best_range = range;
                    }
                }
            }

            // Re-run the winner in write mode.
            state = entry;
            let mut block = sample.block_mut(n)?;
            encode_block(samples, best_filter, best_range, &mut state, Some(&mut block))?;

            if is_final {
                block.set_end_flag(true);
                if looping {
                    block.set_loop_flag(true);
                }
            }

            if at_loop {
                // Capture the history entering the loop block: these are the decoded samples
                // immediately before the loop point, which the post-loop jump must reproduce.
                loop_state =
                    Some(LoopState { p1: entry.p1, p2: entry.p2, filter: best_filter });
            }
        }

        Ok(())
    }
}

/// Scores a trial block: mean squared error per sample, extended by the loop-closure mismatch
/// for the final block of a looping sample.
fn scored_error(sum: f64, end: &PredictorState, closure: Option<LoopState>) -> f64 {
    match closure {
        Some(loop_state) => match loop_state.filter {
            0 => sum / 16.0,
            1 => {
                let d1 = f64::from(end.p1 - loop_state.p1);
                (sum + d1 * d1) / 17.0
            }
            _ => {
                let d1 = f64::from(end.p1 - loop_state.p1);
                let d2 = f64::from(end.p2 - loop_state.p2);
                (sum + d1 * d1 + d2 * d2) / 18.0
            }
        },
        None => sum / 16.0,
    }
}

/// Quantizes one block of 16 samples with the given filter and range, accumulating the squared
/// error against the input. In write mode the residuals and header are emitted through the
/// block view.
///
/// This is the quirk-preserving core: the error wrap test, its mask, and the overflow
/// replacement of the running estimate are reproduced exactly from the reference encoder.
fn encode_block(
    samples: &[i16],
    filter: u8,
    range: u8,
    state: &mut PredictorState,
    mut out: Option<&mut BrrBlockMut<'_>>,
) -> Result<f64> {
    let predict = dsp::prediction_filter(filter)?;
    let step = (1i32 << (range + 2)) + ((1i32 << range) >> 2);

    let mut l1 = state.p1;
    let mut l2 = state.p2;
    let mut error = 0.0f64;

    for (i, &sample) in samples.iter().enumerate() {
        let sample = i32::from(sample);
        let linear = predict(l1, l2) >> 1;

        let mut sample_error = (sample >> 1) - linear;
        if sample_error > 16384 && sample_error < 32768 {
            sample_error = (sample_error >> 9) & 0x07ff_8000;
        }

        let dp = sample_error + step;
        let residual = if dp > 0 { ((dp << 1) >> range).clamp(0, 15) - 8 } else { -8 };

        // Decode the residual the way the DSP will and fold it back into the running estimate.
        let decoded = (residual << range) >> 1;
        let mut next = linear + decoded;
        if next < i32::from(i16::MIN) || next > i32::from(i16::MAX) {
            next = i32::from((0x7fff - (next >> 24)) as i16);
        }
        next <<= 1;

        l2 = l1;
        l1 = next;

        let delta = f64::from(sample - l1);
        error += delta * delta;

        if let Some(block) = out.as_deref_mut() {
            block.set_sample(i, residual)?;
        }
    }

    if let Some(block) = out {
        block.set_header((range << 4) | (filter << 2));
    }

    state.p1 = l1;
    state.p2 = l2;

    Ok(error)
}

#[cfg(test)]
mod tests {
    use rand::rngs::SmallRng;
    use rand::{Rng, SeedableRng};

    use brrsuite_core::common::DataIssue;

    use super::*;

    fn encoder() -> BrrEncoder {
        BrrEncoder::new(EncoderOptions::default())
    }

    #[test]
    fn verify_argument_validation() {
        assert!(encoder().encode(&[], None).is_err());
        assert!(encoder().encode(&[0i16; 32], Some(32)).is_err());

        let opts = EncoderOptions { resample_factor: 0.0, ..Default::default() };
        assert!(BrrEncoder::new(opts).encode(&[0i16; 16], None).is_err());
    }

    #[test]
    fn verify_single_silent_block() {
        let sample = encoder().encode(&[0i16; 16], None).unwrap();

        assert_eq!(sample.block_count(), 1);
        // Range 0, filter 0, end flag set on the only (and final) block.
        assert_eq!(sample.as_bytes()[0], 0x01);
        assert_eq!(&sample.as_bytes()[1..], &[0u8; 8]);
    }

    #[test]
    fn verify_two_silent_blocks() {
        let sample = encoder().encode(&[0i16; 32], None).unwrap();

        assert_eq!(sample.block_count(), 2);
        assert_eq!(sample.as_bytes()[0], 0x00);
        assert_eq!(sample.as_bytes()[9], 0x01);
        assert_eq!(&sample.as_bytes()[1..9], &[0u8; 8]);
        assert_eq!(&sample.as_bytes()[10..], &[0u8; 8]);
    }

    fn noise(len: usize, seed: u64) -> Vec<i16> {
        let mut rng = SmallRng::seed_from_u64(seed);
        (0..len).map(|_| rng.gen_range(-24000..24000)).collect()
    }

    #[test]
    fn verify_block_count_and_flags() {
        let pcm = noise(160, 7);
        let sample = encoder().encode(&pcm, None).unwrap();

        assert_eq!(sample.block_count(), 160 / PCM_BLOCK_SIZE);
        for i in 0..sample.block_count() {
            let block = sample.block(i).unwrap();
            assert_eq!(block.end_flag(), i + 1 == sample.block_count());
            assert!(!block.loop_flag());
        }

        // Loud input leaves only the advisory initial-residuals note, if anything.
        let issues = sample.validate();
        assert!(issues.is_resolvable());
        assert!(DataIssue::BLOCK0_SAMPLES.contains(issues));
    }

    #[test]
    fn verify_alignment_padding() {
        // 40 input samples align up to 48: three blocks.
        let pcm = noise(40, 11);
        let sample = encoder().encode(&pcm, None).unwrap();
        assert_eq!(sample.block_count(), 3);
    }

    #[test]
    fn verify_determinism() {
        let pcm = noise(320, 23);

        let a = encoder().encode(&pcm, Some(160)).unwrap();
        let b = encoder().encode(&pcm, Some(160)).unwrap();

        assert_eq!(a.as_bytes(), b.as_bytes());
        assert_eq!(a.loop_block(), b.loop_block());
    }

    #[test]
    fn verify_loop_block_and_flags() {
        let pcm = noise(160, 3);
        let sample = encoder().encode(&pcm, Some(64)).unwrap();

        assert_eq!(sample.block_count(), 10);
        assert_eq!(sample.loop_block(), Some(4));

        let last = sample.block(9).unwrap();
        assert!(last.end_flag());
        assert!(last.loop_flag());
        assert!(sample.validate().is_resolvable());
    }

    #[test]
    fn verify_loop_region_resamples_to_whole_blocks() {
        // Downsampling by 2 turns a 100-sample loop region into 50 samples, which rounds up to
        // 64: the adjusted ratio keeps the loop region a whole number of blocks.
        let pcm = noise(300, 31);
        let opts = EncoderOptions { resample_factor: 2.0, ..Default::default() };
        let sample = BrrEncoder::new(opts).encode(&pcm, Some(200)).unwrap();

        let loop_blocks = sample.block_count() - sample.loop_block().unwrap();
        assert_eq!(loop_blocks, 4);
    }

    #[test]
    fn verify_forced_leading_zeros() {
        // Five existing leading zeros followed by a nonzero ramp.
        let mut pcm: Vec<i16> = (0..48i16).map(|i| 100 + i * 7).collect();
        for sample in pcm.iter_mut().take(5) {
            *sample = 0;
        }

        let opts = EncoderOptions { leading_zeros: Some(20), ..Default::default() };
        let sample = BrrEncoder::new(opts).encode(&pcm, None).unwrap();

        // 43 non-zero-prefixed samples align with 5 zeros; 5 < 20 forces one more block,
        // for 21 leading zeros and 64 samples in total.
        assert_eq!(sample.block_count(), 4);

        // The first block therefore encodes pure silence.
        assert_eq!(&sample.as_bytes()[..9], &[0u8; 9]);
    }

    #[test]
    fn verify_first_block_uses_filter_zero() {
        let pcm = noise(128, 99);
        let sample = encoder().encode(&pcm, None).unwrap();

        assert_eq!(sample.block(0).unwrap().filter(), 0);
    }

    #[test]
    fn verify_disabled_filters_are_not_chosen() {
        let pcm = noise(256, 5);
        let opts =
            EncoderOptions { enabled_filters: [true, false, false, false], ..Default::default() };
        let sample = BrrEncoder::new(opts).encode(&pcm, None).unwrap();

        for i in 0..sample.block_count() {
            assert_eq!(sample.block(i).unwrap().filter(), 0);
        }
    }

    #[test]
    fn verify_forced_filter_zero_on_loop_block() {
        let pcm: Vec<i16> = (0..160).map(|i| ((f64::from(i) * 0.7).sin() * 20000.0) as i16).collect();

        let opts = EncoderOptions { force_filter0_on_loop: true, ..Default::default() };
        let sample = BrrEncoder::new(opts).encode(&pcm, Some(96)).unwrap();

        let loop_block = sample.loop_block().unwrap();
        assert_eq!(sample.block(loop_block).unwrap().filter(), 0);
    }
}
