// BRR Suite
// Copyright (c) 2022-2025 The BRR Suite Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

#![warn(rust_2018_idioms)]
#![forbid(unsafe_code)]

//! # BRR Suite
//!
//! BRR Suite is a pure Rust library for the Bit Rate Reduction (BRR) audio format of the Super
//! Nintendo's S-DSP: a brute-force ADPCM encoder, a DSP-faithful playback decoder, stream
//! validation, and the on-disk containers.
//!
//! # Usage
//!
//! The following steps describe a basic use of BRR Suite:
//!
//! 1. Build an [`EncoderOptions`][codec::encoder::EncoderOptions] describing the resampling
//!    ratio, interpolation kernel, filter toggles, and leading-zero policy, then instantiate a
//!    [`BrrEncoder`][codec::encoder::BrrEncoder] with it.
//! 2. Call [`encode`][codec::encoder::BrrEncoder::encode] with 16-bit PCM and an optional loop
//!    sample index. The result is a [`BrrSample`][core::sample::BrrSample] owning the encoded
//!    byte stream and its loop block.
//! 3. Inspect or repair a sample with [`validate`][core::sample::BrrSample::validate] and
//!    [`correct_end_flags`][core::sample::BrrSample::correct_end_flags], and serialize it raw
//!    or loop-headered.
//! 4. To audition a sample, call [`decode`][codec::decoder::decode] with a VxPITCH value; the
//!    output is PCM at 32 kHz, Gaussian-interpolated the way the DSP plays it.
//! 5. To ship a sample with its metadata, wrap it in a
//!    [`SuiteSample`][brs::SuiteSample] and use
//!    [`to_bytes`][brs::SuiteSample::to_bytes] / [`parse`][brs::SuiteSample::parse].

pub use brrsuite_codec as codec;
pub use brrsuite_core as core;
pub use brrsuite_format_brs as brs;

pub use brrsuite_codec::{decode, BrrEncoder, EncoderOptions, ResampleMethod};
pub use brrsuite_core::errors::{Error, Result};
pub use brrsuite_core::sample::BrrSample;
pub use brrsuite_format_brs::SuiteSample;
