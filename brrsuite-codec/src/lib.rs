// BRR Suite
// Copyright (c) 2022-2025 The BRR Suite Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

#![warn(rust_2018_idioms)]
#![forbid(unsafe_code)]
// The following lints are allowed in all BRR Suite crates. Please see the workspace Cargo.toml for
// their justification.
#![allow(clippy::comparison_chain)]
#![allow(clippy::identity_op)]
#![allow(clippy::manual_range_contains)]

//! The BRR Suite codec: a brute-force ADPCM encoder with a resampling front-end, and a decoder
//! that emulates the S-DSP's pitch-driven, Gaussian-interpolated playback.

pub mod decoder;
pub mod encoder;
pub mod resample;

pub use decoder::decode;
pub use encoder::{BrrEncoder, EncoderOptions, PcmFilter};
pub use resample::ResampleMethod;
