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

//! The core of BRR Suite: the bit-level model of the Bit Rate Reduction format used by the SNES
//! S-DSP, the sample container that owns a BRR byte stream, and the arithmetic of the DSP's
//! decode path.
//!
//! Encoding, decoding, and the on-disk suite container are built on top of this crate by
//! `brrsuite-codec` and `brrsuite-format-brs`.

pub mod block;
pub mod checksum;
pub mod common;
pub mod dsp;
pub mod errors;
pub mod io;
pub mod sample;
pub mod util;
