// BRR Suite
// Copyright (c) 2022-2025 The BRR Suite Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `meta` module defines the suite container's loop-behavior taxonomy and the instrument
//! name encoding.

use brrsuite_core::errors::{bad_format_error, Result};

/// The length of the instrument name field in characters and bytes (Latin-1).
pub const INSTRUMENT_NAME_LEN: usize = 24;

/// How a suite sample's loop point is to be interpreted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoopBehavior {
    /// The sample plays once.
    NonLooping,
    /// The sample loops to a block boundary within itself.
    Looping,
    /// The sample loops to memory outside itself. Advisory; the loop point cannot be checked.
    Extrinsic,
    /// The loop point is not aligned to a block boundary. Advisory.
    Misaligned,
}

impl LoopBehavior {
    pub fn from_byte(byte: u8) -> Result<LoopBehavior> {
        match byte {
            0 => Ok(LoopBehavior::NonLooping),
            1 => Ok(LoopBehavior::Looping),
            2 => Ok(LoopBehavior::Extrinsic),
            3 => Ok(LoopBehavior::Misaligned),
            _ => bad_format_error("brs: loop behavior set to reserved value"),
        }
    }

    pub fn as_byte(self) -> u8 {
        match self {
            LoopBehavior::NonLooping => 0,
            LoopBehavior::Looping => 1,
            LoopBehavior::Extrinsic => 2,
            LoopBehavior::Misaligned => 3,
        }
    }

    /// Returns true if playback is expected to jump at the end of the final block.
    pub fn loops(self) -> bool {
        !matches!(self, LoopBehavior::NonLooping)
    }
}

/// Sanitizes an instrument name to exactly [`INSTRUMENT_NAME_LEN`] printable Latin-1 characters.
///
/// Control characters (U+0000..U+001F, U+007F..U+009F) and the soft hyphen are stripped, the
/// no-break space becomes a plain space, and codepoints outside Latin-1 become `?`. The result
/// is truncated or space-padded to the exact field length.
pub fn sanitize_instrument_name(name: &str) -> String {
    let mut sanitized = String::with_capacity(INSTRUMENT_NAME_LEN);
    let mut count = 0;

    for ch in name.chars() {
        if count == INSTRUMENT_NAME_LEN {
            break;
        }

        let ch = match ch {
            '\u{0000}'..='\u{001f}' | '\u{007f}'..='\u{009f}' | '\u{00ad}' => continue,
            '\u{00a0}' => ' ',
            ch if u32::from(ch) > 0xff => '?',
            ch => ch,
        };

        sanitized.push(ch);
        count += 1;
    }

    for _ in count..INSTRUMENT_NAME_LEN {
        sanitized.push(' ');
    }

    sanitized
}

/// Encodes a sanitized name as Latin-1 bytes.
pub(crate) fn encode_latin1(name: &str) -> [u8; INSTRUMENT_NAME_LEN] {
    debug_assert!(name.chars().count() == INSTRUMENT_NAME_LEN);

    let mut bytes = [b' '; INSTRUMENT_NAME_LEN];
    for (byte, ch) in bytes.iter_mut().zip(name.chars()) {
        *byte = u32::from(ch) as u8;
    }
    bytes
}

/// Decodes a Latin-1 name field.
pub(crate) fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&byte| char::from(byte)).collect()
}
