// BRR Suite
// Copyright (c) 2022-2025 The BRR Suite Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `common` module defines the constants of the BRR bit stream and the issue set reported by
//! data validation.

use bitflags::bitflags;

/// The size of one BRR block in bytes: a header byte plus 8 data bytes.
pub const BRR_BLOCK_SIZE: usize = 9;

/// The number of PCM samples encoded by one BRR block.
pub const PCM_BLOCK_SIZE: usize = 16;

/// The native output rate of the S-DSP in Hz.
pub const DSP_FREQUENCY: u32 = 32000;

/// The VxPITCH register value for unity playback at [`DSP_FREQUENCY`].
pub const DEFAULT_VX_PITCH: u16 = 0x1000;

/// The largest usable range (shift) value. Ranges 13 through 15 are undefined on hardware.
pub const MAX_RANGE: u8 = 12;

/// The cap on forced leading zero samples accepted by the encoder.
pub const MAX_LEADING_ZEROS: u32 = 100;

/// The wire sentinel for a sample without a loop point.
pub const NO_LOOP: i32 = -1;

/// The maximum number of blocks in a single sample. The cap leaves headroom within the 64 KiB
/// APU address space.
pub const MAX_BLOCKS: usize = 7280;

bitflags! {
    /// A set of issues discovered while validating a BRR byte stream.
    ///
    /// Validation never fails outright; it reports everything it finds and lets the caller decide.
    /// Only sets containing [`DataIssue::UNRESOLVABLE`] prevent the data from being used.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct DataIssue: u32 {
        /// The data length is not a multiple of the block size.
        const BAD_ALIGNMENT = 1 << 0;
        /// The data is empty or shorter than one block.
        const DATA_TOO_SMALL = 1 << 1;
        /// The data exceeds [`MAX_BLOCKS`] blocks and cannot fit in APU memory.
        const DATA_TOO_LARGE = 1 << 2;
        /// The final block does not have its end flag set.
        const MISSING_END_FLAG = 1 << 3;
        /// A block before the final block has its end flag set.
        const EARLY_END_FLAGS = 1 << 4;
        /// The sample loops but the final block does not have its loop flag set.
        const MISSING_LOOP_FLAG = 1 << 5;
        /// The final block has its loop flag set but no loop point is known.
        const MISSING_LOOP_POINT = 1 << 6;
        /// The loop point is not aligned to a block boundary.
        const MISALIGNED_LOOP_POINT = 1 << 7;
        /// The loop point lies at or past the end of the data.
        const OUT_OF_RANGE_LOOP_POINT = 1 << 8;
        /// A block uses a range of 13 or greater.
        const LARGE_RANGE = 1 << 9;
        /// The initial block uses a filter other than filter 0.
        const BLOCK0_FILTER = 1 << 10;
        /// One of the initial block's first three residuals is nonzero.
        const BLOCK0_SAMPLES = 1 << 11;
        /// A declared block count does not match the data length.
        const WRONG_BLOCK_COUNT = 1 << 12;
        /// The data relies on behavior that is undefined on hardware.
        const UNDEFINED_BEHAVIOR = 1 << 13;
        /// The issue set cannot be repaired; the data must be rejected.
        const UNRESOLVABLE = 1 << 31;
    }
}

impl DataIssue {
    /// Returns true if every reported issue is advisory and the data remains usable.
    pub fn is_resolvable(&self) -> bool {
        !self.contains(DataIssue::UNRESOLVABLE)
    }
}
