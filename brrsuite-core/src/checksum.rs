// BRR Suite
// Copyright (c) 2022-2025 The BRR Suite Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `checksum` module implements the block-structured checksum of the BRR Suite Sample file.
//!
//! Each 9-byte block contributes the sum of its data bytes, each shifted by its position, XORed
//! with the header byte shifted by 4. The file stores both the 16-bit sum and its complement so
//! a corrupted checksum field is itself detectable.

use crate::common::BRR_BLOCK_SIZE;

/// The BRR Suite Sample checksum.
#[derive(Default)]
pub struct BrsChecksum {
    sum: u16,
}

impl BrsChecksum {
    pub fn new() -> Self {
        BrsChecksum { sum: 0 }
    }

    /// Processes one 9-byte block.
    pub fn process_block(&mut self, block: &[u8]) {
        debug_assert!(block.len() == BRR_BLOCK_SIZE);

        let mut acc: u16 = 0;

        for (j, &byte) in block.iter().enumerate().skip(1) {
            acc = acc.wrapping_add(u16::from(byte) << (j - 1));
        }
        acc ^= u16::from(block[0]) << 4;

        self.sum = self.sum.wrapping_add(acc);
    }

    /// Gets the checksum over all blocks processed so far.
    pub fn checksum(&self) -> u16 {
        self.sum
    }

    /// Gets the complement of the checksum.
    pub fn complement(&self) -> u16 {
        self.sum ^ 0xffff
    }
}

/// Computes the checksum of a whole BRR byte stream.
///
/// Trailing bytes that do not form a whole block are ignored.
pub fn checksum_of(data: &[u8]) -> u16 {
    let mut checksum = BrsChecksum::new();

    for block in data.chunks_exact(BRR_BLOCK_SIZE) {
        checksum.process_block(block);
    }

    checksum.checksum()
}
