// BRR Suite
// Copyright (c) 2022-2025 The BRR Suite Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `sample` module provides the owning container for a BRR byte stream.
//!
//! A [`BrrSample`] owns a heap-allocated buffer sized in whole blocks plus an optional loop
//! block index. Individual blocks are accessed as transient views borrowing the container's
//! memory; see the [`block`](crate::block) module.

use log::debug;

use crate::block::{BrrBlock, BrrBlockMut, END_FLAG, LOOP_FLAG};
use crate::checksum::checksum_of;
use crate::common::{DataIssue, BRR_BLOCK_SIZE, MAX_BLOCKS, MAX_RANGE};
use crate::errors::{bad_format_error, invalid_argument_error, Result};

/// Validates a BRR byte stream and reports every issue found.
///
/// `loop_point` is a byte offset into the data for looping samples. `declared_blocks` is an
/// externally declared block count to cross-check, if one exists.
///
/// Validation never fails; callers reject data only when the returned set is not resolvable.
pub fn validate_bytes(
    data: &[u8],
    loop_point: Option<usize>,
    declared_blocks: Option<usize>,
) -> DataIssue {
    let mut issues = DataIssue::empty();

    if data.len() < BRR_BLOCK_SIZE {
        issues |= DataIssue::DATA_TOO_SMALL | DataIssue::UNRESOLVABLE;
    }
    if data.len() % BRR_BLOCK_SIZE != 0 {
        issues |= DataIssue::BAD_ALIGNMENT | DataIssue::UNRESOLVABLE;
    }

    // Without a whole number of blocks the stream cannot be interpreted any further.
    if !issues.is_empty() {
        return issues;
    }

    let block_count = data.len() / BRR_BLOCK_SIZE;

    if block_count > MAX_BLOCKS {
        issues |= DataIssue::DATA_TOO_LARGE;
    }

    if let Some(declared) = declared_blocks {
        if declared != block_count {
            issues |= DataIssue::WRONG_BLOCK_COUNT | DataIssue::UNRESOLVABLE;
        }
    }

    if let Some(point) = loop_point {
        if point % BRR_BLOCK_SIZE != 0 {
            issues |= DataIssue::MISALIGNED_LOOP_POINT | DataIssue::UNRESOLVABLE;
        }
        if point >= data.len() {
            issues |= DataIssue::OUT_OF_RANGE_LOOP_POINT | DataIssue::UNRESOLVABLE;
        }
    }

    for (i, block) in data.chunks_exact(BRR_BLOCK_SIZE).enumerate() {
        let header = block[0];
        let last = i + 1 == block_count;

        if header >> 4 > MAX_RANGE {
            issues |= DataIssue::LARGE_RANGE | DataIssue::UNDEFINED_BEHAVIOR;
        }

        if last {
            if header & END_FLAG == 0 {
                issues |= DataIssue::MISSING_END_FLAG;
            }
            match (loop_point.is_some(), header & LOOP_FLAG != 0) {
                (true, false) => issues |= DataIssue::MISSING_LOOP_FLAG,
                (false, true) => issues |= DataIssue::MISSING_LOOP_POINT,
                _ => (),
            }
        }
        else if header & END_FLAG != 0 {
            issues |= DataIssue::EARLY_END_FLAGS;
        }

        if i == 0 {
            // At stream start the prediction history is zero, so the initial block is expected
            // to use filter 0 and begin with silent residuals.
            if header & 0x0c != 0 {
                issues |= DataIssue::BLOCK0_FILTER;
            }
            if block[1] != 0 || block[2] & 0xf0 != 0 {
                issues |= DataIssue::BLOCK0_SAMPLES;
            }
        }
    }

    issues
}

/// A `BrrSample` owns an encoded BRR byte stream and its loop metadata.
pub struct BrrSample {
    data: Box<[u8]>,
    loop_block: Option<usize>,
}

impl BrrSample {
    /// Creates a zero-initialized sample with the given number of blocks.
    pub fn new(block_count: usize) -> Result<BrrSample> {
        if block_count == 0 {
            return invalid_argument_error("sample: block count must be positive");
        }
        if block_count > MAX_BLOCKS {
            return invalid_argument_error("sample: block count exceeds the maximum");
        }

        let data = vec![0u8; block_count * BRR_BLOCK_SIZE].into_boxed_slice();

        Ok(BrrSample { data, loop_block: None })
    }

    /// Creates a sample by copying an existing BRR byte stream.
    ///
    /// The stream must be a positive multiple of the block size and within the block cap.
    pub fn from_bytes(buf: &[u8]) -> Result<BrrSample> {
        if buf.is_empty() {
            return bad_format_error("sample: empty byte stream");
        }
        if buf.len() % BRR_BLOCK_SIZE != 0 {
            return bad_format_error("sample: data length is not a multiple of the block size");
        }
        if buf.len() / BRR_BLOCK_SIZE > MAX_BLOCKS {
            return bad_format_error("sample: data exceeds the maximum block count");
        }

        Ok(BrrSample { data: Box::from(buf), loop_block: None })
    }

    /// Parses a loop-headered BRR stream: a 2-byte little-endian loop byte-offset followed by
    /// the raw data. An offset at or past the end of the data marks a non-looping sample.
    pub fn from_loop_headered(buf: &[u8]) -> Result<BrrSample> {
        if buf.len() < 2 {
            return bad_format_error("sample: loop-headered stream too short");
        }

        let offset = usize::from(u16::from_le_bytes([buf[0], buf[1]]));
        let mut sample = BrrSample::from_bytes(&buf[2..])?;

        if offset < sample.data_len() && offset % BRR_BLOCK_SIZE == 0 {
            sample.loop_block = Some(offset / BRR_BLOCK_SIZE);
        }

        Ok(sample)
    }

    /// Gets the number of blocks in the sample.
    pub fn block_count(&self) -> usize {
        self.data.len() / BRR_BLOCK_SIZE
    }

    /// Gets the length of the sample data in bytes.
    pub fn data_len(&self) -> usize {
        self.data.len()
    }

    /// Gets the raw BRR byte stream. This is also the sample's serialized form.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Gets a shared view of the block at the given index.
    pub fn block(&self, index: usize) -> Result<BrrBlock<'_>> {
        if index >= self.block_count() {
            return invalid_argument_error("sample: block index out of range");
        }

        let start = index * BRR_BLOCK_SIZE;
        Ok(BrrBlock::new(&self.data[start..start + BRR_BLOCK_SIZE]))
    }

    /// Gets an exclusive view of the block at the given index.
    pub fn block_mut(&mut self, index: usize) -> Result<BrrBlockMut<'_>> {
        if index >= self.block_count() {
            return invalid_argument_error("sample: block index out of range");
        }

        let start = index * BRR_BLOCK_SIZE;
        Ok(BrrBlockMut::new(&mut self.data[start..start + BRR_BLOCK_SIZE]))
    }

    /// Gets the loop block index, if the sample loops.
    pub fn loop_block(&self) -> Option<usize> {
        self.loop_block
    }

    /// Sets or clears the loop block index. An out-of-range index clears the loop.
    pub fn set_loop_block(&mut self, loop_block: Option<usize>) {
        self.loop_block = match loop_block {
            Some(block) if block >= self.block_count() => {
                debug!("sample: loop block {} out of range, clearing loop", block);
                None
            }
            other => other,
        };
    }

    /// Gets the loop point as a byte offset into the data, if the sample loops.
    pub fn loop_offset(&self) -> Option<usize> {
        self.loop_block.map(|block| block * BRR_BLOCK_SIZE)
    }

    /// Returns true if the sample loops.
    pub fn is_looping(&self) -> bool {
        self.loop_block.is_some()
    }

    /// Repairs the end and loop flags: clears both on every non-final block, sets the end flag
    /// on the final block, and sets the final block's loop flag iff the sample loops.
    pub fn correct_end_flags(&mut self) {
        let count = self.block_count();
        let looping = self.is_looping();

        for i in 0..count {
            let header = &mut self.data[i * BRR_BLOCK_SIZE];

            if i + 1 == count {
                *header |= END_FLAG;
                if looping {
                    *header |= LOOP_FLAG;
                }
                else {
                    *header &= !LOOP_FLAG;
                }
            }
            else {
                *header &= !(END_FLAG | LOOP_FLAG);
            }
        }
    }

    /// Validates the sample and reports every issue found.
    pub fn validate(&self) -> DataIssue {
        validate_bytes(&self.data, self.loop_offset(), None)
    }

    /// Computes the suite checksum of the sample data.
    pub fn checksum(&self) -> u16 {
        checksum_of(&self.data)
    }

    /// Serializes the sample as a loop-headered stream.
    ///
    /// Non-looping samples write the data length as the loop offset; any offset at or past the
    /// end of the data is an equivalent non-looping sentinel to readers.
    pub fn to_loop_headered(&self) -> Vec<u8> {
        let offset = self.loop_offset().unwrap_or(self.data.len()) as u16;

        let mut out = Vec::with_capacity(2 + self.data.len());
        out.extend_from_slice(&offset.to_le_bytes());
        out.extend_from_slice(&self.data);
        out
    }
}
