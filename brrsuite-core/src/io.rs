// BRR Suite
// Copyright (c) 2022-2025 The BRR Suite Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `io` module implements byte-level reading over in-memory buffers.
//!
//! BRR Suite parses complete files already held in memory, so a single reader type suffices:
//! it consumes a borrowed byte slice from the front and hands out sub-slices without copying.
//! Multi-byte integers are little-endian, matching the wire formats. Running out of bytes is a
//! format error, since a well-formed container always declares how much data follows.

use crate::errors::{bad_format_error, Result};

/// A `BufReader` consumes a borrowed byte buffer from the front.
pub struct BufReader<'a> {
    remaining: &'a [u8],
}

impl<'a> BufReader<'a> {
    pub fn new(buf: &'a [u8]) -> BufReader<'a> {
        BufReader { remaining: buf }
    }

    /// Splits the next `len` bytes off the front of the buffer, or fails if fewer are left.
    fn split(&mut self, len: usize) -> Result<&'a [u8]> {
        if len > self.remaining.len() {
            return bad_format_error("unexpected end of stream");
        }

        let (head, tail) = self.remaining.split_at(len);
        self.remaining = tail;
        Ok(head)
    }

    /// Reads the next byte.
    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.split(1)?[0])
    }

    /// Reads the next `N` bytes into an array.
    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut array = [0u8; N];
        array.copy_from_slice(self.split(N)?);
        Ok(array)
    }

    /// Reads an unsigned 16-bit little-endian integer.
    pub fn read_u16(&mut self) -> Result<u16> {
        Ok(u16::from_le_bytes(self.read_array()?))
    }

    /// Reads a signed 32-bit little-endian integer.
    pub fn read_i32(&mut self) -> Result<i32> {
        Ok(i32::from_le_bytes(self.read_array()?))
    }

    /// Borrows the next `len` bytes without copying.
    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        self.split(len)
    }

    /// Discards the next `count` bytes.
    pub fn skip(&mut self, count: usize) -> Result<()> {
        self.split(count).map(|_| ())
    }

    /// Takes everything left in the buffer, leaving the reader empty.
    pub fn rest(&mut self) -> &'a [u8] {
        std::mem::take(&mut self.remaining)
    }

    /// Returns the number of unread bytes.
    pub fn remaining(&self) -> usize {
        self.remaining.len()
    }
}
