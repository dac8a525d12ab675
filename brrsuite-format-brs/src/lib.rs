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

//! Reader and writer for the BRR Suite Sample container (`.brs`): a 64-byte header carrying a
//! checksum, instrument metadata, and loop information, followed by the raw BRR data.
//!
//! ```text
//! off len
//!   0   4  "BRRS"
//!   4   2  checksum (u16 LE)
//!   6   2  checksum complement
//!   8   4  "META"
//!  12  24  instrument name, Latin-1, space-padded
//!  36   2  VxPITCH (u16 LE, 0 = unknown)
//!  38   2  reserved, zero
//!  40   4  encoding frequency in Hz (i32 LE)
//!  44   7  reserved, zero
//!  51   4  "DATA"
//!  55   1  loop behavior
//!  56   2  loop block index (u16 LE)
//!  58   2  loop byte offset (u16 LE)
//!  60   2  block count (u16 LE)
//!  62   2  sample length in bytes (u16 LE)
//!  64 ...  BRR sample data
//! ```

use log::warn;

use brrsuite_core::checksum::checksum_of;
use brrsuite_core::common::{BRR_BLOCK_SIZE, DEFAULT_VX_PITCH, DSP_FREQUENCY};
use brrsuite_core::errors::{
    bad_format_error, invalid_argument_error, unresolvable_error, Result,
};
use brrsuite_core::io::BufReader;
use brrsuite_core::sample::{validate_bytes, BrrSample};

mod meta;

pub use meta::{sanitize_instrument_name, LoopBehavior, INSTRUMENT_NAME_LEN};

/// The size of the fixed file header in bytes.
pub const BRS_HEADER_SIZE: usize = 64;

const SIG_FILE: [u8; 4] = *b"BRRS";
const SIG_META: [u8; 4] = *b"META";
const SIG_DATA: [u8; 4] = *b"DATA";

/// A BRR sample wrapped with suite metadata: an instrument name, the sampled pitch, the source
/// frequency, and an explicit loop taxonomy.
pub struct SuiteSample {
    instrument_name: String,
    vx_pitch: u16,
    encoding_frequency: i32,
    loop_behavior: LoopBehavior,
    loop_point: u16,
    sample: BrrSample,
}

impl SuiteSample {
    /// Wraps a sample with default metadata. The loop behavior and loop point are derived from
    /// the sample's own loop block.
    pub fn new(sample: BrrSample) -> SuiteSample {
        let (loop_behavior, loop_point) = match sample.loop_offset() {
            Some(offset) => (LoopBehavior::Looping, offset as u16),
            None => (LoopBehavior::NonLooping, 0),
        };

        SuiteSample {
            instrument_name: " ".repeat(INSTRUMENT_NAME_LEN),
            vx_pitch: DEFAULT_VX_PITCH,
            encoding_frequency: DSP_FREQUENCY as i32,
            loop_behavior,
            loop_point,
            sample,
        }
    }

    /// Gets the instrument name: exactly 24 printable Latin-1 characters, space-padded.
    pub fn instrument_name(&self) -> &str {
        &self.instrument_name
    }

    /// Sets the instrument name, sanitized to printable Latin-1 and space-padded. Names longer
    /// than the 24-character field are rejected.
    pub fn set_instrument_name(&mut self, name: &str) -> Result<()> {
        if name.chars().count() > INSTRUMENT_NAME_LEN {
            return invalid_argument_error("brs: instrument name exceeds 24 characters");
        }

        self.instrument_name = sanitize_instrument_name(name);
        Ok(())
    }

    /// Gets the VxPITCH register value the instrument was sampled at; 0 means unknown.
    pub fn vx_pitch(&self) -> u16 {
        self.vx_pitch
    }

    /// Sets the VxPITCH value. Out-of-range values collapse to 0, meaning unknown.
    pub fn set_vx_pitch(&mut self, vx_pitch: u16) {
        self.vx_pitch = if vx_pitch > 0x3fff {
            warn!("brs: vx_pitch {:#06x} out of range, marking unknown", vx_pitch);
            0
        }
        else {
            vx_pitch
        };
    }

    /// Gets the frequency in Hz the source audio was encoded at.
    pub fn encoding_frequency(&self) -> i32 {
        self.encoding_frequency
    }

    /// Sets the encoding frequency. Must be positive.
    pub fn set_encoding_frequency(&mut self, frequency: i32) -> Result<()> {
        if frequency <= 0 {
            return invalid_argument_error("brs: encoding frequency must be positive");
        }

        self.encoding_frequency = frequency;
        Ok(())
    }

    pub fn loop_behavior(&self) -> LoopBehavior {
        self.loop_behavior
    }

    /// Gets the loop point as a byte offset into the sample data.
    pub fn loop_point(&self) -> u16 {
        self.loop_point
    }

    /// Sets the loop point and derives the loop behavior from it: a block-aligned offset within
    /// the data is a proper loop, an offset past the data loops into external memory, and an
    /// unaligned offset is flagged as misaligned.
    pub fn set_and_flag_loop_point(&mut self, point: u16) {
        self.loop_point = point;

        self.loop_behavior = if usize::from(point) >= self.sample.data_len() {
            LoopBehavior::Extrinsic
        }
        else if usize::from(point) % BRR_BLOCK_SIZE != 0 {
            LoopBehavior::Misaligned
        }
        else {
            LoopBehavior::Looping
        };

        // Only a proper loop is expressible on the sample itself.
        match self.loop_behavior {
            LoopBehavior::Looping => {
                self.sample.set_loop_block(Some(usize::from(point) / BRR_BLOCK_SIZE));
            }
            _ => self.sample.set_loop_block(None),
        }
    }

    /// Clears the loop point and marks the sample non-looping.
    pub fn clear_loop(&mut self) {
        self.loop_point = 0;
        self.loop_behavior = LoopBehavior::NonLooping;
        self.sample.set_loop_block(None);
    }

    pub fn sample(&self) -> &BrrSample {
        &self.sample
    }

    pub fn sample_mut(&mut self) -> &mut BrrSample {
        &mut self.sample
    }

    pub fn into_sample(self) -> BrrSample {
        self.sample
    }

    /// Parses a suite sample file, validating its signatures, checksum, length fields, and
    /// loop consistency.
    pub fn parse(buf: &[u8]) -> Result<SuiteSample> {
        if buf.len() < BRS_HEADER_SIZE + BRR_BLOCK_SIZE {
            return bad_format_error("brs: stream too short");
        }

        let mut reader = BufReader::new(buf);

        if reader.read_array::<4>()? != SIG_FILE {
            return bad_format_error("brs: missing BRRS signature");
        }

        let checksum = reader.read_u16()?;
        let complement = reader.read_u16()?;
        if checksum ^ complement != 0xffff {
            return bad_format_error("brs: checksum complement mismatch");
        }

        if reader.read_array::<4>()? != SIG_META {
            return bad_format_error("brs: missing META signature");
        }

        let name_bytes = reader.read_bytes(INSTRUMENT_NAME_LEN)?;
        let instrument_name = sanitize_instrument_name(&meta::decode_latin1(name_bytes));

        let vx_pitch = reader.read_u16()?;
        let vx_pitch = if vx_pitch > 0x3fff {
            warn!("brs: vx_pitch {:#06x} out of range, marking unknown", vx_pitch);
            0
        }
        else {
            vx_pitch
        };

        reader.skip(2)?;

        let encoding_frequency = reader.read_i32()?;
        if encoding_frequency <= 0 {
            return bad_format_error("brs: non-positive encoding frequency");
        }

        reader.skip(7)?;

        if reader.read_array::<4>()? != SIG_DATA {
            return bad_format_error("brs: missing DATA signature");
        }

        let loop_behavior = LoopBehavior::from_byte(reader.read_u8()?)?;
        let loop_block = reader.read_u16()?;
        let loop_point = reader.read_u16()?;
        let block_count = reader.read_u16()?;
        let sample_length = reader.read_u16()?;

        let data = reader.rest();

        if data.len() != usize::from(sample_length) {
            return bad_format_error("brs: sample length field does not match the stream");
        }
        if usize::from(block_count) * BRR_BLOCK_SIZE != usize::from(sample_length) {
            return bad_format_error("brs: block count does not match the sample length");
        }
        if checksum != checksum_of(data) {
            return bad_format_error("brs: bad checksum");
        }

        if loop_behavior == LoopBehavior::Looping
            && usize::from(loop_block) * BRR_BLOCK_SIZE != usize::from(loop_point)
        {
            return bad_format_error("brs: loop block does not match the loop point");
        }

        // The final block's loop flag must agree with the declared behavior.
        let final_header = data[data.len() - BRR_BLOCK_SIZE];
        if (final_header & brrsuite_core::block::LOOP_FLAG != 0) != loop_behavior.loops() {
            return bad_format_error("brs: loop behavior does not match the end block flags");
        }

        // Structural validation of the data itself. The loop point is only checkable for a
        // proper loop.
        let check_point =
            if loop_behavior == LoopBehavior::Looping { Some(usize::from(loop_point)) } else { None };
        let issues = validate_bytes(data, check_point, Some(usize::from(block_count)));
        if !issues.is_resolvable() {
            return unresolvable_error(issues);
        }

        let mut sample = BrrSample::from_bytes(data)?;
        if loop_behavior == LoopBehavior::Looping {
            sample.set_loop_block(Some(usize::from(loop_block)));
        }

        Ok(SuiteSample {
            instrument_name,
            vx_pitch,
            encoding_frequency,
            loop_behavior,
            loop_point,
            sample,
        })
    }

    /// Serializes the suite sample. Fails if the sample data no longer passes structural
    /// validation.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let data = self.sample.as_bytes();

        let check_point = if self.loop_behavior == LoopBehavior::Looping {
            Some(usize::from(self.loop_point))
        }
        else {
            None
        };
        let issues = validate_bytes(data, check_point, None);
        if !issues.is_resolvable() {
            return unresolvable_error(issues);
        }

        let checksum = checksum_of(data);
        let block_count = (data.len() / BRR_BLOCK_SIZE) as u16;

        let mut out = Vec::with_capacity(BRS_HEADER_SIZE + data.len());
        out.extend_from_slice(&SIG_FILE);
        out.extend_from_slice(&checksum.to_le_bytes());
        out.extend_from_slice(&(checksum ^ 0xffff).to_le_bytes());
        out.extend_from_slice(&SIG_META);
        out.extend_from_slice(&meta::encode_latin1(&self.instrument_name));
        out.extend_from_slice(&self.vx_pitch.to_le_bytes());
        out.extend_from_slice(&[0u8; 2]);
        out.extend_from_slice(&self.encoding_frequency.to_le_bytes());
        out.extend_from_slice(&[0u8; 7]);
        out.extend_from_slice(&SIG_DATA);
        out.push(self.loop_behavior.as_byte());
        out.extend_from_slice(&(self.loop_point / BRR_BLOCK_SIZE as u16).to_le_bytes());
        out.extend_from_slice(&self.loop_point.to_le_bytes());
        out.extend_from_slice(&block_count.to_le_bytes());
        out.extend_from_slice(&(data.len() as u16).to_le_bytes());
        out.extend_from_slice(data);

        debug_assert!(out.len() == BRS_HEADER_SIZE + data.len());

        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use brrsuite_core::common::DataIssue;
    use brrsuite_core::errors::Error;

    use super::*;

    /// Builds a three-block sample with a loop at block 1 and corrected flags.
    fn looping_sample() -> BrrSample {
        let mut sample = BrrSample::new(3).unwrap();
        for i in 0..3 {
            let mut block = sample.block_mut(i).unwrap();
            block.set_range(4);
            block.set_sample(7, -3).unwrap();
        }
        // Keep the initial block conventional.
        sample.block_mut(0).unwrap().set_range(0);
        sample.block_mut(0).unwrap().set_sample(7, 0).unwrap();

        sample.set_loop_block(Some(1));
        sample.correct_end_flags();
        sample
    }

    #[test]
    fn verify_header_layout() {
        let mut suite = SuiteSample::new(looping_sample());
        suite.set_instrument_name("TEST").unwrap();

        let bytes = suite.to_bytes().unwrap();

        assert_eq!(&bytes[0..4], b"BRRS");
        assert_eq!(&bytes[8..12], b"META");
        assert_eq!(&bytes[12..16], b"TEST");
        assert_eq!(&bytes[16..36], " ".repeat(20).as_bytes());
        assert_eq!(&bytes[36..38], &DEFAULT_VX_PITCH.to_le_bytes());
        assert_eq!(&bytes[40..44], &32000i32.to_le_bytes());
        assert_eq!(&bytes[51..55], b"DATA");
        assert_eq!(bytes[55], LoopBehavior::Looping.as_byte());
        assert_eq!(&bytes[56..58], &1u16.to_le_bytes());
        assert_eq!(&bytes[58..60], &9u16.to_le_bytes());
        assert_eq!(&bytes[60..62], &3u16.to_le_bytes());
        assert_eq!(&bytes[62..64], &27u16.to_le_bytes());
        assert_eq!(bytes.len(), BRS_HEADER_SIZE + 27);

        // Checksum and complement XOR to all ones.
        let checksum = u16::from_le_bytes([bytes[4], bytes[5]]);
        let complement = u16::from_le_bytes([bytes[6], bytes[7]]);
        assert_eq!(checksum ^ complement, 0xffff);
    }

    #[test]
    fn verify_round_trip() {
        let mut suite = SuiteSample::new(looping_sample());
        suite.set_instrument_name("Strings").unwrap();
        suite.set_vx_pitch(0x0abc);
        suite.set_encoding_frequency(16000).unwrap();

        let bytes = suite.to_bytes().unwrap();
        let parsed = SuiteSample::parse(&bytes).unwrap();

        assert_eq!(parsed.instrument_name(), suite.instrument_name());
        assert_eq!(parsed.vx_pitch(), 0x0abc);
        assert_eq!(parsed.encoding_frequency(), 16000);
        assert_eq!(parsed.loop_behavior(), LoopBehavior::Looping);
        assert_eq!(parsed.loop_point(), 9);
        assert_eq!(parsed.sample().loop_block(), Some(1));
        assert_eq!(parsed.sample().as_bytes(), suite.sample().as_bytes());
    }

    #[test]
    fn verify_parse_rejections() {
        let mut suite = SuiteSample::new(looping_sample());
        suite.set_instrument_name("TEST").unwrap();
        let bytes = suite.to_bytes().unwrap();

        // Too short.
        assert!(SuiteSample::parse(&bytes[..40]).is_err());

        // Wrong file signature.
        let mut bad = bytes.clone();
        bad[0] = b'X';
        assert!(SuiteSample::parse(&bad).is_err());

        // Corrupted checksum field breaks the complement invariant.
        let mut bad = bytes.clone();
        bad[4] ^= 0x01;
        assert!(SuiteSample::parse(&bad).is_err());

        // Corrupted data breaks the checksum itself.
        let mut bad = bytes.clone();
        let last = bad.len() - 1;
        bad[last] ^= 0x10;
        assert!(SuiteSample::parse(&bad).is_err());

        // A wrong length field.
        let mut bad = bytes.clone();
        bad[62] = bad[62].wrapping_add(9);
        assert!(SuiteSample::parse(&bad).is_err());

        // A loop point that disagrees with the loop block.
        let mut bad = bytes.clone();
        bad[58] = 18;
        assert!(SuiteSample::parse(&bad).is_err());

        // A behavior that disagrees with the final block's loop flag.
        let mut bad = bytes.clone();
        bad[55] = LoopBehavior::NonLooping.as_byte();
        assert!(SuiteSample::parse(&bad).is_err());
    }

    #[test]
    fn verify_unresolvable_data_is_reported() {
        // A looping file whose loop point lands out of range: rewrite the loop fields so the
        // header stays self-consistent but the loop is unusable.
        let mut suite = SuiteSample::new(looping_sample());
        suite.set_instrument_name("TEST").unwrap();
        let mut bytes = suite.to_bytes().unwrap();

        // loop block 5, loop point 45, past the 27-byte sample.
        bytes[56] = 5;
        bytes[58] = 45;

        match SuiteSample::parse(&bytes) {
            Err(Error::Unresolvable(issues)) => {
                assert!(issues.contains(DataIssue::OUT_OF_RANGE_LOOP_POINT));
            }
            other => panic!("expected unresolvable data, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn verify_loop_point_flagging() {
        let mut suite = SuiteSample::new(looping_sample());

        suite.set_and_flag_loop_point(18);
        assert_eq!(suite.loop_behavior(), LoopBehavior::Looping);
        assert_eq!(suite.sample().loop_block(), Some(2));

        suite.set_and_flag_loop_point(10);
        assert_eq!(suite.loop_behavior(), LoopBehavior::Misaligned);
        assert_eq!(suite.sample().loop_block(), None);

        suite.set_and_flag_loop_point(27);
        assert_eq!(suite.loop_behavior(), LoopBehavior::Extrinsic);
        assert_eq!(suite.sample().loop_block(), None);

        suite.clear_loop();
        assert_eq!(suite.loop_behavior(), LoopBehavior::NonLooping);
        assert_eq!(suite.loop_point(), 0);
    }

    #[test]
    fn verify_metadata_boundaries() {
        let mut suite = SuiteSample::new(looping_sample());

        assert!(suite.set_instrument_name(&"x".repeat(25)).is_err());
        assert!(suite.set_instrument_name("ok").is_ok());

        suite.set_vx_pitch(0x4000);
        assert_eq!(suite.vx_pitch(), 0);

        assert!(suite.set_encoding_frequency(0).is_err());
        assert!(suite.set_encoding_frequency(-22050).is_err());
        assert!(suite.set_encoding_frequency(44100).is_ok());
    }
}
