//! Stream header encode/decode (§6 "Stream header").
//!
//! The header is the only fixed-layout part of the bitstream; every field
//! after it is block-record-shaped and handled by [`crate::block`].

use crate::bitstream::{InputBitStream, OutputBitStream};
use crate::consts::{MAGIC, MAX_BITSTREAM_BLOCK_SIZE, MIN_BITSTREAM_BLOCK_SIZE, STREAM_VERSION};
use crate::entropy::EntropyKind;
use crate::error::{KanziError, Result};
use crate::transform::{pack_transform_type, unpack_transform_type, TransformKind};

/// Parsed/validated stream header (§3 "Stream", §6 "Stream header").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamHeader {
    pub checksum: bool,
    pub entropy: EntropyKind,
    pub transforms: Vec<TransformKind>,
    pub block_size: u32,
    pub input_blocks_hint: u8,
}

impl StreamHeader {
    /// Write the 32+5+1+5+48+26+6+5 = 128-bit header, MSB-first.
    pub fn write(&self, out: &mut OutputBitStream) -> Result<()> {
        out.write_bits(MAGIC as u64, 32)?;
        out.write_bits(STREAM_VERSION as u64, 5)?;
        out.write_bits(self.checksum as u64, 1)?;
        out.write_bits(self.entropy.id() as u64, 5)?;
        out.write_bits(pack_transform_type(&self.transforms), 48)?;
        out.write_bits((self.block_size >> 4) as u64, 26)?;
        out.write_bits(self.input_blocks_hint as u64, 6)?;
        out.write_bits(0, 5)?;
        Ok(())
    }

    /// Read and validate the header. Fails fast on magic, version, block
    /// size, or codec id mismatches (§4.7 "On the first `process_block`").
    pub fn read(inp: &mut InputBitStream) -> Result<Self> {
        let magic = inp.read_bits(32)? as u32;
        if magic != MAGIC {
            return Err(KanziError::InvalidMagic {
                expected: MAGIC,
                found: magic,
            });
        }
        let version = inp.read_bits(5)? as u8;
        if version != STREAM_VERSION {
            return Err(KanziError::UnsupportedVersion(version));
        }
        let checksum = inp.read_bits(1)? != 0;
        let entropy_id = inp.read_bits(5)? as u32;
        let entropy = EntropyKind::from_id(entropy_id)?;
        let transform_type = inp.read_bits(48)?;
        let transforms = unpack_transform_type(transform_type)?;
        let block_size = (inp.read_bits(26)? as u32) << 4;
        if !(MIN_BITSTREAM_BLOCK_SIZE..=MAX_BITSTREAM_BLOCK_SIZE).contains(&block_size) {
            return Err(KanziError::InvalidBlockSize(block_size));
        }
        let input_blocks_hint = inp.read_bits(6)? as u8;
        let _reserved = inp.read_bits(5)?;
        Ok(StreamHeader {
            checksum,
            entropy,
            transforms,
            block_size,
            input_blocks_hint,
        })
    }
}
