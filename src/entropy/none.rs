//! `NONE` entropy codec: bytes pass straight through the bit stream.

use super::{EntropyDecoder, EntropyEncoder};
use crate::bitstream::{InputBitStream, OutputBitStream};
use crate::error::Result;

pub struct NoneEncoder;

impl EntropyEncoder for NoneEncoder {
    fn encode(&mut self, out: &mut OutputBitStream, data: &[u8]) -> Result<usize> {
        for &b in data {
            out.write_bits(b as u64, 8)?;
        }
        Ok(data.len())
    }
}

pub struct NoneDecoder;

impl EntropyDecoder for NoneDecoder {
    fn decode(&mut self, inp: &mut InputBitStream, data: &mut [u8]) -> Result<usize> {
        for slot in data.iter_mut() {
            *slot = inp.read_bits(8)? as u8;
        }
        Ok(data.len())
    }
}
