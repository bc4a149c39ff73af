//! Adaptive order-0 range coder (`RANGE`, id 4).
//!
//! The range-renormalization/carry-propagation core (`low`/`range`/`cache`/
//! `cache_size`, `shift_low`, the 5-byte init/flush) and the binary-tree
//! byte model (one 11-bit adaptive probability per tree node, context
//! re-seeded to 1 per byte) are the same scheme this lineage's LZMA port
//! uses for its literal coder, simplified to a single order-0 table shared
//! across the whole block instead of LZMA's match-byte-conditioned tables.

use super::{EntropyDecoder, EntropyEncoder};
use crate::bitstream::{InputBitStream, OutputBitStream};
use crate::error::Result;

const PROB_BITS: u32 = 11;
const PROB_INIT: u16 = 1 << (PROB_BITS - 1);
const PROB_MAX: u32 = 1 << PROB_BITS;
const MOVE_BITS: u32 = 5;
const TOP_VALUE: u32 = 1 << 24;
const NUM_SYMBOLS: usize = 256;

pub struct RangeEncoder {
    probs: [u16; NUM_SYMBOLS],
    low: u64,
    range: u32,
    cache: u8,
    cache_size: u64,
}

impl RangeEncoder {
    pub fn new() -> Self {
        RangeEncoder {
            probs: [PROB_INIT; NUM_SYMBOLS],
            low: 0,
            range: 0xFFFF_FFFF,
            cache: 0,
            cache_size: 1,
        }
    }

    fn shift_low(&mut self, out: &mut OutputBitStream) -> Result<()> {
        if (self.low >> 32) != 0 || self.low < 0xFF00_0000 {
            let mut temp = self.cache;
            loop {
                let carry = (self.low >> 32) as u8;
                out.write_bits(temp.wrapping_add(carry) as u64, 8)?;
                temp = 0xFF;
                self.cache_size -= 1;
                if self.cache_size == 0 {
                    break;
                }
            }
            self.cache = (self.low >> 24) as u8;
        }
        self.cache_size += 1;
        self.low = (self.low as u32 as u64) << 8;
        Ok(())
    }

    fn encode_bit(&mut self, out: &mut OutputBitStream, ctx: usize, bit: u32) -> Result<()> {
        let prob = self.probs[ctx] as u32;
        let bound = (self.range >> PROB_BITS) * prob;
        if bit == 0 {
            self.range = bound;
            self.probs[ctx] = (prob + ((PROB_MAX - prob) >> MOVE_BITS)) as u16;
        } else {
            self.low += bound as u64;
            self.range -= bound;
            self.probs[ctx] = (prob - (prob >> MOVE_BITS)) as u16;
        }
        while self.range < TOP_VALUE {
            self.shift_low(out)?;
            self.range <<= 8;
        }
        Ok(())
    }

    fn encode_byte(&mut self, out: &mut OutputBitStream, byte: u8) -> Result<()> {
        let mut ctx: usize = 1;
        for i in (0..8).rev() {
            let bit = ((byte >> i) & 1) as u32;
            self.encode_bit(out, ctx, bit)?;
            ctx = (ctx << 1) | bit as usize;
        }
        Ok(())
    }

    fn flush(&mut self, out: &mut OutputBitStream) -> Result<()> {
        for _ in 0..5 {
            self.shift_low(out)?;
        }
        Ok(())
    }
}

impl EntropyEncoder for RangeEncoder {
    fn encode(&mut self, out: &mut OutputBitStream, data: &[u8]) -> Result<usize> {
        for &b in data {
            self.encode_byte(out, b)?;
        }
        self.flush(out)?;
        Ok(data.len())
    }
}

pub struct RangeDecoder {
    probs: [u16; NUM_SYMBOLS],
    range: u32,
    code: u32,
}

impl RangeDecoder {
    pub fn new() -> Self {
        RangeDecoder {
            probs: [PROB_INIT; NUM_SYMBOLS],
            range: 0xFFFF_FFFF,
            code: 0,
        }
    }

    fn init(&mut self, inp: &mut InputBitStream) -> Result<()> {
        let mut code: u32 = 0;
        for _ in 0..5 {
            code = (code << 8) | (inp.read_bits(8)? as u32);
        }
        self.code = code;
        self.range = 0xFFFF_FFFF;
        Ok(())
    }

    fn decode_bit(&mut self, inp: &mut InputBitStream, ctx: usize) -> Result<u32> {
        let prob = self.probs[ctx] as u32;
        let bound = (self.range >> PROB_BITS) * prob;
        let bit;
        if self.code < bound {
            self.range = bound;
            self.probs[ctx] = (prob + ((PROB_MAX - prob) >> MOVE_BITS)) as u16;
            bit = 0;
        } else {
            self.code -= bound;
            self.range -= bound;
            self.probs[ctx] = (prob - (prob >> MOVE_BITS)) as u16;
            bit = 1;
        }
        while self.range < TOP_VALUE {
            self.range <<= 8;
            self.code = (self.code << 8) | (inp.read_bits(8)? as u32);
        }
        Ok(bit)
    }

    fn decode_byte(&mut self, inp: &mut InputBitStream) -> Result<u8> {
        let mut ctx: usize = 1;
        for _ in 0..8 {
            let bit = self.decode_bit(inp, ctx)?;
            ctx = (ctx << 1) | bit as usize;
        }
        Ok((ctx & 0xFF) as u8)
    }
}

impl EntropyDecoder for RangeDecoder {
    fn decode(&mut self, inp: &mut InputBitStream, data: &mut [u8]) -> Result<usize> {
        self.init(inp)?;
        for slot in data.iter_mut() {
            *slot = self.decode_byte(inp)?;
        }
        Ok(data.len())
    }
}
