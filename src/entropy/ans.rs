//! Range asymmetric numeral system coders (`ANS0` id 2, `ANS1` id 3).
//!
//! The renormalization arithmetic (32-bit state, `RANS_L = 1<<23` lower
//! bound, byte-wise renorm, LIFO symbol order with the encoder buffering
//! bytes and reversing them once at the end) follows Fabian Giesen's
//! public-domain `rans_byte.h` reference scheme — the same byte-wise rANS
//! construction this retrieval pack's archive crates reach for wherever
//! they need a tANS/rANS stage. `ANS0` is a static order-0 table
//! transmitted once per block; `ANS1` buckets by the high nibble of the
//! previous byte (16 independently normalized tables) to approximate an
//! order-1 model without the cost of a full 256-context table.

use super::{EntropyDecoder, EntropyEncoder};
use crate::bitstream::{InputBitStream, OutputBitStream};
use crate::error::Result;

const SCALE_BITS: u32 = 12;
const SCALE: u32 = 1 << SCALE_BITS;
const RANS_L: u32 = 1 << 23;
const HEADER_FIELD_BITS: u32 = 13; // holds 0..=4096
const NUM_SYMBOLS: usize = 256;

/// One normalized frequency table (frequencies summing to `SCALE`) plus its
/// derived cumulative starts and slot→symbol lookup.
struct Model {
    freq: [u32; NUM_SYMBOLS],
    start: [u32; NUM_SYMBOLS],
    slot2sym: Vec<u8>,
}

impl Model {
    fn from_freqs(freq: [u32; NUM_SYMBOLS]) -> Self {
        let mut start = [0u32; NUM_SYMBOLS];
        let mut acc = 0u32;
        for i in 0..NUM_SYMBOLS {
            start[i] = acc;
            acc += freq[i];
        }
        let mut slot2sym = vec![0u8; SCALE as usize];
        for sym in 0..NUM_SYMBOLS {
            for s in start[sym]..start[sym] + freq[sym] {
                slot2sym[s as usize] = sym as u8;
            }
        }
        Model {
            freq,
            start,
            slot2sym,
        }
    }

    fn from_counts(counts: &[u64; NUM_SYMBOLS]) -> Self {
        Model::from_freqs(normalize_freqs(counts))
    }

    fn write(&self, out: &mut OutputBitStream) -> Result<()> {
        for &f in &self.freq {
            out.write_bits(f as u64, HEADER_FIELD_BITS)?;
        }
        Ok(())
    }

    fn read(inp: &mut InputBitStream) -> Result<Self> {
        let mut freq = [0u32; NUM_SYMBOLS];
        for slot in freq.iter_mut() {
            *slot = inp.read_bits(HEADER_FIELD_BITS)? as u32;
        }
        Ok(Model::from_freqs(freq))
    }
}

fn normalize_freqs(counts: &[u64; NUM_SYMBOLS]) -> [u32; NUM_SYMBOLS] {
    let total: u64 = counts.iter().sum();
    if total == 0 {
        return [(SCALE / NUM_SYMBOLS as u32); NUM_SYMBOLS];
    }
    let target = SCALE as u64;
    let mut freqs = [0u32; NUM_SYMBOLS];
    let mut sum = 0u64;
    for i in 0..NUM_SYMBOLS {
        if counts[i] == 0 {
            continue;
        }
        let f = ((counts[i] * target) / total).max(1);
        freqs[i] = f as u32;
        sum += f;
    }
    if sum > target {
        let mut excess = sum - target;
        while excess > 0 {
            let (idx, _) = freqs
                .iter()
                .enumerate()
                .filter(|&(_, &f)| f > 1)
                .max_by_key(|&(_, &f)| f)
                .expect("sum > target implies some bucket has freq > 1");
            freqs[idx] -= 1;
            excess -= 1;
        }
    } else if sum < target {
        let mut deficit = target - sum;
        while deficit > 0 {
            let (idx, _) = freqs
                .iter()
                .enumerate()
                .filter(|&(_, &f)| f > 0)
                .max_by_key(|&(_, &f)| f)
                .expect("at least one bucket is nonzero since total > 0");
            freqs[idx] += 1;
            deficit -= 1;
        }
    }
    freqs
}

fn rans_flush_state(buf: &mut Vec<u8>, x: u32) {
    buf.push(((x >> 24) & 0xff) as u8);
    buf.push(((x >> 16) & 0xff) as u8);
    buf.push(((x >> 8) & 0xff) as u8);
    buf.push((x & 0xff) as u8);
}

fn rans_init_state(inp: &mut InputBitStream) -> Result<u32> {
    let b0 = inp.read_bits(8)? as u32;
    let b1 = inp.read_bits(8)? as u32;
    let b2 = inp.read_bits(8)? as u32;
    let b3 = inp.read_bits(8)? as u32;
    Ok(b0 | (b1 << 8) | (b2 << 16) | (b3 << 24))
}

fn rans_encode_symbol(out_buf: &mut Vec<u8>, x: &mut u32, model: &Model, sym: u8) {
    let freq = model.freq[sym as usize];
    let start = model.start[sym as usize];
    let x_max = ((RANS_L >> SCALE_BITS) << 8) * freq;
    while *x >= x_max {
        out_buf.push((*x & 0xff) as u8);
        *x >>= 8;
    }
    *x = ((*x / freq) << SCALE_BITS) + (*x % freq) + start;
}

fn rans_decode_symbol(inp: &mut InputBitStream, x: &mut u32, model: &Model) -> Result<u8> {
    let slot = *x & (SCALE - 1);
    let sym = model.slot2sym[slot as usize];
    let freq = model.freq[sym as usize];
    let start = model.start[sym as usize];
    *x = freq * (*x >> SCALE_BITS) + slot - start;
    while *x < RANS_L {
        let byte = inp.read_bits(8)? as u32;
        *x = (*x << 8) | byte;
    }
    Ok(sym)
}

// ---------------------------------------------------------------------
// ANS0: single order-0 table for the whole block.
// ---------------------------------------------------------------------

pub struct Ans0Encoder;

impl Ans0Encoder {
    pub fn new() -> Self {
        Ans0Encoder
    }
}

impl EntropyEncoder for Ans0Encoder {
    fn encode(&mut self, out: &mut OutputBitStream, data: &[u8]) -> Result<usize> {
        let mut counts = [0u64; NUM_SYMBOLS];
        for &b in data {
            counts[b as usize] += 1;
        }
        let model = Model::from_counts(&counts);
        model.write(out)?;

        if data.is_empty() {
            return Ok(0);
        }

        let mut buf: Vec<u8> = Vec::new();
        let mut x: u32 = RANS_L;
        for &b in data.iter().rev() {
            rans_encode_symbol(&mut buf, &mut x, &model, b);
        }
        rans_flush_state(&mut buf, x);
        buf.reverse();
        for b in &buf {
            out.write_bits(*b as u64, 8)?;
        }
        Ok(data.len())
    }
}

pub struct Ans0Decoder;

impl Ans0Decoder {
    pub fn new() -> Self {
        Ans0Decoder
    }
}

impl EntropyDecoder for Ans0Decoder {
    fn decode(&mut self, inp: &mut InputBitStream, data: &mut [u8]) -> Result<usize> {
        let model = Model::read(inp)?;
        if data.is_empty() {
            return Ok(0);
        }
        let mut x = rans_init_state(inp)?;
        for slot in data.iter_mut() {
            *slot = rans_decode_symbol(inp, &mut x, &model)?;
        }
        Ok(data.len())
    }
}

// ---------------------------------------------------------------------
// ANS1: 16 tables bucketed by the high nibble of the previous byte.
// ---------------------------------------------------------------------

const NUM_CTX: usize = 16;

fn ctx_of(prev: u8) -> usize {
    (prev >> 4) as usize
}

pub struct Ans1Encoder;

impl Ans1Encoder {
    pub fn new() -> Self {
        Ans1Encoder
    }
}

impl EntropyEncoder for Ans1Encoder {
    fn encode(&mut self, out: &mut OutputBitStream, data: &[u8]) -> Result<usize> {
        let mut counts = vec![[0u64; NUM_SYMBOLS]; NUM_CTX];
        let mut prev = 0u8;
        for &b in data {
            counts[ctx_of(prev)][b as usize] += 1;
            prev = b;
        }
        let models: Vec<Model> = counts.iter().map(Model::from_counts).collect();
        for m in &models {
            m.write(out)?;
        }

        if data.is_empty() {
            return Ok(0);
        }

        // Contexts are derived from the previous byte in the *forward*
        // sequence, so they must be precomputed before the backward rANS
        // encode pass.
        let mut ctxs = vec![0usize; data.len()];
        let mut prev = 0u8;
        for (i, &b) in data.iter().enumerate() {
            ctxs[i] = ctx_of(prev);
            prev = b;
        }

        let mut buf: Vec<u8> = Vec::new();
        let mut x: u32 = RANS_L;
        for i in (0..data.len()).rev() {
            rans_encode_symbol(&mut buf, &mut x, &models[ctxs[i]], data[i]);
        }
        rans_flush_state(&mut buf, x);
        buf.reverse();
        for b in &buf {
            out.write_bits(*b as u64, 8)?;
        }
        Ok(data.len())
    }
}

pub struct Ans1Decoder;

impl Ans1Decoder {
    pub fn new() -> Self {
        Ans1Decoder
    }
}

impl EntropyDecoder for Ans1Decoder {
    fn decode(&mut self, inp: &mut InputBitStream, data: &mut [u8]) -> Result<usize> {
        let mut models = Vec::with_capacity(NUM_CTX);
        for _ in 0..NUM_CTX {
            models.push(Model::read(inp)?);
        }
        if data.is_empty() {
            return Ok(0);
        }
        let mut x = rans_init_state(inp)?;
        let mut prev = 0u8;
        for slot in data.iter_mut() {
            let sym = rans_decode_symbol(inp, &mut x, &models[ctx_of(prev)])?;
            *slot = sym;
            prev = sym;
        }
        Ok(data.len())
    }
}
