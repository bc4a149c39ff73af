//! Entropy registry (C4) and the `EntropyEncoder`/`EntropyDecoder` seam.
//!
//! Each coder is constructed fresh per block and bound to the block's
//! shared bit stream; block boundaries reset all statistics, so a coder
//! never needs to be told "this is a new block" — it simply doesn't
//! outlive one.

mod ans;
mod huffman;
mod none;
mod predictive;
mod range;

use crate::bitstream::{InputBitStream, OutputBitStream};
use crate::error::{KanziError, Result};

/// Registered entropy codec identifiers (5-bit field, §6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntropyKind {
    None,
    Huffman,
    Ans0,
    Ans1,
    Range,
    Fpaq,
    Tpaq,
    Tpaqx,
    Cm,
}

impl EntropyKind {
    /// 5-bit wire id.
    pub fn id(self) -> u32 {
        match self {
            EntropyKind::None => 0,
            EntropyKind::Huffman => 1,
            EntropyKind::Ans0 => 2,
            EntropyKind::Ans1 => 3,
            EntropyKind::Range => 4,
            EntropyKind::Fpaq => 5,
            EntropyKind::Tpaq => 6,
            EntropyKind::Tpaqx => 7,
            EntropyKind::Cm => 8,
        }
    }

    /// Decode a wire id back into a kind. Unknown ids are `InvalidCodec`.
    pub fn from_id(id: u32) -> Result<Self> {
        Ok(match id {
            0 => EntropyKind::None,
            1 => EntropyKind::Huffman,
            2 => EntropyKind::Ans0,
            3 => EntropyKind::Ans1,
            4 => EntropyKind::Range,
            5 => EntropyKind::Fpaq,
            6 => EntropyKind::Tpaq,
            7 => EntropyKind::Tpaqx,
            8 => EntropyKind::Cm,
            other => return Err(KanziError::InvalidCodec(other)),
        })
    }

    /// Case-insensitive name lookup, for `Context`/ctx-map construction.
    pub fn from_name(name: &str) -> Result<Self> {
        Ok(match name.to_ascii_uppercase().as_str() {
            "NONE" | "" => EntropyKind::None,
            "HUFFMAN" => EntropyKind::Huffman,
            "ANS0" => EntropyKind::Ans0,
            "ANS1" => EntropyKind::Ans1,
            "RANGE" => EntropyKind::Range,
            "FPAQ" => EntropyKind::Fpaq,
            "TPAQ" => EntropyKind::Tpaq,
            "TPAQX" => EntropyKind::Tpaqx,
            "CM" => EntropyKind::Cm,
            other => {
                return Err(KanziError::InvalidArgument(format!(
                    "unknown entropy codec name: {other}"
                )))
            }
        })
    }

    pub fn name(self) -> &'static str {
        match self {
            EntropyKind::None => "NONE",
            EntropyKind::Huffman => "HUFFMAN",
            EntropyKind::Ans0 => "ANS0",
            EntropyKind::Ans1 => "ANS1",
            EntropyKind::Range => "RANGE",
            EntropyKind::Fpaq => "FPAQ",
            EntropyKind::Tpaq => "TPAQ",
            EntropyKind::Tpaqx => "TPAQX",
            EntropyKind::Cm => "CM",
        }
    }
}

/// A fresh-per-block entropy encoder bound to the stream's shared bit sink.
pub trait EntropyEncoder {
    /// Encode `data` fully, returning the number of bytes consumed (must
    /// equal `data.len()` or the block fails with `EntropyFailure`).
    fn encode(&mut self, out: &mut OutputBitStream, data: &[u8]) -> Result<usize>;
}

/// A fresh-per-block entropy decoder bound to the stream's shared bit
/// source.
pub trait EntropyDecoder {
    /// Decode exactly `data.len()` bytes into `data`, returning the count
    /// written (must equal `data.len()` or the block fails with
    /// `EntropyFailure`).
    fn decode(&mut self, inp: &mut InputBitStream, data: &mut [u8]) -> Result<usize>;
}

/// C4: construct a fresh encoder for `kind`.
pub fn new_encoder(kind: EntropyKind) -> Box<dyn EntropyEncoder> {
    match kind {
        EntropyKind::None => Box::new(none::NoneEncoder),
        EntropyKind::Huffman => Box::new(huffman::HuffmanEncoder::new()),
        EntropyKind::Ans0 => Box::new(ans::Ans0Encoder::new()),
        EntropyKind::Ans1 => Box::new(ans::Ans1Encoder::new()),
        EntropyKind::Range => Box::new(range::RangeEncoder::new()),
        EntropyKind::Fpaq => Box::new(predictive::PredictiveEncoder::fpaq()),
        EntropyKind::Tpaq => Box::new(predictive::PredictiveEncoder::tpaq()),
        EntropyKind::Tpaqx => Box::new(predictive::PredictiveEncoder::tpaqx()),
        EntropyKind::Cm => Box::new(predictive::PredictiveEncoder::cm()),
    }
}

/// C4: construct a fresh decoder for `kind`.
pub fn new_decoder(kind: EntropyKind) -> Box<dyn EntropyDecoder> {
    match kind {
        EntropyKind::None => Box::new(none::NoneDecoder),
        EntropyKind::Huffman => Box::new(huffman::HuffmanDecoder::new()),
        EntropyKind::Ans0 => Box::new(ans::Ans0Decoder::new()),
        EntropyKind::Ans1 => Box::new(ans::Ans1Decoder::new()),
        EntropyKind::Range => Box::new(range::RangeDecoder::new()),
        EntropyKind::Fpaq => Box::new(predictive::PredictiveDecoder::fpaq()),
        EntropyKind::Tpaq => Box::new(predictive::PredictiveDecoder::tpaq()),
        EntropyKind::Tpaqx => Box::new(predictive::PredictiveDecoder::tpaqx()),
        EntropyKind::Cm => Box::new(predictive::PredictiveDecoder::cm()),
    }
}

/// Scaled (×1024) order-0 Shannon entropy of `data`, in "bits-per-symbol ×
/// 1024" units — §4.4 step 3's "first-order entropy (scaled by 1024)".
/// Empty input has no symbols to be uncertain about, so it is reported as
/// fully compressible (0), not incompressible.
pub fn scaled_order0_entropy(data: &[u8]) -> u32 {
    if data.is_empty() {
        return 0;
    }
    let mut counts = [0u32; 256];
    for &b in data {
        counts[b as usize] += 1;
    }
    let len = data.len() as f64;
    let mut bits = 0.0f64;
    for &c in &counts {
        if c == 0 {
            continue;
        }
        let p = c as f64 / len;
        bits -= p * p.log2();
    }
    // bits is entropy per symbol in [0, 8]; scale into [0, 1024 * 8 / 8]
    // i.e. normalize against 8 bits/symbol so the result lives in [0, 1024].
    ((bits / 8.0) * 1024.0).round() as u32
}

/// Threshold (in the same ×1024 units as [`scaled_order0_entropy`]) above
/// which a block is considered incompressible enough to force the
/// copy-block fast path when `skip_blocks` is enabled (§4.4 step 3).
pub const INCOMPRESSIBLE_THRESHOLD: u32 = 973; // ~7.6 bits/symbol
