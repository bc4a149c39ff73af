//! Transform registry (C3) and transform sequence (C5).
//!
//! Each transform is a reversible byte-to-byte mapping satisfying
//! [`ByteTransform`]. The registry maps 6-bit wire ids and `+`-joined names
//! (`"BWT+RANK+ZRLT"`) to up to 8 of them; [`TransformSequence`] composes
//! them with per-stage fallback-to-copy, recording which stages were
//! skipped in an 8-bit flag register exactly as the bitstream's mode byte
//! expects.

mod bwt;
mod bwts;
mod lz;
mod mtft;
mod none;
mod rank;
mod rlt;
mod rolz;
mod snappy;
mod text;
mod varint;
mod x86;
mod zrlt;

use crate::consts::MAX_TRANSFORMS;
use crate::error::{KanziError, Result};

/// A reversible byte-to-byte stage. `forward`/`inverse` report success via
/// `bool` rather than `Result`: per §4.3, a forward failure is recovered
/// locally by the sequence (copy-through + skip flag), never propagated as
/// a crate-level error. Only an inverse failure on a stage the header says
/// ran escalates to [`KanziError::TransformInverseFailed`].
pub trait ByteTransform: Send {
    /// Applies the forward transform. Returns `false` if the transform
    /// declines (e.g. growth past `dst`'s capacity, or no benefit found);
    /// the caller must then treat this stage as skipped.
    fn forward(&mut self, src: &[u8], dst: &mut Vec<u8>) -> bool;

    /// Applies the inverse transform. Returns `false` on malformed input.
    fn inverse(&mut self, src: &[u8], dst: &mut Vec<u8>) -> bool;

    /// Worst-case output length for an input of length `n`. Must be
    /// `>= n` for any transform that cannot guarantee it never grows data.
    fn max_encoded_length(&self, n: usize) -> usize;
}

/// Registered transform token identifiers (6-bit field, §6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransformKind {
    None,
    Bwt,
    Bwts,
    Lz,
    Snappy,
    Rlt,
    Zrlt,
    Mtft,
    Rank,
    X86,
    Text,
    Rolz,
}

impl TransformKind {
    pub fn id(self) -> u32 {
        match self {
            TransformKind::None => 0,
            TransformKind::Bwt => 1,
            TransformKind::Bwts => 2,
            TransformKind::Lz => 3,
            TransformKind::Snappy => 4,
            TransformKind::Rlt => 5,
            TransformKind::Zrlt => 6,
            TransformKind::Mtft => 7,
            TransformKind::Rank => 8,
            TransformKind::X86 => 9,
            TransformKind::Text => 10,
            TransformKind::Rolz => 11,
        }
    }

    pub fn from_id(id: u32) -> Result<Self> {
        Ok(match id {
            0 => TransformKind::None,
            1 => TransformKind::Bwt,
            2 => TransformKind::Bwts,
            3 => TransformKind::Lz,
            4 => TransformKind::Snappy,
            5 => TransformKind::Rlt,
            6 => TransformKind::Zrlt,
            7 => TransformKind::Mtft,
            8 => TransformKind::Rank,
            9 => TransformKind::X86,
            10 => TransformKind::Text,
            11 => TransformKind::Rolz,
            other => return Err(KanziError::InvalidCodec(other)),
        })
    }

    pub fn from_name(name: &str) -> Result<Self> {
        Ok(match name.to_ascii_uppercase().as_str() {
            "NONE" | "" => TransformKind::None,
            "BWT" => TransformKind::Bwt,
            "BWTS" => TransformKind::Bwts,
            "LZ" | "LZ4" => TransformKind::Lz,
            "SNAPPY" => TransformKind::Snappy,
            "RLT" => TransformKind::Rlt,
            "ZRLT" => TransformKind::Zrlt,
            "MTFT" => TransformKind::Mtft,
            "RANK" => TransformKind::Rank,
            "X86" => TransformKind::X86,
            "TEXT" => TransformKind::Text,
            "ROLZ" => TransformKind::Rolz,
            other => {
                return Err(KanziError::InvalidArgument(format!(
                    "unknown transform name: {other}"
                )))
            }
        })
    }

    pub fn name(self) -> &'static str {
        match self {
            TransformKind::None => "NONE",
            TransformKind::Bwt => "BWT",
            TransformKind::Bwts => "BWTS",
            TransformKind::Lz => "LZ",
            TransformKind::Snappy => "SNAPPY",
            TransformKind::Rlt => "RLT",
            TransformKind::Zrlt => "ZRLT",
            TransformKind::Mtft => "MTFT",
            TransformKind::Rank => "RANK",
            TransformKind::X86 => "X86",
            TransformKind::Text => "TEXT",
            TransformKind::Rolz => "ROLZ",
        }
    }

    fn new_transform(self) -> Box<dyn ByteTransform> {
        match self {
            TransformKind::None => Box::new(none::NoneTransform),
            TransformKind::Bwt => Box::new(bwt::BwtTransform::new()),
            TransformKind::Bwts => Box::new(bwts::BwtsTransform::new()),
            TransformKind::Lz => Box::new(lz::LzTransform::new()),
            TransformKind::Snappy => Box::new(snappy::SnappyTransform::new()),
            TransformKind::Rlt => Box::new(rlt::RltTransform::new()),
            TransformKind::Zrlt => Box::new(zrlt::ZrltTransform::new()),
            TransformKind::Mtft => Box::new(mtft::MtftTransform::new()),
            TransformKind::Rank => Box::new(rank::RankTransform::new()),
            TransformKind::X86 => Box::new(x86::X86Transform::new()),
            TransformKind::Text => Box::new(text::TextTransform::new()),
            TransformKind::Rolz => Box::new(rolz::RolzTransform::new()),
        }
    }
}

/// Parse a `+`-joined transform name (`"BWT+RANK+ZRLT"`) into an ordered,
/// `NONE`-curated list of up to [`MAX_TRANSFORMS`] kinds (§3 "transform
/// slot packing": identity tokens are curated out before packing).
pub fn parse_name(name: &str) -> Result<Vec<TransformKind>> {
    let mut kinds = Vec::new();
    if name.is_empty() || name.eq_ignore_ascii_case("none") {
        return Ok(kinds);
    }
    for part in name.split('+') {
        let kind = TransformKind::from_name(part.trim())?;
        if kind != TransformKind::None {
            kinds.push(kind);
        }
    }
    if kinds.len() > MAX_TRANSFORMS {
        return Err(KanziError::InvalidArgument(format!(
            "transform sequence has {} stages, max {MAX_TRANSFORMS}",
            kinds.len()
        )));
    }
    Ok(kinds)
}

/// Pack up to 8 transform kinds into the 48-bit wire field, MSB-first,
/// unused slots packed as `NONE` (id 0).
pub fn pack_transform_type(kinds: &[TransformKind]) -> u64 {
    let mut packed: u64 = 0;
    for slot in 0..MAX_TRANSFORMS {
        let id = kinds.get(slot).map(|k| k.id() as u64).unwrap_or(0);
        packed = (packed << 6) | id;
    }
    packed
}

/// Unpack the 48-bit wire field back into an ordered list, dropping
/// trailing `NONE` slots.
pub fn unpack_transform_type(packed: u64) -> Result<Vec<TransformKind>> {
    let mut kinds = Vec::new();
    for slot in 0..MAX_TRANSFORMS {
        let shift = (MAX_TRANSFORMS - 1 - slot) * 6;
        let id = ((packed >> shift) & 0x3F) as u32;
        let kind = TransformKind::from_id(id)?;
        if kind != TransformKind::None {
            kinds.push(kind);
        }
    }
    Ok(kinds)
}

/// C5: an ordered, at-most-8-stage composition of [`ByteTransform`]s with
/// per-stage fallback and an 8-bit skip-flag register.
pub struct TransformSequence {
    stages: Vec<Box<dyn ByteTransform>>,
    skip_flags: u8,
}

impl TransformSequence {
    pub fn new(kinds: &[TransformKind]) -> Self {
        TransformSequence {
            stages: kinds.iter().map(|k| k.new_transform()).collect(),
            skip_flags: 0xFF,
        }
    }

    pub fn skip_flags(&self) -> u8 {
        self.skip_flags
    }

    pub fn set_skip_flags(&mut self, flags: u8) {
        self.skip_flags = flags;
    }

    pub fn max_encoded_length(&self, n: usize) -> usize {
        self.stages
            .iter()
            .map(|s| s.max_encoded_length(n))
            .max()
            .unwrap_or(n)
            .max(n)
    }

    /// §4.3 `forward`: returns `true` if at least one stage did real work.
    pub fn forward(&mut self, src: &[u8], dst: &mut Vec<u8>) -> bool {
        if self.stages.is_empty() || src.is_empty() {
            dst.clear();
            dst.extend_from_slice(src);
            self.skip_flags = 0xFF;
            return false;
        }

        let mut flags: u8 = 0;
        let mut current = src.to_vec();
        for (i, stage) in self.stages.iter_mut().enumerate() {
            let mut next = Vec::with_capacity(stage.max_encoded_length(current.len()));
            let ok = stage.forward(&current, &mut next);
            if !ok {
                next.clear();
                next.extend_from_slice(&current);
                flags |= 1 << (7 - i);
            }
            current = next;
        }
        for i in self.stages.len()..MAX_TRANSFORMS {
            flags |= 1 << (7 - i);
        }
        self.skip_flags = flags;
        *dst = current;
        self.skip_flags != 0xFF
    }

    /// §4.3 `inverse`: stages whose skip bit is set are bypassed.
    pub fn inverse(&mut self, src: &[u8], dst: &mut Vec<u8>) -> Result<()> {
        if self.skip_flags == 0xFF {
            dst.clear();
            dst.extend_from_slice(src);
            return Ok(());
        }

        let mut current = src.to_vec();
        for (i, stage) in self.stages.iter_mut().enumerate().rev() {
            let skipped = (self.skip_flags >> (7 - i)) & 1 == 1;
            let mut prev = Vec::new();
            if skipped {
                prev.extend_from_slice(&current);
            } else if !stage.inverse(&current, &mut prev) {
                return Err(KanziError::TransformInverseFailed {
                    block_id: 0,
                    stage: i,
                });
            }
            current = prev;
        }
        *dst = current;
        Ok(())
    }
}
