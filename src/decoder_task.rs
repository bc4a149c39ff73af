//! Block decoder task (C7, §4.5).

use crate::barrier::{AdvanceGuard, BlockBarrier};
use crate::bitstream::InputBitStream;
use crate::block::{length_field_bits, skip_flags_from_mode};
use crate::consts::{CANCEL_TASKS_ID, COPY_BLOCK_MASK, MAX_BITSTREAM_BLOCK_SIZE, TRANSFORMS_MASK};
use crate::entropy::{new_decoder, EntropyKind};
use crate::error::{KanziError, Result};
use crate::hasher::hash32;
use crate::transform::{TransformKind, TransformSequence};
use std::sync::Mutex;

/// Outcome of one decode task.
pub struct DecodeResult {
    pub block_id: u64,
    pub data: Vec<u8>,
    /// Set when this task observed the terminal (empty) block record, or
    /// the cancel sentinel left by an earlier terminal/failed block.
    pub terminal: bool,
}

/// Decode block `block_id` (1-based). `transforms`/`entropy`/`checksum`
/// come from the stream header and are shared by every non-copy block;
/// copy-block records always use `NONE`/`NONE` regardless (§4.4 steps 2-3
/// force this at encode time; §4.5 step 2 reconstructs it from the mode
/// byte alone).
#[tracing::instrument(level = "debug", skip(transforms, inp, barrier))]
pub fn run(
    block_id: u64,
    transforms: &[TransformKind],
    entropy: EntropyKind,
    checksum_enabled: bool,
    inp: &Mutex<InputBitStream>,
    barrier: &BlockBarrier,
) -> Result<DecodeResult> {
    // Step 1: ordering barrier, with the cancel-sentinel early-out.
    if !barrier.wait_for(block_id as i64) {
        return Ok(DecodeResult {
            block_id,
            data: Vec::new(),
            terminal: true,
        });
    }

    let transformed;
    let skip_flags;
    let copy_block;
    let expected_checksum;
    {
        let guard = AdvanceGuard::new(barrier, block_id);
        let mut bits = inp.lock().expect("input bit stream mutex poisoned");

        // Step 2: parse the block header.
        let mode = bits.read_bits(8)? as u8;
        copy_block = mode & COPY_BLOCK_MASK != 0;
        let extended = mode & TRANSFORMS_MASK != 0;
        let ext_byte = if extended {
            Some(bits.read_bits(8)? as u8)
        } else {
            None
        };
        skip_flags = skip_flags_from_mode(mode, ext_byte);
        let data_size = (mode >> 5) & 0x03;
        let p = bits.read_bits(length_field_bits(data_size))?;

        // Step 3: terminal block.
        if p == 0 {
            guard.set_target(CANCEL_TASKS_ID);
            return Ok(DecodeResult {
                block_id,
                data: Vec::new(),
                terminal: true,
            });
        }

        // Step 4: bounds check.
        if p > MAX_BITSTREAM_BLOCK_SIZE as u64 {
            guard.set_target(CANCEL_TASKS_ID);
            return Err(KanziError::InvalidBlockLength(p as i64));
        }

        // Step 5.
        expected_checksum = if checksum_enabled {
            Some(bits.read_bits(32)? as u32)
        } else {
            None
        };

        // Step 6: entropy decode.
        let entropy_kind = if copy_block {
            EntropyKind::None
        } else {
            entropy
        };
        let mut buf = vec![0u8; p as usize];
        let mut decoder = new_decoder(entropy_kind);
        let n = decoder.decode(&mut bits, &mut buf)?;
        if n != p as usize {
            return Err(KanziError::EntropyFailure {
                block_id,
                expected: p as usize,
                actual: n,
            });
        }
        transformed = buf;
        // Step 7: `guard` and the bit-stream lock both drop here, releasing
        // the barrier before the (unsynchronized) inverse transform runs.
    }

    // Step 8: inverse transform.
    let kinds: &[TransformKind] = if copy_block { &[] } else { transforms };
    let mut seq = TransformSequence::new(kinds);
    seq.set_skip_flags(skip_flags);
    let mut dst = Vec::new();
    seq.inverse(&transformed, &mut dst)
        .map_err(|e| match e {
            KanziError::TransformInverseFailed { stage, .. } => {
                KanziError::TransformInverseFailed { block_id, stage }
            }
            other => other,
        })?;

    // Step 9: checksum verification.
    if let Some(expected) = expected_checksum {
        let computed = hash32(&dst);
        if computed != expected {
            let err = KanziError::CrcMismatch {
                block_id,
                expected,
                computed,
            };
            tracing::error!(block_id, %err, "checksum mismatch");
            return Err(err);
        }
    }

    Ok(DecodeResult {
        block_id,
        data: dst,
        terminal: false,
    })
}
