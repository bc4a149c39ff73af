//! Block encoder task (C6, §4.4).

use crate::barrier::{AdvanceGuard, BlockBarrier};
use crate::bitstream::OutputBitStream;
use crate::block::{build_mode, data_size_for, length_field_bits};
use crate::consts::SMALL_BLOCK_SIZE;
use crate::context::Context;
use crate::entropy::{new_encoder, scaled_order0_entropy, EntropyKind, INCOMPRESSIBLE_THRESHOLD};
use crate::error::{KanziError, Result};
use crate::hasher::hash32;
use crate::transform::{parse_name, TransformKind, TransformSequence};
use std::sync::Mutex;

/// Outcome of one encode task.
pub struct EncodeResult {
    pub block_id: u64,
    pub bytes_emitted: u64,
}

/// Encode block `block_id` (1-based) holding `src`, serializing its header
/// and entropy-coded payload onto `out` once its predecessor has released
/// the barrier (§4.4 steps 1-10).
#[tracing::instrument(level = "debug", skip(src, ctx, out, barrier), fields(len = src.len()))]
pub fn run(
    block_id: u64,
    src: &[u8],
    ctx: &Context,
    out: &Mutex<OutputBitStream>,
    barrier: &BlockBarrier,
) -> Result<EncodeResult> {
    let l = src.len();

    // Step 1: checksum, computed before any transform touches the data.
    let checksum = if ctx.checksum { Some(hash32(src)) } else { None };

    // Steps 2-3: small-block and skip-incompressible-block fast paths both
    // force NONE/NONE with the copy-block bit set.
    let force_copy = l <= SMALL_BLOCK_SIZE
        || (ctx.skip_blocks && scaled_order0_entropy(src) >= INCOMPRESSIBLE_THRESHOLD);
    if force_copy {
        tracing::debug!(block_id, "copy-block fast path");
    }

    let transform_kinds: Vec<TransformKind> = if force_copy {
        Vec::new()
    } else {
        parse_name(&ctx.transform)?
    };
    let entropy_kind = if force_copy {
        EntropyKind::None
    } else {
        ctx.entropy
    };

    // Step 4: forward transform.
    let mut seq = TransformSequence::new(&transform_kinds);
    let mut transformed = Vec::with_capacity(seq.max_encoded_length(l));
    seq.forward(src, &mut transformed);
    let p = transformed.len() as u64;

    // Step 5: ordering barrier. Acquired before the fallible header-planning
    // step below so that a `data_size_for` failure still releases the slot
    // for block_id+1 instead of deadlocking every successor's `wait_for`.
    barrier.wait_for(block_id as i64);
    let _guard = AdvanceGuard::new(barrier, block_id);

    // Step 6: header planning.
    let data_size = data_size_for(p, block_id)?;
    let (mode, extended) = build_mode(force_copy, data_size, seq.skip_flags(), transform_kinds.len());

    let mut bits = out.lock().expect("output bit stream mutex poisoned");

    // Step 7: emit header.
    bits.write_bits(mode as u64, 8)?;
    if let Some(ext) = extended {
        bits.write_bits(ext as u64, 8)?;
    }
    bits.write_bits(p, length_field_bits(data_size))?;
    if let Some(crc) = checksum {
        bits.write_bits(crc as u64, 32)?;
    }

    // Step 8: entropy-encode the transformed payload.
    let mut encoder = new_encoder(entropy_kind);
    let written = encoder.encode(&mut bits, &transformed[..p as usize])?;
    if written as u64 != p {
        let err = KanziError::EntropyFailure {
            block_id,
            expected: p as usize,
            actual: written,
        };
        tracing::error!(block_id, %err, "entropy encoder returned wrong byte count");
        return Err(err);
    }

    // Step 9: the guard advances `processed_block_id` on drop, whatever
    // path we took to get here.
    Ok(EncodeResult {
        block_id,
        bytes_emitted: p,
    })
}
