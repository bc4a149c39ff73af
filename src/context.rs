//! Per-stream configuration (§4.6, §4.7, §9 "context propagation").
//!
//! The original design threads a loosely-typed key-value map into each task;
//! the idiomatic Rust rendering is a validated, `Clone`-by-value record
//! constructed once at stream-open time and handed to every spawned task —
//! the same "prepared prefs passed by value" shape this lineage's LZ4 port
//! uses for its own `Prefs` record.

use crate::consts::{MAX_BITSTREAM_BLOCK_SIZE, MAX_CONCURRENCY, MIN_BITSTREAM_BLOCK_SIZE};
use crate::entropy::EntropyKind;
use crate::error::{KanziError, Result};
use std::collections::HashMap;

/// Default block size (1 MiB) when a caller does not specify one.
pub const DEFAULT_BLOCK_SIZE: u32 = 1 << 20;

/// Validated, `Clone`-cheap configuration shared by every task a stream
/// spawns. Built via [`ContextBuilder`] or [`Context::from_map`].
#[derive(Debug, Clone)]
pub struct Context {
    /// Number of concurrent encode/decode workers, in `1..=MAX_CONCURRENCY`.
    pub jobs: usize,
    /// Entropy codec applied to every block's transformed payload.
    pub entropy: EntropyKind,
    /// Transform name, e.g. `"BWT+RANK+ZRLT"` or `"NONE"`.
    pub transform: String,
    /// Block size in bytes; a multiple of 16 within
    /// `[MIN_BITSTREAM_BLOCK_SIZE, MAX_BITSTREAM_BLOCK_SIZE]`.
    pub block_size: u32,
    /// Whether each block carries a 32-bit XXHash32 checksum.
    pub checksum: bool,
    /// Whether to fast-path blocks whose first-order entropy looks
    /// incompressible (§4.4 step 3).
    pub skip_blocks: bool,
    /// Total input size, if known in advance (used for the header's
    /// `nb_input_blocks_hint`).
    pub file_size: Option<u64>,
    /// Decode-only: first block id to decode (1-based). `None` = from start.
    pub from: Option<u64>,
    /// Decode-only: last block id to decode (1-based, inclusive). `None` =
    /// to the end of stream.
    pub to: Option<u64>,
}

impl Default for Context {
    fn default() -> Self {
        Context {
            jobs: 1,
            entropy: EntropyKind::None,
            transform: "NONE".to_string(),
            block_size: DEFAULT_BLOCK_SIZE,
            checksum: false,
            skip_blocks: false,
            file_size: None,
            from: None,
            to: None,
        }
    }
}

impl Context {
    /// Validate field ranges and apply the `jobs * block_size <= 2^31 - 1`
    /// cap by reducing `jobs` (§4.6).
    pub fn validated(mut self) -> Result<Self> {
        if self.jobs == 0 || self.jobs > MAX_CONCURRENCY {
            return Err(KanziError::InvalidArgument(format!(
                "jobs must be in 1..={MAX_CONCURRENCY}, got {}",
                self.jobs
            )));
        }
        if self.block_size % 16 != 0
            || self.block_size < MIN_BITSTREAM_BLOCK_SIZE
            || self.block_size > MAX_BITSTREAM_BLOCK_SIZE
        {
            return Err(KanziError::InvalidBlockSize(self.block_size));
        }

        while (self.jobs as u64) * (self.block_size as u64) > (i32::MAX as u64) && self.jobs > 1 {
            self.jobs -= 1;
        }

        Ok(self)
    }

    /// Build a `Context` from an untyped string map, the shape an external
    /// CLI-style collaborator would hand in. Unrecognized keys are logged
    /// at `warn!` and otherwise ignored, per §4.6/§4.7.
    pub fn from_map(map: &HashMap<String, String>) -> Result<Self> {
        let mut ctx = Context::default();
        const RECOGNIZED: &[&str] = &[
            "jobs",
            "codec",
            "transform",
            "blockSize",
            "checksum",
            "skipBlocks",
            "fileSize",
            "from",
            "to",
        ];

        for (key, value) in map {
            match key.as_str() {
                "jobs" => {
                    ctx.jobs = value.parse().map_err(|_| {
                        KanziError::InvalidArgument(format!("jobs: not a number: {value}"))
                    })?;
                }
                "codec" => ctx.entropy = EntropyKind::from_name(value)?,
                "transform" => ctx.transform = value.clone(),
                "blockSize" => {
                    ctx.block_size = value.parse().map_err(|_| {
                        KanziError::InvalidArgument(format!("blockSize: not a number: {value}"))
                    })?;
                }
                "checksum" => ctx.checksum = value == "true" || value == "1",
                "skipBlocks" => ctx.skip_blocks = value == "true" || value == "1",
                "fileSize" => {
                    ctx.file_size = Some(value.parse().map_err(|_| {
                        KanziError::InvalidArgument(format!("fileSize: not a number: {value}"))
                    })?);
                }
                "from" => ctx.from = Some(value.parse().unwrap_or(0)),
                "to" => ctx.to = Some(value.parse().unwrap_or(0)),
                other => {
                    if !RECOGNIZED.contains(&other) {
                        tracing::warn!(key = other, "unrecognized context key ignored");
                    }
                }
            }
        }

        ctx.validated()
    }

    /// `ceil(file_size / block_size)` clamped into the header's 6-bit hint
    /// range (0 = unknown, 63 = "63 or more").
    pub fn input_blocks_hint(&self) -> u8 {
        match self.file_size {
            None | Some(0) => 0,
            Some(size) => {
                let blocks = size.div_ceil(self.block_size as u64);
                blocks.min(63) as u8
            }
        }
    }
}

/// Incremental builder mirroring `Context::from_map`'s field set, for
/// callers constructing a context programmatically rather than from an
/// untyped map.
#[derive(Debug, Default)]
pub struct ContextBuilder {
    ctx: Context,
}

impl ContextBuilder {
    /// Start from the default context.
    pub fn new() -> Self {
        ContextBuilder {
            ctx: Context::default(),
        }
    }

    /// Set the number of concurrent workers.
    pub fn jobs(mut self, jobs: usize) -> Self {
        self.ctx.jobs = jobs;
        self
    }

    /// Set the entropy codec.
    pub fn entropy(mut self, entropy: EntropyKind) -> Self {
        self.ctx.entropy = entropy;
        self
    }

    /// Set the transform name (e.g. `"BWT+RANK+ZRLT"`).
    pub fn transform(mut self, transform: impl Into<String>) -> Self {
        self.ctx.transform = transform.into();
        self
    }

    /// Set the block size in bytes.
    pub fn block_size(mut self, block_size: u32) -> Self {
        self.ctx.block_size = block_size;
        self
    }

    /// Enable or disable per-block checksums.
    pub fn checksum(mut self, checksum: bool) -> Self {
        self.ctx.checksum = checksum;
        self
    }

    /// Enable or disable the incompressible-block skip fast path.
    pub fn skip_blocks(mut self, skip_blocks: bool) -> Self {
        self.ctx.skip_blocks = skip_blocks;
        self
    }

    /// Record the total input size in advance, if known.
    pub fn file_size(mut self, file_size: u64) -> Self {
        self.ctx.file_size = Some(file_size);
        self
    }

    /// Validate and produce the final `Context`.
    pub fn build(self) -> Result<Context> {
        self.ctx.validated()
    }
}
