//! Crate-wide error type for the block codec core.
//!
//! Mirrors the error taxonomy from the block codec specification: each
//! variant corresponds to one row of that taxonomy, not to an arbitrary
//! `anyhow`-style bag. Recoverable, block-local conditions (a transform
//! stage declining to compress) are represented as `bool`/`Option` returns
//! deeper in the stack and never surface as a `KanziError`.

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, KanziError>;

/// Errors produced by the block codec core.
#[derive(Debug, Error)]
pub enum KanziError {
    /// A read or write was attempted after `close()`.
    #[error("stream is closed")]
    StreamClosed,

    /// A context/configuration value was out of range or otherwise invalid.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The stream header magic did not match `"KANZ"`.
    #[error("invalid stream magic: expected {expected:#010x}, found {found:#010x}")]
    InvalidMagic {
        /// Expected magic constant.
        expected: u32,
        /// Magic value actually read from the stream.
        found: u32,
    },

    /// The stream header declared a version this crate does not implement.
    #[error("unsupported stream version: {0}")]
    UnsupportedVersion(u8),

    /// The stream header (or context) declared a block size outside
    /// `[MIN_BITSTREAM_BLOCK_SIZE, MAX_BITSTREAM_BLOCK_SIZE]`.
    #[error("invalid block size: {0} bytes")]
    InvalidBlockSize(u32),

    /// An unknown transform or entropy codec id was encountered.
    #[error("invalid codec id: {0}")]
    InvalidCodec(u32),

    /// A decoded pre-transform length was zero-for-a-non-terminal-block,
    /// negative, or exceeded `max_bitstream_block_size`.
    #[error("invalid block length: {0}")]
    InvalidBlockLength(i64),

    /// An entropy encoder/decoder returned a byte count that did not match
    /// the expected pre-transform length.
    #[error("entropy coder failure for block {block_id}: expected {expected} bytes, got {actual}")]
    EntropyFailure {
        /// The block that failed.
        block_id: u64,
        /// Bytes the entropy stage was expected to produce/consume.
        expected: usize,
        /// Bytes it actually produced/consumed.
        actual: usize,
    },

    /// A non-skipped transform stage's `inverse()` returned failure.
    #[error("inverse transform failed for block {block_id} at stage {stage}")]
    TransformInverseFailed {
        /// The block that failed.
        block_id: u64,
        /// Index of the failing stage in the transform sequence.
        stage: usize,
    },

    /// The recomputed XXHash32 checksum did not match the stored checksum.
    #[error("checksum mismatch for block {block_id}: expected {expected:#010x}, computed {computed:#010x}")]
    CrcMismatch {
        /// The block that failed.
        block_id: u64,
        /// Checksum stored in the bitstream.
        expected: u32,
        /// Checksum recomputed from the decoded block.
        computed: u32,
    },

    /// The transform sequence reported a pre-transform length that cannot
    /// be represented (negative, or larger than `max_encoded_length`).
    #[error("invalid transform output size for block {block_id}: {size}")]
    InvalidTransformSize {
        /// The block that failed.
        block_id: u64,
        /// The offending size.
        size: i64,
    },

    /// I/O failure from the underlying byte sink/source.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
