//! LZ4 block compression and decompression.
//!
//! This module contains the core LZ4 block-format engine, ported from lz4.c
//! v1.10.0. It backs the `LZ/LZ4` transform slot (`transform::lz`) — one of
//! the pluggable, black-box byte transforms the block codec composes; this
//! module only has to satisfy `ByteTransform`, not own any framing.

pub mod compress;
pub mod decompress_api;
pub mod decompress_core;
pub mod types;

// Re-export the one-shot API consumed by `transform::lz`.
pub use compress::{compress_bound, compress_default, Lz4Error};
pub use decompress_api::{decompress_safe, BlockDecompressError};
