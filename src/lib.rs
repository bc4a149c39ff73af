//! A block-oriented lossless data compressor.
//!
//! Input bytes are partitioned into fixed-size blocks; each block is put
//! independently through a user-selectable sequence of reversible
//! byte-to-byte transforms followed by an entropy coder, then packed into a
//! self-describing bitstream with an optional per-block XXHash32 checksum.
//! Blocks can be produced or consumed concurrently while preserving global
//! byte order — see [`output_stream::CompressedOutputStream`] and
//! [`input_stream::CompressedInputStream`] for the public entry points.

pub mod barrier;
pub mod bitstream;
pub mod block;
pub mod consts;
pub mod context;
pub mod decoder_task;
pub mod encoder_task;
pub mod entropy;
pub mod error;
pub mod hasher;
pub mod header;
pub mod input_stream;
pub mod lz4_codec;
pub mod output_stream;
pub mod threadpool;
pub mod transform;

pub use context::{Context, ContextBuilder};
pub use entropy::EntropyKind;
pub use error::{KanziError, Result};
pub use input_stream::CompressedInputStream;
pub use output_stream::CompressedOutputStream;
pub use transform::TransformKind;
