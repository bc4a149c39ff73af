//! Per-block checksum (§4.2). Thin wrapper over the `xxhash-rust` crate,
//! matching the way this lineage's LZ4 port wraps the same crate for its
//! own frame content checksums (see `xxhash.rs`).

/// Fixed XXHash32 seed: the ASCII big-endian constant `"KANZ"`.
pub const SEED: u32 = 0x4B41_4E5A;

/// Compute the XXHash32 checksum of `data` using the crate's fixed seed.
/// Pure function — safe to share across encode/decode tasks without
/// synchronization.
#[inline]
pub fn hash32(data: &[u8]) -> u32 {
    xxhash_rust::xxh32::xxh32(data, SEED)
}
