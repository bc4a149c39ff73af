//! Wire-format and scheduling constants (§6, §9).

/// Stream header magic number, the ASCII big-endian constant `"KANZ"`.
pub const MAGIC: u32 = 0x4B41_4E5A;

/// Current (and only supported) stream format version.
pub const STREAM_VERSION: u8 = 6;

/// Minimum legal block size, in bytes.
pub const MIN_BITSTREAM_BLOCK_SIZE: u32 = 1024;

/// Maximum legal block size, in bytes (1 GiB).
pub const MAX_BITSTREAM_BLOCK_SIZE: u32 = 1 << 30;

/// Padding added when sizing a decode task's scratch buffer.
pub const EXTRA_BUFFER_SIZE: usize = 256;

/// Blocks at or under this length skip the transform/entropy stages
/// entirely (copy-block fast path).
pub const SMALL_BLOCK_SIZE: usize = 15;

/// Maximum number of concurrent encode/decode workers per stream.
pub const MAX_CONCURRENCY: usize = 64;

/// Sentinel stored in `processed_block_id` to signal "stop waiting, the
/// stream is done or has been aborted" to any still-waiting decode task.
pub const CANCEL_TASKS_ID: i64 = -1;

/// Mode-byte bit 7: this block used the copy-block fast path (transform
/// and entropy both forced to `NONE`).
pub const COPY_BLOCK_MASK: u8 = 0x80;

/// Mode-byte bit 4: skip flags did not fit in the low nibble (more than 4
/// transform slots were in use), so a full extra skip-flags byte follows.
pub const TRANSFORMS_MASK: u8 = 0x10;

/// Value of `skip_flags` meaning "every transform slot was bypassed".
pub const SKIP_MASK: u8 = 0xFF;

/// Maximum number of transform stages composable in one sequence.
pub const MAX_TRANSFORMS: usize = 8;
