//! LZ4 transform (`LZ`/`LZ4`, id 3).
//!
//! Wraps this crate's own ported LZ4 block codec
//! ([`crate::lz4_codec`]) as a [`ByteTransform`] stage. The original
//! decompressed length has nowhere else to live in a single byte buffer,
//! so it is stored as a 4-byte big-endian prefix ahead of the compressed
//! payload, the same convention [`super::bwt`] uses for its primary index.

use super::ByteTransform;
use crate::lz4_codec::{compress_bound, compress_default, decompress_safe};

pub struct LzTransform;

impl LzTransform {
    pub fn new() -> Self {
        LzTransform
    }
}

impl ByteTransform for LzTransform {
    fn forward(&mut self, src: &[u8], dst: &mut Vec<u8>) -> bool {
        dst.clear();
        let n = src.len();
        if n == 0 {
            return true;
        }
        if n > i32::MAX as usize {
            return false;
        }
        let bound = compress_bound(n as i32);
        if bound <= 0 {
            return false;
        }
        let mut tmp = vec![0u8; bound as usize];
        match compress_default(src, &mut tmp) {
            Ok(written) => {
                dst.reserve(4 + written);
                dst.extend_from_slice(&(n as u32).to_be_bytes());
                dst.extend_from_slice(&tmp[..written]);
                true
            }
            Err(_) => false,
        }
    }

    fn inverse(&mut self, src: &[u8], dst: &mut Vec<u8>) -> bool {
        dst.clear();
        if src.is_empty() {
            return true;
        }
        if src.len() < 4 {
            return false;
        }
        let orig_len = u32::from_be_bytes([src[0], src[1], src[2], src[3]]) as usize;
        let mut tmp = vec![0u8; orig_len];
        match decompress_safe(&src[4..], &mut tmp) {
            Ok(written) if written == orig_len => {
                *dst = tmp;
                true
            }
            _ => false,
        }
    }

    fn max_encoded_length(&self, n: usize) -> usize {
        let bound = compress_bound(n.min(i32::MAX as usize) as i32).max(0) as usize;
        (bound + 4).max(n)
    }
}
