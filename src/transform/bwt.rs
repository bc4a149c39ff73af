//! Burrows-Wheeler Transform (`BWT`, id 1).
//!
//! Rotation-sort encode plus counting-sort LF-mapping decode: the general
//! shape (radix-count the alphabet, sort rotations, reconstruct via the
//! first/last column correspondence) is the one this pack's standalone BWT
//! reference module uses, generalized here from its O(n^3) bruteforce
//! rotation comparison to a straightforward index sort with an early-exit
//! comparator, and from its separate `Radix` counting pass to the
//! cumulative-count table used directly for LF-mapping on decode.
//!
//! The primary index (the row of the original string in the sorted
//! rotation matrix) has nowhere else to live in a single byte buffer, so
//! it is stored as a 4-byte big-endian prefix ahead of the transformed
//! bytes; `max_encoded_length` accounts for it.

use super::ByteTransform;
use std::cmp::Ordering;

pub struct BwtTransform;

impl BwtTransform {
    pub fn new() -> Self {
        BwtTransform
    }
}

fn rotation_cmp(src: &[u8], a: usize, b: usize) -> Ordering {
    let n = src.len();
    for k in 0..n {
        let ca = src[(a + k) % n];
        let cb = src[(b + k) % n];
        if ca != cb {
            return ca.cmp(&cb);
        }
    }
    Ordering::Equal
}

impl ByteTransform for BwtTransform {
    fn forward(&mut self, src: &[u8], dst: &mut Vec<u8>) -> bool {
        let n = src.len();
        dst.clear();
        if n == 0 {
            return true;
        }
        if n > u32::MAX as usize {
            return false;
        }

        let mut indices: Vec<u32> = (0..n as u32).collect();
        indices.sort_by(|&a, &b| rotation_cmp(src, a as usize, b as usize));
        let primary = indices.iter().position(|&i| i == 0).unwrap() as u32;

        dst.reserve(4 + n);
        dst.extend_from_slice(&primary.to_be_bytes());
        for &i in &indices {
            dst.push(src[(i as usize + n - 1) % n]);
        }
        true
    }

    fn inverse(&mut self, src: &[u8], dst: &mut Vec<u8>) -> bool {
        dst.clear();
        if src.is_empty() {
            return true;
        }
        if src.len() < 4 {
            return false;
        }
        let n = src.len() - 4;
        if n == 0 {
            return true;
        }
        let primary = u32::from_be_bytes([src[0], src[1], src[2], src[3]]) as usize;
        if primary >= n {
            return false;
        }
        let l = &src[4..];

        let mut counts = [0u64; 256];
        for &b in l {
            counts[b as usize] += 1;
        }
        let mut starts = [0u64; 256];
        let mut acc = 0u64;
        for c in 0..256 {
            starts[c] = acc;
            acc += counts[c];
        }

        let mut lf = vec![0u32; n];
        let mut occ = [0u64; 256];
        for (i, &b) in l.iter().enumerate() {
            let c = b as usize;
            lf[i] = (starts[c] + occ[c]) as u32;
            occ[c] += 1;
        }

        let mut result = vec![0u8; n];
        let mut idx = primary;
        for slot in result.iter_mut().rev() {
            *slot = l[idx];
            idx = lf[idx] as usize;
        }
        *dst = result;
        true
    }

    fn max_encoded_length(&self, n: usize) -> usize {
        n + 4
    }
}
