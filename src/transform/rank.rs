//! Rank transform (`RANK`, id 8).
//!
//! A lazy cousin of move-to-front: each byte is replaced by its current
//! rank in the symbol table, but the table only nudges the symbol one
//! position closer to the front (a swap with its predecessor) instead of
//! promoting it all the way to index 0. This converges more slowly than
//! full MTF but is cheaper per symbol and, on already-clustered input
//! (e.g. post-BWT), produces a similar bias toward small output values —
//! a deliberate simplification rather than a byte-for-byte port of any
//! particular reference rank coder.

use super::ByteTransform;

pub struct RankTransform;

impl RankTransform {
    pub fn new() -> Self {
        RankTransform
    }
}

fn identity_table() -> [u8; 256] {
    let mut t = [0u8; 256];
    for (i, slot) in t.iter_mut().enumerate() {
        *slot = i as u8;
    }
    t
}

impl ByteTransform for RankTransform {
    fn forward(&mut self, src: &[u8], dst: &mut Vec<u8>) -> bool {
        dst.clear();
        dst.reserve(src.len());
        let mut table = identity_table();
        for &b in src {
            let idx = table.iter().position(|&t| t == b).unwrap();
            dst.push(idx as u8);
            if idx > 0 {
                table.swap(idx, idx - 1);
            }
        }
        true
    }

    fn inverse(&mut self, src: &[u8], dst: &mut Vec<u8>) -> bool {
        dst.clear();
        dst.reserve(src.len());
        let mut table = identity_table();
        for &idx in src {
            let idx = idx as usize;
            let b = table[idx];
            dst.push(b);
            if idx > 0 {
                table.swap(idx, idx - 1);
            }
        }
        true
    }

    fn max_encoded_length(&self, n: usize) -> usize {
        n
    }
}
