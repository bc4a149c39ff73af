//! Move-to-front transform (`MTFT`, id 7).
//!
//! Classic MTF: maintain a 256-entry symbol table; each input byte is
//! replaced by its current index in the table, then moved to the front.
//! Output is always exactly as long as the input.

use super::ByteTransform;

pub struct MtftTransform;

impl MtftTransform {
    pub fn new() -> Self {
        MtftTransform
    }
}

fn identity_table() -> [u8; 256] {
    let mut t = [0u8; 256];
    for (i, slot) in t.iter_mut().enumerate() {
        *slot = i as u8;
    }
    t
}

impl ByteTransform for MtftTransform {
    fn forward(&mut self, src: &[u8], dst: &mut Vec<u8>) -> bool {
        dst.clear();
        dst.reserve(src.len());
        let mut table = identity_table();
        for &b in src {
            let idx = table.iter().position(|&t| t == b).unwrap();
            dst.push(idx as u8);
            table.copy_within(0..idx, 1);
            table[0] = b;
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
            table.copy_within(0..idx, 1);
            table[0] = b;
            dst.push(b);
        }
        true
    }

    fn max_encoded_length(&self, n: usize) -> usize {
        n
    }
}
