//! Canonical Huffman entropy codec (`HUFFMAN`, id 1).
//!
//! Code-length construction (priority-queue merge over a parent-pointer
//! forest, lengths read back by an iterative depth walk) and the canonical
//! code / decode-table layout (`bases`/`limits`/`base_index`/`perms`) are
//! adapted from the BZip2 port's per-block Huffman tables, generalized from
//! BZip2's "up to 6 tables, 50-symbol groups" scheme down to the single
//! whole-block table this codec needs.

use super::{EntropyDecoder, EntropyEncoder};
use crate::bitstream::{InputBitStream, OutputBitStream};
use crate::error::{KanziError, Result};
use std::cmp::Reverse;
use std::collections::BinaryHeap;

const NUM_SYMBOLS: usize = 256;
/// Header code-length field width. 6 bits covers the worst-case canonical
/// depth for any 256-symbol alphabet at block sizes up to `1 << 30`
/// (Fibonacci-skewed frequencies bound the depth to roughly
/// `1.44 * log2(total_count)`, well under 63).
const LEN_FIELD_BITS: u32 = 6;
const MAX_CODE_LEN: usize = 63;

struct Node {
    freq: u64,
    left: i32,
    right: i32,
}

fn build_lengths(freqs: &[u64; NUM_SYMBOLS]) -> [u8; NUM_SYMBOLS] {
    let present: Vec<usize> = (0..NUM_SYMBOLS).filter(|&i| freqs[i] > 0).collect();
    let mut lengths = [0u8; NUM_SYMBOLS];
    if present.is_empty() {
        return lengths;
    }
    if present.len() == 1 {
        lengths[present[0]] = 1;
        return lengths;
    }

    let mut nodes: Vec<Node> = present
        .iter()
        .map(|&i| Node {
            freq: freqs[i],
            left: -1,
            right: -1,
        })
        .collect();
    let mut heap: BinaryHeap<Reverse<(u64, usize)>> = nodes
        .iter()
        .enumerate()
        .map(|(idx, n)| Reverse((n.freq, idx)))
        .collect();

    while heap.len() > 1 {
        let Reverse((f1, i1)) = heap.pop().unwrap();
        let Reverse((f2, i2)) = heap.pop().unwrap();
        let new_idx = nodes.len();
        nodes.push(Node {
            freq: f1 + f2,
            left: i1 as i32,
            right: i2 as i32,
        });
        heap.push(Reverse((f1 + f2, new_idx)));
    }
    let root = heap.pop().unwrap().0 .1;

    let mut depth_of_node = vec![0u32; nodes.len()];
    let mut stack = vec![(root, 0u32)];
    while let Some((idx, depth)) = stack.pop() {
        depth_of_node[idx] = depth;
        let left = nodes[idx].left;
        let right = nodes[idx].right;
        if left >= 0 {
            stack.push((left as usize, depth + 1));
        }
        if right >= 0 {
            stack.push((right as usize, depth + 1));
        }
    }

    for (k, &sym) in present.iter().enumerate() {
        let d = depth_of_node[k].max(1) as usize;
        lengths[sym] = d.min(MAX_CODE_LEN) as u8;
    }
    lengths
}

/// Canonical encode/decode table built from a length array.
struct Table {
    codes: [u32; NUM_SYMBOLS],
    lengths: [u8; NUM_SYMBOLS],
    max_len: usize,
    bases: [u32; MAX_CODE_LEN + 1],
    limits: [i64; MAX_CODE_LEN + 1],
    base_index: [u32; MAX_CODE_LEN + 1],
    perms: Vec<u16>,
}

impl Table {
    fn from_lengths(lengths: &[u8; NUM_SYMBOLS]) -> Self {
        let max_len = lengths.iter().map(|&l| l as usize).max().unwrap_or(0);
        let mut counts = vec![0u32; max_len + 1];
        for &l in lengths {
            if l > 0 {
                counts[l as usize] += 1;
            }
        }

        let mut bases = [0u32; MAX_CODE_LEN + 1];
        let mut limits = [-1i64; MAX_CODE_LEN + 1];
        let mut base_index = [0u32; MAX_CODE_LEN + 1];

        let mut code = 0u32;
        let mut index = 0u32;
        for len in 1..=max_len {
            bases[len] = code;
            base_index[len] = index;
            let count = counts[len];
            limits[len] = if count > 0 {
                (code + count - 1) as i64
            } else {
                -1
            };
            code = (code + count) << 1;
            index += count;
        }

        let mut codes = [0u32; NUM_SYMBOLS];
        let mut next_code = bases;
        for (sym, &len) in lengths.iter().enumerate() {
            if len > 0 {
                let l = len as usize;
                codes[sym] = next_code[l];
                next_code[l] += 1;
            }
        }

        let total_symbols: usize = lengths.iter().filter(|&&l| l > 0).count();
        let mut perms = vec![0u16; total_symbols];
        let mut perm_idx = base_index;
        for (sym, &len) in lengths.iter().enumerate() {
            if len > 0 {
                let l = len as usize;
                let idx = perm_idx[l] as usize;
                perms[idx] = sym as u16;
                perm_idx[l] += 1;
            }
        }

        Table {
            codes,
            lengths: *lengths,
            max_len,
            bases,
            limits,
            base_index,
            perms,
        }
    }
}

pub struct HuffmanEncoder;

impl HuffmanEncoder {
    pub fn new() -> Self {
        HuffmanEncoder
    }
}

impl EntropyEncoder for HuffmanEncoder {
    fn encode(&mut self, out: &mut OutputBitStream, data: &[u8]) -> Result<usize> {
        let mut freqs = [0u64; NUM_SYMBOLS];
        for &b in data {
            freqs[b as usize] += 1;
        }
        let lengths = build_lengths(&freqs);
        for &l in &lengths {
            out.write_bits(l as u64, LEN_FIELD_BITS)?;
        }

        if data.is_empty() {
            return Ok(0);
        }
        let table = Table::from_lengths(&lengths);
        for &b in data {
            let len = table.lengths[b as usize];
            debug_assert!(len > 0, "symbol present in data but zero-length code");
            out.write_bits(table.codes[b as usize] as u64, len as u32)?;
        }
        Ok(data.len())
    }
}

pub struct HuffmanDecoder;

impl HuffmanDecoder {
    pub fn new() -> Self {
        HuffmanDecoder
    }
}

impl EntropyDecoder for HuffmanDecoder {
    fn decode(&mut self, inp: &mut InputBitStream, data: &mut [u8]) -> Result<usize> {
        let mut lengths = [0u8; NUM_SYMBOLS];
        for slot in lengths.iter_mut() {
            *slot = inp.read_bits(LEN_FIELD_BITS)? as u8;
        }
        if data.is_empty() {
            return Ok(0);
        }
        let table = Table::from_lengths(&lengths);

        for slot in data.iter_mut() {
            let mut code: u32 = 0;
            let mut len = 0usize;
            loop {
                code = (code << 1) | inp.read_bit()?;
                len += 1;
                if len > table.max_len {
                    return Err(KanziError::EntropyFailure {
                        block_id: 0,
                        expected: data.len(),
                        actual: 0,
                    });
                }
                if table.limits[len] >= 0 && (code as i64) <= table.limits[len] {
                    let idx = table.base_index[len] + (code - table.bases[len]);
                    *slot = table.perms[idx as usize] as u8;
                    break;
                }
            }
        }
        Ok(data.len())
    }
}
