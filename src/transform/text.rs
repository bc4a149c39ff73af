//! Text dictionary transform (`TEXT`, id 10).
//!
//! Replaces occurrences of a small built-in dictionary of common English
//! words with a 2-byte escape sequence (`[0x00, dictionary index]`); a
//! literal `0x00` byte in the input is itself escaped as `[0x00, 0xFF]` so
//! the marker stays unambiguous. Every other byte passes through
//! unchanged. This is a deliberately small, fixed dictionary — a
//! simplification of the large adaptive dictionaries real text transforms
//! use — but fully reversible and self-delimiting.

use super::ByteTransform;

const ESCAPE: u8 = 0x00;
const LITERAL_ZERO: u8 = 0xFF;

const DICTIONARY: &[&str] = &[
    "the", "and", "that", "have", "for", "not", "with", "you", "this", "but", "his", "from",
    "they", "she", "which", "their", "said", "will", "would", "there", "what", "about", "out",
    "one", "all", "were", "when", "your", "can", "been", "into", "time", "some",
];

pub struct TextTransform;

impl TextTransform {
    pub fn new() -> Self {
        TextTransform
    }
}

fn longest_match(src: &[u8], pos: usize) -> Option<usize> {
    DICTIONARY
        .iter()
        .enumerate()
        .filter(|(_, w)| src[pos..].starts_with(w.as_bytes()))
        .max_by_key(|(_, w)| w.len())
        .map(|(idx, _)| idx)
}

impl ByteTransform for TextTransform {
    fn forward(&mut self, src: &[u8], dst: &mut Vec<u8>) -> bool {
        dst.clear();
        let mut i = 0usize;
        while i < src.len() {
            if src[i] == ESCAPE {
                dst.push(ESCAPE);
                dst.push(LITERAL_ZERO);
                i += 1;
                continue;
            }
            if let Some(idx) = longest_match(src, i) {
                dst.push(ESCAPE);
                dst.push(idx as u8);
                i += DICTIONARY[idx].len();
            } else {
                dst.push(src[i]);
                i += 1;
            }
        }
        true
    }

    fn inverse(&mut self, src: &[u8], dst: &mut Vec<u8>) -> bool {
        dst.clear();
        let mut i = 0usize;
        while i < src.len() {
            if src[i] == ESCAPE {
                if i + 1 >= src.len() {
                    return false;
                }
                let marker = src[i + 1];
                if marker == LITERAL_ZERO {
                    dst.push(0);
                } else {
                    let idx = marker as usize;
                    if idx >= DICTIONARY.len() {
                        return false;
                    }
                    dst.extend_from_slice(DICTIONARY[idx].as_bytes());
                }
                i += 2;
            } else {
                dst.push(src[i]);
                i += 1;
            }
        }
        true
    }

    fn max_encoded_length(&self, n: usize) -> usize {
        2 * n
    }
}
