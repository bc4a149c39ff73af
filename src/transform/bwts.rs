//! Bijective Burrows-Wheeler Transform (`BWTS`, id 2).
//!
//! Unlike [`super::bwt`], a bijective BWT needs no stored primary index:
//! the input is first split into Lyndon words (Duval's algorithm), every
//! rotation of every word is sorted together by infinite-repetition order,
//! and the last byte of each sorted rotation is emitted. Decoding recovers
//! the same LF-mapping permutation as standard BWT, but that permutation
//! now decomposes into one cycle per original Lyndon word; each cycle is
//! read off, rotated to its canonical (lexicographically least) form via a
//! direct O(len^2) comparison, and the recovered words are concatenated
//! back in non-increasing infinite-repetition order, which is exactly the
//! order Duval factorization produces them in on the way in.

use super::ByteTransform;
use std::cmp::Ordering;

pub struct BwtsTransform;

impl BwtsTransform {
    pub fn new() -> Self {
        BwtsTransform
    }
}

/// Duval's algorithm: start offsets of the Lyndon factorization of `s`.
fn duval_factorize(s: &[u8]) -> Vec<usize> {
    let n = s.len();
    let mut factors = Vec::new();
    let mut i = 0;
    while i < n {
        let mut j = i + 1;
        let mut k = i;
        while j < n && s[k] <= s[j] {
            if s[k] < s[j] {
                k = i;
            } else {
                k += 1;
            }
            j += 1;
        }
        while i <= k {
            factors.push(i);
            i += j - k;
        }
    }
    factors
}

/// Compare `a` and `b` as infinite periodic repetitions (`a^∞` vs `b^∞`),
/// which is the order Lyndon words must be concatenated in.
fn compare_infinite_repetition(a: &[u8], b: &[u8]) -> Ordering {
    let (la, lb) = (a.len(), b.len());
    if la == 0 || lb == 0 {
        return la.cmp(&lb);
    }
    for k in 0..(la + lb) {
        let ca = a[k % la];
        let cb = b[k % lb];
        if ca != cb {
            return ca.cmp(&cb);
        }
    }
    Ordering::Equal
}

/// Index of the lexicographically smallest rotation of `s`.
fn least_rotation(s: &[u8]) -> usize {
    let n = s.len();
    let mut best = 0usize;
    for start in 1..n {
        for k in 0..n {
            let a = s[(best + k) % n];
            let b = s[(start + k) % n];
            if a != b {
                if b < a {
                    best = start;
                }
                break;
            }
        }
    }
    best
}

impl ByteTransform for BwtsTransform {
    fn forward(&mut self, src: &[u8], dst: &mut Vec<u8>) -> bool {
        let n = src.len();
        dst.clear();
        if n == 0 {
            return true;
        }

        let mut starts = duval_factorize(src);
        starts.push(n);

        let mut rotations: Vec<(usize, usize, usize)> = Vec::with_capacity(n);
        for w in 0..starts.len() - 1 {
            let fs = starts[w];
            let fl = starts[w + 1] - starts[w];
            for r in 0..fl {
                rotations.push((fs, fl, r));
            }
        }

        rotations.sort_by(|&(fs1, fl1, r1), &(fs2, fl2, r2)| {
            for k in 0..n {
                let c1 = src[fs1 + (r1 + k) % fl1];
                let c2 = src[fs2 + (r2 + k) % fl2];
                if c1 != c2 {
                    return c1.cmp(&c2);
                }
            }
            Ordering::Equal
        });

        dst.reserve(n);
        for &(fs, fl, r) in &rotations {
            dst.push(src[fs + (r + fl - 1) % fl]);
        }
        true
    }

    fn inverse(&mut self, src: &[u8], dst: &mut Vec<u8>) -> bool {
        dst.clear();
        let n = src.len();
        if n == 0 {
            return true;
        }
        let l = src;

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

        let mut lf = vec![0usize; n];
        let mut occ = [0u64; 256];
        for (i, &b) in l.iter().enumerate() {
            let c = b as usize;
            lf[i] = (starts[c] + occ[c]) as usize;
            occ[c] += 1;
        }

        let mut visited = vec![false; n];
        let mut words: Vec<Vec<u8>> = Vec::new();
        for start in 0..n {
            if visited[start] {
                continue;
            }
            let mut cycle = Vec::new();
            let mut idx = start;
            loop {
                visited[idx] = true;
                cycle.push(l[idx]);
                idx = lf[idx];
                if idx == start {
                    break;
                }
            }
            let rot = least_rotation(&cycle);
            let mut word = Vec::with_capacity(cycle.len());
            word.extend_from_slice(&cycle[rot..]);
            word.extend_from_slice(&cycle[..rot]);
            words.push(word);
        }

        words.sort_by(|a, b| compare_infinite_repetition(a, b).reverse());
        for w in &words {
            dst.extend_from_slice(w);
        }
        true
    }

    fn max_encoded_length(&self, n: usize) -> usize {
        n
    }
}
