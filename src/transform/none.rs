//! `NONE` transform: identity.

use super::ByteTransform;

pub struct NoneTransform;

impl ByteTransform for NoneTransform {
    fn forward(&mut self, src: &[u8], dst: &mut Vec<u8>) -> bool {
        dst.clear();
        dst.extend_from_slice(src);
        true
    }

    fn inverse(&mut self, src: &[u8], dst: &mut Vec<u8>) -> bool {
        dst.clear();
        dst.extend_from_slice(src);
        true
    }

    fn max_encoded_length(&self, n: usize) -> usize {
        n
    }
}
