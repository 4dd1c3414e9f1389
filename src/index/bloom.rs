//! A positional bloom filter over string tokens, supporting
//! `StartsWith`/`Equals`/`EndsWith`/`Contains` membership queries.
//!
//! Rather than hashing a whole token to one set of bits (which only
//! supports `Contains`-style membership), each *character* is hashed
//! together with a *position* that encodes where in the token it could
//! appear for a given query kind. A `StartsWith("al")` query and an
//! `EndsWith("al")` query on the same characters therefore set (and
//! later check) different bits, at the cost of several times the work
//! per token `Add`.
//!
//! `bitflags` (already in the dependency pack via other example crates)
//! models `SupportedOperations` as the exact fixed bitfield the wire
//! format commits to.

use base64::Engine;
use bitflags::bitflags;

use crate::error::{Result, RopeError};

bitflags! {
    /// Which query kinds a filter was built to support. Fixed integer
    /// values, matching the wire format: a filter's supported operations
    /// must be known by every reader independent of this crate.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct SupportedOps: u32 {
        const STARTS_WITH = 1;
        const EQUALS = 1 | 4;
        const ENDS_WITH = 8;
        const CONTAINS = 1 | 8 | 16;
    }
}

/// Fake "character" used to mark the terminator position `Equals` adds
/// after a token's last real character, so `Equals("al")` and
/// `StartsWith("al")` don't collide on the same bits. Reserved: no real
/// `char` hashes to this value since `mix32` takes a `char`'s codepoint,
/// all of which are `<= 0x10FFFF < u32::MAX`.
const TERMINATOR: u32 = u32::MAX;

/// 32-bit finalizing mix (Murmur3's `fmix32`); used for both the primary
/// and secondary hash in the filter's double-hashing scheme.
fn mix32(mut x: u32) -> i32 {
    x ^= x >> 16;
    x = x.wrapping_mul(0x85ebca6b);
    x ^= x >> 13;
    x = x.wrapping_mul(0xc2b2ae35);
    x ^= x >> 16;
    x as i32
}

/// A fixed-size bloom filter over `(character, position)` pairs.
#[derive(Debug, Clone, PartialEq)]
pub struct BloomFilter {
    size: usize,
    hash_count: u32,
    supported_ops: SupportedOps,
    bits: Vec<bool>,
}

impl BloomFilter {
    pub fn new(size: usize, hash_count: u32, supported_ops: SupportedOps) -> Self {
        BloomFilter { size, hash_count, supported_ops, bits: vec![false; size] }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn hash_count(&self) -> u32 {
        self.hash_count
    }

    pub fn supported_ops(&self) -> SupportedOps {
        self.supported_ops
    }

    /// Add `token` to the filter, setting positional bits for every query
    /// kind this filter's `supported_ops` covers.
    pub fn add(&mut self, token: &str) {
        let chars: Vec<char> = token.chars().collect();
        let len = chars.len() as i64;

        if self.supported_ops.intersects(SupportedOps::STARTS_WITH | SupportedOps::EQUALS | SupportedOps::CONTAINS) {
            self.add_prefix_positions(&chars);
        }
        if self.supported_ops.contains(SupportedOps::EQUALS) {
            self.set_bits(TERMINATOR, (len + 1) as i32);
        }
        if self.supported_ops.intersects(SupportedOps::ENDS_WITH | SupportedOps::CONTAINS) {
            for (i, &c) in chars.iter().enumerate() {
                let position = -(len - i as i64);
                self.set_bits(c as u32, position as i32);
            }
        }
        if self.supported_ops.contains(SupportedOps::CONTAINS) {
            for &c in &chars {
                self.set_bits(c as u32, i32::MAX);
            }
        }
    }

    fn add_prefix_positions(&mut self, chars: &[char]) {
        for (i, &c) in chars.iter().enumerate() {
            let position = ((i as i64 + 1).min(self.size as i64)) as i32;
            self.set_bits(c as u32, position);
        }
    }

    pub fn might_start_with(&self, token: &str) -> Result<bool> {
        self.require(SupportedOps::STARTS_WITH)?;
        Ok(self.test_prefix_positions(token))
    }

    pub fn might_equal(&self, token: &str) -> Result<bool> {
        self.require(SupportedOps::EQUALS)?;
        let len = token.chars().count() as i64;
        Ok(self.test_prefix_positions(token) && self.test_bits(TERMINATOR, (len + 1) as i32))
    }

    pub fn might_end_with(&self, token: &str) -> Result<bool> {
        self.require(SupportedOps::ENDS_WITH)?;
        let chars: Vec<char> = token.chars().collect();
        let len = chars.len() as i64;
        Ok(chars.iter().enumerate().all(|(i, &c)| {
            let position = -(len - i as i64);
            self.test_bits(c as u32, position as i32)
        }))
    }

    pub fn might_contain(&self, token: &str) -> Result<bool> {
        self.require(SupportedOps::CONTAINS)?;
        Ok(token.chars().all(|c| self.test_bits(c as u32, i32::MAX)))
    }

    fn test_prefix_positions(&self, token: &str) -> bool {
        token.chars().enumerate().all(|(i, c)| {
            let position = ((i as i64 + 1).min(self.size as i64)) as i32;
            self.test_bits(c as u32, position)
        })
    }

    fn require(&self, op: SupportedOps) -> Result<()> {
        if self.supported_ops.contains(op) {
            Ok(())
        } else {
            Err(RopeError::Unsupported)
        }
    }

    fn bit_index(&self, char_code: u32, position: i32, k: u32) -> usize {
        let primary = mix32(char_code) as i64;
        let secondary = mix32((position as u32).wrapping_shl(16)) as i64;
        let combined = primary + k as i64 * secondary;
        (combined.unsigned_abs() as usize) % self.size
    }

    fn set_bits(&mut self, char_code: u32, position: i32) {
        for k in 1..=self.hash_count {
            let idx = self.bit_index(char_code, position, k);
            self.bits[idx] = true;
        }
    }

    fn test_bits(&self, char_code: u32, position: i32) -> bool {
        (1..=self.hash_count).all(|k| self.bits[self.bit_index(char_code, position, k)])
    }

    /// Serialize the bitmap: run-length encode (bit 7 = value, bits 0..6 =
    /// run length, capped at 127), then base64.
    pub fn to_rle_base64(&self) -> String {
        let mut bytes = Vec::new();
        let mut iter = self.bits.iter();
        if let Some(&first) = iter.next() {
            let mut current = first;
            let mut run = 1u8;
            for &bit in iter {
                if bit == current && run < 127 {
                    run += 1;
                } else {
                    bytes.push(encode_run(current, run));
                    current = bit;
                    run = 1;
                }
            }
            bytes.push(encode_run(current, run));
        }
        base64::engine::general_purpose::STANDARD.encode(bytes)
    }

    /// Rebuild a filter from its serialized bitmap plus the root-level
    /// parameters (`size`/`hash_count`/`supported_ops`) that the wire
    /// format doesn't repeat per filter.
    pub fn from_rle_base64(
        size: usize,
        hash_count: u32,
        supported_ops: SupportedOps,
        encoded: &str,
    ) -> Result<Self> {
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(encoded)
            .map_err(|e| RopeError::invalid_argument(format!("invalid base64 bloom filter payload: {e}")))?;
        let mut bits = Vec::with_capacity(size);
        for byte in bytes {
            let value = byte & 0x80 != 0;
            let run = (byte & 0x7F) as usize;
            bits.extend(std::iter::repeat(value).take(run));
        }
        bits.resize(size, false);
        Ok(BloomFilter { size, hash_count, supported_ops, bits })
    }
}

fn encode_run(value: bool, run: u8) -> u8 {
    (if value { 0x80 } else { 0 }) | (run & 0x7F)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter(ops: SupportedOps) -> BloomFilter {
        BloomFilter::new(2048, 4, ops)
    }

    #[test]
    fn starts_with_is_found_after_add() {
        let mut f = filter(SupportedOps::STARTS_WITH);
        f.add("alice");
        assert!(f.might_start_with("alice").unwrap());
    }

    #[test]
    fn equals_distinguishes_from_starts_with() {
        let mut f = filter(SupportedOps::EQUALS);
        f.add("alice");
        assert!(f.might_equal("alice").unwrap());
    }

    #[test]
    fn ends_with_is_found_after_add() {
        let mut f = filter(SupportedOps::ENDS_WITH);
        f.add("wonderland");
        assert!(f.might_end_with("wonderland").unwrap());
    }

    #[test]
    fn contains_implies_substring_membership() {
        let mut f = filter(SupportedOps::CONTAINS);
        f.add("wonderland");
        assert!(f.might_contain("wonderland").unwrap());
    }

    #[test]
    fn unsupported_operation_errors() {
        let f = filter(SupportedOps::STARTS_WITH);
        assert!(matches!(f.might_contain("x"), Err(RopeError::Unsupported)));
    }

    #[test]
    fn rle_base64_round_trips() {
        let mut f = filter(SupportedOps::CONTAINS);
        f.add("hello world, this is a much longer token to exercise the run lengths");
        let encoded = f.to_rle_base64();
        let restored = BloomFilter::from_rle_base64(f.size(), f.hash_count(), f.supported_ops(), &encoded).unwrap();
        assert!(restored.might_contain("hello").unwrap());
    }
}
