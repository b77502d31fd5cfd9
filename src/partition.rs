//! Partition Key Module
//!
//! Maps keys to 32-bit partition keys using MurmurHash3 (x86, 32-bit).
//!
//! The seed and the little-endian block order are part of the persisted
//! routing contract and must never change.

// == Constants ==
/// Process-wide seed for partition hashing.
pub const PARTITION_SEED: u32 = 123_456;

const C1: u32 = 0xcc9e_2d51;
const C2: u32 = 0x1b87_3593;

// == Public API ==
/// Hashes raw bytes into a partition key.
pub fn partition_key(bytes: &[u8]) -> u32 {
    murmur3_32(bytes, PARTITION_SEED)
}

/// Hashes the UTF-8 encoding of `text` into a partition key.
pub fn partition_key_str(text: &str) -> u32 {
    partition_key(text.as_bytes())
}

// == Hash Core ==
fn murmur3_32(bytes: &[u8], seed: u32) -> u32 {
    let mut h1 = seed;
    let mut blocks = bytes.chunks_exact(4);

    for block in &mut blocks {
        let k1 = u32::from_le_bytes([block[0], block[1], block[2], block[3]]);
        h1 ^= mix_k1(k1);
        h1 = h1.rotate_left(13).wrapping_mul(5).wrapping_add(0xe654_6b64);
    }

    let tail = blocks.remainder();
    if !tail.is_empty() {
        let mut k1 = 0u32;
        for (i, byte) in tail.iter().enumerate() {
            k1 ^= u32::from(*byte) << (8 * i);
        }
        h1 ^= mix_k1(k1);
    }

    // Only the low 32 bits of the length take part, as in the reference algorithm.
    fmix32(h1 ^ bytes.len() as u32)
}

#[inline]
fn mix_k1(k1: u32) -> u32 {
    k1.wrapping_mul(C1).rotate_left(15).wrapping_mul(C2)
}

#[inline]
fn fmix32(mut h: u32) -> u32 {
    h ^= h >> 16;
    h = h.wrapping_mul(0x85eb_ca6b);
    h ^= h >> 13;
    h = h.wrapping_mul(0xc2b2_ae35);
    h ^ (h >> 16)
}
