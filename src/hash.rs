//! ## MurmurHash3 mixing hash
//! 64-bit digest of the x64 128-bit variant of MurmurHash3: two 64-bit lanes
//! are mixed over 16-byte blocks, finalized separately and folded into one word.
//!
//! The output is bit-compatible with the first 64 bits of the reference
//! `MurmurHash3_x64_128`, so sketches built with the same seed agree with any
//! other implementation of that scheme.
//!
//! [Reference implementation](https://github.com/aappleby/smhasher/blob/master/src/MurmurHash3.cpp)

/// Multiplicative constant for the first lane
const C1: u64 = 0x87c3_7b91_1142_53d5;
/// Multiplicative constant for the second lane
const C2: u64 = 0x4cf5_ad43_2745_937f;
/// Finalization multipliers
const C3: u64 = 0xff51_afd7_ed55_8ccd;
const C4: u64 = 0xc4ce_b9fe_1a85_ec53;
/// Additive constants applied after each block fold
const N1: u64 = 0x52dc_e729;
const N2: u64 = 0x3849_5ab5;

/// Block size in bytes consumed by one round (two 64-bit words).
const BLOCK_LEN: usize = 16;

/// Hash `bytes` with `seed` into a uniformly distributed 64-bit digest.
///
/// Any input length is accepted, including the empty slice.
#[inline]
pub fn murmur3_x64_64(bytes: &[u8], seed: u32) -> u64 {
    let mut h1 = u64::from(seed);
    let mut h2 = u64::from(seed);

    let mut blocks = bytes.chunks_exact(BLOCK_LEN);
    for block in &mut blocks {
        let (lo, hi) = block.split_at(8);

        h1 ^= mix_k1(read_u64_le(lo));
        h1 = h1
            .rotate_left(27)
            .wrapping_add(h2)
            .wrapping_mul(5)
            .wrapping_add(N1);

        h2 ^= mix_k2(read_u64_le(hi));
        h2 = h2
            .rotate_left(31)
            .wrapping_add(h1)
            .wrapping_mul(5)
            .wrapping_add(N2);
    }

    // Remaining 0..15 bytes are loaded little-endian into `k1` (bytes 0..8)
    // and `k2` (bytes 8..15), each lane folded only when it received bytes.
    let tail = blocks.remainder();
    if tail.len() > 8 {
        h2 ^= mix_k2(read_u64_le(&tail[8..]));
    }
    if !tail.is_empty() {
        h1 ^= mix_k1(read_u64_le(&tail[..tail.len().min(8)]));
    }

    let len = bytes.len() as u64;
    h1 ^= len;
    h2 ^= len;

    h1 = h1.wrapping_add(h2);
    h2 = h2.wrapping_add(h1);

    fmix64(h1).wrapping_add(fmix64(h2))
}

#[inline]
fn mix_k1(k1: u64) -> u64 {
    k1.wrapping_mul(C1).rotate_left(31).wrapping_mul(C2)
}

#[inline]
fn mix_k2(k2: u64) -> u64 {
    k2.wrapping_mul(C2).rotate_left(33).wrapping_mul(C1)
}

/// Avalanche finalization: every input bit affects every output bit.
#[inline]
fn fmix64(mut h: u64) -> u64 {
    h ^= h >> 33;
    h = h.wrapping_mul(C3);
    h ^= h >> 33;
    h = h.wrapping_mul(C4);
    h ^= h >> 33;
    h
}

/// Little-endian load of up to 8 bytes, missing high bytes read as zero.
#[inline]
fn read_u64_le(bytes: &[u8]) -> u64 {
    debug_assert!(bytes.len() <= 8);
    bytes
        .iter()
        .rev()
        .fold(0, |acc, &b| (acc << 8) | u64::from(b))
}
