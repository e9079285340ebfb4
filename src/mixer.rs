//! ## Mixers
//! A mixer turns canonical element bytes and a 32-bit seed into the 64-bit
//! digest routed into HyperLogLog registers.
//!
//! - [`Murmur3`]: MurmurHash3 x64 digest, bit-compatible with existing sketches (default).
//! - [`WyHash`]: faster mixer for sketches that never leave this crate.
//!
//! Sketches can only be merged meaningfully when they share the same mixer and seed.

use enum_dispatch::enum_dispatch;

use crate::hash::murmur3_x64_64;

/// Mixer trait which must be implemented by all mixers.
#[enum_dispatch(Mixer)]
pub trait MixerTrait {
    /// Hash `bytes` with `seed` into a 64-bit digest
    fn hash(&self, bytes: &[u8], seed: u32) -> u64;
}

/// Mixers supported by `CardinalityEstimator`
#[enum_dispatch]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "with_serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Mixer {
    Murmur3,
    WyHash,
}

/// MurmurHash3 x64 mixer
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "with_serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Murmur3;

impl MixerTrait for Murmur3 {
    #[inline]
    fn hash(&self, bytes: &[u8], seed: u32) -> u64 {
        murmur3_x64_64(bytes, seed)
    }
}

/// wyhash mixer
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "with_serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WyHash;

impl MixerTrait for WyHash {
    #[inline]
    fn hash(&self, bytes: &[u8], seed: u32) -> u64 {
        wyhash::wyhash(bytes, u64::from(seed))
    }
}

impl Default for Mixer {
    fn default() -> Self {
        Mixer::Murmur3(Murmur3)
    }
}
