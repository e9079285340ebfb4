//! Configuration of a `CardinalityEstimator`.
//!
//! Precision, seed and mixer are fixed for the lifetime of an estimator.
//! Two estimators only produce a meaningful union when all three match, so
//! the seed is always explicit and never derived from time or process entropy.

use crate::error::{Error, Result};
use crate::hyperloglog::{is_valid_precision, DEFAULT_PRECISION};
use crate::mixer::Mixer;

/// Seed used when none is configured
pub const DEFAULT_SEED: u32 = 0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "with_serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "with_serde", serde(default))]
pub struct SketchConfig {
    /// Number of bits used for register indices, in `[4..16]` range
    pub precision: u8,
    /// Seed passed to the mixer on every insert
    pub seed: u32,
    /// Mixing hash used to digest inserted elements
    pub mixer: Mixer,
}

impl SketchConfig {
    pub fn with_precision(mut self, precision: u8) -> Self {
        self.precision = precision;
        self
    }

    pub fn with_seed(mut self, seed: u32) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_mixer(mut self, mixer: impl Into<Mixer>) -> Self {
        self.mixer = mixer.into();
        self
    }

    /// Check that configuration can be used to build an estimator
    pub fn validate(&self) -> Result<()> {
        if !is_valid_precision(self.precision) {
            return Err(Error::InvalidPrecision(self.precision));
        }
        Ok(())
    }

    /// Return whether estimators built from `self` and `other` hash elements identically
    #[inline]
    pub fn same_hashing(&self, other: &SketchConfig) -> bool {
        self.seed == other.seed && self.mixer == other.mixer
    }
}

impl Default for SketchConfig {
    fn default() -> Self {
        Self {
            precision: DEFAULT_PRECISION,
            seed: DEFAULT_SEED,
            mixer: Mixer::default(),
        }
    }
}
