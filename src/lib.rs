//! `cardinality-sketch` is a Rust crate designed to estimate the number of distinct elements in a stream or dataset
//! using bounded memory that does not grow with the number of elements.
//!
//! This library uses classic HyperLogLog with linear counting for small cardinalities and
//! a MurmurHash3 mixer bit-compatible with existing sketches.
//!
//! ```
//! use cardinality_sketch::{CardinalityEstimator, SketchConfig};
//!
//! let config = SketchConfig::default().with_precision(12).with_seed(42);
//! let mut lhs = CardinalityEstimator::with_config(config)?;
//! let mut rhs = CardinalityEstimator::with_config(config)?;
//! for i in 0..1000u64 {
//!     lhs.insert(&i);
//!     rhs.insert(&(i + 500));
//! }
//! lhs.merge(&rhs)?;
//! assert!((lhs.estimate() - 1500.0).abs() < 1500.0 * 5.0 * lhs.relative_error());
//! # Ok::<(), cardinality_sketch::Error>(())
//! ```
mod config;
mod element;
mod error;
pub mod estimator;
pub mod hash;
mod hyperloglog;
pub mod mixer;

pub use config::{SketchConfig, DEFAULT_SEED};
pub use element::SketchElement;
pub use error::{Error, ErrorKind, Result};
pub use estimator::CardinalityEstimator;
pub use hyperloglog::{
    error_for_precision, precision_for_error, DEFAULT_PRECISION, MAX_PRECISION, MIN_PRECISION,
};
pub use mixer::{Mixer, MixerTrait};
