//! Cardinality estimator allows to estimate number of distinct elements
//! in the stream or dataset using a fixed array of `M = 2^P` HyperLogLog registers,
//! where `P` is the precision parameter in [4..16] range.
//!
//! # Data-structure design rationale
//!
//! ## Bounded memory
//! Memory is allocated once at construction: one byte per register plus a fixed
//! header. It never grows with the number of inserted or distinct elements.
//!
//! | Precision | Registers | Memory  | Expected error |
//! |-----------|-----------|---------|----------------|
//! | 4         | 16        | ~64 B   | 26.00%         |
//! | 10        | 1024      | ~1 KB   | 3.25%          |
//! | 12        | 4096      | ~4 KB   | 1.62%          |
//! | 14        | 16384     | ~16 KB  | 0.81%          |
//! | 16        | 65536     | ~64 KB  | 0.41%          |
//!
//! ## Mergeable
//! Register-wise maximum makes `merge` commutative, associative and idempotent,
//! so estimators can be built per worker and combined afterwards. The union is
//! only meaningful when both estimators share seed and mixer (see [`SketchConfig`]).
//!
//! ## Thread safety
//! `CardinalityEstimator` has no interior mutability. Concurrent ingestion is
//! expected to use one estimator per thread followed by `merge` on the owning thread.
//!
//! # Data storage format
//! - `registers[i]` - maximum rank observed among elements routed to bucket `i`,
//!   where `0` means no element has been routed there yet.

use std::fmt::{Debug, Formatter};
use std::mem::{size_of, size_of_val};

use tracing::{debug, warn};

use crate::config::SketchConfig;
use crate::element::SketchElement;
use crate::error::{Error, Result};
use crate::hyperloglog::{self, alpha, error_for_precision, max_rank, split_hash};
use crate::mixer::{Mixer, MixerTrait};

#[derive(Clone, PartialEq)]
pub struct CardinalityEstimator {
    /// Immutable configuration
    config: SketchConfig,
    /// Bias correction constant derived from number of registers
    alpha: f64,
    /// HyperLogLog registers
    registers: Box<[u8]>,
}

impl CardinalityEstimator {
    /// Creates new instance of `CardinalityEstimator` with given precision,
    /// default seed and default mixer.
    pub fn new(precision: u8) -> Result<Self> {
        Self::with_config(SketchConfig::default().with_precision(precision))
    }

    /// Creates new instance of `CardinalityEstimator` from configuration
    pub fn with_config(config: SketchConfig) -> Result<Self> {
        config.validate()?;
        let estimator = Self::from_valid_config(config);
        debug!(
            precision = config.precision,
            seed = config.seed,
            mixer = ?config.mixer,
            "created cardinality estimator"
        );
        Ok(estimator)
    }

    /// Restore `CardinalityEstimator` from configuration and register array
    /// previously obtained via `config()` and `registers()`.
    pub fn from_parts(config: SketchConfig, registers: Vec<u8>) -> Result<Self> {
        config.validate()?;

        let expected = 1usize << config.precision;
        if registers.len() != expected {
            return Err(Error::RegisterCountMismatch {
                precision: config.precision,
                expected,
                found: registers.len(),
            });
        }

        let max = max_rank(config.precision);
        if let Some((index, &rank)) = registers.iter().enumerate().find(|&(_, &r)| r > max) {
            return Err(Error::RankOutOfRange { index, rank, max });
        }

        debug!(
            precision = config.precision,
            seed = config.seed,
            mixer = ?config.mixer,
            "restored cardinality estimator"
        );
        Ok(Self {
            config,
            alpha: alpha(expected),
            registers: registers.into_boxed_slice(),
        })
    }

    /// Build estimator from already validated configuration
    fn from_valid_config(config: SketchConfig) -> Self {
        let m = 1usize << config.precision;
        Self {
            config,
            alpha: alpha(m),
            registers: vec![0u8; m].into_boxed_slice(),
        }
    }

    /// Insert an element into `CardinalityEstimator`
    #[inline]
    pub fn insert<T: SketchElement + ?Sized>(&mut self, item: &T) {
        let hash = item.with_canonical_bytes(|bytes| self.hash_bytes(bytes));
        self.insert_hash(hash);
    }

    /// Insert raw bytes into `CardinalityEstimator`
    #[inline]
    pub fn insert_bytes(&mut self, bytes: &[u8]) {
        let hash = self.hash_bytes(bytes);
        self.insert_hash(hash);
    }

    /// Insert text into `CardinalityEstimator`
    #[inline]
    pub fn insert_str(&mut self, text: &str) {
        self.insert_bytes(text.as_bytes());
    }

    /// Insert precomputed 64-bit digest into `CardinalityEstimator`.
    ///
    /// The digest must be uniformly distributed, e.g. produced by the same
    /// mixer and seed as the rest of inserted elements.
    #[inline]
    pub fn insert_hash(&mut self, hash: u64) {
        let (idx, rank) = split_hash(hash, self.config.precision);
        let register = &mut self.registers[idx];
        if rank > *register {
            *register = rank;
        }
    }

    /// Hash bytes using configured mixer and seed
    #[inline]
    fn hash_bytes(&self, bytes: &[u8]) -> u64 {
        self.config.mixer.hash(bytes, self.config.seed)
    }

    /// Return cardinality estimate
    #[inline]
    pub fn estimate(&self) -> f64 {
        hyperloglog::estimate(&self.registers, self.alpha)
    }

    /// Merge cardinality estimators.
    ///
    /// Fails without modifying `self` when precisions differ. Estimators with
    /// different seed or mixer are merged, but the result no longer estimates
    /// the union of both streams.
    pub fn merge(&mut self, rhs: &Self) -> Result<()> {
        if self.config.precision != rhs.config.precision {
            return Err(Error::PrecisionMismatch {
                lhs: self.config.precision,
                rhs: rhs.config.precision,
            });
        }

        if !self.config.same_hashing(&rhs.config) {
            warn!(
                lhs_seed = self.config.seed,
                rhs_seed = rhs.config.seed,
                lhs_mixer = ?self.config.mixer,
                rhs_mixer = ?rhs.config.mixer,
                "merging estimators with different hashing, estimate of the union is unreliable"
            );
        }

        for (lhs_rank, &rhs_rank) in self.registers.iter_mut().zip(rhs.registers.iter()) {
            if rhs_rank > *lhs_rank {
                *lhs_rank = rhs_rank;
            }
        }

        debug!(precision = self.config.precision, "merged cardinality estimators");
        Ok(())
    }

    /// Reset all registers to the empty state
    pub fn reset(&mut self) {
        self.registers.fill(0);
        debug!(precision = self.config.precision, "reset cardinality estimator");
    }

    /// Return precision parameter
    #[inline]
    pub fn precision(&self) -> u8 {
        self.config.precision
    }

    /// Return number of registers
    #[inline]
    pub fn register_count(&self) -> usize {
        self.registers.len()
    }

    /// Return theoretical relative standard error of the estimate
    #[inline]
    pub fn relative_error(&self) -> f64 {
        error_for_precision(self.config.precision)
    }

    /// Return hash seed
    #[inline]
    pub fn seed(&self) -> u32 {
        self.config.seed
    }

    /// Return mixer
    #[inline]
    pub fn mixer(&self) -> Mixer {
        self.config.mixer
    }

    /// Return configuration
    #[inline]
    pub fn config(&self) -> &SketchConfig {
        &self.config
    }

    /// Return registers
    #[inline]
    pub fn registers(&self) -> &[u8] {
        &self.registers
    }

    /// Return number of registers which have never been updated
    pub fn zero_registers(&self) -> usize {
        self.registers.iter().filter(|&&r| r == 0).count()
    }

    /// Return whether no element has been inserted since creation or last reset
    pub fn is_empty(&self) -> bool {
        self.registers.iter().all(|&r| r == 0)
    }

    /// Return memory size of `CardinalityEstimator`
    pub fn size_of(&self) -> usize {
        size_of::<Self>() + size_of_val(&*self.registers)
    }
}

impl Default for CardinalityEstimator {
    /// Estimator with precision 14, default seed and default mixer
    fn default() -> Self {
        Self::from_valid_config(SketchConfig::default())
    }
}

impl Debug for CardinalityEstimator {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{{ precision: {}, estimate: {:.0}, size: {} }}",
            self.precision(),
            self.estimate(),
            self.size_of()
        )
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::mixer::WyHash;
    use test_case::test_case;

    fn estimator_with_seed(precision: u8, seed: u32) -> CardinalityEstimator {
        CardinalityEstimator::with_config(
            SketchConfig::default()
                .with_precision(precision)
                .with_seed(seed),
        )
        .unwrap()
    }

    #[test_case(3 => matches Err(Error::InvalidPrecision(3)))]
    #[test_case(17 => matches Err(Error::InvalidPrecision(17)))]
    #[test_case(0 => matches Err(Error::InvalidPrecision(0)))]
    #[test_case(255 => matches Err(Error::InvalidPrecision(255)))]
    #[test_case(4 => matches Ok(16))]
    #[test_case(10 => matches Ok(1024))]
    #[test_case(16 => matches Ok(65536))]
    fn test_new(precision: u8) -> Result<usize> {
        CardinalityEstimator::new(precision).map(|e| e.register_count())
    }

    #[test]
    fn test_invalid_precision_kind() {
        for precision in [3, 17] {
            let err = CardinalityEstimator::new(precision).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        }
    }

    #[test]
    fn test_default() {
        let e = CardinalityEstimator::default();
        assert_eq!(e.precision(), 14);
        assert_eq!(e.register_count(), 1 << 14);
        assert_eq!(e.config(), &SketchConfig::default());
        assert!(e.is_empty());
    }

    #[test]
    fn test_introspection() {
        let e = estimator_with_seed(12, 77);
        assert_eq!(e.precision(), 12);
        assert_eq!(e.register_count(), 4096);
        assert_eq!(e.seed(), 77);
        assert_eq!(e.mixer(), Mixer::default());
        assert_eq!(e.relative_error(), 1.04 / 64.0);
        assert_eq!(e.size_of(), size_of::<CardinalityEstimator>() + 4096);
        assert_eq!(e.zero_registers(), 4096);
    }

    #[test]
    fn test_insert() {
        let mut e = CardinalityEstimator::new(12).unwrap();

        // Ensure initial estimate is 0.
        assert_eq!(e.estimate(), 0.0);

        // Insert a test item and validate estimate.
        e.insert_str("test item 1");
        assert_eq!(e.estimate().round(), 1.0);

        // Re-insert the same item, estimate should remain the same.
        let registers = e.registers().to_vec();
        e.insert_str("test item 1");
        assert_eq!(e.registers(), &registers[..]);
        assert_eq!(e.estimate().round(), 1.0);
        assert_eq!(e.zero_registers(), 4095);
        assert!(!e.is_empty());
    }

    #[test]
    fn test_insert_paths_agree() {
        let mut by_str = CardinalityEstimator::new(10).unwrap();
        let mut by_bytes = CardinalityEstimator::new(10).unwrap();
        let mut by_element = CardinalityEstimator::new(10).unwrap();
        let mut by_hash = CardinalityEstimator::new(10).unwrap();

        for i in 0..1000 {
            let item = format!("item{}", i);
            by_str.insert_str(&item);
            by_bytes.insert_bytes(item.as_bytes());
            by_element.insert(&item);
            by_hash.insert_hash(Mixer::default().hash(item.as_bytes(), 0));
        }

        assert_eq!(by_str, by_bytes);
        assert_eq!(by_str, by_element);
        assert_eq!(by_str, by_hash);
    }

    #[test]
    fn test_insert_hash_rank() {
        let mut e = CardinalityEstimator::new(4).unwrap();
        // bucket 3, remaining bits all zero
        e.insert_hash(3);
        assert_eq!(e.registers()[3], 61);
        // bucket 5, top bit set
        e.insert_hash((1 << 63) | 5);
        assert_eq!(e.registers()[5], 1);
        // lower rank never overwrites higher one
        e.insert_hash((1 << 63) | 3);
        assert_eq!(e.registers()[3], 61);
    }

    #[test]
    fn test_registers_are_monotonic() {
        let mut e = CardinalityEstimator::new(8).unwrap();
        let mut previous = e.registers().to_vec();
        for i in 0..5000u32 {
            e.insert(&i);
            let current = e.registers();
            assert!(previous.iter().zip(current).all(|(p, c)| c >= p));
            previous = current.to_vec();
        }
    }

    #[test]
    fn test_estimate_grows_with_cardinality() {
        let mut e = CardinalityEstimator::new(14).unwrap();
        let mut previous = e.estimate();
        let mut inserted = 0u64;
        for checkpoint in [1_000u64, 10_000, 100_000] {
            while inserted < checkpoint {
                e.insert(&inserted);
                inserted += 1;
            }
            let estimate = e.estimate();
            assert!(estimate > previous, "{} <= {}", estimate, previous);
            previous = estimate;
        }
    }

    #[test]
    fn test_estimate_is_idempotent() {
        let mut e = CardinalityEstimator::new(10).unwrap();
        for i in 0..10_000u64 {
            e.insert(&i);
        }
        let before = e.registers().to_vec();
        let first = e.estimate();
        let second = e.estimate();
        assert_eq!(first.to_bits(), second.to_bits());
        assert_eq!(e.registers(), &before[..]);
    }

    #[test]
    fn test_duplicates_do_not_change_estimate() {
        let mut e = CardinalityEstimator::new(12).unwrap();
        for i in 0..2000u32 {
            e.insert(&i);
        }
        let expected = e.clone();
        for _ in 0..3 {
            for i in 0..2000u32 {
                e.insert(&i);
            }
        }
        assert_eq!(e, expected);
    }

    #[test_case(10_000; "ten thousand")]
    #[test_case(100_000; "hundred thousand")]
    #[test_case(1_000_000; "one million")]
    fn test_accuracy_p14(n: u64) {
        let trials = 5;
        let mut total_relative_error = 0.0;
        let mut max_relative_error: f64 = 0.0;
        for seed in 1..=trials {
            let mut e = estimator_with_seed(14, seed);
            for i in 0..n {
                e.insert(&i);
            }
            let relative_error = (e.estimate() - n as f64).abs() / n as f64;
            total_relative_error += relative_error;
            max_relative_error = max_relative_error.max(relative_error);
        }

        let bound = CardinalityEstimator::default().relative_error();
        let avg_relative_error = total_relative_error / f64::from(trials);
        assert!(
            avg_relative_error < 3.0 * bound,
            "avg_err = {:.4}",
            avg_relative_error
        );
        assert!(
            max_relative_error < 5.0 * bound,
            "max_err = {:.4}",
            max_relative_error
        );
    }

    #[test]
    #[ignore = "slow: inserts ten million elements"]
    fn test_accuracy_p14_ten_million() {
        let n = 10_000_000u64;
        let mut e = estimator_with_seed(14, 1);
        for i in 0..n {
            e.insert(&i);
        }
        let relative_error = (e.estimate() - n as f64).abs() / n as f64;
        assert!(relative_error < 5.0 * e.relative_error(), "err = {:.4}", relative_error);
    }

    #[test]
    fn test_accuracy_wyhash() {
        let n = 100_000u64;
        let mut e = CardinalityEstimator::with_config(
            SketchConfig::default().with_precision(12).with_mixer(WyHash),
        )
        .unwrap();
        for i in 0..n {
            e.insert(&i);
        }
        let relative_error = (e.estimate() - n as f64).abs() / n as f64;
        assert!(relative_error < 5.0 * e.relative_error(), "err = {:.4}", relative_error);
    }

    #[test]
    fn test_small_cardinality_uses_linear_counting() {
        let mut e = CardinalityEstimator::new(14).unwrap();
        for i in 0..100u64 {
            e.insert(&i);
        }
        // at most a couple of collisions among 100 items in 16384 buckets
        let estimate = e.estimate();
        assert!((95.0..=101.0).contains(&estimate), "estimate = {}", estimate);
    }

    #[test]
    fn test_merge_union() {
        let mut a = estimator_with_seed(12, 3);
        let mut b = estimator_with_seed(12, 3);
        let mut c = estimator_with_seed(12, 3);
        let mut all = estimator_with_seed(12, 3);

        for i in 0..1000u64 {
            a.insert(&i);
            all.insert(&i);
        }
        for i in 1000..2000u64 {
            b.insert(&i);
            all.insert(&i);
        }
        for i in 500..3000u64 {
            c.insert(&i);
            all.insert(&i);
        }

        let mut ab_c = a.clone();
        ab_c.merge(&b).unwrap();
        ab_c.merge(&c).unwrap();
        assert_eq!(ab_c, all);

        // associativity
        let mut bc = b.clone();
        bc.merge(&c).unwrap();
        let mut a_bc = a.clone();
        a_bc.merge(&bc).unwrap();
        assert_eq!(a_bc, ab_c);

        // commutativity
        let mut ba = b.clone();
        ba.merge(&a).unwrap();
        let mut ab = a.clone();
        ab.merge(&b).unwrap();
        assert_eq!(ab, ba);

        // idempotence
        let mut aa = a.clone();
        aa.merge(&a).unwrap();
        assert_eq!(aa, a);
    }

    #[test_case(0, 0)]
    #[test_case(0, 100)]
    #[test_case(100, 0)]
    #[test_case(10_000, 10_000)]
    fn test_merge_estimate(lhs_n: u64, rhs_n: u64) {
        let mut lhs = CardinalityEstimator::new(12).unwrap();
        for i in 0..lhs_n {
            lhs.insert(&i);
        }
        // disjoint ranges
        let mut rhs = CardinalityEstimator::new(12).unwrap();
        for i in 0..rhs_n {
            rhs.insert(&(u64::MAX - i));
        }

        lhs.merge(&rhs).unwrap();

        let n = (lhs_n + rhs_n) as f64;
        let estimate = lhs.estimate();
        if n == 0.0 {
            assert_eq!(estimate, 0.0);
        } else {
            let relative_error = (estimate - n).abs() / n;
            assert!(relative_error < 5.0 * lhs.relative_error(), "err = {:.4}", relative_error);
        }
    }

    #[test]
    fn test_merge_precision_mismatch() {
        let mut p10 = CardinalityEstimator::new(10).unwrap();
        let mut p12 = CardinalityEstimator::new(12).unwrap();
        for i in 0..1000u64 {
            p10.insert(&i);
            p12.insert(&(i * 7));
        }
        let p10_before = p10.clone();
        let p12_before = p12.clone();

        let err = p10.merge(&p12).unwrap_err();
        assert_eq!(err, Error::PrecisionMismatch { lhs: 10, rhs: 12 });
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);

        let err = p12.merge(&p10).unwrap_err();
        assert_eq!(err, Error::PrecisionMismatch { lhs: 12, rhs: 10 });

        assert_eq!(p10, p10_before);
        assert_eq!(p12, p12_before);
    }

    #[test]
    fn test_merge_different_seed_is_allowed() {
        let mut lhs = estimator_with_seed(10, 1);
        let mut rhs = estimator_with_seed(10, 2);
        lhs.insert(&1u64);
        rhs.insert(&2u64);
        assert!(lhs.merge(&rhs).is_ok());
        // config of the receiving estimator is kept
        assert_eq!(lhs.seed(), 1);
    }

    #[test]
    fn test_reset() {
        let mut e = CardinalityEstimator::new(14).unwrap();
        for i in 0..50_000u64 {
            e.insert(&i);
        }
        assert!(e.estimate() > 0.0);

        e.reset();
        assert!(e.is_empty());
        assert_eq!(e.zero_registers(), e.register_count());
        assert_eq!(e.estimate(), 0.0);
        assert_eq!(e, CardinalityEstimator::default());
    }

    #[test]
    fn test_per_worker_estimators_merge() {
        let workers = 4u64;
        let per_worker = 25_000u64;

        let partials: Vec<CardinalityEstimator> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..workers)
                .map(|w| {
                    s.spawn(move || {
                        let mut e = estimator_with_seed(12, 9);
                        for i in w * per_worker..(w + 1) * per_worker {
                            e.insert(&i);
                        }
                        e
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        let mut merged = estimator_with_seed(12, 9);
        for partial in &partials {
            merged.merge(partial).unwrap();
        }

        let mut single = estimator_with_seed(12, 9);
        for i in 0..workers * per_worker {
            single.insert(&i);
        }

        assert_eq!(merged, single);
    }

    #[test]
    fn test_from_parts_round_trip() {
        let mut e = estimator_with_seed(10, 5);
        for i in 0..5000u64 {
            e.insert(&i);
        }
        let restored =
            CardinalityEstimator::from_parts(*e.config(), e.registers().to_vec()).unwrap();
        assert_eq!(restored, e);
        assert_eq!(restored.estimate().to_bits(), e.estimate().to_bits());
    }

    #[test]
    fn test_from_parts_invalid() {
        let config = SketchConfig::default().with_precision(4);

        let err = CardinalityEstimator::from_parts(config, vec![0; 15]).unwrap_err();
        assert_eq!(
            err,
            Error::RegisterCountMismatch {
                precision: 4,
                expected: 16,
                found: 15
            }
        );

        let mut registers = vec![0; 16];
        registers[7] = 62;
        let err = CardinalityEstimator::from_parts(config, registers).unwrap_err();
        assert_eq!(
            err,
            Error::RankOutOfRange {
                index: 7,
                rank: 62,
                max: 61
            }
        );

        let err = CardinalityEstimator::from_parts(config.with_precision(20), vec![]).unwrap_err();
        assert_eq!(err, Error::InvalidPrecision(20));
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[test_case(4 => "{ precision: 4, estimate: 0, size: 48 }")]
    #[test_case(10 => "{ precision: 10, estimate: 0, size: 1056 }")]
    fn test_debug_empty(precision: u8) -> String {
        format!("{:?}", CardinalityEstimator::new(precision).unwrap())
    }

    #[test]
    fn test_debug_estimate() {
        let mut e = CardinalityEstimator::new(12).unwrap();
        e.insert_str("a");
        assert!(format!("{:?}", e).starts_with("{ precision: 12, estimate: 1, size: "));
    }
}
