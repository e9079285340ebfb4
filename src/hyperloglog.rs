//! ## HyperLogLog estimator
//! Register routing and the classic HyperLogLog estimate over `M = 2^P` one-byte registers.
//!
//! [Original HyperLogLog paper](https://algo.inria.fr/flajolet/Publications/FlFuGaMe07.pdf)
//!
//! A 64-bit digest is split into:
//! - 0..P bits     - register index (bucket)
//! - P..63 bits    - rank source: leading zeros of these `64 - P` bits plus one
//!
//! Estimate:
//! - raw estimate `alpha * M^2 / sum(2^-register)`
//! - linear counting when raw estimate `<= 2.5 * M` and some registers are zero
//! - large range correction above `2^32 / 30`, assuming a 32-bit hash space

/// Minimum supported precision
pub const MIN_PRECISION: u8 = 4;
/// Maximum supported precision
pub const MAX_PRECISION: u8 = 16;
/// Precision used by `Default`
pub const DEFAULT_PRECISION: u8 = 14;

/// Size of the hash space assumed by the large range correction
const TWO_POW_32: f64 = 4_294_967_296.0;

/// Return whether `precision` is supported
#[inline]
pub(crate) fn is_valid_precision(precision: u8) -> bool {
    (MIN_PRECISION..=MAX_PRECISION).contains(&precision)
}

/// Largest rank a register can hold for `precision`
#[inline]
pub(crate) fn max_rank(precision: u8) -> u8 {
    64 - precision + 1
}

/// Split `hash` into register index and rank
#[inline]
pub(crate) fn split_hash(hash: u64, precision: u8) -> (usize, u8) {
    let idx = (hash & ((1 << precision) - 1)) as usize;
    // `hash >> P` has its top P bits cleared, so only the remaining
    // `64 - P` bits count; an all-zero remainder yields `64 - P + 1`.
    let rank = (hash >> precision).leading_zeros() - u32::from(precision) + 1;
    (idx, rank as u8)
}

/// Parameter for bias correction
#[inline]
pub(crate) fn alpha(m: usize) -> f64 {
    match m {
        16 => 0.673,
        32 => 0.697,
        64 => 0.709,
        _ => 0.7213 / (1.0 + 1.079 / (m as f64)),
    }
}

/// Return cardinality estimate of `registers` using bias constant `alpha`
pub(crate) fn estimate(registers: &[u8], alpha: f64) -> f64 {
    let m = registers.len() as f64;
    let (sum, zeros) = registers
        .iter()
        .fold((0.0, 0usize), |(sum, zeros), &rank| {
            (sum + 2f64.powi(-i32::from(rank)), zeros + usize::from(rank == 0))
        });

    let raw = alpha * m * m / sum;

    if raw <= 2.5 * m && zeros > 0 {
        linear_counting(m, zeros as f64)
    } else if raw > TWO_POW_32 / 30.0 && raw < TWO_POW_32 {
        -TWO_POW_32 * (1.0 - raw / TWO_POW_32).ln()
    } else {
        raw
    }
}

/// Linear counting estimate based on the fraction of empty registers
#[inline]
fn linear_counting(m: f64, zeros: f64) -> f64 {
    m * (m / zeros).ln()
}

/// Compute the required precision for a target relative standard error.
///
/// The result is clamped to the supported `[4..16]` range.
pub fn precision_for_error(target_error: f64) -> u8 {
    if target_error.is_nan() || target_error <= 0.0 {
        return MAX_PRECISION;
    }
    // error = 1.04 / sqrt(m), so m = (1.04 / error)^2
    let m = (1.04 / target_error).powi(2);
    m.log2()
        .ceil()
        .clamp(f64::from(MIN_PRECISION), f64::from(MAX_PRECISION)) as u8
}

/// Compute the relative standard error for a given precision
#[inline]
pub fn error_for_precision(precision: u8) -> f64 {
    let m = (1usize << precision) as f64;
    1.04 / m.sqrt()
}
