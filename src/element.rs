//! Canonical byte encoding of inserted elements.
//!
//! Elements are hashed over a stable byte encoding rather than their
//! in-memory layout, so the same logical value lands in the same register
//! on every platform:
//! - integers and floats - fixed-width little-endian bytes
//! - `usize`/`isize` - widened to 64 bits
//! - `bool` - single byte `0` or `1`
//! - `char` - Unicode scalar value as little-endian `u32`
//! - strings and byte buffers - their bytes as is
//!
//! Floats are hashed by bit pattern, so `0.0` and `-0.0` count as distinct elements.

/// Element that can be inserted into `CardinalityEstimator`
pub trait SketchElement {
    /// Call `f` with the canonical bytes of `self`
    fn with_canonical_bytes<R>(&self, f: impl FnOnce(&[u8]) -> R) -> R;
}

macro_rules! impl_fixed_width {
    ($($t:ty),* $(,)?) => {$(
        impl SketchElement for $t {
            #[inline]
            fn with_canonical_bytes<R>(&self, f: impl FnOnce(&[u8]) -> R) -> R {
                f(&self.to_le_bytes())
            }
        }
    )*};
}

impl_fixed_width!(u8, u16, u32, u64, u128, i8, i16, i32, i64, i128, f32, f64);

impl SketchElement for usize {
    #[inline]
    fn with_canonical_bytes<R>(&self, f: impl FnOnce(&[u8]) -> R) -> R {
        f(&(*self as u64).to_le_bytes())
    }
}

impl SketchElement for isize {
    #[inline]
    fn with_canonical_bytes<R>(&self, f: impl FnOnce(&[u8]) -> R) -> R {
        f(&(*self as i64).to_le_bytes())
    }
}

impl SketchElement for bool {
    #[inline]
    fn with_canonical_bytes<R>(&self, f: impl FnOnce(&[u8]) -> R) -> R {
        f(&[u8::from(*self)])
    }
}

impl SketchElement for char {
    #[inline]
    fn with_canonical_bytes<R>(&self, f: impl FnOnce(&[u8]) -> R) -> R {
        f(&u32::from(*self).to_le_bytes())
    }
}

impl SketchElement for str {
    #[inline]
    fn with_canonical_bytes<R>(&self, f: impl FnOnce(&[u8]) -> R) -> R {
        f(self.as_bytes())
    }
}

impl SketchElement for String {
    #[inline]
    fn with_canonical_bytes<R>(&self, f: impl FnOnce(&[u8]) -> R) -> R {
        f(self.as_bytes())
    }
}

impl SketchElement for [u8] {
    #[inline]
    fn with_canonical_bytes<R>(&self, f: impl FnOnce(&[u8]) -> R) -> R {
        f(self)
    }
}

impl<const N: usize> SketchElement for [u8; N] {
    #[inline]
    fn with_canonical_bytes<R>(&self, f: impl FnOnce(&[u8]) -> R) -> R {
        f(self)
    }
}

impl SketchElement for Vec<u8> {
    #[inline]
    fn with_canonical_bytes<R>(&self, f: impl FnOnce(&[u8]) -> R) -> R {
        f(self)
    }
}

impl<T: SketchElement + ?Sized> SketchElement for &T {
    #[inline]
    fn with_canonical_bytes<R>(&self, f: impl FnOnce(&[u8]) -> R) -> R {
        (**self).with_canonical_bytes(f)
    }
}
