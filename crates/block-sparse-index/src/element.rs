//! Element trait for mask values.
//!
//! This module defines the `MaskElement` trait that abstracts over booleans,
//! integers, floats and Complex64 for tile activity tests and content equality.

use std::fmt::Debug;

use num_complex::Complex64;
use num_traits::Zero;

/// Trait for values stored in a mask.
///
/// Activity is decided by [`MaskElement::is_nonzero`]; content equality between
/// tiles is decided by the raw bit pattern written by [`MaskElement::write_bits`],
/// so two floats compare equal only if they are bit-for-bit identical.
pub trait MaskElement: Copy + Debug + PartialEq + Send + Sync + 'static {
    /// Whether this value means "work needed here".
    fn is_nonzero(&self) -> bool;

    /// The canonical zero of this type, used to fill inactive tiles.
    fn zero_value() -> Self;

    /// Append the raw bit pattern of this value to `out`.
    fn write_bits(&self, out: &mut Vec<u64>);
}

impl MaskElement for bool {
    fn is_nonzero(&self) -> bool {
        *self
    }

    fn zero_value() -> Self {
        false
    }

    fn write_bits(&self, out: &mut Vec<u64>) {
        out.push(*self as u64);
    }
}

macro_rules! impl_mask_element_int {
    ($($t:ty),* $(,)?) => {
        $(
            impl MaskElement for $t {
                fn is_nonzero(&self) -> bool {
                    !Zero::is_zero(self)
                }

                fn zero_value() -> Self {
                    Zero::zero()
                }

                fn write_bits(&self, out: &mut Vec<u64>) {
                    out.push(*self as u64);
                }
            }
        )*
    };
}

impl_mask_element_int!(u8, u16, u32, u64, usize, i8, i16, i32, i64, isize);

impl MaskElement for f32 {
    fn is_nonzero(&self) -> bool {
        !Zero::is_zero(self)
    }

    fn zero_value() -> Self {
        0.0
    }

    fn write_bits(&self, out: &mut Vec<u64>) {
        out.push(self.to_bits() as u64);
    }
}

impl MaskElement for f64 {
    fn is_nonzero(&self) -> bool {
        !Zero::is_zero(self)
    }

    fn zero_value() -> Self {
        0.0
    }

    fn write_bits(&self, out: &mut Vec<u64>) {
        out.push(self.to_bits());
    }
}

impl MaskElement for Complex64 {
    fn is_nonzero(&self) -> bool {
        !Zero::is_zero(self)
    }

    fn zero_value() -> Self {
        Complex64::zero()
    }

    fn write_bits(&self, out: &mut Vec<u64>) {
        out.push(self.re.to_bits());
        out.push(self.im.to_bits());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bits<T: MaskElement>(x: T) -> Vec<u64> {
        let mut out = Vec::new();
        x.write_bits(&mut out);
        out
    }

    #[test]
    fn test_bool_element() {
        assert!(true.is_nonzero());
        assert!(!false.is_nonzero());
        assert!(!bool::zero_value());
    }

    #[test]
    fn test_int_element() {
        assert!(3i32.is_nonzero());
        assert!(!0u8.is_nonzero());
        assert_ne!(bits(-1i64), bits(1i64));
    }

    #[test]
    fn test_float_signed_zero() {
        // Both zeros are inactive, but their contents differ bitwise
        assert!(!0.0f64.is_nonzero());
        assert!(!(-0.0f64).is_nonzero());
        assert_ne!(bits(0.0f64), bits(-0.0f64));
    }

    #[test]
    fn test_float_nan_is_nonzero() {
        assert!(f32::NAN.is_nonzero());
        assert_eq!(bits(f64::NAN), bits(f64::NAN));
    }

    #[test]
    fn test_complex_element() {
        let z = Complex64::new(0.0, 2.0);
        assert!(z.is_nonzero());
        assert!(!Complex64::zero_value().is_nonzero());
        assert_eq!(bits(z).len(), 2);
    }
}
