//! Dense tensor construction.
//!
//! mdarray 0.7 iterates the innermost axis even when an outer axis has
//! length zero, so `from_fn` must never see a shape containing a zero.
//! Empty tensors are reshaped from an empty vector instead.

use mdarray::{DTensor, Dyn, Tensor};

/// Rank-2 `DTensor::from_fn` that never calls `f` for an empty shape.
pub(crate) fn from_fn2<T>(shape: [usize; 2], f: impl FnMut(&[usize]) -> T) -> DTensor<T, 2> {
    if shape.contains(&0) {
        return Tensor::<T, (Dyn,)>::from(Vec::new()).into_shape(shape);
    }
    DTensor::<T, 2>::from_fn(shape, f)
}

/// Rank-3 `DTensor::from_fn` that never calls `f` for an empty shape.
pub(crate) fn from_fn3<T>(shape: [usize; 3], f: impl FnMut(&[usize]) -> T) -> DTensor<T, 3> {
    if shape.contains(&0) {
        return Tensor::<T, (Dyn,)>::from(Vec::new()).into_shape(shape);
    }
    DTensor::<T, 3>::from_fn(shape, f)
}
