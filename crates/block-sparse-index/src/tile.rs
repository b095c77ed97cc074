//! Owned tile content.
//!
//! This module provides the content of a single tile, built on top of
//! mdarray's `DTensor` type.

use mdarray::DTensor;

use crate::dense;
use crate::element::MaskElement;
use crate::error::{BlockSparseError, Result};

/// Owned 2D tile content.
///
/// Data is stored in row-major (C) order.
#[derive(Debug, Clone)]
pub struct TileData<T: MaskElement> {
    tensor: DTensor<T, 2>,
    shape: [usize; 2],
}

impl<T: MaskElement> TileData<T> {
    /// Create a tile by evaluating `f(row, col)` for every element.
    pub fn from_fn(shape: [usize; 2], mut f: impl FnMut(usize, usize) -> T) -> Self {
        let tensor = dense::from_fn2(shape, |idx| f(idx[0], idx[1]));
        Self { tensor, shape }
    }

    /// Create a tile from row-major data.
    pub fn from_vec(data: Vec<T>, shape: [usize; 2]) -> Result<Self> {
        let expected = shape[0]
            .checked_mul(shape[1])
            .ok_or(BlockSparseError::ShapeOverflow { shape })?;
        if data.len() != expected {
            return Err(BlockSparseError::ShapeMismatch {
                shape,
                expected,
                actual: data.len(),
            });
        }
        Ok(Self::from_fn(shape, |i, j| data[i * shape[1] + j]))
    }

    /// Get the shape of this tile.
    pub fn shape(&self) -> [usize; 2] {
        self.shape
    }

    /// Get the total number of elements.
    pub fn len(&self) -> usize {
        self.shape[0] * self.shape[1]
    }

    /// Check if tile is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get element at [i, j].
    pub fn get(&self, idx: [usize; 2]) -> T {
        self.tensor[idx]
    }

    /// Get the underlying tensor reference.
    pub fn as_tensor(&self) -> &DTensor<T, 2> {
        &self.tensor
    }

    /// Iterate elements in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = T> + '_ {
        let [m, n] = self.shape;
        (0..m).flat_map(move |i| (0..n).map(move |j| self.tensor[[i, j]]))
    }

    /// Convert to Vec in row-major order.
    pub fn to_vec(&self) -> Vec<T> {
        self.iter().collect()
    }

    /// True iff any element is non-zero.
    pub fn is_active(&self) -> bool {
        self.iter().any(|x| x.is_nonzero())
    }

    /// Number of non-zero elements.
    pub fn nnz(&self) -> usize {
        self.iter().filter(|x| x.is_nonzero()).count()
    }

    /// Bit pattern of the whole tile, prefixed by its shape.
    ///
    /// Two tiles have equal keys iff they have the same shape and are
    /// bit-for-bit equal element by element.
    pub fn content_key(&self) -> Vec<u64> {
        let mut key = Vec::with_capacity(2 + self.len());
        key.push(self.shape[0] as u64);
        key.push(self.shape[1] as u64);
        for x in self.iter() {
            x.write_bits(&mut key);
        }
        key
    }

    /// Bit-for-bit content equality.
    pub fn same_content(&self, other: &Self) -> bool {
        if self.shape != other.shape {
            return false;
        }
        let mut a = Vec::new();
        let mut b = Vec::new();
        self.iter().zip(other.iter()).all(|(x, y)| {
            a.clear();
            b.clear();
            x.write_bits(&mut a);
            y.write_bits(&mut b);
            a == b
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tile<T: MaskElement>(data: Vec<T>, shape: [usize; 2]) -> TileData<T> {
        TileData::from_vec(data, shape).unwrap()
    }

    #[test]
    fn test_tile_from_vec() {
        // Row-major: [[1, 2, 3], [4, 5, 6]]
        let t = tile(vec![1, 2, 3, 4, 5, 6], [2, 3]);

        assert_eq!(t.shape(), [2, 3]);
        assert_eq!(t.len(), 6);
        assert_eq!(t.get([0, 2]), 3);
        assert_eq!(t.get([1, 0]), 4);
        assert_eq!(t.to_vec(), vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_tile_from_vec_wrong_len() {
        let err = TileData::from_vec(vec![1u8, 2, 3], [2, 2]).unwrap_err();
        assert_eq!(
            err,
            BlockSparseError::ShapeMismatch {
                shape: [2, 2],
                expected: 4,
                actual: 3
            }
        );
    }

    #[test]
    fn test_tile_from_vec_overflow() {
        let err = TileData::<u8>::from_vec(vec![], [usize::MAX, 2]).unwrap_err();
        assert_eq!(
            err,
            BlockSparseError::ShapeOverflow {
                shape: [usize::MAX, 2]
            }
        );
    }

    #[test]
    fn test_tile_activity() {
        let zeros = tile(vec![0.0f32; 4], [2, 2]);
        let single = tile(vec![0.0f32, 0.0, 0.5, 0.0], [2, 2]);

        assert!(!zeros.is_active());
        assert!(single.is_active());
        assert_eq!(single.nnz(), 1);
    }

    #[test]
    fn test_same_content() {
        let a = tile(vec![1.0, 0.0, 0.0, 1.0], [2, 2]);
        let b = tile(vec![1.0, 0.0, 0.0, 1.0], [2, 2]);
        let c = tile(vec![1.0, -0.0, 0.0, 1.0], [2, 2]);
        let d = tile(vec![1.0, 0.0, 0.0, 1.0], [1, 4]);

        assert!(a.same_content(&b));
        assert!(!a.same_content(&c));
        assert!(!a.same_content(&d));
        assert_eq!(a.content_key(), b.content_key());
        assert_ne!(a.content_key(), d.content_key());
    }
}
