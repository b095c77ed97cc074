//! Dense 2D input mask.

use mdarray::DTensor;

use crate::dense;
use crate::element::MaskElement;
use crate::error::{BlockSparseError, Result};
use crate::partition::{TileCoord, TileGrid};
use crate::tile::TileData;

/// Dense 2D mask (immutable input of the indexer).
///
/// Logical zero means "no work needed here". Data is stored in row-major order.
#[derive(Debug, Clone)]
pub struct Mask<T: MaskElement> {
    tensor: DTensor<T, 2>,
    shape: [usize; 2],
}

impl<T: MaskElement> Mask<T> {
    /// Create a mask by evaluating `f(row, col)` for every element.
    pub fn from_fn(shape: [usize; 2], mut f: impl FnMut(usize, usize) -> T) -> Self {
        let tensor = dense::from_fn2(shape, |idx| f(idx[0], idx[1]));
        Self { tensor, shape }
    }

    /// Create a mask from row-major data.
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

    /// Create a mask from a list of equally long rows.
    pub fn from_rows(rows: Vec<Vec<T>>) -> Result<Self> {
        let ncols = rows.first().map_or(0, Vec::len);
        if let Some((row, r)) = rows.iter().enumerate().find(|(_, r)| r.len() != ncols) {
            return Err(BlockSparseError::RaggedRows {
                row,
                expected: ncols,
                actual: r.len(),
            });
        }
        Ok(Self::from_fn([rows.len(), ncols], |i, j| rows[i][j]))
    }

    /// All-zero mask.
    pub fn zeros(shape: [usize; 2]) -> Self {
        Self::from_fn(shape, |_, _| T::zero_value())
    }

    /// Get the shape `[rows, cols]`.
    pub fn shape(&self) -> [usize; 2] {
        self.shape
    }

    pub fn nrows(&self) -> usize {
        self.shape[0]
    }

    pub fn ncols(&self) -> usize {
        self.shape[1]
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

    /// Number of non-zero elements.
    pub fn nnz(&self) -> usize {
        self.iter().filter(|x| x.is_nonzero()).count()
    }

    /// Tile this mask with `[tile_rows, tile_cols]` tiles.
    pub fn tile_grid(&self, tile_shape: [usize; 2]) -> Result<TileGrid> {
        TileGrid::new(self.shape, tile_shape)
    }

    /// Copy out the content of one tile.
    ///
    /// Fails if `grid` was built for a mask of another shape or `coord` lies
    /// outside it.
    pub fn tile(&self, grid: &TileGrid, coord: TileCoord) -> Result<TileData<T>> {
        if grid.mask_shape() != self.shape {
            return Err(BlockSparseError::GridMismatch {
                mask: self.shape,
                grid: grid.mask_shape(),
            });
        }
        grid.check(coord)?;
        Ok(self.tile_at(grid, coord))
    }

    /// Tile content for a grid built from this mask and a coordinate inside it.
    pub(crate) fn tile_at(&self, grid: &TileGrid, coord: TileCoord) -> TileData<T> {
        let r0 = grid.rows().tile_offset(coord.row);
        let c0 = grid.cols().tile_offset(coord.col);
        TileData::from_fn(grid.tile_shape(), |i, j| self.tensor[[r0 + i, c0 + j]])
    }
}
