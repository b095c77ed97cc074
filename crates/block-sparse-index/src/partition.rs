//! Uniform tiling of mask axes.

use std::ops::Range;

use crate::error::{BlockSparseError, Result};

/// Uniform partition of one mask axis into equally sized tiles.
///
/// An axis of extent 12 tiled by 4 has three tiles covering `0..4`, `4..8`
/// and `8..12`. The extent must be a multiple of the tile extent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AxisTiling {
    extent: usize,
    tile: usize,
}

impl AxisTiling {
    /// Create a tiling, checking the divisibility precondition.
    pub fn new(axis: &'static str, extent: usize, tile: usize) -> Result<Self> {
        if tile == 0 {
            return Err(BlockSparseError::ZeroTileExtent { axis });
        }
        if extent % tile != 0 {
            return Err(BlockSparseError::DimensionMismatch { axis, extent, tile });
        }
        Ok(Self { extent, tile })
    }

    /// Total extent of the axis.
    #[inline]
    pub fn extent(&self) -> usize {
        self.extent
    }

    /// Extent of every tile.
    #[inline]
    pub fn tile_extent(&self) -> usize {
        self.tile
    }

    /// Number of tiles along the axis.
    #[inline]
    pub fn num_tiles(&self) -> usize {
        self.extent / self.tile
    }

    /// Starting offset of a tile.
    #[inline]
    pub fn tile_offset(&self, tile_idx: usize) -> usize {
        tile_idx * self.tile
    }

    /// Element range covered by a tile.
    #[inline]
    pub fn tile_range(&self, tile_idx: usize) -> Range<usize> {
        let start = self.tile_offset(tile_idx);
        start..start + self.tile
    }
}

/// Coordinate of a tile in the tile grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileCoord {
    pub row: usize,
    pub col: usize,
}

impl TileCoord {
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

impl From<(usize, usize)> for TileCoord {
    fn from((row, col): (usize, usize)) -> Self {
        Self { row, col }
    }
}

/// Tile grid induced by tiling both axes of a mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileGrid {
    rows: AxisTiling,
    cols: AxisTiling,
}

impl TileGrid {
    /// Tile a `[rows, cols]` mask with `[tile_rows, tile_cols]` tiles.
    pub fn new(mask_shape: [usize; 2], tile_shape: [usize; 2]) -> Result<Self> {
        Ok(Self {
            rows: AxisTiling::new("row", mask_shape[0], tile_shape[0])?,
            cols: AxisTiling::new("column", mask_shape[1], tile_shape[1])?,
        })
    }

    /// Row axis tiling.
    pub fn rows(&self) -> &AxisTiling {
        &self.rows
    }

    /// Column axis tiling.
    pub fn cols(&self) -> &AxisTiling {
        &self.cols
    }

    /// Number of tiles along each axis.
    pub fn shape(&self) -> [usize; 2] {
        [self.rows.num_tiles(), self.cols.num_tiles()]
    }

    /// Shape of every tile.
    pub fn tile_shape(&self) -> [usize; 2] {
        [self.rows.tile_extent(), self.cols.tile_extent()]
    }

    /// Shape of the tiled mask.
    pub fn mask_shape(&self) -> [usize; 2] {
        [self.rows.extent(), self.cols.extent()]
    }

    /// Total number of tiles.
    pub fn num_tiles(&self) -> usize {
        self.rows.num_tiles() * self.cols.num_tiles()
    }

    /// Whether `coord` lies inside the grid.
    pub fn contains(&self, coord: TileCoord) -> bool {
        coord.row < self.rows.num_tiles() && coord.col < self.cols.num_tiles()
    }

    /// Fail with `TileOutOfBounds` unless `coord` lies inside the grid.
    pub fn check(&self, coord: TileCoord) -> Result<()> {
        if self.contains(coord) {
            Ok(())
        } else {
            let [tile_rows, tile_cols] = self.shape();
            Err(BlockSparseError::TileOutOfBounds {
                row: coord.row,
                col: coord.col,
                tile_rows,
                tile_cols,
            })
        }
    }

    /// Row-major linear index of a tile.
    #[inline]
    pub fn linear_index(&self, coord: TileCoord) -> usize {
        coord.row * self.cols.num_tiles() + coord.col
    }

    /// Tile coordinate of a row-major linear index.
    #[inline]
    pub fn coord(&self, linear: usize) -> TileCoord {
        let ncols = self.cols.num_tiles();
        TileCoord::new(linear / ncols, linear % ncols)
    }

    /// The bottom-right tile, used as the "no active tile seen yet" sentinel.
    ///
    /// Saturates to `(0, 0)` for a grid without tiles.
    pub fn last_tile(&self) -> TileCoord {
        TileCoord::new(
            self.rows.num_tiles().saturating_sub(1),
            self.cols.num_tiles().saturating_sub(1),
        )
    }

    /// Tiles in ascending row-major order.
    pub fn forward_order(&self) -> impl DoubleEndedIterator<Item = TileCoord> + '_ {
        (0..self.num_tiles()).map(move |linear| self.coord(linear))
    }

    /// Tiles in scan order: descending rows, and descending columns within a row.
    pub fn traversal_order(&self) -> impl Iterator<Item = TileCoord> + '_ {
        self.forward_order().rev()
    }
}
