//! Error types for block-sparse indexing.

use thiserror::Error;

/// Errors that can occur while building or querying a block-sparse index.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BlockSparseError {
    /// Mask extent along an axis is not a multiple of the tile extent.
    #[error("Dimension mismatch on {axis} axis: extent {extent} is not divisible by tile extent {tile}")]
    DimensionMismatch {
        axis: &'static str,
        extent: usize,
        tile: usize,
    },

    /// Tile extent of zero along an axis.
    #[error("Tile extent on {axis} axis must be at least 1")]
    ZeroTileExtent { axis: &'static str },

    /// Flat data does not match the declared mask shape.
    #[error("Shape mismatch: shape {shape:?} needs {expected} elements, got {actual}")]
    ShapeMismatch {
        shape: [usize; 2],
        expected: usize,
        actual: usize,
    },

    /// Shape whose element count does not fit in `usize`.
    #[error("Shape {shape:?} has too many elements")]
    ShapeOverflow { shape: [usize; 2] },

    /// Tile grid built for a mask of a different shape.
    #[error("Tile grid for a {grid:?} mask used with a {mask:?} mask")]
    GridMismatch { mask: [usize; 2], grid: [usize; 2] },

    /// Row-wise input whose rows differ in length.
    #[error("Ragged rows: row {row} has {actual} elements, expected {expected}")]
    RaggedRows {
        row: usize,
        expected: usize,
        actual: usize,
    },

    /// Every tile of the mask is inactive and the caller asked for rejection.
    #[error("Mask has no active tile in a {tile_rows}x{tile_cols} tile grid")]
    EmptyMask { tile_rows: usize, tile_cols: usize },

    /// Tile coordinate outside the tile grid.
    #[error("Tile ({row}, {col}) out of bounds for a {tile_rows}x{tile_cols} tile grid")]
    TileOutOfBounds {
        row: usize,
        col: usize,
        tile_rows: usize,
        tile_cols: usize,
    },
}

/// Result type for block-sparse indexing.
pub type Result<T> = std::result::Result<T, BlockSparseError>;
