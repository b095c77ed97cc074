//! Block-sparse tile indexing for skip-aware tiled computation.
//!
//! A dense 2D mask is split into equally sized tiles. This crate derives, in a
//! single deterministic pass, everything a tiled execution engine needs to skip
//! empty tiles and to prefetch only tiles it will actually use.
//!
//! # Overview
//!
//! For a mask of shape `(M, N)` and tiles of shape `(bm, bn)` the tile grid has
//! shape `(M / bm, N / bn)`. [`compute_sparse_index`] produces a
//! [`SparseIndex`] holding, per tile:
//!
//! - **Active flag**: true iff the tile has a non-zero element
//! - **Next active tile**: row and column of the nearest active tile at or
//!   after this one in ascending row-major order
//! - **Content index**: entry of the [`DedupTable`] holding that tile's content
//!
//! The dedup table stores each distinct active tile content once, in the order
//! the tiles are first seen by the scan (descending rows, then descending
//! columns).
//!
//! # Quick Start
//!
//! ```
//! use block_sparse_index::{compute_sparse_index, Mask, TileCoord};
//!
//! let mask = Mask::from_rows(vec![
//!     vec![1, 0, 0, 0],
//!     vec![0, 0, 0, 0],
//!     vec![0, 0, 1, 1],
//!     vec![0, 0, 1, 1],
//! ])
//! .unwrap();
//!
//! let index = compute_sparse_index(&mask, [2, 2]).unwrap();
//!
//! assert!(index.is_active(TileCoord::new(0, 0)));
//! assert!(!index.is_active(TileCoord::new(0, 1)));
//! assert_eq!(index.dedup_table().len(), 2);
//!
//! // (0, 1) is skipped; the engine prefetches (1, 1) instead
//! assert_eq!(index.next_active(TileCoord::new(0, 1)), TileCoord::new(1, 1));
//! ```
//!
//! # Empty Masks
//!
//! A mask without active tiles has no "next active tile". By default every tile
//! then points at the bottom-right tile with content index 0 (see
//! [`EmptyMaskPolicy::Sentinel`]); the same sentinel is carried by inactive
//! tiles after the last active one. Callers that prefer a hard failure use
//! [`EmptyMaskPolicy::Reject`]:
//!
//! ```
//! use block_sparse_index::{BlockSparseError, BlockSparseIndexer, EmptyMaskPolicy, Mask};
//!
//! let indexer = BlockSparseIndexer::builder([2, 2])
//!     .with_empty_mask_policy(EmptyMaskPolicy::Reject)
//!     .build()
//!     .unwrap();
//!
//! let result = indexer.compute(&Mask::<f32>::zeros([4, 4]));
//! assert!(matches!(result, Err(BlockSparseError::EmptyMask { .. })));
//! ```
//!
//! # Error Handling
//!
//! Mask shapes that are not a multiple of the tile shape are rejected:
//!
//! ```
//! use block_sparse_index::{compute_sparse_index, BlockSparseError, Mask};
//!
//! let mask = Mask::<bool>::zeros([4, 6]);
//! let result = compute_sparse_index(&mask, [2, 4]);
//! assert!(matches!(result, Err(BlockSparseError::DimensionMismatch { .. })));
//! ```

mod dedup;
mod dense;
mod element;
mod error;
mod indexer;
mod mask;
mod partition;
mod prefetch;
mod sparse_index;
mod tile;

pub use dedup::{DedupStrategy, DedupTable};
pub use element::MaskElement;
pub use error::{BlockSparseError, Result};
pub use indexer::{
    compute_sparse_index, BlockSparseIndexer, BlockSparseIndexerBuilder, EmptyMaskPolicy,
    IndexerOptions, ScanMode,
};
pub use mask::Mask;
pub use partition::{AxisTiling, TileCoord, TileGrid};
pub use prefetch::{GridStep, PrefetchPlan};
pub use sparse_index::{SparseIndex, TileEntry};
pub use tile::TileData;
