//! Block-sparse index computation.
//!
//! The mask is scanned tile by tile in descending row-major order. An explicit
//! accumulator carries the most recently seen active tile backwards through the
//! scan, so each inactive tile learns which active tile comes next in ascending
//! order. Active tile contents are deduplicated in first-seen order.

use log::debug;
use rayon::prelude::*;

use crate::dedup::{DedupStrategy, DedupTable};
use crate::element::MaskElement;
use crate::error::{BlockSparseError, Result};
use crate::mask::Mask;
use crate::partition::{AxisTiling, TileCoord, TileGrid};
use crate::sparse_index::{SparseIndex, TileEntry};
use crate::tile::TileData;

/// What to do when no tile of the mask is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EmptyMaskPolicy {
    /// Succeed with an empty dedup table. Every tile points at the bottom-right
    /// tile with content index 0, which is not a valid table entry.
    #[default]
    Sentinel,
    /// Fail with [`BlockSparseError::EmptyMask`].
    Reject,
}

/// How per-tile work is scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScanMode {
    /// One pass over the tiles in scan order.
    #[default]
    Sequential,
    /// Tile activity and content keys are computed in parallel, then a
    /// sequential suffix fold assigns next-active tiles and table indices.
    ///
    /// Produces exactly the same index as `Sequential`.
    Parallel,
}

/// Options for block-sparse index computation.
#[derive(Debug, Clone, Default)]
pub struct IndexerOptions {
    /// Behavior for masks without any active tile.
    pub empty_mask: EmptyMaskPolicy,
    /// Lookup strategy of the dedup table.
    pub dedup: DedupStrategy,
    /// Sequential or parallel scan.
    pub scan: ScanMode,
}

/// Most recent active tile seen by the scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ActiveRef {
    tile: TileCoord,
    content_index: usize,
}

/// Scan accumulator. `None` until the first active tile is seen.
type ScanState = Option<ActiveRef>;

/// Result of probing one tile before it enters the fold.
struct Probe<T: MaskElement> {
    tile: TileData<T>,
    key: Option<Vec<u64>>,
}

/// Computes block-sparse indices for masks with a fixed tile shape.
///
/// # Example
/// ```
/// use block_sparse_index::{BlockSparseIndexer, DedupStrategy, Mask, TileCoord};
///
/// let indexer = BlockSparseIndexer::builder([2, 2])
///     .with_dedup_strategy(DedupStrategy::Linear)
///     .build()
///     .unwrap();
///
/// let mask = Mask::from_rows(vec![
///     vec![0, 0, 0, 0],
///     vec![0, 0, 0, 0],
///     vec![0, 0, 0, 0],
///     vec![0, 0, 0, 5],
/// ])
/// .unwrap();
///
/// let index = indexer.compute(&mask).unwrap();
/// assert_eq!(index.num_active_tiles(), 1);
/// assert_eq!(index.next_active(TileCoord::new(0, 0)), TileCoord::new(1, 1));
/// ```
#[derive(Debug, Clone)]
pub struct BlockSparseIndexer {
    tile_shape: [usize; 2],
    options: IndexerOptions,
}

impl BlockSparseIndexer {
    /// Create an indexer, validating the tile shape.
    pub fn new(tile_shape: [usize; 2], options: Option<IndexerOptions>) -> Result<Self> {
        // Divisibility against a mask is checked per computation.
        AxisTiling::new("row", 0, tile_shape[0])?;
        AxisTiling::new("column", 0, tile_shape[1])?;
        Ok(Self {
            tile_shape,
            options: options.unwrap_or_default(),
        })
    }

    /// Create a new builder for a `[tile_rows, tile_cols]` tile shape.
    pub fn builder(tile_shape: [usize; 2]) -> BlockSparseIndexerBuilder {
        BlockSparseIndexerBuilder::new(tile_shape)
    }

    /// Tile shape `[tile_rows, tile_cols]`.
    pub fn tile_shape(&self) -> [usize; 2] {
        self.tile_shape
    }

    pub fn options(&self) -> &IndexerOptions {
        &self.options
    }

    /// Compute the block-sparse index of `mask`.
    ///
    /// Fails with `DimensionMismatch` if the mask shape is not a multiple of the
    /// tile shape, and with `EmptyMask` if no tile is active and the policy is
    /// [`EmptyMaskPolicy::Reject`]. No partial result is ever returned.
    pub fn compute<T: MaskElement>(&self, mask: &Mask<T>) -> Result<SparseIndex<T>> {
        let grid = mask.tile_grid(self.tile_shape)?;
        let mut table = DedupTable::new(self.tile_shape, self.options.dedup);

        let entries = match self.options.scan {
            ScanMode::Sequential => {
                let probes = grid
                    .traversal_order()
                    .map(|coord| (coord, probe_tile(mask, &grid, coord, false)));
                fold_scan(&grid, probes, &mut table)
            }
            ScanMode::Parallel => {
                // Only the hashed table looks keys up.
                let keyed = self.options.dedup == DedupStrategy::Hashed;
                let probes: Vec<Option<Probe<T>>> = (0..grid.num_tiles())
                    .into_par_iter()
                    .map(|linear| probe_tile(mask, &grid, grid.coord(linear), keyed))
                    .collect();
                // Reverse linear order is the scan order.
                let probes = probes
                    .into_iter()
                    .enumerate()
                    .rev()
                    .map(|(linear, probe)| (grid.coord(linear), probe));
                fold_scan(&grid, probes, &mut table)
            }
        };

        let num_active = entries.iter().filter(|e| e.active).count();
        let [tile_rows, tile_cols] = grid.shape();
        if num_active == 0 {
            if self.options.empty_mask == EmptyMaskPolicy::Reject {
                return Err(BlockSparseError::EmptyMask {
                    tile_rows,
                    tile_cols,
                });
            }
            debug!(
                "mask {:?} has no active tile; all {} tiles point at sentinel {:?}",
                grid.mask_shape(),
                grid.num_tiles(),
                grid.last_tile()
            );
        }

        debug!(
            "indexed mask {:?} into {}x{} tiles: {} active, {} distinct contents ({:?}, {:?})",
            grid.mask_shape(),
            tile_rows,
            tile_cols,
            num_active,
            table.len(),
            self.options.dedup,
            self.options.scan
        );

        Ok(SparseIndex::from_parts(grid, entries, table))
    }
}

/// Builder for [`BlockSparseIndexer`].
#[derive(Debug, Clone)]
pub struct BlockSparseIndexerBuilder {
    tile_shape: [usize; 2],
    options: IndexerOptions,
}

impl BlockSparseIndexerBuilder {
    /// Create a new builder with default options.
    pub fn new(tile_shape: [usize; 2]) -> Self {
        Self {
            tile_shape,
            options: IndexerOptions::default(),
        }
    }

    /// Set the empty-mask policy.
    pub fn with_empty_mask_policy(mut self, policy: EmptyMaskPolicy) -> Self {
        self.options.empty_mask = policy;
        self
    }

    /// Set the dedup lookup strategy.
    pub fn with_dedup_strategy(mut self, strategy: DedupStrategy) -> Self {
        self.options.dedup = strategy;
        self
    }

    /// Set the scan mode.
    pub fn with_scan_mode(mut self, scan: ScanMode) -> Self {
        self.options.scan = scan;
        self
    }

    /// Build the indexer.
    pub fn build(self) -> Result<BlockSparseIndexer> {
        BlockSparseIndexer::new(self.tile_shape, Some(self.options))
    }
}

/// Compute the block-sparse index of `mask` with default options.
///
/// Tiles of `block_shape` must divide the mask evenly.
pub fn compute_sparse_index<T: MaskElement>(
    mask: &Mask<T>,
    block_shape: [usize; 2],
) -> Result<SparseIndex<T>> {
    BlockSparseIndexer::new(block_shape, None)?.compute(mask)
}

/// Extract one tile; `None` if it is inactive.
///
/// With `keyed`, the content key is computed up front for a hashed table.
fn probe_tile<T: MaskElement>(
    mask: &Mask<T>,
    grid: &TileGrid,
    coord: TileCoord,
    keyed: bool,
) -> Option<Probe<T>> {
    let tile = mask.tile_at(grid, coord);
    if !tile.is_active() {
        return None;
    }
    let key = keyed.then(|| tile.content_key());
    Some(Probe { tile, key })
}

/// Fold probed tiles, given in scan order, into per-tile entries.
///
/// Entries are returned in row-major linear order.
fn fold_scan<T, I>(grid: &TileGrid, probes: I, table: &mut DedupTable<T>) -> Vec<TileEntry>
where
    T: MaskElement,
    I: Iterator<Item = (TileCoord, Option<Probe<T>>)>,
{
    let sentinel = TileEntry {
        active: false,
        content_index: 0,
        next: grid.last_tile(),
    };
    let mut entries = vec![sentinel; grid.num_tiles()];

    let state: ScanState = None;
    probes.fold(state, |state, (coord, probe)| {
        let seen = probe.map(|Probe { tile, key }| {
            let (content_index, _) = match key {
                Some(key) => table.insert_keyed(tile, key),
                None => table.insert(tile),
            };
            ActiveRef {
                tile: coord,
                content_index,
            }
        });
        let active = seen.is_some();
        let state = seen.or(state);

        if let Some(current) = state {
            entries[grid.linear_index(coord)] = TileEntry {
                active,
                content_index: current.content_index,
                next: current.tile,
            };
        }
        state
    });

    entries
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scenario_mask() -> Mask<i32> {
        Mask::from_rows(vec![
            vec![1, 0, 0, 0],
            vec![0, 0, 0, 0],
            vec![0, 0, 1, 1],
            vec![0, 0, 1, 1],
        ])
        .unwrap()
    }

    #[test]
    fn test_builder_defaults() {
        let indexer = BlockSparseIndexer::builder([2, 4]).build().unwrap();
        assert_eq!(indexer.tile_shape(), [2, 4]);
        assert_eq!(indexer.options().empty_mask, EmptyMaskPolicy::Sentinel);
        assert_eq!(indexer.options().dedup, DedupStrategy::Hashed);
        assert_eq!(indexer.options().scan, ScanMode::Sequential);
    }

    #[test]
    fn test_builder_rejects_zero_tile() {
        let err = BlockSparseIndexer::builder([2, 0]).build().unwrap_err();
        assert_eq!(err, BlockSparseError::ZeroTileExtent { axis: "column" });
    }

    #[test]
    fn test_fold_scan_scenario() {
        let mask = scenario_mask();
        let grid = mask.tile_grid([2, 2]).unwrap();
        let mut table = DedupTable::new([2, 2], DedupStrategy::Linear);
        let probes = grid
            .traversal_order()
            .map(|coord| (coord, probe_tile(&mask, &grid, coord, false)));

        let entries = fold_scan(&grid, probes, &mut table);

        let next: Vec<_> = entries.iter().map(|e| (e.next.row, e.next.col)).collect();
        assert_eq!(next, vec![(0, 0), (1, 1), (1, 1), (1, 1)]);
        let content: Vec<_> = entries.iter().map(|e| e.content_index).collect();
        assert_eq!(content, vec![1, 0, 0, 0]);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_probe_tile_keys_only_when_asked() {
        let mask = scenario_mask();
        let grid = mask.tile_grid([2, 2]).unwrap();

        assert!(probe_tile(&mask, &grid, TileCoord::new(0, 1), true).is_none());

        let unkeyed = probe_tile(&mask, &grid, TileCoord::new(1, 1), false).unwrap();
        assert!(unkeyed.key.is_none());
        let keyed = probe_tile(&mask, &grid, TileCoord::new(1, 1), true).unwrap();
        assert_eq!(keyed.key, Some(keyed.tile.content_key()));
    }

    #[test]
    fn test_parallel_linear_matches_sequential() {
        let mask = scenario_mask();
        let seq = BlockSparseIndexer::builder([2, 2])
            .with_dedup_strategy(DedupStrategy::Linear)
            .build()
            .unwrap();
        let par = BlockSparseIndexer::builder([2, 2])
            .with_dedup_strategy(DedupStrategy::Linear)
            .with_scan_mode(ScanMode::Parallel)
            .build()
            .unwrap();
        assert_eq!(
            seq.compute(&mask).unwrap().entries(),
            par.compute(&mask).unwrap().entries()
        );
    }

    #[test]
    fn test_trailing_inactive_tiles_keep_sentinel() {
        // Only the top-left tile is active; everything after it in
        // ascending order has no upcoming active tile.
        let mask = Mask::from_fn([4, 4], |i, j| i == 0 && j == 0);
        let index = compute_sparse_index(&mask, [2, 2]).unwrap();

        assert_eq!(index.next_active(TileCoord::new(0, 0)), TileCoord::new(0, 0));
        for coord in [TileCoord::new(0, 1), TileCoord::new(1, 0), TileCoord::new(1, 1)] {
            assert_eq!(index.next_active(coord), TileCoord::new(1, 1));
            assert_eq!(index.content_index(coord), 0);
        }
        assert_eq!(index.sentinel_tiles(), 3);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let mask = Mask::from_fn([8, 12], |i, j| ((i * 7 + j * 3) % 5 == 0) as u8);
        let seq = BlockSparseIndexer::builder([2, 3]).build().unwrap();
        let par = BlockSparseIndexer::builder([2, 3])
            .with_scan_mode(ScanMode::Parallel)
            .build()
            .unwrap();

        let a = seq.compute(&mask).unwrap();
        let b = par.compute(&mask).unwrap();
        assert_eq!(a.entries(), b.entries());
        assert_eq!(a.dedup_table().len(), b.dedup_table().len());
    }

    #[test]
    fn test_dimension_mismatch() {
        let mask = Mask::<bool>::zeros([4, 6]);
        let err = compute_sparse_index(&mask, [2, 4]).unwrap_err();
        assert_eq!(
            err,
            BlockSparseError::DimensionMismatch {
                axis: "column",
                extent: 6,
                tile: 4
            }
        );
    }
}
