//! The computed block-sparse index.

use mdarray::DTensor;

use crate::dedup::DedupTable;
use crate::dense;
use crate::element::MaskElement;
use crate::error::Result;
use crate::mask::Mask;
use crate::partition::{TileCoord, TileGrid};
use crate::prefetch::PrefetchPlan;
use crate::tile::TileData;

/// Everything recorded for one tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileEntry {
    /// True iff the tile holds at least one non-zero element.
    pub active: bool,
    /// Dedup table index of the content to use for this tile.
    pub content_index: usize,
    /// Nearest active tile at or after this one in ascending row-major order.
    pub next: TileCoord,
}

/// Block-sparse index of a mask: activity flags, prefetch maps and the
/// deduplicated table of active tile contents.
///
/// All grid arrays share the tile grid's shape. Produced once by
/// [`BlockSparseIndexer::compute`](crate::BlockSparseIndexer::compute) and
/// never mutated.
#[derive(Debug, Clone)]
pub struct SparseIndex<T: MaskElement> {
    grid: TileGrid,
    entries: Vec<TileEntry>,
    active: DTensor<bool, 2>,
    content_index: DTensor<usize, 2>,
    next_row: DTensor<usize, 2>,
    next_col: DTensor<usize, 2>,
    table: DedupTable<T>,
    num_active: usize,
    sentinel_tiles: usize,
}

impl<T: MaskElement> SparseIndex<T> {
    /// Assemble an index from row-major per-tile entries.
    pub(crate) fn from_parts(grid: TileGrid, entries: Vec<TileEntry>, table: DedupTable<T>) -> Self {
        debug_assert_eq!(entries.len(), grid.num_tiles());
        let shape = grid.shape();
        let at = |idx: &[usize]| entries[idx[0] * shape[1] + idx[1]];

        let active = dense::from_fn2(shape, |idx| at(idx).active);
        let content_index = dense::from_fn2(shape, |idx| at(idx).content_index);
        let next_row = dense::from_fn2(shape, |idx| at(idx).next.row);
        let next_col = dense::from_fn2(shape, |idx| at(idx).next.col);

        let num_active = entries.iter().filter(|e| e.active).count();
        // Tiles scanned before the first active tile never saw one.
        let sentinel_tiles = match entries.iter().rposition(|e| e.active) {
            Some(last_active) => entries.len() - 1 - last_active,
            None => entries.len(),
        };

        Self {
            grid,
            entries,
            active,
            content_index,
            next_row,
            next_col,
            table,
            num_active,
            sentinel_tiles,
        }
    }

    /// The tile grid.
    pub fn grid(&self) -> &TileGrid {
        &self.grid
    }

    /// Number of tiles along each axis.
    pub fn shape(&self) -> [usize; 2] {
        self.grid.shape()
    }

    /// Per-tile active flags.
    pub fn active_flags(&self) -> &DTensor<bool, 2> {
        &self.active
    }

    /// Per-tile dedup table index.
    pub fn content_indices(&self) -> &DTensor<usize, 2> {
        &self.content_index
    }

    /// Per-tile row of the next active tile.
    pub fn next_active_rows(&self) -> &DTensor<usize, 2> {
        &self.next_row
    }

    /// Per-tile column of the next active tile.
    pub fn next_active_cols(&self) -> &DTensor<usize, 2> {
        &self.next_col
    }

    /// Per-tile entries in row-major order.
    pub fn entries(&self) -> &[TileEntry] {
        &self.entries
    }

    /// Entry of one tile, checking bounds.
    pub fn entry(&self, coord: TileCoord) -> Result<TileEntry> {
        self.grid.check(coord)?;
        Ok(self.entries[self.grid.linear_index(coord)])
    }

    /// # Panics
    /// Panics if `coord` is outside the tile grid.
    pub fn is_active(&self, coord: TileCoord) -> bool {
        self.active[[coord.row, coord.col]]
    }

    /// # Panics
    /// Panics if `coord` is outside the tile grid.
    pub fn content_index(&self, coord: TileCoord) -> usize {
        self.content_index[[coord.row, coord.col]]
    }

    /// # Panics
    /// Panics if `coord` is outside the tile grid.
    pub fn next_active(&self, coord: TileCoord) -> TileCoord {
        TileCoord::new(
            self.next_row[[coord.row, coord.col]],
            self.next_col[[coord.row, coord.col]],
        )
    }

    /// Content of an active tile, `None` for inactive or out-of-bounds tiles.
    pub fn tile(&self, coord: TileCoord) -> Option<&TileData<T>> {
        let entry = self.entry(coord).ok()?;
        if entry.active {
            self.table.get(entry.content_index)
        } else {
            None
        }
    }

    /// Active tiles in ascending row-major order.
    pub fn active_tiles(&self) -> Vec<TileCoord> {
        self.grid
            .forward_order()
            .zip(&self.entries)
            .filter(|(_, e)| e.active)
            .map(|(coord, _)| coord)
            .collect()
    }

    pub fn num_active_tiles(&self) -> usize {
        self.num_active
    }

    pub fn num_tiles(&self) -> usize {
        self.grid.num_tiles()
    }

    /// Fraction of active tiles. Zero for a grid without tiles.
    pub fn density(&self) -> f64 {
        if self.num_tiles() == 0 {
            0.0
        } else {
            self.num_active as f64 / self.num_tiles() as f64
        }
    }

    /// True iff no tile is active.
    pub fn is_empty_mask(&self) -> bool {
        self.num_active == 0
    }

    /// Number of inactive tiles with no active tile after them in ascending
    /// order. These point at the bottom-right tile with content index 0.
    pub fn sentinel_tiles(&self) -> usize {
        self.sentinel_tiles
    }

    /// Whether any tile carries the sentinel instead of a real active tile.
    pub fn used_sentinel(&self) -> bool {
        self.sentinel_tiles > 0
    }

    /// Deduplicated active tile contents.
    pub fn dedup_table(&self) -> &DedupTable<T> {
        &self.table
    }

    /// Dedup table stacked into a `(len, tile_rows, tile_cols)` tensor.
    pub fn stacked_tiles(&self) -> DTensor<T, 3> {
        self.table.stacked()
    }

    /// Rebuild a dense mask from the dedup table.
    ///
    /// Inactive tiles are filled with the canonical zero, so inactive tiles
    /// holding e.g. `-0.0` come back as `0.0`.
    pub fn to_dense(&self) -> Mask<T> {
        let [tr, tc] = self.grid.tile_shape();
        Mask::from_fn(self.grid.mask_shape(), |i, j| {
            let coord = TileCoord::new(i / tr, j / tc);
            match self.tile(coord) {
                Some(tile) => tile.get([i % tr, j % tc]),
                None => T::zero_value(),
            }
        })
    }

    /// Forward walk of the tile grid as a tiled execution engine would see it.
    pub fn prefetch_plan(&self) -> PrefetchPlan<'_, T> {
        PrefetchPlan::new(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BlockSparseError;
    use crate::indexer::compute_sparse_index;

    fn index() -> SparseIndex<u8> {
        // Tile grid 2x3, tiles (0,1) and (1,0) active with equal content
        let mask = Mask::from_rows(vec![
            vec![0, 0, 7, 1, 0, 0],
            vec![0, 0, 0, 0, 0, 0],
            vec![7, 1, 0, 0, 0, 0],
            vec![0, 0, 0, 0, 0, 0],
        ])
        .unwrap();
        compute_sparse_index(&mask, [2, 2]).unwrap()
    }

    #[test]
    fn test_grid_arrays_share_shape() {
        let index = index();
        assert_eq!(index.shape(), [2, 3]);
        assert!(index.active_flags()[[1, 0]]);
        assert_eq!(index.content_indices()[[0, 1]], 0);
        assert_eq!(index.next_active_rows()[[0, 0]], 0);
        assert_eq!(index.next_active_cols()[[0, 0]], 1);
    }

    #[test]
    fn test_equal_contents_share_entry() {
        let index = index();
        assert_eq!(index.active_tiles(), vec![TileCoord::new(0, 1), TileCoord::new(1, 0)]);
        assert_eq!(index.dedup_table().len(), 1);
        assert_eq!(index.tile(TileCoord::new(0, 1)).unwrap().to_vec(), vec![7, 1, 0, 0]);
    }

    #[test]
    fn test_entry_out_of_bounds() {
        let index = index();
        assert!(matches!(
            index.entry(TileCoord::new(0, 3)),
            Err(BlockSparseError::TileOutOfBounds { .. })
        ));
        assert!(index.tile(TileCoord::new(5, 5)).is_none());
    }

    #[test]
    fn test_density_and_sentinel() {
        let index = index();
        assert_eq!(index.num_active_tiles(), 2);
        assert!((index.density() - 2.0 / 6.0).abs() < 1e-12);
        // (1,1) and (1,2) come after the last active tile
        assert_eq!(index.sentinel_tiles(), 2);
        assert_eq!(index.next_active(TileCoord::new(1, 1)), TileCoord::new(1, 2));
    }

    #[test]
    fn test_to_dense_round_trip() {
        let mask = Mask::from_fn([4, 6], |i, j| ((i + 2 * j) % 3) as i64);
        let index = compute_sparse_index(&mask, [2, 3]).unwrap();
        assert_eq!(index.to_dense().to_vec(), mask.to_vec());
    }

    #[test]
    fn test_stacked_tiles_order() {
        let index = index();
        let stacked = index.stacked_tiles();
        assert_eq!(stacked[[0, 0, 0]], 7);
        assert_eq!(stacked[[0, 0, 1]], 1);
    }
}
