//! Ordered table of distinct tile contents.
//!
//! Entries keep first-seen order: the index handed out for a content never
//! changes once assigned, and no two entries are bit-for-bit equal.

use std::collections::HashMap;

use log::trace;
use mdarray::DTensor;

use crate::dense;
use crate::element::MaskElement;
use crate::tile::TileData;

/// How a tile is looked up in the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DedupStrategy {
    /// Compare against every entry in turn. O(entries) per lookup.
    Linear,
    /// Look up the full bit pattern of the tile in a hash map.
    ///
    /// The key is the content itself, so colliding hashes are told apart by
    /// key equality.
    #[default]
    Hashed,
}

/// Deduplicated tile contents in insertion order.
///
/// Filled by the indexer; callers only read it through
/// [`SparseIndex::dedup_table`](crate::SparseIndex::dedup_table).
#[derive(Debug, Clone)]
pub struct DedupTable<T: MaskElement> {
    tile_shape: [usize; 2],
    strategy: DedupStrategy,
    entries: Vec<TileData<T>>,
    index: HashMap<Vec<u64>, usize>,
}

impl<T: MaskElement> DedupTable<T> {
    /// Create an empty table for tiles of `tile_shape`.
    pub(crate) fn new(tile_shape: [usize; 2], strategy: DedupStrategy) -> Self {
        Self {
            tile_shape,
            strategy,
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }

    pub fn tile_shape(&self) -> [usize; 2] {
        self.tile_shape
    }

    pub fn strategy(&self) -> DedupStrategy {
        self.strategy
    }

    /// Number of distinct contents.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry at `index`.
    pub fn get(&self, index: usize) -> Option<&TileData<T>> {
        self.entries.get(index)
    }

    /// All entries in insertion order.
    pub fn entries(&self) -> &[TileData<T>] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = &TileData<T>> {
        self.entries.iter()
    }

    /// Index of an entry with the same content as `tile`, if any.
    pub fn find(&self, tile: &TileData<T>) -> Option<usize> {
        match self.strategy {
            DedupStrategy::Linear => self.entries.iter().position(|e| e.same_content(tile)),
            DedupStrategy::Hashed => self.index.get(&tile.content_key()).copied(),
        }
    }

    /// Register `tile`, returning its index and whether it was newly added.
    pub(crate) fn insert(&mut self, tile: TileData<T>) -> (usize, bool) {
        match self.strategy {
            DedupStrategy::Linear => match self.find(&tile) {
                Some(idx) => (idx, false),
                None => (self.push(tile, None), true),
            },
            DedupStrategy::Hashed => {
                let key = tile.content_key();
                self.insert_keyed(tile, key)
            }
        }
    }

    /// Like [`DedupTable::insert`], with the content key already computed.
    ///
    /// `key` must equal `tile.content_key()`. The linear strategy ignores it.
    pub(crate) fn insert_keyed(&mut self, tile: TileData<T>, key: Vec<u64>) -> (usize, bool) {
        if self.strategy == DedupStrategy::Linear {
            return self.insert(tile);
        }
        if let Some(&idx) = self.index.get(&key) {
            return (idx, false);
        }
        (self.push(tile, Some(key)), true)
    }

    fn push(&mut self, tile: TileData<T>, key: Option<Vec<u64>>) -> usize {
        debug_assert_eq!(tile.shape(), self.tile_shape);
        let idx = self.entries.len();
        trace!("dedup: new tile content #{idx} ({} non-zero)", tile.nnz());
        if let Some(key) = key {
            self.index.insert(key, idx);
        }
        self.entries.push(tile);
        idx
    }

    /// Stack all entries into a `(len, tile_rows, tile_cols)` tensor,
    /// preserving insertion order.
    pub fn stacked(&self) -> DTensor<T, 3> {
        let [tr, tc] = self.tile_shape;
        dense::from_fn3([self.entries.len(), tr, tc], |idx| {
            self.entries[idx[0]].get([idx[1], idx[2]])
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tile(data: [i32; 4]) -> TileData<i32> {
        TileData::from_vec(data.to_vec(), [2, 2]).unwrap()
    }

    fn check_first_seen_order(strategy: DedupStrategy) {
        let mut table = DedupTable::new([2, 2], strategy);

        assert_eq!(table.insert(tile([1, 0, 0, 0])), (0, true));
        assert_eq!(table.insert(tile([1, 1, 1, 1])), (1, true));
        assert_eq!(table.insert(tile([1, 0, 0, 0])), (0, false));
        assert_eq!(table.insert(tile([0, 0, 0, 2])), (2, true));
        assert_eq!(table.insert(tile([1, 1, 1, 1])), (1, false));

        assert_eq!(table.len(), 3);
        assert_eq!(table.find(&tile([0, 0, 0, 2])), Some(2));
        assert_eq!(table.find(&tile([9, 9, 9, 9])), None);
    }

    #[test]
    fn test_linear_first_seen_order() {
        check_first_seen_order(DedupStrategy::Linear);
    }

    #[test]
    fn test_hashed_first_seen_order() {
        check_first_seen_order(DedupStrategy::Hashed);
    }

    #[test]
    fn test_insert_keyed() {
        let mut table = DedupTable::new([2, 2], DedupStrategy::Hashed);
        let t = tile([0, 3, 0, 0]);
        let key = t.content_key();
        assert_eq!(table.insert_keyed(t.clone(), key.clone()), (0, true));
        assert_eq!(table.insert_keyed(t, key), (0, false));
    }

    #[test]
    fn test_stacked() {
        let mut table = DedupTable::new([2, 2], DedupStrategy::default());
        table.insert(tile([1, 2, 3, 4]));
        table.insert(tile([5, 6, 7, 8]));

        let stacked = table.stacked();
        assert_eq!(stacked[[0, 1, 0]], 3);
        assert_eq!(stacked[[1, 0, 1]], 6);
        assert_eq!(stacked[[1, 1, 1]], 8);
    }

    #[test]
    fn test_stacked_empty_table() {
        let table = DedupTable::<i32>::new([2, 3], DedupStrategy::default());
        assert!(table.is_empty());
        assert_eq!(table.stacked().len(), 0);
    }

    #[test]
    fn test_find_other_shape() {
        let mut table = DedupTable::new([2, 2], DedupStrategy::Hashed);
        table.insert(tile([1, 0, 0, 0]));
        let flat = TileData::from_vec(vec![1, 0, 0, 0], [1, 4]).unwrap();
        assert_eq!(table.find(&flat), None);
    }
}
