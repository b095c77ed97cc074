//! Forward walk of a block-sparse index.
//!
//! A tiled execution engine iterates the tile grid in ascending row-major
//! order. At every step it computes only if the tile is active, and it fetches
//! the tile named by the prefetch maps instead of the current one. Consecutive
//! steps with the same fetch target reuse the buffer already in flight, so the
//! engine issues one transfer per change of target. `PrefetchPlan` replays that
//! walk on the host; it never moves data itself.

use crate::element::MaskElement;
use crate::partition::TileCoord;
use crate::sparse_index::SparseIndex;

/// One step of the engine's grid walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridStep {
    /// Grid coordinate being visited.
    pub tile: TileCoord,
    /// Whether the engine computes at this step.
    pub compute: bool,
    /// Tile whose backing store is fetched for this step.
    pub fetch: TileCoord,
    /// Dedup table entry of the fetched content.
    pub content_index: usize,
}

/// Host-side replay of the grid walk over a [`SparseIndex`].
#[derive(Debug, Clone, Copy)]
pub struct PrefetchPlan<'a, T: MaskElement> {
    index: &'a SparseIndex<T>,
}

impl<'a, T: MaskElement> PrefetchPlan<'a, T> {
    pub fn new(index: &'a SparseIndex<T>) -> Self {
        Self { index }
    }

    /// Steps in ascending row-major order.
    pub fn steps(&self) -> impl Iterator<Item = GridStep> + 'a {
        let index = self.index;
        index
            .grid()
            .forward_order()
            .zip(index.entries())
            .map(|(tile, entry)| GridStep {
                tile,
                compute: entry.active,
                fetch: entry.next,
                content_index: entry.content_index,
            })
    }

    /// Fetch targets with consecutive repeats collapsed.
    pub fn fetch_sequence(&self) -> Vec<TileCoord> {
        let mut targets: Vec<TileCoord> = Vec::new();
        for step in self.steps() {
            if targets.last() != Some(&step.fetch) {
                targets.push(step.fetch);
            }
        }
        targets
    }

    /// Number of transfers the engine issues over the whole walk.
    pub fn issued_fetches(&self) -> usize {
        self.fetch_sequence().len()
    }

    /// Number of steps that do no compute.
    pub fn skipped_steps(&self) -> usize {
        self.steps().filter(|s| !s.compute).count()
    }
}
