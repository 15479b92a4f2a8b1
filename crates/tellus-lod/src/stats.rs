//! Process-wide terrain statistics, shared as an explicit handle.

use std::sync::atomic::{AtomicUsize, Ordering};

/// Deepest level the per-level counters track. Nodes beyond this would be
/// sub-centimeter on an Earth-sized planet.
pub const MAX_TRACKED_LEVEL: usize = 31;

/// Counters mutated by quad nodes and read by the UI layer.
///
/// Shared as `Arc<TerrainStats>` and injected into every node; there is
/// no ambient global. Nodes update from both the main thread and the
/// background build lanes, so every counter is atomic.
#[derive(Debug)]
pub struct TerrainStats {
    node_count: AtomicUsize,
    nodes_at_level: [AtomicUsize; MAX_TRACKED_LEVEL + 1],
    pending_splits: AtomicUsize,
    pending_merges: AtomicUsize,
    splits_cancelled: AtomicUsize,
}

/// A plain copy of the counters for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub node_count: usize,
    pub nodes_at_level: Vec<usize>,
    pub pending_splits: usize,
    pub pending_merges: usize,
}

impl TerrainStats {
    #[must_use]
    pub fn new() -> Self {
        Self {
            node_count: AtomicUsize::new(0),
            nodes_at_level: std::array::from_fn(|_| AtomicUsize::new(0)),
            pending_splits: AtomicUsize::new(0),
            pending_merges: AtomicUsize::new(0),
            splits_cancelled: AtomicUsize::new(0),
        }
    }

    pub fn node_created(&self, level: u32) {
        self.node_count.fetch_add(1, Ordering::Relaxed);
        self.nodes_at_level[(level as usize).min(MAX_TRACKED_LEVEL)]
            .fetch_add(1, Ordering::Relaxed);
    }

    pub fn node_disposed(&self, level: u32) {
        self.node_count.fetch_sub(1, Ordering::Relaxed);
        self.nodes_at_level[(level as usize).min(MAX_TRACKED_LEVEL)]
            .fetch_sub(1, Ordering::Relaxed);
    }

    pub fn split_begun(&self) {
        self.pending_splits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn split_settled(&self) {
        self.pending_splits.fetch_sub(1, Ordering::Relaxed);
    }

    pub fn split_cancelled(&self) {
        self.splits_cancelled.fetch_add(1, Ordering::Relaxed);
    }

    pub fn merge_begun(&self) {
        self.pending_merges.fetch_add(1, Ordering::Relaxed);
    }

    pub fn merge_settled(&self) {
        self.pending_merges.fetch_sub(1, Ordering::Relaxed);
    }

    /// Total live node count.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.node_count.load(Ordering::Relaxed)
    }

    /// Live node count at one level.
    #[must_use]
    pub fn nodes_at_level(&self, level: u32) -> usize {
        self.nodes_at_level[(level as usize).min(MAX_TRACKED_LEVEL)].load(Ordering::Relaxed)
    }

    /// Splits currently awaiting background completion.
    #[must_use]
    pub fn pending_splits(&self) -> usize {
        self.pending_splits.load(Ordering::Relaxed)
    }

    /// Merges currently awaiting background disposal.
    #[must_use]
    pub fn pending_merges(&self) -> usize {
        self.pending_merges.load(Ordering::Relaxed)
    }

    /// Read and reset the cancelled-split counter; the UI polls this per
    /// display interval.
    #[must_use]
    pub fn take_splits_cancelled(&self) -> usize {
        self.splits_cancelled.swap(0, Ordering::Relaxed)
    }

    /// Copy the current counters for display.
    #[must_use]
    pub fn snapshot(&self) -> StatsSnapshot {
        let deepest = self
            .nodes_at_level
            .iter()
            .rposition(|c| c.load(Ordering::Relaxed) > 0)
            .map_or(0, |i| i + 1);
        StatsSnapshot {
            node_count: self.node_count(),
            nodes_at_level: self.nodes_at_level[..deepest]
                .iter()
                .map(|c| c.load(Ordering::Relaxed))
                .collect(),
            pending_splits: self.pending_splits(),
            pending_merges: self.pending_merges(),
        }
    }
}

impl Default for TerrainStats {
    fn default() -> Self {
        Self::new()
    }
}
