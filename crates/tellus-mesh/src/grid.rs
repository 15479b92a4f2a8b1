//! Shared triangle-index topology for terrain grid meshes.

use std::sync::{Arc, OnceLock};

/// Vertices per grid edge. Must be of the form `2^n + 1` so that child
/// meshes subdivide cleanly along parent edges.
pub const GRID_SIZE: usize = 65;

static GRID_INDICES: OnceLock<Arc<[u32]>> = OnceLock::new();

/// The shared triangle index buffer for `GRID_SIZE`×`GRID_SIZE` meshes.
///
/// Topology is identical for every mesh at a given resolution, so it is
/// built once on first use and shared read-only by all meshes.
///
/// # Panics
///
/// Panics if `GRID_SIZE` is not of the form `2^n + 1`. That is a
/// programmer error, not a runtime condition.
pub fn shared_grid_indices() -> Arc<[u32]> {
    Arc::clone(GRID_INDICES.get_or_init(|| build_grid_indices(GRID_SIZE).into()))
}

fn build_grid_indices(grid_size: usize) -> Vec<u32> {
    assert!(
        grid_size >= 3 && (grid_size - 1).is_power_of_two(),
        "grid size must be 2^n + 1, got {grid_size}"
    );

    let quads_per_edge = grid_size - 1;
    let mut indices = Vec::with_capacity(quads_per_edge * quads_per_edge * 6);

    for row in 0..quads_per_edge {
        for col in 0..quads_per_edge {
            let top_left = (row * grid_size + col) as u32;
            let top_right = top_left + 1;
            let bottom_left = top_left + grid_size as u32;
            let bottom_right = bottom_left + 1;

            indices.extend_from_slice(&[top_left, top_right, bottom_left]);
            indices.extend_from_slice(&[top_right, bottom_right, bottom_left]);
        }
    }

    indices
}
