//! Split/merge policy: a pure decision function over mesh metrics and
//! tree state.

use tellus_mesh::QuadMesh;

/// Decides when a node should split into children or merge them away.
///
/// Implementations must be pure functions of their arguments so decisions
/// are reproducible; the node injects the policy, so it is replaceable
/// (e.g. to freeze the tree for debugging).
pub trait SplitMergeStrategy: Send + Sync {
    /// Whether a leaf should begin splitting.
    fn should_split(
        &self,
        mesh: &QuadMesh,
        has_children: bool,
        split_or_merge_in_progress: bool,
        level: u32,
        max_level: u32,
    ) -> bool;

    /// Whether a node with children should merge them away.
    fn should_merge(
        &self,
        mesh: &QuadMesh,
        has_children: bool,
        split_or_merge_in_progress: bool,
    ) -> bool;
}

/// The default policy: split when a mesh is visible and closer than its
/// own width, merge when that stops being true.
///
/// The two predicates are complements over the close-and-visible
/// condition, so they are never simultaneously true for one state.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultSplitMergeStrategy;

impl DefaultSplitMergeStrategy {
    fn close_and_visible(mesh: &QuadMesh) -> bool {
        mesh.is_visible_to_camera() && mesh.camera_distance_to_width_ratio() < 1.0
    }
}

impl SplitMergeStrategy for DefaultSplitMergeStrategy {
    fn should_split(
        &self,
        mesh: &QuadMesh,
        has_children: bool,
        split_or_merge_in_progress: bool,
        level: u32,
        max_level: u32,
    ) -> bool {
        !has_children
            && !split_or_merge_in_progress
            && Self::close_and_visible(mesh)
            && level < max_level
    }

    fn should_merge(
        &self,
        mesh: &QuadMesh,
        has_children: bool,
        split_or_merge_in_progress: bool,
    ) -> bool {
        has_children && !split_or_merge_in_progress && !Self::close_and_visible(mesh)
    }
}
