//! Vertex format for terrain grid meshes.

use bytemuck::{Pod, Zeroable};

/// Terrain mesh vertex: position, normal, and color.
///
/// Positions are mesh-local, centered at the owning node's real-space
/// location rather than the planet center, so they stay well inside f32
/// precision at planetary scale; the renderer translates by the node
/// location at draw time.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct TerrainVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub color: [f32; 4],
}

/// Stride must stay in sync with any render pipeline layout built on it.
const _: () = assert!(std::mem::size_of::<TerrainVertex>() == 40);
