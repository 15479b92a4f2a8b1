//! Terrain grid meshes: vertex format, shared index topology, the
//! per-node `QuadMesh` with its visibility/distance metrics, the
//! per-frame clipping-plane accumulator, and the renderer contracts.

mod clipping;
mod grid;
mod quad_mesh;
mod renderer;
mod vertex;

pub use clipping::ClippingPlanes;
pub use grid::{GRID_SIZE, shared_grid_indices};
pub use quad_mesh::{BoundaryPainting, HEIGHT_SCALE, QuadMesh};
pub use renderer::{
    MeshRenderer, NullRenderer, NullRendererFactory, RendererCounters, RendererFactory,
};
pub use vertex::TerrainVertex;
