//! Cube-sphere geometry: the six cube faces, parameter-plane extents,
//! and the area-corrected cube-to-sphere projection.

mod cube_face;
mod extents;
mod projection;

pub use cube_face::{CubeFace, FaceOrientation};
pub use extents::Extents;
pub use projection::{cube_to_sphere, node_location, plane_to_sphere};
