//! Area-corrected cube-to-sphere projection.
//!
//! A naive `normalize()` of cube-surface points bunches vertices toward the
//! face centers; the analytic mapping used here corrects for that area
//! distortion so terrain cells stay near-uniform across a face.

use glam::DVec3;

use crate::{Extents, FaceOrientation};

/// Map a point on the surface of the `[-1, 1]` cube onto the unit sphere
/// with minimal area distortion:
///
/// ```text
/// sx = x * sqrt(1 - y²/2 - z²/2 + y²z²/3)
/// sy = y * sqrt(1 - x²/2 - z²/2 + x²z²/3)
/// sz = z * sqrt(1 - x²/2 - y²/2 + x²y²/3)
/// ```
#[inline]
#[must_use]
pub fn cube_to_sphere(cube_point: DVec3) -> DVec3 {
    let x2 = cube_point.x * cube_point.x;
    let y2 = cube_point.y * cube_point.y;
    let z2 = cube_point.z * cube_point.z;

    DVec3::new(
        cube_point.x * (1.0 - y2 / 2.0 - z2 / 2.0 + y2 * z2 / 3.0).sqrt(),
        cube_point.y * (1.0 - x2 / 2.0 - z2 / 2.0 + x2 * z2 / 3.0).sqrt(),
        cube_point.z * (1.0 - x2 / 2.0 - y2 / 2.0 + x2 * y2 / 3.0).sqrt(),
    )
}

/// Project a face parameter point `(u, v)` through the cube surface onto
/// the unit sphere.
///
/// The parameter origin `(0, 0)` maps exactly to the face normal.
#[inline]
#[must_use]
pub fn plane_to_sphere(orientation: &FaceOrientation, u: f64, v: f64) -> DVec3 {
    let cube_point = orientation.normal + u * orientation.u + v * orientation.v;
    cube_to_sphere(cube_point)
}

/// The real-space location of a quad node relative to the planet center:
/// the extents' center projected onto the sphere and scaled by the planet
/// radius (no height term).
///
/// Split/merge decisions, visibility, and clipping-plane logic all depend
/// on this mapping being stable, so it is computed from the extents alone.
#[inline]
#[must_use]
pub fn node_location(orientation: &FaceOrientation, extents: &Extents, radius: f64) -> DVec3 {
    let (u, v) = extents.center();
    plane_to_sphere(orientation, u, v) * radius
}
