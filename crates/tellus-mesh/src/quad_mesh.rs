//! The per-node terrain grid mesh and its per-frame camera metrics.

use std::sync::Arc;

use glam::{DVec3, Vec3};
use tellus_cubesphere::{Extents, FaceOrientation, node_location, plane_to_sphere};
use tellus_terrain::HeightSource;

use crate::grid::{GRID_SIZE, shared_grid_indices};
use crate::{ClippingPlanes, TerrainVertex};

/// Height magnitude passed to the oracle for every mesh sample.
pub const HEIGHT_SCALE: f64 = 8000.0;

/// Horizon-test safety margin: the horizon is computed against a planet
/// slightly smaller than the real one so patches straddling the limb are
/// kept rather than clipped. Known to under-cull near the horizon at high
/// altitude; that trade-off is intentional.
const HORIZON_RADIUS_MARGIN: f64 = 0.99;

const WATER_COLOR: [f32; 4] = [0.17, 0.30, 0.49, 1.0];
const LAND_COLOR: [f32; 4] = [0.34, 0.44, 0.26, 1.0];
const FACE_EDGE_COLOR: [f32; 4] = [0.0, 1.0, 0.0, 1.0];
const INNER_EDGE_COLOR: [f32; 4] = [1.0, 0.0, 0.0, 1.0];

/// Debug colorizer for quad boundaries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BoundaryPainting {
    /// Normal height-based coloring only.
    Off,
    /// Paint the four border rows/columns: green where that edge lies on
    /// the face's root boundary, red otherwise.
    Edges,
}

/// A fixed-resolution terrain grid mesh for one quad node.
///
/// Geometry is generated once at construction (the expensive part of a
/// split) and immutable afterwards; only the derived camera metrics change
/// per frame. Distance and visibility queries use 5 sampled vertices (the
/// four corners plus the center) instead of scanning the whole grid.
pub struct QuadMesh {
    vertices: Vec<TerrainVertex>,
    indices: Arc<[u32]>,
    /// Corner and center vertices, planet-relative, with height applied.
    samples: [DVec3; 5],
    /// Node center, planet-relative (radius-scaled, no height term).
    location: DVec3,
    /// Extents width in real-space units.
    width_real: f64,
    radius: f64,
    is_visible: bool,
    distance_ratio: f64,
    closest_distance: f64,
    farthest_distance: f64,
}

impl QuadMesh {
    /// Generate the grid mesh for a node.
    ///
    /// Samples the height oracle at every grid point, projects through the
    /// area-corrected cube-sphere mapping, extrudes to `radius + height`,
    /// and translates into mesh-local space around the node center.
    pub fn build(
        radius: f64,
        orientation: &FaceOrientation,
        extents: &Extents,
        level: u32,
        height_source: &dyn HeightSource,
        boundary: BoundaryPainting,
    ) -> QuadMesh {
        let indices = shared_grid_indices();
        let location = node_location(orientation, extents, radius);
        let stride = extents.width() / (GRID_SIZE - 1) as f64;

        let mut positions = Vec::with_capacity(GRID_SIZE * GRID_SIZE);
        let mut heights = Vec::with_capacity(GRID_SIZE * GRID_SIZE);
        for row in 0..GRID_SIZE {
            let v = extents.north + row as f64 * stride;
            for col in 0..GRID_SIZE {
                let u = extents.west + col as f64 * stride;
                let sphere = plane_to_sphere(orientation, u, v);
                let height = height_source.height(sphere, level, HEIGHT_SCALE);
                positions.push(sphere * (radius + height));
                heights.push(height);
            }
        }

        let samples = corner_and_center_samples(&positions);
        let normals = accumulate_normals(&positions, &indices);

        let mut vertices = Vec::with_capacity(positions.len());
        for (i, real) in positions.iter().enumerate() {
            let local = real - location;
            vertices.push(TerrainVertex {
                position: [local.x as f32, local.y as f32, local.z as f32],
                normal: normals[i].to_array(),
                color: if heights[i] < 0.0 {
                    WATER_COLOR
                } else {
                    LAND_COLOR
                },
            });
        }

        if boundary == BoundaryPainting::Edges {
            paint_quad_boundaries(&mut vertices, extents);
        }

        QuadMesh {
            vertices,
            indices,
            samples,
            location,
            width_real: extents.width() * radius,
            radius,
            is_visible: false,
            distance_ratio: f64::INFINITY,
            closest_distance: f64::INFINITY,
            farthest_distance: f64::INFINITY,
        }
    }

    /// Refresh camera distance and visibility metrics, widening the
    /// clipping accumulator if this mesh is visible.
    pub fn update(
        &mut self,
        camera_location: DVec3,
        planet_center: DVec3,
        clipping: &ClippingPlanes,
    ) {
        let mut closest_sq = f64::INFINITY;
        let mut farthest_sq = f64::NEG_INFINITY;
        let mut closest_sample = self.samples[0];
        for sample in self.samples {
            let d_sq = (planet_center + sample - camera_location).length_squared();
            if d_sq < closest_sq {
                closest_sq = d_sq;
                closest_sample = sample;
            }
            if d_sq > farthest_sq {
                farthest_sq = d_sq;
            }
        }
        self.closest_distance = closest_sq.sqrt();
        self.farthest_distance = farthest_sq.sqrt();
        self.distance_ratio = self.closest_distance / self.width_real;

        self.is_visible = self.above_horizon(camera_location, planet_center, closest_sample);
        if self.is_visible {
            clipping.widen(self.closest_distance, self.farthest_distance);
        }
    }

    /// Horizon test against the closest sample point.
    ///
    /// A camera below `HORIZON_RADIUS_MARGIN * radius` makes the `acos`
    /// argument exceed 1; the NaN angle then compares as not-visible.
    fn above_horizon(
        &self,
        camera_location: DVec3,
        planet_center: DVec3,
        closest_sample: DVec3,
    ) -> bool {
        let planet_to_camera = camera_location - planet_center;
        let camera_distance = planet_to_camera.length();

        let horizon_angle = (HORIZON_RADIUS_MARGIN * self.radius / camera_distance).acos();
        let angle_to_sample = planet_to_camera
            .normalize()
            .dot(closest_sample.normalize())
            .acos();

        horizon_angle > angle_to_sample
    }

    /// Whether the horizon test passed in the last update.
    #[must_use]
    pub fn is_visible_to_camera(&self) -> bool {
        self.is_visible
    }

    /// Closest sample distance divided by the mesh's real-space width:
    /// the proxy for on-screen size that drives split/merge decisions.
    #[must_use]
    pub fn camera_distance_to_width_ratio(&self) -> f64 {
        self.distance_ratio
    }

    /// Distance to the closest sample as of the last update.
    #[must_use]
    pub fn closest_distance(&self) -> f64 {
        self.closest_distance
    }

    /// Mesh-local vertex data for renderer upload.
    #[must_use]
    pub fn vertices(&self) -> &[TerrainVertex] {
        &self.vertices
    }

    /// The shared triangle index topology.
    #[must_use]
    pub fn indices(&self) -> &Arc<[u32]> {
        &self.indices
    }

    /// Node center, planet-relative.
    #[must_use]
    pub fn location(&self) -> DVec3 {
        self.location
    }
}

/// The four corner vertices plus the center vertex, in planet-relative
/// real space.
fn corner_and_center_samples(positions: &[DVec3]) -> [DVec3; 5] {
    let last = GRID_SIZE - 1;
    [
        positions[0],
        positions[last],
        positions[last * GRID_SIZE],
        positions[last * GRID_SIZE + last],
        positions[(GRID_SIZE / 2) * GRID_SIZE + GRID_SIZE / 2],
    ]
}

/// Per-vertex normals: accumulate triangle-edge cross products over the
/// index buffer, then normalize.
fn accumulate_normals(positions: &[DVec3], indices: &[u32]) -> Vec<Vec3> {
    let mut accumulated = vec![DVec3::ZERO; positions.len()];
    for tri in indices.chunks_exact(3) {
        let (a, b, c) = (tri[0] as usize, tri[1] as usize, tri[2] as usize);
        let normal = (positions[b] - positions[a]).cross(positions[c] - positions[a]);
        accumulated[a] += normal;
        accumulated[b] += normal;
        accumulated[c] += normal;
    }
    accumulated
        .into_iter()
        .map(|n| n.normalize_or_zero().as_vec3())
        .collect()
}

/// Overwrite border vertex colors: green where the edge coincides with the
/// face's root boundary, red for interior quad seams.
fn paint_quad_boundaries(vertices: &mut [TerrainVertex], extents: &Extents) {
    let last = GRID_SIZE - 1;
    let edge_color = |on_face_edge: bool| {
        if on_face_edge {
            FACE_EDGE_COLOR
        } else {
            INNER_EDGE_COLOR
        }
    };

    let north = edge_color(extents.north_on_face_edge());
    let south = edge_color(extents.south_on_face_edge());
    let west = edge_color(extents.west_on_face_edge());
    let east = edge_color(extents.east_on_face_edge());

    for col in 0..GRID_SIZE {
        vertices[col].color = north;
        vertices[last * GRID_SIZE + col].color = south;
    }
    for row in 0..GRID_SIZE {
        vertices[row * GRID_SIZE].color = west;
        vertices[row * GRID_SIZE + last].color = east;
    }
}
