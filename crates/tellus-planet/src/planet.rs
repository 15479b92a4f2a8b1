//! The planet aggregate: terrain, clipping-plane accumulation, and
//! ground-height queries.

use std::sync::Arc;

use glam::{DVec3, Mat4};
use tellus_lod::NodeContext;
use tellus_mesh::{ClippingPlanes, HEIGHT_SCALE};
use tracing::debug;

use crate::Terrain;

/// Ground-height queries always sample the oracle at this fixed level
/// rather than the currently-resident mesh LOD, so the answer is
/// consistent and resolution-independent.
pub const GROUND_QUERY_LEVEL: u32 = 19;

/// Near plane used whenever the accumulated near distance is very small
/// or nothing was visible last frame.
const MINIMUM_NEAR_PLANE: f64 = 2.0;

/// The near/far depth range the renderer should use this frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClippingRange {
    pub near: f64,
    pub far: f64,
}

/// A planet: six-face quadtree terrain plus the per-frame clip range
/// derived from what the terrain reported visible.
pub struct Planet {
    /// Planet center in world space.
    location: DVec3,
    radius: f64,
    terrain: Terrain,
    clipping: Arc<ClippingPlanes>,
    clip_range: ClippingRange,
    ctx: Arc<NodeContext>,
}

impl Planet {
    /// Assemble a planet at `location`, wiring the six terrain faces from
    /// the node context.
    pub fn new(location: DVec3, ctx: Arc<NodeContext>) -> Self {
        let terrain = Terrain::new(&ctx);
        let clip_range = ClippingRange {
            near: MINIMUM_NEAR_PLANE,
            far: ctx.settings.far_clipping_plane_distance(),
        };
        Self {
            location,
            radius: ctx.planet_radius,
            terrain,
            clipping: Arc::new(ClippingPlanes::new()),
            clip_range,
            ctx,
        }
    }

    /// Per-frame update: refine the terrain toward the camera. Visible
    /// meshes widen this frame's clipping accumulator as they update.
    pub fn update(&mut self, camera_location: DVec3) {
        self.terrain
            .update(camera_location, self.location, &self.clipping);
    }

    /// Per-frame draw: derive the clip range from the previous frame's
    /// accumulation, reset the accumulator for the next update pass, then
    /// draw the terrain.
    pub fn draw(&mut self, camera_location: DVec3, view: Mat4, projection: Mat4) {
        self.clip_range = clip_range_from_accumulated(
            self.clipping.near(),
            self.clipping.far(),
            self.ctx.settings.far_clipping_plane_distance(),
        );
        debug!(near = self.clip_range.near, far = self.clip_range.far, "clip range");
        self.clipping.reset();
        self.terrain
            .draw(camera_location, self.location, view, projection);
    }

    /// The clip range chosen by the most recent [`Planet::draw`], for the
    /// external projection builder.
    #[must_use]
    pub fn clipping_range(&self) -> ClippingRange {
        self.clip_range
    }

    /// Distance from the planet center to the terrain surface along the
    /// observer's direction.
    ///
    /// Always sampled at [`GROUND_QUERY_LEVEL`], independent of what mesh
    /// resolution happens to be resident under the observer.
    #[must_use]
    pub fn ground_height(&self, observer_location: DVec3) -> f64 {
        let direction = (observer_location - self.location).normalize();
        self.radius
            + self
                .ctx
                .height_source
                .height(direction, GROUND_QUERY_LEVEL, HEIGHT_SCALE)
    }

    /// Planet center in world space.
    #[must_use]
    pub fn location(&self) -> DVec3 {
        self.location
    }

    /// Planet radius.
    #[must_use]
    pub fn radius(&self) -> f64 {
        self.radius
    }

    /// The terrain quadtrees.
    #[must_use]
    pub fn terrain(&self) -> &Terrain {
        &self.terrain
    }
}

/// Derive this frame's clip range from the previous frame's accumulated
/// near/far distances.
///
/// Graduated near-plane thresholds keep depth precision tight on the
/// ground without clipping terrain at altitude; the far plane gets 10%
/// headroom over the farthest visible point. Sentinel (nothing-visible)
/// frames fall back to the minimum near plane and the configured far
/// distance.
fn clip_range_from_accumulated(near: f64, far: f64, far_fallback: f64) -> ClippingRange {
    let near = if !near.is_finite() || near < 50.0 {
        MINIMUM_NEAR_PLANE
    } else if near < 20_000.0 {
        near * 0.5
    } else {
        near * 0.9
    };
    let far = if far.is_finite() {
        far * 1.1
    } else {
        far_fallback
    };
    ClippingRange { near, far }
}
