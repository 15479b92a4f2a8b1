//! The six cube-face quadtree roots.

use std::sync::Arc;

use glam::{DVec3, Mat4};
use tellus_cubesphere::{CubeFace, Extents};
use tellus_lod::{NodeContext, QuadNode};
use tellus_mesh::ClippingPlanes;
use tracing::info;

/// The planet surface: one root quad node per cube face.
///
/// Update and draw simply fan out to all six roots. Roots are always
/// recursed into; horizon culling at root granularity is unreliable, so
/// face-level culling is left to the per-node visibility metrics below.
pub struct Terrain {
    roots: [QuadNode; 6],
}

impl Terrain {
    /// Build the six face roots. Each face gets its own basis triple so
    /// the faces tile the cube consistently and boundary vertices of
    /// adjacent faces line up.
    pub fn new(ctx: &Arc<NodeContext>) -> Self {
        let roots = CubeFace::ALL
            .map(|face| QuadNode::new(Arc::clone(ctx), face.orientation(), Extents::root(), 0));
        info!(
            radius = ctx.planet_radius,
            "terrain initialized with 6 cube-face roots"
        );
        Self { roots }
    }

    /// Update all six face subtrees.
    pub fn update(
        &mut self,
        camera_location: DVec3,
        planet_center: DVec3,
        clipping: &Arc<ClippingPlanes>,
    ) {
        for root in &mut self.roots {
            root.update(camera_location, planet_center, clipping);
        }
    }

    /// Draw all six face subtrees.
    pub fn draw(
        &mut self,
        camera_location: DVec3,
        planet_center: DVec3,
        view: Mat4,
        projection: Mat4,
    ) {
        for root in &mut self.roots {
            root.draw(camera_location, planet_center, view, projection);
        }
    }

    /// The face roots, in [`CubeFace::ALL`] order.
    #[must_use]
    pub fn roots(&self) -> &[QuadNode; 6] {
        &self.roots
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::Ordering;

    use tellus_config::SharedSettings;
    use tellus_lod::{DefaultSplitMergeStrategy, TaskDispatcher, TerrainStats};
    use tellus_mesh::{NullRendererFactory, RendererCounters};
    use tellus_terrain::HeightSource;

    const RADIUS: f64 = 6_371_000.0;

    struct FlatTerrain;

    impl HeightSource for FlatTerrain {
        fn height(&self, _direction: DVec3, _level: u32, _scale: f64) -> f64 {
            0.0
        }
    }

    fn test_context(counters: &Arc<RendererCounters>) -> Arc<NodeContext> {
        Arc::new(NodeContext {
            planet_radius: RADIUS,
            settings: Arc::new(SharedSettings::default()),
            stats: Arc::new(TerrainStats::new()),
            dispatcher: Arc::new(TaskDispatcher::new()),
            height_source: Arc::new(FlatTerrain),
            renderer_factory: Arc::new(NullRendererFactory::counting(Arc::clone(counters))),
            policy: Arc::new(DefaultSplitMergeStrategy),
        })
    }

    #[test]
    fn test_terrain_has_six_roots_at_level_zero() {
        let counters = Arc::new(RendererCounters::default());
        let ctx = test_context(&counters);
        let terrain = Terrain::new(&ctx);

        assert_eq!(terrain.roots().len(), 6);
        for root in terrain.roots() {
            assert_eq!(root.level(), 0);
            assert_eq!(*root.extents(), Extents::root());
        }
        assert_eq!(ctx.stats.node_count(), 6);
    }

    #[test]
    fn test_root_locations_are_distinct_and_radius_scaled() {
        let counters = Arc::new(RendererCounters::default());
        let ctx = test_context(&counters);
        let terrain = Terrain::new(&ctx);

        for (i, a) in terrain.roots().iter().enumerate() {
            assert!(
                (a.location().length() - RADIUS).abs() < 1.0,
                "root centers sit on the sphere"
            );
            for b in &terrain.roots()[i + 1..] {
                assert!(
                    (a.location() - b.location()).length() > RADIUS,
                    "each face root must occupy a distinct position"
                );
            }
        }
    }

    #[test]
    fn test_orbital_update_culls_far_side_faces() {
        let counters = Arc::new(RendererCounters::default());
        let ctx = test_context(&counters);
        let mut terrain = Terrain::new(&ctx);
        let clipping = Arc::new(ClippingPlanes::new());

        // Low orbit above +Y: the +Y face is visible, the −Y face is not.
        let camera = DVec3::Y * (RADIUS * 1.2);
        terrain.update(camera, DVec3::ZERO, &clipping);

        let visible: Vec<bool> = terrain
            .roots()
            .iter()
            .map(|r| r.mesh().is_visible_to_camera())
            .collect();
        assert!(visible[2], "+Y face should be above the horizon");
        assert!(!visible[3], "-Y face should be horizon-culled");
    }

    #[test]
    fn test_draw_fans_out_to_all_leaf_roots() {
        let counters = Arc::new(RendererCounters::default());
        let ctx = test_context(&counters);
        let mut terrain = Terrain::new(&ctx);

        terrain.draw(
            DVec3::Y * (RADIUS * 3.0),
            DVec3::ZERO,
            Mat4::IDENTITY,
            Mat4::IDENTITY,
        );
        assert_eq!(
            counters.drawn.load(Ordering::Relaxed),
            6,
            "all six roots draw when the tree is unsplit"
        );
    }
}
