//! The recursive quadtree node: mesh lifecycle, the split/merge/cancel
//! state machine, and draw recursion.
//!
//! Split construction is expensive, so it runs on the per-level
//! background lanes; merge disposal likewise. All tree-shape mutation
//! happens on the thread that calls `update`: background jobs answer
//! over channels and the node integrates their results at the top of the
//! next update, so a concurrent draw can never observe a half-published
//! child list and a dropped node simply closes its result channel.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use crossbeam_channel::{Receiver, TryRecvError, bounded, unbounded};
use glam::{DVec3, Mat4};
use tellus_config::SharedSettings;
use tellus_cubesphere::{Extents, FaceOrientation};
use tellus_mesh::{BoundaryPainting, ClippingPlanes, MeshRenderer, QuadMesh, RendererFactory};
use tellus_terrain::HeightSource;
use tracing::{debug, error};

use crate::scheduling::{CancellationToken, TaskDispatcher};
use crate::stats::TerrainStats;
use crate::strategy::SplitMergeStrategy;

const CHILD_COUNT: usize = 4;

/// Everything a node needs to build itself and its descendants; shared
/// across the whole tree so child construction on background lanes can
/// carry fresh per-node renderer and mesh dependencies.
pub struct NodeContext {
    /// Planet radius in real-space units.
    pub planet_radius: f64,
    pub settings: Arc<SharedSettings>,
    pub stats: Arc<TerrainStats>,
    pub dispatcher: Arc<TaskDispatcher>,
    pub height_source: Arc<dyn HeightSource>,
    pub renderer_factory: Arc<dyn RendererFactory>,
    pub policy: Arc<dyn SplitMergeStrategy>,
}

/// What a background child-build job reported back.
enum ChildOutcome {
    Built(Box<QuadNode>),
    /// Cancellation was observed before the build started.
    Skipped,
    /// The build panicked.
    Faulted,
}

/// An in-flight split: four child builds answering over one channel.
struct PendingSplit {
    cancel: CancellationToken,
    results: Receiver<(usize, ChildOutcome)>,
    slots: [Option<Box<QuadNode>>; CHILD_COUNT],
    received: usize,
    faulted: bool,
}

/// A node of the terrain quadtree.
///
/// A node is a leaf (rendering its own mesh) or an interior node with
/// exactly 4 children. While a split or merge is in flight the node keeps
/// presenting as whatever shape it last committed to.
pub struct QuadNode {
    level: u32,
    extents: Extents,
    orientation: FaceOrientation,
    /// Node center, planet-relative.
    location: DVec3,
    mesh: QuadMesh,
    renderer: Box<dyn MeshRenderer>,
    children: Option<[Box<QuadNode>; CHILD_COUNT]>,
    pending_split: Option<PendingSplit>,
    pending_merge: Option<Receiver<()>>,
    ctx: Arc<NodeContext>,
}

impl QuadNode {
    /// Build a node synchronously: generate its mesh and hand the
    /// geometry to a fresh renderer. Mesh generation is the expensive
    /// one-time cost; during splits it is charged to the background lane.
    pub fn new(
        ctx: Arc<NodeContext>,
        orientation: FaceOrientation,
        extents: Extents,
        level: u32,
    ) -> Self {
        let boundary = if ctx.settings.show_quad_boundaries() {
            BoundaryPainting::Edges
        } else {
            BoundaryPainting::Off
        };
        let mesh = QuadMesh::build(
            ctx.planet_radius,
            &orientation,
            &extents,
            level,
            ctx.height_source.as_ref(),
            boundary,
        );
        let mut renderer = ctx.renderer_factory.create();
        renderer.initialize(mesh.vertices(), mesh.indices());
        ctx.stats.node_created(level);

        Self {
            level,
            extents,
            orientation,
            location: mesh.location(),
            mesh,
            renderer,
            children: None,
            pending_split: None,
            pending_merge: None,
            ctx,
        }
    }

    /// Per-frame update: integrate finished background work, refresh the
    /// mesh metrics, consult the policy, then recurse into children.
    pub fn update(
        &mut self,
        camera_location: DVec3,
        planet_center: DVec3,
        clipping: &Arc<ClippingPlanes>,
    ) {
        self.integrate_background_results();

        self.mesh.update(camera_location, planet_center, clipping);

        let max_level = self.ctx.settings.maximum_quad_node_level();
        let in_progress = self.pending_split.is_some() || self.pending_merge.is_some();
        let should_split = self.ctx.policy.should_split(
            &self.mesh,
            self.children.is_some(),
            in_progress,
            self.level,
            max_level,
        );
        let should_merge =
            self.ctx
                .policy
                .should_merge(&self.mesh, self.children.is_some(), in_progress);
        let split_still_wanted =
            self.ctx
                .policy
                .should_split(&self.mesh, false, false, self.level, max_level);

        if should_split {
            self.begin_split(camera_location, planet_center, clipping);
        } else if should_merge {
            self.begin_merge();
        } else if let Some(pending) = &self.pending_split {
            // The camera moved away before the split finished: stop the
            // build rather than publishing children nobody wants.
            if !pending.cancel.is_cancelled() && !split_still_wanted {
                pending.cancel.cancel();
            }
        }

        if let Some(children) = &mut self.children {
            for child in children.iter_mut() {
                child.update(camera_location, planet_center, clipping);
            }
        }
    }

    /// Draw this subtree. Leaves draw their own mesh. Interior nodes
    /// recurse into all four children unconditionally: the horizon
    /// heuristic is unreliable at grazing angles, so there is no
    /// per-node short-circuit.
    pub fn draw(
        &mut self,
        camera_location: DVec3,
        planet_center: DVec3,
        view: Mat4,
        projection: Mat4,
    ) {
        match &mut self.children {
            Some(children) => {
                for child in children.iter_mut() {
                    child.draw(camera_location, planet_center, view, projection);
                }
            }
            None => {
                self.renderer.draw(
                    planet_center + self.location,
                    camera_location,
                    view,
                    projection,
                );
            }
        }
    }

    /// Poll the split/merge result channels and commit anything that
    /// finished. This is the only place the child list changes shape.
    fn integrate_background_results(&mut self) {
        let split_done = match &mut self.pending_split {
            Some(pending) => {
                while let Ok((index, outcome)) = pending.results.try_recv() {
                    pending.received += 1;
                    match outcome {
                        ChildOutcome::Built(child) => pending.slots[index] = Some(child),
                        ChildOutcome::Skipped => {}
                        ChildOutcome::Faulted => pending.faulted = true,
                    }
                }
                pending.received == CHILD_COUNT
            }
            None => false,
        };
        if split_done {
            let pending = self.pending_split.take().expect("split was pending");
            self.ctx.stats.split_settled();
            self.finish_split(pending);
        }

        let merge_done = self
            .pending_merge
            .as_ref()
            .is_some_and(|done| !matches!(done.try_recv(), Err(TryRecvError::Empty)));
        if merge_done {
            self.pending_merge = None;
            self.ctx.stats.merge_settled();
        }
    }

    /// All four child results are in: publish or discard.
    fn finish_split(&mut self, pending: PendingSplit) {
        if pending.cancel.is_cancelled() {
            self.ctx.stats.split_cancelled();
            debug!(level = self.level, "split cancelled, discarding built children");
            return; // dropping the slots disposes any children that completed
        }
        if pending.faulted {
            error!(level = self.level, "child build faulted, discarding split");
            return;
        }

        let [a, b, c, d] = pending.slots;
        match (a, b, c, d) {
            (Some(a), Some(b), Some(c), Some(d)) => {
                self.children = Some([a, b, c, d]);
            }
            _ => {
                // A job can only skip after observing cancellation, which
                // the branch above already handled.
                error!(level = self.level, "split settled without four children");
            }
        }
    }

    /// Kick off asynchronous construction of the four children on the
    /// lane for their level. The node keeps presenting as a leaf until
    /// the whole set commits.
    fn begin_split(
        &mut self,
        camera_location: DVec3,
        planet_center: DVec3,
        clipping: &Arc<ClippingPlanes>,
    ) {
        debug_assert!(
            self.pending_split.is_none() && self.pending_merge.is_none(),
            "policy must not start a split while work is in flight"
        );
        self.ctx.stats.split_begun();

        let cancel = CancellationToken::new();
        let (results_tx, results_rx) = unbounded();
        let child_level = self.level + 1;
        let lane = self.ctx.dispatcher.lane_for_level(child_level);

        for (index, extents) in self.extents.split().into_iter().enumerate() {
            let ctx = Arc::clone(&self.ctx);
            let orientation = self.orientation;
            let token = cancel.clone();
            let results = results_tx.clone();
            let clipping = Arc::clone(clipping);

            lane.submit(move || {
                if token.is_cancelled() {
                    let _ = results.send((index, ChildOutcome::Skipped));
                    return;
                }
                let built = panic::catch_unwind(AssertUnwindSafe(|| {
                    let mut child = QuadNode::new(ctx, orientation, extents, child_level);
                    // Refresh once right away so the child is not a stale
                    // frame behind the camera when it gets published.
                    child.update(camera_location, planet_center, &clipping);
                    child
                }));
                let outcome = match built {
                    Ok(child) => ChildOutcome::Built(Box::new(child)),
                    Err(_) => ChildOutcome::Faulted,
                };
                let _ = results.send((index, outcome));
            });
        }

        self.pending_split = Some(PendingSplit {
            cancel,
            results: results_rx,
            slots: [None, None, None, None],
            received: 0,
            faulted: false,
        });
    }

    /// Detach the children immediately (the node behaves as a leaf from
    /// this call on) and ship them to a background lane for disposal so
    /// renderer teardown never stalls the update loop. Unlike a split,
    /// a merge cannot be cancelled: the children are never reattached.
    fn begin_merge(&mut self) {
        debug_assert!(
            self.pending_split.is_none(),
            "a node never merges while a split is in flight"
        );
        let children = self.children.take().expect("merge requires children");
        self.ctx.stats.merge_begun();

        let (done_tx, done_rx) = bounded(1);
        self.ctx.dispatcher.default_lane().submit(move || {
            drop(children);
            let _ = done_tx.send(());
        });
        self.pending_merge = Some(done_rx);
    }

    /// Quadtree depth, root = 0.
    #[must_use]
    pub fn level(&self) -> u32 {
        self.level
    }

    /// The node's parameter-plane region.
    #[must_use]
    pub fn extents(&self) -> &Extents {
        &self.extents
    }

    /// Node center, planet-relative.
    #[must_use]
    pub fn location(&self) -> DVec3 {
        self.location
    }

    /// The node's mesh with its last-update metrics.
    #[must_use]
    pub fn mesh(&self) -> &QuadMesh {
        &self.mesh
    }

    /// Whether 4 children are currently published.
    #[must_use]
    pub fn has_children(&self) -> bool {
        self.children.is_some()
    }

    /// The published children, if any.
    #[must_use]
    pub fn children(&self) -> Option<&[Box<QuadNode>; CHILD_COUNT]> {
        self.children.as_ref()
    }

    /// Whether a split is awaiting background completion.
    #[must_use]
    pub fn is_split_in_progress(&self) -> bool {
        self.pending_split.is_some()
    }

    /// Whether merged-away children are still being disposed.
    #[must_use]
    pub fn is_merge_in_progress(&self) -> bool {
        self.pending_merge.is_some()
    }

    /// Whether the in-flight split has been asked to cancel.
    #[must_use]
    pub fn is_split_cancelled(&self) -> bool {
        self.pending_split
            .as_ref()
            .is_some_and(|pending| pending.cancel.is_cancelled())
    }
}

impl Drop for QuadNode {
    fn drop(&mut self) {
        if let Some(pending) = &self.pending_split {
            // Unblock the in-flight build; its results land in a closed
            // channel and any built children are dropped in the worker.
            pending.cancel.cancel();
            self.ctx.stats.split_settled();
            self.ctx.stats.split_cancelled();
        }
        if self.pending_merge.is_some() {
            self.ctx.stats.merge_settled();
        }
        self.renderer.dispose();
        self.ctx.stats.node_disposed(self.level);
        // Children (and any already-built pending slots) drop recursively.
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::{Duration, Instant};

    use tellus_config::{Settings, SharedSettings};
    use tellus_cubesphere::CubeFace;
    use tellus_mesh::{NullRendererFactory, RendererCounters};
    use tellus_terrain::HeightSource;

    use crate::strategy::DefaultSplitMergeStrategy;

    const RADIUS: f64 = 6_371_000.0;

    /// Flat terrain, optionally gated so mesh builds block until released.
    struct GatedTerrain {
        gate: Option<Arc<AtomicBool>>,
    }

    impl HeightSource for GatedTerrain {
        fn height(&self, _direction: DVec3, _level: u32, _scale: f64) -> f64 {
            if let Some(gate) = &self.gate {
                while !gate.load(Ordering::Relaxed) {
                    std::thread::yield_now();
                }
            }
            0.0
        }
    }

    struct Fixture {
        ctx: Arc<NodeContext>,
        counters: Arc<RendererCounters>,
        clipping: Arc<ClippingPlanes>,
    }

    fn fixture(max_level: u32, gate: Option<Arc<AtomicBool>>) -> Fixture {
        let counters = Arc::new(RendererCounters::default());
        let settings = SharedSettings::new(Settings {
            maximum_quad_node_level: max_level,
            ..Default::default()
        });
        let ctx = Arc::new(NodeContext {
            planet_radius: RADIUS,
            settings: Arc::new(settings),
            stats: Arc::new(TerrainStats::new()),
            dispatcher: Arc::new(TaskDispatcher::new()),
            height_source: Arc::new(GatedTerrain { gate }),
            renderer_factory: Arc::new(NullRendererFactory::counting(Arc::clone(&counters))),
            policy: Arc::new(DefaultSplitMergeStrategy),
        });
        Fixture {
            ctx,
            counters,
            clipping: Arc::new(ClippingPlanes::new()),
        }
    }

    fn root_node(fx: &Fixture) -> QuadNode {
        QuadNode::new(
            Arc::clone(&fx.ctx),
            CubeFace::PosY.orientation(),
            Extents::root(),
            0,
        )
    }

    /// A camera close enough above the +Y face center to demand a split.
    fn close_camera() -> DVec3 {
        DVec3::Y * (RADIUS + 0.05 * RADIUS)
    }

    /// A camera far enough out that no node wants detail.
    fn far_camera() -> DVec3 {
        DVec3::Y * (RADIUS * 100.0)
    }

    fn pump_until<F: Fn(&QuadNode) -> bool>(
        node: &mut QuadNode,
        fx: &Fixture,
        camera: DVec3,
        condition: F,
        what: &str,
    ) {
        let deadline = Instant::now() + Duration::from_secs(20);
        while !condition(node) {
            assert!(Instant::now() < deadline, "timed out waiting for {what}");
            node.update(camera, DVec3::ZERO, &fx.clipping);
            std::thread::yield_now();
        }
    }

    #[test]
    fn test_new_node_is_a_stable_leaf() {
        let fx = fixture(10, None);
        let node = root_node(&fx);
        assert_eq!(node.level(), 0);
        assert!(!node.has_children());
        assert!(!node.is_split_in_progress());
        assert!(!node.is_merge_in_progress());
        assert_eq!(fx.ctx.stats.node_count(), 1);
    }

    #[test]
    fn test_close_camera_starts_and_commits_split() {
        let fx = fixture(1, None);
        let mut node = root_node(&fx);

        node.update(close_camera(), DVec3::ZERO, &fx.clipping);
        assert!(node.is_split_in_progress(), "split should begin immediately");
        assert!(!node.has_children(), "children publish only on completion");
        assert_eq!(fx.ctx.stats.pending_splits(), 1);

        pump_until(&mut node, &fx, close_camera(), QuadNode::has_children, "split commit");

        let children = node.children().expect("children published");
        assert_eq!(children.len(), 4);
        for child in children.iter() {
            assert_eq!(child.level(), 1, "children sit one level below the parent");
            assert!(
                child.mesh().camera_distance_to_width_ratio().is_finite(),
                "published children must have been updated once already"
            );
        }
        assert!(!node.is_split_in_progress());
        assert_eq!(fx.ctx.stats.pending_splits(), 0);
        assert_eq!(fx.ctx.stats.node_count(), 5);
        assert_eq!(fx.ctx.stats.nodes_at_level(1), 4);
    }

    #[test]
    fn test_split_does_not_reenter_while_pending() {
        let gate = Arc::new(AtomicBool::new(false));
        let fx = fixture(1, Some(Arc::clone(&gate)));
        let mut node = root_node_with_open_gate(&fx, &gate);

        node.update(close_camera(), DVec3::ZERO, &fx.clipping);
        assert!(node.is_split_in_progress());
        assert_eq!(fx.ctx.stats.pending_splits(), 1);

        // Further updates while the build is gated must not start more work.
        node.update(close_camera(), DVec3::ZERO, &fx.clipping);
        node.update(close_camera(), DVec3::ZERO, &fx.clipping);
        assert_eq!(fx.ctx.stats.pending_splits(), 1);

        gate.store(true, Ordering::Relaxed);
        pump_until(&mut node, &fx, close_camera(), QuadNode::has_children, "split commit");
    }

    /// Build the root while the gate is open, then close it so the next
    /// builds block.
    fn root_node_with_open_gate(fx: &Fixture, gate: &Arc<AtomicBool>) -> QuadNode {
        gate.store(true, Ordering::Relaxed);
        let node = root_node(fx);
        gate.store(false, Ordering::Relaxed);
        node
    }

    #[test]
    fn test_camera_retreat_cancels_pending_split() {
        let gate = Arc::new(AtomicBool::new(false));
        let fx = fixture(1, Some(Arc::clone(&gate)));
        let mut node = root_node_with_open_gate(&fx, &gate);

        node.update(close_camera(), DVec3::ZERO, &fx.clipping);
        assert!(node.is_split_in_progress());
        assert!(!node.is_split_cancelled());

        // Camera leaves before the gated build can finish.
        node.update(far_camera(), DVec3::ZERO, &fx.clipping);
        assert!(node.is_split_cancelled(), "retreating camera must cancel the split");

        gate.store(true, Ordering::Relaxed);
        pump_until(
            &mut node,
            &fx,
            far_camera(),
            |n| !n.is_split_in_progress(),
            "cancelled split to settle",
        );

        assert!(!node.has_children(), "a cancelled split never publishes children");
        assert_eq!(fx.ctx.stats.pending_splits(), 0);
        assert_eq!(fx.ctx.stats.take_splits_cancelled(), 1);
        assert_eq!(fx.ctx.stats.node_count(), 1, "built children were discarded");
    }

    #[test]
    fn test_far_camera_merges_children_immediately() {
        let fx = fixture(1, None);
        let mut node = root_node(&fx);

        node.update(close_camera(), DVec3::ZERO, &fx.clipping);
        pump_until(&mut node, &fx, close_camera(), QuadNode::has_children, "split commit");

        node.update(far_camera(), DVec3::ZERO, &fx.clipping);
        assert!(!node.has_children(), "merge detaches children in the same tick");
        assert!(node.is_merge_in_progress());
        assert_eq!(fx.ctx.stats.pending_merges(), 1);

        pump_until(
            &mut node,
            &fx,
            far_camera(),
            |n| !n.is_merge_in_progress(),
            "merge disposal to settle",
        );
        assert_eq!(fx.ctx.stats.pending_merges(), 0);
        assert_eq!(fx.ctx.stats.node_count(), 1);

        // Each former child's renderer was released exactly once:
        // 1 root + 4 children initialized, 4 children disposed.
        let deadline = Instant::now() + Duration::from_secs(10);
        while fx.counters.disposed.load(Ordering::Relaxed) < 4 {
            assert!(Instant::now() < deadline, "child renderers not disposed");
            std::thread::yield_now();
        }
        assert_eq!(fx.counters.disposed.load(Ordering::Relaxed), 4);
        assert_eq!(fx.counters.initialized.load(Ordering::Relaxed), 5);
    }

    #[test]
    fn test_node_never_has_split_and_merge_pending_together() {
        let fx = fixture(1, None);
        let mut node = root_node(&fx);

        for frame in 0..50 {
            let camera = if frame % 2 == 0 { close_camera() } else { far_camera() };
            node.update(camera, DVec3::ZERO, &fx.clipping);
            assert!(
                !(node.is_split_in_progress() && node.is_merge_in_progress()),
                "split and merge must never be in flight simultaneously"
            );
        }
    }

    #[test]
    fn test_drop_returns_counters_to_zero() {
        let fx = fixture(2, None);
        let mut node = root_node(&fx);

        node.update(close_camera(), DVec3::ZERO, &fx.clipping);
        pump_until(&mut node, &fx, close_camera(), QuadNode::has_children, "split commit");
        let live = fx.ctx.stats.node_count();
        assert!(live >= 5);

        drop(node);

        // Deeper splits may still be settling on worker lanes.
        let deadline = Instant::now() + Duration::from_secs(10);
        while fx.ctx.stats.node_count() > 0 {
            assert!(Instant::now() < deadline, "node counters did not return to zero");
            std::thread::yield_now();
        }
        assert_eq!(fx.ctx.stats.nodes_at_level(0), 0);
        assert_eq!(fx.ctx.stats.nodes_at_level(1), 0);
    }

    #[test]
    fn test_drop_with_pending_split_settles_counters() {
        let gate = Arc::new(AtomicBool::new(false));
        let fx = fixture(1, Some(Arc::clone(&gate)));
        let mut node = root_node_with_open_gate(&fx, &gate);

        node.update(close_camera(), DVec3::ZERO, &fx.clipping);
        assert_eq!(fx.ctx.stats.pending_splits(), 1);

        drop(node);
        assert_eq!(fx.ctx.stats.pending_splits(), 0, "drop settles the pending split");
        gate.store(true, Ordering::Relaxed);

        // The in-flight builds drain into the closed channel and their
        // nodes are disposed on the worker.
        let deadline = Instant::now() + Duration::from_secs(10);
        while fx.ctx.stats.node_count() > 0 {
            assert!(Instant::now() < deadline, "orphaned children were not disposed");
            std::thread::yield_now();
        }
    }

    #[test]
    fn test_faulted_child_build_discards_split() {
        struct PanickingTerrain;
        impl HeightSource for PanickingTerrain {
            fn height(&self, _d: DVec3, level: u32, _s: f64) -> f64 {
                assert!(level == 0, "simulated oracle fault");
                0.0
            }
        }

        let counters = Arc::new(RendererCounters::default());
        let ctx = Arc::new(NodeContext {
            planet_radius: RADIUS,
            settings: Arc::new(SharedSettings::new(Settings {
                maximum_quad_node_level: 1,
                ..Default::default()
            })),
            stats: Arc::new(TerrainStats::new()),
            dispatcher: Arc::new(TaskDispatcher::new()),
            height_source: Arc::new(PanickingTerrain),
            renderer_factory: Arc::new(NullRendererFactory::counting(Arc::clone(&counters))),
            policy: Arc::new(DefaultSplitMergeStrategy),
        });
        let clipping = Arc::new(ClippingPlanes::new());
        let mut node = QuadNode::new(
            Arc::clone(&ctx),
            CubeFace::PosY.orientation(),
            Extents::root(),
            0,
        );

        node.update(close_camera(), DVec3::ZERO, &clipping);
        assert!(node.is_split_in_progress());

        let deadline = Instant::now() + Duration::from_secs(20);
        while node.is_split_in_progress() {
            assert!(Instant::now() < deadline, "faulted split did not settle");
            node.update(close_camera(), DVec3::ZERO, &clipping);
            std::thread::yield_now();
        }

        assert!(!node.has_children(), "a faulted split publishes nothing");
        assert_eq!(ctx.stats.pending_splits(), 0, "fault still releases the counter");
        assert_eq!(ctx.stats.node_count(), 1);
    }

    #[test]
    fn test_draw_renders_leaves_only() {
        let fx = fixture(1, None);
        let mut node = root_node(&fx);

        node.draw(close_camera(), DVec3::ZERO, Mat4::IDENTITY, Mat4::IDENTITY);
        assert_eq!(fx.counters.drawn.load(Ordering::Relaxed), 1, "leaf draws itself");

        node.update(close_camera(), DVec3::ZERO, &fx.clipping);
        pump_until(&mut node, &fx, close_camera(), QuadNode::has_children, "split commit");

        let before = fx.counters.drawn.load(Ordering::Relaxed);
        node.draw(close_camera(), DVec3::ZERO, Mat4::IDENTITY, Mat4::IDENTITY);
        assert_eq!(
            fx.counters.drawn.load(Ordering::Relaxed) - before,
            4,
            "interior node draws its four children instead of itself"
        );
    }
}
