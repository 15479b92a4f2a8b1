//! Headless orbital-descent demo.
//!
//! Flies a camera from orbit down to near ground level over a planet
//! with fractal terrain, pumping the update/draw loop and logging LOD
//! statistics. No window, no GPU: renderers are null, so this exercises
//! the quadtree refinement end to end and nothing else.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use glam::{DVec3, Mat4};
use tellus_config::{Settings, SharedSettings};
use tellus_lod::{
    DefaultSplitMergeStrategy, NodeContext, TaskDispatcher, TerrainStats,
};
use tellus_mesh::NullRendererFactory;
use tellus_planet::Planet;
use tellus_terrain::FbmHeightSource;
use tracing::info;

const PLANET_RADIUS: f64 = 6_371_000.0;
const FRAMES: u32 = 600;
const FRAME_TIME: Duration = Duration::from_millis(16);
const STATS_INTERVAL: u32 = 60;

fn main() {
    tellus_log::init_logging("info");

    let settings_path = Path::new("settings.ron");
    let settings = Settings::load(settings_path).unwrap_or_else(|_| {
        info!("no settings file, using defaults");
        Settings::default()
    });

    let stats = Arc::new(TerrainStats::new());
    let ctx = Arc::new(NodeContext {
        planet_radius: PLANET_RADIUS,
        settings: Arc::new(SharedSettings::new(settings)),
        stats: Arc::clone(&stats),
        dispatcher: Arc::new(TaskDispatcher::new()),
        height_source: Arc::new(FbmHeightSource::with_seed(1977)),
        renderer_factory: Arc::new(NullRendererFactory::default()),
        policy: Arc::new(DefaultSplitMergeStrategy),
    });
    let mut planet = Planet::new(DVec3::ZERO, ctx);

    // Descend from high orbit to a few hundred meters above the terrain,
    // easing in so the last frames crawl along the surface.
    let start_altitude = PLANET_RADIUS * 4.0;
    let mut camera = DVec3::Y * (PLANET_RADIUS + start_altitude);

    for frame in 0..FRAMES {
        let t = frame as f64 / FRAMES as f64;
        let altitude = start_altitude * (1.0 - t).powi(3) + 300.0;
        let ground = planet.ground_height(camera);
        camera = camera.normalize() * (ground + altitude);

        planet.update(camera);
        planet.draw(camera, Mat4::IDENTITY, Mat4::IDENTITY);

        if frame % STATS_INTERVAL == 0 {
            let snapshot = stats.snapshot();
            let range = planet.clipping_range();
            info!(
                frame,
                altitude = %format_args!("{altitude:.0}m"),
                nodes = snapshot.node_count,
                levels = ?snapshot.nodes_at_level,
                pending_splits = snapshot.pending_splits,
                pending_merges = snapshot.pending_merges,
                cancelled = stats.take_splits_cancelled(),
                near = %format_args!("{:.0}", range.near),
                far = %format_args!("{:.0}", range.far),
                "descent"
            );
        }
        std::thread::sleep(FRAME_TIME);
    }

    let snapshot = stats.snapshot();
    info!(
        nodes = snapshot.node_count,
        deepest_level = snapshot.nodes_at_level.len().saturating_sub(1),
        "descent complete"
    );
}
