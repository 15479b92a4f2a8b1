//! Renderer contracts. The LOD core never issues graphics calls itself;
//! it hands geometry to a [`MeshRenderer`] at initialization and node
//! locations at draw time.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use glam::{DVec3, Mat4};

use crate::TerrainVertex;

/// Backend renderer for one mesh.
///
/// `Send` because merge disposal (and cancelled-split cleanup) releases
/// renderer resources on background lanes.
pub trait MeshRenderer: Send {
    /// Upload mesh-local geometry. Called exactly once, before any draw.
    fn initialize(&mut self, vertices: &[TerrainVertex], indices: &Arc<[u32]>);

    /// Draw the mesh. `location` is the node's real-space position; the
    /// backend translates mesh-local geometry camera-relative from it.
    fn draw(&mut self, location: DVec3, camera_location: DVec3, view: Mat4, projection: Mat4);

    /// Release backend GPU resources. Called exactly once, at disposal.
    fn dispose(&mut self);
}

/// Creates one renderer per quad node.
pub trait RendererFactory: Send + Sync {
    fn create(&self) -> Box<dyn MeshRenderer>;
}

/// A renderer that does nothing but count its lifecycle calls.
///
/// Used headless and in tests; the counters make disposal observable.
#[derive(Default)]
pub struct NullRenderer {
    counters: Option<Arc<RendererCounters>>,
    initialized: bool,
}

/// Shared lifecycle counters for [`NullRenderer`] instances.
#[derive(Debug, Default)]
pub struct RendererCounters {
    pub initialized: AtomicUsize,
    pub drawn: AtomicUsize,
    pub disposed: AtomicUsize,
}

impl NullRenderer {
    /// A counting renderer reporting into the given counters.
    #[must_use]
    pub fn counting(counters: Arc<RendererCounters>) -> Self {
        Self {
            counters: Some(counters),
            initialized: false,
        }
    }
}

impl MeshRenderer for NullRenderer {
    fn initialize(&mut self, _vertices: &[TerrainVertex], _indices: &Arc<[u32]>) {
        self.initialized = true;
        if let Some(c) = &self.counters {
            c.initialized.fetch_add(1, Ordering::Relaxed);
        }
    }

    fn draw(&mut self, _location: DVec3, _camera: DVec3, _view: Mat4, _projection: Mat4) {
        if let Some(c) = &self.counters {
            c.drawn.fetch_add(1, Ordering::Relaxed);
        }
    }

    fn dispose(&mut self) {
        if let Some(c) = &self.counters {
            c.disposed.fetch_add(1, Ordering::Relaxed);
        }
    }
}

/// Factory for [`NullRenderer`]s, optionally wired to shared counters.
#[derive(Default)]
pub struct NullRendererFactory {
    counters: Option<Arc<RendererCounters>>,
}

impl NullRendererFactory {
    /// Factory whose renderers report into the given counters.
    #[must_use]
    pub fn counting(counters: Arc<RendererCounters>) -> Self {
        Self {
            counters: Some(counters),
        }
    }
}

impl RendererFactory for NullRendererFactory {
    fn create(&self) -> Box<dyn MeshRenderer> {
        match &self.counters {
            Some(c) => Box::new(NullRenderer::counting(Arc::clone(c))),
            None => Box::new(NullRenderer::default()),
        }
    }
}
