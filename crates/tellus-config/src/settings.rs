//! Settings structs with sensible defaults and RON persistence.

use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use crate::error::SettingsError;

/// Persisted engine settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// Maximum quadtree depth; caps split recursion.
    pub maximum_quad_node_level: u32,
    /// Paint quad boundary rows/columns for debugging seams.
    pub show_quad_boundaries: bool,
    /// Far clipping plane fallback when no terrain was visible last frame.
    pub far_clipping_plane_distance: f64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            maximum_quad_node_level: 15,
            show_quad_boundaries: false,
            far_clipping_plane_distance: 20_000_000.0,
        }
    }
}

impl Settings {
    /// Load settings from a RON file.
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let contents = std::fs::read_to_string(path).map_err(SettingsError::ReadError)?;
        ron::from_str(&contents).map_err(SettingsError::ParseError)
    }

    /// Save settings to a RON file.
    pub fn save(&self, path: &Path) -> Result<(), SettingsError> {
        let contents = ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(SettingsError::SerializeError)?;
        std::fs::write(path, contents).map_err(SettingsError::WriteError)
    }
}

/// The runtime settings handle the engine consumes.
///
/// Values are atomic so the UI layer can change them mid-flight while
/// update passes and background build lanes read them; consumers read the
/// current value each frame rather than subscribing to change events.
#[derive(Debug)]
pub struct SharedSettings {
    maximum_quad_node_level: AtomicU32,
    show_quad_boundaries: AtomicBool,
    far_clipping_plane_distance: AtomicU64,
}

impl SharedSettings {
    /// Create a handle seeded from persisted settings.
    #[must_use]
    pub fn new(settings: Settings) -> Self {
        Self {
            maximum_quad_node_level: AtomicU32::new(settings.maximum_quad_node_level),
            show_quad_boundaries: AtomicBool::new(settings.show_quad_boundaries),
            far_clipping_plane_distance: AtomicU64::new(
                settings.far_clipping_plane_distance.to_bits(),
            ),
        }
    }

    /// Current split-depth cap.
    #[must_use]
    pub fn maximum_quad_node_level(&self) -> u32 {
        self.maximum_quad_node_level.load(Ordering::Relaxed)
    }

    pub fn set_maximum_quad_node_level(&self, level: u32) {
        self.maximum_quad_node_level.store(level, Ordering::Relaxed);
    }

    /// Whether quad boundary painting is enabled.
    #[must_use]
    pub fn show_quad_boundaries(&self) -> bool {
        self.show_quad_boundaries.load(Ordering::Relaxed)
    }

    pub fn set_show_quad_boundaries(&self, show: bool) {
        self.show_quad_boundaries.store(show, Ordering::Relaxed);
    }

    /// Far-plane fallback distance.
    #[must_use]
    pub fn far_clipping_plane_distance(&self) -> f64 {
        f64::from_bits(self.far_clipping_plane_distance.load(Ordering::Relaxed))
    }

    pub fn set_far_clipping_plane_distance(&self, distance: f64) {
        self.far_clipping_plane_distance
            .store(distance.to_bits(), Ordering::Relaxed);
    }

    /// Snapshot the current values as a persistable [`Settings`].
    #[must_use]
    pub fn snapshot(&self) -> Settings {
        Settings {
            maximum_quad_node_level: self.maximum_quad_node_level(),
            show_quad_boundaries: self.show_quad_boundaries(),
            far_clipping_plane_distance: self.far_clipping_plane_distance(),
        }
    }
}

impl Default for SharedSettings {
    fn default() -> Self {
        Self::new(Settings::default())
    }
}
