//! Height oracle trait and the default multi-octave fBm implementation.

use glam::DVec3;
use noise::{NoiseFn, Simplex};

/// The terrain height oracle.
///
/// Implementations must be deterministic: the same `(direction, level,
/// scale)` always yields the same height, bit for bit. Mesh generation and
/// ground-height queries sample the oracle independently and rely on them
/// agreeing.
pub trait HeightSource: Send + Sync {
    /// Terrain height at a unit-sphere direction.
    ///
    /// `level` is the quadtree depth of the caller (deeper levels may see
    /// finer detail); `scale` is the caller-supplied height magnitude.
    fn height(&self, sphere_direction: DVec3, level: u32, scale: f64) -> f64;
}

/// Configuration for the fractal Brownian motion height source.
#[derive(Clone, Debug)]
pub struct FbmParams {
    /// Seed for deterministic generation.
    pub seed: u32,
    /// Octaves sampled at level 0. Each quadtree level adds one octave up
    /// to `max_octaves`, so deeper nodes resolve finer features.
    pub base_octaves: u32,
    /// Upper bound on the octave count.
    pub max_octaves: u32,
    /// Frequency multiplier between successive octaves.
    pub lacunarity: f64,
    /// Amplitude multiplier between successive octaves.
    pub persistence: f64,
    /// Frequency of the first octave over the unit sphere.
    pub base_frequency: f64,
}

impl Default for FbmParams {
    fn default() -> Self {
        Self {
            seed: 0,
            base_octaves: 4,
            max_octaves: 12,
            lacunarity: 2.0,
            persistence: 0.5,
            base_frequency: 1.5,
        }
    }
}

/// Default height oracle: fractal Brownian motion over 3-D simplex noise.
///
/// Sampling in 3-D on the sphere direction avoids UV seam artifacts at
/// face boundaries. The first octave's amplitude is the caller's `scale`,
/// so the theoretical height range is roughly `±scale / (1 - persistence)`.
pub struct FbmHeightSource {
    noise: Simplex,
    params: FbmParams,
}

impl FbmHeightSource {
    /// Create a new source with the given parameters.
    #[must_use]
    pub fn new(params: FbmParams) -> Self {
        let noise = Simplex::new(params.seed);
        Self { noise, params }
    }

    /// Create a source with default parameters and the given seed.
    #[must_use]
    pub fn with_seed(seed: u32) -> Self {
        Self::new(FbmParams {
            seed,
            ..Default::default()
        })
    }

    fn octaves_for_level(&self, level: u32) -> u32 {
        (self.params.base_octaves + level).min(self.params.max_octaves)
    }
}

impl HeightSource for FbmHeightSource {
    fn height(&self, sphere_direction: DVec3, level: u32, scale: f64) -> f64 {
        let mut total = 0.0;
        let mut frequency = self.params.base_frequency;
        let mut amplitude = scale;

        for _ in 0..self.octaves_for_level(level) {
            let p = sphere_direction * frequency;
            total += self.noise.get([p.x, p.y, p.z]) * amplitude;

            frequency *= self.params.lacunarity;
            amplitude *= self.params.persistence;
        }

        total
    }
}
