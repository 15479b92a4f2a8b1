//! Per-frame near/far clipping-plane accumulator.

use std::sync::atomic::{AtomicU64, Ordering};

/// Accumulates the depth range covered by all visible meshes in one frame.
///
/// Reset at the start of each frame to the `(+∞, −∞)` sentinels; every
/// visible mesh then widens the range during its update. Child meshes of
/// in-progress splits update from background lanes concurrently with the
/// main pass, so widening is a compare-and-swap loop over the f64 bit
/// patterns rather than a plain read-modify-write.
#[derive(Debug)]
pub struct ClippingPlanes {
    near: AtomicU64,
    far: AtomicU64,
}

impl ClippingPlanes {
    /// Create an accumulator holding the empty-range sentinels.
    #[must_use]
    pub fn new() -> Self {
        Self {
            near: AtomicU64::new(f64::INFINITY.to_bits()),
            far: AtomicU64::new(f64::NEG_INFINITY.to_bits()),
        }
    }

    /// Reset to the empty range: `near = +∞`, `far = −∞`.
    pub fn reset(&self) {
        self.near.store(f64::INFINITY.to_bits(), Ordering::Relaxed);
        self.far
            .store(f64::NEG_INFINITY.to_bits(), Ordering::Relaxed);
    }

    /// Widen the accumulated range to include `[near, far]`.
    pub fn widen(&self, near: f64, far: f64) {
        let _ = self
            .near
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |bits| {
                let current = f64::from_bits(bits);
                (near < current).then(|| near.to_bits())
            });
        let _ = self
            .far
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |bits| {
                let current = f64::from_bits(bits);
                (far > current).then(|| far.to_bits())
            });
    }

    /// Nearest accumulated distance (`+∞` if nothing was visible).
    #[must_use]
    pub fn near(&self) -> f64 {
        f64::from_bits(self.near.load(Ordering::Relaxed))
    }

    /// Farthest accumulated distance (`−∞` if nothing was visible).
    #[must_use]
    pub fn far(&self) -> f64 {
        f64::from_bits(self.far.load(Ordering::Relaxed))
    }
}

impl Default for ClippingPlanes {
    fn default() -> Self {
        Self::new()
    }
}
