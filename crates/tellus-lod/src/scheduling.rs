//! Task scheduling facade: one background work lane per quadtree level.
//!
//! Split work at deep, numerous leaf levels runs on different lanes than
//! the shallow, cheap levels, so a burst of fine-grained builds never
//! starves a coarse one. Lanes are created lazily and cached for reuse.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crossbeam_channel::{Sender, unbounded};
use dashmap::DashMap;

type Job = Box<dyn FnOnce() + Send + 'static>;

/// Cooperative cancellation flag shared between a task's initiator and
/// the background job. Cancellation is an expected outcome, not an error.
#[derive(Clone, Debug, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Does not block; the job observes the flag at
    /// its own checkpoints.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}

/// Identifies a work lane.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
enum LaneKey {
    Level(u32),
    Default,
}

/// A handle for submitting jobs to one lane.
#[derive(Clone)]
pub struct LaneHandle {
    sender: Sender<Job>,
}

impl LaneHandle {
    /// Queue a job. Fire-and-forget: never blocks the caller. Jobs
    /// submitted while the dispatcher is shutting down are dropped.
    pub fn submit<F>(&self, job: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let _ = self.sender.send(Box::new(job));
    }
}

/// Lazily-created, cached background work lanes.
///
/// Each lane owns an unbounded job queue drained by a single named worker
/// thread; workers exit when the dispatcher (and with it every sender)
/// drops.
pub struct TaskDispatcher {
    lanes: DashMap<LaneKey, LaneHandle>,
}

impl TaskDispatcher {
    #[must_use]
    pub fn new() -> Self {
        Self {
            lanes: DashMap::new(),
        }
    }

    /// The lane for one quadtree level.
    pub fn lane_for_level(&self, level: u32) -> LaneHandle {
        self.lane(LaneKey::Level(level))
    }

    /// The default lane, used for work with no level affinity (merge
    /// disposal).
    pub fn default_lane(&self) -> LaneHandle {
        self.lane(LaneKey::Default)
    }

    fn lane(&self, key: LaneKey) -> LaneHandle {
        self.lanes
            .entry(key)
            .or_insert_with(|| spawn_lane(key))
            .clone()
    }
}

impl Default for TaskDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

fn spawn_lane(key: LaneKey) -> LaneHandle {
    let (sender, receiver) = unbounded::<Job>();
    let name = match key {
        LaneKey::Level(level) => format!("lod-worker-L{level}"),
        LaneKey::Default => "lod-worker-default".to_string(),
    };

    std::thread::Builder::new()
        .name(name)
        .spawn(move || {
            while let Ok(job) = receiver.recv() {
                job();
            }
        })
        .expect("failed to spawn LOD worker thread");

    LaneHandle { sender }
}
