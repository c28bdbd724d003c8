//! Virtual time for the autopilot stack.
//!
//! The bridge advances this clock by the timestamp delta of each
//! accepted FDM packet, so downstream code perceives simulation time
//! instead of wall-clock time.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Virtual clock backed by a shared atomic microsecond counter.
///
/// Clones share the same counter, so the bridge can advance time while
/// other components read it.
#[derive(Debug, Clone, Default)]
pub struct VirtualClock {
    time_us: Arc<AtomicU64>,
}

impl VirtualClock {
    /// Create a new clock starting at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current virtual time in microseconds.
    pub fn now_us(&self) -> u64 {
        self.time_us.load(Ordering::Relaxed)
    }

    /// Advance virtual time by the given number of microseconds.
    pub fn advance_us(&self, us: u64) {
        self.time_us.fetch_add(us, Ordering::Relaxed);
    }

    /// Set virtual time to an absolute value.
    pub fn set_us(&self, us: u64) {
        self.time_us.store(us, Ordering::Relaxed);
    }
}

/// Receives frame-pacing hints derived from the simulator's observed
/// step rate, so downstream scheduling can match it.
pub trait FramePacer: Send {
    fn adjust_frame_rate(&mut self, hz: f32);
}
