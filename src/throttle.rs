/// Minimum spacing between executed steps, capping the effect at ~30 Hz.
pub const FRAME_INTERVAL_MS: f64 = 33.0;

/// Soft rate limiter for frame callbacks.
///
/// Only decides whether a callback may run a step; it never reports elapsed
/// time, so motion per executed step is the same at any host refresh rate.
#[derive(Copy, Clone, Debug)]
pub struct FrameThrottle {
  last_frame_ms: f64,
  min_interval_ms: f64,
}

impl Default for FrameThrottle {
  fn default() -> Self {
    Self::new(FRAME_INTERVAL_MS)
  }
}

impl FrameThrottle {
  pub fn new(min_interval_ms: f64) -> Self {
    Self {
      last_frame_ms: 0.0,
      min_interval_ms,
    }
  }

  /// Returns true and records `now_ms` when enough time has passed since the
  /// last executed step.
  pub fn ready(&mut self, now_ms: f64) -> bool {
    if now_ms - self.last_frame_ms < self.min_interval_ms {
      return false;
    }
    self.last_frame_ms = now_ms;
    true
  }

  pub fn last_frame_ms(&self) -> f64 {
    self.last_frame_ms
  }
}
