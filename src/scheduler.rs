//! The "run on next frame" seam between the animator and its host.

/// Token for one outstanding frame request.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct FrameHandle(u64);

impl FrameHandle {
  pub fn new(id: u64) -> Self {
    Self(id)
  }
}

/// Host primitive that calls the animator back on a later frame.
///
/// The host delivers the callback by passing the returned handle to
/// [`crate::animator::ParticleAnimator::on_frame`].
pub trait FrameScheduler {
  fn request_frame(&mut self) -> FrameHandle;
  fn cancel_frame(&mut self, handle: FrameHandle);
}

/// Scheduler driven by hand, one frame at a time.
///
/// Keeps the outstanding request so the caller can [`take`](Self::take_pending)
/// it and deliver it, and counts every call for inspection.
#[derive(Debug, Default)]
pub struct ManualScheduler {
  next_id: u64,
  pending: Option<FrameHandle>,
  requests: usize,
  cancelled: Vec<FrameHandle>,
}

impl ManualScheduler {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn pending(&self) -> Option<FrameHandle> {
    self.pending
  }

  pub fn take_pending(&mut self) -> Option<FrameHandle> {
    self.pending.take()
  }

  /// Number of `request_frame` calls so far.
  pub fn requests(&self) -> usize {
    self.requests
  }

  pub fn cancelled(&self) -> &[FrameHandle] {
    &self.cancelled
  }
}

impl FrameScheduler for ManualScheduler {
  fn request_frame(&mut self) -> FrameHandle {
    self.next_id += 1;
    self.requests += 1;
    let handle = FrameHandle(self.next_id);
    self.pending = Some(handle);
    handle
  }

  fn cancel_frame(&mut self, handle: FrameHandle) {
    if self.pending == Some(handle) {
      self.pending = None;
    }
    self.cancelled.push(handle);
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn handles_are_unique() {
    let mut scheduler = ManualScheduler::new();
    let a = scheduler.request_frame();
    let b = scheduler.request_frame();
    assert_ne!(a, b);
    assert_eq!(scheduler.pending(), Some(b));
    assert_eq!(scheduler.requests(), 2);
  }

  #[test]
  fn cancel_clears_matching_request() {
    let mut scheduler = ManualScheduler::new();
    let a = scheduler.request_frame();
    scheduler.cancel_frame(a);
    assert_eq!(scheduler.pending(), None);
    assert_eq!(scheduler.cancelled(), &[a]);
  }
}
