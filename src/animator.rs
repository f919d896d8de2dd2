use crate::{
  field::ParticleField,
  initialize::create_particles,
  paint::paint_frame,
  scheduler::{FrameHandle, FrameScheduler},
  surface::DrawSurface,
  throttle::FrameThrottle,
  SimulationConfig, Viewport,
};
use rand::Rng;

/// What a frame callback ended up doing.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FrameOutcome {
  /// Simulated and redrew; carries the number of links drawn.
  Stepped { links: usize },
  /// Too soon after the last step; only the next frame was requested.
  Throttled,
  /// Not the outstanding request (cancelled or already delivered).
  Stale,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct FrameStats {
  pub stepped: u64,
  pub throttled: u64,
}

/// Owns one mounted particle background.
///
/// At most one frame request is outstanding at any time; every delivered
/// request schedules exactly one successor until [`stop`](Self::stop).
pub struct ParticleAnimator<S: FrameScheduler> {
  config: SimulationConfig,
  field: ParticleField,
  throttle: FrameThrottle,
  scheduler: S,
  pending: Option<FrameHandle>,
  listening: bool,
  stats: FrameStats,
}

impl<S: FrameScheduler> ParticleAnimator<S> {
  /// Mounts with the profile that matches `viewport`'s width.
  pub fn start<R: Rng>(
    viewport: Viewport,
    scheduler: S,
    rng: &mut R,
    surface: &mut dyn DrawSurface,
  ) -> Self {
    let config = SimulationConfig::for_viewport_width(viewport.width);
    Self::start_with_config(config, viewport, scheduler, rng, surface)
  }

  pub fn start_with_config<R: Rng>(
    config: SimulationConfig,
    viewport: Viewport,
    mut scheduler: S,
    rng: &mut R,
    surface: &mut dyn DrawSurface,
  ) -> Self {
    surface.resize(viewport.width, viewport.height);
    let particles = create_particles(rng, &config, viewport.width as f32, viewport.height as f32);
    log::info!(
      "particle field mounted: {:?} profile, {} particles, link distance {}, {}x{}",
      config.profile,
      particles.len(),
      config.link_distance,
      viewport.width,
      viewport.height
    );
    let pending = Some(scheduler.request_frame());
    Self {
      config,
      field: ParticleField::new(particles),
      throttle: FrameThrottle::default(),
      scheduler,
      pending,
      listening: true,
      stats: FrameStats::default(),
    }
  }

  pub fn config(&self) -> &SimulationConfig {
    &self.config
  }

  pub fn field(&self) -> &ParticleField {
    &self.field
  }

  pub fn scheduler(&self) -> &S {
    &self.scheduler
  }

  pub fn scheduler_mut(&mut self) -> &mut S {
    &mut self.scheduler
  }

  pub fn stats(&self) -> FrameStats {
    self.stats
  }

  pub fn is_running(&self) -> bool {
    self.pending.is_some()
  }

  /// Frame callback for the request identified by `handle`.
  pub fn on_frame(
    &mut self,
    handle: FrameHandle,
    now_ms: f64,
    surface: &mut dyn DrawSurface,
  ) -> FrameOutcome {
    if self.pending != Some(handle) {
      return FrameOutcome::Stale;
    }
    self.pending = None;

    let outcome = if self.throttle.ready(now_ms) {
      let links = paint_frame(surface, &mut self.field, &self.config);
      self.stats.stepped += 1;
      FrameOutcome::Stepped { links }
    } else {
      self.stats.throttled += 1;
      log::trace!("frame at {now_ms:.1}ms throttled");
      FrameOutcome::Throttled
    };

    self.pending = Some(self.scheduler.request_frame());
    outcome
  }

  /// Resize notification; only the surface's pixel dimensions change.
  pub fn resize(&mut self, viewport: Viewport, surface: &mut dyn DrawSurface) {
    if !self.listening {
      return;
    }
    log::debug!("surface resized to {}x{}", viewport.width, viewport.height);
    surface.resize(viewport.width, viewport.height);
  }

  /// Unmounts: cancels the outstanding request, stops listening for resizes
  /// and drops the particles. Calling it again does nothing.
  pub fn stop(&mut self) {
    if let Some(handle) = self.pending.take() {
      self.scheduler.cancel_frame(handle);
    }
    if self.listening {
      self.listening = false;
      self.field.clear();
      log::info!(
        "particle field unmounted after {} steps ({} throttled)",
        self.stats.stepped,
        self.stats.throttled
      );
    }
  }
}

impl<S: FrameScheduler> Drop for ParticleAnimator<S> {
  fn drop(&mut self) {
    self.stop();
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::scheduler::ManualScheduler;
  use crate::surface::recording::RecordingSurface;
  use crate::Profile;
  use rand::{rngs::SmallRng, SeedableRng};
  use std::cell::RefCell;
  use std::rc::Rc;

  fn mount(width: u32, height: u32) -> (ParticleAnimator<ManualScheduler>, RecordingSurface) {
    let mut surface = RecordingSurface::default();
    let mut rng = SmallRng::seed_from_u64(42);
    let animator = ParticleAnimator::start(
      Viewport::new(width, height),
      ManualScheduler::new(),
      &mut rng,
      &mut surface,
    );
    (animator, surface)
  }

  fn deliver(
    animator: &mut ParticleAnimator<ManualScheduler>,
    now_ms: f64,
    surface: &mut RecordingSurface,
  ) -> FrameOutcome {
    let handle = animator
      .scheduler_mut()
      .take_pending()
      .expect("a frame should be pending");
    animator.on_frame(handle, now_ms, surface)
  }

  #[test]
  fn mount_picks_profile_sizes_surface_and_requests_one_frame() {
    let (animator, surface) = mount(500, 800);
    assert_eq!(animator.config().profile, Profile::Compact);
    assert_eq!(animator.field().len(), 30);
    assert_eq!((surface.width, surface.height), (500, 800));
    assert_eq!(animator.scheduler().requests(), 1);
    assert!(animator.scheduler().pending().is_some());

    let (animator, _) = mount(1200, 800);
    assert_eq!(animator.config().profile, Profile::Full);
    assert_eq!(animator.field().len(), 80);
    assert!(animator.config().shadows);
  }

  #[test]
  fn throttled_callbacks_leave_particles_untouched() {
    let (mut animator, mut surface) = mount(1200, 800);
    assert!(matches!(
      deliver(&mut animator, 40.0, &mut surface),
      FrameOutcome::Stepped { .. }
    ));
    let after_step = animator.field().particles().to_vec();

    for t in [50.0, 56.0, 60.0, 72.9] {
      assert_eq!(deliver(&mut animator, t, &mut surface), FrameOutcome::Throttled);
      assert_eq!(animator.field().particles(), &after_step[..]);
    }

    assert!(matches!(
      deliver(&mut animator, 73.0, &mut surface),
      FrameOutcome::Stepped { .. }
    ));
    assert_ne!(animator.field().particles(), &after_step[..]);
    assert_eq!(
      animator.stats(),
      FrameStats {
        stepped: 2,
        throttled: 4
      }
    );
  }

  #[test]
  fn every_callback_requests_exactly_one_successor() {
    let (mut animator, mut surface) = mount(800, 600);
    for i in 1..=10 {
      deliver(&mut animator, f64::from(i) * 16.0, &mut surface);
      assert_eq!(animator.scheduler().requests(), i as usize + 1);
      assert!(animator.scheduler().pending().is_some());
    }
  }

  #[test]
  fn motion_per_step_ignores_elapsed_time() {
    let (mut short, mut s1) = mount(1200, 800);
    let (mut long, mut s2) = mount(1200, 800);
    deliver(&mut short, 33.0, &mut s1);
    deliver(&mut long, 5_000.0, &mut s2);
    assert_eq!(short.field().particles(), long.field().particles());
  }

  #[test]
  fn resize_touches_only_the_surface() {
    let (mut animator, mut surface) = mount(1200, 800);
    let before = animator.field().particles().to_vec();
    animator.resize(Viewport::new(400, 300), &mut surface);

    assert_eq!((surface.width, surface.height), (400, 300));
    assert_eq!(animator.field().particles(), &before[..]);
    assert_eq!(animator.config().profile, Profile::Full);
  }

  #[test]
  fn stop_cancels_and_nothing_is_scheduled_afterwards() {
    let (mut animator, mut surface) = mount(800, 600);
    deliver(&mut animator, 40.0, &mut surface);
    let outstanding = animator.scheduler().pending().expect("pending frame");

    animator.stop();
    assert_eq!(animator.scheduler().cancelled(), &[outstanding]);
    assert_eq!(animator.scheduler().pending(), None);
    assert!(!animator.is_running());
    assert!(animator.field().is_empty());

    let requests = animator.scheduler().requests();
    assert_eq!(
      animator.on_frame(outstanding, 100.0, &mut surface),
      FrameOutcome::Stale
    );
    animator.stop();
    animator.resize(Viewport::new(10, 10), &mut surface);

    assert_eq!(animator.scheduler().requests(), requests);
    assert_eq!(animator.scheduler().cancelled().len(), 1);
    assert_eq!((surface.width, surface.height), (800, 600));
  }

  /// Hands out a shared [`ManualScheduler`] so calls stay visible after the
  /// animator is gone.
  struct SharedScheduler(Rc<RefCell<ManualScheduler>>);

  impl FrameScheduler for SharedScheduler {
    fn request_frame(&mut self) -> FrameHandle {
      self.0.borrow_mut().request_frame()
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
      self.0.borrow_mut().cancel_frame(handle);
    }
  }

  #[test]
  fn dropping_a_running_animator_cancels_its_frame() {
    let shared = Rc::new(RefCell::new(ManualScheduler::new()));
    let mut surface = RecordingSurface::default();
    let animator = ParticleAnimator::start(
      Viewport::new(800, 600),
      SharedScheduler(shared.clone()),
      &mut SmallRng::seed_from_u64(7),
      &mut surface,
    );
    let outstanding = shared.borrow().pending().expect("pending frame");

    drop(animator);
    let scheduler = shared.borrow();
    assert_eq!(scheduler.pending(), None);
    assert_eq!(scheduler.cancelled(), &[outstanding]);
    assert_eq!(scheduler.requests(), 1);
  }

  #[test]
  fn stale_handle_is_ignored_while_running() {
    let (mut animator, mut surface) = mount(800, 600);
    let old = animator.scheduler_mut().take_pending().expect("pending frame");
    animator.on_frame(old, 40.0, &mut surface);

    assert_eq!(animator.on_frame(old, 80.0, &mut surface), FrameOutcome::Stale);
    assert_eq!(animator.scheduler().requests(), 2);
  }

  #[test]
  fn reflection_happens_on_the_step_that_crosses() {
    let mut surface = RecordingSurface::default();
    let config = SimulationConfig {
      count: 1,
      ..Profile::Compact.config()
    };
    let mut animator = (0..)
      .map(|seed| {
        ParticleAnimator::start_with_config(
          config,
          Viewport::new(100, 100),
          ManualScheduler::new(),
          &mut SmallRng::seed_from_u64(seed),
          &mut surface,
        )
      })
      .find(|a| a.field().particles()[0].vel.x.abs() > 0.1)
      .expect("some seed gives a fast particle");

    let mut t = 0.0;
    let mut crossed = false;
    for _ in 0..2_000 {
      let before = animator.field().particles()[0];
      t += 33.0;
      deliver(&mut animator, t, &mut surface);
      let after = animator.field().particles()[0];
      if before.vel.x > 0.0 && before.pos.x + before.vel.x > 100.0 {
        assert_eq!(after.vel.x, -before.vel.x);
        assert_eq!(after.vel.y.abs(), before.vel.y.abs());
        assert_eq!(after.radius, before.radius);
        crossed = true;
      }
    }
    assert!(crossed, "particle never reached the right edge");
  }
}
