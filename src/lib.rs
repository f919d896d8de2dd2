pub mod animator;
pub mod canvas;
pub mod field;
pub mod grid;
pub mod initialize;
pub mod paint;
pub mod render;
pub mod scheduler;
pub mod state;
pub mod surface;
pub mod throttle;

use cgmath::{Point2, Vector2};

/// Viewports narrower than this (in logical pixels) get the compact profile.
pub const COMPACT_WIDTH_THRESHOLD: u32 = 640;

/// Size of the host viewport in logical pixels.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Viewport {
  pub width: u32,
  pub height: u32,
}

impl Viewport {
  pub fn new(width: u32, height: u32) -> Self {
    Self { width, height }
  }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum Profile {
  /// Fewer particles, shorter links, no glow.
  Compact,
  /// Denser field with glow.
  Full,
}

impl Profile {
  #[must_use]
  pub fn for_viewport_width(width: u32) -> Self {
    if width < COMPACT_WIDTH_THRESHOLD {
      Profile::Compact
    } else {
      Profile::Full
    }
  }

  #[must_use]
  pub fn config(self) -> SimulationConfig {
    match self {
      Profile::Compact => SimulationConfig {
        profile: self,
        count: 30,
        max_speed: 0.6,
        link_distance: 70.0,
        radius_range: (1.0, 3.0),
        shadows: false,
      },
      Profile::Full => SimulationConfig {
        profile: self,
        count: 80,
        max_speed: 0.6,
        link_distance: 110.0,
        radius_range: (1.0, 3.0),
        shadows: true,
      },
    }
  }
}

/// Parameters of one particle field, fixed for the lifetime of a mount.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SimulationConfig {
  pub profile: Profile,
  pub count: usize,
  /// Full width of the per-axis velocity range; components fall in
  /// `[-max_speed / 2, max_speed / 2]`.
  pub max_speed: f32,
  pub link_distance: f32,
  /// Inclusive `(min, max)` particle radius.
  pub radius_range: (f32, f32),
  pub shadows: bool,
}

impl SimulationConfig {
  #[must_use]
  pub fn for_viewport_width(width: u32) -> Self {
    Profile::for_viewport_width(width).config()
  }
}

impl Default for SimulationConfig {
  fn default() -> Self {
    Profile::Full.config()
  }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Particle {
  pub pos: Point2<f32>,
  pub vel: Vector2<f32>,
  pub radius: f32,
}

impl Particle {
  /// Moves the particle by one step and negates the velocity of any axis
  /// whose new position is outside `[0, width]` / `[0, height]`.
  ///
  /// The position is never clamped, so a particle can overshoot an edge by up
  /// to one step before turning around. One left outside by a shrinking
  /// surface flips on every step and stays where it is.
  pub fn advance(&mut self, width: f32, height: f32) {
    self.pos += self.vel;
    if self.pos.x < 0.0 || self.pos.x > width {
      self.vel.x = -self.vel.x;
    }
    if self.pos.y < 0.0 || self.pos.y > height {
      self.vel.y = -self.vel.y;
    }
  }
}
