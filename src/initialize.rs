use crate::{Particle, SimulationConfig};
use cgmath::{Point2, Vector2};
use rand::Rng;
use rand_distr::{Distribution, Uniform};

/// Scatters `config.count` particles uniformly over a `width` × `height`
/// surface.
#[must_use]
pub fn create_particles<R: Rng>(
  rng: &mut R,
  config: &SimulationConfig,
  width: f32,
  height: f32,
) -> Vec<Particle> {
  let (min_radius, max_radius) = config.radius_range;
  let radius = Uniform::new_inclusive(min_radius, max_radius.max(min_radius));
  let mut particles = Vec::with_capacity(config.count);
  for _ in 0..config.count {
    let pos = Point2::new(rng.gen::<f32>() * width, rng.gen::<f32>() * height);
    let vel = Vector2::new(
      (rng.gen::<f32>() - 0.5) * config.max_speed,
      (rng.gen::<f32>() - 0.5) * config.max_speed,
    );
    particles.push(Particle {
      pos,
      vel,
      radius: radius.sample(rng),
    });
  }
  particles
}
