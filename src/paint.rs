use crate::{
  field::ParticleField,
  surface::{DrawSurface, Glow, Rgba},
  SimulationConfig,
};
use cgmath::Point2;

pub const BACKDROP_START: Rgba = Rgba::opaque(0x0f, 0x17, 0x2a);
pub const BACKDROP_END: Rgba = Rgba::opaque(0x11, 0x18, 0x27);
pub const PARTICLE_FILL: Rgba = Rgba::new(99, 102, 241, 0.7);
pub const PARTICLE_GLOW: Glow = Glow {
  color: Rgba::opaque(0x60, 0xa5, 0xfa),
  blur: 8.0,
};
pub const LINK_COLOR: Rgba = Rgba::opaque(96, 165, 250);
pub const LINK_WIDTH: f32 = 1.0;

/// Runs one executed frame: simulate one step, then redraw the whole surface.
///
/// Returns the number of links drawn.
pub fn paint_frame(
  surface: &mut dyn DrawSurface,
  field: &mut ParticleField,
  config: &SimulationConfig,
) -> usize {
  let (width, height) = surface.size();
  let (width, height) = (width as f32, height as f32);

  surface.clear();
  surface.fill_linear_gradient(
    Point2::new(0.0, 0.0),
    Point2::new(width, height),
    BACKDROP_START,
    BACKDROP_END,
  );

  field.step(width, height);
  let glow = config.shadows.then_some(PARTICLE_GLOW);
  for p in field.particles() {
    surface.fill_circle(p.pos, p.radius, PARTICLE_FILL, glow);
  }

  let links = field.links(config.link_distance);
  let particles = field.particles();
  for link in &links {
    surface.stroke_line(
      particles[link.a].pos,
      particles[link.b].pos,
      LINK_COLOR.with_alpha(link.opacity),
      LINK_WIDTH,
    );
  }
  links.len()
}
