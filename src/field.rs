use crate::{grid::SpatialGrid, Particle};
use cgmath::MetricSpace;

/// Peak opacity of a link between two coincident particles.
pub const LINK_OPACITY_SCALE: f32 = 0.4;

/// Above this many particles links are found through a [`SpatialGrid`]
/// instead of testing every pair.
pub const GRID_THRESHOLD: usize = 128;

/// A line to draw between particles `a` and `b` (`a < b`).
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Link {
  pub a: usize,
  pub b: usize,
  pub distance: f32,
  pub opacity: f32,
}

/// Linear falloff from [`LINK_OPACITY_SCALE`] at distance 0 to nothing at
/// `link_distance`.
pub fn link_opacity(distance: f32, link_distance: f32) -> f32 {
  (1.0 - distance / link_distance) * LINK_OPACITY_SCALE
}

#[derive(Debug, Default)]
pub struct ParticleField {
  particles: Vec<Particle>,
  grid: Option<SpatialGrid>,
}

impl ParticleField {
  pub fn new(particles: Vec<Particle>) -> Self {
    Self {
      particles,
      grid: None,
    }
  }

  pub fn particles(&self) -> &[Particle] {
    &self.particles
  }

  pub fn len(&self) -> usize {
    self.particles.len()
  }

  pub fn is_empty(&self) -> bool {
    self.particles.is_empty()
  }

  pub fn clear(&mut self) {
    self.particles.clear();
    self.grid = None;
  }

  /// Advances every particle by one step within a `width` × `height` surface.
  pub fn step(&mut self, width: f32, height: f32) {
    for p in &mut self.particles {
      p.advance(width, height);
    }
  }

  /// Every unordered pair closer than `link_distance`, ordered by `(a, b)`.
  pub fn links(&mut self, link_distance: f32) -> Vec<Link> {
    if link_distance <= 0.0 {
      return Vec::new();
    }
    let mut links = if self.particles.len() > GRID_THRESHOLD {
      self.links_by_grid(link_distance)
    } else {
      self.links_by_pairs(link_distance)
    };
    links.sort_by_key(|link| (link.a, link.b));
    links
  }

  fn link_between(&self, a: usize, b: usize, link_distance: f32) -> Option<Link> {
    let (a, b) = (a.min(b), a.max(b));
    let dist_sq = self.particles[a].pos.distance2(self.particles[b].pos);
    if dist_sq < link_distance * link_distance {
      let distance = dist_sq.sqrt();
      Some(Link {
        a,
        b,
        distance,
        opacity: link_opacity(distance, link_distance),
      })
    } else {
      None
    }
  }

  fn links_by_pairs(&self, link_distance: f32) -> Vec<Link> {
    let mut links = Vec::new();
    for a in 0..self.particles.len() {
      for b in a + 1..self.particles.len() {
        links.extend(self.link_between(a, b, link_distance));
      }
    }
    links
  }

  fn links_by_grid(&mut self, link_distance: f32) -> Vec<Link> {
    let mut grid = match self.grid.take() {
      Some(grid) if grid.cell_size() == link_distance => grid,
      _ => SpatialGrid::new(link_distance),
    };
    grid.rebuild(self.particles.iter().map(|p| p.pos));

    let mut links = Vec::new();
    grid.for_each_candidate_pair(|a, b| links.extend(self.link_between(a, b, link_distance)));
    self.grid = Some(grid);
    links
  }
}
