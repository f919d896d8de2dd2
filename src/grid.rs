//! Uniform bucket grid for neighbour queries.
//!
//! Particles are hashed into square cells whose side equals the query radius,
//! so every pair closer than that radius lives in the same cell or in one of
//! the eight surrounding cells.

use cgmath::Point2;
use std::collections::HashMap;

/// Cells visited from each cell so that every unordered pair of neighbouring
/// cells is seen exactly once.
const FORWARD_NEIGHBOURS: [(i32, i32); 4] = [(1, 0), (-1, 1), (0, 1), (1, 1)];

#[derive(Debug)]
pub struct SpatialGrid {
  cell_size: f32,
  cells: HashMap<(i32, i32), Vec<usize>>,
}

impl SpatialGrid {
  pub fn new(cell_size: f32) -> Self {
    assert!(cell_size > 0.0, "cell size must be positive");
    Self {
      cell_size,
      cells: HashMap::new(),
    }
  }

  pub fn cell_size(&self) -> f32 {
    self.cell_size
  }

  pub fn cell_of(&self, pos: Point2<f32>) -> (i32, i32) {
    (
      (pos.x / self.cell_size).floor() as i32,
      (pos.y / self.cell_size).floor() as i32,
    )
  }

  /// Rebuilds the buckets from `positions`; indices refer into that slice.
  pub fn rebuild(&mut self, positions: impl IntoIterator<Item = Point2<f32>>) {
    for bucket in self.cells.values_mut() {
      bucket.clear();
    }
    for (i, pos) in positions.into_iter().enumerate() {
      let cell = self.cell_of(pos);
      self.cells.entry(cell).or_default().push(i);
    }
    self.cells.retain(|_, bucket| !bucket.is_empty());
  }

  /// Number of cells holding at least one particle.
  pub fn occupied_cells(&self) -> usize {
    self.cells.len()
  }

  /// Calls `f(i, j)` once for every unordered pair of indices in the same or
  /// adjacent cells.
  pub fn for_each_candidate_pair(&self, mut f: impl FnMut(usize, usize)) {
    for (&(cx, cy), bucket) in &self.cells {
      for (k, &i) in bucket.iter().enumerate() {
        for &j in &bucket[k + 1..] {
          f(i, j);
        }
      }
      for (dx, dy) in FORWARD_NEIGHBOURS {
        let Some(other) = self.cells.get(&(cx + dx, cy + dy)) else {
          continue;
        };
        for &i in bucket {
          for &j in other {
            f(i, j);
          }
        }
      }
    }
  }
}
