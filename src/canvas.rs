//! CPU rasteriser behind [`DrawSurface`].
//!
//! Pixels are straight-alpha RGBA8 in row-major order, composited with
//! source-over blending. Shapes are anti-aliased by pixel-centre coverage.

use crate::surface::{DrawSurface, Glow, Rgba};
use cgmath::{InnerSpace, MetricSpace, Point2};
use std::ops::Range;

#[derive(Clone, Debug, Default)]
pub struct PixelCanvas {
  width: u32,
  height: u32,
  pixels: Vec<[u8; 4]>,
}

impl PixelCanvas {
  pub fn new(width: u32, height: u32) -> Self {
    Self {
      width,
      height,
      pixels: vec![[0; 4]; width as usize * height as usize],
    }
  }

  pub fn pixels(&self) -> &[[u8; 4]] {
    &self.pixels
  }

  pub fn as_bytes(&self) -> &[u8] {
    bytemuck::cast_slice(&self.pixels)
  }

  pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
    if x >= self.width || y >= self.height {
      return None;
    }
    Some(self.pixels[(y * self.width + x) as usize])
  }

  /// Pixel ranges touched by the box `min`..`max`, clipped to the canvas.
  fn clip(&self, min: Point2<f32>, max: Point2<f32>) -> Option<(Range<usize>, Range<usize>)> {
    let x0 = min.x.floor().max(0.0) as i64;
    let y0 = min.y.floor().max(0.0) as i64;
    let x1 = (max.x.ceil() as i64).min(self.width as i64);
    let y1 = (max.y.ceil() as i64).min(self.height as i64);
    if x0 >= x1 || y0 >= y1 {
      return None;
    }
    Some((x0 as usize..x1 as usize, y0 as usize..y1 as usize))
  }

  fn blend(&mut self, x: usize, y: usize, color: Rgba, coverage: f32) {
    let alpha = (color.a * coverage).clamp(0.0, 1.0);
    if alpha <= 0.0 {
      return;
    }
    let dst = &mut self.pixels[y * self.width as usize + x];
    let dst_alpha = f32::from(dst[3]) / 255.0;
    let out_alpha = alpha + dst_alpha * (1.0 - alpha);
    let channel = |src: u8, dst: u8| {
      let mixed = f32::from(src) * alpha + f32::from(dst) * dst_alpha * (1.0 - alpha);
      (mixed / out_alpha).round().clamp(0.0, 255.0) as u8
    };
    *dst = [
      channel(color.r, dst[0]),
      channel(color.g, dst[1]),
      channel(color.b, dst[2]),
      (out_alpha * 255.0).round() as u8,
    ];
  }

  fn paint_glow(&mut self, center: Point2<f32>, radius: f32, fill_alpha: f32, glow: Glow) {
    if glow.blur <= 0.0 {
      return;
    }
    let sigma = glow.blur / 2.0;
    let reach = radius + 3.0 * sigma;
    let Some((xs, ys)) = self.clip(
      Point2::new(center.x - reach, center.y - reach),
      Point2::new(center.x + reach, center.y + reach),
    ) else {
      return;
    };
    let color = glow.color.with_alpha(glow.color.a * fill_alpha);
    for y in ys {
      for x in xs.clone() {
        let outside = (pixel_center(x, y).distance(center) - radius).max(0.0);
        let falloff = (-(outside * outside) / (2.0 * sigma * sigma)).exp();
        self.blend(x, y, color, falloff);
      }
    }
  }
}

fn pixel_center(x: usize, y: usize) -> Point2<f32> {
  Point2::new(x as f32 + 0.5, y as f32 + 0.5)
}

fn lerp_channel(a: u8, b: u8, t: f32) -> u8 {
  (f32::from(a) + (f32::from(b) - f32::from(a)) * t).round() as u8
}

impl DrawSurface for PixelCanvas {
  fn size(&self) -> (u32, u32) {
    (self.width, self.height)
  }

  fn resize(&mut self, width: u32, height: u32) {
    *self = PixelCanvas::new(width, height);
  }

  fn clear(&mut self) {
    self.pixels.fill([0; 4]);
  }

  fn fill_linear_gradient(&mut self, from: Point2<f32>, to: Point2<f32>, start: Rgba, end: Rgba) {
    let axis = to - from;
    let len_sq = axis.magnitude2();
    for y in 0..self.height as usize {
      for x in 0..self.width as usize {
        let t = if len_sq > 0.0 {
          ((pixel_center(x, y) - from).dot(axis) / len_sq).clamp(0.0, 1.0)
        } else {
          0.0
        };
        let color = Rgba::new(
          lerp_channel(start.r, end.r, t),
          lerp_channel(start.g, end.g, t),
          lerp_channel(start.b, end.b, t),
          start.a + (end.a - start.a) * t,
        );
        self.blend(x, y, color, 1.0);
      }
    }
  }

  fn fill_circle(&mut self, center: Point2<f32>, radius: f32, color: Rgba, glow: Option<Glow>) {
    if let Some(glow) = glow {
      self.paint_glow(center, radius, color.a, glow);
    }
    let reach = radius + 1.0;
    let Some((xs, ys)) = self.clip(
      Point2::new(center.x - reach, center.y - reach),
      Point2::new(center.x + reach, center.y + reach),
    ) else {
      return;
    };
    for y in ys {
      for x in xs.clone() {
        let coverage = (radius - pixel_center(x, y).distance(center) + 0.5).clamp(0.0, 1.0);
        self.blend(x, y, color, coverage);
      }
    }
  }

  fn stroke_line(&mut self, from: Point2<f32>, to: Point2<f32>, color: Rgba, width: f32) {
    let half = width / 2.0;
    let pad = half + 1.0;
    let Some((xs, ys)) = self.clip(
      Point2::new(from.x.min(to.x) - pad, from.y.min(to.y) - pad),
      Point2::new(from.x.max(to.x) + pad, from.y.max(to.y) + pad),
    ) else {
      return;
    };
    let axis = to - from;
    let len_sq = axis.magnitude2();
    for y in ys {
      for x in xs.clone() {
        let p = pixel_center(x, y);
        let t = if len_sq > 0.0 {
          ((p - from).dot(axis) / len_sq).clamp(0.0, 1.0)
        } else {
          0.0
        };
        let nearest = from + axis * t;
        let coverage = (half + 0.5 - p.distance(nearest)).clamp(0.0, 1.0);
        self.blend(x, y, color, coverage);
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use cgmath::EuclideanSpace;

  const BLACK: Rgba = Rgba::opaque(0, 0, 0);
  const WHITE: Rgba = Rgba::opaque(255, 255, 255);

  fn black_canvas(width: u32, height: u32) -> PixelCanvas {
    let mut canvas = PixelCanvas::new(width, height);
    canvas.fill_linear_gradient(Point2::origin(), Point2::new(1.0, 1.0), BLACK, BLACK);
    canvas
  }

  #[test]
  fn new_canvas_is_transparent() {
    let canvas = PixelCanvas::new(4, 3);
    assert_eq!(canvas.size(), (4, 3));
    assert_eq!(canvas.as_bytes().len(), 4 * 3 * 4);
    assert!(canvas.pixels().iter().all(|p| *p == [0; 4]));
  }

  #[test]
  fn resize_reallocates_and_clears() {
    let mut canvas = black_canvas(2, 2);
    canvas.resize(5, 1);
    assert_eq!(canvas.size(), (5, 1));
    assert_eq!(canvas.pixels().len(), 5);
    assert_eq!(canvas.pixel(4, 0), Some([0; 4]));
    assert_eq!(canvas.pixel(0, 1), None);
  }

  #[test]
  fn diagonal_gradient_runs_corner_to_corner() {
    let mut canvas = PixelCanvas::new(100, 100);
    canvas.fill_linear_gradient(Point2::origin(), Point2::new(100.0, 100.0), BLACK, WHITE);
    let top_left = canvas.pixel(0, 0).unwrap();
    let bottom_right = canvas.pixel(99, 99).unwrap();
    let middle = canvas.pixel(49, 50).unwrap();
    assert!(top_left[0] < 5);
    assert!(bottom_right[0] > 250);
    assert!((120..=135).contains(&middle[0]));
    assert_eq!(middle[3], 255);
  }

  #[test]
  fn circle_blends_over_the_backdrop() {
    let mut canvas = black_canvas(20, 20);
    canvas.fill_circle(Point2::new(10.0, 10.0), 3.0, Rgba::new(100, 200, 0, 0.5), None);
    assert_eq!(canvas.pixel(10, 10), Some([50, 100, 0, 255]));
    assert_eq!(canvas.pixel(0, 0), Some([0, 0, 0, 255]));
  }

  #[test]
  fn glow_reaches_past_the_edge() {
    let mut plain = black_canvas(40, 40);
    let mut glowing = black_canvas(40, 40);
    let glow = Glow {
      color: WHITE,
      blur: 8.0,
    };
    plain.fill_circle(Point2::new(20.0, 20.0), 2.0, WHITE, None);
    glowing.fill_circle(Point2::new(20.0, 20.0), 2.0, WHITE, Some(glow));
    assert_eq!(plain.pixel(25, 20), Some([0, 0, 0, 255]));
    assert!(glowing.pixel(25, 20).unwrap()[0] > 0);
  }

  #[test]
  fn line_covers_its_own_pixels_only() {
    let mut canvas = black_canvas(20, 20);
    canvas.stroke_line(Point2::new(2.0, 10.5), Point2::new(18.0, 10.5), WHITE, 1.0);
    assert_eq!(canvas.pixel(10, 10), Some([255, 255, 255, 255]));
    assert_eq!(canvas.pixel(10, 12), Some([0, 0, 0, 255]));
    assert_eq!(canvas.pixel(10, 5), Some([0, 0, 0, 255]));
  }

  #[test]
  fn shapes_off_canvas_are_clipped() {
    let mut canvas = black_canvas(10, 10);
    let before = canvas.pixels().to_vec();
    canvas.fill_circle(Point2::new(-20.0, -20.0), 3.0, WHITE, None);
    canvas.stroke_line(Point2::new(30.0, 30.0), Point2::new(50.0, 40.0), WHITE, 1.0);
    assert_eq!(canvas.pixels(), &before[..]);
  }
}
