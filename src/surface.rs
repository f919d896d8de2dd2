use cgmath::Point2;

/// 8-bit colour with a fractional alpha, like a CSS `rgba()`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Rgba {
  pub r: u8,
  pub g: u8,
  pub b: u8,
  pub a: f32,
}

impl Rgba {
  pub const fn new(r: u8, g: u8, b: u8, a: f32) -> Self {
    Self { r, g, b, a }
  }

  pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
    Self::new(r, g, b, 1.0)
  }

  #[must_use]
  pub fn with_alpha(self, a: f32) -> Self {
    Self { a, ..self }
  }
}

/// Soft shadow painted behind a shape.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Glow {
  pub color: Rgba,
  /// Blur extent in pixels.
  pub blur: f32,
}

/// Immediate-mode 2D drawing target.
pub trait DrawSurface {
  fn size(&self) -> (u32, u32);
  /// Resizes the backing store; previous contents are lost.
  fn resize(&mut self, width: u32, height: u32);
  /// Resets every pixel to transparent.
  fn clear(&mut self);
  /// Fills the whole surface with a two-stop gradient along `from` → `to`.
  fn fill_linear_gradient(&mut self, from: Point2<f32>, to: Point2<f32>, start: Rgba, end: Rgba);
  fn fill_circle(&mut self, center: Point2<f32>, radius: f32, color: Rgba, glow: Option<Glow>);
  fn stroke_line(&mut self, from: Point2<f32>, to: Point2<f32>, color: Rgba, width: f32);
}
