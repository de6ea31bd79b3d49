//! Core types for the rasterizer

use std::ops::{Add, Mul};
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Depth of a fragment nothing has been written to yet
pub const DEPTH_INF: f32 = f32::INFINITY;

/// RGBA color (0-255 per channel)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Color = Color { r: 0, g: 0, b: 0, a: 255 };
    pub const WHITE: Color = Color { r: 255, g: 255, b: 255, a: 255 };
    pub const RED: Color = Color { r: 255, g: 0, b: 0, a: 255 };
    pub const GREEN: Color = Color { r: 0, g: 255, b: 0, a: 255 };
    pub const BLUE: Color = Color { r: 0, g: 0, b: 255, a: 255 };

    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub fn with_alpha(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Convert to [u8; 4] for framebuffer
    pub fn to_bytes(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }

    pub fn to_color01(self) -> Color01 {
        Color01 {
            r: self.r as f32 / 255.0,
            g: self.g as f32 / 255.0,
            b: self.b as f32 / 255.0,
            a: self.a as f32 / 255.0,
        }
    }
}

/// Normalized RGBA color, each channel nominally in 0.0-1.0.
/// Lighting math accumulates in this space and clamps at the end.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Color01 {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    #[serde(default = "opaque")]
    pub a: f32,
}

fn opaque() -> f32 {
    1.0
}

impl Color01 {
    pub const BLACK: Color01 = Color01 { r: 0.0, g: 0.0, b: 0.0, a: 1.0 };
    pub const WHITE: Color01 = Color01 { r: 1.0, g: 1.0, b: 1.0, a: 1.0 };

    pub fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub fn gray(v: f32) -> Self {
        Self::new(v, v, v)
    }

    pub fn scale(self, s: f32) -> Self {
        Self {
            r: self.r * s,
            g: self.g * s,
            b: self.b * s,
            a: self.a,
        }
    }

    /// Clamp every channel to 0.0-1.0
    pub fn clamp(self) -> Self {
        Self {
            r: self.r.clamp(0.0, 1.0),
            g: self.g.clamp(0.0, 1.0),
            b: self.b.clamp(0.0, 1.0),
            a: self.a.clamp(0.0, 1.0),
        }
    }

    pub fn to_color(self) -> Color {
        let c = self.clamp();
        Color {
            r: (c.r * 255.0).round() as u8,
            g: (c.g * 255.0).round() as u8,
            b: (c.b * 255.0).round() as u8,
            a: (c.a * 255.0).round() as u8,
        }
    }
}

impl Add for Color01 {
    type Output = Color01;
    fn add(self, other: Color01) -> Color01 {
        Color01 {
            r: self.r + other.r,
            g: self.g + other.g,
            b: self.b + other.b,
            a: self.a.max(other.a),
        }
    }
}

/// Channel-wise modulation
impl Mul for Color01 {
    type Output = Color01;
    fn mul(self, other: Color01) -> Color01 {
        Color01 {
            r: self.r * other.r,
            g: self.g * other.g,
            b: self.b * other.b,
            a: self.a * other.a,
        }
    }
}

impl From<Color> for Color01 {
    fn from(c: Color) -> Self {
        c.to_color01()
    }
}

/// Error type for texture decoding
#[derive(Debug, Error)]
pub enum TextureError {
    #[error("failed to load {path}: {source}")]
    Load {
        path: String,
        #[source]
        source: image::ImageError,
    },
    #[error("texture has no pixels")]
    Empty,
}

/// Texture bitmap (row 0 is the top of the image)
#[derive(Debug, Clone)]
pub struct Texture {
    pub width: usize,
    pub height: usize,
    pub pixels: Vec<Color>,
    pub name: String,
}

impl Texture {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            pixels: vec![Color::WHITE; width * height],
            name: String::new(),
        }
    }

    /// Load texture from an image file (png, jpeg, bmp)
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, TextureError> {
        let path = path.as_ref();
        let img = image::open(path).map_err(|source| TextureError::Load {
            path: path.display().to_string(),
            source,
        })?;

        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();

        Self::from_image(img, name)
    }

    fn from_image(img: image::DynamicImage, name: String) -> Result<Self, TextureError> {
        let rgba = img.to_rgba8();
        let (width, height) = rgba.dimensions();
        if width == 0 || height == 0 {
            return Err(TextureError::Empty);
        }

        let pixels: Vec<Color> = rgba
            .pixels()
            .map(|p| Color::with_alpha(p[0], p[1], p[2], p[3]))
            .collect();

        Ok(Self {
            width: width as usize,
            height: height as usize,
            pixels,
            name,
        })
    }

    /// Create a checkerboard test texture
    pub fn checkerboard(width: usize, height: usize, color1: Color, color2: Color) -> Self {
        let mut pixels = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                let checker = ((x / 4) + (y / 4)) % 2 == 0;
                pixels.push(if checker { color1 } else { color2 });
            }
        }
        Self { width, height, pixels, name: "checkerboard".to_string() }
    }

    /// Sample at normalized UV, v measured from the bottom of the texture.
    /// Coordinates outside 0-1 wrap around; no filtering.
    pub fn sample(&self, u: f32, v: f32) -> Color01 {
        if self.width == 0 || self.height == 0 || !u.is_finite() || !v.is_finite() {
            return Color01::WHITE;
        }
        let u = u.rem_euclid(1.0);
        let v = v.rem_euclid(1.0);
        let tx = ((u * self.width as f32) as usize).min(self.width - 1);
        let ty = (((1.0 - v) * self.height as f32) as usize).min(self.height - 1);
        self.pixels[ty * self.width + tx].to_color01()
    }
}

/// One cell of the fragment grid
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fragment {
    pub color: Color,
    pub depth: f32,
}

impl Fragment {
    pub const EMPTY: Fragment = Fragment {
        color: Color::BLACK,
        depth: DEPTH_INF,
    };

    pub fn is_written(&self) -> bool {
        self.depth < DEPTH_INF
    }
}

impl Default for Fragment {
    fn default() -> Self {
        Fragment::EMPTY
    }
}

/// Height x width grid of depth-tested fragments, row-major
#[derive(Debug, Clone, PartialEq)]
pub struct FragmentBuffer {
    pub width: usize,
    pub height: usize,
    pub fragments: Vec<Fragment>,
}

impl FragmentBuffer {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            fragments: vec![Fragment::EMPTY; width * height],
        }
    }

    /// Reset every cell to the empty fragment, reallocating on size change
    pub fn clear(&mut self) {
        let len = self.width * self.height;
        if self.fragments.len() != len {
            self.fragments = vec![Fragment::EMPTY; len];
        } else {
            self.fragments.fill(Fragment::EMPTY);
        }
    }

    pub fn resize(&mut self, width: usize, height: usize) {
        self.width = width;
        self.height = height;
        self.clear();
    }

    #[inline]
    pub fn index(&self, x: usize, y: usize) -> usize {
        y * self.width + x
    }

    pub fn get(&self, x: usize, y: usize) -> Option<&Fragment> {
        if x < self.width && y < self.height {
            Some(&self.fragments[self.index(x, y)])
        } else {
            None
        }
    }

    /// Depth-gated write. Only a strictly closer depth replaces the cell.
    pub fn write(&mut self, x: usize, y: usize, depth: f32, color: Color) -> bool {
        if x < self.width && y < self.height {
            let idx = self.index(x, y);
            let fragment = &mut self.fragments[idx];
            if depth < fragment.depth {
                fragment.depth = depth;
                fragment.color = color;
                return true;
            }
        }
        false
    }

    /// Cells that received a fragment this frame, as (x, y, fragment)
    pub fn iter_written(&self) -> impl Iterator<Item = (usize, usize, &Fragment)> + '_ {
        let width = self.width;
        self.fragments
            .iter()
            .enumerate()
            .filter(|(_, f)| f.is_written())
            .map(move |(i, f)| (i % width, i / width, f))
    }

    pub fn written_count(&self) -> usize {
        self.fragments.iter().filter(|f| f.is_written()).count()
    }

    /// Flatten to RGBA bytes; unwritten cells get `background`
    pub fn to_rgba_bytes(&self, background: Color) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.fragments.len() * 4);
        for fragment in &self.fragments {
            let color = if fragment.is_written() { fragment.color } else { background };
            bytes.extend_from_slice(&color.to_bytes());
        }
        bytes
    }
}

/// Rasterizer settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RasterSettings {
    /// Interpolate colors and texcoords with 1/w weights (false = affine)
    pub perspective_correct: bool,
    /// Skip triangles wound clockwise on screen
    pub backface_cull: bool,
}

impl Default for RasterSettings {
    fn default() -> Self {
        Self {
            perspective_correct: true,
            backface_cull: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fragment_write_is_depth_gated() {
        let mut fb = FragmentBuffer::new(4, 4);
        assert!(fb.write(1, 1, 0.5, Color::RED));
        assert!(!fb.write(1, 1, 0.5, Color::GREEN));
        assert!(!fb.write(1, 1, 0.9, Color::GREEN));
        assert!(fb.write(1, 1, 0.1, Color::BLUE));
        assert_eq!(fb.get(1, 1).unwrap().color, Color::BLUE);
        assert!(!fb.write(4, 0, 0.0, Color::RED));
    }

    #[test]
    fn test_clear_resets_depth() {
        let mut fb = FragmentBuffer::new(3, 2);
        fb.write(2, 1, 0.0, Color::WHITE);
        assert_eq!(fb.written_count(), 1);
        fb.clear();
        assert_eq!(fb.written_count(), 0);
        assert!(!fb.get(2, 1).unwrap().is_written());
    }

    #[test]
    fn test_iter_written_reports_coordinates() {
        let mut fb = FragmentBuffer::new(5, 5);
        fb.write(3, 2, 0.2, Color::GREEN);
        let cells: Vec<_> = fb.iter_written().map(|(x, y, f)| (x, y, f.color)).collect();
        assert_eq!(cells, vec![(3, 2, Color::GREEN)]);
    }

    #[test]
    fn test_rgba_bytes_use_background() {
        let mut fb = FragmentBuffer::new(2, 1);
        fb.write(1, 0, 0.0, Color::RED);
        let bytes = fb.to_rgba_bytes(Color::with_alpha(1, 2, 3, 4));
        assert_eq!(bytes, vec![1, 2, 3, 4, 255, 0, 0, 255]);
    }

    #[test]
    fn test_texture_sample_v_from_bottom() {
        let mut tex = Texture::new(2, 2);
        tex.pixels[0] = Color::RED; // top-left
        tex.pixels[2] = Color::BLUE; // bottom-left
        assert_eq!(tex.sample(0.1, 0.9).to_color(), Color::RED);
        assert_eq!(tex.sample(0.1, 0.1).to_color(), Color::BLUE);
    }

    #[test]
    fn test_texture_sample_wraps() {
        let tex = Texture::checkerboard(8, 8, Color::WHITE, Color::BLACK);
        assert_eq!(tex.sample(1.25, 0.4), tex.sample(0.25, 0.4));
        assert_eq!(tex.sample(-0.75, -0.6), tex.sample(0.25, 0.4));
        assert_eq!(tex.sample(1.0, 1.0), tex.sample(0.0, 0.0));
    }

    #[test]
    fn test_missing_texture_file() {
        let err = Texture::from_file("no/such/texture.png").unwrap_err();
        assert!(matches!(err, TextureError::Load { .. }));
        assert!(err.to_string().contains("texture.png"));
    }

    #[test]
    fn test_color01_round_trip() {
        let c = Color::new(10, 128, 250);
        assert_eq!(c.to_color01().to_color(), c);
        assert_eq!(Color01::new(2.0, -1.0, 0.5).to_color(), Color::new(255, 0, 128));
    }
}
