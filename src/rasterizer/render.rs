//! Core rendering functions
//! Triangle and line rasterization into a depth-tested fragment buffer

use super::math::{TriangleEdges, Vec2, Vec3, Vec4};
use super::types::{Color, Color01, FragmentBuffer, RasterSettings, Texture};

/// A vertex after perspective divide and viewport transform
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenVertex {
    /// Pixel column
    pub x: f32,
    /// Pixel row (grows downward)
    pub y: f32,
    /// Projected depth, smaller is closer
    pub z: f32,
    /// Reciprocal of the clip-space w, for perspective-correct interpolation
    pub inv_w: f32,
}

impl ScreenVertex {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z, inv_w: 1.0 }
    }

    pub fn with_inv_w(x: f32, y: f32, z: f32, inv_w: f32) -> Self {
        Self { x, y, z, inv_w }
    }

    /// From a viewport-space position whose w was divided out earlier
    pub fn from_viewport(v: Vec4, inv_w: f32) -> Self {
        Self { x: v.x, y: v.y, z: v.z, inv_w }
    }

    fn xy(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite() && self.inv_w.is_finite()
    }
}

/// Texture binding for one triangle
#[derive(Debug, Clone, Copy)]
pub struct TexturedCorners<'a> {
    pub uvs: [Vec2; 3],
    pub texture: &'a Texture,
}

/// Interpolation weights: barycentric, optionally re-weighted by 1/w
#[inline]
fn attribute_weights(bc: Vec3, v: &[ScreenVertex; 3], perspective_correct: bool) -> Vec3 {
    if !perspective_correct {
        return bc;
    }
    let w = Vec3::new(bc.x * v[0].inv_w, bc.y * v[1].inv_w, bc.z * v[2].inv_w);
    let sum = w.x + w.y + w.z;
    if sum.abs() < f32::EPSILON || !sum.is_finite() {
        return bc;
    }
    w.scale(1.0 / sum)
}

#[inline]
fn blend(colors: &[Color01; 3], w: Vec3) -> Color01 {
    colors[0].scale(w.x) + colors[1].scale(w.y) + colors[2].scale(w.z)
}

/// Rasterize a single screen-space triangle, returning the number of
/// fragments written.
///
/// Pixels are sampled at integer coordinates inside the clamped bounding
/// box. A pixel is covered when all barycentric coordinates are >= 0, so
/// pixels on an edge shared by two triangles are written by both; the
/// depth test keeps whichever came first when depths tie.
pub fn rasterize_triangle(
    fb: &mut FragmentBuffer,
    verts: &[ScreenVertex; 3],
    colors: &[Color; 3],
    textured: Option<TexturedCorners<'_>>,
    settings: &RasterSettings,
) -> usize {
    if fb.width == 0 || fb.height == 0 || !verts.iter().all(ScreenVertex::is_finite) {
        return 0;
    }

    let edges = match TriangleEdges::new(verts[0].xy(), verts[1].xy(), verts[2].xy()) {
        Some(edges) => edges,
        None => return 0, // Degenerate triangle
    };

    if settings.backface_cull && edges.signed_area() < 0.0 {
        return 0;
    }

    // Bounding box, clamped to the buffer
    let min_x = verts.iter().map(|v| v.x).fold(f32::INFINITY, f32::min).ceil().max(0.0);
    let max_x = verts.iter().map(|v| v.x).fold(f32::NEG_INFINITY, f32::max).floor();
    let min_y = verts.iter().map(|v| v.y).fold(f32::INFINITY, f32::min).ceil().max(0.0);
    let max_y = verts.iter().map(|v| v.y).fold(f32::NEG_INFINITY, f32::max).floor();
    let max_x = max_x.min(fb.width as f32 - 1.0);
    let max_y = max_y.min(fb.height as f32 - 1.0);
    if min_x > max_x || min_y > max_y {
        return 0;
    }
    let (min_x, max_x) = (min_x as usize, max_x as usize);
    let (min_y, max_y) = (min_y as usize, max_y as usize);

    let colors01 = [colors[0].to_color01(), colors[1].to_color01(), colors[2].to_color01()];
    let mut written = 0;

    for y in min_y..=max_y {
        for x in min_x..=max_x {
            let bc = edges.at(Vec2::new(x as f32, y as f32));
            if bc.x < 0.0 || bc.y < 0.0 || bc.z < 0.0 {
                continue;
            }

            let z = bc.x * verts[0].z + bc.y * verts[1].z + bc.z * verts[2].z;
            if !z.is_finite() {
                continue;
            }

            // Z-buffer test before doing any color work
            let idx = fb.index(x, y);
            if z >= fb.fragments[idx].depth {
                continue;
            }

            let w = attribute_weights(bc, verts, settings.perspective_correct);
            let mut color = blend(&colors01, w);

            if let Some(tex) = &textured {
                let u = w.x * tex.uvs[0].x + w.y * tex.uvs[1].x + w.z * tex.uvs[2].x;
                let v = w.x * tex.uvs[0].y + w.y * tex.uvs[1].y + w.z * tex.uvs[2].y;
                color = color * tex.texture.sample(u, v);
            }

            if fb.write(x, y, z, color.to_color()) {
                written += 1;
            }
        }
    }

    written
}

/// Parametric range [t0, t1] of segment a->b inside the buffer rectangle
fn clip_to_screen(a: Vec2, b: Vec2, width: f32, height: f32) -> Option<(f32, f32)> {
    let d = Vec2::new(b.x - a.x, b.y - a.y);
    let mut t0: f32 = 0.0;
    let mut t1: f32 = 1.0;

    // (p, q) pairs for the four boundaries: x >= 0, x <= w-1, y >= 0, y <= h-1
    let bounds = [
        (-d.x, a.x),
        (d.x, width - 1.0 - a.x),
        (-d.y, a.y),
        (d.y, height - 1.0 - a.y),
    ];
    for (p, q) in bounds {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            t0 = t0.max(r);
        } else {
            t1 = t1.min(r);
        }
        if t0 > t1 {
            return None;
        }
    }
    Some((t0, t1))
}

/// Rasterize a depth-tested line segment, returning the number of
/// fragments written. Depth and color are interpolated along the segment.
pub fn rasterize_line(
    fb: &mut FragmentBuffer,
    a: ScreenVertex,
    b: ScreenVertex,
    color_a: Color,
    color_b: Color,
) -> usize {
    if fb.width == 0 || fb.height == 0 || !a.is_finite() || !b.is_finite() {
        return 0;
    }

    let (t0, t1) = match clip_to_screen(a.xy(), b.xy(), fb.width as f32, fb.height as f32) {
        Some(range) => range,
        None => return 0,
    };

    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let span = (dx.abs().max(dy.abs()) * (t1 - t0)).ceil().max(1.0) as usize;

    let ca = color_a.to_color01();
    let cb = color_b.to_color01();
    let mut written = 0;

    for i in 0..=span {
        let t = t0 + (t1 - t0) * (i as f32 / span as f32);
        let x = (a.x + dx * t).round();
        let y = (a.y + dy * t).round();
        if x < 0.0 || y < 0.0 {
            continue;
        }
        let z = a.z + (b.z - a.z) * t;
        let color = ca.scale(1.0 - t) + cb.scale(t);
        if fb.write(x as usize, y as usize, z, color.to_color()) {
            written += 1;
        }
    }

    written
}
