//! Software rasterizer
//!
//! Features:
//! - Row-vector affine math (translate, rotate, scale, inverse)
//! - Barycentric triangle rasterization with a strict z-buffer
//! - Perspective-correct color and texture interpolation
//! - Per-vertex Lambertian / Blinn-Phong lighting (Gouraud)

mod math;
mod types;
mod render;
mod shading;

pub use math::*;
pub use types::*;
pub use render::*;
pub use shading::*;
