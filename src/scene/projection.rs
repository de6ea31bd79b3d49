//! Orthographic and perspective projection
//!
//! Both projections use a fixed 60 degree horizontal field of view with the
//! vertical field of view scaled by the view's aspect ratio, and map the
//! near plane to depth -1 and the far plane to +1.

use std::f32::consts::FRAC_PI_3;

use serde::{Deserialize, Serialize};

use crate::rasterizer::Mat4;

/// Horizontal field of view in radians
pub const HORIZONTAL_FOV: f32 = FRAC_PI_3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ProjectionMode {
    Orthographic,
    #[default]
    Perspective,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Projection {
    pub width: f32,
    pub height: f32,
    pub near: f32,
    pub far: f32,
    pub mode: ProjectionMode,
}

impl Default for Projection {
    fn default() -> Self {
        Self {
            width: 1024.0,
            height: 768.0,
            near: 0.1,
            far: 100.0,
            mode: ProjectionMode::Perspective,
        }
    }
}

impl Projection {
    pub fn new(width: f32, height: f32, near: f32, far: f32, mode: ProjectionMode) -> Self {
        Self { width, height, near, far, mode }
    }

    pub fn vertical_fov(&self) -> f32 {
        HORIZONTAL_FOV * (self.height / self.width)
    }

    /// Half extents (right, top) of the view window on the near plane
    fn near_window(&self) -> (f32, f32) {
        let right = (HORIZONTAL_FOV / 2.0).tan() * self.near;
        let top = (self.vertical_fov() / 2.0).tan() * self.near;
        (right, top)
    }

    /// Box projection of the near-plane window; w stays 1
    pub fn orthographic_matrix(&self) -> Mat4 {
        let (right, top) = self.near_window();
        let (left, bottom) = (-right, -top);
        let (n, f) = (self.near, self.far);

        Mat4::from_rows([
            [2.0 / (right - left), 0.0, 0.0, 0.0],
            [0.0, 2.0 / (top - bottom), 0.0, 0.0],
            [0.0, 0.0, 2.0 / (f - n), 0.0],
            [
                -(right + left) / (right - left),
                -(top + bottom) / (top - bottom),
                -(f + n) / (f - n),
                1.0,
            ],
        ])
    }

    /// Frustum projection; clip-space w is the view-space z
    pub fn perspective_matrix(&self) -> Mat4 {
        let (right, top) = self.near_window();
        let (left, bottom) = (-right, -top);
        let (n, f) = (self.near, self.far);

        Mat4::from_rows([
            [2.0 * n / (right - left), 0.0, 0.0, 0.0],
            [0.0, 2.0 * n / (top - bottom), 0.0, 0.0],
            [0.0, 0.0, (f + n) / (f - n), 1.0],
            [0.0, 0.0, -2.0 * n * f / (f - n), 0.0],
        ])
    }

    pub fn matrix(&self) -> Mat4 {
        match self.mode {
            ProjectionMode::Orthographic => self.orthographic_matrix(),
            ProjectionMode::Perspective => self.perspective_matrix(),
        }
    }

    /// Normalized device coordinates -> pixels, y growing downward
    pub fn viewport_matrix(&self) -> Mat4 {
        viewport_matrix(self.width, self.height)
    }
}

/// Maps x, y in -1..1 to 0..width, height..0; depth passes through
pub fn viewport_matrix(width: f32, height: f32) -> Mat4 {
    let hw = width / 2.0;
    let hh = height / 2.0;
    Mat4::from_rows([
        [hw, 0.0, 0.0, 0.0],
        [0.0, -hh, 0.0, 0.0],
        [0.0, 0.0, 1.0, 0.0],
        [hw, hh, 0.0, 1.0],
    ])
}
