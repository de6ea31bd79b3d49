//! Per-vertex lighting (Gouraud)
//!
//! Lighting is evaluated once per triangle corner before rasterization;
//! the rasterizer only interpolates the resulting colors.

use serde::{Deserialize, Serialize};

use super::math::{Mat4, Vec3};
use super::types::{Color, Color01};

/// A light source
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Light {
    /// Infinitely distant light; `direction` is where the light travels
    Directional { direction: Vec3, intensity: Color01 },
    /// Light emitted from a point in space
    Point { position: Vec3, intensity: Color01 },
}

impl Light {
    pub fn intensity(&self) -> Color01 {
        match *self {
            Light::Directional { intensity, .. } | Light::Point { intensity, .. } => intensity,
        }
    }

    /// Unit vector from `point` toward the light
    pub fn to_light(&self, point: Vec3) -> Vec3 {
        match *self {
            Light::Directional { direction, .. } => (-direction).normalize(),
            Light::Point { position, .. } => (position - point).normalize(),
        }
    }

    /// Move a point light; directional lights have no position
    pub fn translate(&mut self, delta: Vec3) {
        if let Light::Point { position, .. } = self {
            *position = *position + delta;
        }
    }

    /// Same light expressed in another coordinate frame
    pub fn transformed(&self, m: &Mat4) -> Light {
        match *self {
            Light::Directional { direction, intensity } => Light::Directional {
                direction: (direction.to_direction() * *m).xyz(),
                intensity,
            },
            Light::Point { position, intensity } => Light::Point {
                position: (position.to_point() * *m).xyz(),
                intensity,
            },
        }
    }
}

/// Surface reflectance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub name: String,
    pub ambient: Color01,
    pub diffuse: Color01,
    pub specular: Color01,
    /// Specular exponent
    pub shininess: f32,
    /// Opacity, carried from the material library but not blended
    pub dissolve: f32,
    /// Diffuse texture file, relative to the material library
    pub diffuse_map: Option<String>,
}

impl Material {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ambient: Color01::BLACK,
            diffuse: Color01::gray(0.8),
            specular: Color01::BLACK,
            shininess: 1.0,
            dissolve: 1.0,
            diffuse_map: None,
        }
    }

    /// Matte material reflecting a vertex color, used when a group has none
    pub fn from_color(color: Color) -> Self {
        let c = color.to_color01();
        Self {
            name: String::new(),
            ambient: c,
            diffuse: c,
            specular: Color01::BLACK,
            shininess: 1.0,
            dissolve: 1.0,
            diffuse_map: None,
        }
    }
}

impl Default for Material {
    fn default() -> Self {
        Self::new("default")
    }
}

/// Lighting model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShadingModel {
    /// Ambient + diffuse
    Lambertian,
    /// Ambient + diffuse + Blinn-Phong specular highlight
    BlinnPhong,
}

/// Active shader of a scene
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Shader {
    pub model: ShadingModel,
    /// Flat ambient light, modulated by each material's ambient reflectance
    pub ambient: Color01,
}

impl Default for Shader {
    fn default() -> Self {
        Self {
            model: ShadingModel::BlinnPhong,
            ambient: Color01::gray(0.2),
        }
    }
}

impl Shader {
    pub fn new(model: ShadingModel, ambient: Color01) -> Self {
        Self { model, ambient }
    }

    /// Outgoing color at `position` with unit `normal`, seen from `eye`.
    /// Contributions of all lights are summed, then clamped to 0-1.
    pub fn shade(
        &self,
        lights: &[Light],
        material: &Material,
        position: Vec3,
        normal: Vec3,
        eye: Vec3,
    ) -> Color01 {
        let n = normal.normalize();
        let to_eye = (eye - position).normalize();

        let mut color = self.ambient * material.ambient;

        for light in lights {
            let l = light.to_light(position);
            let intensity = light.intensity();

            let lambert = n.dot(l).max(0.0);
            color = color + material.diffuse * intensity.scale(lambert);

            if self.model == ShadingModel::BlinnPhong {
                let h = (to_eye + l).normalize();
                let highlight = h.dot(n).max(0.0).powf(material.shininess);
                color = color + material.specular * intensity.scale(highlight);
            }
        }

        Color01 { a: material.diffuse.a, ..color }.clamp()
    }
}
