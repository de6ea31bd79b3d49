//! Scene description files
//!
//! A scene file is RON: view size, camera, projection, lights, shader,
//! render mode and the models to load. Every field has a default, so `()`
//! is a valid (empty) scene.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::{info, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::obj::{load_obj, ObjModel};
use crate::rasterizer::{Color01, Light, Mat4, RasterSettings, Shader, Texture, Vec3};
use crate::scene::{Camera, ProjectionMode, RenderMode, Scene};

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] ron::error::SpannedError),
    #[error("Serialize error: {0}")]
    Serialize(#[from] ron::Error),
}

/// Where the camera stands and what it faces
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum CameraConfig {
    LookAt { from: Vec3, to: Vec3 },
    Posture { position: Vec3, heading: f32, pitch: f32, roll: f32 },
}

impl Default for CameraConfig {
    fn default() -> Self {
        CameraConfig::LookAt {
            from: Vec3::new(3.0, 2.5, -4.0),
            to: Vec3::ZERO,
        }
    }
}

impl CameraConfig {
    pub fn to_camera(&self) -> Camera {
        match *self {
            CameraConfig::LookAt { from, to } => {
                let mut camera = Camera::new();
                camera.look_at(from, to);
                camera
            }
            CameraConfig::Posture { position, heading, pitch, roll } => {
                Camera::with_posture(position, heading, pitch, roll)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectionConfig {
    pub near: f32,
    pub far: f32,
    pub mode: ProjectionMode,
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        Self {
            near: 0.1,
            far: 100.0,
            mode: ProjectionMode::Perspective,
        }
    }
}

fn one() -> f32 {
    1.0
}

/// A model file and the transform baked into it on load
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Relative to the scene file's directory
    pub path: PathBuf,
    #[serde(default)]
    pub translate: Vec3,
    /// Euler angles in radians, applied x then y then z
    #[serde(default)]
    pub rotate: Vec3,
    #[serde(default = "one")]
    pub scale: f32,
}

impl ModelConfig {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            path: path.into(),
            translate: Vec3::ZERO,
            rotate: Vec3::ZERO,
            scale: 1.0,
        }
    }

    /// Scale, then rotate, then translate
    pub fn matrix(&self) -> Mat4 {
        Mat4::scale(self.scale, self.scale, self.scale)
            * Mat4::rotate_x(self.rotate.x)
            * Mat4::rotate_y(self.rotate.y)
            * Mat4::rotate_z(self.rotate.z)
            * Mat4::translate(self.translate.x, self.translate.y, self.translate.z)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub width: usize,
    pub height: usize,
    pub camera: CameraConfig,
    pub projection: ProjectionConfig,
    pub lights: Vec<Light>,
    /// None renders vertex colors only
    pub shader: Option<Shader>,
    pub render_mode: RenderMode,
    pub settings: RasterSettings,
    pub show_axis: bool,
    /// Seed for the colors of faces without a material; random when unset
    pub seed: Option<u64>,
    /// Model rotation about y, radians per second
    pub spin: f32,
    pub models: Vec<ModelConfig>,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
            camera: CameraConfig::default(),
            projection: ProjectionConfig::default(),
            lights: vec![Light::Point {
                position: Vec3::new(5.0, 6.0, -4.0),
                intensity: Color01::gray(0.9),
            }],
            shader: Some(Shader::default()),
            render_mode: RenderMode::Shaded,
            settings: RasterSettings::default(),
            show_axis: false,
            seed: None,
            spin: 0.5,
            models: Vec::new(),
        }
    }
}

impl SceneConfig {
    /// Build a scene, loading models relative to `base_dir`. Models that
    /// fail to load are logged and left out.
    pub fn build(&self, base_dir: &Path) -> Scene {
        let mut scene = Scene::new(self.width, self.height);
        scene.projection.near = self.projection.near;
        scene.projection.far = self.projection.far;
        scene.projection.mode = self.projection.mode;
        scene.camera = self.camera.to_camera();
        scene.lights = self.lights.clone();
        scene.shader = self.shader;
        scene.render_mode = self.render_mode;
        scene.settings = self.settings;
        scene.show_axis = self.show_axis;

        let seed = self.seed.unwrap_or_else(|| rand::rng().random());
        let mut rng = StdRng::seed_from_u64(seed);

        for entry in &self.models {
            let path = base_dir.join(&entry.path);
            let mut model = match load_obj(&path, &mut rng) {
                Ok(model) => model,
                Err(e) => {
                    warn!("skipping model {}: {}", path.display(), e);
                    continue;
                }
            };

            model.mesh.transform(&entry.matrix());
            scene.add_model(model, path.parent().unwrap_or(base_dir));
        }

        info!(
            "scene: {} objects, {} lights, {} textures",
            scene.objects.len(),
            scene.lights.len(),
            scene.textures.len()
        );
        scene
    }
}

impl Scene {
    pub fn from_config(config: &SceneConfig, base_dir: &Path) -> Scene {
        config.build(base_dir)
    }

    /// Add a loaded model as a mesh that keeps its own materials, so two
    /// models may reuse a material name. Texture maps are resolved against
    /// `model_dir` and shared by resolved path.
    pub fn add_model(&mut self, model: ObjModel, model_dir: &Path) -> usize {
        let mut mesh = model.mesh;
        for mut material in model.materials {
            if let Some(map) = material.diffuse_map.take() {
                let resolved = model_dir.join(&map);
                let key = resolved.display().to_string();
                if !self.textures.contains_key(&key) {
                    match Texture::from_file(&resolved) {
                        Ok(texture) => self.add_texture(&key, texture),
                        Err(e) => warn!("material {}: {}, rendering untextured", material.name, e),
                    }
                }
                material.diffuse_map = Some(key);
            }
            mesh.add_material(material);
        }
        self.add_object(mesh)
    }
}

/// Load a scene description from a RON file
pub fn load_scene_config<P: AsRef<Path>>(path: P) -> Result<SceneConfig, ConfigError> {
    let contents = fs::read_to_string(path)?;
    scene_config_from_str(&contents)
}

/// Save a scene description to a RON file
pub fn save_scene_config<P: AsRef<Path>>(
    config: &SceneConfig,
    path: P,
) -> Result<(), ConfigError> {
    let pretty = ron::ser::PrettyConfig::new()
        .depth_limit(4)
        .indentor("  ".to_string());

    let contents = ron::ser::to_string_pretty(config, pretty)?;
    fs::write(path, contents)?;
    Ok(())
}

/// Parse a scene description from a RON string
pub fn scene_config_from_str(s: &str) -> Result<SceneConfig, ConfigError> {
    Ok(ron::from_str(s)?)
}
