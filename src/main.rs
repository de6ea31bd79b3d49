//! softgl viewer
//!
//! Renders a scene description with the software pipeline and blits the
//! fragment buffer to a macroquad window.
//!
//! Usage: `softgl [scene.ron]` (default `assets/scenes/demo.ron`)
//!
//! Keys: M cycles render mode, P toggles projection, A toggles axes,
//! C toggles back-face culling, Space pauses the spin.
//! Camera: arrows turn and pitch, Q/E roll, I/K/J/L move, R/F rise and fall.
//! Shift + arrows/PageUp/PageDown move the first point light.

use std::path::{Path, PathBuf};

use log::{info, warn};
use macroquad::prelude::*;

use softgl::loader::{load_scene_config, SceneConfig};
use softgl::rasterizer::{Color01, FragmentBuffer, Light, Mat4, Shader, Vec3};
use softgl::scene::{Mesh, ProjectionMode, RenderMode, Scene};

/// Version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

const DEFAULT_SCENE: &str = "assets/scenes/demo.ron";

/// Radians per second
const TURN_SPEED: f32 = 1.2;

/// World units per second
const MOVE_SPEED: f32 = 3.0;

fn window_conf() -> Conf {
    Conf {
        window_title: format!("softgl v{}", VERSION),
        window_width: 960,
        window_height: 720,
        window_resizable: true,
        high_dpi: true,
        ..Default::default()
    }
}

/// Shaded cube shown when no scene file can be read
fn demo_scene() -> Scene {
    let mut scene = Scene::new(640, 480);
    scene.camera.look_at(Vec3::new(2.5, 2.0, -3.5), Vec3::ZERO);
    scene.set_shader(Some(Shader::default()));
    scene.add_light(Light::Point {
        position: Vec3::new(4.0, 5.0, -3.0),
        intensity: Color01::gray(0.9),
    });
    scene.add_object(Mesh::cube(1.0, softgl::rasterizer::Color::new(90, 160, 220)));
    scene.show_axis = true;
    scene
}

fn load_scene(path: &Path) -> (Scene, f32) {
    match load_scene_config(path) {
        Ok(config) => {
            info!("loaded scene {}", path.display());
            let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
            (Scene::from_config(&config, base_dir), config.spin)
        }
        Err(e) => {
            warn!("{}: {}, showing the demo cube", path.display(), e);
            (demo_scene(), SceneConfig::default().spin)
        }
    }
}

fn next_mode(mode: RenderMode) -> RenderMode {
    match mode {
        RenderMode::Unlit => RenderMode::Shaded,
        RenderMode::Shaded => RenderMode::ShadedViewSpace,
        RenderMode::ShadedViewSpace => RenderMode::Wireframe,
        RenderMode::Wireframe => RenderMode::Unlit,
    }
}

/// -1, 0 or +1 from a pair of opposing keys
fn axis(negative: KeyCode, positive: KeyCode) -> f32 {
    match (is_key_down(negative), is_key_down(positive)) {
        (true, false) => -1.0,
        (false, true) => 1.0,
        _ => 0.0,
    }
}

fn drive_camera(scene: &mut Scene, dt: f32) {
    let turn = TURN_SPEED * dt;
    let camera = &mut scene.camera;
    let heading = camera.heading + axis(KeyCode::Left, KeyCode::Right) * turn;
    let pitch = (camera.pitch + axis(KeyCode::Up, KeyCode::Down) * turn)
        .clamp(-std::f32::consts::FRAC_PI_2, std::f32::consts::FRAC_PI_2);
    let roll = camera.roll + axis(KeyCode::Q, KeyCode::E) * turn;
    camera.set_posture(heading, pitch, roll);

    let step = MOVE_SPEED * dt;
    camera.move_by(
        axis(KeyCode::K, KeyCode::I) * step,
        axis(KeyCode::J, KeyCode::L) * step,
        axis(KeyCode::F, KeyCode::R) * step,
    );
}

fn drive_light(scene: &mut Scene, dt: f32) {
    let step = MOVE_SPEED * dt;
    let delta = Vec3::new(
        axis(KeyCode::Left, KeyCode::Right),
        axis(KeyCode::PageDown, KeyCode::PageUp),
        axis(KeyCode::Down, KeyCode::Up),
    ) * step;
    if let Some(light) = scene
        .lights
        .iter_mut()
        .find(|l| matches!(l, Light::Point { .. }))
    {
        light.translate(delta);
    }
}

/// Largest rect with the buffer's aspect ratio centered in the window
fn fit_rect(fb: &FragmentBuffer) -> Rect {
    let (sw, sh) = (screen_width(), screen_height());
    let scale = (sw / fb.width as f32).min(sh / fb.height as f32);
    let (w, h) = (fb.width as f32 * scale, fb.height as f32 * scale);
    Rect::new((sw - w) / 2.0, (sh - h) / 2.0, w, h)
}

#[macroquad::main(window_conf)]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_SCENE));
    let (mut scene, spin) = load_scene(&path);

    let mut fb = FragmentBuffer::new(scene.width(), scene.height());
    let mut angle = 0.0f32;
    let mut paused = false;

    loop {
        if is_key_pressed(KeyCode::Escape) {
            break;
        }
        if is_key_pressed(KeyCode::M) {
            scene.render_mode = next_mode(scene.render_mode);
        }
        if is_key_pressed(KeyCode::P) {
            scene.projection.mode = match scene.projection.mode {
                ProjectionMode::Perspective => ProjectionMode::Orthographic,
                ProjectionMode::Orthographic => ProjectionMode::Perspective,
            };
        }
        if is_key_pressed(KeyCode::A) {
            scene.show_axis = !scene.show_axis;
        }
        if is_key_pressed(KeyCode::C) {
            scene.settings.backface_cull = !scene.settings.backface_cull;
        }
        if is_key_pressed(KeyCode::Space) {
            paused = !paused;
        }

        let dt = get_frame_time();
        if is_key_down(KeyCode::LeftShift) || is_key_down(KeyCode::RightShift) {
            drive_light(&mut scene, dt);
        } else {
            drive_camera(&mut scene, dt);
        }

        if !paused {
            angle += spin * dt;
        }
        let model = Mat4::rotate_y(angle);
        for object in &mut scene.objects {
            if let Some(mesh) = object.as_mesh_mut() {
                mesh.set_model_matrix(model);
            }
        }

        let stats = scene.render_into(&mut fb);
        let bytes = fb.to_rgba_bytes(scene.background);

        clear_background(Color::from_rgba(0, 0, 0, 255));

        let fb_texture = Texture2D::from_rgba8(fb.width as u16, fb.height as u16, &bytes);
        fb_texture.set_filter(FilterMode::Nearest);

        let rect = fit_rect(&fb);
        draw_texture_ex(
            &fb_texture,
            rect.x,
            rect.y,
            WHITE,
            DrawTextureParams {
                dest_size: Some(vec2(rect.w, rect.h)),
                ..Default::default()
            },
        );

        let status = format!(
            "{:?} | {:?} | {} tris, {} skipped, {} fragments | {} fps",
            scene.render_mode,
            scene.projection.mode,
            stats.triangles_drawn,
            stats.triangles_skipped,
            stats.fragments_written,
            get_fps()
        );
        draw_text(&status, 8.0, 20.0, 20.0, WHITE);

        next_frame().await;
    }
}
