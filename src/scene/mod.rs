//! Scene orchestration
//!
//! A `Scene` owns everything needed to draw a frame: objects, lights,
//! camera, projection, shader, materials and textures. `render` walks the
//! objects through model -> view -> projection -> divide -> viewport,
//! lights the triangle corners and hands the triangles to the rasterizer.

pub mod camera;
pub mod mesh;
pub mod projection;

pub use camera::Camera;
pub use mesh::{Drawable, Mesh, MeshGroup, Polyline, TriangleRef, DEFAULT_COLOR, DEFAULT_GROUP};
pub use projection::{viewport_matrix, Projection, ProjectionMode, HORIZONTAL_FOV};

use std::collections::HashMap;

use log::warn;
use serde::{Deserialize, Serialize};

use crate::rasterizer::{
    affine, affine_normals, rasterize_line, rasterize_triangle, Color, Color01, FragmentBuffer,
    Light, Mat4, Material, RasterSettings, ScreenVertex, Shader, TexturedCorners, Texture, Vec3,
    Vec4, EPSILON,
};

/// Length of each world axis drawn when `show_axis` is set
pub const AXIS_LENGTH: f32 = 50.0;

/// How the scene is drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RenderMode {
    /// Vertex colors only, no lighting
    Unlit,
    /// Gouraud lighting in world space
    #[default]
    Shaded,
    /// Gouraud lighting in view space
    ShadedViewSpace,
    /// Triangle edges only
    Wireframe,
}

impl RenderMode {
    pub fn lights_vertices(self) -> bool {
        matches!(self, RenderMode::Shaded | RenderMode::ShadedViewSpace)
    }
}

/// Counters for one rendered frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Triangles handed to the rasterizer
    pub triangles_drawn: usize,
    /// Triangles dropped for bad indices or a vertex behind the eye
    pub triangles_skipped: usize,
    pub fragments_written: usize,
}

/// A mesh's vertices after the full transform
struct Projected {
    screen: Vec<Option<ScreenVertex>>,
}

impl Projected {
    fn triangle(&self, idx: [usize; 3]) -> Option<[ScreenVertex; 3]> {
        Some([self.screen[idx[0]]?, self.screen[idx[1]]?, self.screen[idx[2]]?])
    }
}

/// Positions, normals, lights and eye of the frame shading happens in
struct LightingFrame<'a> {
    shader: &'a Shader,
    positions: Vec<Vec3>,
    normals: Vec<Vec3>,
    lights: Vec<Light>,
    eye: Vec3,
}

pub struct Scene {
    pub objects: Vec<Drawable>,
    pub lights: Vec<Light>,
    pub camera: Camera,
    pub projection: Projection,
    /// Lighting is skipped entirely without a shader
    pub shader: Option<Shader>,
    pub materials: HashMap<String, Material>,
    /// Decoded textures by file name, as referenced from `Material::diffuse_map`
    pub textures: HashMap<String, Texture>,
    pub render_mode: RenderMode,
    pub settings: RasterSettings,
    pub show_axis: bool,
    /// Color of cells nothing was drawn to, used by display sinks
    pub background: Color,
    axes: [Polyline; 3],
}

impl Scene {
    pub fn new(width: usize, height: usize) -> Self {
        let projection = Projection {
            width: width as f32,
            height: height as f32,
            ..Projection::default()
        };
        Self {
            objects: Vec::new(),
            lights: Vec::new(),
            camera: Camera::new(),
            projection,
            shader: None,
            materials: HashMap::new(),
            textures: HashMap::new(),
            render_mode: RenderMode::default(),
            settings: RasterSettings::default(),
            show_axis: false,
            background: Color::new(20, 20, 28),
            axes: Self::axis_lines(),
        }
    }

    fn axis_lines() -> [Polyline; 3] {
        let axis = |color: Color, x: f32, y: f32, z: f32| {
            let mut line = Polyline::new(color, false);
            line.push_vertex(0.0, 0.0, 0.0);
            line.push_vertex(x, y, z);
            line
        };
        [
            axis(Color::RED, AXIS_LENGTH, 0.0, 0.0),
            axis(Color::GREEN, 0.0, AXIS_LENGTH, 0.0),
            axis(Color::BLUE, 0.0, 0.0, AXIS_LENGTH),
        ]
    }

    pub fn width(&self) -> usize {
        self.projection.width as usize
    }

    pub fn height(&self) -> usize {
        self.projection.height as usize
    }

    pub fn set_view_size(&mut self, width: usize, height: usize) {
        self.projection.width = width as f32;
        self.projection.height = height as f32;
    }

    pub fn add_object(&mut self, object: impl Into<Drawable>) -> usize {
        self.objects.push(object.into());
        self.objects.len() - 1
    }

    pub fn add_light(&mut self, light: Light) {
        self.lights.push(light);
    }

    pub fn set_shader(&mut self, shader: Option<Shader>) {
        self.shader = shader;
    }

    pub fn add_material(&mut self, material: Material) {
        self.materials.insert(material.name.clone(), material);
    }

    pub fn add_texture(&mut self, name: &str, texture: Texture) {
        self.textures.insert(name.to_string(), texture);
    }

    /// Draw one frame into a new buffer sized to the view
    pub fn render(&self) -> FragmentBuffer {
        let mut fb = FragmentBuffer::new(self.width(), self.height());
        self.render_into(&mut fb);
        fb
    }

    /// Clear `fb` and draw one frame into it, resizing it to the view first
    pub fn render_into(&self, fb: &mut FragmentBuffer) -> FrameStats {
        if fb.width != self.width() || fb.height != self.height() {
            fb.resize(self.width(), self.height());
        }
        fb.clear();

        let view = self.camera.view_matrix();
        let view_proj = view * self.projection.matrix();
        let viewport = self.projection.viewport_matrix();
        let near_w = match self.projection.mode {
            ProjectionMode::Perspective => self.projection.near,
            ProjectionMode::Orthographic => EPSILON,
        };
        let mut stats = FrameStats::default();

        for object in &self.objects {
            match object {
                Drawable::Mesh(mesh) => {
                    self.draw_mesh(fb, mesh, &view, &view_proj, &viewport, &mut stats)
                }
                Drawable::Polyline(line) => {
                    stats.fragments_written +=
                        draw_polyline(fb, line, &view_proj, &viewport, near_w)
                }
            }
        }

        if self.show_axis {
            for line in &self.axes {
                stats.fragments_written +=
                    draw_polyline(fb, line, &view_proj, &viewport, near_w);
            }
        }

        stats
    }

    /// Positions and normals in world or view space, or None when the
    /// current mode does not light vertices
    fn lighting_frame<'a>(&'a self, mesh: &Mesh, view: &Mat4) -> Option<LightingFrame<'a>> {
        let shader = self.shader.as_ref()?;
        match self.render_mode {
            RenderMode::Shaded => Some(LightingFrame {
                shader,
                positions: affine(&mesh.vertices, &mesh.model)
                    .into_iter()
                    .map(Vec4::xyz)
                    .collect(),
                normals: affine_normals(&mesh.normals, &mesh.model),
                lights: self.lights.clone(),
                eye: self.camera.position,
            }),
            RenderMode::ShadedViewSpace => {
                let model_view = mesh.model * *view;
                Some(LightingFrame {
                    shader,
                    positions: affine(&mesh.vertices, &model_view)
                        .into_iter()
                        .map(Vec4::xyz)
                        .collect(),
                    normals: affine_normals(&mesh.normals, &model_view),
                    lights: self.lights.iter().map(|l| l.transformed(view)).collect(),
                    eye: Vec3::ZERO,
                })
            }
            RenderMode::Unlit | RenderMode::Wireframe => None,
        }
    }

    fn draw_mesh(
        &self,
        fb: &mut FragmentBuffer,
        mesh: &Mesh,
        view: &Mat4,
        view_proj: &Mat4,
        viewport: &Mat4,
        stats: &mut FrameStats,
    ) {
        let projected = project_vertices(&mesh.vertices, &(mesh.model * *view_proj), viewport);
        let lighting = self.lighting_frame(mesh, view);

        for group in mesh.groups() {
            let mut out_of_range = 0;

            for (tri, colors) in group.iter() {
                if !mesh.is_valid(tri) {
                    out_of_range += 1;
                    continue;
                }
                let verts = match projected.triangle(tri.vertices) {
                    Some(verts) => verts,
                    None => {
                        stats.triangles_skipped += 1;
                        continue;
                    }
                };

                if self.render_mode == RenderMode::Wireframe {
                    stats.triangles_drawn += 1;
                    for (a, b) in [(0, 1), (1, 2), (2, 0)] {
                        stats.fragments_written +=
                            rasterize_line(fb, verts[a], verts[b], colors[a], colors[b]);
                    }
                    continue;
                }

                // The mesh's own library first, then scene-wide materials
                let material = group
                    .material_for(tri)
                    .and_then(|name| mesh.materials.get(name).or_else(|| self.materials.get(name)));

                let corner_colors = match (&lighting, tri.normals) {
                    (Some(frame), Some(normals)) => {
                        shade_corners(frame, tri.vertices, normals, material, colors)
                    }
                    _ => *colors,
                };

                let textured = material
                    .and_then(|m| m.diffuse_map.as_ref())
                    .and_then(|name| self.textures.get(name))
                    .zip(tri.texcoords)
                    .map(|(texture, uv)| TexturedCorners {
                        uvs: uv.map(|i| mesh.texcoords[i]),
                        texture,
                    });

                stats.triangles_drawn += 1;
                stats.fragments_written +=
                    rasterize_triangle(fb, &verts, &corner_colors, textured, &self.settings);
            }

            if out_of_range > 0 {
                warn!(
                    "group '{}': skipped {} triangle(s) with out-of-range indices",
                    group.name, out_of_range
                );
                stats.triangles_skipped += out_of_range;
            }
        }
    }
}

/// Lit color of each triangle corner. Without a material the corner's own
/// vertex color serves as ambient and diffuse reflectance.
fn shade_corners(
    frame: &LightingFrame<'_>,
    vertices: [usize; 3],
    normals: [usize; 3],
    material: Option<&Material>,
    colors: &[Color; 3],
) -> [Color; 3] {
    let mut out = *colors;
    for i in 0..3 {
        let position = frame.positions[vertices[i]];
        let normal = frame.normals[normals[i]];
        let lit = match material {
            Some(m) => frame.shader.shade(&frame.lights, m, position, normal, frame.eye),
            None => {
                let m = Material::from_color(colors[i]);
                frame.shader.shade(&frame.lights, &m, position, normal, frame.eye)
            }
        };
        out[i] = Color01 { a: colors[i].a as f32 / 255.0, ..lit }.to_color();
    }
    out
}

/// Full transform of a vertex buffer; vertices at or behind the eye map to None
fn project_vertices(vertices: &[Vec4], m: &Mat4, viewport: &Mat4) -> Projected {
    let screen = vertices
        .iter()
        .map(|&v| {
            let clip = v * *m;
            if clip.w <= EPSILON {
                return None;
            }
            to_screen(clip, viewport)
        })
        .collect();
    Projected { screen }
}

/// Cut a clip-space segment to the part with `w >= near_w`
fn clip_segment(a: Vec4, b: Vec4, near_w: f32) -> Option<(Vec4, Vec4)> {
    match (a.w >= near_w, b.w >= near_w) {
        (true, true) => Some((a, b)),
        (false, false) => None,
        (a_inside, _) => {
            let t = (near_w - a.w) / (b.w - a.w);
            let cut = Vec4::new(
                a.x + (b.x - a.x) * t,
                a.y + (b.y - a.y) * t,
                a.z + (b.z - a.z) * t,
                near_w,
            );
            if a_inside {
                Some((a, cut))
            } else {
                Some((cut, b))
            }
        }
    }
}

fn to_screen(clip: Vec4, viewport: &Mat4) -> Option<ScreenVertex> {
    let ndc = clip.divide()?;
    Some(ScreenVertex::from_viewport(ndc * *viewport, 1.0 / clip.w))
}

/// Segments are clipped against the near plane in homogeneous space before
/// the divide, so a segment passing beside the eye keeps its visible part.
fn draw_polyline(
    fb: &mut FragmentBuffer,
    line: &Polyline,
    view_proj: &Mat4,
    viewport: &Mat4,
    near_w: f32,
) -> usize {
    let clip = affine(&line.vertices, view_proj);
    line.segments()
        .into_iter()
        .filter_map(|(a, b)| clip_segment(clip[a], clip[b], near_w))
        .filter_map(|(a, b)| Some((to_screen(a, viewport)?, to_screen(b, viewport)?)))
        .map(|(a, b)| rasterize_line(fb, a, b, line.color, line.color))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rasterizer::{ShadingModel, DEPTH_INF};

    fn approx(a: f32, b: f32, eps: f32) -> bool {
        (a - b).abs() < eps
    }

    /// Orthographic 100x100 scene, camera at the origin looking down -z
    fn ortho_scene() -> Scene {
        let mut scene = Scene::new(100, 100);
        scene.projection.near = 1.0;
        scene.projection.far = 10.0;
        scene.projection.mode = ProjectionMode::Orthographic;
        scene.camera.look_at(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0));
        scene.render_mode = RenderMode::Unlit;
        scene
    }

    fn quad(half: f32, z: f32, color: Color) -> Mesh {
        let mut mesh = Mesh::new();
        let a = mesh.push_vertex(-half, -half, z);
        let b = mesh.push_vertex(half, -half, z);
        let c = mesh.push_vertex(half, half, z);
        let d = mesh.push_vertex(-half, half, z);
        mesh.add_index3(DEFAULT_GROUP, [a, b, c], [color; 3]);
        mesh.add_index3(DEFAULT_GROUP, [a, c, d], [color; 3]);
        mesh
    }

    fn triangle(z: f32, color: Color) -> Mesh {
        let mut mesh = Mesh::new();
        let a = mesh.push_vertex(-0.5, -0.5, z);
        let b = mesh.push_vertex(0.5, -0.5, z);
        let c = mesh.push_vertex(0.0, 0.5, z);
        mesh.add_index3(DEFAULT_GROUP, [a, b, c], [color; 3]);
        mesh
    }

    #[test]
    fn test_transform_round_trip() {
        let mut scene = Scene::new(640, 480);
        scene.projection.near = 0.5;
        scene.projection.far = 50.0;
        scene.camera.look_at(Vec3::new(3.0, 2.0, -4.0), Vec3::new(0.0, 0.5, 1.0));

        let m = scene.camera.view_matrix()
            * scene.projection.matrix()
            * scene.projection.viewport_matrix();
        let inv = m.inverse().unwrap();

        let points = [
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, -1.0, 2.0),
            Vec3::new(-0.5, 1.5, 1.0),
        ];
        for p in points {
            // Forward to screen space and divide, then back with w = 1 and
            // divide again
            let screen = (p.to_point() * m).divide().unwrap();
            assert_eq!(screen.w, 1.0);
            let q = (screen * inv).divide().unwrap();
            assert!(approx(p.x, q.x, 1e-3) && approx(p.y, q.y, 1e-3) && approx(p.z, q.z, 1e-3));
        }
    }

    #[test]
    fn test_orthographic_square_is_uniform_rectangle() {
        let mut scene = ortho_scene();
        // Projects to screen x, y in 25.5..74.5
        let half = 0.49 * (HORIZONTAL_FOV / 2.0).tan();
        scene.add_object(quad(half, -5.0, Color::WHITE));

        let fb = scene.render();
        assert_eq!(fb.written_count(), 49 * 49);

        let depth = fb.get(50, 50).unwrap().depth;
        assert!(approx(depth, -1.0 / 9.0, 1e-4));
        for (x, y, frag) in fb.iter_written() {
            assert!((26..=74).contains(&x) && (26..=74).contains(&y));
            assert_eq!(frag.color, Color::WHITE);
            assert!(approx(frag.depth, depth, 1e-5));
        }
    }

    #[test]
    fn test_nearer_triangle_wins_in_either_order() {
        for near_first in [true, false] {
            let mut scene = ortho_scene();
            let near = triangle(-3.0, Color::RED);
            let far = triangle(-6.0, Color::BLUE);
            if near_first {
                scene.add_object(near);
                scene.add_object(far);
            } else {
                scene.add_object(far);
                scene.add_object(near);
            }
            let fb = scene.render();
            assert!(fb.written_count() > 0);
            for (_, _, frag) in fb.iter_written() {
                assert_eq!(frag.color, Color::RED);
            }
        }
    }

    #[test]
    fn test_point_light_diffuse_only() {
        let mut scene = Scene::new(100, 100);
        scene.camera.look_at(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO);
        scene.set_shader(Some(Shader::new(ShadingModel::BlinnPhong, Color01::BLACK)));
        scene.add_light(Light::Point {
            position: Vec3::new(0.0, 0.0, 10.0),
            intensity: Color01::gray(0.8),
        });
        scene.add_material(Material {
            ambient: Color01::BLACK,
            diffuse: Color01::new(0.5, 0.5, 1.0),
            specular: Color01::BLACK,
            ..Material::new("paint")
        });

        let mut mesh = Mesh::new();
        let v = [
            mesh.push_vertex(-0.5, -0.5, 0.0),
            mesh.push_vertex(0.5, -0.5, 0.0),
            mesh.push_vertex(0.0, 0.5, 0.0),
        ];
        let n = mesh.push_normal(0.0, 0.0, 1.0);
        let tri = TriangleRef::new(v).with_normals([n; 3]);
        mesh.add_triangle(DEFAULT_GROUP, tri, [Color::WHITE; 3]);
        mesh.set_group_material(DEFAULT_GROUP, "paint");
        scene.add_object(mesh);

        let fb = scene.render();
        let c = fb.get(50, 50).unwrap().color;
        // n.l is just under 1 at every corner, so each channel is ~0.8 * kd
        assert!((c.r as i32 - 102).abs() <= 2, "r = {}", c.r);
        assert!((c.g as i32 - 102).abs() <= 2, "g = {}", c.g);
        assert!((c.b as i32 - 204).abs() <= 2, "b = {}", c.b);
    }

    #[test]
    fn test_view_space_shading_matches_world_space() {
        let build = |mode: RenderMode| {
            let mut scene = Scene::new(80, 60);
            scene.camera.look_at(Vec3::new(2.0, 3.0, 4.0), Vec3::ZERO);
            scene.set_shader(Some(Shader::default()));
            scene.add_light(Light::Point {
                position: Vec3::new(5.0, 5.0, 5.0),
                intensity: Color01::gray(0.9),
            });
            scene.add_light(Light::Directional {
                direction: Vec3::new(-1.0, -1.0, 0.0),
                intensity: Color01::gray(0.3),
            });
            scene.add_object(Mesh::cube(1.0, Color::new(200, 120, 60)));
            scene.render_mode = mode;
            scene.render()
        };
        let world = build(RenderMode::Shaded);
        let view = build(RenderMode::ShadedViewSpace);
        assert_eq!(world.written_count(), view.written_count());
        for (a, b) in world.fragments.iter().zip(&view.fragments) {
            assert!((a.color.r as i32 - b.color.r as i32).abs() <= 1);
            assert!((a.color.g as i32 - b.color.g as i32).abs() <= 1);
            assert!((a.color.b as i32 - b.color.b as i32).abs() <= 1);
        }
    }

    #[test]
    fn test_missing_normals_keep_vertex_colors() {
        let mut scene = ortho_scene();
        scene.render_mode = RenderMode::Shaded;
        scene.set_shader(Some(Shader::default()));
        scene.add_light(Light::Point {
            position: Vec3::new(0.0, 0.0, 10.0),
            intensity: Color01::WHITE,
        });
        scene.add_object(triangle(-4.0, Color::GREEN));
        let fb = scene.render();
        assert!(fb.written_count() > 0);
        assert!(fb.iter_written().all(|(_, _, f)| f.color == Color::GREEN));
    }

    #[test]
    fn test_out_of_range_triangles_are_skipped() {
        let mut scene = ortho_scene();
        let mut mesh = triangle(-4.0, Color::WHITE);
        mesh.add_index3(DEFAULT_GROUP, [0, 1, 7], [Color::RED; 3]);
        let no_normals = TriangleRef::new([0, 1, 2]).with_normals([0, 0, 0]);
        mesh.add_triangle("other", no_normals, [Color::RED; 3]);
        scene.add_object(mesh);

        let mut fb = FragmentBuffer::new(1, 1);
        let stats = scene.render_into(&mut fb);
        assert_eq!((fb.width, fb.height), (100, 100));
        assert_eq!(stats.triangles_drawn, 1);
        assert_eq!(stats.triangles_skipped, 2);
        assert!(fb.iter_written().all(|(_, _, f)| f.color == Color::WHITE));
    }

    #[test]
    fn test_geometry_behind_eye_is_skipped() {
        let mut scene = Scene::new(50, 50);
        scene.camera.look_at(Vec3::ZERO, Vec3::new(0.0, 0.0, 1.0));
        scene.add_object(triangle(-2.0, Color::WHITE));
        let mut fb = FragmentBuffer::new(50, 50);
        let stats = scene.render_into(&mut fb);
        assert_eq!(stats.triangles_skipped, 1);
        assert_eq!(fb.written_count(), 0);
    }

    #[test]
    fn test_render_clears_previous_frame() {
        let mut scene = ortho_scene();
        scene.add_object(triangle(-4.0, Color::WHITE));
        let mut fb = FragmentBuffer::new(100, 100);
        let first = scene.render_into(&mut fb);
        let count = fb.written_count();
        scene.objects.clear();
        let second = scene.render_into(&mut fb);
        assert!(count > 0 && first.fragments_written == count);
        assert_eq!(second.fragments_written, 0);
        assert!(fb.fragments.iter().all(|f| f.depth == DEPTH_INF));
    }

    #[test]
    fn test_axis_polylines() {
        let mut scene = Scene::new(100, 100);
        scene.camera.look_at(Vec3::new(10.0, 8.0, 12.0), Vec3::ZERO);
        assert_eq!(scene.render().written_count(), 0);

        scene.show_axis = true;
        let fb = scene.render();
        let colors: Vec<Color> = fb.iter_written().map(|(_, _, f)| f.color).collect();
        assert!(colors.contains(&Color::RED));
        assert!(colors.contains(&Color::GREEN));
        assert!(colors.contains(&Color::BLUE));
    }

    #[test]
    fn test_polyline_crossing_eye_plane_keeps_visible_part() {
        let mut scene = Scene::new(100, 100);
        scene.camera.look_at(Vec3::ZERO, Vec3::new(0.0, 0.0, 1.0));
        let mut line = Polyline::new(Color::RED, false);
        line.push_vertex(1.0, 0.0, 5.0);
        line.push_vertex(1.0, 0.0, -5.0);
        scene.add_object(line);

        let mut fb = FragmentBuffer::new(100, 100);
        let stats = scene.render_into(&mut fb);
        assert!(stats.fragments_written > 0);
        // The far end sits right of center; the clipped end runs off screen
        assert!(fb.get(50, 50).map_or(true, |f| !f.is_written()));
        assert!(fb.iter_written().all(|(x, _, f)| x > 50 && f.color == Color::RED));
    }

    #[test]
    fn test_segment_behind_eye_is_dropped() {
        let a = Vec4::new(0.0, 0.0, 0.0, -1.0);
        let b = Vec4::new(1.0, 0.0, 0.0, -2.0);
        assert!(clip_segment(a, b, 0.1).is_none());

        let (p, q) = clip_segment(Vec4::new(0.0, 0.0, 0.0, 2.0), a, 0.5).unwrap();
        assert_eq!(p.w, 2.0);
        assert!(approx(q.w, 0.5, 1e-6));
    }

    #[test]
    fn test_wireframe_draws_edges_only() {
        let mut scene = ortho_scene();
        let half = 0.4 * (HORIZONTAL_FOV / 2.0).tan();
        scene.add_object(quad(half, -5.0, Color::WHITE));

        let solid = scene.render().written_count();
        scene.render_mode = RenderMode::Wireframe;
        let fb = scene.render();
        assert!(fb.written_count() > 0);
        assert!(fb.written_count() < solid / 4);
        assert!(!fb.get(40, 50).unwrap().is_written());
    }

    #[test]
    fn test_texture_binds_through_material() {
        let mut scene = ortho_scene();
        let half = 0.4 * (HORIZONTAL_FOV / 2.0).tan();
        let mut mesh = Mesh::new();
        let v = [
            mesh.push_vertex(-half, -half, -5.0),
            mesh.push_vertex(half, -half, -5.0),
            mesh.push_vertex(half, half, -5.0),
        ];
        // Every corner samples the same texel
        let t = mesh.push_texcoord(0.25, 0.25);
        mesh.add_triangle(
            DEFAULT_GROUP,
            TriangleRef::new(v).with_texcoords([t; 3]).with_material("checker"),
            [Color::WHITE; 3],
        );
        scene.add_object(mesh);
        scene.add_material(Material {
            diffuse_map: Some("checker.png".to_string()),
            ..Material::new("checker")
        });
        scene.add_texture("checker.png", Texture::checkerboard(2, 2, Color::RED, Color::BLUE));

        let fb = scene.render();
        let first = fb.iter_written().next().unwrap().2.color;
        assert!(first == Color::RED || first == Color::BLUE);
        assert!(fb.iter_written().all(|(_, _, f)| f.color == first));
    }

    #[test]
    fn test_backface_cull_keeps_front_of_cube() {
        let mut scene = Scene::new(100, 100);
        scene.camera.look_at(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO);
        scene.render_mode = RenderMode::Unlit;
        scene.add_object(Mesh::cube(1.0, Color::WHITE));

        let all = scene.render();
        scene.settings.backface_cull = true;
        let culled = scene.render();
        assert!(culled.get(50, 50).unwrap().is_written());
        assert_eq!(all.written_count(), culled.written_count());
    }
}
