//! Scene model: indexed triangle meshes and polylines
//!
//! A `Mesh` is an arena owning the vertex, normal and texcoord buffers.
//! Its named groups refer into those buffers by plain index, so cloning a
//! mesh is an ordinary deep copy.

use std::collections::{BTreeMap, HashMap};

use crate::rasterizer::{affine, affine_normals, Color, Mat4, Material, Vec2, Vec3, Vec4};

/// Group used when a model names none
pub const DEFAULT_GROUP: &str = "default";

/// Per-vertex color of triangles added without one
pub const DEFAULT_COLOR: Color = Color::WHITE;

/// One triangle: vertex indices plus optional normal/texcoord indices
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriangleRef {
    pub vertices: [usize; 3],
    /// None when the triangle carries no normals
    pub normals: Option<[usize; 3]>,
    /// None when the triangle carries no texture coordinates
    pub texcoords: Option<[usize; 3]>,
    /// Overrides the group material
    pub material: Option<String>,
}

impl TriangleRef {
    pub fn new(vertices: [usize; 3]) -> Self {
        Self {
            vertices,
            normals: None,
            texcoords: None,
            material: None,
        }
    }

    pub fn with_normals(mut self, normals: [usize; 3]) -> Self {
        self.normals = Some(normals);
        self
    }

    pub fn with_texcoords(mut self, texcoords: [usize; 3]) -> Self {
        self.texcoords = Some(texcoords);
        self
    }

    pub fn with_material(mut self, material: &str) -> Self {
        self.material = Some(material.to_string());
        self
    }
}

/// Named set of triangles with three colors per triangle
#[derive(Debug, Clone, PartialEq)]
pub struct MeshGroup {
    pub name: String,
    pub triangles: Vec<TriangleRef>,
    /// Parallel to `triangles`
    pub colors: Vec<[Color; 3]>,
    pub material: Option<String>,
}

impl MeshGroup {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            triangles: Vec::new(),
            colors: Vec::new(),
            material: None,
        }
    }

    pub fn push(&mut self, triangle: TriangleRef, colors: [Color; 3]) {
        self.triangles.push(triangle);
        self.colors.push(colors);
    }

    pub fn len(&self) -> usize {
        self.triangles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    /// Material in effect for a triangle of this group
    pub fn material_for<'a>(&'a self, triangle: &'a TriangleRef) -> Option<&'a str> {
        triangle.material.as_deref().or(self.material.as_deref())
    }

    /// Triangles paired with their colors
    pub fn iter(&self) -> impl Iterator<Item = (&TriangleRef, &[Color; 3])> {
        self.triangles.iter().zip(self.colors.iter())
    }
}

/// Indexed triangle mesh
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    pub vertices: Vec<Vec4>,
    pub normals: Vec<Vec3>,
    pub texcoords: Vec<Vec2>,
    groups: BTreeMap<String, MeshGroup>,
    /// Materials of this mesh's own library, by name
    pub materials: HashMap<String, Material>,
    /// Applied before the view transform at render time
    pub model: Mat4,
}

impl Default for Mesh {
    fn default() -> Self {
        Self::new()
    }
}

impl Mesh {
    pub fn new() -> Self {
        Self {
            vertices: Vec::new(),
            normals: Vec::new(),
            texcoords: Vec::new(),
            groups: BTreeMap::new(),
            materials: HashMap::new(),
            model: Mat4::IDENTITY,
        }
    }

    /// Add a vertex and return its index
    pub fn push_vertex(&mut self, x: f32, y: f32, z: f32) -> usize {
        self.vertices.push(Vec4::new(x, y, z, 1.0));
        self.vertices.len() - 1
    }

    /// Add a normal and return its index
    pub fn push_normal(&mut self, x: f32, y: f32, z: f32) -> usize {
        self.normals.push(Vec3::new(x, y, z));
        self.normals.len() - 1
    }

    /// Add a texture coordinate and return its index
    pub fn push_texcoord(&mut self, u: f32, v: f32) -> usize {
        self.texcoords.push(Vec2::new(u, v));
        self.texcoords.len() - 1
    }

    /// Look up a group, creating it on first use
    pub fn group_mut(&mut self, name: &str) -> &mut MeshGroup {
        self.groups
            .entry(name.to_string())
            .or_insert_with(|| MeshGroup::new(name))
    }

    pub fn group(&self, name: &str) -> Option<&MeshGroup> {
        self.groups.get(name)
    }

    /// Groups in name order
    pub fn groups(&self) -> impl Iterator<Item = &MeshGroup> {
        self.groups.values()
    }

    /// Add a triangle by vertex indices to `group`
    pub fn add_index3(&mut self, group: &str, idx: [usize; 3], colors: [Color; 3]) {
        self.group_mut(group).push(TriangleRef::new(idx), colors);
    }

    /// Add a fully specified triangle to `group`
    pub fn add_triangle(&mut self, group: &str, triangle: TriangleRef, colors: [Color; 3]) {
        self.group_mut(group).push(triangle, colors);
    }

    pub fn add_material(&mut self, material: Material) {
        self.materials.insert(material.name.clone(), material);
    }

    pub fn set_group_material(&mut self, group: &str, material: &str) {
        self.group_mut(group).material = Some(material.to_string());
    }

    pub fn triangle_count(&self) -> usize {
        self.groups.values().map(MeshGroup::len).sum()
    }

    /// True when every index of the triangle points into its buffer
    pub fn is_valid(&self, triangle: &TriangleRef) -> bool {
        let in_range = |idx: &[usize; 3], len: usize| idx.iter().all(|&i| i < len);
        in_range(&triangle.vertices, self.vertices.len())
            && triangle.normals.map_or(true, |n| in_range(&n, self.normals.len()))
            && triangle.texcoords.map_or(true, |t| in_range(&t, self.texcoords.len()))
    }

    /// Replace the vertex buffer by `vertices * m` and the normal buffer by
    /// its inverse-transpose counterpart
    pub fn transform(&mut self, m: &Mat4) {
        self.vertices = affine(&self.vertices, m);
        self.normals = affine_normals(&self.normals, m);
    }

    pub fn translate(&mut self, dx: f32, dy: f32, dz: f32) {
        self.transform(&Mat4::translate(dx, dy, dz));
    }

    pub fn rotate_x(&mut self, a: f32) {
        self.transform(&Mat4::rotate_x(a));
    }

    pub fn rotate_y(&mut self, a: f32) {
        self.transform(&Mat4::rotate_y(a));
    }

    pub fn rotate_z(&mut self, a: f32) {
        self.transform(&Mat4::rotate_z(a));
    }

    pub fn scale(&mut self, sx: f32, sy: f32, sz: f32) {
        self.transform(&Mat4::scale(sx, sy, sz));
    }

    pub fn set_model_matrix(&mut self, model: Mat4) {
        self.model = model;
    }

    /// Axis-aligned cube centered on the origin, one group, outward
    /// normals, counter-clockwise faces seen from outside
    pub fn cube(half: f32, color: Color) -> Self {
        let mut mesh = Mesh::new();
        let s = half;

        let v = Vec3::new;
        // (normal, four corners counter-clockwise seen from outside)
        let faces: [(Vec3, [Vec3; 4]); 6] = [
            (v(0.0, 0.0, 1.0), [v(-s, -s, s), v(s, -s, s), v(s, s, s), v(-s, s, s)]),
            (v(0.0, 0.0, -1.0), [v(s, -s, -s), v(-s, -s, -s), v(-s, s, -s), v(s, s, -s)]),
            (v(0.0, 1.0, 0.0), [v(-s, s, s), v(s, s, s), v(s, s, -s), v(-s, s, -s)]),
            (v(0.0, -1.0, 0.0), [v(-s, -s, -s), v(s, -s, -s), v(s, -s, s), v(-s, -s, s)]),
            (v(1.0, 0.0, 0.0), [v(s, -s, s), v(s, -s, -s), v(s, s, -s), v(s, s, s)]),
            (v(-1.0, 0.0, 0.0), [v(-s, -s, -s), v(-s, -s, s), v(-s, s, s), v(-s, s, -s)]),
        ];

        let uv = [
            mesh.push_texcoord(0.0, 0.0),
            mesh.push_texcoord(1.0, 0.0),
            mesh.push_texcoord(1.0, 1.0),
            mesh.push_texcoord(0.0, 1.0),
        ];

        for (normal, corners) in faces {
            let n = mesh.push_normal(normal.x, normal.y, normal.z);
            let idx: Vec<usize> = corners.iter().map(|c| mesh.push_vertex(c.x, c.y, c.z)).collect();

            // Two triangles per face
            mesh.add_triangle(
                DEFAULT_GROUP,
                TriangleRef::new([idx[0], idx[1], idx[2]])
                    .with_normals([n; 3])
                    .with_texcoords([uv[0], uv[1], uv[2]]),
                [color; 3],
            );
            mesh.add_triangle(
                DEFAULT_GROUP,
                TriangleRef::new([idx[0], idx[2], idx[3]])
                    .with_normals([n; 3])
                    .with_texcoords([uv[0], uv[2], uv[3]]),
                [color; 3],
            );
        }

        mesh
    }
}

/// Open or closed chain of line segments with one color
#[derive(Debug, Clone, PartialEq)]
pub struct Polyline {
    pub vertices: Vec<Vec4>,
    pub color: Color,
    /// Join the last vertex back to the first
    pub closed: bool,
}

impl Polyline {
    pub fn new(color: Color, closed: bool) -> Self {
        Self {
            vertices: Vec::new(),
            color,
            closed,
        }
    }

    pub fn push_vertex(&mut self, x: f32, y: f32, z: f32) -> usize {
        self.vertices.push(Vec4::new(x, y, z, 1.0));
        self.vertices.len() - 1
    }

    pub fn transform(&mut self, m: &Mat4) {
        self.vertices = affine(&self.vertices, m);
    }

    pub fn translate(&mut self, dx: f32, dy: f32, dz: f32) {
        self.transform(&Mat4::translate(dx, dy, dz));
    }

    pub fn rotate_x(&mut self, a: f32) {
        self.transform(&Mat4::rotate_x(a));
    }

    pub fn rotate_y(&mut self, a: f32) {
        self.transform(&Mat4::rotate_y(a));
    }

    pub fn rotate_z(&mut self, a: f32) {
        self.transform(&Mat4::rotate_z(a));
    }

    pub fn scale(&mut self, sx: f32, sy: f32, sz: f32) {
        self.transform(&Mat4::scale(sx, sy, sz));
    }

    /// Index pairs of every segment
    pub fn segments(&self) -> Vec<(usize, usize)> {
        let n = self.vertices.len();
        let mut segments: Vec<(usize, usize)> = (1..n).map(|i| (i - 1, i)).collect();
        if self.closed && n > 2 {
            segments.push((n - 1, 0));
        }
        segments
    }
}

/// Every kind of object a scene can draw
#[derive(Debug, Clone, PartialEq)]
pub enum Drawable {
    Mesh(Mesh),
    Polyline(Polyline),
}

impl Drawable {
    /// Replace the object's buffers by their transformed versions
    pub fn transform(&mut self, m: &Mat4) {
        match self {
            Drawable::Mesh(mesh) => mesh.transform(m),
            Drawable::Polyline(line) => line.transform(m),
        }
    }

    pub fn model_matrix(&self) -> Mat4 {
        match self {
            Drawable::Mesh(mesh) => mesh.model,
            Drawable::Polyline(_) => Mat4::IDENTITY,
        }
    }

    pub fn as_mesh_mut(&mut self) -> Option<&mut Mesh> {
        match self {
            Drawable::Mesh(mesh) => Some(mesh),
            Drawable::Polyline(_) => None,
        }
    }
}

impl From<Mesh> for Drawable {
    fn from(mesh: Mesh) -> Self {
        Drawable::Mesh(mesh)
    }
}

impl From<Polyline> for Drawable {
    fn from(line: Polyline) -> Self {
        Drawable::Polyline(line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_returns_indices() {
        let mut mesh = Mesh::new();
        assert_eq!(mesh.push_vertex(0.0, 0.0, 0.0), 0);
        assert_eq!(mesh.push_vertex(1.0, 0.0, 0.0), 1);
        assert_eq!(mesh.push_normal(0.0, 0.0, 1.0), 0);
        assert_eq!(mesh.push_texcoord(0.5, 0.5), 0);
        assert_eq!(mesh.vertices[1].w, 1.0);
    }

    #[test]
    fn test_add_index3_creates_groups_lazily() {
        let mut mesh = Mesh::new();
        for _ in 0..3 {
            mesh.push_vertex(0.0, 0.0, 0.0);
        }
        assert!(mesh.group("body").is_none());
        mesh.add_index3("body", [0, 1, 2], [Color::RED; 3]);
        mesh.add_index3("body", [2, 1, 0], [Color::BLUE; 3]);
        mesh.add_index3(DEFAULT_GROUP, [0, 1, 2], [DEFAULT_COLOR; 3]);

        let body = mesh.group("body").unwrap();
        assert_eq!(body.len(), 2);
        assert_eq!(body.colors.len(), body.triangles.len());
        assert_eq!(body.colors[1], [Color::BLUE; 3]);
        assert_eq!(mesh.triangle_count(), 3);
        let names: Vec<_> = mesh.groups().map(|g| g.name.as_str()).collect();
        assert_eq!(names, vec!["body", "default"]);
    }

    #[test]
    fn test_validity_checks_every_buffer() {
        let mut mesh = Mesh::new();
        for _ in 0..3 {
            mesh.push_vertex(0.0, 0.0, 0.0);
        }
        mesh.push_normal(0.0, 0.0, 1.0);
        assert!(mesh.is_valid(&TriangleRef::new([0, 1, 2])));
        assert!(!mesh.is_valid(&TriangleRef::new([0, 1, 3])));
        assert!(mesh.is_valid(&TriangleRef::new([0, 1, 2]).with_normals([0, 0, 0])));
        assert!(!mesh.is_valid(&TriangleRef::new([0, 1, 2]).with_normals([0, 1, 0])));
        assert!(!mesh.is_valid(&TriangleRef::new([0, 1, 2]).with_texcoords([0, 0, 0])));
    }

    #[test]
    fn test_material_resolution() {
        let mut group = MeshGroup::new("g");
        group.material = Some("stone".to_string());
        let plain = TriangleRef::new([0, 1, 2]);
        let marked = TriangleRef::new([0, 1, 2]).with_material("gold");
        assert_eq!(group.material_for(&plain), Some("stone"));
        assert_eq!(group.material_for(&marked), Some("gold"));
    }

    #[test]
    fn test_transform_moves_vertices_and_rotates_normals() {
        let mut mesh = Mesh::new();
        mesh.push_vertex(1.0, 0.0, 0.0);
        mesh.push_normal(1.0, 0.0, 0.0);
        mesh.translate(0.0, 2.0, 0.0);
        assert!((mesh.vertices[0].y - 2.0).abs() < 0.001);
        assert!((mesh.normals[0].x - 1.0).abs() < 0.001);

        mesh.rotate_z(std::f32::consts::FRAC_PI_2);
        assert!((mesh.normals[0].y - 1.0).abs() < 0.001);
        assert!((mesh.vertices[0].x + 2.0).abs() < 0.001);
    }

    #[test]
    fn test_clone_is_independent() {
        let mut mesh = Mesh::cube(1.0, Color::WHITE);
        let copy = mesh.clone();
        mesh.add_index3(DEFAULT_GROUP, [0, 1, 2], [Color::RED; 3]);
        mesh.scale(2.0, 2.0, 2.0);
        assert_eq!(copy.triangle_count(), 12);
        assert_eq!(mesh.triangle_count(), 13);
        assert!((copy.vertices[0].x + 1.0).abs() < 0.001);
    }

    #[test]
    fn test_cube_faces_wind_outward() {
        let mesh = Mesh::cube(1.0, Color::WHITE);
        let group = mesh.group(DEFAULT_GROUP).unwrap();
        assert_eq!(group.len(), 12);
        for tri in &group.triangles {
            assert!(mesh.is_valid(tri));
            let [a, b, c] = tri.vertices.map(|i| mesh.vertices[i].xyz());
            let face_normal = (b - a).cross(c - a).normalize();
            let n = mesh.normals[tri.normals.unwrap()[0]];
            assert!(face_normal.dot(n) > 0.99);
        }
    }

    #[test]
    fn test_polyline_segments() {
        let mut line = Polyline::new(Color::RED, true);
        line.push_vertex(0.0, 0.0, 0.0);
        line.push_vertex(1.0, 0.0, 0.0);
        assert_eq!(line.segments(), vec![(0, 1)]);
        line.push_vertex(1.0, 1.0, 0.0);
        assert_eq!(line.segments(), vec![(0, 1), (1, 2), (2, 0)]);
        line.closed = false;
        assert_eq!(line.segments(), vec![(0, 1), (1, 2)]);

        line.scale(2.0, 2.0, 2.0);
        line.translate(0.0, 0.0, 1.0);
        assert_eq!(line.vertices[2], Vec4::new(2.0, 2.0, 1.0, 1.0));
    }

    #[test]
    fn test_drawable_dispatch() {
        let mut obj: Drawable = Mesh::cube(1.0, Color::WHITE).into();
        obj.transform(&Mat4::translate(5.0, 0.0, 0.0));
        let mesh = obj.as_mesh_mut().unwrap();
        assert!((mesh.vertices[0].x - 4.0).abs() < 0.001);

        let mut line: Drawable = Polyline::new(Color::GREEN, false).into();
        assert!(line.as_mesh_mut().is_none());
        assert_eq!(line.model_matrix(), Mat4::IDENTITY);
    }
}
