//! Wavefront OBJ and MTL parsing
//!
//! Supported OBJ directives: `v`, `vn`, `vt`, `f`, `g`, `o`, `usemtl`,
//! `mtllib`. Polygons are fan-triangulated. Anything else is logged at
//! debug level and skipped.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use log::{debug, info, warn};
use rand::Rng;

use super::LoadError;
use crate::rasterizer::{Color, Color01, Material};
use crate::scene::{Mesh, TriangleRef, DEFAULT_GROUP};

/// A parsed model and the materials its libraries define
#[derive(Debug, Clone, Default)]
pub struct ObjModel {
    pub mesh: Mesh,
    pub materials: Vec<Material>,
    /// Material libraries named by `mtllib`, as written
    pub material_libs: Vec<String>,
}

impl ObjModel {
    pub fn material(&self, name: &str) -> Option<&Material> {
        self.materials.iter().find(|m| m.name == name)
    }
}

/// Load an OBJ file. Material libraries are resolved against the file's
/// directory; a library that fails to load is logged and skipped.
pub fn load_obj<P: AsRef<Path>, R: Rng>(path: P, rng: &mut R) -> Result<ObjModel, LoadError> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(LoadError::NotFound(path.to_path_buf()));
    }
    let contents = fs::read_to_string(path)?;
    let model = ObjParser::new(path.parent(), rng).parse(&contents)?;
    info!(
        "loaded {}: {} vertices, {} triangles, {} materials",
        path.display(),
        model.mesh.vertices.len(),
        model.mesh.triangle_count(),
        model.materials.len()
    );
    Ok(model)
}

/// Parse OBJ source. `mtllib` names are recorded but not loaded.
pub fn load_obj_from_str<R: Rng>(s: &str, rng: &mut R) -> Result<ObjModel, LoadError> {
    ObjParser::new(None, rng).parse(s)
}

/// Load an MTL material library
pub fn load_mtl<P: AsRef<Path>>(path: P) -> Result<Vec<Material>, LoadError> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(LoadError::NotFound(path.to_path_buf()));
    }
    let materials = parse_mtl(&fs::read_to_string(path)?)?;
    info!("loaded {}: {} materials", path.display(), materials.len());
    Ok(materials)
}

/// Parse MTL source
pub fn parse_mtl(s: &str) -> Result<Vec<Material>, LoadError> {
    let mut materials: Vec<Material> = Vec::new();

    for (i, raw) in s.lines().enumerate() {
        let line_no = i + 1;
        let mut parts = raw.split_whitespace();
        let keyword = match parts.next() {
            Some(k) if !k.starts_with('#') => k,
            _ => continue,
        };
        let args: Vec<&str> = parts.collect();

        if keyword == "newmtl" {
            let name = args
                .first()
                .ok_or_else(|| LoadError::parse(line_no, "newmtl without a name"))?;
            materials.push(Material::new(name));
            continue;
        }

        let current = match materials.last_mut() {
            Some(m) => m,
            None => {
                debug!("mtl line {}: '{}' before any newmtl, ignored", line_no, keyword);
                continue;
            }
        };

        match keyword {
            "Ka" => current.ambient = parse_color(&args, line_no)?,
            "Kd" => current.diffuse = parse_color(&args, line_no)?,
            "Ks" => current.specular = parse_color(&args, line_no)?,
            "Ns" => current.shininess = parse_floats(&args, 1, line_no)?[0],
            "d" => current.dissolve = parse_floats(&args, 1, line_no)?[0],
            // Options such as -s may precede the file name
            "map_Kd" => {
                let file = args
                    .last()
                    .ok_or_else(|| LoadError::parse(line_no, "map_Kd without a file"))?;
                current.diffuse_map = Some(file.to_string());
            }
            other => debug!("mtl line {}: ignoring '{}'", line_no, other),
        }
    }

    Ok(materials)
}

fn parse_floats(args: &[&str], min: usize, line: usize) -> Result<Vec<f32>, LoadError> {
    if args.len() < min {
        let message = format!("expected {} numbers, found {}", min, args.len());
        return Err(LoadError::parse(line, message));
    }
    args.iter()
        .map(|a| {
            a.parse::<f32>()
                .map_err(|_| LoadError::parse(line, format!("invalid number '{}'", a)))
        })
        .collect()
}

/// `r g b`, or a single gray value
fn parse_color(args: &[&str], line: usize) -> Result<Color01, LoadError> {
    let v = parse_floats(args, 1, line)?;
    Ok(match v.as_slice() {
        [r, g, b, ..] => Color01::new(*r, *g, *b),
        [gray, ..] => Color01::gray(*gray),
        [] => Color01::BLACK,
    })
}

/// 1-based index, or negative index counting back from the current end
fn resolve_index(token: &str, len: usize, line: usize) -> Result<usize, LoadError> {
    let i: i64 = token
        .parse()
        .map_err(|_| LoadError::parse(line, format!("invalid index '{}'", token)))?;
    if i > 0 {
        Ok(i as usize - 1)
    } else if i < 0 && (i.unsigned_abs() as usize) <= len {
        Ok(len - i.unsigned_abs() as usize)
    } else {
        Err(LoadError::parse(line, format!("index {} out of range", i)))
    }
}

/// One `v`, `v/t`, `v//n` or `v/t/n` face corner
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Corner {
    vertex: usize,
    texcoord: Option<usize>,
    normal: Option<usize>,
}

struct ObjParser<'a, R: Rng> {
    model: ObjModel,
    base_dir: Option<&'a Path>,
    rng: &'a mut R,
    group: String,
    material: Option<String>,
    missing_materials: HashSet<String>,
}

impl<'a, R: Rng> ObjParser<'a, R> {
    fn new(base_dir: Option<&'a Path>, rng: &'a mut R) -> Self {
        Self {
            model: ObjModel::default(),
            base_dir,
            rng,
            group: DEFAULT_GROUP.to_string(),
            material: None,
            missing_materials: HashSet::new(),
        }
    }

    fn parse(mut self, s: &str) -> Result<ObjModel, LoadError> {
        for (i, raw) in s.lines().enumerate() {
            let line_no = i + 1;
            let mut parts = raw.split_whitespace();
            let keyword = match parts.next() {
                Some(k) if !k.starts_with('#') => k,
                _ => continue,
            };
            let args: Vec<&str> = parts.collect();
            self.directive(keyword, &args, line_no)?;
        }
        Ok(self.model)
    }

    fn directive(&mut self, keyword: &str, args: &[&str], line: usize) -> Result<(), LoadError> {
        let mesh = &mut self.model.mesh;
        match keyword {
            "v" => {
                let v = parse_floats(args, 3, line)?;
                mesh.push_vertex(v[0], v[1], v[2]);
            }
            "vn" => {
                let n = parse_floats(args, 3, line)?;
                mesh.push_normal(n[0], n[1], n[2]);
            }
            "vt" => {
                let t = parse_floats(args, 1, line)?;
                mesh.push_texcoord(t[0], t.get(1).copied().unwrap_or(0.0));
            }
            "f" => self.face(args, line)?,
            "g" | "o" => {
                self.group = args.first().map_or(DEFAULT_GROUP, |g| *g).to_string();
            }
            "usemtl" => self.material = args.first().map(|m| m.to_string()),
            "mtllib" => {
                for lib in args {
                    self.material_lib(lib);
                }
            }
            other => debug!("obj line {}: ignoring '{}'", line, other),
        }
        Ok(())
    }

    fn material_lib(&mut self, lib: &str) {
        self.model.material_libs.push(lib.to_string());
        let dir = match self.base_dir {
            Some(dir) => dir,
            None => {
                debug!("mtllib {}: no base directory, not loaded", lib);
                return;
            }
        };
        match load_mtl(dir.join(lib)) {
            Ok(materials) => self.model.materials.extend(materials),
            Err(e) => warn!("mtllib {}: {}", lib, e),
        }
    }

    fn corner(&self, token: &str, line: usize) -> Result<Corner, LoadError> {
        let mesh = &self.model.mesh;
        let mut fields = token.split('/');
        let vertex = match fields.next() {
            Some(v) if !v.is_empty() => resolve_index(v, mesh.vertices.len(), line)?,
            _ => {
                let message = format!("face corner '{}' has no vertex", token);
                return Err(LoadError::parse(line, message));
            }
        };
        let texcoord = match fields.next() {
            Some(t) if !t.is_empty() => Some(resolve_index(t, mesh.texcoords.len(), line)?),
            _ => None,
        };
        let normal = match fields.next() {
            Some(n) if !n.is_empty() => Some(resolve_index(n, mesh.normals.len(), line)?),
            _ => None,
        };
        Ok(Corner { vertex, texcoord, normal })
    }

    fn corner_colors(&mut self, count: usize) -> Vec<Color> {
        let diffuse = self
            .material
            .as_deref()
            .and_then(|name| self.model.material(name))
            .map(|m| m.diffuse.to_color());

        if let (Some(name), None) = (&self.material, diffuse) {
            if self.missing_materials.insert(name.clone()) {
                warn!("usemtl {}: material not defined", name);
            }
        }

        match diffuse {
            Some(color) => vec![color; count],
            None => (0..count)
                .map(|_| {
                    Color::new(
                        self.rng.random_range(0..=255),
                        self.rng.random_range(0..=255),
                        self.rng.random_range(0..=255),
                    )
                })
                .collect(),
        }
    }

    fn face(&mut self, args: &[&str], line: usize) -> Result<(), LoadError> {
        if args.len() < 3 {
            let message = format!("face needs 3 corners, found {}", args.len());
            return Err(LoadError::parse(line, message));
        }
        let corners = args
            .iter()
            .map(|t| self.corner(t, line))
            .collect::<Result<Vec<_>, _>>()?;
        let colors = self.corner_colors(corners.len());

        // Fan around the first corner
        for i in 1..corners.len() - 1 {
            let tri = [corners[0], corners[i], corners[i + 1]];
            let mut triangle = TriangleRef::new(tri.map(|c| c.vertex));
            // A partial triple counts as absent
            if let [Some(a), Some(b), Some(c)] = tri.map(|c| c.normal) {
                triangle = triangle.with_normals([a, b, c]);
            }
            if let [Some(a), Some(b), Some(c)] = tri.map(|c| c.texcoord) {
                triangle = triangle.with_texcoords([a, b, c]);
            }
            if let Some(material) = &self.material {
                triangle = triangle.with_material(material);
            }
            self.model
                .mesh
                .add_triangle(&self.group, triangle, [colors[0], colors[i], colors[i + 1]]);
        }
        Ok(())
    }
}
