//! softgl: a CPU-side 3D rendering pipeline
//!
//! - Row-vector affine math, camera and projection matrices
//! - Indexed triangle meshes with named groups
//! - Gouraud Lambertian / Blinn-Phong lighting
//! - Barycentric z-buffer rasterizer with perspective-correct texturing
//! - Wavefront OBJ/MTL and RON scene loaders

pub mod loader;
pub mod rasterizer;
pub mod scene;
