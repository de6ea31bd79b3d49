//! Vector and matrix math for the transform pipeline
//!
//! Matrices use the row-vector convention: a point is transformed as
//! `v' = v * M`, so `A * B` applies `A` first and `B` second.

use std::ops::{Add, Mul, Neg, Sub};
use serde::{Serialize, Deserialize};

/// Below this magnitude a pivot or edge value counts as zero.
pub const EPSILON: f32 = 1e-6;

/// 3D Vector
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3 { x: 0.0, y: 0.0, z: 0.0 };
    pub const UP: Vec3 = Vec3 { x: 0.0, y: 1.0, z: 0.0 };

    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn dot(self, other: Vec3) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    pub fn cross(self, other: Vec3) -> Vec3 {
        Vec3 {
            x: self.y * other.z - self.z * other.y,
            y: self.z * other.x - self.x * other.z,
            z: self.x * other.y - self.y * other.x,
        }
    }

    pub fn len(self) -> f32 {
        self.dot(self).sqrt()
    }

    pub fn normalize(self) -> Vec3 {
        let l = self.len();
        if l == 0.0 {
            return Vec3::ZERO;
        }
        Vec3 {
            x: self.x / l,
            y: self.y / l,
            z: self.z / l,
        }
    }

    pub fn scale(self, s: f32) -> Vec3 {
        Vec3 {
            x: self.x * s,
            y: self.y * s,
            z: self.z * s,
        }
    }

    /// Promote to a homogeneous point (w = 1)
    pub fn to_point(self) -> Vec4 {
        Vec4::new(self.x, self.y, self.z, 1.0)
    }

    /// Promote to a homogeneous direction (w = 0), unaffected by translation
    pub fn to_direction(self) -> Vec4 {
        Vec4::new(self.x, self.y, self.z, 0.0)
    }
}

impl Add for Vec3 {
    type Output = Vec3;
    fn add(self, other: Vec3) -> Vec3 {
        Vec3 {
            x: self.x + other.x,
            y: self.y + other.y,
            z: self.z + other.z,
        }
    }
}

impl Sub for Vec3 {
    type Output = Vec3;
    fn sub(self, other: Vec3) -> Vec3 {
        Vec3 {
            x: self.x - other.x,
            y: self.y - other.y,
            z: self.z - other.z,
        }
    }
}

impl Neg for Vec3 {
    type Output = Vec3;
    fn neg(self) -> Vec3 {
        self.scale(-1.0)
    }
}

impl Mul<f32> for Vec3 {
    type Output = Vec3;
    fn mul(self, s: f32) -> Vec3 {
        self.scale(s)
    }
}

/// 2D Vector (texture coordinates and screen positions)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Homogeneous 4D vector (x, y, z, w)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec4 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

impl Vec4 {
    pub fn new(x: f32, y: f32, z: f32, w: f32) -> Self {
        Self { x, y, z, w }
    }

    pub fn xyz(self) -> Vec3 {
        Vec3::new(self.x, self.y, self.z)
    }

    /// Perspective divide. Returns None when w is too close to zero.
    pub fn divide(self) -> Option<Vec4> {
        if self.w.abs() < EPSILON || !self.w.is_finite() {
            return None;
        }
        let inv = 1.0 / self.w;
        Some(Vec4::new(self.x * inv, self.y * inv, self.z * inv, 1.0))
    }

    fn as_array(self) -> [f32; 4] {
        [self.x, self.y, self.z, self.w]
    }
}

/// 3x3 matrix, rows first. Used for the linear part of transforms (normals).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mat3 {
    pub m: [[f32; 3]; 3],
}

impl Mat3 {
    pub const IDENTITY: Mat3 = Mat3 {
        m: [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
    };

    pub fn transpose(&self) -> Mat3 {
        let mut out = [[0.0; 3]; 3];
        for (i, row) in out.iter_mut().enumerate() {
            for (j, cell) in row.iter_mut().enumerate() {
                *cell = self.m[j][i];
            }
        }
        Mat3 { m: out }
    }

    pub fn determinant(&self) -> f32 {
        let m = &self.m;
        m[0][0] * (m[1][1] * m[2][2] - m[1][2] * m[2][1])
            - m[0][1] * (m[1][0] * m[2][2] - m[1][2] * m[2][0])
            + m[0][2] * (m[1][0] * m[2][1] - m[1][1] * m[2][0])
    }

    /// Inverse via the adjugate. None for singular matrices.
    pub fn inverse(&self) -> Option<Mat3> {
        let det = self.determinant();
        if det.abs() < EPSILON {
            return None;
        }
        let m = &self.m;
        let inv_det = 1.0 / det;
        let cof = |r0: usize, r1: usize, c0: usize, c1: usize| {
            m[r0][c0] * m[r1][c1] - m[r0][c1] * m[r1][c0]
        };
        Some(Mat3 {
            m: [
                [cof(1, 2, 1, 2) * inv_det, -cof(0, 2, 1, 2) * inv_det, cof(0, 1, 1, 2) * inv_det],
                [-cof(1, 2, 0, 2) * inv_det, cof(0, 2, 0, 2) * inv_det, -cof(0, 1, 0, 2) * inv_det],
                [cof(1, 2, 0, 1) * inv_det, -cof(0, 2, 0, 1) * inv_det, cof(0, 1, 0, 1) * inv_det],
            ],
        })
    }
}

impl Mul<Mat3> for Vec3 {
    type Output = Vec3;
    fn mul(self, mat: Mat3) -> Vec3 {
        let m = &mat.m;
        Vec3 {
            x: self.x * m[0][0] + self.y * m[1][0] + self.z * m[2][0],
            y: self.x * m[0][1] + self.y * m[1][1] + self.z * m[2][1],
            z: self.x * m[0][2] + self.y * m[1][2] + self.z * m[2][2],
        }
    }
}

/// 4x4 homogeneous transform, rows first
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mat4 {
    pub m: [[f32; 4]; 4],
}

impl Default for Mat4 {
    fn default() -> Self {
        Mat4::IDENTITY
    }
}

impl Mat4 {
    pub const IDENTITY: Mat4 = Mat4 {
        m: [
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ],
    };

    pub fn from_rows(m: [[f32; 4]; 4]) -> Self {
        Self { m }
    }

    pub fn translate(dx: f32, dy: f32, dz: f32) -> Mat4 {
        Mat4::from_rows([
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [dx, dy, dz, 1.0],
        ])
    }

    /// Rotation in the y-z plane
    pub fn rotate_x(a: f32) -> Mat4 {
        let (s, c) = a.sin_cos();
        Mat4::from_rows([
            [1.0, 0.0, 0.0, 0.0],
            [0.0, c, s, 0.0],
            [0.0, -s, c, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ])
    }

    /// Rotation in the z-x plane
    pub fn rotate_y(a: f32) -> Mat4 {
        let (s, c) = a.sin_cos();
        Mat4::from_rows([
            [c, 0.0, -s, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [s, 0.0, c, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ])
    }

    /// Rotation in the x-y plane
    pub fn rotate_z(a: f32) -> Mat4 {
        let (s, c) = a.sin_cos();
        Mat4::from_rows([
            [c, s, 0.0, 0.0],
            [-s, c, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ])
    }

    pub fn scale(sx: f32, sy: f32, sz: f32) -> Mat4 {
        Mat4::from_rows([
            [sx, 0.0, 0.0, 0.0],
            [0.0, sy, 0.0, 0.0],
            [0.0, 0.0, sz, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ])
    }

    pub fn transpose(&self) -> Mat4 {
        let mut out = [[0.0; 4]; 4];
        for (i, row) in out.iter_mut().enumerate() {
            for (j, cell) in row.iter_mut().enumerate() {
                *cell = self.m[j][i];
            }
        }
        Mat4 { m: out }
    }

    /// Upper-left 3x3 block (rotation/scale/shear, no translation)
    pub fn linear(&self) -> Mat3 {
        let m = &self.m;
        Mat3 {
            m: [
                [m[0][0], m[0][1], m[0][2]],
                [m[1][0], m[1][1], m[1][2]],
                [m[2][0], m[2][1], m[2][2]],
            ],
        }
    }

    /// Inverse-transpose of the linear part, for transforming normals.
    /// Falls back to the plain linear part when it is singular.
    pub fn normal_matrix(&self) -> Mat3 {
        let linear = self.linear();
        linear.inverse().map(|inv| inv.transpose()).unwrap_or(linear)
    }

    /// Gauss-Jordan inverse with partial pivoting. None for singular matrices.
    pub fn inverse(&self) -> Option<Mat4> {
        let mut a = self.m;
        let mut inv = Mat4::IDENTITY.m;

        for col in 0..4 {
            let pivot = (col..4)
                .max_by(|&i, &j| a[i][col].abs().total_cmp(&a[j][col].abs()))?;
            if a[pivot][col].abs() < EPSILON {
                return None;
            }
            a.swap(col, pivot);
            inv.swap(col, pivot);

            let p = a[col][col];
            for k in 0..4 {
                a[col][k] /= p;
                inv[col][k] /= p;
            }

            for row in 0..4 {
                if row == col {
                    continue;
                }
                let factor = a[row][col];
                if factor == 0.0 {
                    continue;
                }
                for k in 0..4 {
                    a[row][k] -= factor * a[col][k];
                    inv[row][k] -= factor * inv[col][k];
                }
            }
        }

        Some(Mat4 { m: inv })
    }
}

impl Mul for Mat4 {
    type Output = Mat4;
    fn mul(self, rhs: Mat4) -> Mat4 {
        let mut out = [[0.0; 4]; 4];
        for (i, row) in out.iter_mut().enumerate() {
            for (j, cell) in row.iter_mut().enumerate() {
                *cell = (0..4).map(|k| self.m[i][k] * rhs.m[k][j]).sum();
            }
        }
        Mat4 { m: out }
    }
}

impl Mul<Mat4> for Vec4 {
    type Output = Vec4;
    fn mul(self, mat: Mat4) -> Vec4 {
        let v = self.as_array();
        let col = |j: usize| (0..4).map(|i| v[i] * mat.m[i][j]).sum::<f32>();
        Vec4::new(col(0), col(1), col(2), col(3))
    }
}

/// Right-multiply every vertex row by `m`, producing a new buffer
pub fn affine(vertices: &[Vec4], m: &Mat4) -> Vec<Vec4> {
    vertices.iter().map(|&v| v * *m).collect()
}

/// Transform normals by the inverse-transpose of `m`'s linear part.
/// Translation has no effect; results are re-normalized.
pub fn affine_normals(normals: &[Vec3], m: &Mat4) -> Vec<Vec3> {
    let nm = m.normal_matrix();
    normals.iter().map(|&n| (n * nm).normalize()).collect()
}

/// Signed edge function of the line through `a` and `b`, evaluated at `p`
#[inline]
pub fn edge_function(a: Vec2, b: Vec2, p: Vec2) -> f32 {
    (a.y - b.y) * p.x + (b.x - a.x) * p.y + a.x * b.y - b.x * a.y
}

/// Edge functions of one triangle, normalised for barycentric evaluation.
///
/// Each coordinate is an edge function divided by its value at the
/// opposite vertex: alpha = f12(p) / f12(v0), beta = f20(p) / f20(v1),
/// gamma = f01(p) / f01(v2).
#[derive(Debug, Clone, Copy)]
pub struct TriangleEdges {
    v: [Vec2; 3],
    norm: [f32; 3],
}

impl TriangleEdges {
    /// None for degenerate triangles, where a normalising value is zero
    pub fn new(v0: Vec2, v1: Vec2, v2: Vec2) -> Option<Self> {
        let norm = [
            edge_function(v1, v2, v0),
            edge_function(v2, v0, v1),
            edge_function(v0, v1, v2),
        ];
        if norm.iter().any(|n| n.abs() < EPSILON || !n.is_finite()) {
            return None;
        }
        Some(Self { v: [v0, v1, v2], norm })
    }

    /// Twice the signed screen area, positive for counter-clockwise (y down)
    pub fn signed_area(&self) -> f32 {
        self.norm[2]
    }

    /// Barycentric coordinates (alpha, beta, gamma) of `p`
    #[inline]
    pub fn at(&self, p: Vec2) -> Vec3 {
        let [v0, v1, v2] = self.v;
        Vec3::new(
            edge_function(v1, v2, p) / self.norm[0],
            edge_function(v2, v0, p) / self.norm[1],
            edge_function(v0, v1, p) / self.norm[2],
        )
    }
}

/// Barycentric coordinates (alpha, beta, gamma) of `p` in triangle (v0, v1, v2).
/// Returns None for degenerate triangles.
pub fn barycentric(p: Vec2, v0: Vec2, v1: Vec2, v2: Vec2) -> Option<Vec3> {
    let bc = TriangleEdges::new(v0, v1, v2)?.at(p);
    if !(bc.x.is_finite() && bc.y.is_finite() && bc.z.is_finite()) {
        return None;
    }
    Some(bc)
}
