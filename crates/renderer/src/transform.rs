//! Column-major 4x4 matrices for the model transform.
//!
//! The chaining helpers (`rotate_z`, `translate`, `scale`) post-multiply,
//! so `Mat4::IDENTITY.rotate_z(a).scale(s)` scales a vertex first and then
//! rotates it. Swapping the calls changes the result for non-uniform scales.

use std::ops::Mul;

use bytemuck::{Pod, Zeroable};

#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct Mat4 {
    /// `cols[0]` is the first column.
    pub cols: [[f32; 4]; 4],
}

impl Mat4 {
    pub const IDENTITY: Self = Self {
        cols: [
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ],
    };

    /// Counter-clockwise rotation about +Z.
    pub fn from_rotation_z(angle_radians: f32) -> Self {
        let (s, c) = angle_radians.sin_cos();
        Self {
            cols: [
                [c, s, 0.0, 0.0],
                [-s, c, 0.0, 0.0],
                [0.0, 0.0, 1.0, 0.0],
                [0.0, 0.0, 0.0, 1.0],
            ],
        }
    }

    pub fn from_scale(scale: [f32; 3]) -> Self {
        Self {
            cols: [
                [scale[0], 0.0, 0.0, 0.0],
                [0.0, scale[1], 0.0, 0.0],
                [0.0, 0.0, scale[2], 0.0],
                [0.0, 0.0, 0.0, 1.0],
            ],
        }
    }

    pub fn from_translation(offset: [f32; 3]) -> Self {
        let mut matrix = Self::IDENTITY;
        matrix.cols[3] = [offset[0], offset[1], offset[2], 1.0];
        matrix
    }

    pub fn rotate_z(self, angle_radians: f32) -> Self {
        self * Self::from_rotation_z(angle_radians)
    }

    pub fn translate(self, offset: [f32; 3]) -> Self {
        self * Self::from_translation(offset)
    }

    pub fn scale(self, scale: [f32; 3]) -> Self {
        self * Self::from_scale(scale)
    }

    /// Flat column-major layout, as `glUniformMatrix4fv` expects without transpose.
    pub fn to_cols_array(&self) -> [f32; 16] {
        bytemuck::cast(self.cols)
    }

    pub fn transform_point(&self, point: [f32; 4]) -> [f32; 4] {
        let mut out = [0.0; 4];
        for (col, &weight) in self.cols.iter().zip(point.iter()) {
            for (row, value) in out.iter_mut().enumerate() {
                *value += col[row] * weight;
            }
        }
        out
    }

    pub fn abs_diff_eq(&self, other: &Self, epsilon: f32) -> bool {
        self.to_cols_array()
            .iter()
            .zip(other.to_cols_array().iter())
            .all(|(a, b)| (a - b).abs() <= epsilon)
    }
}

impl Default for Mat4 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Mul for Mat4 {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        let mut cols = [[0.0; 4]; 4];
        for (out, rhs_col) in cols.iter_mut().zip(rhs.cols.iter()) {
            *out = self.transform_point(*rhs_col);
        }
        Self { cols }
    }
}
