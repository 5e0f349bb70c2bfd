// Copyright 2025 John Brosnihan
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//! Small dense matrices for effective-mass computations

use crate::math::{Vec2, Vec3};

/// 3×3 matrix stored by columns
///
/// Constraint effective-mass matrices are symmetric, but nothing here relies
/// on it except the naming of the builder.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Mat33 {
    /// First column
    pub ex: Vec3,
    /// Second column
    pub ey: Vec3,
    /// Third column
    pub ez: Vec3,
}

impl Mat33 {
    /// The zero matrix
    pub const ZERO: Mat33 = Mat33 {
        ex: Vec3::ZERO,
        ey: Vec3::ZERO,
        ez: Vec3::ZERO,
    };

    /// Create a matrix from its columns
    pub const fn from_columns(ex: Vec3, ey: Vec3, ez: Vec3) -> Self {
        Mat33 { ex, ey, ez }
    }

    /// Create a symmetric matrix from its upper triangle
    pub fn symmetric(a11: f64, a12: f64, a13: f64, a22: f64, a23: f64, a33: f64) -> Self {
        Mat33 {
            ex: Vec3::new(a11, a12, a13),
            ey: Vec3::new(a12, a22, a23),
            ez: Vec3::new(a13, a23, a33),
        }
    }

    /// Matrix-vector product
    pub fn mul_vec(&self, v: Vec3) -> Vec3 {
        self.ex * v.x + self.ey * v.y + self.ez * v.z
    }

    /// Solve `A * x = b` by Cramer's rule
    ///
    /// Returns `None` when the determinant is zero or not finite. The matrix
    /// is never inverted and cached, so a configuration that is singular this
    /// iteration can become solvable the next.
    pub fn try_solve33(&self, b: Vec3) -> Option<Vec3> {
        let det = self.ex.dot(self.ey.cross(self.ez));
        if det == 0.0 || !det.is_finite() {
            return None;
        }
        let inv_det = 1.0 / det;
        let x = Vec3::new(
            inv_det * b.dot(self.ey.cross(self.ez)),
            inv_det * self.ex.dot(b.cross(self.ez)),
            inv_det * self.ex.dot(self.ey.cross(b)),
        );
        x.is_valid().then_some(x)
    }

    /// Solve `A * x = b`, yielding zero for a singular matrix
    pub fn solve33(&self, b: Vec3) -> Vec3 {
        self.try_solve33(b).unwrap_or(Vec3::ZERO)
    }

    /// Solve `A * x = b` using only the upper-left 2×2 block
    pub fn try_solve22(&self, b: Vec2) -> Option<Vec2> {
        let (a11, a12, a21, a22) = (self.ex.x, self.ey.x, self.ex.y, self.ey.y);
        let det = a11 * a22 - a12 * a21;
        if det == 0.0 || !det.is_finite() {
            return None;
        }
        let inv_det = 1.0 / det;
        let x = Vec2::new(
            inv_det * (a22 * b.x - a12 * b.y),
            inv_det * (a11 * b.y - a21 * b.x),
        );
        x.is_valid().then_some(x)
    }

    /// Solve the upper-left 2×2 block, yielding zero for a singular block
    pub fn solve22(&self, b: Vec2) -> Vec2 {
        self.try_solve22(b).unwrap_or(Vec2::ZERO)
    }
}
