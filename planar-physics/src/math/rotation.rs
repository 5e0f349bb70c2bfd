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
//! Rotations and rigid transforms in the plane

use crate::math::Vec2;

/// Rotation stored as sine/cosine pair
///
/// Equivalent to the 2×2 matrix `[c -s; s c]` without storing the redundant
/// entries.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rot {
    /// Sine of the angle
    pub s: f64,
    /// Cosine of the angle
    pub c: f64,
}

impl Rot {
    /// The identity rotation
    pub const IDENTITY: Rot = Rot { s: 0.0, c: 1.0 };

    /// Create a rotation from an angle in radians
    #[inline]
    pub fn new(angle: f64) -> Self {
        let (s, c) = angle.sin_cos();
        Rot { s, c }
    }

    /// The angle in radians, in `(-pi, pi]`
    #[inline]
    pub fn angle(&self) -> f64 {
        self.s.atan2(self.c)
    }

    /// Rotate a vector, `R * v`
    #[inline]
    pub fn apply(&self, v: Vec2) -> Vec2 {
        Vec2::new(self.c * v.x - self.s * v.y, self.s * v.x + self.c * v.y)
    }

    /// Inverse-rotate a vector, `R^T * v`
    #[inline]
    pub fn apply_inv(&self, v: Vec2) -> Vec2 {
        Vec2::new(self.c * v.x + self.s * v.y, -self.s * v.x + self.c * v.y)
    }
}

impl Default for Rot {
    fn default() -> Self {
        Rot::IDENTITY
    }
}

/// Rigid transform: a rotation followed by a translation
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Transform {
    /// Translation (the body origin in world space)
    pub p: Vec2,
    /// Rotation
    pub q: Rot,
}

impl Transform {
    /// The identity transform
    pub const IDENTITY: Transform = Transform {
        p: Vec2::ZERO,
        q: Rot::IDENTITY,
    };

    /// Create a transform from a position and an angle
    #[inline]
    pub fn new(position: Vec2, angle: f64) -> Self {
        Transform {
            p: position,
            q: Rot::new(angle),
        }
    }

    /// Map a local point into world space
    #[inline]
    pub fn apply(&self, v: Vec2) -> Vec2 {
        self.q.apply(v) + self.p
    }

    /// Map a world point into local space
    #[inline]
    pub fn apply_inv(&self, v: Vec2) -> Vec2 {
        self.q.apply_inv(v - self.p)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_quarter_turn() {
        let q = Rot::new(FRAC_PI_2);
        let v = q.apply(Vec2::new(1.0, 0.0));
        assert!(v.x.abs() < 1e-15);
        assert!((v.y - 1.0).abs() < 1e-15);
        assert!((q.angle() - FRAC_PI_2).abs() < 1e-15);
    }

    #[test]
    fn test_transform_inverse_round_trip() {
        let xf = Transform::new(Vec2::new(3.0, -2.0), 0.7);
        let p = Vec2::new(0.5, 1.25);
        let back = xf.apply_inv(xf.apply(p));
        assert!((back - p).length() < 1e-12);
    }
}
