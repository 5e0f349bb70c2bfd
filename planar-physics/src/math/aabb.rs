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
//! Axis-aligned bounding boxes

use crate::math::Vec2;

/// Axis-aligned bounding box given by its lower and upper corners
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    /// Lower corner
    pub lower: Vec2,
    /// Upper corner
    pub upper: Vec2,
}

impl Aabb {
    /// Create a box from two corners in any order
    pub fn new(a: Vec2, b: Vec2) -> Self {
        Aabb {
            lower: a.min(b),
            upper: a.max(b),
        }
    }

    /// Create a box centered on `center` with the given half extents
    pub fn from_center(center: Vec2, half_extents: Vec2) -> Self {
        Aabb::new(center - half_extents, center + half_extents)
    }

    /// Smallest box containing every point, `None` for an empty iterator
    pub fn from_points<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = Vec2>,
    {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        Some(iter.fold(Aabb::new(first, first), |aabb, p| Aabb {
            lower: aabb.lower.min(p),
            upper: aabb.upper.max(p),
        }))
    }

    /// Center point
    pub fn center(&self) -> Vec2 {
        (self.lower + self.upper) * 0.5
    }

    /// Half of the width and height
    pub fn extents(&self) -> Vec2 {
        (self.upper - self.lower) * 0.5
    }

    /// Check whether the boxes overlap (touching counts)
    pub fn overlaps(&self, other: &Aabb) -> bool {
        !(other.lower.x > self.upper.x
            || other.lower.y > self.upper.y
            || self.lower.x > other.upper.x
            || self.lower.y > other.upper.y)
    }

    /// Check whether a point lies inside or on the boundary
    pub fn contains_point(&self, p: Vec2) -> bool {
        p.x >= self.lower.x && p.x <= self.upper.x && p.y >= self.lower.y && p.y <= self.upper.y
    }

    /// Check that the corners are ordered and finite
    pub fn is_valid(&self) -> bool {
        self.lower.is_valid()
            && self.upper.is_valid()
            && self.upper.x >= self.lower.x
            && self.upper.y >= self.lower.y
    }
}
