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
//! Fluid region queries
//!
//! The solver never looks inside a fluid region. It only asks the two
//! questions below, so any shape (a box, a wave surface, a heightfield) can
//! back a [`BuoyancyController`](crate::controllers::BuoyancyController).

use crate::math::{Aabb, Vec2};

/// A region of fluid, queried by the buoyancy controller
pub trait FluidContainer: Send + Sync {
    /// Whether the box overlaps the region at all
    ///
    /// Used as a cheap rejection test before per-vertex queries.
    fn intersects(&self, aabb: &Aabb) -> bool;

    /// Whether a world-space point lies inside the fluid
    fn contains(&self, point: Vec2) -> bool;
}

/// A box of still fluid
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AabbFluidContainer {
    bounds: Aabb,
}

impl AabbFluidContainer {
    /// Fluid filling `bounds`
    pub fn new(bounds: Aabb) -> Self {
        AabbFluidContainer { bounds }
    }

    /// Fluid below `surface` between `left` and `right`, `depth` deep
    pub fn pool(left: f64, right: f64, surface: f64, depth: f64) -> Self {
        Self::new(Aabb::new(
            Vec2::new(left, surface - depth),
            Vec2::new(right, surface),
        ))
    }

    /// The fluid's extent
    pub fn bounds(&self) -> &Aabb {
        &self.bounds
    }
}

impl FluidContainer for AabbFluidContainer {
    fn intersects(&self, aabb: &Aabb) -> bool {
        self.bounds.overlaps(aabb)
    }

    fn contains(&self, point: Vec2) -> bool {
        self.bounds.contains_point(point)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_queries() {
        let water = AabbFluidContainer::pool(-10.0, 10.0, 0.0, 5.0);

        assert!(water.contains(Vec2::new(0.0, -1.0)));
        assert!(water.contains(Vec2::new(0.0, 0.0)));
        assert!(!water.contains(Vec2::new(0.0, 0.5)));
        assert!(!water.contains(Vec2::new(11.0, -1.0)));

        let floating = Aabb::from_center(Vec2::new(0.0, 0.25), Vec2::new(0.5, 0.5));
        let flying = Aabb::from_center(Vec2::new(0.0, 3.0), Vec2::new(0.5, 0.5));
        assert!(water.intersects(&floating));
        assert!(!water.intersects(&flying));
    }
}
