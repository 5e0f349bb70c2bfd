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
//! Buoyancy and fluid drag
//!
//! Each registered body carries a [`FluidProbe`]: an outline in the body's
//! local frame. The submerged part of the body is traced by the outline
//! vertices inside the fluid plus the points where outline edges cross the
//! fluid boundary. The container only answers point queries, so crossings
//! are found by bisecting each edge that enters or leaves the fluid. The
//! controller applies
//!
//! - buoyancy `-gravity * density * area` at the submerged centroid,
//! - linear drag `-linear_drag * area * v` where `v` is the velocity of the
//!   body at that centroid,
//! - angular drag `-angular_drag * area * w`.

use std::any::Any;
use std::collections::HashMap;

use crate::controllers::api::{Controller, ControllerContext};
use crate::controllers::fluid::FluidContainer;
use crate::dynamics::BodyHandle;
use crate::error::{PhysicsError, Result};
use crate::math::{Aabb, Vec2};

/// Local-frame outline used to estimate how much of a body is submerged
#[derive(Debug, Clone, PartialEq)]
pub struct FluidProbe {
    vertices: Vec<Vec2>,
}

impl FluidProbe {
    /// Outline from vertices in counter-clockwise order
    ///
    /// # Errors
    ///
    /// Returns [`PhysicsError::InvalidBodyDef`] for fewer than three vertices
    /// or non-finite coordinates.
    pub fn new(vertices: Vec<Vec2>) -> Result<Self> {
        if vertices.len() < 3 {
            return Err(PhysicsError::InvalidBodyDef(format!(
                "fluid probe needs at least 3 vertices, got {}",
                vertices.len()
            )));
        }
        if !vertices.iter().all(|v| v.is_valid()) {
            return Err(PhysicsError::InvalidBodyDef(
                "fluid probe vertices must be finite".to_string(),
            ));
        }
        Ok(FluidProbe { vertices })
    }

    /// Box outline centered on the body origin with `subdivisions` samples
    /// per edge
    pub fn rectangle(half_width: f64, half_height: f64, subdivisions: usize) -> Self {
        let corners = [
            Vec2::new(-half_width, -half_height),
            Vec2::new(half_width, -half_height),
            Vec2::new(half_width, half_height),
            Vec2::new(-half_width, half_height),
        ];
        let n = subdivisions.max(1);
        let mut vertices = Vec::with_capacity(4 * n);
        for (i, &start) in corners.iter().enumerate() {
            let end = corners[(i + 1) % corners.len()];
            for k in 0..n {
                vertices.push(start + (end - start) * (k as f64 / n as f64));
            }
        }
        FluidProbe { vertices }
    }

    /// Outline vertices in the body's local frame
    pub fn vertices(&self) -> &[Vec2] {
        &self.vertices
    }
}

/// The submerged part of a body during the last update
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Submersion {
    /// Submerged area
    pub area: f64,
    /// World-space centroid of the submerged area
    pub centroid: Vec2,
}

/// Bisection steps used to locate a fluid boundary crossing on an edge
const CROSSING_ITERATIONS: usize = 48;

/// Point on the segment from `inside` to `outside` where it leaves the fluid
fn boundary_crossing(container: &dyn FluidContainer, mut inside: Vec2, mut outside: Vec2) -> Vec2 {
    for _ in 0..CROSSING_ITERATIONS {
        let mid = (inside + outside) * 0.5;
        if container.contains(mid) {
            inside = mid;
        } else {
            outside = mid;
        }
    }
    inside
}

/// Submerged part of a world-space outline, in outline order
fn submerged_outline(container: &dyn FluidContainer, outline: &[Vec2]) -> Vec<Vec2> {
    let wet: Vec<bool> = outline.iter().map(|&p| container.contains(p)).collect();
    let mut points = Vec::with_capacity(outline.len() + 2);

    for i in 0..outline.len() {
        let j = (i + 1) % outline.len();
        let (p, q) = (outline[i], outline[j]);
        if wet[i] {
            points.push(p);
        }
        if wet[i] != wet[j] {
            let crossing = if wet[i] {
                boundary_crossing(container, p, q)
            } else {
                boundary_crossing(container, q, p)
            };
            // A vertex lying on the boundary already is its own crossing
            if crossing != p && crossing != q {
                points.push(crossing);
            }
        }
    }
    points
}

/// Area and centroid of a simple polygon, `None` if degenerate
fn polygon_mass(points: &[Vec2]) -> Option<Submersion> {
    if points.len() < 3 {
        return None;
    }
    // Relative to the first vertex for precision
    let origin = points[0];
    let mut twice_area = 0.0;
    let mut weighted = Vec2::ZERO;
    for i in 1..points.len() - 1 {
        let e1 = points[i] - origin;
        let e2 = points[i + 1] - origin;
        let d = e1.cross(e2);
        twice_area += d;
        weighted += d * (e1 + e2);
    }
    if twice_area.abs() <= f64::EPSILON {
        return None;
    }
    Some(Submersion {
        area: 0.5 * twice_area.abs(),
        centroid: origin + weighted * (1.0 / (3.0 * twice_area)),
    })
}

/// Applies buoyancy and drag to bodies inside a fluid region
pub struct BuoyancyController {
    name: String,
    container: Box<dyn FluidContainer>,
    density: f64,
    linear_drag: f64,
    angular_drag: f64,
    probes: Vec<(BodyHandle, FluidProbe)>,
    submerged: HashMap<BodyHandle, Submersion>,
}

impl BuoyancyController {
    /// Create a controller for `container` filled with fluid of `density`
    ///
    /// # Errors
    ///
    /// Returns [`PhysicsError::InvalidSettings`] if `density` is negative or
    /// not finite.
    pub fn new(container: impl FluidContainer + 'static, density: f64) -> Result<Self> {
        check_coefficient("density", density)?;
        Ok(BuoyancyController {
            name: "buoyancy".to_string(),
            container: Box::new(container),
            density,
            linear_drag: 0.0,
            angular_drag: 0.0,
            probes: Vec::new(),
            submerged: HashMap::new(),
        })
    }

    /// Set the drag coefficients
    ///
    /// # Errors
    ///
    /// Returns [`PhysicsError::InvalidSettings`] for negative or non-finite
    /// coefficients.
    pub fn with_drag(mut self, linear: f64, angular: f64) -> Result<Self> {
        check_coefficient("linear drag", linear)?;
        check_coefficient("angular drag", angular)?;
        self.linear_drag = linear;
        self.angular_drag = angular;
        Ok(self)
    }

    /// Rename, so several fluid regions can be attached to one world
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Make `body` subject to this fluid, replacing any previous probe
    pub fn add_body(&mut self, body: BodyHandle, probe: FluidProbe) {
        self.remove_body(body);
        self.probes.push((body, probe));
    }

    /// Stop affecting `body`; returns whether it was registered
    pub fn remove_body(&mut self, body: BodyHandle) -> bool {
        let before = self.probes.len();
        self.probes.retain(|(handle, _)| *handle != body);
        self.submerged.remove(&body);
        self.probes.len() != before
    }

    /// Number of bodies subject to this fluid
    pub fn body_count(&self) -> usize {
        self.probes.len()
    }

    /// Fluid density
    pub fn density(&self) -> f64 {
        self.density
    }

    /// Submerged part of `body` found by the last update, if any
    pub fn submersion(&self, body: BodyHandle) -> Option<Submersion> {
        self.submerged.get(&body).copied()
    }
}

fn check_coefficient(what: &str, value: f64) -> Result<()> {
    if value >= 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(PhysicsError::InvalidSettings(format!(
            "{} must be non-negative and finite, got {}",
            what, value
        )))
    }
}

impl Controller for BuoyancyController {
    fn name(&self) -> &str {
        &self.name
    }

    fn version(&self) -> &str {
        "1.0.0"
    }

    fn update(&mut self, context: &mut ControllerContext) -> std::result::Result<(), String> {
        let gravity = context.gravity();
        self.submerged.clear();

        for (handle, probe) in &self.probes {
            let Some(body) = context.body_mut(*handle) else {
                continue;
            };
            if !body.is_dynamic() {
                continue;
            }

            let outline: Vec<Vec2> = probe.vertices.iter().map(|&v| body.world_point(v)).collect();
            let Some(bounds) = Aabb::from_points(outline.iter().copied()) else {
                continue;
            };
            if !self.container.intersects(&bounds) {
                continue;
            }

            let inside = submerged_outline(self.container.as_ref(), &outline);
            let Some(submersion) = polygon_mass(&inside) else {
                continue;
            };

            let buoyancy = -self.density * submersion.area * gravity;
            body.apply_force_at_point(buoyancy, submersion.centroid);

            let velocity = body.linear_velocity_from_world_point(submersion.centroid);
            body.apply_force_at_point(-self.linear_drag * submersion.area * velocity, submersion.centroid);
            body.apply_torque(-self.angular_drag * submersion.area * body.angular_velocity());

            self.submerged.insert(*handle, submersion);
        }

        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
