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
//! Attractor gravity
//!
//! Pulls every dynamic body towards a set of attractors: fixed points in
//! world space and other bodies. With distance `r` from a body of mass `m`
//! to an attractor of mass `M` (1 for points, the body mass for body
//! attractors), the force magnitude is
//!
//! - `strength * m * M * r / (r² + ε²)` for [`GravityFalloff::Linear`],
//! - `strength * m * M * r / (r² + ε²)^(3/2)` for
//!   [`GravityFalloff::InverseSquare`],
//!
//! where `ε` is the softening distance. With `ε = 0` these reduce to
//! `strength * m * M / r` and `strength * m * M / r²`. Attractors outside
//! `[min_radius, max_radius]` are ignored.
//!
//! # Parallel Computation
//!
//! Forces for all targets are computed from a snapshot of body state, on
//! the rayon pool when the `parallel` feature is on and there are enough
//! targets, and only then applied.

use std::any::Any;

use crate::controllers::api::{Controller, ControllerContext};
use crate::dynamics::BodyHandle;
use crate::error::{PhysicsError, Result};
use crate::math::Vec2;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Minimum number of target bodies before forces are computed in parallel
pub const DEFAULT_PARALLEL_THRESHOLD: usize = 256;

/// How attraction weakens with distance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GravityFalloff {
    /// Force proportional to `1 / r`
    Linear,
    /// Force proportional to `1 / r²`
    #[default]
    InverseSquare,
}

#[derive(Debug, Clone, Copy)]
struct Attractor {
    position: Vec2,
    mass: f64,
    body: Option<BodyHandle>,
}

#[derive(Debug, Clone, Copy)]
struct Target {
    handle: BodyHandle,
    center: Vec2,
    mass: f64,
}

/// Applies attraction towards points and bodies
#[derive(Debug, Clone)]
pub struct GravityController {
    strength: f64,
    falloff: GravityFalloff,
    min_radius: f64,
    max_radius: f64,
    softening: f64,
    points: Vec<Vec2>,
    sources: Vec<BodyHandle>,
    parallel_threshold: usize,
}

impl GravityController {
    /// Create a controller with the given strength and no attractors
    ///
    /// # Errors
    ///
    /// Returns [`PhysicsError::InvalidSettings`] if `strength` is not finite.
    pub fn new(strength: f64) -> Result<Self> {
        if !strength.is_finite() {
            return Err(PhysicsError::InvalidSettings(format!(
                "gravity strength must be finite, got {}",
                strength
            )));
        }
        Ok(GravityController {
            strength,
            falloff: GravityFalloff::default(),
            min_radius: 0.0,
            max_radius: f64::INFINITY,
            softening: 0.0,
            points: Vec::new(),
            sources: Vec::new(),
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
        })
    }

    /// Set the falloff law
    pub fn with_falloff(mut self, falloff: GravityFalloff) -> Self {
        self.falloff = falloff;
        self
    }

    /// Only attract bodies between `min` and `max` from an attractor
    ///
    /// # Errors
    ///
    /// Returns [`PhysicsError::InvalidSettings`] unless `0 <= min <= max`.
    pub fn with_radius_limits(mut self, min: f64, max: f64) -> Result<Self> {
        if !(min >= 0.0 && min <= max) {
            return Err(PhysicsError::InvalidSettings(format!(
                "gravity radius limits must satisfy 0 <= min <= max, got {}..{}",
                min, max
            )));
        }
        self.min_radius = min;
        self.max_radius = max;
        Ok(self)
    }

    /// Set the softening distance
    ///
    /// # Errors
    ///
    /// Returns [`PhysicsError::InvalidSettings`] if `softening` is negative or
    /// not finite.
    pub fn with_softening(mut self, softening: f64) -> Result<Self> {
        if !(softening >= 0.0 && softening.is_finite()) {
            return Err(PhysicsError::InvalidSettings(format!(
                "softening must be non-negative and finite, got {}",
                softening
            )));
        }
        self.softening = softening;
        Ok(self)
    }

    /// Set the number of targets from which forces are computed in parallel
    pub fn with_parallel_threshold(mut self, threshold: usize) -> Self {
        self.parallel_threshold = threshold;
        self
    }

    /// Add a fixed attractor of unit mass
    pub fn add_point(&mut self, point: Vec2) {
        self.points.push(point);
    }

    /// Make a body attract all others, weighted by its mass
    pub fn add_body(&mut self, body: BodyHandle) {
        if !self.sources.contains(&body) {
            self.sources.push(body);
        }
    }

    /// Stop a body from attracting others; returns whether it was a source
    pub fn remove_body(&mut self, body: BodyHandle) -> bool {
        let before = self.sources.len();
        self.sources.retain(|&h| h != body);
        self.sources.len() != before
    }

    /// Strength constant
    pub fn strength(&self) -> f64 {
        self.strength
    }

    /// Force on a body of `mass` at `center` from one attractor
    fn attraction(&self, center: Vec2, mass: f64, attractor: &Attractor) -> Option<Vec2> {
        let d = attractor.position - center;
        let r_squared = d.length_squared();
        if r_squared <= f64::EPSILON
            || r_squared < self.min_radius * self.min_radius
            || r_squared > self.max_radius * self.max_radius
        {
            return None;
        }

        let softened = r_squared + self.softening * self.softening;
        let scale = match self.falloff {
            GravityFalloff::Linear => self.strength * mass * attractor.mass / softened,
            GravityFalloff::InverseSquare => {
                self.strength * mass * attractor.mass / (softened * softened.sqrt())
            }
        };

        let force = scale * d;
        if force.is_valid() {
            Some(force)
        } else {
            log::warn!("gravity: non-finite force at {:?}, skipped", center);
            None
        }
    }

    fn total_force(&self, target: &Target, attractors: &[Attractor]) -> Vec2 {
        attractors
            .iter()
            .filter(|a| a.body != Some(target.handle))
            .filter_map(|a| self.attraction(target.center, target.mass, a))
            .fold(Vec2::ZERO, |sum, f| sum + f)
    }

    fn compute_forces(&self, targets: &[Target], attractors: &[Attractor]) -> Vec<Vec2> {
        #[cfg(feature = "parallel")]
        {
            if targets.len() >= self.parallel_threshold {
                return targets
                    .par_iter()
                    .map(|t| self.total_force(t, attractors))
                    .collect();
            }
        }

        targets
            .iter()
            .map(|t| self.total_force(t, attractors))
            .collect()
    }
}

impl Controller for GravityController {
    fn name(&self) -> &str {
        "gravity"
    }

    fn version(&self) -> &str {
        "1.0.0"
    }

    fn update(&mut self, context: &mut ControllerContext) -> std::result::Result<(), String> {
        let mut attractors: Vec<Attractor> = self
            .points
            .iter()
            .map(|&position| Attractor {
                position,
                mass: 1.0,
                body: None,
            })
            .collect();
        for &handle in &self.sources {
            if let Some(body) = context.body(handle) {
                attractors.push(Attractor {
                    position: body.world_center(),
                    mass: body.mass(),
                    body: Some(handle),
                });
            }
        }
        if attractors.is_empty() {
            return Ok(());
        }

        let targets: Vec<Target> = context
            .bodies()
            .filter(|(_, body)| body.is_dynamic())
            .map(|(handle, body)| Target {
                handle,
                center: body.world_center(),
                mass: body.mass(),
            })
            .collect();

        let forces = self.compute_forces(&targets, &attractors);
        for (target, force) in targets.iter().zip(forces) {
            if let Some(body) = context.body_mut(target.handle) {
                body.apply_force(force);
            }
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
