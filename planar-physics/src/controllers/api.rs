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
//! Controller API traits and context
//!
//! Controllers are the extension point for forces that do not come from
//! constraints: buoyancy, attractors, wind and the like. They run at the
//! start of every [`World::step`](crate::World::step), before islands are
//! built, and act on bodies only by applying forces and torques.
//!
//! # Contracts
//!
//! Controllers must:
//! - Tolerate handles to bodies that have since been destroyed (skip them)
//! - Not depend on the order of bodies returned by the context
//! - Not create circular dependencies with other controllers

use std::any::Any;

use crate::dynamics::{Arena, Body, BodyHandle};
use crate::math::Vec2;

/// Version of the controller API
///
/// This version must match between the engine and controllers to ensure
/// compatibility. Format: MAJOR.MINOR.PATCH following semantic versioning.
pub const CONTROLLER_API_VERSION: &str = "0.1.0";

/// Context provided to controllers with scoped access to the world's bodies
///
/// Bodies can be read and have forces applied, but cannot be created or
/// destroyed, so the body set is stable for the duration of a controller
/// pass.
pub struct ControllerContext<'a> {
    bodies: &'a mut Arena<Body>,
    gravity: Vec2,
    timestep: f64,
    time: f64,
}

impl<'a> ControllerContext<'a> {
    /// Create a new controller context
    ///
    /// This is only callable by the engine, not by controllers.
    pub(crate) fn new(bodies: &'a mut Arena<Body>, gravity: Vec2, timestep: f64, time: f64) -> Self {
        ControllerContext {
            bodies,
            gravity,
            timestep,
            time,
        }
    }

    /// World gravity
    pub fn gravity(&self) -> Vec2 {
        self.gravity
    }

    /// Duration of the step about to be taken
    pub fn timestep(&self) -> f64 {
        self.timestep
    }

    /// Simulated time at the start of this step
    pub fn time(&self) -> f64 {
        self.time
    }

    /// Look up a body
    pub fn body(&self, handle: BodyHandle) -> Option<&Body> {
        self.bodies.get(handle.raw())
    }

    /// Look up a body for applying forces
    pub fn body_mut(&mut self, handle: BodyHandle) -> Option<&mut Body> {
        self.bodies.get_mut(handle.raw())
    }

    /// Get a snapshot of all body handles in creation order
    pub fn body_handles(&self) -> Vec<BodyHandle> {
        self.bodies
            .iter()
            .map(|(raw, _)| BodyHandle::from_raw(raw))
            .collect()
    }

    /// Iterate over all bodies
    pub fn bodies(&self) -> impl Iterator<Item = (BodyHandle, &Body)> + '_ {
        self.bodies
            .iter()
            .map(|(raw, body)| (BodyHandle::from_raw(raw), body))
    }

    /// Number of bodies in the world
    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    /// Get the number of threads available for parallel execution
    ///
    /// Returns 1 if the parallel feature is disabled.
    pub fn thread_count(&self) -> usize {
        #[cfg(feature = "parallel")]
        {
            rayon::current_num_threads()
        }
        #[cfg(not(feature = "parallel"))]
        {
            1
        }
    }
}

/// Lifecycle hooks for controllers
///
/// Controllers implement these methods to initialize, update, and clean up
/// their state. Hook errors are plain messages; the registry wraps them in
/// [`PhysicsError::Controller`](crate::PhysicsError::Controller) together
/// with the controller name.
pub trait Controller: Send + Sync {
    /// Get the name of this controller
    ///
    /// Must be unique across all controllers registered with a world.
    fn name(&self) -> &str;

    /// Get the version of this controller
    fn version(&self) -> &str;

    /// Get the controller API version this controller was built against
    fn api_version(&self) -> &str {
        CONTROLLER_API_VERSION
    }

    /// Names of controllers that must run before this one
    fn dependencies(&self) -> Vec<&str> {
        Vec::new()
    }

    /// Called once before the first update
    fn initialize(&mut self, _context: &ControllerContext) -> Result<(), String> {
        Ok(())
    }

    /// Apply this controller's forces for the coming step
    fn update(&mut self, context: &mut ControllerContext) -> Result<(), String>;

    /// Called once when the controller is removed or the world is dropped
    fn shutdown(&mut self) -> Result<(), String> {
        Ok(())
    }

    /// Allow downcasting to concrete controller types
    fn as_any(&self) -> &dyn Any;

    /// Allow mutable downcasting to concrete controller types
    fn as_any_mut(&mut self) -> &mut dyn Any;
}
