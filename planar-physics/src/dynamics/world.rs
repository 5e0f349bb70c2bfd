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
//! The simulation world
//!
//! [`World`] owns every body, joint and pending contact, and advances them
//! with [`World::step`]. Each step:
//!
//! 1. runs the registered controllers, which apply forces;
//! 2. partitions bodies into islands linked by enabled joints and contacts;
//! 3. solves each island (velocity integration, constraint initialization
//!    and warm starting, velocity passes, position integration, position
//!    passes with early exit), in parallel when enabled;
//! 4. writes the solved bodies back, breaks overloaded joints and drops the
//!    step's contacts.

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::controllers::{Controller, ControllerContext, ControllerRegistry};
use crate::dynamics::island::{self, Island, IslandOutcome};
use crate::dynamics::{Arena, Body, BodyDef, BodyHandle, JointHandle, Settings, TimeStep};
use crate::error::{PhysicsError, Result};
use crate::joints::{self, Constraint, Joint};
use crate::math::Vec2;
use crate::pool::{BufferPool, PoolConfig, PoolStats};

struct JointEntry {
    joint: Box<dyn Joint>,
    enabled: bool,
    breakpoint: f64,
}

/// Summary of one [`World::step`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StepReport {
    /// Number of islands solved
    pub island_count: usize,
    /// Number of constraints solved, joints and contacts
    pub constraint_count: usize,
    /// Most position passes run by any island
    pub position_iterations: usize,
    /// Whether every island's position correction converged
    pub position_converged: bool,
    /// Joints disabled this step because their reaction force exceeded
    /// their breakpoint
    pub broken_joints: Vec<JointHandle>,
}

/// Owns bodies and constraints and steps them forward in time
pub struct World {
    bodies: Arena<Body>,
    joints: Arena<JointEntry>,
    contacts: Vec<Box<dyn Constraint>>,
    gravity: Vec2,
    settings: Settings,
    controllers: ControllerRegistry,
    pool: BufferPool<Body>,
    prev_inv_dt: f64,
    time: f64,
    step_count: u64,
}

impl World {
    /// Create an empty world with default settings
    pub fn new(gravity: Vec2) -> Self {
        World {
            bodies: Arena::new(),
            joints: Arena::new(),
            contacts: Vec::new(),
            gravity,
            settings: Settings::default(),
            controllers: ControllerRegistry::new(),
            pool: BufferPool::with_config(PoolConfig::default()),
            prev_inv_dt: 0.0,
            time: 0.0,
            step_count: 0,
        }
    }

    /// Create an empty world with custom settings
    ///
    /// # Errors
    ///
    /// Returns [`PhysicsError::InvalidSettings`] if `settings` fail
    /// validation.
    pub fn with_settings(gravity: Vec2, settings: Settings) -> Result<Self> {
        settings.validate()?;
        let mut world = World::new(gravity);
        world.settings = settings;
        Ok(world)
    }

    /// World gravity
    pub fn gravity(&self) -> Vec2 {
        self.gravity
    }

    /// Set world gravity
    pub fn set_gravity(&mut self, gravity: Vec2) {
        self.gravity = gravity;
    }

    /// Solver settings
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Replace the solver settings
    ///
    /// # Errors
    ///
    /// Returns [`PhysicsError::InvalidSettings`] and keeps the old settings
    /// if `settings` fail validation.
    pub fn set_settings(&mut self, settings: Settings) -> Result<()> {
        settings.validate()?;
        self.settings = settings;
        Ok(())
    }

    // Bodies

    /// Create a body from a definition
    ///
    /// # Errors
    ///
    /// Returns [`PhysicsError::InvalidBodyDef`] if the definition is invalid.
    pub fn create_body(&mut self, def: &BodyDef) -> Result<BodyHandle> {
        let body = Body::new(def)?;
        Ok(self.insert_body(body))
    }

    /// Take ownership of an existing body
    pub fn insert_body(&mut self, body: Body) -> BodyHandle {
        BodyHandle::from_raw(self.bodies.insert(body))
    }

    /// Destroy a body together with every joint and contact attached to it
    ///
    /// # Errors
    ///
    /// Returns [`PhysicsError::StaleBody`] if the handle is not owned by
    /// this world.
    pub fn destroy_body(&mut self, handle: BodyHandle) -> Result<Body> {
        let body = self
            .bodies
            .remove(handle.raw())
            .ok_or_else(|| PhysicsError::StaleBody(handle.to_string()))?;

        let attached: Vec<_> = self
            .joints
            .iter()
            .filter(|(_, entry)| {
                entry.joint.body_a() == handle || entry.joint.body_b() == handle
            })
            .map(|(raw, _)| raw)
            .collect();
        for raw in &attached {
            self.joints.remove(*raw);
        }
        self.contacts
            .retain(|c| c.body_a() != handle && c.body_b() != handle);

        log::debug!(
            "destroyed {} and {} attached joint(s)",
            handle,
            attached.len()
        );
        Ok(body)
    }

    /// Look up a body
    ///
    /// # Errors
    ///
    /// Returns [`PhysicsError::StaleBody`] if the handle is not owned by
    /// this world.
    pub fn body(&self, handle: BodyHandle) -> Result<&Body> {
        self.bodies
            .get(handle.raw())
            .ok_or_else(|| PhysicsError::StaleBody(handle.to_string()))
    }

    /// Look up a body for modification
    ///
    /// # Errors
    ///
    /// Returns [`PhysicsError::StaleBody`] if the handle is not owned by
    /// this world.
    pub fn body_mut(&mut self, handle: BodyHandle) -> Result<&mut Body> {
        self.bodies
            .get_mut(handle.raw())
            .ok_or_else(|| PhysicsError::StaleBody(handle.to_string()))
    }

    /// Whether the handle refers to a live body of this world
    pub fn contains_body(&self, handle: BodyHandle) -> bool {
        self.bodies.contains(handle.raw())
    }

    /// Number of bodies
    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    /// Iterate bodies in creation order
    pub fn bodies(&self) -> impl Iterator<Item = (BodyHandle, &Body)> + '_ {
        self.bodies
            .iter()
            .map(|(raw, body)| (BodyHandle::from_raw(raw), body))
    }

    /// Clear accumulated forces and torques on every body
    pub fn clear_forces(&mut self) {
        for (_, body) in self.bodies.iter_mut() {
            body.clear_forces();
        }
    }

    // Joints

    fn validate_pair(&self, a: BodyHandle, b: BodyHandle) -> Result<()> {
        let body_a = self.body(a)?;
        let body_b = self.body(b)?;
        if a == b {
            return Err(PhysicsError::SameBody(a.to_string()));
        }
        if joints::immovable(body_a, body_b) {
            return Err(PhysicsError::DegenerateMass(a.to_string(), b.to_string()));
        }
        Ok(())
    }

    /// Add a joint
    ///
    /// # Errors
    ///
    /// - [`PhysicsError::StaleBody`] if either body is not owned by this world
    /// - [`PhysicsError::SameBody`] if the joint connects a body to itself
    /// - [`PhysicsError::DegenerateMass`] if neither body can move
    pub fn add_joint<J: Joint + 'static>(&mut self, joint: J) -> Result<JointHandle> {
        self.add_boxed_joint(Box::new(joint))
    }

    /// Add an already boxed joint, see [`add_joint`](Self::add_joint)
    pub fn add_boxed_joint(&mut self, joint: Box<dyn Joint>) -> Result<JointHandle> {
        if let Err(err) = self.validate_pair(joint.body_a(), joint.body_b()) {
            log::warn!("rejected {:?} joint: {}", joint.joint_type(), err);
            return Err(err);
        }
        let raw = self.joints.insert(JointEntry {
            joint,
            enabled: true,
            breakpoint: f64::INFINITY,
        });
        Ok(JointHandle::from_raw(raw))
    }

    /// Remove a joint
    ///
    /// # Errors
    ///
    /// Returns [`PhysicsError::StaleJoint`] if the handle is not owned by
    /// this world.
    pub fn destroy_joint(&mut self, handle: JointHandle) -> Result<Box<dyn Joint>> {
        self.joints
            .remove(handle.raw())
            .map(|entry| entry.joint)
            .ok_or_else(|| PhysicsError::StaleJoint(handle.to_string()))
    }

    fn joint_entry(&self, handle: JointHandle) -> Result<&JointEntry> {
        self.joints
            .get(handle.raw())
            .ok_or_else(|| PhysicsError::StaleJoint(handle.to_string()))
    }

    fn joint_entry_mut(&mut self, handle: JointHandle) -> Result<&mut JointEntry> {
        self.joints
            .get_mut(handle.raw())
            .ok_or_else(|| PhysicsError::StaleJoint(handle.to_string()))
    }

    /// Look up a joint
    ///
    /// # Errors
    ///
    /// Returns [`PhysicsError::StaleJoint`] if the handle is not owned by
    /// this world.
    pub fn joint(&self, handle: JointHandle) -> Result<&dyn Joint> {
        self.joint_entry(handle).map(|entry| entry.joint.as_ref())
    }

    /// Look up a joint as its concrete type
    pub fn joint_as<T: Joint + 'static>(&self, handle: JointHandle) -> Option<&T> {
        self.joints
            .get(handle.raw())
            .and_then(|entry| entry.joint.as_any().downcast_ref::<T>())
    }

    /// Look up a joint as its concrete type for modification
    pub fn joint_as_mut<T: Joint + 'static>(&mut self, handle: JointHandle) -> Option<&mut T> {
        self.joints
            .get_mut(handle.raw())
            .and_then(|entry| entry.joint.as_any_mut().downcast_mut::<T>())
    }

    /// Number of joints, enabled or not
    pub fn joint_count(&self) -> usize {
        self.joints.len()
    }

    /// Iterate joints in creation order
    pub fn joints(&self) -> impl Iterator<Item = (JointHandle, &dyn Joint)> + '_ {
        self.joints
            .iter()
            .map(|(raw, entry)| (JointHandle::from_raw(raw), entry.joint.as_ref()))
    }

    /// Enable or disable a joint
    ///
    /// Disabled joints are not solved and do not link islands.
    ///
    /// # Errors
    ///
    /// Returns [`PhysicsError::StaleJoint`] for an unknown handle.
    pub fn set_joint_enabled(&mut self, handle: JointHandle, enabled: bool) -> Result<()> {
        self.joint_entry_mut(handle)?.enabled = enabled;
        Ok(())
    }

    /// Whether a joint is enabled
    ///
    /// # Errors
    ///
    /// Returns [`PhysicsError::StaleJoint`] for an unknown handle.
    pub fn is_joint_enabled(&self, handle: JointHandle) -> Result<bool> {
        Ok(self.joint_entry(handle)?.enabled)
    }

    /// Set the reaction force above which the joint breaks
    ///
    /// # Errors
    ///
    /// - [`PhysicsError::StaleJoint`] for an unknown handle
    /// - [`PhysicsError::InvalidSettings`] unless `breakpoint` is positive
    ///   (`f64::INFINITY` makes the joint unbreakable)
    pub fn set_joint_breakpoint(&mut self, handle: JointHandle, breakpoint: f64) -> Result<()> {
        if !(breakpoint > 0.0) {
            return Err(PhysicsError::InvalidSettings(format!(
                "joint breakpoint must be positive, got {}",
                breakpoint
            )));
        }
        self.joint_entry_mut(handle)?.breakpoint = breakpoint;
        Ok(())
    }

    /// Reaction force above which the joint breaks
    ///
    /// # Errors
    ///
    /// Returns [`PhysicsError::StaleJoint`] for an unknown handle.
    pub fn joint_breakpoint(&self, handle: JointHandle) -> Result<f64> {
        Ok(self.joint_entry(handle)?.breakpoint)
    }

    /// World-space anchors of a joint on body A and body B
    ///
    /// # Errors
    ///
    /// Returns [`PhysicsError::StaleJoint`] for an unknown handle.
    pub fn joint_anchors(&self, handle: JointHandle) -> Result<(Vec2, Vec2)> {
        let joint = self.joint(handle)?;
        let a = self.body(joint.body_a())?;
        let b = self.body(joint.body_b())?;
        Ok((joint.anchor_a(a), joint.anchor_b(b)))
    }

    /// Force the joint applied on body B during the last step
    ///
    /// # Errors
    ///
    /// Returns [`PhysicsError::StaleJoint`] for an unknown handle.
    pub fn joint_reaction_force(&self, handle: JointHandle) -> Result<Vec2> {
        Ok(self.joint(handle)?.reaction_force(self.prev_inv_dt))
    }

    /// Torque the joint applied on body B during the last step
    ///
    /// # Errors
    ///
    /// Returns [`PhysicsError::StaleJoint`] for an unknown handle.
    pub fn joint_reaction_torque(&self, handle: JointHandle) -> Result<f64> {
        Ok(self.joint(handle)?.reaction_torque(self.prev_inv_dt))
    }

    // Contacts

    /// Submit a contact constraint for the next step only
    ///
    /// # Errors
    ///
    /// Same validation as [`add_joint`](Self::add_joint).
    pub fn push_contact(&mut self, contact: Box<dyn Constraint>) -> Result<()> {
        self.validate_pair(contact.body_a(), contact.body_b())?;
        self.contacts.push(contact);
        Ok(())
    }

    /// Number of contacts waiting for the next step
    pub fn pending_contact_count(&self) -> usize {
        self.contacts.len()
    }

    // Controllers

    /// Register a controller; it runs from the next step on
    ///
    /// # Errors
    ///
    /// See [`ControllerRegistry::register`].
    pub fn add_controller(&mut self, controller: Box<dyn Controller>) -> Result<()> {
        self.controllers.register(controller)
    }

    /// Remove a controller by name
    ///
    /// # Errors
    ///
    /// See [`ControllerRegistry::unregister`].
    pub fn remove_controller(&mut self, name: &str) -> Result<Option<Box<dyn Controller>>> {
        self.controllers.unregister(name)
    }

    /// Look up a controller as its concrete type
    pub fn controller_as<T: Controller + 'static>(&self, name: &str) -> Option<&T> {
        self.controllers
            .get(name)
            .and_then(|c| c.as_any().downcast_ref::<T>())
    }

    /// Look up a controller as its concrete type for modification
    pub fn controller_as_mut<T: Controller + 'static>(&mut self, name: &str) -> Option<&mut T> {
        self.controllers
            .get_mut(name)
            .and_then(|c| c.as_any_mut().downcast_mut::<T>())
    }

    /// The controller registry
    pub fn controllers(&self) -> &ControllerRegistry {
        &self.controllers
    }

    // Stepping

    /// Advance the simulation by `dt`
    ///
    /// # Errors
    ///
    /// - [`PhysicsError::InvalidTimeStep`] if `dt` is not positive and finite;
    ///   the world is left untouched
    /// - any error reported by a controller; forces the pass had already
    ///   applied are rolled back
    pub fn step(&mut self, dt: f64) -> Result<StepReport> {
        let step = TimeStep::new(dt, self.prev_inv_dt, &self.settings)?;

        if !self.controllers.is_empty() {
            // Controllers cannot add or remove bodies, so arena order is stable
            let accumulated: Vec<(Vec2, f64)> = self
                .bodies
                .iter()
                .map(|(_, body)| (body.force, body.torque))
                .collect();
            let result = {
                let mut context =
                    ControllerContext::new(&mut self.bodies, self.gravity, dt, self.time);
                self.controllers.update_all(&mut context)
            };
            if let Err(err) = result {
                for ((_, body), (force, torque)) in self.bodies.iter_mut().zip(accumulated) {
                    body.force = force;
                    body.torque = torque;
                }
                return Err(err);
            }
        }

        let solved = self.solve_constraints(&step);
        if solved.is_err() {
            self.contacts.clear();
        }
        let (island_count, constraint_count, outcomes) = solved?;

        for (raw, body) in self.bodies.iter() {
            if !body.is_valid() {
                log::warn!(
                    "{} has non-finite state after step {}",
                    BodyHandle::from_raw(raw),
                    self.step_count
                );
            }
        }

        let mut broken_joints = Vec::new();
        for (raw, entry) in self.joints.iter_mut() {
            if !entry.enabled || entry.breakpoint == f64::INFINITY {
                continue;
            }
            let force = entry.joint.reaction_force(step.inv_dt).length();
            if force > entry.breakpoint {
                entry.enabled = false;
                let handle = JointHandle::from_raw(raw);
                log::debug!(
                    "{} broke: reaction force {:.3} exceeds {:.3}",
                    handle,
                    force,
                    entry.breakpoint
                );
                broken_joints.push(handle);
            }
        }

        self.contacts.clear();
        self.prev_inv_dt = step.inv_dt;
        self.time += dt;
        self.step_count += 1;

        let report = StepReport {
            island_count,
            constraint_count,
            position_iterations: outcomes
                .iter()
                .map(|o| o.position_iterations)
                .max()
                .unwrap_or(0),
            position_converged: outcomes.iter().all(|o| o.converged),
            broken_joints,
        };

        if !report.position_converged {
            log::debug!(
                "step {}: position correction stopped at {} iteration(s) without converging",
                self.step_count,
                report.position_iterations
            );
        }
        log::debug!(
            "step {}: {} island(s), {} constraint(s)",
            self.step_count,
            report.island_count,
            report.constraint_count
        );

        Ok(report)
    }

    /// Build islands from the enabled joints and pending contacts, solve
    /// them and copy the results back
    ///
    /// Returns the island count, the constraint count and one outcome per
    /// island.
    fn solve_constraints(&mut self, step: &TimeStep) -> Result<(usize, usize, Vec<IslandOutcome>)> {
        let mut constraints: Vec<&mut dyn Constraint> =
            Vec::with_capacity(self.joints.len() + self.contacts.len());
        for (_, entry) in self.joints.iter_mut() {
            if entry.enabled {
                constraints.push(entry.joint.as_constraint_mut());
            }
        }
        for contact in self.contacts.iter_mut() {
            constraints.push(&mut **contact);
        }
        let constraint_count = constraints.len();

        let mut islands = island::build_islands(&self.bodies, constraints, &self.pool)?;
        let outcomes = solve_islands(&mut islands, step, self.gravity, &self.settings);
        let island_count = islands.len();
        for island in islands {
            island.write_back(&mut self.bodies);
        }

        Ok((island_count, constraint_count, outcomes))
    }

    /// Simulated time elapsed
    pub fn time(&self) -> f64 {
        self.time
    }

    /// Number of completed steps
    pub fn step_count(&self) -> u64 {
        self.step_count
    }

    /// Sum of `mass * velocity` over dynamic bodies
    pub fn total_linear_momentum(&self) -> Vec2 {
        self.bodies
            .iter()
            .filter(|(_, body)| body.is_dynamic())
            .fold(Vec2::ZERO, |sum, (_, body)| {
                sum + body.mass() * body.linear_velocity()
            })
    }

    /// Sum of kinetic energy over dynamic bodies
    pub fn total_kinetic_energy(&self) -> f64 {
        self.bodies
            .iter()
            .map(|(_, body)| body.kinetic_energy())
            .sum()
    }

    /// Island scratch buffer pool statistics
    pub fn pool_stats(&self) -> PoolStats {
        self.pool.stats()
    }
}

impl Default for World {
    fn default() -> Self {
        World::new(Vec2::ZERO)
    }
}

fn solve_islands(
    islands: &mut [Island<'_>],
    step: &TimeStep,
    gravity: Vec2,
    settings: &Settings,
) -> Vec<IslandOutcome> {
    #[cfg(feature = "parallel")]
    {
        if settings.parallel_islands && islands.len() > 1 {
            return islands
                .par_iter_mut()
                .map(|island| island.solve(step, gravity, settings))
                .collect();
        }
    }

    islands
        .iter_mut()
        .map(|island| island.solve(step, gravity, settings))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::joints::WeldJoint;

    fn world_with_pair() -> (World, BodyHandle, BodyHandle) {
        let mut world = World::new(Vec2::ZERO);
        let ground = world.create_body(&BodyDef::fixed()).unwrap();
        let body = world
            .create_body(&BodyDef::dynamic().with_position(Vec2::new(0.0, -1.0)))
            .unwrap();
        (world, ground, body)
    }

    #[test]
    fn test_invalid_settings_rejected() {
        let settings = Settings::default().with_velocity_iterations(0);
        assert!(World::with_settings(Vec2::ZERO, settings.clone()).is_err());

        let mut world = World::default();
        assert!(world.set_settings(settings).is_err());
        assert_eq!(world.settings().velocity_iterations, 8);
    }

    #[test]
    fn test_joint_lookup_and_downcast() {
        let (mut world, ground, body) = world_with_pair();
        let handle = world
            .add_joint(WeldJoint::new(ground, body, Vec2::ZERO, Vec2::new(0.0, 1.0)))
            .unwrap();

        assert_eq!(world.joint_count(), 1);
        assert_eq!(world.joint(handle).unwrap().body_b(), body);
        let weld = world.joint_as::<WeldJoint>(handle).unwrap();
        assert_eq!(weld.local_anchor_b(), Vec2::new(0.0, 1.0));

        let (anchor_a, anchor_b) = world.joint_anchors(handle).unwrap();
        assert_eq!(anchor_a, Vec2::ZERO);
        assert_eq!(anchor_b, Vec2::ZERO);
    }

    #[test]
    fn test_disabled_joint_is_not_solved() {
        let (mut world, ground, body) = world_with_pair();
        let handle = world
            .add_joint(WeldJoint::new(ground, body, Vec2::ZERO, Vec2::new(0.0, 1.0)))
            .unwrap();
        world.set_joint_enabled(handle, false).unwrap();
        assert!(!world.is_joint_enabled(handle).unwrap());

        world
            .body_mut(body)
            .unwrap()
            .set_linear_velocity(Vec2::new(1.0, 0.0));
        let report = world.step(0.5).unwrap();

        assert_eq!(report.constraint_count, 0);
        assert_eq!(world.body(body).unwrap().position(), Vec2::new(0.5, -1.0));
    }

    #[test]
    fn test_breakpoint_validation() {
        let (mut world, ground, body) = world_with_pair();
        let handle = world
            .add_joint(WeldJoint::new(ground, body, Vec2::ZERO, Vec2::new(0.0, 1.0)))
            .unwrap();

        assert_eq!(world.joint_breakpoint(handle).unwrap(), f64::INFINITY);
        assert!(world.set_joint_breakpoint(handle, 0.0).is_err());
        assert!(world.set_joint_breakpoint(handle, f64::NAN).is_err());
        world.set_joint_breakpoint(handle, 10.0).unwrap();
        assert_eq!(world.joint_breakpoint(handle).unwrap(), 10.0);
    }

    #[test]
    fn test_step_advances_time() {
        let mut world = World::default();
        world.step(0.25).unwrap();
        world.step(0.25).unwrap();
        assert_eq!(world.time(), 0.5);
        assert_eq!(world.step_count(), 2);
    }

    #[test]
    fn test_joint_reaction_uses_last_step() {
        let (mut world, ground, body) = world_with_pair();
        let handle = world
            .add_joint(WeldJoint::new(ground, body, Vec2::ZERO, Vec2::new(0.0, 1.0)))
            .unwrap();
        world.set_gravity(Vec2::new(0.0, -10.0));

        for _ in 0..30 {
            world.step(1.0 / 60.0).unwrap();
        }

        // Holding a unit mass against gravity
        let force = world.joint_reaction_force(handle).unwrap();
        assert!((force.y - 10.0).abs() < 1e-6);
        assert!(force.x.abs() < 1e-6);

        let weld = world.joint_as::<WeldJoint>(handle).unwrap();
        let inv_dt = 1.0 / (1.0 / 60.0);
        assert_eq!(force, inv_dt * weld.impulse().xy());
    }
}
