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
//! Rigid bodies
//!
//! A [`Body`] holds the kinematic and mass state of one rigid body. Forces and
//! torques accumulate between steps and are consumed by
//! [`Body::integrate_velocity`]. Position integration and constraint position
//! correction move the body's [`Sweep`]; the cached world transform is only
//! refreshed by an explicit [`Body::synchronize_transform`].

use crate::dynamics::Settings;
use crate::error::{PhysicsError, Result};
use crate::math::{cross_sv, Rot, Transform, Vec2};

/// How a body takes part in the simulation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BodyType {
    /// Never moves; infinite mass
    #[default]
    Static,
    /// Moves with a user-set velocity; infinite mass, ignores forces
    Kinematic,
    /// Fully simulated; finite positive mass
    Dynamic,
}

/// Construction parameters for a [`Body`]
///
/// # Examples
///
/// ```
/// use planar_physics::{BodyDef, BodyType, Body};
/// use planar_physics::math::Vec2;
///
/// let def = BodyDef::dynamic()
///     .with_position(Vec2::new(0.0, 4.0))
///     .with_mass(2.0, 0.5);
/// let body = Body::new(&def).unwrap();
/// assert_eq!(body.body_type(), BodyType::Dynamic);
/// assert_eq!(body.inv_mass(), 0.5);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct BodyDef {
    /// Body type
    pub body_type: BodyType,
    /// World position of the body origin
    pub position: Vec2,
    /// World angle in radians
    pub angle: f64,
    /// Initial linear velocity of the center of mass
    pub linear_velocity: Vec2,
    /// Initial angular velocity
    pub angular_velocity: f64,
    /// Linear velocity damping coefficient (1/s)
    pub linear_damping: f64,
    /// Angular velocity damping coefficient (1/s)
    pub angular_damping: f64,
    /// Multiplier applied to world gravity
    pub gravity_scale: f64,
    /// Mass; required to be positive for dynamic bodies, ignored otherwise
    pub mass: f64,
    /// Rotational inertia about the center of mass
    pub inertia: f64,
    /// Center of mass in body-local coordinates
    pub local_center: Vec2,
    /// Prevent rotation regardless of inertia
    pub fixed_rotation: bool,
}

impl Default for BodyDef {
    fn default() -> Self {
        BodyDef {
            body_type: BodyType::Static,
            position: Vec2::ZERO,
            angle: 0.0,
            linear_velocity: Vec2::ZERO,
            angular_velocity: 0.0,
            linear_damping: 0.0,
            angular_damping: 0.0,
            gravity_scale: 1.0,
            mass: 0.0,
            inertia: 0.0,
            local_center: Vec2::ZERO,
            fixed_rotation: false,
        }
    }
}

impl BodyDef {
    /// Definition for a static body
    pub fn fixed() -> Self {
        BodyDef::default()
    }

    /// Definition for a kinematic body
    pub fn kinematic() -> Self {
        BodyDef {
            body_type: BodyType::Kinematic,
            ..BodyDef::default()
        }
    }

    /// Definition for a dynamic body with unit mass and unit inertia
    pub fn dynamic() -> Self {
        BodyDef {
            body_type: BodyType::Dynamic,
            mass: 1.0,
            inertia: 1.0,
            ..BodyDef::default()
        }
    }

    /// Set the world position
    pub fn with_position(mut self, position: Vec2) -> Self {
        self.position = position;
        self
    }

    /// Set the world angle
    pub fn with_angle(mut self, angle: f64) -> Self {
        self.angle = angle;
        self
    }

    /// Set the mass and rotational inertia about the center of mass
    pub fn with_mass(mut self, mass: f64, inertia: f64) -> Self {
        self.mass = mass;
        self.inertia = inertia;
        self
    }

    /// Set the local center of mass
    pub fn with_local_center(mut self, local_center: Vec2) -> Self {
        self.local_center = local_center;
        self
    }

    /// Set the initial velocities
    pub fn with_velocity(mut self, linear: Vec2, angular: f64) -> Self {
        self.linear_velocity = linear;
        self.angular_velocity = angular;
        self
    }

    /// Set the damping coefficients
    pub fn with_damping(mut self, linear: f64, angular: f64) -> Self {
        self.linear_damping = linear;
        self.angular_damping = angular;
        self
    }

    /// Set the gravity multiplier
    pub fn with_gravity_scale(mut self, scale: f64) -> Self {
        self.gravity_scale = scale;
        self
    }

    /// Lock rotation
    pub fn with_fixed_rotation(mut self, fixed: bool) -> Self {
        self.fixed_rotation = fixed;
        self
    }

    /// Check every field, returning a description of the first bad one
    pub fn validate(&self) -> Result<()> {
        let finite = self.position.is_valid()
            && self.angle.is_finite()
            && self.linear_velocity.is_valid()
            && self.angular_velocity.is_finite()
            && self.gravity_scale.is_finite()
            && self.local_center.is_valid();
        if !finite {
            return Err(PhysicsError::InvalidBodyDef(
                "position, angle, velocities, gravity scale and center must be finite".to_string(),
            ));
        }
        if !(self.linear_damping >= 0.0 && self.linear_damping.is_finite())
            || !(self.angular_damping >= 0.0 && self.angular_damping.is_finite())
        {
            return Err(PhysicsError::InvalidBodyDef(
                "damping must be non-negative and finite".to_string(),
            ));
        }
        if self.body_type == BodyType::Dynamic {
            if !(self.mass > 0.0 && self.mass.is_finite()) {
                return Err(PhysicsError::InvalidBodyDef(format!(
                    "dynamic body requires positive finite mass, got {}",
                    self.mass
                )));
            }
            if !(self.inertia >= 0.0 && self.inertia.is_finite()) {
                return Err(PhysicsError::InvalidBodyDef(format!(
                    "inertia must be non-negative and finite, got {}",
                    self.inertia
                )));
            }
        }
        Ok(())
    }
}

/// Motion of a body's center of mass over one step
///
/// `c0`/`a0` hold the pose at the start of the step and `c`/`a` the current
/// pose. Position correction edits `c`/`a` directly.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Sweep {
    /// Center of mass in body-local coordinates
    pub local_center: Vec2,
    /// World center of mass at the start of the step
    pub c0: Vec2,
    /// Current world center of mass
    pub c: Vec2,
    /// Angle at the start of the step
    pub a0: f64,
    /// Current angle
    pub a: f64,
}

/// A rigid body
///
/// Bodies are created through [`World::create_body`](crate::World::create_body)
/// or directly with [`Body::new`] when driving constraints by hand.
#[derive(Debug, Clone, PartialEq)]
pub struct Body {
    pub(crate) body_type: BodyType,
    pub(crate) xf: Transform,
    pub(crate) sweep: Sweep,
    pub(crate) linear_velocity: Vec2,
    pub(crate) angular_velocity: f64,
    pub(crate) force: Vec2,
    pub(crate) torque: f64,
    pub(crate) mass: f64,
    pub(crate) inv_mass: f64,
    pub(crate) inertia: f64,
    pub(crate) inv_inertia: f64,
    pub(crate) linear_damping: f64,
    pub(crate) angular_damping: f64,
    pub(crate) gravity_scale: f64,
    pub(crate) fixed_rotation: bool,
}

impl Body {
    /// Create a body from a validated definition
    ///
    /// # Errors
    ///
    /// Returns [`PhysicsError::InvalidBodyDef`] if the definition fails
    /// [`BodyDef::validate`].
    pub fn new(def: &BodyDef) -> Result<Self> {
        def.validate()?;

        let xf = Transform::new(def.position, def.angle);
        let center = xf.apply(def.local_center);
        let moving = def.body_type != BodyType::Static;

        let mut body = Body {
            body_type: def.body_type,
            xf,
            sweep: Sweep {
                local_center: def.local_center,
                c0: center,
                c: center,
                a0: def.angle,
                a: def.angle,
            },
            linear_velocity: if moving { def.linear_velocity } else { Vec2::ZERO },
            angular_velocity: if moving { def.angular_velocity } else { 0.0 },
            force: Vec2::ZERO,
            torque: 0.0,
            mass: 0.0,
            inv_mass: 0.0,
            inertia: 0.0,
            inv_inertia: 0.0,
            linear_damping: def.linear_damping,
            angular_damping: def.angular_damping,
            gravity_scale: def.gravity_scale,
            fixed_rotation: def.fixed_rotation,
        };
        if def.body_type == BodyType::Dynamic {
            body.assign_mass(def.mass, def.inertia);
        }
        Ok(body)
    }

    fn assign_mass(&mut self, mass: f64, inertia: f64) {
        self.mass = mass;
        self.inv_mass = 1.0 / mass;
        if inertia > 0.0 && !self.fixed_rotation {
            self.inertia = inertia;
            self.inv_inertia = 1.0 / inertia;
        } else {
            self.inertia = 0.0;
            self.inv_inertia = 0.0;
        }
    }

    /// Replace the mass properties of a dynamic body
    ///
    /// The center of mass may move; the velocity of the new center is updated
    /// so the body's motion is unchanged. Ignored for non-dynamic bodies.
    ///
    /// # Errors
    ///
    /// Returns [`PhysicsError::InvalidBodyDef`] for non-positive mass or
    /// negative inertia.
    pub fn set_mass_data(&mut self, mass: f64, inertia: f64, local_center: Vec2) -> Result<()> {
        if self.body_type != BodyType::Dynamic {
            return Ok(());
        }
        if !(mass > 0.0 && mass.is_finite()) || !(inertia >= 0.0 && inertia.is_finite()) {
            return Err(PhysicsError::InvalidBodyDef(format!(
                "mass {} / inertia {} out of range",
                mass, inertia
            )));
        }
        if !local_center.is_valid() {
            return Err(PhysicsError::InvalidBodyDef(
                "local center must be finite".to_string(),
            ));
        }
        self.assign_mass(mass, inertia);

        let old_center = self.sweep.c;
        self.sweep.local_center = local_center;
        self.sweep.c = self.xf.apply(local_center);
        self.sweep.c0 = self.sweep.c;
        self.linear_velocity += cross_sv(self.angular_velocity, self.sweep.c - old_center);
        Ok(())
    }

    /// Body type
    pub fn body_type(&self) -> BodyType {
        self.body_type
    }

    /// Whether forces and constraints can move this body
    pub fn is_dynamic(&self) -> bool {
        self.body_type == BodyType::Dynamic
    }

    /// Whether this body is static
    pub fn is_static(&self) -> bool {
        self.body_type == BodyType::Static
    }

    /// Cached world transform of the body origin
    pub fn transform(&self) -> &Transform {
        &self.xf
    }

    /// World position of the body origin
    pub fn position(&self) -> Vec2 {
        self.xf.p
    }

    /// Current angle in radians
    pub fn angle(&self) -> f64 {
        self.sweep.a
    }

    /// World center of mass
    pub fn world_center(&self) -> Vec2 {
        self.sweep.c
    }

    /// Local center of mass
    pub fn local_center(&self) -> Vec2 {
        self.sweep.local_center
    }

    /// Motion sweep
    pub fn sweep(&self) -> &Sweep {
        &self.sweep
    }

    /// Mutable motion sweep for position correction
    ///
    /// Call [`Body::synchronize_transform`] after editing it.
    pub fn sweep_mut(&mut self) -> &mut Sweep {
        &mut self.sweep
    }

    /// Linear velocity of the center of mass
    pub fn linear_velocity(&self) -> Vec2 {
        self.linear_velocity
    }

    /// Set the linear velocity; ignored for static bodies
    pub fn set_linear_velocity(&mut self, v: Vec2) {
        if self.body_type != BodyType::Static {
            self.linear_velocity = v;
        }
    }

    /// Angular velocity in radians per second
    pub fn angular_velocity(&self) -> f64 {
        self.angular_velocity
    }

    /// Set the angular velocity; ignored for static bodies
    pub fn set_angular_velocity(&mut self, w: f64) {
        if self.body_type != BodyType::Static {
            self.angular_velocity = w;
        }
    }

    /// Mass (zero for non-dynamic bodies)
    pub fn mass(&self) -> f64 {
        self.mass
    }

    /// Inverse mass (zero for non-dynamic bodies)
    pub fn inv_mass(&self) -> f64 {
        self.inv_mass
    }

    /// Rotational inertia about the center of mass
    pub fn inertia(&self) -> f64 {
        self.inertia
    }

    /// Inverse rotational inertia
    pub fn inv_inertia(&self) -> f64 {
        self.inv_inertia
    }

    /// Force accumulated since the last velocity integration
    pub fn force(&self) -> Vec2 {
        self.force
    }

    /// Torque accumulated since the last velocity integration
    pub fn torque(&self) -> f64 {
        self.torque
    }

    /// Gravity multiplier
    pub fn gravity_scale(&self) -> f64 {
        self.gravity_scale
    }

    /// Set the damping coefficients
    pub fn set_damping(&mut self, linear: f64, angular: f64) {
        self.linear_damping = linear.max(0.0);
        self.angular_damping = angular.max(0.0);
    }

    /// Teleport the body origin; resets the sweep and transform
    pub fn set_transform(&mut self, position: Vec2, angle: f64) {
        self.xf = Transform::new(position, angle);
        self.sweep.c = self.xf.apply(self.sweep.local_center);
        self.sweep.c0 = self.sweep.c;
        self.sweep.a = angle;
        self.sweep.a0 = angle;
    }

    /// Map a body-local point to world space
    pub fn world_point(&self, local: Vec2) -> Vec2 {
        self.xf.apply(local)
    }

    /// Map a world point to body-local space
    pub fn local_point(&self, world: Vec2) -> Vec2 {
        self.xf.apply_inv(world)
    }

    /// Rotate a body-local vector into world space
    pub fn world_vector(&self, local: Vec2) -> Vec2 {
        self.xf.q.apply(local)
    }

    /// Rotate a world vector into body-local space
    pub fn local_vector(&self, world: Vec2) -> Vec2 {
        self.xf.q.apply_inv(world)
    }

    /// Velocity of the material point currently at `world_point`
    pub fn linear_velocity_from_world_point(&self, world_point: Vec2) -> Vec2 {
        self.linear_velocity + cross_sv(self.angular_velocity, world_point - self.sweep.c)
    }

    /// Kinetic energy, translational plus rotational
    pub fn kinetic_energy(&self) -> f64 {
        0.5 * self.mass * self.linear_velocity.length_squared()
            + 0.5 * self.inertia * self.angular_velocity * self.angular_velocity
    }

    /// Accumulate a force at the center of mass
    pub fn apply_force(&mut self, force: Vec2) {
        if self.is_dynamic() {
            self.force += force;
        }
    }

    /// Accumulate a force at a world point, producing a torque about the center
    pub fn apply_force_at_point(&mut self, force: Vec2, point: Vec2) {
        if self.is_dynamic() {
            self.force += force;
            self.torque += (point - self.sweep.c).cross(force);
        }
    }

    /// Accumulate a torque
    pub fn apply_torque(&mut self, torque: f64) {
        if self.is_dynamic() {
            self.torque += torque;
        }
    }

    /// Change the linear velocity immediately
    pub fn apply_linear_impulse(&mut self, impulse: Vec2) {
        if self.is_dynamic() {
            self.linear_velocity += self.inv_mass * impulse;
        }
    }

    /// Apply an impulse at a world point, changing both velocities immediately
    pub fn apply_linear_impulse_at_point(&mut self, impulse: Vec2, point: Vec2) {
        if self.is_dynamic() {
            self.linear_velocity += self.inv_mass * impulse;
            self.angular_velocity += self.inv_inertia * (point - self.sweep.c).cross(impulse);
        }
    }

    /// Change the angular velocity immediately
    pub fn apply_angular_impulse(&mut self, impulse: f64) {
        if self.is_dynamic() {
            self.angular_velocity += self.inv_inertia * impulse;
        }
    }

    /// Drop any accumulated force and torque
    pub fn clear_forces(&mut self) {
        self.force = Vec2::ZERO;
        self.torque = 0.0;
    }

    /// Integrate gravity and accumulated forces into the velocities
    ///
    /// `v += dt * (gravity_scale * gravity + inv_mass * force)`,
    /// `w += dt * inv_inertia * torque`, then damping. The force and torque
    /// accumulators are cleared afterwards, for every body type.
    pub fn integrate_velocity(&mut self, dt: f64, gravity: Vec2) {
        if self.is_dynamic() {
            self.linear_velocity += dt * (self.gravity_scale * gravity + self.inv_mass * self.force);
            self.angular_velocity += dt * self.inv_inertia * self.torque;

            self.linear_velocity *= (1.0 - dt * self.linear_damping).clamp(0.0, 1.0);
            self.angular_velocity *= (1.0 - dt * self.angular_damping).clamp(0.0, 1.0);
        }
        self.clear_forces();
    }

    /// Advance the sweep from the current velocities
    ///
    /// Velocities that would move the body further than
    /// `settings.max_translation` or turn it more than `settings.max_rotation`
    /// in one step are scaled down. The transform is left stale.
    pub fn integrate_position(&mut self, dt: f64, settings: &Settings) {
        if self.is_static() {
            return;
        }
        self.sweep.c0 = self.sweep.c;
        self.sweep.a0 = self.sweep.a;

        let translation = dt * self.linear_velocity;
        let distance_sq = translation.length_squared();
        if distance_sq > settings.max_translation * settings.max_translation {
            self.linear_velocity *= settings.max_translation / distance_sq.sqrt();
        }

        let rotation = dt * self.angular_velocity;
        if rotation * rotation > settings.max_rotation * settings.max_rotation {
            self.angular_velocity *= settings.max_rotation / rotation.abs();
        }

        self.sweep.c += dt * self.linear_velocity;
        self.sweep.a += dt * self.angular_velocity;
    }

    /// Recompute the cached transform from the sweep
    pub fn synchronize_transform(&mut self) {
        self.xf.q = Rot::new(self.sweep.a);
        self.xf.p = self.sweep.c - self.xf.q.apply(self.sweep.local_center);
    }

    /// Check that the kinematic state is finite
    pub fn is_valid(&self) -> bool {
        self.sweep.c.is_valid()
            && self.sweep.a.is_finite()
            && self.linear_velocity.is_valid()
            && self.angular_velocity.is_finite()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dynamic_at(position: Vec2) -> Body {
        Body::new(&BodyDef::dynamic().with_position(position)).unwrap()
    }

    #[test]
    fn test_static_body_has_zero_inverse_mass() {
        let body = Body::new(&BodyDef::fixed().with_mass(10.0, 3.0)).unwrap();
        assert_eq!(body.inv_mass(), 0.0);
        assert_eq!(body.inv_inertia(), 0.0);
        assert_eq!(body.mass(), 0.0);
    }

    #[test]
    fn test_dynamic_body_requires_mass() {
        let def = BodyDef::dynamic().with_mass(0.0, 1.0);
        assert!(matches!(Body::new(&def), Err(PhysicsError::InvalidBodyDef(_))));

        let def = BodyDef::dynamic().with_position(Vec2::new(f64::NAN, 0.0));
        assert!(Body::new(&def).is_err());
    }

    #[test]
    fn test_fixed_rotation_zeroes_inverse_inertia() {
        let body = Body::new(&BodyDef::dynamic().with_fixed_rotation(true)).unwrap();
        assert_eq!(body.inv_inertia(), 0.0);
        assert_eq!(body.inv_mass(), 1.0);
    }

    #[test]
    fn test_forces_are_noops_on_immovable_bodies() {
        let mut body = Body::new(&BodyDef::kinematic()).unwrap();
        body.apply_force(Vec2::new(1.0, 0.0));
        body.apply_torque(2.0);
        body.apply_linear_impulse(Vec2::new(5.0, 5.0));
        body.apply_angular_impulse(3.0);
        assert_eq!(body.force(), Vec2::ZERO);
        assert_eq!(body.torque(), 0.0);
        assert_eq!(body.linear_velocity(), Vec2::ZERO);
        assert_eq!(body.angular_velocity(), 0.0);
    }

    #[test]
    fn test_force_at_point_produces_torque() {
        let mut body = dynamic_at(Vec2::ZERO);
        body.apply_force_at_point(Vec2::new(0.0, 2.0), Vec2::new(1.0, 0.0));
        assert_eq!(body.force(), Vec2::new(0.0, 2.0));
        assert_eq!(body.torque(), 2.0);
    }

    #[test]
    fn test_integrate_velocity_clears_accumulators() {
        let mut body = dynamic_at(Vec2::ZERO);
        body.apply_force(Vec2::new(2.0, 0.0));
        body.apply_torque(1.0);
        body.integrate_velocity(0.5, Vec2::new(0.0, -10.0));

        assert_eq!(body.linear_velocity(), Vec2::new(1.0, -5.0));
        assert_eq!(body.angular_velocity(), 0.5);
        assert_eq!(body.force(), Vec2::ZERO);
        assert_eq!(body.torque(), 0.0);
    }

    #[test]
    fn test_damping_reduces_velocity() {
        let mut body = Body::new(
            &BodyDef::dynamic()
                .with_velocity(Vec2::new(10.0, 0.0), 4.0)
                .with_damping(1.0, 2.0),
        )
        .unwrap();
        body.integrate_velocity(0.1, Vec2::ZERO);
        assert!((body.linear_velocity().x - 9.0).abs() < 1e-12);
        assert!((body.angular_velocity() - 3.2).abs() < 1e-12);
    }

    #[test]
    fn test_integrate_position_leaves_transform_stale() {
        let mut body = dynamic_at(Vec2::ZERO);
        body.set_linear_velocity(Vec2::new(1.0, 0.0));
        body.set_angular_velocity(1.0);
        body.integrate_position(0.5, &Settings::default());

        assert_eq!(body.world_center(), Vec2::new(0.5, 0.0));
        assert_eq!(body.angle(), 0.5);
        assert_eq!(body.sweep().c0, Vec2::ZERO);
        assert_eq!(body.position(), Vec2::ZERO);

        body.synchronize_transform();
        assert_eq!(body.position(), Vec2::new(0.5, 0.0));
        assert!((body.transform().q.angle() - 0.5).abs() < 1e-15);
    }

    #[test]
    fn test_translation_is_clamped() {
        let mut body = dynamic_at(Vec2::ZERO);
        body.set_linear_velocity(Vec2::new(600.0, 0.0));
        body.integrate_position(1.0 / 60.0, &Settings::default());
        assert!((body.world_center().x - 2.0).abs() < 1e-12);
        assert!((body.linear_velocity().x - 120.0).abs() < 1e-9);
    }

    #[test]
    fn test_offset_center_transform() {
        let mut body = Body::new(
            &BodyDef::dynamic()
                .with_position(Vec2::new(1.0, 1.0))
                .with_local_center(Vec2::new(1.0, 0.0)),
        )
        .unwrap();
        assert_eq!(body.world_center(), Vec2::new(2.0, 1.0));

        body.sweep_mut().a = std::f64::consts::PI;
        body.synchronize_transform();
        // Rotating about the center swings the origin to the other side
        assert!((body.position() - Vec2::new(3.0, 1.0)).length() < 1e-12);
    }

    #[test]
    fn test_set_mass_data_preserves_motion() {
        let mut body = dynamic_at(Vec2::ZERO);
        body.set_angular_velocity(2.0);
        body.set_mass_data(3.0, 0.5, Vec2::new(1.0, 0.0)).unwrap();
        assert_eq!(body.mass(), 3.0);
        assert_eq!(body.world_center(), Vec2::new(1.0, 0.0));
        // The new center sits on the rotating frame, so it picks up w x r
        assert_eq!(body.linear_velocity(), Vec2::new(0.0, 2.0));
        assert!(body.set_mass_data(-1.0, 0.5, Vec2::ZERO).is_err());
    }
}
