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
//! Weld joint
//!
//! Glues two bodies together: the anchor points must coincide and the
//! relative angle must stay at the reference angle. Both are solved as one
//! 3-DOF block, `(Cdot1, Cdot2) = (v_B + w_B × r_B - v_A - w_A × r_A, w_B - w_A)`,
//! with the effective mass
//!
//! ```text
//!     [ mA+mB+rAy²iA+rBy²iB   -rAy·rAx·iA-rBy·rBx·iB   -rAy·iA-rBy·iB ]
//! K = [        sym             mA+mB+rAx²iA+rBx²iB      rAx·iA+rBx·iB ]
//!     [        sym                     sym                  iA+iB     ]
//! ```

use std::any::Any;

use crate::dynamics::{Body, BodyHandle, Settings, TimeStep, World};
use crate::error::Result;
use crate::joints::{BodyPair, Constraint, Joint, JointType};
use crate::math::{cross_sv, Mat33, Vec2, Vec3};

/// Rigidly connects two bodies at a shared anchor
#[derive(Debug, Clone, PartialEq)]
pub struct WeldJoint {
    body_a: BodyHandle,
    body_b: BodyHandle,
    local_anchor_a: Vec2,
    local_anchor_b: Vec2,
    reference_angle: f64,

    // Solver state
    impulse: Vec3,
    mass: Mat33,
    r_a: Vec2,
    r_b: Vec2,
}

impl WeldJoint {
    /// Create a weld from anchors given in each body's local frame
    ///
    /// The reference angle starts at zero; see
    /// [`with_reference_angle`](Self::with_reference_angle).
    pub fn new(
        body_a: BodyHandle,
        body_b: BodyHandle,
        local_anchor_a: Vec2,
        local_anchor_b: Vec2,
    ) -> Self {
        WeldJoint {
            body_a,
            body_b,
            local_anchor_a,
            local_anchor_b,
            reference_angle: 0.0,
            impulse: Vec3::ZERO,
            mass: Mat33::ZERO,
            r_a: Vec2::ZERO,
            r_b: Vec2::ZERO,
        }
    }

    /// Set the target value of `angle_b - angle_a`
    pub fn with_reference_angle(mut self, reference_angle: f64) -> Self {
        self.reference_angle = reference_angle;
        self
    }

    /// Weld two bodies at a world-space anchor, keeping their current poses
    ///
    /// # Errors
    ///
    /// Returns [`PhysicsError::StaleBody`](crate::PhysicsError::StaleBody) if
    /// either handle is not owned by `world`.
    pub fn from_world_anchor(
        world: &World,
        body_a: BodyHandle,
        body_b: BodyHandle,
        anchor: Vec2,
    ) -> Result<Self> {
        let a = world.body(body_a)?;
        let b = world.body(body_b)?;
        Ok(WeldJoint::new(body_a, body_b, a.local_point(anchor), b.local_point(anchor))
            .with_reference_angle(b.angle() - a.angle()))
    }

    /// Anchor on body A, relative to its origin
    pub fn local_anchor_a(&self) -> Vec2 {
        self.local_anchor_a
    }

    /// Anchor on body B, relative to its origin
    pub fn local_anchor_b(&self) -> Vec2 {
        self.local_anchor_b
    }

    /// Target value of `angle_b - angle_a`
    pub fn reference_angle(&self) -> f64 {
        self.reference_angle
    }

    /// Impulse accumulated over the last step, `(linear x, linear y, angular)`
    pub fn impulse(&self) -> Vec3 {
        self.impulse
    }

    /// Effective-mass matrix cached by the last velocity initialization
    pub fn effective_mass(&self) -> Mat33 {
        self.mass
    }

    fn lever_arms(&self, a: &Body, b: &Body) -> (Vec2, Vec2) {
        (
            a.transform().q.apply(self.local_anchor_a - a.local_center()),
            b.transform().q.apply(self.local_anchor_b - b.local_center()),
        )
    }
}

fn mass_matrix(a: &Body, b: &Body, r_a: Vec2, r_b: Vec2) -> Mat33 {
    let (m_a, m_b) = (a.inv_mass(), b.inv_mass());
    let (i_a, i_b) = (a.inv_inertia(), b.inv_inertia());

    Mat33::symmetric(
        m_a + m_b + r_a.y * r_a.y * i_a + r_b.y * r_b.y * i_b,
        -r_a.y * r_a.x * i_a - r_b.y * r_b.x * i_b,
        -r_a.y * i_a - r_b.y * i_b,
        m_a + m_b + r_a.x * r_a.x * i_a + r_b.x * r_b.x * i_b,
        r_a.x * i_a + r_b.x * i_b,
        i_a + i_b,
    )
}

/// Solve `K * x = rhs`, dropping to the linear block when neither body can
/// rotate
fn solve_block(k: &Mat33, rhs: Vec3) -> Option<Vec3> {
    k.try_solve33(rhs).or_else(|| {
        if k.ez.z == 0.0 {
            k.try_solve22(rhs.xy()).map(|p| Vec3::from_xy_z(p, 0.0))
        } else {
            None
        }
    })
}

fn apply_velocity_impulse(a: &mut Body, b: &mut Body, r_a: Vec2, r_b: Vec2, impulse: Vec3) {
    let p = impulse.xy();

    a.linear_velocity -= a.inv_mass * p;
    a.angular_velocity -= a.inv_inertia * (r_a.cross(p) + impulse.z);

    b.linear_velocity += b.inv_mass * p;
    b.angular_velocity += b.inv_inertia * (r_b.cross(p) + impulse.z);
}

impl Constraint for WeldJoint {
    fn body_a(&self) -> BodyHandle {
        self.body_a
    }

    fn body_b(&self) -> BodyHandle {
        self.body_b
    }

    fn init_velocity_constraints(&mut self, bodies: BodyPair<'_>, step: &TimeStep) {
        if bodies.is_immovable() {
            self.impulse = Vec3::ZERO;
            return;
        }
        let BodyPair { a, b } = bodies;

        let (r_a, r_b) = self.lever_arms(a, b);
        self.r_a = r_a;
        self.r_b = r_b;
        self.mass = mass_matrix(a, b, r_a, r_b);

        if step.warm_starting {
            self.impulse *= step.dt_ratio;
            apply_velocity_impulse(a, b, r_a, r_b, self.impulse);
        } else {
            self.impulse = Vec3::ZERO;
        }
    }

    fn solve_velocity_constraints(&mut self, bodies: BodyPair<'_>, _step: &TimeStep) {
        if bodies.is_immovable() {
            return;
        }
        let BodyPair { a, b } = bodies;
        let (r_a, r_b) = (self.r_a, self.r_b);

        let cdot1 = b.linear_velocity + cross_sv(b.angular_velocity, r_b)
            - a.linear_velocity
            - cross_sv(a.angular_velocity, r_a);
        let cdot2 = b.angular_velocity - a.angular_velocity;
        let cdot = Vec3::from_xy_z(cdot1, cdot2);

        match solve_block(&self.mass, -cdot) {
            Some(impulse) => {
                self.impulse += impulse;
                apply_velocity_impulse(a, b, r_a, r_b, impulse);
            }
            None => log::trace!(
                "weld {} -> {}: singular velocity mass matrix, skipping pass",
                self.body_a,
                self.body_b
            ),
        }
    }

    fn solve_position_constraints(&mut self, bodies: BodyPair<'_>, settings: &Settings) -> bool {
        if bodies.is_immovable() {
            return true;
        }
        let BodyPair { a, b } = bodies;

        let (r_a, r_b) = self.lever_arms(a, b);
        let c1 = b.sweep.c + r_b - a.sweep.c - r_a;
        let c2 = b.sweep.a - a.sweep.a - self.reference_angle;

        let position_error = c1.length();
        let angular_error = c2.abs();

        let k = mass_matrix(a, b, r_a, r_b);
        match solve_block(&k, -Vec3::from_xy_z(c1, c2)) {
            Some(impulse) => {
                let p = impulse.xy();

                a.sweep.c -= a.inv_mass * p;
                a.sweep.a -= a.inv_inertia * (r_a.cross(p) + impulse.z);
                b.sweep.c += b.inv_mass * p;
                b.sweep.a += b.inv_inertia * (r_b.cross(p) + impulse.z);

                if !a.is_static() {
                    a.synchronize_transform();
                }
                if !b.is_static() {
                    b.synchronize_transform();
                }
            }
            None => log::trace!(
                "weld {} -> {}: singular position mass matrix, skipping pass",
                self.body_a,
                self.body_b
            ),
        }

        position_error <= settings.linear_slop && angular_error <= settings.angular_slop
    }
}

impl Joint for WeldJoint {
    fn joint_type(&self) -> JointType {
        JointType::Weld
    }

    fn anchor_a(&self, body_a: &Body) -> Vec2 {
        body_a.world_point(self.local_anchor_a)
    }

    fn anchor_b(&self, body_b: &Body) -> Vec2 {
        body_b.world_point(self.local_anchor_b)
    }

    fn reaction_force(&self, inv_dt: f64) -> Vec2 {
        inv_dt * self.impulse.xy()
    }

    fn reaction_torque(&self, inv_dt: f64) -> f64 {
        inv_dt * self.impulse.z
    }

    fn as_constraint_mut(&mut self) -> &mut dyn Constraint {
        self
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
