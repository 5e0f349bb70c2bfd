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
//! Constraint protocol and joint variants
//!
//! Every constraint the solver handles, joints and externally generated
//! contacts alike, implements [`Constraint`]: three operations the island
//! solver calls once, `N` times and up to `M` times per step. Joints add the
//! reaction queries on top through [`Joint`].
//!
//! Only the weld joint ships with this crate. Other variants follow the same
//! protocol and can be added downstream by implementing these traits.

use std::any::Any;

use crate::dynamics::{Body, BodyHandle, Settings, TimeStep};
use crate::math::Vec2;

mod weld;

pub use weld::WeldJoint;

/// Variant tag of a joint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JointType {
    /// Rigidly locks relative position and rotation
    Weld,
    /// A variant defined outside this crate
    Custom,
}

/// Mutable access to the two bodies a constraint connects
///
/// The solver hands out one pair per constraint call. `a` and `b` are always
/// distinct bodies.
pub struct BodyPair<'a> {
    /// Body A of the constraint
    pub a: &'a mut Body,
    /// Body B of the constraint
    pub b: &'a mut Body,
}

impl<'a> BodyPair<'a> {
    /// Pair two distinct bodies
    pub fn new(a: &'a mut Body, b: &'a mut Body) -> Self {
        BodyPair { a, b }
    }

    /// Borrow two distinct elements of a body slice
    ///
    /// Returns `None` if the indices are equal or out of bounds.
    pub fn from_slice(bodies: &'a mut [Body], a: usize, b: usize) -> Option<Self> {
        if a == b || a >= bodies.len() || b >= bodies.len() {
            return None;
        }
        if a < b {
            let (head, tail) = bodies.split_at_mut(b);
            Some(BodyPair::new(&mut head[a], &mut tail[0]))
        } else {
            let (head, tail) = bodies.split_at_mut(a);
            Some(BodyPair::new(&mut tail[0], &mut head[b]))
        }
    }

    /// Whether neither body can be moved by an impulse
    pub fn is_immovable(&self) -> bool {
        immovable(self.a, self.b)
    }
}

/// Whether the combined inverse mass and inertia of two bodies is zero
pub(crate) fn immovable(a: &Body, b: &Body) -> bool {
    a.inv_mass() + b.inv_mass() == 0.0 && a.inv_inertia() + b.inv_inertia() == 0.0
}

/// The solver-facing protocol shared by joints and contacts
///
/// Within one step the island solver calls
/// [`init_velocity_constraints`](Constraint::init_velocity_constraints) once,
/// [`solve_velocity_constraints`](Constraint::solve_velocity_constraints)
/// `velocity_iterations` times, and
/// [`solve_position_constraints`](Constraint::solve_position_constraints) up
/// to `position_iterations` times, stopping early once every constraint of
/// the island reports convergence.
pub trait Constraint: Send {
    /// Handle of body A
    fn body_a(&self) -> BodyHandle;

    /// Handle of body B
    fn body_b(&self) -> BodyHandle;

    /// Prepare the velocity solve: cache lever arms and effective mass, and
    /// warm start from the impulse carried over from the last step
    fn init_velocity_constraints(&mut self, bodies: BodyPair<'_>, step: &TimeStep);

    /// One sequential-impulse pass over the velocity constraint
    fn solve_velocity_constraints(&mut self, bodies: BodyPair<'_>, step: &TimeStep);

    /// One non-linear Gauss-Seidel pass over the position constraint
    ///
    /// Returns `true` when the error measured before this pass is within the
    /// slop tolerances of `settings`.
    fn solve_position_constraints(&mut self, bodies: BodyPair<'_>, settings: &Settings) -> bool;
}

/// A persistent constraint owned by the world
pub trait Joint: Constraint {
    /// Variant tag
    fn joint_type(&self) -> JointType;

    /// World-space anchor on body A
    fn anchor_a(&self, body_a: &Body) -> Vec2;

    /// World-space anchor on body B
    fn anchor_b(&self, body_b: &Body) -> Vec2;

    /// Force the joint applied on body B during the last step
    fn reaction_force(&self, inv_dt: f64) -> Vec2;

    /// Torque the joint applied on body B during the last step
    fn reaction_torque(&self, inv_dt: f64) -> f64;

    /// View as the solver protocol
    fn as_constraint_mut(&mut self) -> &mut dyn Constraint;

    /// Downcasting support
    fn as_any(&self) -> &dyn Any;

    /// Downcasting support
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dynamics::BodyDef;

    #[test]
    fn test_body_pair_from_slice() {
        let mut bodies = vec![
            Body::new(&BodyDef::dynamic().with_position(Vec2::new(0.0, 0.0))).unwrap(),
            Body::new(&BodyDef::dynamic().with_position(Vec2::new(1.0, 0.0))).unwrap(),
            Body::new(&BodyDef::dynamic().with_position(Vec2::new(2.0, 0.0))).unwrap(),
        ];

        let pair = BodyPair::from_slice(&mut bodies, 2, 0).unwrap();
        assert_eq!(pair.a.position().x, 2.0);
        assert_eq!(pair.b.position().x, 0.0);

        let pair = BodyPair::from_slice(&mut bodies, 0, 1).unwrap();
        assert_eq!(pair.a.position().x, 0.0);
        assert_eq!(pair.b.position().x, 1.0);

        assert!(BodyPair::from_slice(&mut bodies, 1, 1).is_none());
        assert!(BodyPair::from_slice(&mut bodies, 0, 3).is_none());
    }

    #[test]
    fn test_immovable_pair() {
        let mut ground = Body::new(&BodyDef::fixed()).unwrap();
        let mut platform = Body::new(&BodyDef::kinematic()).unwrap();
        let mut crate_body = Body::new(&BodyDef::dynamic()).unwrap();

        assert!(BodyPair::new(&mut ground, &mut platform).is_immovable());
        assert!(!BodyPair::new(&mut ground, &mut crate_body).is_immovable());
    }
}
