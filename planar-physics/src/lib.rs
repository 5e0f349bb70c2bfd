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
//! # Planar Physics
//!
//! A 2D rigid-body physics engine built around a sequential-impulse
//! constraint solver with warm starting and non-linear Gauss-Seidel position
//! correction.
//!
//! ## Features
//!
//! - **Rigid Bodies**: Static, kinematic and dynamic bodies with mass,
//!   inertia and an offset center of mass
//! - **Constraint Solver**: Open [`Constraint`](joints::Constraint) protocol
//!   shared by joints and externally generated contacts, with the
//!   [`WeldJoint`] as the built-in variant
//! - **Islands**: Independent groups of bodies, optionally solved in parallel
//!   with Rayon
//! - **Controllers**: Versioned extension point for buoyancy, attractor
//!   gravity and custom forces
//! - **Pooling**: Reused scratch buffers for per-step island data
//!
//! ## Example
//!
//! ```rust
//! use planar_physics::{BodyDef, Vec2, WeldJoint, World};
//!
//! let mut world = World::new(Vec2::new(0.0, -9.8));
//! let ground = world.create_body(&BodyDef::fixed()).unwrap();
//! let crate_body = world
//!     .create_body(&BodyDef::dynamic().with_position(Vec2::new(0.0, -1.0)))
//!     .unwrap();
//!
//! let weld = WeldJoint::from_world_anchor(&world, ground, crate_body, Vec2::ZERO).unwrap();
//! world.add_joint(weld).unwrap();
//!
//! for _ in 0..60 {
//!     world.step(1.0 / 60.0).unwrap();
//! }
//! let position = world.body(crate_body).unwrap().position();
//! assert!((position - Vec2::new(0.0, -1.0)).length() < 0.01);
//! ```

#![warn(missing_docs)]

/// Vector, rotation and small-matrix math
pub mod math;

/// Bodies, settings, islands and the world
pub mod dynamics;

/// Constraint protocol and joint variants
pub mod joints;

/// Force controllers and the fluid query interface
pub mod controllers;

/// Memory pooling for reducing allocation churn
pub mod pool;

/// Error types
pub mod error;

pub use dynamics::{
    Body, BodyDef, BodyHandle, BodyType, JointHandle, Settings, StepReport, Sweep, TimeStep, World,
};
pub use error::{PhysicsError, Result};
pub use joints::{BodyPair, Constraint, Joint, JointType, WeldJoint};
pub use math::{Aabb, Vec2, Vec3};
