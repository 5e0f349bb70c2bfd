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
//! Force controllers
//!
//! Controllers apply forces that do not come from constraints. They are
//! registered with a [`World`](crate::World), run in dependency order at the
//! start of every step, and follow a versioned API so that third-party
//! controllers can be checked for compatibility.
//!
//! # Built-in Controllers
//!
//! - [`BuoyancyController`]: buoyancy and drag from a [`FluidContainer`]
//! - [`GravityController`]: attraction towards points and bodies
//!
//! # Example
//!
//! ```rust
//! use planar_physics::controllers::{AabbFluidContainer, BuoyancyController, FluidProbe};
//! use planar_physics::{BodyDef, Vec2, World};
//!
//! let mut world = World::new(Vec2::new(0.0, -9.8));
//! let raft = world.create_body(&BodyDef::dynamic()).unwrap();
//!
//! let water = AabbFluidContainer::pool(-10.0, 10.0, 0.0, 5.0);
//! let mut buoyancy = BuoyancyController::new(water, 2.0).unwrap();
//! buoyancy.add_body(raft, FluidProbe::rectangle(0.5, 0.25, 8));
//! world.add_controller(Box::new(buoyancy)).unwrap();
//!
//! world.step(1.0 / 60.0).unwrap();
//! ```

pub mod api;
pub mod buoyancy;
pub mod fluid;
pub mod gravity;
pub mod registry;

pub use api::{Controller, ControllerContext, CONTROLLER_API_VERSION};
pub use buoyancy::{BuoyancyController, FluidProbe, Submersion};
pub use fluid::{AabbFluidContainer, FluidContainer};
pub use gravity::{GravityController, GravityFalloff};
pub use registry::ControllerRegistry;
