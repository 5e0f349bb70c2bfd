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
//! Rigid bodies, the step pipeline and the world that owns them
//!
//! [`World`] owns every [`Body`] and joint, groups them into islands of
//! mutually constrained bodies every step, and solves each island with
//! sequential impulses followed by non-linear Gauss-Seidel position
//! correction.

mod body;
mod handle;
mod island;
mod settings;
mod world;

pub use body::{Body, BodyDef, BodyType, Sweep};
pub use handle::{BodyHandle, JointHandle};
pub use settings::{Settings, TimeStep};
pub use world::{StepReport, World};

pub(crate) use handle::{Arena, RawHandle};
