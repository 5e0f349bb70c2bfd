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
//! Math kernel for planar rigid-body dynamics
//!
//! Pure value types with no state:
//! - [`Vec2`] / [`Vec3`] vectors and the scalar/vector cross helpers
//! - [`Rot`] and [`Transform`] for body poses
//! - [`Mat33`] with the symmetric solves used by three-DOF constraints
//! - [`Aabb`] for region queries

mod aabb;
mod matrix;
mod rotation;
mod vec;

pub use aabb::Aabb;
pub use matrix::Mat33;
pub use rotation::{Rot, Transform};
pub use vec::{cross_sv, cross_vs, Vec2, Vec3};
