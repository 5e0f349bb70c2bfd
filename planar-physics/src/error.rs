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
//! Error types
//!
//! Only invalid object-graph references and invalid configuration are errors.
//! Ordinary physical states (a stretched joint, a singular mass matrix for one
//! iteration, position correction that has not converged yet) are never
//! reported through this type.

use thiserror::Error;

/// Errors reported at the boundary of the simulation core
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PhysicsError {
    /// Step duration was non-positive, NaN or infinite
    #[error("Invalid timestep: {0}. Must be positive and finite")]
    InvalidTimeStep(f64),

    /// A solver setting is out of range
    #[error("Invalid settings: {0}")]
    InvalidSettings(String),

    /// A body definition has out-of-range or non-finite values
    #[error("Invalid body definition: {0}")]
    InvalidBodyDef(String),

    /// A body handle does not refer to a body owned by this world
    #[error("Body {0} is not owned by this world")]
    StaleBody(String),

    /// A joint handle does not refer to a joint owned by this world
    #[error("Joint {0} is not owned by this world")]
    StaleJoint(String),

    /// A constraint connects a body to itself
    #[error("Constraint connects body {0} to itself")]
    SameBody(String),

    /// Both constrained bodies are immovable, so the constraint can never act
    #[error("Constraint between {0} and {1} has zero combined inverse mass")]
    DegenerateMass(String, String),

    /// A controller lifecycle hook failed
    #[error("Controller '{name}' failed: {message}")]
    Controller {
        /// Controller name
        name: String,
        /// Failure description
        message: String,
    },

    /// A controller with the same name is already registered
    #[error("Controller '{0}' is already registered")]
    DuplicateController(String),

    /// A controller was built against an incompatible controller API
    #[error("Controller '{name}' API version {found} is incompatible with engine API version {expected}")]
    ControllerVersion {
        /// Controller name
        name: String,
        /// Version declared by the controller
        found: String,
        /// Version of this engine
        expected: String,
    },

    /// A controller depends on one that is not registered
    #[error("Controller '{name}' depends on '{dependency}' which is not registered")]
    ControllerDependency {
        /// Controller name
        name: String,
        /// Missing dependency
        dependency: String,
    },

    /// Controller dependencies form a cycle
    #[error("Circular dependency detected in controller dependencies")]
    CircularDependency,
}

/// Result alias using [`PhysicsError`]
pub type Result<T> = std::result::Result<T, PhysicsError>;
