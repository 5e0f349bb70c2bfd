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
//! Solver configuration and per-step timing data

use crate::error::{PhysicsError, Result};
use std::f64::consts::PI;

/// Tunable solver parameters
///
/// Defaults follow long-standing values for metre-scaled scenes: objects
/// between 0.1 and 10 units in size, a linear slop of half a centimetre and
/// two degrees of angular slop.
///
/// # Examples
///
/// ```
/// use planar_physics::Settings;
///
/// let settings = Settings::default()
///     .with_velocity_iterations(10)
///     .with_warm_starting(false);
/// assert!(settings.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Velocity-solver passes per step
    pub velocity_iterations: usize,
    /// Maximum position-correction passes per step
    pub position_iterations: usize,
    /// Reuse last step's impulses as the initial guess
    pub warm_starting: bool,
    /// Linear error below which a constraint counts as satisfied
    pub linear_slop: f64,
    /// Angular error (radians) below which a constraint counts as satisfied
    pub angular_slop: f64,
    /// Largest distance a body may travel in one step
    pub max_translation: f64,
    /// Largest angle (radians) a body may turn in one step
    pub max_rotation: f64,
    /// Solve islands on the rayon pool when the `parallel` feature is enabled
    pub parallel_islands: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            velocity_iterations: 8,
            position_iterations: 3,
            warm_starting: true,
            linear_slop: 0.005,
            angular_slop: 2.0 / 180.0 * PI,
            max_translation: 2.0,
            max_rotation: 0.5 * PI,
            parallel_islands: true,
        }
    }
}

impl Settings {
    /// Set the number of velocity passes
    pub fn with_velocity_iterations(mut self, iterations: usize) -> Self {
        self.velocity_iterations = iterations;
        self
    }

    /// Set the maximum number of position passes
    pub fn with_position_iterations(mut self, iterations: usize) -> Self {
        self.position_iterations = iterations;
        self
    }

    /// Enable or disable warm starting
    pub fn with_warm_starting(mut self, enabled: bool) -> Self {
        self.warm_starting = enabled;
        self
    }

    /// Set the linear and angular slop tolerances
    pub fn with_slop(mut self, linear: f64, angular: f64) -> Self {
        self.linear_slop = linear;
        self.angular_slop = angular;
        self
    }

    /// Enable or disable parallel island solving
    pub fn with_parallel_islands(mut self, enabled: bool) -> Self {
        self.parallel_islands = enabled;
        self
    }

    /// Check that every parameter is in range
    pub fn validate(&self) -> Result<()> {
        fn positive(name: &str, value: f64) -> Result<()> {
            if value > 0.0 && value.is_finite() {
                Ok(())
            } else {
                Err(PhysicsError::InvalidSettings(format!(
                    "{} must be positive and finite, got {}",
                    name, value
                )))
            }
        }

        if self.velocity_iterations == 0 {
            return Err(PhysicsError::InvalidSettings(
                "velocity_iterations must be at least 1".to_string(),
            ));
        }
        positive("linear_slop", self.linear_slop)?;
        positive("angular_slop", self.angular_slop)?;
        positive("max_translation", self.max_translation)?;
        positive("max_rotation", self.max_rotation)?;
        Ok(())
    }
}

/// Timing data for one simulation step, shared by every constraint
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeStep {
    /// Step duration
    pub dt: f64,
    /// Inverse step duration
    pub inv_dt: f64,
    /// `dt * previous inv_dt`, scales warm-start impulses for variable steps
    pub dt_ratio: f64,
    /// Velocity passes this step
    pub velocity_iterations: usize,
    /// Position pass cap this step
    pub position_iterations: usize,
    /// Whether accumulated impulses carry over from the previous step
    pub warm_starting: bool,
}

impl TimeStep {
    /// Build the step data for `dt` given the previous step's inverse duration
    ///
    /// # Errors
    ///
    /// Returns [`PhysicsError::InvalidTimeStep`] if `dt` is non-positive, NaN,
    /// or infinite.
    pub fn new(dt: f64, prev_inv_dt: f64, settings: &Settings) -> Result<Self> {
        if dt <= 0.0 || !dt.is_finite() {
            return Err(PhysicsError::InvalidTimeStep(dt));
        }
        Ok(TimeStep {
            dt,
            inv_dt: 1.0 / dt,
            dt_ratio: prev_inv_dt * dt,
            velocity_iterations: settings.velocity_iterations,
            position_iterations: settings.position_iterations,
            warm_starting: settings.warm_starting,
        })
    }
}
