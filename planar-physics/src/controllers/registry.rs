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
//! Controller registry
//!
//! Keeps the controllers attached to a world, checks API compatibility at
//! registration, and runs them in dependency order. Controllers may be added
//! or removed between steps; the execution order is re-resolved lazily on the
//! next update, and newly added controllers are initialized right before
//! their first update.

use std::collections::{HashMap, HashSet, VecDeque};

use semver::Version;

use crate::controllers::api::{Controller, ControllerContext, CONTROLLER_API_VERSION};
use crate::error::{PhysicsError, Result};

/// Registry managing and executing controllers
pub struct ControllerRegistry {
    /// Registered controllers indexed by name
    controllers: HashMap<String, Box<dyn Controller>>,
    /// Names in registration order, used to break ties deterministically
    registration_order: Vec<String>,
    /// Execution order (topologically sorted by dependencies)
    load_order: Vec<String>,
    /// Controllers whose `initialize` hook has run
    initialized: HashSet<String>,
    /// Whether `load_order` must be recomputed
    dirty: bool,
}

impl ControllerRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        ControllerRegistry {
            controllers: HashMap::new(),
            registration_order: Vec::new(),
            load_order: Vec::new(),
            initialized: HashSet::new(),
            dirty: false,
        }
    }

    /// Register a controller
    ///
    /// Dependencies are not checked here, so controllers can be registered
    /// in any order; they are checked before the next update.
    ///
    /// # Errors
    ///
    /// - [`PhysicsError::DuplicateController`] if the name is taken
    /// - [`PhysicsError::ControllerVersion`] if the API version is incompatible
    pub fn register(&mut self, controller: Box<dyn Controller>) -> Result<()> {
        let name = controller.name().to_string();

        if self.controllers.contains_key(&name) {
            log::warn!("rejected controller '{}': name already registered", name);
            return Err(PhysicsError::DuplicateController(name));
        }

        let api_version = controller.api_version();
        if !is_version_compatible(api_version, CONTROLLER_API_VERSION) {
            log::warn!(
                "rejected controller '{}': API version {} incompatible with {}",
                name,
                api_version,
                CONTROLLER_API_VERSION
            );
            return Err(PhysicsError::ControllerVersion {
                name,
                found: api_version.to_string(),
                expected: CONTROLLER_API_VERSION.to_string(),
            });
        }

        log::debug!("registered controller '{}' v{}", name, controller.version());
        self.registration_order.push(name.clone());
        self.controllers.insert(name, controller);
        self.dirty = true;
        Ok(())
    }

    /// Remove a controller, running its `shutdown` hook if it was initialized
    ///
    /// # Errors
    ///
    /// - [`PhysicsError::ControllerDependency`] if another registered
    ///   controller depends on it
    /// - [`PhysicsError::Controller`] if the shutdown hook fails; the
    ///   controller is removed regardless
    ///
    /// Returns `Ok(None)` if no controller has that name.
    pub fn unregister(&mut self, name: &str) -> Result<Option<Box<dyn Controller>>> {
        if !self.controllers.contains_key(name) {
            return Ok(None);
        }
        for other in &self.registration_order {
            let depends = self
                .controllers
                .get(other)
                .map_or(false, |c| c.dependencies().contains(&name));
            if depends {
                return Err(PhysicsError::ControllerDependency {
                    name: other.clone(),
                    dependency: name.to_string(),
                });
            }
        }

        let Some(mut controller) = self.controllers.remove(name) else {
            return Ok(None);
        };
        self.registration_order.retain(|n| n != name);
        self.load_order.retain(|n| n != name);

        if self.initialized.remove(name) {
            controller.shutdown().map_err(|message| PhysicsError::Controller {
                name: name.to_string(),
                message,
            })?;
        }
        Ok(Some(controller))
    }

    /// Resolve dependencies into an execution order
    ///
    /// # Errors
    ///
    /// - [`PhysicsError::ControllerDependency`] for a missing dependency
    /// - [`PhysicsError::CircularDependency`] if dependencies form a cycle
    pub fn resolve(&mut self) -> Result<()> {
        let mut dependencies: HashMap<String, Vec<String>> = HashMap::new();
        for name in &self.registration_order {
            let Some(controller) = self.controllers.get(name) else {
                continue;
            };
            let deps: Vec<String> = controller
                .dependencies()
                .iter()
                .map(|s| s.to_string())
                .collect();

            for dep in &deps {
                if !self.controllers.contains_key(dep) {
                    return Err(PhysicsError::ControllerDependency {
                        name: name.clone(),
                        dependency: dep.clone(),
                    });
                }
            }
            dependencies.insert(name.clone(), deps);
        }

        self.load_order = topological_sort(&self.registration_order, &dependencies)?;
        self.dirty = false;
        Ok(())
    }

    /// Run every controller for the coming step
    ///
    /// Resolves the execution order if controllers changed, initializes
    /// controllers that have not run yet, then updates all in order.
    ///
    /// # Errors
    ///
    /// Stops at the first failing controller, see [`resolve`](Self::resolve)
    /// and [`PhysicsError::Controller`].
    pub fn update_all(&mut self, context: &mut ControllerContext) -> Result<()> {
        if self.dirty {
            self.resolve()?;
        }

        for name in &self.load_order {
            let Some(controller) = self.controllers.get_mut(name) else {
                continue;
            };
            if !self.initialized.contains(name) {
                controller
                    .initialize(context)
                    .map_err(|message| PhysicsError::Controller {
                        name: name.clone(),
                        message,
                    })?;
                self.initialized.insert(name.clone());
            }
            controller
                .update(context)
                .map_err(|message| PhysicsError::Controller {
                    name: name.clone(),
                    message,
                })?;
        }

        Ok(())
    }

    /// Shutdown all initialized controllers in reverse execution order
    ///
    /// Controllers stay registered and are initialized again before their
    /// next update.
    pub fn shutdown_all(&mut self) -> Result<()> {
        for name in self.load_order.iter().rev() {
            if !self.initialized.remove(name) {
                continue;
            }
            if let Some(controller) = self.controllers.get_mut(name) {
                controller
                    .shutdown()
                    .map_err(|message| PhysicsError::Controller {
                        name: name.clone(),
                        message,
                    })?;
            }
        }
        Ok(())
    }

    /// Get a controller by name
    pub fn get(&self, name: &str) -> Option<&dyn Controller> {
        self.controllers.get(name).map(|c| c.as_ref())
    }

    /// Get a mutable controller by name
    pub fn get_mut(&mut self, name: &str) -> Option<&mut (dyn Controller + '_)> {
        self.controllers
            .get_mut(name)
            .map(|c| &mut **c as &mut (dyn Controller + '_))
    }

    /// Number of registered controllers
    pub fn len(&self) -> usize {
        self.controllers.len()
    }

    /// Whether no controllers are registered
    pub fn is_empty(&self) -> bool {
        self.controllers.is_empty()
    }

    /// Execution order as of the last resolution
    pub fn load_order(&self) -> &[String] {
        &self.load_order
    }
}

impl Default for ControllerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ControllerRegistry {
    fn drop(&mut self) {
        if let Err(err) = self.shutdown_all() {
            log::warn!("controller shutdown failed: {}", err);
        }
    }
}

/// Check if a controller API version is compatible with the engine
///
/// Uses semantic versioning rules:
/// - Major version must match
/// - For major version 0.x.y, minor versions must match (breaking changes)
/// - For major version >= 1, minor version can be less than or equal
/// - Patch version is ignored
fn is_version_compatible(controller_version: &str, engine_version: &str) -> bool {
    let (Ok(controller), Ok(engine)) = (
        Version::parse(controller_version),
        Version::parse(engine_version),
    ) else {
        return false;
    };

    if controller.major != engine.major {
        return false;
    }
    if controller.major != 0 {
        controller.minor <= engine.minor
    } else {
        controller.minor == engine.minor
    }
}

/// Kahn's algorithm, seeded and expanded in registration order
fn topological_sort(
    order: &[String],
    dependencies: &HashMap<String, Vec<String>>,
) -> Result<Vec<String>> {
    let mut in_degree: HashMap<&str, usize> = HashMap::new();
    let mut dependents: HashMap<&str, Vec<&str>> = HashMap::new();

    for name in order {
        in_degree.entry(name.as_str()).or_insert(0);
    }
    for name in order {
        for dep in dependencies.get(name).into_iter().flatten() {
            dependents.entry(dep.as_str()).or_default().push(name.as_str());
            *in_degree.entry(name.as_str()).or_insert(0) += 1;
        }
    }

    let mut queue: VecDeque<&str> = order
        .iter()
        .map(String::as_str)
        .filter(|name| in_degree.get(name) == Some(&0))
        .collect();
    let mut sorted = Vec::with_capacity(order.len());

    while let Some(node) = queue.pop_front() {
        sorted.push(node.to_string());
        for &dependent in dependents.get(node).into_iter().flatten() {
            if let Some(degree) = in_degree.get_mut(dependent) {
                *degree -= 1;
                if *degree == 0 {
                    queue.push_back(dependent);
                }
            }
        }
    }

    if sorted.len() != order.len() {
        return Err(PhysicsError::CircularDependency);
    }
    Ok(sorted)
}
