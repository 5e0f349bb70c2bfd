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
//! Island partitioning and the per-island solve pipeline
//!
//! Bodies linked by constraints end up in the same island; islands share no
//! movable body and are solved independently. Static bodies never link
//! islands: each island that references one gets its own read-only copy,
//! which is discarded after the solve.

use crate::dynamics::{Arena, Body, BodyHandle, RawHandle, Settings, TimeStep};
use crate::error::{PhysicsError, Result};
use crate::joints::{BodyPair, Constraint};
use crate::math::Vec2;
use crate::pool::{BufferPool, PooledBuffer};

/// Disjoint-set forest over arena slot indices
pub(crate) struct UnionFind {
    parent: Vec<usize>,
    rank: Vec<u8>,
}

impl UnionFind {
    pub(crate) fn new(len: usize) -> Self {
        UnionFind {
            parent: (0..len).collect(),
            rank: vec![0; len],
        }
    }

    /// Find root with path halving
    pub(crate) fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    /// Merge the sets containing `a` and `b`
    pub(crate) fn union(&mut self, a: usize, b: usize) {
        let ra = self.find(a);
        let rb = self.find(b);
        if ra == rb {
            return;
        }
        match self.rank[ra].cmp(&self.rank[rb]) {
            std::cmp::Ordering::Less => self.parent[ra] = rb,
            std::cmp::Ordering::Greater => self.parent[rb] = ra,
            std::cmp::Ordering::Equal => {
                self.parent[rb] = ra;
                self.rank[ra] = self.rank[ra].saturating_add(1);
            }
        }
    }
}

struct IslandConstraint<'a> {
    a: usize,
    b: usize,
    constraint: &'a mut dyn Constraint,
}

/// Result of solving one island
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct IslandOutcome {
    /// Position passes actually run
    pub(crate) position_iterations: usize,
    /// Whether every constraint reported convergence before the cap
    pub(crate) converged: bool,
}

/// A group of bodies and the constraints linking them
///
/// Holds working copies of its bodies so that disjoint islands can be
/// solved on different threads.
pub(crate) struct Island<'a> {
    handles: Vec<BodyHandle>,
    bodies: PooledBuffer<Body>,
    constraints: Vec<IslandConstraint<'a>>,
    statics: Vec<(usize, usize)>,
}

impl<'a> Island<'a> {
    fn new(bodies: PooledBuffer<Body>) -> Self {
        Island {
            handles: Vec::new(),
            bodies,
            constraints: Vec::new(),
            statics: Vec::new(),
        }
    }

    fn push_body(&mut self, handle: BodyHandle, body: &Body) -> usize {
        self.handles.push(handle);
        self.bodies.push(body.clone());
        self.bodies.len() - 1
    }

    /// Local index of a static body, copying it in on first use
    fn static_body(&mut self, raw: RawHandle, body: &Body) -> usize {
        let slot = raw.index();
        if let Some(&(_, local)) = self.statics.iter().find(|(s, _)| *s == slot) {
            return local;
        }
        let local = self.push_body(BodyHandle::from_raw(raw), body);
        self.statics.push((slot, local));
        local
    }

    /// Number of constraints
    #[cfg(test)]
    pub(crate) fn constraint_count(&self) -> usize {
        self.constraints.len()
    }

    /// Handles of the island's bodies in local order
    #[cfg(test)]
    pub(crate) fn handles(&self) -> &[BodyHandle] {
        &self.handles
    }

    /// Run the full step pipeline on this island
    ///
    /// Velocities are integrated from forces, constraints are initialized
    /// and warm started, `velocity_iterations` velocity passes run, positions
    /// are integrated, and then up to `position_iterations` position passes
    /// run, stopping as soon as every constraint reports convergence.
    pub(crate) fn solve(
        &mut self,
        step: &TimeStep,
        gravity: Vec2,
        settings: &Settings,
    ) -> IslandOutcome {
        for body in self.bodies.iter_mut() {
            body.integrate_velocity(step.dt, gravity);
        }

        for entry in self.constraints.iter_mut() {
            if let Some(pair) = BodyPair::from_slice(&mut self.bodies, entry.a, entry.b) {
                entry.constraint.init_velocity_constraints(pair, step);
            }
        }

        for _ in 0..step.velocity_iterations {
            for entry in self.constraints.iter_mut() {
                if let Some(pair) = BodyPair::from_slice(&mut self.bodies, entry.a, entry.b) {
                    entry.constraint.solve_velocity_constraints(pair, step);
                }
            }
        }

        for body in self.bodies.iter_mut() {
            if !body.is_static() {
                body.integrate_position(step.dt, settings);
                body.synchronize_transform();
            }
        }

        let mut outcome = IslandOutcome {
            position_iterations: 0,
            converged: self.constraints.is_empty(),
        };
        if !outcome.converged {
            for _ in 0..step.position_iterations {
                outcome.position_iterations += 1;
                let mut all_solved = true;
                for entry in self.constraints.iter_mut() {
                    if let Some(pair) = BodyPair::from_slice(&mut self.bodies, entry.a, entry.b) {
                        all_solved &= entry.constraint.solve_position_constraints(pair, settings);
                    }
                }
                if all_solved {
                    outcome.converged = true;
                    break;
                }
            }
        }

        for body in self.bodies.iter_mut() {
            if !body.is_static() {
                body.synchronize_transform();
            }
        }

        outcome
    }

    /// Copy the solved movable bodies back into the world's arena
    pub(crate) fn write_back(mut self, arena: &mut Arena<Body>) {
        for (handle, body) in self.handles.iter().zip(self.bodies.drain(..)) {
            if body.is_static() {
                continue;
            }
            if let Some(slot) = arena.get_mut(handle.raw()) {
                *slot = body;
            }
        }
    }
}

fn lookup(bodies: &Arena<Body>, handle: BodyHandle) -> Result<(RawHandle, &Body)> {
    let raw = handle.raw();
    bodies
        .get(raw)
        .map(|body| (raw, body))
        .ok_or_else(|| PhysicsError::StaleBody(handle.to_string()))
}

/// Partition bodies and constraints into islands
///
/// Islands are ordered by the insertion order of their first body, bodies
/// within an island likewise, and constraints keep the order they were
/// given in.
///
/// # Errors
///
/// Returns [`PhysicsError::StaleBody`] if a constraint references a body
/// the arena does not hold.
pub(crate) fn build_islands<'a>(
    bodies: &Arena<Body>,
    constraints: Vec<&'a mut dyn Constraint>,
    pool: &BufferPool<Body>,
) -> Result<Vec<Island<'a>>> {
    let slots = bodies.capacity();
    let mut sets = UnionFind::new(slots);

    for constraint in &constraints {
        let (raw_a, a) = lookup(bodies, constraint.body_a())?;
        let (raw_b, b) = lookup(bodies, constraint.body_b())?;
        if !a.is_static() && !b.is_static() {
            sets.union(raw_a.index(), raw_b.index());
        }
    }

    let mut island_of_root: Vec<Option<usize>> = vec![None; slots];
    let mut placement: Vec<Option<(usize, usize)>> = vec![None; slots];
    let mut islands: Vec<Island<'a>> = Vec::new();

    for (raw, body) in bodies.iter() {
        if body.is_static() {
            continue;
        }
        let root = sets.find(raw.index());
        let island = match island_of_root[root] {
            Some(island) => island,
            None => {
                islands.push(Island::new(pool.acquire()));
                island_of_root[root] = Some(islands.len() - 1);
                islands.len() - 1
            }
        };
        let local = islands[island].push_body(BodyHandle::from_raw(raw), body);
        placement[raw.index()] = Some((island, local));
    }

    for constraint in constraints {
        let (raw_a, a) = lookup(bodies, constraint.body_a())?;
        let (raw_b, b) = lookup(bodies, constraint.body_b())?;

        let owner = placement[raw_a.index()].or(placement[raw_b.index()]);
        let Some((island, _)) = owner else {
            log::trace!(
                "constraint {} -> {} joins two static bodies, skipped",
                constraint.body_a(),
                constraint.body_b()
            );
            continue;
        };

        let island = &mut islands[island];
        let local_a = match placement[raw_a.index()] {
            Some((_, local)) => local,
            None => island.static_body(raw_a, a),
        };
        let local_b = match placement[raw_b.index()] {
            Some((_, local)) => local,
            None => island.static_body(raw_b, b),
        };
        island.constraints.push(IslandConstraint {
            a: local_a,
            b: local_b,
            constraint,
        });
    }

    Ok(islands)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dynamics::BodyDef;
    use crate::joints::WeldJoint;

    fn insert(arena: &mut Arena<Body>, def: BodyDef) -> BodyHandle {
        BodyHandle::from_raw(arena.insert(Body::new(&def).unwrap()))
    }

    fn weld(a: BodyHandle, b: BodyHandle) -> WeldJoint {
        WeldJoint::new(a, b, Vec2::ZERO, Vec2::ZERO)
    }

    #[test]
    fn test_union_find() {
        let mut sets = UnionFind::new(5);
        sets.union(0, 1);
        sets.union(3, 4);
        sets.union(1, 4);

        let root = sets.find(0);
        assert_eq!(sets.find(1), root);
        assert_eq!(sets.find(3), root);
        assert_eq!(sets.find(4), root);
        assert_ne!(sets.find(2), root);
    }

    #[test]
    fn test_static_body_does_not_link_islands() {
        let mut arena = Arena::new();
        let ground = insert(&mut arena, BodyDef::fixed());
        let left = insert(&mut arena, BodyDef::dynamic());
        let right = insert(&mut arena, BodyDef::dynamic());

        let mut j1 = weld(ground, left);
        let mut j2 = weld(ground, right);
        let pool = BufferPool::new();
        let constraints: Vec<&mut dyn Constraint> = vec![&mut j1 as &mut dyn Constraint, &mut j2];
        let islands = build_islands(&arena, constraints, &pool).unwrap();

        assert_eq!(islands.len(), 2);
        // Each island carries its own copy of the ground
        assert_eq!(islands[0].handles(), &[left, ground]);
        assert_eq!(islands[1].handles(), &[right, ground]);
        assert_eq!(islands[0].constraint_count(), 1);
    }

    #[test]
    fn test_chain_forms_single_island_in_order() {
        let mut arena = Arena::new();
        let a = insert(&mut arena, BodyDef::dynamic());
        let b = insert(&mut arena, BodyDef::dynamic());
        let c = insert(&mut arena, BodyDef::dynamic());
        let lone = insert(&mut arena, BodyDef::dynamic());

        let mut j1 = weld(b, c);
        let mut j2 = weld(a, b);
        let pool = BufferPool::new();
        let constraints: Vec<&mut dyn Constraint> = vec![&mut j1 as &mut dyn Constraint, &mut j2];
        let islands = build_islands(&arena, constraints, &pool).unwrap();

        assert_eq!(islands.len(), 2);
        assert_eq!(islands[0].handles(), &[a, b, c]);
        assert_eq!(islands[1].handles(), &[lone]);
        assert_eq!(islands[1].constraint_count(), 0);

        // Constraint order is the submission order
        let order: Vec<BodyHandle> = islands[0]
            .constraints
            .iter()
            .map(|entry| entry.constraint.body_a())
            .collect();
        assert_eq!(order, vec![b, a]);
    }

    #[test]
    fn test_stale_constraint_is_rejected() {
        let mut arena = Arena::new();
        let a = insert(&mut arena, BodyDef::dynamic());
        let b = insert(&mut arena, BodyDef::dynamic());
        arena.remove(b.raw());

        let mut joint = weld(a, b);
        let pool = BufferPool::new();
        let constraints: Vec<&mut dyn Constraint> = vec![&mut joint as &mut dyn Constraint];
        let result = build_islands(&arena, constraints, &pool);
        assert!(matches!(result, Err(PhysicsError::StaleBody(_))));
    }

    #[test]
    fn test_write_back_skips_static_copies() {
        let mut arena = Arena::new();
        let ground = insert(&mut arena, BodyDef::fixed());
        let body = insert(
            &mut arena,
            BodyDef::dynamic().with_velocity(Vec2::new(1.0, 0.0), 0.0),
        );

        let pool = BufferPool::new();
        let settings = Settings::default();
        let step = TimeStep::new(0.5, 0.0, &settings).unwrap();
        let mut islands = build_islands(&arena, Vec::new(), &pool).unwrap();
        assert_eq!(islands.len(), 1);

        let outcome = islands[0].solve(&step, Vec2::ZERO, &settings);
        assert!(outcome.converged);
        assert_eq!(outcome.position_iterations, 0);

        for island in islands {
            island.write_back(&mut arena);
        }
        assert_eq!(arena.get(body.raw()).unwrap().position(), Vec2::new(0.5, 0.0));
        assert_eq!(arena.get(ground.raw()).unwrap().position(), Vec2::ZERO);
        // Scratch buffer went back to the pool
        assert_eq!(pool.len(), 1);
    }
}
