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
//! Handle management
//!
//! Bodies and joints are referenced through lightweight generational handles
//! rather than pointers. A handle stays valid until the object it names is
//! destroyed; after that, the slot's generation moves on and the stale handle
//! is rejected by every lookup, even if the slot is reused.

use std::fmt;

/// Generational index shared by all handle types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct RawHandle {
    index: u32,
    generation: u32,
}

impl RawHandle {
    pub(crate) fn new(index: u32, generation: u32) -> Self {
        RawHandle { index, generation }
    }

    pub(crate) fn index(&self) -> usize {
        self.index as usize
    }

    pub(crate) fn generation(&self) -> u32 {
        self.generation
    }
}

macro_rules! define_handle {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(RawHandle);

        impl $name {
            /// Create a handle from a raw slot index and generation
            ///
            /// Mostly useful in tests; handles obtained this way are only
            /// valid if the world actually holds an object at that slot.
            pub fn new(index: u32, generation: u32) -> Self {
                $name(RawHandle::new(index, generation))
            }

            /// Slot index of this handle
            pub fn index(&self) -> usize {
                self.0.index()
            }

            /// Generation of this handle
            pub fn generation(&self) -> u32 {
                self.0.generation()
            }

            pub(crate) fn raw(&self) -> RawHandle {
                self.0
            }

            pub(crate) fn from_raw(raw: RawHandle) -> Self {
                $name(raw)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({}, gen: {})", $label, self.0.index, self.0.generation)
            }
        }
    };
}

define_handle!(
    /// Handle to a body owned by a [`World`](crate::World)
    BodyHandle,
    "Body"
);

define_handle!(
    /// Handle to a joint owned by a [`World`](crate::World)
    JointHandle,
    "Joint"
);

#[derive(Clone)]
struct Slot<T> {
    generation: u32,
    value: Option<T>,
}

/// Generational storage that iterates in insertion order
///
/// Freed slots are reused, but iteration follows the order in which the live
/// values were inserted. The solver relies on that: Gauss-Seidel relaxation is
/// order-sensitive, so constraint order must not depend on slot reuse.
#[derive(Clone)]
pub(crate) struct Arena<T> {
    slots: Vec<Slot<T>>,
    free: Vec<u32>,
    order: Vec<u32>,
}

impl<T> Arena<T> {
    pub(crate) fn new() -> Self {
        Arena {
            slots: Vec::new(),
            free: Vec::new(),
            order: Vec::new(),
        }
    }

    pub(crate) fn insert(&mut self, value: T) -> RawHandle {
        let index = match self.free.pop() {
            Some(index) => {
                self.slots[index as usize].value = Some(value);
                index
            }
            None => {
                let index = self.slots.len() as u32;
                self.slots.push(Slot {
                    generation: 0,
                    value: Some(value),
                });
                index
            }
        };
        self.order.push(index);
        RawHandle::new(index, self.slots[index as usize].generation)
    }

    /// Remove a value; increments the slot generation to invalidate old handles
    pub(crate) fn remove(&mut self, handle: RawHandle) -> Option<T> {
        let slot = self.slots.get_mut(handle.index())?;
        if slot.generation != handle.generation() {
            return None;
        }
        let value = slot.value.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(handle.index);
        self.order.retain(|&i| i != handle.index);
        Some(value)
    }

    pub(crate) fn get(&self, handle: RawHandle) -> Option<&T> {
        self.slots
            .get(handle.index())
            .filter(|slot| slot.generation == handle.generation())
            .and_then(|slot| slot.value.as_ref())
    }

    pub(crate) fn get_mut(&mut self, handle: RawHandle) -> Option<&mut T> {
        self.slots
            .get_mut(handle.index())
            .filter(|slot| slot.generation == handle.generation())
            .and_then(|slot| slot.value.as_mut())
    }

    pub(crate) fn contains(&self, handle: RawHandle) -> bool {
        self.get(handle).is_some()
    }

    pub(crate) fn len(&self) -> usize {
        self.order.len()
    }

    /// Number of slots ever allocated, live or free
    pub(crate) fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Iterate live values in insertion order
    pub(crate) fn iter(&self) -> impl Iterator<Item = (RawHandle, &T)> + '_ {
        self.order.iter().filter_map(move |&index| {
            let slot = &self.slots[index as usize];
            slot.value
                .as_ref()
                .map(|value| (RawHandle::new(index, slot.generation), value))
        })
    }

    /// Iterate live values mutably in insertion order
    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = (RawHandle, &mut T)> + '_ {
        let order = &self.order;
        let mut by_slot: Vec<Option<(RawHandle, &mut T)>> = self
            .slots
            .iter_mut()
            .enumerate()
            .map(|(index, slot)| {
                let generation = slot.generation;
                slot.value
                    .as_mut()
                    .map(|value| (RawHandle::new(index as u32, generation), value))
            })
            .collect();
        order
            .iter()
            .filter_map(move |&index| by_slot[index as usize].take())
    }
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self::new()
    }
}
