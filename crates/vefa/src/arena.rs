//! # Arena — Generational Slot Storage for Instances
//!
//! Entity and component instances live in two arenas owned by the
//! [`InstanceGraph`](crate::instance::InstanceGraph). Everything else refers
//! to them through small copyable handles: an entity's component list, a
//! component's back-reference to its entity, a child's parent, a resolved
//! pointer field. Those are all non-owning; the arena is the only owner.
//!
//! ## Generational Indices
//!
//! Runtime spawns and destroys recycle slots. A handle stored before the
//! slot was recycled must not silently point at the new occupant:
//!
//! ```text
//! Key { index: 5, generation: 0 }  ← original
//! Key { index: 5, generation: 1 }  ← after the slot is reused
//! ```
//!
//! A stale handle still says `generation: 0`, so lookups fail safely.

use std::fmt;

/// A slot key: index plus generation.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct Key {
    pub(crate) index: u32,
    pub(crate) generation: u32,
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}", self.index, self.generation)
    }
}

struct Slot<T> {
    generation: u32,
    value: Option<T>,
}

/// Slot storage with generation-checked keys.
///
/// ```text
/// slots:     [A(g0), _(g1), C(g0), _(g2)]   ← `_` is a vacant slot
/// free_list: [1, 3]                          ← vacant slots, reused LIFO
/// ```
///
/// Inserting pops from `free_list` if possible, otherwise grows. Removing
/// bumps the slot's generation and pushes its index onto `free_list`.
pub(crate) struct Arena<T> {
    slots: Vec<Slot<T>>,
    free_list: Vec<u32>,
    alive: usize,
}

impl<T> Arena<T> {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free_list: Vec::new(),
            alive: 0,
        }
    }

    /// Store a value and return its key.
    pub fn insert(&mut self, value: T) -> Key {
        self.alive += 1;
        if let Some(index) = self.free_list.pop() {
            let slot = &mut self.slots[index as usize];
            slot.value = Some(value);
            Key {
                index,
                generation: slot.generation,
            }
        } else {
            let index = self.slots.len() as u32;
            self.slots.push(Slot {
                generation: 0,
                value: Some(value),
            });
            Key {
                index,
                generation: 0,
            }
        }
    }

    /// Remove the value behind `key`. Returns `None` for stale or vacant keys.
    pub fn remove(&mut self, key: Key) -> Option<T> {
        let slot = self.slots.get_mut(key.index as usize)?;
        if slot.generation != key.generation {
            return None;
        }
        let value = slot.value.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free_list.push(key.index);
        self.alive -= 1;
        Some(value)
    }

    pub fn get(&self, key: Key) -> Option<&T> {
        let slot = self.slots.get(key.index as usize)?;
        if slot.generation != key.generation {
            return None;
        }
        slot.value.as_ref()
    }

    pub fn get_mut(&mut self, key: Key) -> Option<&mut T> {
        let slot = self.slots.get_mut(key.index as usize)?;
        if slot.generation != key.generation {
            return None;
        }
        slot.value.as_mut()
    }

    pub fn contains(&self, key: Key) -> bool {
        self.get(key).is_some()
    }

    /// Number of occupied slots.
    pub fn len(&self) -> usize {
        self.alive
    }

    /// Iterate occupied slots in index order.
    pub fn iter(&self) -> impl Iterator<Item = (Key, &T)> {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            slot.value.as_ref().map(|value| {
                (
                    Key {
                        index: index as u32,
                        generation: slot.generation,
                    },
                    value,
                )
            })
        })
    }
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self::new()
    }
}
