// Generation-checked handles and the arena that issues them.
//
// A `Handle` is a slot index plus the slot's generation at the time it was
// issued. Removing a value bumps the slot generation, so every copy of the
// old handle stops resolving even after the index is reused. Freed indices
// go to a min-heap and the lowest one is reused first, which keeps handle
// numbers small and predictable for hosts that log them.

use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Handle {
    index: u32,
    generation: u32,
}

impl Handle {
    /// Never issued by any arena.
    pub const INVALID: Handle = Handle {
        index: u32::MAX,
        generation: 0,
    };

    pub fn index(self) -> u32 {
        self.index
    }

    pub fn generation(self) -> u32 {
        self.generation
    }

    pub fn is_invalid(self) -> bool {
        self == Self::INVALID
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_invalid() {
            write!(f, "#invalid")
        } else {
            write!(f, "#{}v{}", self.index, self.generation)
        }
    }
}

struct Slot<T> {
    generation: u32,
    value: Option<T>,
}

pub struct HandleArena<T> {
    slots: Vec<Slot<T>>,
    free: BinaryHeap<Reverse<u32>>,
    live: usize,
    capacity: usize,
}

impl<T> HandleArena<T> {
    /// An arena holding at most `capacity` live values.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::new(),
            free: BinaryHeap::new(),
            live: 0,
            // INVALID's index must never be issued.
            capacity: capacity.min(u32::MAX as usize),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Store the value built by `make`, which receives the new handle.
    /// Returns `None` without calling `make` when the arena is full.
    pub fn insert_with(&mut self, make: impl FnOnce(Handle) -> T) -> Option<Handle> {
        if self.live >= self.capacity {
            return None;
        }
        let index = match self.free.pop() {
            Some(Reverse(index)) => index,
            None => {
                let index = u32::try_from(self.slots.len()).ok()?;
                self.slots.push(Slot {
                    generation: 0,
                    value: None,
                });
                index
            }
        };
        let slot = &mut self.slots[index as usize];
        let handle = Handle {
            index,
            generation: slot.generation,
        };
        slot.value = Some(make(handle));
        self.live += 1;
        Some(handle)
    }

    pub fn insert(&mut self, value: T) -> Option<Handle> {
        self.insert_with(|_| value)
    }

    pub fn get(&self, handle: Handle) -> Option<&T> {
        self.slots
            .get(handle.index as usize)
            .filter(|slot| slot.generation == handle.generation)
            .and_then(|slot| slot.value.as_ref())
    }

    pub fn contains(&self, handle: Handle) -> bool {
        self.get(handle).is_some()
    }

    /// Take the value out and retire the handle. `None` for stale or
    /// unknown handles.
    pub fn remove(&mut self, handle: Handle) -> Option<T> {
        let slot = self.slots.get_mut(handle.index as usize)?;
        if slot.generation != handle.generation {
            return None;
        }
        let value = slot.value.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(Reverse(handle.index));
        self.live -= 1;
        Some(value)
    }

    /// Remove every live value, retiring all handles.
    pub fn drain(&mut self) -> Vec<T> {
        let mut values = Vec::with_capacity(self.live);
        for (index, slot) in (0u32..).zip(self.slots.iter_mut()) {
            if let Some(value) = slot.value.take() {
                slot.generation = slot.generation.wrapping_add(1);
                self.free.push(Reverse(index));
                values.push(value);
            }
        }
        self.live = 0;
        values
    }

    /// `(handle, value)` for every live value, in index order.
    pub fn iter(&self) -> impl Iterator<Item = (Handle, &T)> + '_ {
        (0u32..).zip(&self.slots).filter_map(|(index, slot)| {
            slot.value.as_ref().map(|value| {
                (
                    Handle {
                        index,
                        generation: slot.generation,
                    },
                    value,
                )
            })
        })
    }
}
