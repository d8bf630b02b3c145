#![forbid(unsafe_code)]

//! Generational slot pool backing the animation driver.
//!
//! Slots are `Vec<Option<T>>` with a free list; each slot carries a
//! generation bumped on recycle, so a stale [`PoolId`] held after its
//! slot was reused resolves to `None` instead of someone else's value.
//!
//! Ownership of a live slot is a move-only [`PoolTicket`]: `recycle`
//! consumes it, which makes a double recycle of the same slot a type
//! error rather than a runtime check.
//!
//! # Invariants
//!
//! 1. A `PoolId` only resolves while its generation matches the slot's.
//! 2. Recycling bumps the generation, invalidating every outstanding
//!    copy of the old id at once.
//! 3. Slot storage never shrinks; freed slots are reused LIFO.

// ---------------------------------------------------------------------------
// Ids and tickets
// ---------------------------------------------------------------------------

/// Copyable reference to a pool slot, valid only for one generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PoolId {
    index: u32,
    generation: u32,
}

impl PoolId {
    /// Slot index, for diagnostics.
    #[must_use]
    pub fn index(self) -> u32 {
        self.index
    }
}

/// Move-only proof of ownership of a live slot.
///
/// Only `Pool::alloc` creates one and only `Pool::recycle` consumes it.
#[derive(Debug, PartialEq, Eq)]
pub struct PoolTicket {
    id: PoolId,
}

impl PoolTicket {
    /// The copyable id for the owned slot.
    #[must_use]
    pub fn id(&self) -> PoolId {
        self.id
    }
}

// ---------------------------------------------------------------------------
// Pool
// ---------------------------------------------------------------------------

struct Slot<T> {
    value: Option<T>,
    generation: u32,
}

/// Generational slot pool.
pub struct Pool<T> {
    slots: Vec<Slot<T>>,
    free_list: Vec<u32>,
}

impl<T> Default for Pool<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Pool<T> {
    /// Create an empty pool.
    #[must_use]
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free_list: Vec::new(),
        }
    }

    /// Store `value`, reusing a freed slot when one exists.
    pub fn alloc(&mut self, value: T) -> PoolTicket {
        let index = match self.free_list.pop() {
            Some(index) => {
                self.slots[index as usize].value = Some(value);
                index
            }
            None => {
                let index = self.slots.len() as u32;
                self.slots.push(Slot {
                    value: Some(value),
                    generation: 0,
                });
                index
            }
        };
        PoolTicket {
            id: PoolId {
                index,
                generation: self.slots[index as usize].generation,
            },
        }
    }

    /// Free the slot the ticket owns, returning its value.
    ///
    /// Returns `None` only if the ticket came from a different pool.
    pub fn recycle(&mut self, ticket: PoolTicket) -> Option<T> {
        let PoolId { index, generation } = ticket.id;
        let slot = self.slots.get_mut(index as usize)?;
        if slot.generation != generation {
            return None;
        }
        let value = slot.value.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free_list.push(index);
        Some(value)
    }

    /// Resolve `id` if its slot is still live at the same generation.
    #[must_use]
    pub fn get(&self, id: PoolId) -> Option<&T> {
        let slot = self.slots.get(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.value.as_ref()
    }

    /// Mutable [`Pool::get`].
    pub fn get_mut(&mut self, id: PoolId) -> Option<&mut T> {
        let slot = self.slots.get_mut(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.value.as_mut()
    }

    /// Whether `id` still resolves.
    #[must_use]
    pub fn contains(&self, id: PoolId) -> bool {
        self.get(id).is_some()
    }

    /// Number of live slots.
    #[must_use]
    pub fn live(&self) -> usize {
        self.slots.len() - self.free_list.len()
    }

    /// Total slots ever allocated, live or free.
    #[must_use]
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }
}

impl<T> std::fmt::Debug for Pool<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pool")
            .field("live", &self.live())
            .field("slots", &self.slots.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn alloc_then_get() {
        let mut pool = Pool::new();
        let ticket = pool.alloc("a");
        assert_eq!(pool.get(ticket.id()), Some(&"a"));
        assert_eq!(pool.live(), 1);
    }

    #[test]
    fn recycle_returns_value_and_frees_slot() {
        let mut pool = Pool::new();
        let ticket = pool.alloc(7);
        let id = ticket.id();
        assert_eq!(pool.recycle(ticket), Some(7));
        assert!(!pool.contains(id));
        assert_eq!(pool.live(), 0);
    }

    #[test]
    fn reused_slot_invalidates_old_id() {
        let mut pool = Pool::new();
        let first = pool.alloc("first");
        let old_id = first.id();
        pool.recycle(first);

        let second = pool.alloc("second");
        // Same slot, new generation.
        assert_eq!(second.id().index(), old_id.index());
        assert!(pool.get(old_id).is_none());
        assert_eq!(pool.get(second.id()), Some(&"second"));
    }

    #[test]
    fn get_mut_updates_in_place() {
        let mut pool = Pool::new();
        let ticket = pool.alloc(1);
        *pool.get_mut(ticket.id()).unwrap() += 10;
        assert_eq!(pool.get(ticket.id()), Some(&11));
    }

    #[test]
    fn free_slots_are_reused_lifo() {
        let mut pool = Pool::new();
        let a = pool.alloc("a");
        let b = pool.alloc("b");
        let b_index = b.id().index();
        pool.recycle(a);
        pool.recycle(b);
        let c = pool.alloc("c");
        assert_eq!(c.id().index(), b_index);
        assert_eq!(pool.slot_count(), 2);
    }

    #[test]
    fn foreign_ticket_is_rejected() {
        let mut a: Pool<&str> = Pool::new();
        let mut b: Pool<&str> = Pool::new();
        a.alloc("x");
        a.alloc("y");
        let wrong = a.alloc("z");
        // b has no slot at that index.
        assert_eq!(b.recycle(wrong), None);
    }

    proptest! {
        #[test]
        fn live_count_tracks_alloc_recycle(ops in proptest::collection::vec(any::<bool>(), 1..64)) {
            let mut pool = Pool::new();
            let mut tickets = Vec::new();
            for alloc in ops {
                if alloc || tickets.is_empty() {
                    tickets.push(pool.alloc(0u32));
                } else {
                    let ticket = tickets.swap_remove(tickets.len() / 2);
                    prop_assert!(pool.recycle(ticket).is_some());
                }
                prop_assert_eq!(pool.live(), tickets.len());
            }
            for ticket in &tickets {
                prop_assert!(pool.contains(ticket.id()));
            }
        }
    }
}
