#![forbid(unsafe_code)]

//! Named navigation stacks.
//!
//! A [`StackManager`] owns any number of independent LIFO stacks keyed by
//! name. It is purely structural: push and pop mutate membership
//! immediately and report what changed as outcome values; the service
//! layer turns those outcomes into lifecycle hooks and animations.
//! Keeping structure separate from sequencing means depth algebra holds
//! at all times, even while a transition animation is mid-flight.
//!
//! # Invariants
//!
//! 1. A key appears at most once per stack; a duplicate push is a
//!    reported no-op.
//! 2. After N pushes and M pops (M <= N) a stack's depth is exactly
//!    N minus M, counting duplicates as zero pushes.
//! 3. Popping an empty stack is a reported no-op.

use ahash::AHashMap;
use panekit_core::{PanelKey, PanelRef};

/// Name of the stack used when the caller does not pick one.
pub const DEFAULT_STACK: &str = "";

/// One stack slot.
#[derive(Debug)]
pub struct StackEntry {
    /// The panel occupying this slot.
    pub key: PanelKey,
    /// Shared handle to the instance.
    pub panel: PanelRef,
    /// Whether the push that covered the previous top also hid it, so
    /// the matching pop knows to re-show it.
    pub hid_previous: bool,
}

/// What a push did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushOutcome {
    /// The key went on top; `covered` is the previous top, if any.
    Pushed { covered: Option<PanelKey> },
    /// The key was already somewhere in this stack; nothing changed.
    Duplicate,
}

/// What a pop removed and revealed.
#[derive(Debug)]
pub struct PopResult {
    /// The removed top entry.
    pub popped: StackEntry,
    /// The key now on top, if the stack is non-empty.
    pub revealed: Option<PanelKey>,
    /// Whether the revealed panel was hidden by the popped push and
    /// should be re-shown.
    pub reveal_hidden: bool,
}

/// All named stacks.
#[derive(Debug, Default)]
pub struct StackManager {
    stacks: AHashMap<String, Vec<StackEntry>>,
}

impl StackManager {
    /// Create an empty manager.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Push `key` onto the named stack, creating the stack on first use.
    ///
    /// `hide_previous` records whether the caller is hiding the covered
    /// top; the matching pop reads it back.
    pub fn push(
        &mut self,
        stack: &str,
        key: PanelKey,
        panel: PanelRef,
        hide_previous: bool,
    ) -> PushOutcome {
        let entries = self.stacks.entry(stack.to_string()).or_default();
        if entries.iter().any(|e| e.key == key) {
            tracing::debug!(stack, panel = %key, "duplicate push ignored");
            return PushOutcome::Duplicate;
        }
        let covered = entries.last().map(|e| e.key.clone());
        entries.push(StackEntry {
            key,
            panel,
            hid_previous: hide_previous && covered.is_some(),
        });
        PushOutcome::Pushed { covered }
    }

    /// Remove and return the top of the named stack.
    pub fn pop(&mut self, stack: &str) -> Option<PopResult> {
        let entries = self.stacks.get_mut(stack)?;
        let popped = entries.pop()?;
        let revealed = entries.last().map(|e| e.key.clone());
        Some(PopResult {
            reveal_hidden: popped.hid_previous && revealed.is_some(),
            popped,
            revealed,
        })
    }

    /// Borrow the top entry of the named stack.
    #[must_use]
    pub fn peek(&self, stack: &str) -> Option<&StackEntry> {
        self.stacks.get(stack)?.last()
    }

    /// Current depth of the named stack (0 for unknown stacks).
    #[must_use]
    pub fn depth(&self, stack: &str) -> usize {
        self.stacks.get(stack).map_or(0, Vec::len)
    }

    /// Whether `key` is anywhere in the named stack.
    #[must_use]
    pub fn contains(&self, stack: &str, key: &PanelKey) -> bool {
        self.stacks
            .get(stack)
            .is_some_and(|entries| entries.iter().any(|e| e.key == *key))
    }

    /// Entries of the named stack, bottom to top.
    pub fn entries(&self, stack: &str) -> impl Iterator<Item = &StackEntry> {
        self.stacks.get(stack).into_iter().flatten()
    }

    /// Remove `key` from every stack it appears in, returning how many
    /// entries were removed. Used when a panel closes out from under its
    /// stacks.
    pub fn remove_key(&mut self, key: &PanelKey) -> usize {
        let mut removed = 0;
        for entries in self.stacks.values_mut() {
            let before = entries.len();
            entries.retain(|e| e.key != *key);
            removed += before - entries.len();
        }
        removed
    }

    /// Drain the named stack, returning its entries bottom to top.
    pub fn clear(&mut self, stack: &str) -> Vec<StackEntry> {
        self.stacks.remove(stack).unwrap_or_default()
    }

    /// Names of all stacks that currently hold entries.
    #[must_use]
    pub fn stack_names(&self) -> Vec<&str> {
        self.stacks
            .iter()
            .filter(|(_, v)| !v.is_empty())
            .map(|(k, _)| k.as_str())
            .collect()
    }

    /// Whether every stack is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stacks.values().all(Vec::is_empty)
    }
}
