#![forbid(unsafe_code)]

//! Composite nodes: parallel and sequential grouping of driver-owned
//! animations.
//!
//! A [`Composite`] owns its children as move-only handles, so a child can
//! belong to exactly one parent and recycling the parent can reclaim the
//! whole tree without reference counting.

use crate::driver::AnimHandle;

/// How a composite schedules its children.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompositeMode {
    /// All children start together; the composite finishes with the
    /// longest child.
    Parallel,
    /// Each child starts when the previous one finishes.
    Sequential,
}

/// A group of driver-owned animations played as one unit.
#[derive(Debug)]
pub struct Composite {
    mode: CompositeMode,
    children: Vec<AnimHandle>,
}

impl Composite {
    /// Build a composite taking ownership of `children`.
    #[must_use]
    pub fn new(mode: CompositeMode, children: Vec<AnimHandle>) -> Self {
        Self { mode, children }
    }

    /// The scheduling mode.
    #[must_use]
    pub fn mode(&self) -> CompositeMode {
        self.mode
    }

    /// Borrow the child handles in schedule order.
    #[must_use]
    pub fn children(&self) -> &[AnimHandle] {
        &self.children
    }

    /// Tear down into the owned child handles.
    #[must_use]
    pub fn into_children(self) -> Vec<AnimHandle> {
        self.children
    }
}
