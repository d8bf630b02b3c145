#![forbid(unsafe_code)]

//! Core: panel identity, lifecycle state, the two-pool cache, and heat
//! tracking.
//!
//! # Role in PaneKit
//! `panekit-core` is the foundation layer. It defines what a panel *is*
//! (key, level, cache mode, lifecycle state, hook set) and how instances
//! are retained (Opened/Preload pools, heat-driven trimming). It knows
//! nothing about animation or navigation stacks.
//!
//! # Primary responsibilities
//! - **PanelInstance**: one cached panel with its view, payload, and
//!   lifecycle hook set.
//! - **PanelCache**: two-pool cache with LRU-evicted, capacity-bounded
//!   preloads.
//! - **HeatTracker**: per-panel usage heat with periodic decay, feeding
//!   cache trimming.
//!
//! # How it fits in the system
//! The runtime (`panekit-runtime`) opens, shows, and stacks panels built
//! from these types; the animation layer (`panekit-anim`) drives their
//! views through [`view::PanelView`] without knowing the rest.

pub mod cache;
pub mod heat;
pub mod lifecycle;
pub mod types;
pub mod view;

pub use cache::{CacheStats, PanelCache, PreloadOutcome, DEFAULT_PRELOAD_CAPACITY};
pub use heat::{HeatConfig, HeatStats, HeatTracker};
pub use lifecycle::{
    Hook, HookCtx, HookError, HookFn, HookSet, PanelInstance, PanelRef, PanelState,
};
pub use types::{CacheMode, DrawOrder, PanelKey, PanelLevel};
pub use view::{NullView, PanelData, PanelView};
