#![forbid(unsafe_code)]

//! PaneKit public facade crate.
//!
//! This crate provides the stable, ergonomic surface area for users. It
//! re-exports common types from the internal crates and offers a
//! lightweight prelude for day-to-day usage.
//!
//! ```
//! use panekit::prelude::*;
//!
//! let mut registry = PanelRegistry::new();
//! registry.register("greeter", |_| Ok(PanelBlueprint::new()));
//!
//! let mut service = PanelService::new(registry);
//! service.open("greeter", None).unwrap();
//! assert_eq!(
//!     service.state_of(&PanelKey::new("greeter")),
//!     Some(PanelState::Shown)
//! );
//! ```

// --- Core re-exports -------------------------------------------------------

pub use panekit_core::{
    CacheMode, CacheStats, DrawOrder, HeatConfig, HeatStats, HeatTracker, Hook, HookCtx,
    HookError, HookFn, HookSet, PanelCache, PanelInstance, PanelKey, PanelLevel, PanelRef,
    PanelState, PreloadOutcome,
};
pub use panekit_core::view::{NullView, PanelData, PanelView};

// --- Animation re-exports --------------------------------------------------

pub use panekit_anim::{
    AnimDecl, AnimDone, AnimDriver, AnimId, AnimOutcome, AnimSample, CompositeMode, Easing, Tween,
};

// --- Runtime re-exports ----------------------------------------------------

pub use panekit_runtime::{
    DEFAULT_STACK, LoadError, OpenError, OpenTicket, PanelBlueprint, PanelLoader, PanelRegistry,
    PanelService, PushOutcome, ServiceConfig, StackManager, process,
};

// --- Prelude --------------------------------------------------------------

pub mod prelude {
    pub use crate::{
        AnimDecl, CacheMode, Easing, Hook, HookCtx, HookError, HookSet, OpenError, PanelBlueprint,
        PanelData, PanelKey, PanelLevel, PanelRegistry, PanelService, PanelState, PanelView,
        PushOutcome, ServiceConfig,
    };

    pub use crate::{anim, core, runtime};
}

pub use panekit_anim as anim;
pub use panekit_core as core;
pub use panekit_runtime as runtime;
