#![forbid(unsafe_code)]

//! Runtime: the panel service, navigation stacks, and async loading.
//!
//! # Role in PaneKit
//! `panekit-runtime` is the orchestration layer. It owns the
//! [`PanelService`] facade that ties together `panekit-core`'s cache and
//! lifecycle machinery with `panekit-anim`'s driver, and adds the pieces
//! only a running application needs: named navigation stacks, factory
//! registration, asynchronous loading with cancellation, and the frame
//! pump.
//!
//! # Primary responsibilities
//! - **PanelService**: open/show/hide/close sequencing with animation
//!   tails and heat-driven cache trimming.
//! - **StackManager**: named LIFO stacks with blur/focus/resume flow.
//! - **PanelRegistry / PanelLoader**: blueprint factories and the async
//!   loading seam.

pub mod loader;
pub mod pending;
pub mod process;
pub mod service;
pub mod stack;

pub use loader::{LoadError, PanelBlueprint, PanelLoader, PanelRegistry, PanelTransitions};
pub use pending::{CancelFlag, LoadDelivery, LoadSink, OpenTicket, PendingTable};
pub use service::{OpenError, PanelService, ServiceConfig};
pub use stack::{DEFAULT_STACK, PopResult, PushOutcome, StackEntry, StackManager};
