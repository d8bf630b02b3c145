#![forbid(unsafe_code)]

//! Animation layer: easing curves, property tweens, and a pooled driver.
//!
//! # Role in PaneKit
//! `panekit-anim` animates panel views without knowing what a panel is.
//! Callers allocate tweens (or instantiate [`AnimDecl`] recipes) into the
//! [`AnimDriver`], play them under a tag, and pump the driver from their
//! frame loop; samples flow out through a closure and completions come
//! back as plain [`AnimDone`] values.
//!
//! # Primary responsibilities
//! - **Tween**: time-bounded interpolation of opacity, scale, or offset.
//! - **Composite**: parallel and sequential grouping with exact
//!   boundary handoff.
//! - **AnimDriver**: generational pools plus the flattening scheduler.

pub mod composite;
pub mod driver;
pub mod easing;
pub mod pool;
pub mod tween;

pub use composite::{Composite, CompositeMode};
pub use driver::{AnimDone, AnimDriver, AnimHandle, AnimId, AnimKind, AnimOutcome};
pub use easing::Easing;
pub use pool::{Pool, PoolId, PoolTicket};
pub use tween::{AnimDecl, AnimSample, Tween};
