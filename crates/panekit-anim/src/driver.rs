#![forbid(unsafe_code)]

//! The animation driver: pooled storage plus a flattening scheduler.
//!
//! Live animations are stored in generational pools ([`Pool`]); callers
//! hold a move-only [`AnimHandle`] and hand it to [`AnimDriver::play`],
//! which flattens the composite tree into leaf schedules with start
//! offsets. One `tick` then advances every playing animation and reports
//! finished ones as [`AnimDone`] values instead of invoking callbacks,
//! so completion handling never re-enters the driver.
//!
//! # Invariants
//!
//! 1. Every played animation yields exactly one [`AnimDone`], whether it
//!    ran to completion or was stopped.
//! 2. A sequential child never produces a sample before its predecessors
//!    have consumed their full durations.
//! 3. A tick that spans a sequential boundary forwards the exact
//!    remainder into the next child; no time is lost at seams.
//!
//! # Failure Modes
//!
//! - A stale [`AnimId`] (slot since recycled) is ignored by `stop` and
//!   resolves to nothing; it can never address a different animation.

use std::time::Duration;

use crate::composite::{Composite, CompositeMode};
use crate::pool::{Pool, PoolId, PoolTicket};
use crate::tween::{AnimDecl, AnimSample, Tween};

// ---------------------------------------------------------------------------
// Handles and ids
// ---------------------------------------------------------------------------

/// Which pool an animation lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnimKind {
    Tween,
    Composite,
}

/// Move-only ownership of one driver-resident animation.
///
/// Obtained from [`AnimDriver::alloc`], [`AnimDriver::compose`], or
/// [`AnimDriver::instantiate`]; consumed by [`AnimDriver::play`] or
/// [`AnimDriver::recycle`].
#[derive(Debug)]
pub struct AnimHandle {
    kind: AnimKind,
    ticket: PoolTicket,
}

impl AnimHandle {
    /// The pool the animation lives in.
    #[must_use]
    pub fn kind(&self) -> AnimKind {
        self.kind
    }

    /// Copyable id for later `stop`/status queries.
    #[must_use]
    pub fn id(&self) -> AnimId {
        AnimId {
            kind: self.kind,
            slot: self.ticket.id(),
        }
    }
}

/// Copyable reference to a driver-resident animation.
///
/// Goes stale once the underlying slot is recycled; stale ids are safely
/// inert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AnimId {
    kind: AnimKind,
    slot: PoolId,
}

/// Why a playback ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimOutcome {
    /// Ran its full duration.
    Completed,
    /// Ended early by `stop` or `stop_by_tag`.
    Cancelled,
}

/// One finished playback, returned from [`AnimDriver::tick`] or `stop`.
///
/// Carries the root handle back to the caller, who decides whether to
/// replay or [`AnimDriver::recycle`] it.
#[derive(Debug)]
pub struct AnimDone {
    /// Root handle of the finished tree.
    pub handle: AnimHandle,
    /// Caller-supplied tag from `play`.
    pub tag: u64,
    /// Completed or cancelled.
    pub outcome: AnimOutcome,
}

// ---------------------------------------------------------------------------
// Playback bookkeeping
// ---------------------------------------------------------------------------

struct LeafRun {
    tween: PoolId,
    offset: Duration,
    done: bool,
}

struct Playback {
    root: AnimHandle,
    tag: u64,
    elapsed: Duration,
    duration: Duration,
    leaves: Vec<LeafRun>,
}

// ---------------------------------------------------------------------------
// Driver
// ---------------------------------------------------------------------------

/// Pooled animation storage and scheduler.
#[derive(Default)]
pub struct AnimDriver {
    tweens: Pool<Tween>,
    composites: Pool<Composite>,
    playing: Vec<Playback>,
}

impl AnimDriver {
    /// Create an empty driver.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a tween, returning ownership of it.
    pub fn alloc(&mut self, tween: Tween) -> AnimHandle {
        AnimHandle {
            kind: AnimKind::Tween,
            ticket: self.tweens.alloc(tween),
        }
    }

    /// Group existing animations under one composite, taking ownership
    /// of the children.
    pub fn compose(&mut self, mode: CompositeMode, children: Vec<AnimHandle>) -> AnimHandle {
        AnimHandle {
            kind: AnimKind::Composite,
            ticket: self.composites.alloc(Composite::new(mode, children)),
        }
    }

    /// Instantiate a declarative recipe into live pooled animations.
    pub fn instantiate(&mut self, decl: &AnimDecl) -> AnimHandle {
        match decl {
            AnimDecl::Parallel(children) => {
                let built = children.iter().map(|c| self.instantiate(c)).collect();
                self.compose(CompositeMode::Parallel, built)
            }
            AnimDecl::Sequential(children) => {
                let built = children.iter().map(|c| self.instantiate(c)).collect();
                self.compose(CompositeMode::Sequential, built)
            }
            leaf => match leaf.leaf_tween() {
                Some(tween) => self.alloc(tween),
                // Unreachable: composites are matched above.
                None => self.compose(CompositeMode::Parallel, Vec::new()),
            },
        }
    }

    /// Total duration of an animation tree: leaves their own, parallel
    /// the maximum child, sequential the sum.
    #[must_use]
    pub fn duration_of(&self, id: AnimId) -> Duration {
        match id.kind {
            AnimKind::Tween => self
                .tweens
                .get(id.slot)
                .map(Tween::duration)
                .unwrap_or(Duration::ZERO),
            AnimKind::Composite => {
                let Some(composite) = self.composites.get(id.slot) else {
                    return Duration::ZERO;
                };
                let children = composite.children().iter().map(|c| self.duration_of(c.id()));
                match composite.mode() {
                    CompositeMode::Parallel => children.max().unwrap_or(Duration::ZERO),
                    CompositeMode::Sequential => children.sum(),
                }
            }
        }
    }

    fn flatten(&self, id: AnimId, offset: Duration, out: &mut Vec<LeafRun>) {
        match id.kind {
            AnimKind::Tween => out.push(LeafRun {
                tween: id.slot,
                offset,
                done: false,
            }),
            AnimKind::Composite => {
                let Some(composite) = self.composites.get(id.slot) else {
                    return;
                };
                match composite.mode() {
                    CompositeMode::Parallel => {
                        for child in composite.children() {
                            self.flatten(child.id(), offset, out);
                        }
                    }
                    CompositeMode::Sequential => {
                        let mut cursor = offset;
                        for child in composite.children() {
                            self.flatten(child.id(), cursor, out);
                            cursor += self.duration_of(child.id());
                        }
                    }
                }
            }
        }
    }

    /// Start `handle` playing under a caller-chosen `tag`, taking
    /// ownership until it finishes. Returns the id for `stop`.
    ///
    /// All leaves are rewound first, so replaying a returned handle
    /// starts from scratch.
    pub fn play(&mut self, handle: AnimHandle, tag: u64) -> AnimId {
        let id = handle.id();
        let duration = self.duration_of(id);
        let mut leaves = Vec::new();
        self.flatten(id, Duration::ZERO, &mut leaves);
        for leaf in &leaves {
            if let Some(tween) = self.tweens.get_mut(leaf.tween) {
                tween.reset();
            }
        }
        tracing::trace!(?id, tag, ?duration, leaves = leaves.len(), "animation started");
        self.playing.push(Playback {
            root: handle,
            tag,
            elapsed: Duration::ZERO,
            duration,
            leaves,
        });
        id
    }

    /// Advance every playing animation by `dt`.
    ///
    /// `apply` receives `(tag, sample)` for each active leaf each tick;
    /// the same property from later sequential children supersedes
    /// earlier ones because leaves are applied in schedule order.
    /// Finished playbacks are removed and returned.
    pub fn tick(
        &mut self,
        dt: Duration,
        mut apply: impl FnMut(u64, AnimSample),
    ) -> Vec<AnimDone> {
        let Self {
            tweens, playing, ..
        } = self;

        for playback in playing.iter_mut() {
            let prev = playback.elapsed;
            playback.elapsed = (prev + dt).min(playback.duration);
            for leaf in &mut playback.leaves {
                if leaf.done || playback.elapsed < leaf.offset {
                    continue;
                }
                let Some(tween) = tweens.get_mut(leaf.tween) else {
                    leaf.done = true;
                    continue;
                };
                let prev_local = prev.saturating_sub(leaf.offset);
                let new_local = playback.elapsed - leaf.offset;
                tween.tick(new_local - prev_local);
                apply(playback.tag, tween.sample());
                if tween.is_complete() {
                    leaf.done = true;
                }
            }
        }

        let mut finished = Vec::new();
        let mut i = 0;
        while i < self.playing.len() {
            if self.playing[i].elapsed >= self.playing[i].duration {
                let playback = self.playing.swap_remove(i);
                tracing::trace!(tag = playback.tag, "animation completed");
                finished.push(AnimDone {
                    handle: playback.root,
                    tag: playback.tag,
                    outcome: AnimOutcome::Completed,
                });
            } else {
                i += 1;
            }
        }
        finished
    }

    /// Stop one playing animation, returning it with a `Cancelled`
    /// outcome. Stale or unknown ids return `None`.
    pub fn stop(&mut self, id: AnimId) -> Option<AnimDone> {
        let pos = self.playing.iter().position(|p| p.root.id() == id)?;
        let playback = self.playing.swap_remove(pos);
        tracing::trace!(tag = playback.tag, "animation cancelled");
        Some(AnimDone {
            handle: playback.root,
            tag: playback.tag,
            outcome: AnimOutcome::Cancelled,
        })
    }

    /// Stop every playback carrying `tag`.
    pub fn stop_by_tag(&mut self, tag: u64) -> Vec<AnimDone> {
        let mut stopped = Vec::new();
        let mut i = 0;
        while i < self.playing.len() {
            if self.playing[i].tag == tag {
                let playback = self.playing.swap_remove(i);
                stopped.push(AnimDone {
                    handle: playback.root,
                    tag: playback.tag,
                    outcome: AnimOutcome::Cancelled,
                });
            } else {
                i += 1;
            }
        }
        stopped
    }

    /// Whether `id` is a currently playing root.
    #[must_use]
    pub fn is_playing(&self, id: AnimId) -> bool {
        self.playing.iter().any(|p| p.root.id() == id)
    }

    /// Number of playing roots.
    #[must_use]
    pub fn playing_count(&self) -> usize {
        self.playing.len()
    }

    /// Visit every leaf's progress-0 sample in schedule order.
    pub fn start_samples(&self, id: AnimId, mut visit: impl FnMut(AnimSample)) {
        let mut leaves = Vec::new();
        self.flatten(id, Duration::ZERO, &mut leaves);
        for leaf in leaves {
            if let Some(tween) = self.tweens.get(leaf.tween) {
                visit(tween.start_sample());
            }
        }
    }

    /// Visit every leaf's progress-1 sample in schedule order.
    ///
    /// Used to snap a target to its settled state when a playback is
    /// cancelled.
    pub fn end_samples(&self, id: AnimId, mut visit: impl FnMut(AnimSample)) {
        let mut leaves = Vec::new();
        self.flatten(id, Duration::ZERO, &mut leaves);
        for leaf in leaves {
            if let Some(tween) = self.tweens.get(leaf.tween) {
                visit(tween.end_sample());
            }
        }
    }

    /// Return an animation tree to the pools, children included.
    pub fn recycle(&mut self, handle: AnimHandle) {
        match handle.kind {
            AnimKind::Tween => {
                self.tweens.recycle(handle.ticket);
            }
            AnimKind::Composite => {
                if let Some(composite) = self.composites.recycle(handle.ticket) {
                    for child in composite.into_children() {
                        self.recycle(child);
                    }
                }
            }
        }
    }

    /// Live slots across both pools, for diagnostics.
    #[must_use]
    pub fn live(&self) -> usize {
        self.tweens.live() + self.composites.live()
    }
}

impl std::fmt::Debug for AnimDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnimDriver")
            .field("tweens", &self.tweens)
            .field("composites", &self.composites)
            .field("playing", &self.playing.len())
            .finish()
    }
}
