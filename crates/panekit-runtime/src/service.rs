#![forbid(unsafe_code)]

//! The panel service: one facade tying cache, heat, stacks, loading, and
//! animation together.
//!
//! All sequencing lives here. Structural changes (cache membership,
//! stack depth) happen immediately inside each operation; the visual
//! tail of a transition (the `Show`/`DidShow` or `Hide`/`DidHide` hook
//! pair) is deferred until the bound animation finishes in [`PanelService::tick`].
//! Cancelling an animation snaps the view to its settled state and runs
//! the same tail exactly once, so hook pairs never go missing and never
//! double-fire.
//!
//! # Invariants
//!
//! 1. Per panel, at most one transition animation is active; starting a
//!    new one settles the old one first.
//! 2. A panel's `Init` hook runs at most once across its whole cached
//!    life, regardless of how many times it is reopened.
//! 3. Heat decays on a fixed cadence driven by accumulated tick time,
//!    never by wall-clock reads inside the service.
//!
//! # Failure Modes
//!
//! - A failed load surfaces as [`OpenError`] on the synchronous path and
//!   as a logged warning on the async path; the service state is
//!   untouched either way.

use std::fmt;
use std::time::Duration;

use ahash::AHashMap;
use web_time::Instant;

use panekit_anim::{AnimDecl, AnimDone, AnimDriver, AnimId, AnimOutcome, AnimSample};
use panekit_core::view::{PanelData, PanelView};
use panekit_core::{
    CacheMode, CacheStats, DrawOrder, HeatConfig, HeatStats, HeatTracker, Hook, PanelCache,
    PanelKey, PanelLevel, PanelRef, PanelState, PreloadOutcome,
};

use crate::loader::{LoadError, PanelLoader, PanelTransitions};
use crate::pending::{OpenTicket, PendingTable};
use crate::stack::{PushOutcome, StackManager};

// ---------------------------------------------------------------------------
// Errors and config
// ---------------------------------------------------------------------------

/// Why an open could not complete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpenError {
    /// No panel type is registered under the key.
    NotFound(PanelKey),
    /// The panel's factory failed.
    LoadFailed {
        /// The panel that failed.
        key: PanelKey,
        /// Factory-supplied reason.
        reason: String,
    },
}

impl fmt::Display for OpenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound(key) => write!(f, "no panel registered for key `{key}`"),
            Self::LoadFailed { key, reason } => {
                write!(f, "opening panel `{key}` failed: {reason}")
            }
        }
    }
}

impl std::error::Error for OpenError {}

impl From<LoadError> for OpenError {
    fn from(err: LoadError) -> Self {
        match err {
            LoadError::NotFound(key) => Self::NotFound(key),
            LoadError::Failed { key, reason } => Self::LoadFailed { key, reason },
        }
    }
}

/// Tunables for a [`PanelService`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceConfig {
    /// Preload pool capacity.
    pub preload_capacity: usize,
    /// Heat weights and ceiling.
    pub heat: HeatConfig,
    /// How much accumulated tick time triggers one heat decay step.
    pub heat_interval: Duration,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            preload_capacity: panekit_core::DEFAULT_PRELOAD_CAPACITY,
            heat: HeatConfig::default(),
            heat_interval: Duration::from_secs(1),
        }
    }
}

impl ServiceConfig {
    /// Set the preload pool capacity.
    #[must_use]
    pub fn preload_capacity(mut self, capacity: usize) -> Self {
        self.preload_capacity = capacity;
        self
    }

    /// Set the heat weights and ceiling.
    #[must_use]
    pub fn heat(mut self, heat: HeatConfig) -> Self {
        self.heat = heat;
        self
    }

    /// Set the heat decay cadence.
    #[must_use]
    pub fn heat_interval(mut self, interval: Duration) -> Self {
        self.heat_interval = interval;
        self
    }
}

// ---------------------------------------------------------------------------
// Animation bindings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AnimPhase {
    Show,
    Hide { closing: bool },
}

struct AnimBinding {
    key: PanelKey,
    phase: AnimPhase,
}

fn apply_sample(view: &mut dyn PanelView, sample: AnimSample) {
    match sample {
        AnimSample::Opacity(v) => view.set_opacity(v),
        AnimSample::Scale(v) => view.set_scale(v),
        AnimSample::Offset { x, y } => view.set_offset(x, y),
    }
}

// ---------------------------------------------------------------------------
// Service
// ---------------------------------------------------------------------------

/// The panel lifecycle service.
pub struct PanelService {
    cache: PanelCache,
    heat: HeatTracker,
    stacks: StackManager,
    driver: AnimDriver,
    loader: Box<dyn PanelLoader>,
    pending: PendingTable,
    transitions: AHashMap<PanelKey, PanelTransitions>,
    bindings: AHashMap<u64, AnimBinding>,
    active_anim: AHashMap<PanelKey, AnimId>,
    next_tag: u64,
    next_seq: u64,
    heat_accum: Duration,
    heat_interval: Duration,
    last_pump: Option<Instant>,
}

impl PanelService {
    /// Service with default tunables over the given loader.
    #[must_use]
    pub fn new(loader: impl PanelLoader + 'static) -> Self {
        Self::with_config(loader, ServiceConfig::default())
    }

    /// Service with explicit tunables.
    #[must_use]
    pub fn with_config(loader: impl PanelLoader + 'static, config: ServiceConfig) -> Self {
        Self {
            cache: PanelCache::new(config.preload_capacity),
            heat: HeatTracker::new(config.heat),
            stacks: StackManager::new(),
            driver: AnimDriver::new(),
            loader: Box::new(loader),
            pending: PendingTable::new(),
            transitions: AHashMap::new(),
            bindings: AHashMap::new(),
            active_anim: AHashMap::new(),
            next_tag: 0,
            next_seq: 0,
            heat_accum: Duration::ZERO,
            heat_interval: config.heat_interval,
            last_pump: None,
        }
    }

    // -- opening ------------------------------------------------------------

    /// Open a panel: load (or reuse the cached instance), run the init
    /// and open hooks, and start the show sequence.
    ///
    /// Opening an already-shown panel refreshes its payload and re-fires
    /// `Open` without replaying the show sequence. Opening a panel whose
    /// hide or close transition is still in flight settles that
    /// transition first.
    pub fn open(
        &mut self,
        key: impl Into<PanelKey>,
        data: Option<Box<dyn PanelData>>,
    ) -> Result<PanelRef, OpenError> {
        let key = key.into();
        self.open_ref(&key, data)
    }

    /// [`PanelService::open`] with an explicit display level overriding
    /// the blueprint's.
    pub fn open_at(
        &mut self,
        key: impl Into<PanelKey>,
        level: PanelLevel,
        sub_level: u16,
        data: Option<Box<dyn PanelData>>,
    ) -> Result<PanelRef, OpenError> {
        let key = key.into();
        let panel = self.open_ref(&key, data)?;
        panel.borrow_mut().set_level(level, sub_level);
        Ok(panel)
    }

    fn open_ref(
        &mut self,
        key: &PanelKey,
        data: Option<Box<dyn PanelData>>,
    ) -> Result<PanelRef, OpenError> {
        // An in-flight hide settles before the state is read, so a
        // closing panel finishes closing (and a Temporary instance is
        // rebuilt fresh) before the open sequence starts.
        if self.hide_in_flight(key) {
            self.settle_active_anim(key);
        }
        let panel = self.load_into_cache(key)?;
        let state = panel.borrow().state();
        if state == PanelState::Shown {
            {
                let mut p = panel.borrow_mut();
                if data.is_some() {
                    p.set_data(data);
                }
                p.fire(Hook::Open);
            }
            self.heat.register_open(key);
        } else {
            self.begin_open(&panel, data);
        }
        Ok(panel)
    }

    fn load_into_cache(&mut self, key: &PanelKey) -> Result<PanelRef, LoadError> {
        let Self {
            cache,
            loader,
            transitions,
            ..
        } = self;
        cache.get_or_create(key, || {
            let blueprint = loader.load(key)?;
            let (instance, trans) = blueprint.instantiate(key.clone());
            transitions.insert(key.clone(), trans);
            Ok(instance.into_ref())
        })
    }

    fn begin_open(&mut self, panel: &PanelRef, data: Option<Box<dyn PanelData>>) {
        let key = panel.borrow().key().clone();
        {
            let mut p = panel.borrow_mut();
            p.set_data(data);
            p.set_seq(self.next_seq);
            p.ensure_initialized();
            p.fire(Hook::Open);
        }
        self.next_seq += 1;
        self.heat.register_open(&key);
        tracing::debug!(panel = %key, "panel opened");
        self.begin_show(panel);
    }

    // -- show / hide / close ------------------------------------------------

    /// Make a cached panel visible, playing its show transition.
    /// Returns `false` for uncached keys and already-shown panels. A
    /// panel whose hide animation is still in flight counts as hidden:
    /// the hide settles first and the show replays from there.
    pub fn show(&mut self, key: &PanelKey) -> bool {
        let Some(panel) = self.cache.peek(key).cloned() else {
            return false;
        };
        if panel.borrow().state() == PanelState::Shown && !self.hide_in_flight(key) {
            return false;
        }
        self.begin_show(&panel);
        true
    }

    fn hide_in_flight(&self, key: &PanelKey) -> bool {
        self.active_anim.contains_key(key)
            && self
                .bindings
                .values()
                .any(|b| b.key == *key && matches!(b.phase, AnimPhase::Hide { .. }))
    }

    fn begin_show(&mut self, panel: &PanelRef) {
        let key = panel.borrow().key().clone();
        self.settle_active_anim(&key);
        {
            let mut p = panel.borrow_mut();
            p.fire(Hook::WillShow);
            p.set_state(PanelState::Shown);
        }
        match self.transitions.get(&key).and_then(|t| t.show.clone()) {
            Some(decl) => self.start_anim(key, &decl, AnimPhase::Show),
            None => panel.borrow_mut().fire_all(&[Hook::Show, Hook::DidShow]),
        }
    }

    /// Hide a shown panel, playing its hide transition. The instance
    /// stays cached. Returns `false` unless the panel is shown.
    pub fn hide(&mut self, key: &PanelKey) -> bool {
        let Some(panel) = self.cache.peek(key).cloned() else {
            return false;
        };
        if panel.borrow().state() != PanelState::Shown {
            return false;
        }
        self.begin_hide(&panel, false);
        true
    }

    fn begin_hide(&mut self, panel: &PanelRef, closing: bool) {
        let key = panel.borrow().key().clone();
        self.settle_active_anim(&key);
        {
            let mut p = panel.borrow_mut();
            p.fire(Hook::WillHide);
            if closing {
                p.set_state(PanelState::Closing);
            }
        }
        match self.transitions.get(&key).and_then(|t| t.hide.clone()) {
            Some(decl) => self.start_anim(key, &decl, AnimPhase::Hide { closing }),
            None => self.finish_hide(&key, closing),
        }
    }

    fn finish_hide(&mut self, key: &PanelKey, closing: bool) {
        let Some(panel) = self.cache.peek(key).cloned() else {
            return;
        };
        let temporary = {
            let mut p = panel.borrow_mut();
            p.fire_all(&[Hook::Hide, Hook::DidHide]);
            if closing {
                p.fire(Hook::Close);
                p.set_state(PanelState::Closed);
            } else {
                p.set_state(PanelState::Hidden);
            }
            closing && p.mode() == CacheMode::Temporary
        };
        if closing {
            self.stacks.remove_key(key);
            tracing::debug!(panel = %key, temporary, "panel closed");
            if temporary {
                self.cache.remove(key);
                self.heat.remove(key);
                self.transitions.remove(key);
            } else {
                // The panel may have cooled to zero while it was still
                // shown; that crossing was already reported, so re-check
                // now that it is closed.
                self.trim_cooled(key);
            }
        }
    }

    /// Close a panel: hide transition if shown, then the close hook.
    /// `Temporary` instances leave the cache; `Hot` instances stay
    /// `Closed` for reuse while they hold heat and are dropped at once
    /// if already cold. Returns `false` for uncached or already-closed
    /// panels.
    pub fn close(&mut self, key: &PanelKey) -> bool {
        let Some(panel) = self.cache.peek(key).cloned() else {
            return false;
        };
        let state = panel.borrow().state();
        match state {
            PanelState::Shown => {
                self.begin_hide(&panel, true);
                true
            }
            PanelState::Hidden => {
                self.settle_active_anim(key);
                let temporary = {
                    let mut p = panel.borrow_mut();
                    p.fire(Hook::Close);
                    p.set_state(PanelState::Closed);
                    p.mode() == CacheMode::Temporary
                };
                self.stacks.remove_key(key);
                if temporary {
                    self.cache.remove(key);
                    self.heat.remove(key);
                    self.transitions.remove(key);
                } else {
                    self.trim_cooled(key);
                }
                true
            }
            // Already on its way out.
            PanelState::Closing => true,
            _ => false,
        }
    }

    /// Close every opened panel.
    pub fn close_all(&mut self) {
        let opened: Vec<PanelKey> = self
            .cache
            .instances()
            .filter(|p| {
                let state = p.borrow().state();
                state.is_opened() || state == PanelState::Closing
            })
            .map(|p| p.borrow().key().clone())
            .collect();
        for key in opened {
            self.close(&key);
        }
    }

    // -- queries ------------------------------------------------------------

    /// Fetch a cached instance, registering a heat query.
    pub fn get(&mut self, key: &PanelKey) -> Option<PanelRef> {
        let panel = self.cache.get(key)?;
        self.heat.register_query(key);
        Some(panel)
    }

    /// Whether `key` is cached in either pool.
    #[must_use]
    pub fn is_cached(&self, key: &PanelKey) -> bool {
        self.cache.contains(key)
    }

    /// Lifecycle state of a cached panel.
    #[must_use]
    pub fn state_of(&self, key: &PanelKey) -> Option<PanelState> {
        self.cache.peek(key).map(|p| p.borrow().state())
    }

    /// Draw order of a cached panel.
    #[must_use]
    pub fn draw_order(&self, key: &PanelKey) -> Option<DrawOrder> {
        self.cache.peek(key).map(|p| p.borrow().draw_order())
    }

    /// Reassign a cached panel's display level.
    pub fn set_level(&mut self, key: &PanelKey, level: PanelLevel, sub_level: u16) -> bool {
        match self.cache.peek(key) {
            Some(panel) => {
                panel.borrow_mut().set_level(level, sub_level);
                true
            }
            None => false,
        }
    }

    /// All shown panels in back-to-front draw order.
    #[must_use]
    pub fn visible(&self) -> Vec<PanelRef> {
        let mut panels: Vec<PanelRef> = self
            .cache
            .instances()
            .filter(|p| p.borrow().state() == PanelState::Shown)
            .cloned()
            .collect();
        panels.sort_by_key(|p| p.borrow().draw_order());
        panels
    }

    /// Whether a transition animation is running for `key`.
    #[must_use]
    pub fn is_animating(&self, key: &PanelKey) -> bool {
        self.active_anim.contains_key(key)
    }

    // -- stacks -------------------------------------------------------------

    /// Open a panel and push it onto the named stack.
    ///
    /// The covered top gets `Blur` (and the hide sequence when
    /// `hide_previous`); the new top gets `Focus`. Pushing a key already
    /// in the stack is a reported no-op.
    pub fn push(
        &mut self,
        stack: &str,
        key: impl Into<PanelKey>,
        data: Option<Box<dyn PanelData>>,
        hide_previous: bool,
    ) -> Result<PushOutcome, OpenError> {
        let key = key.into();
        if self.stacks.contains(stack, &key) {
            return Ok(PushOutcome::Duplicate);
        }
        let panel = self.open_ref(&key, data)?;
        Ok(self.finish_push(stack, key, panel, hide_previous))
    }

    fn finish_push(
        &mut self,
        stack: &str,
        key: PanelKey,
        panel: PanelRef,
        hide_previous: bool,
    ) -> PushOutcome {
        let outcome = self.stacks.push(stack, key, panel.clone(), hide_previous);
        if let PushOutcome::Pushed { covered } = &outcome {
            if let Some(covered) = covered.clone() {
                if let Some(prev) = self.cache.peek(&covered).cloned() {
                    prev.borrow_mut().fire(Hook::Blur);
                }
                if hide_previous {
                    self.hide(&covered);
                }
            }
            panel.borrow_mut().fire(Hook::Focus);
        }
        outcome
    }

    /// Pop the top of the named stack, closing the popped panel and
    /// re-showing the revealed one when the popped push had hidden it.
    /// Returns the popped key.
    pub fn pop(&mut self, stack: &str) -> Option<PanelKey> {
        let reveal = self.stacks.peek(stack).is_some_and(|e| e.hid_previous);
        self.pop_with(stack, reveal, true)
    }

    /// Pop with an explicit reveal and close policy. With `auto_close`
    /// false the popped panel is hidden but stays cached and can be
    /// pushed again without rebuilding.
    pub fn pop_with(
        &mut self,
        stack: &str,
        show_previous: bool,
        auto_close: bool,
    ) -> Option<PanelKey> {
        let result = self.stacks.pop(stack)?;
        let popped = result.popped.key.clone();
        result.popped.panel.borrow_mut().fire(Hook::Blur);
        if auto_close {
            self.close(&popped);
        } else {
            self.hide(&popped);
        }
        if let Some(revealed) = result.revealed {
            if let Some(panel) = self.cache.peek(&revealed).cloned() {
                if show_previous {
                    self.show(&revealed);
                }
                panel.borrow_mut().fire_all(&[Hook::Resume, Hook::Focus]);
            }
        }
        Some(popped)
    }

    /// Key on top of the named stack.
    #[must_use]
    pub fn peek(&self, stack: &str) -> Option<PanelKey> {
        self.stacks.peek(stack).map(|e| e.key.clone())
    }

    /// Depth of the named stack.
    #[must_use]
    pub fn depth(&self, stack: &str) -> usize {
        self.stacks.depth(stack)
    }

    /// Empty the named stack, top first. With `close_panels` the members
    /// are closed; otherwise they are hidden but stay cached.
    pub fn clear_stack(&mut self, stack: &str, close_panels: bool) {
        let entries = self.stacks.clear(stack);
        for entry in entries.into_iter().rev() {
            entry.panel.borrow_mut().fire(Hook::Blur);
            if close_panels {
                self.close(&entry.key);
            } else {
                self.hide(&entry.key);
            }
        }
    }

    /// Names of stacks that currently hold panels.
    #[must_use]
    pub fn stack_names(&self) -> Vec<String> {
        self.stacks
            .stack_names()
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    // -- async loading ------------------------------------------------------

    /// Start an asynchronous open. The panel opens during a later
    /// [`PanelService::tick`] once its load is delivered.
    pub fn open_async(
        &mut self,
        key: impl Into<PanelKey>,
        data: Option<Box<dyn PanelData>>,
    ) -> OpenTicket {
        self.begin_async(key.into(), false, None, false, data)
    }

    /// Start an asynchronous open that pushes onto `stack` on arrival.
    pub fn push_async(
        &mut self,
        stack: &str,
        key: impl Into<PanelKey>,
        data: Option<Box<dyn PanelData>>,
        hide_previous: bool,
    ) -> OpenTicket {
        self.begin_async(key.into(), false, Some(stack.to_string()), hide_previous, data)
    }

    /// Build a panel into the preload pool without opening it.
    pub fn preload(&mut self, key: impl Into<PanelKey>) -> Result<PreloadOutcome, OpenError> {
        let key = key.into();
        let blueprint = self.loader.load(&key)?;
        let (instance, trans) = blueprint.instantiate(key.clone());
        self.transitions.insert(key.clone(), trans);
        Ok(self.cache.insert_preloaded(key, instance.into_ref()))
    }

    /// Asynchronous [`PanelService::preload`].
    pub fn preload_async(&mut self, key: impl Into<PanelKey>) -> OpenTicket {
        self.begin_async(key.into(), true, None, false, None)
    }

    fn begin_async(
        &mut self,
        key: PanelKey,
        preload: bool,
        stack: Option<String>,
        hide_previous: bool,
        data: Option<Box<dyn PanelData>>,
    ) -> OpenTicket {
        let (ticket, cancel) = self
            .pending
            .begin(key.clone(), preload, stack, hide_previous, data);
        let sink = self.pending.sink();
        self.loader.load_async(&key, ticket, sink, cancel);
        ticket
    }

    /// Cancel an in-flight open or preload. Returns `false` if the
    /// ticket already resolved.
    pub fn cancel_open(&mut self, ticket: OpenTicket) -> bool {
        self.pending.cancel(ticket)
    }

    /// Loads still in flight.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.pending.in_flight()
    }

    fn drain_loads(&mut self) {
        for (entry, result) in self.pending.drain() {
            let blueprint = match result {
                Ok(blueprint) => blueprint,
                Err(err) => {
                    tracing::warn!(panel = %entry.key, error = %err, "async load failed");
                    continue;
                }
            };
            if entry.preload {
                let (instance, trans) = blueprint.instantiate(entry.key.clone());
                self.transitions.insert(entry.key.clone(), trans);
                let outcome = self.cache.insert_preloaded(entry.key.clone(), instance.into_ref());
                tracing::debug!(panel = %entry.key, ?outcome, "preload delivered");
                continue;
            }
            if self.hide_in_flight(&entry.key) {
                self.settle_active_anim(&entry.key);
            }
            let panel = {
                let Self {
                    cache, transitions, ..
                } = self;
                let key = entry.key.clone();
                cache
                    .get_or_create(&entry.key, move || {
                        let (instance, trans) = blueprint.instantiate(key.clone());
                        transitions.insert(key, trans);
                        Ok::<_, std::convert::Infallible>(instance.into_ref())
                    })
                    .unwrap_or_else(|e| match e {})
            };
            // Same contract as the synchronous path: landing on a shown
            // panel refreshes the payload and re-fires `Open` without
            // replaying the show sequence.
            if panel.borrow().state() == PanelState::Shown {
                {
                    let mut p = panel.borrow_mut();
                    if entry.data.is_some() {
                        p.set_data(entry.data);
                    }
                    p.fire(Hook::Open);
                }
                self.heat.register_open(&entry.key);
            } else {
                self.begin_open(&panel, entry.data);
            }
            if let Some(stack) = entry.stack {
                if !self.stacks.contains(&stack, &entry.key) {
                    self.finish_push(&stack, entry.key, panel, entry.hide_previous);
                }
            }
        }
    }

    // -- animations ---------------------------------------------------------

    fn start_anim(&mut self, key: PanelKey, decl: &AnimDecl, phase: AnimPhase) {
        let handle = self.driver.instantiate(decl);
        let tag = self.next_tag;
        self.next_tag += 1;
        self.bindings.insert(
            tag,
            AnimBinding {
                key: key.clone(),
                phase,
            },
        );
        let id = self.driver.play(handle, tag);
        self.active_anim.insert(key, id);
    }

    /// Stop the active transition for `key`, snapping the view to its
    /// settled state and running the deferred hook tail immediately.
    fn settle_active_anim(&mut self, key: &PanelKey) {
        if let Some(id) = self.active_anim.remove(key) {
            if let Some(done) = self.driver.stop(id) {
                self.settle(done);
            }
        }
    }

    fn settle(&mut self, done: AnimDone) {
        let Some(binding) = self.bindings.remove(&done.tag) else {
            self.driver.recycle(done.handle);
            return;
        };
        self.active_anim.remove(&binding.key);
        if done.outcome == AnimOutcome::Cancelled {
            if let Some(panel) = self.cache.peek(&binding.key) {
                let mut p = panel.borrow_mut();
                self.driver
                    .end_samples(done.handle.id(), |sample| apply_sample(p.view_mut(), sample));
            }
        }
        self.driver.recycle(done.handle);
        match binding.phase {
            AnimPhase::Show => {
                if let Some(panel) = self.cache.peek(&binding.key).cloned() {
                    panel.borrow_mut().fire_all(&[Hook::Show, Hook::DidShow]);
                }
            }
            AnimPhase::Hide { closing } => self.finish_hide(&binding.key, closing),
        }
    }

    fn drive_animations(&mut self, dt: Duration) {
        let done = {
            let Self {
                driver,
                bindings,
                cache,
                ..
            } = self;
            driver.tick(dt, |tag, sample| {
                let Some(binding) = bindings.get(&tag) else {
                    return;
                };
                let Some(panel) = cache.peek(&binding.key) else {
                    return;
                };
                apply_sample(panel.borrow_mut().view_mut(), sample);
            })
        };
        for finished in done {
            self.settle(finished);
        }
    }

    // -- heat and caching ---------------------------------------------------

    fn accumulate_heat(&mut self, dt: Duration) {
        self.heat_accum += dt;
        while self.heat_accum >= self.heat_interval {
            self.heat_accum -= self.heat_interval;
            for cooled in self.heat.tick() {
                self.trim_cooled(&cooled);
            }
        }
    }

    /// Drop `key` if it is cold, closed (or never activated), and not
    /// persistent. Called on the decay tick that zeroes a key, and again
    /// at close for panels that cooled while still shown.
    fn trim_cooled(&mut self, key: &PanelKey) {
        let Some(panel) = self.cache.peek(key) else {
            return;
        };
        let (state, mode) = {
            let p = panel.borrow();
            (p.state(), p.mode())
        };
        if mode == CacheMode::Persistent || state.is_opened() || state == PanelState::Closing {
            return;
        }
        if self.heat.heat(key) > 0 {
            return;
        }
        self.cache.remove(key);
        self.heat.remove(key);
        self.transitions.remove(key);
        tracing::debug!(panel = %key, ?state, "trimmed cold panel");
    }

    /// Current heat of a panel.
    #[must_use]
    pub fn heat_of(&self, key: &PanelKey) -> u32 {
        self.heat.heat(key)
    }

    /// Replace the heat weights; existing heat is re-clamped.
    pub fn set_heat_config(&mut self, config: HeatConfig) {
        self.heat.set_config(config);
    }

    /// Set the heat added per open.
    pub fn set_open_heat(&mut self, weight: u32) {
        let config = self.heat.config().open_weight(weight);
        self.heat.set_config(config);
    }

    /// Set the heat added per cache-hit query.
    pub fn set_query_heat(&mut self, weight: u32) {
        let config = self.heat.config().query_weight(weight);
        self.heat.set_config(config);
    }

    /// Set the heat subtracted per decay step.
    pub fn set_heat_decay(&mut self, decay: u32) {
        let config = self.heat.config().decay_per_tick(decay);
        self.heat.set_config(config);
    }

    /// Heat tracker counters.
    #[must_use]
    pub fn heat_stats(&self) -> HeatStats {
        self.heat.stats()
    }

    /// Cache hit/miss/eviction counters.
    #[must_use]
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Resize the preload pool, evicting immediately on shrink.
    pub fn set_cache_capacity(&mut self, capacity: usize) {
        self.cache.set_capacity(capacity);
    }

    /// Drop one preloaded instance, whatever its cache mode.
    pub fn clear_preloaded(&mut self, key: &PanelKey) -> bool {
        self.cache.clear_preloaded(key).is_some()
    }

    /// Drop every preloaded instance. Returns how many were removed.
    pub fn clear_all_preloaded(&mut self) -> usize {
        self.cache.clear_all_preloaded()
    }

    // -- frame driving ------------------------------------------------------

    /// Advance the service by `dt`: drain finished loads, drive
    /// animations, and step heat decay.
    pub fn tick(&mut self, dt: Duration) {
        self.drain_loads();
        self.drive_animations(dt);
        self.accumulate_heat(dt);
    }

    /// [`PanelService::tick`] with `dt` measured from the previous pump.
    /// The first pump uses a zero delta. Returns the delta used.
    pub fn pump(&mut self) -> Duration {
        let now = Instant::now();
        let dt = match self.last_pump {
            Some(prev) => now.duration_since(prev),
            None => Duration::ZERO,
        };
        self.last_pump = Some(now);
        self.tick(dt);
        dt
    }
}

impl fmt::Debug for PanelService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PanelService")
            .field("cache", &self.cache)
            .field("pending", &self.pending)
            .field("animating", &self.active_anim.len())
            .field("stacks", &self.stacks.stack_names())
            .finish()
    }
}
