#![forbid(unsafe_code)]

//! Panel lifecycle: per-instance state machine and the ordered hook table.
//!
//! States: `Uninitialized → Initializing → Shown/Hidden → Closing → Closed`.
//! `Closed` is terminal only for `Temporary`-mode instances; for `Hot` and
//! `Persistent` modes it is a cached resting state that re-enters `Shown`
//! on reuse. The init hook runs at most once per instance's entire
//! existence, enforced by [`PanelInstance::ensure_initialized`].
//!
//! Hooks are synchronous callbacks into the presentation layer, held as a
//! fixed struct of optional slots ([`HookSet`]) rather than an inheritance
//! chain. A hook returning `Err` is caught at the call boundary, logged,
//! and swallowed so the remaining hooks in a sequence still run.
//!
//! # Invariants
//!
//! 1. `Init` fires at most once per instance, ever.
//! 2. A failing hook never aborts the sequence it belongs to.
//! 3. Hook callbacks observe the state as of the moment they fire.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::types::{CacheMode, DrawOrder, PanelKey, PanelLevel};
use crate::view::{PanelData, PanelView};

// ---------------------------------------------------------------------------
// States and hook names
// ---------------------------------------------------------------------------

/// Lifecycle state of one panel instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PanelState {
    /// Created but the init hook has not run.
    Uninitialized,
    /// The init hook is running.
    Initializing,
    /// Opened and visible.
    Shown,
    /// Opened but not visible.
    Hidden,
    /// The close sequence (including any hide animation) is running.
    Closing,
    /// Closed; a cached resting state except for `Temporary` instances.
    Closed,
}

impl PanelState {
    /// Whether the instance is in the opened band (`Shown` or `Hidden`).
    #[inline]
    #[must_use]
    pub const fn is_opened(self) -> bool {
        matches!(self, Self::Shown | Self::Hidden)
    }
}

/// The twelve lifecycle hook slots, in no particular order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Hook {
    /// First-ever activation, before `Open`.
    Init,
    /// Every activation, after `Init` on the first one.
    Open,
    /// About to become visible, before any show animation.
    WillShow,
    /// Became visible, after any show animation.
    Show,
    /// Show sequence finished.
    DidShow,
    /// About to be hidden, before any hide animation.
    WillHide,
    /// Became hidden, after any hide animation.
    Hide,
    /// Hide sequence finished.
    DidHide,
    /// Close sequence finished; fate is decided by cache mode next.
    Close,
    /// Gained the top of a stack.
    Focus,
    /// Lost the top of a stack.
    Blur,
    /// Regained the top of a stack after a pop above it.
    Resume,
}

impl Hook {
    /// Stable name for logs.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::Open => "open",
            Self::WillShow => "will_show",
            Self::Show => "show",
            Self::DidShow => "did_show",
            Self::WillHide => "will_hide",
            Self::Hide => "hide",
            Self::DidHide => "did_hide",
            Self::Close => "close",
            Self::Focus => "focus",
            Self::Blur => "blur",
            Self::Resume => "resume",
        }
    }
}

// ---------------------------------------------------------------------------
// Hook callbacks
// ---------------------------------------------------------------------------

/// Failure reported by a hook. Caught, logged, and swallowed at the call
/// boundary: one broken visual feature must not break the state machine
/// for the rest of the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HookError {
    /// Human-readable reason.
    pub message: String,
}

impl HookError {
    /// Create a hook error from any message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for HookError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for HookError {}

/// What a hook callback sees when it fires.
pub struct HookCtx<'a> {
    /// The panel type this instance belongs to.
    pub key: &'a PanelKey,
    /// Lifecycle state at the moment the hook fires.
    pub state: PanelState,
    /// The instance's visual object.
    pub view: &'a mut dyn PanelView,
    /// The caller-supplied payload, if any.
    pub data: Option<&'a dyn PanelData>,
}

/// A boxed hook callback.
pub type HookFn = Box<dyn FnMut(HookCtx<'_>) -> Result<(), HookError>>;

/// Fixed table of optional hook callbacks.
///
/// The presentation layer populates the slots it cares about; empty slots
/// cost nothing. Builder methods mirror the slot names.
#[derive(Default)]
pub struct HookSet {
    pub on_init: Option<HookFn>,
    pub on_open: Option<HookFn>,
    pub on_will_show: Option<HookFn>,
    pub on_show: Option<HookFn>,
    pub on_did_show: Option<HookFn>,
    pub on_will_hide: Option<HookFn>,
    pub on_hide: Option<HookFn>,
    pub on_did_hide: Option<HookFn>,
    pub on_close: Option<HookFn>,
    pub on_focus: Option<HookFn>,
    pub on_blur: Option<HookFn>,
    pub on_resume: Option<HookFn>,
}

macro_rules! hook_builder {
    ($name:ident) => {
        /// Set this hook slot (builder pattern).
        #[must_use]
        pub fn $name(
            mut self,
            f: impl FnMut(HookCtx<'_>) -> Result<(), HookError> + 'static,
        ) -> Self {
            self.$name = Some(Box::new(f));
            self
        }
    };
}

impl HookSet {
    /// An empty hook table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    hook_builder!(on_init);
    hook_builder!(on_open);
    hook_builder!(on_will_show);
    hook_builder!(on_show);
    hook_builder!(on_did_show);
    hook_builder!(on_will_hide);
    hook_builder!(on_hide);
    hook_builder!(on_did_hide);
    hook_builder!(on_close);
    hook_builder!(on_focus);
    hook_builder!(on_blur);
    hook_builder!(on_resume);

    /// Set a slot by hook name.
    pub fn set(
        &mut self,
        hook: Hook,
        f: impl FnMut(HookCtx<'_>) -> Result<(), HookError> + 'static,
    ) {
        *self.slot_mut(hook) = Some(Box::new(f));
    }

    fn slot_mut(&mut self, hook: Hook) -> &mut Option<HookFn> {
        match hook {
            Hook::Init => &mut self.on_init,
            Hook::Open => &mut self.on_open,
            Hook::WillShow => &mut self.on_will_show,
            Hook::Show => &mut self.on_show,
            Hook::DidShow => &mut self.on_did_show,
            Hook::WillHide => &mut self.on_will_hide,
            Hook::Hide => &mut self.on_hide,
            Hook::DidHide => &mut self.on_did_hide,
            Hook::Close => &mut self.on_close,
            Hook::Focus => &mut self.on_focus,
            Hook::Blur => &mut self.on_blur,
            Hook::Resume => &mut self.on_resume,
        }
    }
}

impl fmt::Debug for HookSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let set: Vec<&str> = [
            (self.on_init.is_some(), "init"),
            (self.on_open.is_some(), "open"),
            (self.on_will_show.is_some(), "will_show"),
            (self.on_show.is_some(), "show"),
            (self.on_did_show.is_some(), "did_show"),
            (self.on_will_hide.is_some(), "will_hide"),
            (self.on_hide.is_some(), "hide"),
            (self.on_did_hide.is_some(), "did_hide"),
            (self.on_close.is_some(), "close"),
            (self.on_focus.is_some(), "focus"),
            (self.on_blur.is_some(), "blur"),
            (self.on_resume.is_some(), "resume"),
        ]
        .into_iter()
        .filter_map(|(set, name)| set.then_some(name))
        .collect();
        f.debug_struct("HookSet").field("slots", &set).finish()
    }
}

// ---------------------------------------------------------------------------
// Panel instance
// ---------------------------------------------------------------------------

/// Shared handle to a live panel instance.
///
/// The whole core runs on one cooperative thread, so instances are shared
/// between the cache and stacks as `Rc<RefCell<_>>`.
pub type PanelRef = Rc<RefCell<PanelInstance>>;

/// One live object of a panel type.
pub struct PanelInstance {
    key: PanelKey,
    state: PanelState,
    mode: CacheMode,
    level: PanelLevel,
    sub_level: u16,
    seq: u64,
    initialized: bool,
    data: Option<Box<dyn PanelData>>,
    view: Box<dyn PanelView>,
    hooks: HookSet,
}

impl fmt::Debug for PanelInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PanelInstance")
            .field("key", &self.key)
            .field("state", &self.state)
            .field("mode", &self.mode)
            .field("level", &self.level)
            .field("sub_level", &self.sub_level)
            .field("initialized", &self.initialized)
            .field("has_data", &self.data.is_some())
            .field("hooks", &self.hooks)
            .finish()
    }
}

impl PanelInstance {
    /// Create an uninitialized instance.
    #[must_use]
    pub fn new(key: PanelKey, view: Box<dyn PanelView>, hooks: HookSet, mode: CacheMode) -> Self {
        Self {
            key,
            state: PanelState::Uninitialized,
            mode,
            level: PanelLevel::default(),
            sub_level: 0,
            seq: 0,
            initialized: false,
            data: None,
            view,
            hooks,
        }
    }

    /// Wrap the instance in the shared-handle type.
    #[must_use]
    pub fn into_ref(self) -> PanelRef {
        Rc::new(RefCell::new(self))
    }

    /// The panel type this instance belongs to.
    #[inline]
    #[must_use]
    pub fn key(&self) -> &PanelKey {
        &self.key
    }

    /// Current lifecycle state.
    #[inline]
    #[must_use]
    pub fn state(&self) -> PanelState {
        self.state
    }

    /// Force the lifecycle state. Sequencing is the runtime's job; this
    /// records the result of a transition.
    pub fn set_state(&mut self, state: PanelState) {
        self.state = state;
    }

    /// Cache mode governing the instance's fate after close.
    #[inline]
    #[must_use]
    pub fn mode(&self) -> CacheMode {
        self.mode
    }

    /// Change the cache mode.
    pub fn set_mode(&mut self, mode: CacheMode) {
        self.mode = mode;
    }

    /// Whether the init hook has already run.
    #[inline]
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Assigned draw order.
    #[must_use]
    pub fn draw_order(&self) -> DrawOrder {
        DrawOrder {
            level: self.level,
            sub_level: self.sub_level,
            seq: self.seq,
        }
    }

    /// Assign the display level and sub-level.
    pub fn set_level(&mut self, level: PanelLevel, sub_level: u16) {
        self.level = level;
        self.sub_level = sub_level;
    }

    /// Assign the draw-order tiebreak sequence.
    pub fn set_seq(&mut self, seq: u64) {
        self.seq = seq;
    }

    /// Replace the caller payload delivered to `Init`/`Open`.
    pub fn set_data(&mut self, data: Option<Box<dyn PanelData>>) {
        self.data = data;
    }

    /// The current payload, if any.
    #[must_use]
    pub fn data(&self) -> Option<&dyn PanelData> {
        self.data.as_deref()
    }

    /// The instance's visual object.
    #[must_use]
    pub fn view_mut(&mut self) -> &mut dyn PanelView {
        self.view.as_mut()
    }

    /// Replace a hook slot after construction.
    pub fn set_hook(
        &mut self,
        hook: Hook,
        f: impl FnMut(HookCtx<'_>) -> Result<(), HookError> + 'static,
    ) {
        self.hooks.set(hook, f);
    }

    /// Run the init hook if it has never run, entering and leaving the
    /// `Initializing` state around it. Subsequent calls are no-ops.
    pub fn ensure_initialized(&mut self) {
        if self.initialized {
            return;
        }
        self.state = PanelState::Initializing;
        self.fire(Hook::Init);
        self.initialized = true;
    }

    /// Fire one hook. An `Err` from the callback is logged and swallowed
    /// so later hooks in the sequence still run. Empty slots are free.
    pub fn fire(&mut self, hook: Hook) {
        let state = self.state;
        let Some(callback) = self.hooks.slot_mut(hook) else {
            return;
        };
        let result = callback(HookCtx {
            key: &self.key,
            state,
            view: self.view.as_mut(),
            data: self.data.as_deref(),
        });
        if let Err(err) = result {
            tracing::warn!(
                panel = %self.key,
                hook = hook.name(),
                error = %err,
                "lifecycle hook failed; continuing sequence"
            );
        }
    }

    /// Fire several hooks in order, regardless of individual failures.
    pub fn fire_all(&mut self, hooks: &[Hook]) {
        for hook in hooks {
            self.fire(*hook);
        }
    }
}
