#![forbid(unsafe_code)]

//! Panel construction: blueprints, the factory registry, and the loader
//! seam.
//!
//! A [`PanelBlueprint`] is everything needed to build one instance: the
//! view, the hook table, cache mode, display level, and the optional
//! show/hide transition recipes. Factories produce blueprints; the
//! [`PanelLoader`] trait is the seam the service loads through, so asset
//! pipelines can stand in for the in-memory [`PanelRegistry`].

use std::fmt;

use ahash::AHashMap;
use panekit_core::{CacheMode, HookSet, PanelInstance, PanelKey, PanelLevel};
use panekit_core::view::{NullView, PanelView};
use panekit_anim::AnimDecl;

use crate::pending::{CancelFlag, LoadDelivery, LoadSink, OpenTicket};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Why a panel could not be loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
    /// No factory is registered for the key.
    NotFound(PanelKey),
    /// The factory ran and failed.
    Failed {
        /// The panel that failed to build.
        key: PanelKey,
        /// Factory-supplied reason.
        reason: String,
    },
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound(key) => write!(f, "no panel registered for key `{key}`"),
            Self::Failed { key, reason } => write!(f, "loading panel `{key}` failed: {reason}"),
        }
    }
}

impl std::error::Error for LoadError {}

// ---------------------------------------------------------------------------
// Blueprint
// ---------------------------------------------------------------------------

/// Transition recipes attached to a panel type.
#[derive(Debug, Clone, Default)]
pub struct PanelTransitions {
    /// Played when the panel becomes visible.
    pub show: Option<AnimDecl>,
    /// Played when the panel is hidden or closed.
    pub hide: Option<AnimDecl>,
}

/// Everything needed to build one panel instance.
pub struct PanelBlueprint {
    view: Box<dyn PanelView>,
    hooks: HookSet,
    mode: CacheMode,
    level: PanelLevel,
    sub_level: u16,
    transitions: PanelTransitions,
}

impl Default for PanelBlueprint {
    fn default() -> Self {
        Self::new()
    }
}

impl PanelBlueprint {
    /// A blueprint with a null view, no hooks, and defaults everywhere.
    #[must_use]
    pub fn new() -> Self {
        Self {
            view: Box::new(NullView),
            hooks: HookSet::new(),
            mode: CacheMode::default(),
            level: PanelLevel::default(),
            sub_level: 0,
            transitions: PanelTransitions::default(),
        }
    }

    /// Set the visual object.
    #[must_use]
    pub fn view(mut self, view: Box<dyn PanelView>) -> Self {
        self.view = view;
        self
    }

    /// Set the lifecycle hook table.
    #[must_use]
    pub fn hooks(mut self, hooks: HookSet) -> Self {
        self.hooks = hooks;
        self
    }

    /// Set the cache mode.
    #[must_use]
    pub fn mode(mut self, mode: CacheMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the display level and sub-level.
    #[must_use]
    pub fn level(mut self, level: PanelLevel, sub_level: u16) -> Self {
        self.level = level;
        self.sub_level = sub_level;
        self
    }

    /// Set the show transition recipe.
    #[must_use]
    pub fn show_anim(mut self, decl: AnimDecl) -> Self {
        self.transitions.show = Some(decl);
        self
    }

    /// Set the hide transition recipe.
    #[must_use]
    pub fn hide_anim(mut self, decl: AnimDecl) -> Self {
        self.transitions.hide = Some(decl);
        self
    }

    /// Build the instance for `key`, splitting off the transition
    /// recipes the runtime keeps in its side table.
    #[must_use]
    pub fn instantiate(self, key: PanelKey) -> (PanelInstance, PanelTransitions) {
        let mut instance = PanelInstance::new(key, self.view, self.hooks, self.mode);
        instance.set_level(self.level, self.sub_level);
        (instance, self.transitions)
    }
}

impl fmt::Debug for PanelBlueprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PanelBlueprint")
            .field("mode", &self.mode)
            .field("level", &self.level)
            .field("sub_level", &self.sub_level)
            .field("show_anim", &self.transitions.show.is_some())
            .field("hide_anim", &self.transitions.hide.is_some())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Loader seam
// ---------------------------------------------------------------------------

/// Source of panel blueprints.
///
/// `load` is the synchronous path. `load_async` delivers through a
/// [`LoadSink`] so the service can treat every source uniformly; the
/// default implementation resolves immediately on the calling thread,
/// which is the right behavior for in-memory registries and for tests.
pub trait PanelLoader {
    /// Build the blueprint for `key`.
    fn load(&self, key: &PanelKey) -> Result<PanelBlueprint, LoadError>;

    /// Resolve `key` and deliver the result through `sink`, honoring
    /// `cancel` if the work has not started yet.
    fn load_async(&self, key: &PanelKey, ticket: OpenTicket, sink: LoadSink, cancel: CancelFlag) {
        if cancel.is_cancelled() {
            return;
        }
        sink.deliver(LoadDelivery {
            ticket,
            key: key.clone(),
            result: self.load(key),
        });
    }
}

/// In-memory factory table, the default loader.
#[derive(Default)]
pub struct PanelRegistry {
    factories: AHashMap<PanelKey, Box<dyn Fn(&PanelKey) -> Result<PanelBlueprint, LoadError>>>,
}

impl PanelRegistry {
    /// An empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the factory for a panel type, replacing any previous one.
    pub fn register(
        &mut self,
        key: impl Into<PanelKey>,
        factory: impl Fn(&PanelKey) -> Result<PanelBlueprint, LoadError> + 'static,
    ) {
        self.factories.insert(key.into(), Box::new(factory));
    }

    /// Whether a factory exists for `key`.
    #[must_use]
    pub fn is_registered(&self, key: &PanelKey) -> bool {
        self.factories.contains_key(key)
    }

    /// Number of registered panel types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.factories.len()
    }

    /// Whether no panel types are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

impl fmt::Debug for PanelRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PanelRegistry")
            .field("registered", &self.factories.len())
            .finish()
    }
}

impl PanelLoader for PanelRegistry {
    fn load(&self, key: &PanelKey) -> Result<PanelBlueprint, LoadError> {
        match self.factories.get(key) {
            Some(factory) => factory(key),
            None => Err(LoadError::NotFound(key.clone())),
        }
    }
}
