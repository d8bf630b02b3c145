#![forbid(unsafe_code)]

//! Panel identity and draw-order primitives.
//!
//! A [`PanelKey`] names a panel *type* (class/template), not an instance.
//! Keys are interned `Arc<str>` values: cloning is a refcount bump, and
//! equality/hashing is on the string contents, so the same name constructed
//! twice is the same key.
//!
//! Draw order is a total order over `(level, sub_level, sequence)`:
//! [`PanelLevel`] is the coarse layer, `sub_level` orders within a layer,
//! and the monotonic sequence breaks ties by recency of assignment.

use std::fmt;
use std::sync::Arc;

/// Immutable identifier for a panel class/template.
///
/// Used as the cache and heat-map key.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PanelKey(Arc<str>);

impl PanelKey {
    /// Create a key from a panel type name.
    #[must_use]
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(Arc::from(name.as_ref()))
    }

    /// The key's name.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PanelKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for PanelKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PanelKey({})", &self.0)
    }
}

impl From<&str> for PanelKey {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for PanelKey {
    fn from(name: String) -> Self {
        Self(Arc::from(name))
    }
}

/// Coarse draw layer for a panel.
///
/// Layers render back-to-front in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum PanelLevel {
    /// Full-screen scenery behind everything else.
    Background,
    /// Ordinary content panels.
    #[default]
    Common,
    /// Dialogs and popups above content.
    Popup,
    /// Transient notifications above popups.
    Toast,
    /// Reserved top layer (loading curtains, fatal errors).
    System,
}

impl PanelLevel {
    /// Numeric rank of the layer, back (0) to front.
    #[inline]
    #[must_use]
    pub const fn rank(self) -> u8 {
        match self {
            Self::Background => 0,
            Self::Common => 1,
            Self::Popup => 2,
            Self::Toast => 3,
            Self::System => 4,
        }
    }
}

/// Total draw order for a visible panel: layer, then sub-level, then
/// assignment recency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DrawOrder {
    /// Coarse layer.
    pub level: PanelLevel,
    /// Ordering within the layer.
    pub sub_level: u16,
    /// Monotonic assignment sequence; later assignments draw in front.
    pub seq: u64,
}

/// Policy governing a panel instance's fate after close.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CacheMode {
    /// Cached while its heat score is above zero, destroyed once it cools.
    #[default]
    Hot,
    /// Cached indefinitely once created.
    Persistent,
    /// Destroyed immediately on close.
    Temporary,
}
