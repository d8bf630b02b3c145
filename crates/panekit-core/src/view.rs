#![forbid(unsafe_code)]

//! Collaborator traits for the presentation layer.
//!
//! The core never draws anything. [`PanelView`] is the handle it holds on
//! the presentation layer's visual object: lifecycle hooks receive it, and
//! the animation driver writes opacity/scale/offset values into it. All
//! methods default to no-ops so headless hosts and tests can use
//! [`NullView`] or any partial implementation.
//!
//! [`PanelData`] is the marker capability for the opaque payload a caller
//! passes through `open`; it is delivered unchanged to the `Init`/`Open`
//! hooks, which downcast it via [`PanelData::as_any`].

use std::any::Any;

/// A panel's visual object, owned by the presentation layer.
pub trait PanelView {
    /// Set the view's opacity in `[0.0, 1.0]`.
    fn set_opacity(&mut self, _opacity: f32) {}

    /// Set the view's uniform scale factor (1.0 = natural size).
    fn set_scale(&mut self, _scale: f32) {}

    /// Set the view's positional offset from its resting place.
    fn set_offset(&mut self, _x: f32, _y: f32) {}

    /// Name of the element that should receive focus when this panel
    /// gains the top of a stack, if any.
    fn default_focus_target(&self) -> Option<&str> {
        None
    }
}

/// A view that renders nothing. Useful for tests and headless hosts.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullView;

impl PanelView for NullView {}

/// Marker capability for opaque panel payloads.
///
/// Implementors expose themselves as [`Any`] so hooks can downcast:
///
/// ```
/// use panekit_core::view::PanelData;
/// use std::any::Any;
///
/// struct ShopArgs { tab: u32 }
///
/// impl PanelData for ShopArgs {
///     fn as_any(&self) -> &dyn Any {
///         self
///     }
/// }
///
/// let data: Box<dyn PanelData> = Box::new(ShopArgs { tab: 2 });
/// assert_eq!(data.as_any().downcast_ref::<ShopArgs>().unwrap().tab, 2);
/// ```
pub trait PanelData: Any {
    /// The payload as [`Any`] for downcasting.
    fn as_any(&self) -> &dyn Any;
}
