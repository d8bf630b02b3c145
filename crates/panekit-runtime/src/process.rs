#![forbid(unsafe_code)]

//! Optional process-wide service slot.
//!
//! Hosts that want a single ambient [`PanelService`] install it here and
//! reach it through [`with`]. The slot is thread-local: the service is
//! built on `Rc<RefCell<_>>` internals and never crosses threads.
//! Embedders that prefer explicit ownership simply never call
//! [`install`].

use std::cell::RefCell;

use crate::service::PanelService;

thread_local! {
    static SERVICE: RefCell<Option<PanelService>> = const { RefCell::new(None) };
}

/// Install `service` as this thread's ambient service, returning the
/// previous occupant if there was one.
pub fn install(service: PanelService) -> Option<PanelService> {
    SERVICE.with(|slot| slot.borrow_mut().replace(service))
}

/// Run `f` against the ambient service. Returns `None` when no service
/// is installed or when called re-entrantly from inside another [`with`].
pub fn with<R>(f: impl FnOnce(&mut PanelService) -> R) -> Option<R> {
    SERVICE.with(|slot| {
        let mut guard = slot.try_borrow_mut().ok()?;
        guard.as_mut().map(f)
    })
}

/// Remove and return the ambient service.
pub fn uninstall() -> Option<PanelService> {
    SERVICE.with(|slot| slot.borrow_mut().take())
}

/// Whether an ambient service is installed on this thread.
#[must_use]
pub fn is_installed() -> bool {
    SERVICE.with(|slot| slot.borrow().is_some())
}
