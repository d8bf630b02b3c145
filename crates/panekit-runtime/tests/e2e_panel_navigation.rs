//! E2E integration tests for multi-stack navigation.
//!
//! Exercises push/pop across independent named stacks, the
//! blur/focus/resume hook flow, hide-previous semantics, duplicate-push
//! rejection, and closing a panel out from under its stacks.

use std::cell::RefCell;
use std::rc::Rc;

use panekit_core::{Hook, HookSet, PanelKey, PanelState};
use panekit_runtime::{PanelBlueprint, PanelRegistry, PanelService, PushOutcome};

// ============================================================================
// Helpers
// ============================================================================

type HookLog = Rc<RefCell<Vec<String>>>;

fn logged_hooks(name: &'static str, log: &HookLog) -> HookSet {
    let mut hooks = HookSet::new();
    for hook in [
        Hook::Init,
        Hook::Open,
        Hook::WillShow,
        Hook::Show,
        Hook::DidShow,
        Hook::WillHide,
        Hook::Hide,
        Hook::DidHide,
        Hook::Close,
        Hook::Focus,
        Hook::Blur,
        Hook::Resume,
    ] {
        let log = Rc::clone(log);
        hooks.set(hook, move |_| {
            log.borrow_mut().push(format!("{name}:{}", hook.name()));
            Ok(())
        });
    }
    hooks
}

fn service_with(names: &[&'static str]) -> (PanelService, HookLog) {
    let log: HookLog = Rc::default();
    let mut registry = PanelRegistry::new();
    for name in names {
        let log = Rc::clone(&log);
        let name = *name;
        registry.register(name, move |_| {
            Ok(PanelBlueprint::new().hooks(logged_hooks(name, &log)))
        });
    }
    (PanelService::new(registry), log)
}

fn key(name: &str) -> PanelKey {
    PanelKey::new(name)
}

fn taken(log: &HookLog) -> Vec<String> {
    std::mem::take(&mut *log.borrow_mut())
}

// ============================================================================
// Tests
// ============================================================================

#[test]
fn three_deep_push_pop_walks_back_in_order() {
    let (mut service, log) = service_with(&["home", "settings", "about"]);

    service.push("nav", "home", None, true).unwrap();
    service.push("nav", "settings", None, true).unwrap();
    service.push("nav", "about", None, true).unwrap();
    assert_eq!(service.depth("nav"), 3);
    assert_eq!(service.peek("nav"), Some(key("about")));
    assert_eq!(service.state_of(&key("home")), Some(PanelState::Hidden));
    assert_eq!(service.state_of(&key("settings")), Some(PanelState::Hidden));
    assert_eq!(service.state_of(&key("about")), Some(PanelState::Shown));
    taken(&log);

    assert_eq!(service.pop("nav"), Some(key("about")));
    assert_eq!(service.peek("nav"), Some(key("settings")));
    assert_eq!(service.state_of(&key("settings")), Some(PanelState::Shown));
    let entries = taken(&log);
    assert!(entries.contains(&"about:blur".to_string()));
    assert!(entries.contains(&"about:close".to_string()));
    assert!(entries.contains(&"settings:resume".to_string()));
    assert!(entries.contains(&"settings:focus".to_string()));

    assert_eq!(service.pop("nav"), Some(key("settings")));
    assert_eq!(service.pop("nav"), Some(key("home")));
    assert_eq!(service.pop("nav"), None);
    assert_eq!(service.depth("nav"), 0);
}

#[test]
fn depth_is_pushes_minus_pops_with_duplicates_ignored() {
    let (mut service, _log) = service_with(&["a", "b", "c"]);

    service.push("nav", "a", None, false).unwrap();
    service.push("nav", "b", None, false).unwrap();
    let dup = service.push("nav", "a", None, false).unwrap();
    assert_eq!(dup, PushOutcome::Duplicate);
    service.push("nav", "c", None, false).unwrap();
    assert_eq!(service.depth("nav"), 3);

    service.pop("nav");
    assert_eq!(service.depth("nav"), 2);
}

#[test]
fn stacks_are_fully_independent() {
    let (mut service, _log) = service_with(&["hud", "dialog", "toast"]);

    service.push("main", "hud", None, false).unwrap();
    service.push("overlay", "dialog", None, false).unwrap();
    service.push("overlay", "toast", None, false).unwrap();

    assert_eq!(service.depth("main"), 1);
    assert_eq!(service.depth("overlay"), 2);

    service.pop("overlay");
    assert_eq!(service.depth("main"), 1);
    assert_eq!(service.peek("main"), Some(key("hud")));
    assert_eq!(service.peek("overlay"), Some(key("dialog")));

    let mut names = service.stack_names();
    names.sort();
    assert_eq!(names, ["main", "overlay"]);
}

#[test]
fn push_without_hide_keeps_previous_visible() {
    let (mut service, _log) = service_with(&["base", "overlay"]);

    service.push("nav", "base", None, false).unwrap();
    service.push("nav", "overlay", None, false).unwrap();

    assert_eq!(service.state_of(&key("base")), Some(PanelState::Shown));
    assert_eq!(service.state_of(&key("overlay")), Some(PanelState::Shown));
    assert_eq!(service.visible().len(), 2);

    // Popping must not re-show what was never hidden.
    let (mut service, log) = service_with(&["base", "overlay"]);
    service.push("nav", "base", None, false).unwrap();
    service.push("nav", "overlay", None, false).unwrap();
    taken(&log);
    service.pop("nav");
    let entries = taken(&log);
    assert!(!entries.contains(&"base:will_show".to_string()));
    assert!(entries.contains(&"base:resume".to_string()));
}

#[test]
fn closing_a_stacked_panel_removes_it_from_the_stack() {
    let (mut service, _log) = service_with(&["a", "b"]);

    service.push("nav", "a", None, false).unwrap();
    service.push("nav", "b", None, false).unwrap();
    assert!(service.close(&key("a")));

    assert_eq!(service.depth("nav"), 1);
    assert_eq!(service.peek("nav"), Some(key("b")));
    // "a" stays cached, just closed.
    assert_eq!(service.state_of(&key("a")), Some(PanelState::Closed));
}

#[test]
fn clear_stack_closes_top_first() {
    let (mut service, log) = service_with(&["a", "b"]);
    service.push("nav", "a", None, false).unwrap();
    service.push("nav", "b", None, false).unwrap();
    taken(&log);

    service.clear_stack("nav", true);
    assert_eq!(service.depth("nav"), 0);
    let entries = taken(&log);
    let close_a = entries.iter().position(|e| e == "a:close").unwrap();
    let close_b = entries.iter().position(|e| e == "b:close").unwrap();
    assert!(close_b < close_a, "top of stack must close first");
}

#[test]
fn pop_without_auto_close_keeps_panel_reusable() {
    let (mut service, log) = service_with(&["home", "settings"]);
    service.push("nav", "home", None, true).unwrap();
    service.push("nav", "settings", None, true).unwrap();
    taken(&log);

    service.pop_with("nav", true, false);
    assert_eq!(service.state_of(&key("settings")), Some(PanelState::Hidden));
    assert_eq!(service.state_of(&key("home")), Some(PanelState::Shown));
    let entries = taken(&log);
    assert!(!entries.contains(&"settings:close".to_string()));
    assert!(entries.contains(&"settings:did_hide".to_string()));
}

#[test]
fn clear_without_close_hides_but_keeps_cached() {
    let (mut service, _log) = service_with(&["a", "b"]);
    service.push("nav", "a", None, false).unwrap();
    service.push("nav", "b", None, false).unwrap();

    service.clear_stack("nav", false);
    assert_eq!(service.depth("nav"), 0);
    for name in ["a", "b"] {
        assert_eq!(service.state_of(&key(name)), Some(PanelState::Hidden));
    }
}

#[test]
fn popped_panel_can_be_pushed_again_without_reinit() {
    let (mut service, log) = service_with(&["home", "settings"]);

    service.push("nav", "home", None, true).unwrap();
    service.push("nav", "settings", None, true).unwrap();
    service.pop("nav");
    taken(&log);

    service.push("nav", "settings", None, true).unwrap();
    let entries = taken(&log);
    assert!(!entries.contains(&"settings:init".to_string()));
    assert!(entries.contains(&"settings:open".to_string()));
    assert!(entries.contains(&"settings:focus".to_string()));
    assert_eq!(service.depth("nav"), 2);
}
