use super::connect;
use super::fake::{Event, FakeDesktop, TabbedDialog};
use crate::element::roles;
use crate::keys::{Direction, Key};
use crate::navigator::{DialogNavigator, TabState};
use crate::AutomationError;
use std::sync::atomic::Ordering;

fn focus_and_shift_events(desktop: &FakeDesktop) -> Vec<Event> {
    desktop
        .events()
        .into_iter()
        .filter(|e| {
            matches!(
                e,
                Event::Focus(_) | Event::Key(Key::CtrlLeft) | Event::Key(Key::CtrlRight)
            )
        })
        .collect()
}

#[test]
fn test_move_tab_focuses_before_each_shift() {
    let desktop = FakeDesktop::new();
    let main = desktop.main_window();
    let tabbed = TabbedDialog::install(&desktop, &main, "New Matter");
    let (session, _) = connect(&desktop);
    let nav = DialogNavigator::new(&session, tabbed.dialog.element());

    nav.move_tab(Direction::Right, 1).unwrap();
    nav.move_tab(Direction::Left, 2).unwrap();

    // the first enabled edit differs per pane; the disabled "Matter No" is never focused
    assert_eq!(
        focus_and_shift_events(&desktop),
        vec![
            Event::Focus("Client".to_string()),
            Event::Key(Key::CtrlRight),
            Event::Focus("Bill Format".to_string()),
            Event::Key(Key::CtrlLeft),
            Event::Focus("Client".to_string()),
            Event::Key(Key::CtrlLeft),
        ]
    );
    assert_eq!(tabbed.tab.load(Ordering::SeqCst), 0);
}

#[test]
fn test_move_tab_zero_times_does_nothing() {
    let desktop = FakeDesktop::new();
    let main = desktop.main_window();
    let tabbed = TabbedDialog::install(&desktop, &main, "New Matter");
    let (session, clock) = connect(&desktop);

    DialogNavigator::new(&session, tabbed.dialog.element())
        .move_tab(Direction::Right, 0)
        .unwrap();
    assert!(desktop.events().is_empty());
    assert!(clock.sleeps().is_empty());
}

#[test]
fn test_move_tab_without_editable_control_sends_nothing() {
    let desktop = FakeDesktop::new();
    let main = desktop.main_window();
    let dialog = desktop.node(roles::WINDOW, "New Matter");
    let locked = desktop.node(roles::EDIT, "Matter No");
    locked.set_enabled(false);
    dialog.add(locked);
    main.add(dialog.clone());
    let (session, _) = connect(&desktop);

    let result = DialogNavigator::new(&session, dialog.element()).move_tab(Direction::Right, 1);
    assert!(matches!(result, Err(AutomationError::ElementNotFound(_))));
    assert!(desktop.keys().is_empty());
}

#[test]
fn test_detect_tab_is_read_only_and_stable() {
    let desktop = FakeDesktop::new();
    let main = desktop.main_window();
    let tabbed = TabbedDialog::install(&desktop, &main, "New Matter");
    let (session, _) = connect(&desktop);
    let nav = DialogNavigator::new(&session, tabbed.dialog.element());

    assert_eq!(nav.detect_tab(), TabState::Main);
    assert_eq!(nav.detect_tab(), TabState::Main);
    assert!(desktop.events().is_empty());

    nav.move_tab(Direction::Right, 2).unwrap();
    assert_eq!(nav.detect_tab(), TabState::Custom);
}

#[test]
fn test_go_to_each_pane_from_each_pane() {
    let desktop = FakeDesktop::new();
    let main = desktop.main_window();
    let tabbed = TabbedDialog::install(&desktop, &main, "New Matter");
    let (session, _) = connect(&desktop);
    let nav = DialogNavigator::new(&session, tabbed.dialog.element());

    let targets = [
        TabState::Billing,
        TabState::Custom,
        TabState::Main,
        TabState::Custom,
        TabState::Billing,
        TabState::Main,
    ];
    for target in targets {
        let outcome = nav.go_to(target).unwrap();
        assert!(outcome.confirmed(), "expected {target}, landed on {}", outcome.detected);
        assert_eq!(nav.detect_tab(), target);
    }
}

#[test]
fn test_go_to_main_always_anchors_left() {
    let desktop = FakeDesktop::new();
    let main = desktop.main_window();
    let tabbed = TabbedDialog::install(&desktop, &main, "New Matter");
    let (session, _) = connect(&desktop);
    let nav = DialogNavigator::new(&session, tabbed.dialog.element());

    nav.go_to_main().unwrap().require().unwrap();
    assert_eq!(desktop.keys(), vec![Key::CtrlLeft, Key::CtrlLeft]);
}

#[test]
fn test_go_to_reports_desync_when_dialog_does_not_move() {
    let desktop = FakeDesktop::new();
    let main = desktop.main_window();
    let tabbed = TabbedDialog::install(&desktop, &main, "New Matter");
    tabbed.frozen.store(true, Ordering::SeqCst);
    let (session, _) = connect(&desktop);
    let nav = DialogNavigator::new(&session, tabbed.dialog.element());

    let outcome = nav.go_to_custom().unwrap();
    assert!(!outcome.confirmed());
    assert_eq!(outcome.target, TabState::Custom);
    assert_eq!(outcome.detected, TabState::Main);
    assert!(matches!(
        outcome.require(),
        Err(AutomationError::NavigationDesync { .. })
    ));
}
