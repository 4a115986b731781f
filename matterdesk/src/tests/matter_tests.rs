use super::fake::{Event, FakeDesktop, FakeNode, ScriptedNotifier, TabbedDialog};
use super::{connect, connect_with};
use crate::config::AutomationConfig;
use crate::element::{roles, Bounds};
use crate::keys::Key;
use crate::matter::{bill_matter, close_matter, new_matter};
use crate::payload::Payload;
use crate::AutomationError;
use std::sync::atomic::Ordering;
use std::sync::Arc;

const MATTER: &str = "2025-0042";

fn dialog_under(desktop: &FakeDesktop, main: &Arc<FakeNode>, title: &str) -> Arc<FakeNode> {
    let dialog = desktop
        .node(roles::WINDOW, title)
        .with_bounds(Bounds::new(100.0, 50.0, 400.0, 200.0));
    main.add(dialog.clone());
    dialog
}

fn intake(language: &str) -> Payload {
    Payload::from_json(&format!(
        r#"{{"form": {{"clientName": "Marie Tremblay", "clientLanguage": "{language}",
                      "caseType": "estate", "lawyerId": "MM", "clientTitle": "Mme",
                      "clientPhone": "514-555-0199", "clientEmail": "mt@example.com"}},
            "case": {{}}, "lawyer": {{"name": "M. Martin"}}}}"#
    ))
    .unwrap()
}

#[test]
fn test_new_matter_french_sets_template_and_custom_fields() {
    let desktop = FakeDesktop::new();
    let main = desktop.main_window();
    let tabbed = TabbedDialog::install(&desktop, &main, "New Matter");
    let (session, _) = connect(&desktop);
    let notifier = ScriptedNotifier::default();

    let report = new_matter(&session, &notifier, &intake("Français")).unwrap();
    assert!(report.warnings.is_empty(), "{:?}", report.warnings);

    assert_eq!(
        &desktop.keys()[..4],
        &[Key::Alt('f'), Key::Down, Key::Right, Key::Enter]
    );
    let pasted = desktop.pasted();
    assert_eq!(pasted.len(), 11);
    assert_eq!(pasted[0], "est");
    assert_eq!(pasted[2], "MM");
    assert_eq!(pasted[3], "Consultation en droit des successions");
    assert_eq!(pasted[10], "Facture francais");

    assert!(desktop
        .events()
        .contains(&Event::SetValue("Template".to_string(), String::new())));
    for edit in &tabbed.custom_edits {
        assert_eq!(edit.current_value(), "n/a");
    }
    assert_eq!(tabbed.main_edits[1].current_value(), "");
    assert_eq!(tabbed.tab.load(Ordering::SeqCst), 0);
    assert_eq!(notifier.count("info"), 1);
}

#[test]
fn test_new_matter_english_skips_billing_pane() {
    let desktop = FakeDesktop::new();
    let main = desktop.main_window();
    let tabbed = TabbedDialog::install(&desktop, &main, "New Matter");
    let (session, _) = connect(&desktop);
    let notifier = ScriptedNotifier::default();

    let report = new_matter(&session, &notifier, &intake("English")).unwrap();
    assert!(report.warnings.is_empty());
    assert_eq!(desktop.pasted().len(), 10);
    assert_eq!(tabbed.billing_template.current_value(), "Default");
    assert_eq!(tabbed.custom_edits[1].current_value(), "n/a");
    assert_eq!(tabbed.tab.load(Ordering::SeqCst), 0);
}

#[test]
fn test_new_matter_warns_when_dialog_ignores_tab_shifts() {
    let desktop = FakeDesktop::new();
    let main = desktop.main_window();
    let tabbed = TabbedDialog::install(&desktop, &main, "New Matter");
    tabbed.frozen.store(true, Ordering::SeqCst);
    let (session, _) = connect(&desktop);

    let report = new_matter(&session, &ScriptedNotifier::default(), &intake("English")).unwrap();
    assert_eq!(report.warnings.len(), 1);
    assert!(report.warnings[0].contains("custom"));
}

#[test]
fn test_new_matter_requires_client_name() {
    let desktop = FakeDesktop::new();
    desktop.main_window();
    let (session, _) = connect(&desktop);
    let payload = Payload::from_json(r#"{"form": {"caseType": "estate"}}"#).unwrap();

    let result = new_matter(&session, &ScriptedNotifier::default(), &payload);
    assert!(matches!(result, Err(AutomationError::Payload(_))));
    assert!(desktop.events().is_empty());
}

#[test]
fn test_close_matter_confirms_when_balances_clear() {
    let desktop = FakeDesktop::new();
    let main = desktop.main_window();
    dialog_under(&desktop, &main, "Close Matter");
    desktop.queue_ocr("Unbd D 0.00   A/R 0.00\nGen Rtnr 0.00   Trust 0.00");
    let (session, _) = connect(&desktop);
    let notifier = ScriptedNotifier::default();

    let report = close_matter(&session, &notifier, MATTER).unwrap();
    assert_eq!(report.matter_id.as_deref(), Some(MATTER));

    assert_eq!(desktop.pasted(), vec![MATTER, "No physical file"]);
    assert_eq!(desktop.captures(), vec![Bounds::new(120.0, 190.0, 360.0, 56.0)]);
    let keys = desktop.keys();
    assert_eq!(
        &keys[keys.len() - 4..],
        &[Key::Char('v'), Key::Enter, Key::Enter, Key::Enter]
    );
    assert_eq!(notifier.count("info"), 1);
}

#[test]
fn test_close_matter_aborts_on_nonzero_balance() {
    let desktop = FakeDesktop::new();
    let main = desktop.main_window();
    dialog_under(&desktop, &main, "Close Matter");
    desktop.queue_ocr("Unbd D 0.00   A/R 12.50\nGen Rtnr 0.00   Trust 0.00");
    let (session, _) = connect(&desktop);
    let notifier = ScriptedNotifier::default();

    let result = close_matter(&session, &notifier, MATTER);
    assert!(matches!(result, Err(AutomationError::NonZeroBalanceAbort(_))));
    assert_eq!(desktop.keys().last(), Some(&Key::Char('v')));
    assert_eq!(notifier.count("warning"), 1);
    assert_eq!(notifier.count("info"), 0);
}

#[test]
fn test_close_matter_aborts_when_ocr_reads_nothing() {
    let desktop = FakeDesktop::new();
    let main = desktop.main_window();
    dialog_under(&desktop, &main, "Close Matter");
    let (session, _) = connect(&desktop);
    let notifier = ScriptedNotifier::default();

    let result = close_matter(&session, &notifier, MATTER);
    assert!(matches!(result, Err(AutomationError::NonZeroBalanceAbort(_))));
    assert_eq!(desktop.keys().last(), Some(&Key::Char('v')));
}

#[test]
fn test_close_matter_times_out_without_dialog() {
    let desktop = FakeDesktop::new();
    desktop.main_window();
    let config = AutomationConfig {
        dialog_timeout_ms: 500,
        ..AutomationConfig::default()
    };
    let (session, _) = connect_with(&desktop, config);

    let result = close_matter(&session, &ScriptedNotifier::default(), MATTER);
    assert!(matches!(result, Err(AutomationError::DialogTimeout { .. })));
    assert!(desktop.captures().is_empty());
}

#[test]
fn test_bill_matter_uses_latest_register_date() {
    let desktop = FakeDesktop::new();
    let main = desktop.main_window();
    dialog_under(&desktop, &main, "Register...");
    main.add(desktop.node(roles::BUTTON, "OK"));
    desktop.queue_ocr("Trust 0.00   Gen Rtnr 143.72");
    desktop.queue_ocr("2025-06-30 Fees\n2025-07-02 Disbursement\n2024-12-31 Opening");
    let (session, _) = connect(&desktop);
    let notifier = ScriptedNotifier::default();

    let report = bill_matter(&session, &notifier, MATTER).unwrap();
    assert_eq!(report.matter_id.as_deref(), Some(MATTER));
    assert_eq!(
        desktop.pasted(),
        vec![MATTER, MATTER, "2025/07/02", "2025/07/02"]
    );
    assert_eq!(desktop.clicks(), vec!["OK"]);
    assert_eq!(
        desktop.captures(),
        vec![
            Bounds::new(100.0, 200.0, 200.0, 50.0),
            Bounds::new(100.0, 50.0, 200.0, 100.0),
        ]
    );
    assert_eq!(desktop.keys().iter().filter(|k| **k == Key::Alt('p')).count(), 5);
}

#[test]
fn test_bill_matter_aborts_on_trust_balance() {
    let desktop = FakeDesktop::new();
    let main = desktop.main_window();
    dialog_under(&desktop, &main, "Register...");
    main.add(desktop.node(roles::BUTTON, "OK"));
    desktop.queue_ocr("Trust 50.00   Gen Rtnr 143.72");
    let (session, _) = connect(&desktop);
    let notifier = ScriptedNotifier::default();

    let result = bill_matter(&session, &notifier, MATTER);
    assert!(matches!(result, Err(AutomationError::NonZeroBalanceAbort(_))));
    assert!(!desktop.keys().contains(&Key::Ctrl('b')));
    assert!(desktop.clicks().is_empty());
    assert_eq!(desktop.captures().len(), 1);
    assert_eq!(notifier.count("error"), 1);
    assert_eq!(
        notifier.notices()[0].1,
        format!("Trust balance is 50.00, not zero for matter {MATTER}. Aborting.")
    );
}

#[test]
fn test_bill_matter_aborts_on_unknown_retainer() {
    let desktop = FakeDesktop::new();
    let main = desktop.main_window();
    dialog_under(&desktop, &main, "Register...");
    desktop.queue_ocr("Trust 0.00   Gen Rtnr 99.00");
    let (session, _) = connect(&desktop);

    let result = bill_matter(&session, &ScriptedNotifier::default(), MATTER);
    match result {
        Err(AutomationError::NonZeroBalanceAbort(reason)) => {
            assert!(reason.starts_with("General retainer 99.00 is not a known standing deposit"));
        }
        other => panic!("expected a balance abort, got {other:?}"),
    }
    assert!(!desktop.keys().contains(&Key::Ctrl('b')));
}

#[test]
fn test_bill_matter_aborts_without_table_date() {
    let desktop = FakeDesktop::new();
    let main = desktop.main_window();
    dialog_under(&desktop, &main, "Register...");
    desktop.queue_ocr("Trust 0.00   Gen Rtnr 143.72");
    desktop.queue_ocr("Fees\nDisbursement");
    let (session, _) = connect(&desktop);

    let result = bill_matter(&session, &ScriptedNotifier::default(), MATTER);
    match result {
        Err(AutomationError::NonZeroBalanceAbort(reason)) => {
            assert!(reason.starts_with("No billable date found in the register"));
        }
        other => panic!("expected a balance abort, got {other:?}"),
    }
    assert_eq!(desktop.captures().len(), 2);
}
