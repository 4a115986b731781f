//! Matter-level operations: open a new matter, close one, bill one.
//!
//! Closing and billing are destructive and cannot be undone from the automation side, so
//! both are gated on an OCR read of the balances and refuse to proceed on any doubt.

use crate::config::ms;
use crate::element::{roles, UIElement};
use crate::errors::AutomationError;
use crate::fill::fill_by_index;
use crate::keys::Key;
use crate::navigator::{DialogNavigator, NavOutcome};
use crate::notify::Notifier;
use crate::ocr::{capture_balances, is_balance_clear, latest_register_date, BalanceLabel, FinancialSnapshot};
use crate::payload::Payload;
use crate::session::Session;
use serde::Serialize;
use tracing::{info, instrument, warn};

/// Closing reason entered on every matter closed through automation.
const CLOSE_REASON: &str = "No physical file";
const BILL_DATE_FORMAT: &str = "%Y/%m/%d";

#[derive(Debug, Clone, Default, Serialize)]
pub struct MatterReport {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matter_id: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

fn note_navigation(outcome: NavOutcome, warnings: &mut Vec<String>) {
    if !outcome.confirmed() {
        warnings.push(format!(
            "could not confirm the {} tab (detected {})",
            outcome.target, outcome.detected
        ));
    }
}

/// File > Matter > New.
fn open_new_matter_dialog(session: &Session) -> Result<(), AutomationError> {
    let t = &session.config().timings;
    session.press(Key::Alt('f'))?;
    session.settle(ms(t.menu_open_ms));
    session.press(Key::Down)?;
    session.settle(ms(t.menu_step_ms));
    session.press(Key::Right)?;
    session.settle(ms(t.menu_step_ms));
    session.press(Key::Enter)
}

/// File > Matter > Close.
fn open_close_matter_dialog(session: &Session) -> Result<(), AutomationError> {
    let t = &session.config().timings;
    session.press(Key::Alt('f'))?;
    session.settle(ms(t.menu_open_ms));
    session.press(Key::Down)?;
    session.settle(ms(t.focus_settle_ms));
    session.press(Key::Right)?;
    session.settle(ms(t.focus_settle_ms));
    session.press_times(Key::Down, 2, ms(t.focus_settle_ms))?;
    session.press(Key::Enter)
}

/// Data > Register, positioned on `matter_id`.
fn open_register(session: &Session, matter_id: &str) -> Result<(), AutomationError> {
    let t = &session.config().timings;
    session.press(Key::Alt('d'))?;
    session.settle(ms(t.menu_open_ms));
    session.press(Key::Up)?;
    session.settle(ms(t.menu_step_ms));
    session.press(Key::Enter)?;

    session.press(Key::Alt('m'))?;
    session.paste(matter_id)?;
    session.settle(ms(t.close_confirm_step_ms));
    session.press(Key::Alt('s'))?;
    session.settle(ms(t.close_confirm_step_ms));
    session.press(Key::Enter)
}

/// Replaces the placeholder billing template with the French one.
fn set_french_billing_template(session: &Session, dialog: &UIElement) -> Result<bool, AutomationError> {
    let defaults = &session.config().new_matter;
    let target = dialog
        .descendants_by_role(roles::EDIT)?
        .into_iter()
        .find(|e| e.value().as_deref() == Some(defaults.billing_template_placeholder.as_str()));

    let Some(edit) = target else {
        warn!(
            "No edit holding '{}' on the billing pane",
            defaults.billing_template_placeholder
        );
        return Ok(false);
    };
    edit.set_value("")?;
    edit.focus()?;
    session.paste(&defaults.french_billing_template)?;
    info!("Billing template set to '{}'", defaults.french_billing_template);
    Ok(true)
}

/// Writes the filler value into every enabled edit of the custom pane.
fn fill_custom_fields(session: &Session, dialog: &UIElement) -> Result<usize, AutomationError> {
    let filler = &session.config().new_matter.custom_field_filler;
    let mut filled = 0;
    for edit in dialog.descendants_by_role(roles::EDIT)? {
        if !edit.is_enabled().unwrap_or(false) {
            continue;
        }
        if edit.set_value(filler).is_ok() {
            filled += 1;
        }
    }
    info!("Filled {} custom fields with '{}'", filled, filler);
    Ok(filled)
}

/// Opens a New Matter dialog and fills it from the intake payload. The dialog is left open
/// on the Main pane for a person to review and save.
#[instrument(skip(session, notifier, payload))]
pub fn new_matter(
    session: &Session,
    notifier: &dyn Notifier,
    payload: &Payload,
) -> Result<MatterReport, AutomationError> {
    let fields = payload.consultation_fields()?;
    session.bring_to_foreground()?;
    open_new_matter_dialog(session)?;
    let dialog = session.wait_for_dialog(&session.config().dialogs.new_matter)?;

    fill_by_index(session, &fields)?;

    let nav = DialogNavigator::new(session, dialog.clone());
    let mut warnings = Vec::new();

    if payload.is_french() {
        note_navigation(nav.go_to_billing()?, &mut warnings);
        if !set_french_billing_template(session, &dialog)? {
            warnings.push("billing template placeholder not found".to_string());
        }
    }

    note_navigation(nav.go_to_custom()?, &mut warnings);
    fill_custom_fields(session, &dialog)?;
    note_navigation(nav.go_to_main()?, &mut warnings);

    let message = "New matter created successfully.".to_string();
    notifier.info(&message);
    Ok(MatterReport {
        message,
        matter_id: None,
        warnings,
    })
}

/// Closes `matter_id` if, and only if, every balance in the close dialog reads zero.
#[instrument(skip(session, notifier))]
pub fn close_matter(
    session: &Session,
    notifier: &dyn Notifier,
    matter_id: &str,
) -> Result<MatterReport, AutomationError> {
    let t = &session.config().timings;
    session.bring_to_foreground()?;
    open_close_matter_dialog(session)?;

    session.press(Key::Alt('m'))?;
    session.paste(matter_id)?;
    session.press(Key::Tab)?;
    // the close dialog recomputes balances for the matter before it accepts input
    session.settle(ms(t.close_matter_load_ms));
    session.press(Key::Enter)?;

    session.press(Key::Char('d'))?;
    session.press(Key::Char('f'))?;
    session.settle(ms(t.menu_step_ms));
    session.paste(CLOSE_REASON)?;
    session.settle(ms(t.menu_step_ms));
    session.press(Key::Tab)?;
    session.press(Key::Char('v'))?;

    let dialog = session.wait_for_dialog(&session.config().dialogs.close_matter)?;
    dialog.focus()?;
    let snapshot = match capture_balances(session, &dialog, &BalanceLabel::ALL) {
        Ok(snapshot) => snapshot,
        Err(AutomationError::OcrExtractionFailure(reason)) => {
            warn!("Balance OCR failed: {}", reason);
            FinancialSnapshot::unresolved(&BalanceLabel::ALL)
        }
        Err(e) => return Err(e),
    };

    if !is_balance_clear(&snapshot) {
        notifier.warning(&format!(
            "Remaining balance is not zero for matter {matter_id}. It should not be closed until all balances are cleared. ({})",
            snapshot.describe()
        ));
        return Err(AutomationError::NonZeroBalanceAbort(snapshot.describe()));
    }

    session.settle(ms(t.close_confirm_step_ms));
    session.press_times(Key::Enter, 3, ms(t.close_confirm_step_ms))?;

    let message = format!("Successfully closed matter {matter_id}");
    notifier.info(&message);
    Ok(MatterReport {
        message,
        matter_id: Some(matter_id.to_string()),
        warnings: Vec::new(),
    })
}

/// Bills `matter_id` as of the most recent register date, after the register gate passes.
#[instrument(skip(session, notifier))]
pub fn bill_matter(
    session: &Session,
    notifier: &dyn Notifier,
    matter_id: &str,
) -> Result<MatterReport, AutomationError> {
    let config = session.config();
    let t = &config.timings;
    session.bring_to_foreground()?;
    open_register(session, matter_id)?;
    session.settle(ms(t.register_load_ms));

    let register = session.wait_for_dialog(&config.dialogs.register)?;
    register.focus()?;
    let reading = latest_register_date(session, &register)?;
    let Some(date) = reading.date() else {
        let cause = reading.hold_reason().unwrap_or_default();
        let reason = format!("{cause} for matter {matter_id}");
        notifier.error(&format!("{reason}. Aborting."));
        return Err(AutomationError::NonZeroBalanceAbort(reason));
    };
    let date = date.format(BILL_DATE_FORMAT).to_string();

    session.press(Key::Ctrl('b'))?;
    session.press(Key::Alt('m'))?;
    session.settle(ms(t.menu_step_ms));
    session.paste(matter_id)?;
    session.settle(ms(t.menu_step_ms));
    session.press(Key::Alt('b'))?;
    session.paste(&date)?;
    session.settle(ms(t.menu_step_ms));
    // the as-of date is the same day
    session.press(Key::Alt('a'))?;
    session.paste(&date)?;
    session.settle(ms(t.menu_step_ms));
    session.click_button(&config.dialogs.ok_button)?;

    session.settle(ms(t.bill_generate_ms));
    // accept the default bill settings
    session.press(Key::Alt('m'))?;
    session.press(Key::Enter)?;

    session.settle(ms(t.bill_preview_ms));
    // the preview ignores the shortcut until it has finished rendering
    for _ in 0..5 {
        session.press(Key::Alt('p'))?;
    }
    session.settle(ms(t.bill_print_ms));

    session.press(Key::Enter)?;
    session.settle(ms(t.menu_step_ms));
    session.press(Key::Alt('m'))?;
    session.press(Key::Alt('s'))?;
    session.settle(ms(t.menu_step_ms));
    session.press(Key::Enter)?;
    session.settle(ms(t.bill_finish_ms));

    let message = format!("Successfully billed matter {matter_id}");
    notifier.info(&message);
    Ok(MatterReport {
        message,
        matter_id: Some(matter_id.to_string()),
        warnings: Vec::new(),
    })
}
