//! Two-stage gate on the matter Register before billing.
//!
//! Stage one reads the trust and general-retainer totals: billing only proceeds when trust
//! is exactly zero and the retainer is a known standing deposit. Stage two reads the
//! transaction table and returns its most recent date, used as the bill's as-of date.

use super::{capture_text, Amount};
use crate::element::UIElement;
use crate::errors::AutomationError;
use crate::session::Session;
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{error, info, instrument, warn};

static TRUST_TOTAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)Trust[:\s]*(-?\d+(?:\.\d{1,2})?)").expect("trust pattern is valid")
});
static RETAINER_TOTAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)Gen(?:\s+\S+)?[:\s]*(-?\d+(?:\.\d{1,2})?)").expect("retainer pattern is valid")
});
static TABLE_DATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(20\d{2})[/-](\d{1,2})[/-](\d{1,2})\b").expect("date pattern is valid")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterVerdict {
    Clear,
    /// Trust is unreadable or non-zero; a person has to look at it.
    TrustNotZero(Option<Amount>),
    /// Retainer is unreadable or not a whitelisted standing deposit.
    RetainerNotWhitelisted(Option<Amount>),
}

impl RegisterVerdict {
    /// Why billing is held back; `None` for a clear register.
    pub fn hold_reason(&self) -> Option<String> {
        match self {
            RegisterVerdict::Clear => None,
            RegisterVerdict::TrustNotZero(Some(v)) => Some(format!("Trust balance is {v}, not zero")),
            RegisterVerdict::TrustNotZero(None) => Some("Trust balance could not be read".to_string()),
            RegisterVerdict::RetainerNotWhitelisted(Some(v)) => {
                Some(format!("General retainer {v} is not a known standing deposit"))
            }
            RegisterVerdict::RetainerNotWhitelisted(None) => {
                Some("General retainer could not be read".to_string())
            }
        }
    }
}

/// What the register allows for billing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterReading {
    /// Gate passed; bill as of this date.
    Billable(NaiveDate),
    /// Totals need manual review.
    Held(RegisterVerdict),
    /// Totals are fine but the table has no readable date.
    NoDate,
}

impl RegisterReading {
    pub fn date(&self) -> Option<NaiveDate> {
        match self {
            RegisterReading::Billable(date) => Some(*date),
            _ => None,
        }
    }

    pub fn hold_reason(&self) -> Option<String> {
        match self {
            RegisterReading::Billable(_) => None,
            RegisterReading::Held(verdict) => verdict.hold_reason(),
            RegisterReading::NoDate => Some("No billable date found in the register".to_string()),
        }
    }
}

fn captured_amount(re: &Regex, text: &str) -> Option<Amount> {
    re.captures(text)
        .and_then(|c| c.get(1))
        .and_then(|m| Amount::parse(m.as_str()))
}

pub fn register_verdict(totals_text: &str, whitelist: &[Amount]) -> RegisterVerdict {
    let trust = captured_amount(&TRUST_TOTAL, totals_text);
    let retainer = captured_amount(&RETAINER_TOTAL, totals_text);
    info!("Register trust: {:?}, general retainer: {:?}", trust, retainer);

    match trust {
        Some(t) if t.is_zero() => {}
        other => return RegisterVerdict::TrustNotZero(other),
    }
    match retainer {
        Some(r) if whitelist.contains(&r) => RegisterVerdict::Clear,
        other => RegisterVerdict::RetainerNotWhitelisted(other),
    }
}

/// Most recent valid `20YY-M-D` or `20YY/M/D` date in `text`.
pub fn latest_date_in(text: &str) -> Option<NaiveDate> {
    TABLE_DATE
        .captures_iter(text)
        .filter_map(|c| {
            let y = c.get(1)?.as_str().parse().ok()?;
            let m = c.get(2)?.as_str().parse().ok()?;
            let d = c.get(3)?.as_str().parse().ok()?;
            NaiveDate::from_ymd_opt(y, m, d)
        })
        .max()
}

/// Runs both stages against the open Register window. The table is only read once the
/// totals pass.
#[instrument(skip(session, register))]
pub fn latest_register_date(
    session: &Session,
    register: &UIElement,
) -> Result<RegisterReading, AutomationError> {
    let ocr = &session.config().ocr;
    let totals = capture_text(session, register, &ocr.register_totals)?;
    let verdict = register_verdict(&totals, &ocr.retainer_whitelist);
    if let Some(reason) = verdict.hold_reason() {
        warn!("{}, billing needs manual review", reason);
        return Ok(RegisterReading::Held(verdict));
    }

    let table = capture_text(session, register, &ocr.register_table)?;
    match latest_date_in(&table) {
        Some(date) => {
            info!("Latest register date: {}", date);
            Ok(RegisterReading::Billable(date))
        }
        None => {
            error!("No valid date found in the register table");
            Ok(RegisterReading::NoDate)
        }
    }
}
