use super::{capture_text, Amount};
use crate::element::UIElement;
use crate::errors::AutomationError;
use crate::session::Session;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tracing::{info, instrument, warn};

/// Balance labels printed in the Close Matter dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum BalanceLabel {
    UnbilledDisbursements,
    AccountsReceivable,
    GeneralRetainer,
    Trust,
}

static UNBILLED_RE: Lazy<Regex> = Lazy::new(|| label_regex(r"Unbd D"));
// OCR often drops or garbles the slash
static RECEIVABLE_RE: Lazy<Regex> = Lazy::new(|| label_regex(r"A\S?R"));
// "Rtnr" is rarely read cleanly; anchor on the prefix
static RETAINER_RE: Lazy<Regex> = Lazy::new(|| label_regex(r"Gen\S*"));
static TRUST_RE: Lazy<Regex> = Lazy::new(|| label_regex(r"Trust"));

fn label_regex(pattern: &str) -> Regex {
    Regex::new(&format!("(?i){pattern}")).expect("label pattern is valid")
}

impl BalanceLabel {
    pub const ALL: [BalanceLabel; 4] = [
        BalanceLabel::UnbilledDisbursements,
        BalanceLabel::AccountsReceivable,
        BalanceLabel::GeneralRetainer,
        BalanceLabel::Trust,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BalanceLabel::UnbilledDisbursements => "Unbd D",
            BalanceLabel::AccountsReceivable => "A/R",
            BalanceLabel::GeneralRetainer => "Gen Rtnr",
            BalanceLabel::Trust => "Trust",
        }
    }

    fn pattern(&self) -> &'static Regex {
        match self {
            BalanceLabel::UnbilledDisbursements => &*UNBILLED_RE,
            BalanceLabel::AccountsReceivable => &*RECEIVABLE_RE,
            BalanceLabel::GeneralRetainer => &*RETAINER_RE,
            BalanceLabel::Trust => &*TRUST_RE,
        }
    }

    /// First amount after the first occurrence of this label in `text`, looking no further
    /// than the next known label.
    pub fn extract(&self, text: &str) -> Option<Amount> {
        let found = self.pattern().find(text)?;
        let rest = &text[found.end()..];
        let end = Self::ALL
            .iter()
            .filter(|other| *other != self)
            .filter_map(|other| other.pattern().find(rest))
            .map(|m| m.start())
            .min()
            .unwrap_or(rest.len());
        Amount::first_in(&rest[..end])
    }
}

impl fmt::Display for BalanceLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Amounts read for one set of labels. `None` means the label was not recognised.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct FinancialSnapshot {
    values: BTreeMap<BalanceLabel, Option<Amount>>,
}

impl FinancialSnapshot {
    /// Every label unresolved, for when the capture itself failed.
    pub fn unresolved(labels: &[BalanceLabel]) -> Self {
        Self {
            values: labels.iter().map(|l| (*l, None)).collect(),
        }
    }

    pub fn get(&self, label: BalanceLabel) -> Option<Amount> {
        self.values.get(&label).copied().flatten()
    }

    pub fn labels(&self) -> impl Iterator<Item = BalanceLabel> + '_ {
        self.values.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (BalanceLabel, Option<Amount>)> + '_ {
        self.values.iter().map(|(l, v)| (*l, *v))
    }

    /// Readable summary for logs and user warnings.
    pub fn describe(&self) -> String {
        self.values
            .iter()
            .map(|(label, value)| match value {
                Some(v) => format!("{label}: {v}"),
                None => format!("{label}: not found"),
            })
            .collect::<Vec<_>>()
            .join(", ")
    }
}

pub fn extract_snapshot(text: &str, labels: &[BalanceLabel]) -> FinancialSnapshot {
    FinancialSnapshot {
        values: labels.iter().map(|l| (*l, l.extract(text))).collect(),
    }
}

/// True when every expected label resolved to exactly zero. True means the matter may close.
pub fn is_balance_clear(snapshot: &FinancialSnapshot) -> bool {
    !snapshot.values.is_empty()
        && snapshot
            .values
            .values()
            .all(|v| matches!(v, Some(amount) if amount.is_zero()))
}

/// OCRs the balance strip of `window` and extracts `labels`.
#[instrument(skip(session, window))]
pub fn capture_balances(
    session: &Session,
    window: &UIElement,
    labels: &[BalanceLabel],
) -> Result<FinancialSnapshot, AutomationError> {
    let text = capture_text(session, window, &session.config().ocr.balances)?;
    let snapshot = extract_snapshot(&text, labels);
    if is_balance_clear(&snapshot) {
        info!("Balances clear: {}", snapshot.describe());
    } else {
        warn!("Balances not clear: {}", snapshot.describe());
    }
    Ok(snapshot)
}
