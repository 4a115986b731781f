//! Optical verification of figures the accessibility tree does not expose.
//!
//! Balance fields in the close and register dialogs are owner-drawn; the only way to read
//! them is to screenshot part of the window and OCR it.

pub mod balances;
pub mod money;
pub mod register;

use crate::element::{Bounds, UIElement};
use crate::errors::AutomationError;
use crate::session::Session;
use serde::{Deserialize, Serialize};
use tracing::debug;

pub use balances::{
    capture_balances, extract_snapshot, is_balance_clear, BalanceLabel, FinancialSnapshot,
};
pub use money::Amount;
pub use register::{latest_date_in, latest_register_date, register_verdict, RegisterReading, RegisterVerdict};

/// Sub-rectangle of a window expressed as fractions of its width and height.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CropFraction {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

impl CropFraction {
    pub const fn new(left: f64, top: f64, right: f64, bottom: f64) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Absolute screen rectangle of this crop within `window`, truncated to whole pixels.
    pub fn apply(&self, window: Bounds) -> Bounds {
        let x0 = (window.x + window.width * self.left).trunc();
        let x1 = (window.x + window.width * self.right).trunc();
        let y0 = (window.y + window.height * self.top).trunc();
        let y1 = (window.y + window.height * self.bottom).trunc();
        Bounds::new(x0, y0, x1 - x0, y1 - y0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    /// Balance strip of the Close Matter dialog.
    pub balances: CropFraction,
    /// Lower-left corner of the Register window with the trust and retainer totals.
    pub register_totals: CropFraction,
    /// Upper-left quarter of the Register window with the transaction table.
    pub register_table: CropFraction,
    /// General-retainer figures that are known to be standing deposits and may be billed over.
    pub retainer_whitelist: Vec<Amount>,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            balances: CropFraction::new(0.05, 0.70, 0.95, 0.98),
            register_totals: CropFraction::new(0.0, 0.75, 0.5, 1.0),
            register_table: CropFraction::new(0.0, 0.0, 0.5, 0.5),
            retainer_whitelist: vec![Amount::from_cents(14372), Amount::from_cents(40241)],
        }
    }
}

/// Screenshots `crop` of `window` and returns the recognised text.
pub fn capture_text(
    session: &Session,
    window: &UIElement,
    crop: &CropFraction,
) -> Result<String, AutomationError> {
    let bounds = window.bounds()?;
    let region = crop.apply(bounds);
    if region.is_empty() {
        return Err(AutomationError::OcrExtractionFailure(format!(
            "empty capture region {region:?} for window {bounds:?}"
        )));
    }
    let shot = session.engine().capture_region(region)?;
    let text = session.engine().ocr_screenshot(&shot)?;
    debug!("OCR {:?}: {:?}", region, text);
    Ok(text)
}
