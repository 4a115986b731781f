//! Run configuration.
//!
//! Everything that is tuned against a particular installation of the target application
//! (window title, pane markers, crop fractions, wait budgets, rates) lives here so it can
//! be overridden from a JSON file without a rebuild.

use crate::errors::AutomationError;
use crate::navigator::TabMarkers;
use crate::ocr::OcrConfig;
use crate::timesheet::TimesheetLayout;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

pub const TITLE_PATTERN_ENV: &str = "MATTERDESK_TITLE_PATTERN";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AutomationConfig {
    /// Regular expression matched against top-level window titles.
    pub window_title_pattern: String,
    pub dialog_timeout_ms: u64,
    pub poll_interval_ms: u64,
    pub dialogs: DialogTitles,
    pub timings: Timings,
    pub tabs: TabMarkers,
    pub ocr: OcrConfig,
    pub timesheet: TimesheetLayout,
    pub rates: RateTable,
    pub new_matter: NewMatterDefaults,
}

impl Default for AutomationConfig {
    fn default() -> Self {
        Self {
            window_title_pattern: ".*PCLaw® Enterprise.*".to_string(),
            dialog_timeout_ms: 15_000,
            poll_interval_ms: 100,
            dialogs: DialogTitles::default(),
            timings: Timings::default(),
            tabs: TabMarkers::default(),
            ocr: OcrConfig::default(),
            timesheet: TimesheetLayout::default(),
            rates: RateTable::default(),
            new_matter: NewMatterDefaults::default(),
        }
    }
}

impl AutomationConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, AutomationError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        let config: AutomationConfig = serde_json::from_str(&raw).map_err(|e| {
            AutomationError::InvalidArgument(format!("config {}: {e}", path.display()))
        })?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Applies environment overrides on top of file or default values.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(pattern) = std::env::var(TITLE_PATTERN_ENV) {
            if !pattern.trim().is_empty() {
                debug!("window title pattern overridden from {}", TITLE_PATTERN_ENV);
                self.window_title_pattern = pattern;
            }
        }
        self
    }

    pub fn dialog_timeout(&self) -> Duration {
        Duration::from_millis(self.dialog_timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DialogTitles {
    pub new_matter: String,
    pub close_matter: String,
    pub register: String,
    pub ok_button: String,
    pub cancel_button: String,
}

impl Default for DialogTitles {
    fn default() -> Self {
        Self {
            new_matter: "New Matter".to_string(),
            close_matter: "Close Matter".to_string(),
            register: "Register...".to_string(),
            ok_button: "OK".to_string(),
            cancel_button: "Cancel".to_string(),
        }
    }
}

/// Settle delays and wait budgets, in milliseconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Timings {
    pub focus_settle_ms: u64,
    pub tab_shift_settle_ms: u64,
    pub tab_key_settle_ms: u64,
    pub paste_settle_ms: u64,
    pub menu_open_ms: u64,
    pub menu_step_ms: u64,
    pub time_entry_open_ms: u64,
    pub matter_lookup_ms: u64,
    pub close_matter_load_ms: u64,
    pub close_confirm_step_ms: u64,
    pub register_load_ms: u64,
    pub bill_generate_ms: u64,
    pub bill_preview_ms: u64,
    pub bill_print_ms: u64,
    pub bill_finish_ms: u64,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            focus_settle_ms: 100,
            tab_shift_settle_ms: 200,
            tab_key_settle_ms: 200,
            paste_settle_ms: 100,
            menu_open_ms: 500,
            menu_step_ms: 200,
            time_entry_open_ms: 2_000,
            matter_lookup_ms: 3_000,
            close_matter_load_ms: 36_000,
            close_confirm_step_ms: 500,
            register_load_ms: 3_000,
            bill_generate_ms: 15_000,
            bill_preview_ms: 6_000,
            bill_print_ms: 2_000,
            bill_finish_ms: 4_000,
        }
    }
}

/// Shorthand used by callers that hold a `Timings` value.
pub fn ms(value: u64) -> Duration {
    Duration::from_millis(value)
}

/// Hourly rates for time entries, chosen from the entry description.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RateTable {
    pub consultation_rate: String,
    pub default_rate: String,
    /// Lower-cased phrases that select the consultation rate.
    pub consultation_keywords: Vec<String>,
}

impl Default for RateTable {
    fn default() -> Self {
        Self {
            consultation_rate: "125".to_string(),
            default_rate: "350".to_string(),
            consultation_keywords: vec![
                "initial consultation".to_string(),
                "consultation initiale".to_string(),
                "premiere consultation".to_string(),
                "first consultation".to_string(),
            ],
        }
    }
}

impl RateTable {
    pub fn rate_for(&self, description: &str) -> &str {
        let lowered = description.to_lowercase();
        if self
            .consultation_keywords
            .iter()
            .any(|k| lowered.contains(k.as_str()))
        {
            &self.consultation_rate
        } else {
            &self.default_rate
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NewMatterDefaults {
    /// Billing-template value present on a fresh matter.
    pub billing_template_placeholder: String,
    /// Template used for French-speaking clients.
    pub french_billing_template: String,
    /// Value written to every editable field of the Custom pane.
    pub custom_field_filler: String,
}

impl Default for NewMatterDefaults {
    fn default() -> Self {
        Self {
            billing_template_placeholder: "Default".to_string(),
            french_billing_template: "Facture francais".to_string(),
            custom_field_filler: "n/a".to_string(),
        }
    }
}
