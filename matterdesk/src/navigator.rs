//! Tab navigation inside the application's modal dialogs.
//!
//! The dialogs expose no selectable tab control. The only way to change pane is the
//! Ctrl+Left / Ctrl+Right focus-shift shortcut, which works only while an edit control
//! holds focus. The active pane is inferred from the static labels it shows.

use crate::config::ms;
use crate::element::{roles, UIElement};
use crate::errors::AutomationError;
use crate::keys::Direction;
use crate::session::Session;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, instrument, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TabState {
    Main,
    Billing,
    Custom,
    Unknown,
}

impl TabState {
    /// Number of right moves from Main.
    fn offset_from_main(self) -> usize {
        match self {
            TabState::Main | TabState::Unknown => 0,
            TabState::Billing => 1,
            TabState::Custom => 2,
        }
    }
}

impl fmt::Display for TabState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TabState::Main => "main",
            TabState::Billing => "billing",
            TabState::Custom => "custom",
            TabState::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// Labels that identify each pane. These differ between releases of the application.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TabMarkers {
    /// Substring of a label only present on the Billing pane.
    pub billing: String,
    /// Substring of a label only present on the Custom pane.
    pub custom: String,
    /// Labels that must all appear in one pane for it to be Main.
    pub main: Vec<String>,
}

impl Default for TabMarkers {
    fn default() -> Self {
        Self {
            billing: "Billing Template".to_string(),
            custom: "BARREAU-".to_string(),
            main: vec!["Type of Law".to_string(), "Responsible Lawyer".to_string()],
        }
    }
}

/// Classifies a snapshot of pane label texts.
///
/// Panes are checked in order and the first one that identifies itself decides.
pub fn detect(panes: &[Vec<String>], markers: &TabMarkers) -> TabState {
    for texts in panes {
        if texts.iter().any(|t| t.contains(&markers.billing)) {
            return TabState::Billing;
        }
        if texts.iter().any(|t| t.contains(&markers.custom)) {
            return TabState::Custom;
        }
        if !markers.main.is_empty() && markers.main.iter().all(|m| texts.contains(m)) {
            return TabState::Main;
        }
    }
    TabState::Unknown
}

/// Key moves needed for one transition: `left` shifts first, then `right` shifts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveSpec {
    pub left: usize,
    pub right: usize,
}

impl MoveSpec {
    const NONE: MoveSpec = MoveSpec { left: 0, right: 0 };
    /// Moving left twice lands on Main from any pane; extra shifts past the edge are ignored.
    const ANCHOR: usize = 2;

    pub fn is_empty(&self) -> bool {
        self.left == 0 && self.right == 0
    }
}

/// Transition table with Main as the anchor.
///
/// Only a confirmed Main is trusted as a starting point for relative moves. Any other
/// source state is first re-anchored on Main. Main itself is always reached by the full
/// anchor distance, because a stale reading must never leave the dialog off Main.
pub fn route(from: TabState, to: TabState) -> MoveSpec {
    match (from, to) {
        (_, TabState::Unknown) => MoveSpec::NONE,
        (_, TabState::Main) => MoveSpec {
            left: MoveSpec::ANCHOR,
            right: 0,
        },
        (TabState::Main, target) => MoveSpec {
            left: 0,
            right: target.offset_from_main(),
        },
        (_, target) => MoveSpec {
            left: MoveSpec::ANCHOR,
            right: target.offset_from_main(),
        },
    }
}

/// Result of a navigation attempt. Navigation never fails hard on a wrong pane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavOutcome {
    pub target: TabState,
    pub detected: TabState,
}

impl NavOutcome {
    pub fn confirmed(&self) -> bool {
        self.target == self.detected
    }

    /// Strict form for callers that cannot continue on the wrong pane.
    pub fn require(self) -> Result<TabState, AutomationError> {
        if self.confirmed() {
            Ok(self.detected)
        } else {
            Err(AutomationError::NavigationDesync {
                expected: self.target.to_string(),
                detected: self.detected.to_string(),
            })
        }
    }
}

pub struct DialogNavigator<'a> {
    session: &'a Session,
    dialog: UIElement,
}

impl<'a> DialogNavigator<'a> {
    pub fn new(session: &'a Session, dialog: UIElement) -> Self {
        Self { session, dialog }
    }

    pub fn dialog(&self) -> &UIElement {
        &self.dialog
    }

    fn pane_texts(&self) -> Result<Vec<Vec<String>>, AutomationError> {
        self.dialog
            .descendants_by_role(roles::PANE)?
            .iter()
            .map(|pane| pane.visible_texts())
            .collect()
    }

    /// Reads the dialog and classifies the active pane. Read-only.
    pub fn detect_tab(&self) -> TabState {
        match self.pane_texts() {
            Ok(panes) => detect(&panes, &self.session.config().tabs),
            Err(e) => {
                debug!("could not read dialog panes: {}", e);
                TabState::Unknown
            }
        }
    }

    /// Focuses the first enabled edit control; the focus-shift shortcut needs one.
    fn focus_first_edit(&self) -> Result<(), AutomationError> {
        for edit in self.dialog.descendants_by_role(roles::EDIT)? {
            if !edit.is_enabled().unwrap_or(false) {
                continue;
            }
            if edit.focus().is_ok() {
                self.session
                    .settle(ms(self.session.config().timings.focus_settle_ms));
                return Ok(());
            }
        }
        Err(AutomationError::ElementNotFound(
            "no focusable edit control in dialog".to_string(),
        ))
    }

    /// Shifts the dialog `times` panes in `direction`.
    #[instrument(skip(self))]
    pub fn move_tab(&self, direction: Direction, times: usize) -> Result<(), AutomationError> {
        let settle = ms(self.session.config().timings.tab_shift_settle_ms);
        for _ in 0..times {
            self.focus_first_edit()?;
            self.session.press(direction.shift_key())?;
            self.session.settle(settle);
        }
        Ok(())
    }

    /// Moves to `target` and reports where the dialog actually ended up.
    #[instrument(skip(self))]
    pub fn go_to(&self, target: TabState) -> Result<NavOutcome, AutomationError> {
        let from = self.detect_tab();
        let spec = route(from, target);
        debug!("route {} -> {}: {:?}", from, target, spec);

        self.move_tab(Direction::Left, spec.left)?;
        self.move_tab(Direction::Right, spec.right)?;

        let outcome = NavOutcome {
            target,
            detected: self.detect_tab(),
        };
        if !outcome.confirmed() {
            warn!(
                "{}",
                AutomationError::NavigationDesync {
                    expected: target.to_string(),
                    detected: outcome.detected.to_string(),
                }
            );
        }
        Ok(outcome)
    }

    pub fn go_to_main(&self) -> Result<NavOutcome, AutomationError> {
        self.go_to(TabState::Main)
    }

    pub fn go_to_billing(&self) -> Result<NavOutcome, AutomationError> {
        self.go_to(TabState::Billing)
    }

    pub fn go_to_custom(&self) -> Result<NavOutcome, AutomationError> {
        self.go_to(TabState::Custom)
    }
}
