//! Label-proximity filling, for dialogs whose inputs sit to the right of a static label.

use crate::element::{roles, Bounds, UIElement};
use crate::errors::AutomationError;
use std::collections::HashSet;
use tracing::{info, warn};

/// Maximum vertical distance between label and input centre lines.
const MAX_ROW_OFFSET: f64 = 20.0;
/// Maximum gap between the label's right edge and the input's left edge.
const MAX_GAP: f64 = 300.0;

/// Index of the candidate closest to `label`, scored as horizontal gap plus vertical gap.
pub fn nearest_input(label: &Bounds, candidates: &[Bounds]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, rect) in candidates.iter().enumerate() {
        let dx = (rect.x - label.right()).abs();
        let dy = (rect.mid_y() - label.mid_y()).abs();
        if dx >= MAX_GAP || dy >= MAX_ROW_OFFSET {
            continue;
        }
        let score = dx + dy;
        if best.map_or(true, |(_, s)| score < s) {
            best = Some((i, score));
        }
    }
    best.map(|(i, _)| i)
}

#[derive(Debug, Default)]
pub struct LabelInputMap {
    pub matched: Vec<(String, UIElement)>,
    /// Requested labels that were not found or had no input close enough.
    pub missing: Vec<String>,
}

impl LabelInputMap {
    pub fn get(&self, label: &str) -> Option<&UIElement> {
        self.matched
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, el)| el)
    }
}

pub fn build_label_input_map(
    root: &UIElement,
    labels: &[&str],
) -> Result<LabelInputMap, AutomationError> {
    let wanted: HashSet<&str> = labels.iter().copied().collect();
    let label_controls: Vec<(String, Bounds)> = root
        .descendants_by_role(roles::TEXT)?
        .into_iter()
        .filter_map(|t| {
            let text = t.name_or_empty();
            if !wanted.contains(text.as_str()) {
                return None;
            }
            t.bounds().ok().map(|b| (text, b))
        })
        .collect();

    let inputs: Vec<(UIElement, Bounds)> = root
        .input_controls()?
        .into_iter()
        .filter_map(|el| el.bounds().ok().map(|b| (el, b)))
        .collect();
    let rects: Vec<Bounds> = inputs.iter().map(|(_, b)| *b).collect();

    let mut map = LabelInputMap::default();
    for (text, rect) in &label_controls {
        if map.get(text).is_some() {
            continue;
        }
        if let Some(i) = nearest_input(rect, &rects) {
            map.matched.push((text.clone(), inputs[i].0.clone()));
        }
    }
    for label in labels {
        if map.get(label).is_none() {
            map.missing.push(label.to_string());
        }
    }
    Ok(map)
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct LabelFillReport {
    pub filled: Vec<String>,
    pub missing: Vec<String>,
}

/// Sets each field's value on the input nearest to its label. Missing labels are reported.
pub fn fill_by_label(
    root: &UIElement,
    fields: &[(&str, &str)],
) -> Result<LabelFillReport, AutomationError> {
    let labels: Vec<&str> = fields.iter().map(|(l, _)| *l).collect();
    let map = build_label_input_map(root, &labels)?;

    let mut report = LabelFillReport {
        missing: map.missing.clone(),
        ..Default::default()
    };
    for (label, value) in fields {
        match map.get(label) {
            Some(input) => {
                input.set_value(value)?;
                info!("Filled '{}'", label);
                report.filled.push(label.to_string());
            }
            None => warn!("No input found for label '{}'", label),
        }
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nearest_input_prefers_same_row() {
        let label = Bounds::new(10.0, 100.0, 80.0, 20.0);
        let candidates = [
            Bounds::new(95.0, 130.0, 100.0, 20.0), // row below, dy = 30
            Bounds::new(120.0, 102.0, 100.0, 20.0), // same row, dx 30 dy 2
            Bounds::new(100.0, 112.0, 100.0, 20.0), // dx 10 dy 12
        ];
        assert_eq!(nearest_input(&label, &candidates), Some(2));
    }

    #[test]
    fn test_nearest_input_respects_gap_limits() {
        let label = Bounds::new(0.0, 0.0, 50.0, 20.0);
        let far_right = [Bounds::new(400.0, 0.0, 100.0, 20.0)];
        let off_row = [Bounds::new(60.0, 20.0, 100.0, 20.0)];
        assert_eq!(nearest_input(&label, &far_right), None);
        assert_eq!(nearest_input(&label, &off_row), None);
    }
}
