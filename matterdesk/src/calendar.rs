//! Appointment conflict checks against a lawyer's calendar.
//!
//! Calendar items can come back partially readable. A slot is only approved when every
//! item of the day could be read.

use crate::errors::AutomationError;
use chrono::{DateTime, Duration as DateDelta, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CalendarEvent {
    pub subject: String,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    /// Category string of the item; one category per lawyer, comma or semicolon separated.
    pub owner_category: String,
    pub all_day: bool,
}

impl CalendarEvent {
    pub fn belongs_to(&self, owner: &str) -> bool {
        let owner = owner.trim();
        !owner.is_empty()
            && self
                .owner_category
                .split([',', ';'])
                .any(|c| c.trim().eq_ignore_ascii_case(owner))
    }

    fn overlaps(&self, from: NaiveDateTime, to: NaiveDateTime) -> bool {
        self.start <= to && self.end >= from
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProposedSlot {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    /// Break the lawyer wants on each side of their existing appointments.
    pub buffer_minutes: i64,
}

impl ProposedSlot {
    /// Consultations are booked as one-hour slots.
    pub fn one_hour(start: NaiveDateTime, buffer_minutes: i64) -> Self {
        Self {
            start,
            end: start + DateDelta::hours(1),
            buffer_minutes,
        }
    }
}

/// Where calendar items come from. `None` entries are items that could not be read.
pub trait CalendarSource {
    fn events_between(
        &self,
        from: NaiveDateTime,
        to: NaiveDateTime,
    ) -> Result<Vec<Option<CalendarEvent>>, AutomationError>;
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawEvent {
    #[serde(default)]
    subject: String,
    start: String,
    end: String,
    #[serde(default, alias = "owner", alias = "category")]
    categories: String,
    #[serde(default, alias = "all_day")]
    all_day_event: bool,
}

/// Wall-clock time of an exported timestamp. Offsets are dropped: exports carry the
/// calendar's own local time.
fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if let Ok(with_offset) = DateTime::parse_from_rfc3339(value) {
        return Some(with_offset.naive_local());
    }
    let value = value.trim_end_matches(['Z', 'z']);
    [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
    ]
    .iter()
    .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
}

/// One exported item: the event when it is fully readable, and its start when at least
/// that much could be read.
struct ExportItem {
    start: Option<NaiveDateTime>,
    event: Option<CalendarEvent>,
}

impl ExportItem {
    /// Readable events count when they overlap the range. Unreadable ones count when their
    /// start is unknown or inside the range.
    fn within(&self, from: NaiveDateTime, to: NaiveDateTime) -> bool {
        match (&self.event, self.start) {
            (Some(event), _) => event.overlaps(from, to),
            (None, Some(start)) => start >= from && start <= to,
            (None, None) => true,
        }
    }
}

impl RawEvent {
    fn into_event(self) -> Option<CalendarEvent> {
        let start = parse_timestamp(&self.start)?;
        let end = parse_timestamp(&self.end)?;
        if end < start {
            return None;
        }
        Some(CalendarEvent {
            subject: self.subject,
            start,
            end,
            owner_category: self.categories,
            all_day: self.all_day_event,
        })
    }
}

/// Calendar exported as a JSON array of items.
pub struct JsonCalendarSource {
    path: PathBuf,
}

impl JsonCalendarSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Parses every item independently so one bad item does not hide the others.
    pub fn parse(raw: &str) -> Result<Vec<Option<CalendarEvent>>, AutomationError> {
        Ok(Self::parse_items(raw)?
            .into_iter()
            .map(|item| item.event)
            .collect())
    }

    fn parse_items(raw: &str) -> Result<Vec<ExportItem>, AutomationError> {
        let items: Vec<serde_json::Value> = serde_json::from_str(raw)
            .map_err(|e| AutomationError::InvalidArgument(format!("calendar export: {e}")))?;
        Ok(items
            .into_iter()
            .map(|item| {
                let start = item
                    .get("start")
                    .and_then(serde_json::Value::as_str)
                    .and_then(parse_timestamp);
                let event = serde_json::from_value::<RawEvent>(item.clone())
                    .ok()
                    .and_then(RawEvent::into_event);
                if event.is_none() {
                    debug!("unreadable calendar item: {}", item);
                }
                ExportItem { start, event }
            })
            .collect())
    }
}

impl CalendarSource for JsonCalendarSource {
    fn events_between(
        &self,
        from: NaiveDateTime,
        to: NaiveDateTime,
    ) -> Result<Vec<Option<CalendarEvent>>, AutomationError> {
        let raw = std::fs::read_to_string(&self.path)?;
        let events: Vec<Option<CalendarEvent>> = Self::parse_items(&raw)?
            .into_iter()
            .filter(|item| item.within(from, to))
            .map(|item| item.event)
            .collect();
        let unreadable = events.iter().filter(|e| e.is_none()).count();
        if unreadable > 0 {
            warn!("{} unreadable calendar items between {} and {}", unreadable, from, to);
        }
        Ok(events)
    }
}

/// Timed items overlapping `date`. Unreadable items the source returns for the day are kept
/// so validation can fail closed.
pub fn fetch_day_events(
    source: &dyn CalendarSource,
    date: NaiveDate,
) -> Result<Vec<Option<CalendarEvent>>, AutomationError> {
    let day_start = date.and_time(NaiveTime::default());
    let day_end = day_start + DateDelta::days(1) - DateDelta::milliseconds(1);
    let events: Vec<Option<CalendarEvent>> = source
        .events_between(day_start, day_end)?
        .into_iter()
        .filter(|e| match e {
            Some(e) => !e.all_day && e.overlaps(day_start, day_end),
            None => true,
        })
        .collect();
    info!("{} calendar items on {}", events.len(), date);
    Ok(events)
}

/// Whether `slot` is free for `owner`.
///
/// Each of the owner's events is widened by the slot's buffer on both sides; touching the
/// widened event is allowed, overlapping it is not. Other people's events never conflict.
pub fn is_valid_slot(slot: &ProposedSlot, events: &[Option<CalendarEvent>], owner: &str) -> bool {
    if events.iter().any(Option::is_none) {
        warn!("calendar contains unreadable items, refusing to approve the slot");
        return false;
    }
    let buffer = DateDelta::minutes(slot.buffer_minutes);
    for event in events.iter().flatten() {
        if !event.belongs_to(owner) {
            continue;
        }
        let buffered_start = event.start - buffer;
        let buffered_end = event.end + buffer;
        if !(slot.end <= buffered_start || slot.start >= buffered_end) {
            debug!(
                "slot {} - {} conflicts with '{}' ({} - {})",
                slot.start, slot.end, event.subject, event.start, event.end
            );
            return false;
        }
    }
    true
}

#[derive(Debug, Clone, Serialize)]
pub struct SlotCheck {
    pub slot: ProposedSlot,
    pub available: bool,
    pub events_checked: usize,
}

/// Builds the one-hour slot for an appointment and validates it against `source`.
#[instrument(skip(source))]
pub fn check_appointment(
    source: &dyn CalendarSource,
    date: &str,
    time: &str,
    owner: &str,
    buffer_minutes: i64,
) -> Result<SlotCheck, AutomationError> {
    let start = NaiveDateTime::parse_from_str(&format!("{} {}", date.trim(), time.trim()), "%Y-%m-%d %H:%M")
        .map_err(|e| {
            AutomationError::InvalidArgument(format!("appointment date/time '{date} {time}': {e}"))
        })?;
    let slot = ProposedSlot::one_hour(start, buffer_minutes);
    let events = fetch_day_events(source, start.date())?;
    let available = is_valid_slot(&slot, &events, owner);
    Ok(SlotCheck {
        slot,
        available,
        events_checked: events.len(),
    })
}
