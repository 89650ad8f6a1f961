//! Study-reminder expansion for exam events.

use crate::normalizer::{Event, EventKind};
use chrono::{Duration, NaiveDate};
use log::warn;

/// A reminder derived from an exam event, placed `offset_days` before it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reminder {
    pub parent_title: String,
    pub date: NaiveDate,
    pub offset_days: i64,
}

/// Expand an event into its preceding study reminders.
///
/// Only exam-type events with a concrete date produce reminders. Offsets are
/// walked in configured order (most distant first); an offset whose result is
/// not a representable date is skipped without aborting the batch. The caller
/// gates this behind the add-reminders flag.
pub fn expand_reminders(event: &Event, offsets_days: &[i64]) -> Vec<Reminder> {
    if event.kind != EventKind::Exam || !event.has_concrete_date() {
        return Vec::new();
    }

    let exam_date = match NaiveDate::parse_from_str(&event.date, "%Y-%m-%d") {
        Ok(d) => d,
        Err(_) => return Vec::new(),
    };

    let mut reminders = Vec::new();
    for &offset in offsets_days {
        let delta = match Duration::try_days(offset) {
            Some(d) => d,
            None => {
                warn!(
                    "Skipping reminder {} days before '{}': offset out of range",
                    offset, event.title
                );
                continue;
            }
        };
        match exam_date.checked_sub_signed(delta) {
            Some(date) => reminders.push(Reminder {
                parent_title: event.title.clone(),
                date,
                offset_days: offset,
            }),
            None => {
                warn!(
                    "Skipping reminder {} days before '{}': date out of range",
                    offset, event.title
                );
            }
        }
    }
    reminders
}
