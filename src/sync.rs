//! Calendar reconciler: turns normalized events into provider insert calls.

use crate::calendar::{CalendarEntry, CalendarProvider, PROVENANCE_MARKER};
use crate::config::Config;
use crate::error::{SyncError, SyncResult};
use crate::normalizer::{Event, EventKind, SENTINEL_DATE};
use crate::reminder::{expand_reminders, Reminder};
use log::{error, info, warn};

/// Google Calendar color ids used for synced entries.
const EXAM_COLOR_ID: &str = "11"; // Tomato
const DEFAULT_COLOR_ID: &str = "9"; // Blueberry
const REMINDER_COLOR_ID: &str = "5"; // Banana

/// What one sync pass did. Per-item failures accumulate here instead of
/// aborting the batch.
#[derive(Debug, Default)]
pub struct SyncSummary {
    pub created: usize,
    pub skipped: usize,
    /// (event title, error text) for each insert that failed.
    pub failures: Vec<(String, String)>,
}

/// Build the calendar entry for one event: `[COURSE] Title`, all-day on the
/// event date, provenance marker plus weight in the description.
pub fn build_entry(event: &Event) -> CalendarEntry {
    let color_id = event
        .color_id
        .clone()
        .unwrap_or_else(|| match event.kind {
            EventKind::Exam => EXAM_COLOR_ID.to_string(),
            _ => DEFAULT_COLOR_ID.to_string(),
        });

    CalendarEntry {
        id: String::new(),
        summary: format!("[{}] {}", event.course, event.title),
        description: format!("{}. Weight: {}", PROVENANCE_MARKER, event.weight),
        start_date: event.date.clone(),
        end_date: event.date.clone(),
        color_id: Some(color_id),
        transparency: None,
    }
}

/// Build the entry for a study reminder: bracketed course prefix so the
/// cleanup classifier still recognizes it, bell marker to stand apart from the
/// exam itself, transparent so it never blocks the day.
pub fn build_reminder_entry(event: &Event, reminder: &Reminder) -> CalendarEntry {
    let date = reminder.date.format("%Y-%m-%d").to_string();
    CalendarEntry {
        id: String::new(),
        summary: format!("[{}] 🔔 Study: {}", event.course, reminder.parent_title),
        description: format!(
            "{}. Study reminder {} days before {}",
            PROVENANCE_MARKER, reminder.offset_days, reminder.parent_title
        ),
        start_date: date.clone(),
        end_date: date,
        color_id: Some(REMINDER_COLOR_ID.to_string()),
        transparency: Some("transparent".to_string()),
    }
}

/// Sync a batch of events (and, when requested, their study reminders) into
/// the calendar.
///
/// Events without a concrete date are skipped and counted, never synced. Each
/// insert is attempted independently; a rejected item lands in `failures` and
/// the batch continues. Only an unreachable provider or failed authentication
/// aborts the pass. No dedup is done against existing entries, so re-syncing
/// the same syllabus creates duplicates.
pub async fn sync_events(
    provider: &dyn CalendarProvider,
    config: &Config,
    events: &[Event],
    add_reminders: bool,
) -> SyncResult<SyncSummary> {
    let calendar_id = &config.calendar.calendar_id;
    let mut summary = SyncSummary::default();

    for event in events {
        if event.date.is_empty() || event.date == SENTINEL_DATE {
            info!("Skipping '{}': no concrete date ({})", event.title, event.date);
            summary.skipped += 1;
            continue;
        }
        // Normalized events cannot reach this, but the events file is
        // hand-editable.
        if !event.has_concrete_date() {
            let e = SyncError::Validation(format!("'{}' is not a valid date", event.date));
            warn!("Rejecting '{}': {}", event.title, e);
            summary.failures.push((event.title.clone(), e.to_string()));
            continue;
        }

        insert_entry(provider, calendar_id, &build_entry(event), &event.title, &mut summary)
            .await?;

        if add_reminders {
            for reminder in expand_reminders(event, &config.reminders.offsets_days) {
                let entry = build_reminder_entry(event, &reminder);
                let label = format!("{} (reminder -{}d)", event.title, reminder.offset_days);
                insert_entry(provider, calendar_id, &entry, &label, &mut summary).await?;
            }
        }
    }

    info!(
        "Sync finished: {} created, {} skipped, {} failed",
        summary.created,
        summary.skipped,
        summary.failures.len()
    );
    Ok(summary)
}

async fn insert_entry(
    provider: &dyn CalendarProvider,
    calendar_id: &str,
    entry: &CalendarEntry,
    label: &str,
    summary: &mut SyncSummary,
) -> SyncResult<()> {
    match provider.insert(calendar_id, entry).await {
        Ok(id) => {
            info!("Created: {} ({})", entry.summary, id);
            summary.created += 1;
        }
        Err(e) if e.is_fatal() => {
            error!("Aborting sync: {}", e);
            return Err(e);
        }
        Err(e) => {
            warn!("Failed to create '{}': {}", label, e);
            summary.failures.push((label.to_string(), e.to_string()));
        }
    }
    Ok(())
}
