//! Heuristic cleanup of previously-synced calendar entries.
//!
//! No index of created ids is persisted anywhere, so cleanup works purely off
//! observable fields. The classifier is a text heuristic with a known
//! false-positive risk; that is why every deletion is gated behind an explicit
//! operator confirmation.

use crate::calendar::{CalendarEntry, CalendarProvider};
use crate::config::Config;
use crate::error::SyncResult;
use log::{info, warn};

/// How many candidates the preview shows before asking for confirmation.
const PREVIEW_COUNT: usize = 3;

/// Result of a confirmation-gated delete pass.
#[derive(Debug, PartialEq, Eq)]
pub enum CleanupOutcome {
    /// Operator did not type "yes"; nothing was touched.
    Cancelled,
    /// Batch ran; partial success is possible and not specially aggregated.
    Deleted { deleted: usize, failed: usize },
}

/// Classifier rule for entries this tool created.
///
/// An entry is a deletion candidate iff its description contains "Weight:" or
/// "SyllaSync" AND its summary starts with "[". This must stay in lockstep
/// with how `sync::build_entry` formats entries.
pub fn is_cleanup_candidate(entry: &CalendarEntry) -> bool {
    (entry.description.contains("Weight:") || entry.description.contains("SyllaSync"))
        && entry.summary.starts_with('[')
}

/// Scan the whole calendar and return entries matching the classifier, in the
/// provider's start-time order.
pub async fn scan_cleanup_candidates(
    provider: &dyn CalendarProvider,
    config: &Config,
) -> SyncResult<Vec<CalendarEntry>> {
    info!("Scanning calendar '{}' for synced entries", config.calendar.calendar_id);
    let entries = provider.list(&config.calendar.calendar_id).await?;
    let candidates: Vec<CalendarEntry> =
        entries.into_iter().filter(is_cleanup_candidate).collect();
    info!("Found {} entries matching the synced-entry format", candidates.len());
    Ok(candidates)
}

/// Render the pre-deletion preview: candidate count plus the first few
/// summaries and start dates.
pub fn render_preview(candidates: &[CalendarEntry]) -> String {
    let mut out = format!(
        "Found {} events that look like they were created by SyllaSync.\n\
         This match is heuristic; unrelated events with a similar format would be deleted too.\n\
         Here are the first {}:\n",
        candidates.len(),
        PREVIEW_COUNT.min(candidates.len())
    );
    for entry in candidates.iter().take(PREVIEW_COUNT) {
        out.push_str(&format!(" - {} ({})\n", entry.summary, entry.start_date));
    }
    out
}

/// Delete the candidates if and only if the operator confirmed.
///
/// The confirmation must equal "yes" (case-insensitive); any other input
/// cancels with zero mutation. Deletion runs as one grouped batch; one item
/// failing does not abort the rest. This is destructive and irreversible.
pub async fn confirm_and_delete(
    provider: &dyn CalendarProvider,
    config: &Config,
    candidates: &[CalendarEntry],
    confirmation: &str,
) -> SyncResult<CleanupOutcome> {
    if !confirmation.trim().eq_ignore_ascii_case("yes") {
        info!("Cleanup cancelled by operator (input: '{}')", confirmation.trim());
        return Ok(CleanupOutcome::Cancelled);
    }

    let ids: Vec<String> = candidates.iter().map(|c| c.id.clone()).collect();
    let outcomes = provider.delete_batch(&config.calendar.calendar_id, &ids).await?;

    let mut deleted = 0;
    let mut failed = 0;
    for outcome in &outcomes {
        match &outcome.result {
            Ok(()) => deleted += 1,
            Err(e) => {
                warn!("Could not delete {}: {}", outcome.id, e);
                failed += 1;
            }
        }
    }

    info!("Cleanup complete: {} deleted, {} failed", deleted, failed);
    Ok(CleanupOutcome::Deleted { deleted, failed })
}
