//! Canonicalization of untrusted candidate events.
//!
//! A pure, order-preserving pass: every `CandidateEvent` becomes exactly one
//! `Event`, nothing is dropped or deduplicated here. Duplicate uploads are a
//! reconciler-level concern.

use crate::parser::CandidateEvent;
use chrono::NaiveDate;
use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

pub const UNTITLED_EVENT: &str = "Untitled Event";
pub const UNKNOWN_COURSE: &str = "Unknown Course";
/// Stands in for an undetermined date, distinct from empty/unknown.
pub const SENTINEL_DATE: &str = "TBD";

static ISO_DATE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").unwrap());
static MONTH_DAY_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{1,2}-\d{1,2}$").unwrap());
/// Department-plus-number shape, e.g. "ECE 447" or "CMPUT301".
static COURSE_CODE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z]{2,6}\s?\d{2,4}[A-Za-z]?$").unwrap());

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Assignment,
    Exam,
    Quiz,
    Project,
    #[default]
    Other,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Assignment => "assignment",
            EventKind::Exam => "exam",
            EventKind::Quiz => "quiz",
            EventKind::Project => "project",
            EventKind::Other => "other",
        }
    }
}

/// Canonical course event. Immutable once normalized; the calendar is the
/// system of record, so these are never persisted locally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub title: String,
    /// "YYYY-MM-DD", the "TBD" sentinel, or "".
    pub date: String,
    /// Percentage string, or "" when the syllabus gives none.
    #[serde(default)]
    pub weight: String,
    #[serde(default, rename = "type")]
    pub kind: EventKind,
    pub course: String,
    /// Google Calendar color override carried from the upload review step.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color_id: Option<String>,
}

impl Event {
    /// A date the reconciler can actually schedule.
    pub fn has_concrete_date(&self) -> bool {
        !self.date.is_empty()
            && self.date != SENTINEL_DATE
            && NaiveDate::parse_from_str(&self.date, "%Y-%m-%d").is_ok()
    }
}

/// Normalize a whole batch, preserving order.
pub fn normalize_events(
    candidates: &[CandidateEvent],
    batch_course: Option<&str>,
    default_year: i32,
) -> Vec<Event> {
    candidates
        .iter()
        .map(|c| normalize_event(c, batch_course, default_year))
        .collect()
}

pub fn normalize_event(
    candidate: &CandidateEvent,
    batch_course: Option<&str>,
    default_year: i32,
) -> Event {
    let title = match candidate.title.as_deref().map(str::trim) {
        Some(t) if !t.is_empty() => t.to_string(),
        _ => UNTITLED_EVENT.to_string(),
    };

    let date = canonical_date(candidate.date.as_deref(), default_year);
    let weight = candidate.weight.clone().unwrap_or_default();
    let kind = classify(&title);
    let course = canonical_course(candidate.course.as_deref(), batch_course);

    Event { title, date, weight, kind, course, color_id: candidate.color_id.clone() }
}

/// Canonicalize a raw date value.
///
/// Kept only if it is a syntactically valid, calendrically real YYYY-MM-DD.
/// "TBD"/"TBA" (any case), empty, missing and unparseable values all become
/// the sentinel. A month-day value missing its year is completed from the
/// configured academic year.
fn canonical_date(raw: Option<&str>, default_year: i32) -> String {
    let raw = match raw.map(str::trim) {
        Some(r) if !r.is_empty() => r,
        _ => return SENTINEL_DATE.to_string(),
    };

    let upper = raw.to_ascii_uppercase();
    if upper == "TBD" || upper == "TBA" {
        return SENTINEL_DATE.to_string();
    }

    if ISO_DATE_RE.is_match(raw) && NaiveDate::parse_from_str(raw, "%Y-%m-%d").is_ok() {
        return raw.to_string();
    }

    if MONTH_DAY_RE.is_match(raw) {
        let completed = format!("{}-{}", default_year, raw);
        if let Ok(date) = NaiveDate::parse_from_str(&completed, "%Y-%m-%d") {
            debug!("Completed year-less date '{}' as {}", raw, date);
            return date.format("%Y-%m-%d").to_string();
        }
    }

    debug!("Unparseable date '{}' replaced with sentinel", raw);
    SENTINEL_DATE.to_string()
}

/// First case-insensitive keyword match wins; order matters so that
/// "Final Project Exam Review" lands on exam, not project.
fn classify(title: &str) -> EventKind {
    let lower = title.to_lowercase();
    const TABLE: &[(&str, EventKind)] = &[
        ("exam", EventKind::Exam),
        ("midterm", EventKind::Exam),
        ("final", EventKind::Exam),
        ("test", EventKind::Exam),
        ("quiz", EventKind::Quiz),
        ("project", EventKind::Project),
        ("assignment", EventKind::Assignment),
        ("homework", EventKind::Assignment),
    ];
    for (keyword, kind) in TABLE {
        if lower.contains(keyword) {
            return *kind;
        }
    }
    EventKind::Other
}

fn canonical_course(candidate: Option<&str>, batch: Option<&str>) -> String {
    let picked = [candidate, batch]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|c| !c.is_empty());

    match picked {
        Some(code) => {
            // Department-plus-number is the expected shape; anything else is
            // still accepted as-is.
            if !COURSE_CODE_RE.is_match(code) {
                debug!("Course code '{}' does not look like DEPT NNN", code);
            }
            code.to_string()
        }
        None => UNKNOWN_COURSE.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    fn candidate(title: &str, date: &str) -> CandidateEvent {
        CandidateEvent {
            title: Some(title.to_string()),
            date: Some(date.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_missing_date_becomes_sentinel() {
        let c = CandidateEvent { title: Some("Essay".into()), ..Default::default() };
        let event = normalize_event(&c, None, 2025);
        assert_eq!(event.date, SENTINEL_DATE);
    }

    #[test_case("TBD" ; "literal tbd")]
    #[test_case("tba" ; "lowercase tba")]
    #[test_case("" ; "empty")]
    #[test_case("sometime in March" ; "prose")]
    #[test_case("2025-02-30" ; "unreal day")]
    #[test_case("2025-13-01" ; "unreal month")]
    fn test_bad_dates_become_sentinel(raw: &str) {
        let event = normalize_event(&candidate("Essay", raw), None, 2025);
        assert_eq!(event.date, SENTINEL_DATE);
    }

    #[test]
    fn test_valid_date_is_kept() {
        let event = normalize_event(&candidate("Essay", "2025-11-20"), None, 2025);
        assert_eq!(event.date, "2025-11-20");
        assert!(event.has_concrete_date());
    }

    #[test]
    fn test_missing_year_filled_from_config() {
        let event = normalize_event(&candidate("Quiz 2", "11-20"), None, 2025);
        assert_eq!(event.date, "2025-11-20");
    }

    #[test]
    fn test_empty_title_defaults() {
        let event = normalize_event(&candidate("   ", "TBD"), None, 2025);
        assert_eq!(event.title, UNTITLED_EVENT);
    }

    #[test_case("Midterm Exam", EventKind::Exam)]
    #[test_case("FINAL", EventKind::Exam)]
    #[test_case("Unit test 3", EventKind::Exam)]
    #[test_case("Quiz 1", EventKind::Quiz)]
    #[test_case("Group Project", EventKind::Project)]
    #[test_case("Assignment 2", EventKind::Assignment)]
    #[test_case("Homework 5", EventKind::Assignment)]
    #[test_case("Reading Response", EventKind::Other)]
    fn test_classification(title: &str, expected: EventKind) {
        assert_eq!(classify(title), expected);
    }

    #[test]
    fn test_wire_type_is_advisory_title_wins() {
        // The oracle labelled this a quiz, but the title says midterm.
        let mut c = candidate("Midterm", "2025-10-15");
        c.kind = Some("quiz".to_string());
        assert_eq!(normalize_event(&c, None, 2025).kind, EventKind::Exam);
    }

    #[test]
    fn test_course_fallback_chain() {
        let mut c = candidate("Quiz 1", "TBD");
        c.course = Some("ECE 447".into());
        assert_eq!(normalize_event(&c, Some("CMPUT 301"), 2025).course, "ECE 447");

        c.course = None;
        assert_eq!(normalize_event(&c, Some("CMPUT 301"), 2025).course, "CMPUT 301");
        assert_eq!(normalize_event(&c, None, 2025).course, UNKNOWN_COURSE);
    }

    #[test]
    fn test_odd_course_shape_still_accepted() {
        let mut c = candidate("Quiz 1", "TBD");
        c.course = Some("Intro to Pottery".into());
        assert_eq!(normalize_event(&c, None, 2025).course, "Intro to Pottery");
    }

    #[test]
    fn test_normalizer_is_idempotent() {
        let c = CandidateEvent {
            title: Some("Midterm".into()),
            date: Some("2025-10-15".into()),
            weight: Some("20%".into()),
            course: Some("ECE 447".into()),
            ..Default::default()
        };
        let once = normalize_event(&c, None, 2025);

        let as_candidate = CandidateEvent {
            title: Some(once.title.clone()),
            date: Some(once.date.clone()),
            weight: Some(once.weight.clone()),
            kind: Some(once.kind.as_str().to_string()),
            course: Some(once.course.clone()),
            color_id: once.color_id.clone(),
        };
        let twice = normalize_event(&as_candidate, None, 2025);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_batch_preserves_order_and_length() {
        let candidates = vec![
            candidate("Quiz 1", "2025-09-10"),
            candidate("Quiz 2", "garbage"),
            candidate("Final Exam", "2025-12-10"),
        ];
        let events = normalize_events(&candidates, Some("ECE 447"), 2025);
        assert_eq!(events.len(), 3);
        assert_eq!(events[0].title, "Quiz 1");
        assert_eq!(events[1].date, SENTINEL_DATE);
        assert_eq!(events[2].kind, EventKind::Exam);
    }
}
