//! Response sanitizer and parser for oracle output.
//!
//! The oracle returns free-form text that is nominally JSON but may be wrapped
//! in a Markdown code fence (with or without a `json` language tag), in the
//! triple-quote style some models emit, or left with an unterminated fence.
//! This module cleans those artifacts and collapses the two accepted wire
//! shapes into one.

use crate::error::SyncError;
use log::debug;
use serde_json::Value;

/// One loosely-typed event as it appears in the oracle response. Any field may
/// be missing or carry the wrong JSON type; the normalizer sorts that out.
#[derive(Debug, Clone, Default)]
pub struct CandidateEvent {
    pub title: Option<String>,
    pub date: Option<String>,
    pub weight: Option<String>,
    /// The wire `type` field. Advisory only: the normalizer reclassifies from
    /// the title, so a model that mislabels an event cannot mislabel it here.
    pub kind: Option<String>,
    pub course: Option<String>,
    pub color_id: Option<String>,
}

/// Parsed oracle response: optional batch-level course code plus candidates.
#[derive(Debug, Default)]
pub struct ParsedResponse {
    pub course: Option<String>,
    pub events: Vec<CandidateEvent>,
}

/// Strip surrounding whitespace and code-fence markers from an oracle response.
///
/// Grammar: `fence ::= "```" ["json"] NEWLINE content "```" | content`.
/// An unterminated fence is tolerated, as is the `'''json` variant.
pub fn sanitize_response(raw: &str) -> String {
    let mut text = raw.trim();

    for opener in ["```json", "```", "'''json", "'''"] {
        if let Some(rest) = text.strip_prefix(opener) {
            text = rest;
            break;
        }
    }
    for closer in ["```", "'''"] {
        if let Some(rest) = text.strip_suffix(closer) {
            text = rest;
            break;
        }
    }

    text.trim().to_string()
}

/// Parse a sanitized-or-raw oracle response into candidates.
///
/// Accepts either a bare JSON array of events or an object holding a course
/// identifier (`course` or `course_name`) and an `events` array. Never retries
/// the oracle; a parse failure carries the cleaned string for diagnostics.
pub fn parse_response(raw: &str) -> Result<ParsedResponse, SyncError> {
    let cleaned = sanitize_response(raw);

    let value: Value = serde_json::from_str(&cleaned)
        .map_err(|_| SyncError::MalformedResponse(cleaned.clone()))?;

    match value {
        Value::Array(items) => Ok(ParsedResponse {
            course: None,
            events: items.iter().map(candidate_from_value).collect(),
        }),
        Value::Object(ref map) => {
            let course = map
                .get("course")
                .or_else(|| map.get("course_name"))
                .and_then(coerce_string);
            let events: Vec<CandidateEvent> = map
                .get("events")
                .and_then(|e| e.as_array())
                .map(|items| items.iter().map(candidate_from_value).collect())
                .unwrap_or_default();
            debug!("Parsed oracle response: course={:?}, {} candidates", course, events.len());
            Ok(ParsedResponse { course, events })
        }
        _ => Err(SyncError::MalformedResponse(cleaned)),
    }
}

fn candidate_from_value(value: &Value) -> CandidateEvent {
    let field = |name: &str| value.get(name).and_then(coerce_string);
    CandidateEvent {
        title: field("title"),
        date: field("date"),
        weight: field("weight"),
        kind: field("type"),
        course: field("course"),
        color_id: field("colorId").or_else(|| field("color_id")),
    }
}

/// Accept strings and bare numbers; models are inconsistent about quoting.
fn coerce_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_sanitize_fenced_response() {
        let inner = r#"{"course": "ECE 447", "events": []}"#;
        assert_eq!(sanitize_response(&format!("```json\n{}\n```", inner)), inner);
        assert_eq!(sanitize_response(&format!("```\n{}\n```", inner)), inner);
        assert_eq!(sanitize_response(&format!("'''json\n{}\n'''", inner)), inner);
        assert_eq!(sanitize_response(inner), inner);
    }

    #[test]
    fn test_sanitize_unterminated_fence() {
        let raw = "```json\n[{\"title\": \"Quiz 1\"}]";
        assert_eq!(sanitize_response(raw), "[{\"title\": \"Quiz 1\"}]");
    }

    #[test]
    fn test_fenced_parses_same_as_bare() {
        let bare = r#"[{"title": "Assignment 1", "date": "2025-10-01", "weight": "10%"}]"#;
        let fenced = format!("```json\n{}\n```", bare);

        let a = parse_response(bare).unwrap();
        let b = parse_response(&fenced).unwrap();
        assert_eq!(a.events.len(), b.events.len());
        assert_eq!(a.events[0].title, b.events[0].title);
        assert_eq!(a.events[0].date, b.events[0].date);
    }

    #[test]
    fn test_object_shape_with_course() {
        let raw = r#"{"course": "CMPUT 301", "events": [{"title": "Midterm", "date": "TBD"}]}"#;
        let parsed = parse_response(raw).unwrap();
        assert_eq!(parsed.course.as_deref(), Some("CMPUT 301"));
        assert_eq!(parsed.events.len(), 1);
        assert_eq!(parsed.events[0].title.as_deref(), Some("Midterm"));
    }

    #[test]
    fn test_course_name_alias() {
        let raw = r#"{"course_name": "MATH 100", "events": []}"#;
        let parsed = parse_response(raw).unwrap();
        assert_eq!(parsed.course.as_deref(), Some("MATH 100"));
    }

    #[test]
    fn test_numeric_weight_is_coerced() {
        let raw = r#"[{"title": "Final", "weight": 40}]"#;
        let parsed = parse_response(raw).unwrap();
        assert_eq!(parsed.events[0].weight.as_deref(), Some("40"));
    }

    #[test]
    fn test_malformed_response_carries_cleaned_text() {
        let err = parse_response("```json\nthis is not json\n```").unwrap_err();
        match err {
            SyncError::MalformedResponse(text) => assert_eq!(text, "this is not json"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_scalar_json_is_rejected() {
        assert!(parse_response("42").is_err());
        assert!(parse_response("\"just a string\"").is_err());
    }
}
