//! Upload boundary: PDF → oracle → sanitized candidates → normalized events.

use crate::config::Config;
use crate::extractor;
use crate::normalizer::{self, Event, UNKNOWN_COURSE};
use crate::oracle::{Oracle, ANALYSIS_PROMPT};
use crate::parser;
use anyhow::Result;
use log::info;
use std::path::Path;

/// One analyzed syllabus.
#[derive(Debug)]
pub struct UploadResult {
    pub course: String,
    pub events: Vec<Event>,
}

/// Run the full analysis pipeline for one syllabus PDF.
pub async fn upload(oracle: &dyn Oracle, config: &Config, pdf_path: &Path) -> Result<UploadResult> {
    let text = extractor::extract_text(pdf_path)?;
    analyze_text(oracle, config, &text).await
}

/// Same pipeline starting from already-extracted PDF bytes.
pub async fn upload_bytes(
    oracle: &dyn Oracle,
    config: &Config,
    pdf_bytes: &[u8],
) -> Result<UploadResult> {
    let text = extractor::extract_text_from_bytes(pdf_bytes)?;
    analyze_text(oracle, config, &text).await
}

async fn analyze_text(oracle: &dyn Oracle, config: &Config, text: &str) -> Result<UploadResult> {
    let raw = oracle.generate(ANALYSIS_PROMPT, text).await?;
    let parsed = parser::parse_response(&raw)?;

    let course = parsed.course.clone().unwrap_or_else(|| UNKNOWN_COURSE.to_string());
    let events = normalizer::normalize_events(
        &parsed.events,
        parsed.course.as_deref(),
        config.oracle.default_academic_year,
    );

    info!("Analyzed syllabus for {}: {} events", course, events.len());
    Ok(UploadResult { course, events })
}

/// Sum the numeric part of every event weight, for the grade-total audit.
/// Only the first numeric run counts, so a ranged weight like "10-20%"
/// contributes its lower bound. Non-numeric weights (including "") contribute
/// nothing.
pub fn weight_total(events: &[Event]) -> f64 {
    let total: f64 = events.iter().filter_map(|e| leading_number(&e.weight)).sum();
    (total * 100.0).round() / 100.0
}

fn leading_number(weight: &str) -> Option<f64> {
    let start = weight.find(|c: char| c.is_ascii_digit())?;
    let run: String = weight[start..]
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    run.parse::<f64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalizer::EventKind;
    use anyhow::anyhow;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;

    struct CannedOracle(&'static str);

    #[async_trait]
    impl Oracle for CannedOracle {
        async fn generate(&self, _prompt: &str, _source_text: &str) -> Result<String> {
            Ok(self.0.to_string())
        }
    }

    struct FailingOracle;

    #[async_trait]
    impl Oracle for FailingOracle {
        async fn generate(&self, _prompt: &str, _source_text: &str) -> Result<String> {
            Err(anyhow!("oracle unavailable"))
        }
    }

    #[tokio::test]
    async fn test_analyze_text_pipeline() -> Result<()> {
        let oracle = CannedOracle(
            r#"```json
{"course": "ECE 447", "events": [
    {"title": "Assignment 1", "date": "2025-10-01", "weight": "10%"},
    {"title": "Midterm Exam", "date": "sometime", "weight": "30%"}
]}
```"#,
        );

        let result = analyze_text(&oracle, &Config::default(), "long enough text").await?;
        assert_eq!(result.course, "ECE 447");
        assert_eq!(result.events.len(), 2);
        assert_eq!(result.events[0].course, "ECE 447");
        assert_eq!(result.events[1].date, "TBD");
        assert_eq!(result.events[1].kind, EventKind::Exam);
        Ok(())
    }

    #[tokio::test]
    async fn test_bare_array_response_has_unknown_course() -> Result<()> {
        let oracle = CannedOracle(r#"[{"title": "Quiz 1", "date": "2025-09-12"}]"#);
        let result = analyze_text(&oracle, &Config::default(), "text").await?;
        assert_eq!(result.course, UNKNOWN_COURSE);
        assert_eq!(result.events[0].course, UNKNOWN_COURSE);
        Ok(())
    }

    #[tokio::test]
    async fn test_oracle_failure_propagates() {
        let result = analyze_text(&FailingOracle, &Config::default(), "text").await;
        assert!(result.is_err());
    }

    #[test]
    fn test_weight_total() {
        let mk = |weight: &str| Event {
            title: "x".to_string(),
            date: "TBD".to_string(),
            weight: weight.to_string(),
            kind: EventKind::Other,
            course: "ECE 447".to_string(),
            color_id: None,
        };
        let events = vec![mk("10%"), mk("20.5%"), mk(""), mk("approx 5%")];
        assert_eq!(weight_total(&events), 35.5);
    }

    #[test]
    fn test_weight_total_ranged_weight_uses_lower_bound() {
        let mk = |weight: &str| Event {
            title: "x".to_string(),
            date: "TBD".to_string(),
            weight: weight.to_string(),
            kind: EventKind::Other,
            course: "ECE 447".to_string(),
            color_id: None,
        };
        // "10-20%" must not collapse into 1020
        let events = vec![mk("10-20%"), mk("5%")];
        assert_eq!(weight_total(&events), 15.0);
        assert_eq!(leading_number("no digits here"), None);
        assert_eq!(leading_number("2.5% each"), Some(2.5));
    }
}
