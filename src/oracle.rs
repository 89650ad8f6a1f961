//! Generative oracle that turns syllabus text into candidate events.
//!
//! The oracle is an opaque text-in/string-out service: no schema is guaranteed
//! on the way back, so everything it returns goes through the sanitizer in
//! `parser` before being trusted.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use log::debug;
use lru::LruCache;
use once_cell::sync::Lazy;
use reqwest::Client;
use serde_json::{json, Value};
use std::env;
use std::num::NonZeroUsize;
use std::sync::Mutex;

/// Analysis prompt sent with every syllabus. The TBD and YYYY-MM-DD rules here
/// are what the normalizer downstream relies on.
pub const ANALYSIS_PROMPT: &str = r#"Analyze this syllabus text. Extract two things:
1. The Course Code (e.g., "CMPUT 301", "ECE 447", "MATH 100").
   - Strictly extract ONLY the code (Department + Number).
   - Do NOT include the full course title.
   - If multiple codes are found, pick the main one.
   - If no code is found, use "Unknown Course".

2. A list of all important dates (assignments, exams, quizzes, projects).

Return ONLY valid JSON in this format:
{
    "course": "CMPUT 301",
    "events": [
        {"title": "Assignment 1", "date": "YYYY-MM-DD", "weight": "10%"},
        {"title": "Midterm", "date": "YYYY-MM-DD", "weight": "20%"}
    ]
}

Rules:
- Convert all dates to YYYY-MM-DD format.
- If a specific date is not found, use "TBD".
- Do not include reading weeks or holidays, only graded items."#;

/// Cache of raw oracle responses keyed by source text, so re-analyzing the
/// same syllabus in one session does not repeat the API call.
static RESPONSE_CACHE: Lazy<Mutex<LruCache<String, String>>> =
    Lazy::new(|| Mutex::new(LruCache::new(NonZeroUsize::new(20).unwrap())));

/// Opaque generative text service.
#[async_trait]
pub trait Oracle: Send + Sync {
    /// Convert source text into a free-form string, nominally JSON.
    async fn generate(&self, prompt: &str, source_text: &str) -> Result<String>;
}

/// Gemini-backed oracle using the REST generateContent endpoint.
pub struct GeminiOracle {
    client: Client,
    api_key: String,
    model: String,
}

impl GeminiOracle {
    pub fn new(model: &str) -> Result<Self> {
        let api_key = env::var("GEMINI_API_KEY")
            .map_err(|_| anyhow!("GEMINI_API_KEY environment variable not set"))?;

        Ok(Self { client: Client::new(), api_key, model: model.to_string() })
    }
}

#[async_trait]
impl Oracle for GeminiOracle {
    async fn generate(&self, prompt: &str, source_text: &str) -> Result<String> {
        if source_text.is_empty() {
            return Err(anyhow!("Empty source text provided"));
        }

        // Check cache first with proper error handling
        let cached_response = {
            let mut cache = RESPONSE_CACHE
                .lock()
                .map_err(|e| anyhow!("Failed to acquire cache lock: {}", e.to_string()))?;
            cache.get(source_text).cloned()
        };
        if let Some(cached) = cached_response {
            debug!("Using cached oracle response ({} chars)", cached.len());
            return Ok(cached);
        }

        let url = format!(
            "https://generativelanguage.googleapis.com/v1beta/models/{}:generateContent",
            self.model
        );

        debug!("Calling oracle model {} with {} chars of text", self.model, source_text.len());
        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&json!({
                "contents": [{
                    "parts": [
                        { "text": prompt },
                        { "text": source_text }
                    ]
                }],
                "generationConfig": {
                    "temperature": 1.0,
                    "topP": 0.95,
                    "topK": 64,
                    "maxOutputTokens": 8192,
                    "responseMimeType": "application/json"
                }
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(anyhow!("Oracle API error: {}", response.status()));
        }

        let response_json: Value = response.json().await?;
        let text = response_json["candidates"][0]["content"]["parts"][0]["text"]
            .as_str()
            .ok_or_else(|| anyhow!("Invalid oracle response format"))?
            .trim()
            .to_string();

        if let Ok(mut cache) = RESPONSE_CACHE.lock() {
            cache.put(source_text.to_string(), text.clone());
        }

        Ok(text)
    }
}
