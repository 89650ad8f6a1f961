//! Text extraction adapter for syllabus PDFs.
//!
//! PDF byte-to-text conversion itself is delegated to `pdf-extract`; this
//! module only guards against uploads that clearly are not a syllabus.

use crate::error::SyncError;
use anyhow::{Context, Result};
use log::{debug, info};
use std::path::Path;

/// Anything shorter than this is not a real syllabus (scanned image, empty
/// file, wrong document).
pub const MIN_TEXT_LENGTH: usize = 50;

pub fn extract_text(path: &Path) -> Result<String> {
    info!("Extracting text from {}", path.display());
    let text = pdf_extract::extract_text(path)
        .with_context(|| format!("Failed to extract text from {}", path.display()))?;
    check_length(text)
}

pub fn extract_text_from_bytes(bytes: &[u8]) -> Result<String> {
    let text = pdf_extract::extract_text_from_mem(bytes)
        .context("Failed to extract text from PDF bytes")?;
    check_length(text)
}

fn check_length(text: String) -> Result<String> {
    let text = text.trim().to_string();
    debug!("Extracted {} characters of text", text.len());
    if text.len() < MIN_TEXT_LENGTH {
        return Err(SyncError::Extraction(text.len()).into());
    }
    Ok(text)
}
