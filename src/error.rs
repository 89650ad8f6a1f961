use thiserror::Error;

/// Error taxonomy for the sync pipeline.
///
/// Per-item variants (`Validation`, `ProviderItem`) are accumulated into the
/// returned summary and never abort a batch; the remaining variants are fatal
/// for the current invocation and surface as a single readable failure.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("extracted text is too short ({0} characters); please upload a valid syllabus PDF")]
    Extraction(usize),

    #[error("oracle response was not valid JSON after cleanup: {0}")]
    MalformedResponse(String),

    #[error("invalid event data: {0}")]
    Validation(String),

    #[error("calendar authentication failed: {0}")]
    ProviderAuth(String),

    #[error("calendar provider unreachable: {0}")]
    ProviderTransport(String),

    #[error("calendar rejected item: {0}")]
    ProviderItem(String),
}

impl SyncError {
    /// Whether this error aborts the whole invocation rather than one item.
    pub fn is_fatal(&self) -> bool {
        matches!(self, SyncError::ProviderAuth(_) | SyncError::ProviderTransport(_))
    }
}

pub type SyncResult<T> = std::result::Result<T, SyncError>;
