pub mod calendar;
pub mod cleanup;
pub mod cli;
pub mod config;
pub mod error;
pub mod extractor;
pub mod normalizer;
pub mod oracle;
pub mod parser;
pub mod pipeline;
pub mod reminder;
pub mod sync;

pub fn init_logger() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .format_target(false)
        .init();
}

// Re-export commonly used types
pub use config::Config;
pub use error::{SyncError, SyncResult};
pub use normalizer::{Event, EventKind};
pub use sync::SyncSummary;
