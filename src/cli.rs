use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// SyllaSync - AI-powered semester planner for Google Calendar
#[derive(Debug, Parser)]
#[command(name = "syllasync")]
#[command(about = "Reads syllabus PDFs with AI and syncs course deadlines to Google Calendar", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Analyze one or more syllabus PDFs into course events
    Upload {
        /// Syllabus PDF files
        #[arg(required = true)]
        pdfs: Vec<PathBuf>,

        /// Write the extracted events to this JSON file for review/editing
        #[arg(long)]
        out: Option<PathBuf>,

        /// Sync straight to the calendar after analysis
        #[arg(long)]
        sync: bool,

        /// Skip study reminders when --sync is given
        #[arg(long)]
        no_reminders: bool,
    },

    /// Sync previously extracted events (a JSON file) to the calendar
    Sync {
        /// Events JSON file produced by `upload --out`
        events: PathBuf,

        /// Skip study reminders before exams
        #[arg(long)]
        no_reminders: bool,
    },

    /// Find and delete entries previously created by SyllaSync
    Cleanup {
        /// Only list what would be deleted
        #[arg(long)]
        dry_run: bool,
    },
}
