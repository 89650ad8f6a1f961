use anyhow::{Context, Result};
use clap::Parser;
use log::{error, info};
use std::io::Write;
use std::path::{Path, PathBuf};

use syllasync::calendar::GoogleCalendarProvider;
use syllasync::cleanup::{self, CleanupOutcome};
use syllasync::cli::{Cli, Commands};
use syllasync::config::Config;
use syllasync::normalizer::Event;
use syllasync::oracle::GeminiOracle;
use syllasync::pipeline::{self, weight_total};
use syllasync::sync::{sync_events, SyncSummary};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    syllasync::init_logger();

    let cli = Cli::parse();
    let config = Config::load()?;

    match cli.command {
        Commands::Upload { pdfs, out, sync, no_reminders } => {
            let add_reminders = config.reminders.effective(no_reminders);
            handle_upload(&config, &pdfs, out.as_deref(), sync, add_reminders).await
        }
        Commands::Sync { events, no_reminders } => {
            let add_reminders = config.reminders.effective(no_reminders);
            handle_sync(&config, &events, add_reminders).await
        }
        Commands::Cleanup { dry_run } => handle_cleanup(&config, dry_run).await,
    }
}

async fn handle_upload(
    config: &Config,
    pdfs: &[PathBuf],
    out: Option<&Path>,
    sync: bool,
    add_reminders: bool,
) -> Result<()> {
    let oracle = GeminiOracle::new(&config.oracle.model)?;
    let mut all_events: Vec<Event> = Vec::new();

    for pdf in pdfs {
        info!("Analyzing {}", pdf.display());
        let result = pipeline::upload(&oracle, config, pdf).await?;

        println!("\n{} — {} events", result.course, result.events.len());
        for event in &result.events {
            println!("  {:<12} {:<40} {:>6}", event.date, event.title, event.weight);
        }
        print_weight_audit(&result.events);

        all_events.extend(result.events);
    }

    if let Some(path) = out {
        let json = serde_json::to_string_pretty(&all_events)?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write events to {}", path.display()))?;
        println!("\nWrote {} events to {}", all_events.len(), path.display());
    }

    if sync {
        sync_and_report(config, &all_events, add_reminders).await?;
    } else if out.is_none() {
        println!("\nRe-run with --sync to push these to Google Calendar.");
    }

    Ok(())
}

fn print_weight_audit(events: &[Event]) {
    let total = weight_total(events);
    let marker = if (total - 100.0).abs() < f64::EPSILON {
        "✅"
    } else if total > 100.0 {
        "🛑"
    } else {
        "⚠️"
    };
    println!("  Total weight: {}% {}", total, marker);
}

async fn handle_sync(config: &Config, events_path: &Path, add_reminders: bool) -> Result<()> {
    let json = std::fs::read_to_string(events_path)
        .with_context(|| format!("Failed to read {}", events_path.display()))?;
    let events: Vec<Event> =
        serde_json::from_str(&json).context("Events file is not a valid event list")?;

    sync_and_report(config, &events, add_reminders).await
}

async fn sync_and_report(config: &Config, events: &[Event], add_reminders: bool) -> Result<()> {
    let syncable = events.iter().filter(|e| e.has_concrete_date()).count();
    let skipped = events.len() - syncable;
    if syncable == 0 {
        println!("No events with dates found to sync.");
        return Ok(());
    }
    if skipped > 0 {
        println!("Syncing {} events ({} without dates will be skipped).", syncable, skipped);
    } else {
        println!("Syncing {} events to Google Calendar.", syncable);
    }

    let time_zone = config.time_zone()?;
    let provider = GoogleCalendarProvider::from_env(time_zone.name())?;
    let summary = sync_events(&provider, config, events, add_reminders).await?;
    report_summary(&summary);
    Ok(())
}

fn report_summary(summary: &SyncSummary) {
    println!(
        "Done: {} created, {} skipped, {} failed.",
        summary.created,
        summary.skipped,
        summary.failures.len()
    );
    for (title, reason) in &summary.failures {
        error!("Not created: {} ({})", title, reason);
    }
    if summary.created > 0 {
        println!("Note: re-syncing the same syllabus will create duplicate entries.");
    }
}

async fn handle_cleanup(config: &Config, dry_run: bool) -> Result<()> {
    let time_zone = config.time_zone()?;
    let provider = GoogleCalendarProvider::from_env(time_zone.name())?;

    println!("🔍 Searching for SyllaSync events...");
    let candidates = cleanup::scan_cleanup_candidates(&provider, config).await?;

    if candidates.is_empty() {
        println!("🎉 No events found matching the SyllaSync format.");
        return Ok(());
    }

    print!("{}", cleanup::render_preview(&candidates));

    if dry_run {
        println!("Dry run; nothing deleted.");
        return Ok(());
    }

    print!("\n🔴 Delete ALL these events? (yes/no): ");
    std::io::stdout().flush()?;
    let mut confirmation = String::new();
    std::io::stdin().read_line(&mut confirmation)?;

    match cleanup::confirm_and_delete(&provider, config, &candidates, &confirmation).await? {
        CleanupOutcome::Cancelled => println!("Operation cancelled."),
        CleanupOutcome::Deleted { deleted, failed } => {
            if failed > 0 {
                println!("✨ Done. {} deleted, {} could not be deleted.", deleted, failed);
            } else {
                println!("✨ Done! Cleanup complete ({} deleted).", deleted);
            }
        }
    }

    Ok(())
}
