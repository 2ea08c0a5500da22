//! Sync command implementation

use colored::Colorize;
use leetsync_core::{Config, SyncCoordinator, SyncOptions, SyncReport};
use leetsync_git::RepositoryStore;

use super::{judge_client, open_store};
use crate::error::Result;

/// Run the sync command
///
/// Prints one line per committed solution and per skipped submission,
/// followed by a summary.
pub fn run_sync(config: &Config, dry_run: bool) -> Result<()> {
    let judge = judge_client(config)?;
    let store = open_store(config)?;

    println!(
        "{} Syncing accepted submissions into {}",
        "=>".blue().bold(),
        store.describe().cyan()
    );

    let report = SyncCoordinator::new(
        &judge,
        store.as_ref(),
        config.sync.clone(),
        config.retry.clone(),
    )
    .with_branch(config.branch.clone())
    .run(&SyncOptions { dry_run })?;

    print_report(&report);
    Ok(())
}

fn print_report(report: &SyncReport) {
    for solution in &report.committed {
        let commit = solution
            .commit
            .as_ref()
            .map(|c| c.short().to_string())
            .unwrap_or_else(|| "planned".to_string());
        println!(
            "   {} {} {}",
            "+".green(),
            solution.path().cyan(),
            format!("({commit})").dimmed()
        );
    }

    for skipped in &report.skipped {
        println!(
            "   {} {} ({}): {}",
            "-".yellow(),
            skipped.title,
            skipped.submission_id.dimmed(),
            skipped.reason
        );
    }

    println!();
    if report.is_noop() {
        println!(
            "{} Already up to date on {}.",
            "OK".green().bold(),
            report.branch.cyan()
        );
    } else if report.dry_run {
        println!(
            "{} Would commit {} solution(s) to {}.",
            "DRY RUN".yellow().bold(),
            report.committed.len(),
            report.branch.cyan()
        );
    } else {
        println!(
            "{} Committed {} solution(s) in {} commit(s) to {}.",
            "OK".green().bold(),
            report.committed.len(),
            report.commits.len(),
            report.branch.cyan()
        );
    }

    if !report.skipped.is_empty() || report.duplicates_dropped > 0 {
        println!(
            "   {} skipped, {} duplicate(s) dropped",
            report.skipped.len(),
            report.duplicates_dropped
        );
    }
    println!("   marker: {}", report.marker_after);
}
