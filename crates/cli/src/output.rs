//! Rendering of outcomes and listings.

use anyhow::Result;
use clap::ValueEnum;
use cmsweep_core::{
    PublishTransactionData, QueueData, RepositoryData, UndoPackageListing, UndoPackageRecord,
};
use cmsweep_purge::PurgeOutcome;
use serde::Serialize;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;

const DISPLAY_TIME: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn print_outcome(outcome: &PurgeOutcome, format: OutputFormat) -> Result<()> {
    if format == OutputFormat::Json {
        return print_json(outcome);
    }

    if outcome.cancelled {
        println!("Purge cancelled.");
        return Ok(());
    }

    println!("{}", outcome.summary);
    for warning in &outcome.warnings {
        println!("  Warning: {warning}");
    }
    for deleted in &outcome.deleted {
        match &deleted.title {
            Some(title) => println!("  Purged: {} ({title})", deleted.id),
            None => println!("  Purged: {}", deleted.id),
        }
    }
    if let Some(count) = outcome.count {
        println!("  Count: {count}");
    }
    for failure in &outcome.failures {
        println!("  Failed: {}: {}", failure.artifact.id, failure.message);
    }
    println!(
        "Done! {} purged, {} failed.",
        outcome.deleted.len(),
        outcome.failures.len()
    );
    Ok(())
}

#[derive(Debug, Serialize)]
struct UndoPackageView<'a> {
    package_id: &'a str,
    creation_time: String,
    import_user: &'a str,
    actions: i32,
    description: &'a str,
}

impl<'a> From<&'a UndoPackageRecord> for UndoPackageView<'a> {
    fn from(record: &'a UndoPackageRecord) -> Self {
        Self {
            package_id: &record.package_id,
            creation_time: record
                .creation_time
                .format(DISPLAY_TIME)
                .unwrap_or_else(|_| record.creation_time.to_string()),
            import_user: &record.import_user,
            actions: record.actions,
            description: &record.description,
        }
    }
}

pub fn print_undo_packages(listing: &UndoPackageListing, format: OutputFormat) -> Result<()> {
    let views: Vec<UndoPackageView<'_>> = listing.packages.iter().map(Into::into).collect();
    if format == OutputFormat::Json {
        return print_json(&views);
    }

    if views.is_empty() {
        println!("No undo packages found.");
    }
    for view in &views {
        println!("{}", view.package_id);
        println!("  Created: {}", view.creation_time);
        println!("  Import user: {}", view.import_user);
        println!("  Actions: {}", view.actions);
        if !view.description.is_empty() {
            println!("  Description: {}", view.description);
        }
    }
    for skipped in &listing.skipped {
        eprintln!("warning: {skipped}");
    }
    Ok(())
}

pub fn print_transactions(transactions: &[PublishTransactionData], format: OutputFormat) -> Result<()> {
    if format == OutputFormat::Json {
        return print_json(transactions);
    }

    if transactions.is_empty() {
        println!("No publish transactions found.");
    }
    for tx in transactions {
        println!(
            "{}  {:<24} {}",
            tx.id,
            tx.state.to_string(),
            tx.title.as_deref().unwrap_or("-")
        );
        if let Some(host) = &tx.publisher_host {
            println!("  Publisher: {host}");
        }
    }
    Ok(())
}

pub fn print_queues(queues: &[QueueData], format: OutputFormat) -> Result<()> {
    if format == OutputFormat::Json {
        return print_json(queues);
    }

    for queue in queues {
        match queue.message_count {
            Some(count) => println!("{:>3}  {}  ({count} messages)", queue.id, queue.name),
            None => println!("{:>3}  {}", queue.id, queue.name),
        }
    }
    Ok(())
}

pub fn print_repositories(repositories: &[RepositoryData], format: OutputFormat) -> Result<()> {
    if format == OutputFormat::Json {
        return print_json(repositories);
    }

    for repository in repositories {
        println!("{}  {}", repository.id, repository.title);
    }
    Ok(())
}

pub fn print_lines(lines: &[String], format: OutputFormat) -> Result<()> {
    if format == OutputFormat::Json {
        return print_json(lines);
    }

    for line in lines {
        println!("{line}");
    }
    Ok(())
}
