//! Membership CLI
//!
//! Replays scripted scenarios against a fresh network and inspects the
//! journals and snapshots the engine writes.

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{error, info};

use airline_membership::journal::{EventJournal, JournalSink};
use airline_membership::network::NetworkState;
use airline_membership::scenario::Scenario;

#[derive(Parser)]
#[command(name = "membership-cli")]
#[command(about = "Replay and inspect airline membership networks")]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a YAML scenario against a freshly deployed network
    Replay {
        /// Scenario file
        #[arg(short, long)]
        scenario: PathBuf,

        /// Write the final network state here
        #[arg(long)]
        snapshot: Option<PathBuf>,

        /// Write the event journal here (JSONL)
        #[arg(long)]
        journal: Option<PathBuf>,
    },
    /// Check the hash chain of a journal file
    VerifyJournal {
        /// Journal file (JSONL)
        #[arg(short, long)]
        path: PathBuf,
    },
    /// Summarize a snapshot file
    Inspect {
        /// Snapshot file (JSON)
        #[arg(short, long)]
        snapshot: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt().with_max_level(level).init();

    let result = match cli.command {
        Commands::Replay {
            scenario,
            snapshot,
            journal,
        } => replay(scenario, snapshot, journal),
        Commands::VerifyJournal { path } => verify_journal(path),
        Commands::Inspect { snapshot } => inspect(snapshot),
    };

    if let Err(e) = &result {
        error!("{}", e);
    }
    result
}

fn replay(scenario: PathBuf, snapshot: Option<PathBuf>, journal: Option<PathBuf>) -> Result<()> {
    let scenario = Scenario::load(&scenario)?;
    let report = scenario.run()?;

    for result in &report.results {
        let marker = if result.matches_expectation() { "✓" } else { "✗" };
        println!(
            "{} [{}] {} -> {}",
            marker, result.index, result.call, result.outcome
        );
        if let Some(message) = &result.message {
            println!("      {}", message);
        }
    }

    println!(
        "\nRegistered airlines: {} | Funded: {} | Operational: {}",
        report.network.count_of_registered_airlines(),
        report.network.funded_airline_count(),
        report.network.is_operational()
    );

    if let Some(path) = snapshot {
        report.network.save_snapshot(&path)?;
        println!("Snapshot written to {}", path.display());
    }

    if let Some(path) = journal {
        let mut sink = JournalSink::new(&path);
        sink.rotate_existing()?;
        let written = sink.sync(report.network.journal())?;
        println!("{} journal entries written to {}", written, path.display());
    }

    let failed = report.failed_expectations();
    if !failed.is_empty() {
        return Err(anyhow!("{} step(s) did not match expectations", failed.len()));
    }

    Ok(())
}

fn verify_journal(path: PathBuf) -> Result<()> {
    info!("Verifying journal: {}", path.display());
    let journal = EventJournal::load(&path)?;

    if journal.is_empty() {
        return Err(anyhow!("Journal is empty"));
    }

    let entries = journal.entries();
    println!("✓ Hash chain verified");
    println!("  Total entries: {}", entries.len());
    println!("  First entry: {}", entries[0].timestamp);
    println!("  Last entry: {}", entries[entries.len() - 1].timestamp);
    println!("  Head hash: {}", journal.head_hash());

    let mut counts = std::collections::BTreeMap::new();
    for entry in entries {
        *counts.entry(entry.event.name()).or_insert(0usize) += 1;
    }
    println!("\nEvent distribution:");
    for (name, count) in counts {
        println!("  {}: {}", name, count);
    }

    Ok(())
}

fn inspect(snapshot: PathBuf) -> Result<()> {
    let network = NetworkState::load_snapshot(&snapshot)?;

    println!("Owner: {}", network.owner());
    println!("Operational: {}", network.is_operational());
    println!(
        "Registered airlines: {} (consensus required: {})",
        network.count_of_registered_airlines(),
        network.requires_consensus()
    );

    println!("\nAirlines:");
    for airline in network.airlines() {
        println!(
            "  {} {} funded={}",
            airline.id,
            airline.status.as_str(),
            airline.funded_amount
        );
    }

    let pending = network.pending_proposals();
    if !pending.is_empty() {
        println!("\nPending registrations:");
        for tally in pending {
            println!(
                "  {} {}/{} votes from {}",
                tally.candidate,
                tally.votes,
                tally.required,
                tally
                    .voters
                    .iter()
                    .map(|voter| voter.to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            );
        }
    }

    Ok(())
}
