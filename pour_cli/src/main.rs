use chrono::{Duration, Local};
use clap::{Parser, Subcommand};
use pour_core::*;
use std::io::{self, Write};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "pour")]
#[command(about = "Party drinking-session tracker", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Answer yes to every confirmation prompt
    #[arg(long, global = true)]
    yes: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start a new session
    Start {
        /// Start in expert mode: every advisory warning is disabled
        #[arg(long)]
        expert: bool,
    },

    /// End the active session
    End,

    /// Clear all data and return to idle
    Reset,

    /// Log a drink (propose, show any warning, confirm, commit)
    Log {
        /// Drink id (see `pour drinks`)
        drink: String,

        /// Portion size, e.g. 0.5 or 1
        portion: f64,
    },

    /// Remove a logged record by id
    Remove { id: u64 },

    /// Empty the session history without ending the session
    Clear,

    /// Switch between safe and expert mode
    Mode {
        /// "safe" or "expert"
        mode: String,
    },

    /// Show session status, elapsed time, and totals
    Status,

    /// List the drink catalog
    Drinks,

    /// Export the session records to CSV
    Export {
        /// Output path (defaults to <data-dir>/records.csv)
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    // Initialize logging
    pour_core::logging::init();

    let cli = Cli::parse();

    let config = Config::load()?;
    let data_dir = cli.data_dir.unwrap_or_else(|| config.data.data_dir.clone());
    let snapshot_path = data_dir.join("session.json");

    // Built-in drinks plus any custom ones from the config
    let catalog = get_default_catalog().clone().with_custom(config.custom_drinks());
    let errors = catalog.validate();
    if !errors.is_empty() {
        eprintln!("Catalog validation errors:");
        for error in errors {
            eprintln!("  - {}", error);
        }
        return Err(Error::CatalogValidation("Invalid catalog".into()));
    }

    let snapshot = Snapshot::load(&snapshot_path)?;
    let mut tracker =
        SessionTracker::from_snapshot(snapshot, catalog, config.thresholds.clone(), SystemClock);

    let changed = match cli.command {
        Commands::Start { expert } => cmd_start(&mut tracker, expert, cli.yes)?,
        Commands::End => cmd_end(&mut tracker, cli.yes)?,
        Commands::Reset => cmd_reset(&mut tracker, cli.yes)?,
        Commands::Log { drink, portion } => cmd_log(&mut tracker, &drink, portion, cli.yes)?,
        Commands::Remove { id } => cmd_remove(&mut tracker, id, cli.yes)?,
        Commands::Clear => cmd_clear(&mut tracker, cli.yes)?,
        Commands::Mode { mode } => cmd_mode(&mut tracker, &mode, cli.yes)?,
        Commands::Status => cmd_status(&tracker),
        Commands::Drinks => cmd_drinks(&tracker),
        Commands::Export { output } => {
            cmd_export(&tracker, output.unwrap_or_else(|| data_dir.join("records.csv")))?
        }
    };

    // Persist after every mutation, never on pure reads
    if changed {
        tracker.to_snapshot().save(&snapshot_path)?;
    }

    Ok(())
}

fn cmd_start(tracker: &mut SessionTracker, expert: bool, yes: bool) -> Result<bool> {
    if expert
        && !yes
        && !confirm("Expert mode disables every warning for this session. Continue?")?
    {
        println!("Not started.");
        return Ok(false);
    }

    let mode = if expert {
        SessionMode::Expert
    } else {
        SessionMode::Safe
    };
    tracker.start(mode)?;

    println!(
        "✓ Session started{}",
        if expert { " in expert mode" } else { "" }
    );
    Ok(true)
}

fn cmd_end(tracker: &mut SessionTracker, yes: bool) -> Result<bool> {
    if !yes && !confirm("End this session?")? {
        println!("Still going.");
        return Ok(false);
    }

    tracker.end()?;

    println!("✓ Session ended");
    if let Some(elapsed) = tracker.elapsed() {
        println!("  Duration: {}", format_elapsed(elapsed));
    }
    print_totals(tracker);
    Ok(true)
}

fn cmd_reset(tracker: &mut SessionTracker, yes: bool) -> Result<bool> {
    if !yes && !confirm("Clear all data and start fresh?")? {
        println!("Kept everything.");
        return Ok(false);
    }

    tracker.reset();
    println!("✓ All session data cleared");
    Ok(true)
}

fn cmd_log(tracker: &mut SessionTracker, drink: &str, portion: f64, yes: bool) -> Result<bool> {
    let proposal = tracker.propose(drink, portion)?;

    // Warnings are advisory: show them, then let the user decide.
    if let Some(ref warning) = proposal.warning {
        println!("⚠ {}", warning);
    }

    if proposal.requires_confirmation && !yes {
        let icon = drink_icon(tracker, drink);
        if !confirm(&format!("Log {} {} x{}?", icon, drink, portion))? {
            println!("Not logged.");
            return Ok(false);
        }
    }

    let record = tracker.commit(&proposal)?;
    println!(
        "✓ Logged {} x{} (record {})",
        record.drink_id, record.portion, record.id
    );
    Ok(true)
}

fn cmd_remove(tracker: &mut SessionTracker, id: u64, yes: bool) -> Result<bool> {
    if !yes && !confirm(&format!("Remove record {}?", id))? {
        println!("Kept it.");
        return Ok(false);
    }

    if tracker.remove_record(id) {
        println!("✓ Removed record {}", id);
        Ok(true)
    } else {
        println!("No record with id {}", id);
        Ok(false)
    }
}

fn cmd_clear(tracker: &mut SessionTracker, yes: bool) -> Result<bool> {
    if !yes && !confirm("Empty the session history?")? {
        println!("Kept it.");
        return Ok(false);
    }

    tracker.clear_history()?;
    println!("✓ History cleared");
    Ok(true)
}

fn cmd_mode(tracker: &mut SessionTracker, mode: &str, yes: bool) -> Result<bool> {
    match mode.to_lowercase().as_str() {
        "safe" => {
            tracker.set_expert_mode(false)?;
            println!("✓ Safe mode: all health warnings re-enabled");
            Ok(true)
        }
        "expert" => {
            if !yes
                && !confirm("Expert mode disables every warning for this session. Continue?")?
            {
                println!("Staying in safe mode.");
                return Ok(false);
            }
            tracker.set_expert_mode(true)?;
            println!("✓ Expert mode: warnings disabled, stay sharp");
            Ok(true)
        }
        other => {
            eprintln!("Unknown mode: {}. Use \"safe\" or \"expert\".", other);
            Err(Error::Other(format!("unknown mode: {}", other)))
        }
    }
}

fn cmd_status(tracker: &SessionTracker) -> bool {
    let session = tracker.session();
    match session.status {
        SessionStatus::Idle => {
            println!("No session. Run `pour start` to begin.");
        }
        SessionStatus::Active => {
            println!(
                "Session: ACTIVE{}",
                if session.expert_mode {
                    " (expert mode)"
                } else {
                    ""
                }
            );
            if let Some(start) = session.started_at {
                println!("  Started: {}", format_instant(start));
            }
            if let Some(elapsed) = tracker.elapsed() {
                println!("  Elapsed: {}", format_elapsed(elapsed));
            }
            print_totals(tracker);
            print_records(tracker);
        }
        SessionStatus::Ended => {
            println!("Session: ENDED");
            if let Some(start) = session.started_at {
                println!("  Started: {}", format_instant(start));
            }
            if let Some(end) = session.ended_at {
                println!("  Ended:   {}", format_instant(end));
            }
            if let Some(elapsed) = tracker.elapsed() {
                println!("  Duration: {}", format_elapsed(elapsed));
            }
            print_totals(tracker);
            print_records(tracker);
        }
    }
    false
}

fn cmd_drinks(tracker: &SessionTracker) -> bool {
    let mut drinks: Vec<_> = tracker.catalog().drinks.values().collect();
    drinks.sort_by(|a, b| a.id.cmp(&b.id));

    println!("Drinks:");
    for drink in drinks {
        let portions: Vec<String> = drink.portions.iter().map(|p| p.to_string()).collect();
        println!(
            "  {} {:<10} {} (portions: {}){}",
            drink.icon,
            drink.id,
            drink.name,
            portions.join(", "),
            if drink.custom { " [custom]" } else { "" }
        );
    }
    false
}

fn cmd_export(tracker: &SessionTracker, output: PathBuf) -> Result<bool> {
    let count = export_records(&output, tracker.ledger().all())?;
    if count == 0 {
        println!("No records to export.");
    } else {
        println!("✓ Exported {} records", count);
        println!("  CSV: {}", output.display());
    }
    Ok(false)
}

fn print_totals(tracker: &SessionTracker) {
    println!("─────────────────────────────────────────");
    println!("Totals:");
    for (drink_id, total) in tracker.summarize() {
        let icon = drink_icon(tracker, &drink_id);
        let last = tracker
            .time_since_last(&drink_id)
            .map(|ago| format!("  (last {} ago)", format_ago(ago)))
            .unwrap_or_default();
        println!("  {} {:<10} {:>4}{}", icon, drink_id, total, last);
    }
}

fn print_records(tracker: &SessionTracker) {
    let records = tracker.ledger().all();
    println!("─────────────────────────────────────────");
    println!("Records: {}", records.len());
    for record in records {
        println!(
            "  #{:<3} {} {} x{}  {}",
            record.id,
            drink_icon(tracker, &record.drink_id),
            record.drink_id,
            record.portion,
            format_instant(record.recorded_at)
        );
    }
}

fn drink_icon(tracker: &SessionTracker, drink_id: &str) -> String {
    tracker
        .catalog()
        .get(drink_id)
        .map(|d| d.icon.clone())
        .unwrap_or_else(|| "?".into())
}

/// `HH:MM:SS`, the running-clock format
fn format_elapsed(elapsed: Duration) -> String {
    let total = elapsed.num_seconds().max(0);
    format!(
        "{:02}:{:02}:{:02}",
        total / 3600,
        (total % 3600) / 60,
        total % 60
    )
}

/// `MM/DD HH:MM` in local time
fn format_instant(instant: chrono::DateTime<chrono::Utc>) -> String {
    instant.with_timezone(&Local).format("%m/%d %H:%M").to_string()
}

/// Human-friendly "time ago" like the in-app history list
fn format_ago(ago: Duration) -> String {
    let minutes = ago.num_minutes();
    if minutes < 1 {
        return "just now".into();
    }
    let hours = minutes / 60;
    if hours > 0 {
        format!("{}h {}m", hours, minutes % 60)
    } else {
        format!("{}m", minutes)
    }
}

fn confirm(prompt: &str) -> Result<bool> {
    print!("{} [y/N] ", prompt);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;

    Ok(matches!(input.trim().to_lowercase().as_str(), "y" | "yes"))
}
