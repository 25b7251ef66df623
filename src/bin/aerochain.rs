#![forbid(unsafe_code)]
//! Maintenance ledger command line

use aerochain::blockchain::{subject_history, Block, Ledger, LedgerStats};
use aerochain::cli::{init_tracing, open_ledger_from_config, short_hash};
use aerochain::record::RecordInput;
use clap::{Parser, Subcommand};
use colored::*;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, Color as TableColor, ContentArrangement, Table};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Creates the genesis block if the ledger is empty
    Init,
    /// Appends a maintenance record to the ledger
    Log {
        /// Identifier of the maintained subject, e.g. a tail number
        #[arg(long)]
        subject: String,
        /// Who performed the work
        #[arg(long)]
        performed_by: String,
        /// When the work happened (ISO-8601); defaults to now
        #[arg(long)]
        occurred_at: Option<String>,
        /// What was done
        #[arg(long)]
        description: String,
        /// A replaced part; repeat for several
        #[arg(long = "part")]
        parts: Vec<String>,
    },
    /// Shows the most recent blocks
    Show {
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// Shows every record for one subject
    History { subject: String },
    /// Recomputes every hash and link in the ledger
    Validate,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing();

    let (_config, ledger) = open_ledger_from_config()?;

    match cli.command {
        Commands::Init => init(&ledger)?,
        Commands::Log {
            subject,
            performed_by,
            occurred_at,
            description,
            parts,
        } => {
            let occurred_at = occurred_at.unwrap_or_else(|| chrono::Utc::now().to_rfc3339());
            let input = RecordInput::new(subject, occurred_at, performed_by, description)
                .with_parts(parts);
            log(&ledger, input)?;
        }
        Commands::Show { limit } => {
            let chain = ledger.initialize()?;
            let blocks: Vec<&Block> = chain.iter().rev().take(limit).collect();
            print_blocks(&blocks);
            print_stats(&LedgerStats::from_chain(&chain));
        }
        Commands::History { subject } => {
            let chain = ledger.initialize()?;
            let blocks = subject_history(&chain, &subject);
            if blocks.is_empty() {
                println!("{}", format!("No records for {}", subject).yellow());
            } else {
                println!("{}", format!("📜 Maintenance history for {}", subject).bright_cyan().bold());
                print_blocks(&blocks);
            }
        }
        Commands::Validate => {
            if !validate(&ledger)? {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

fn init(ledger: &Ledger) -> Result<(), Box<dyn std::error::Error>> {
    let chain = ledger.initialize()?;
    println!(
        "{} {} block(s), genesis {}",
        "✅ Ledger ready:".bright_green().bold(),
        chain.len(),
        short_hash(&chain[0].hash).bright_white()
    );
    Ok(())
}

fn log(ledger: &Ledger, input: RecordInput) -> Result<(), Box<dyn std::error::Error>> {
    let block = ledger.append(input)?;
    println!(
        "{} block #{} ({})",
        "✅ Recorded".bright_green().bold(),
        block.index,
        block.record.id
    );
    println!("   hash:     {}", block.hash.bright_white());
    println!("   previous: {}", block.previous_hash.dimmed());
    Ok(())
}

fn validate(ledger: &Ledger) -> Result<bool, Box<dyn std::error::Error>> {
    let report = ledger.validate()?;
    if report.is_valid {
        println!("{}", "🔒 Chain integrity valid".bright_green().bold());
    } else {
        println!("{}", "⚠️  Chain integrity INVALID".red().bold());
        if let Some(index) = report.first_invalid_index {
            println!("   first failing block: #{}", index);
        }
        if let Some(reason) = report.reason {
            println!("   reason: {:?}", reason);
        }
    }
    Ok(report.is_valid)
}

fn print_blocks(blocks: &[&Block]) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("#").add_attribute(Attribute::Bold),
            Cell::new("Subject").add_attribute(Attribute::Bold),
            Cell::new("Occurred").add_attribute(Attribute::Bold),
            Cell::new("By").add_attribute(Attribute::Bold),
            Cell::new("Action").add_attribute(Attribute::Bold),
            Cell::new("Parts").add_attribute(Attribute::Bold),
            Cell::new("Hash").add_attribute(Attribute::Bold),
        ]);

    for block in blocks {
        let record = &block.record;
        let parts = if record.replaced_parts.is_empty() {
            "None".to_string()
        } else {
            record.replaced_parts.join(", ")
        };
        let color = if block.is_genesis() {
            TableColor::DarkGrey
        } else {
            TableColor::White
        };
        table.add_row(vec![
            Cell::new(block.index).fg(TableColor::Cyan),
            Cell::new(&record.subject_id).fg(color),
            Cell::new(&record.occurred_at).fg(color),
            Cell::new(&record.performed_by).fg(color),
            Cell::new(&record.description).fg(color),
            Cell::new(parts).fg(color),
            Cell::new(short_hash(&block.hash)).fg(TableColor::Magenta),
        ]);
    }

    println!("{table}");
}

fn print_stats(stats: &LedgerStats) {
    let last = stats
        .last_recorded_at
        .and_then(chrono::DateTime::<chrono::Utc>::from_timestamp_millis)
        .map(|t| t.format("%Y-%m-%d %H:%M UTC").to_string())
        .unwrap_or_else(|| "N/A".to_string());
    println!(
        "{} {}   {} {}   {} {}",
        "Records:".bright_cyan(),
        stats.total_records,
        "Subjects:".bright_cyan(),
        stats.subjects,
        "Last recorded:".bright_cyan(),
        last
    );
}
