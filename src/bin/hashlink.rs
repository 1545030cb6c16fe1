#![forbid(unsafe_code)]
//! Demo driver for hashlink: builds a ledger or a data chain and prints it.

use chrono::Utc;
use clap::{Parser, Subcommand};
use colored::*;
use hashlink::blockchain::{DataChain, Ledger};
use hashlink::config::{load_config, Config, DEFAULT_CONFIG_PATH};
use hashlink::transaction::TransferRecord;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "hashlink", version, about = "Build and inspect a hash-linked chain")]
struct Cli {
    /// TOML configuration file; defaults apply when it does not exist
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Override chain.difficulty
    #[arg(long, global = true)]
    difficulty: Option<u32>,

    /// Override logging.level
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Print the final chain as JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Queue two transfers, run mining rounds and report balances
    Ledger {
        #[arg(long, default_value = "reward_address")]
        reward_address: String,

        #[arg(long, default_value_t = 3)]
        rounds: u32,
    },
    /// Append each entry to a data chain
    Data {
        #[arg(required = true)]
        entries: Vec<String>,
    },
}

fn init_tracing(level: &str) -> Result<(), Box<dyn std::error::Error>> {
    let level: tracing::Level = level.parse()?;
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

fn print_balance(ledger: &Ledger, address: &str) {
    println!(
        "{} {}",
        format!("balance [{}]:", address).bright_white(),
        ledger.balance_of(address).to_string().bright_green()
    );
}

fn print_validity(valid: bool) {
    let verdict = if valid {
        "true".bright_green()
    } else {
        "false".bright_red()
    };
    println!("{} {}", "chain is valid:".bright_white(), verdict);
}

fn run_ledger(
    config: &Config,
    reward_address: &str,
    rounds: u32,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut ledger = Ledger::new(config.chain);
    ledger.add_transaction(TransferRecord::new("address1", "address2", 100));
    ledger.add_transaction(TransferRecord::new("address2", "address1", 50));

    println!("{}", "Starting the miner...".bright_cyan());
    for round in 1..=rounds {
        ledger.mine_pending(reward_address);
        if round == 1 {
            print_balance(&ledger, "address1");
            print_balance(&ledger, "address2");
        }
        print_balance(&ledger, reward_address);
    }
    println!();

    println!("{}", "history [address1]:".bright_white());
    for entry in ledger.history_of("address1") {
        println!("  #{} {}", entry.height, entry.record);
    }
    println!();

    if json {
        println!("{}", ledger.to_json()?);
    } else {
        println!("{}\n\n{}", "chain:".bright_cyan().bold(), ledger);
    }
    print_validity(ledger.is_valid());
    Ok(())
}

fn run_data(config: &Config, entries: &[String], json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let mut chain = DataChain::new(config.chain);
    for entry in entries {
        chain.add_block(Utc::now(), entry.clone());
    }

    if json {
        println!("{}", chain.to_json()?);
    } else {
        println!("{}\n\n{}", "chain:".bright_cyan().bold(), chain);
    }
    print_validity(chain.is_valid());
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = load_config(&cli.config)?;
    if let Some(difficulty) = cli.difficulty {
        config.chain.difficulty = difficulty;
        config.chain.validate()?;
    }
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }
    init_tracing(&config.logging.level)?;

    match cli.command {
        Command::Ledger {
            reward_address,
            rounds,
        } => run_ledger(&config, &reward_address, rounds, cli.json),
        Command::Data { entries } => run_data(&config, &entries, cli.json),
    }
}
