//! CLI entry point for the portfoli rebalancer.

use std::fmt::Display;
use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use serde::Serialize;

use portfoli_rebalancer::config::Config;
use portfoli_rebalancer::error::Result;
use portfoli_rebalancer::run;

#[derive(Parser)]
#[command(name = "portfoli")]
#[command(about = "Cash needed to rebalance a brokerage portfolio without selling")]
#[command(version)]
struct Cli {
    /// Path to portfoli.toml (defaults to ./portfoli.toml if present)
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show desired values per asset and the cash required
    Cash {
        /// Fidelity positions CSV (defaults to the newest export in ~/Downloads)
        #[arg(long)]
        input: Option<PathBuf>,

        /// Allocation policy name
        #[arg(long)]
        policy: Option<String>,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Show current holdings per asset class
    Classes {
        /// Fidelity positions CSV (defaults to the newest export in ~/Downloads)
        #[arg(long)]
        input: Option<PathBuf>,

        /// Allocation policy name
        #[arg(long)]
        policy: Option<String>,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// List available allocation policies
    Policies,

    /// Show positions parsed from the export
    Positions {
        /// Fidelity positions CSV (defaults to the newest export in ~/Downloads)
        #[arg(long)]
        input: Option<PathBuf>,
    },
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_secs()
        .init();

    let cli = Cli::parse();

    let config = match Config::load_or_default(cli.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading config: {e}");
            process::exit(1);
        }
    };

    if let Err(e) = dispatch(&config, cli.command) {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn dispatch(config: &Config, command: Command) -> Result<()> {
    match command {
        Command::Cash {
            input,
            policy,
            json,
        } => {
            let policy = run::resolve_policy(config, policy.as_deref())?;
            let source = run::resolve_input(config, input)?;
            emit(&run::cash_report(&policy, &source)?, json)
        }
        Command::Classes {
            input,
            policy,
            json,
        } => {
            let policy = run::resolve_policy(config, policy.as_deref())?;
            let source = run::resolve_input(config, input)?;
            emit(&run::class_report(&policy, &source)?, json)
        }
        Command::Policies => emit(&run::policies_report(config)?, false),
        Command::Positions { input } => {
            let source = run::resolve_input(config, input)?;
            emit(&run::positions_report(&source)?, false)
        }
    }
}

fn emit<T: Display + Serialize>(report: &T, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
    } else {
        print!("{report}");
    }
    Ok(())
}
