//! Ledgerline command line entry point

use anyhow::Result;
use clap::{Parser, Subcommand};
use ledgerline::{parse_file, parse_ledger, Ledger};

use std::io;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "ledgerline")]
#[command(version)]
#[command(about = "Parse a plain text ledger and check that every transaction balances", long_about = None)]
struct Args {
    /// Log parser progress; RUST_LOG takes precedence
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the transactions back in canonical form
    Print {
        /// Ledger file, standard input when omitted
        file: Option<PathBuf>,
    },
    /// Show the total of every account and its parents
    Balance { file: Option<PathBuf> },
    /// List declared accounts, then accounts used without a declaration
    Accounts { file: Option<PathBuf> },
}

fn load(file: Option<&Path>) -> Result<Ledger> {
    match file {
        Some(path) => parse_file(path),
        None => Ok(parse_ledger(io::stdin().lock())?),
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let default_filter = if args.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    match args.command {
        Command::Print { file } => {
            let ledger = load(file.as_deref())?;
            let mut first = true;
            for txn in &ledger.transactions {
                if !first {
                    println!();
                }
                print!("{}", txn);
                first = false;
            }
        }
        Command::Balance { file } => {
            let ledger = load(file.as_deref())?;
            let totals = ledger.balances();
            let width = totals
                .values()
                .map(|v| v.to_string().len())
                .max()
                .unwrap_or(0);
            for (account, total) in &totals {
                println!("{:>width$}  {}", total.to_string(), account, width = width);
            }
        }
        Command::Accounts { file } => {
            let ledger = load(file.as_deref())?;
            for account in ledger.accounts.iter() {
                println!("{}", account);
            }
            for account in ledger.accounts.undeclared(&ledger.transactions) {
                println!("{}  ; undeclared", account);
            }
        }
    }

    Ok(())
}
