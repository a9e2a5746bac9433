use crate::ledger::{Ledger, LedgerReader};
use crate::transaction::Transaction;
use crate::LedgerError;
use anyhow::{Context, Result};

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

#[derive(Parser)]
#[grammar = "ledger.pest"]
pub struct LedgerParser;

pub fn parse_file(path: &Path) -> Result<Ledger> {
    let file = File::open(path).with_context(|| format!("unable to open {}", path.display()))?;
    parse_ledger(BufReader::new(file))
        .with_context(|| format!("unable to parse {}", path.display()))
}

/// Parse the whole stream, keeping declared accounts alongside the transactions.
pub fn parse_ledger<R: BufRead>(reader: R) -> std::result::Result<Ledger, LedgerError> {
    LedgerReader::new().read(reader)
}

/// Parse the whole stream into balanced transactions, in file order.
///
/// Stops at the first problem; no transactions are returned alongside an error.
pub fn parse<R: BufRead>(reader: R) -> std::result::Result<Vec<Transaction>, LedgerError> {
    parse_ledger(reader).map(|ledger| ledger.transactions)
}

pub fn parse_str(input: &str) -> std::result::Result<Vec<Transaction>, LedgerError> {
    parse(input.as_bytes())
}
