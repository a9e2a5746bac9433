//! Ledgerline - A plain text double-entry accounting ledger parser
//! ---
//!
//! Reads a line oriented ledger into dated, payee labeled transactions and checks that
//! every one of them balances exactly. Amounts are kept as arbitrary precision rationals,
//! so no rounding drift creeps in no matter how many postings a transaction carries.
//!
//! ```text
//! ; groceries
//! 2021/05/20 Corner Shop
//!     Expenses:Food      (3 * 4.25)
//!     Assets:Cash
//! ```
//!

extern crate pest;
#[macro_use]
extern crate pest_derive;

use std::fmt;
use thiserror::Error;

/// Declared accounts and per account reporting.
pub mod account;

mod amount;

/// Ledger representation and the line by line reader driving the parse.
pub mod ledger;

/// Our main parser entrypoints.
pub mod parser;

mod statement;
mod transaction;

pub use amount::evaluate;
pub use ledger::Ledger;
pub use num_rational::BigRational;
pub use parser::{parse, parse_file, parse_ledger, parse_str};
pub use transaction::{Posting, Transaction, TransactionBuilder};

/// Reasons a transaction refuses to balance.
#[derive(Error, Clone, Copy, Debug, PartialEq, Eq)]
pub enum BalanceError {
    #[error("need at least two postings")]
    NeedTwoPostings,
    #[error("more than one account empty")]
    MultipleEmpty,
    #[error("no empty account to place extra balance")]
    Unbalanced,
}

/// Lexical failures, raised where the offending line is read.
#[derive(Error, Clone, Debug, PartialEq, Eq)]
pub enum SyntaxError {
    #[error("invalid date '{0}'")]
    InvalidDate(String),
    #[error("expected a date and payee, got '{0}'")]
    OrphanPosting(String),
    #[error("unexpected token: '{0}'")]
    Unexpected(String),
}

#[derive(Error, Debug)]
pub enum ErrorKind {
    #[error(transparent)]
    Balance(BalanceError),
    #[error(transparent)]
    Syntax(SyntaxError),
    #[error(transparent)]
    Io(std::io::Error),
}

/// Contextual error for ledger parser.
/// LedgerError carries the failing line, the reason, and a stack of
/// context frames collected while the error travelled outwards.
/// Frames are only joined into text by [`Display`][fmt::Display], e.g.
/// `:3: Unable to parse transaction: Unable to balance transaction: more than one account empty`.
#[derive(Debug)]
pub struct LedgerError {
    line: usize,
    context: Vec<&'static str>,
    kind: ErrorKind,
}

impl LedgerError {
    /// Create new error without any context.
    pub fn new(kind: ErrorKind) -> LedgerError {
        LedgerError {
            line: 0,
            context: Vec::new(),
            kind,
        }
    }

    /// Wrap the error in an outer context frame.
    pub fn context(mut self, frame: &'static str) -> LedgerError {
        self.context.push(frame);
        self
    }

    /// Pin the error to a 1-based source line.
    pub fn at_line(mut self, line: usize) -> LedgerError {
        self.line = line;
        self
    }

    pub fn line(&self) -> usize {
        self.line
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    /// Context frames, outermost first.
    pub fn frames(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.context.iter().rev().copied()
    }
}

impl fmt::Display for LedgerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, ":{}: ", self.line)?;
        for frame in self.frames() {
            write!(f, "{}: ", frame)?;
        }
        fmt::Display::fmt(&self.kind, f)
    }
}

impl std::error::Error for LedgerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &self.kind {
            ErrorKind::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<BalanceError> for LedgerError {
    fn from(e: BalanceError) -> Self {
        LedgerError::new(ErrorKind::Balance(e))
    }
}

impl From<SyntaxError> for LedgerError {
    fn from(e: SyntaxError) -> Self {
        LedgerError::new(ErrorKind::Syntax(e))
    }
}

impl From<std::io::Error> for LedgerError {
    fn from(e: std::io::Error) -> Self {
        LedgerError::new(ErrorKind::Io(e))
    }
}
