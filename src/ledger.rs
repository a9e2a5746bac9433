use crate::{
    account::{balances, AccountStore},
    statement::{classify, Context, Line},
    transaction::{Transaction, TransactionBuilder},
    LedgerError, SyntaxError,
};

use indexmap::IndexMap;
use log::{debug, trace};
use num_rational::BigRational;

use std::io::BufRead;

/// Everything a successful parse yields.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Ledger {
    pub transactions: Vec<Transaction>,
    pub accounts: AccountStore,
}

impl Ledger {
    pub fn new() -> Ledger {
        Default::default()
    }

    pub fn balances(&self) -> IndexMap<String, BigRational> {
        balances(&self.transactions)
    }
}

#[derive(Debug)]
enum State {
    Idle,
    Directive,
    Transaction(TransactionBuilder),
}

impl State {
    fn context(&self) -> Context {
        match self {
            State::Idle => Context::Idle,
            State::Directive => Context::Directive,
            State::Transaction(_) => Context::Transaction,
        }
    }
}

/// Single pass, line by line reader.
///
/// Owns the line counter, the in-progress transaction and the comments
/// waiting for the next transaction to open. The first error ends the read.
pub struct LedgerReader {
    line: usize,
    state: State,
    pending_comments: Vec<String>,
    ledger: Ledger,
}

impl Default for LedgerReader {
    fn default() -> Self {
        Self::new()
    }
}

impl LedgerReader {
    pub fn new() -> LedgerReader {
        LedgerReader {
            line: 0,
            state: State::Idle,
            pending_comments: Vec::new(),
            ledger: Ledger::new(),
        }
    }

    pub fn read<R: BufRead>(mut self, reader: R) -> Result<Ledger, LedgerError> {
        for text in reader.lines() {
            self.line += 1;
            let text = text.map_err(|e| {
                LedgerError::from(e)
                    .context("Unable to read ledger")
                    .at_line(self.line)
            })?;
            // a final line without `\n` keeps its `\r`
            let text = text.trim_end_matches('\r');
            let line = classify(text, self.state.context()).map_err(|e| self.syntax_error(e))?;
            trace!("{}: {:?}", self.line, line);
            self.step(text, line)?;
        }

        if let State::Transaction(txn) = std::mem::replace(&mut self.state, State::Idle) {
            self.close(txn)?;
        }
        if !self.pending_comments.is_empty() {
            debug!(
                "dropping {} comment(s) not followed by a transaction",
                self.pending_comments.len()
            );
        }

        Ok(self.ledger)
    }

    fn step(&mut self, text: &str, line: Line<'_>) -> Result<(), LedgerError> {
        let state = std::mem::replace(&mut self.state, State::Idle);

        self.state = match (state, line) {
            (State::Transaction(txn), Line::Comment(comment)) => {
                State::Transaction(txn.with_comment(comment))
            }
            (
                State::Transaction(txn),
                Line::Posting {
                    account,
                    amount,
                    comment,
                },
            ) => {
                let txn = txn.with_posting(account, amount);
                State::Transaction(match comment {
                    Some(comment) => txn.with_comment(comment),
                    None => txn,
                })
            }
            (State::Transaction(txn), Line::Blank) => {
                self.close(txn)?;
                State::Idle
            }
            (State::Transaction(txn), line @ (Line::Header { .. } | Line::Directive(_))) => {
                self.close(txn)?;
                return self.step(text, line);
            }
            (_, Line::Blank) => State::Idle,
            (_, Line::Comment(comment)) => {
                self.pending_comments.push(comment.to_string());
                State::Idle
            }
            (_, Line::Directive(name)) => {
                if self.ledger.accounts.declare(name) {
                    debug!("{}: declared account {}", self.line, name);
                }
                State::Directive
            }
            (state, Line::DirectiveChild) => state,
            (
                _,
                Line::Header {
                    date,
                    payee,
                    comment,
                },
            ) => {
                let txn = self
                    .pending_comments
                    .drain(..)
                    .fold(TransactionBuilder::new(date, payee), |txn, comment| {
                        txn.with_comment(&comment)
                    });
                State::Transaction(match comment {
                    Some(comment) => txn.with_comment(comment),
                    None => txn,
                })
            }
            (_, Line::Posting { .. }) => {
                let orphan = SyntaxError::OrphanPosting(text.trim().to_string());
                return Err(self.syntax_error(orphan));
            }
        };

        Ok(())
    }

    /// Finalize the open transaction; the one place balancing happens.
    fn close(&mut self, txn: TransactionBuilder) -> Result<(), LedgerError> {
        let transaction = txn.finish().map_err(|e| {
            LedgerError::from(e)
                .context("Unable to balance transaction")
                .context("Unable to parse transaction")
                .at_line(self.line)
        })?;
        debug!(
            "{}: closed transaction '{}' with {} postings",
            self.line,
            transaction.payee,
            transaction.postings.len()
        );
        self.ledger.transactions.push(transaction);
        Ok(())
    }

    fn syntax_error(&self, e: SyntaxError) -> LedgerError {
        LedgerError::from(e)
            .context("Unable to parse header")
            .context("Unable to parse transaction")
            .at_line(self.line)
    }
}
