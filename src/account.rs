use crate::transaction::Transaction;

use indexmap::{IndexMap, IndexSet};
use num_rational::BigRational;
use num_traits::Zero;

/// Account names declared through `account` directives, in declaration order.
///
/// Declarations are informational: a posting to an undeclared account parses
/// just the same, [`undeclared`][AccountStore::undeclared] only reports it.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AccountStore {
    declared: IndexSet<String>,
}

impl AccountStore {
    pub fn new() -> Self {
        Default::default()
    }

    /// Returns false when the account had been declared before.
    pub fn declare(&mut self, name: &str) -> bool {
        self.declared.insert(name.to_string())
    }

    pub fn is_declared(&self, name: &str) -> bool {
        self.declared.contains(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.declared.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.declared.len()
    }

    pub fn is_empty(&self) -> bool {
        self.declared.is_empty()
    }

    /// Accounts posted to without a declaration, in order of first use.
    pub fn undeclared<'t>(&self, transactions: &'t [Transaction]) -> Vec<&'t str> {
        transactions
            .iter()
            .flat_map(|txn| txn.postings.iter())
            .map(|p| p.account.as_str())
            .filter(|name| !self.is_declared(name))
            .collect::<IndexSet<_>>()
            .into_iter()
            .collect()
    }
}

/// Running totals per account.
///
/// Every `:` separated ancestor of an account carries the sum of its
/// descendants too, so `Expenses:Food` also counts towards `Expenses`.
pub fn balances(transactions: &[Transaction]) -> IndexMap<String, BigRational> {
    let mut totals: IndexMap<String, BigRational> = IndexMap::new();

    for posting in transactions.iter().flat_map(|txn| txn.postings.iter()) {
        let account = posting.account.as_str();
        let ancestors = account.match_indices(':').map(|(idx, _)| &account[..idx]);
        for name in ancestors.chain(std::iter::once(account)) {
            *totals
                .entry(name.to_string())
                .or_insert_with(BigRational::zero) += &posting.balance;
        }
    }

    totals
}
