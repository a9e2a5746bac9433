use crate::BalanceError;

use chrono::NaiveDate;
use num_rational::BigRational;
use num_traits::Zero;

use std::fmt;

#[derive(Clone, Debug, PartialEq)]
pub struct Posting {
    pub account: String,
    pub balance: BigRational,
}

/// A dated, payee labeled group of postings summing to exactly zero.
#[derive(Clone, Debug, PartialEq)]
pub struct Transaction {
    pub date: NaiveDate,
    pub payee: String,
    pub postings: Vec<Posting>,
    pub comments: Vec<String>,
}

impl Transaction {
    pub fn total(&self) -> BigRational {
        self.postings
            .iter()
            .fold(BigRational::zero(), |acc, p| acc + &p.balance)
    }
}

/// Canonical ledger text, which parses back into an equal transaction.
impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} {}", self.date.format("%Y/%m/%d"), self.payee)?;
        for comment in &self.comments {
            writeln!(f, "    {}", comment)?;
        }
        for posting in &self.postings {
            writeln!(f, "    {}  {}", posting.account, posting.balance)?;
        }
        Ok(())
    }
}

/// Posting as written in the source, amount possibly elided.
#[derive(Clone, Debug, PartialEq)]
struct Entry {
    account: String,
    amount: Option<BigRational>,
}

/// In-progress transaction, grown line by line and consumed by [`finish`][TransactionBuilder::finish].
#[derive(Clone, Debug, PartialEq)]
pub struct TransactionBuilder {
    date: NaiveDate,
    payee: String,
    entries: Vec<Entry>,
    comments: Vec<String>,
}

impl TransactionBuilder {
    pub fn new(date: NaiveDate, payee: &str) -> Self {
        Self {
            date,
            payee: payee.to_string(),
            entries: Vec::new(),
            comments: Vec::new(),
        }
    }

    pub fn with_comment(mut self, comment: &str) -> Self {
        self.comments.push(comment.to_string());
        self
    }

    pub fn with_posting(mut self, account: &str, amount: Option<BigRational>) -> Self {
        self.entries.push(Entry {
            account: account.to_string(),
            amount,
        });
        self
    }

    /// Balance the transaction, filling in the one elided amount if there is one.
    pub fn finish(self) -> Result<Transaction, BalanceError> {
        if self.entries.len() < 2 {
            return Err(BalanceError::NeedTwoPostings);
        }

        let elided = self.entries.iter().filter(|e| e.amount.is_none()).count();
        if elided > 1 {
            return Err(BalanceError::MultipleEmpty);
        }

        let sum = self
            .entries
            .iter()
            .filter_map(|e| e.amount.as_ref())
            .fold(BigRational::zero(), |acc, amount| acc + amount);
        if elided == 0 && !sum.is_zero() {
            return Err(BalanceError::Unbalanced);
        }

        let remainder = -sum;
        Ok(Transaction {
            date: self.date,
            payee: self.payee,
            postings: self
                .entries
                .into_iter()
                .map(|e| Posting {
                    account: e.account,
                    balance: e.amount.unwrap_or_else(|| remainder.clone()),
                })
                .collect(),
            comments: self.comments,
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::transaction::{Posting, Transaction, TransactionBuilder};
    use crate::BalanceError;
    use chrono::NaiveDate;
    use num_rational::BigRational;

    use anyhow::{anyhow, Result};

    fn int(n: i64) -> Option<BigRational> {
        Some(BigRational::from_integer(n.into()))
    }

    fn builder() -> Result<TransactionBuilder> {
        let date = NaiveDate::from_ymd_opt(2021, 4, 1).ok_or(anyhow!("invalid date"))?;
        Ok(TransactionBuilder::new(date, "Gubuk mang Engking"))
    }

    #[test]
    fn fill_elided_amount() -> Result<()> {
        let txn = builder()?
            .with_posting("Expenses:Dining", int(50))
            .with_posting("Expenses:Tips", Some(BigRational::new(5.into(), 2.into())))
            .with_posting("Assets:Cash", None)
            .finish()?;

        assert_eq!(
            txn.postings[2],
            Posting {
                account: "Assets:Cash".to_string(),
                balance: BigRational::new((-105).into(), 2.into()),
            }
        );
        assert_eq!(txn.total(), BigRational::from_integer(0.into()));
        Ok(())
    }

    #[test]
    fn elided_amount_may_be_zero() -> Result<()> {
        let txn = builder()?
            .with_posting("Expenses:Dining", int(50))
            .with_posting("Assets:Cash", int(-50))
            .with_posting("Expenses:Unbalanced", None)
            .finish()?;
        assert_eq!(txn.postings[2].balance, BigRational::from_integer(0.into()));
        Ok(())
    }

    #[test]
    fn balanced_without_elision() -> Result<()> {
        let txn = builder()?
            .with_posting("Expenses:Dining", int(50))
            .with_posting("Assets:Cash", int(-50))
            .finish()?;
        assert_eq!(txn.postings.len(), 2);
        Ok(())
    }

    #[test]
    fn balance_errors() -> Result<()> {
        assert_eq!(
            builder()?.with_posting("Assets", int(5)).finish(),
            Err(BalanceError::NeedTwoPostings)
        );
        assert_eq!(builder()?.finish(), Err(BalanceError::NeedTwoPostings));
        assert_eq!(
            builder()?
                .with_posting("Wallet", None)
                .with_posting("Bank", None)
                .with_posting("Expenses", int(1))
                .finish(),
            Err(BalanceError::MultipleEmpty)
        );
        assert_eq!(
            builder()?
                .with_posting("Expenses", int(369))
                .with_posting("Assets", int(123))
                .finish(),
            Err(BalanceError::Unbalanced)
        );
        Ok(())
    }

    #[test]
    fn fewer_than_two_postings_wins_over_elision() -> Result<()> {
        assert_eq!(
            builder()?.with_posting("Assets", None).finish(),
            Err(BalanceError::NeedTwoPostings)
        );
        Ok(())
    }

    #[test]
    fn comments_keep_their_order() -> Result<()> {
        let txn = builder()?
            .with_comment("; from the header")
            .with_posting("Expenses:Dining", int(50))
            .with_comment("; from the posting")
            .with_posting("Assets:Cash", None)
            .finish()?;
        assert_eq!(txn.comments, vec!["; from the header", "; from the posting"]);
        Ok(())
    }

    #[test]
    fn display_canonical_text() -> Result<()> {
        let txn = Transaction {
            date: NaiveDate::from_ymd_opt(1970, 1, 1).ok_or(anyhow!("invalid date"))?,
            payee: "Payee 5".to_string(),
            postings: vec![
                Posting {
                    account: "Expense:Cars R Us".to_string(),
                    balance: BigRational::new(1.into(), 3.into()),
                },
                Posting {
                    account: "Assets".to_string(),
                    balance: BigRational::new((-1).into(), 3.into()),
                },
            ],
            comments: vec!["; payee comment".to_string()],
        };
        assert_eq!(
            format!("{}", txn),
            "1970/01/01 Payee 5\n    ; payee comment\n    Expense:Cars R Us  1/3\n    Assets  -1/3\n"
        );
        Ok(())
    }
}
