use crate::amount::{nesting, Amount, MAX_NESTING};
use crate::parser::{LedgerParser, Rule};
use crate::SyntaxError;
use chrono::NaiveDate;
use num_rational::BigRational;
use pest::iterators::Pair;
use pest::Parser;

use std::convert::TryFrom;

/// Where the reader stands when a line comes in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Context {
    Idle,
    Directive,
    Transaction,
}

/// One classified physical line.
#[derive(Debug, PartialEq)]
pub enum Line<'s> {
    Blank,
    Comment(&'s str),
    Directive(&'s str),
    DirectiveChild,
    Header {
        date: NaiveDate,
        payee: &'s str,
        comment: Option<&'s str>,
    },
    Posting {
        account: &'s str,
        amount: Option<BigRational>,
        comment: Option<&'s str>,
    },
}

const DATE_FORMATS: [&str; 2] = ["%Y/%m/%d", "%Y-%m-%d"];

/// Classify a single line, already stripped of its line ending.
///
/// Only an impossible calendar date fails here; anything else that does not
/// look like a known line shape comes back as a [`Line::Posting`].
pub fn classify(line: &str, context: Context) -> Result<Line<'_>, SyntaxError> {
    let indented = line.starts_with([' ', '\t']);
    if context == Context::Directive && indented && !line.trim().is_empty() {
        return Ok(Line::DirectiveChild);
    }

    // amount detection recurses once per `(`
    let rule = if nesting(line) > MAX_NESTING {
        Rule::flat_line
    } else {
        Rule::line
    };
    let classified = Line::try_from(
        LedgerParser::parse(rule, line)
            .map_err(|_| SyntaxError::Unexpected(line.to_string()))?
            .next()
            .ok_or_else(|| SyntaxError::Unexpected(line.to_string()))?,
    )?;

    // Outside a transaction the first line of a block opens one, indented or not.
    if let Line::Posting { .. } = classified {
        if context == Context::Idle && indented {
            if let Ok(mut pairs) = LedgerParser::parse(Rule::header, line.trim_start()) {
                if let Some(header) = pairs.next() {
                    return Line::try_from(header);
                }
            }
        }
    }

    Ok(classified)
}

impl<'s> TryFrom<Pair<'s, Rule>> for Line<'s> {
    type Error = SyntaxError;

    fn try_from(pair: Pair<'s, Rule>) -> Result<Self, Self::Error> {
        let tag = pair.as_rule();
        let text = pair.as_str();
        let base = pair.as_span().start();
        let mut pairs = pair.into_inner().filter(|p| p.as_rule() != Rule::EOI);

        let line = match tag {
            Rule::blank => Self::Blank,
            Rule::comment_line => {
                Self::Comment(next_str(&mut pairs, Rule::comment, text)?.trim_end())
            }
            Rule::directive => Self::Directive(next_str(&mut pairs, Rule::name, text)?),
            Rule::header => {
                let datestr = next_str(&mut pairs, Rule::date, text)?;
                let date = DATE_FORMATS
                    .iter()
                    .find_map(|fmt| NaiveDate::parse_from_str(datestr, fmt).ok())
                    .ok_or_else(|| SyntaxError::InvalidDate(datestr.to_string()))?;
                Self::Header {
                    date,
                    payee: next_str(&mut pairs, Rule::name, text)?,
                    comment: pairs.next().map(|c| c.as_str().trim_end()),
                }
            }
            Rule::posting => {
                let account_pair = pairs
                    .next()
                    .filter(|p| p.as_rule() == Rule::account)
                    .ok_or_else(|| SyntaxError::Unexpected(text.to_string()))?;
                let start = account_pair.as_span().start() - base;
                let mut account = account_pair.as_str();
                let mut amount = None;
                let mut comment = None;
                for pair in pairs {
                    match pair.as_rule() {
                        Rule::amount => {
                            let end = pair.as_span().end() - base;
                            match Amount::parse(pair) {
                                Ok(value) => amount = Some(value.into_inner()),
                                // an amount that does not evaluate stays part of the account name
                                Err(_) => account = &text[start..end],
                            }
                        }
                        Rule::comment => comment = Some(pair.as_str().trim_end()),
                        _ => return Err(SyntaxError::Unexpected(pair.as_str().to_string())),
                    }
                }
                Self::Posting {
                    account,
                    amount,
                    comment,
                }
            }
            Rule::flat_posting => Self::Posting {
                account: next_str(&mut pairs, Rule::name, text)?,
                amount: None,
                comment: pairs.next().map(|c| c.as_str().trim_end()),
            },
            _ => return Err(SyntaxError::Unexpected(text.to_string())),
        };

        Ok(line)
    }
}

fn next_str<'s>(
    pairs: &mut impl Iterator<Item = Pair<'s, Rule>>,
    rule: Rule,
    text: &str,
) -> Result<&'s str, SyntaxError> {
    pairs
        .next()
        .filter(|p| p.as_rule() == rule)
        .map(|p| p.as_str())
        .ok_or_else(|| SyntaxError::Unexpected(text.to_string()))
}
