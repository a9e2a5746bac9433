use crate::parser::{LedgerParser, Rule};
use anyhow::{anyhow, Result};
use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::Zero;
use pest::iterators::Pair;
use pest::Parser;

/// Deepest parenthesis nesting an amount may use.
pub const MAX_NESTING: usize = 64;

/// Evaluated posting amount.
///
/// Amounts are written either as a plain decimal literal, or as a small
/// expression of literals chained with `*` and `/`, optionally wrapped in
/// parentheses, e.g. `(123 * 3)`.
#[derive(Clone, Debug, PartialEq)]
pub struct Amount(BigRational);

impl Amount {
    pub fn parse(token: Pair<'_, Rule>) -> Result<Amount> {
        match token.as_rule() {
            Rule::amount => Ok(Amount(eval(token)?)),
            _ => Err(anyhow!(format!(
                "unexpected token for amount: '{}'",
                token.as_str()
            ))),
        }
    }

    pub fn into_inner(self) -> BigRational {
        self.0
    }
}

/// Evaluate an amount expression into an exact rational.
pub fn evaluate(expr: &str) -> Result<BigRational> {
    if nesting(expr) > MAX_NESTING {
        return Err(anyhow!(format!(
            "amount nested deeper than {} levels",
            MAX_NESTING
        )));
    }
    let token = LedgerParser::parse(Rule::amount_expr, expr)?
        .next()
        .ok_or(anyhow!(format!("invalid amount: '{}'", expr)))?;
    Ok(Amount::parse(token)?.into_inner())
}

/// Deepest run of unclosed `(` anywhere in `s`.
pub fn nesting(s: &str) -> usize {
    s.chars()
        .fold((0usize, 0usize), |(depth, deepest), c| match c {
            '(' => (depth + 1, deepest.max(depth + 1)),
            ')' => (depth.saturating_sub(1), deepest),
            _ => (depth, deepest),
        })
        .1
}

fn eval(token: Pair<'_, Rule>) -> Result<BigRational> {
    let expr = token.as_str();
    let mut pairs = token.into_inner();
    let mut acc = term(
        pairs
            .next()
            .ok_or(anyhow!(format!("invalid amount: '{}'", expr)))?,
    )?;

    while let Some(op) = pairs.next() {
        let rhs = term(
            pairs
                .next()
                .ok_or(anyhow!(format!("missing operand in '{}'", expr)))?,
        )?;
        match op.as_str() {
            "*" => acc *= rhs,
            "/" => {
                if rhs.is_zero() {
                    return Err(anyhow!(format!("division by zero in '{}'", expr)));
                }
                acc /= rhs
            }
            other => return Err(anyhow!(format!("invalid operator: '{}'", other))),
        }
    }

    Ok(acc)
}

fn term(token: Pair<'_, Rule>) -> Result<BigRational> {
    match token.as_rule() {
        Rule::number => literal(token.as_str()),
        Rule::amount => eval(token),
        _ => Err(anyhow!(format!("invalid operand: '{}'", token.as_str()))),
    }
}

// Decimal digits go straight into numerator and denominator, no float detour.
fn literal(s: &str) -> Result<BigRational> {
    let (negative, unsigned) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s.strip_prefix('+').unwrap_or(s)),
    };
    let (whole, fraction) = unsigned.split_once('.').unwrap_or((unsigned, ""));
    let numer: BigInt = format!("{}{}", whole, fraction).parse()?;
    let denom = num_traits::pow(BigInt::from(10u8), fraction.len());

    let value = BigRational::new(numer, denom);
    Ok(if negative { -value } else { value })
}

#[cfg(test)]
mod tests {
    use crate::amount::{evaluate, nesting, Amount, MAX_NESTING};
    use crate::parser::{LedgerParser, Rule};
    use num_rational::BigRational;
    use pest::Parser;

    use anyhow::Result;

    fn ratio(numer: i64, denom: i64) -> BigRational {
        BigRational::new(numer.into(), denom.into())
    }

    #[test]
    fn parse_wrong_token() -> Result<()> {
        let mut tokens = LedgerParser::parse(Rule::comment, "; Assets:Checking")?;
        let amount = Amount::parse(tokens.next().unwrap());
        assert_eq!(
            format!("{}", amount.unwrap_err()),
            "unexpected token for amount: '; Assets:Checking'"
        );
        Ok(())
    }

    #[test]
    fn evaluate_literals() -> Result<()> {
        assert_eq!(evaluate("369")?, ratio(369, 1));
        assert_eq!(evaluate("-58")?, ratio(-58, 1));
        assert_eq!(evaluate("+7")?, ratio(7, 1));
        assert_eq!(evaluate("369.0")?, ratio(369, 1));
        assert_eq!(evaluate("0.1")?, ratio(1, 10));
        assert_eq!(evaluate(".5")?, ratio(1, 2));
        assert_eq!(evaluate("5.")?, ratio(5, 1));
        assert_eq!(evaluate("-0.25")?, ratio(-1, 4));
        Ok(())
    }

    #[test]
    fn evaluate_expressions() -> Result<()> {
        assert_eq!(evaluate("(123 * 3)")?, ratio(369, 1));
        assert_eq!(evaluate("123*3")?, ratio(369, 1));
        assert_eq!(evaluate("((123 * 2))")?, ratio(246, 1));
        assert_eq!(evaluate("10 / 4 * 2")?, ratio(5, 1));
        assert_eq!(evaluate("1 / 3")?, ratio(1, 3));
        assert_eq!(evaluate("(1 / 3) * 3")?, ratio(1, 1));
        assert_eq!(evaluate("-1/3")?, ratio(-1, 3));
        assert_eq!(evaluate("( 3 * 4.25 )")?, ratio(51, 4));
        Ok(())
    }

    #[test]
    fn decimals_stay_exact() -> Result<()> {
        let tenth = evaluate("0.1")?;
        let sum = (0..10).fold(BigRational::from_integer(0.into()), |acc, _| acc + &tenth);
        assert_eq!(sum, ratio(1, 1));
        Ok(())
    }

    #[test]
    fn malformed_amounts() {
        for expr in ["", "abc", "1.2.3", "12abc", "(5", "5)", "1 +", "* 2", "--5", "1 + 2"] {
            assert!(evaluate(expr).is_err(), "'{}' should not evaluate", expr);
        }
    }

    #[test]
    fn nesting_depth() {
        assert_eq!(nesting("5"), 0);
        assert_eq!(nesting("(1 * (2 / 3)) * (4)"), 2);
        assert_eq!(nesting("))(("), 2);
        assert_eq!(nesting("((("), 3);
    }

    #[test]
    fn deep_nesting_is_refused() -> Result<()> {
        let depth = MAX_NESTING;
        let allowed = format!("{}1{}", "(".repeat(depth), ")".repeat(depth));
        assert_eq!(evaluate(&allowed)?, ratio(1, 1));

        let depth = 10_000;
        let deep = format!("{}1{}", "(".repeat(depth), ")".repeat(depth));
        assert_eq!(
            format!("{}", evaluate(&deep).unwrap_err()),
            "amount nested deeper than 64 levels"
        );
        Ok(())
    }

    #[test]
    fn division_by_zero() {
        assert_eq!(
            format!("{}", evaluate("1 / 0").unwrap_err()),
            "division by zero in '1 / 0'"
        );
    }
}
