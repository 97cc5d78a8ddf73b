//! Boolean filter expressions over artifact metadata.
//!
//! An expression compares metadata selected by a dotted path against literals:
//!
//! ```text
//! pushed == 1 and (stage != "dev" or not tags contains canary)
//! "gpu" in labels
//! uri matches "^gs://models/.*"
//! ```
//!
//! Literals are coerced to the type of the selected value, so `pushed == 1` matches both a
//! numeric `1` and the string `"1"`. Selecting a path which is absent is an evaluation error.

#![allow(clippy::upper_case_acronyms)] // EOI from pest.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use pest::error::{ErrorVariant, InputLocation};
use pest::iterators::{Pair, Pairs};
use pest::Parser;
use pest_derive::Parser;
use regex::Regex;
use serde_json::Value;
use thiserror::Error;

/// Filter expression errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ExprError {
    #[error("error parsing filter at position {pos}: {msg}")]
    Parse { pos: usize, msg: String },
    #[error("selector `{0}` did not match any metadata")]
    MissingSelector(String),
    #[error("value `{value}` can not be compared with selector `{selector}`")]
    TypeMismatch { selector: String, value: String },
}

/// A parsed filter expression.
#[derive(Clone, Debug)]
pub enum Expr {
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    Not(Box<Expr>),
    Match(Match),
}

/// A single comparison of a selector against a literal.
#[derive(Clone, Debug)]
pub struct Match {
    pub selector: Selector,
    pub op: MatchOp,
    pub value: Literal,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MatchOp {
    Equal,
    NotEqual,
    /// `value in selector` or `selector contains value`.
    Contains,
    /// `value not in selector` or `selector not contains value`.
    NotContains,
    Matches,
    NotMatches,
}

/// A dotted path into a metadata map.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Selector(pub Vec<String>);

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join("."))
    }
}

/// A literal operand, kept as text until it is coerced to the type of the selected value.
#[derive(Clone, Debug)]
pub struct Literal {
    pub text: String,
    /// The compiled pattern of a `matches` operand.
    pub pattern: Option<Regex>,
}

impl Expr {
    /// Evaluate this expression against the given metadata.
    pub fn evaluate(&self, metadata: &HashMap<String, Value>) -> Result<bool, ExprError> {
        match self {
            Self::And(lhs, rhs) => Ok(lhs.evaluate(metadata)? && rhs.evaluate(metadata)?),
            Self::Or(lhs, rhs) => Ok(lhs.evaluate(metadata)? || rhs.evaluate(metadata)?),
            Self::Not(inner) => Ok(!inner.evaluate(metadata)?),
            Self::Match(m) => m.evaluate(metadata),
        }
    }
}

impl FromStr for Expr {
    type Err = ExprError;

    fn from_str(src: &str) -> Result<Self, Self::Err> {
        let mut filter = FilterParser::parse(Rule::filter, src).map_err(parse_error)?;
        let root = filter.next().ok_or_else(|| malformed(0, "filter"))?;
        let expr = root.into_inner().next().ok_or_else(|| malformed(0, "expression"))?;
        build(expr)
    }
}

impl Match {
    fn evaluate(&self, metadata: &HashMap<String, Value>) -> Result<bool, ExprError> {
        let target = self.select(metadata)?;
        match self.op {
            MatchOp::Equal => self.equals(target),
            MatchOp::NotEqual => self.equals(target).map(|matched| !matched),
            MatchOp::Contains => self.contains(target),
            MatchOp::NotContains => self.contains(target).map(|matched| !matched),
            MatchOp::Matches => self.matches(target),
            MatchOp::NotMatches => self.matches(target).map(|matched| !matched),
        }
    }

    fn select<'a>(&self, metadata: &'a HashMap<String, Value>) -> Result<&'a Value, ExprError> {
        let missing = || ExprError::MissingSelector(self.selector.to_string());
        let (first, rest) = self.selector.0.split_first().ok_or_else(missing)?;
        let mut current = metadata.get(first).ok_or_else(missing)?;
        for segment in rest {
            current = match current {
                Value::Object(map) => map.get(segment).ok_or_else(missing)?,
                _ => return Err(missing()),
            };
        }
        Ok(current)
    }

    fn mismatch(&self) -> ExprError {
        ExprError::TypeMismatch {
            selector: self.selector.to_string(),
            value: self.value.text.clone(),
        }
    }

    fn equals(&self, target: &Value) -> Result<bool, ExprError> {
        literal_equals(&self.value.text, target).ok_or_else(|| self.mismatch())
    }

    fn contains(&self, target: &Value) -> Result<bool, ExprError> {
        match target {
            Value::String(val) => Ok(val.contains(self.value.text.as_str())),
            Value::Object(map) => Ok(map.contains_key(&self.value.text)),
            Value::Array(items) => Ok(items.iter().any(|item| literal_equals(&self.value.text, item).unwrap_or(false))),
            _ => Err(self.mismatch()),
        }
    }

    fn matches(&self, target: &Value) -> Result<bool, ExprError> {
        match (target, &self.value.pattern) {
            (Value::String(val), Some(pattern)) => Ok(pattern.is_match(val)),
            _ => Err(self.mismatch()),
        }
    }
}

/// Compare a literal with a value, coercing the literal to the value's type.
///
/// Returns `None` if the literal can not be coerced.
fn literal_equals(text: &str, target: &Value) -> Option<bool> {
    match target {
        Value::String(val) => Some(val == text),
        Value::Number(num) => {
            let lit: f64 = text.parse().ok()?;
            num.as_f64().map(|val| val == lit)
        }
        Value::Bool(val) => text.parse::<bool>().ok().map(|lit| *val == lit),
        Value::Null => Some(text == "null"),
        Value::Array(_) | Value::Object(_) => None,
    }
}

//////////////////////////////////////////////////////////////////////////////
// Parser ////////////////////////////////////////////////////////////////////

/// A parser for filter expressions.
#[derive(Parser)]
#[grammar = "../parsers/filter.pest"]
struct FilterParser;

fn parse_error(err: pest::error::Error<Rule>) -> ExprError {
    let pos = match err.location {
        InputLocation::Pos(pos) => pos,
        InputLocation::Span((start, _)) => start,
    };
    let msg = match &err.variant {
        ErrorVariant::ParsingError { positives, .. } if !positives.is_empty() => format!("expected one of {:?}", positives),
        ErrorVariant::ParsingError { .. } => "unexpected input".into(),
        ErrorVariant::CustomError { message } => message.clone(),
    };
    ExprError::Parse { pos, msg }
}

fn malformed(pos: usize, what: &str) -> ExprError {
    ExprError::Parse {
        pos,
        msg: format!("{} not found in filter", what),
    }
}

/// Take the next pair of a rule's inner pairs, failing with the given description.
fn next_pair<'a>(pairs: &mut Pairs<'a, Rule>, pos: usize, what: &str) -> Result<Pair<'a, Rule>, ExprError> {
    pairs.next().ok_or_else(|| malformed(pos, what))
}

fn build(pair: Pair<Rule>) -> Result<Expr, ExprError> {
    let pos = pair.as_span().start();
    match pair.as_rule() {
        Rule::or_expr => fold_terms(pair, Expr::Or),
        Rule::and_expr => fold_terms(pair, Expr::And),
        Rule::negation => {
            let inner = pair.into_inner().find(|p| p.as_rule() != Rule::kw_not).ok_or_else(|| malformed(pos, "negated expression"))?;
            Ok(Expr::Not(Box::new(build(inner)?)))
        }
        Rule::membership => {
            let mut inner = pair.into_inner();
            let value = literal(next_pair(&mut inner, pos, "value")?);
            let negated = next_pair(&mut inner, pos, "operator")?.into_inner().any(|p| p.as_rule() == Rule::kw_not);
            let selector = selector(next_pair(&mut inner, pos, "selector")?);
            let op = if negated { MatchOp::NotContains } else { MatchOp::Contains };
            Ok(Expr::Match(Match { selector, op, value }))
        }
        Rule::comparison => {
            let mut inner = pair.into_inner();
            let selector = selector(next_pair(&mut inner, pos, "selector")?);
            let op = match next_pair(&mut inner, pos, "operator")?.into_inner().next().map(|p| p.as_rule()) {
                Some(Rule::op_eq) => MatchOp::Equal,
                Some(Rule::op_ne) => MatchOp::NotEqual,
                Some(Rule::op_contains) => MatchOp::Contains,
                Some(Rule::op_not_contains) => MatchOp::NotContains,
                Some(Rule::op_matches) => MatchOp::Matches,
                Some(Rule::op_not_matches) => MatchOp::NotMatches,
                _ => return Err(malformed(pos, "operator")),
            };
            let value_pair = next_pair(&mut inner, pos, "value")?;
            let value_pos = value_pair.as_span().start();
            let mut value = literal(value_pair);
            if matches!(op, MatchOp::Matches | MatchOp::NotMatches) {
                let pattern = Regex::new(&value.text).map_err(|err| ExprError::Parse {
                    pos: value_pos,
                    msg: format!("invalid pattern: {}", err),
                })?;
                value.pattern = Some(pattern);
            }
            Ok(Expr::Match(Match { selector, op, value }))
        }
        rule => Err(ExprError::Parse {
            pos,
            msg: format!("unexpected {:?}", rule),
        }),
    }
}

/// Combine the terms of a boolean rule left to right, skipping its keywords.
fn fold_terms(pair: Pair<Rule>, combine: fn(Box<Expr>, Box<Expr>) -> Expr) -> Result<Expr, ExprError> {
    let pos = pair.as_span().start();
    let mut terms = pair
        .into_inner()
        .filter(|p| !matches!(p.as_rule(), Rule::kw_and | Rule::kw_or))
        .map(build);
    let first = terms.next().ok_or_else(|| malformed(pos, "expression"))??;
    terms.try_fold(first, |lhs, rhs| -> Result<Expr, ExprError> { Ok(combine(Box::new(lhs), Box::new(rhs?))) })
}

fn selector(pair: Pair<Rule>) -> Selector {
    Selector(pair.as_str().split('.').map(String::from).collect())
}

fn literal(pair: Pair<Rule>) -> Literal {
    let text = match pair.as_rule() {
        Rule::string => match pair.into_inner().next() {
            Some(inner) if inner.as_rule() == Rule::dq_text => unescape(inner.as_str()),
            Some(inner) => inner.as_str().to_string(),
            None => String::new(),
        },
        _ => pair.as_str().to_string(),
    };
    Literal { text, pattern: None }
}

fn unescape(raw: &str) -> String {
    let mut text = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => text.extend(chars.next()),
            c => text.push(c),
        }
    }
    text
}

#[cfg(test)]
mod mod_test;
