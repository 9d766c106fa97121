//! Formula parsing and evaluation.
//!
//! A formula is either infix arithmetic over account ids and decimal
//! constants, or one of the recurrence keywords handled by
//! [`crate::recurrence`]. Arithmetic is tokenized, parsed into an
//! [`Expression`] tree and evaluated by walking it; nothing is ever
//! evaluated as text.

pub mod ast;
mod lexer;
mod parser;

use std::collections::BTreeSet;

use thiserror::Error;

pub use ast::{ArithmeticOp, Expression, UnaryOp};

use crate::recurrence::Recurrence;

/// Keyword for the running balance recurrence.
pub const ACCUMULATED: &str = "ACCUMULATED";
/// Keyword for the year-to-date sum recurrence.
pub const ACCUMULATED_ANNUAL: &str = "ACCUMULATED_ANNUAL";

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FormulaError {
    #[error("unexpected character '{found}' at position {position}")]
    UnexpectedCharacter { position: usize, found: char },
    #[error("invalid number '{text}' at position {position}")]
    InvalidNumber { position: usize, text: String },
    #[error("unexpected token '{found}' at position {position}")]
    UnexpectedToken { position: usize, found: String },
    #[error("unexpected trailing input '{found}' at position {position}")]
    TrailingInput { position: usize, found: String },
    #[error("unexpected end of formula")]
    UnexpectedEnd,
    #[error("division by zero")]
    DivisionByZero,
    #[error("'{0}' is a recurrence keyword and has no arithmetic value")]
    RecurrenceKeyword(String),
}

/// A classified formula.
#[derive(Debug, Clone, PartialEq)]
pub enum Formula {
    /// Blank formula, always worth `0.0`.
    Empty,
    Arithmetic(Expression),
    Recurrence(Recurrence),
}

impl Formula {
    /// Classifies and parses a formula string. Keywords are matched after
    /// trimming and are case-sensitive.
    pub fn parse(source: &str) -> Result<Self, FormulaError> {
        let trimmed = source.trim();
        if trimmed.is_empty() {
            return Ok(Formula::Empty);
        }
        if let Some(recurrence) = Recurrence::from_keyword(trimmed) {
            return Ok(Formula::Recurrence(recurrence));
        }
        let tokens = lexer::tokenize(trimmed)?;
        parser::Parser::new(tokens).parse().map(Formula::Arithmetic)
    }

    /// Account ids referenced by an arithmetic formula. Recurrence sources
    /// live in account configuration, not in the formula text.
    pub fn account_refs(&self) -> BTreeSet<i32> {
        match self {
            Formula::Arithmetic(expression) => expression.account_refs(),
            Formula::Empty | Formula::Recurrence(_) => BTreeSet::new(),
        }
    }

    pub fn is_recurrence(&self) -> bool {
        matches!(self, Formula::Recurrence(_))
    }
}

/// Evaluates an arithmetic formula against a value lookup.
///
/// Missing accounts are the lookup's concern; the engine's lookup returns
/// `0.0` for them.
pub fn evaluate<F>(source: &str, value_of: F) -> Result<f64, FormulaError>
where
    F: Fn(i32) -> f64,
{
    match Formula::parse(source)? {
        Formula::Empty => Ok(0.0),
        Formula::Arithmetic(expression) => expression.evaluate(&value_of),
        Formula::Recurrence(recurrence) => {
            Err(FormulaError::RecurrenceKeyword(recurrence.keyword().to_string()))
        }
    }
}
