use std::fmt;
use std::iter::Peekable;
use std::str::CharIndices;

use super::FormulaError;

#[derive(Debug, PartialEq, Clone, Copy)]
pub(crate) enum Token {
    Account(i32),
    Literal(f64),
    Plus,
    Minus,
    Star,
    Slash,
    LParen,
    RParen,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Account(id) => write!(f, "{}", id),
            Token::Literal(value) => write!(f, "{}", value),
            Token::Plus => f.write_str("+"),
            Token::Minus => f.write_str("-"),
            Token::Star => f.write_str("*"),
            Token::Slash => f.write_str("/"),
            Token::LParen => f.write_str("("),
            Token::RParen => f.write_str(")"),
        }
    }
}

/// Splits a formula into tokens paired with their byte offset.
///
/// A run of digits is always a single account reference; a run with a
/// decimal point is a literal.
pub(crate) fn tokenize(source: &str) -> Result<Vec<(usize, Token)>, FormulaError> {
    let mut chars = source.char_indices().peekable();
    let mut tokens = Vec::new();

    while let Some(&(position, c)) = chars.peek() {
        let token = match c {
            c if c.is_whitespace() => {
                chars.next();
                continue;
            }
            '0'..='9' => {
                tokens.push((position, number(source, &mut chars)?));
                continue;
            }
            '+' => Token::Plus,
            '-' => Token::Minus,
            '*' => Token::Star,
            '/' => Token::Slash,
            '(' => Token::LParen,
            ')' => Token::RParen,
            found => return Err(FormulaError::UnexpectedCharacter { position, found }),
        };
        chars.next();
        tokens.push((position, token));
    }

    Ok(tokens)
}

fn number(source: &str, chars: &mut Peekable<CharIndices<'_>>) -> Result<Token, FormulaError> {
    let start = chars.peek().map(|&(i, _)| i).unwrap_or(source.len());
    let mut end = start;
    let mut is_decimal = false;

    while let Some(&(i, c)) = chars.peek() {
        match c {
            '0'..='9' => {}
            '.' if !is_decimal => is_decimal = true,
            _ => break,
        }
        end = i + c.len_utf8();
        chars.next();
    }

    let text = &source[start..end];
    let invalid = || FormulaError::InvalidNumber {
        position: start,
        text: text.to_string(),
    };

    if is_decimal {
        text.parse::<f64>().map(Token::Literal).map_err(|_| invalid())
    } else {
        text.parse::<i32>().map(Token::Account).map_err(|_| invalid())
    }
}
