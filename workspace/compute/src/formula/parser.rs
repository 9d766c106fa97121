use super::ast::{ArithmeticOp, Expression, UnaryOp};
use super::lexer::Token;
use super::FormulaError;

/// Recursive-descent parser over the token stream.
///
/// ```text
/// expr    := term (('+' | '-') term)*
/// term    := unary (('*' | '/') unary)*
/// unary   := ('-' | '+') unary | primary
/// primary := account | literal | '(' expr ')'
/// ```
pub(crate) struct Parser {
    tokens: Vec<(usize, Token)>,
    cursor: usize,
}

impl Parser {
    pub(crate) fn new(tokens: Vec<(usize, Token)>) -> Self {
        Self { tokens, cursor: 0 }
    }

    /// Parses the whole stream; leftover tokens are an error.
    pub(crate) fn parse(mut self) -> Result<Expression, FormulaError> {
        let expression = self.expr()?;
        match self.peek() {
            None => Ok(expression),
            Some((position, token)) => Err(FormulaError::TrailingInput {
                position,
                found: token.to_string(),
            }),
        }
    }

    fn peek(&self) -> Option<(usize, Token)> {
        self.tokens.get(self.cursor).copied()
    }

    fn advance(&mut self) -> Option<(usize, Token)> {
        let next = self.peek();
        if next.is_some() {
            self.cursor += 1;
        }
        next
    }

    fn expr(&mut self) -> Result<Expression, FormulaError> {
        let mut left = self.term()?;
        while let Some((_, token)) = self.peek() {
            let op = match token {
                Token::Plus => ArithmeticOp::Add,
                Token::Minus => ArithmeticOp::Subtract,
                _ => break,
            };
            self.advance();
            let right = self.term()?;
            left = Expression::Arithmetic(op, Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn term(&mut self) -> Result<Expression, FormulaError> {
        let mut left = self.unary()?;
        while let Some((_, token)) = self.peek() {
            let op = match token {
                Token::Star => ArithmeticOp::Multiply,
                Token::Slash => ArithmeticOp::Divide,
                _ => break,
            };
            self.advance();
            let right = self.unary()?;
            left = Expression::Arithmetic(op, Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn unary(&mut self) -> Result<Expression, FormulaError> {
        let op = match self.peek() {
            Some((_, Token::Minus)) => UnaryOp::Minus,
            Some((_, Token::Plus)) => UnaryOp::Plus,
            _ => return self.primary(),
        };
        self.advance();
        Ok(Expression::Unary(op, Box::new(self.unary()?)))
    }

    fn primary(&mut self) -> Result<Expression, FormulaError> {
        match self.advance() {
            Some((_, Token::Account(id))) => Ok(Expression::Account(id)),
            Some((_, Token::Literal(value))) => Ok(Expression::Literal(value)),
            Some((_, Token::LParen)) => {
                let inner = self.expr()?;
                match self.advance() {
                    Some((_, Token::RParen)) => Ok(inner),
                    Some((position, token)) => Err(FormulaError::UnexpectedToken {
                        position,
                        found: token.to_string(),
                    }),
                    None => Err(FormulaError::UnexpectedEnd),
                }
            }
            Some((position, token)) => Err(FormulaError::UnexpectedToken {
                position,
                found: token.to_string(),
            }),
            None => Err(FormulaError::UnexpectedEnd),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formula::lexer::tokenize;

    fn parse(source: &str) -> Result<Expression, FormulaError> {
        Parser::new(tokenize(source)?).parse()
    }

    fn account(id: i32) -> Box<Expression> {
        Box::new(Expression::Account(id))
    }

    #[test]
    fn test_multiplication_binds_tighter() {
        assert_eq!(
            parse("1+2*3").unwrap(),
            Expression::Arithmetic(
                ArithmeticOp::Add,
                account(1),
                Box::new(Expression::Arithmetic(ArithmeticOp::Multiply, account(2), account(3))),
            )
        );
    }

    #[test]
    fn test_subtraction_is_left_associative() {
        assert_eq!(
            parse("57-71-81").unwrap(),
            Expression::Arithmetic(
                ArithmeticOp::Subtract,
                Box::new(Expression::Arithmetic(ArithmeticOp::Subtract, account(57), account(71))),
                account(81),
            )
        );
    }

    #[test]
    fn test_unary_minus_nests() {
        assert_eq!(
            parse("--4").unwrap(),
            Expression::Unary(
                UnaryOp::Minus,
                Box::new(Expression::Unary(UnaryOp::Minus, account(4)))
            )
        );
    }

    #[test]
    fn test_parenthesised_group() {
        let expr = parse("(52-51-42-43)/71").unwrap();
        assert!(matches!(expr, Expression::Arithmetic(ArithmeticOp::Divide, _, _)));
    }

    #[test]
    fn test_malformed_input() {
        assert_eq!(parse("1 +"), Err(FormulaError::UnexpectedEnd));
        assert_eq!(parse("(1 + 2"), Err(FormulaError::UnexpectedEnd));
        assert_eq!(
            parse("1 2"),
            Err(FormulaError::TrailingInput {
                position: 2,
                found: "2".to_string()
            })
        );
        assert_eq!(
            parse("* 3"),
            Err(FormulaError::UnexpectedToken {
                position: 0,
                found: "*".to_string()
            })
        );
        assert_eq!(
            parse("(1 2)"),
            Err(FormulaError::UnexpectedToken {
                position: 3,
                found: "2".to_string()
            })
        );
    }
}
