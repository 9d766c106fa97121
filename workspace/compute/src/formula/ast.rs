use std::collections::BTreeSet;

use super::FormulaError;

#[derive(Debug, Eq, PartialEq, Clone, Copy)]
pub enum ArithmeticOp {
    Add,
    Subtract,
    Multiply,
    Divide,
}

#[derive(Debug, Eq, PartialEq, Clone, Copy)]
pub enum UnaryOp {
    Minus,
    Plus,
}

/// Parsed arithmetic formula.
#[derive(Debug, PartialEq, Clone)]
pub enum Expression {
    /// Reference to another account's value in the same period.
    Account(i32),
    /// Decimal constant, used verbatim.
    Literal(f64),
    Unary(UnaryOp, Box<Expression>),
    Arithmetic(ArithmeticOp, Box<Expression>, Box<Expression>),
}

impl Expression {
    /// Walks the tree, resolving account references through `value_of`.
    pub fn evaluate<F>(&self, value_of: &F) -> Result<f64, FormulaError>
    where
        F: Fn(i32) -> f64,
    {
        match self {
            Expression::Account(id) => Ok(value_of(*id)),
            Expression::Literal(value) => Ok(*value),
            Expression::Unary(op, operand) => {
                let value = operand.evaluate(value_of)?;
                Ok(match op {
                    UnaryOp::Minus => -value,
                    UnaryOp::Plus => value,
                })
            }
            Expression::Arithmetic(op, left, right) => {
                let left = left.evaluate(value_of)?;
                let right = right.evaluate(value_of)?;
                match op {
                    ArithmeticOp::Add => Ok(left + right),
                    ArithmeticOp::Subtract => Ok(left - right),
                    ArithmeticOp::Multiply => Ok(left * right),
                    ArithmeticOp::Divide if right == 0.0 => Err(FormulaError::DivisionByZero),
                    ArithmeticOp::Divide => Ok(left / right),
                }
            }
        }
    }

    /// Every account id referenced anywhere in the expression.
    pub fn account_refs(&self) -> BTreeSet<i32> {
        let mut refs = BTreeSet::new();
        self.collect_refs(&mut refs);
        refs
    }

    fn collect_refs(&self, refs: &mut BTreeSet<i32>) {
        match self {
            Expression::Account(id) => {
                refs.insert(*id);
            }
            Expression::Literal(_) => {}
            Expression::Unary(_, operand) => operand.collect_refs(refs),
            Expression::Arithmetic(_, left, right) => {
                left.collect_refs(refs);
                right.collect_refs(refs);
            }
        }
    }
}
