use thiserror::Error;

use crate::formula::FormulaError;

/// Error types for the compute module
#[derive(Error, Debug)]
pub enum ComputeError {
    /// Error from the database operations
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// Month outside 1..=12 or a year chrono cannot represent
    #[error("Invalid period: {month}/{year}")]
    InvalidPeriod { month: i64, year: i64 },

    /// Error from formula parsing or evaluation
    #[error("Formula error: {0}")]
    Formula(#[from] FormulaError),

    /// A recurrence formula whose account has no configured source account
    #[error("Account {0} uses a recurrence formula but has no recurrence source")]
    MissingRecurrenceSource(i32),

    /// Error from account operations
    #[error("Account error: {0}")]
    Account(String),

    /// The chart of accounts failed validation
    #[error("Chart of accounts has {0} issue(s)")]
    InvalidChart(usize),
}

/// Type alias for Result with ComputeError
pub type Result<T> = std::result::Result<T, ComputeError>;
