pub mod engine;
pub mod error;
pub mod formula;
pub mod locks;
pub mod overrides;
pub mod period;
pub mod recurrence;
pub mod registry;
pub mod store;
pub mod values;

#[cfg(test)]
pub(crate) mod testing;

pub use engine::{CalculationOutcome, CalculationReport, CalculationSettings, PeriodCalculator};
pub use error::{ComputeError, Result};
pub use period::Period;

/// Returns the calculator used by the server and the CLI.
///
/// `cutoff_year` freezes every period of an earlier year; `None` leaves all
/// periods open to recalculation.
pub fn default_calculator(cutoff_year: Option<i32>) -> PeriodCalculator {
    PeriodCalculator::new(CalculationSettings { cutoff_year })
}
