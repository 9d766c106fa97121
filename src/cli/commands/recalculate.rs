use anyhow::Result;
use compute::{default_calculator, CalculationOutcome, Period};
use sea_orm::Database;
use tracing::{debug, error, info, trace, warn};

use crate::config::Settings;

/// Recalculates one month, or every month of `year` in order.
pub async fn recalculate(settings: &Settings, year: i32, month: Option<u32>) -> Result<()> {
    trace!("Entering recalculate function");
    let periods = match month {
        Some(month) => vec![Period::new(month, year)?],
        None => (1..=12)
            .map(|month| Period::new(month, year))
            .collect::<compute::Result<Vec<_>>>()?,
    };
    debug!("Periods to recalculate: {}", periods.len());

    let db = Database::connect(&settings.database_url).await?;
    let calculator = default_calculator(settings.calculation.effective_cutoff());

    let outcomes = match calculator.calculate_periods(&db, periods).await {
        Ok(outcomes) => outcomes,
        Err(e) => {
            error!("Recalculation failed: {}", e);
            return Err(e.into());
        }
    };

    for outcome in &outcomes {
        match outcome {
            CalculationOutcome::Computed(report) => {
                info!(
                    "{}: {} account(s) computed, {} overridden",
                    report.period,
                    report.computed,
                    report.overridden.len()
                );
                for warning in &report.warnings {
                    warn!(
                        "{}: account {} ({}): {}",
                        report.period, warning.account_id, warning.account_name, warning.message
                    );
                }
            }
            CalculationOutcome::SkippedHistorical { period, cutoff_year } => {
                warn!("{}: skipped, periods before {} are historical", period, cutoff_year);
            }
        }
    }

    let total: usize = outcomes.iter().map(CalculationOutcome::computed_count).sum();
    info!("Recalculation finished: {} account value(s) written", total);
    Ok(())
}
