//! Period calculation: evaluates every derived account of a period in
//! ascending id order and persists the results.

use std::collections::{BTreeSet, HashSet};

use common::money::format_brl;
use sea_orm::{DatabaseConnection, TransactionTrait};
use tracing::{debug, info, instrument, trace, warn};

use crate::error::{ComputeError, Result};
use crate::formula::Formula;
use crate::locks::{PeriodLocks, lock_period_in_db};
use crate::period::Period;
use crate::recurrence;
use crate::store::{DerivedAccount, PeriodCache, SeaOrmStore, ValueStore};
use crate::values::{self, SaveReport};

/// Periods of years below this are frozen unless configured otherwise.
pub const DEFAULT_CUTOFF_YEAR: i32 = 2025;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalculationSettings {
    /// Years strictly below this are never recalculated. `None` disables
    /// the guard.
    pub cutoff_year: Option<i32>,
}

impl Default for CalculationSettings {
    fn default() -> Self {
        Self {
            cutoff_year: Some(DEFAULT_CUTOFF_YEAR),
        }
    }
}

/// A recoverable problem with one account during a run.
#[derive(Debug, Clone, PartialEq)]
pub struct AccountWarning {
    pub account_id: i32,
    pub account_name: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CalculationReport {
    pub period: Period,
    /// Derived accounts whose value was written, overrides included.
    pub computed: usize,
    /// Accounts whose value came from an override.
    pub overridden: Vec<i32>,
    pub warnings: Vec<AccountWarning>,
}

impl CalculationReport {
    fn new(period: Period) -> Self {
        Self {
            period,
            computed: 0,
            overridden: Vec::new(),
            warnings: Vec::new(),
        }
    }

    fn warn(&mut self, account: &DerivedAccount, message: impl Into<String>) {
        let message = message.into();
        warn!(
            "Account {} ({}) in {}: {}",
            account.id, account.name, self.period, message
        );
        self.warnings.push(AccountWarning {
            account_id: account.id,
            account_name: account.name.clone(),
            message,
        });
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CalculationOutcome {
    Computed(CalculationReport),
    /// The period is older than the cutoff year; nothing was written.
    SkippedHistorical { period: Period, cutoff_year: i32 },
}

impl CalculationOutcome {
    /// Accounts computed, `0` for skipped periods.
    pub fn computed_count(&self) -> usize {
        match self {
            CalculationOutcome::Computed(report) => report.computed,
            CalculationOutcome::SkippedHistorical { .. } => 0,
        }
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, CalculationOutcome::SkippedHistorical { .. })
    }

    pub fn period(&self) -> Period {
        match self {
            CalculationOutcome::Computed(report) => report.period,
            CalculationOutcome::SkippedHistorical { period, .. } => *period,
        }
    }

    pub fn warnings(&self) -> &[AccountWarning] {
        match self {
            CalculationOutcome::Computed(report) => &report.warnings,
            CalculationOutcome::SkippedHistorical { .. } => &[],
        }
    }
}

/// Computes derived accounts for one period at a time.
///
/// Clones share the same [`PeriodLocks`], so every handle to a calculator
/// serializes work on a given period.
#[derive(Debug, Clone, Default)]
pub struct PeriodCalculator {
    settings: CalculationSettings,
    locks: PeriodLocks,
}

impl PeriodCalculator {
    pub fn new(settings: CalculationSettings) -> Self {
        Self {
            settings,
            locks: PeriodLocks::new(),
        }
    }

    pub fn settings(&self) -> &CalculationSettings {
        &self.settings
    }

    pub fn locks(&self) -> &PeriodLocks {
        &self.locks
    }

    /// The cutoff year protecting `period`, if the period is frozen.
    pub fn historical_cutoff(&self, period: Period) -> Option<i32> {
        self.settings
            .cutoff_year
            .filter(|cutoff_year| period.year() < *cutoff_year)
    }

    /// Recalculates every derived account of `period` in one transaction.
    #[instrument(skip(self, db, period), fields(period = %period))]
    pub async fn calculate_period(
        &self,
        db: &DatabaseConnection,
        period: Period,
    ) -> Result<CalculationOutcome> {
        trace!("Calculating period {}", period);
        if let Some(cutoff_year) = self.historical_cutoff(period) {
            info!(
                "Skipping {}: periods before {} are historical",
                period, cutoff_year
            );
            return Ok(CalculationOutcome::SkippedHistorical {
                period,
                cutoff_year,
            });
        }

        let _guard = self.locks.acquire(period).await;
        let report = self.calculate_locked(db, period).await?;
        Ok(CalculationOutcome::Computed(report))
    }

    /// Recalculates several periods in chronological order, each in its own
    /// transaction. Stops at the first storage error; earlier periods stay
    /// committed.
    #[instrument(skip(self, db, periods))]
    pub async fn calculate_periods<I>(
        &self,
        db: &DatabaseConnection,
        periods: I,
    ) -> Result<Vec<CalculationOutcome>>
    where
        I: IntoIterator<Item = Period>,
    {
        let ordered: BTreeSet<Period> = periods.into_iter().collect();
        debug!("Recalculating {} period(s)", ordered.len());

        let mut outcomes = Vec::with_capacity(ordered.len());
        for period in ordered {
            outcomes.push(self.calculate_period(db, period).await?);
        }
        Ok(outcomes)
    }

    /// Saves a batch of manual values and recalculates the period, both
    /// under the period lock.
    #[instrument(skip(self, db, period, entries), fields(period = %period, entries = entries.len()))]
    pub async fn save_and_recalculate(
        &self,
        db: &DatabaseConnection,
        period: Period,
        entries: &[(i32, f64)],
    ) -> Result<(SaveReport, CalculationOutcome)> {
        let _guard = self.locks.acquire(period).await;

        let saved = values::save_manual_values(db, period, entries).await?;

        let outcome = match self.historical_cutoff(period) {
            Some(cutoff_year) => {
                info!(
                    "Saved {} value(s) for historical {}, recalculation skipped",
                    saved.saved, period
                );
                CalculationOutcome::SkippedHistorical {
                    period,
                    cutoff_year,
                }
            }
            None => CalculationOutcome::Computed(self.calculate_locked(db, period).await?),
        };
        Ok((saved, outcome))
    }

    /// Caller must hold the period lock. The database lock of the period is
    /// taken inside the transaction, which rolls back on drop if evaluation
    /// fails.
    async fn calculate_locked(
        &self,
        db: &DatabaseConnection,
        period: Period,
    ) -> Result<CalculationReport> {
        let txn = db.begin().await?;
        lock_period_in_db(&txn, period).await?;
        let report = self.evaluate_period(&SeaOrmStore::new(&txn), period).await?;
        txn.commit().await?;

        info!(
            "Computed {} account(s) for {} ({} overridden, {} warning(s))",
            report.computed,
            period,
            report.overridden.len(),
            report.warnings.len()
        );
        Ok(report)
    }

    /// Evaluates and persists every derived account of `period` through
    /// `store`. Does not apply the historical guard or take the lock.
    pub async fn evaluate_period<S>(&self, store: &S, period: Period) -> Result<CalculationReport>
    where
        S: ValueStore + ?Sized,
    {
        let accounts = store.list_derived_accounts().await?;
        let mut cache = PeriodCache::new(store.period_values(period).await?);
        let overrides = store.period_overrides(period).await?;
        debug!(
            "{} derived account(s), {} cached value(s), {} override(s) for {}",
            accounts.len(),
            cache.len(),
            overrides.len(),
            period
        );

        let mut report = CalculationReport::new(period);
        flag_forward_references(&accounts, &mut report);

        for account in &accounts {
            let value = if let Some(&value) = overrides.get(&account.id) {
                debug!("Account {} overridden for {}", account.id, period);
                report.overridden.push(account.id);
                value
            } else {
                match resolve_account(store, account, period, &cache).await {
                    Ok(value) if value.is_finite() => value,
                    Ok(value) => {
                        report.warn(account, format!("non-finite result {}, stored as 0", value));
                        0.0
                    }
                    Err(ComputeError::Database(err)) => return Err(ComputeError::Database(err)),
                    Err(err) => {
                        report.warn(account, err.to_string());
                        0.0
                    }
                }
            };

            store.set_value(account.id, period, value).await?;
            cache.insert(account.id, value);
            report.computed += 1;
            trace!("{} - {} = {}", account.id, account.name, format_brl(value));
        }

        Ok(report)
    }
}

async fn resolve_account<S>(
    store: &S,
    account: &DerivedAccount,
    period: Period,
    cache: &PeriodCache,
) -> Result<f64>
where
    S: ValueStore + ?Sized,
{
    match Formula::parse(&account.formula)? {
        Formula::Empty => Ok(0.0),
        Formula::Recurrence(kind) => recurrence::resolve(store, kind, account, period, cache).await,
        Formula::Arithmetic(expression) => Ok(expression.evaluate(&|id| cache.value_of(id))?),
    }
}

/// A reference to a derived account that is not strictly earlier in id
/// order would read a stale value in a single pass.
fn flag_forward_references(accounts: &[DerivedAccount], report: &mut CalculationReport) {
    let derived: HashSet<i32> = accounts.iter().map(|account| account.id).collect();
    for account in accounts {
        let Ok(formula) = Formula::parse(&account.formula) else {
            continue;
        };
        for reference in formula.account_refs() {
            if derived.contains(&reference) && reference >= account.id {
                report.warn(
                    account,
                    format!("references derived account {} which is not computed before it", reference),
                );
            }
        }
    }
}
