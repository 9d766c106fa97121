//! Period-chained formulas that need values outside the current period.

use tracing::debug;

use crate::error::{ComputeError, Result};
use crate::formula::{ACCUMULATED, ACCUMULATED_ANNUAL};
use crate::period::Period;
use crate::store::{DerivedAccount, PeriodCache, ValueStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recurrence {
    /// Previous month of the same account plus the source's current value.
    Accumulated,
    /// Sum of the source's stored values from January to the current month.
    AccumulatedAnnual,
}

impl Recurrence {
    /// Exact, case-sensitive keyword match.
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            ACCUMULATED => Some(Recurrence::Accumulated),
            ACCUMULATED_ANNUAL => Some(Recurrence::AccumulatedAnnual),
            _ => None,
        }
    }

    pub fn keyword(&self) -> &'static str {
        match self {
            Recurrence::Accumulated => ACCUMULATED,
            Recurrence::AccumulatedAnnual => ACCUMULATED_ANNUAL,
        }
    }
}

/// Resolves a recurrence for `account` in `period`.
///
/// The source account comes from the account's configuration. The current
/// source value for [`Recurrence::Accumulated`] is read from `cache`, so a
/// derived source computed earlier in the same pass is seen fresh.
pub async fn resolve<S>(
    store: &S,
    recurrence: Recurrence,
    account: &DerivedAccount,
    period: Period,
    cache: &PeriodCache,
) -> Result<f64>
where
    S: ValueStore + ?Sized,
{
    let source = account
        .recurrence_source_id
        .ok_or(ComputeError::MissingRecurrenceSource(account.id))?;

    match recurrence {
        Recurrence::Accumulated => {
            let previous = match period.previous() {
                Some(previous) => store.get_value(account.id, previous).await?.unwrap_or(0.0),
                None => 0.0,
            };
            let delta = cache.value_of(source);
            debug!(
                "Account {} {}: previous {} + source {} delta {}",
                account.id, recurrence.keyword(), previous, source, delta
            );
            Ok(previous + delta)
        }
        Recurrence::AccumulatedAnnual => {
            let values = store.year_to_date_values(source, period).await?;
            debug!(
                "Account {} {}: {} month(s) of source {}",
                account.id,
                recurrence.keyword(),
                values.len(),
                source
            );
            Ok(values.iter().sum())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SeaOrmStore;
    use crate::testing::{insert_account, insert_value, setup_db};

    fn accumulating(id: i32, source: Option<i32>) -> DerivedAccount {
        DerivedAccount {
            id,
            name: "FLUXO ACUMULADO".to_string(),
            formula: ACCUMULATED.to_string(),
            recurrence_source_id: source,
        }
    }

    #[tokio::test]
    async fn test_accumulated_reads_previous_december() {
        let db = setup_db().await;
        insert_account(&db, 27, None, None).await;
        insert_account(&db, 28, Some(ACCUMULATED), Some(27)).await;
        insert_value(&db, 28, 12, 2024, 1000.0).await;

        let store = SeaOrmStore::new(&db);
        let mut cache = PeriodCache::default();
        cache.insert(27, -100.0);

        let value = resolve(
            &store,
            Recurrence::Accumulated,
            &accumulating(28, Some(27)),
            Period::new(1, 2025).unwrap(),
            &cache,
        )
        .await
        .unwrap();
        assert_eq!(value, 900.0);
    }

    #[tokio::test]
    async fn test_annual_sum_stops_at_requested_month() {
        let db = setup_db().await;
        insert_account(&db, 1, None, None).await;
        for (month, value) in [(1, 100.0), (2, 200.0), (3, 150.0), (5, 500.0)] {
            insert_value(&db, 1, month, 2025, value).await;
        }
        let store = SeaOrmStore::new(&db);
        let account = DerivedAccount {
            id: 101,
            name: "RECEITA ACUMULADA ANUAL".to_string(),
            formula: ACCUMULATED_ANNUAL.to_string(),
            recurrence_source_id: Some(1),
        };

        let april = resolve(
            &store,
            Recurrence::AccumulatedAnnual,
            &account,
            Period::new(4, 2025).unwrap(),
            &PeriodCache::default(),
        )
        .await
        .unwrap();
        assert_eq!(april, 450.0);
    }

    #[tokio::test]
    async fn test_missing_source_is_an_error() {
        let db = setup_db().await;
        let store = SeaOrmStore::new(&db);
        let result = resolve(
            &store,
            Recurrence::Accumulated,
            &accumulating(28, None),
            Period::new(2, 2025).unwrap(),
            &PeriodCache::default(),
        )
        .await;
        assert!(matches!(result, Err(ComputeError::MissingRecurrenceSource(28))));
    }
}
