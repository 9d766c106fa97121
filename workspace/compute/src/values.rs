//! Manual data entry, period reads and administrative purge.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    TransactionTrait,
};
use tracing::{debug, info, instrument, warn};

use model::AccountKind;
use model::entities::{account, monthly_value};

use crate::error::Result;
use crate::locks::lock_period_in_db;
use crate::period::Period;
use crate::store::upsert_value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectionReason {
    UnknownAccount,
    /// Values of formula accounts are never accepted from input.
    DerivedAccount,
    NonFiniteValue,
}

impl fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RejectionReason::UnknownAccount => "unknown account",
            RejectionReason::DerivedAccount => "account is computed by a formula",
            RejectionReason::NonFiniteValue => "value is not a finite number",
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RejectedEntry {
    pub account_id: i32,
    pub value: f64,
    pub reason: RejectionReason,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SaveReport {
    pub saved: usize,
    pub rejected: Vec<RejectedEntry>,
}

/// Upserts a batch of manual values in one transaction. Entries that do not
/// target a manual account are reported and skipped.
#[instrument(skip(db, period, entries), fields(period = %period, entries = entries.len()))]
pub async fn save_manual_values(
    db: &DatabaseConnection,
    period: Period,
    entries: &[(i32, f64)],
) -> Result<SaveReport> {
    let txn = db.begin().await?;
    lock_period_in_db(&txn, period).await?;
    let accounts: HashMap<i32, account::Model> = account::Entity::find()
        .all(&txn)
        .await?
        .into_iter()
        .map(|account| (account.id, account))
        .collect();

    let mut report = SaveReport::default();
    for &(account_id, value) in entries {
        let rejection = match accounts.get(&account_id) {
            None => Some(RejectionReason::UnknownAccount),
            Some(account) if account.is_derived() => Some(RejectionReason::DerivedAccount),
            Some(_) if !value.is_finite() => Some(RejectionReason::NonFiniteValue),
            Some(_) => None,
        };

        if let Some(reason) = rejection {
            warn!("Rejected value for account {} in {}: {}", account_id, period, reason);
            report.rejected.push(RejectedEntry {
                account_id,
                value,
                reason,
            });
            continue;
        }

        upsert_value(&txn, account_id, period, value).await?;
        report.saved += 1;
    }

    txn.commit().await?;
    info!(
        "Saved {} manual value(s) for {}, rejected {}",
        report.saved,
        period,
        report.rejected.len()
    );
    Ok(report)
}

/// Every stored value of a period, by account id.
pub async fn period_values<C>(conn: &C, period: Period) -> Result<BTreeMap<i32, f64>>
where
    C: ConnectionTrait,
{
    let rows = monthly_value::Entity::find()
        .filter(monthly_value::Column::Month.eq(period.db_month()))
        .filter(monthly_value::Column::Year.eq(period.year()))
        .all(conn)
        .await?;
    Ok(rows.into_iter().map(|row| (row.account_id, row.value)).collect())
}

/// Deletes every value of a period, manual and computed alike.
#[instrument(skip(conn, period), fields(period = %period))]
pub async fn purge_period<C>(conn: &C, period: Period) -> Result<u64>
where
    C: ConnectionTrait,
{
    let result = monthly_value::Entity::delete_many()
        .filter(monthly_value::Column::Month.eq(period.db_month()))
        .filter(monthly_value::Column::Year.eq(period.year()))
        .exec(conn)
        .await?;
    info!("Purged {} value(s) for {}", result.rows_affected, period);
    Ok(result.rows_affected)
}

/// One account line of a yearly statement.
#[derive(Debug, Clone, PartialEq)]
pub struct StatementRow {
    pub account_id: i32,
    pub name: String,
    pub group_name: Option<String>,
    pub is_manual: bool,
    /// January to December; months without a value are `0.0`.
    pub values: [f64; 12],
}

/// Accounts of one kind with their twelve monthly values for `year`.
#[instrument(skip(conn))]
pub async fn yearly_statement<C>(conn: &C, kind: AccountKind, year: i32) -> Result<Vec<StatementRow>>
where
    C: ConnectionTrait,
{
    let accounts = account::Entity::find()
        .filter(account::Column::Kind.eq(kind))
        .order_by_asc(account::Column::Id)
        .all(conn)
        .await?;
    let ids: Vec<i32> = accounts.iter().map(|account| account.id).collect();

    let values = monthly_value::Entity::find()
        .filter(monthly_value::Column::Year.eq(year))
        .filter(monthly_value::Column::AccountId.is_in(ids))
        .all(conn)
        .await?;
    debug!("{} value(s) for {} accounts in {}", values.len(), kind, year);

    let mut by_account: HashMap<i32, [f64; 12]> = HashMap::new();
    for row in values {
        if let Some(slot) = usize::try_from(row.month - 1).ok().filter(|m| *m < 12) {
            by_account.entry(row.account_id).or_insert([0.0; 12])[slot] = row.value;
        }
    }

    Ok(accounts
        .into_iter()
        .map(|account| StatementRow {
            values: by_account.remove(&account.id).unwrap_or([0.0; 12]),
            account_id: account.id,
            is_manual: account.is_manual,
            name: account.name,
            group_name: account.group_name,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{insert_account, insert_value, setup_db, stored_value};

    fn period(month: u32, year: i32) -> Period {
        Period::new(month, year).unwrap()
    }

    #[tokio::test]
    async fn test_save_rejects_derived_and_unknown_accounts() {
        let db = setup_db().await;
        insert_account(&db, 1, None, None).await;
        insert_account(&db, 2, Some("1*2"), None).await;

        let report = save_manual_values(
            &db,
            period(1, 2025),
            &[(1, 10.0), (2, 99.0), (404, 1.0), (1, f64::NAN)],
        )
        .await
        .unwrap();

        assert_eq!(report.saved, 1);
        let reasons: Vec<RejectionReason> = report.rejected.iter().map(|r| r.reason).collect();
        assert_eq!(
            reasons,
            vec![
                RejectionReason::DerivedAccount,
                RejectionReason::UnknownAccount,
                RejectionReason::NonFiniteValue,
            ]
        );
        assert_eq!(stored_value(&db, 1, 1, 2025).await, Some(10.0));
        assert_eq!(stored_value(&db, 2, 1, 2025).await, None);
    }

    #[tokio::test]
    async fn test_resubmission_updates_value() {
        let db = setup_db().await;
        insert_account(&db, 1, None, None).await;

        save_manual_values(&db, period(1, 2025), &[(1, 10.0)]).await.unwrap();
        save_manual_values(&db, period(1, 2025), &[(1, 12.0)]).await.unwrap();

        let values = period_values(&db, period(1, 2025)).await.unwrap();
        assert_eq!(values.len(), 1);
        assert_eq!(values.get(&1), Some(&12.0));
    }

    #[tokio::test]
    async fn test_purge_only_touches_one_period() {
        let db = setup_db().await;
        insert_account(&db, 1, None, None).await;
        insert_account(&db, 2, None, None).await;
        insert_value(&db, 1, 3, 2025, 1.0).await;
        insert_value(&db, 2, 3, 2025, 2.0).await;
        insert_value(&db, 1, 4, 2025, 3.0).await;

        let deleted = purge_period(&db, period(3, 2025)).await.unwrap();

        assert_eq!(deleted, 2);
        assert!(period_values(&db, period(3, 2025)).await.unwrap().is_empty());
        assert_eq!(stored_value(&db, 1, 4, 2025).await, Some(3.0));
    }

    #[tokio::test]
    async fn test_yearly_statement_fills_missing_months() {
        let db = setup_db().await;
        insert_account(&db, 1, None, None).await;
        insert_account(&db, 2, Some("1"), None).await;
        insert_value(&db, 1, 1, 2025, 100.0).await;
        insert_value(&db, 1, 12, 2025, 50.0).await;
        insert_value(&db, 1, 6, 2024, 999.0).await;

        let rows = yearly_statement(&db, AccountKind::IncomeStatement, 2025)
            .await
            .unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].account_id, 1);
        assert_eq!(rows[0].values[0], 100.0);
        assert_eq!(rows[0].values[5], 0.0);
        assert_eq!(rows[0].values[11], 50.0);
        assert!(!rows[1].is_manual);
        assert_eq!(rows[1].values, [0.0; 12]);

        let balance = yearly_statement(&db, AccountKind::Balance, 2025).await.unwrap();
        assert!(balance.is_empty());
    }
}
