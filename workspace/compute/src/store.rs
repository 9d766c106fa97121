//! Read/write contract between the calculation engine and persistence.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::OnConflict;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use tracing::trace;

use model::entities::{account, monthly_value, period_override};

use crate::error::Result;
use crate::period::Period;

/// A formula-driven account, as the engine needs to see it.
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedAccount {
    pub id: i32,
    pub name: String,
    pub formula: String,
    pub recurrence_source_id: Option<i32>,
}

impl DerivedAccount {
    /// Returns `None` for manual accounts.
    pub fn from_model(model: account::Model) -> Option<Self> {
        let formula = model.formula?;
        Some(Self {
            id: model.id,
            name: model.name,
            formula,
            recurrence_source_id: model.recurrence_source_id,
        })
    }
}

/// In-memory values of the period being calculated.
#[derive(Debug, Clone, Default)]
pub struct PeriodCache {
    values: HashMap<i32, f64>,
}

impl PeriodCache {
    pub fn new(values: HashMap<i32, f64>) -> Self {
        Self { values }
    }

    /// Value of an account in this period; accounts without a value are
    /// worth `0.0`.
    pub fn value_of(&self, account_id: i32) -> f64 {
        self.get(account_id).unwrap_or(0.0)
    }

    pub fn get(&self, account_id: i32) -> Option<f64> {
        self.values.get(&account_id).copied()
    }

    pub fn insert(&mut self, account_id: i32, value: f64) {
        self.values.insert(account_id, value);
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Storage operations the engine depends on.
#[async_trait]
pub trait ValueStore: Send + Sync {
    /// Stored value of an account for a period, if any.
    async fn get_value(&self, account_id: i32, period: Period) -> Result<Option<f64>>;

    /// Idempotent upsert keyed by `(account, month, year)`.
    async fn set_value(&self, account_id: i32, period: Period, value: f64) -> Result<()>;

    /// Every stored value of a period.
    async fn period_values(&self, period: Period) -> Result<HashMap<i32, f64>>;

    /// Stored values of one account from January through `period`, in a
    /// single read. Months without a value are absent.
    async fn year_to_date_values(&self, account_id: i32, period: Period) -> Result<Vec<f64>>;

    /// Overrides registered for a period, by account id.
    async fn period_overrides(&self, period: Period) -> Result<HashMap<i32, f64>>;

    /// Derived accounts in ascending id order.
    async fn list_derived_accounts(&self) -> Result<Vec<DerivedAccount>>;
}

/// [`ValueStore`] over any SeaORM connection, usually an open transaction.
#[derive(Debug)]
pub struct SeaOrmStore<'a, C> {
    conn: &'a C,
}

impl<'a, C> SeaOrmStore<'a, C>
where
    C: ConnectionTrait,
{
    pub fn new(conn: &'a C) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl<C> ValueStore for SeaOrmStore<'_, C>
where
    C: ConnectionTrait + Send + Sync,
{
    async fn get_value(&self, account_id: i32, period: Period) -> Result<Option<f64>> {
        Ok(find_value(self.conn, account_id, period)
            .await?
            .map(|row| row.value))
    }

    async fn set_value(&self, account_id: i32, period: Period, value: f64) -> Result<()> {
        upsert_value(self.conn, account_id, period, value).await
    }

    async fn period_values(&self, period: Period) -> Result<HashMap<i32, f64>> {
        let rows = monthly_value::Entity::find()
            .filter(monthly_value::Column::Month.eq(period.db_month()))
            .filter(monthly_value::Column::Year.eq(period.year()))
            .all(self.conn)
            .await?;
        trace!("Loaded {} value(s) for {}", rows.len(), period);
        Ok(rows.into_iter().map(|row| (row.account_id, row.value)).collect())
    }

    async fn year_to_date_values(&self, account_id: i32, period: Period) -> Result<Vec<f64>> {
        let rows = monthly_value::Entity::find()
            .filter(monthly_value::Column::AccountId.eq(account_id))
            .filter(monthly_value::Column::Year.eq(period.year()))
            .filter(monthly_value::Column::Month.between(1, period.db_month()))
            .order_by_asc(monthly_value::Column::Month)
            .all(self.conn)
            .await?;
        Ok(rows.into_iter().map(|row| row.value).collect())
    }

    async fn period_overrides(&self, period: Period) -> Result<HashMap<i32, f64>> {
        let rows = period_override::Entity::find()
            .filter(period_override::Column::Month.eq(period.db_month()))
            .filter(period_override::Column::Year.eq(period.year()))
            .all(self.conn)
            .await?;
        Ok(rows.into_iter().map(|row| (row.account_id, row.value)).collect())
    }

    async fn list_derived_accounts(&self) -> Result<Vec<DerivedAccount>> {
        let accounts = account::Entity::find()
            .filter(account::Column::Formula.is_not_null())
            .order_by_asc(account::Column::Id)
            .all(self.conn)
            .await?;
        Ok(accounts
            .into_iter()
            .filter_map(DerivedAccount::from_model)
            .collect())
    }
}

async fn find_value<C>(
    conn: &C,
    account_id: i32,
    period: Period,
) -> Result<Option<monthly_value::Model>>
where
    C: ConnectionTrait,
{
    Ok(monthly_value::Entity::find()
        .filter(monthly_value::Column::AccountId.eq(account_id))
        .filter(monthly_value::Column::Month.eq(period.db_month()))
        .filter(monthly_value::Column::Year.eq(period.year()))
        .one(conn)
        .await?)
}

/// Inserts or updates the single value of `(account, period)` in one
/// statement, keyed on the unique `(account_id, month, year)` index.
pub async fn upsert_value<C>(conn: &C, account_id: i32, period: Period, value: f64) -> Result<()>
where
    C: ConnectionTrait,
{
    let now = Utc::now().naive_utc();
    monthly_value::Entity::insert(monthly_value::ActiveModel {
        account_id: Set(account_id),
        month: Set(period.db_month()),
        year: Set(period.year()),
        value: Set(value),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    })
    .on_conflict(
        OnConflict::columns([
            monthly_value::Column::AccountId,
            monthly_value::Column::Month,
            monthly_value::Column::Year,
        ])
        .update_columns([monthly_value::Column::Value, monthly_value::Column::UpdatedAt])
        .to_owned(),
    )
    .exec_without_returning(conn)
    .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{insert_account, insert_value, setup_db};
    use model::AccountKind;

    #[tokio::test]
    async fn test_upsert_updates_in_place() {
        let db = setup_db().await;
        insert_account(&db, 10, None, None).await;
        let period = Period::new(3, 2025).unwrap();

        upsert_value(&db, 10, period, 1.0).await.unwrap();
        upsert_value(&db, 10, period, 2.5).await.unwrap();

        let rows = monthly_value::Entity::find().all(&db).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].value, 2.5);
    }

    #[tokio::test]
    async fn test_upsert_conflict_keeps_row_identity() {
        let db = setup_db().await;
        insert_account(&db, 10, None, None).await;
        let march = Period::new(3, 2025).unwrap();
        let april = Period::new(4, 2025).unwrap();
        insert_value(&db, 10, 3, 2025, 1.0).await;
        let original = monthly_value::Entity::find().one(&db).await.unwrap().unwrap();

        upsert_value(&db, 10, march, 8.0).await.unwrap();
        upsert_value(&db, 10, april, 9.0).await.unwrap();

        let rows = monthly_value::Entity::find()
            .order_by_asc(monthly_value::Column::Month)
            .all(&db)
            .await
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].id, original.id);
        assert_eq!(rows[0].created_at, original.created_at);
        assert_eq!(rows[0].value, 8.0);
        assert!(rows[0].updated_at >= original.updated_at);
        assert_eq!(rows[1].value, 9.0);
    }

    #[tokio::test]
    async fn test_store_reads() {
        let db = setup_db().await;
        insert_account(&db, 1, None, None).await;
        insert_account(&db, 5, Some("1*2"), None).await;
        insert_account(&db, 3, Some("1+1"), None).await;
        for (month, value) in [(1, 100.0), (2, 200.0), (3, 150.0), (4, 75.0)] {
            insert_value(&db, 1, month, 2025, value).await;
        }
        insert_value(&db, 1, 12, 2024, 999.0).await;

        let store = SeaOrmStore::new(&db);
        let march = Period::new(3, 2025).unwrap();

        assert_eq!(store.get_value(1, march).await.unwrap(), Some(150.0));
        assert_eq!(store.get_value(5, march).await.unwrap(), None);
        assert_eq!(
            store.year_to_date_values(1, march).await.unwrap(),
            vec![100.0, 200.0, 150.0]
        );
        assert_eq!(store.period_values(march).await.unwrap().get(&1), Some(&150.0));

        let derived: Vec<i32> = store
            .list_derived_accounts()
            .await
            .unwrap()
            .iter()
            .map(|a| a.id)
            .collect();
        assert_eq!(derived, vec![3, 5]);
    }

    #[test]
    fn test_derived_account_from_manual_model_is_none() {
        let model = account::Model {
            id: 1,
            name: "Receita".to_string(),
            group_name: None,
            kind: AccountKind::IncomeStatement,
            formula: None,
            is_manual: true,
            recurrence_source_id: None,
        };
        assert!(DerivedAccount::from_model(model).is_none());
    }

    #[test]
    fn test_cache_defaults_to_zero() {
        let mut cache = PeriodCache::default();
        assert_eq!(cache.value_of(7), 0.0);
        cache.insert(7, 3.0);
        assert_eq!(cache.value_of(7), 3.0);
        assert_eq!(cache.len(), 1);
    }
}
