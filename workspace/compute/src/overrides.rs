//! Per-period values that replace a derived account's formula result.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set,
};
use tracing::{info, instrument};

use model::entities::{account, period_override};

use crate::error::{ComputeError, Result};
use crate::period::Period;

/// Overrides ordered by period then account, optionally limited to a year.
pub async fn list_overrides<C>(conn: &C, year: Option<i32>) -> Result<Vec<period_override::Model>>
where
    C: ConnectionTrait,
{
    let mut query = period_override::Entity::find();
    if let Some(year) = year {
        query = query.filter(period_override::Column::Year.eq(year));
    }
    Ok(query
        .order_by_asc(period_override::Column::Year)
        .order_by_asc(period_override::Column::Month)
        .order_by_asc(period_override::Column::AccountId)
        .all(conn)
        .await?)
}

/// Creates or replaces the override of `(account, period)`. Only derived
/// accounts can be overridden.
#[instrument(skip(conn, period, note), fields(period = %period))]
pub async fn upsert_override<C>(
    conn: &C,
    account_id: i32,
    period: Period,
    value: f64,
    note: Option<String>,
) -> Result<period_override::Model>
where
    C: ConnectionTrait,
{
    let account = account::Entity::find_by_id(account_id)
        .one(conn)
        .await?
        .ok_or_else(|| ComputeError::Account(format!("account {} does not exist", account_id)))?;
    if !account.is_derived() {
        return Err(ComputeError::Account(format!(
            "account {} is entered manually and cannot be overridden",
            account_id
        )));
    }
    if !value.is_finite() {
        return Err(ComputeError::Account(format!(
            "override for account {} is not a finite number",
            account_id
        )));
    }

    let existing = period_override::Entity::find()
        .filter(period_override::Column::AccountId.eq(account_id))
        .filter(period_override::Column::Month.eq(period.db_month()))
        .filter(period_override::Column::Year.eq(period.year()))
        .one(conn)
        .await?;

    let saved = match existing {
        Some(existing) => {
            let mut active: period_override::ActiveModel = existing.into();
            active.value = Set(value);
            active.note = Set(note);
            active.update(conn).await?
        }
        None => {
            period_override::ActiveModel {
                account_id: Set(account_id),
                month: Set(period.db_month()),
                year: Set(period.year()),
                value: Set(value),
                note: Set(note),
                ..Default::default()
            }
            .insert(conn)
            .await?
        }
    };

    info!("Override for account {} in {} set to {}", account_id, period, value);
    Ok(saved)
}

/// Looks up a single override.
pub async fn find_override<C>(conn: &C, override_id: i32) -> Result<Option<period_override::Model>>
where
    C: ConnectionTrait,
{
    Ok(period_override::Entity::find_by_id(override_id).one(conn).await?)
}

/// Removes an override, returning the deleted row if it existed.
pub async fn delete_override<C>(conn: &C, override_id: i32) -> Result<Option<period_override::Model>>
where
    C: ConnectionTrait,
{
    let Some(existing) = find_override(conn, override_id).await? else {
        return Ok(None);
    };
    period_override::Entity::delete_by_id(override_id)
        .exec(conn)
        .await?;
    info!(
        "Removed override {} for account {} in {:02}/{}",
        override_id, existing.account_id, existing.month, existing.year
    );
    Ok(Some(existing))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{insert_account, setup_db};

    #[tokio::test]
    async fn test_upsert_replaces_existing_override() {
        let db = setup_db().await;
        insert_account(&db, 27, Some("18"), None).await;
        let january = Period::new(1, 2025).unwrap();

        let first = upsert_override(&db, 27, january, 1.0, None).await.unwrap();
        let second = upsert_override(&db, 27, january, 2.0, Some("reconciled".into()))
            .await
            .unwrap();

        assert_eq!(first.id, second.id);
        let all = list_overrides(&db, Some(2025)).await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].value, 2.0);
        assert_eq!(all[0].note.as_deref(), Some("reconciled"));
        assert!(list_overrides(&db, Some(2024)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_manual_and_unknown_accounts_cannot_be_overridden() {
        let db = setup_db().await;
        insert_account(&db, 1, None, None).await;
        let january = Period::new(1, 2025).unwrap();

        assert!(matches!(
            upsert_override(&db, 1, january, 1.0, None).await,
            Err(ComputeError::Account(_))
        ));
        assert!(matches!(
            upsert_override(&db, 77, january, 1.0, None).await,
            Err(ComputeError::Account(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_override() {
        let db = setup_db().await;
        insert_account(&db, 27, Some("18"), None).await;
        let saved = upsert_override(&db, 27, Period::new(2, 2025).unwrap(), 5.0, None)
            .await
            .unwrap();

        let found = find_override(&db, saved.id).await.unwrap().unwrap();
        assert_eq!(found.account_id, saved.account_id);
        assert!(delete_override(&db, saved.id).await.unwrap().is_some());
        assert!(find_override(&db, saved.id).await.unwrap().is_none());
        assert!(delete_override(&db, saved.id).await.unwrap().is_none());
        assert!(list_overrides(&db, None).await.unwrap().is_empty());
    }
}
