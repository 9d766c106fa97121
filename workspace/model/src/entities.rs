//! Root of the SeaORM entity modules.
//!
//! The reporting data model is deliberately small: the chart of accounts,
//! one value per account and month, and the per-month overrides that pin
//! reconciled figures of derived accounts.

pub mod account;
pub mod monthly_value;
pub mod period_override;

pub mod prelude {
    //! A prelude module for easy importing of all entities.
    pub use super::account::Entity as Account;
    pub use super::monthly_value::Entity as MonthlyValue;
    pub use super::period_override::Entity as PeriodOverride;
}

#[cfg(test)]
mod test {
    use chrono::NaiveDate;
    use migration::{Migrator, MigratorTrait};
    use sea_orm::{
        ActiveModelTrait, ColumnTrait, ConnectionTrait, Database, DatabaseConnection, DbErr,
        EntityTrait, ModelTrait, QueryFilter, Set,
    };

    use super::*;
    use prelude::*;

    async fn setup_db() -> Result<DatabaseConnection, DbErr> {
        // Connect to the SQLite database
        let db = Database::connect("sqlite::memory:").await?;

        // Enable foreign keys
        db.execute_unprepared("PRAGMA foreign_keys = ON;").await?;

        Migrator::up(&db, None).await.expect("Migrations failed.");
        Ok(db)
    }

    fn timestamp() -> sea_orm::prelude::DateTime {
        NaiveDate::from_ymd_opt(2025, 5, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    #[tokio::test]
    async fn test_entity_integration() -> Result<(), DbErr> {
        let db = setup_db().await?;

        let revenue = account::ActiveModel {
            id: Set(1),
            name: Set("Receita Operacional".to_string()),
            group_name: Set(None),
            kind: Set(account::AccountKind::IncomeStatement),
            formula: Set(None),
            is_manual: Set(true),
            recurrence_source_id: Set(None),
        }
        .insert(&db)
        .await?;

        let annual = account::ActiveModel {
            id: Set(101),
            name: Set("Receita Acumulada Anual".to_string()),
            group_name: Set(None),
            kind: Set(account::AccountKind::IncomeStatement),
            formula: Set(Some("ACCUMULATED_ANNUAL".to_string())),
            is_manual: Set(false),
            recurrence_source_id: Set(Some(revenue.id)),
        }
        .insert(&db)
        .await?;

        monthly_value::ActiveModel {
            account_id: Set(revenue.id),
            month: Set(5),
            year: Set(2025),
            value: Set(1250.5),
            created_at: Set(timestamp()),
            updated_at: Set(timestamp()),
            ..Default::default()
        }
        .insert(&db)
        .await?;

        period_override::ActiveModel {
            account_id: Set(annual.id),
            month: Set(5),
            year: Set(2025),
            value: Set(9000.0),
            note: Set(Some("Reconciled by accounting".to_string())),
            ..Default::default()
        }
        .insert(&db)
        .await?;

        // Accounts round-trip with their kind and formula
        let accounts = Account::find().all(&db).await?;
        assert_eq!(accounts.len(), 2);
        let stored_annual = accounts.iter().find(|a| a.id == 101).unwrap();
        assert!(stored_annual.is_derived());
        assert!(!stored_annual.is_manual);
        assert_eq!(stored_annual.recurrence_source_id, Some(1));
        assert_eq!(stored_annual.kind, account::AccountKind::IncomeStatement);

        // Values are reachable through the relation
        let values = revenue.find_related(MonthlyValue).all(&db).await?;
        assert_eq!(values.len(), 1);
        assert_eq!(values[0].value, 1250.5);

        let overrides = PeriodOverride::find()
            .filter(period_override::Column::AccountId.eq(annual.id))
            .all(&db)
            .await?;
        assert_eq!(overrides.len(), 1);
        assert_eq!(overrides[0].value, 9000.0);

        Ok(())
    }

    #[tokio::test]
    async fn test_monthly_value_is_unique_per_account_and_period() -> Result<(), DbErr> {
        let db = setup_db().await?;

        account::ActiveModel {
            id: Set(29),
            name: Set("CAIXINHA".to_string()),
            group_name: Set(Some("DISPONÍVEL".to_string())),
            kind: Set(account::AccountKind::Balance),
            formula: Set(None),
            is_manual: Set(true),
            recurrence_source_id: Set(None),
        }
        .insert(&db)
        .await?;

        let row = || monthly_value::ActiveModel {
            account_id: Set(29),
            month: Set(1),
            year: Set(2025),
            value: Set(10.0),
            created_at: Set(timestamp()),
            updated_at: Set(timestamp()),
            ..Default::default()
        };

        row().insert(&db).await?;
        assert!(row().insert(&db).await.is_err());

        Ok(())
    }

    #[tokio::test]
    async fn test_deleting_account_cascades_to_values() -> Result<(), DbErr> {
        let db = setup_db().await?;

        let cash = account::ActiveModel {
            id: Set(30),
            name: Set("SICOOB".to_string()),
            group_name: Set(Some("DISPONÍVEL".to_string())),
            kind: Set(account::AccountKind::Balance),
            formula: Set(None),
            is_manual: Set(true),
            recurrence_source_id: Set(None),
        }
        .insert(&db)
        .await?;

        monthly_value::ActiveModel {
            account_id: Set(cash.id),
            month: Set(2),
            year: Set(2025),
            value: Set(-3.25),
            created_at: Set(timestamp()),
            updated_at: Set(timestamp()),
            ..Default::default()
        }
        .insert(&db)
        .await?;

        cash.delete(&db).await?;
        assert!(MonthlyValue::find().all(&db).await?.is_empty());

        Ok(())
    }
}
