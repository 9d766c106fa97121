//! Shared fixtures for the compute test-suite.

use chrono::Utc;
use migration::{Migrator, MigratorTrait};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, Database, DatabaseConnection, EntityTrait,
    QueryFilter, Set,
};

use model::AccountKind;
use model::entities::{account, monthly_value, period_override};

/// Fresh in-memory SQLite database with every migration applied.
pub(crate) async fn setup_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("Failed to connect to in-memory database");
    db.execute_unprepared("PRAGMA foreign_keys = ON")
        .await
        .expect("Failed to enable foreign keys");
    Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");
    db
}

pub(crate) async fn insert_account(
    db: &DatabaseConnection,
    id: i32,
    formula: Option<&str>,
    recurrence_source_id: Option<i32>,
) -> account::Model {
    account::ActiveModel {
        id: Set(id),
        name: Set(format!("Account {}", id)),
        group_name: Set(None),
        kind: Set(AccountKind::IncomeStatement),
        formula: Set(formula.map(str::to_string)),
        is_manual: Set(formula.is_none()),
        recurrence_source_id: Set(recurrence_source_id),
    }
    .insert(db)
    .await
    .expect("Failed to insert account")
}

pub(crate) async fn insert_value(
    db: &DatabaseConnection,
    account_id: i32,
    month: i32,
    year: i32,
    value: f64,
) {
    let now = Utc::now().naive_utc();
    monthly_value::ActiveModel {
        account_id: Set(account_id),
        month: Set(month),
        year: Set(year),
        value: Set(value),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("Failed to insert monthly value");
}

pub(crate) async fn insert_override(
    db: &DatabaseConnection,
    account_id: i32,
    month: i32,
    year: i32,
    value: f64,
) {
    period_override::ActiveModel {
        account_id: Set(account_id),
        month: Set(month),
        year: Set(year),
        value: Set(value),
        note: Set(None),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("Failed to insert override");
}

pub(crate) async fn stored_value(
    db: &DatabaseConnection,
    account_id: i32,
    month: i32,
    year: i32,
) -> Option<f64> {
    monthly_value::Entity::find()
        .filter(monthly_value::Column::AccountId.eq(account_id))
        .filter(monthly_value::Column::Month.eq(month))
        .filter(monthly_value::Column::Year.eq(year))
        .one(db)
        .await
        .expect("Failed to read monthly value")
        .map(|row| row.value)
}
