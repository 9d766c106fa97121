use sea_orm::entity::prelude::*;
use sea_orm::ActiveModelBehavior;

use super::account;

/// The value of one account for one month.
///
/// `(account_id, month, year)` is unique: values are upserted, never
/// appended. Rows of derived accounts are a cache of the last calculation.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "monthly_values")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub account_id: i32,
    /// 1 to 12.
    pub month: i32,
    pub year: i32,
    #[sea_orm(column_type = "Double")]
    pub value: f64,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "account::Entity",
        from = "Column::AccountId",
        to = "account::Column::Id",
        on_delete = "Cascade"
    )]
    Account,
}

impl Related<account::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Account.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
