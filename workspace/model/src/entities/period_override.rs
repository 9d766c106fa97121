use sea_orm::entity::prelude::*;
use sea_orm::ActiveModelBehavior;

use super::account;

/// A reconciled figure that replaces the formula result of a derived account
/// for one specific month.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "period_overrides")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub account_id: i32,
    pub month: i32,
    pub year: i32,
    #[sea_orm(column_type = "Double")]
    pub value: f64,
    /// Free text explaining where the figure comes from.
    pub note: Option<String>,
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
