use std::fmt;
use std::str::FromStr;

use sea_orm::entity::prelude::*;

use super::{monthly_value, period_override};

/// The reporting section an account is presented in.
///
/// The section never influences calculation order, it only partitions the
/// chart for statements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum AccountKind {
    /// Balance sheet (assets, liabilities, liquidity ratios).
    #[sea_orm(string_value = "Balance")]
    Balance,
    /// Income statement (DRE) and cash flow lines.
    #[sea_orm(string_value = "IncomeStatement")]
    IncomeStatement,
    /// Working capital indicators.
    #[sea_orm(string_value = "WorkingCapital")]
    WorkingCapital,
}

impl AccountKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountKind::Balance => "Balance",
            AccountKind::IncomeStatement => "IncomeStatement",
            AccountKind::WorkingCapital => "WorkingCapital",
        }
    }
}

impl fmt::Display for AccountKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccountKind {
    type Err = String;

    /// Accepts the canonical names plus the short section labels used on
    /// the reporting screens (`dre`, `working-capital`, ...).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace(['-', '_', ' '], "").as_str() {
            "balance" | "balancesheet" => Ok(AccountKind::Balance),
            "incomestatement" | "dre" => Ok(AccountKind::IncomeStatement),
            "workingcapital" => Ok(AccountKind::WorkingCapital),
            other => Err(format!("unknown account kind '{}'", other)),
        }
    }
}

/// A line of the chart of accounts.
///
/// The `id` is both the primary key and the token used to reference the
/// account inside formulas, so it is never auto-generated.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "accounts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: i32,
    pub name: String,
    /// Category label inside the section, e.g. "DISPONÍVEL".
    pub group_name: Option<String>,
    pub kind: AccountKind,
    /// Absent for manually entered accounts.
    pub formula: Option<String>,
    /// Always equal to `formula.is_none()`.
    #[sea_orm(default_value = "true")]
    pub is_manual: bool,
    /// The account supplying the period delta for recurrence formulas.
    pub recurrence_source_id: Option<i32>,
}

impl Model {
    /// Returns true when the account value is produced by a formula.
    pub fn is_derived(&self) -> bool {
        self.formula.is_some()
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::monthly_value::Entity")]
    MonthlyValue,
    #[sea_orm(has_many = "super::period_override::Entity")]
    PeriodOverride,
}

impl Related<monthly_value::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MonthlyValue.def()
    }
}

impl Related<period_override::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PeriodOverride.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
