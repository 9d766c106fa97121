use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Chart of accounts; ids are assigned by the chart, not by the database
        manager
            .create_table(
                Table::create()
                    .table(Accounts::Table)
                    .if_not_exists()
                    .col(integer(Accounts::Id).primary_key())
                    .col(string(Accounts::Name))
                    .col(string_null(Accounts::GroupName))
                    .col(string_len(Accounts::Kind, 20))
                    .col(string_null(Accounts::Formula))
                    .col(boolean(Accounts::IsManual).default(true))
                    .col(integer_null(Accounts::RecurrenceSourceId))
                    .to_owned(),
            )
            .await?;

        // Create monthly_values table
        manager
            .create_table(
                Table::create()
                    .table(MonthlyValues::Table)
                    .if_not_exists()
                    .col(pk_auto(MonthlyValues::Id))
                    .col(integer(MonthlyValues::AccountId))
                    .col(integer(MonthlyValues::Month))
                    .col(integer(MonthlyValues::Year))
                    .col(double(MonthlyValues::Value).default(0.0))
                    .col(date_time(MonthlyValues::CreatedAt))
                    .col(date_time(MonthlyValues::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_monthly_values_account")
                            .from(MonthlyValues::Table, MonthlyValues::AccountId)
                            .to(Accounts::Table, Accounts::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_monthly_values_account_period")
                    .table(MonthlyValues::Table)
                    .col(MonthlyValues::AccountId)
                    .col(MonthlyValues::Month)
                    .col(MonthlyValues::Year)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_monthly_values_period")
                    .table(MonthlyValues::Table)
                    .col(MonthlyValues::Year)
                    .col(MonthlyValues::Month)
                    .to_owned(),
            )
            .await?;

        // Create period_overrides table
        manager
            .create_table(
                Table::create()
                    .table(PeriodOverrides::Table)
                    .if_not_exists()
                    .col(pk_auto(PeriodOverrides::Id))
                    .col(integer(PeriodOverrides::AccountId))
                    .col(integer(PeriodOverrides::Month))
                    .col(integer(PeriodOverrides::Year))
                    .col(double(PeriodOverrides::Value))
                    .col(string_null(PeriodOverrides::Note))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_period_overrides_account")
                            .from(PeriodOverrides::Table, PeriodOverrides::AccountId)
                            .to(Accounts::Table, Accounts::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_period_overrides_account_period")
                    .table(PeriodOverrides::Table)
                    .col(PeriodOverrides::AccountId)
                    .col(PeriodOverrides::Month)
                    .col(PeriodOverrides::Year)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Drop tables in reverse order to avoid foreign key constraints
        manager
            .drop_table(Table::drop().table(PeriodOverrides::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(MonthlyValues::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Accounts::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum Accounts {
    Table,
    Id,
    Name,
    GroupName,
    Kind,
    Formula,
    IsManual,
    RecurrenceSourceId,
}

#[derive(DeriveIden)]
enum MonthlyValues {
    Table,
    Id,
    AccountId,
    Month,
    Year,
    Value,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum PeriodOverrides {
    Table,
    Id,
    AccountId,
    Month,
    Year,
    Value,
    Note,
}
