use sea_orm_migration::prelude::*;

use crate::m20260601_000002_accounts::Accounts;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
enum RecurringRules {
    Table,
    Id,
    UserId,
    Name,
    Description,
    Amount,
    Kind,
    AccountId,
    CategoryId,
    BudgetId,
    DayOfMonth,
    LastExecution,
    CreatedAt,
    UpdatedAt,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(RecurringRules::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(RecurringRules::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(RecurringRules::UserId).string().not_null())
                    .col(ColumnDef::new(RecurringRules::Name).string().not_null())
                    .col(
                        ColumnDef::new(RecurringRules::Description)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(RecurringRules::Amount).double().not_null())
                    .col(ColumnDef::new(RecurringRules::Kind).string().not_null())
                    .col(
                        ColumnDef::new(RecurringRules::AccountId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(RecurringRules::CategoryId)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(RecurringRules::BudgetId).string())
                    .col(
                        ColumnDef::new(RecurringRules::DayOfMonth)
                            .integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(RecurringRules::LastExecution).timestamp())
                    .col(
                        ColumnDef::new(RecurringRules::CreatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(RecurringRules::UpdatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-recurring_rules-account_id")
                            .from(RecurringRules::Table, RecurringRules::AccountId)
                            .to(Accounts::Table, Accounts::Id),
                    )
                    .to_owned(),
            )
            .await?;

        // The due-set query filters on day_of_month and last_execution.
        manager
            .create_index(
                Index::create()
                    .name("idx-recurring_rules-day_of_month")
                    .table(RecurringRules::Table)
                    .col(RecurringRules::DayOfMonth)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-recurring_rules-user_id")
                    .table(RecurringRules::Table)
                    .col(RecurringRules::UserId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(RecurringRules::Table).to_owned())
            .await
    }
}
