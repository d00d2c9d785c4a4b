pub use sea_orm_migration::prelude::*;

mod m20260601_000001_users;
mod m20260601_000002_accounts;
mod m20260605_000001_categories;
mod m20260605_000002_budgets;
mod m20260610_000001_transactions;
mod m20260715_000001_recurring_rules;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260601_000001_users::Migration),
            Box::new(m20260601_000002_accounts::Migration),
            Box::new(m20260605_000001_categories::Migration),
            Box::new(m20260605_000002_budgets::Migration),
            Box::new(m20260610_000001_transactions::Migration),
            Box::new(m20260715_000001_recurring_rules::Migration),
        ]
    }
}
