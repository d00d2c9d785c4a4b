use chrono::{DateTime, Datelike, TimeZone, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, sea_query::Expr,
};
use serde::Serialize;

pub use accounts::Account;
pub use budgets::Budget;
pub use categories::Category;
pub use error::EngineError;
pub use notify::{ChannelNotifier, Notification, Notifier};
pub use poster::{LedgerPoster, TransactionDraft, TransactionPoster};
pub use recurring::RecurringRule;
pub use transactions::{Transaction, TransactionKind};

mod accounts;
mod budgets;
mod categories;
mod error;
mod notify;
mod poster;
mod recurring;
pub mod scheduler;
mod transactions;

type ResultEngine<T> = Result<T, EngineError>;

/// Outcome of one due-rule pass.
///
/// Per-rule failures are counted here for logging; they never fail the pass
/// itself.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct PassSummary {
    /// Rules matched by the due query.
    pub due: usize,
    /// Transactions actually posted.
    pub posted: usize,
    /// Rules skipped because posting failed; they stay eligible for the
    /// next pass.
    pub failed: usize,
}

/// The engine is stateless: all state lives in the database, so it can be
/// shared freely between the HTTP handlers and the scheduler.
#[derive(Clone, Debug)]
pub struct Engine {
    database: DatabaseConnection,
}

/// First instant of the month `now` belongs to, in UTC.
fn start_of_month(now: DateTime<Utc>) -> ResultEngine<DateTime<Utc>> {
    Utc.with_ymd_and_hms(now.year(), now.month(), 1, 0, 0, 0)
        .single()
        .ok_or_else(|| EngineError::InvalidField("invalid month start".to_string()))
}

/// Predicate: the rule has not run in the month starting at `month_start`.
fn not_run_this_month(month_start: DateTime<Utc>) -> Condition {
    Condition::any()
        .add(recurring::Column::LastExecution.is_null())
        .add(recurring::Column::LastExecution.lt(month_start))
}

fn map_update_err(err: DbErr, what: &str) -> EngineError {
    match err {
        DbErr::RecordNotUpdated => EngineError::KeyNotFound(format!("{what} not exists")),
        other => EngineError::Database(other),
    }
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    // --- Accounts ---

    pub async fn new_account(
        &self,
        user_id: &str,
        name: &str,
        description: &str,
        now: DateTime<Utc>,
    ) -> ResultEngine<Account> {
        let account = Account::new(
            user_id.to_string(),
            name.to_string(),
            description.to_string(),
            now,
        );
        accounts::ActiveModel::from(&account)
            .insert(&self.database)
            .await?;
        Ok(account)
    }

    pub async fn accounts_for_user(&self, user_id: &str) -> ResultEngine<Vec<Account>> {
        let models = accounts::Entity::find()
            .filter(accounts::Column::UserId.eq(user_id))
            .order_by_desc(accounts::Column::CreatedAt)
            .order_by_desc(accounts::Column::Id)
            .all(&self.database)
            .await?;
        models.into_iter().map(Account::try_from).collect()
    }

    pub async fn account_for_user(&self, id: &str, user_id: &str) -> ResultEngine<Account> {
        let model = accounts::Entity::find_by_id(id)
            .filter(accounts::Column::UserId.eq(user_id))
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("account not exists".to_string()))?;
        Account::try_from(model)
    }

    /// Full-record replace keyed by id; re-stamps `updated_at`.
    pub async fn update_account(
        &self,
        mut account: Account,
        now: DateTime<Utc>,
    ) -> ResultEngine<Account> {
        account.updated_at = now;
        accounts::ActiveModel::from(&account)
            .update(&self.database)
            .await
            .map_err(|err| map_update_err(err, "account"))?;
        Ok(account)
    }

    /// Deleting a missing id is a no-op, not an error. The user filter
    /// keeps the operation idempotent while scoping it to the caller.
    pub async fn delete_account(&self, id: &str, user_id: &str) -> ResultEngine<()> {
        accounts::Entity::delete_many()
            .filter(accounts::Column::Id.eq(id))
            .filter(accounts::Column::UserId.eq(user_id))
            .exec(&self.database)
            .await?;
        Ok(())
    }

    // --- Categories ---

    pub async fn new_category(
        &self,
        user_id: &str,
        name: &str,
        now: DateTime<Utc>,
    ) -> ResultEngine<Category> {
        let category = Category::new(user_id.to_string(), name.to_string(), now);
        categories::ActiveModel::from(&category)
            .insert(&self.database)
            .await?;
        Ok(category)
    }

    pub async fn categories_for_user(&self, user_id: &str) -> ResultEngine<Vec<Category>> {
        let models = categories::Entity::find()
            .filter(categories::Column::UserId.eq(user_id))
            .order_by_desc(categories::Column::CreatedAt)
            .order_by_desc(categories::Column::Id)
            .all(&self.database)
            .await?;
        models.into_iter().map(Category::try_from).collect()
    }

    pub async fn category_for_user(&self, id: &str, user_id: &str) -> ResultEngine<Category> {
        let model = categories::Entity::find_by_id(id)
            .filter(categories::Column::UserId.eq(user_id))
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("category not exists".to_string()))?;
        Category::try_from(model)
    }

    pub async fn update_category(
        &self,
        mut category: Category,
        now: DateTime<Utc>,
    ) -> ResultEngine<Category> {
        category.updated_at = now;
        categories::ActiveModel::from(&category)
            .update(&self.database)
            .await
            .map_err(|err| map_update_err(err, "category"))?;
        Ok(category)
    }

    pub async fn delete_category(&self, id: &str, user_id: &str) -> ResultEngine<()> {
        categories::Entity::delete_many()
            .filter(categories::Column::Id.eq(id))
            .filter(categories::Column::UserId.eq(user_id))
            .exec(&self.database)
            .await?;
        Ok(())
    }

    // --- Budgets ---

    pub async fn new_budget(
        &self,
        user_id: &str,
        name: &str,
        amount: f64,
        now: DateTime<Utc>,
    ) -> ResultEngine<Budget> {
        let budget = Budget::new(user_id.to_string(), name.to_string(), amount, now);
        budgets::ActiveModel::from(&budget)
            .insert(&self.database)
            .await?;
        Ok(budget)
    }

    pub async fn budgets_for_user(&self, user_id: &str) -> ResultEngine<Vec<Budget>> {
        let models = budgets::Entity::find()
            .filter(budgets::Column::UserId.eq(user_id))
            .order_by_desc(budgets::Column::CreatedAt)
            .order_by_desc(budgets::Column::Id)
            .all(&self.database)
            .await?;
        models.into_iter().map(Budget::try_from).collect()
    }

    pub async fn budget_for_user(&self, id: &str, user_id: &str) -> ResultEngine<Budget> {
        let model = budgets::Entity::find_by_id(id)
            .filter(budgets::Column::UserId.eq(user_id))
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("budget not exists".to_string()))?;
        Budget::try_from(model)
    }

    pub async fn update_budget(
        &self,
        mut budget: Budget,
        now: DateTime<Utc>,
    ) -> ResultEngine<Budget> {
        budget.updated_at = now;
        budgets::ActiveModel::from(&budget)
            .update(&self.database)
            .await
            .map_err(|err| map_update_err(err, "budget"))?;
        Ok(budget)
    }

    pub async fn delete_budget(&self, id: &str, user_id: &str) -> ResultEngine<()> {
        budgets::Entity::delete_many()
            .filter(budgets::Column::Id.eq(id))
            .filter(budgets::Column::UserId.eq(user_id))
            .exec(&self.database)
            .await?;
        Ok(())
    }

    // --- Transactions ---

    pub async fn transactions_for_user(
        &self,
        user_id: &str,
        limit: u64,
    ) -> ResultEngine<Vec<Transaction>> {
        let models = transactions::Entity::find()
            .filter(transactions::Column::UserId.eq(user_id))
            .order_by_desc(transactions::Column::CreatedAt)
            .order_by_desc(transactions::Column::Id)
            .limit(limit)
            .all(&self.database)
            .await?;
        models.into_iter().map(Transaction::try_from).collect()
    }

    /// Case-insensitive substring search over transaction names and
    /// descriptions.
    pub async fn search_transactions(
        &self,
        user_id: &str,
        query: &str,
        limit: u64,
    ) -> ResultEngine<Vec<Transaction>> {
        let models = transactions::Entity::find()
            .filter(transactions::Column::UserId.eq(user_id))
            .filter(
                Condition::any()
                    .add(transactions::Column::Name.contains(query))
                    .add(transactions::Column::Description.contains(query)),
            )
            .order_by_desc(transactions::Column::CreatedAt)
            .order_by_desc(transactions::Column::Id)
            .limit(limit)
            .all(&self.database)
            .await?;
        models.into_iter().map(Transaction::try_from).collect()
    }

    pub async fn transaction_for_user(&self, id: &str, user_id: &str) -> ResultEngine<Transaction> {
        let model = transactions::Entity::find_by_id(id)
            .filter(transactions::Column::UserId.eq(user_id))
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("transaction not exists".to_string()))?;
        Transaction::try_from(model)
    }

    pub async fn delete_transaction(&self, id: &str, user_id: &str) -> ResultEngine<()> {
        transactions::Entity::delete_many()
            .filter(transactions::Column::Id.eq(id))
            .filter(transactions::Column::UserId.eq(user_id))
            .exec(&self.database)
            .await?;
        Ok(())
    }

    // --- Recurring rules ---

    /// Persists a new rule. The id and timestamps were assigned by
    /// [`RecurringRule::new`]; this is a single insert, so a failure leaves
    /// no partial state.
    pub async fn create_rule(&self, rule: RecurringRule) -> ResultEngine<RecurringRule> {
        recurring::ActiveModel::from(&rule)
            .insert(&self.database)
            .await?;
        Ok(rule)
    }

    /// All rules for a user, most recently created first. No pagination.
    pub async fn rules_for_user(&self, user_id: &str) -> ResultEngine<Vec<RecurringRule>> {
        let models = recurring::Entity::find()
            .filter(recurring::Column::UserId.eq(user_id))
            .order_by_desc(recurring::Column::CreatedAt)
            .order_by_desc(recurring::Column::Id)
            .all(&self.database)
            .await?;
        models.into_iter().map(RecurringRule::try_from).collect()
    }

    pub async fn rule_for_user(&self, id: &str, user_id: &str) -> ResultEngine<RecurringRule> {
        let model = recurring::Entity::find_by_id(id)
            .filter(recurring::Column::UserId.eq(user_id))
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("recurring rule not exists".to_string()))?;
        RecurringRule::try_from(model)
    }

    /// Full-record replace keyed by id; re-stamps `updated_at`.
    ///
    /// Ownership of the rule is the boundary's job; this method does not
    /// compare the rule's `user_id` against any caller context.
    pub async fn update_rule(
        &self,
        mut rule: RecurringRule,
        now: DateTime<Utc>,
    ) -> ResultEngine<RecurringRule> {
        rule.updated_at = now;
        recurring::ActiveModel::from(&rule)
            .update(&self.database)
            .await
            .map_err(|err| map_update_err(err, "recurring rule"))?;
        Ok(rule)
    }

    /// Delete by id; a missing id is a no-op. Transactions already posted
    /// from the rule are untouched.
    pub async fn delete_rule(&self, id: &str, user_id: &str) -> ResultEngine<()> {
        recurring::Entity::delete_many()
            .filter(recurring::Column::Id.eq(id))
            .filter(recurring::Column::UserId.eq(user_id))
            .exec(&self.database)
            .await?;
        Ok(())
    }

    /// Runs one due-rule pass.
    ///
    /// A rule is due when its `day_of_month` equals `now.day()` (UTC) and it
    /// has not run yet in the current calendar month. Each due rule is
    /// handled sequentially and independently: a posting failure is logged
    /// and skipped, never rolled back or retried within the pass, and never
    /// blocks the remaining rules. The only fatal error is a failure of the
    /// due-set query itself.
    ///
    /// After a successful post the rule's `last_execution` is advanced with
    /// a single conditional update re-checking the not-run-this-month
    /// predicate, so two concurrent passes cannot both claim the same rule.
    /// If that update fails the rule may fire again next pass; the
    /// at-least-once duplicate is accepted.
    pub async fn process_due_transactions<P, N>(
        &self,
        poster: &P,
        notifier: &N,
        now: DateTime<Utc>,
    ) -> ResultEngine<PassSummary>
    where
        P: TransactionPoster + Sync + ?Sized,
        N: Notifier + Sync + ?Sized,
    {
        let today = now.day() as i32;
        let month_start = start_of_month(now)?;

        let due = recurring::Entity::find()
            .filter(recurring::Column::DayOfMonth.eq(today))
            .filter(not_run_this_month(month_start))
            .order_by_asc(recurring::Column::Id)
            .all(&self.database)
            .await?;

        let mut summary = PassSummary {
            due: due.len(),
            ..PassSummary::default()
        };

        for model in due {
            let rule = match RecurringRule::try_from(model) {
                Ok(rule) => rule,
                Err(err) => {
                    tracing::warn!("skipping malformed recurring rule: {err}");
                    summary.failed += 1;
                    continue;
                }
            };

            let draft = TransactionDraft {
                name: rule.name.clone(),
                description: rule.description.clone(),
                amount: rule.amount,
                kind: rule.kind,
                account_id: rule.account_id.clone(),
                user_id: rule.user_id.clone(),
                category_id: rule.category_id.clone(),
                // The posting interface signals "no budget" with an empty
                // string, not a nullable field.
                budget_id: rule.budget_id.clone().unwrap_or_default(),
            };

            if let Err(err) = poster.post(draft, now).await {
                tracing::warn!(rule_id = %rule.id, rule_name = %rule.name,
                    "failed to post recurring transaction, will retry next pass: {err}");
                summary.failed += 1;
                continue;
            }
            summary.posted += 1;

            match self.claim_rule(&rule, month_start, now).await {
                Ok(true) => {
                    notifier.send_to_user(
                        &rule.user_id,
                        Notification::recurring_transaction(&rule.name, rule.amount),
                    );
                }
                Ok(false) => {
                    tracing::warn!(rule_id = %rule.id,
                        "recurring rule was already claimed for this month, skipping notification");
                }
                Err(err) => {
                    tracing::warn!(rule_id = %rule.id,
                        "failed to advance last_execution, rule may fire again next pass: {err}");
                }
            }
        }

        Ok(summary)
    }

    /// Advances `last_execution` to `now` iff the rule still has not run
    /// this month. Returns whether this call won the claim.
    async fn claim_rule(
        &self,
        rule: &RecurringRule,
        month_start: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> ResultEngine<bool> {
        let result = recurring::Entity::update_many()
            .col_expr(recurring::Column::LastExecution, Expr::value(Some(now)))
            .col_expr(recurring::Column::UpdatedAt, Expr::value(now))
            .filter(recurring::Column::Id.eq(rule.id.to_string()))
            .filter(not_run_this_month(month_start))
            .exec(&self.database)
            .await?;
        Ok(result.rows_affected == 1)
    }
}

/// The builder for `Engine`
#[derive(Default)]
pub struct EngineBuilder {
    database: DatabaseConnection,
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    /// Construct `Engine`
    pub fn build(self) -> Engine {
        Engine {
            database: self.database,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_of_month_truncates_to_first_day() {
        let now = Utc.with_ymd_and_hms(2026, 3, 15, 9, 30, 0).single().unwrap();
        let start = start_of_month(now).unwrap();
        assert_eq!(
            start,
            Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).single().unwrap()
        );
    }

    #[test]
    fn new_rule_starts_without_execution_state() {
        let now = Utc::now();
        let rule = RecurringRule::new(
            "alice".into(),
            "Rent".into(),
            String::new(),
            800.0,
            TransactionKind::Expense,
            "acc".into(),
            "cat".into(),
            None,
            1,
            now,
        );
        assert!(rule.last_execution.is_none());
        assert_eq!(rule.created_at, now);
        assert_eq!(rule.updated_at, now);
        assert_eq!(rule.id.get_version_num(), 7);
    }
}
