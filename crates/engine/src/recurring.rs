//! Recurring-transaction rules.
//!
//! A rule is a template keyed by a day of the month. The engine scans for
//! rules whose day matches "today" and that have not fired in the current
//! calendar month, posts one transaction per match and stamps
//! `last_execution`.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, ResultEngine, transactions::TransactionKind};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RecurringRule {
    pub id: Uuid,
    pub user_id: String,
    pub name: String,
    pub description: String,
    /// Stored magnitude, always positive. The sign is applied at posting
    /// time from `kind`.
    pub amount: f64,
    pub kind: TransactionKind,
    pub account_id: String,
    pub category_id: String,
    /// `None` means the rule does not track a budget.
    pub budget_id: Option<String>,
    /// Day of the month in `[1, 31]`, matched literally against `now.day()`.
    ///
    /// A rule with day 31 never fires in a 30-day month. Known limitation of
    /// the exact-match policy, kept on purpose.
    pub day_of_month: u32,
    /// `None` means the rule has never run.
    pub last_execution: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RecurringRule {
    /// Builds a fresh rule with a time-sortable id and both timestamps set
    /// to `now`.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        user_id: String,
        name: String,
        description: String,
        amount: f64,
        kind: TransactionKind,
        account_id: String,
        category_id: String,
        budget_id: Option<String>,
        day_of_month: u32,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            user_id,
            name,
            description,
            amount,
            kind,
            account_id,
            category_id,
            budget_id,
            day_of_month,
            last_execution: None,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "recurring_rules")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub description: String,
    pub amount: f64,
    pub kind: String,
    pub account_id: String,
    pub category_id: String,
    pub budget_id: Option<String>,
    pub day_of_month: i32,
    pub last_execution: Option<DateTimeUtc>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<&RecurringRule> for ActiveModel {
    fn from(rule: &RecurringRule) -> Self {
        Self {
            id: ActiveValue::Set(rule.id.to_string()),
            user_id: ActiveValue::Set(rule.user_id.clone()),
            name: ActiveValue::Set(rule.name.clone()),
            description: ActiveValue::Set(rule.description.clone()),
            amount: ActiveValue::Set(rule.amount),
            kind: ActiveValue::Set(rule.kind.as_str().to_string()),
            account_id: ActiveValue::Set(rule.account_id.clone()),
            category_id: ActiveValue::Set(rule.category_id.clone()),
            budget_id: ActiveValue::Set(rule.budget_id.clone()),
            day_of_month: ActiveValue::Set(rule.day_of_month as i32),
            last_execution: ActiveValue::Set(rule.last_execution),
            created_at: ActiveValue::Set(rule.created_at),
            updated_at: ActiveValue::Set(rule.updated_at),
        }
    }
}

impl TryFrom<Model> for RecurringRule {
    type Error = EngineError;

    fn try_from(model: Model) -> ResultEngine<Self> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::KeyNotFound("recurring rule not exists".to_string()))?,
            user_id: model.user_id,
            name: model.name,
            description: model.description,
            amount: model.amount,
            kind: TransactionKind::try_from(model.kind.as_str())?,
            account_id: model.account_id,
            category_id: model.category_id,
            budget_id: model.budget_id,
            day_of_month: model.day_of_month as u32,
            last_execution: model.last_execution,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}
