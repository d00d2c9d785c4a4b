//! Posted transaction primitives.
//!
//! A `Transaction` is a concrete ledger record. It is created directly by a
//! user or posted from a recurring rule; either way, once created it stands
//! on its own and survives the deletion of whatever produced it.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, ResultEngine};

/// Direction of a money movement.
///
/// The stored magnitude is always positive; the kind decides the sign the
/// poster writes to the ledger (expense negative, income positive).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Income,
    Expense,
}

impl TransactionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }
}

impl TryFrom<&str> for TransactionKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "income" => Ok(Self::Income),
            "expense" => Ok(Self::Expense),
            other => Err(EngineError::InvalidField(format!(
                "invalid transaction kind: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Uuid,
    pub user_id: String,
    pub name: String,
    pub description: String,
    /// Signed amount: negative for expenses, positive for income.
    pub amount: f64,
    pub account_id: String,
    pub category_id: String,
    pub budget_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub description: String,
    pub amount: f64,
    pub account_id: String,
    pub category_id: String,
    pub budget_id: Option<String>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Transaction> for ActiveModel {
    fn from(tx: &Transaction) -> Self {
        Self {
            id: ActiveValue::Set(tx.id.to_string()),
            user_id: ActiveValue::Set(tx.user_id.clone()),
            name: ActiveValue::Set(tx.name.clone()),
            description: ActiveValue::Set(tx.description.clone()),
            amount: ActiveValue::Set(tx.amount),
            account_id: ActiveValue::Set(tx.account_id.clone()),
            category_id: ActiveValue::Set(tx.category_id.clone()),
            budget_id: ActiveValue::Set(tx.budget_id.clone()),
            created_at: ActiveValue::Set(tx.created_at),
            updated_at: ActiveValue::Set(tx.updated_at),
        }
    }
}

impl TryFrom<Model> for Transaction {
    type Error = EngineError;

    fn try_from(model: Model) -> ResultEngine<Self> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::KeyNotFound("transaction not exists".to_string()))?,
            user_id: model.user_id,
            name: model.name,
            description: model.description,
            amount: model.amount,
            account_id: model.account_id,
            category_id: model.category_id,
            budget_id: model.budget_id,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}
