//! The transaction poster.
//!
//! The rule engine never writes ledger rows itself; it hands a
//! [`TransactionDraft`] to a [`TransactionPoster`] and treats the rest as
//! opaque. The production poster is [`LedgerPoster`]; tests swap in doubles
//! to exercise the per-rule failure policy.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{ActiveModelTrait, DatabaseConnection};
use uuid::Uuid;

use crate::{
    ResultEngine,
    transactions::{self, Transaction, TransactionKind},
};

/// A transaction to be posted.
///
/// `amount` is the stored magnitude (positive); the poster applies the sign
/// from `kind`. `budget_id` uses the empty string to mean "no budget
/// tracking" — a pre-existing posting convention kept as-is.
#[derive(Clone, Debug, PartialEq)]
pub struct TransactionDraft {
    pub name: String,
    pub description: String,
    pub amount: f64,
    pub kind: TransactionKind,
    pub account_id: String,
    pub user_id: String,
    pub category_id: String,
    pub budget_id: String,
}

#[async_trait]
pub trait TransactionPoster {
    /// Persists one transaction from the draft and returns its id.
    async fn post(&self, draft: TransactionDraft, now: DateTime<Utc>) -> ResultEngine<Uuid>;
}

/// Poster backed by the ledger database.
#[derive(Clone, Debug)]
pub struct LedgerPoster {
    database: DatabaseConnection,
}

impl LedgerPoster {
    pub fn new(database: DatabaseConnection) -> Self {
        Self { database }
    }
}

#[async_trait]
impl TransactionPoster for LedgerPoster {
    async fn post(&self, draft: TransactionDraft, now: DateTime<Utc>) -> ResultEngine<Uuid> {
        let signed_amount = match draft.kind {
            TransactionKind::Income => draft.amount,
            TransactionKind::Expense => -draft.amount,
        };

        let tx = Transaction {
            id: Uuid::now_v7(),
            user_id: draft.user_id,
            name: draft.name,
            description: draft.description,
            amount: signed_amount,
            account_id: draft.account_id,
            category_id: draft.category_id,
            budget_id: (!draft.budget_id.is_empty()).then_some(draft.budget_id),
            created_at: now,
            updated_at: now,
        };

        transactions::ActiveModel::from(&tx)
            .insert(&self.database)
            .await?;
        Ok(tx.id)
    }
}
