use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Direction of a money movement as seen on the wire.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Income,
    Expense,
}

pub mod account {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct AccountNew {
        pub name: String,
        #[serde(default)]
        pub description: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct AccountUpdate {
        pub name: String,
        #[serde(default)]
        pub description: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct AccountView {
        pub id: Uuid,
        pub name: String,
        pub description: String,
        pub created_at: DateTime<Utc>,
        pub updated_at: DateTime<Utc>,
    }
}

pub mod category {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CategoryNew {
        pub name: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CategoryUpdate {
        pub name: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CategoryView {
        pub id: Uuid,
        pub name: String,
        pub created_at: DateTime<Utc>,
        pub updated_at: DateTime<Utc>,
    }
}

pub mod budget {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BudgetNew {
        pub name: String,
        /// Monthly cap, must be positive.
        pub amount: f64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BudgetUpdate {
        pub name: String,
        pub amount: f64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BudgetView {
        pub id: Uuid,
        pub name: String,
        pub amount: f64,
        pub created_at: DateTime<Utc>,
        pub updated_at: DateTime<Utc>,
    }
}

pub mod transaction {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionNew {
        pub name: String,
        #[serde(default)]
        pub description: String,
        /// Positive magnitude; the sign is derived from `kind`.
        pub amount: f64,
        pub kind: TransactionKind,
        pub account_id: String,
        pub category_id: String,
        pub budget_id: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionView {
        pub id: Uuid,
        pub name: String,
        pub description: String,
        /// Signed amount: expenses are negative.
        pub amount: f64,
        pub account_id: String,
        pub category_id: String,
        pub budget_id: Option<String>,
        pub created_at: DateTime<Utc>,
        pub updated_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionCreated {
        pub id: Uuid,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct SearchQuery {
        /// Missing parameter deserializes to the empty string so the
        /// handler owns the "q is required" response.
        #[serde(default)]
        pub q: String,
        pub limit: Option<u64>,
    }
}

pub mod recurring {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct RecurringNew {
        pub name: String,
        #[serde(default)]
        pub description: String,
        /// Positive magnitude; the sign is applied at posting time.
        pub amount: f64,
        pub kind: TransactionKind,
        pub account_id: String,
        pub category_id: String,
        pub budget_id: Option<String>,
        /// Day of the month in `[1, 31]`. Days past the end of a shorter
        /// month never match.
        pub day_of_month: u32,
    }

    /// Full field replace; execution state is not settable from the API.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct RecurringUpdate {
        pub name: String,
        #[serde(default)]
        pub description: String,
        pub amount: f64,
        pub kind: TransactionKind,
        pub account_id: String,
        pub category_id: String,
        pub budget_id: Option<String>,
        pub day_of_month: u32,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct RecurringView {
        pub id: Uuid,
        pub name: String,
        pub description: String,
        pub amount: f64,
        pub kind: TransactionKind,
        pub account_id: String,
        pub category_id: String,
        pub budget_id: Option<String>,
        pub day_of_month: u32,
        pub last_execution: Option<DateTime<Utc>>,
        pub created_at: DateTime<Utc>,
        pub updated_at: DateTime<Utc>,
    }

    /// Counts from a manual processing pass. Per-rule failures are visible
    /// only in the counts (and the server logs), never as an HTTP error.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct ProcessReport {
        pub due: usize,
        pub posted: usize,
        pub failed: usize,
    }
}

pub mod notification {
    use super::*;

    /// Payload delivered on the SSE stream.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct NotificationView {
        #[serde(rename = "type")]
        pub kind: String,
        pub message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub amount: Option<f64>,
    }
}
