//! Transactions API endpoints

use api_types::transaction::{
    SearchQuery, TransactionCreated, TransactionNew, TransactionView,
};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::Utc;
use engine::{TransactionDraft, TransactionPoster};

use crate::{ServerError, server::ServerState, user};

const DEFAULT_LIMIT: u64 = 50;

pub(crate) fn map_kind(kind: api_types::TransactionKind) -> engine::TransactionKind {
    match kind {
        api_types::TransactionKind::Income => engine::TransactionKind::Income,
        api_types::TransactionKind::Expense => engine::TransactionKind::Expense,
    }
}

fn view(tx: engine::Transaction) -> TransactionView {
    TransactionView {
        id: tx.id,
        name: tx.name,
        description: tx.description,
        amount: tx.amount,
        account_id: tx.account_id,
        category_id: tx.category_id,
        budget_id: tx.budget_id,
        created_at: tx.created_at,
        updated_at: tx.updated_at,
    }
}

pub async fn create(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<TransactionNew>,
) -> Result<(StatusCode, Json<TransactionCreated>), ServerError> {
    if payload.name.is_empty() {
        return Err(ServerError::Generic("name is required".to_string()));
    }
    if !(payload.amount > 0.0) {
        return Err(ServerError::Generic("amount must be positive".to_string()));
    }

    // The posting interface signals "no budget" with an empty string.
    let id = state
        .poster
        .post(
            TransactionDraft {
                name: payload.name,
                description: payload.description,
                amount: payload.amount,
                kind: map_kind(payload.kind),
                account_id: payload.account_id,
                user_id: user.username.clone(),
                category_id: payload.category_id,
                budget_id: payload.budget_id.unwrap_or_default(),
            },
            Utc::now(),
        )
        .await?;

    Ok((StatusCode::CREATED, Json(TransactionCreated { id })))
}

pub async fn list(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
) -> Result<Json<Vec<TransactionView>>, ServerError> {
    let txs = state
        .engine
        .transactions_for_user(&user.username, DEFAULT_LIMIT)
        .await?;
    Ok(Json(txs.into_iter().map(view).collect()))
}

pub async fn search(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<TransactionView>>, ServerError> {
    if query.q.is_empty() {
        return Err(ServerError::Generic("q is required".to_string()));
    }

    let txs = state
        .engine
        .search_transactions(
            &user.username,
            &query.q,
            query.limit.unwrap_or(DEFAULT_LIMIT),
        )
        .await?;
    Ok(Json(txs.into_iter().map(view).collect()))
}

pub async fn remove(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ServerError> {
    state.engine.delete_transaction(&id, &user.username).await?;
    Ok(StatusCode::NO_CONTENT)
}
