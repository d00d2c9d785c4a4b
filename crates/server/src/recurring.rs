//! Recurring-rule API endpoints
//!
//! The day-of-month range check lives here: the engine trusts the boundary
//! to only hand it values in `[1, 31]`.

use api_types::recurring::{ProcessReport, RecurringNew, RecurringUpdate, RecurringView};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::Utc;
use engine::RecurringRule;

use crate::{ServerError, server::ServerState, transactions::map_kind, user};

fn map_kind_back(kind: engine::TransactionKind) -> api_types::TransactionKind {
    match kind {
        engine::TransactionKind::Income => api_types::TransactionKind::Income,
        engine::TransactionKind::Expense => api_types::TransactionKind::Expense,
    }
}

fn view(rule: RecurringRule) -> RecurringView {
    RecurringView {
        id: rule.id,
        name: rule.name,
        description: rule.description,
        amount: rule.amount,
        kind: map_kind_back(rule.kind),
        account_id: rule.account_id,
        category_id: rule.category_id,
        budget_id: rule.budget_id,
        day_of_month: rule.day_of_month,
        last_execution: rule.last_execution,
        created_at: rule.created_at,
        updated_at: rule.updated_at,
    }
}

fn validate(name: &str, amount: f64, day_of_month: u32) -> Result<(), ServerError> {
    if name.is_empty() {
        return Err(ServerError::Generic("name is required".to_string()));
    }
    if !(amount > 0.0) {
        return Err(ServerError::Generic("amount must be positive".to_string()));
    }
    if !(1..=31).contains(&day_of_month) {
        return Err(ServerError::Generic(
            "day_of_month must be between 1 and 31".to_string(),
        ));
    }
    Ok(())
}

pub async fn create(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<RecurringNew>,
) -> Result<(StatusCode, Json<RecurringView>), ServerError> {
    validate(&payload.name, payload.amount, payload.day_of_month)?;

    let rule = RecurringRule::new(
        user.username.clone(),
        payload.name,
        payload.description,
        payload.amount,
        map_kind(payload.kind),
        payload.account_id,
        payload.category_id,
        payload.budget_id,
        payload.day_of_month,
        Utc::now(),
    );
    let rule = state.engine.create_rule(rule).await?;

    Ok((StatusCode::CREATED, Json(view(rule))))
}

pub async fn list(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
) -> Result<Json<Vec<RecurringView>>, ServerError> {
    let rules = state.engine.rules_for_user(&user.username).await?;
    Ok(Json(rules.into_iter().map(view).collect()))
}

pub async fn update(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(payload): Json<RecurringUpdate>,
) -> Result<Json<RecurringView>, ServerError> {
    validate(&payload.name, payload.amount, payload.day_of_month)?;

    // Ownership check: the rule must belong to the caller. The engine's
    // update itself is a plain replace keyed by id.
    let mut rule = state.engine.rule_for_user(&id, &user.username).await?;
    rule.name = payload.name;
    rule.description = payload.description;
    rule.amount = payload.amount;
    rule.kind = map_kind(payload.kind);
    rule.account_id = payload.account_id;
    rule.category_id = payload.category_id;
    rule.budget_id = payload.budget_id;
    rule.day_of_month = payload.day_of_month;

    let rule = state.engine.update_rule(rule, Utc::now()).await?;
    Ok(Json(view(rule)))
}

pub async fn remove(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ServerError> {
    state.engine.delete_rule(&id, &user.username).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Manually triggers a synchronous due-rule pass.
///
/// Only a failure of the due-set query surfaces as an error; per-rule
/// failures show up in the counts and the logs.
pub async fn process(
    Extension(_user): Extension<user::Model>,
    State(state): State<ServerState>,
) -> Result<Json<ProcessReport>, ServerError> {
    let summary = state
        .engine
        .process_due_transactions(&state.poster, &state.notifier, Utc::now())
        .await?;

    Ok(Json(ProcessReport {
        due: summary.due,
        posted: summary.posted,
        failed: summary.failed,
    }))
}
