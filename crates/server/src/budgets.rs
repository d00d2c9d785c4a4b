//! Budget API endpoints

use api_types::budget::{BudgetNew, BudgetUpdate, BudgetView};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::Utc;

use crate::{ServerError, server::ServerState, user};

fn view(budget: engine::Budget) -> BudgetView {
    BudgetView {
        id: budget.id,
        name: budget.name,
        amount: budget.amount,
        created_at: budget.created_at,
        updated_at: budget.updated_at,
    }
}

fn validate(name: &str, amount: f64) -> Result<(), ServerError> {
    if name.is_empty() {
        return Err(ServerError::Generic("name is required".to_string()));
    }
    if !(amount > 0.0) {
        return Err(ServerError::Generic("amount must be positive".to_string()));
    }
    Ok(())
}

pub async fn create(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<BudgetNew>,
) -> Result<(StatusCode, Json<BudgetView>), ServerError> {
    validate(&payload.name, payload.amount)?;

    let budget = state
        .engine
        .new_budget(&user.username, &payload.name, payload.amount, Utc::now())
        .await?;

    Ok((StatusCode::CREATED, Json(view(budget))))
}

pub async fn list(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
) -> Result<Json<Vec<BudgetView>>, ServerError> {
    let budgets = state.engine.budgets_for_user(&user.username).await?;
    Ok(Json(budgets.into_iter().map(view).collect()))
}

pub async fn update(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(payload): Json<BudgetUpdate>,
) -> Result<Json<BudgetView>, ServerError> {
    validate(&payload.name, payload.amount)?;

    let mut budget = state.engine.budget_for_user(&id, &user.username).await?;
    budget.name = payload.name;
    budget.amount = payload.amount;

    let budget = state.engine.update_budget(budget, Utc::now()).await?;
    Ok(Json(view(budget)))
}

pub async fn remove(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ServerError> {
    state.engine.delete_budget(&id, &user.username).await?;
    Ok(StatusCode::NO_CONTENT)
}
