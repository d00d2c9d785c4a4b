//! Account API endpoints

use api_types::account::{AccountNew, AccountUpdate, AccountView};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::Utc;

use crate::{ServerError, server::ServerState, user};

fn view(account: engine::Account) -> AccountView {
    AccountView {
        id: account.id,
        name: account.name,
        description: account.description,
        created_at: account.created_at,
        updated_at: account.updated_at,
    }
}

pub async fn create(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<AccountNew>,
) -> Result<(StatusCode, Json<AccountView>), ServerError> {
    if payload.name.is_empty() {
        return Err(ServerError::Generic("name is required".to_string()));
    }

    let account = state
        .engine
        .new_account(&user.username, &payload.name, &payload.description, Utc::now())
        .await?;

    Ok((StatusCode::CREATED, Json(view(account))))
}

pub async fn list(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
) -> Result<Json<Vec<AccountView>>, ServerError> {
    let accounts = state.engine.accounts_for_user(&user.username).await?;
    Ok(Json(accounts.into_iter().map(view).collect()))
}

pub async fn update(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(payload): Json<AccountUpdate>,
) -> Result<Json<AccountView>, ServerError> {
    if payload.name.is_empty() {
        return Err(ServerError::Generic("name is required".to_string()));
    }

    let mut account = state.engine.account_for_user(&id, &user.username).await?;
    account.name = payload.name;
    account.description = payload.description;

    let account = state.engine.update_account(account, Utc::now()).await?;
    Ok(Json(view(account)))
}

pub async fn remove(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ServerError> {
    state.engine.delete_account(&id, &user.username).await?;
    Ok(StatusCode::NO_CONTENT)
}
