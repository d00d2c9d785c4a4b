//! Category API endpoints

use api_types::category::{CategoryNew, CategoryUpdate, CategoryView};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::Utc;

use crate::{ServerError, server::ServerState, user};

fn view(category: engine::Category) -> CategoryView {
    CategoryView {
        id: category.id,
        name: category.name,
        created_at: category.created_at,
        updated_at: category.updated_at,
    }
}

pub async fn create(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<CategoryNew>,
) -> Result<(StatusCode, Json<CategoryView>), ServerError> {
    if payload.name.is_empty() {
        return Err(ServerError::Generic("name is required".to_string()));
    }

    let category = state
        .engine
        .new_category(&user.username, &payload.name, Utc::now())
        .await?;

    Ok((StatusCode::CREATED, Json(view(category))))
}

pub async fn list(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
) -> Result<Json<Vec<CategoryView>>, ServerError> {
    let categories = state.engine.categories_for_user(&user.username).await?;
    Ok(Json(categories.into_iter().map(view).collect()))
}

pub async fn update(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(payload): Json<CategoryUpdate>,
) -> Result<Json<CategoryView>, ServerError> {
    if payload.name.is_empty() {
        return Err(ServerError::Generic("name is required".to_string()));
    }

    let mut category = state.engine.category_for_user(&id, &user.username).await?;
    category.name = payload.name;

    let category = state.engine.update_category(category, Utc::now()).await?;
    Ok(Json(view(category)))
}

pub async fn remove(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ServerError> {
    state.engine.delete_category(&id, &user.username).await?;
    Ok(StatusCode::NO_CONTENT)
}
