use axum::{
    Router,
    extract::{Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::Response,
    routing::{delete, get, post, put},
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Basic},
};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};

use std::sync::Arc;

use crate::{accounts, budgets, categories, events, recurring, transactions, user};
use engine::{ChannelNotifier, Engine, LedgerPoster};

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
    pub db: DatabaseConnection,
    pub poster: LedgerPoster,
    pub notifier: ChannelNotifier,
}

impl ServerState {
    pub fn new(engine: Engine, db: DatabaseConnection, notifier: ChannelNotifier) -> Self {
        Self {
            engine: Arc::new(engine),
            poster: LedgerPoster::new(db.clone()),
            db,
            notifier,
        }
    }
}

async fn auth(
    auth_header: Option<TypedHeader<Authorization<Basic>>>,
    State(state): State<ServerState>,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let Some(auth_header) = auth_header else {
        return Err(StatusCode::UNAUTHORIZED);
    };
    if auth_header.username().is_empty() || auth_header.password().is_empty() {
        return Err(StatusCode::UNAUTHORIZED);
    }

    let user: Option<user::Model> = user::Entity::find()
        .filter(user::Column::Username.eq(auth_header.username()))
        .filter(user::Column::Password.eq(auth_header.password()))
        .one(&state.db)
        .await
        .map_err(|_| StatusCode::UNAUTHORIZED)?;

    let Some(user) = user else {
        return Err(StatusCode::UNAUTHORIZED);
    };

    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

pub fn router(state: ServerState) -> Router {
    Router::new()
        .route("/accounts", post(accounts::create).get(accounts::list))
        .route("/accounts/{id}", put(accounts::update).delete(accounts::remove))
        .route("/categories", post(categories::create).get(categories::list))
        .route(
            "/categories/{id}",
            put(categories::update).delete(categories::remove),
        )
        .route("/budgets", post(budgets::create).get(budgets::list))
        .route("/budgets/{id}", put(budgets::update).delete(budgets::remove))
        .route(
            "/transactions",
            post(transactions::create).get(transactions::list),
        )
        .route("/transactions/{id}", delete(transactions::remove))
        .route("/search", get(transactions::search))
        .route("/recurring", post(recurring::create).get(recurring::list))
        .route(
            "/recurring/{id}",
            put(recurring::update).delete(recurring::remove),
        )
        .route("/recurring/process", post(recurring::process))
        .route("/events", get(events::stream))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth))
        .with_state(state)
}

pub async fn run_with_listener(
    engine: Engine,
    db: DatabaseConnection,
    notifier: ChannelNotifier,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    let state = ServerState::new(engine, db, notifier);

    axum::serve(listener, router(state)).await
}
