use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use http_body_util::BodyExt;
use sea_orm::{ConnectionTrait, Database, Statement};
use serde_json::{Value, json};
use tower::ServiceExt;

use engine::ChannelNotifier;
use migration::MigratorTrait;
use server::{ServerState, router};

async fn test_router() -> Router {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let backend = db.get_database_backend();
    for (username, password) in [("alice", "secret"), ("bob", "hunter2")] {
        db.execute(Statement::from_sql_and_values(
            backend,
            "INSERT INTO users (username, password) VALUES (?, ?)",
            vec![username.into(), password.into()],
        ))
        .await
        .unwrap();
    }

    let engine = engine::Engine::builder().database(db.clone()).build();
    router(ServerState::new(engine, db, ChannelNotifier::new()))
}

fn basic(username: &str, password: &str) -> String {
    format!("Basic {}", BASE64.encode(format!("{username}:{password}")))
}

fn request(method: &str, uri: &str, auth: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(auth) = auth {
        builder = builder.header(header::AUTHORIZATION, auth);
    }
    match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn send(router: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

async fn create_account(router: &Router, auth: &str, name: &str) -> String {
    let (status, body) = send(
        router,
        request(
            "POST",
            "/accounts",
            Some(auth),
            Some(json!({ "name": name })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["id"].as_str().unwrap().to_string()
}

async fn create_category(router: &Router, auth: &str, name: &str) -> String {
    let (status, body) = send(
        router,
        request(
            "POST",
            "/categories",
            Some(auth),
            Some(json!({ "name": name })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn requests_without_credentials_are_unauthorized() {
    let router = test_router().await;

    let (status, _) = send(&router, request("GET", "/accounts", None, None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn wrong_password_is_unauthorized() {
    let router = test_router().await;

    let (status, _) = send(
        &router,
        request("GET", "/accounts", Some(&basic("alice", "wrong")), None),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn account_crud_roundtrip() {
    let router = test_router().await;
    let auth = basic("alice", "secret");

    let id = create_account(&router, &auth, "Checking").await;

    let (status, body) = send(&router, request("GET", "/accounts", Some(&auth), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["name"], "Checking");

    let (status, body) = send(
        &router,
        request(
            "PUT",
            &format!("/accounts/{id}"),
            Some(&auth),
            Some(json!({ "name": "Savings", "description": "rainy day" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Savings");

    let (status, _) = send(
        &router,
        request("DELETE", &format!("/accounts/{id}"), Some(&auth), None),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, body) = send(&router, request("GET", "/accounts", Some(&auth), None)).await;
    assert!(body.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn updating_another_users_account_is_not_found() {
    let router = test_router().await;
    let alice = basic("alice", "secret");
    let bob = basic("bob", "hunter2");

    let id = create_account(&router, &alice, "Checking").await;

    let (status, _) = send(
        &router,
        request(
            "PUT",
            &format!("/accounts/{id}"),
            Some(&bob),
            Some(json!({ "name": "Hijacked" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn budget_amount_must_be_positive() {
    let router = test_router().await;
    let auth = basic("alice", "secret");

    for amount in [0.0, -5.0] {
        let (status, body) = send(
            &router,
            request(
                "POST",
                "/budgets",
                Some(&auth),
                Some(json!({ "name": "Groceries", "amount": amount })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("amount"));
    }
}

#[tokio::test]
async fn transaction_create_applies_the_sign_convention() {
    let router = test_router().await;
    let auth = basic("alice", "secret");
    let account = create_account(&router, &auth, "Checking").await;
    let category = create_category(&router, &auth, "Bills").await;

    let (status, body) = send(
        &router,
        request(
            "POST",
            "/transactions",
            Some(&auth),
            Some(json!({
                "name": "Groceries",
                "amount": 42.5,
                "kind": "expense",
                "account_id": &account,
                "category_id": &category,
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(body["id"].is_string());

    let (status, body) = send(&router, request("GET", "/transactions", Some(&auth), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["amount"], -42.5);
    assert_eq!(body[0]["budget_id"], Value::Null);
}

#[tokio::test]
async fn search_requires_a_query_and_matches_substrings() {
    let router = test_router().await;
    let auth = basic("alice", "secret");
    let account = create_account(&router, &auth, "Checking").await;
    let category = create_category(&router, &auth, "Bills").await;

    for name in ["Coffee beans", "Rent"] {
        send(
            &router,
            request(
                "POST",
                "/transactions",
                Some(&auth),
                Some(json!({
                    "name": name,
                    "amount": 10.0,
                    "kind": "expense",
                    "account_id": &account,
                    "category_id": &category,
                })),
            ),
        )
        .await;
    }

    let (status, _) = send(&router, request("GET", "/search", Some(&auth), None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        &router,
        request("GET", "/search?q=coffee", Some(&auth), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let hits = body.as_array().unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0]["name"], "Coffee beans");
}

#[tokio::test]
async fn recurring_create_validates_day_of_month() {
    let router = test_router().await;
    let auth = basic("alice", "secret");

    for day in [0, 32] {
        let (status, body) = send(
            &router,
            request(
                "POST",
                "/recurring",
                Some(&auth),
                Some(json!({
                    "name": "Rent",
                    "amount": 800.0,
                    "kind": "expense",
                    "account_id": "acc",
                    "category_id": "cat",
                    "day_of_month": day,
                })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("day_of_month"));
    }
}

#[tokio::test]
async fn recurring_lifecycle_and_manual_process() {
    let router = test_router().await;
    let auth = basic("alice", "secret");
    let account = create_account(&router, &auth, "Checking").await;
    let category = create_category(&router, &auth, "Bills").await;

    let today = chrono::Datelike::day(&chrono::Utc::now());
    let (status, body) = send(
        &router,
        request(
            "POST",
            "/recurring",
            Some(&auth),
            Some(json!({
                "name": "Rent",
                "description": "monthly rent",
                "amount": 800.0,
                "kind": "expense",
                "account_id": &account,
                "category_id": &category,
                "day_of_month": today,
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["last_execution"], Value::Null);
    let id = body["id"].as_str().unwrap().to_string();

    // The manual pass posts the rule due today and reports the counts.
    let (status, body) = send(
        &router,
        request("POST", "/recurring/process", Some(&auth), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["due"], 1);
    assert_eq!(body["posted"], 1);
    assert_eq!(body["failed"], 0);

    let (_, body) = send(&router, request("GET", "/transactions", Some(&auth), None)).await;
    assert_eq!(body[0]["amount"], -800.0);

    let (_, body) = send(&router, request("GET", "/recurring", Some(&auth), None)).await;
    assert!(body[0]["last_execution"].is_string());

    // A second pass in the same month is a no-op.
    let (_, body) = send(
        &router,
        request("POST", "/recurring/process", Some(&auth), None),
    )
    .await;
    assert_eq!(body["due"], 0);

    let (status, _) = send(
        &router,
        request("DELETE", &format!("/recurring/{id}"), Some(&auth), None),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    // Deleting again stays a 204.
    let (status, _) = send(
        &router,
        request("DELETE", &format!("/recurring/{id}"), Some(&auth), None),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn recurring_update_replaces_fields_but_not_execution_state() {
    let router = test_router().await;
    let auth = basic("alice", "secret");
    let account = create_account(&router, &auth, "Checking").await;
    let category = create_category(&router, &auth, "Bills").await;

    let (_, body) = send(
        &router,
        request(
            "POST",
            "/recurring",
            Some(&auth),
            Some(json!({
                "name": "Rent",
                "amount": 800.0,
                "kind": "expense",
                "account_id": &account,
                "category_id": &category,
                "day_of_month": 1,
            })),
        ),
    )
    .await;
    let id = body["id"].as_str().unwrap().to_string();

    let (status, body) = send(
        &router,
        request(
            "PUT",
            &format!("/recurring/{id}"),
            Some(&auth),
            Some(json!({
                "name": "Rent (new lease)",
                "amount": 900.0,
                "kind": "expense",
                "account_id": &account,
                "category_id": &category,
                "day_of_month": 2,
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Rent (new lease)");
    assert_eq!(body["amount"], 900.0);
    assert_eq!(body["day_of_month"], 2);
    assert_eq!(body["last_execution"], Value::Null);
}
