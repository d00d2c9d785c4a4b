use std::sync::Arc;
use std::time::Duration;

use chrono::{Datelike, Utc};
use sea_orm::{ConnectionTrait, Database, Statement};
use tokio::sync::watch;

use engine::scheduler::{self, SchedulerConfig};
use engine::{ChannelNotifier, Engine, LedgerPoster, RecurringRule, TransactionKind};
use migration::MigratorTrait;

#[tokio::test]
async fn startup_pass_posts_due_rules_and_shutdown_stops_the_loop() {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let backend = db.get_database_backend();
    db.execute(Statement::from_sql_and_values(
        backend,
        "INSERT INTO users (username, password) VALUES (?, ?)",
        vec!["alice".into(), "password".into()],
    ))
    .await
    .unwrap();

    let engine = Engine::builder().database(db.clone()).build();
    let account = engine
        .new_account("alice", "Checking", "", Utc::now())
        .await
        .unwrap();
    let category = engine
        .new_category("alice", "Bills", Utc::now())
        .await
        .unwrap();
    engine
        .create_rule(RecurringRule::new(
            "alice".to_string(),
            "Rent".to_string(),
            String::new(),
            50.0,
            TransactionKind::Expense,
            account.id.to_string(),
            category.id.to_string(),
            None,
            Utc::now().day(),
            Utc::now(),
        ))
        .await
        .unwrap();

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let config = SchedulerConfig {
        period: Duration::from_secs(3600),
        tick_timeout: Duration::from_secs(30),
    };
    let task = tokio::spawn(scheduler::run(
        Arc::new(engine.clone()),
        LedgerPoster::new(db),
        ChannelNotifier::new(),
        config,
        shutdown_rx,
    ));

    // The first tick fires immediately; poll until its effect is visible.
    let mut posted = false;
    for _ in 0..50 {
        if !engine
            .transactions_for_user("alice", 10)
            .await
            .unwrap()
            .is_empty()
        {
            posted = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert!(posted, "startup pass did not post the due rule");

    shutdown_tx.send(true).unwrap();
    tokio::time::timeout(Duration::from_secs(5), task)
        .await
        .expect("scheduler did not stop after shutdown signal")
        .unwrap();
}
