use std::sync::Arc;
use std::time::Duration;

use engine::{ChannelNotifier, LedgerPoster, scheduler};
use migration::{Migrator, MigratorTrait};
use settings::Database;
use tokio::sync::watch;

mod settings;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let settings = settings::Settings::new()?;

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "gruzzolo={level},server={level},engine={level}",
            level = settings.app.level
        ))
        .init();

    let db = parse_database(&settings.server.database).await?;
    let engine = engine::Engine::builder().database(db.clone()).build();
    let notifier = ChannelNotifier::new();

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let mut tasks = tokio::task::JoinSet::new();

    {
        let config = scheduler_config(settings.server.scheduler.as_ref());
        let engine = Arc::new(engine.clone());
        let poster = LedgerPoster::new(db.clone());
        let notifier = notifier.clone();
        tasks.spawn(async move {
            scheduler::run(engine, poster, notifier, config, shutdown_rx).await;
        });
    }

    {
        let bind = settings
            .server
            .bind
            .unwrap_or_else(|| "127.0.0.1".to_string());
        let addr = format!("{}:{}", bind, settings.server.port);
        let listener = tokio::net::TcpListener::bind(addr).await?;
        tasks.spawn(async move {
            if let Err(err) = server::run_with_listener(engine, db, notifier, listener).await {
                tracing::error!("server failed: {err}");
            }
        });
    }

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutting down...");
    let _ = shutdown_tx.send(true);

    tasks.shutdown().await;
    Ok(())
}

fn scheduler_config(settings: Option<&settings::Scheduler>) -> scheduler::SchedulerConfig {
    let mut config = scheduler::SchedulerConfig::default();
    if let Some(settings) = settings {
        if let Some(minutes) = settings.period_minutes {
            config.period = Duration::from_secs(minutes * 60);
        }
        if let Some(minutes) = settings.tick_timeout_minutes {
            config.tick_timeout = Duration::from_secs(minutes * 60);
        }
    }
    config
}

async fn parse_database(
    config: &settings::Database,
) -> Result<sea_orm::DatabaseConnection, Box<dyn std::error::Error + Send + Sync>> {
    let url = match config {
        Database::Memory => String::from("sqlite::memory:"),
        Database::Sqlite(path) => format!("sqlite:{}?mode=rwc", path),
    };

    let database = sea_orm::Database::connect(url).await?;
    Migrator::up(&database, None).await?;
    Ok(database)
}
