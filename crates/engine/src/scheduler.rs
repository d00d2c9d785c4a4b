//! The scheduler driver.
//!
//! A single background task runs one due-rule pass at startup and then one
//! per period until the shutdown signal is raised. Passes are single-flight
//! and sequential; the period is far longer than a pass, so overlap is not
//! modelled. Each pass runs under a timeout so a hung store cannot block the
//! loop forever.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;

use crate::{Engine, Notifier, TransactionPoster};

#[derive(Clone, Copy, Debug)]
pub struct SchedulerConfig {
    /// Time between passes. One hour in the reference policy.
    pub period: Duration,
    /// Upper bound on a single pass.
    pub tick_timeout: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            period: Duration::from_secs(60 * 60),
            tick_timeout: Duration::from_secs(10 * 60),
        }
    }
}

/// Drives due-rule passes until `shutdown` flips to `true`.
///
/// The first tick fires immediately. Cancellation is prompt in the sense
/// that no further tick is scheduled; an in-flight pass still completes to
/// its natural end (or its timeout).
pub async fn run<P, N>(
    engine: Arc<Engine>,
    poster: P,
    notifier: N,
    config: SchedulerConfig,
    mut shutdown: watch::Receiver<bool>,
) where
    P: TransactionPoster + Send + Sync,
    N: Notifier + Send + Sync,
{
    let mut ticker = tokio::time::interval(config.period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                tick(&engine, &poster, &notifier, config.tick_timeout).await;
            }
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    tracing::info!("scheduler shutting down");
                    return;
                }
            }
        }
    }
}

async fn tick<P, N>(engine: &Engine, poster: &P, notifier: &N, tick_timeout: Duration)
where
    P: TransactionPoster + Sync,
    N: Notifier + Sync,
{
    let pass = engine.process_due_transactions(poster, notifier, Utc::now());
    match tokio::time::timeout(tick_timeout, pass).await {
        Ok(Ok(summary)) if summary.due > 0 => {
            tracing::info!(
                due = summary.due,
                posted = summary.posted,
                failed = summary.failed,
                "processed due recurring rules"
            );
        }
        Ok(Ok(_)) => {
            tracing::debug!("no recurring rules due");
        }
        Ok(Err(err)) => {
            tracing::error!("due-rule pass failed: {err}");
        }
        Err(_) => {
            tracing::error!("due-rule pass timed out after {tick_timeout:?}");
        }
    }
}
