//! Retention sweeper - bounds storage by purging stale resolved requests.

use crate::{
    core::store::{Collection, Store},
    entities::{Request, RequestStatus, request},
    errors::Result,
};
use chrono::{DateTime, Duration, Utc};
use sea_orm::prelude::*;
use tokio::task::JoinHandle;
use tracing::{error, info, instrument};

/// Deletes approved and rejected requests created more than `horizon_days` ago.
///
/// Pending requests are never touched. Running it again is a no-op.
///
/// # Errors
/// Returns an error if the delete fails.
pub async fn sweep(store: &Store, horizon_days: i64) -> Result<u64> {
    sweep_before(store, Utc::now() - Duration::days(horizon_days)).await
}

/// Deletes approved and rejected requests created strictly before `cutoff`.
#[instrument(skip(store))]
pub async fn sweep_before(store: &Store, cutoff: DateTime<Utc>) -> Result<u64> {
    let deleted = Request::delete_many()
        .filter(request::Column::Status.ne(RequestStatus::Pending))
        .filter(request::Column::CreatedAt.lt(cutoff))
        .exec(store.db())
        .await?
        .rows_affected;

    if deleted > 0 {
        store.notify(Collection::Requests);
        info!(deleted, %cutoff, "Purged resolved requests");
    }
    Ok(deleted)
}

/// Sweeps once immediately and then every `every`, until the task is aborted.
/// Failures are logged and retried on the next tick.
pub fn spawn_retention_task(
    store: Store,
    horizon_days: i64,
    every: std::time::Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        loop {
            ticker.tick().await;
            if let Err(e) = sweep(&store, horizon_days).await {
                error!(error = %e, "Retention sweep failed");
            }
        }
    })
}
