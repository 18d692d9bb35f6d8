//! The append-only `agent_run_logs` history.

use shelfwise_core::{EntityId, RunLog};

use crate::collections::RUN_LOGS;
use crate::store::{DocumentStore, Filter, FindOptions};
use crate::DbError;

/// Append one run log entry. Entries are never updated.
///
/// # Errors
///
/// Returns [`DbError`] if serialization or the insert fails.
pub async fn append_run_log(store: &dyn DocumentStore, log: &RunLog) -> Result<EntityId, DbError> {
    store.insert(RUN_LOGS, serde_json::to_value(log)?).await
}

/// The most recent `limit` run logs, newest first.
///
/// # Errors
///
/// Returns [`DbError`] if the lookup fails or a document is malformed.
pub async fn list_run_logs(store: &dyn DocumentStore, limit: usize) -> Result<Vec<RunLog>, DbError> {
    store
        .find(
            RUN_LOGS,
            &Filter::new(),
            &FindOptions::newest_first("ranAt").limit(limit),
        )
        .await?
        .into_iter()
        .map(|doc| serde_json::from_value(doc).map_err(DbError::from))
        .collect()
}
