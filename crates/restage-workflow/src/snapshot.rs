//! Production cluster and snapshot resolution.
//!
//! Production clusters are matched by name: a cluster belongs to a
//! logical database when its identifier starts with the logical name
//! and does not carry the staging marker. Snapshot selection is
//! monotonic: always the automated snapshot with the greatest
//! creation time.

use tracing::warn;

use restage_core::{DatabaseControlPlane, SnapshotSummary, WorkflowError, WorkflowResult};

/// Substring marking non-production clusters; matching identifiers are
/// never snapshot sources.
const STAGING_MARKER: &str = "staging";

/// Find the production cluster identifier for a logical database name.
///
/// A listed cluster with no identifier aborts the run: the inventory is
/// inconsistent and guessing a snapshot source is worse than stopping.
/// When several clusters match, the lexicographically greatest
/// identifier wins, deterministic regardless of the order the control
/// plane lists them in.
pub async fn resolve_production_cluster<D: DatabaseControlPlane>(
    db: &D,
    logical_name: &str,
) -> WorkflowResult<String> {
    let clusters = db.list_clusters().await?;

    let mut candidates = Vec::new();
    for cluster in clusters {
        let Some(id) = cluster.id else {
            return Err(WorkflowError::MissingClusterIdentifier(
                logical_name.to_string(),
            ));
        };
        if id.starts_with(logical_name) && !id.contains(STAGING_MARKER) {
            candidates.push(id);
        }
    }

    candidates.sort();
    if candidates.len() > 1 {
        warn!(
            logical_name,
            candidates = ?candidates,
            "multiple production clusters match, using the greatest identifier"
        );
    }
    candidates
        .pop()
        .ok_or_else(|| WorkflowError::ProductionClusterNotFound(logical_name.to_string()))
}

/// Find the most recent automated snapshot of a cluster.
///
/// An empty snapshot list ends the run before any restore is issued.
/// Creation-time ties resolve to the last candidate.
pub async fn resolve_latest_snapshot<D: DatabaseControlPlane>(
    db: &D,
    cluster_id: &str,
) -> WorkflowResult<SnapshotSummary> {
    let snapshots = db.list_automated_snapshots(cluster_id).await?;
    snapshots
        .into_iter()
        .max_by_key(|snapshot| snapshot.created_at)
        .ok_or_else(|| WorkflowError::NoSnapshots(cluster_id.to_string()))
}
