//! Cluster restore and instance creation.
//!
//! Restoring a cluster from a snapshot does not create any instances,
//! so data is unreachable until one is added; both operations live
//! here, each followed by an availability wait. Creation requests whose
//! target already exists are treated as success: staging identifiers
//! are derived from the run date, so a re-run on the same day finds its
//! own half-finished resources.

use std::future::Future;

use tracing::{debug, info, warn};

use restage_core::{
    ControlPlaneError, ControlPlaneResult, CreateInstanceRequest, DatabaseControlPlane,
    DatabaseProfile, Poller, Readiness, RestoreClusterRequest, StagingIdentity, WorkflowResult,
};

/// Instance class for staging instances; one size fits every profile
/// today.
pub const STAGING_INSTANCE_CLASS: &str = "db.r5.large";

/// Terminal status reported by the control plane once a cluster or
/// instance is reachable.
const AVAILABLE: &str = "available";

/// Restores staging clusters and creates their instances.
pub struct ClusterProvisioner<'a, D> {
    db: &'a D,
    poll: Poller,
}

impl<'a, D: DatabaseControlPlane> ClusterProvisioner<'a, D> {
    pub fn new(db: &'a D, poll: Poller) -> Self {
        Self { db, poll }
    }

    /// Restore the staging cluster from a snapshot and wait for it to
    /// become available. Returns whether it did before the poll
    /// ceiling; the caller applies the timeout policy.
    pub async fn restore_cluster(
        &self,
        profile: &DatabaseProfile,
        identity: &StagingIdentity,
        snapshot_id: &str,
    ) -> WorkflowResult<bool> {
        let request = RestoreClusterRequest {
            cluster_id: identity.cluster_id.clone(),
            snapshot_id: snapshot_id.to_string(),
            engine: profile.engine.clone(),
            engine_version: profile.engine_version.clone(),
            subnet_group: profile.subnet_group.clone(),
            security_group_ids: profile.vpc_security_groups.clone(),
        };

        match self.db.restore_cluster_from_snapshot(&request).await {
            Ok(()) => {
                info!(
                    cluster = %identity.cluster_id,
                    snapshot = %snapshot_id,
                    "cluster restore issued"
                );
            }
            Err(ControlPlaneError::AlreadyExists { .. }) => {
                info!(cluster = %identity.cluster_id, "cluster already exists, continuing");
            }
            Err(err) => return Err(err.into()),
        }

        Ok(self
            .wait_available(|| self.db.cluster_status(&identity.cluster_id))
            .await)
    }

    /// Create the instance that makes the restored cluster reachable
    /// and wait for it to become available.
    pub async fn create_instance(
        &self,
        profile: &DatabaseProfile,
        identity: &StagingIdentity,
    ) -> WorkflowResult<bool> {
        let request = CreateInstanceRequest {
            cluster_id: identity.cluster_id.clone(),
            instance_id: identity.instance_id.clone(),
            engine: profile.engine.clone(),
            engine_version: profile.engine_version.clone(),
            instance_class: STAGING_INSTANCE_CLASS.to_string(),
            subnet_group: profile.subnet_group.clone(),
        };

        match self.db.create_instance(&request).await {
            Ok(()) => {
                info!(instance = %identity.instance_id, "instance creation issued");
            }
            Err(ControlPlaneError::AlreadyExists { .. }) => {
                info!(instance = %identity.instance_id, "instance already exists, continuing");
            }
            Err(err) => return Err(err.into()),
        }

        Ok(self
            .wait_available(|| self.db.instance_status(&identity.instance_id))
            .await)
    }

    /// Connection endpoint of the staging cluster, or `None` when the
    /// control plane cannot answer. Absence is logged here and handled
    /// by the caller.
    pub async fn endpoint(&self, cluster_id: &str) -> Option<String> {
        match self.db.cluster_endpoint(cluster_id).await {
            Ok(endpoint) => endpoint,
            Err(err) => {
                warn!(cluster = %cluster_id, error = %err, "failed to read cluster endpoint");
                None
            }
        }
    }

    async fn wait_available<F, Fut>(&self, mut status: F) -> bool
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = ControlPlaneResult<Option<String>>>,
    {
        self.poll
            .wait_until(|| {
                let fut = status();
                async move {
                    match fut.await {
                        Ok(Some(status)) if status == AVAILABLE => Readiness::Ready,
                        Ok(_) => Readiness::NotReady,
                        Err(err) => {
                            debug!(error = %err, "status probe failed");
                            Readiness::TransientError
                        }
                    }
                }
            })
            .await
    }
}
