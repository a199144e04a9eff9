//! RDS-backed database control plane.

use aws_config::SdkConfig;
use aws_sdk_rds::Client;
use aws_sdk_rds::types::DbCluster;
use chrono::DateTime;

use restage_core::{
    ClusterSummary, ControlPlaneResult, CreateInstanceRequest, DatabaseControlPlane,
    RestoreClusterRequest, SnapshotSummary,
};

use crate::util::{api_error, creation_error};

/// Database cluster and instance lifecycle over AWS RDS.
#[derive(Debug, Clone)]
pub struct RdsControlPlane {
    client: Client,
}

impl RdsControlPlane {
    pub fn new(config: &SdkConfig) -> Self {
        Self {
            client: Client::new(config),
        }
    }
}

fn cluster_summary(cluster: &DbCluster) -> ClusterSummary {
    ClusterSummary {
        id: cluster.db_cluster_identifier().map(str::to_string),
        status: cluster.status().map(str::to_string),
        endpoint: cluster.endpoint().map(str::to_string),
    }
}

impl DatabaseControlPlane for RdsControlPlane {
    async fn list_clusters(&self) -> ControlPlaneResult<Vec<ClusterSummary>> {
        let response = self
            .client
            .describe_db_clusters()
            .send()
            .await
            .map_err(api_error)?;
        Ok(response.db_clusters().iter().map(cluster_summary).collect())
    }

    async fn list_automated_snapshots(
        &self,
        cluster_id: &str,
    ) -> ControlPlaneResult<Vec<SnapshotSummary>> {
        let response = self
            .client
            .describe_db_cluster_snapshots()
            .db_cluster_identifier(cluster_id)
            .snapshot_type("automated")
            .send()
            .await
            .map_err(api_error)?;

        let mut snapshots = Vec::new();
        for snapshot in response.db_cluster_snapshots() {
            // Entries without an identifier or creation time cannot be
            // restore sources; skip them.
            let Some(id) = snapshot.db_cluster_snapshot_identifier() else {
                continue;
            };
            let Some(created) = snapshot.snapshot_create_time() else {
                continue;
            };
            let Some(created_at) = DateTime::from_timestamp(created.secs(), created.subsec_nanos())
            else {
                continue;
            };
            snapshots.push(SnapshotSummary {
                id: id.to_string(),
                created_at,
            });
        }
        Ok(snapshots)
    }

    async fn restore_cluster_from_snapshot(
        &self,
        request: &RestoreClusterRequest,
    ) -> ControlPlaneResult<()> {
        self.client
            .restore_db_cluster_from_snapshot()
            .db_cluster_identifier(&request.cluster_id)
            .snapshot_identifier(&request.snapshot_id)
            .engine(&request.engine)
            .engine_version(&request.engine_version)
            .db_subnet_group_name(&request.subnet_group)
            .set_vpc_security_group_ids(Some(request.security_group_ids.clone()))
            .send()
            .await
            .map(|_| ())
            .map_err(|err| creation_error(&request.cluster_id, err))
    }

    async fn create_instance(&self, request: &CreateInstanceRequest) -> ControlPlaneResult<()> {
        self.client
            .create_db_instance()
            .db_cluster_identifier(&request.cluster_id)
            .db_instance_identifier(&request.instance_id)
            .engine(&request.engine)
            .engine_version(&request.engine_version)
            .db_instance_class(&request.instance_class)
            .db_subnet_group_name(&request.subnet_group)
            .send()
            .await
            .map(|_| ())
            .map_err(|err| creation_error(&request.instance_id, err))
    }

    async fn cluster_status(&self, cluster_id: &str) -> ControlPlaneResult<Option<String>> {
        let response = self
            .client
            .describe_db_clusters()
            .db_cluster_identifier(cluster_id)
            .send()
            .await
            .map_err(api_error)?;
        Ok(response
            .db_clusters()
            .first()
            .and_then(|cluster| cluster.status().map(str::to_string)))
    }

    async fn instance_status(&self, instance_id: &str) -> ControlPlaneResult<Option<String>> {
        let response = self
            .client
            .describe_db_instances()
            .db_instance_identifier(instance_id)
            .send()
            .await
            .map_err(api_error)?;
        Ok(response
            .db_instances()
            .first()
            .and_then(|instance| instance.db_instance_status().map(str::to_string)))
    }

    async fn cluster_endpoint(&self, cluster_id: &str) -> ControlPlaneResult<Option<String>> {
        let response = self
            .client
            .describe_db_clusters()
            .db_cluster_identifier(cluster_id)
            .send()
            .await
            .map_err(api_error)?;
        Ok(response
            .db_clusters()
            .first()
            .and_then(|cluster| cluster.endpoint().map(str::to_string)))
    }
}
