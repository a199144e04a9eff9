//! Control-plane trait boundary.
//!
//! The workflow is written against these traits; the AWS facade in
//! `restage-aws` implements them and the workflow tests substitute
//! in-memory fakes. Clients are constructed once at the entry point and
//! passed down; there is no ambient shared client.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::ControlPlaneResult;

/// One cluster as returned by a listing call.
///
/// `id` is optional because the control plane can, in principle, list
/// an entry without an identifier; the resolver treats that as a
/// configuration inconsistency rather than guessing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterSummary {
    pub id: Option<String>,
    pub status: Option<String>,
    pub endpoint: Option<String>,
}

/// One automated snapshot of a cluster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotSummary {
    pub id: String,
    pub created_at: DateTime<Utc>,
}

/// Desired vs running task counts of a service's PRIMARY deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeploymentCounts {
    pub desired: i32,
    pub running: i32,
}

impl DeploymentCounts {
    /// A rollout is stable once every desired task is running.
    pub fn is_stable(&self) -> bool {
        self.desired == self.running
    }
}

/// Parameters for restoring a staging cluster from a snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestoreClusterRequest {
    pub cluster_id: String,
    pub snapshot_id: String,
    pub engine: String,
    pub engine_version: String,
    pub subnet_group: String,
    pub security_group_ids: Vec<String>,
}

/// Parameters for creating the reachable instance inside a restored
/// cluster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateInstanceRequest {
    pub cluster_id: String,
    pub instance_id: String,
    pub engine: String,
    pub engine_version: String,
    pub instance_class: String,
    pub subnet_group: String,
}

// ── Task definitions ───────────────────────────────────────────────

/// A deployable service revision.
///
/// Typed fields cover everything the workflow re-registers; the
/// flattened `extra` map carries whatever else the control plane
/// returned — notably the provider-assigned metadata (`revision`,
/// `taskDefinitionArn`, `registeredAt`, ...) that must be stripped
/// before the document can be submitted as a new revision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDefinition {
    pub family: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_role_arn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_role_arn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network_mode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpu: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub requires_compatibilities: Vec<String>,
    #[serde(default)]
    pub container_definitions: Vec<ContainerDefinition>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// One container within a task definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerDefinition {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub essential: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpu: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory_reservation: Option<i32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub port_mappings: Vec<PortMapping>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub environment: Vec<EnvironmentVariable>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub secrets: Vec<SecretReference>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub command: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub entry_point: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_configuration: Option<LogConfiguration>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// A plain-text environment variable entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentVariable {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortMapping {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container_port: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host_port: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
}

/// A secret injected from a secret store rather than plain text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecretReference {
    pub name: String,
    pub value_from: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogConfiguration {
    pub log_driver: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub options: BTreeMap<String, String>,
}

// ── Traits ─────────────────────────────────────────────────────────

/// Lifecycle operations on database clusters, instances, and their
/// snapshots.
#[allow(async_fn_in_trait)]
pub trait DatabaseControlPlane {
    async fn list_clusters(&self) -> ControlPlaneResult<Vec<ClusterSummary>>;

    /// Automated (system-generated) snapshots of one cluster.
    async fn list_automated_snapshots(
        &self,
        cluster_id: &str,
    ) -> ControlPlaneResult<Vec<SnapshotSummary>>;

    async fn restore_cluster_from_snapshot(
        &self,
        request: &RestoreClusterRequest,
    ) -> ControlPlaneResult<()>;

    async fn create_instance(&self, request: &CreateInstanceRequest) -> ControlPlaneResult<()>;

    async fn cluster_status(&self, cluster_id: &str) -> ControlPlaneResult<Option<String>>;

    async fn instance_status(&self, instance_id: &str) -> ControlPlaneResult<Option<String>>;

    async fn cluster_endpoint(&self, cluster_id: &str) -> ControlPlaneResult<Option<String>>;
}

/// Lifecycle operations on orchestrated services and their task
/// definitions.
#[allow(async_fn_in_trait)]
pub trait ServiceControlPlane {
    /// Name (family:revision or ARN) of the task definition the
    /// service currently deploys.
    async fn current_task_definition(
        &self,
        cluster: &str,
        service: &str,
    ) -> ControlPlaneResult<String>;

    async fn describe_task_definition(&self, name: &str) -> ControlPlaneResult<TaskDefinition>;

    /// Register a new revision; returns its ARN.
    async fn register_task_definition(
        &self,
        definition: &TaskDefinition,
    ) -> ControlPlaneResult<String>;

    async fn update_service(
        &self,
        cluster: &str,
        service: &str,
        task_definition_arn: &str,
    ) -> ControlPlaneResult<()>;

    /// Counts of the PRIMARY deployment, or `None` if there is none.
    async fn primary_deployment(
        &self,
        cluster: &str,
        service: &str,
    ) -> ControlPlaneResult<Option<DeploymentCounts>>;
}
