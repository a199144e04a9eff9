//! In-memory control-plane fakes shared by the workflow tests.
#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use chrono::{DateTime, TimeZone, Utc};
use serde_json::json;

use restage_core::{
    ClusterSummary, ControlPlaneError, ControlPlaneResult, CreateInstanceRequest,
    DatabaseControlPlane, DeploymentCounts, Notifier, RestoreClusterRequest,
    ServiceControlPlane, SnapshotSummary, TaskDefinition,
};

pub fn utc(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
}

pub fn cluster(id: &str) -> ClusterSummary {
    ClusterSummary {
        id: Some(id.to_string()),
        status: Some("available".to_string()),
        endpoint: None,
    }
}

pub fn snapshot(id: &str, created_at: DateTime<Utc>) -> SnapshotSummary {
    SnapshotSummary {
        id: id.to_string(),
        created_at,
    }
}

/// A task definition as describe would return it: registrable fields
/// plus provider-assigned metadata.
pub fn sample_definition(family: &str) -> TaskDefinition {
    serde_json::from_value(json!({
        "family": family,
        "cpu": "256",
        "containerDefinitions": [{
            "name": "app",
            "image": format!("{family}:latest"),
            "essential": true,
            "environment": [
                {"name": "DB_HOST", "value": "orders-prod.cluster.example.com"},
                {"name": "LOG_LEVEL", "value": "info"}
            ]
        }],
        "status": "ACTIVE",
        "taskDefinitionArn": format!("arn:aws:ecs:task-definition/{family}:7"),
        "registeredAt": "2024-03-01T00:00:00Z",
        "revision": 7
    }))
    .unwrap()
}

// ── Database control plane ─────────────────────────────────────────

pub struct FakeDatabase {
    pub clusters: Vec<ClusterSummary>,
    pub snapshots: Vec<SnapshotSummary>,
    pub restore_already_exists: bool,
    pub create_already_exists: bool,
    pub endpoint: Option<String>,
    pub endpoint_error: bool,
    pub cluster_statuses: Mutex<VecDeque<String>>,
    pub instance_statuses: Mutex<VecDeque<String>>,
    pub final_cluster_status: String,
    pub final_instance_status: String,
    pub calls: Mutex<Vec<String>>,
}

impl FakeDatabase {
    pub fn new() -> Self {
        Self {
            clusters: Vec::new(),
            snapshots: Vec::new(),
            restore_already_exists: false,
            create_already_exists: false,
            endpoint: None,
            endpoint_error: false,
            cluster_statuses: Mutex::new(VecDeque::new()),
            instance_statuses: Mutex::new(VecDeque::new()),
            final_cluster_status: "available".to_string(),
            final_instance_status: "available".to_string(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_cluster(mut self, id: &str) -> Self {
        self.clusters.push(cluster(id));
        self
    }

    pub fn with_cluster_summary(mut self, summary: ClusterSummary) -> Self {
        self.clusters.push(summary);
        self
    }

    pub fn with_snapshot(mut self, id: &str, created_at: DateTime<Utc>) -> Self {
        self.snapshots.push(snapshot(id, created_at));
        self
    }

    pub fn with_endpoint(mut self, endpoint: &str) -> Self {
        self.endpoint = Some(endpoint.to_string());
        self
    }

    /// Statuses never reach "available", so every wait exhausts its
    /// ceiling.
    pub fn never_available(mut self) -> Self {
        self.final_cluster_status = "creating".to_string();
        self.final_instance_status = "creating".to_string();
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

impl DatabaseControlPlane for FakeDatabase {
    async fn list_clusters(&self) -> ControlPlaneResult<Vec<ClusterSummary>> {
        self.record("list_clusters".to_string());
        Ok(self.clusters.clone())
    }

    async fn list_automated_snapshots(
        &self,
        cluster_id: &str,
    ) -> ControlPlaneResult<Vec<SnapshotSummary>> {
        self.record(format!("list_automated_snapshots {cluster_id}"));
        Ok(self.snapshots.clone())
    }

    async fn restore_cluster_from_snapshot(
        &self,
        request: &RestoreClusterRequest,
    ) -> ControlPlaneResult<()> {
        self.record(format!(
            "restore {} from {}",
            request.cluster_id, request.snapshot_id
        ));
        if self.restore_already_exists {
            return Err(ControlPlaneError::AlreadyExists {
                resource: request.cluster_id.clone(),
            });
        }
        Ok(())
    }

    async fn create_instance(&self, request: &CreateInstanceRequest) -> ControlPlaneResult<()> {
        self.record(format!("create_instance {}", request.instance_id));
        if self.create_already_exists {
            return Err(ControlPlaneError::AlreadyExists {
                resource: request.instance_id.clone(),
            });
        }
        Ok(())
    }

    async fn cluster_status(&self, cluster_id: &str) -> ControlPlaneResult<Option<String>> {
        self.record(format!("cluster_status {cluster_id}"));
        let next = self
            .cluster_statuses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.final_cluster_status.clone());
        Ok(Some(next))
    }

    async fn instance_status(&self, instance_id: &str) -> ControlPlaneResult<Option<String>> {
        self.record(format!("instance_status {instance_id}"));
        let next = self
            .instance_statuses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.final_instance_status.clone());
        Ok(Some(next))
    }

    async fn cluster_endpoint(&self, cluster_id: &str) -> ControlPlaneResult<Option<String>> {
        self.record(format!("cluster_endpoint {cluster_id}"));
        if self.endpoint_error {
            return Err(ControlPlaneError::Api("describe failed".to_string()));
        }
        Ok(self.endpoint.clone())
    }
}

// ── Service control plane ──────────────────────────────────────────

pub struct FakeServices {
    pub current: HashMap<String, String>,
    pub definitions: HashMap<String, TaskDefinition>,
    pub registered: Mutex<Vec<TaskDefinition>>,
    pub updated: Mutex<Vec<(String, String, String)>>,
    pub rollout_counts: Mutex<VecDeque<Option<DeploymentCounts>>>,
    pub never_stable: bool,
    pub calls: Mutex<Vec<String>>,
}

impl FakeServices {
    pub fn new() -> Self {
        Self {
            current: HashMap::new(),
            definitions: HashMap::new(),
            registered: Mutex::new(Vec::new()),
            updated: Mutex::new(Vec::new()),
            rollout_counts: Mutex::new(VecDeque::new()),
            never_stable: false,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Register a deployed service with the given task definition.
    pub fn with_service(mut self, cluster: &str, service: &str, definition: TaskDefinition) -> Self {
        let name = format!("{}:7", definition.family);
        self.current
            .insert(format!("{cluster}/{service}"), name.clone());
        self.definitions.insert(name, definition);
        self
    }

    /// Rollouts never stabilize, so every wait exhausts its ceiling.
    pub fn never_stable(mut self) -> Self {
        self.never_stable = true;
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn registered(&self) -> Vec<TaskDefinition> {
        self.registered.lock().unwrap().clone()
    }

    pub fn updated(&self) -> Vec<(String, String, String)> {
        self.updated.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

impl ServiceControlPlane for FakeServices {
    async fn current_task_definition(
        &self,
        cluster: &str,
        service: &str,
    ) -> ControlPlaneResult<String> {
        self.record(format!("current_task_definition {cluster}/{service}"));
        self.current
            .get(&format!("{cluster}/{service}"))
            .cloned()
            .ok_or_else(|| ControlPlaneError::Api(format!("service {service} not found")))
    }

    async fn describe_task_definition(&self, name: &str) -> ControlPlaneResult<TaskDefinition> {
        self.record(format!("describe_task_definition {name}"));
        self.definitions
            .get(name)
            .cloned()
            .ok_or_else(|| ControlPlaneError::Api(format!("task definition {name} not found")))
    }

    async fn register_task_definition(
        &self,
        definition: &TaskDefinition,
    ) -> ControlPlaneResult<String> {
        self.record(format!("register_task_definition {}", definition.family));
        let mut registered = self.registered.lock().unwrap();
        registered.push(definition.clone());
        Ok(format!(
            "arn:aws:ecs:task-definition/{}:{}",
            definition.family,
            registered.len() + 100
        ))
    }

    async fn update_service(
        &self,
        cluster: &str,
        service: &str,
        task_definition_arn: &str,
    ) -> ControlPlaneResult<()> {
        self.record(format!("update_service {cluster}/{service}"));
        self.updated.lock().unwrap().push((
            cluster.to_string(),
            service.to_string(),
            task_definition_arn.to_string(),
        ));
        Ok(())
    }

    async fn primary_deployment(
        &self,
        cluster: &str,
        service: &str,
    ) -> ControlPlaneResult<Option<DeploymentCounts>> {
        self.record(format!("primary_deployment {cluster}/{service}"));
        if self.never_stable {
            return Ok(Some(DeploymentCounts {
                desired: 2,
                running: 1,
            }));
        }
        if let Some(front) = self.rollout_counts.lock().unwrap().pop_front() {
            return Ok(front);
        }
        Ok(Some(DeploymentCounts {
            desired: 2,
            running: 2,
        }))
    }
}

// ── Notifier ───────────────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingNotifier {
    pub messages: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    async fn notify(&self, text: &str) {
        self.messages.lock().unwrap().push(text.to_string());
    }
}
