//! restage-core — shared types for the restage workflow.
//!
//! This crate holds everything the workflow, the AWS facade, and the
//! CLI agree on:
//!
//! - **`config`** — `restage.toml` model and loader
//! - **`identity`** — staging cluster/instance identifier derivation
//! - **`poll`** — bounded sleep-then-check polling
//! - **`control`** — control-plane trait boundary and model types
//! - **`notify`** — best-effort notification trait
//! - **`error`** — error taxonomy shared across the workspace

pub mod config;
pub mod control;
pub mod error;
pub mod identity;
pub mod notify;
pub mod poll;

pub use config::{DatabaseProfile, RestageConfig, WorkflowSettings};
pub use control::{
    ClusterSummary, ContainerDefinition, CreateInstanceRequest, DatabaseControlPlane,
    DeploymentCounts, EnvironmentVariable, LogConfiguration, PortMapping, RestoreClusterRequest,
    SecretReference, ServiceControlPlane, SnapshotSummary, TaskDefinition,
};
pub use error::{ControlPlaneError, ControlPlaneResult, WorkflowError, WorkflowResult};
pub use identity::StagingIdentity;
pub use notify::{Notifier, NullNotifier};
pub use poll::{Poller, Readiness};
