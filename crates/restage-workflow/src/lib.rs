//! restage-workflow — the clone-to-staging pipeline.
//!
//! One run clones a production database into staging:
//! resolve the production cluster and its latest automated snapshot,
//! restore a staging cluster from it, create a reachable instance,
//! then repoint every dependent service at the new endpoint.
//!
//! # Components
//!
//! - **`snapshot`** — production cluster and latest-snapshot resolution
//! - **`provision`** — cluster restore + instance creation with
//!   availability polling
//! - **`repoint`** — task-definition mutation and service rollout
//! - **`orchestrator`** — the sequential pipeline and its
//!   failure/idempotency contract

pub mod orchestrator;
pub mod provision;
pub mod repoint;
pub mod snapshot;

pub use orchestrator::{RunReport, Workflow, WorkflowOptions};
pub use provision::{ClusterProvisioner, STAGING_INSTANCE_CLASS};
pub use repoint::{ServiceRepointer, repoint_task_definition};
pub use snapshot::{resolve_latest_snapshot, resolve_production_cluster};
