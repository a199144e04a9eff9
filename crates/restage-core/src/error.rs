//! Error taxonomy for the restage workspace.

use thiserror::Error;

/// Result alias for workflow operations.
pub type WorkflowResult<T> = Result<T, WorkflowError>;

/// Result alias for control-plane operations.
pub type ControlPlaneResult<T> = Result<T, ControlPlaneError>;

/// Errors that terminate a clone run.
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// The requested logical database is not in the config.
    /// Reported before any control-plane call is made.
    #[error("unknown database {name:?}; supported databases: {supported:?}")]
    UnknownDatabase {
        name: String,
        supported: Vec<String>,
    },

    /// A cluster listing entry had no identifier. Soft stop: the
    /// control plane's inventory is inconsistent and guessing a target
    /// is worse than stopping.
    #[error("a cluster listing entry has no identifier (while resolving {0})")]
    MissingClusterIdentifier(String),

    /// No cluster identifier matched the logical database name.
    #[error("no production cluster found for {0}")]
    ProductionClusterNotFound(String),

    /// The production cluster has no automated snapshots to restore
    /// from. Soft stop.
    #[error("no automated snapshots found for cluster {0}")]
    NoSnapshots(String),

    /// The staging cluster's endpoint could not be read; repointing
    /// services without one would register a broken revision.
    #[error("endpoint unavailable for cluster {0}")]
    EndpointUnavailable(String),

    /// A poll ceiling was reached with `fail_on_poll_timeout` set.
    #[error("timed out waiting for {0}")]
    Timeout(String),

    #[error("control plane request failed: {0}")]
    ControlPlane(#[from] ControlPlaneError),
}

impl WorkflowError {
    /// Soft stops report a graceful early exit (process status 0):
    /// nothing was provisioned and nothing is wrong with the request
    /// itself. Everything else is a failure (status 1).
    pub fn is_soft_stop(&self) -> bool {
        matches!(
            self,
            WorkflowError::MissingClusterIdentifier(_) | WorkflowError::NoSnapshots(_)
        )
    }
}

/// Errors surfaced by a control-plane client.
#[derive(Debug, Error)]
pub enum ControlPlaneError {
    /// The resource being created already exists. The provisioner
    /// treats this as success on idempotent re-runs.
    #[error("{resource} already exists")]
    AlreadyExists { resource: String },

    /// Any other API failure.
    #[error("{0}")]
    Api(String),

    /// The API answered but the response is missing required data.
    #[error("malformed response: {0}")]
    Malformed(String),
}
