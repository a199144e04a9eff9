//! restage.toml configuration parser.
//!
//! The config file maps each logical database name to the parameters
//! needed to restore it into staging and to repoint its dependent
//! services:
//!
//! ```toml
//! [workflow]
//! fail_on_poll_timeout = false
//!
//! [databases.orders-prod]
//! engine = "aurora-postgresql"
//! engine_version = "13.7"
//! subnet_group = "staging-db-subnets"
//! vpc_security_groups = ["sg-0abc123"]
//! ecs_cluster = "staging"
//! ecs_service = "orders-svc"
//! ecs_sk_service = "orders-sk-svc"
//! db_env_var = "DB_HOST"
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Top-level restage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RestageConfig {
    /// Logical database name → provisioning parameters.
    pub databases: BTreeMap<String, DatabaseProfile>,
    #[serde(default)]
    pub workflow: WorkflowSettings,
}

/// Provisioning parameters for one logical database.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseProfile {
    /// Database engine, e.g. "aurora-postgresql".
    pub engine: String,
    pub engine_version: String,
    /// Subnet group the staging cluster is placed in.
    pub subnet_group: String,
    pub vpc_security_groups: Vec<String>,
    /// Orchestration cluster the dependent services run in.
    pub ecs_cluster: String,
    /// Main dependent service.
    pub ecs_service: String,
    /// Sidekick dependent service (workers, schedulers).
    pub ecs_sk_service: String,
    /// Name of the environment variable carrying the database endpoint.
    pub db_env_var: String,
}

impl DatabaseProfile {
    /// The dependent services, in the order they are repointed.
    pub fn services(&self) -> [&str; 2] {
        [&self.ecs_service, &self.ecs_sk_service]
    }
}

/// Workflow tuning knobs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkflowSettings {
    /// Treat poll-ceiling exhaustion as fatal instead of warning and
    /// proceeding. Off by default.
    #[serde(default)]
    pub fail_on_poll_timeout: bool,
}

impl RestageConfig {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: RestageConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Look up the profile for a logical database name.
    pub fn database(&self, name: &str) -> Option<&DatabaseProfile> {
        self.databases.get(name)
    }

    /// The logical database names this config supports, sorted.
    pub fn database_names(&self) -> Vec<String> {
        self.databases.keys().cloned().collect()
    }
}
