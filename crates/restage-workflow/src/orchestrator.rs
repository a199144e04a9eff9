//! The clone workflow — a strictly sequential stage pipeline.
//!
//! `ResolveSnapshot → ProvisionCluster → ProvisionInstance →
//! ResolveEndpoint → RepointService* → Done`, one logical database per
//! run, no branching back and no checkpointing. A re-run restarts from
//! the top and leans on identifier-derivation idempotency to skip
//! creation that already happened.
//!
//! Every collaborator is an explicit constructor argument; nothing is
//! process-global.

use std::time::Duration;

use chrono::{NaiveDate, Utc};
use tracing::warn;

use restage_core::{
    DatabaseControlPlane, Notifier, Poller, RestageConfig, ServiceControlPlane, StagingIdentity,
    WorkflowError, WorkflowResult, WorkflowSettings,
};

use crate::provision::ClusterProvisioner;
use crate::repoint::ServiceRepointer;
use crate::snapshot;

/// Tuning for one clone run.
#[derive(Debug, Clone)]
pub struct WorkflowOptions {
    /// Wait applied after cluster restore and instance creation.
    pub provision_poll: Poller,
    /// Wait applied after each service update.
    pub rollout_poll: Poller,
    /// Abort when a poll ceiling is reached instead of warning and
    /// proceeding.
    pub fail_on_poll_timeout: bool,
    /// Pin the run date; defaults to today in UTC. The run date is the
    /// idempotency key for staging identifiers.
    pub run_date: Option<NaiveDate>,
}

impl Default for WorkflowOptions {
    fn default() -> Self {
        Self {
            provision_poll: Poller::new(Duration::from_secs(45), 20),
            rollout_poll: Poller::new(Duration::from_secs(30), 20),
            fail_on_poll_timeout: false,
            run_date: None,
        }
    }
}

impl WorkflowOptions {
    pub fn from_settings(settings: &WorkflowSettings) -> Self {
        Self {
            fail_on_poll_timeout: settings.fail_on_poll_timeout,
            ..Self::default()
        }
    }
}

/// What a completed run produced.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub production_cluster_id: String,
    pub snapshot_id: String,
    pub cluster_id: String,
    pub instance_id: String,
    pub endpoint: String,
    pub services: Vec<String>,
}

/// One clone run over explicit collaborators.
pub struct Workflow<'a, D, S, N> {
    config: &'a RestageConfig,
    db: &'a D,
    services: &'a S,
    notifier: &'a N,
    options: WorkflowOptions,
}

impl<'a, D, S, N> Workflow<'a, D, S, N>
where
    D: DatabaseControlPlane,
    S: ServiceControlPlane,
    N: Notifier,
{
    pub fn new(
        config: &'a RestageConfig,
        db: &'a D,
        services: &'a S,
        notifier: &'a N,
        options: WorkflowOptions,
    ) -> Self {
        Self {
            config,
            db,
            services,
            notifier,
            options,
        }
    }

    /// Clone `logical_name`'s production database into staging and
    /// repoint its dependent services.
    pub async fn run(&self, logical_name: &str) -> WorkflowResult<RunReport> {
        // Profile lookup comes first: an unknown name must fail before
        // any control-plane call.
        let profile =
            self.config
                .database(logical_name)
                .ok_or_else(|| WorkflowError::UnknownDatabase {
                    name: logical_name.to_string(),
                    supported: self.config.database_names(),
                })?;

        let production_cluster = snapshot::resolve_production_cluster(self.db, logical_name).await?;
        let latest = snapshot::resolve_latest_snapshot(self.db, &production_cluster).await?;

        let run_date = self
            .options
            .run_date
            .unwrap_or_else(|| Utc::now().date_naive());
        let identity = StagingIdentity::derive(logical_name, run_date);

        self.notifier
            .notify(&format!(
                "Creating staging database cluster for {logical_name} from snapshot {}",
                latest.id
            ))
            .await;

        let provisioner = ClusterProvisioner::new(self.db, self.options.provision_poll);

        let cluster_ready = provisioner
            .restore_cluster(profile, &identity, &latest.id)
            .await?;
        self.poll_verdict(
            cluster_ready,
            &format!("cluster {} to become available", identity.cluster_id),
        )?;

        let instance_ready = provisioner.create_instance(profile, &identity).await?;
        self.poll_verdict(
            instance_ready,
            &format!("instance {} to become available", identity.instance_id),
        )?;

        let endpoint = provisioner
            .endpoint(&identity.cluster_id)
            .await
            .ok_or_else(|| WorkflowError::EndpointUnavailable(identity.cluster_id.clone()))?;

        let repointer = ServiceRepointer::new(self.services, self.options.rollout_poll);
        for service in profile.services() {
            let stable = repointer
                .repoint(&profile.ecs_cluster, service, &profile.db_env_var, &endpoint)
                .await?;
            self.poll_verdict(stable, &format!("service {service} rollout to stabilize"))?;
        }

        let [main_service, sk_service] = profile.services();
        self.notifier
            .notify(&format!(
                "New staging DB cluster created for {main_service}, {sk_service}: {endpoint}; \
                 services are updated and ready to use"
            ))
            .await;

        Ok(RunReport {
            production_cluster_id: production_cluster,
            snapshot_id: latest.id,
            cluster_id: identity.cluster_id,
            instance_id: identity.instance_id,
            endpoint,
            services: profile.services().map(String::from).to_vec(),
        })
    }

    /// Poll-ceiling policy: by default the pipeline proceeds past an
    /// unconfirmed resource with a warning; `fail_on_poll_timeout`
    /// turns exhaustion into a fatal timeout.
    fn poll_verdict(&self, ready: bool, waited_for: &str) -> WorkflowResult<()> {
        if ready {
            return Ok(());
        }
        if self.options.fail_on_poll_timeout {
            return Err(WorkflowError::Timeout(waited_for.to_string()));
        }
        warn!(waited_for, "poll ceiling reached, proceeding anyway");
        Ok(())
    }
}
