//! Service repointing — task-definition mutation and rollout.
//!
//! A service is repointed by cloning its currently-deployed task
//! definition, substituting the database endpoint variable, registering
//! the clone as a new revision, and rolling the service onto it. The
//! clone must shed the provider-assigned metadata that came back from
//! describe; the control plane rejects a registration that carries
//! another revision's identity.

use tracing::{debug, info};

use restage_core::{Poller, Readiness, ServiceControlPlane, TaskDefinition, WorkflowResult};

/// Fields the control plane assigns on registration. Present in
/// describe output, rejected in register input.
pub const PROVIDER_ASSIGNED_FIELDS: [&str; 7] = [
    "status",
    "compatibilities",
    "taskDefinitionArn",
    "registeredAt",
    "registeredBy",
    "revision",
    "requiresAttributes",
];

/// Produce the next revision of `current`: provider-assigned metadata
/// stripped and the database endpoint variable substituted in the
/// first container definition. Works on a private clone; `current` is
/// never mutated.
pub fn repoint_task_definition(
    current: &TaskDefinition,
    db_env_var: &str,
    endpoint: &str,
) -> TaskDefinition {
    let mut next = current.clone();
    for field in PROVIDER_ASSIGNED_FIELDS {
        next.extra.remove(field);
    }
    if let Some(container) = next.container_definitions.first_mut() {
        for var in &mut container.environment {
            if var.name == db_env_var {
                var.value = endpoint.to_string();
            }
        }
    }
    next
}

/// Rolls dependent services onto a new database endpoint.
pub struct ServiceRepointer<'a, S> {
    services: &'a S,
    poll: Poller,
}

impl<'a, S: ServiceControlPlane> ServiceRepointer<'a, S> {
    pub fn new(services: &'a S, poll: Poller) -> Self {
        Self { services, poll }
    }

    /// Repoint one service and wait for its rollout to stabilize.
    /// Returns whether the PRIMARY deployment reached its desired
    /// count before the poll ceiling; the caller applies the timeout
    /// policy. Fetch/register/update failures abort the run.
    pub async fn repoint(
        &self,
        cluster: &str,
        service: &str,
        db_env_var: &str,
        endpoint: &str,
    ) -> WorkflowResult<bool> {
        let current_name = self
            .services
            .current_task_definition(cluster, service)
            .await?;
        let current = self.services.describe_task_definition(&current_name).await?;

        let next = repoint_task_definition(&current, db_env_var, endpoint);
        let arn = self.services.register_task_definition(&next).await?;
        self.services.update_service(cluster, service, &arn).await?;
        info!(%service, task_definition = %arn, "service update issued");

        let stable = self
            .poll
            .wait_until(|| {
                let fut = self.services.primary_deployment(cluster, service);
                async move {
                    match fut.await {
                        Ok(Some(counts)) if counts.is_stable() => Readiness::Ready,
                        Ok(_) => Readiness::NotReady,
                        Err(err) => {
                            debug!(error = %err, "deployment probe failed");
                            Readiness::TransientError
                        }
                    }
                }
            })
            .await;
        Ok(stable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn described_definition() -> TaskDefinition {
        serde_json::from_value(json!({
            "family": "orders-svc",
            "taskRoleArn": "arn:aws:iam:role/orders-task",
            "cpu": "256",
            "memory": "512",
            "containerDefinitions": [{
                "name": "app",
                "image": "orders:42",
                "essential": true,
                "environment": [
                    {"name": "RAILS_ENV", "value": "staging"},
                    {"name": "DB_HOST", "value": "orders-prod.cluster.example.com"},
                    {"name": "DB_PORT", "value": "5432"}
                ]
            }],
            "status": "ACTIVE",
            "compatibilities": ["EC2"],
            "taskDefinitionArn": "arn:aws:ecs:task-definition/orders-svc:42",
            "registeredAt": "2024-03-01T00:00:00Z",
            "registeredBy": "arn:aws:iam:user/deployer",
            "revision": 42,
            "requiresAttributes": [{"name": "com.amazonaws.ecs.capability.task-iam-role"}]
        }))
        .unwrap()
    }

    #[test]
    fn substitutes_only_the_target_variable() {
        let current = described_definition();
        let next = repoint_task_definition(&current, "DB_HOST", "orders-staging.example.com");

        let env = &next.container_definitions[0].environment;
        assert_eq!(env.len(), 3);
        assert_eq!(env[0].value, "staging");
        assert_eq!(env[1].value, "orders-staging.example.com");
        assert_eq!(env[2].value, "5432");
    }

    #[test]
    fn strips_every_provider_assigned_field() {
        let current = described_definition();
        let next = repoint_task_definition(&current, "DB_HOST", "new-host");

        for field in PROVIDER_ASSIGNED_FIELDS {
            assert!(!next.extra.contains_key(field), "{field} should be stripped");
        }
    }

    #[test]
    fn preserves_registrable_fields() {
        let current = described_definition();
        let next = repoint_task_definition(&current, "DB_HOST", "new-host");

        assert_eq!(next.family, current.family);
        assert_eq!(next.task_role_arn, current.task_role_arn);
        assert_eq!(next.cpu, current.cpu);
        assert_eq!(next.memory, current.memory);
        assert_eq!(
            next.container_definitions[0].image,
            current.container_definitions[0].image
        );
    }

    #[test]
    fn original_is_untouched() {
        let current = described_definition();
        let before = current.clone();
        let _ = repoint_task_definition(&current, "DB_HOST", "new-host");
        assert_eq!(current, before);
    }

    #[test]
    fn missing_variable_changes_nothing() {
        let current = described_definition();
        let next = repoint_task_definition(&current, "CACHE_HOST", "new-host");
        assert_eq!(
            next.container_definitions[0].environment,
            current.container_definitions[0].environment
        );
    }

    #[test]
    fn tolerates_empty_container_list() {
        let current: TaskDefinition =
            serde_json::from_value(json!({"family": "empty"})).unwrap();
        let next = repoint_task_definition(&current, "DB_HOST", "new-host");
        assert!(next.container_definitions.is_empty());
    }
}
