//! ECS-backed service control plane.
//!
//! Task definitions cross the boundary twice: describe output becomes
//! the core model (registrable fields typed, provider-assigned
//! metadata into `extra`), and a mutated model becomes register input.
//! Register input carries only what the model types; any `extra` key
//! still present after the workflow's strip is logged and dropped.

use aws_config::SdkConfig;
use aws_sdk_ecs::Client;
use aws_sdk_ecs::types::{self, Compatibility, KeyValuePair, LogDriver, NetworkMode, Secret, TransportProtocol};
use serde_json::json;
use tracing::debug;

use restage_core::{
    ContainerDefinition, ControlPlaneError, ControlPlaneResult, DeploymentCounts,
    EnvironmentVariable, LogConfiguration, PortMapping, SecretReference, ServiceControlPlane,
    TaskDefinition,
};

use crate::util::api_error;

/// Service and task-definition lifecycle over AWS ECS.
#[derive(Debug, Clone)]
pub struct EcsControlPlane {
    client: Client,
}

impl EcsControlPlane {
    pub fn new(config: &SdkConfig) -> Self {
        Self {
            client: Client::new(config),
        }
    }
}

impl ServiceControlPlane for EcsControlPlane {
    async fn current_task_definition(
        &self,
        cluster: &str,
        service: &str,
    ) -> ControlPlaneResult<String> {
        let response = self
            .client
            .describe_services()
            .cluster(cluster)
            .services(service)
            .send()
            .await
            .map_err(api_error)?;

        let described = response.services().first().ok_or_else(|| {
            ControlPlaneError::Malformed(format!("service {service} not in describe response"))
        })?;
        let deployment = described.deployments().first().ok_or_else(|| {
            ControlPlaneError::Malformed(format!("service {service} has no deployments"))
        })?;
        deployment
            .task_definition()
            .map(str::to_string)
            .ok_or_else(|| {
                ControlPlaneError::Malformed(format!(
                    "deployment of {service} names no task definition"
                ))
            })
    }

    async fn describe_task_definition(&self, name: &str) -> ControlPlaneResult<TaskDefinition> {
        let response = self
            .client
            .describe_task_definition()
            .task_definition(name)
            .send()
            .await
            .map_err(api_error)?;

        let definition = response.task_definition().ok_or_else(|| {
            ControlPlaneError::Malformed(format!("no task definition in response for {name}"))
        })?;
        from_sdk_task_definition(definition)
    }

    async fn register_task_definition(
        &self,
        definition: &TaskDefinition,
    ) -> ControlPlaneResult<String> {
        for key in definition.extra.keys() {
            debug!(%key, "dropping unmapped task definition field");
        }

        let containers = definition
            .container_definitions
            .iter()
            .map(to_sdk_container)
            .collect::<ControlPlaneResult<Vec<_>>>()?;

        let mut request = self
            .client
            .register_task_definition()
            .family(&definition.family)
            .set_task_role_arn(definition.task_role_arn.clone())
            .set_execution_role_arn(definition.execution_role_arn.clone())
            .set_network_mode(
                definition
                    .network_mode
                    .as_deref()
                    .map(NetworkMode::from),
            )
            .set_cpu(definition.cpu.clone())
            .set_memory(definition.memory.clone())
            .set_container_definitions(Some(containers));
        for compatibility in &definition.requires_compatibilities {
            request = request.requires_compatibilities(Compatibility::from(compatibility.as_str()));
        }

        let response = request.send().await.map_err(api_error)?;
        response
            .task_definition()
            .and_then(|registered| registered.task_definition_arn())
            .map(str::to_string)
            .ok_or_else(|| {
                ControlPlaneError::Malformed("register response carries no ARN".to_string())
            })
    }

    async fn update_service(
        &self,
        cluster: &str,
        service: &str,
        task_definition_arn: &str,
    ) -> ControlPlaneResult<()> {
        self.client
            .update_service()
            .cluster(cluster)
            .service(service)
            .task_definition(task_definition_arn)
            .send()
            .await
            .map(|_| ())
            .map_err(api_error)
    }

    async fn primary_deployment(
        &self,
        cluster: &str,
        service: &str,
    ) -> ControlPlaneResult<Option<DeploymentCounts>> {
        let response = self
            .client
            .describe_services()
            .cluster(cluster)
            .services(service)
            .send()
            .await
            .map_err(api_error)?;

        let Some(described) = response.services().first() else {
            return Ok(None);
        };
        Ok(described
            .deployments()
            .iter()
            .find(|deployment| deployment.status() == Some("PRIMARY"))
            .map(|deployment| DeploymentCounts {
                desired: deployment.desired_count(),
                running: deployment.running_count(),
            }))
    }
}

// ── SDK ⇄ model conversion ─────────────────────────────────────────

fn from_sdk_task_definition(sdk: &types::TaskDefinition) -> ControlPlaneResult<TaskDefinition> {
    let family = sdk.family().ok_or_else(|| {
        ControlPlaneError::Malformed("task definition has no family".to_string())
    })?;

    let mut extra = serde_json::Map::new();
    if let Some(arn) = sdk.task_definition_arn() {
        extra.insert("taskDefinitionArn".to_string(), json!(arn));
    }
    if sdk.revision() != 0 {
        extra.insert("revision".to_string(), json!(sdk.revision()));
    }
    if let Some(status) = sdk.status() {
        extra.insert("status".to_string(), json!(status.as_str()));
    }
    if let Some(registered_at) = sdk.registered_at() {
        extra.insert("registeredAt".to_string(), json!(registered_at.secs()));
    }
    if let Some(registered_by) = sdk.registered_by() {
        extra.insert("registeredBy".to_string(), json!(registered_by));
    }
    if !sdk.compatibilities().is_empty() {
        let compatibilities: Vec<&str> = sdk
            .compatibilities()
            .iter()
            .map(|compatibility| compatibility.as_str())
            .collect();
        extra.insert("compatibilities".to_string(), json!(compatibilities));
    }

    Ok(TaskDefinition {
        family: family.to_string(),
        task_role_arn: sdk.task_role_arn().map(str::to_string),
        execution_role_arn: sdk.execution_role_arn().map(str::to_string),
        network_mode: sdk.network_mode().map(|mode| mode.as_str().to_string()),
        cpu: sdk.cpu().map(str::to_string),
        memory: sdk.memory().map(str::to_string),
        requires_compatibilities: sdk
            .requires_compatibilities()
            .iter()
            .map(|compatibility| compatibility.as_str().to_string())
            .collect(),
        container_definitions: sdk
            .container_definitions()
            .iter()
            .map(from_sdk_container)
            .collect::<ControlPlaneResult<Vec<_>>>()?,
        extra,
    })
}

fn from_sdk_container(sdk: &types::ContainerDefinition) -> ControlPlaneResult<ContainerDefinition> {
    let name = sdk.name().ok_or_else(|| {
        ControlPlaneError::Malformed("container definition has no name".to_string())
    })?;

    Ok(ContainerDefinition {
        name: name.to_string(),
        image: sdk.image().map(str::to_string),
        essential: sdk.essential(),
        cpu: (sdk.cpu() != 0).then(|| sdk.cpu()),
        memory: sdk.memory(),
        memory_reservation: sdk.memory_reservation(),
        port_mappings: sdk.port_mappings().iter().map(from_sdk_port_mapping).collect(),
        environment: sdk
            .environment()
            .iter()
            .filter_map(from_sdk_environment_variable)
            .collect(),
        secrets: sdk.secrets().iter().filter_map(from_sdk_secret).collect(),
        command: sdk.command().to_vec(),
        entry_point: sdk.entry_point().to_vec(),
        log_configuration: sdk.log_configuration().map(from_sdk_log_configuration),
        extra: serde_json::Map::new(),
    })
}

fn from_sdk_environment_variable(pair: &KeyValuePair) -> Option<EnvironmentVariable> {
    Some(EnvironmentVariable {
        name: pair.name()?.to_string(),
        value: pair.value()?.to_string(),
    })
}

fn from_sdk_secret(secret: &Secret) -> Option<SecretReference> {
    Some(SecretReference {
        name: secret.name().to_string(),
        value_from: secret.value_from().to_string(),
    })
}

fn from_sdk_port_mapping(mapping: &types::PortMapping) -> PortMapping {
    PortMapping {
        container_port: mapping.container_port(),
        host_port: mapping.host_port(),
        protocol: mapping
            .protocol()
            .map(|protocol| protocol.as_str().to_string()),
    }
}

fn from_sdk_log_configuration(config: &types::LogConfiguration) -> LogConfiguration {
    LogConfiguration {
        log_driver: config.log_driver().as_str().to_string(),
        options: config
            .options()
            .map(|options| {
                options
                    .iter()
                    .map(|(key, value)| (key.clone(), value.clone()))
                    .collect()
            })
            .unwrap_or_default(),
    }
}

fn to_sdk_container(container: &ContainerDefinition) -> ControlPlaneResult<types::ContainerDefinition> {
    for key in container.extra.keys() {
        debug!(container = %container.name, %key, "dropping unmapped container field");
    }

    let mut builder = types::ContainerDefinition::builder()
        .name(&container.name)
        .set_image(container.image.clone())
        .set_essential(container.essential)
        .set_memory(container.memory)
        .set_memory_reservation(container.memory_reservation);
    if let Some(cpu) = container.cpu {
        builder = builder.cpu(cpu);
    }

    if !container.port_mappings.is_empty() {
        builder = builder.set_port_mappings(Some(
            container
                .port_mappings
                .iter()
                .map(to_sdk_port_mapping)
                .collect(),
        ));
    }
    if !container.environment.is_empty() {
        builder = builder.set_environment(Some(
            container
                .environment
                .iter()
                .map(|var| {
                    KeyValuePair::builder()
                        .name(&var.name)
                        .value(&var.value)
                        .build()
                })
                .collect(),
        ));
    }
    if !container.secrets.is_empty() {
        builder = builder.set_secrets(Some(
            container
                .secrets
                .iter()
                .map(|secret| {
                    Secret::builder()
                        .name(&secret.name)
                        .value_from(&secret.value_from)
                        .build()
                })
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| ControlPlaneError::Malformed(e.to_string()))?,
        ));
    }
    if !container.command.is_empty() {
        builder = builder.set_command(Some(container.command.clone()));
    }
    if !container.entry_point.is_empty() {
        builder = builder.set_entry_point(Some(container.entry_point.clone()));
    }
    if let Some(log_configuration) = &container.log_configuration {
        builder = builder.set_log_configuration(Some(to_sdk_log_configuration(log_configuration)?));
    }

    Ok(builder.build())
}

fn to_sdk_port_mapping(mapping: &PortMapping) -> types::PortMapping {
    let mut builder = types::PortMapping::builder()
        .set_container_port(mapping.container_port)
        .set_host_port(mapping.host_port);
    if let Some(protocol) = &mapping.protocol {
        builder = builder.protocol(TransportProtocol::from(protocol.as_str()));
    }
    builder.build()
}

fn to_sdk_log_configuration(
    config: &LogConfiguration,
) -> ControlPlaneResult<types::LogConfiguration> {
    types::LogConfiguration::builder()
        .log_driver(LogDriver::from(config.log_driver.as_str()))
        .set_options(if config.options.is_empty() {
            None
        } else {
            Some(config.options.clone().into_iter().collect())
        })
        .build()
        .map_err(|err| ControlPlaneError::Malformed(format!("log configuration: {err}")))
}
