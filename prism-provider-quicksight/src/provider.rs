//! QuickSight provider implementation
//!
//! Resource properties go through the AWS Cloud Control API. Permissions are
//! read and changed with the QuickSight permission APIs, since Cloud Control
//! only applies them on create.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use aws_config::Region;
use aws_sdk_cloudcontrol::Client as CloudControlClient;
use aws_sdk_cloudcontrol::types::OperationStatus;
use heck::ToUpperCamelCase;
use prism_core::permission::{PERMISSIONS_ATTRIBUTE, PermissionSet};
use prism_core::provider::{ProviderError, ProviderResult};
use prism_core::resource::{Resource, ResourceId, State, Value};
use prism_core::schema::ResourceSchema;
use serde_json::json;

use crate::config::QuickSightConfig;
use crate::convert::{self, ExpandError, flatten_permissions};
use crate::id::{arn, cloud_control_identifier, create_id, parse_id};
use crate::permissions::{
    PermissionTarget, PermissionsApi, QuickSightPermissionsClient, apply_permission_changes,
};
use crate::resources::ResourceKind;
use crate::types::{DataSet, DataSource, Template};

/// Cloud Control calls used by the provider
#[async_trait]
pub trait CloudControlApi: Send + Sync {
    /// `None` when the resource does not exist
    async fn get_resource(
        &self,
        type_name: &str,
        identifier: &str,
    ) -> ProviderResult<Option<serde_json::Value>>;

    /// Returns the Cloud Control identifier of the new resource
    async fn create_resource(
        &self,
        type_name: &str,
        desired_state: serde_json::Value,
    ) -> ProviderResult<String>;

    async fn update_resource(
        &self,
        type_name: &str,
        identifier: &str,
        patch_ops: Vec<serde_json::Value>,
    ) -> ProviderResult<()>;

    async fn delete_resource(&self, type_name: &str, identifier: &str) -> ProviderResult<()>;
}

/// `CloudControlApi` backed by the SDK client
pub struct CloudControl {
    client: CloudControlClient,
    max_wait_attempts: u32,
    poll_interval: Duration,
}

impl CloudControl {
    pub fn new(client: CloudControlClient, config: &QuickSightConfig) -> Self {
        Self {
            client,
            max_wait_attempts: config.max_wait_attempts,
            poll_interval: Duration::from_secs(config.poll_interval_secs),
        }
    }

    /// Wait for a Cloud Control operation to complete
    async fn wait_for_operation(&self, request_token: &str) -> ProviderResult<String> {
        log::debug!("Waiting for Cloud Control request {}", request_token);

        for _ in 0..self.max_wait_attempts {
            let status = self
                .client
                .get_resource_request_status()
                .request_token(request_token)
                .send()
                .await
                .map_err(|e| {
                    ProviderError::new(format!("Failed to get operation status: {:?}", e))
                })?;

            if let Some(progress) = status.progress_event() {
                match progress.operation_status() {
                    Some(OperationStatus::Success) => {
                        return Ok(progress.identifier().unwrap_or("").to_string());
                    }
                    Some(OperationStatus::Failed) => {
                        let msg = progress.status_message().unwrap_or("Unknown error");
                        return Err(ProviderError::new(format!("Operation failed: {}", msg)));
                    }
                    Some(OperationStatus::CancelComplete) => {
                        return Err(ProviderError::new("Operation was cancelled"));
                    }
                    _ => {
                        tokio::time::sleep(self.poll_interval).await;
                    }
                }
            }
        }

        Err(ProviderError::new("Operation timed out"))
    }
}

#[async_trait]
impl CloudControlApi for CloudControl {
    async fn get_resource(
        &self,
        type_name: &str,
        identifier: &str,
    ) -> ProviderResult<Option<serde_json::Value>> {
        let result = self
            .client
            .get_resource()
            .type_name(type_name)
            .identifier(identifier)
            .send()
            .await;

        match result {
            Ok(response) => {
                let Some(props) = response
                    .resource_description()
                    .and_then(|desc| desc.properties())
                else {
                    return Ok(None);
                };
                serde_json::from_str(props).map(Some).map_err(|e| {
                    ProviderError::new("Cloud Control returned malformed properties").with_cause(e)
                })
            }
            Err(e) => {
                let err_str = format!("{:?}", e);
                if err_str.contains("ResourceNotFound") || err_str.contains("NotFound") {
                    Ok(None)
                } else {
                    Err(ProviderError::new(format!("Failed to get resource: {:?}", e)))
                }
            }
        }
    }

    async fn create_resource(
        &self,
        type_name: &str,
        desired_state: serde_json::Value,
    ) -> ProviderResult<String> {
        let result = self
            .client
            .create_resource()
            .type_name(type_name)
            .desired_state(desired_state.to_string())
            .send()
            .await
            .map_err(|e| ProviderError::new(format!("Failed to create resource: {:?}", e)))?;

        let request_token = result
            .progress_event()
            .and_then(|p| p.request_token())
            .ok_or_else(|| ProviderError::new("No request token returned"))?;

        self.wait_for_operation(request_token).await
    }

    async fn update_resource(
        &self,
        type_name: &str,
        identifier: &str,
        patch_ops: Vec<serde_json::Value>,
    ) -> ProviderResult<()> {
        if patch_ops.is_empty() {
            return Ok(());
        }

        let patch_document = serde_json::to_string(&patch_ops)
            .map_err(|e| ProviderError::new(format!("Failed to build patch: {}", e)))?;

        let result = self
            .client
            .update_resource()
            .type_name(type_name)
            .identifier(identifier)
            .patch_document(patch_document)
            .send()
            .await
            .map_err(|e| ProviderError::new(format!("Failed to update resource: {:?}", e)))?;

        if let Some(request_token) = result.progress_event().and_then(|p| p.request_token()) {
            self.wait_for_operation(request_token).await?;
        }

        Ok(())
    }

    async fn delete_resource(&self, type_name: &str, identifier: &str) -> ProviderResult<()> {
        let result = self
            .client
            .delete_resource()
            .type_name(type_name)
            .identifier(identifier)
            .send()
            .await
            .map_err(|e| ProviderError::new(format!("Failed to delete resource: {:?}", e)))?;

        if let Some(request_token) = result.progress_event().and_then(|p| p.request_token()) {
            self.wait_for_operation(request_token).await?;
        }

        Ok(())
    }
}

/// Amazon QuickSight provider
pub struct QuickSightProvider {
    cloud_control: Box<dyn CloudControlApi>,
    permissions: Box<dyn PermissionsApi>,
    config: QuickSightConfig,
}

impl QuickSightProvider {
    /// Create a provider using the default AWS credential chain
    pub async fn new(config: QuickSightConfig) -> Self {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest());
        if let Some(region) = &config.region {
            loader = loader.region(Region::new(region.clone()));
        }
        let sdk_config = loader.load().await;

        Self {
            cloud_control: Box::new(CloudControl::new(
                CloudControlClient::new(&sdk_config),
                &config,
            )),
            permissions: Box::new(QuickSightPermissionsClient::new(
                aws_sdk_quicksight::Client::new(&sdk_config),
            )),
            config,
        }
    }

    /// Create a provider over explicit API implementations
    pub fn with_clients(
        config: QuickSightConfig,
        cloud_control: Box<dyn CloudControlApi>,
        permissions: Box<dyn PermissionsApi>,
    ) -> Self {
        Self {
            cloud_control,
            permissions,
            config,
        }
    }

    pub fn config(&self) -> &QuickSightConfig {
        &self.config
    }

    // =========================================================================
    // Resource Operations
    // =========================================================================

    /// Read a resource and its permissions
    pub async fn read_resource(
        &self,
        id: &ResourceId,
        identifier: Option<&str>,
    ) -> ProviderResult<State> {
        let kind = resource_kind(id)?;

        let identifier = match identifier {
            Some(identifier) => identifier,
            None => return Ok(State::not_found(id.clone())),
        };
        let (account_id, resource_id) = parse_id(kind, identifier).map_err(|e| {
            ProviderError::new("Invalid identifier")
                .with_cause(e)
                .for_resource(id.clone())
        })?;

        let props = match self
            .cloud_control
            .get_resource(
                kind.aws_type_name(),
                &cloud_control_identifier(&account_id, &resource_id),
            )
            .await
            .map_err(|e| e.for_resource(id.clone()))?
        {
            Some(props) => props,
            None => {
                log::info!("{} {} not found", kind, identifier);
                return Ok(State::not_found(id.clone()));
            }
        };

        let mut attributes =
            flatten_properties(kind, props).map_err(|e| e.for_resource(id.clone()))?;
        attributes.remove(PERMISSIONS_ATTRIBUTE);
        attributes
            .entry("aws_account_id".to_string())
            .or_insert_with(|| Value::string(&account_id));
        // Some resource types omit Arn from their Cloud Control model
        if !attributes.contains_key("arn")
            && let Some(region) = &self.config.region
        {
            attributes.insert(
                "arn".to_string(),
                Value::string(arn(kind, region, &account_id, &resource_id)),
            );
        }

        let target = PermissionTarget::new(kind, account_id, resource_id);
        let permissions = self
            .permissions
            .describe_permissions(&target)
            .await
            .map_err(|e| e.for_resource(id.clone()))?;
        if !permissions.is_empty() {
            attributes.insert(
                PERMISSIONS_ATTRIBUTE.to_string(),
                flatten_permissions(&permissions),
            );
        }

        let attributes = kind.schema().normalize(&attributes);
        Ok(State::existing(id.clone(), attributes).with_identifier(identifier))
    }

    /// Create a resource, permissions included
    pub async fn create_resource(&self, resource: Resource) -> ProviderResult<State> {
        let id = resource.id.clone();
        let kind = resource_kind(&id)?;
        let schema = kind.schema();
        let attributes = self.prepare(&schema, &resource)?;

        let account_id = attribute_str(&attributes, "aws_account_id", &id)?;
        let resource_id = attribute_str(&attributes, kind.id_attribute(), &id)?;
        let desired_state =
            expand_properties(kind, &attributes).map_err(|e| e.for_resource(id.clone()))?;

        self.cloud_control
            .create_resource(kind.aws_type_name(), desired_state)
            .await
            .map_err(|e| e.for_resource(id.clone()))?;
        log::info!("Created {} {}", kind, resource_id);

        let identifier = create_id(kind, &account_id, &resource_id);
        self.read_resource(&id, Some(&identifier)).await
    }

    /// Update properties with a JSON patch, then apply permission changes
    pub async fn update_resource(
        &self,
        id: ResourceId,
        identifier: &str,
        from: &State,
        to: Resource,
    ) -> ProviderResult<State> {
        let kind = resource_kind(&id)?;
        let schema = kind.schema();
        let attributes = self.prepare(&schema, &to)?;

        let (account_id, resource_id) = parse_id(kind, identifier).map_err(|e| {
            ProviderError::new("Invalid identifier")
                .with_cause(e)
                .for_resource(id.clone())
        })?;

        let desired_state =
            expand_properties(kind, &attributes).map_err(|e| e.for_resource(id.clone()))?;
        let patch_ops = build_patch(&schema, &desired_state, &from.attributes);
        log::debug!(
            "Patching {} {} with {} operation(s)",
            kind,
            resource_id,
            patch_ops.len()
        );
        self.cloud_control
            .update_resource(
                kind.aws_type_name(),
                &cloud_control_identifier(&account_id, &resource_id),
                patch_ops,
            )
            .await
            .map_err(|e| e.for_resource(id.clone()))?;

        let old = permission_set(&from.attributes).map_err(|e| e.for_resource(id.clone()))?;
        let new = permission_set(&attributes).map_err(|e| e.for_resource(id.clone()))?;
        let target = PermissionTarget::new(kind, account_id, resource_id);
        apply_permission_changes(self.permissions.as_ref(), &target, &old, &new)
            .await
            .map_err(|e| e.for_resource(id.clone()))?;

        self.read_resource(&id, Some(identifier)).await
    }

    pub async fn delete_resource(&self, id: &ResourceId, identifier: &str) -> ProviderResult<()> {
        let kind = resource_kind(id)?;
        let (account_id, resource_id) = parse_id(kind, identifier).map_err(|e| {
            ProviderError::new("Invalid identifier")
                .with_cause(e)
                .for_resource(id.clone())
        })?;

        self.cloud_control
            .delete_resource(
                kind.aws_type_name(),
                &cloud_control_identifier(&account_id, &resource_id),
            )
            .await
            .map_err(|e| e.for_resource(id.clone()))?;
        log::info!("Deleted {} {}", kind, resource_id);
        Ok(())
    }

    /// Validate desired attributes and fill the account ID from configuration
    fn prepare(
        &self,
        schema: &ResourceSchema,
        resource: &Resource,
    ) -> ProviderResult<HashMap<String, Value>> {
        let mut attributes = resource.attributes.clone();
        if !attributes.contains_key("aws_account_id") {
            let account_id = self.config.aws_account_id.as_ref().ok_or_else(|| {
                ProviderError::new("aws_account_id is not set and no account is configured")
                    .for_resource(resource.id.clone())
            })?;
            attributes.insert("aws_account_id".to_string(), Value::string(account_id));
        }

        schema.validate(&attributes).map_err(|errors| {
            let messages: Vec<String> = errors.iter().map(ToString::to_string).collect();
            ProviderError::new(format!("Invalid attributes: {}", messages.join("; ")))
                .for_resource(resource.id.clone())
        })?;
        Ok(attributes)
    }
}

fn resource_kind(id: &ResourceId) -> ProviderResult<ResourceKind> {
    ResourceKind::from_resource_type(&id.resource_type).ok_or_else(|| {
        ProviderError::new(format!("Unknown resource type: {}", id.resource_type))
            .for_resource(id.clone())
    })
}

fn attribute_str(
    attributes: &HashMap<String, Value>,
    name: &str,
    id: &ResourceId,
) -> ProviderResult<String> {
    attributes
        .get(name)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| {
            ProviderError::new(format!("Missing attribute: {}", name)).for_resource(id.clone())
        })
}

fn expand_error(e: ExpandError) -> ProviderError {
    ProviderError::new(format!("Invalid attributes: {}", e)).with_cause(e)
}

fn permission_set(attributes: &HashMap<String, Value>) -> ProviderResult<PermissionSet> {
    match attributes.get(PERMISSIONS_ATTRIBUTE) {
        Some(value) => convert::expand_permissions(value).map_err(expand_error),
        None => Ok(PermissionSet::empty()),
    }
}

/// Cloud Control desired state for the attribute map
fn expand_properties(
    kind: ResourceKind,
    attributes: &HashMap<String, Value>,
) -> ProviderResult<serde_json::Value> {
    let serialized = match kind {
        ResourceKind::DataSet => {
            serde_json::to_value(convert::expand_data_set(attributes).map_err(expand_error)?)
        }
        ResourceKind::DataSource => {
            serde_json::to_value(convert::expand_data_source(attributes).map_err(expand_error)?)
        }
        ResourceKind::Template => {
            serde_json::to_value(convert::expand_template(attributes).map_err(expand_error)?)
        }
    };
    serialized.map_err(|e| ProviderError::new("Failed to serialize resource").with_cause(e))
}

/// Attribute map for Cloud Control properties
fn flatten_properties(
    kind: ResourceKind,
    props: serde_json::Value,
) -> ProviderResult<HashMap<String, Value>> {
    let malformed = |e: serde_json::Error| {
        ProviderError::new(format!("Unexpected {} properties", kind)).with_cause(e)
    };
    let attributes = match kind {
        ResourceKind::DataSet => convert::flatten_data_set(
            &serde_json::from_value::<DataSet>(props).map_err(malformed)?,
        ),
        ResourceKind::DataSource => convert::flatten_data_source(
            &serde_json::from_value::<DataSource>(props).map_err(malformed)?,
        ),
        ResourceKind::Template => convert::flatten_template(
            &serde_json::from_value::<Template>(props).map_err(malformed)?,
        ),
    };
    Ok(attributes)
}

/// Property name Cloud Control uses for an attribute
fn property_name(schema: &ResourceSchema, name: &str) -> String {
    schema
        .get(name)
        .and_then(|attr| attr.provider_name.clone())
        .unwrap_or_else(|| name.to_upper_camel_case())
}

/// JSON patch from the current attributes to the desired properties
///
/// Identity attributes, read-only attributes and permissions are never
/// patched. Optional attributes that are no longer configured are removed.
fn build_patch(
    schema: &ResourceSchema,
    desired: &serde_json::Value,
    current: &HashMap<String, Value>,
) -> Vec<serde_json::Value> {
    let mut ops = Vec::new();

    for (name, attr) in schema.attributes() {
        if name == PERMISSIONS_ATTRIBUTE || attr.read_only || attr.force_new {
            continue;
        }
        let path = property_name(schema, name);
        match desired.get(path.as_str()) {
            Some(value) => ops.push(json!({
                "op": "replace",
                "path": format!("/{}", path),
                "value": value
            })),
            None if current.contains_key(name.as_str()) && !attr.computed && !attr.required => {
                ops.push(json!({"op": "remove", "path": format!("/{}", path)}));
            }
            None => {}
        }
    }

    ops
}
