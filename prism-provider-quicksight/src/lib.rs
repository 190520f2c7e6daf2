//! Prism Amazon QuickSight Provider
//!
//! Manages QuickSight data sets, data sources and templates.
//!
//! ## Module Structure
//!
//! - `schemas` - Attribute schemas for each resource type
//! - `types` - Typed QuickSight API model
//! - `convert` - Expand attribute trees into API structs and flatten them back
//! - `permissions` - Permission reads and grant/revoke updates
//! - `provider` - QuickSightProvider implementation
//! - `id` - State identifiers and ARNs

pub mod config;
pub mod convert;
pub mod id;
pub mod permissions;
pub mod provider;
pub mod resources;
pub mod schemas;
pub mod types;

// Re-export main types
pub use config::QuickSightConfig;
pub use permissions::{PermissionTarget, PermissionsApi, apply_permission_changes};
pub use provider::{CloudControlApi, QuickSightProvider};
pub use resources::ResourceKind;

use prism_core::provider::{BoxFuture, Provider, ProviderResult};
use prism_core::resource::{Resource, ResourceId, State};

use resources::resource_types;

// =============================================================================
// Provider Trait Implementation
// =============================================================================

impl Provider for QuickSightProvider {
    fn name(&self) -> &'static str {
        "quicksight"
    }

    fn resource_types(&self) -> Vec<Box<dyn prism_core::provider::ResourceType>> {
        resource_types()
    }

    fn read(
        &self,
        id: &ResourceId,
        identifier: Option<&str>,
    ) -> BoxFuture<'_, ProviderResult<State>> {
        let id = id.clone();
        let identifier = identifier.map(|s| s.to_string());
        Box::pin(async move { self.read_resource(&id, identifier.as_deref()).await })
    }

    fn create(&self, resource: &Resource) -> BoxFuture<'_, ProviderResult<State>> {
        let resource = resource.clone();
        Box::pin(async move { self.create_resource(resource).await })
    }

    fn update(
        &self,
        id: &ResourceId,
        identifier: &str,
        from: &State,
        to: &Resource,
    ) -> BoxFuture<'_, ProviderResult<State>> {
        let id = id.clone();
        let identifier = identifier.to_string();
        let from = from.clone();
        let to = to.clone();
        Box::pin(async move { self.update_resource(id, &identifier, &from, to).await })
    }

    fn delete(&self, id: &ResourceId, identifier: &str) -> BoxFuture<'_, ProviderResult<()>> {
        let id = id.clone();
        let identifier = identifier.to_string();
        Box::pin(async move { self.delete_resource(&id, &identifier).await })
    }
}
