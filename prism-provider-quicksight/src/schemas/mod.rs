//! QuickSight resource schema definitions

pub mod data_set;
pub mod data_source;
pub mod fragments;
pub mod template;

use std::collections::HashMap;

use prism_core::schema::ResourceSchema;

use crate::resources::ResourceKind;

/// Returns all QuickSight schemas
pub fn all_schemas() -> Vec<ResourceSchema> {
    ResourceKind::ALL.into_iter().map(ResourceKind::schema).collect()
}

/// Schemas keyed by resource type, as the differ expects them
pub fn schemas_by_type() -> HashMap<String, ResourceSchema> {
    all_schemas()
        .into_iter()
        .map(|schema| (schema.resource_type.clone(), schema))
        .collect()
}
