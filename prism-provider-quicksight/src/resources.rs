//! Resource type configurations for QuickSight
//!
//! This module defines:
//! - Resource type definitions (implementing ResourceType trait)
//! - Mapping between Prism resource types and AWS CloudFormation resource types

use prism_core::provider::ResourceType;
use prism_core::schema::ResourceSchema;

use crate::schemas;

/// The QuickSight resources this provider manages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    DataSet,
    DataSource,
    Template,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 3] = [
        ResourceKind::DataSet,
        ResourceKind::DataSource,
        ResourceKind::Template,
    ];

    /// Prism resource type (e.g., "quicksight.data_set")
    pub fn resource_type(self) -> &'static str {
        match self {
            ResourceKind::DataSet => "quicksight.data_set",
            ResourceKind::DataSource => "quicksight.data_source",
            ResourceKind::Template => "quicksight.template",
        }
    }

    /// AWS CloudFormation type name
    pub fn aws_type_name(self) -> &'static str {
        match self {
            ResourceKind::DataSet => "AWS::QuickSight::DataSet",
            ResourceKind::DataSource => "AWS::QuickSight::DataSource",
            ResourceKind::Template => "AWS::QuickSight::Template",
        }
    }

    /// Attribute holding the resource's own ID
    pub fn id_attribute(self) -> &'static str {
        match self {
            ResourceKind::DataSet => "data_set_id",
            ResourceKind::DataSource => "data_source_id",
            ResourceKind::Template => "template_id",
        }
    }

    /// Separator between account and ID in the state identifier
    pub fn id_separator(self) -> char {
        match self {
            ResourceKind::DataSet => ',',
            ResourceKind::DataSource | ResourceKind::Template => '/',
        }
    }

    /// Resource segment of the ARN
    pub fn arn_segment(self) -> &'static str {
        match self {
            ResourceKind::DataSet => "dataset",
            ResourceKind::DataSource => "datasource",
            ResourceKind::Template => "template",
        }
    }

    pub fn from_resource_type(resource_type: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.resource_type() == resource_type)
    }

    pub fn schema(self) -> ResourceSchema {
        match self {
            ResourceKind::DataSet => schemas::data_set::schema(),
            ResourceKind::DataSource => schemas::data_source::schema(),
            ResourceKind::Template => schemas::template::schema(),
        }
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ResourceKind::DataSet => "data set",
            ResourceKind::DataSource => "data source",
            ResourceKind::Template => "template",
        };
        write!(f, "{}", name)
    }
}

// =============================================================================
// Resource Type Definitions
// =============================================================================

macro_rules! define_resource_type {
    ($name:ident, $kind:expr) => {
        pub struct $name;
        impl ResourceType for $name {
            fn name(&self) -> &'static str {
                $kind.resource_type()
            }
            fn schema(&self) -> ResourceSchema {
                $kind.schema()
            }
        }
    };
}

define_resource_type!(DataSetType, ResourceKind::DataSet);
define_resource_type!(DataSourceType, ResourceKind::DataSource);
define_resource_type!(TemplateType, ResourceKind::Template);

/// Returns all resource types supported by this provider
pub fn resource_types() -> Vec<Box<dyn ResourceType>> {
    vec![
        Box::new(DataSetType),
        Box::new(DataSourceType),
        Box::new(TemplateType),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resource_types_match_kinds() {
        let names: Vec<&str> = resource_types().iter().map(|t| t.name()).collect();
        assert_eq!(
            names,
            vec![
                "quicksight.data_set",
                "quicksight.data_source",
                "quicksight.template"
            ]
        );
        for kind in ResourceKind::ALL {
            assert_eq!(ResourceKind::from_resource_type(kind.resource_type()), Some(kind));
            assert_eq!(kind.schema().resource_type, kind.resource_type());
        }
        assert_eq!(ResourceKind::from_resource_type("quicksight.dashboard"), None);
    }
}
