//! Typed QuickSight API model
//!
//! These structs mirror the CloudFormation/Cloud Control JSON shapes of the
//! QuickSight resources. Objects that hold exactly one of several members are
//! enums, serialised as the single populated member.

pub mod data_set;
pub mod data_source;
pub mod template;

use serde::{Deserialize, Serialize};

pub use data_set::DataSet;
pub use data_source::DataSource;
pub use template::Template;

/// Resource tag
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Tag {
    pub key: String,
    pub value: String,
}
