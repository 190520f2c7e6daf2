//! Expand / flatten between attribute trees and the typed API model
//!
//! Expanding walks a `Value` attribute map and builds the typed structs sent to
//! the cloud API, reporting the dotted attribute path of the first problem.
//! Flattening goes the other way for values read back from the API: absent
//! optional fields produce absent attributes and single nested objects become
//! one-element block lists.

pub mod data_set;
pub mod data_source;
pub mod template;

use std::collections::HashMap;

use prism_core::permission::{Permission, PermissionError, PermissionSet};
use prism_core::resource::Value;

use crate::types::Tag;

pub use data_set::{expand_data_set, flatten_data_set};
pub use data_source::{expand_data_source, flatten_data_source};
pub use template::{expand_template, flatten_template};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ExpandError {
    #[error("{path}: required attribute is missing")]
    Missing { path: String },

    #[error("{path}: expected {expected}")]
    WrongType { path: String, expected: &'static str },

    #[error("{path}: one of [{}] must be set", .variants.join(", "))]
    NoVariant { path: String, variants: Vec<String> },

    #[error("{path}: only one of [{}] may be set", .variants.join(", "))]
    MultipleVariants { path: String, variants: Vec<String> },

    #[error("{path}: {source}")]
    Permissions {
        path: String,
        source: PermissionError,
    },
}

fn join_path(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", parent, name)
    }
}

/// Path-aware reader over one level of an attribute tree
#[derive(Debug, Clone)]
pub struct AttrReader<'a> {
    path: String,
    attrs: &'a HashMap<String, Value>,
}

impl<'a> AttrReader<'a> {
    pub fn root(attrs: &'a HashMap<String, Value>) -> Self {
        Self {
            path: String::new(),
            attrs,
        }
    }

    fn at(path: String, value: &'a Value) -> Result<Self, ExpandError> {
        match value {
            Value::Map(attrs) => Ok(Self { path, attrs }),
            _ => Err(ExpandError::WrongType {
                path,
                expected: "block",
            }),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn path_of(&self, name: &str) -> String {
        join_path(&self.path, name)
    }

    pub fn get(&self, name: &str) -> Option<&'a Value> {
        self.attrs.get(name)
    }

    pub fn has(&self, name: &str) -> bool {
        self.attrs.contains_key(name)
    }

    fn required(&self, name: &str) -> Result<&'a Value, ExpandError> {
        self.get(name).ok_or_else(|| ExpandError::Missing {
            path: self.path_of(name),
        })
    }

    fn wrong(&self, name: &str, expected: &'static str) -> ExpandError {
        ExpandError::WrongType {
            path: self.path_of(name),
            expected,
        }
    }

    pub fn string(&self, name: &str) -> Result<String, ExpandError> {
        self.required(name)?
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| self.wrong(name, "string"))
    }

    pub fn opt_string(&self, name: &str) -> Result<Option<String>, ExpandError> {
        match self.get(name) {
            None => Ok(None),
            Some(_) => self.string(name).map(Some),
        }
    }

    pub fn int(&self, name: &str) -> Result<i64, ExpandError> {
        self.required(name)?
            .as_int()
            .ok_or_else(|| self.wrong(name, "integer"))
    }

    pub fn opt_int(&self, name: &str) -> Result<Option<i64>, ExpandError> {
        match self.get(name) {
            None => Ok(None),
            Some(_) => self.int(name).map(Some),
        }
    }

    pub fn opt_bool(&self, name: &str) -> Result<Option<bool>, ExpandError> {
        match self.get(name) {
            None => Ok(None),
            Some(value) => value
                .as_bool()
                .map(Some)
                .ok_or_else(|| self.wrong(name, "bool")),
        }
    }

    pub fn strings(&self, name: &str) -> Result<Vec<String>, ExpandError> {
        let items = self
            .required(name)?
            .as_list()
            .ok_or_else(|| self.wrong(name, "list of strings"))?;
        items
            .iter()
            .enumerate()
            .map(|(index, item)| {
                item.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| ExpandError::WrongType {
                        path: format!("{}.{}", self.path_of(name), index),
                        expected: "string",
                    })
            })
            .collect()
    }

    pub fn opt_strings(&self, name: &str) -> Result<Option<Vec<String>>, ExpandError> {
        match self.get(name) {
            None => Ok(None),
            Some(_) => self.strings(name).map(Some),
        }
    }

    /// Every item of a block list or block set; absent means none
    pub fn blocks(&self, name: &str) -> Result<Vec<AttrReader<'a>>, ExpandError> {
        let Some(value) = self.get(name) else {
            return Ok(Vec::new());
        };
        let items = value
            .as_list()
            .ok_or_else(|| self.wrong(name, "list of blocks"))?;
        items
            .iter()
            .enumerate()
            .map(|(index, item)| Self::at(format!("{}.{}", self.path_of(name), index), item))
            .collect()
    }

    /// A single nested block; a one-element list or a bare map
    pub fn opt_block(&self, name: &str) -> Result<Option<AttrReader<'a>>, ExpandError> {
        match self.get(name) {
            None => Ok(None),
            Some(value @ Value::Map(_)) => Self::at(self.path_of(name), value).map(Some),
            Some(Value::List(items)) => match items.as_slice() {
                [] => Ok(None),
                [item] => Self::at(format!("{}.0", self.path_of(name)), item).map(Some),
                _ => Err(self.wrong(name, "a single block")),
            },
            Some(_) => Err(self.wrong(name, "block")),
        }
    }

    pub fn block(&self, name: &str) -> Result<AttrReader<'a>, ExpandError> {
        self.opt_block(name)?.ok_or_else(|| ExpandError::Missing {
            path: self.path_of(name),
        })
    }

    /// Name of the single member of `variants` that is set
    pub fn one_of(&self, variants: &[&'static str]) -> Result<&'static str, ExpandError> {
        let set: Vec<&'static str> = variants
            .iter()
            .copied()
            .filter(|variant| self.has(variant))
            .collect();
        match set.as_slice() {
            [variant] => Ok(*variant),
            [] => Err(ExpandError::NoVariant {
                path: self.path.clone(),
                variants: variants.iter().map(|v| v.to_string()).collect(),
            }),
            _ => Err(ExpandError::MultipleVariants {
                path: self.path.clone(),
                variants: set.iter().map(|v| v.to_string()).collect(),
            }),
        }
    }
}

/// Builds an attribute map while flattening
#[derive(Debug, Clone, Default)]
pub struct AttrBuilder {
    attrs: HashMap<String, Value>,
}

impl AttrBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn value(mut self, name: &str, value: Value) -> Self {
        self.attrs.insert(name.to_string(), value);
        self
    }

    pub fn opt_value(self, name: &str, value: Option<Value>) -> Self {
        match value {
            Some(value) => self.value(name, value),
            None => self,
        }
    }

    pub fn string(self, name: &str, value: impl Into<String>) -> Self {
        self.value(name, Value::String(value.into()))
    }

    pub fn opt_string(self, name: &str, value: Option<&String>) -> Self {
        self.opt_value(name, value.map(Value::string))
    }

    pub fn int(self, name: &str, value: i64) -> Self {
        self.value(name, Value::Int(value))
    }

    pub fn opt_int(self, name: &str, value: Option<i64>) -> Self {
        self.opt_value(name, value.map(Value::Int))
    }

    pub fn opt_bool(self, name: &str, value: Option<bool>) -> Self {
        self.opt_value(name, value.map(Value::Bool))
    }

    pub fn strings(self, name: &str, values: &[String]) -> Self {
        self.value(name, Value::List(values.iter().map(Value::string).collect()))
    }

    pub fn opt_strings(self, name: &str, values: Option<&Vec<String>>) -> Self {
        match values {
            Some(values) => self.strings(name, values),
            None => self,
        }
    }

    pub fn block(self, name: &str, block: AttrBuilder) -> Self {
        self.value(name, Value::List(vec![block.into_value()]))
    }

    pub fn opt_block(self, name: &str, block: Option<AttrBuilder>) -> Self {
        match block {
            Some(block) => self.block(name, block),
            None => self,
        }
    }

    pub fn blocks(self, name: &str, blocks: impl IntoIterator<Item = AttrBuilder>) -> Self {
        self.value(
            name,
            Value::List(blocks.into_iter().map(AttrBuilder::into_value).collect()),
        )
    }

    pub fn into_value(self) -> Value {
        Value::Map(self.attrs)
    }

    pub fn build(self) -> HashMap<String, Value> {
        self.attrs
    }
}

/// Read the `permissions` attribute into a validated set
pub fn expand_permissions(value: &Value) -> Result<PermissionSet, ExpandError> {
    PermissionSet::from_value(value).map_err(|source| ExpandError::Permissions {
        path: prism_core::permission::PERMISSIONS_ATTRIBUTE.to_string(),
        source,
    })
}

/// Attribute form of API permissions, sorted by principal
pub fn flatten_permissions(permissions: &[Permission]) -> Value {
    let mut sorted = permissions.to_vec();
    sorted.sort_by(|a, b| a.principal.cmp(&b.principal));
    Value::List(
        sorted
            .iter()
            .map(|p| {
                AttrBuilder::new()
                    .string("principal", p.principal.clone())
                    .value(
                        "actions",
                        Value::List(p.actions.iter().map(Value::string).collect()),
                    )
                    .into_value()
            })
            .collect(),
    )
}

/// Optional `permissions` attribute of a resource as API permissions
pub(crate) fn expand_optional_permissions(
    reader: &AttrReader<'_>,
) -> Result<Option<Vec<Permission>>, ExpandError> {
    reader
        .get(prism_core::permission::PERMISSIONS_ATTRIBUTE)
        .map(|value| expand_permissions(value).map(PermissionSet::into_vec))
        .transpose()
}

/// `tags` map to the CloudFormation tag list, ordered by key
pub fn expand_tags(reader: &AttrReader<'_>) -> Result<Option<Vec<Tag>>, ExpandError> {
    let Some(value) = reader.get("tags") else {
        return Ok(None);
    };
    let map = value.as_map().ok_or_else(|| ExpandError::WrongType {
        path: reader.path_of("tags"),
        expected: "map of strings",
    })?;
    let mut tags = map
        .iter()
        .map(|(key, value)| {
            value
                .as_str()
                .map(|v| Tag {
                    key: key.clone(),
                    value: v.to_string(),
                })
                .ok_or_else(|| ExpandError::WrongType {
                    path: format!("{}.{}", reader.path_of("tags"), key),
                    expected: "string",
                })
        })
        .collect::<Result<Vec<_>, _>>()?;
    tags.sort_by(|a, b| a.key.cmp(&b.key));
    Ok(Some(tags))
}

pub fn flatten_tags(tags: &[Tag]) -> Value {
    Value::Map(
        tags.iter()
            .map(|tag| (tag.key.clone(), Value::string(&tag.value)))
            .collect(),
    )
}
