//! Schema - Define type schemas for resources
//!
//! Providers define schemas for each resource type, enabling validation of
//! configuration before anything is sent to the cloud API. Nested objects are
//! described with [`BlockSchema`] and appear in values as lists of maps.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use crate::resource::Value;

/// Validation function attached to a custom type
pub type Validator = Arc<dyn Fn(&Value) -> Result<(), String> + Send + Sync>;

/// Cross-attribute rule checked after per-attribute validation
pub type Constraint = fn(&HashMap<String, Value>) -> Result<(), String>;

/// Attribute type
#[derive(Clone)]
pub enum AttributeType {
    /// String
    String,
    /// Integer
    Int,
    /// Floating point number (integers are accepted)
    Float,
    /// Boolean
    Bool,
    /// Enum (list of allowed values)
    Enum(Vec<String>),
    /// Custom type (with validation function)
    Custom {
        name: String,
        base: Box<AttributeType>,
        validate: Validator,
    },
    /// Ordered list
    List(Box<AttributeType>),
    /// Unordered collection of distinct items, written as a list
    Set(Box<AttributeType>),
    /// Map with string keys
    Map(Box<AttributeType>),
    /// Nested object
    Block(Box<BlockSchema>),
}

impl AttributeType {
    /// Enum type from a list of string slices
    pub fn enumeration(variants: &[&str]) -> Self {
        AttributeType::Enum(variants.iter().map(|v| v.to_string()).collect())
    }

    /// List of nested blocks
    pub fn block_list(block: BlockSchema) -> Self {
        AttributeType::List(Box::new(AttributeType::Block(Box::new(block))))
    }

    /// Set of nested blocks
    pub fn block_set(block: BlockSchema) -> Self {
        AttributeType::Set(Box::new(AttributeType::Block(Box::new(block))))
    }

    /// Check if a value conforms to this type
    pub fn validate(&self, value: &Value) -> Result<(), TypeError> {
        match (self, value) {
            (AttributeType::String, Value::String(_)) => Ok(()),
            (AttributeType::Int, Value::Int(_)) => Ok(()),
            (AttributeType::Float, Value::Float(_) | Value::Int(_)) => Ok(()),
            (AttributeType::Bool, Value::Bool(_)) => Ok(()),

            (AttributeType::Enum(variants), Value::String(s)) => {
                if variants.iter().any(|v| v == s) {
                    Ok(())
                } else {
                    Err(TypeError::InvalidEnumVariant {
                        value: s.clone(),
                        expected: variants.clone(),
                    })
                }
            }

            (AttributeType::Custom { base, validate, .. }, v) => {
                base.validate(v)?;
                validate(v).map_err(|message| TypeError::ValidationFailed { message })
            }

            (AttributeType::List(inner), Value::List(items)) => {
                for (i, item) in items.iter().enumerate() {
                    inner.validate(item).map_err(|e| TypeError::ListItemError {
                        index: i,
                        inner: Box::new(e),
                    })?;
                }
                Ok(())
            }

            (AttributeType::Set(inner), Value::List(items)) => {
                for (i, item) in items.iter().enumerate() {
                    inner.validate(item).map_err(|e| TypeError::ListItemError {
                        index: i,
                        inner: Box::new(e),
                    })?;
                    if items[..i].contains(item) {
                        return Err(TypeError::DuplicateSetItem { index: i });
                    }
                }
                Ok(())
            }

            (AttributeType::Map(inner), Value::Map(map)) => {
                for (k, v) in map {
                    inner.validate(v).map_err(|e| TypeError::MapValueError {
                        key: k.clone(),
                        inner: Box::new(e),
                    })?;
                }
                Ok(())
            }

            (AttributeType::Block(block), Value::Map(map)) => {
                block.validate(map).map_err(TypeError::from_errors)
            }

            _ => Err(TypeError::TypeMismatch {
                expected: self.type_name(),
                got: value.type_name(),
            }),
        }
    }

    /// Canonical form of a value: set items sorted, nested blocks normalized.
    /// Values that do not match the type are returned unchanged.
    pub fn normalize(&self, value: &Value) -> Value {
        match (self, value) {
            (AttributeType::Custom { base, .. }, v) => base.normalize(v),
            (AttributeType::List(inner), Value::List(items)) => {
                Value::List(items.iter().map(|item| inner.normalize(item)).collect())
            }
            (AttributeType::Set(inner), Value::List(items)) => {
                let mut normalized: Vec<Value> =
                    items.iter().map(|item| inner.normalize(item)).collect();
                normalized.sort_by_cached_key(|item| item.to_json().to_string());
                Value::List(normalized)
            }
            (AttributeType::Map(inner), Value::Map(map)) => Value::Map(
                map.iter()
                    .map(|(k, v)| (k.clone(), inner.normalize(v)))
                    .collect(),
            ),
            (AttributeType::Block(block), Value::Map(map)) => Value::Map(block.normalize(map)),
            (_, v) => v.clone(),
        }
    }

    /// Number of items for collection types, `None` for scalars
    fn item_count(&self, value: &Value) -> Option<usize> {
        match (self, value) {
            (AttributeType::List(_) | AttributeType::Set(_), Value::List(items)) => {
                Some(items.len())
            }
            (AttributeType::Map(_), Value::Map(map)) => Some(map.len()),
            (AttributeType::Custom { base, .. }, v) => base.item_count(v),
            _ => None,
        }
    }

    fn type_name(&self) -> String {
        match self {
            AttributeType::String => "String".to_string(),
            AttributeType::Int => "Int".to_string(),
            AttributeType::Float => "Float".to_string(),
            AttributeType::Bool => "Bool".to_string(),
            AttributeType::Enum(variants) => format!("Enum({})", variants.join(" | ")),
            AttributeType::Custom { name, .. } => name.clone(),
            AttributeType::List(inner) => format!("List<{}>", inner.type_name()),
            AttributeType::Set(inner) => format!("Set<{}>", inner.type_name()),
            AttributeType::Map(inner) => format!("Map<{}>", inner.type_name()),
            AttributeType::Block(_) => "Block".to_string(),
        }
    }
}

impl fmt::Display for AttributeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.type_name())
    }
}

impl fmt::Debug for AttributeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AttributeType({})", self.type_name())
    }
}

/// Type error
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TypeError {
    #[error("Type mismatch: expected {expected}, got {got}")]
    TypeMismatch { expected: String, got: String },

    #[error("Invalid enum variant '{value}', expected one of: {}", expected.join(", "))]
    InvalidEnumVariant {
        value: String,
        expected: Vec<String>,
    },

    #[error("Validation failed: {message}")]
    ValidationFailed { message: String },

    #[error("Required attribute '{name}' is missing")]
    MissingRequired { name: String },

    #[error("Unknown attribute '{name}'")]
    UnknownAttribute { name: String },

    #[error("Attribute '{name}' is computed and cannot be set")]
    ReadOnlyAttribute { name: String },

    #[error("Attribute '{name}' needs at least {min} items, got {got}")]
    TooFewItems { name: String, min: usize, got: usize },

    #[error("Attribute '{name}' allows at most {max} items, got {got}")]
    TooManyItems { name: String, max: usize, got: usize },

    #[error("Attribute '{name}' conflicts with '{other}'")]
    ConflictingAttributes { name: String, other: String },

    #[error("Exactly one of {} must be set", names.join(", "))]
    ExactlyOneOf { names: Vec<String> },

    #[error("Duplicate set item at index {index}")]
    DuplicateSetItem { index: usize },

    #[error("List item at index {index}: {inner}")]
    ListItemError { index: usize, inner: Box<TypeError> },

    #[error("Map value for key '{key}': {inner}")]
    MapValueError { key: String, inner: Box<TypeError> },

    #[error("{name}: {inner}")]
    AttributeError { name: String, inner: Box<TypeError> },

    #[error("{}", errors.iter().map(|e| e.to_string()).collect::<Vec<_>>().join("; "))]
    Multiple { errors: Vec<TypeError> },
}

impl TypeError {
    fn from_errors(mut errors: Vec<TypeError>) -> Self {
        if errors.len() == 1 {
            errors.remove(0)
        } else {
            TypeError::Multiple { errors }
        }
    }
}

impl Value {
    fn type_name(&self) -> String {
        match self {
            Value::String(_) => "String".to_string(),
            Value::Int(_) => "Int".to_string(),
            Value::Float(_) => "Float".to_string(),
            Value::Bool(_) => "Bool".to_string(),
            Value::List(_) => "List".to_string(),
            Value::Map(_) => "Map".to_string(),
        }
    }
}

/// Attribute schema
#[derive(Debug, Clone)]
pub struct AttributeSchema {
    pub name: String,
    pub attr_type: AttributeType,
    pub required: bool,
    /// Set by the provider; users may supply it
    pub computed: bool,
    /// Set only by the provider
    pub read_only: bool,
    /// Changing the value requires replacing the resource
    pub force_new: bool,
    /// Sent to the API but never returned by it
    pub write_only: bool,
    pub description: Option<String>,
    pub min_items: Option<usize>,
    pub max_items: Option<usize>,
    /// Sibling attributes that must not be set together with this one
    pub conflicts_with: Vec<String>,
    /// Provider-side property name (e.g., "DataSetId" for AWS Cloud Control)
    pub provider_name: Option<String>,
}

impl AttributeSchema {
    pub fn new(name: impl Into<String>, attr_type: AttributeType) -> Self {
        Self {
            name: name.into(),
            attr_type,
            required: false,
            computed: false,
            read_only: false,
            force_new: false,
            write_only: false,
            description: None,
            min_items: None,
            max_items: None,
            conflicts_with: Vec::new(),
            provider_name: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn computed(mut self) -> Self {
        self.computed = true;
        self
    }

    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self.computed = true;
        self
    }

    pub fn force_new(mut self) -> Self {
        self.force_new = true;
        self
    }

    pub fn write_only(mut self) -> Self {
        self.write_only = true;
        self
    }

    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }

    pub fn min_items(mut self, min: usize) -> Self {
        self.min_items = Some(min);
        self
    }

    pub fn max_items(mut self, max: usize) -> Self {
        self.max_items = Some(max);
        self
    }

    pub fn conflicts_with(mut self, names: &[&str]) -> Self {
        self.conflicts_with = names.iter().map(|n| n.to_string()).collect();
        self
    }

    pub fn with_provider_name(mut self, name: impl Into<String>) -> Self {
        self.provider_name = Some(name.into());
        self
    }

    fn check_cardinality(&self, value: &Value, errors: &mut Vec<TypeError>) {
        let Some(count) = self.attr_type.item_count(value) else {
            return;
        };
        if let Some(min) = self.min_items
            && count < min
        {
            errors.push(TypeError::TooFewItems {
                name: self.name.clone(),
                min,
                got: count,
            });
        }
        if let Some(max) = self.max_items
            && count > max
        {
            errors.push(TypeError::TooManyItems {
                name: self.name.clone(),
                max,
                got: count,
            });
        }
    }
}

/// Schema of a nested object (or of a resource's top level)
#[derive(Debug, Clone, Default)]
pub struct BlockSchema {
    pub attributes: BTreeMap<String, AttributeSchema>,
    /// Groups of attributes of which exactly one must be set
    pub exactly_one_of: Vec<Vec<String>>,
}

impl BlockSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attribute(mut self, schema: AttributeSchema) -> Self {
        self.attributes.insert(schema.name.clone(), schema);
        self
    }

    pub fn exactly_one_of(mut self, names: &[&str]) -> Self {
        self.exactly_one_of
            .push(names.iter().map(|n| n.to_string()).collect());
        self
    }

    pub fn get(&self, name: &str) -> Option<&AttributeSchema> {
        self.attributes.get(name)
    }

    /// Validate the attributes of one object, collecting every error
    pub fn validate(&self, attributes: &HashMap<String, Value>) -> Result<(), Vec<TypeError>> {
        let mut errors = Vec::new();

        for (name, schema) in &self.attributes {
            if schema.required && !attributes.contains_key(name) {
                errors.push(TypeError::MissingRequired { name: name.clone() });
            }
        }

        let mut names: Vec<&String> = attributes.keys().collect();
        names.sort();

        for name in names {
            let value = &attributes[name];
            let Some(schema) = self.attributes.get(name) else {
                errors.push(TypeError::UnknownAttribute { name: name.clone() });
                continue;
            };

            if schema.read_only {
                errors.push(TypeError::ReadOnlyAttribute { name: name.clone() });
                continue;
            }

            if let Err(e) = schema.attr_type.validate(value) {
                errors.push(TypeError::AttributeError {
                    name: name.clone(),
                    inner: Box::new(e),
                });
            }

            schema.check_cardinality(value, &mut errors);

            for other in &schema.conflicts_with {
                if attributes.contains_key(other) {
                    errors.push(TypeError::ConflictingAttributes {
                        name: name.clone(),
                        other: other.clone(),
                    });
                }
            }
        }

        for group in &self.exactly_one_of {
            let present = group
                .iter()
                .filter(|name| attributes.contains_key(name.as_str()))
                .count();
            if present != 1 {
                errors.push(TypeError::ExactlyOneOf {
                    names: group.clone(),
                });
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Normalize every known attribute; unknown attributes are kept as they are
    pub fn normalize(&self, attributes: &HashMap<String, Value>) -> HashMap<String, Value> {
        attributes
            .iter()
            .map(|(name, value)| {
                let normalized = match self.attributes.get(name) {
                    Some(schema) => schema.attr_type.normalize(value),
                    None => value.clone(),
                };
                (name.clone(), normalized)
            })
            .collect()
    }
}

/// Resource schema
#[derive(Debug, Clone)]
pub struct ResourceSchema {
    pub resource_type: String,
    pub block: BlockSchema,
    pub description: Option<String>,
    pub constraints: Vec<Constraint>,
}

impl ResourceSchema {
    pub fn new(resource_type: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            block: BlockSchema::new(),
            description: None,
            constraints: Vec::new(),
        }
    }

    pub fn attribute(mut self, schema: AttributeSchema) -> Self {
        self.block = self.block.attribute(schema);
        self
    }

    pub fn exactly_one_of(mut self, names: &[&str]) -> Self {
        self.block = self.block.exactly_one_of(names);
        self
    }

    pub fn constraint(mut self, constraint: Constraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }

    pub fn attributes(&self) -> &BTreeMap<String, AttributeSchema> {
        &self.block.attributes
    }

    pub fn get(&self, name: &str) -> Option<&AttributeSchema> {
        self.block.get(name)
    }

    /// Names of attributes whose change forces replacement
    pub fn force_new_attributes(&self) -> HashSet<&str> {
        self.block
            .attributes
            .values()
            .filter(|a| a.force_new)
            .map(|a| a.name.as_str())
            .collect()
    }

    /// Names of attributes the API never returns
    pub fn write_only_attributes(&self) -> HashSet<&str> {
        self.block
            .attributes
            .values()
            .filter(|a| a.write_only)
            .map(|a| a.name.as_str())
            .collect()
    }

    /// Validate resource attributes
    pub fn validate(&self, attributes: &HashMap<String, Value>) -> Result<(), Vec<TypeError>> {
        let mut errors = match self.block.validate(attributes) {
            Ok(()) => Vec::new(),
            Err(errors) => errors,
        };

        for constraint in &self.constraints {
            if let Err(message) = constraint(attributes) {
                errors.push(TypeError::ValidationFailed { message });
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Canonical form of a resource's attributes
    pub fn normalize(&self, attributes: &HashMap<String, Value>) -> HashMap<String, Value> {
        self.block.normalize(attributes)
    }
}

/// Helper functions for common types
pub mod types {
    use once_cell::sync::Lazy;
    use regex::Regex;

    use super::*;

    static ARN_PATTERN: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"^arn:aws[\w-]*:[a-z0-9-]+:[a-z0-9-]*:(\d{12})?:.+$")
            .expect("ARN pattern is valid")
    });

    static ACCOUNT_ID_PATTERN: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"^\d{12}$").expect("account ID pattern is valid"));

    static ID_PATTERN: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"^[\w\-]+$").expect("ID pattern is valid"));

    fn custom(
        name: impl Into<String>,
        base: AttributeType,
        validate: impl Fn(&Value) -> Result<(), String> + Send + Sync + 'static,
    ) -> AttributeType {
        AttributeType::Custom {
            name: name.into(),
            base: Box::new(base),
            validate: Arc::new(validate),
        }
    }

    /// Positive integer type
    pub fn positive_int() -> AttributeType {
        int_at_least(1)
    }

    /// Integer type with a lower bound
    pub fn int_at_least(min: i64) -> AttributeType {
        custom(format!("Int(>={})", min), AttributeType::Int, move |value| {
            match value.as_int() {
                Some(n) if n >= min => Ok(()),
                Some(n) => Err(format!("Value {} must be at least {}", n, min)),
                None => Err("Expected integer".to_string()),
            }
        })
    }

    /// Integer type within an inclusive range
    pub fn int_between(min: i64, max: i64) -> AttributeType {
        custom(
            format!("Int({}..={})", min, max),
            AttributeType::Int,
            move |value| match value.as_int() {
                Some(n) if (min..=max).contains(&n) => Ok(()),
                Some(n) => Err(format!("Value {} must be between {} and {}", n, min, max)),
                None => Err("Expected integer".to_string()),
            },
        )
    }

    /// Float type within an inclusive range
    pub fn float_between(min: f64, max: f64) -> AttributeType {
        custom(
            format!("Float({}..={})", min, max),
            AttributeType::Float,
            move |value| match value.as_float() {
                Some(n) if n >= min && n <= max => Ok(()),
                Some(n) => Err(format!("Value {} must be between {} and {}", n, min, max)),
                None => Err("Expected number".to_string()),
            },
        )
    }

    /// String type with a length range (in characters)
    pub fn string_len_between(min: usize, max: usize) -> AttributeType {
        custom(
            format!("String({}..={})", min, max),
            AttributeType::String,
            move |value| {
                let Some(s) = value.as_str() else {
                    return Err("Expected string".to_string());
                };
                let len = s.chars().count();
                if len < min || len > max {
                    Err(format!(
                        "Length of '{}' must be between {} and {}, got {}",
                        s, min, max, len
                    ))
                } else {
                    Ok(())
                }
            },
        )
    }

    /// Non-empty string type
    pub fn non_empty_string() -> AttributeType {
        custom("NonEmptyString", AttributeType::String, |value| match value {
            Value::String(s) if !s.is_empty() => Ok(()),
            Value::String(_) => Err("Value must not be empty".to_string()),
            _ => Err("Expected string".to_string()),
        })
    }

    /// ARN type (e.g., "arn:aws:quicksight:us-east-1:123456789012:datasource/sales")
    pub fn arn() -> AttributeType {
        custom("Arn", AttributeType::String, |value| match value.as_str() {
            Some(s) => validate_arn(s),
            None => Err("Expected string".to_string()),
        })
    }

    /// AWS account ID type (12 digits)
    pub fn account_id() -> AttributeType {
        custom("AccountId", AttributeType::String, |value| match value.as_str() {
            Some(s) if ACCOUNT_ID_PATTERN.is_match(s) => Ok(()),
            Some(s) => Err(format!("Invalid account ID '{}': expected 12 digits", s)),
            None => Err("Expected string".to_string()),
        })
    }

    /// Identifier type: 1-512 characters of alphanumerics, hyphen and underscore
    pub fn id_string() -> AttributeType {
        custom("Id", AttributeType::String, |value| {
            let Some(s) = value.as_str() else {
                return Err("Expected string".to_string());
            };
            if s.is_empty() || s.chars().count() > 512 {
                return Err(format!("Invalid ID '{}': length must be 1-512", s));
            }
            if !ID_PATTERN.is_match(s) {
                return Err(format!(
                    "Invalid ID '{}': must contain only alphanumeric, hyphen, \
                     and underscore characters",
                    s
                ));
            }
            Ok(())
        })
    }

    /// Validate ARN format
    pub fn validate_arn(s: &str) -> Result<(), String> {
        if ARN_PATTERN.is_match(s) {
            Ok(())
        } else {
            Err(format!(
                "Invalid ARN '{}': expected arn:partition:service:region:account:resource",
                s
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(entries: Vec<(&str, Value)>) -> HashMap<String, Value> {
        entries
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect()
    }

    #[test]
    fn validate_string_type() {
        let t = AttributeType::String;
        assert!(t.validate(&Value::string("hello")).is_ok());
        assert!(t.validate(&Value::Int(42)).is_err());
    }

    #[test]
    fn validate_float_accepts_int() {
        let t = AttributeType::Float;
        assert!(t.validate(&Value::Float(1.5)).is_ok());
        assert!(t.validate(&Value::Int(2)).is_ok());
        assert!(t.validate(&Value::Bool(true)).is_err());
    }

    #[test]
    fn validate_enum_type() {
        let t = AttributeType::enumeration(&["SPICE", "DIRECT_QUERY"]);
        assert!(t.validate(&Value::string("SPICE")).is_ok());
        assert!(t.validate(&Value::string("spice")).is_err());
    }

    #[test]
    fn validate_set_rejects_duplicates() {
        let t = AttributeType::Set(Box::new(AttributeType::String));
        assert!(
            t.validate(&Value::List(vec![Value::string("a"), Value::string("b")]))
                .is_ok()
        );
        assert_eq!(
            t.validate(&Value::List(vec![Value::string("a"), Value::string("a")])),
            Err(TypeError::DuplicateSetItem { index: 1 })
        );
    }

    #[test]
    fn normalize_sorts_sets_only() {
        let set = AttributeType::Set(Box::new(AttributeType::String));
        let list = AttributeType::List(Box::new(AttributeType::String));
        let value = Value::List(vec![Value::string("b"), Value::string("a")]);

        assert_eq!(
            set.normalize(&value),
            Value::List(vec![Value::string("a"), Value::string("b")])
        );
        assert_eq!(list.normalize(&value), value);
    }

    #[test]
    fn validate_resource_schema() {
        let schema = ResourceSchema::new("resource")
            .attribute(AttributeSchema::new("name", AttributeType::String).required())
            .attribute(AttributeSchema::new("count", types::positive_int()))
            .attribute(AttributeSchema::new("enabled", AttributeType::Bool));

        let attrs = map(vec![
            ("name", Value::string("my-resource")),
            ("count", Value::Int(5)),
            ("enabled", Value::Bool(true)),
        ]);

        assert!(schema.validate(&attrs).is_ok());
    }

    #[test]
    fn missing_required_attribute() {
        let schema = ResourceSchema::new("data_set")
            .attribute(AttributeSchema::new("name", AttributeType::String).required());

        let result = schema.validate(&HashMap::new());
        assert_eq!(
            result,
            Err(vec![TypeError::MissingRequired {
                name: "name".to_string()
            }])
        );
    }

    #[test]
    fn unknown_and_read_only_attributes_are_rejected() {
        let schema = ResourceSchema::new("data_set")
            .attribute(AttributeSchema::new("arn", AttributeType::String).read_only());

        let errors = schema
            .validate(&map(vec![
                ("arn", Value::string("arn:aws:quicksight:::x")),
                ("bogus", Value::Bool(true)),
            ]))
            .unwrap_err();

        assert!(errors.contains(&TypeError::ReadOnlyAttribute {
            name: "arn".to_string()
        }));
        assert!(errors.contains(&TypeError::UnknownAttribute {
            name: "bogus".to_string()
        }));
    }

    #[test]
    fn nested_block_errors_carry_path() {
        let column = BlockSchema::new()
            .attribute(AttributeSchema::new("name", types::string_len_between(1, 4)).required());
        let schema = ResourceSchema::new("data_set").attribute(AttributeSchema::new(
            "columns",
            AttributeType::block_list(column),
        ));

        let attrs = map(vec![(
            "columns",
            Value::List(vec![Value::Map(map(vec![("name", Value::string("too-long"))]))]),
        )]);

        let errors = schema.validate(&attrs).unwrap_err();
        assert_eq!(errors.len(), 1);
        let message = errors[0].to_string();
        assert!(message.starts_with("columns: List item at index 0: name: Validation failed"));
    }

    #[test]
    fn cardinality_is_enforced() {
        let schema = ResourceSchema::new("data_set").attribute(
            AttributeSchema::new("items", AttributeType::List(Box::new(AttributeType::String)))
                .min_items(1)
                .max_items(2),
        );

        let empty = map(vec![("items", Value::List(vec![]))]);
        assert!(matches!(
            schema.validate(&empty).unwrap_err()[0],
            TypeError::TooFewItems { min: 1, got: 0, .. }
        ));

        let many = map(vec![(
            "items",
            Value::List(vec![
                Value::string("a"),
                Value::string("b"),
                Value::string("c"),
            ]),
        )]);
        assert!(matches!(
            schema.validate(&many).unwrap_err()[0],
            TypeError::TooManyItems { max: 2, got: 3, .. }
        ));
    }

    #[test]
    fn exactly_one_of_is_enforced() {
        let block = BlockSchema::new()
            .attribute(AttributeSchema::new("a", AttributeType::String))
            .attribute(AttributeSchema::new("b", AttributeType::String))
            .exactly_one_of(&["a", "b"]);

        assert!(block.validate(&map(vec![("a", Value::string("x"))])).is_ok());
        assert!(block.validate(&HashMap::new()).is_err());
        assert!(
            block
                .validate(&map(vec![("a", Value::string("x")), ("b", Value::string("y"))]))
                .is_err()
        );
    }

    #[test]
    fn conflicting_attributes_are_rejected() {
        let block = BlockSchema::new()
            .attribute(AttributeSchema::new("a", AttributeType::String).conflicts_with(&["b"]))
            .attribute(AttributeSchema::new("b", AttributeType::String));

        let errors = block
            .validate(&map(vec![("a", Value::string("x")), ("b", Value::string("y"))]))
            .unwrap_err();
        assert_eq!(
            errors,
            vec![TypeError::ConflictingAttributes {
                name: "a".to_string(),
                other: "b".to_string()
            }]
        );
    }

    #[test]
    fn constraints_run_after_attribute_checks() {
        let schema = ResourceSchema::new("data_set")
            .attribute(AttributeSchema::new("mode", AttributeType::String))
            .constraint(|attrs| match attrs.get("mode") {
                Some(Value::String(m)) if m == "bad" => Err("mode must not be bad".to_string()),
                _ => Ok(()),
            });

        assert!(schema.validate(&map(vec![("mode", Value::string("ok"))])).is_ok());
        assert_eq!(
            schema.validate(&map(vec![("mode", Value::string("bad"))])),
            Err(vec![TypeError::ValidationFailed {
                message: "mode must not be bad".to_string()
            }])
        );
    }

    #[test]
    fn force_new_attributes_are_listed() {
        let schema = ResourceSchema::new("data_set")
            .attribute(AttributeSchema::new("data_set_id", AttributeType::String).force_new())
            .attribute(AttributeSchema::new("name", AttributeType::String));

        let names = schema.force_new_attributes();
        assert!(names.contains("data_set_id"));
        assert!(!names.contains("name"));
    }

    #[test]
    fn validate_string_length() {
        let t = types::string_len_between(1, 3);
        assert!(t.validate(&Value::string("abc")).is_ok());
        assert!(t.validate(&Value::string("")).is_err());
        assert!(t.validate(&Value::string("abcd")).is_err());
        assert!(t.validate(&Value::Int(1)).is_err());
    }

    #[test]
    fn validate_int_ranges() {
        assert!(types::positive_int().validate(&Value::Int(1)).is_ok());
        assert!(types::positive_int().validate(&Value::Int(0)).is_err());
        assert!(types::int_between(0, 100).validate(&Value::Int(100)).is_ok());
        assert!(types::int_between(0, 100).validate(&Value::Int(101)).is_err());
        assert!(types::float_between(0.0, 100.0).validate(&Value::Float(50.5)).is_ok());
        assert!(types::float_between(0.0, 100.0).validate(&Value::Float(-0.1)).is_err());
    }

    #[test]
    fn validate_arn_type() {
        let t = types::arn();
        assert!(
            t.validate(&Value::string(
                "arn:aws:quicksight:us-east-1:123456789012:datasource/sales"
            ))
            .is_ok()
        );
        assert!(t.validate(&Value::string("not-an-arn")).is_err());
    }

    #[test]
    fn validate_account_and_id() {
        assert!(types::account_id().validate(&Value::string("123456789012")).is_ok());
        assert!(types::account_id().validate(&Value::string("1234")).is_err());
        assert!(types::id_string().validate(&Value::string("sales_2024-q1")).is_ok());
        assert!(types::id_string().validate(&Value::string("has space")).is_err());
        assert!(types::id_string().validate(&Value::string("")).is_err());
    }
}
