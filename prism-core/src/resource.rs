//! Resource - Representing resources and their state

use std::collections::HashMap;

/// Unique identifier for a resource
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceId {
    /// Resource type (e.g., "quicksight.data_set")
    pub resource_type: String,
    /// Resource name (identifier chosen in the configuration file)
    pub name: String,
}

impl ResourceId {
    pub fn new(resource_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            name: name.into(),
        }
    }
}

impl std::fmt::Display for ResourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.resource_type, self.name)
    }
}

/// Attribute value of a resource
///
/// This is the user-facing attribute tree. Nested blocks are lists of maps,
/// the same way they appear in configuration files.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    String(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    List(Vec<Value>),
    Map(HashMap<String, Value>),
}

impl Value {
    pub fn string(s: impl Into<String>) -> Self {
        Value::String(s.into())
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Integers are accepted where floats are expected
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&HashMap<String, Value>> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Convert a JSON value into an attribute value. `null` has no attribute
    /// representation and yields `None`; nulls inside lists and maps are dropped.
    pub fn from_json(value: &serde_json::Value) -> Option<Value> {
        match value {
            serde_json::Value::Null => None,
            serde_json::Value::Bool(b) => Some(Value::Bool(*b)),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Some(Value::Int(i)),
                None => n.as_f64().map(Value::Float),
            },
            serde_json::Value::String(s) => Some(Value::String(s.clone())),
            serde_json::Value::Array(items) => {
                Some(Value::List(items.iter().filter_map(Value::from_json).collect()))
            }
            serde_json::Value::Object(map) => Some(Value::Map(
                map.iter()
                    .filter_map(|(k, v)| Value::from_json(v).map(|v| (k.clone(), v)))
                    .collect(),
            )),
        }
    }

    /// Convert an attribute value into JSON
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Int(i) => serde_json::Value::from(*i),
            Value::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::List(items) => {
                serde_json::Value::Array(items.iter().map(Value::to_json).collect())
            }
            Value::Map(map) => serde_json::Value::Object(
                map.iter().map(|(k, v)| (k.clone(), v.to_json())).collect(),
            ),
        }
    }
}

/// Convert a JSON object into an attribute map. Non-object input yields an empty map.
pub fn attributes_from_json(value: &serde_json::Value) -> HashMap<String, Value> {
    match Value::from_json(value) {
        Some(Value::Map(map)) => map,
        _ => HashMap::new(),
    }
}

/// Convert an attribute map into a JSON object
pub fn attributes_to_json(attributes: &HashMap<String, Value>) -> serde_json::Value {
    serde_json::Value::Object(
        attributes
            .iter()
            .map(|(k, v)| (k.clone(), v.to_json()))
            .collect(),
    )
}

/// Desired state declared in configuration
#[derive(Debug, Clone, PartialEq)]
pub struct Resource {
    pub id: ResourceId,
    pub attributes: HashMap<String, Value>,
}

impl Resource {
    pub fn new(resource_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: ResourceId::new(resource_type, name),
            attributes: HashMap::new(),
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: Value) -> Self {
        self.attributes.insert(key.into(), value);
        self
    }

    pub fn with_attributes(mut self, attributes: HashMap<String, Value>) -> Self {
        self.attributes.extend(attributes);
        self
    }
}

/// Current state fetched from actual infrastructure
#[derive(Debug, Clone, PartialEq)]
pub struct State {
    pub id: ResourceId,
    /// Provider-side identifier (e.g., "123456789012,sales-data-set")
    pub identifier: Option<String>,
    pub attributes: HashMap<String, Value>,
    /// Whether this state exists
    pub exists: bool,
}

impl State {
    pub fn not_found(id: ResourceId) -> Self {
        Self {
            id,
            identifier: None,
            attributes: HashMap::new(),
            exists: false,
        }
    }

    pub fn existing(id: ResourceId, attributes: HashMap<String, Value>) -> Self {
        Self {
            id,
            identifier: None,
            attributes,
            exists: true,
        }
    }

    pub fn with_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = Some(identifier.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn from_json_converts_nested_objects() {
        let value = Value::from_json(&json!({
            "name": "sales",
            "port": 5432,
            "ratio": 0.5,
            "columns": ["a", "b"],
            "ssl": {"disable_ssl": false},
            "ignored": null
        }))
        .unwrap();

        let map = value.as_map().unwrap();
        assert_eq!(map.get("name"), Some(&Value::string("sales")));
        assert_eq!(map.get("port"), Some(&Value::Int(5432)));
        assert_eq!(map.get("ratio"), Some(&Value::Float(0.5)));
        assert_eq!(
            map.get("columns"),
            Some(&Value::List(vec![Value::string("a"), Value::string("b")]))
        );
        assert!(!map.contains_key("ignored"));
    }

    #[test]
    fn to_json_preserves_structure() {
        let attrs = HashMap::from([
            ("name".to_string(), Value::string("sales")),
            ("enabled".to_string(), Value::Bool(true)),
        ]);
        let json = attributes_to_json(&attrs);
        assert_eq!(json, json!({"name": "sales", "enabled": true}));
        assert_eq!(attributes_from_json(&json), attrs);
    }

    #[test]
    fn as_float_accepts_integers() {
        assert_eq!(Value::Int(3).as_float(), Some(3.0));
        assert_eq!(Value::string("3").as_float(), None);
    }

    #[test]
    fn resource_id_display() {
        let id = ResourceId::new("quicksight.data_set", "sales");
        assert_eq!(id.to_string(), "quicksight.data_set.sales");
    }
}
