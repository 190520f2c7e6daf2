//! State file format

use std::collections::HashMap;

use prism_core::resource::{ResourceId, State, attributes_from_json, attributes_to_json};
use serde::{Deserialize, Serialize};

/// Current state file format version
pub const STATE_VERSION: u32 = 1;

/// The state document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateFile {
    /// State file format version
    pub version: u32,
    /// Incremented on every write
    pub serial: u64,
    /// Unique identifier for this state history
    pub lineage: String,
    /// Version of Prism that wrote this state
    pub prism_version: String,
    pub resources: Vec<ResourceState>,
}

impl StateFile {
    pub fn new() -> Self {
        Self {
            version: STATE_VERSION,
            serial: 0,
            lineage: uuid::Uuid::new_v4().to_string(),
            prism_version: env!("CARGO_PKG_VERSION").to_string(),
            resources: Vec::new(),
        }
    }

    pub fn with_lineage(lineage: impl Into<String>) -> Self {
        Self {
            lineage: lineage.into(),
            ..Self::new()
        }
    }

    /// Bump the serial and stamp the writing version
    pub fn increment_serial(&mut self) {
        self.serial += 1;
        self.prism_version = env!("CARGO_PKG_VERSION").to_string();
    }

    pub fn find_resource(&self, resource_type: &str, name: &str) -> Option<&ResourceState> {
        self.resources
            .iter()
            .find(|r| r.resource_type == resource_type && r.name == name)
    }

    /// Add or replace the entry for `resource`
    pub fn upsert_resource(&mut self, resource: ResourceState) {
        match self
            .resources
            .iter_mut()
            .find(|r| r.resource_type == resource.resource_type && r.name == resource.name)
        {
            Some(existing) => *existing = resource,
            None => self.resources.push(resource),
        }
    }

    pub fn remove_resource(&mut self, resource_type: &str, name: &str) -> Option<ResourceState> {
        let index = self
            .resources
            .iter()
            .position(|r| r.resource_type == resource_type && r.name == name)?;
        Some(self.resources.remove(index))
    }

    /// Recorded states keyed by resource, as input for planning
    pub fn current_states(&self) -> HashMap<ResourceId, State> {
        self.resources
            .iter()
            .map(|r| {
                let state = r.to_state();
                (state.id.clone(), state)
            })
            .collect()
    }
}

impl Default for StateFile {
    fn default() -> Self {
        Self::new()
    }
}

/// One managed resource
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceState {
    /// Resource type (e.g., "quicksight.data_set")
    pub resource_type: String,
    pub name: String,
    pub provider: String,
    /// Provider-side identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
    #[serde(default)]
    pub attributes: HashMap<String, serde_json::Value>,
}

impl ResourceState {
    pub fn new(
        resource_type: impl Into<String>,
        name: impl Into<String>,
        provider: impl Into<String>,
    ) -> Self {
        Self {
            resource_type: resource_type.into(),
            name: name.into(),
            provider: provider.into(),
            identifier: None,
            attributes: HashMap::new(),
        }
    }

    /// Record a state returned by the provider
    pub fn from_state(state: &State, provider: impl Into<String>) -> Self {
        let attributes = match attributes_to_json(&state.attributes) {
            serde_json::Value::Object(map) => map.into_iter().collect(),
            _ => HashMap::new(),
        };
        Self {
            resource_type: state.id.resource_type.clone(),
            name: state.id.name.clone(),
            provider: provider.into(),
            identifier: state.identifier.clone(),
            attributes,
        }
    }

    pub fn to_state(&self) -> State {
        let id = ResourceId::new(&self.resource_type, &self.name);
        let json = serde_json::Value::Object(
            self.attributes
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        );
        let state = State::existing(id, attributes_from_json(&json));
        match &self.identifier {
            Some(identifier) => state.with_identifier(identifier),
            None => state,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prism_core::resource::Value;

    fn sales_state() -> State {
        State::existing(
            ResourceId::new("quicksight.data_set", "sales"),
            HashMap::from([
                ("name".to_string(), Value::string("Sales")),
                ("import_mode".to_string(), Value::string("SPICE")),
                (
                    "permissions".to_string(),
                    Value::List(vec![Value::Map(HashMap::from([
                        (
                            "principal".to_string(),
                            Value::string(
                                "arn:aws:quicksight:us-east-1:123456789012:user/default/alice",
                            ),
                        ),
                        (
                            "actions".to_string(),
                            Value::List(vec![Value::string("quicksight:DescribeDataSet")]),
                        ),
                    ]))]),
                ),
            ]),
        )
        .with_identifier("123456789012,sales")
    }

    #[test]
    fn test_state_file_new() {
        let state = StateFile::new();
        assert_eq!(state.version, STATE_VERSION);
        assert_eq!(state.serial, 0);
        assert!(!state.lineage.is_empty());
        assert!(state.resources.is_empty());
    }

    #[test]
    fn test_increment_serial() {
        let mut state = StateFile::with_lineage("fixed");
        state.increment_serial();
        state.increment_serial();
        assert_eq!(state.serial, 2);
        assert_eq!(state.lineage, "fixed");
    }

    #[test]
    fn test_upsert_and_remove_resource() {
        let mut state = StateFile::new();
        state.upsert_resource(ResourceState::new("quicksight.data_set", "sales", "quicksight"));

        let mut updated = ResourceState::new("quicksight.data_set", "sales", "quicksight");
        updated.identifier = Some("123456789012,sales".to_string());
        state.upsert_resource(updated);

        assert_eq!(state.resources.len(), 1);
        assert_eq!(
            state
                .find_resource("quicksight.data_set", "sales")
                .and_then(|r| r.identifier.as_deref()),
            Some("123456789012,sales")
        );

        assert!(state.remove_resource("quicksight.data_set", "sales").is_some());
        assert!(state.remove_resource("quicksight.data_set", "sales").is_none());
        assert!(state.resources.is_empty());
    }

    #[test]
    fn test_resource_state_preserves_provider_state() {
        let original = sales_state();
        let recorded = ResourceState::from_state(&original, "quicksight");
        assert_eq!(recorded.identifier.as_deref(), Some("123456789012,sales"));
        assert_eq!(recorded.attributes["import_mode"], serde_json::json!("SPICE"));

        assert_eq!(recorded.to_state(), original);
    }

    #[test]
    fn test_current_states() {
        let mut file = StateFile::new();
        file.upsert_resource(ResourceState::from_state(&sales_state(), "quicksight"));

        let states = file.current_states();
        let id = ResourceId::new("quicksight.data_set", "sales");
        assert!(states[&id].exists);
        assert_eq!(states[&id].identifier.as_deref(), Some("123456789012,sales"));
    }

    #[test]
    fn test_state_file_serialization() {
        let mut file = StateFile::with_lineage("lineage-1");
        file.upsert_resource(ResourceState::from_state(&sales_state(), "quicksight"));

        let json = serde_json::to_string_pretty(&file).unwrap();
        let parsed: StateFile = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, file);
    }
}
