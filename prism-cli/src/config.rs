//! Configuration file loading
//!
//! A configuration file is a JSON document:
//!
//! ```json
//! {
//!   "provider": { "region": "us-east-1", "aws_account_id": "123456789012" },
//!   "backend": { "type": "local", "path": "prism.state.json" },
//!   "resources": [
//!     { "type": "quicksight.data_set", "name": "sales", "attributes": { ... } }
//!   ]
//! }
//! ```

use std::collections::{HashMap, HashSet};
use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::Deserialize;

use prism_core::resource::{Resource, attributes_from_json};
use prism_core::schema::ResourceSchema;
use prism_provider_quicksight::QuickSightConfig;
use prism_state::BackendConfig;

#[derive(Debug, Deserialize)]
struct RawConfig {
    #[serde(default)]
    provider: QuickSightConfig,
    #[serde(default)]
    backend: Option<serde_json::Value>,
    #[serde(default)]
    resources: Vec<RawResource>,
}

#[derive(Debug, Deserialize)]
struct RawResource {
    #[serde(rename = "type")]
    resource_type: String,
    name: String,
    #[serde(default)]
    attributes: serde_json::Value,
}

/// A loaded configuration file
#[derive(Debug)]
pub struct Config {
    pub provider: QuickSightConfig,
    pub backend: BackendConfig,
    pub resources: Vec<Resource>,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("Invalid configuration {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        let raw: RawConfig = serde_json::from_str(content)?;

        let backend = match &raw.backend {
            Some(value) => BackendConfig::from_json(value)?,
            None => BackendConfig::default(),
        };

        let mut seen = HashSet::new();
        let mut resources = Vec::with_capacity(raw.resources.len());
        for r in raw.resources {
            if !r.attributes.is_object() && !r.attributes.is_null() {
                bail!("{}.{}: attributes must be an object", r.resource_type, r.name);
            }
            let resource = Resource::new(&r.resource_type, &r.name)
                .with_attributes(attributes_from_json(&r.attributes));
            if !seen.insert(resource.id.clone()) {
                bail!("{} is declared more than once", resource.id);
            }
            resources.push(resource);
        }

        Ok(Self {
            provider: raw.provider,
            backend,
            resources,
        })
    }

    /// Validate every resource against its schema, collecting all errors
    pub fn validate(&self, schemas: &HashMap<String, ResourceSchema>) -> Result<()> {
        let mut all_errors = Vec::new();

        for resource in &self.resources {
            match schemas.get(&resource.id.resource_type) {
                Some(schema) => {
                    if let Err(errors) = schema.validate(&resource.attributes) {
                        for error in errors {
                            all_errors.push(format!("{}: {}", resource.id, error));
                        }
                    }
                }
                None => all_errors.push(format!(
                    "{}: unknown resource type '{}'",
                    resource.id, resource.id.resource_type
                )),
            }
        }

        if all_errors.is_empty() {
            Ok(())
        } else {
            bail!(all_errors.join("\n"))
        }
    }

    /// Resources in canonical form, ready for diffing
    pub fn normalized_resources(&self, schemas: &HashMap<String, ResourceSchema>) -> Vec<Resource> {
        self.resources
            .iter()
            .map(|resource| match schemas.get(&resource.id.resource_type) {
                Some(schema) => Resource {
                    id: resource.id.clone(),
                    attributes: schema.normalize(&resource.attributes),
                },
                None => resource.clone(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prism_core::resource::Value;
    use prism_provider_quicksight::schemas::schemas_by_type;

    const TEMPLATE_CONFIG: &str = r#"{
        "provider": {"region": "us-east-1", "aws_account_id": "123456789012"},
        "resources": [
            {
                "type": "quicksight.template",
                "name": "monthly",
                "attributes": {
                    "template_id": "monthly-report",
                    "name": "Monthly report",
                    "source_entity": [{
                        "source_template": [{
                            "arn": "arn:aws:quicksight:us-east-1:123456789012:template/base"
                        }]
                    }]
                }
            }
        ]
    }"#;

    #[test]
    fn parses_provider_backend_and_resources() {
        let config = Config::parse(TEMPLATE_CONFIG).unwrap();
        assert_eq!(config.provider.region.as_deref(), Some("us-east-1"));
        assert_eq!(config.backend, BackendConfig::default());
        assert_eq!(config.resources.len(), 1);

        let resource = &config.resources[0];
        assert_eq!(resource.id.to_string(), "quicksight.template.monthly");
        assert_eq!(
            resource.attributes.get("template_id"),
            Some(&Value::string("monthly-report"))
        );
    }

    #[test]
    fn valid_resources_pass_validation() {
        let config = Config::parse(TEMPLATE_CONFIG).unwrap();
        config.validate(&schemas_by_type()).unwrap();
    }

    #[test]
    fn reports_unknown_resource_types() {
        let config = Config::parse(
            r#"{"resources": [{"type": "quicksight.dashboard", "name": "d", "attributes": {}}]}"#,
        )
        .unwrap();
        let err = config.validate(&schemas_by_type()).unwrap_err();
        assert!(
            err.to_string()
                .contains("unknown resource type 'quicksight.dashboard'")
        );
    }

    #[test]
    fn reports_schema_errors_with_resource_prefix() {
        let config = Config::parse(
            r#"{"resources": [
                {"type": "quicksight.template", "name": "t", "attributes": {"name": "x"}}
            ]}"#,
        )
        .unwrap();
        let err = config.validate(&schemas_by_type()).unwrap_err();
        assert!(err.to_string().contains("quicksight.template.t: "));
    }

    #[test]
    fn rejects_duplicate_resources() {
        let err = Config::parse(
            r#"{"resources": [
                {"type": "quicksight.template", "name": "t"},
                {"type": "quicksight.template", "name": "t"}
            ]}"#,
        )
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "quicksight.template.t is declared more than once"
        );
    }

    #[test]
    fn reads_backend_block() {
        let config = Config::parse(
            r#"{"backend": {"type": "local", "path": "state/prism.json"}, "resources": []}"#,
        )
        .unwrap();
        assert_eq!(config.backend, BackendConfig::local("state/prism.json"));
    }

    #[test]
    fn load_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load(&dir.path().join("missing.json")).unwrap_err();
        assert!(err.to_string().starts_with("Failed to read"));
    }
}
