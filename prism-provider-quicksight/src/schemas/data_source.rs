//! Schema for `quicksight.data_source` (AWS::QuickSight::DataSource)

use once_cell::sync::Lazy;
use prism_core::schema::{AttributeSchema, AttributeType, BlockSchema, ResourceSchema, types};

use super::fragments::{self, single_block};
use crate::resources::ResourceKind;

/// Parameter block names and the data source type each one implies
pub const PARAMETER_TYPES: &[(&str, &str)] = &[
    ("amazon_elasticsearch", "AMAZON_ELASTICSEARCH"),
    ("athena", "ATHENA"),
    ("aurora", "AURORA"),
    ("aurora_postgresql", "AURORA_POSTGRESQL"),
    ("aws_iot_analytics", "AWS_IOT_ANALYTICS"),
    ("jira", "JIRA"),
    ("maria_db", "MARIADB"),
    ("mysql", "MYSQL"),
    ("postgresql", "POSTGRESQL"),
    ("presto", "PRESTO"),
    ("redshift", "REDSHIFT"),
    ("s3", "S3"),
    ("service_now", "SERVICENOW"),
    ("snowflake", "SNOWFLAKE"),
    ("spark", "SPARK"),
    ("sql_server", "SQLSERVER"),
    ("teradata", "TERADATA"),
    ("twitter", "TWITTER"),
];

fn required_string(name: &str) -> AttributeSchema {
    AttributeSchema::new(name, types::non_empty_string()).required()
}

fn port() -> AttributeSchema {
    AttributeSchema::new("port", types::positive_int()).required()
}

/// database + host + port, shared by most relational engines
fn database_host_port() -> BlockSchema {
    BlockSchema::new()
        .attribute(required_string("database"))
        .attribute(required_string("host"))
        .attribute(port())
}

fn parameters() -> AttributeSchema {
    let site = || BlockSchema::new().attribute(required_string("site_base_url"));

    let manifest_file_location = BlockSchema::new()
        .attribute(required_string("bucket"))
        .attribute(required_string("key"));

    let block = BlockSchema::new()
        .attribute(single_block(
            "amazon_elasticsearch",
            BlockSchema::new().attribute(required_string("domain")),
        ))
        .attribute(single_block(
            "athena",
            BlockSchema::new()
                .attribute(AttributeSchema::new("work_group", types::non_empty_string())),
        ))
        .attribute(single_block("aurora", database_host_port()))
        .attribute(single_block("aurora_postgresql", database_host_port()))
        .attribute(single_block(
            "aws_iot_analytics",
            BlockSchema::new().attribute(required_string("data_set_name")),
        ))
        .attribute(single_block("jira", site()))
        .attribute(single_block("maria_db", database_host_port()))
        .attribute(single_block("mysql", database_host_port()))
        .attribute(single_block("postgresql", database_host_port()))
        .attribute(single_block(
            "presto",
            BlockSchema::new()
                .attribute(AttributeSchema::new("catalog", AttributeType::String).required())
                .attribute(required_string("host"))
                .attribute(port()),
        ))
        .attribute(single_block(
            "redshift",
            BlockSchema::new()
                .attribute(AttributeSchema::new("cluster_id", types::non_empty_string()))
                .attribute(required_string("database"))
                .attribute(AttributeSchema::new("host", AttributeType::String))
                .attribute(AttributeSchema::new("port", AttributeType::Int)),
        ))
        .attribute(single_block(
            "s3",
            BlockSchema::new().attribute(
                single_block("manifest_file_location", manifest_file_location).required(),
            ),
        ))
        .attribute(single_block("service_now", site()))
        .attribute(single_block(
            "snowflake",
            BlockSchema::new()
                .attribute(required_string("database"))
                .attribute(required_string("host"))
                .attribute(AttributeSchema::new("warehouse", AttributeType::String).required()),
        ))
        .attribute(single_block(
            "spark",
            BlockSchema::new()
                .attribute(AttributeSchema::new("host", AttributeType::String).required())
                .attribute(port()),
        ))
        .attribute(single_block("sql_server", database_host_port()))
        .attribute(single_block("teradata", database_host_port()))
        .attribute(single_block(
            "twitter",
            BlockSchema::new()
                .attribute(AttributeSchema::new("max_rows", types::positive_int()).required())
                .attribute(required_string("query")),
        ))
        .exactly_one_of(&PARAMETER_TYPES.iter().map(|(name, _)| *name).collect::<Vec<_>>());

    single_block("parameters", block)
        .required()
        .with_provider_name("DataSourceParameters")
}

fn credentials() -> AttributeSchema {
    let credential_pair = BlockSchema::new()
        .attribute(required_string("password"))
        .attribute(required_string("username"));

    single_block(
        "credentials",
        BlockSchema::new()
            .attribute(single_block("credential_pair", credential_pair))
            .attribute(AttributeSchema::new("copy_source_arn", types::arn()))
            .exactly_one_of(&["credential_pair", "copy_source_arn"]),
    )
    .write_only()
    .with_provider_name("Credentials")
}

static SCHEMA: Lazy<ResourceSchema> = Lazy::new(|| {
    ResourceSchema::new(ResourceKind::DataSource.resource_type())
        .with_description("A QuickSight data source: connection details for an external store")
        .attribute(fragments::arn())
        .attribute(fragments::aws_account_id())
        .attribute(credentials())
        .attribute(fragments::id("data_source_id", "DataSourceId"))
        .attribute(required_string("name").with_provider_name("Name"))
        .attribute(parameters())
        .attribute(fragments::permissions())
        .attribute(
            single_block(
                "ssl_properties",
                BlockSchema::new()
                    .attribute(AttributeSchema::new("disable_ssl", AttributeType::Bool)),
            )
            .with_provider_name("SslProperties"),
        )
        .attribute(fragments::tags())
        .attribute(
            AttributeSchema::new("type", AttributeType::String)
                .read_only()
                .with_provider_name("Type")
                .with_description("Inferred from the populated parameters block"),
        )
        .attribute(
            single_block(
                "vpc_connection_properties",
                BlockSchema::new().attribute(fragments::arn_string("vpc_connection_arn")),
            )
            .with_provider_name("VpcConnectionProperties"),
        )
});

pub fn schema() -> ResourceSchema {
    SCHEMA.clone()
}

/// Data source type implied by a parameter block name
pub fn type_for_parameter(name: &str) -> Option<&'static str> {
    PARAMETER_TYPES
        .iter()
        .find(|(param, _)| *param == name)
        .map(|(_, data_source_type)| *data_source_type)
}

/// Parameter block name for a data source type
pub fn parameter_for_type(data_source_type: &str) -> Option<&'static str> {
    PARAMETER_TYPES
        .iter()
        .find(|(_, t)| *t == data_source_type)
        .map(|(param, _)| *param)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use prism_core::resource::Value;

    use super::*;

    fn block(entries: Vec<(&str, Value)>) -> Value {
        Value::List(vec![Value::Map(
            entries
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
        )])
    }

    fn attrs(parameters: Value) -> HashMap<String, Value> {
        HashMap::from([
            ("data_source_id".to_string(), Value::string("warehouse")),
            ("name".to_string(), Value::string("Warehouse")),
            ("parameters".to_string(), parameters),
        ])
    }

    #[test]
    fn single_parameter_variant_is_valid() {
        let params = block(vec![(
            "postgresql",
            block(vec![
                ("database", Value::string("analytics")),
                ("host", Value::string("db.internal")),
                ("port", Value::Int(5432)),
            ]),
        )]);
        assert_eq!(schema().validate(&attrs(params)), Ok(()));
    }

    #[test]
    fn two_parameter_variants_are_rejected() {
        let params = block(vec![
            ("athena", block(vec![])),
            ("jira", block(vec![("site_base_url", Value::string("https://x"))])),
        ]);
        assert!(schema().validate(&attrs(params)).is_err());
    }

    #[test]
    fn port_must_be_positive() {
        let params = block(vec![(
            "mysql",
            block(vec![
                ("database", Value::string("shop")),
                ("host", Value::string("db")),
                ("port", Value::Int(0)),
            ]),
        )]);
        assert!(schema().validate(&attrs(params)).is_err());
    }

    #[test]
    fn every_parameter_block_maps_to_a_type() {
        assert_eq!(PARAMETER_TYPES.len(), 18);
        let schema = schema();
        let AttributeType::List(inner) = &schema.get("parameters").unwrap().attr_type else {
            panic!("parameters should be a block list");
        };
        let AttributeType::Block(block) = inner.as_ref() else {
            panic!("parameters should hold a block");
        };
        for (name, data_source_type) in PARAMETER_TYPES {
            assert!(block.get(name).is_some(), "missing block {name}");
            assert_eq!(type_for_parameter(name), Some(*data_source_type));
            assert_eq!(parameter_for_type(data_source_type), Some(*name));
        }
    }

    #[test]
    fn credentials_are_write_only() {
        assert!(schema().write_only_attributes().contains("credentials"));
    }
}
