//! Data source expand / flatten
//!
//! The API `Type` is never configured: it follows from whichever parameter
//! block is populated.

use std::collections::HashMap;

use prism_core::permission::PERMISSIONS_ATTRIBUTE;
use prism_core::resource::Value;

use super::{
    AttrBuilder, AttrReader, ExpandError, expand_optional_permissions, expand_tags,
    flatten_permissions, flatten_tags,
};
use crate::schemas::data_source::PARAMETER_TYPES;
use crate::types::data_source::*;

pub fn expand_data_source(attrs: &HashMap<String, Value>) -> Result<DataSource, ExpandError> {
    let r = AttrReader::root(attrs);
    let parameters = expand_parameters(&r.block("parameters")?)?;

    Ok(DataSource {
        aws_account_id: r.opt_string("aws_account_id")?,
        data_source_id: r.string("data_source_id")?,
        name: r.string("name")?,
        data_source_type: parameters.data_source_type().to_string(),
        data_source_parameters: parameters,
        credentials: r
            .opt_block("credentials")?
            .map(|c| expand_credentials(&c))
            .transpose()?,
        ssl_properties: r
            .opt_block("ssl_properties")?
            .map(|b| {
                Ok::<_, ExpandError>(SslProperties {
                    disable_ssl: b.opt_bool("disable_ssl")?,
                })
            })
            .transpose()?,
        vpc_connection_properties: r
            .opt_block("vpc_connection_properties")?
            .map(|b| {
                Ok::<_, ExpandError>(VpcConnectionProperties {
                    vpc_connection_arn: b.string("vpc_connection_arn")?,
                })
            })
            .transpose()?,
        permissions: expand_optional_permissions(&r)?,
        tags: expand_tags(&r)?,
        arn: None,
    })
}

fn database(b: &AttrReader<'_>) -> Result<DatabaseParameters, ExpandError> {
    Ok(DatabaseParameters {
        database: b.string("database")?,
        host: b.string("host")?,
        port: b.int("port")?,
    })
}

fn site(b: &AttrReader<'_>) -> Result<SiteParameters, ExpandError> {
    Ok(SiteParameters {
        site_base_url: b.string("site_base_url")?,
    })
}

fn expand_parameters(r: &AttrReader<'_>) -> Result<DataSourceParameters, ExpandError> {
    let variants: Vec<&'static str> = PARAMETER_TYPES.iter().map(|(name, _)| *name).collect();
    let name = r.one_of(&variants)?;
    let b = r.block(name)?;

    let parameters = match name {
        "amazon_elasticsearch" => {
            DataSourceParameters::AmazonElasticsearchParameters(AmazonElasticsearchParameters {
                domain: b.string("domain")?,
            })
        }
        "athena" => DataSourceParameters::AthenaParameters(AthenaParameters {
            work_group: b.opt_string("work_group")?,
        }),
        "aurora" => DataSourceParameters::AuroraParameters(database(&b)?),
        "aurora_postgresql" => DataSourceParameters::AuroraPostgreSqlParameters(database(&b)?),
        "aws_iot_analytics" => {
            DataSourceParameters::AwsIotAnalyticsParameters(AwsIotAnalyticsParameters {
                data_set_name: b.string("data_set_name")?,
            })
        }
        "jira" => DataSourceParameters::JiraParameters(site(&b)?),
        "maria_db" => DataSourceParameters::MariaDbParameters(database(&b)?),
        "mysql" => DataSourceParameters::MySqlParameters(database(&b)?),
        "postgresql" => DataSourceParameters::PostgreSqlParameters(database(&b)?),
        "presto" => DataSourceParameters::PrestoParameters(PrestoParameters {
            catalog: b.string("catalog")?,
            host: b.string("host")?,
            port: b.int("port")?,
        }),
        "redshift" => DataSourceParameters::RedshiftParameters(RedshiftParameters {
            cluster_id: b.opt_string("cluster_id")?,
            database: b.string("database")?,
            host: b.opt_string("host")?,
            port: b.opt_int("port")?,
        }),
        "s3" => {
            let location = b.block("manifest_file_location")?;
            DataSourceParameters::S3Parameters(S3Parameters {
                manifest_file_location: ManifestFileLocation {
                    bucket: location.string("bucket")?,
                    key: location.string("key")?,
                },
            })
        }
        "service_now" => DataSourceParameters::ServiceNowParameters(site(&b)?),
        "snowflake" => DataSourceParameters::SnowflakeParameters(SnowflakeParameters {
            database: b.string("database")?,
            host: b.string("host")?,
            warehouse: b.string("warehouse")?,
        }),
        "spark" => DataSourceParameters::SparkParameters(SparkParameters {
            host: b.string("host")?,
            port: b.int("port")?,
        }),
        "sql_server" => DataSourceParameters::SqlServerParameters(database(&b)?),
        "teradata" => DataSourceParameters::TeradataParameters(database(&b)?),
        _ => DataSourceParameters::TwitterParameters(TwitterParameters {
            max_rows: b.int("max_rows")?,
            query: b.string("query")?,
        }),
    };
    Ok(parameters)
}

fn expand_credentials(r: &AttrReader<'_>) -> Result<DataSourceCredentials, ExpandError> {
    match r.one_of(&["credential_pair", "copy_source_arn"])? {
        "copy_source_arn" => Ok(DataSourceCredentials::CopySourceArn(
            r.string("copy_source_arn")?,
        )),
        _ => {
            let pair = r.block("credential_pair")?;
            Ok(DataSourceCredentials::CredentialPair(CredentialPair {
                username: pair.string("username")?,
                password: pair.string("password")?,
            }))
        }
    }
}

/// Attribute map for a data source read back from the API
///
/// Credentials are never returned by reads, so they only appear when the
/// struct being flattened still carries them.
pub fn flatten_data_source(data_source: &DataSource) -> HashMap<String, Value> {
    AttrBuilder::new()
        .opt_string("arn", data_source.arn.as_ref())
        .opt_string("aws_account_id", data_source.aws_account_id.as_ref())
        .string("data_source_id", data_source.data_source_id.clone())
        .string("name", data_source.name.clone())
        .string("type", data_source.data_source_type.clone())
        .block(
            "parameters",
            flatten_parameters(&data_source.data_source_parameters),
        )
        .opt_block(
            "credentials",
            data_source.credentials.as_ref().map(|c| match c {
                DataSourceCredentials::CopySourceArn(arn) => {
                    AttrBuilder::new().string("copy_source_arn", arn.clone())
                }
                DataSourceCredentials::CredentialPair(pair) => AttrBuilder::new().block(
                    "credential_pair",
                    AttrBuilder::new()
                        .string("username", pair.username.clone())
                        .string("password", pair.password.clone()),
                ),
            }),
        )
        .opt_block(
            "ssl_properties",
            data_source
                .ssl_properties
                .as_ref()
                .map(|ssl| AttrBuilder::new().opt_bool("disable_ssl", ssl.disable_ssl)),
        )
        .opt_block(
            "vpc_connection_properties",
            data_source.vpc_connection_properties.as_ref().map(|vpc| {
                AttrBuilder::new().string("vpc_connection_arn", vpc.vpc_connection_arn.clone())
            }),
        )
        .opt_value(
            PERMISSIONS_ATTRIBUTE,
            data_source.permissions.as_deref().map(flatten_permissions),
        )
        .opt_value("tags", data_source.tags.as_deref().map(flatten_tags))
        .build()
}

fn flatten_database(p: &DatabaseParameters) -> AttrBuilder {
    AttrBuilder::new()
        .string("database", p.database.clone())
        .string("host", p.host.clone())
        .int("port", p.port)
}

fn flatten_parameters(parameters: &DataSourceParameters) -> AttrBuilder {
    use DataSourceParameters as P;

    let site =
        |p: &SiteParameters| AttrBuilder::new().string("site_base_url", p.site_base_url.clone());

    let (name, block) = match parameters {
        P::AmazonElasticsearchParameters(p) => (
            "amazon_elasticsearch",
            AttrBuilder::new().string("domain", p.domain.clone()),
        ),
        P::AthenaParameters(p) => (
            "athena",
            AttrBuilder::new().opt_string("work_group", p.work_group.as_ref()),
        ),
        P::AuroraParameters(p) => ("aurora", flatten_database(p)),
        P::AuroraPostgreSqlParameters(p) => ("aurora_postgresql", flatten_database(p)),
        P::AwsIotAnalyticsParameters(p) => (
            "aws_iot_analytics",
            AttrBuilder::new().string("data_set_name", p.data_set_name.clone()),
        ),
        P::JiraParameters(p) => ("jira", site(p)),
        P::MariaDbParameters(p) => ("maria_db", flatten_database(p)),
        P::MySqlParameters(p) => ("mysql", flatten_database(p)),
        P::PostgreSqlParameters(p) => ("postgresql", flatten_database(p)),
        P::PrestoParameters(p) => (
            "presto",
            AttrBuilder::new()
                .string("catalog", p.catalog.clone())
                .string("host", p.host.clone())
                .int("port", p.port),
        ),
        P::RedshiftParameters(p) => (
            "redshift",
            AttrBuilder::new()
                .opt_string("cluster_id", p.cluster_id.as_ref())
                .string("database", p.database.clone())
                .opt_string("host", p.host.as_ref())
                .opt_int("port", p.port),
        ),
        P::S3Parameters(p) => (
            "s3",
            AttrBuilder::new().block(
                "manifest_file_location",
                AttrBuilder::new()
                    .string("bucket", p.manifest_file_location.bucket.clone())
                    .string("key", p.manifest_file_location.key.clone()),
            ),
        ),
        P::ServiceNowParameters(p) => ("service_now", site(p)),
        P::SnowflakeParameters(p) => (
            "snowflake",
            AttrBuilder::new()
                .string("database", p.database.clone())
                .string("host", p.host.clone())
                .string("warehouse", p.warehouse.clone()),
        ),
        P::SparkParameters(p) => (
            "spark",
            AttrBuilder::new()
                .string("host", p.host.clone())
                .int("port", p.port),
        ),
        P::SqlServerParameters(p) => ("sql_server", flatten_database(p)),
        P::TeradataParameters(p) => ("teradata", flatten_database(p)),
        P::TwitterParameters(p) => (
            "twitter",
            AttrBuilder::new()
                .int("max_rows", p.max_rows)
                .string("query", p.query.clone()),
        ),
    };
    AttrBuilder::new().block(name, block)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schemas::data_source::type_for_parameter;
    use serde_json::json;

    fn attrs(json: serde_json::Value) -> HashMap<String, Value> {
        prism_core::resource::attributes_from_json(&json)
    }

    fn warehouse() -> HashMap<String, Value> {
        attrs(json!({
            "data_source_id": "warehouse",
            "name": "Warehouse",
            "parameters": [{
                "redshift": [{"cluster_id": "bi-cluster", "database": "analytics"}]
            }],
            "credentials": [{
                "credential_pair": [{"username": "reporter", "password": "s3cret"}]
            }],
            "ssl_properties": [{"disable_ssl": false}],
            "permissions": [{
                "principal": "arn:aws:quicksight:us-east-1:123456789012:group/default/bi",
                "actions": ["quicksight:DescribeDataSource", "quicksight:PassDataSource"]
            }]
        }))
    }

    #[test]
    fn type_is_inferred_from_parameters() {
        let data_source = expand_data_source(&warehouse()).unwrap();
        assert_eq!(data_source.data_source_type, "REDSHIFT");
        assert_eq!(
            data_source.credentials,
            Some(DataSourceCredentials::CredentialPair(CredentialPair {
                username: "reporter".to_string(),
                password: "s3cret".to_string(),
            }))
        );
    }

    #[test]
    fn every_parameter_block_expands_to_its_type() {
        let blocks = [
            ("amazon_elasticsearch", json!({"domain": "search"})),
            ("athena", json!({})),
            ("aurora", json!({"database": "d", "host": "h", "port": 3306})),
            ("aurora_postgresql", json!({"database": "d", "host": "h", "port": 5432})),
            ("aws_iot_analytics", json!({"data_set_name": "iot"})),
            ("jira", json!({"site_base_url": "https://jira"})),
            ("maria_db", json!({"database": "d", "host": "h", "port": 3306})),
            ("mysql", json!({"database": "d", "host": "h", "port": 3306})),
            ("postgresql", json!({"database": "d", "host": "h", "port": 5432})),
            ("presto", json!({"catalog": "hive", "host": "h", "port": 8080})),
            ("redshift", json!({"database": "d"})),
            ("s3", json!({"manifest_file_location": [{"bucket": "b", "key": "k"}]})),
            ("service_now", json!({"site_base_url": "https://snow"})),
            ("snowflake", json!({"database": "d", "host": "h", "warehouse": "w"})),
            ("spark", json!({"host": "h", "port": 10000})),
            ("sql_server", json!({"database": "d", "host": "h", "port": 1433})),
            ("teradata", json!({"database": "d", "host": "h", "port": 1025})),
            ("twitter", json!({"max_rows": 100, "query": "#quicksight"})),
        ];
        assert_eq!(blocks.len(), PARAMETER_TYPES.len());

        for (name, block) in blocks {
            let input = attrs(json!({
                "data_source_id": "ds",
                "name": "DS",
                "parameters": [{ name: [block] }]
            }));
            let data_source = expand_data_source(&input).unwrap();
            assert_eq!(Some(data_source.data_source_type.as_str()), type_for_parameter(name));

            let flattened = flatten_data_source(&data_source);
            assert_eq!(flattened["parameters"], input["parameters"], "{name}");
        }
    }

    #[test]
    fn flatten_adds_type_and_keeps_configured_attributes() {
        let original = warehouse();
        let flattened = flatten_data_source(&expand_data_source(&original).unwrap());
        assert_eq!(flattened["type"], Value::string("REDSHIFT"));
        for (name, value) in &original {
            assert_eq!(&flattened[name], value, "{name}");
        }
    }

    #[test]
    fn both_credential_kinds_are_rejected() {
        let mut input = warehouse();
        input.extend(attrs(json!({
            "credentials": [{
                "credential_pair": [{"username": "u", "password": "p"}],
                "copy_source_arn": "arn:aws:quicksight:us-east-1:123456789012:datasource/other"
            }]
        })));
        assert_eq!(
            expand_data_source(&input).unwrap_err(),
            ExpandError::MultipleVariants {
                path: "credentials.0".to_string(),
                variants: vec!["credential_pair".to_string(), "copy_source_arn".to_string()],
            }
        );
    }

    #[test]
    fn missing_parameters_block() {
        let mut input = warehouse();
        input.remove("parameters");
        assert_eq!(
            expand_data_source(&input).unwrap_err().to_string(),
            "parameters: required attribute is missing"
        );
    }
}
