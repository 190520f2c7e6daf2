use prism_core::permission::Permission;
use serde::{Deserialize, Serialize};

use super::Tag;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DataSource {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aws_account_id: Option<String>,
    pub data_source_id: String,
    pub name: String,
    /// Always derived from `data_source_parameters`
    #[serde(rename = "Type")]
    pub data_source_type: String,
    pub data_source_parameters: DataSourceParameters,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credentials: Option<DataSourceCredentials>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ssl_properties: Option<SslProperties>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vpc_connection_properties: Option<VpcConnectionProperties>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub permissions: Option<Vec<Permission>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<Tag>>,
    #[serde(default, skip_serializing)]
    pub arn: Option<String>,
}

/// Connection parameters; exactly one engine per data source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DataSourceParameters {
    AmazonElasticsearchParameters(AmazonElasticsearchParameters),
    AthenaParameters(AthenaParameters),
    AuroraParameters(DatabaseParameters),
    AuroraPostgreSqlParameters(DatabaseParameters),
    AwsIotAnalyticsParameters(AwsIotAnalyticsParameters),
    JiraParameters(SiteParameters),
    MariaDbParameters(DatabaseParameters),
    MySqlParameters(DatabaseParameters),
    PostgreSqlParameters(DatabaseParameters),
    PrestoParameters(PrestoParameters),
    RedshiftParameters(RedshiftParameters),
    S3Parameters(S3Parameters),
    ServiceNowParameters(SiteParameters),
    SnowflakeParameters(SnowflakeParameters),
    SparkParameters(SparkParameters),
    SqlServerParameters(DatabaseParameters),
    TeradataParameters(DatabaseParameters),
    TwitterParameters(TwitterParameters),
}

impl DataSourceParameters {
    /// The QuickSight data source type these parameters connect to
    pub fn data_source_type(&self) -> &'static str {
        match self {
            Self::AmazonElasticsearchParameters(_) => "AMAZON_ELASTICSEARCH",
            Self::AthenaParameters(_) => "ATHENA",
            Self::AuroraParameters(_) => "AURORA",
            Self::AuroraPostgreSqlParameters(_) => "AURORA_POSTGRESQL",
            Self::AwsIotAnalyticsParameters(_) => "AWS_IOT_ANALYTICS",
            Self::JiraParameters(_) => "JIRA",
            Self::MariaDbParameters(_) => "MARIADB",
            Self::MySqlParameters(_) => "MYSQL",
            Self::PostgreSqlParameters(_) => "POSTGRESQL",
            Self::PrestoParameters(_) => "PRESTO",
            Self::RedshiftParameters(_) => "REDSHIFT",
            Self::S3Parameters(_) => "S3",
            Self::ServiceNowParameters(_) => "SERVICENOW",
            Self::SnowflakeParameters(_) => "SNOWFLAKE",
            Self::SparkParameters(_) => "SPARK",
            Self::SqlServerParameters(_) => "SQLSERVER",
            Self::TeradataParameters(_) => "TERADATA",
            Self::TwitterParameters(_) => "TWITTER",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AmazonElasticsearchParameters {
    pub domain: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AthenaParameters {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub work_group: Option<String>,
}

/// database + host + port
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DatabaseParameters {
    pub database: String,
    pub host: String,
    pub port: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AwsIotAnalyticsParameters {
    pub data_set_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SiteParameters {
    pub site_base_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PrestoParameters {
    pub catalog: String,
    pub host: String,
    pub port: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RedshiftParameters {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cluster_id: Option<String>,
    pub database: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct S3Parameters {
    pub manifest_file_location: ManifestFileLocation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ManifestFileLocation {
    pub bucket: String,
    pub key: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SnowflakeParameters {
    pub database: String,
    pub host: String,
    pub warehouse: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SparkParameters {
    pub host: String,
    pub port: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TwitterParameters {
    pub max_rows: i64,
    pub query: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DataSourceCredentials {
    CredentialPair(CredentialPair),
    CopySourceArn(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CredentialPair {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SslProperties {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disable_ssl: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct VpcConnectionProperties {
    pub vpc_connection_arn: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parameters_serialize_under_engine_key() {
        let params = DataSourceParameters::PostgreSqlParameters(DatabaseParameters {
            database: "analytics".to_string(),
            host: "db.internal".to_string(),
            port: 5432,
        });
        assert_eq!(params.data_source_type(), "POSTGRESQL");
        assert_eq!(
            serde_json::to_value(&params).unwrap(),
            json!({
                "PostgreSqlParameters": {
                    "Database": "analytics",
                    "Host": "db.internal",
                    "Port": 5432
                }
            })
        );
    }

    #[test]
    fn credentials_copy_source_is_a_bare_string() {
        let creds = DataSourceCredentials::CopySourceArn(
            "arn:aws:quicksight:us-east-1:123456789012:datasource/source".to_string(),
        );
        assert_eq!(
            serde_json::to_value(&creds).unwrap(),
            json!({"CopySourceArn": "arn:aws:quicksight:us-east-1:123456789012:datasource/source"})
        );
    }

    #[test]
    fn reads_data_source_without_credentials() {
        let data_source: DataSource = serde_json::from_value(json!({
            "Arn": "arn:aws:quicksight:us-east-1:123456789012:datasource/athena",
            "AwsAccountId": "123456789012",
            "DataSourceId": "athena",
            "Name": "Athena",
            "Type": "ATHENA",
            "DataSourceParameters": {"AthenaParameters": {"WorkGroup": "primary"}}
        }))
        .unwrap();
        assert!(data_source.credentials.is_none());
        assert_eq!(data_source.data_source_parameters.data_source_type(), "ATHENA");
    }
}
