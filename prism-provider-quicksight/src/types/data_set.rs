use std::collections::BTreeMap;

use prism_core::permission::Permission;
use serde::{Deserialize, Serialize};

use super::Tag;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DataSet {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aws_account_id: Option<String>,
    pub data_set_id: String,
    pub name: String,
    pub import_mode: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub physical_table_map: Option<BTreeMap<String, PhysicalTable>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logical_table_map: Option<BTreeMap<String, LogicalTable>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column_groups: Option<Vec<ColumnGroup>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column_level_permission_rules: Option<Vec<ColumnLevelPermissionRule>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_set_usage_configuration: Option<DataSetUsageConfiguration>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field_folders: Option<BTreeMap<String, FieldFolder>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub row_level_permission_data_set: Option<RowLevelPermissionDataSet>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub row_level_permission_tag_configuration: Option<RowLevelPermissionTagConfiguration>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_set_refresh_properties: Option<DataSetRefreshProperties>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub permissions: Option<Vec<Permission>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<Tag>>,
    /// Read-only
    #[serde(default, skip_serializing)]
    pub arn: Option<String>,
    /// Read-only
    #[serde(default, skip_serializing)]
    pub output_columns: Option<Vec<OutputColumn>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum PhysicalTable {
    CustomSql(CustomSql),
    RelationalTable(RelationalTable),
    S3Source(S3Source),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct InputColumn {
    pub name: String,
    #[serde(rename = "Type")]
    pub column_type: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CustomSql {
    pub data_source_arn: String,
    pub name: String,
    pub sql_query: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub columns: Option<Vec<InputColumn>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RelationalTable {
    pub data_source_arn: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub catalog: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
    pub name: String,
    pub input_columns: Vec<InputColumn>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct S3Source {
    pub data_source_arn: String,
    pub input_columns: Vec<InputColumn>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upload_settings: Option<UploadSettings>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct UploadSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_from_row: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contains_header: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_qualifier: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delimiter: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LogicalTable {
    pub alias: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub data_transforms: Vec<TransformOperation>,
    pub source: LogicalTableSource,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum LogicalTableSource {
    DataSetArn(String),
    JoinInstruction(JoinInstruction),
    PhysicalTableId(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct JoinInstruction {
    pub left_operand: String,
    pub right_operand: String,
    pub on_clause: String,
    #[serde(rename = "Type")]
    pub join_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub left_join_key_properties: Option<JoinKeyProperties>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub right_join_key_properties: Option<JoinKeyProperties>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct JoinKeyProperties {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unique_key: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum TransformOperation {
    CastColumnTypeOperation(CastColumnTypeOperation),
    CreateColumnsOperation(CreateColumnsOperation),
    FilterOperation(FilterOperation),
    ProjectOperation(ProjectOperation),
    RenameColumnOperation(RenameColumnOperation),
    TagColumnOperation(TagColumnOperation),
    UntagColumnOperation(UntagColumnOperation),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CastColumnTypeOperation {
    pub column_name: String,
    pub new_column_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreateColumnsOperation {
    pub columns: Vec<CalculatedColumn>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CalculatedColumn {
    pub column_id: String,
    pub column_name: String,
    pub expression: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct FilterOperation {
    pub condition_expression: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ProjectOperation {
    pub projected_columns: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RenameColumnOperation {
    pub column_name: String,
    pub new_column_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TagColumnOperation {
    pub column_name: String,
    pub tags: Vec<ColumnTag>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ColumnTag {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column_geographic_role: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column_description: Option<ColumnDescription>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ColumnDescription {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct UntagColumnOperation {
    pub column_name: String,
    pub tag_names: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ColumnGroup {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geo_spatial_column_group: Option<GeoSpatialColumnGroup>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GeoSpatialColumnGroup {
    pub name: String,
    pub country_code: String,
    pub columns: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ColumnLevelPermissionRule {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column_names: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub principals: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DataSetUsageConfiguration {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disable_use_as_direct_query_source: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disable_use_as_imported_source: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct FieldFolder {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub columns: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RowLevelPermissionDataSet {
    pub arn: String,
    pub permission_policy: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RowLevelPermissionTagConfiguration {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    pub tag_rules: Vec<RowLevelPermissionTagRule>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RowLevelPermissionTagRule {
    pub column_name: String,
    pub tag_key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub match_all_value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag_multi_value_delimiter: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DataSetRefreshProperties {
    pub refresh_configuration: RefreshConfiguration,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RefreshConfiguration {
    pub incremental_refresh: IncrementalRefresh,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct IncrementalRefresh {
    pub lookback_window: LookbackWindow,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LookbackWindow {
    pub column_name: String,
    pub size: i64,
    pub size_unit: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct OutputColumn {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, rename = "Type")]
    pub column_type: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn one_of_members_serialize_as_single_key() {
        let table = PhysicalTable::RelationalTable(RelationalTable {
            data_source_arn: "arn:aws:quicksight:us-east-1:123456789012:datasource/db".to_string(),
            catalog: None,
            schema: Some("public".to_string()),
            name: "orders".to_string(),
            input_columns: vec![InputColumn {
                name: "id".to_string(),
                column_type: "INTEGER".to_string(),
            }],
        });

        assert_eq!(
            serde_json::to_value(&table).unwrap(),
            json!({
                "RelationalTable": {
                    "DataSourceArn": "arn:aws:quicksight:us-east-1:123456789012:datasource/db",
                    "Schema": "public",
                    "Name": "orders",
                    "InputColumns": [{"Name": "id", "Type": "INTEGER"}]
                }
            })
        );
    }

    #[test]
    fn reads_cloud_control_properties() {
        let data_set: DataSet = serde_json::from_value(json!({
            "Arn": "arn:aws:quicksight:us-east-1:123456789012:dataset/sales",
            "AwsAccountId": "123456789012",
            "DataSetId": "sales",
            "Name": "Sales",
            "ImportMode": "SPICE",
            "LogicalTableMap": {
                "t1": {
                    "Alias": "orders",
                    "Source": {"PhysicalTableId": "orders"}
                }
            },
            "OutputColumns": [{"Name": "id", "Type": "INTEGER"}]
        }))
        .unwrap();

        assert_eq!(data_set.data_set_id, "sales");
        assert_eq!(
            data_set.logical_table_map.unwrap()["t1"].source,
            LogicalTableSource::PhysicalTableId("orders".to_string())
        );
        assert_eq!(data_set.output_columns.unwrap()[0].column_type.as_deref(), Some("INTEGER"));
    }

    #[test]
    fn read_only_fields_are_not_sent() {
        let data_set = DataSet {
            data_set_id: "sales".to_string(),
            name: "Sales".to_string(),
            import_mode: "SPICE".to_string(),
            arn: Some("arn".to_string()),
            ..Default::default()
        };
        let json = serde_json::to_value(&data_set).unwrap();
        assert!(json.get("Arn").is_none());
        assert_eq!(json["DataSetId"], "sales");
    }
}
