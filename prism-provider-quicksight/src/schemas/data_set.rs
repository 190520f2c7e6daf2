//! Schema for `quicksight.data_set` (AWS::QuickSight::DataSet)

use std::collections::HashMap;

use once_cell::sync::Lazy;
use prism_core::resource::Value;
use prism_core::schema::{AttributeSchema, AttributeType, BlockSchema, ResourceSchema, types};

use super::fragments::{self, STATUS, single_block};
use crate::resources::ResourceKind;

pub const IMPORT_MODES: &[&str] = &["SPICE", "DIRECT_QUERY"];
pub const COLUMN_DATA_TYPES: &[&str] = &["STRING", "INTEGER", "DECIMAL", "DATETIME"];
pub const GEO_SPATIAL_DATA_ROLES: &[&str] = &[
    "COUNTRY", "STATE", "COUNTY", "CITY", "POSTCODE", "LONGITUDE", "LATITUDE",
];
pub const COLUMN_TAG_NAMES: &[&str] = &["COLUMN_GEOGRAPHIC_ROLE", "COLUMN_DESCRIPTION"];
pub const JOIN_TYPES: &[&str] = &["INNER", "OUTER", "LEFT", "RIGHT"];
pub const FILE_FORMATS: &[&str] = &["CSV", "TSV", "CLF", "ELF", "XLSX", "JSON"];
pub const TEXT_QUALIFIERS: &[&str] = &["DOUBLE_QUOTE", "SINGLE_QUOTE"];
pub const ROW_LEVEL_PERMISSION_FORMAT_VERSIONS: &[&str] = &["VERSION_1", "VERSION_2"];
pub const ROW_LEVEL_PERMISSION_POLICIES: &[&str] = &["GRANT_ACCESS", "DENY_ACCESS"];
pub const LOOKBACK_WINDOW_SIZE_UNITS: &[&str] = &["HOUR", "DAY", "WEEK"];

pub const PHYSICAL_TABLE_VARIANTS: &[&str] = &["custom_sql", "relational_table", "s3_source"];
pub const LOGICAL_TABLE_SOURCE_VARIANTS: &[&str] =
    &["data_set_arn", "join_instruction", "physical_table_id"];
pub const TRANSFORM_OPERATIONS: &[&str] = &[
    "cast_column_type_operation",
    "create_columns_operation",
    "filter_operation",
    "project_operation",
    "rename_column_operation",
    "tag_column_operation",
    "untag_column_operation",
];

fn string_list() -> AttributeType {
    AttributeType::List(Box::new(AttributeType::String))
}

fn len(name: &str, min: usize, max: usize) -> AttributeSchema {
    AttributeSchema::new(name, types::string_len_between(min, max))
}

fn enumeration(name: &str, values: &[&str]) -> AttributeSchema {
    AttributeSchema::new(name, AttributeType::enumeration(values))
}

fn column_groups() -> AttributeSchema {
    let geo_spatial = BlockSchema::new()
        .attribute(
            AttributeSchema::new(
                "columns",
                AttributeType::List(Box::new(types::string_len_between(1, 128))),
            )
            .required()
            .min_items(1)
            .max_items(16),
        )
        .attribute(enumeration("country_code", &["US"]).required())
        .attribute(len("name", 1, 64).required());

    AttributeSchema::new(
        "column_groups",
        AttributeType::block_list(
            BlockSchema::new().attribute(single_block("geo_spatial_column_group", geo_spatial)),
        ),
    )
    .min_items(1)
    .max_items(8)
    .with_provider_name("ColumnGroups")
}

fn column_level_permission_rules() -> AttributeSchema {
    let rule = BlockSchema::new()
        .attribute(AttributeSchema::new("column_names", string_list()).min_items(1))
        .attribute(
            AttributeSchema::new("principals", string_list())
                .min_items(1)
                .max_items(100),
        );

    AttributeSchema::new("column_level_permission_rules", AttributeType::block_list(rule))
        .min_items(1)
        .with_provider_name("ColumnLevelPermissionRules")
}

fn data_set_usage_configuration() -> AttributeSchema {
    single_block(
        "data_set_usage_configuration",
        BlockSchema::new()
            .attribute(
                AttributeSchema::new("disable_use_as_direct_query_source", AttributeType::Bool)
                    .computed(),
            )
            .attribute(
                AttributeSchema::new("disable_use_as_imported_source", AttributeType::Bool)
                    .computed(),
            ),
    )
    .computed()
    .with_provider_name("DataSetUsageConfiguration")
}

fn field_folders() -> AttributeSchema {
    let folder = BlockSchema::new()
        .attribute(AttributeSchema::new("field_folders_id", AttributeType::String).required())
        .attribute(AttributeSchema::new("columns", string_list()).max_items(5000))
        .attribute(len("description", 0, 500));

    AttributeSchema::new("field_folders", AttributeType::block_set(folder))
        .max_items(1000)
        .with_provider_name("FieldFolders")
}

fn transform_operation() -> BlockSchema {
    let cast = BlockSchema::new()
        .attribute(len("column_name", 1, 128).required())
        .attribute(len("format", 0, 32).computed())
        .attribute(enumeration("new_column_type", COLUMN_DATA_TYPES).required());

    let calculated_column = BlockSchema::new()
        .attribute(len("column_id", 1, 64).required())
        .attribute(len("column_name", 1, 128).required())
        .attribute(len("expression", 1, 4096).required());
    let create_columns = BlockSchema::new().attribute(
        AttributeSchema::new("columns", AttributeType::block_list(calculated_column))
            .required()
            .min_items(1)
            .max_items(128),
    );

    let filter = BlockSchema::new().attribute(len("condition_expression", 1, 4096).required());

    let project = BlockSchema::new().attribute(
        AttributeSchema::new("projected_columns", string_list())
            .required()
            .min_items(1)
            .max_items(2000),
    );

    let rename = BlockSchema::new()
        .attribute(len("column_name", 1, 128).required())
        .attribute(len("new_column_name", 1, 128).required());

    let column_tag = BlockSchema::new()
        .attribute(
            single_block(
                "column_description",
                BlockSchema::new().attribute(len("text", 0, 500).computed()),
            )
            .computed(),
        )
        .attribute(enumeration("column_geographic_role", GEO_SPATIAL_DATA_ROLES).computed());
    let tag = BlockSchema::new()
        .attribute(len("column_name", 1, 128).required())
        .attribute(
            AttributeSchema::new("tags", AttributeType::block_list(column_tag))
                .required()
                .min_items(1)
                .max_items(16),
        );

    let untag = BlockSchema::new()
        .attribute(len("column_name", 1, 128).required())
        .attribute(
            AttributeSchema::new(
                "tag_names",
                AttributeType::List(Box::new(AttributeType::enumeration(COLUMN_TAG_NAMES))),
            )
            .required(),
        );

    BlockSchema::new()
        .attribute(single_block("cast_column_type_operation", cast))
        .attribute(single_block("create_columns_operation", create_columns))
        .attribute(single_block("filter_operation", filter))
        .attribute(single_block("project_operation", project))
        .attribute(single_block("rename_column_operation", rename))
        .attribute(single_block("tag_column_operation", tag))
        .attribute(single_block("untag_column_operation", untag))
        .exactly_one_of(TRANSFORM_OPERATIONS)
}

fn logical_table_map() -> AttributeSchema {
    let join_key_properties = || {
        BlockSchema::new()
            .attribute(AttributeSchema::new("unique_key", AttributeType::Bool).computed())
    };
    let join_instruction = BlockSchema::new()
        .attribute(single_block("left_join_key_properties", join_key_properties()).computed())
        .attribute(len("left_operand", 1, 64).required())
        .attribute(len("on_clause", 1, 512).required())
        .attribute(single_block("right_join_key_properties", join_key_properties()).computed())
        .attribute(len("right_operand", 1, 64).required())
        .attribute(enumeration("type", JOIN_TYPES).required());

    let source = BlockSchema::new()
        .attribute(AttributeSchema::new("data_set_arn", types::arn()).computed())
        .attribute(single_block("join_instruction", join_instruction).computed())
        .attribute(len("physical_table_id", 1, 64).computed())
        .exactly_one_of(LOGICAL_TABLE_SOURCE_VARIANTS);

    let table = BlockSchema::new()
        .attribute(AttributeSchema::new("logical_table_map_id", AttributeType::String).required())
        .attribute(len("alias", 1, 64).required())
        .attribute(
            AttributeSchema::new(
                "data_transforms",
                AttributeType::block_list(transform_operation()),
            )
            .computed()
            .min_items(1)
            .max_items(2048),
        )
        .attribute(single_block("source", source).required());

    AttributeSchema::new("logical_table_map", AttributeType::block_set(table))
        .computed()
        .max_items(64)
        .with_provider_name("LogicalTableMap")
}

fn physical_table_map() -> AttributeSchema {
    let custom_sql = BlockSchema::new()
        .attribute(
            AttributeSchema::new("columns", fragments::input_columns())
                .min_items(1)
                .max_items(2048),
        )
        .attribute(fragments::arn_string("data_source_arn"))
        .attribute(len("name", 1, 64).required())
        .attribute(len("sql_query", 1, 65536).required());

    let relational_table = BlockSchema::new()
        .attribute(len("catalog", 0, 256))
        .attribute(fragments::arn_string("data_source_arn"))
        .attribute(
            AttributeSchema::new("input_columns", fragments::input_columns())
                .required()
                .min_items(1)
                .max_items(2048),
        )
        .attribute(len("name", 1, 64).required())
        .attribute(AttributeSchema::new("schema", AttributeType::String));

    let upload_settings = BlockSchema::new()
        .attribute(AttributeSchema::new("contains_header", AttributeType::Bool).computed())
        .attribute(len("delimiter", 1, 1).computed())
        .attribute(enumeration("format", FILE_FORMATS).computed())
        .attribute(AttributeSchema::new("start_from_row", types::int_at_least(1)).computed())
        .attribute(enumeration("text_qualifier", TEXT_QUALIFIERS).computed());

    let s3_source = BlockSchema::new()
        .attribute(fragments::arn_string("data_source_arn"))
        .attribute(
            AttributeSchema::new("input_columns", fragments::input_columns())
                .required()
                .min_items(1)
                .max_items(2048),
        )
        .attribute(single_block("upload_settings", upload_settings).required());

    let table = BlockSchema::new()
        .attribute(AttributeSchema::new("physical_table_map_id", AttributeType::String).required())
        .attribute(single_block("custom_sql", custom_sql))
        .attribute(single_block("relational_table", relational_table))
        .attribute(single_block("s3_source", s3_source).computed())
        .exactly_one_of(PHYSICAL_TABLE_VARIANTS);

    AttributeSchema::new("physical_table_map", AttributeType::block_set(table))
        .max_items(32)
        .with_provider_name("PhysicalTableMap")
}

fn row_level_permission_data_set() -> AttributeSchema {
    single_block(
        "row_level_permission_data_set",
        BlockSchema::new()
            .attribute(fragments::arn_string("arn"))
            .attribute(enumeration("format_version", ROW_LEVEL_PERMISSION_FORMAT_VERSIONS))
            .attribute(len("namespace", 0, 64))
            .attribute(enumeration("permission_policy", ROW_LEVEL_PERMISSION_POLICIES).required())
            .attribute(enumeration("status", STATUS)),
    )
    .with_provider_name("RowLevelPermissionDataSet")
}

fn row_level_permission_tag_configuration() -> AttributeSchema {
    let rule = BlockSchema::new()
        .attribute(AttributeSchema::new("column_name", types::non_empty_string()).required())
        .attribute(len("match_all_value", 1, 256))
        .attribute(len("tag_key", 1, 128).required())
        .attribute(len("tag_multi_value_delimiter", 1, 10));

    single_block(
        "row_level_permission_tag_configuration",
        BlockSchema::new()
            .attribute(enumeration("status", STATUS))
            .attribute(
                AttributeSchema::new("tag_rules", AttributeType::block_list(rule))
                    .required()
                    .min_items(1)
                    .max_items(50),
            ),
    )
    .with_provider_name("RowLevelPermissionTagConfiguration")
}

fn refresh_properties() -> AttributeSchema {
    let lookback_window = BlockSchema::new()
        .attribute(AttributeSchema::new("column_name", AttributeType::String).required())
        .attribute(AttributeSchema::new("size", AttributeType::Int).required())
        .attribute(enumeration("size_unit", LOOKBACK_WINDOW_SIZE_UNITS).required());
    let incremental_refresh =
        BlockSchema::new().attribute(single_block("lookback_window", lookback_window).required());
    let refresh_configuration = BlockSchema::new()
        .attribute(single_block("incremental_refresh", incremental_refresh).required());

    single_block(
        "refresh_properties",
        BlockSchema::new()
            .attribute(single_block("refresh_configuration", refresh_configuration).required()),
    )
    .with_provider_name("DataSetRefreshProperties")
}

fn output_columns() -> AttributeSchema {
    let column = BlockSchema::new()
        .attribute(AttributeSchema::new("description", AttributeType::String).read_only())
        .attribute(AttributeSchema::new("name", AttributeType::String).read_only())
        .attribute(AttributeSchema::new("type", AttributeType::String).read_only());

    AttributeSchema::new("output_columns", AttributeType::block_list(column))
        .read_only()
        .with_provider_name("OutputColumns")
}

/// Refresh properties only apply to SPICE data sets
fn refresh_requires_spice(attributes: &HashMap<String, Value>) -> Result<(), String> {
    let direct_query = attributes
        .get("import_mode")
        .and_then(Value::as_str)
        .is_some_and(|mode| mode == "DIRECT_QUERY");
    if direct_query && attributes.contains_key("refresh_properties") {
        return Err("refresh_properties cannot be set when import_mode is DIRECT_QUERY".to_string());
    }
    Ok(())
}

static SCHEMA: Lazy<ResourceSchema> = Lazy::new(|| {
    ResourceSchema::new(ResourceKind::DataSet.resource_type())
        .with_description(
            "A QuickSight data set: tables, transforms and access rules over data sources",
        )
        .attribute(fragments::arn())
        .attribute(fragments::aws_account_id())
        .attribute(column_groups())
        .attribute(column_level_permission_rules())
        .attribute(fragments::id("data_set_id", "DataSetId"))
        .attribute(data_set_usage_configuration())
        .attribute(field_folders())
        .attribute(
            enumeration("import_mode", IMPORT_MODES)
                .required()
                .with_provider_name("ImportMode"),
        )
        .attribute(logical_table_map())
        .attribute(len("name", 1, 128).required().with_provider_name("Name"))
        .attribute(output_columns())
        .attribute(fragments::permissions())
        .attribute(physical_table_map())
        .attribute(refresh_properties())
        .attribute(row_level_permission_data_set())
        .attribute(row_level_permission_tag_configuration())
        .attribute(fragments::tags())
        .constraint(refresh_requires_spice)
});

pub fn schema() -> ResourceSchema {
    SCHEMA.clone()
}

#[cfg(test)]
mod tests {
    use super::*;
    use prism_core::schema::TypeError;

    fn block(entries: Vec<(&str, Value)>) -> Value {
        Value::Map(
            entries
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
        )
    }

    fn base() -> HashMap<String, Value> {
        HashMap::from([
            ("data_set_id".to_string(), Value::string("sales")),
            ("name".to_string(), Value::string("Sales")),
            ("import_mode".to_string(), Value::string("SPICE")),
        ])
    }

    fn custom_sql_table() -> Value {
        block(vec![
            ("physical_table_map_id", Value::string("orders")),
            (
                "custom_sql",
                Value::List(vec![block(vec![
                    (
                        "data_source_arn",
                        Value::string("arn:aws:quicksight:us-east-1:123456789012:datasource/db"),
                    ),
                    ("name", Value::string("orders")),
                    ("sql_query", Value::string("SELECT * FROM orders")),
                ])]),
            ),
        ])
    }

    #[test]
    fn minimal_data_set_is_valid() {
        let mut attrs = base();
        attrs.insert(
            "physical_table_map".to_string(),
            Value::List(vec![custom_sql_table()]),
        );
        assert_eq!(schema().validate(&attrs), Ok(()));
    }

    #[test]
    fn physical_table_needs_exactly_one_variant() {
        let mut attrs = base();
        attrs.insert(
            "physical_table_map".to_string(),
            Value::List(vec![block(vec![(
                "physical_table_map_id",
                Value::string("orders"),
            )])]),
        );
        let errors = schema().validate(&attrs).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].to_string().contains("Exactly one of custom_sql"));
    }

    #[test]
    fn invalid_import_mode_is_rejected() {
        let mut attrs = base();
        attrs.insert("import_mode".to_string(), Value::string("LIVE"));
        let errors = schema().validate(&attrs).unwrap_err();
        assert!(matches!(
            &errors[0],
            TypeError::AttributeError { name, .. } if name == "import_mode"
        ));
    }

    #[test]
    fn refresh_properties_conflict_with_direct_query() {
        let refresh = Value::List(vec![block(vec![(
            "refresh_configuration",
            Value::List(vec![block(vec![(
                "incremental_refresh",
                Value::List(vec![block(vec![(
                    "lookback_window",
                    Value::List(vec![block(vec![
                        ("column_name", Value::string("updated_at")),
                        ("size", Value::Int(1)),
                        ("size_unit", Value::string("DAY")),
                    ])]),
                )])]),
            )])]),
        )])]);

        let mut attrs = base();
        attrs.insert("refresh_properties".to_string(), refresh);
        assert_eq!(schema().validate(&attrs), Ok(()));

        attrs.insert("import_mode".to_string(), Value::string("DIRECT_QUERY"));
        let errors = schema().validate(&attrs).unwrap_err();
        assert_eq!(
            errors,
            vec![TypeError::ValidationFailed {
                message: "refresh_properties cannot be set when import_mode is DIRECT_QUERY"
                    .to_string()
            }]
        );
    }

    #[test]
    fn logical_table_transform_takes_one_operation() {
        let transform = block(vec![
            (
                "filter_operation",
                Value::List(vec![block(vec![(
                    "condition_expression",
                    Value::string("amount > 0"),
                )])]),
            ),
            (
                "project_operation",
                Value::List(vec![block(vec![(
                    "projected_columns",
                    Value::List(vec![Value::string("amount")]),
                )])]),
            ),
        ]);
        let table = block(vec![
            ("logical_table_map_id", Value::string("t1")),
            ("alias", Value::string("orders")),
            ("data_transforms", Value::List(vec![transform])),
            (
                "source",
                Value::List(vec![block(vec![("physical_table_id", Value::string("orders"))])]),
            ),
        ]);

        let mut attrs = base();
        attrs.insert("logical_table_map".to_string(), Value::List(vec![table]));
        let errors = schema().validate(&attrs).unwrap_err();
        assert!(errors[0].to_string().contains("Exactly one of cast_column_type_operation"));
    }

    #[test]
    fn computed_outputs_cannot_be_set() {
        let mut attrs = base();
        attrs.insert("output_columns".to_string(), Value::List(vec![]));
        let errors = schema().validate(&attrs).unwrap_err();
        assert_eq!(
            errors,
            vec![TypeError::ReadOnlyAttribute {
                name: "output_columns".to_string()
            }]
        );
    }

    #[test]
    fn data_set_id_forces_replacement() {
        let schema = schema();
        let force_new = schema.force_new_attributes();
        assert!(force_new.contains("data_set_id"));
        assert!(force_new.contains("aws_account_id"));
        assert!(!force_new.contains("name"));
    }
}
