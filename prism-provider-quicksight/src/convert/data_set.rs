//! Data set expand / flatten

use std::collections::{BTreeMap, HashMap};

use prism_core::permission::PERMISSIONS_ATTRIBUTE;
use prism_core::resource::Value;

use super::{
    AttrBuilder, AttrReader, ExpandError, expand_optional_permissions, expand_tags,
    flatten_permissions, flatten_tags,
};
use crate::schemas::data_set::{
    LOGICAL_TABLE_SOURCE_VARIANTS, PHYSICAL_TABLE_VARIANTS, TRANSFORM_OPERATIONS,
};
use crate::types::data_set::*;

pub fn expand_data_set(attrs: &HashMap<String, Value>) -> Result<DataSet, ExpandError> {
    let r = AttrReader::root(attrs);
    Ok(DataSet {
        aws_account_id: r.opt_string("aws_account_id")?,
        data_set_id: r.string("data_set_id")?,
        name: r.string("name")?,
        import_mode: r.string("import_mode")?,
        physical_table_map: optional_map(
            &r,
            "physical_table_map",
            "physical_table_map_id",
            expand_physical_table,
        )?,
        logical_table_map: optional_map(
            &r,
            "logical_table_map",
            "logical_table_map_id",
            expand_logical_table,
        )?,
        column_groups: optional_list(&r, "column_groups", expand_column_group)?,
        column_level_permission_rules: optional_list(
            &r,
            "column_level_permission_rules",
            |b| {
                Ok(ColumnLevelPermissionRule {
                    column_names: b.opt_strings("column_names")?,
                    principals: b.opt_strings("principals")?,
                })
            },
        )?,
        data_set_usage_configuration: r
            .opt_block("data_set_usage_configuration")?
            .map(|b| {
                Ok::<_, ExpandError>(DataSetUsageConfiguration {
                    disable_use_as_direct_query_source: b
                        .opt_bool("disable_use_as_direct_query_source")?,
                    disable_use_as_imported_source: b.opt_bool("disable_use_as_imported_source")?,
                })
            })
            .transpose()?,
        field_folders: optional_map(&r, "field_folders", "field_folders_id", |b| {
            Ok(FieldFolder {
                description: b.opt_string("description")?,
                columns: b.opt_strings("columns")?,
            })
        })?,
        row_level_permission_data_set: r
            .opt_block("row_level_permission_data_set")?
            .map(|b| {
                Ok::<_, ExpandError>(RowLevelPermissionDataSet {
                    arn: b.string("arn")?,
                    permission_policy: b.string("permission_policy")?,
                    namespace: b.opt_string("namespace")?,
                    format_version: b.opt_string("format_version")?,
                    status: b.opt_string("status")?,
                })
            })
            .transpose()?,
        row_level_permission_tag_configuration: r
            .opt_block("row_level_permission_tag_configuration")?
            .map(|b| expand_tag_configuration(&b))
            .transpose()?,
        data_set_refresh_properties: r
            .opt_block("refresh_properties")?
            .map(|b| expand_refresh_properties(&b))
            .transpose()?,
        permissions: expand_optional_permissions(&r)?,
        tags: expand_tags(&r)?,
        arn: None,
        output_columns: None,
    })
}

fn optional_list<T>(
    r: &AttrReader<'_>,
    name: &str,
    expand: impl Fn(&AttrReader<'_>) -> Result<T, ExpandError>,
) -> Result<Option<Vec<T>>, ExpandError> {
    if !r.has(name) {
        return Ok(None);
    }
    r.blocks(name)?.iter().map(expand).collect::<Result<Vec<_>, _>>().map(Some)
}

/// Block set keyed by one of its attributes, sent as a JSON object
fn optional_map<T>(
    r: &AttrReader<'_>,
    name: &str,
    key: &str,
    expand: impl Fn(&AttrReader<'_>) -> Result<T, ExpandError>,
) -> Result<Option<BTreeMap<String, T>>, ExpandError> {
    if !r.has(name) {
        return Ok(None);
    }
    r.blocks(name)?
        .iter()
        .map(|b| Ok::<_, ExpandError>((b.string(key)?, expand(b)?)))
        .collect::<Result<BTreeMap<_, _>, _>>()
        .map(Some)
}

fn expand_input_columns(b: &AttrReader<'_>, name: &str) -> Result<Vec<InputColumn>, ExpandError> {
    b.blocks(name)?
        .iter()
        .map(|c| {
            Ok(InputColumn {
                name: c.string("name")?,
                column_type: c.string("type")?,
            })
        })
        .collect()
}

fn expand_physical_table(b: &AttrReader<'_>) -> Result<PhysicalTable, ExpandError> {
    let table = match b.one_of(PHYSICAL_TABLE_VARIANTS)? {
        "custom_sql" => {
            let t = b.block("custom_sql")?;
            PhysicalTable::CustomSql(CustomSql {
                data_source_arn: t.string("data_source_arn")?,
                name: t.string("name")?,
                sql_query: t.string("sql_query")?,
                columns: if t.has("columns") {
                    Some(expand_input_columns(&t, "columns")?)
                } else {
                    None
                },
            })
        }
        "relational_table" => {
            let t = b.block("relational_table")?;
            PhysicalTable::RelationalTable(RelationalTable {
                data_source_arn: t.string("data_source_arn")?,
                catalog: t.opt_string("catalog")?,
                schema: t.opt_string("schema")?,
                name: t.string("name")?,
                input_columns: expand_input_columns(&t, "input_columns")?,
            })
        }
        _ => {
            let t = b.block("s3_source")?;
            let upload_settings = t
                .opt_block("upload_settings")?
                .map(|u| {
                    Ok::<_, ExpandError>(UploadSettings {
                        format: u.opt_string("format")?,
                        start_from_row: u.opt_int("start_from_row")?,
                        contains_header: u.opt_bool("contains_header")?,
                        text_qualifier: u.opt_string("text_qualifier")?,
                        delimiter: u.opt_string("delimiter")?,
                    })
                })
                .transpose()?;
            PhysicalTable::S3Source(S3Source {
                data_source_arn: t.string("data_source_arn")?,
                input_columns: expand_input_columns(&t, "input_columns")?,
                upload_settings,
            })
        }
    };
    Ok(table)
}

fn expand_logical_table(b: &AttrReader<'_>) -> Result<LogicalTable, ExpandError> {
    let source = b.block("source")?;
    let source = match source.one_of(LOGICAL_TABLE_SOURCE_VARIANTS)? {
        "data_set_arn" => LogicalTableSource::DataSetArn(source.string("data_set_arn")?),
        "physical_table_id" => {
            LogicalTableSource::PhysicalTableId(source.string("physical_table_id")?)
        }
        _ => {
            let j = source.block("join_instruction")?;
            let key_properties = |name: &str| {
                j.opt_block(name)?
                    .map(|k| {
                        Ok::<_, ExpandError>(JoinKeyProperties {
                            unique_key: k.opt_bool("unique_key")?,
                        })
                    })
                    .transpose()
            };
            LogicalTableSource::JoinInstruction(JoinInstruction {
                left_operand: j.string("left_operand")?,
                right_operand: j.string("right_operand")?,
                on_clause: j.string("on_clause")?,
                join_type: j.string("type")?,
                left_join_key_properties: key_properties("left_join_key_properties")?,
                right_join_key_properties: key_properties("right_join_key_properties")?,
            })
        }
    };

    Ok(LogicalTable {
        alias: b.string("alias")?,
        data_transforms: b
            .blocks("data_transforms")?
            .iter()
            .map(expand_transform)
            .collect::<Result<_, _>>()?,
        source,
    })
}

fn expand_transform(b: &AttrReader<'_>) -> Result<TransformOperation, ExpandError> {
    let name = b.one_of(TRANSFORM_OPERATIONS)?;
    let op = b.block(name)?;
    let operation = match name {
        "cast_column_type_operation" => {
            TransformOperation::CastColumnTypeOperation(CastColumnTypeOperation {
                column_name: op.string("column_name")?,
                new_column_type: op.string("new_column_type")?,
                format: op.opt_string("format")?,
            })
        }
        "create_columns_operation" => {
            TransformOperation::CreateColumnsOperation(CreateColumnsOperation {
                columns: op
                    .blocks("columns")?
                    .iter()
                    .map(|c| {
                        Ok(CalculatedColumn {
                            column_id: c.string("column_id")?,
                            column_name: c.string("column_name")?,
                            expression: c.string("expression")?,
                        })
                    })
                    .collect::<Result<_, ExpandError>>()?,
            })
        }
        "filter_operation" => TransformOperation::FilterOperation(FilterOperation {
            condition_expression: op.string("condition_expression")?,
        }),
        "project_operation" => TransformOperation::ProjectOperation(ProjectOperation {
            projected_columns: op.strings("projected_columns")?,
        }),
        "rename_column_operation" => {
            TransformOperation::RenameColumnOperation(RenameColumnOperation {
                column_name: op.string("column_name")?,
                new_column_name: op.string("new_column_name")?,
            })
        }
        "tag_column_operation" => TransformOperation::TagColumnOperation(TagColumnOperation {
            column_name: op.string("column_name")?,
            tags: op
                .blocks("tags")?
                .iter()
                .map(|t| {
                    Ok(ColumnTag {
                        column_geographic_role: t.opt_string("column_geographic_role")?,
                        column_description: t
                            .opt_block("column_description")?
                            .map(|d| {
                                Ok::<_, ExpandError>(ColumnDescription {
                                    text: d.opt_string("text")?,
                                })
                            })
                            .transpose()?,
                    })
                })
                .collect::<Result<_, ExpandError>>()?,
        }),
        _ => TransformOperation::UntagColumnOperation(UntagColumnOperation {
            column_name: op.string("column_name")?,
            tag_names: op.strings("tag_names")?,
        }),
    };
    Ok(operation)
}

fn expand_column_group(b: &AttrReader<'_>) -> Result<ColumnGroup, ExpandError> {
    Ok(ColumnGroup {
        geo_spatial_column_group: b
            .opt_block("geo_spatial_column_group")?
            .map(|g| {
                Ok::<_, ExpandError>(GeoSpatialColumnGroup {
                    name: g.string("name")?,
                    country_code: g.string("country_code")?,
                    columns: g.strings("columns")?,
                })
            })
            .transpose()?,
    })
}

fn expand_tag_configuration(
    b: &AttrReader<'_>,
) -> Result<RowLevelPermissionTagConfiguration, ExpandError> {
    Ok(RowLevelPermissionTagConfiguration {
        status: b.opt_string("status")?,
        tag_rules: b
            .blocks("tag_rules")?
            .iter()
            .map(|rule| {
                Ok(RowLevelPermissionTagRule {
                    column_name: rule.string("column_name")?,
                    tag_key: rule.string("tag_key")?,
                    match_all_value: rule.opt_string("match_all_value")?,
                    tag_multi_value_delimiter: rule.opt_string("tag_multi_value_delimiter")?,
                })
            })
            .collect::<Result<_, ExpandError>>()?,
    })
}

fn expand_refresh_properties(b: &AttrReader<'_>) -> Result<DataSetRefreshProperties, ExpandError> {
    let window = b
        .block("refresh_configuration")?
        .block("incremental_refresh")?
        .block("lookback_window")?;
    Ok(DataSetRefreshProperties {
        refresh_configuration: RefreshConfiguration {
            incremental_refresh: IncrementalRefresh {
                lookback_window: LookbackWindow {
                    column_name: window.string("column_name")?,
                    size: window.int("size")?,
                    size_unit: window.string("size_unit")?,
                },
            },
        },
    })
}

/// Attribute map for a data set read back from the API
pub fn flatten_data_set(data_set: &DataSet) -> HashMap<String, Value> {
    AttrBuilder::new()
        .opt_string("arn", data_set.arn.as_ref())
        .opt_string("aws_account_id", data_set.aws_account_id.as_ref())
        .string("data_set_id", data_set.data_set_id.clone())
        .string("name", data_set.name.clone())
        .string("import_mode", data_set.import_mode.clone())
        .opt_value(
            "physical_table_map",
            data_set.physical_table_map.as_ref().map(|tables| {
                blocks(tables.iter().map(|(id, table)| {
                    flatten_physical_table(table).string("physical_table_map_id", id.clone())
                }))
            }),
        )
        .opt_value(
            "logical_table_map",
            data_set.logical_table_map.as_ref().map(|tables| {
                blocks(tables.iter().map(|(id, table)| {
                    flatten_logical_table(table).string("logical_table_map_id", id.clone())
                }))
            }),
        )
        .opt_value(
            "column_groups",
            data_set
                .column_groups
                .as_ref()
                .map(|groups| blocks(groups.iter().map(flatten_column_group))),
        )
        .opt_value(
            "column_level_permission_rules",
            data_set.column_level_permission_rules.as_ref().map(|rules| {
                blocks(rules.iter().map(|rule| {
                    AttrBuilder::new()
                        .opt_strings("column_names", rule.column_names.as_ref())
                        .opt_strings("principals", rule.principals.as_ref())
                }))
            }),
        )
        .opt_block(
            "data_set_usage_configuration",
            data_set.data_set_usage_configuration.as_ref().map(|c| {
                AttrBuilder::new()
                    .opt_bool(
                        "disable_use_as_direct_query_source",
                        c.disable_use_as_direct_query_source,
                    )
                    .opt_bool("disable_use_as_imported_source", c.disable_use_as_imported_source)
            }),
        )
        .opt_value(
            "field_folders",
            data_set.field_folders.as_ref().map(|folders| {
                blocks(folders.iter().map(|(id, folder)| {
                    AttrBuilder::new()
                        .string("field_folders_id", id.clone())
                        .opt_string("description", folder.description.as_ref())
                        .opt_strings("columns", folder.columns.as_ref())
                }))
            }),
        )
        .opt_block(
            "row_level_permission_data_set",
            data_set.row_level_permission_data_set.as_ref().map(|rls| {
                AttrBuilder::new()
                    .string("arn", rls.arn.clone())
                    .string("permission_policy", rls.permission_policy.clone())
                    .opt_string("namespace", rls.namespace.as_ref())
                    .opt_string("format_version", rls.format_version.as_ref())
                    .opt_string("status", rls.status.as_ref())
            }),
        )
        .opt_block(
            "row_level_permission_tag_configuration",
            data_set
                .row_level_permission_tag_configuration
                .as_ref()
                .map(flatten_tag_configuration),
        )
        .opt_block(
            "refresh_properties",
            data_set
                .data_set_refresh_properties
                .as_ref()
                .map(flatten_refresh_properties),
        )
        .opt_value(
            PERMISSIONS_ATTRIBUTE,
            data_set.permissions.as_deref().map(flatten_permissions),
        )
        .opt_value("tags", data_set.tags.as_deref().map(flatten_tags))
        .opt_value(
            "output_columns",
            data_set.output_columns.as_ref().map(|columns| {
                blocks(columns.iter().map(|column| {
                    AttrBuilder::new()
                        .opt_string("name", column.name.as_ref())
                        .opt_string("description", column.description.as_ref())
                        .opt_string("type", column.column_type.as_ref())
                }))
            }),
        )
        .build()
}

fn blocks(items: impl Iterator<Item = AttrBuilder>) -> Value {
    Value::List(items.map(AttrBuilder::into_value).collect())
}

fn flatten_input_columns(columns: &[InputColumn]) -> Value {
    blocks(columns.iter().map(|c| {
        AttrBuilder::new()
            .string("name", c.name.clone())
            .string("type", c.column_type.clone())
    }))
}

fn flatten_physical_table(table: &PhysicalTable) -> AttrBuilder {
    match table {
        PhysicalTable::CustomSql(sql) => AttrBuilder::new().block(
            "custom_sql",
            AttrBuilder::new()
                .string("data_source_arn", sql.data_source_arn.clone())
                .string("name", sql.name.clone())
                .string("sql_query", sql.sql_query.clone())
                .opt_value("columns", sql.columns.as_deref().map(flatten_input_columns)),
        ),
        PhysicalTable::RelationalTable(t) => AttrBuilder::new().block(
            "relational_table",
            AttrBuilder::new()
                .string("data_source_arn", t.data_source_arn.clone())
                .opt_string("catalog", t.catalog.as_ref())
                .opt_string("schema", t.schema.as_ref())
                .string("name", t.name.clone())
                .value("input_columns", flatten_input_columns(&t.input_columns)),
        ),
        PhysicalTable::S3Source(s3) => AttrBuilder::new().block(
            "s3_source",
            AttrBuilder::new()
                .string("data_source_arn", s3.data_source_arn.clone())
                .value("input_columns", flatten_input_columns(&s3.input_columns))
                .opt_block(
                    "upload_settings",
                    s3.upload_settings.as_ref().map(|u| {
                        AttrBuilder::new()
                            .opt_string("format", u.format.as_ref())
                            .opt_int("start_from_row", u.start_from_row)
                            .opt_bool("contains_header", u.contains_header)
                            .opt_string("text_qualifier", u.text_qualifier.as_ref())
                            .opt_string("delimiter", u.delimiter.as_ref())
                    }),
                ),
        ),
    }
}

fn flatten_logical_table(table: &LogicalTable) -> AttrBuilder {
    let source = match &table.source {
        LogicalTableSource::DataSetArn(arn) => {
            AttrBuilder::new().string("data_set_arn", arn.clone())
        }
        LogicalTableSource::PhysicalTableId(id) => {
            AttrBuilder::new().string("physical_table_id", id.clone())
        }
        LogicalTableSource::JoinInstruction(j) => {
            let key_properties = |k: &Option<JoinKeyProperties>| {
                k.as_ref()
                    .map(|k| AttrBuilder::new().opt_bool("unique_key", k.unique_key))
            };
            AttrBuilder::new().block(
                "join_instruction",
                AttrBuilder::new()
                    .string("left_operand", j.left_operand.clone())
                    .string("right_operand", j.right_operand.clone())
                    .string("on_clause", j.on_clause.clone())
                    .string("type", j.join_type.clone())
                    .opt_block(
                        "left_join_key_properties",
                        key_properties(&j.left_join_key_properties),
                    )
                    .opt_block(
                        "right_join_key_properties",
                        key_properties(&j.right_join_key_properties),
                    ),
            )
        }
    };

    let builder = AttrBuilder::new()
        .string("alias", table.alias.clone())
        .block("source", source);
    if table.data_transforms.is_empty() {
        builder
    } else {
        builder.blocks(
            "data_transforms",
            table.data_transforms.iter().map(flatten_transform),
        )
    }
}

fn flatten_transform(operation: &TransformOperation) -> AttrBuilder {
    let (name, op) = match operation {
        TransformOperation::CastColumnTypeOperation(cast) => (
            "cast_column_type_operation",
            AttrBuilder::new()
                .string("column_name", cast.column_name.clone())
                .string("new_column_type", cast.new_column_type.clone())
                .opt_string("format", cast.format.as_ref()),
        ),
        TransformOperation::CreateColumnsOperation(create) => (
            "create_columns_operation",
            AttrBuilder::new().blocks(
                "columns",
                create.columns.iter().map(|c| {
                    AttrBuilder::new()
                        .string("column_id", c.column_id.clone())
                        .string("column_name", c.column_name.clone())
                        .string("expression", c.expression.clone())
                }),
            ),
        ),
        TransformOperation::FilterOperation(filter) => (
            "filter_operation",
            AttrBuilder::new().string("condition_expression", filter.condition_expression.clone()),
        ),
        TransformOperation::ProjectOperation(project) => (
            "project_operation",
            AttrBuilder::new().strings("projected_columns", &project.projected_columns),
        ),
        TransformOperation::RenameColumnOperation(rename) => (
            "rename_column_operation",
            AttrBuilder::new()
                .string("column_name", rename.column_name.clone())
                .string("new_column_name", rename.new_column_name.clone()),
        ),
        TransformOperation::TagColumnOperation(tag) => (
            "tag_column_operation",
            AttrBuilder::new()
                .string("column_name", tag.column_name.clone())
                .blocks(
                    "tags",
                    tag.tags.iter().map(|t| {
                        AttrBuilder::new()
                            .opt_string("column_geographic_role", t.column_geographic_role.as_ref())
                            .opt_block(
                                "column_description",
                                t.column_description.as_ref().map(|d| {
                                    AttrBuilder::new().opt_string("text", d.text.as_ref())
                                }),
                            )
                    }),
                ),
        ),
        TransformOperation::UntagColumnOperation(untag) => (
            "untag_column_operation",
            AttrBuilder::new()
                .string("column_name", untag.column_name.clone())
                .strings("tag_names", &untag.tag_names),
        ),
    };
    AttrBuilder::new().block(name, op)
}

fn flatten_column_group(group: &ColumnGroup) -> AttrBuilder {
    AttrBuilder::new().opt_block(
        "geo_spatial_column_group",
        group.geo_spatial_column_group.as_ref().map(|g| {
            AttrBuilder::new()
                .string("name", g.name.clone())
                .string("country_code", g.country_code.clone())
                .strings("columns", &g.columns)
        }),
    )
}

fn flatten_tag_configuration(config: &RowLevelPermissionTagConfiguration) -> AttrBuilder {
    AttrBuilder::new()
        .opt_string("status", config.status.as_ref())
        .blocks(
            "tag_rules",
            config.tag_rules.iter().map(|rule| {
                AttrBuilder::new()
                    .string("column_name", rule.column_name.clone())
                    .string("tag_key", rule.tag_key.clone())
                    .opt_string("match_all_value", rule.match_all_value.as_ref())
                    .opt_string(
                        "tag_multi_value_delimiter",
                        rule.tag_multi_value_delimiter.as_ref(),
                    )
            }),
        )
}

fn flatten_refresh_properties(properties: &DataSetRefreshProperties) -> AttrBuilder {
    let window = &properties
        .refresh_configuration
        .incremental_refresh
        .lookback_window;
    AttrBuilder::new().block(
        "refresh_configuration",
        AttrBuilder::new().block(
            "incremental_refresh",
            AttrBuilder::new().block(
                "lookback_window",
                AttrBuilder::new()
                    .string("column_name", window.column_name.clone())
                    .int("size", window.size)
                    .string("size_unit", window.size_unit.clone()),
            ),
        ),
    )
}
