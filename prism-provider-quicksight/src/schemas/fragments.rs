//! Schema fragments shared by several QuickSight resources
//!
//! Fragments are built once and cloned on use.

use std::sync::Arc;

use once_cell::sync::Lazy;
use prism_core::permission::{PERMISSIONS_ATTRIBUTE, PermissionSet};
use prism_core::resource::Value;
use prism_core::schema::{AttributeSchema, AttributeType, BlockSchema, types};

/// Column types accepted for physical table input columns
pub const INPUT_COLUMN_DATA_TYPES: &[&str] = &[
    "STRING", "INTEGER", "DECIMAL", "DATETIME", "BIT", "BOOLEAN", "JSON",
];

pub const STATUS: &[&str] = &["ENABLED", "DISABLED"];

static PERMISSIONS: Lazy<AttributeSchema> = Lazy::new(|| {
    let permission = BlockSchema::new()
        .attribute(
            AttributeSchema::new(
                "actions",
                AttributeType::Set(Box::new(AttributeType::String)),
            )
            .required()
            .min_items(1)
            .max_items(20),
        )
        .attribute(AttributeSchema::new("principal", types::string_len_between(1, 256)).required());

    // Set items are compared whole; a principal must also appear only once
    let permissions = AttributeType::Custom {
        name: "Permissions".to_string(),
        base: Box::new(AttributeType::block_set(permission)),
        validate: Arc::new(|value: &Value| {
            PermissionSet::from_value(value)
                .map(|_| ())
                .map_err(|e| e.to_string())
        }),
    };

    AttributeSchema::new(PERMISSIONS_ATTRIBUTE, permissions)
        .min_items(1)
        .max_items(64)
        .with_provider_name("Permissions")
        .with_description("Principals and the actions they may perform on the resource")
});

static INPUT_COLUMNS: Lazy<AttributeType> = Lazy::new(|| {
    AttributeType::block_list(
        BlockSchema::new()
            .attribute(AttributeSchema::new("name", types::string_len_between(1, 128)).required())
            .attribute(
                AttributeSchema::new("type", AttributeType::enumeration(INPUT_COLUMN_DATA_TYPES))
                    .required(),
            ),
    )
});

static TAGS: Lazy<AttributeSchema> = Lazy::new(|| {
    AttributeSchema::new("tags", AttributeType::Map(Box::new(AttributeType::String)))
        .max_items(50)
        .with_provider_name("Tags")
});

/// `permissions`: set of 1-64 `{ principal, actions }` blocks
pub fn permissions() -> AttributeSchema {
    PERMISSIONS.clone()
}

/// `tags`: string map sent as a CloudFormation tag list
pub fn tags() -> AttributeSchema {
    TAGS.clone()
}

/// List of `{ name, type }` column blocks
pub fn input_columns() -> AttributeType {
    INPUT_COLUMNS.clone()
}

/// Required resource ID: 1-512 characters of `[\w-]`
pub fn id(name: &str, provider_name: &str) -> AttributeSchema {
    AttributeSchema::new(name, types::id_string())
        .required()
        .force_new()
        .with_provider_name(provider_name)
}

/// Optional account ID, filled from the provider configuration when absent
pub fn aws_account_id() -> AttributeSchema {
    AttributeSchema::new("aws_account_id", types::account_id())
        .computed()
        .force_new()
        .with_provider_name("AwsAccountId")
}

/// Computed ARN of the resource itself
pub fn arn() -> AttributeSchema {
    AttributeSchema::new("arn", AttributeType::String)
        .read_only()
        .with_provider_name("Arn")
}

/// Required ARN string
pub fn arn_string(name: &str) -> AttributeSchema {
    AttributeSchema::new(name, types::arn()).required()
}

/// Single nested block (a one-element list)
pub fn single_block(name: &str, block: BlockSchema) -> AttributeSchema {
    AttributeSchema::new(name, AttributeType::block_list(block)).max_items(1)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use prism_core::resource::Value;

    use super::*;

    fn permission(principal: &str, actions: &[&str]) -> Value {
        Value::Map(HashMap::from([
            ("principal".to_string(), Value::string(principal)),
            (
                "actions".to_string(),
                Value::List(actions.iter().map(|a| Value::string(*a)).collect()),
            ),
        ]))
    }

    fn validate(value: Value) -> Result<(), Vec<prism_core::schema::TypeError>> {
        BlockSchema::new()
            .attribute(permissions())
            .validate(&HashMap::from([(PERMISSIONS_ATTRIBUTE.to_string(), value)]))
    }

    #[test]
    fn permissions_accept_valid_entries() {
        assert!(validate(Value::List(vec![permission("arn:aws:iam::1:user/a", &["x"])])).is_ok());
    }

    #[test]
    fn permissions_reject_empty_actions_and_principal() {
        assert!(validate(Value::List(vec![permission("p", &[])])).is_err());
        assert!(validate(Value::List(vec![permission("", &["x"])])).is_err());
        assert!(validate(Value::List(vec![])).is_err());
    }

    #[test]
    fn permissions_reject_too_many_actions() {
        let actions: Vec<String> = (0..21).map(|i| format!("quicksight:Action{}", i)).collect();
        let refs: Vec<&str> = actions.iter().map(String::as_str).collect();
        assert!(validate(Value::List(vec![permission("p", &refs)])).is_err());
    }

    #[test]
    fn permissions_reject_repeated_principal() {
        let alice = "arn:aws:quicksight:us-east-1:123456789012:user/default/alice";
        let errors = validate(Value::List(vec![
            permission(alice, &["quicksight:DescribeDataSet"]),
            permission(alice, &["quicksight:UpdateDataSet"]),
        ]))
        .unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(
            errors[0]
                .to_string()
                .contains(&format!("Principal '{}' appears more than once", alice))
        );
    }

    #[test]
    fn template_with_repeated_principal_fails_validation() {
        let alice = "arn:aws:quicksight:us-east-1:123456789012:user/default/alice";
        let source = Value::List(vec![Value::Map(HashMap::from([(
            "source_template".to_string(),
            Value::List(vec![Value::Map(HashMap::from([(
                "arn".to_string(),
                Value::string("arn:aws:quicksight:us-east-1:123456789012:template/base"),
            )]))]),
        )]))]);
        let attrs = HashMap::from([
            ("template_id".to_string(), Value::string("report")),
            ("name".to_string(), Value::string("Report")),
            ("source_entity".to_string(), source),
            (
                PERMISSIONS_ATTRIBUTE.to_string(),
                Value::List(vec![
                    permission(alice, &["quicksight:DescribeTemplate"]),
                    permission(alice, &["quicksight:UpdateTemplate"]),
                ]),
            ),
        ]);

        assert!(crate::schemas::template::schema().validate(&attrs).is_err());
    }

    #[test]
    fn fragments_are_shared() {
        assert_eq!(permissions().name, PERMISSIONS_ATTRIBUTE);
        assert_eq!(tags().provider_name.as_deref(), Some("Tags"));
        assert!(id("data_set_id", "DataSetId").force_new);
    }
}
