//! Resource identifiers and ARNs
//!
//! State records a composite identifier per resource: the account and the
//! resource ID joined by a separator (`,` for data sets, `/` for data sources
//! and templates). Cloud Control uses its own `|`-joined form.

use crate::resources::ResourceKind;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdError {
    #[error("unexpected format of ID ({id}), expected {expected}")]
    UnexpectedFormat { id: String, expected: String },
}

fn create(separator: char, account_id: &str, id: &str) -> String {
    format!("{}{}{}", account_id, separator, id)
}

fn parse(separator: char, id: &str) -> Result<(String, String), IdError> {
    let parts: Vec<&str> = id.split(separator).collect();
    match parts.as_slice() {
        [account, resource] if !account.is_empty() && !resource.is_empty() => {
            Ok((account.to_string(), resource.to_string()))
        }
        _ => Err(IdError::UnexpectedFormat {
            id: id.to_string(),
            expected: format!("AWS_ACCOUNT_ID{}ID", separator),
        }),
    }
}

/// Composite identifier for any resource kind
pub fn create_id(kind: ResourceKind, account_id: &str, id: &str) -> String {
    create(kind.id_separator(), account_id, id)
}

pub fn parse_id(kind: ResourceKind, id: &str) -> Result<(String, String), IdError> {
    parse(kind.id_separator(), id)
}

/// Cloud Control primary identifier (`AwsAccountId|ResourceId`)
pub fn cloud_control_identifier(account_id: &str, id: &str) -> String {
    create('|', account_id, id)
}

/// `arn:aws:quicksight:{region}:{account}:{dataset|datasource|template}/{id}`
pub fn arn(kind: ResourceKind, region: &str, account_id: &str, id: &str) -> String {
    format!(
        "arn:aws:quicksight:{}:{}:{}/{}",
        region,
        account_id,
        kind.arn_segment(),
        id
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_set_id_uses_comma() {
        let id = create_id(ResourceKind::DataSet, "123456789012", "sales");
        assert_eq!(id, "123456789012,sales");
        assert_eq!(
            parse_id(ResourceKind::DataSet, &id).unwrap(),
            ("123456789012".to_string(), "sales".to_string())
        );
    }

    #[test]
    fn data_source_and_template_ids_use_slash() {
        assert_eq!(
            create_id(ResourceKind::DataSource, "123456789012", "db"),
            "123456789012/db"
        );
        assert_eq!(
            create_id(ResourceKind::Template, "123456789012", "report"),
            "123456789012/report"
        );
        assert_eq!(
            parse_id(ResourceKind::Template, "123456789012/report").unwrap().1,
            "report".to_string()
        );
    }

    #[test]
    fn malformed_ids_are_rejected() {
        for bad in ["sales", ",sales", "123456789012,", "a,b,c", ""] {
            assert!(
                matches!(
                    parse_id(ResourceKind::DataSet, bad),
                    Err(IdError::UnexpectedFormat { .. })
                ),
                "{bad} should be rejected"
            );
        }
        assert!(parse_id(ResourceKind::DataSource, "123456789012,db").is_err());
    }

    #[test]
    fn error_names_expected_format() {
        let err = parse_id(ResourceKind::DataSource, "nope").unwrap_err();
        assert_eq!(
            err.to_string(),
            "unexpected format of ID (nope), expected AWS_ACCOUNT_ID/ID"
        );
    }

    #[test]
    fn arns_follow_quicksight_format() {
        assert_eq!(
            arn(ResourceKind::DataSource, "us-east-1", "123456789012", "db"),
            "arn:aws:quicksight:us-east-1:123456789012:datasource/db"
        );
        assert_eq!(
            arn(ResourceKind::DataSet, "us-east-1", "123456789012", "sales"),
            "arn:aws:quicksight:us-east-1:123456789012:dataset/sales"
        );
        assert_eq!(
            arn(ResourceKind::Template, "eu-west-1", "123456789012", "report"),
            "arn:aws:quicksight:eu-west-1:123456789012:template/report"
        );
    }

    #[test]
    fn cloud_control_identifier_uses_pipe() {
        assert_eq!(
            cloud_control_identifier("123456789012", "sales"),
            "123456789012|sales"
        );
    }
}
