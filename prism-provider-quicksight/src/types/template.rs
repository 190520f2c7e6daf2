use prism_core::permission::Permission;
use serde::{Deserialize, Serialize};

use super::Tag;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Template {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aws_account_id: Option<String>,
    pub template_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Not returned by reads
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_entity: Option<TemplateSourceEntity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub permissions: Option<Vec<Permission>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<Tag>>,
    #[serde(default, skip_serializing)]
    pub arn: Option<String>,
    #[serde(default, skip_serializing)]
    pub version: Option<TemplateVersion>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TemplateSourceEntity {
    SourceAnalysis(TemplateSourceAnalysis),
    SourceTemplate(TemplateSourceTemplate),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TemplateSourceAnalysis {
    pub arn: String,
    pub data_set_references: Vec<DataSetReference>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DataSetReference {
    pub data_set_arn: String,
    pub data_set_placeholder: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TemplateSourceTemplate {
    pub arn: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TemplateVersion {
    #[serde(default)]
    pub version_number: Option<i64>,
    #[serde(default)]
    pub description: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn source_analysis_shape() {
        let entity = TemplateSourceEntity::SourceAnalysis(TemplateSourceAnalysis {
            arn: "arn:aws:quicksight:us-east-1:123456789012:analysis/a".to_string(),
            data_set_references: vec![DataSetReference {
                data_set_arn: "arn:aws:quicksight:us-east-1:123456789012:dataset/d".to_string(),
                data_set_placeholder: "main".to_string(),
            }],
        });
        assert_eq!(
            serde_json::to_value(&entity).unwrap(),
            json!({
                "SourceAnalysis": {
                    "Arn": "arn:aws:quicksight:us-east-1:123456789012:analysis/a",
                    "DataSetReferences": [{
                        "DataSetArn": "arn:aws:quicksight:us-east-1:123456789012:dataset/d",
                        "DataSetPlaceholder": "main"
                    }]
                }
            })
        );
    }

    #[test]
    fn read_carries_version_but_no_source() {
        let template: Template = serde_json::from_value(json!({
            "TemplateId": "report",
            "Name": "Report",
            "Arn": "arn:aws:quicksight:us-east-1:123456789012:template/report",
            "Version": {"VersionNumber": 3}
        }))
        .unwrap();
        assert!(template.source_entity.is_none());
        assert_eq!(template.version.unwrap().version_number, Some(3));
    }
}
