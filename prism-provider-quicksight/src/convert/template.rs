//! Template expand / flatten

use std::collections::HashMap;

use prism_core::permission::PERMISSIONS_ATTRIBUTE;
use prism_core::resource::Value;

use super::{
    AttrBuilder, AttrReader, ExpandError, expand_optional_permissions, expand_tags,
    flatten_permissions, flatten_tags,
};
use crate::types::template::*;

pub fn expand_template(attrs: &HashMap<String, Value>) -> Result<Template, ExpandError> {
    let r = AttrReader::root(attrs);
    Ok(Template {
        aws_account_id: r.opt_string("aws_account_id")?,
        template_id: r.string("template_id")?,
        name: r.opt_string("name")?,
        source_entity: r
            .opt_block("source_entity")?
            .map(|b| expand_source_entity(&b))
            .transpose()?,
        version_description: r.opt_string("version_description")?,
        permissions: expand_optional_permissions(&r)?,
        tags: expand_tags(&r)?,
        arn: None,
        version: None,
    })
}

fn expand_source_entity(r: &AttrReader<'_>) -> Result<TemplateSourceEntity, ExpandError> {
    match r.one_of(&["source_analysis", "source_template"])? {
        "source_template" => {
            let source = r.block("source_template")?;
            Ok(TemplateSourceEntity::SourceTemplate(TemplateSourceTemplate {
                arn: source.string("arn")?,
            }))
        }
        _ => {
            let source = r.block("source_analysis")?;
            let data_set_references = source
                .blocks("data_set_references")?
                .iter()
                .map(|reference| {
                    Ok(DataSetReference {
                        data_set_arn: reference.string("data_set_arn")?,
                        data_set_placeholder: reference.string("data_set_placeholder")?,
                    })
                })
                .collect::<Result<_, ExpandError>>()?;
            Ok(TemplateSourceEntity::SourceAnalysis(TemplateSourceAnalysis {
                arn: source.string("arn")?,
                data_set_references,
            }))
        }
    }
}

pub fn flatten_template(template: &Template) -> HashMap<String, Value> {
    AttrBuilder::new()
        .opt_string("arn", template.arn.as_ref())
        .opt_string("aws_account_id", template.aws_account_id.as_ref())
        .string("template_id", template.template_id.clone())
        .opt_string("name", template.name.as_ref())
        .opt_block(
            "source_entity",
            template.source_entity.as_ref().map(flatten_source_entity),
        )
        .opt_string("version_description", template.version_description.as_ref())
        .opt_int(
            "version_number",
            template.version.as_ref().and_then(|v| v.version_number),
        )
        .opt_value(
            PERMISSIONS_ATTRIBUTE,
            template.permissions.as_deref().map(flatten_permissions),
        )
        .opt_value("tags", template.tags.as_deref().map(flatten_tags))
        .build()
}

fn flatten_source_entity(entity: &TemplateSourceEntity) -> AttrBuilder {
    match entity {
        TemplateSourceEntity::SourceTemplate(source) => AttrBuilder::new().block(
            "source_template",
            AttrBuilder::new().string("arn", source.arn.clone()),
        ),
        TemplateSourceEntity::SourceAnalysis(source) => AttrBuilder::new().block(
            "source_analysis",
            AttrBuilder::new()
                .string("arn", source.arn.clone())
                .blocks(
                    "data_set_references",
                    source.data_set_references.iter().map(|reference| {
                        AttrBuilder::new()
                            .string("data_set_arn", reference.data_set_arn.clone())
                            .string("data_set_placeholder", reference.data_set_placeholder.clone())
                    }),
                ),
        ),
    }
}
