//! Schema for `quicksight.template` (AWS::QuickSight::Template)

use once_cell::sync::Lazy;
use prism_core::schema::{AttributeSchema, AttributeType, BlockSchema, ResourceSchema, types};

use super::fragments::{self, single_block};
use crate::resources::ResourceKind;

fn source_entity() -> AttributeSchema {
    let data_set_reference = BlockSchema::new()
        .attribute(fragments::arn_string("data_set_arn"))
        .attribute(
            AttributeSchema::new("data_set_placeholder", types::non_empty_string()).required(),
        );

    let source_analysis = BlockSchema::new()
        .attribute(fragments::arn_string("arn"))
        .attribute(
            AttributeSchema::new(
                "data_set_references",
                AttributeType::block_list(data_set_reference),
            )
            .required()
            .min_items(1),
        );

    let source_template = BlockSchema::new().attribute(fragments::arn_string("arn"));

    single_block(
        "source_entity",
        BlockSchema::new()
            .attribute(single_block("source_analysis", source_analysis))
            .attribute(single_block("source_template", source_template))
            .exactly_one_of(&["source_analysis", "source_template"]),
    )
    .required()
    .write_only()
    .with_provider_name("SourceEntity")
}

static SCHEMA: Lazy<ResourceSchema> = Lazy::new(|| {
    ResourceSchema::new(ResourceKind::Template.resource_type())
        .with_description("A QuickSight template created from an analysis or another template")
        .attribute(fragments::arn())
        .attribute(fragments::aws_account_id())
        .attribute(
            AttributeSchema::new("name", types::string_len_between(1, 2048))
                .required()
                .with_provider_name("Name"),
        )
        .attribute(fragments::permissions())
        .attribute(source_entity())
        .attribute(fragments::tags())
        .attribute(fragments::id("template_id", "TemplateId"))
        .attribute(
            AttributeSchema::new("version_description", types::string_len_between(1, 512))
                .with_provider_name("VersionDescription"),
        )
        .attribute(AttributeSchema::new("version_number", AttributeType::Int).read_only())
});

pub fn schema() -> ResourceSchema {
    SCHEMA.clone()
}
