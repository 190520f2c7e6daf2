//! Plan and permission delta rendering

use colored::Colorize;

use prism_core::effect::Effect;
use prism_core::permission::{PERMISSIONS_ATTRIBUTE, Permission, PermissionDelta};
use prism_core::plan::Plan;
use prism_core::resource::Value;

pub fn print_plan(plan: &Plan) {
    if plan.is_empty() {
        println!("{}", "No changes. Infrastructure is up-to-date.".green());
        return;
    }

    println!("{}", "Execution Plan:".cyan().bold());
    println!();

    for effect in plan.effects() {
        print_effect(effect);
        println!();
    }

    println!("{}", plan.summary().to_string().bold());
}

fn print_effect(effect: &Effect) {
    match effect {
        Effect::Read(id) => println!("  {} {}", "?".normal(), id.to_string().cyan()),
        Effect::Create(resource) => {
            println!(
                "  {} {}",
                "+".green().bold(),
                resource.id.to_string().cyan().bold()
            );
            let mut keys: Vec<&String> = resource
                .attributes
                .keys()
                .filter(|k| !k.starts_with('_') && k.as_str() != PERMISSIONS_ATTRIBUTE)
                .collect();
            keys.sort_by(|a, b| match (a.as_str(), b.as_str()) {
                ("name", _) => std::cmp::Ordering::Less,
                (_, "name") => std::cmp::Ordering::Greater,
                _ => a.cmp(b),
            });
            for key in keys {
                println!(
                    "      {}: {}",
                    key,
                    format_value(&resource.attributes[key]).green()
                );
            }
            if let Some(value) = resource.attributes.get(PERMISSIONS_ATTRIBUTE)
                && let Ok(set) = prism_core::permission::PermissionSet::from_value(value)
            {
                for permission in set.iter() {
                    println!("      {}", format_grant(permission).green());
                }
            }
        }
        Effect::Update {
            id,
            from,
            to,
            changed_attributes,
            permissions,
        } => {
            println!("  {} {}", "~".yellow().bold(), id.to_string().cyan().bold());
            for key in changed_attributes {
                println!(
                    "      {}",
                    format_change(key, from.attributes.get(key), to.attributes.get(key))
                        .yellow()
                );
            }
            if let Some(delta) = permissions {
                print_permission_delta(delta, "      ");
            }
        }
        Effect::Replace {
            id,
            from,
            to,
            changed_attributes,
        } => {
            println!(
                "  {} {}",
                "-/+".magenta().bold(),
                id.to_string().cyan().bold()
            );
            for key in changed_attributes {
                println!(
                    "      {} {}",
                    format_change(key, from.attributes.get(key), to.attributes.get(key))
                        .magenta(),
                    "(forces replacement)".dimmed()
                );
            }
        }
        Effect::Delete(state) => {
            println!("  {} {}", "-".red().bold(), state.id.to_string().cyan().bold());
        }
    }
}

/// Print grants and revokes, one principal per line
pub fn print_permission_delta(delta: &PermissionDelta, indent: &str) {
    for permission in &delta.to_grant {
        println!("{}{}", indent, format_grant(permission).green());
    }
    for permission in &delta.to_revoke {
        println!("{}{}", indent, format_revoke(permission).red());
    }
}

pub fn format_grant(permission: &Permission) -> String {
    format!("+ {}", format_permission(permission))
}

pub fn format_revoke(permission: &Permission) -> String {
    format!("- {}", format_permission(permission))
}

fn format_permission(permission: &Permission) -> String {
    let actions: Vec<&str> = permission.actions.iter().map(String::as_str).collect();
    format!("{}: {}", permission.principal, actions.join(", "))
}

fn format_change(key: &str, from: Option<&Value>, to: Option<&Value>) -> String {
    let render = |value: Option<&Value>| {
        value
            .map(format_value)
            .unwrap_or_else(|| "(none)".to_string())
    };
    format!("{}: {} -> {}", key, render(from), render(to))
}

/// Render a value on one line; map keys are sorted
pub fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => format!("\"{}\"", s),
        Value::Int(n) => n.to_string(),
        Value::Float(f) => f.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::List(items) => {
            let strs: Vec<String> = items.iter().map(format_value).collect();
            format!("[{}]", strs.join(", "))
        }
        Value::Map(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            let strs: Vec<String> = entries
                .into_iter()
                .map(|(k, v)| format!("{}: {}", k, format_value(v)))
                .collect();
            format!("{{{}}}", strs.join(", "))
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn formats_nested_values() {
        let value = Value::List(vec![Value::Map(HashMap::from([
            ("name".to_string(), Value::string("region")),
            ("type".to_string(), Value::string("STRING")),
        ]))]);
        assert_eq!(
            format_value(&value),
            r#"[{name: "region", type: "STRING"}]"#
        );
        assert_eq!(format_value(&Value::Int(5)), "5");
        assert_eq!(format_value(&Value::Bool(false)), "false");
    }

    #[test]
    fn formats_permissions_with_sorted_actions() {
        let permission = Permission::new(
            "arn:aws:quicksight:us-east-1:123456789012:user/default/alice",
            ["quicksight:UpdateDataSet", "quicksight:DescribeDataSet"],
        );
        assert_eq!(
            format_grant(&permission),
            "+ arn:aws:quicksight:us-east-1:123456789012:user/default/alice: \
             quicksight:DescribeDataSet, quicksight:UpdateDataSet"
        );
        assert!(format_revoke(&permission).starts_with("- arn:"));
    }

    #[test]
    fn formats_attribute_changes() {
        assert_eq!(
            format_change("name", Some(&Value::string("old")), Some(&Value::string("new"))),
            r#"name: "old" -> "new""#
        );
        assert_eq!(
            format_change("version_description", None, Some(&Value::string("v2"))),
            r#"version_description: (none) -> "v2""#
        );
    }
}
