//! Differ - Compare desired state with current state to generate a Plan
//!
//! Compares the "desired state" declared in configuration with the "current state"
//! fetched from the Provider (or recorded in state), and generates the list of
//! required Effects (Plan). Permissions are not compared as plain values: they
//! produce a grant/revoke delta instead.

use std::collections::{HashMap, HashSet};

use crate::effect::Effect;
use crate::permission::{PERMISSIONS_ATTRIBUTE, PermissionDelta, PermissionError, PermissionSet};
use crate::plan::Plan;
use crate::resource::{Resource, ResourceId, State, Value};
use crate::schema::ResourceSchema;

/// Result of a diff operation
#[derive(Debug, Clone, PartialEq)]
pub enum Diff {
    /// Resource does not exist -> needs creation
    Create(Resource),
    /// Resource exists with differences -> needs update
    Update {
        id: ResourceId,
        from: State,
        to: Resource,
        changed_attributes: Vec<String>,
        permissions: Option<PermissionDelta>,
    },
    /// Resource exists with no differences -> no action needed
    NoChange(ResourceId),
    /// Resource exists but not in desired state -> needs deletion
    Delete(State),
}

impl Diff {
    /// Returns whether this Diff involves a change
    pub fn is_change(&self) -> bool {
        !matches!(self, Diff::NoChange(_))
    }
}

/// Compare desired state with current state to compute a Diff
pub fn diff(desired: &Resource, current: &State) -> Result<Diff, PermissionError> {
    diff_ignoring(desired, current, &HashSet::new())
}

/// Like [`diff`], skipping the named attributes (e.g. write-only ones the
/// provider cannot read back)
pub fn diff_ignoring(
    desired: &Resource,
    current: &State,
    ignored: &HashSet<&str>,
) -> Result<Diff, PermissionError> {
    if !current.exists {
        return Ok(Diff::Create(desired.clone()));
    }

    let changed = find_changed_attributes(&desired.attributes, &current.attributes, ignored);
    let permissions = permission_delta(&desired.attributes, &current.attributes)?;

    if changed.is_empty() && permissions.is_none() {
        Ok(Diff::NoChange(desired.id.clone()))
    } else {
        Ok(Diff::Update {
            id: desired.id.clone(),
            from: current.clone(),
            to: desired.clone(),
            changed_attributes: changed,
            permissions,
        })
    }
}

/// Find changed attributes between desired and current state, sorted by name
fn find_changed_attributes(
    desired: &HashMap<String, Value>,
    current: &HashMap<String, Value>,
    ignored: &HashSet<&str>,
) -> Vec<String> {
    let mut changed = Vec::new();

    for (key, desired_value) in desired {
        // Skip internal attributes (starting with _)
        if key.starts_with('_') || key == PERMISSIONS_ATTRIBUTE || ignored.contains(key.as_str())
        {
            continue;
        }

        match current.get(key) {
            Some(current_value) if value_matches(desired_value, current_value) => {}
            _ => changed.push(key.clone()),
        }
    }

    changed.sort();
    changed
}

/// Whether `current` satisfies `desired`. Map keys the configuration leaves
/// out are filled in by the service and do not count as differences.
fn value_matches(desired: &Value, current: &Value) -> bool {
    match (desired, current) {
        (Value::Map(want), Value::Map(have)) => want
            .iter()
            .all(|(k, v)| have.get(k).is_some_and(|h| value_matches(v, h))),
        (Value::List(want), Value::List(have)) => {
            want.len() == have.len() && want.iter().zip(have).all(|(w, h)| value_matches(w, h))
        }
        (Value::Float(_) | Value::Int(_), Value::Float(_) | Value::Int(_)) => {
            desired.as_float() == current.as_float()
        }
        _ => desired == current,
    }
}

/// Grant/revoke delta for the permissions attribute, `None` when unchanged.
/// A missing attribute is an empty permission set.
fn permission_delta(
    desired: &HashMap<String, Value>,
    current: &HashMap<String, Value>,
) -> Result<Option<PermissionDelta>, PermissionError> {
    let read = |attrs: &HashMap<String, Value>| match attrs.get(PERMISSIONS_ATTRIBUTE) {
        Some(value) => PermissionSet::from_value(value),
        None => Ok(PermissionSet::empty()),
    };

    let delta = read(current)?.diff(&read(desired)?);
    Ok((!delta.is_empty()).then_some(delta))
}

/// Compute Diff for multiple resources and generate a Plan
///
/// Resources recorded in `current_states` but absent from `desired` are deleted.
/// An update that touches a `force_new` attribute of the resource's schema
/// becomes a replacement; `write_only` attributes are never compared.
pub fn create_plan(
    desired: &[Resource],
    current_states: &HashMap<ResourceId, State>,
    schemas: &HashMap<String, ResourceSchema>,
) -> Result<Plan, PermissionError> {
    let mut plan = Plan::new();

    for resource in desired {
        let current = current_states
            .get(&resource.id)
            .cloned()
            .unwrap_or_else(|| State::not_found(resource.id.clone()));

        let schema = schemas.get(&resource.id.resource_type);
        let ignored = schema
            .map(ResourceSchema::write_only_attributes)
            .unwrap_or_default();

        match diff_ignoring(resource, &current, &ignored)? {
            Diff::Create(r) => plan.add(Effect::Create(r)),
            Diff::Update {
                id,
                from,
                to,
                changed_attributes,
                permissions,
            } => {
                let force_new = schema
                    .map(ResourceSchema::force_new_attributes)
                    .unwrap_or_default();
                if changed_attributes
                    .iter()
                    .any(|name| force_new.contains(name.as_str()))
                {
                    plan.add(Effect::Replace {
                        id,
                        from,
                        to,
                        changed_attributes,
                    });
                } else {
                    plan.add(Effect::Update {
                        id,
                        from,
                        to,
                        changed_attributes,
                        permissions,
                    });
                }
            }
            Diff::NoChange(_) => {}
            Diff::Delete(state) => plan.add(Effect::Delete(state)),
        }
    }

    let declared: HashSet<&ResourceId> = desired.iter().map(|r| &r.id).collect();
    let mut orphaned: Vec<&State> = current_states
        .values()
        .filter(|state| state.exists && !declared.contains(&state.id))
        .collect();
    orphaned.sort_by_key(|state| state.id.to_string());
    for state in orphaned {
        plan.add(Effect::Delete(state.clone()));
    }

    Ok(plan)
}
