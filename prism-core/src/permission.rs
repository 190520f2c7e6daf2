//! Permission - Compute grant/revoke deltas between two permission sets
//!
//! Resources carry a list of `(principal, actions)` pairs. When the desired list
//! differs from the recorded one, the API wants two lists: the permissions to
//! grant and the permissions to revoke. This module computes them.

use std::collections::{BTreeSet, HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::resource::Value;

/// Name of the attribute that carries a resource's permissions
pub const PERMISSIONS_ATTRIBUTE: &str = "permissions";

/// Actions granted to a single principal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Permission {
    /// User, group or role ARN
    pub principal: String,
    pub actions: BTreeSet<String>,
}

impl Permission {
    pub fn new<I, S>(principal: impl Into<String>, actions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            principal: principal.into(),
            actions: actions.into_iter().map(Into::into).collect(),
        }
    }
}

/// Malformed permission collection
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PermissionError {
    #[error("Principal '{0}' appears more than once")]
    DuplicatePrincipal(String),

    #[error("Principal must not be empty")]
    EmptyPrincipal,

    #[error("Malformed permissions: {0}")]
    Malformed(String),
}

/// The complete authorization state of a resource at one point in time
///
/// Every principal appears at most once and is non-empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PermissionSet {
    permissions: Vec<Permission>,
}

impl PermissionSet {
    pub fn new(permissions: Vec<Permission>) -> Result<Self, PermissionError> {
        let mut seen = HashSet::new();
        for permission in &permissions {
            if permission.principal.is_empty() {
                return Err(PermissionError::EmptyPrincipal);
            }
            if !seen.insert(permission.principal.as_str()) {
                return Err(PermissionError::DuplicatePrincipal(
                    permission.principal.clone(),
                ));
            }
        }
        Ok(Self { permissions })
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn permissions(&self) -> &[Permission] {
        &self.permissions
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Permission> {
        self.permissions.iter()
    }

    pub fn len(&self) -> usize {
        self.permissions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.permissions.is_empty()
    }

    /// Find the permission entry for a principal
    pub fn get(&self, principal: &str) -> Option<&Permission> {
        self.permissions.iter().find(|p| p.principal == principal)
    }

    pub fn into_vec(self) -> Vec<Permission> {
        self.permissions
    }

    /// Delta needed to move from `self` to `desired`
    pub fn diff(&self, desired: &PermissionSet) -> PermissionDelta {
        diff_permissions(self, desired)
    }
}

impl PermissionSet {
    /// Read a permission set from its attribute form: a list of
    /// `{ principal = "...", actions = ["..."] }` blocks.
    pub fn from_value(value: &Value) -> Result<Self, PermissionError> {
        let entries = value
            .as_list()
            .ok_or_else(|| PermissionError::Malformed("expected a list".to_string()))?;

        let mut permissions = Vec::with_capacity(entries.len());
        for (index, entry) in entries.iter().enumerate() {
            let map = entry.as_map().ok_or_else(|| {
                PermissionError::Malformed(format!("entry {} is not a block", index))
            })?;
            let principal = map
                .get("principal")
                .and_then(Value::as_str)
                .ok_or_else(|| {
                    PermissionError::Malformed(format!("entry {} has no principal", index))
                })?;
            let actions = match map.get("actions") {
                Some(Value::List(items)) => items
                    .iter()
                    .map(|item| {
                        item.as_str().map(str::to_string).ok_or_else(|| {
                            PermissionError::Malformed(format!(
                                "entry {} has a non-string action",
                                index
                            ))
                        })
                    })
                    .collect::<Result<BTreeSet<_>, _>>()?,
                Some(_) => {
                    return Err(PermissionError::Malformed(format!(
                        "entry {} has actions that are not a list",
                        index
                    )));
                }
                None => BTreeSet::new(),
            };
            permissions.push(Permission {
                principal: principal.to_string(),
                actions,
            });
        }

        Self::new(permissions)
    }

    /// Attribute form of the set, actions sorted
    pub fn to_value(&self) -> Value {
        Value::List(
            self.permissions
                .iter()
                .map(|p| {
                    Value::Map(HashMap::from([
                        ("principal".to_string(), Value::string(&p.principal)),
                        (
                            "actions".to_string(),
                            Value::List(p.actions.iter().map(Value::string).collect()),
                        ),
                    ]))
                })
                .collect(),
        )
    }
}

impl TryFrom<Vec<Permission>> for PermissionSet {
    type Error = PermissionError;

    fn try_from(permissions: Vec<Permission>) -> Result<Self, Self::Error> {
        Self::new(permissions)
    }
}

impl<'a> IntoIterator for &'a PermissionSet {
    type Item = &'a Permission;
    type IntoIter = std::slice::Iter<'a, Permission>;

    fn into_iter(self) -> Self::IntoIter {
        self.permissions.iter()
    }
}

/// Grant and revoke lists that transform one permission set into another
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PermissionDelta {
    pub to_grant: Vec<Permission>,
    pub to_revoke: Vec<Permission>,
}

impl PermissionDelta {
    pub fn is_empty(&self) -> bool {
        self.to_grant.is_empty() && self.to_revoke.is_empty()
    }
}

/// Compute the grants and revokes needed to move from `old` to `new`.
///
/// Entries produced while walking `old` (changed or dropped principals) come
/// first, in `old` order; principals only present in `new` follow in `new` order.
/// When a principal's actions change, the revoke entry holds only the actions
/// that were dropped while the grant entry holds the full new action set.
pub fn diff_permissions(old: &PermissionSet, new: &PermissionSet) -> PermissionDelta {
    let desired: HashMap<&str, &Permission> =
        new.iter().map(|p| (p.principal.as_str(), p)).collect();
    let mut delta = PermissionDelta::default();

    for current in old {
        match desired.get(current.principal.as_str()) {
            None => delta.to_revoke.push(current.clone()),
            Some(wanted) if wanted.actions == current.actions => {}
            Some(wanted) => {
                let removed: BTreeSet<String> = current
                    .actions
                    .difference(&wanted.actions)
                    .cloned()
                    .collect();
                if !removed.is_empty() {
                    delta.to_revoke.push(Permission {
                        principal: wanted.principal.clone(),
                        actions: removed,
                    });
                }
                if !wanted.actions.is_empty() {
                    delta.to_grant.push((*wanted).clone());
                }
            }
        }
    }

    let recorded: HashSet<&str> = old.iter().map(|p| p.principal.as_str()).collect();
    for wanted in new {
        if !recorded.contains(wanted.principal.as_str()) {
            delta.to_grant.push(wanted.clone());
        }
    }

    delta
}
