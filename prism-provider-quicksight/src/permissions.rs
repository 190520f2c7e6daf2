//! Resource permissions through the QuickSight permission APIs
//!
//! Cloud Control only sets permissions when a resource is created. Afterwards
//! they are changed with the per-resource `Update*Permissions` calls, which take
//! a grant list and a revoke list computed by the permission differ.

use async_trait::async_trait;
use aws_sdk_quicksight::Client as QuickSightClient;
use aws_sdk_quicksight::types::ResourcePermission;
use prism_core::permission::{Permission, PermissionDelta, PermissionSet, diff_permissions};
use prism_core::provider::{ProviderError, ProviderResult};

use crate::resources::ResourceKind;

/// The resource whose permissions are read or changed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionTarget {
    pub kind: ResourceKind,
    pub aws_account_id: String,
    pub id: String,
}

impl PermissionTarget {
    pub fn new(
        kind: ResourceKind,
        aws_account_id: impl Into<String>,
        id: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            aws_account_id: aws_account_id.into(),
            id: id.into(),
        }
    }
}

impl std::fmt::Display for PermissionTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.kind, self.id)
    }
}

/// QuickSight permission calls
#[async_trait]
pub trait PermissionsApi: Send + Sync {
    async fn describe_permissions(
        &self,
        target: &PermissionTarget,
    ) -> ProviderResult<Vec<Permission>>;

    /// Empty lists are not sent
    async fn update_permissions(
        &self,
        target: &PermissionTarget,
        grant: Vec<Permission>,
        revoke: Vec<Permission>,
    ) -> ProviderResult<()>;
}

/// Move a resource's permissions from `old` to `new` with at most one API call
///
/// Returns the delta that was applied.
pub async fn apply_permission_changes(
    api: &dyn PermissionsApi,
    target: &PermissionTarget,
    old: &PermissionSet,
    new: &PermissionSet,
) -> ProviderResult<PermissionDelta> {
    let delta = diff_permissions(old, new);
    if delta.is_empty() {
        log::debug!("Permissions of {} are up to date", target);
        return Ok(delta);
    }

    log::info!(
        "Updating permissions of {}: {} to grant, {} to revoke",
        target,
        delta.to_grant.len(),
        delta.to_revoke.len()
    );
    api.update_permissions(target, delta.to_grant.clone(), delta.to_revoke.clone())
        .await?;
    Ok(delta)
}

/// `PermissionsApi` backed by the QuickSight SDK client
pub struct QuickSightPermissionsClient {
    client: QuickSightClient,
}

impl QuickSightPermissionsClient {
    pub fn new(client: QuickSightClient) -> Self {
        Self { client }
    }
}

fn to_sdk(permissions: Vec<Permission>) -> ProviderResult<Option<Vec<ResourcePermission>>> {
    if permissions.is_empty() {
        return Ok(None);
    }
    permissions
        .into_iter()
        .map(|p| {
            ResourcePermission::builder()
                .principal(p.principal)
                .set_actions(Some(p.actions.into_iter().collect()))
                .build()
                .map_err(|e| ProviderError::new("Invalid permission").with_cause(e))
        })
        .collect::<ProviderResult<Vec<_>>>()
        .map(Some)
}

fn from_sdk(permissions: &[ResourcePermission]) -> Vec<Permission> {
    permissions
        .iter()
        .map(|p| Permission::new(p.principal(), p.actions().iter().cloned()))
        .collect()
}

#[async_trait]
impl PermissionsApi for QuickSightPermissionsClient {
    async fn describe_permissions(
        &self,
        target: &PermissionTarget,
    ) -> ProviderResult<Vec<Permission>> {
        let failed = |e| {
            ProviderError::new(format!("Failed to describe permissions of {}", target))
                .with_cause(e)
        };
        let permissions = match target.kind {
            ResourceKind::DataSet => self
                .client
                .describe_data_set_permissions()
                .aws_account_id(&target.aws_account_id)
                .data_set_id(&target.id)
                .send()
                .await
                .map(|out| from_sdk(out.permissions()))
                .map_err(|e| failed(aws_sdk_quicksight::Error::from(e)))?,
            ResourceKind::DataSource => self
                .client
                .describe_data_source_permissions()
                .aws_account_id(&target.aws_account_id)
                .data_source_id(&target.id)
                .send()
                .await
                .map(|out| from_sdk(out.permissions()))
                .map_err(|e| failed(aws_sdk_quicksight::Error::from(e)))?,
            ResourceKind::Template => self
                .client
                .describe_template_permissions()
                .aws_account_id(&target.aws_account_id)
                .template_id(&target.id)
                .send()
                .await
                .map(|out| from_sdk(out.permissions()))
                .map_err(|e| failed(aws_sdk_quicksight::Error::from(e)))?,
        };
        Ok(permissions)
    }

    async fn update_permissions(
        &self,
        target: &PermissionTarget,
        grant: Vec<Permission>,
        revoke: Vec<Permission>,
    ) -> ProviderResult<()> {
        let grant = to_sdk(grant)?;
        let revoke = to_sdk(revoke)?;
        let failed = |e| {
            ProviderError::new(format!("Failed to update permissions of {}", target)).with_cause(e)
        };

        match target.kind {
            ResourceKind::DataSet => self
                .client
                .update_data_set_permissions()
                .aws_account_id(&target.aws_account_id)
                .data_set_id(&target.id)
                .set_grant_permissions(grant)
                .set_revoke_permissions(revoke)
                .send()
                .await
                .map(|_| ())
                .map_err(|e| failed(aws_sdk_quicksight::Error::from(e))),
            ResourceKind::DataSource => self
                .client
                .update_data_source_permissions()
                .aws_account_id(&target.aws_account_id)
                .data_source_id(&target.id)
                .set_grant_permissions(grant)
                .set_revoke_permissions(revoke)
                .send()
                .await
                .map(|_| ())
                .map_err(|e| failed(aws_sdk_quicksight::Error::from(e))),
            ResourceKind::Template => self
                .client
                .update_template_permissions()
                .aws_account_id(&target.aws_account_id)
                .template_id(&target.id)
                .set_grant_permissions(grant)
                .set_revoke_permissions(revoke)
                .send()
                .await
                .map(|_| ())
                .map_err(|e| failed(aws_sdk_quicksight::Error::from(e))),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Records update calls and serves a fixed permission list
    #[derive(Default)]
    pub(crate) struct MockPermissionsApi {
        pub current: Mutex<Vec<Permission>>,
        pub updates: Mutex<Vec<(PermissionTarget, Vec<Permission>, Vec<Permission>)>>,
    }

    #[async_trait]
    impl PermissionsApi for MockPermissionsApi {
        async fn describe_permissions(
            &self,
            _target: &PermissionTarget,
        ) -> ProviderResult<Vec<Permission>> {
            Ok(self.current.lock().unwrap().clone())
        }

        async fn update_permissions(
            &self,
            target: &PermissionTarget,
            grant: Vec<Permission>,
            revoke: Vec<Permission>,
        ) -> ProviderResult<()> {
            self.updates
                .lock()
                .unwrap()
                .push((target.clone(), grant, revoke));
            Ok(())
        }
    }

    fn set(entries: &[(&str, &[&str])]) -> PermissionSet {
        PermissionSet::new(
            entries
                .iter()
                .map(|(principal, actions)| Permission::new(*principal, actions.iter().copied()))
                .collect(),
        )
        .unwrap()
    }

    fn target() -> PermissionTarget {
        PermissionTarget::new(ResourceKind::DataSet, "123456789012", "sales")
    }

    #[tokio::test]
    async fn unchanged_permissions_make_no_call() {
        let api = MockPermissionsApi::default();
        let permissions = set(&[("arn:alice", &["quicksight:DescribeDataSet"])]);

        let delta = apply_permission_changes(&api, &target(), &permissions, &permissions)
            .await
            .unwrap();

        assert!(delta.is_empty());
        assert!(api.updates.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn changes_are_sent_in_one_call() {
        let api = MockPermissionsApi::default();
        let old = set(&[
            ("arn:alice", &["quicksight:DescribeDataSet", "quicksight:UpdateDataSet"]),
            ("arn:bob", &["quicksight:DescribeDataSet"]),
        ]);
        let new = set(&[
            ("arn:alice", &["quicksight:DescribeDataSet"]),
            ("arn:carol", &["quicksight:DescribeDataSet"]),
        ]);

        apply_permission_changes(&api, &target(), &old, &new)
            .await
            .unwrap();

        let updates = api.updates.lock().unwrap();
        assert_eq!(updates.len(), 1);
        let (sent_target, grant, revoke) = &updates[0];
        assert_eq!(sent_target, &target());
        assert_eq!(
            grant,
            &vec![
                Permission::new("arn:alice", ["quicksight:DescribeDataSet"]),
                Permission::new("arn:carol", ["quicksight:DescribeDataSet"]),
            ]
        );
        assert_eq!(
            revoke,
            &vec![
                Permission::new("arn:alice", ["quicksight:UpdateDataSet"]),
                Permission::new("arn:bob", ["quicksight:DescribeDataSet"]),
            ]
        );
    }

    #[tokio::test]
    async fn grant_only_change_sends_empty_revoke() {
        let api = MockPermissionsApi::default();
        let new = set(&[("arn:alice", &["quicksight:DescribeDataSet"])]);

        apply_permission_changes(&api, &target(), &PermissionSet::empty(), &new)
            .await
            .unwrap();

        let updates = api.updates.lock().unwrap();
        assert_eq!(updates[0].1.len(), 1);
        assert!(updates[0].2.is_empty());
    }

    #[test]
    fn empty_lists_are_omitted_from_requests() {
        assert_eq!(to_sdk(Vec::new()).unwrap(), None);
        let sent = to_sdk(vec![Permission::new("arn:alice", ["a", "b"])])
            .unwrap()
            .unwrap();
        assert_eq!(sent[0].principal(), "arn:alice");
        assert_eq!(sent[0].actions(), &["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn target_display_names_kind_and_id() {
        assert_eq!(target().to_string(), "data set sales");
    }
}
