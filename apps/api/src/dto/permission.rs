use serde::{Deserialize, Serialize};

use entiva_core::{ActorIdentity, Principal};
use entiva_domain::EffectivePermission;

/// Query parameters for a permission resolution.
///
/// Without `user_id` the caller resolves their own permissions; with it an
/// administrator can resolve anyone, supplying the group memberships the
/// directory reports for that user.
#[derive(Debug, Default, Deserialize)]
pub struct ResolveParams {
    pub user_id: Option<String>,
    /// Comma-separated group ids.
    pub group_ids: Option<String>,
}

impl ResolveParams {
    pub fn into_principal(self, actor: &ActorIdentity) -> Principal {
        match self.user_id {
            Some(user_id) => Principal::new(user_id, split_groups(self.group_ids.as_deref())),
            None => actor.principal(),
        }
    }
}

/// Incoming payload for a single permission check.
#[derive(Debug, Deserialize)]
pub struct CheckPermissionRequest {
    pub user_id: Option<String>,
    #[serde(default)]
    pub group_ids: Vec<String>,
    pub resource_id: String,
    pub action_id: String,
    pub scope_ref: Option<String>,
}

impl CheckPermissionRequest {
    pub fn principal(&self, actor: &ActorIdentity) -> Principal {
        match &self.user_id {
            Some(user_id) => Principal::new(user_id.clone(), self.group_ids.clone()),
            None => actor.principal(),
        }
    }
}

/// Verdict of a single permission check.
#[derive(Debug, Serialize)]
pub struct CheckPermissionResponse {
    pub allowed: bool,
}

/// API representation of one resolved permission.
#[derive(Debug, Serialize)]
pub struct EffectivePermissionResponse {
    pub resource_id: String,
    pub action_id: String,
    /// `None` for the global scope.
    pub scope_ref: Option<String>,
}

impl From<EffectivePermission> for EffectivePermissionResponse {
    fn from(permission: EffectivePermission) -> Self {
        Self {
            scope_ref: permission.scope.as_ref_value().map(ToOwned::to_owned),
            resource_id: permission.resource_id,
            action_id: permission.action_id,
        }
    }
}

fn split_groups(raw: Option<&str>) -> Vec<String> {
    raw.unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|group| !group.is_empty())
        .map(ToOwned::to_owned)
        .collect()
}
