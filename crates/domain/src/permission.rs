use serde::{Deserialize, Serialize};

use crate::entitlement::Scope;

/// One concrete (resource, action, scope) permission held by a principal.
///
/// The composite of all three fields is the deduplication key of the
/// resolved set; ordering is derived so sets are deterministic.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EffectivePermission {
    /// Catalog resource the permission applies to.
    pub resource_id: String,
    /// Catalog action the permission allows.
    pub action_id: String,
    /// Object scope, `Global` when unrestricted.
    pub scope: Scope,
}

impl EffectivePermission {
    /// Creates an effective permission entry.
    #[must_use]
    pub fn new(resource_id: impl Into<String>, action_id: impl Into<String>, scope: Scope) -> Self {
        Self {
            resource_id: resource_id.into(),
            action_id: action_id.into(),
            scope,
        }
    }
}
