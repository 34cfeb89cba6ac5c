use serde::{Deserialize, Serialize};

use crate::OrgId;

/// Caller identity forwarded by the upstream gateway.
///
/// The gateway has already authorized the call against its own policy table;
/// the engine uses the identity only for attribution (history records,
/// request ownership) and the requestor-or-admin cancellation rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorIdentity {
    subject: String,
    display_name: String,
    org_id: OrgId,
    group_ids: Vec<String>,
    is_administrator: bool,
}

impl ActorIdentity {
    /// Creates an actor identity from gateway-supplied claims.
    #[must_use]
    pub fn new(
        subject: impl Into<String>,
        display_name: impl Into<String>,
        org_id: OrgId,
        group_ids: Vec<String>,
        is_administrator: bool,
    ) -> Self {
        Self {
            subject: subject.into(),
            display_name: display_name.into(),
            org_id,
            group_ids,
            is_administrator,
        }
    }

    /// Returns the stable subject claim.
    #[must_use]
    pub fn subject(&self) -> &str {
        self.subject.as_str()
    }

    /// Returns the display name for the current caller.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.display_name.as_str()
    }

    /// Returns the organization linked to the identity.
    #[must_use]
    pub fn org_id(&self) -> OrgId {
        self.org_id
    }

    /// Returns the caller's group memberships.
    #[must_use]
    pub fn group_ids(&self) -> &[String] {
        &self.group_ids
    }

    /// Returns whether the caller holds the administrator claim.
    #[must_use]
    pub fn is_administrator(&self) -> bool {
        self.is_administrator
    }

    /// Returns the resolution subject for this caller.
    #[must_use]
    pub fn principal(&self) -> Principal {
        Principal {
            user_id: self.subject.clone(),
            group_ids: self.group_ids.clone(),
        }
    }
}

/// Subject of a permission resolution: one user plus group memberships.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    /// Stable user identifier.
    pub user_id: String,
    /// Groups the user belongs to.
    pub group_ids: Vec<String>,
}

impl Principal {
    /// Creates a resolution subject.
    #[must_use]
    pub fn new(user_id: impl Into<String>, group_ids: Vec<String>) -> Self {
        Self {
            user_id: user_id.into(),
            group_ids,
        }
    }
}
