use std::str::FromStr;

use chrono::{DateTime, Utc};
use entiva_core::{AppError, AppResult, NonEmptyString};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::assignment::Receiver;

/// Direction of a permission-affecting event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionEffect {
    /// Permission was given.
    Grant,
    /// Permission was taken away.
    Revoke,
}

impl PermissionEffect {
    /// Returns a stable storage value for the effect.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Grant => "grant",
            Self::Revoke => "revoke",
        }
    }
}

impl FromStr for PermissionEffect {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "grant" => Ok(Self::Grant),
            "revoke" => Ok(Self::Revoke),
            _ => Err(AppError::Validation(format!(
                "unknown permission effect '{value}'"
            ))),
        }
    }
}

/// Stable cause attribution for a permission history record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryReason {
    /// A grant request was approved.
    RequestGranted,
    /// A revoke request was applied.
    RequestRevoked,
    /// An administrator granted an assignment directly.
    ManualGranted,
    /// An entitlement was added to a role by direct admin edit.
    EntitlementAdded,
    /// An entitlement was removed from a role by direct admin edit.
    EntitlementRemoved,
    /// An entitlement was deleted and detached from its roles.
    EntitlementDeleted,
    /// A role was deleted and its assignments removed.
    RoleDeleted,
    /// A role was removed from a receiver's assignment.
    RoleRemoved,
    /// A role suite was deleted and its assignments removed.
    SuiteDeleted,
    /// A role suite was removed from a receiver's assignment.
    SuiteRemoved,
}

impl HistoryReason {
    /// Returns a stable storage value for the reason.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RequestGranted => "REQUEST_GRANTED",
            Self::RequestRevoked => "REQUEST_REVOKED",
            Self::ManualGranted => "MANUAL_GRANTED",
            Self::EntitlementAdded => "ENT_ADDED",
            Self::EntitlementRemoved => "ENT_REMOVED",
            Self::EntitlementDeleted => "ENT_DELETED",
            Self::RoleDeleted => "ROLE_DELETED",
            Self::RoleRemoved => "ROLE_REMOVED",
            Self::SuiteDeleted => "SUITE_DELETED",
            Self::SuiteRemoved => "SUITE_REMOVED",
        }
    }

    /// Returns the effect implied by the reason.
    #[must_use]
    pub fn effect(&self) -> PermissionEffect {
        match self {
            Self::RequestGranted | Self::ManualGranted | Self::EntitlementAdded => {
                PermissionEffect::Grant
            }
            Self::RequestRevoked
            | Self::EntitlementRemoved
            | Self::EntitlementDeleted
            | Self::RoleDeleted
            | Self::RoleRemoved
            | Self::SuiteDeleted
            | Self::SuiteRemoved => PermissionEffect::Revoke,
        }
    }
}

impl FromStr for HistoryReason {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "REQUEST_GRANTED" => Ok(Self::RequestGranted),
            "REQUEST_REVOKED" => Ok(Self::RequestRevoked),
            "MANUAL_GRANTED" => Ok(Self::ManualGranted),
            "ENT_ADDED" => Ok(Self::EntitlementAdded),
            "ENT_REMOVED" => Ok(Self::EntitlementRemoved),
            "ENT_DELETED" => Ok(Self::EntitlementDeleted),
            "ROLE_DELETED" => Ok(Self::RoleDeleted),
            "ROLE_REMOVED" => Ok(Self::RoleRemoved),
            "SUITE_DELETED" => Ok(Self::SuiteDeleted),
            "SUITE_REMOVED" => Ok(Self::SuiteRemoved),
            _ => Err(AppError::Validation(format!(
                "unknown history reason '{value}'"
            ))),
        }
    }
}

/// References tying a history record to the entities it concerns.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryRefs {
    /// Entitlement the event concerns, if any.
    pub entitlement_id: Option<String>,
    /// Role the event concerns, if any.
    pub role_id: Option<String>,
    /// Role suite the event concerns, if any.
    pub role_suite_id: Option<String>,
    /// Grant request that caused the event, if any.
    pub grant_request_id: Option<String>,
    /// Revoke request that caused the event, if any.
    pub revoke_request_id: Option<String>,
}

/// One immutable audit record of a permission-affecting event.
///
/// Records are append-only: the type offers no mutators and the repositories
/// offer no update or delete operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryRecord {
    history_id: String,
    effect: PermissionEffect,
    reason: HistoryReason,
    receiver: Receiver,
    refs: HistoryRefs,
    approver_id: Option<String>,
    metadata: Option<Value>,
    created_at: DateTime<Utc>,
}

impl HistoryRecord {
    /// Creates a new history record; the effect is derived from the reason.
    #[must_use]
    pub fn new(
        reason: HistoryReason,
        receiver: Receiver,
        refs: HistoryRefs,
        approver_id: Option<String>,
        metadata: Option<Value>,
    ) -> Self {
        Self {
            history_id: Uuid::new_v4().to_string(),
            effect: reason.effect(),
            reason,
            receiver,
            refs,
            approver_id: approver_id.filter(|value| !value.trim().is_empty()),
            metadata,
            created_at: Utc::now(),
        }
    }

    /// Rehydrates a record from stored fields.
    #[allow(clippy::too_many_arguments)]
    pub fn restore(
        history_id: impl Into<String>,
        effect: PermissionEffect,
        reason: HistoryReason,
        receiver: Receiver,
        refs: HistoryRefs,
        approver_id: Option<String>,
        metadata: Option<Value>,
        created_at: DateTime<Utc>,
    ) -> AppResult<Self> {
        Ok(Self {
            history_id: NonEmptyString::new(history_id)?.into(),
            effect,
            reason,
            receiver,
            refs,
            approver_id,
            metadata,
            created_at,
        })
    }

    /// Returns the stable record identifier.
    #[must_use]
    pub fn history_id(&self) -> &str {
        self.history_id.as_str()
    }

    /// Returns the effect direction.
    #[must_use]
    pub fn effect(&self) -> PermissionEffect {
        self.effect
    }

    /// Returns the cause attribution.
    #[must_use]
    pub fn reason(&self) -> HistoryReason {
        self.reason
    }

    /// Returns the receiver the event applied to.
    #[must_use]
    pub fn receiver(&self) -> &Receiver {
        &self.receiver
    }

    /// Returns the entity references of the event.
    #[must_use]
    pub fn refs(&self) -> &HistoryRefs {
        &self.refs
    }

    /// Returns the approving or acting subject, if attributed.
    #[must_use]
    pub fn approver_id(&self) -> Option<&str> {
        self.approver_id.as_deref()
    }

    /// Returns the free-form metadata payload, if any.
    #[must_use]
    pub fn metadata(&self) -> Option<&Value> {
        self.metadata.as_ref()
    }

    /// Returns the append timestamp.
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use crate::assignment::Receiver;

    use super::{HistoryReason, HistoryRecord, HistoryRefs, PermissionEffect};

    #[test]
    fn reason_roundtrip_storage_value() {
        let reason = HistoryReason::EntitlementDeleted;
        let parsed = HistoryReason::from_str(reason.as_str());
        assert!(parsed.is_ok());
        assert_eq!(parsed.unwrap_or(HistoryReason::RequestGranted), reason);
    }

    #[test]
    fn effect_follows_reason() {
        assert_eq!(
            HistoryReason::RequestGranted.effect(),
            PermissionEffect::Grant
        );
        assert_eq!(HistoryReason::RoleDeleted.effect(), PermissionEffect::Revoke);
    }

    #[test]
    fn blank_approver_is_normalized_to_none() {
        let record = HistoryRecord::new(
            HistoryReason::RequestGranted,
            Receiver::user("bob").unwrap_or_else(|_| unreachable!()),
            HistoryRefs::default(),
            Some("  ".to_owned()),
            None,
        );
        assert!(record.approver_id().is_none());
    }
}
