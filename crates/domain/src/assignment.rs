use std::str::FromStr;

use chrono::{DateTime, Utc};
use entiva_core::{AppError, AppResult, NonEmptyString};
use serde::{Deserialize, Serialize};

/// Kind of receiver an assignment binds to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReceiverType {
    /// An individual user.
    User,
    /// A group of users.
    Group,
}

impl ReceiverType {
    /// Returns a stable storage value for the receiver type.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Group => "group",
        }
    }
}

impl FromStr for ReceiverType {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "user" => Ok(Self::User),
            "group" => Ok(Self::Group),
            _ => Err(AppError::Validation(format!(
                "unknown receiver type '{value}'"
            ))),
        }
    }
}

/// A user or group holding an assignment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Receiver {
    /// Receiver kind.
    pub receiver_type: ReceiverType,
    /// Stable receiver identifier in the external directory.
    pub receiver_id: String,
}

impl Receiver {
    /// Creates a validated receiver reference.
    pub fn new(receiver_type: ReceiverType, receiver_id: impl Into<String>) -> AppResult<Self> {
        Ok(Self {
            receiver_type,
            receiver_id: NonEmptyString::new(receiver_id)?.into(),
        })
    }

    /// Convenience constructor for a user receiver.
    pub fn user(receiver_id: impl Into<String>) -> AppResult<Self> {
        Self::new(ReceiverType::User, receiver_id)
    }

    /// Convenience constructor for a group receiver.
    pub fn group(receiver_id: impl Into<String>) -> AppResult<Self> {
        Self::new(ReceiverType::Group, receiver_id)
    }
}

/// The role or role suite an assignment grants.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentTarget {
    /// A role by id.
    Role(String),
    /// A role suite by id.
    Suite(String),
}

impl AssignmentTarget {
    /// Returns the stable target-type discriminator.
    #[must_use]
    pub fn target_type(&self) -> &'static str {
        match self {
            Self::Role(_) => "role",
            Self::Suite(_) => "suite",
        }
    }

    /// Returns the target identifier.
    #[must_use]
    pub fn target_id(&self) -> &str {
        match self {
            Self::Role(role_id) => role_id.as_str(),
            Self::Suite(role_suite_id) => role_suite_id.as_str(),
        }
    }

    /// Builds a target from its stored discriminator and id.
    pub fn from_parts(target_type: &str, target_id: impl Into<String>) -> AppResult<Self> {
        let target_id: String = NonEmptyString::new(target_id)?.into();
        match target_type {
            "role" => Ok(Self::Role(target_id)),
            "suite" => Ok(Self::Suite(target_id)),
            _ => Err(AppError::Validation(format!(
                "unknown assignment target type '{target_type}'"
            ))),
        }
    }
}

/// How an assignment came to exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrantedVia {
    /// Created directly by an administrator.
    Manual,
    /// Created by an approved grant request.
    GrantRequest,
}

impl GrantedVia {
    /// Returns a stable storage value for the provenance.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Manual => "manual",
            Self::GrantRequest => "grant_request",
        }
    }
}

impl FromStr for GrantedVia {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "manual" => Ok(Self::Manual),
            "grant_request" => Ok(Self::GrantRequest),
            _ => Err(AppError::Validation(format!(
                "unknown assignment provenance '{value}'"
            ))),
        }
    }
}

/// Binding of a role or role suite to a receiver.
///
/// Assignments are not independently mutable: they are created and removed
/// only by the request workflow or by direct administrative grant/revoke, so
/// their concurrency guard is the etag of the operation that mutates them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    target: AssignmentTarget,
    receiver: Receiver,
    granted_via: GrantedVia,
    created_at: DateTime<Utc>,
}

impl Assignment {
    /// Creates a new assignment binding.
    #[must_use]
    pub fn new(target: AssignmentTarget, receiver: Receiver, granted_via: GrantedVia) -> Self {
        Self {
            target,
            receiver,
            granted_via,
            created_at: Utc::now(),
        }
    }

    /// Rehydrates an assignment from stored fields.
    #[must_use]
    pub fn restore(
        target: AssignmentTarget,
        receiver: Receiver,
        granted_via: GrantedVia,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            target,
            receiver,
            granted_via,
            created_at,
        }
    }

    /// Returns the granted role or suite.
    #[must_use]
    pub fn target(&self) -> &AssignmentTarget {
        &self.target
    }

    /// Returns the receiver of the grant.
    #[must_use]
    pub fn receiver(&self) -> &Receiver {
        &self.receiver
    }

    /// Returns how the assignment came to exist.
    #[must_use]
    pub fn granted_via(&self) -> GrantedVia {
        self.granted_via
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

#[cfg(test)]
mod tests {
    use super::{AssignmentTarget, Receiver};

    #[test]
    fn receiver_requires_non_empty_id() {
        let result = Receiver::user("");
        assert!(result.is_err());
    }

    #[test]
    fn target_roundtrip_through_parts() {
        let target = AssignmentTarget::Suite("suite-1".to_owned());
        let restored = AssignmentTarget::from_parts(target.target_type(), target.target_id());
        assert!(restored.is_ok());
        assert_eq!(
            restored.unwrap_or(AssignmentTarget::Role("x".to_owned())),
            target
        );
    }

    #[test]
    fn unknown_target_type_is_rejected() {
        let result = AssignmentTarget::from_parts("bundle", "id-1");
        assert!(result.is_err());
    }
}
