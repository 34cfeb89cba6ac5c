use std::str::FromStr;

use chrono::{DateTime, Utc};
use entiva_core::{AppError, AppResult, Etag, NonEmptyString};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How entitlements against a resource may be scoped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScopeKind {
    /// The resource is protected as a whole; entitlements carry no object scope.
    Global,
    /// Individual objects of the resource may be scoped by reference.
    Object,
}

impl ScopeKind {
    /// Returns a stable storage value for this scope kind.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Global => "global",
            Self::Object => "object",
        }
    }
}

impl FromStr for ScopeKind {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "global" => Ok(Self::Global),
            "object" => Ok(Self::Object),
            _ => Err(AppError::Validation(format!(
                "unknown scope kind '{value}'"
            ))),
        }
    }
}

/// A protectable object class or instance in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceDefinition {
    resource_id: String,
    name: NonEmptyString,
    resource_type: NonEmptyString,
    resource_ref: Option<String>,
    scope_kind: ScopeKind,
    etag: Etag,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ResourceDefinition {
    /// Creates a new catalog resource with validated fields.
    pub fn new(
        name: impl Into<String>,
        resource_type: impl Into<String>,
        resource_ref: Option<String>,
        scope_kind: ScopeKind,
    ) -> AppResult<Self> {
        let now = Utc::now();
        Ok(Self {
            resource_id: Uuid::new_v4().to_string(),
            name: NonEmptyString::new(name)?,
            resource_type: NonEmptyString::new(resource_type)?,
            resource_ref: resource_ref.filter(|value| !value.trim().is_empty()),
            scope_kind,
            etag: Etag::new(),
            created_at: now,
            updated_at: now,
        })
    }

    /// Rehydrates a resource from stored fields.
    #[allow(clippy::too_many_arguments)]
    pub fn restore(
        resource_id: impl Into<String>,
        name: impl Into<String>,
        resource_type: impl Into<String>,
        resource_ref: Option<String>,
        scope_kind: ScopeKind,
        etag: Etag,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> AppResult<Self> {
        Ok(Self {
            resource_id: NonEmptyString::new(resource_id)?.into(),
            name: NonEmptyString::new(name)?,
            resource_type: NonEmptyString::new(resource_type)?,
            resource_ref,
            scope_kind,
            etag,
            created_at,
            updated_at,
        })
    }

    /// Returns the stable resource identifier.
    #[must_use]
    pub fn resource_id(&self) -> &str {
        self.resource_id.as_str()
    }

    /// Returns the resource name, unique per organization.
    #[must_use]
    pub fn name(&self) -> &NonEmptyString {
        &self.name
    }

    /// Returns the resource type discriminator.
    #[must_use]
    pub fn resource_type(&self) -> &NonEmptyString {
        &self.resource_type
    }

    /// Returns the external reference of the protected object, if any.
    #[must_use]
    pub fn resource_ref(&self) -> Option<&str> {
        self.resource_ref.as_deref()
    }

    /// Returns how entitlements against this resource may be scoped.
    #[must_use]
    pub fn scope_kind(&self) -> ScopeKind {
        self.scope_kind
    }

    /// Returns the concurrency token of the current state.
    #[must_use]
    pub fn etag(&self) -> &Etag {
        &self.etag
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the last-update timestamp.
    #[must_use]
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

/// An operation performable on a catalog resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionDefinition {
    action_id: String,
    resource_id: String,
    name: NonEmptyString,
    description: Option<String>,
    etag: Etag,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ActionDefinition {
    /// Creates a new action under a resource with validated fields.
    pub fn new(
        resource_id: impl Into<String>,
        name: impl Into<String>,
        description: Option<String>,
    ) -> AppResult<Self> {
        let now = Utc::now();
        Ok(Self {
            action_id: Uuid::new_v4().to_string(),
            resource_id: NonEmptyString::new(resource_id)?.into(),
            name: NonEmptyString::new(name)?,
            description: description.filter(|value| !value.trim().is_empty()),
            etag: Etag::new(),
            created_at: now,
            updated_at: now,
        })
    }

    /// Rehydrates an action from stored fields.
    pub fn restore(
        action_id: impl Into<String>,
        resource_id: impl Into<String>,
        name: impl Into<String>,
        description: Option<String>,
        etag: Etag,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> AppResult<Self> {
        Ok(Self {
            action_id: NonEmptyString::new(action_id)?.into(),
            resource_id: NonEmptyString::new(resource_id)?.into(),
            name: NonEmptyString::new(name)?,
            description,
            etag,
            created_at,
            updated_at,
        })
    }

    /// Returns the stable action identifier.
    #[must_use]
    pub fn action_id(&self) -> &str {
        self.action_id.as_str()
    }

    /// Returns the parent resource identifier.
    #[must_use]
    pub fn resource_id(&self) -> &str {
        self.resource_id.as_str()
    }

    /// Returns the action name, unique within its resource.
    #[must_use]
    pub fn name(&self) -> &NonEmptyString {
        &self.name
    }

    /// Returns the free-form description, if any.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Returns the concurrency token of the current state.
    #[must_use]
    pub fn etag(&self) -> &Etag {
        &self.etag
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the last-update timestamp.
    #[must_use]
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::{ActionDefinition, ResourceDefinition, ScopeKind};

    #[test]
    fn resource_requires_non_empty_name() {
        let result = ResourceDefinition::new("", "module", None, ScopeKind::Global);
        assert!(result.is_err());
    }

    #[test]
    fn blank_resource_ref_is_normalized_to_none() {
        let resource = ResourceDefinition::new("invoice", "module", Some("  ".to_owned()), ScopeKind::Object);
        assert!(resource.is_ok());
        assert!(resource.unwrap_or_else(|_| unreachable!()).resource_ref().is_none());
    }

    #[test]
    fn action_requires_parent_resource_id() {
        let result = ActionDefinition::new("", "approve", None);
        assert!(result.is_err());
    }

    #[test]
    fn scope_kind_roundtrip_storage_value() {
        let parsed = ScopeKind::from_str(ScopeKind::Object.as_str());
        assert!(parsed.is_ok());
        assert_eq!(parsed.unwrap_or(ScopeKind::Global), ScopeKind::Object);
    }
}
