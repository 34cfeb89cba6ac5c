use chrono::{DateTime, Utc};
use entiva_core::{AppError, AppResult, Etag, NonEmptyString};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Storage sentinel for the `All` selector variants.
pub const WILDCARD: &str = "*";

/// Selects the resources an entitlement applies to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceSelector {
    /// Every resource in the catalog, current and future.
    All,
    /// One concrete catalog resource.
    Id(String),
}

impl ResourceSelector {
    /// Returns a stable storage value for the selector.
    #[must_use]
    pub fn as_storage_value(&self) -> &str {
        match self {
            Self::All => WILDCARD,
            Self::Id(resource_id) => resource_id.as_str(),
        }
    }

    /// Parses a stored selector value.
    pub fn from_storage_value(value: &str) -> AppResult<Self> {
        if value == WILDCARD {
            return Ok(Self::All);
        }

        Ok(Self::Id(NonEmptyString::new(value)?.into()))
    }

    /// Returns whether the selector covers the given resource.
    #[must_use]
    pub fn covers(&self, resource_id: &str) -> bool {
        match self {
            Self::All => true,
            Self::Id(selected) => selected == resource_id,
        }
    }

    /// Returns whether this is the wildcard selector.
    #[must_use]
    pub fn is_all(&self) -> bool {
        matches!(self, Self::All)
    }
}

/// Selects the actions an entitlement applies to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionSelector {
    /// Every action under the selected resource(s).
    All,
    /// One concrete catalog action.
    Id(String),
}

impl ActionSelector {
    /// Returns a stable storage value for the selector.
    #[must_use]
    pub fn as_storage_value(&self) -> &str {
        match self {
            Self::All => WILDCARD,
            Self::Id(action_id) => action_id.as_str(),
        }
    }

    /// Parses a stored selector value.
    pub fn from_storage_value(value: &str) -> AppResult<Self> {
        if value == WILDCARD {
            return Ok(Self::All);
        }

        Ok(Self::Id(NonEmptyString::new(value)?.into()))
    }

    /// Returns whether the selector covers the given action.
    #[must_use]
    pub fn covers(&self, action_id: &str) -> bool {
        match self {
            Self::All => true,
            Self::Id(selected) => selected == action_id,
        }
    }

    /// Returns whether this is the wildcard selector.
    #[must_use]
    pub fn is_all(&self) -> bool {
        matches!(self, Self::All)
    }
}

/// Object scope of an entitlement; `Global` is the sentinel for "no scope".
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    /// Applies without object restriction.
    Global,
    /// Restricted to one object reference.
    Ref(String),
}

impl Scope {
    /// Builds a scope from an optional object reference, blank meaning global.
    pub fn from_ref(scope_ref: Option<String>) -> AppResult<Self> {
        match scope_ref {
            None => Ok(Self::Global),
            Some(value) if value.trim().is_empty() => Ok(Self::Global),
            Some(value) => Ok(Self::Ref(NonEmptyString::new(value)?.into())),
        }
    }

    /// Returns the object reference, or `None` for the global scope.
    #[must_use]
    pub fn as_ref_value(&self) -> Option<&str> {
        match self {
            Self::Global => None,
            Self::Ref(value) => Some(value.as_str()),
        }
    }

    /// Returns whether this is the global sentinel.
    #[must_use]
    pub fn is_global(&self) -> bool {
        matches!(self, Self::Global)
    }
}

/// Natural identity of an entitlement for deduplication and contains checks.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntitlementKey {
    /// Stable entitlement identifier.
    pub entitlement_id: String,
    /// Object scope, `Global` when the entitlement carries none.
    pub scope: Scope,
}

/// The atomic grantable unit: a (resource, action, optional scope) triple.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entitlement {
    entitlement_id: String,
    name: NonEmptyString,
    resource: ResourceSelector,
    action: ActionSelector,
    scope: Scope,
    etag: Etag,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Entitlement {
    /// Creates a new entitlement with validated fields.
    ///
    /// Referential checks against the catalog belong to the entitlement
    /// service; this constructor enforces only shape invariants: a concrete
    /// action cannot be paired with the all-resources selector, because an
    /// action belongs to exactly one resource.
    pub fn new(
        name: impl Into<String>,
        resource: ResourceSelector,
        action: ActionSelector,
        scope: Scope,
    ) -> AppResult<Self> {
        if resource.is_all() && !action.is_all() {
            return Err(AppError::Validation(
                "a concrete action cannot be combined with the all-resources selector".to_owned(),
            ));
        }

        let now = Utc::now();
        Ok(Self {
            entitlement_id: Uuid::new_v4().to_string(),
            name: NonEmptyString::new(name)?,
            resource,
            action,
            scope,
            etag: Etag::new(),
            created_at: now,
            updated_at: now,
        })
    }

    /// Rehydrates an entitlement from stored fields.
    #[allow(clippy::too_many_arguments)]
    pub fn restore(
        entitlement_id: impl Into<String>,
        name: impl Into<String>,
        resource: ResourceSelector,
        action: ActionSelector,
        scope: Scope,
        etag: Etag,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> AppResult<Self> {
        Ok(Self {
            entitlement_id: NonEmptyString::new(entitlement_id)?.into(),
            name: NonEmptyString::new(name)?,
            resource,
            action,
            scope,
            etag,
            created_at,
            updated_at,
        })
    }

    /// Returns the stable entitlement identifier.
    #[must_use]
    pub fn entitlement_id(&self) -> &str {
        self.entitlement_id.as_str()
    }

    /// Returns the entitlement name.
    #[must_use]
    pub fn name(&self) -> &NonEmptyString {
        &self.name
    }

    /// Returns the resource selector.
    #[must_use]
    pub fn resource(&self) -> &ResourceSelector {
        &self.resource
    }

    /// Returns the action selector.
    #[must_use]
    pub fn action(&self) -> &ActionSelector {
        &self.action
    }

    /// Returns the object scope.
    #[must_use]
    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    /// Returns the composite identity used for deduplication.
    #[must_use]
    pub fn key(&self) -> EntitlementKey {
        EntitlementKey {
            entitlement_id: self.entitlement_id.clone(),
            scope: self.scope.clone(),
        }
    }

    /// Returns whether either selector is a wildcard.
    #[must_use]
    pub fn is_wildcard(&self) -> bool {
        self.resource.is_all() || self.action.is_all()
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
