use std::collections::HashSet;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use entiva_core::{AppError, AppResult, Etag, NonEmptyString};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entitlement::{Entitlement, EntitlementKey};

/// Kind of principal owning a role or role suite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OwnerType {
    /// Owned by an individual user.
    User,
    /// Owned by a group.
    Group,
}

impl OwnerType {
    /// Returns a stable storage value for the owner type.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Group => "group",
        }
    }
}

impl FromStr for OwnerType {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "user" => Ok(Self::User),
            "group" => Ok(Self::Group),
            _ => Err(AppError::Validation(format!(
                "unknown owner type '{value}'"
            ))),
        }
    }
}

/// Request-policy flags shared by roles and role suites.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestPolicy {
    /// Whether the bundle may be the target of a grant request.
    pub is_requestable: bool,
    /// Whether a grant request must carry an attachment.
    pub is_required_attachment: bool,
    /// Whether a grant request must carry a comment.
    pub is_required_comment: bool,
}

/// A named bundle of entitlements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleDefinition {
    role_id: String,
    name: NonEmptyString,
    owner_type: OwnerType,
    owner_ref: NonEmptyString,
    policy: RequestPolicy,
    entitlements: Vec<Entitlement>,
    etag: Etag,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl RoleDefinition {
    /// Creates a new role with validated fields and membership invariants.
    pub fn new(
        name: impl Into<String>,
        owner_type: OwnerType,
        owner_ref: impl Into<String>,
        policy: RequestPolicy,
        entitlements: Vec<Entitlement>,
    ) -> AppResult<Self> {
        Self::ensure_unique_keys(&entitlements)?;

        let now = Utc::now();
        Ok(Self {
            role_id: Uuid::new_v4().to_string(),
            name: NonEmptyString::new(name)?,
            owner_type,
            owner_ref: NonEmptyString::new(owner_ref)?,
            policy,
            entitlements,
            etag: Etag::new(),
            created_at: now,
            updated_at: now,
        })
    }

    /// Rehydrates a role from stored fields.
    #[allow(clippy::too_many_arguments)]
    pub fn restore(
        role_id: impl Into<String>,
        name: impl Into<String>,
        owner_type: OwnerType,
        owner_ref: impl Into<String>,
        policy: RequestPolicy,
        entitlements: Vec<Entitlement>,
        etag: Etag,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> AppResult<Self> {
        Self::ensure_unique_keys(&entitlements)?;

        Ok(Self {
            role_id: NonEmptyString::new(role_id)?.into(),
            name: NonEmptyString::new(name)?,
            owner_type,
            owner_ref: NonEmptyString::new(owner_ref)?,
            policy,
            entitlements,
            etag,
            created_at,
            updated_at,
        })
    }

    fn ensure_unique_keys(entitlements: &[Entitlement]) -> AppResult<()> {
        let mut seen = HashSet::new();
        for entitlement in entitlements {
            if !seen.insert(entitlement.key()) {
                return Err(AppError::Validation(format!(
                    "duplicate entitlement '{}' in role membership",
                    entitlement.entitlement_id()
                )));
            }
        }

        Ok(())
    }

    /// Returns the stable role identifier.
    #[must_use]
    pub fn role_id(&self) -> &str {
        self.role_id.as_str()
    }

    /// Returns the role name.
    #[must_use]
    pub fn name(&self) -> &NonEmptyString {
        &self.name
    }

    /// Returns the owner kind.
    #[must_use]
    pub fn owner_type(&self) -> OwnerType {
        self.owner_type
    }

    /// Returns the owner reference.
    #[must_use]
    pub fn owner_ref(&self) -> &NonEmptyString {
        &self.owner_ref
    }

    /// Returns the request-policy flags.
    #[must_use]
    pub fn policy(&self) -> RequestPolicy {
        self.policy
    }

    /// Returns the entitlement membership.
    #[must_use]
    pub fn entitlements(&self) -> &[Entitlement] {
        &self.entitlements
    }

    /// Returns whether the role contains the given composite key.
    #[must_use]
    pub fn contains(&self, key: &EntitlementKey) -> bool {
        self.entitlements
            .iter()
            .any(|entitlement| &entitlement.key() == key)
    }

    /// Renames the role and updates its policy flags.
    pub fn update(&mut self, name: impl Into<String>, policy: RequestPolicy) -> AppResult<()> {
        self.name = NonEmptyString::new(name)?;
        self.policy = policy;
        self.touch();
        Ok(())
    }

    /// Adds an entitlement; a duplicate composite key is rejected.
    pub fn add_entitlement(&mut self, entitlement: Entitlement) -> AppResult<()> {
        if self.contains(&entitlement.key()) {
            return Err(AppError::Conflict(format!(
                "role '{}' already contains entitlement '{}'",
                self.name.as_str(),
                entitlement.entitlement_id()
            )));
        }

        self.entitlements.push(entitlement);
        self.touch();
        Ok(())
    }

    /// Removes the entitlement with the given composite key.
    pub fn remove_entitlement(&mut self, key: &EntitlementKey) -> AppResult<Entitlement> {
        let position = self
            .entitlements
            .iter()
            .position(|entitlement| &entitlement.key() == key)
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "role '{}' does not contain entitlement '{}'",
                    self.name.as_str(),
                    key.entitlement_id
                ))
            })?;

        let removed = self.entitlements.remove(position);
        self.touch();
        Ok(removed)
    }

    /// Removes every membership entry for the given entitlement id, any scope.
    ///
    /// Used by the entitlement-delete cascade; returns the removed entries.
    pub fn detach_entitlement(&mut self, entitlement_id: &str) -> Vec<Entitlement> {
        let (removed, kept): (Vec<Entitlement>, Vec<Entitlement>) = self
            .entitlements
            .drain(..)
            .partition(|entitlement| entitlement.entitlement_id() == entitlement_id);

        self.entitlements = kept;
        if !removed.is_empty() {
            self.touch();
        }

        removed
    }

    fn touch(&mut self) {
        self.etag = Etag::new();
        self.updated_at = Utc::now();
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

/// A named bundle of roles.
///
/// Suites reference roles by id only, so a suite can never contain another
/// suite; the one-level nesting rule holds by construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleSuiteDefinition {
    role_suite_id: String,
    name: NonEmptyString,
    owner_type: OwnerType,
    owner_ref: NonEmptyString,
    policy: RequestPolicy,
    role_ids: Vec<String>,
    etag: Etag,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl RoleSuiteDefinition {
    /// Creates a new role suite with validated fields and membership invariants.
    pub fn new(
        name: impl Into<String>,
        owner_type: OwnerType,
        owner_ref: impl Into<String>,
        policy: RequestPolicy,
        role_ids: Vec<String>,
    ) -> AppResult<Self> {
        Self::ensure_unique_roles(&role_ids)?;

        let now = Utc::now();
        Ok(Self {
            role_suite_id: Uuid::new_v4().to_string(),
            name: NonEmptyString::new(name)?,
            owner_type,
            owner_ref: NonEmptyString::new(owner_ref)?,
            policy,
            role_ids,
            etag: Etag::new(),
            created_at: now,
            updated_at: now,
        })
    }

    /// Rehydrates a role suite from stored fields.
    #[allow(clippy::too_many_arguments)]
    pub fn restore(
        role_suite_id: impl Into<String>,
        name: impl Into<String>,
        owner_type: OwnerType,
        owner_ref: impl Into<String>,
        policy: RequestPolicy,
        role_ids: Vec<String>,
        etag: Etag,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> AppResult<Self> {
        Self::ensure_unique_roles(&role_ids)?;

        Ok(Self {
            role_suite_id: NonEmptyString::new(role_suite_id)?.into(),
            name: NonEmptyString::new(name)?,
            owner_type,
            owner_ref: NonEmptyString::new(owner_ref)?,
            policy,
            role_ids,
            etag,
            created_at,
            updated_at,
        })
    }

    fn ensure_unique_roles(role_ids: &[String]) -> AppResult<()> {
        let mut seen = HashSet::new();
        for role_id in role_ids {
            if !seen.insert(role_id.as_str()) {
                return Err(AppError::Validation(format!(
                    "duplicate role '{role_id}' in suite membership"
                )));
            }
        }

        Ok(())
    }

    /// Returns the stable suite identifier.
    #[must_use]
    pub fn role_suite_id(&self) -> &str {
        self.role_suite_id.as_str()
    }

    /// Returns the suite name.
    #[must_use]
    pub fn name(&self) -> &NonEmptyString {
        &self.name
    }

    /// Returns the owner kind.
    #[must_use]
    pub fn owner_type(&self) -> OwnerType {
        self.owner_type
    }

    /// Returns the owner reference.
    #[must_use]
    pub fn owner_ref(&self) -> &NonEmptyString {
        &self.owner_ref
    }

    /// Returns the request-policy flags.
    #[must_use]
    pub fn policy(&self) -> RequestPolicy {
        self.policy
    }

    /// Returns the member role identifiers.
    #[must_use]
    pub fn role_ids(&self) -> &[String] {
        &self.role_ids
    }

    /// Renames the suite and updates its policy flags.
    pub fn update(&mut self, name: impl Into<String>, policy: RequestPolicy) -> AppResult<()> {
        self.name = NonEmptyString::new(name)?;
        self.policy = policy;
        self.touch();
        Ok(())
    }

    /// Replaces the member role set, rejecting duplicates.
    pub fn replace_roles(&mut self, role_ids: Vec<String>) -> AppResult<()> {
        Self::ensure_unique_roles(&role_ids)?;
        self.role_ids = role_ids;
        self.touch();
        Ok(())
    }

    /// Removes a member role if present; used by the role-delete cascade.
    pub fn detach_role(&mut self, role_id: &str) -> bool {
        let before = self.role_ids.len();
        self.role_ids.retain(|member| member != role_id);

        let removed = self.role_ids.len() != before;
        if removed {
            self.touch();
        }

        removed
    }

    fn touch(&mut self) {
        self.etag = Etag::new();
        self.updated_at = Utc::now();
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
    use crate::entitlement::{ActionSelector, Entitlement, ResourceSelector, Scope};

    use super::{OwnerType, RequestPolicy, RoleDefinition, RoleSuiteDefinition};

    fn open_policy() -> RequestPolicy {
        RequestPolicy {
            is_requestable: true,
            is_required_attachment: false,
            is_required_comment: false,
        }
    }

    fn entitlement(name: &str) -> Entitlement {
        Entitlement::new(
            name,
            ResourceSelector::Id("invoice".to_owned()),
            ActionSelector::Id("approve".to_owned()),
            Scope::Global,
        )
        .unwrap_or_else(|_| unreachable!())
    }

    #[test]
    fn role_rejects_duplicate_entitlement_keys() {
        let first = entitlement("invoice-approve");
        let duplicate = first.clone();

        let result = RoleDefinition::new(
            "accounting",
            OwnerType::Group,
            "finance",
            open_policy(),
            vec![first, duplicate],
        );
        assert!(result.is_err());
    }

    #[test]
    fn add_entitlement_rejects_existing_key() {
        let member = entitlement("invoice-approve");
        let mut role = RoleDefinition::new(
            "accounting",
            OwnerType::Group,
            "finance",
            open_policy(),
            vec![member.clone()],
        )
        .unwrap_or_else(|_| unreachable!());

        let result = role.add_entitlement(member);
        assert!(result.is_err());
    }

    #[test]
    fn detach_entitlement_removes_every_scope_and_rotates_etag() {
        let member = entitlement("invoice-approve");
        let entitlement_id = member.entitlement_id().to_owned();
        let mut role = RoleDefinition::new(
            "accounting",
            OwnerType::Group,
            "finance",
            open_policy(),
            vec![member],
        )
        .unwrap_or_else(|_| unreachable!());
        let etag_before = role.etag().clone();

        let removed = role.detach_entitlement(entitlement_id.as_str());
        assert_eq!(removed.len(), 1);
        assert!(role.entitlements().is_empty());
        assert!(!role.etag().matches(&etag_before));
    }

    #[test]
    fn suite_rejects_duplicate_roles() {
        let result = RoleSuiteDefinition::new(
            "finance-pack",
            OwnerType::Group,
            "finance",
            open_policy(),
            vec!["role-1".to_owned(), "role-1".to_owned()],
        );
        assert!(result.is_err());
    }

    #[test]
    fn suite_detach_role_reports_membership() {
        let mut suite = RoleSuiteDefinition::new(
            "finance-pack",
            OwnerType::Group,
            "finance",
            open_policy(),
            vec!["role-1".to_owned()],
        )
        .unwrap_or_else(|_| unreachable!());

        assert!(suite.detach_role("role-1"));
        assert!(!suite.detach_role("role-1"));
    }
}
