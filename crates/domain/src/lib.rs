//! Domain entities and invariants for the entitlement lifecycle engine.

#![forbid(unsafe_code)]

mod assignment;
mod catalog;
mod entitlement;
mod history;
mod permission;
mod request;
mod role;

pub use assignment::{Assignment, AssignmentTarget, GrantedVia, Receiver, ReceiverType};
pub use catalog::{ActionDefinition, ResourceDefinition, ScopeKind};
pub use entitlement::{
    ActionSelector, Entitlement, EntitlementKey, ResourceSelector, Scope, WILDCARD,
};
pub use history::{HistoryReason, HistoryRecord, HistoryRefs, PermissionEffect};
pub use permission::EffectivePermission;
pub use request::{AccessRequest, RequestKind, RequestStatus};
pub use role::{OwnerType, RequestPolicy, RoleDefinition, RoleSuiteDefinition};
