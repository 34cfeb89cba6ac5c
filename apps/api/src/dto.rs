//! Wire types for the HTTP surface.
//!
//! Domain objects never cross the HTTP boundary directly; every response is
//! flattened into a serializable struct and every payload is validated while
//! converting into a service input.

mod assignment;
mod catalog;
mod entitlement;
mod history;
mod permission;
mod request;
mod role;

pub use assignment::{AssignmentResponse, GrantAssignmentRequest, RevokeAssignmentRequest};
pub use catalog::{
    ActionResponse, CreateActionRequest, CreateResourceRequest, ResourceResponse,
};
pub use entitlement::{
    CreateEntitlementRequest, EntitlementDeleteResponse, EntitlementResponse,
};
pub use history::{HistoryQueryParams, HistoryRecordResponse};
pub use permission::{
    CheckPermissionRequest, CheckPermissionResponse, EffectivePermissionResponse, ResolveParams,
};
pub use request::{
    AccessRequestResponse, ListRequestsParams, SubmitGrantRequest, SubmitRevokeRequest,
};
pub use role::{
    CreateRoleRequest, CreateRoleSuiteRequest, RoleDeleteResponse, RoleResponse,
    RoleSuiteDeleteResponse, RoleSuiteResponse, UpdateRoleRequest, UpdateRoleSuiteRequest,
};
