//! Application services and ports for the entitlement lifecycle engine.

#![forbid(unsafe_code)]

mod access;
mod assignment_service;
mod catalog_service;
mod entitlement_service;
mod history_service;
mod lifecycle_ports;
mod resolver_service;
mod role_service;
mod workflow_service;

pub use assignment_service::AssignmentService;
pub use catalog_service::CatalogService;
pub use entitlement_service::EntitlementService;
pub use history_service::HistoryService;
pub use lifecycle_ports::{
    AssignmentRepository, CatalogRepository, CreateActionInput, CreateEntitlementInput,
    CreateGrantRequestInput, CreateResourceInput, CreateRevokeRequestInput, CreateRoleInput,
    CreateRoleSuiteInput, EntitlementDeleteOutcome, EntitlementRepository, HistoryQuery,
    HistoryRepository, ReceiverDirectory, RequestQuery, RequestRepository, RoleDeleteOutcome,
    RoleRepository, SuiteDeleteOutcome, UpdateRoleInput, UpdateRoleSuiteInput,
};
pub use resolver_service::{PermissionCheck, PermissionResolver};
pub use role_service::RoleService;
pub use workflow_service::WorkflowService;
