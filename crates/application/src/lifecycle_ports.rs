//! Repository and collaborator ports for the lifecycle engine.
//!
//! Each entity family gets its own port so every service can be tested
//! against a small in-memory fake. Cascading deletes are single port calls:
//! the owning adapter commits the cascade and its history records together
//! (one write lock in memory, one transaction in Postgres).

mod assignment;
mod catalog;
mod directory;
mod entitlement;
mod history;
mod request;
mod role;

pub use assignment::AssignmentRepository;
pub use catalog::{CatalogRepository, CreateActionInput, CreateResourceInput};
pub use directory::ReceiverDirectory;
pub use entitlement::{CreateEntitlementInput, EntitlementDeleteOutcome, EntitlementRepository};
pub use history::{HistoryQuery, HistoryRepository};
pub use request::{
    CreateGrantRequestInput, CreateRevokeRequestInput, RequestQuery, RequestRepository,
};
pub use role::{
    CreateRoleInput, CreateRoleSuiteInput, RoleDeleteOutcome, RoleRepository, SuiteDeleteOutcome,
    UpdateRoleInput, UpdateRoleSuiteInput,
};
