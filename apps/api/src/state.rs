//! Shared handler state.

use entiva_application::{
    AssignmentService, CatalogService, EntitlementService, HistoryService, PermissionResolver,
    RoleService, WorkflowService,
};

/// Services shared by every handler.
#[derive(Clone)]
pub struct AppState {
    /// Resource/action catalog service.
    pub catalog: CatalogService,
    /// Entitlement lifecycle service.
    pub entitlements: EntitlementService,
    /// Role and role-suite lifecycle service.
    pub roles: RoleService,
    /// Direct grant/revoke service.
    pub assignments: AssignmentService,
    /// Grant/revoke request workflow service.
    pub workflow: WorkflowService,
    /// Effective-permission read side.
    pub resolver: PermissionResolver,
    /// Permission history read side.
    pub history: HistoryService,
}
