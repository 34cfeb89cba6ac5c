//! HTTP handlers, one module per API area.

pub mod assignments;
pub mod catalog;
pub mod entitlements;
pub mod health;
pub mod history;
pub mod permissions;
pub mod requests;
pub mod roles;
