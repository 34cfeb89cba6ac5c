//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod in_memory_authz_repository;
mod permissive_receiver_directory;
mod postgres_authz_repository;

pub use in_memory_authz_repository::InMemoryAuthzRepository;
pub use permissive_receiver_directory::PermissiveReceiverDirectory;
pub use postgres_authz_repository::PostgresAuthzRepository;
