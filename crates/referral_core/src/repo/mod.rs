//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts for companies,
//!   memberships and profiles.
//! - Isolate SQLite query details from reconciliation orchestration.
//!
//! # Invariants
//! - Every repository call checks its `CallContext` before touching storage.
//! - Membership and company creation are insert-if-absent; a conflict is
//!   reported as `inserted = false`, never as an error.

pub mod company_repo;
mod error;
pub mod membership_repo;
pub mod profile_repo;
mod schema;

pub use error::{RepoError, RepoResult};
