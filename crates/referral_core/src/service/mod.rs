//! Company identity use-case services.
//!
//! # Responsibility
//! - Resolve free-form company references to canonical ids.
//! - Maintain memberships and repair drift between profiles and memberships.
//! - Keep callers decoupled from storage details.
//!
//! # Invariants
//! - Services hold repositories only; there is no module-level state.
//! - Every write path is idempotent.

pub mod company_resolver;
pub mod company_service;
mod error;
pub mod member_aggregator;
pub mod membership_service;
pub mod reconcile_service;

pub use error::{ErrorKind, ServiceError, ServiceResult};
