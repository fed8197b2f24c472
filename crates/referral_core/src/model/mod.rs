//! Domain model for company identity and membership.
//!
//! # Responsibility
//! - Define canonical company records and the membership association.
//! - Describe the externally owned profile shape read and rewritten by core.
//!
//! # Invariants
//! - Every company is identified by a stable `CompanyId`.
//! - Nothing in this model is hard-deleted by core.

pub mod company;
pub mod membership;
pub mod profile;
