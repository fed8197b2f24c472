//! Membership association and roster read model.
//!
//! # Responsibility
//! - Define the persisted `(user, company)` association row.
//! - Define the roster projection merged from memberships and profiles.
//!
//! # Invariants
//! - At most one `Membership` exists per `(user_id, company_id)` pair.

use crate::model::company::CompanyId;
use crate::model::profile::UserId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier of one membership row.
pub type MembershipId = Uuid;

/// Persisted association between a user and a company.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Membership {
    pub id: MembershipId,
    pub user_id: UserId,
    pub company_id: CompanyId,
    pub job_title: String,
    pub department: Option<String>,
    /// Epoch milliseconds.
    pub joined_at: i64,
}

/// Insert model for a membership row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMembership {
    pub user_id: UserId,
    pub company_id: CompanyId,
    pub job_title: String,
    pub department: Option<String>,
}

impl NewMembership {
    pub fn new(
        user_id: UserId,
        company_id: CompanyId,
        job_title: impl Into<String>,
        department: Option<String>,
    ) -> Self {
        Self {
            user_id,
            company_id,
            job_title: job_title.into(),
            department,
        }
    }
}

/// Outcome of an insert-if-absent membership write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MembershipInsert {
    /// The row now stored for the pair (new or pre-existing).
    pub membership: Membership,
    /// `false` when the pair already existed and nothing was written.
    pub inserted: bool,
}

/// Outcome of joining a user to a company: the membership write and the
/// profile link are committed together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MembershipJoin {
    pub membership: Membership,
    /// `false` when the pair already existed; the profile is then untouched.
    pub inserted: bool,
    /// `true` when the profile `company` field was rewritten.
    pub profile_updated: bool,
}

/// Where a roster entry was discovered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberSource {
    /// Backed by an explicit `company_members` row.
    Membership,
    /// Found through a profile whose `company` field references the company.
    ProfileReference,
}

/// One roster entry for a company.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberView {
    pub user_id: UserId,
    pub company_id: CompanyId,
    pub full_name: Option<String>,
    pub job_title: Option<String>,
    pub department: Option<String>,
    /// `None` for a profile reference whose membership write-back failed.
    pub joined_at: Option<i64>,
    pub source: MemberSource,
    /// `true` when this call persisted the missing membership row.
    pub healed: bool,
}
