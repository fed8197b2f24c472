//! Externally owned user profile shape.
//!
//! Core reads every field but only ever rewrites `company`.

use crate::model::company::CompanyRef;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier of a user (and of their profile row).
pub type UserId = Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub id: UserId,
    pub full_name: Option<String>,
    /// Canonical company id, or a free-text company name in arbitrary case.
    pub company: Option<String>,
    pub job_title: Option<String>,
    pub department: Option<String>,
    /// Epoch milliseconds.
    pub updated_at: i64,
}

impl Profile {
    /// Creates a profile with only an id set.
    pub fn new(id: UserId) -> Self {
        Self {
            id,
            full_name: None,
            company: None,
            job_title: None,
            department: None,
            updated_at: 0,
        }
    }

    /// Builder-style setter for the company reference.
    pub fn with_company(mut self, company: impl Into<String>) -> Self {
        self.company = Some(company.into());
        self
    }

    /// Builder-style setter for job title and department.
    pub fn with_role(mut self, job_title: impl Into<String>, department: Option<&str>) -> Self {
        self.job_title = Some(job_title.into());
        self.department = department.map(str::to_string);
        self
    }

    /// Classified company reference, `None` when blank or unset.
    pub fn company_ref(&self) -> Option<CompanyRef> {
        self.company.as_deref().and_then(CompanyRef::classify)
    }

    /// Job title used when a membership is backfilled from this profile.
    pub fn membership_job_title(&self) -> String {
        self.job_title
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .unwrap_or(DEFAULT_JOB_TITLE)
            .to_string()
    }
}

/// Job title stored when a backfilled profile has none.
pub const DEFAULT_JOB_TITLE: &str = "Employee";
