//! Membership use-case service.
//!
//! # Responsibility
//! - Add users to companies without ever creating a duplicate pair.
//! - Answer membership checks, healing a missing row from the profile.
//!
//! # Invariants
//! - The profile `company` field is only rewritten together with a fresh
//!   membership insert, in the same transaction.
//! - Once `is_member` heals a pair, later calls take the row fast path.

use crate::context::CallContext;
use crate::model::company::{references_company, CompanyId};
use crate::model::membership::{Membership, NewMembership};
use crate::model::profile::UserId;
use crate::repo::company_repo::CompanyRepository;
use crate::repo::membership_repo::MembershipRepository;
use crate::repo::profile_repo::ProfileRepository;
use crate::service::{ServiceError, ServiceResult};
use log::{debug, info, warn};

pub struct MembershipService<'r, C, M, P>
where
    C: CompanyRepository,
    M: MembershipRepository,
    P: ProfileRepository,
{
    companies: &'r C,
    memberships: &'r M,
    profiles: &'r P,
}

impl<'r, C, M, P> MembershipService<'r, C, M, P>
where
    C: CompanyRepository,
    M: MembershipRepository,
    P: ProfileRepository,
{
    pub fn new(companies: &'r C, memberships: &'r M, profiles: &'r P) -> Self {
        Self {
            companies,
            memberships,
            profiles,
        }
    }

    /// Adds `user_id` to `company_id`, returning the stored row.
    ///
    /// An existing row for the pair is returned unchanged. A fresh insert
    /// also writes `company_id` into the user's profile; both writes commit or
    /// neither does, so a failed call can simply be retried.
    ///
    /// # Errors
    /// - `InvalidInput` when `job_title` is blank.
    /// - `CompanyNotFound` when the company does not exist.
    /// - `Cancelled` / `Store` from the repositories.
    pub fn add_member(
        &self,
        ctx: &CallContext,
        user_id: UserId,
        company_id: CompanyId,
        job_title: &str,
        department: Option<&str>,
    ) -> ServiceResult<Membership> {
        let job_title = job_title.trim();
        if job_title.is_empty() {
            return Err(ServiceError::InvalidInput(
                "job title must not be blank".to_string(),
            ));
        }

        if let Some(existing) = self.memberships.find_membership(ctx, user_id, company_id)? {
            debug!(
                "event=member_add module=membership status=noop user_id={user_id} company_id={company_id}"
            );
            return Ok(existing);
        }

        if self.companies.get_company(ctx, company_id)?.is_none() {
            return Err(ServiceError::CompanyNotFound(company_id));
        }

        let department = department
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string);
        let joined = self.memberships.join_company(
            ctx,
            &NewMembership::new(user_id, company_id, job_title, department),
        )?;
        if !joined.inserted {
            // Lost a race against a concurrent insert for the same pair.
            debug!(
                "event=member_add module=membership status=conflict_ignored user_id={user_id} company_id={company_id}"
            );
            return Ok(joined.membership);
        }

        info!(
            "event=member_add module=membership status=ok user_id={} company_id={} profile_updated={}",
            user_id, company_id, joined.profile_updated
        );
        Ok(joined.membership)
    }

    /// Returns whether `user_id` belongs to `company_id`.
    ///
    /// Falls back to the user's profile when no row exists; a profile naming
    /// the company (by id or case-insensitive name) is persisted as a
    /// membership before returning `true`.
    pub fn is_member(
        &self,
        ctx: &CallContext,
        user_id: UserId,
        company_id: CompanyId,
    ) -> ServiceResult<bool> {
        if self
            .memberships
            .find_membership(ctx, user_id, company_id)?
            .is_some()
        {
            return Ok(true);
        }

        let Some(profile) = self.profiles.get_profile(ctx, user_id)? else {
            return Ok(false);
        };
        let Some(reference) = profile.company.as_deref() else {
            return Ok(false);
        };
        let Some(company) = self.companies.get_company(ctx, company_id)? else {
            return Ok(false);
        };
        if !references_company(reference, &company) {
            return Ok(false);
        }

        match self.add_member(
            ctx,
            user_id,
            company_id,
            profile.membership_job_title().as_str(),
            profile.department.as_deref(),
        ) {
            Ok(_) => {
                info!(
                    "event=member_heal module=membership status=ok path=is_member user_id={user_id} company_id={company_id}"
                );
                Ok(true)
            }
            Err(err) => {
                warn!(
                    "event=member_heal module=membership status=error path=is_member user_id={} company_id={} error_kind={}",
                    user_id,
                    company_id,
                    err.kind().as_str()
                );
                Err(err)
            }
        }
    }
}
