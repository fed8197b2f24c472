//! Reconciliation sweep over all profiles with a company reference.
//!
//! # Responsibility
//! - Normalize every profile `company` field to a canonical company id.
//! - Backfill the membership row each normalized profile implies.
//!
//! # Invariants
//! - One failing profile never aborts the sweep; only cancellation does.
//! - A second run with no external writes in between performs zero writes.
//! - No state survives between runs; company and membership maps are rebuilt
//!   from storage every time.

use crate::context::CallContext;
use crate::model::company::{CompanyId, NewCompany};
use crate::model::membership::NewMembership;
use crate::model::profile::{Profile, UserId};
use crate::repo::company_repo::CompanyRepository;
use crate::repo::membership_repo::MembershipRepository;
use crate::repo::profile_repo::ProfileRepository;
use crate::service::company_resolver::CompanyIndex;
use crate::service::{ErrorKind, ServiceError, ServiceResult};
use log::{info, warn};
use std::collections::HashSet;
use std::time::Instant;

/// One profile the sweep could not reconcile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileFailure {
    pub user_id: UserId,
    pub kind: ErrorKind,
    pub message: String,
}

/// Counters produced by one sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Profiles returned by the company-reference scan.
    pub scanned: usize,
    /// Profiles whose reference was blank after trimming.
    pub skipped_blank: usize,
    pub companies_created: usize,
    pub profiles_rewritten: usize,
    pub memberships_created: usize,
    pub failures: Vec<ProfileFailure>,
}

impl SyncReport {
    /// Total number of rows written by the sweep.
    pub fn writes(&self) -> usize {
        self.companies_created + self.profiles_rewritten + self.memberships_created
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct ProfileOutcome {
    company_created: bool,
    profile_rewritten: bool,
    membership_created: bool,
}

pub struct ReconcileService<'r, C, M, P>
where
    C: CompanyRepository,
    M: MembershipRepository,
    P: ProfileRepository,
{
    companies: &'r C,
    memberships: &'r M,
    profiles: &'r P,
}

impl<'r, C, M, P> ReconcileService<'r, C, M, P>
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

    /// Runs one full sweep.
    ///
    /// # Errors
    /// - Fails when the initial company, membership or profile scan fails.
    /// - Returns `Cancelled` when the context is cancelled mid-sweep; profiles
    ///   already reconciled keep their writes.
    pub fn sync_all(&self, ctx: &CallContext) -> ServiceResult<SyncReport> {
        let started_at = Instant::now();
        info!("event=company_sync module=reconcile status=start");

        let companies = self.companies.list_companies(ctx)?;
        let mut index = CompanyIndex::from_companies(&companies);
        let mut pairs = self.memberships.list_membership_pairs(ctx)?;
        let profiles = self.profiles.list_profiles_with_company(ctx)?;

        let mut report = SyncReport {
            scanned: profiles.len(),
            ..SyncReport::default()
        };

        for profile in &profiles {
            if profile.company_ref().is_none() {
                report.skipped_blank += 1;
                continue;
            }

            match self.sync_profile(ctx, &mut index, &mut pairs, profile) {
                Ok(outcome) => {
                    report.companies_created += usize::from(outcome.company_created);
                    report.profiles_rewritten += usize::from(outcome.profile_rewritten);
                    report.memberships_created += usize::from(outcome.membership_created);
                }
                Err(ServiceError::Cancelled(reason)) => {
                    warn!(
                        "event=company_sync module=reconcile status=cancelled duration_ms={} writes={}",
                        started_at.elapsed().as_millis(),
                        report.writes()
                    );
                    return Err(ServiceError::Cancelled(reason));
                }
                Err(err) => {
                    warn!(
                        "event=company_sync_item module=reconcile status=error user_id={} error_kind={}",
                        profile.id,
                        err.kind().as_str()
                    );
                    report.failures.push(ProfileFailure {
                        user_id: profile.id,
                        kind: err.kind(),
                        message: err.to_string(),
                    });
                }
            }
        }

        info!(
            "event=company_sync module=reconcile status=ok duration_ms={} scanned={} companies_created={} profiles_rewritten={} memberships_created={} failures={}",
            started_at.elapsed().as_millis(),
            report.scanned,
            report.companies_created,
            report.profiles_rewritten,
            report.memberships_created,
            report.failures.len()
        );
        Ok(report)
    }

    fn sync_profile(
        &self,
        ctx: &CallContext,
        index: &mut CompanyIndex,
        pairs: &mut HashSet<(UserId, CompanyId)>,
        profile: &Profile,
    ) -> ServiceResult<ProfileOutcome> {
        let mut outcome = ProfileOutcome::default();
        let reference = profile
            .company_ref()
            .ok_or_else(|| ServiceError::InvalidInput("blank company reference".to_string()))?;

        let company_id = match index.lookup(&reference) {
            Some(id) => id,
            None => {
                let stored = self
                    .companies
                    .insert_company_if_absent(ctx, &NewCompany::named(reference.as_name()))?;
                index.insert(&stored.company);
                outcome.company_created = stored.inserted;
                stored.company.id
            }
        };

        let canonical = company_id.to_string();
        if profile.company.as_deref() != Some(canonical.as_str()) {
            outcome.profile_rewritten =
                self.profiles
                    .set_profile_company(ctx, profile.id, canonical.as_str())?;
        }

        if !pairs.contains(&(profile.id, company_id)) {
            let stored = self.memberships.insert_membership_if_absent(
                ctx,
                &NewMembership::new(
                    profile.id,
                    company_id,
                    profile.membership_job_title(),
                    profile.department.clone(),
                ),
            )?;
            pairs.insert((profile.id, company_id));
            outcome.membership_created = stored.inserted;
        }

        Ok(outcome)
    }
}
