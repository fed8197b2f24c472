//! Company roster read path.
//!
//! # Responsibility
//! - Merge explicit memberships with profiles that reference the company but
//!   have no membership row yet.
//! - Persist the missing rows so later reads find them as memberships.
//!
//! # Invariants
//! - Output contains each user id at most once.
//! - A failed membership write-back never hides the member from the result.
//! - A failed profile scan fails the whole call.

use crate::context::CallContext;
use crate::model::company::CompanyId;
use crate::model::membership::{MemberSource, MemberView, Membership, NewMembership};
use crate::model::profile::{Profile, UserId};
use crate::repo::company_repo::CompanyRepository;
use crate::repo::membership_repo::MembershipRepository;
use crate::repo::profile_repo::ProfileRepository;
use crate::service::{ServiceError, ServiceResult};
use log::{info, warn};
use std::collections::{HashMap, HashSet};

pub struct MemberAggregator<'r, C, M, P>
where
    C: CompanyRepository,
    M: MembershipRepository,
    P: ProfileRepository,
{
    companies: &'r C,
    memberships: &'r M,
    profiles: &'r P,
}

impl<'r, C, M, P> MemberAggregator<'r, C, M, P>
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

    /// Returns the roster of `company_id`.
    ///
    /// Membership-backed entries come first (by `joined_at`, then user id),
    /// followed by profile references in user id order.
    ///
    /// # Errors
    /// - `CompanyNotFound` when the company does not exist.
    /// - `Cancelled` / `Store` when a read fails.
    pub fn get_company_members(
        &self,
        ctx: &CallContext,
        company_id: CompanyId,
    ) -> ServiceResult<Vec<MemberView>> {
        let company = self
            .companies
            .get_company(ctx, company_id)?
            .ok_or(ServiceError::CompanyNotFound(company_id))?;

        let memberships = self.memberships.list_company_memberships(ctx, company_id)?;
        let member_ids: Vec<UserId> = memberships.iter().map(|row| row.user_id).collect();
        let member_profiles: HashMap<UserId, Profile> = self
            .profiles
            .get_profiles(ctx, &member_ids)?
            .into_iter()
            .map(|profile| (profile.id, profile))
            .collect();

        let mut seen = HashSet::with_capacity(memberships.len());
        let mut members = Vec::with_capacity(memberships.len());
        for membership in &memberships {
            if seen.insert(membership.user_id) {
                members.push(membership_view(
                    membership,
                    member_profiles.get(&membership.user_id),
                ));
            }
        }

        let referencing = self.profiles.list_profiles_referencing(ctx, &company)?;
        let mut healed = 0usize;
        let mut heal_failures = 0usize;
        for profile in referencing {
            if !seen.insert(profile.id) {
                continue;
            }
            let view = self.heal_profile_reference(ctx, company_id, &profile);
            if view.healed {
                healed += 1;
            } else if view.joined_at.is_none() {
                heal_failures += 1;
            }
            members.push(view);
        }

        info!(
            "event=company_members module=aggregator status=ok company_id={} members={} healed={} heal_failures={}",
            company_id,
            members.len(),
            healed,
            heal_failures
        );
        Ok(members)
    }

    fn heal_profile_reference(
        &self,
        ctx: &CallContext,
        company_id: CompanyId,
        profile: &Profile,
    ) -> MemberView {
        let mut view = MemberView {
            user_id: profile.id,
            company_id,
            full_name: profile.full_name.clone(),
            job_title: profile.job_title.clone(),
            department: profile.department.clone(),
            joined_at: None,
            source: MemberSource::ProfileReference,
            healed: false,
        };

        let new_membership = NewMembership::new(
            profile.id,
            company_id,
            profile.membership_job_title(),
            profile.department.clone(),
        );
        match self
            .memberships
            .insert_membership_if_absent(ctx, &new_membership)
        {
            Ok(stored) => {
                view.joined_at = Some(stored.membership.joined_at);
                view.healed = stored.inserted;
            }
            Err(err) => {
                warn!(
                    "event=company_members_heal module=aggregator status=error company_id={} user_id={} error_kind={}",
                    company_id,
                    profile.id,
                    ServiceError::from(err).kind().as_str()
                );
            }
        }
        view
    }
}

fn membership_view(membership: &Membership, profile: Option<&Profile>) -> MemberView {
    MemberView {
        user_id: membership.user_id,
        company_id: membership.company_id,
        full_name: profile.and_then(|value| value.full_name.clone()),
        job_title: Some(membership.job_title.clone()),
        department: membership.department.clone(),
        joined_at: Some(membership.joined_at),
        source: MemberSource::Membership,
        healed: false,
    }
}
