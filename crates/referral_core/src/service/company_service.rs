//! Company identity facade for interactive flows and maintenance triggers.
//!
//! # Responsibility
//! - Own the company, membership and profile repositories.
//! - Expose resolution, membership, roster and sweep operations from one
//!   injectable component.

use crate::context::CallContext;
use crate::model::company::{Company, CompanyId, SeedCompany};
use crate::model::membership::{MemberView, Membership};
use crate::model::profile::UserId;
use crate::repo::company_repo::{CompanyRepository, SqliteCompanyRepository};
use crate::repo::membership_repo::{MembershipRepository, SqliteMembershipRepository};
use crate::repo::profile_repo::{ProfileRepository, SqliteProfileRepository};
use crate::repo::RepoResult;
use crate::service::company_resolver::{CompanyResolver, SeedReport};
use crate::service::member_aggregator::MemberAggregator;
use crate::service::membership_service::MembershipService;
use crate::service::reconcile_service::{ReconcileService, SyncReport};
use crate::service::ServiceResult;
use rusqlite::Connection;

/// Facade over the three repositories.
pub struct CompanyService<C, M, P>
where
    C: CompanyRepository,
    M: MembershipRepository,
    P: ProfileRepository,
{
    companies: C,
    memberships: M,
    profiles: P,
}

/// Facade wired to SQLite repositories sharing one connection.
pub type SqliteCompanyService<'conn> = CompanyService<
    SqliteCompanyRepository<'conn>,
    SqliteMembershipRepository<'conn>,
    SqliteProfileRepository<'conn>,
>;

impl<'conn> SqliteCompanyService<'conn> {
    /// Builds the facade from a migrated connection.
    pub fn try_from_conn(conn: &'conn Connection) -> RepoResult<Self> {
        Ok(Self::new(
            SqliteCompanyRepository::try_new(conn)?,
            SqliteMembershipRepository::try_new(conn)?,
            SqliteProfileRepository::try_new(conn)?,
        ))
    }
}

impl<C, M, P> CompanyService<C, M, P>
where
    C: CompanyRepository,
    M: MembershipRepository,
    P: ProfileRepository,
{
    pub fn new(companies: C, memberships: M, profiles: P) -> Self {
        Self {
            companies,
            memberships,
            profiles,
        }
    }

    pub fn resolver(&self) -> CompanyResolver<'_, C> {
        CompanyResolver::new(&self.companies)
    }

    pub fn membership(&self) -> MembershipService<'_, C, M, P> {
        MembershipService::new(&self.companies, &self.memberships, &self.profiles)
    }

    pub fn reconciler(&self) -> ReconcileService<'_, C, M, P> {
        ReconcileService::new(&self.companies, &self.memberships, &self.profiles)
    }

    pub fn aggregator(&self) -> MemberAggregator<'_, C, M, P> {
        MemberAggregator::new(&self.companies, &self.memberships, &self.profiles)
    }

    pub fn profiles(&self) -> &P {
        &self.profiles
    }

    /// Registration and "custom company" profile edits.
    pub fn resolve_or_create_company(
        &self,
        ctx: &CallContext,
        name: &str,
    ) -> ServiceResult<CompanyId> {
        self.resolver().resolve_or_create(ctx, name)
    }

    /// Startup seeding with a curated list.
    pub fn ensure_seed_companies(
        &self,
        ctx: &CallContext,
        seeds: &[SeedCompany],
    ) -> ServiceResult<SeedReport> {
        self.resolver().ensure_seed_companies(ctx, seeds)
    }

    pub fn add_member(
        &self,
        ctx: &CallContext,
        user_id: UserId,
        company_id: CompanyId,
        job_title: &str,
        department: Option<&str>,
    ) -> ServiceResult<Membership> {
        self.membership()
            .add_member(ctx, user_id, company_id, job_title, department)
    }

    pub fn is_member(
        &self,
        ctx: &CallContext,
        user_id: UserId,
        company_id: CompanyId,
    ) -> ServiceResult<bool> {
        self.membership().is_member(ctx, user_id, company_id)
    }

    /// Company directory listing.
    pub fn get_all_companies(&self, ctx: &CallContext) -> ServiceResult<Vec<Company>> {
        Ok(self.companies.list_companies(ctx)?)
    }

    pub fn get_company_members(
        &self,
        ctx: &CallContext,
        company_id: CompanyId,
    ) -> ServiceResult<Vec<MemberView>> {
        self.aggregator().get_company_members(ctx, company_id)
    }

    pub fn sync_all(&self, ctx: &CallContext) -> ServiceResult<SyncReport> {
        self.reconciler().sync_all(ctx)
    }
}
