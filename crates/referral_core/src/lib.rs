//! Company identity reconciliation core for the referral app.
//! This crate is the single source of truth for company/membership invariants.

pub mod config;
pub mod context;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod seed;
pub mod service;

pub use config::{ConfigError, CoreConfig};
pub use context::{CallContext, Interrupted};
pub use logging::{
    default_log_level, init_logging, init_logging_from_config, logging_status, LoggingError,
};
pub use model::company::{
    company_name_key, Company, CompanyId, CompanyInsert, CompanyRef, NewCompany, SeedCompany,
};
pub use model::membership::{
    MemberSource, MemberView, Membership, MembershipId, MembershipInsert, MembershipJoin,
    NewMembership,
};
pub use model::profile::{Profile, UserId};
pub use repo::company_repo::{CompanyRepository, SqliteCompanyRepository};
pub use repo::membership_repo::{MembershipRepository, SqliteMembershipRepository};
pub use repo::profile_repo::{ProfileRepository, SqliteProfileRepository};
pub use repo::{RepoError, RepoResult};
pub use seed::default_seed_companies;
pub use service::company_resolver::{CompanyIndex, CompanyResolver, Resolution, SeedReport};
pub use service::company_service::{CompanyService, SqliteCompanyService};
pub use service::member_aggregator::MemberAggregator;
pub use service::membership_service::MembershipService;
pub use service::reconcile_service::{ProfileFailure, ReconcileService, SyncReport};
pub use service::{ErrorKind, ServiceError, ServiceResult};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
