use referral_core::db::open_db_in_memory;
use referral_core::db::DbError;
use referral_core::{
    CallContext, CompanyId, CompanyService, ErrorKind, MemberSource, MembershipInsert,
    MembershipJoin, MembershipRepository, NewMembership, Profile, ProfileRepository, RepoError,
    RepoResult, SqliteCompanyRepository, SqliteCompanyService, SqliteMembershipRepository,
    SqliteProfileRepository, UserId,
};
use rusqlite::Connection;
use std::collections::HashSet;
use uuid::Uuid;

#[test]
fn free_text_profile_appears_and_is_healed() {
    let conn = open_db_in_memory().unwrap();
    let service = SqliteCompanyService::try_from_conn(&conn).unwrap();
    let ctx = CallContext::background();
    let google = service.resolve_or_create_company(&ctx, "Google").unwrap();
    let user = save(
        &service,
        Profile::new(Uuid::new_v4())
            .with_company("Google")
            .with_role("Engineer", None),
    );

    let members = service.get_company_members(&ctx, google).unwrap();
    assert_eq!(members.len(), 1);
    assert_eq!(members[0].user_id, user);
    assert_eq!(members[0].source, MemberSource::ProfileReference);
    assert!(members[0].healed);
    assert!(members[0].joined_at.is_some());
    assert_eq!(membership_count(&conn), 1);

    let again = service.get_company_members(&ctx, google).unwrap();
    assert_eq!(again.len(), 1);
    assert_eq!(again[0].source, MemberSource::Membership);
    assert_eq!(again[0].job_title.as_deref(), Some("Engineer"));
    assert_eq!(membership_count(&conn), 1);
}

#[test]
fn user_in_both_views_appears_once() {
    let conn = open_db_in_memory().unwrap();
    let service = SqliteCompanyService::try_from_conn(&conn).unwrap();
    let ctx = CallContext::background();
    let acme = service.resolve_or_create_company(&ctx, "Acme").unwrap();
    let user = save(
        &service,
        Profile::new(Uuid::new_v4()).with_company("acme"),
    );
    service.add_member(&ctx, user, acme, "Engineer", None).unwrap();
    // Profile edit reverted the field to free text after joining.
    service
        .profiles()
        .set_profile_company(&ctx, user, "ACME")
        .unwrap();

    let members = service.get_company_members(&ctx, acme).unwrap();
    assert_eq!(members.len(), 1);
    assert_eq!(members[0].source, MemberSource::Membership);
}

#[test]
fn roster_merges_both_sets_without_duplicates() {
    let conn = open_db_in_memory().unwrap();
    let service = SqliteCompanyService::try_from_conn(&conn).unwrap();
    let ctx = CallContext::background();
    let acme = service.resolve_or_create_company(&ctx, "Acme").unwrap();
    let other = service.resolve_or_create_company(&ctx, "Globex").unwrap();

    let joined = save(
        &service,
        Profile::new(Uuid::new_v4()).with_company("Placeholder"),
    );
    service.add_member(&ctx, joined, acme, "Lead", Some("R&D")).unwrap();
    let by_id = save(
        &service,
        Profile::new(Uuid::new_v4()).with_company(acme.to_string()),
    );
    let by_name = save(&service, Profile::new(Uuid::new_v4()).with_company("aCmE"));
    save(&service, Profile::new(Uuid::new_v4()).with_company("Globex"));
    save(
        &service,
        Profile::new(Uuid::new_v4()).with_company(other.to_string()),
    );

    let members = service.get_company_members(&ctx, acme).unwrap();
    let ids: Vec<UserId> = members.iter().map(|member| member.user_id).collect();
    let unique: HashSet<UserId> = ids.iter().copied().collect();
    assert_eq!(ids.len(), 3);
    assert_eq!(unique.len(), 3);
    assert!(unique.contains(&joined));
    assert!(unique.contains(&by_id));
    assert!(unique.contains(&by_name));
    assert_eq!(members[0].user_id, joined);
    assert_eq!(members[0].department.as_deref(), Some("R&D"));
}

#[test]
fn unknown_company_is_not_found() {
    let conn = open_db_in_memory().unwrap();
    let service = SqliteCompanyService::try_from_conn(&conn).unwrap();

    let err = service
        .get_company_members(&CallContext::background(), Uuid::new_v4())
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn failed_write_back_still_returns_member() {
    let conn = open_db_in_memory().unwrap();
    let ctx = CallContext::background();
    let (acme, user) = {
        let service = SqliteCompanyService::try_from_conn(&conn).unwrap();
        let acme = service.resolve_or_create_company(&ctx, "Acme").unwrap();
        let user = save(&service, Profile::new(Uuid::new_v4()).with_company("Acme"));
        (acme, user)
    };

    let service = CompanyService::new(
        SqliteCompanyRepository::try_new(&conn).unwrap(),
        ReadOnlyMemberships {
            inner: SqliteMembershipRepository::try_new(&conn).unwrap(),
        },
        SqliteProfileRepository::try_new(&conn).unwrap(),
    );

    let members = service.get_company_members(&ctx, acme).unwrap();
    assert_eq!(members.len(), 1);
    assert_eq!(members[0].user_id, user);
    assert!(!members[0].healed);
    assert!(members[0].joined_at.is_none());
    assert_eq!(membership_count(&conn), 0);
}

struct ReadOnlyMemberships<'conn> {
    inner: SqliteMembershipRepository<'conn>,
}

impl MembershipRepository for ReadOnlyMemberships<'_> {
    fn find_membership(
        &self,
        ctx: &CallContext,
        user_id: UserId,
        company_id: CompanyId,
    ) -> RepoResult<Option<referral_core::Membership>> {
        self.inner.find_membership(ctx, user_id, company_id)
    }

    fn insert_membership_if_absent(
        &self,
        _ctx: &CallContext,
        _membership: &NewMembership,
    ) -> RepoResult<MembershipInsert> {
        Err(RepoError::Db(DbError::Sqlite(
            rusqlite::Error::ExecuteReturnedResults,
        )))
    }

    fn join_company(
        &self,
        _ctx: &CallContext,
        _membership: &NewMembership,
    ) -> RepoResult<MembershipJoin> {
        Err(RepoError::Db(DbError::Sqlite(
            rusqlite::Error::ExecuteReturnedResults,
        )))
    }

    fn list_company_memberships(
        &self,
        ctx: &CallContext,
        company_id: CompanyId,
    ) -> RepoResult<Vec<referral_core::Membership>> {
        self.inner.list_company_memberships(ctx, company_id)
    }

    fn list_membership_pairs(
        &self,
        ctx: &CallContext,
    ) -> RepoResult<HashSet<(UserId, CompanyId)>> {
        self.inner.list_membership_pairs(ctx)
    }
}

fn save(service: &SqliteCompanyService<'_>, profile: Profile) -> UserId {
    service
        .profiles()
        .save_profile(&CallContext::background(), &profile)
        .unwrap();
    profile.id
}

fn membership_count(conn: &Connection) -> i64 {
    conn.query_row("SELECT COUNT(*) FROM company_members;", [], |row| row.get(0))
        .unwrap()
}
