use referral_core::db::open_db_in_memory;
use referral_core::db::DbError;
use referral_core::{
    CallContext, Company, CompanyService, ErrorKind, Profile, ProfileRepository, RepoError,
    RepoResult, SqliteCompanyRepository, SqliteCompanyService, SqliteMembershipRepository,
    SqliteProfileRepository, UserId,
};
use rusqlite::{params, Connection};
use uuid::Uuid;

#[test]
fn sweep_normalizes_free_text_and_backfills_memberships() {
    let conn = open_db_in_memory().unwrap();
    let service = SqliteCompanyService::try_from_conn(&conn).unwrap();
    let ctx = CallContext::background();
    let google = service.resolve_or_create_company(&ctx, "Google").unwrap();

    let alice = save(&service, Profile::new(Uuid::new_v4()).with_company("google"));
    let bob = save(
        &service,
        Profile::new(Uuid::new_v4())
            .with_company("Initech")
            .with_role("Analyst", Some("Finance")),
    );
    let carol = save(&service, Profile::new(Uuid::new_v4()).with_company("INITECH"));

    let report = service.sync_all(&ctx).unwrap();
    assert_eq!(report.scanned, 3);
    assert_eq!(report.companies_created, 1);
    assert_eq!(report.profiles_rewritten, 3);
    assert_eq!(report.memberships_created, 3);
    assert!(report.failures.is_empty());

    let initech = service.resolve_or_create_company(&ctx, "initech").unwrap();
    assert_eq!(profile_company(&conn, alice), Some(google.to_string()));
    assert_eq!(profile_company(&conn, bob), Some(initech.to_string()));
    assert_eq!(profile_company(&conn, carol), Some(initech.to_string()));

    let (title, department) = membership_role(&conn, bob, initech);
    assert_eq!(title, "Analyst");
    assert_eq!(department.as_deref(), Some("Finance"));
}

#[test]
fn sweep_keeps_casing_of_unknown_id_shaped_reference() {
    let conn = open_db_in_memory().unwrap();
    let service = SqliteCompanyService::try_from_conn(&conn).unwrap();
    let ctx = CallContext::background();
    let raw = "11111111-AAAA-4BBB-8CCC-DDDDDDDDDDDD";
    let user = save(&service, Profile::new(Uuid::new_v4()).with_company(raw));

    let report = service.sync_all(&ctx).unwrap();
    assert_eq!(report.companies_created, 1);

    let companies = service.get_all_companies(&ctx).unwrap();
    assert_eq!(companies.len(), 1);
    assert_eq!(companies[0].name, raw);
    assert_eq!(profile_company(&conn, user), Some(companies[0].id.to_string()));
}

#[test]
fn second_sweep_performs_zero_writes() {
    let conn = open_db_in_memory().unwrap();
    let service = SqliteCompanyService::try_from_conn(&conn).unwrap();
    let ctx = CallContext::background();

    save(&service, Profile::new(Uuid::new_v4()).with_company("Globex"));
    save(&service, Profile::new(Uuid::new_v4()).with_company("globex "));
    save(&service, Profile::new(Uuid::new_v4()).with_company("Umbrella"));
    save(&service, Profile::new(Uuid::new_v4()));

    let first = service.sync_all(&ctx).unwrap();
    assert!(first.writes() > 0);
    let snapshot = table_snapshot(&conn);

    let second = service.sync_all(&ctx).unwrap();
    assert_eq!(second.writes(), 0);
    assert!(second.failures.is_empty());
    assert_eq!(table_snapshot(&conn), snapshot);
}

#[test]
fn every_referencing_profile_is_consistent_after_sweep() {
    let conn = open_db_in_memory().unwrap();
    let service = SqliteCompanyService::try_from_conn(&conn).unwrap();
    let ctx = CallContext::background();
    let acme = service.resolve_or_create_company(&ctx, "Acme").unwrap();

    save(&service, Profile::new(Uuid::new_v4()).with_company(acme.to_string()));
    save(
        &service,
        Profile::new(Uuid::new_v4()).with_company(acme.to_string().to_uppercase()),
    );
    save(
        &service,
        Profile::new(Uuid::new_v4()).with_company(Uuid::new_v4().to_string()),
    );
    save(&service, Profile::new(Uuid::new_v4()).with_company("Hooli"));

    service.sync_all(&ctx).unwrap();

    let orphans: i64 = conn
        .query_row(
            "SELECT COUNT(*)
             FROM profiles p
             WHERE p.company IS NOT NULL
               AND trim(p.company) <> ''
               AND (
                    NOT EXISTS (SELECT 1 FROM companies c WHERE c.id = p.company)
                    OR NOT EXISTS (
                        SELECT 1 FROM company_members m
                        WHERE m.user_id = p.id AND m.company_id = p.company
                    )
               );",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(orphans, 0);
}

#[test]
fn existing_membership_is_not_duplicated_by_sweep() {
    let conn = open_db_in_memory().unwrap();
    let service = SqliteCompanyService::try_from_conn(&conn).unwrap();
    let ctx = CallContext::background();
    let acme = service.resolve_or_create_company(&ctx, "Acme").unwrap();
    let user = save(&service, Profile::new(Uuid::new_v4()).with_company("ACME"));
    service.add_member(&ctx, user, acme, "Engineer", None).unwrap();

    let report = service.sync_all(&ctx).unwrap();
    assert_eq!(report.memberships_created, 0);
    assert_eq!(report.profiles_rewritten, 0);

    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM company_members;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(count, 1);
}

#[test]
fn one_failing_profile_does_not_abort_the_sweep() {
    let conn = open_db_in_memory().unwrap();
    let ctx = CallContext::background();
    let broken = Uuid::new_v4();
    let healthy = Uuid::new_v4();
    {
        let profiles = SqliteProfileRepository::try_new(&conn).unwrap();
        profiles
            .save_profile(&ctx, &Profile::new(broken).with_company("Acme"))
            .unwrap();
        profiles
            .save_profile(&ctx, &Profile::new(healthy).with_company("Acme"))
            .unwrap();
    }

    let service = CompanyService::new(
        SqliteCompanyRepository::try_new(&conn).unwrap(),
        SqliteMembershipRepository::try_new(&conn).unwrap(),
        FailingProfiles {
            inner: SqliteProfileRepository::try_new(&conn).unwrap(),
            fail_for: broken,
        },
    );

    let report = service.sync_all(&ctx).unwrap();
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].user_id, broken);
    assert_eq!(report.failures[0].kind, ErrorKind::StoreUnavailable);
    assert_eq!(report.memberships_created, 1);

    let acme = service.resolve_or_create_company(&ctx, "acme").unwrap();
    assert_eq!(profile_company(&conn, healthy), Some(acme.to_string()));
    assert_eq!(profile_company(&conn, broken), Some("Acme".to_string()));
}

#[test]
fn cancelled_sweep_returns_cancelled() {
    let conn = open_db_in_memory().unwrap();
    let service = SqliteCompanyService::try_from_conn(&conn).unwrap();
    save(&service, Profile::new(Uuid::new_v4()).with_company("Acme"));
    let ctx = CallContext::background();
    ctx.cancel();

    let err = service.sync_all(&ctx).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Cancelled);
}

struct FailingProfiles<'conn> {
    inner: SqliteProfileRepository<'conn>,
    fail_for: UserId,
}

impl ProfileRepository for FailingProfiles<'_> {
    fn get_profile(&self, ctx: &CallContext, user_id: UserId) -> RepoResult<Option<Profile>> {
        self.inner.get_profile(ctx, user_id)
    }

    fn get_profiles(&self, ctx: &CallContext, user_ids: &[UserId]) -> RepoResult<Vec<Profile>> {
        self.inner.get_profiles(ctx, user_ids)
    }

    fn list_profiles_with_company(&self, ctx: &CallContext) -> RepoResult<Vec<Profile>> {
        self.inner.list_profiles_with_company(ctx)
    }

    fn list_profiles_referencing(
        &self,
        ctx: &CallContext,
        company: &Company,
    ) -> RepoResult<Vec<Profile>> {
        self.inner.list_profiles_referencing(ctx, company)
    }

    fn set_profile_company(
        &self,
        ctx: &CallContext,
        user_id: UserId,
        company: &str,
    ) -> RepoResult<bool> {
        if user_id == self.fail_for {
            return Err(RepoError::Db(DbError::Sqlite(
                rusqlite::Error::ExecuteReturnedResults,
            )));
        }
        self.inner.set_profile_company(ctx, user_id, company)
    }

    fn save_profile(&self, ctx: &CallContext, profile: &Profile) -> RepoResult<()> {
        self.inner.save_profile(ctx, profile)
    }
}

fn save(service: &SqliteCompanyService<'_>, profile: Profile) -> UserId {
    service
        .profiles()
        .save_profile(&CallContext::background(), &profile)
        .unwrap();
    profile.id
}

fn profile_company(conn: &Connection, user: UserId) -> Option<String> {
    conn.query_row(
        "SELECT company FROM profiles WHERE id = ?1;",
        [user.to_string()],
        |row| row.get(0),
    )
    .unwrap()
}

fn membership_role(conn: &Connection, user: UserId, company: Uuid) -> (String, Option<String>) {
    conn.query_row(
        "SELECT job_title, department FROM company_members WHERE user_id = ?1 AND company_id = ?2;",
        params![user.to_string(), company.to_string()],
        |row| Ok((row.get(0)?, row.get(1)?)),
    )
    .unwrap()
}

fn table_snapshot(conn: &Connection) -> (i64, i64, Vec<(String, Option<String>, i64)>) {
    let companies = conn
        .query_row("SELECT COUNT(*) FROM companies;", [], |row| row.get(0))
        .unwrap();
    let memberships = conn
        .query_row("SELECT COUNT(*) FROM company_members;", [], |row| row.get(0))
        .unwrap();
    let mut stmt = conn
        .prepare("SELECT id, company, updated_at FROM profiles ORDER BY id;")
        .unwrap();
    let profiles = stmt
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))
        .unwrap()
        .collect::<Result<Vec<_>, _>>()
        .unwrap();
    (companies, memberships, profiles)
}
