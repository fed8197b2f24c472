//! Profile repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Read externally owned profiles, including every profile that carries a
//!   company reference.
//! - Rewrite the `company` field with a canonical id.
//!
//! # Invariants
//! - Core never changes profile fields other than `company` (and its
//!   `updated_at` stamp); `save_profile` exists for the owning flows.
//! - `set_profile_company` is a no-op when the stored value already matches.

use super::schema::{parse_uuid, require_table};
use super::RepoResult;
use crate::context::CallContext;
use crate::model::company::{references_company, Company};
use crate::model::profile::{Profile, UserId};
use rusqlite::{params, params_from_iter, Connection, Row};

const PROFILE_SELECT_SQL: &str = "SELECT
    id,
    full_name,
    company,
    job_title,
    department,
    updated_at
FROM profiles";

const ID_BATCH_SIZE: usize = 500;

/// Rewrites `profiles.company` for `?1` to `?2` unless already equal.
pub(super) const SET_PROFILE_COMPANY_SQL: &str = "UPDATE profiles
SET
    company = ?2,
    updated_at = (strftime('%s', 'now') * 1000)
WHERE id = ?1
  AND (company IS NULL OR company <> ?2);";

/// Repository interface for user profiles.
pub trait ProfileRepository {
    /// Loads one profile by user id.
    fn get_profile(&self, ctx: &CallContext, user_id: UserId) -> RepoResult<Option<Profile>>;
    /// Loads the profiles for the given user ids; unknown ids are skipped.
    fn get_profiles(&self, ctx: &CallContext, user_ids: &[UserId]) -> RepoResult<Vec<Profile>>;
    /// Lists profiles whose `company` field is non-blank, ordered by id.
    fn list_profiles_with_company(&self, ctx: &CallContext) -> RepoResult<Vec<Profile>>;
    /// Lists profiles whose `company` names `company` by id or by
    /// case-insensitive name, ordered by id.
    fn list_profiles_referencing(
        &self,
        ctx: &CallContext,
        company: &Company,
    ) -> RepoResult<Vec<Profile>>;
    /// Overwrites the `company` field. Returns `false` when nothing changed
    /// (value already equal or profile missing).
    fn set_profile_company(
        &self,
        ctx: &CallContext,
        user_id: UserId,
        company: &str,
    ) -> RepoResult<bool>;
    /// Inserts or fully replaces one profile.
    fn save_profile(&self, ctx: &CallContext, profile: &Profile) -> RepoResult<()>;
}

/// SQLite-backed profile repository.
pub struct SqliteProfileRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteProfileRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        require_table(
            conn,
            "profiles",
            &[
                "id",
                "full_name",
                "company",
                "job_title",
                "department",
                "updated_at",
            ],
        )?;
        Ok(Self { conn })
    }

    fn query_profiles(&self, sql: &str, bind: Vec<String>) -> RepoResult<Vec<Profile>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query(params_from_iter(bind))?;
        let mut profiles = Vec::new();
        while let Some(row) = rows.next()? {
            profiles.push(parse_profile_row(row)?);
        }
        Ok(profiles)
    }
}

impl ProfileRepository for SqliteProfileRepository<'_> {
    fn get_profile(&self, ctx: &CallContext, user_id: UserId) -> RepoResult<Option<Profile>> {
        ctx.check()?;
        let mut profiles = self.query_profiles(
            &format!("{PROFILE_SELECT_SQL} WHERE id = ?1;"),
            vec![user_id.to_string()],
        )?;
        Ok(profiles.pop())
    }

    fn get_profiles(&self, ctx: &CallContext, user_ids: &[UserId]) -> RepoResult<Vec<Profile>> {
        let mut profiles = Vec::with_capacity(user_ids.len());
        for batch in user_ids.chunks(ID_BATCH_SIZE) {
            ctx.check()?;
            let placeholders = vec!["?"; batch.len()].join(", ");
            let bind = batch.iter().map(ToString::to_string).collect();
            profiles.extend(self.query_profiles(
                &format!("{PROFILE_SELECT_SQL} WHERE id IN ({placeholders}) ORDER BY id ASC;"),
                bind,
            )?);
        }
        Ok(profiles)
    }

    fn list_profiles_with_company(&self, ctx: &CallContext) -> RepoResult<Vec<Profile>> {
        ctx.check()?;
        self.query_profiles(
            &format!(
                "{PROFILE_SELECT_SQL}
                 WHERE company IS NOT NULL
                   AND trim(company) <> ''
                 ORDER BY id ASC;"
            ),
            Vec::new(),
        )
    }

    fn list_profiles_referencing(
        &self,
        ctx: &CallContext,
        company: &Company,
    ) -> RepoResult<Vec<Profile>> {
        // SQLite case folding is ASCII-only, so name matching happens here.
        let profiles = self.list_profiles_with_company(ctx)?;
        Ok(profiles
            .into_iter()
            .filter(|profile| {
                profile
                    .company
                    .as_deref()
                    .is_some_and(|value| references_company(value, company))
            })
            .collect())
    }

    fn set_profile_company(
        &self,
        ctx: &CallContext,
        user_id: UserId,
        company: &str,
    ) -> RepoResult<bool> {
        ctx.check()?;
        let changed = self.conn.execute(
            SET_PROFILE_COMPANY_SQL,
            params![user_id.to_string(), company],
        )?;
        Ok(changed > 0)
    }

    fn save_profile(&self, ctx: &CallContext, profile: &Profile) -> RepoResult<()> {
        ctx.check()?;
        self.conn.execute(
            "INSERT INTO profiles (
                id,
                full_name,
                company,
                job_title,
                department
            ) VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT (id) DO UPDATE SET
                full_name = excluded.full_name,
                company = excluded.company,
                job_title = excluded.job_title,
                department = excluded.department,
                updated_at = (strftime('%s', 'now') * 1000);",
            params![
                profile.id.to_string(),
                profile.full_name.as_deref(),
                profile.company.as_deref(),
                profile.job_title.as_deref(),
                profile.department.as_deref(),
            ],
        )?;
        Ok(())
    }
}

fn parse_profile_row(row: &Row<'_>) -> RepoResult<Profile> {
    let id_text: String = row.get("id")?;
    Ok(Profile {
        id: parse_uuid(&id_text, "profiles.id")?,
        full_name: row.get("full_name")?,
        company: row.get("company")?,
        job_title: row.get("job_title")?,
        department: row.get("department")?,
        updated_at: row.get("updated_at")?,
    })
}
