//! Membership repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide existence checks and atomic insert-if-absent over
//!   `company_members`.
//! - Provide per-company listing and the full pair set used by the sweep.
//!
//! # Invariants
//! - `(user_id, company_id)` is unique in storage; concurrent inserts for the
//!   same pair collapse into one row.
//! - `join_company` commits the membership row and the profile link in one
//!   transaction; a failed profile write leaves no membership behind.

use super::profile_repo::SET_PROFILE_COMPANY_SQL;
use super::schema::{parse_uuid, require_table};
use super::{RepoError, RepoResult};
use crate::context::CallContext;
use crate::model::company::CompanyId;
use crate::model::membership::{Membership, MembershipInsert, MembershipJoin, NewMembership};
use crate::model::profile::UserId;
use rusqlite::{params, Connection, Row};
use std::collections::HashSet;
use uuid::Uuid;

const MEMBERSHIP_SELECT_SQL: &str = "SELECT
    id,
    user_id,
    company_id,
    job_title,
    department,
    joined_at
FROM company_members";

/// Repository interface for user/company associations.
pub trait MembershipRepository {
    /// Loads the membership for one pair, if any.
    fn find_membership(
        &self,
        ctx: &CallContext,
        user_id: UserId,
        company_id: CompanyId,
    ) -> RepoResult<Option<Membership>>;
    /// Inserts the membership unless the pair already exists.
    fn insert_membership_if_absent(
        &self,
        ctx: &CallContext,
        membership: &NewMembership,
    ) -> RepoResult<MembershipInsert>;
    /// Inserts the membership unless the pair exists and, on a fresh insert,
    /// points the user's profile at the company, atomically.
    fn join_company(
        &self,
        ctx: &CallContext,
        membership: &NewMembership,
    ) -> RepoResult<MembershipJoin>;
    /// Lists memberships of one company ordered by `joined_at`, then user id.
    fn list_company_memberships(
        &self,
        ctx: &CallContext,
        company_id: CompanyId,
    ) -> RepoResult<Vec<Membership>>;
    /// Returns every stored `(user_id, company_id)` pair.
    fn list_membership_pairs(&self, ctx: &CallContext)
        -> RepoResult<HashSet<(UserId, CompanyId)>>;
}

/// SQLite-backed membership repository.
pub struct SqliteMembershipRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteMembershipRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        require_table(
            conn,
            "company_members",
            &[
                "id",
                "user_id",
                "company_id",
                "job_title",
                "department",
                "joined_at",
            ],
        )?;
        Ok(Self { conn })
    }

    fn load_pair(&self, user_id: UserId, company_id: CompanyId) -> RepoResult<Option<Membership>> {
        let mut stmt = self.conn.prepare(&format!(
            "{MEMBERSHIP_SELECT_SQL}
             WHERE user_id = ?1
               AND company_id = ?2;"
        ))?;
        let mut rows = stmt.query(params![user_id.to_string(), company_id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_membership_row(row)?));
        }
        Ok(None)
    }

    fn insert_pair(&self, membership: &NewMembership) -> RepoResult<MembershipInsert> {
        let changed = self.conn.execute(
            "INSERT INTO company_members (
                id,
                user_id,
                company_id,
                job_title,
                department
            ) VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT (user_id, company_id) DO NOTHING;",
            params![
                Uuid::new_v4().to_string(),
                membership.user_id.to_string(),
                membership.company_id.to_string(),
                membership.job_title.as_str(),
                membership.department.as_deref(),
            ],
        )?;

        let stored = self
            .load_pair(membership.user_id, membership.company_id)?
            .ok_or_else(|| {
                RepoError::InvalidData(format!(
                    "membership row missing after insert for user {} company {}",
                    membership.user_id, membership.company_id
                ))
            })?;

        Ok(MembershipInsert {
            membership: stored,
            inserted: changed == 1,
        })
    }
}

impl MembershipRepository for SqliteMembershipRepository<'_> {
    fn find_membership(
        &self,
        ctx: &CallContext,
        user_id: UserId,
        company_id: CompanyId,
    ) -> RepoResult<Option<Membership>> {
        ctx.check()?;
        self.load_pair(user_id, company_id)
    }

    fn insert_membership_if_absent(
        &self,
        ctx: &CallContext,
        membership: &NewMembership,
    ) -> RepoResult<MembershipInsert> {
        ctx.check()?;
        self.insert_pair(membership)
    }

    fn join_company(
        &self,
        ctx: &CallContext,
        membership: &NewMembership,
    ) -> RepoResult<MembershipJoin> {
        ctx.check()?;
        let tx = self.conn.unchecked_transaction()?;
        let stored = self.insert_pair(membership)?;
        let mut profile_updated = false;
        if stored.inserted {
            ctx.check()?;
            profile_updated = tx.execute(
                SET_PROFILE_COMPANY_SQL,
                params![
                    membership.user_id.to_string(),
                    membership.company_id.to_string()
                ],
            )? > 0;
        }
        tx.commit()?;

        Ok(MembershipJoin {
            membership: stored.membership,
            inserted: stored.inserted,
            profile_updated,
        })
    }

    fn list_company_memberships(
        &self,
        ctx: &CallContext,
        company_id: CompanyId,
    ) -> RepoResult<Vec<Membership>> {
        ctx.check()?;
        let mut stmt = self.conn.prepare(&format!(
            "{MEMBERSHIP_SELECT_SQL}
             WHERE company_id = ?1
             ORDER BY joined_at ASC, user_id ASC;"
        ))?;
        let mut rows = stmt.query([company_id.to_string()])?;
        let mut memberships = Vec::new();
        while let Some(row) = rows.next()? {
            memberships.push(parse_membership_row(row)?);
        }
        Ok(memberships)
    }

    fn list_membership_pairs(
        &self,
        ctx: &CallContext,
    ) -> RepoResult<HashSet<(UserId, CompanyId)>> {
        ctx.check()?;
        let mut stmt = self
            .conn
            .prepare("SELECT user_id, company_id FROM company_members;")?;
        let mut rows = stmt.query([])?;
        let mut pairs = HashSet::new();
        while let Some(row) = rows.next()? {
            let user_text: String = row.get(0)?;
            let company_text: String = row.get(1)?;
            pairs.insert((
                parse_uuid(&user_text, "company_members.user_id")?,
                parse_uuid(&company_text, "company_members.company_id")?,
            ));
        }
        Ok(pairs)
    }
}

fn parse_membership_row(row: &Row<'_>) -> RepoResult<Membership> {
    let id_text: String = row.get("id")?;
    let user_text: String = row.get("user_id")?;
    let company_text: String = row.get("company_id")?;
    Ok(Membership {
        id: parse_uuid(&id_text, "company_members.id")?,
        user_id: parse_uuid(&user_text, "company_members.user_id")?,
        company_id: parse_uuid(&company_text, "company_members.company_id")?,
        job_title: row.get("job_title")?,
        department: row.get("department")?,
        joined_at: row.get("joined_at")?,
    })
}
