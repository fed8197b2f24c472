//! Company repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide lookup by id and by case-insensitive name over `companies`.
//! - Provide insert-if-absent creation keyed by the normalized name.
//!
//! # Invariants
//! - `name_key` is always written as `company_name_key(name)`.
//! - Creation never produces a second row for an existing `name_key`.

use super::schema::{parse_uuid, require_table};
use super::{RepoError, RepoResult};
use crate::context::CallContext;
use crate::model::company::{company_name_key, Company, CompanyId, CompanyInsert, NewCompany};
use rusqlite::{params, Connection, Row};
use uuid::Uuid;

const COMPANY_SELECT_SQL: &str = "SELECT
    id,
    name,
    description,
    sector,
    location,
    website,
    logo_url,
    created_at
FROM companies";

/// Repository interface for canonical company records.
pub trait CompanyRepository {
    /// Loads one company by canonical id.
    fn get_company(&self, ctx: &CallContext, id: CompanyId) -> RepoResult<Option<Company>>;
    /// Finds the company whose name matches `name` case-insensitively.
    fn find_company_by_name(&self, ctx: &CallContext, name: &str) -> RepoResult<Option<Company>>;
    /// Creates a company unless one with the same name key already exists.
    fn insert_company_if_absent(
        &self,
        ctx: &CallContext,
        company: &NewCompany,
    ) -> RepoResult<CompanyInsert>;
    /// Lists all companies ordered by name key, then id.
    fn list_companies(&self, ctx: &CallContext) -> RepoResult<Vec<Company>>;
}

/// SQLite-backed company repository.
pub struct SqliteCompanyRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteCompanyRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        require_table(
            conn,
            "companies",
            &[
                "id",
                "name",
                "name_key",
                "description",
                "sector",
                "location",
                "website",
                "logo_url",
                "created_at",
            ],
        )?;
        Ok(Self { conn })
    }

    fn get_by_key(&self, name_key: &str) -> RepoResult<Option<Company>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{COMPANY_SELECT_SQL} WHERE name_key = ?1;"))?;
        let mut rows = stmt.query([name_key])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_company_row(row)?));
        }
        Ok(None)
    }
}

impl CompanyRepository for SqliteCompanyRepository<'_> {
    fn get_company(&self, ctx: &CallContext, id: CompanyId) -> RepoResult<Option<Company>> {
        ctx.check()?;
        let mut stmt = self
            .conn
            .prepare(&format!("{COMPANY_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_company_row(row)?));
        }
        Ok(None)
    }

    fn find_company_by_name(&self, ctx: &CallContext, name: &str) -> RepoResult<Option<Company>> {
        ctx.check()?;
        let key = company_name_key(name);
        if key.is_empty() {
            return Ok(None);
        }
        self.get_by_key(&key)
    }

    fn insert_company_if_absent(
        &self,
        ctx: &CallContext,
        company: &NewCompany,
    ) -> RepoResult<CompanyInsert> {
        ctx.check()?;
        let name = company.name.trim();
        let key = company_name_key(name);
        if key.is_empty() {
            return Err(RepoError::InvalidData(
                "company name must not be blank".to_string(),
            ));
        }

        let changed = self.conn.execute(
            "INSERT INTO companies (
                id,
                name,
                name_key,
                description,
                sector,
                location,
                website,
                logo_url
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            ON CONFLICT (name_key) DO NOTHING;",
            params![
                Uuid::new_v4().to_string(),
                name,
                key.as_str(),
                company.description.as_deref(),
                company.sector.as_deref(),
                company.location.as_deref(),
                company.website.as_deref(),
                company.logo_url.as_deref(),
            ],
        )?;

        let stored = self.get_by_key(&key)?.ok_or_else(|| {
            RepoError::InvalidData(format!("company row missing after insert for key `{key}`"))
        })?;

        Ok(CompanyInsert {
            company: stored,
            inserted: changed == 1,
        })
    }

    fn list_companies(&self, ctx: &CallContext) -> RepoResult<Vec<Company>> {
        ctx.check()?;
        let mut stmt = self
            .conn
            .prepare(&format!("{COMPANY_SELECT_SQL} ORDER BY name_key ASC, id ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut companies = Vec::new();
        while let Some(row) = rows.next()? {
            companies.push(parse_company_row(row)?);
        }
        Ok(companies)
    }
}

fn parse_company_row(row: &Row<'_>) -> RepoResult<Company> {
    let id_text: String = row.get("id")?;
    Ok(Company {
        id: parse_uuid(&id_text, "companies.id")?,
        name: row.get("name")?,
        description: row.get("description")?,
        sector: row.get("sector")?,
        location: row.get("location")?,
        website: row.get("website")?,
        logo_url: row.get("logo_url")?,
        created_at: row.get("created_at")?,
    })
}

