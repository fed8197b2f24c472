//! Company reference resolution.
//!
//! # Responsibility
//! - Turn a canonical id or a free-text company name into a canonical id.
//! - Create a company lazily when a name matches nothing.
//! - Pre-populate the company table from a curated seed list.
//!
//! # Invariants
//! - An id-shaped reference only short-circuits when the company exists;
//!   otherwise it is resolved as a name and never fails for that reason.
//! - Names differing only by case resolve to the same company.
//! - Resolving an already-known reference performs no writes.

use crate::context::CallContext;
use crate::model::company::{
    company_name_key, Company, CompanyId, CompanyRef, NewCompany, SeedCompany,
};
use crate::repo::company_repo::CompanyRepository;
use crate::service::{ServiceError, ServiceResult};
use log::{debug, info};
use std::collections::HashMap;

/// Result of one resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub company_id: CompanyId,
    /// `true` when this call created the company.
    pub created: bool,
}

/// Outcome counters for a seeding run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub created: usize,
    pub already_present: usize,
}

/// In-memory view of the company table keyed both ways.
///
/// Built once per sweep so per-profile resolution needs no store round trip
/// unless a company has to be created.
#[derive(Debug, Clone, Default)]
pub struct CompanyIndex {
    by_key: HashMap<String, CompanyId>,
    by_id: HashMap<CompanyId, String>,
}

impl CompanyIndex {
    pub fn from_companies(companies: &[Company]) -> Self {
        let mut index = Self::default();
        for company in companies {
            index.insert(company);
        }
        index
    }

    /// Records a company; the first id seen for a name key wins.
    pub fn insert(&mut self, company: &Company) {
        self.by_key.entry(company.name_key()).or_insert(company.id);
        self.by_id.insert(company.id, company.name.clone());
    }

    /// Resolves a reference without creating anything.
    pub fn lookup(&self, reference: &CompanyRef) -> Option<CompanyId> {
        if let CompanyRef::CanonicalId { id, .. } = reference {
            if self.by_id.contains_key(id) {
                return Some(*id);
            }
        }
        self.by_key
            .get(&company_name_key(&reference.as_name()))
            .copied()
    }

    pub fn name_of(&self, id: CompanyId) -> Option<&str> {
        self.by_id.get(&id).map(String::as_str)
    }

}

/// Resolver over a company repository.
pub struct CompanyResolver<'r, C: CompanyRepository> {
    companies: &'r C,
}

impl<'r, C: CompanyRepository> CompanyResolver<'r, C> {
    pub fn new(companies: &'r C) -> Self {
        Self { companies }
    }

    /// Resolves `input` to a canonical id, creating a company when needed.
    ///
    /// # Errors
    /// - `InvalidInput` when `input` is blank.
    /// - `Cancelled` / `Store` from the underlying repository.
    pub fn resolve_or_create(&self, ctx: &CallContext, input: &str) -> ServiceResult<CompanyId> {
        let reference = CompanyRef::classify(input).ok_or_else(|| {
            ServiceError::InvalidInput("company reference must not be blank".to_string())
        })?;
        Ok(self.resolve_reference(ctx, &reference)?.company_id)
    }

    /// Resolves an already classified reference.
    pub fn resolve_reference(
        &self,
        ctx: &CallContext,
        reference: &CompanyRef,
    ) -> ServiceResult<Resolution> {
        if let CompanyRef::CanonicalId { id, .. } = reference {
            if self.companies.get_company(ctx, *id)?.is_some() {
                debug!("event=company_resolve module=resolver status=ok path=id company_id={id}");
                return Ok(Resolution {
                    company_id: *id,
                    created: false,
                });
            }
            debug!("event=company_resolve module=resolver status=fallback path=unknown_id");
        }

        let name = reference.as_name();
        if let Some(existing) = self.companies.find_company_by_name(ctx, &name)? {
            debug!(
                "event=company_resolve module=resolver status=ok path=name company_id={}",
                existing.id
            );
            return Ok(Resolution {
                company_id: existing.id,
                created: false,
            });
        }

        let stored = self
            .companies
            .insert_company_if_absent(ctx, &NewCompany::named(name))?;
        info!(
            "event=company_resolve module=resolver status=ok path=create company_id={} inserted={}",
            stored.company.id, stored.inserted
        );
        Ok(Resolution {
            company_id: stored.company.id,
            created: stored.inserted,
        })
    }

    /// Creates every seed company not already present by case-insensitive
    /// name. Re-running with the same list writes nothing.
    pub fn ensure_seed_companies(
        &self,
        ctx: &CallContext,
        seeds: &[SeedCompany],
    ) -> ServiceResult<SeedReport> {
        let mut report = SeedReport::default();
        for seed in seeds {
            if company_name_key(&seed.name).is_empty() {
                return Err(ServiceError::InvalidInput(
                    "seed company name must not be blank".to_string(),
                ));
            }
            if self.companies.find_company_by_name(ctx, &seed.name)?.is_some() {
                report.already_present += 1;
                continue;
            }

            let new_company = NewCompany {
                sector: seed.sector.clone(),
                ..NewCompany::named(seed.name.as_str())
            };
            if self
                .companies
                .insert_company_if_absent(ctx, &new_company)?
                .inserted
            {
                report.created += 1;
            } else {
                report.already_present += 1;
            }
        }

        info!(
            "event=company_seed module=resolver status=ok created={} already_present={}",
            report.created, report.already_present
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::CompanyIndex;
    use crate::model::company::{Company, CompanyRef};
    use uuid::Uuid;

    fn id_ref(id: Uuid) -> CompanyRef {
        CompanyRef::CanonicalId {
            id,
            raw: id.to_string(),
        }
    }

    fn company(name: &str) -> Company {
        Company {
            id: Uuid::new_v4(),
            name: name.to_string(),
            description: None,
            sector: None,
            location: None,
            website: None,
            logo_url: None,
            created_at: 0,
        }
    }

    #[test]
    fn index_resolves_known_ids_and_names() {
        let acme = company("Acme");
        let index = CompanyIndex::from_companies(std::slice::from_ref(&acme));

        assert_eq!(index.lookup(&id_ref(acme.id)), Some(acme.id));
        assert_eq!(
            index.lookup(&CompanyRef::FreeTextName("ACME".to_string())),
            Some(acme.id)
        );
        assert_eq!(index.name_of(acme.id), Some("Acme"));
    }

    #[test]
    fn index_falls_back_to_name_for_unknown_ids() {
        let unknown = Uuid::new_v4();
        let named_like_id = company(&unknown.to_string());
        let index = CompanyIndex::from_companies(std::slice::from_ref(&named_like_id));

        assert_eq!(index.lookup(&id_ref(unknown)), Some(named_like_id.id));
        assert_eq!(index.lookup(&id_ref(Uuid::new_v4())), None);
    }

    #[test]
    fn index_keeps_first_id_for_duplicate_keys() {
        let first = company("Globex");
        let second = company("GLOBEX");
        let index = CompanyIndex::from_companies(&[first.clone(), second.clone()]);
        assert_eq!(
            index.lookup(&CompanyRef::FreeTextName("globex".to_string())),
            Some(first.id)
        );
        assert_eq!(index.name_of(second.id), Some("GLOBEX"));
    }
}
