//! Company domain model and company-reference classification.
//!
//! # Responsibility
//! - Define the canonical company record.
//! - Classify the free-form profile `company` field as id or name.
//! - Own the case-insensitive name key used for deduplication.
//!
//! # Invariants
//! - Two names with equal `company_name_key` denote the same company.
//! - Classification only looks at shape; existence is decided by callers.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable canonical identifier of a company record.
pub type CompanyId = Uuid;

static CANONICAL_ID_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$")
        .expect("valid canonical id regex")
});

/// Canonical company record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Company {
    pub id: CompanyId,
    /// Display name, original casing preserved.
    pub name: String,
    pub description: Option<String>,
    pub sector: Option<String>,
    pub location: Option<String>,
    pub website: Option<String>,
    pub logo_url: Option<String>,
    /// Epoch milliseconds.
    pub created_at: i64,
}

impl Company {
    /// Case-insensitive key of this company's name.
    pub fn name_key(&self) -> String {
        company_name_key(&self.name)
    }
}

/// Insert model for a company record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCompany {
    pub name: String,
    pub description: Option<String>,
    pub sector: Option<String>,
    pub location: Option<String>,
    pub website: Option<String>,
    pub logo_url: Option<String>,
}

impl NewCompany {
    /// Creates an insert model carrying only a display name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// Outcome of an insert-if-absent company write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompanyInsert {
    /// The company now stored under the requested name key.
    pub company: Company,
    /// `false` when a company with the same name key already existed.
    pub inserted: bool,
}

/// Curated reference entry used to pre-populate the company table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedCompany {
    pub name: String,
    pub sector: Option<String>,
}

impl SeedCompany {
    pub fn new(name: impl Into<String>, sector: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sector: Some(sector.into()),
        }
    }
}

/// Interpretation of a stored `profiles.company` value.
///
/// Storage carries no discriminator; the variant is derived from the value's
/// shape only. A `CanonicalId` that matches no company must still be resolved
/// by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompanyRef {
    /// Value has the canonical id shape. `raw` keeps the trimmed text with
    /// its original casing for the name fallback.
    CanonicalId { id: CompanyId, raw: String },
    /// Anything else: a company name as typed by a user.
    FreeTextName(String),
}

impl CompanyRef {
    /// Classifies a raw reference. Returns `None` for blank input.
    pub fn classify(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }

        if CANONICAL_ID_RE.is_match(trimmed) {
            if let Ok(id) = Uuid::parse_str(trimmed) {
                return Some(Self::CanonicalId {
                    id,
                    raw: trimmed.to_string(),
                });
            }
        }

        Some(Self::FreeTextName(trimmed.to_string()))
    }

    /// Trimmed text of the reference, used for name fallback.
    pub fn as_name(&self) -> String {
        match self {
            Self::CanonicalId { raw, .. } => raw.clone(),
            Self::FreeTextName(name) => name.clone(),
        }
    }
}

/// Returns the case-insensitive deduplication key for a company name.
pub fn company_name_key(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Returns whether `value` names the given company by id or by name.
pub fn references_company(value: &str, company: &Company) -> bool {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return false;
    }
    if let Some(CompanyRef::CanonicalId { id, .. }) = CompanyRef::classify(trimmed) {
        if id == company.id {
            return true;
        }
    }
    company_name_key(trimmed) == company.name_key()
}

#[cfg(test)]
mod tests {
    use super::{company_name_key, references_company, Company, CompanyRef};
    use uuid::Uuid;

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
    fn classify_detects_hyphenated_ids_in_any_case() {
        let id = Uuid::new_v4();
        let upper = id.to_string().to_uppercase();
        assert_eq!(
            CompanyRef::classify(&format!("  {upper} ")),
            Some(CompanyRef::CanonicalId {
                id,
                raw: upper.clone(),
            })
        );
    }

    #[test]
    fn id_shaped_reference_keeps_original_text_as_name() {
        let raw = "ABCDEF01-2345-4678-9ABC-DEF012345678";
        let reference = CompanyRef::classify(&format!(" {raw}\t")).unwrap();
        assert_eq!(reference.as_name(), raw);
    }

    #[test]
    fn classify_treats_other_uuid_encodings_as_names() {
        let simple = Uuid::new_v4().simple().to_string();
        assert_eq!(
            CompanyRef::classify(&simple),
            Some(CompanyRef::FreeTextName(simple.clone()))
        );
    }

    #[test]
    fn classify_rejects_blank_values() {
        assert_eq!(CompanyRef::classify("   "), None);
    }

    #[test]
    fn name_key_is_trimmed_and_lowercase() {
        assert_eq!(company_name_key("  GooGle "), "google");
        assert_eq!(company_name_key("ÉCOLE"), "école");
    }

    #[test]
    fn references_company_matches_id_or_name() {
        let target = company("Acme Corp");
        assert!(references_company(&target.id.to_string(), &target));
        assert!(references_company("acme corp", &target));
        assert!(!references_company("Acme", &target));
        assert!(!references_company(&Uuid::new_v4().to_string(), &target));
        assert!(!references_company("", &target));
    }
}
