//! Curated company reference list.
//!
//! Seeding these before users start typing company names keeps the most
//! common employers from fragmenting into free-text variants.

use crate::model::company::SeedCompany;

const DEFAULT_SEEDS: &[(&str, &str)] = &[
    ("Google", "Technology"),
    ("Microsoft", "Technology"),
    ("Amazon", "E-commerce"),
    ("Apple", "Technology"),
    ("Meta", "Technology"),
    ("Netflix", "Entertainment"),
    ("Adobe", "Software"),
    ("Salesforce", "Software"),
    ("Oracle", "Software"),
    ("IBM", "Technology"),
    ("Intel", "Semiconductors"),
    ("NVIDIA", "Semiconductors"),
    ("Uber", "Transportation"),
    ("Airbnb", "Hospitality"),
    ("Stripe", "Fintech"),
    ("Atlassian", "Software"),
    ("Flipkart", "E-commerce"),
    ("Infosys", "IT Services"),
    ("Tata Consultancy Services", "IT Services"),
    ("Wipro", "IT Services"),
    ("Accenture", "Consulting"),
    ("Deloitte", "Consulting"),
    ("Goldman Sachs", "Finance"),
    ("JPMorgan Chase", "Finance"),
];

/// Returns the built-in seed list in a stable order.
pub fn default_seed_companies() -> Vec<SeedCompany> {
    DEFAULT_SEEDS
        .iter()
        .map(|(name, sector)| SeedCompany::new(*name, *sector))
        .collect()
}
