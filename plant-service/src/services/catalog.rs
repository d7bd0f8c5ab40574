//! Read-only query service over the fixed plant catalog.
//!
//! The catalog is parsed once at startup from an embedded JSON resource and
//! never mutated, so concurrent reads need no locking.

use crate::models::PlantRecord;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error;

static PLANTS_JSON: &str = include_str!("../../data/plants.json");

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to parse plant catalog: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("duplicate plant id in catalog: {0}")]
    DuplicateId(String),
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    plants: Vec<PlantRecord>,
}

/// Aggregate counts over the catalog.
#[derive(Debug, Clone, Serialize)]
pub struct CatalogStats {
    pub total_plants: usize,
    pub total_families: usize,
    pub total_countries: usize,
    pub countries: Vec<String>,
}

#[derive(Debug)]
pub struct PlantCatalog {
    records: Vec<PlantRecord>,
}

impl PlantCatalog {
    /// Load the catalog shipped with the binary.
    pub fn load_embedded() -> Result<Self, CatalogError> {
        Self::from_json(PLANTS_JSON)
    }

    pub fn from_json(raw: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = serde_json::from_str(raw)?;

        let mut seen = BTreeSet::new();
        for record in &file.plants {
            if !seen.insert(record.id.as_str()) {
                return Err(CatalogError::DuplicateId(record.id.clone()));
            }
        }

        Ok(Self {
            records: file.plants,
        })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// All known plant identifiers, in catalog order.
    pub fn ids(&self) -> Vec<&str> {
        self.records.iter().map(|r| r.id.as_str()).collect()
    }

    /// Contiguous slice `[offset, offset + limit)` of the catalog plus the
    /// true total count.
    pub fn list(&self, limit: usize, offset: usize) -> (&[PlantRecord], usize) {
        let total = self.records.len();
        if offset >= total {
            return (&[], total);
        }
        let end = offset.saturating_add(limit).min(total);
        (&self.records[offset..end], total)
    }

    /// Case-insensitive substring search across scientific name, common
    /// names, description, family, traditional uses and medicinal
    /// properties. First matching field wins, each record appears at most
    /// once, catalog order is preserved.
    pub fn search(&self, query: &str, limit: usize) -> Vec<&PlantRecord> {
        let needle = query.to_lowercase();
        self.records
            .iter()
            .filter(|record| record_matches(record, &needle))
            .take(limit)
            .collect()
    }

    pub fn get_by_id(&self, id: &str) -> Option<&PlantRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    /// Plants whose traditional uses or medicinal properties mention the
    /// given condition.
    pub fn by_condition(&self, condition: &str, limit: usize) -> Vec<&PlantRecord> {
        let needle = condition.to_lowercase();
        self.records
            .iter()
            .filter(|record| {
                contains_any(&record.traditional_uses, &needle)
                    || contains_any(&record.medicinal_properties, &needle)
            })
            .take(limit)
            .collect()
    }

    /// Single-pass aggregates: record count, distinct families and the union
    /// of every record's countries.
    pub fn stats(&self) -> CatalogStats {
        let mut families = BTreeSet::new();
        let mut countries = BTreeSet::new();

        for record in &self.records {
            if !record.family.is_empty() {
                families.insert(record.family.as_str());
            }
            for country in &record.found_in {
                countries.insert(country.as_str());
            }
        }

        CatalogStats {
            total_plants: self.records.len(),
            total_families: families.len(),
            total_countries: countries.len(),
            countries: countries.into_iter().map(String::from).collect(),
        }
    }
}

fn record_matches(record: &PlantRecord, needle: &str) -> bool {
    record.scientific_name.to_lowercase().contains(needle)
        || contains_any(&record.common_names, needle)
        || record.description.to_lowercase().contains(needle)
        || record.family.to_lowercase().contains(needle)
        || contains_any(&record.traditional_uses, needle)
        || contains_any(&record.medicinal_properties, needle)
}

fn contains_any(values: &[String], needle: &str) -> bool {
    values.iter().any(|v| v.to_lowercase().contains(needle))
}
