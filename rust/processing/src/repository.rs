// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Project persistence interface.

use std::sync::RwLock;

use geomatricula_core::{LatLng, DEFAULT_MAP_CENTER};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::revision::ParcelEditor;
use crate::types::{ExtractedMatricula, ParcelOutcome, PropertyType};

/// Everything kept about one project between requests
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectRecord {
    pub id: String,
    pub title: String,
    /// Property context as extracted (owner, city, state, declared area, ...)
    pub extraction: ExtractedMatricula,
    pub property_type: PropertyType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anchor: Option<LatLng>,
    pub editor: ParcelEditor,
}

impl ProjectRecord {
    pub fn new(
        id: impl Into<String>,
        title: Option<String>,
        extraction: ExtractedMatricula,
        outcome: ParcelOutcome,
    ) -> Self {
        let title = title
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| extraction.title());
        Self {
            id: id.into(),
            title,
            extraction,
            property_type: outcome.property_type,
            anchor: outcome.anchor,
            editor: ParcelEditor::new(outcome.result),
        }
    }

    /// Map anchor of the local origin
    pub fn map_anchor(&self) -> LatLng {
        self.anchor.unwrap_or(DEFAULT_MAP_CENTER)
    }
}

/// Keyed project store. Implementations decide the storage lifetime.
pub trait ProjectRepository: Send + Sync {
    fn get(&self, id: &str) -> Result<Option<ProjectRecord>>;
    fn save(&self, id: &str, record: &ProjectRecord) -> Result<()>;
}

/// Process-local store
#[derive(Debug, Default)]
pub struct InMemoryRepository {
    records: RwLock<FxHashMap<String, ProjectRecord>>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.read().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ProjectRepository for InMemoryRepository {
    fn get(&self, id: &str) -> Result<Option<ProjectRecord>> {
        let records = self
            .records
            .read()
            .map_err(|_| Error::Repository("project store lock poisoned".into()))?;
        Ok(records.get(id).cloned())
    }

    fn save(&self, id: &str, record: &ProjectRecord) -> Result<()> {
        let mut records = self
            .records
            .write()
            .map_err(|_| Error::Repository("project store lock poisoned".into()))?;
        records.insert(id.to_string(), record.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::process_extraction;
    use crate::types::ExtractionMethod;
    use geomatricula_geometry::UrbanDimensions;

    fn record(id: &str) -> ProjectRecord {
        let extraction = ExtractedMatricula {
            matricula: Some("4521".into()),
            urban_dimensions: Some(UrbanDimensions {
                front: Some(10.0),
                right_side: Some(25.0),
                ..UrbanDimensions::default()
            }),
            ..ExtractedMatricula::default()
        };
        let outcome = process_extraction(&extraction, ExtractionMethod::Ai, None);
        ProjectRecord::new(id, None, extraction, outcome)
    }

    #[test]
    fn test_save_and_get() {
        let repo = InMemoryRepository::new();
        assert!(repo.get("a").unwrap().is_none());

        repo.save("a", &record("a")).unwrap();
        let loaded = repo.get("a").unwrap().unwrap();
        assert_eq!(loaded.title, "Matrícula 4521");
        assert_eq!(loaded.property_type, PropertyType::Urbano);
        assert_eq!(loaded.map_anchor(), DEFAULT_MAP_CENTER);
        assert_eq!(repo.len(), 1);
    }

    #[test]
    fn test_save_replaces() {
        let repo = InMemoryRepository::new();
        repo.save("a", &record("a")).unwrap();
        let mut changed = record("a");
        changed.title = "Sítio Boa Vista".into();
        repo.save("a", &changed).unwrap();
        assert_eq!(repo.get("a").unwrap().unwrap().title, "Sítio Boa Vista");
        assert_eq!(repo.len(), 1);
    }

    #[test]
    fn test_record_json_roundtrip() {
        let original = record("a");
        let json = serde_json::to_vec(&original).unwrap();
        let back: ProjectRecord = serde_json::from_slice(&json).unwrap();
        assert_eq!(back, original);
    }
}
