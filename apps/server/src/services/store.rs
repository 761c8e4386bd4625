// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Disk-backed project store using cacache.

use crate::error::ApiError;
use geomatricula_processing::{
    Error as ProcessingError, ProjectRecord, ProjectRepository, Result as ProcessingResult,
};
use std::path::PathBuf;
use std::sync::Arc;

/// Project records as JSON entries in a cacache directory.
///
/// The repository interface is synchronous; handlers reach it through
/// [`load_project`] and [`save_project`], which move the I/O off the runtime.
#[derive(Debug, Clone)]
pub struct DiskRepository {
    store_dir: PathBuf,
}

impl DiskRepository {
    /// Open (and create if needed) a store in the specified directory.
    pub fn new(store_dir: &str) -> Self {
        let path = PathBuf::from(store_dir);

        if let Err(e) = std::fs::create_dir_all(&path) {
            tracing::warn!(
                error = %e,
                path = %path.display(),
                "Failed to create store directory"
            );
        }

        Self { store_dir: path }
    }

    fn key(id: &str) -> String {
        format!("project:{id}")
    }
}

impl ProjectRepository for DiskRepository {
    fn get(&self, id: &str) -> ProcessingResult<Option<ProjectRecord>> {
        match cacache::read_sync(&self.store_dir, Self::key(id)) {
            Ok(data) => Ok(Some(serde_json::from_slice(&data)?)),
            Err(cacache::Error::EntryNotFound(_, _)) => Ok(None),
            Err(e) => Err(ProcessingError::Repository(e.to_string())),
        }
    }

    fn save(&self, id: &str, record: &ProjectRecord) -> ProcessingResult<()> {
        let data = serde_json::to_vec(record)?;
        cacache::write_sync(&self.store_dir, Self::key(id), &data)
            .map_err(|e| ProcessingError::Repository(e.to_string()))?;
        tracing::debug!(id = %id, size = data.len(), "Project stored");
        Ok(())
    }
}

/// Fetch a project, `NOT_FOUND` when the id is unknown.
pub async fn load_project(
    repo: Arc<dyn ProjectRepository>,
    id: String,
) -> Result<ProjectRecord, ApiError> {
    let lookup = id.clone();
    tokio::task::spawn_blocking(move || repo.get(&lookup))
        .await??
        .ok_or_else(|| ApiError::NotFound(format!("project {id}")))
}

pub async fn save_project(
    repo: Arc<dyn ProjectRepository>,
    record: ProjectRecord,
) -> Result<ProjectRecord, ApiError> {
    tokio::task::spawn_blocking(move || {
        repo.save(&record.id, &record)?;
        Ok::<_, ProcessingError>(record)
    })
    .await?
    .map_err(ApiError::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use geomatricula_processing::{coerce_extraction, process_extraction, ExtractionMethod};
    use serde_json::json;

    fn record(id: &str) -> ProjectRecord {
        let extraction = coerce_extraction(&json!({
            "matricula": "4521",
            "urbanDimensions": {"front": 12, "rightSide": 25}
        }));
        let outcome = process_extraction(&extraction, ExtractionMethod::Ai, None);
        ProjectRecord::new(id, None, extraction, outcome)
    }

    #[test]
    fn test_disk_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let repo = DiskRepository::new(dir.path().to_str().unwrap());

        assert!(repo.get("missing").unwrap().is_none());

        let saved = record("abc");
        repo.save("abc", &saved).unwrap();
        let loaded = repo.get("abc").unwrap().unwrap();
        assert_eq!(loaded.title, "Matrícula 4521");
        assert_eq!(
            loaded.editor.current().area_computed(),
            saved.editor.current().area_computed()
        );
    }

    #[tokio::test]
    async fn test_load_missing_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let repo: Arc<dyn ProjectRepository> =
            Arc::new(DiskRepository::new(dir.path().to_str().unwrap()));
        let err = load_project(repo, "nope".into()).await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }
}
