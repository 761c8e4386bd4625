// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Stored projects and the revision protocol.

use crate::error::ApiError;
use crate::routes::export::download;
use crate::routes::parcel::parse_extraction;
use crate::services::{load_project, save_project};
use crate::types::{
    revision_response, CreateProjectRequest, ExportQuery, ProjectResponse, RevisionResponseBody,
};
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Response,
    Json,
};
use geomatricula_processing::{
    coerce_extraction, export_dxf, export_kml, process_extraction, ParcelEditor, ProjectRecord,
    Result as ProcessingResult, RevisionOutcome,
};
use serde_json::Value;
use uuid::Uuid;

/// POST /api/v1/projects - Create a project from an oracle extraction.
pub async fn create(
    State(state): State<AppState>,
    Json(request): Json<CreateProjectRequest>,
) -> Result<(StatusCode, Json<ProjectResponse>), ApiError> {
    let extraction = match (request.extraction.as_ref(), request.content.as_ref()) {
        (Some(value), _) if value.is_object() => coerce_extraction(value),
        (Some(Value::String(content)), _) | (None, Some(content)) => parse_extraction(content)?,
        _ => {
            return Err(ApiError::InvalidPayload(
                "expected an extraction object or the raw reply in content".into(),
            ))
        }
    };
    let method = request.extraction_method.unwrap_or_default();
    let fallback = state.state_hint(request.state);
    let outcome = process_extraction(&extraction, method, fallback.as_deref());

    let id = Uuid::new_v4().to_string();
    let record = ProjectRecord::new(id.clone(), request.title, extraction, outcome);
    let record = save_project(state.repo.clone(), record).await?;

    tracing::info!(id = %id, title = %record.title, "Project created");
    Ok((StatusCode::CREATED, Json(ProjectResponse::from(&record))))
}

/// GET /api/v1/projects/:id - Current state of a project.
pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ProjectResponse>, ApiError> {
    let record = load_project(state.repo.clone(), id).await?;
    Ok(Json(ProjectResponse::from(&record)))
}

/// Load, edit and store one project while holding the write lock, then hand
/// the audit records to the sink.
async fn edit<F>(state: &AppState, id: String, apply: F) -> Result<Json<RevisionResponseBody>, ApiError>
where
    F: FnOnce(&mut ParcelEditor) -> ProcessingResult<RevisionOutcome>,
{
    let _guard = state.write_lock.lock().await;

    let mut record = load_project(state.repo.clone(), id.clone()).await?;
    let outcome = apply(&mut record.editor)?;
    let record = save_project(state.repo.clone(), record).await?;

    for entry in &outcome.audit {
        state.audit.record(&id, entry);
    }
    tracing::info!(
        id = %id,
        status = ?outcome.status,
        proposal = ?outcome.proposal_id,
        "Revision handled"
    );

    Ok(Json(RevisionResponseBody {
        project: ProjectResponse::from(&record),
        outcome,
    }))
}

/// POST /api/v1/projects/:id/revisions - Submit an oracle revision answer.
pub async fn revise(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Result<Json<RevisionResponseBody>, ApiError> {
    let response = revision_response(&body);
    edit(&state, id, |editor| editor.propose(&response)).await
}

/// POST /api/v1/projects/:id/revisions/:proposal_id/confirm
pub async fn confirm(
    State(state): State<AppState>,
    Path((id, proposal_id)): Path<(String, String)>,
) -> Result<Json<RevisionResponseBody>, ApiError> {
    edit(&state, id, |editor| editor.confirm(&proposal_id)).await
}

/// POST /api/v1/projects/:id/revisions/:proposal_id/reject
pub async fn reject(
    State(state): State<AppState>,
    Path((id, proposal_id)): Path<(String, String)>,
) -> Result<Json<RevisionResponseBody>, ApiError> {
    edit(&state, id, |editor| editor.reject(&proposal_id)).await
}

/// GET /api/v1/projects/:id/export/dxf
pub async fn export_project_dxf(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<ExportQuery>,
) -> Result<Response, ApiError> {
    let record = load_project(state.repo.clone(), id).await?;
    download(export_dxf(record.editor.current(), &record.title, query.center)?)
}

/// GET /api/v1/projects/:id/export/kml
pub async fn export_project_kml(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let record = load_project(state.repo.clone(), id).await?;
    download(export_kml(
        record.editor.current(),
        &record.title,
        record.map_anchor(),
    )?)
}
