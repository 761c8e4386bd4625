// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Stateless parcel endpoints: compute, extraction, deed text and batches.

use crate::error::ApiError;
use crate::types::{BatchRequest, BatchResponse, ComputeRequest, ExtractionQuery, MemorialRequest};
use crate::AppState;
use axum::{
    extract::{Query, State},
    Json,
};
use geomatricula_geometry::{Segment, Traverse};
use geomatricula_processing::{
    coerce_extraction, coerce_segments, compute_parcel, extract_json_payload, process_batch,
    process_extraction, process_memorial_text, ExtractedMatricula,
    ParcelOutcome, ParcelResult,
};
use serde_json::Value;
use std::time::Instant;

/// Segment list of a request body; anything but an array is rejected.
pub(crate) fn request_segments(value: &Value) -> Result<Vec<Segment>, ApiError> {
    if !value.is_array() {
        return Err(ApiError::InvalidPayload("segments must be an array".into()));
    }
    Ok(Traverse::from_inputs(coerce_segments(value)).into_segments())
}

/// Oracle extraction from a raw reply or a JSON document.
pub(crate) fn parse_extraction(content: &str) -> Result<ExtractedMatricula, ApiError> {
    let value = extract_json_payload(content).ok_or_else(|| {
        ApiError::InvalidPayload("no JSON object found in the extraction reply".into())
    })?;
    Ok(coerce_extraction(&value))
}

/// POST /api/v1/parcel/compute - Polygon, metrics and quality from segments.
pub async fn compute(Json(request): Json<ComputeRequest>) -> Result<Json<ParcelResult>, ApiError> {
    let segments = request_segments(&request.segments)?;
    let method = request.extraction_method.unwrap_or_default();

    tracing::debug!(segments = segments.len(), ?method, "Compute request");
    Ok(Json(compute_parcel(segments, request.area_declared(), method)))
}

/// POST /api/v1/parcel/extraction - Oracle extraction reply to outcome.
///
/// The body is the oracle's reply as sent: a bare JSON object or prose with
/// a fenced JSON block.
pub async fn extraction(
    State(state): State<AppState>,
    Query(query): Query<ExtractionQuery>,
    body: String,
) -> Result<Json<ParcelOutcome>, ApiError> {
    let extraction = parse_extraction(&body)?;
    let method = query.method.unwrap_or_default();
    let fallback = state.state_hint(query.state);

    Ok(Json(process_extraction(&extraction, method, fallback.as_deref())))
}

/// POST /api/v1/parcel/memorial - Deed text through the built-in scanner.
pub async fn memorial(Json(request): Json<MemorialRequest>) -> Result<Json<ParcelOutcome>, ApiError> {
    if request.text.trim().is_empty() {
        return Err(ApiError::InvalidPayload("text is empty".into()));
    }
    let area_declared = request.area_declared();

    let outcome =
        tokio::task::spawn_blocking(move || process_memorial_text(&request.text, area_declared))
            .await?;
    Ok(Json(outcome))
}

/// POST /api/v1/parcel/batch - Many extractions on the rayon pool.
pub async fn batch(
    State(state): State<AppState>,
    Json(request): Json<BatchRequest>,
) -> Result<Json<BatchResponse>, ApiError> {
    let start = Instant::now();
    let method = request.extraction_method.unwrap_or_default();
    let fallback = state.state_hint(request.state);
    let extractions: Vec<ExtractedMatricula> =
        request.extractions.iter().map(coerce_extraction).collect();

    tracing::info!(count = extractions.len(), "Batch request");

    // Process on blocking thread pool (CPU-intensive)
    let outcomes = tokio::task::spawn_blocking(move || {
        process_batch(&extractions, method, fallback.as_deref())
    })
    .await?;

    Ok(Json(BatchResponse {
        outcomes,
        total_time_ms: start.elapsed().as_millis() as u64,
    }))
}
