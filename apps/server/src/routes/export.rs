// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! DXF and KML downloads for ad-hoc segment lists.

use crate::error::ApiError;
use crate::routes::parcel::request_segments;
use crate::types::ExportRequest;
use crate::AppState;
use axum::{
    body::Body,
    extract::State,
    http::{header, StatusCode},
    response::Response,
    Json,
};
use geomatricula_core::DEFAULT_MAP_CENTER;
use geomatricula_processing::{compute_parcel, export_dxf, export_kml, ExportFile, ParcelResult};

/// File download response for a rendered export.
pub(crate) fn download(file: ExportFile) -> Result<Response, ApiError> {
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, file.content_type)
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", file.file_name),
        )
        .body(Body::from(file.content))
        .map_err(|e| ApiError::Internal(format!("Failed to build response: {}", e)))
}

fn request_result(request: &ExportRequest) -> Result<ParcelResult, ApiError> {
    let segments = request_segments(&request.segments)?;
    Ok(compute_parcel(
        segments,
        request.area_declared(),
        request.extraction_method.unwrap_or_default(),
    ))
}

/// POST /api/v1/export/dxf - DXF drawing in local metres.
pub async fn dxf(Json(request): Json<ExportRequest>) -> Result<Response, ApiError> {
    let result = request_result(&request)?;
    let file = export_dxf(&result, request.project_name(), request.center)?;
    tracing::info!(file = %file.file_name, bytes = file.content.len(), "DXF export");
    download(file)
}

/// POST /api/v1/export/kml - KML document placed on the map.
///
/// Placement uses `anchor`, else the UTM reading, else the default centre.
pub async fn kml(
    State(state): State<AppState>,
    Json(request): Json<ExportRequest>,
) -> Result<Response, ApiError> {
    let result = request_result(&request)?;
    let fallback = state.state_hint(request.state.clone());
    let anchor = request
        .anchor
        .or_else(|| {
            request
                .utm_coordinates
                .as_ref()
                .and_then(|utm| utm.resolve(fallback.as_deref()))
        })
        .unwrap_or(DEFAULT_MAP_CENTER);

    let file = export_kml(&result, request.project_name(), anchor)?;
    tracing::info!(file = %file.file_name, bytes = file.content.len(), "KML export");
    download(file)
}
