// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Health check endpoint.

use axum::Json;
use serde::Serialize;

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub service: &'static str,
}

/// API information response.
#[derive(Debug, Serialize)]
pub struct ApiInfoResponse {
    pub service: &'static str,
    pub version: &'static str,
    pub description: &'static str,
    pub endpoints: Vec<EndpointInfo>,
}

/// Endpoint information.
#[derive(Debug, Serialize)]
pub struct EndpointInfo {
    pub method: &'static str,
    pub path: &'static str,
    pub description: &'static str,
}

const fn endpoint(method: &'static str, path: &'static str, description: &'static str) -> EndpointInfo {
    EndpointInfo {
        method,
        path,
        description,
    }
}

/// GET /api/v1/health - Health check endpoint.
pub async fn check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        service: "geomatricula-server",
    })
}

/// GET / - API information endpoint.
pub async fn info() -> Json<ApiInfoResponse> {
    Json(ApiInfoResponse {
        service: "geomatricula-server",
        version: env!("CARGO_PKG_VERSION"),
        description: "Property boundary reconstruction from deed bearings and distances",
        endpoints: vec![
            endpoint("GET", "/api/v1/health", "Health check endpoint"),
            endpoint("POST", "/api/v1/parcel/compute", "Polygon, metrics and quality from segments"),
            endpoint("POST", "/api/v1/parcel/extraction", "Process an oracle extraction (JSON or raw reply)"),
            endpoint("POST", "/api/v1/parcel/memorial", "Process deed text with the built-in scanner"),
            endpoint("POST", "/api/v1/parcel/batch", "Process many extractions in parallel"),
            endpoint("POST", "/api/v1/georef/utm", "UTM reading to WGS84 (null when implausible)"),
            endpoint("POST", "/api/v1/export/dxf", "DXF drawing of a segment list"),
            endpoint("POST", "/api/v1/export/kml", "KML document of a segment list"),
            endpoint("POST", "/api/v1/projects", "Create a project from an extraction"),
            endpoint("GET", "/api/v1/projects/:id", "Current state of a project"),
            endpoint("POST", "/api/v1/projects/:id/revisions", "Submit an oracle revision answer"),
            endpoint("POST", "/api/v1/projects/:id/revisions/:proposal_id/confirm", "Confirm the pending revision"),
            endpoint("POST", "/api/v1/projects/:id/revisions/:proposal_id/reject", "Reject the pending revision"),
            endpoint("GET", "/api/v1/projects/:id/export/dxf", "DXF drawing of a project"),
            endpoint("GET", "/api/v1/projects/:id/export/kml", "KML document of a project"),
        ],
    })
}
