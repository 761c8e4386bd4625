// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Request types for the API.
//!
//! Oracle-shaped parts stay as raw JSON values and go through the lenient
//! coercions of the processing crate.

use geomatricula_core::{LatLng, UtmAnchor};
use geomatricula_processing::{lenient_number, ExtractionMethod, RevisionResponse};
use serde::Deserialize;
use serde_json::Value;

/// Body of `POST /api/v1/parcel/compute`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComputeRequest {
    #[serde(default)]
    pub segments: Value,
    #[serde(default)]
    pub area_declared: Option<Value>,
    #[serde(default)]
    pub extraction_method: Option<ExtractionMethod>,
}

impl ComputeRequest {
    pub fn area_declared(&self) -> Option<f64> {
        self.area_declared.as_ref().and_then(lenient_number)
    }
}

/// Query of `POST /api/v1/parcel/extraction`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExtractionQuery {
    #[serde(default)]
    pub method: Option<ExtractionMethod>,
    /// State code for zone inference when the extraction has none.
    #[serde(default)]
    pub state: Option<String>,
}

/// Body of `POST /api/v1/parcel/memorial`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemorialRequest {
    pub text: String,
    #[serde(default)]
    pub area_declared: Option<Value>,
}

impl MemorialRequest {
    pub fn area_declared(&self) -> Option<f64> {
        self.area_declared.as_ref().and_then(lenient_number)
    }
}

/// Body of `POST /api/v1/parcel/batch`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchRequest {
    #[serde(default)]
    pub extractions: Vec<Value>,
    #[serde(default)]
    pub extraction_method: Option<ExtractionMethod>,
    #[serde(default)]
    pub state: Option<String>,
}

/// Body of `POST /api/v1/georef/utm`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeorefRequest {
    pub easting: f64,
    pub northing: f64,
    #[serde(default)]
    pub zone: Option<i64>,
    #[serde(default)]
    pub hemisphere: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
}

/// Body of `POST /api/v1/export/{dxf,kml}`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportRequest {
    #[serde(default)]
    pub project_name: Option<String>,
    #[serde(default)]
    pub segments: Value,
    #[serde(default)]
    pub area_declared: Option<Value>,
    #[serde(default)]
    pub extraction_method: Option<ExtractionMethod>,
    /// DXF only: centre the drawing on its bounding box.
    #[serde(default)]
    pub center: bool,
    /// KML only: explicit map position of the first vertex.
    #[serde(default)]
    pub anchor: Option<LatLng>,
    /// KML only: UTM reading used when no explicit anchor is given.
    #[serde(default)]
    pub utm_coordinates: Option<UtmAnchor>,
    #[serde(default)]
    pub state: Option<String>,
}

impl ExportRequest {
    pub fn project_name(&self) -> &str {
        self.project_name
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or("parcela")
    }

    pub fn area_declared(&self) -> Option<f64> {
        self.area_declared.as_ref().and_then(lenient_number)
    }
}

/// Query of the project export endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExportQuery {
    #[serde(default)]
    pub center: bool,
}

/// Body of `POST /api/v1/projects`.
///
/// Either `extraction` (the oracle JSON) or `content` (the raw oracle reply)
/// must be present.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProjectRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub extraction: Option<Value>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub extraction_method: Option<ExtractionMethod>,
    #[serde(default)]
    pub state: Option<String>,
}

/// Oracle revision answer in any of the accepted shapes: the reply object,
/// a bare reply string, or `{"content": "<reply>"}`.
pub fn revision_response(body: &Value) -> RevisionResponse {
    match body {
        Value::String(content) => RevisionResponse::from_content(content),
        Value::Object(map) if map.len() == 1 => match map.get("content") {
            Some(Value::String(content)) => RevisionResponse::from_content(content),
            _ => RevisionResponse::from_value(body),
        },
        _ => RevisionResponse::from_value(body),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_lenient_declared_area() {
        let request: ComputeRequest =
            serde_json::from_value(json!({"segments": [], "areaDeclared": "1.234,56"})).unwrap();
        assert_eq!(request.area_declared(), Some(1234.56));
    }

    #[test]
    fn test_revision_response_shapes() {
        let wrapped = revision_response(&json!({
            "content": "```json\n{\"response\": \"ok\", \"requiresConfirmation\": true}\n```"
        }));
        assert_eq!(wrapped.response_text, "ok");
        assert!(wrapped.requires_confirmation);

        let direct = revision_response(&json!({"response": "direct"}));
        assert_eq!(direct.response_text, "direct");
        assert!(direct.updated_segments.is_none());
    }

    #[test]
    fn test_export_name_default() {
        let request = ExportRequest {
            project_name: Some("  ".into()),
            ..ExportRequest::default()
        };
        assert_eq!(request.project_name(), "parcela");
    }
}
