// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Data shared by the pipeline, the revision protocol and the server.

use geomatricula_core::{LatLng, UtmAnchor};
use geomatricula_geometry::{
    QualityIndicator, ReportStatus, Segment, SegmentInput, Traverse, UrbanDimensions, Warning,
};
use serde::{Deserialize, Serialize};

/// Local planar vertex `[x, y]` in metres
pub type Vertex = [f64; 2];

/// Provenance of the segments of a result
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionMethod {
    /// Deed text scanner
    Regex,
    /// Extraction oracle
    #[default]
    Ai,
    /// Scanner output revised by the oracle
    Hybrid,
}

impl ExtractionMethod {
    /// Wording used on reports
    pub fn description(self) -> &'static str {
        match self {
            ExtractionMethod::Regex => "Extração automática por padrões de texto",
            ExtractionMethod::Ai => "Extração assistida por IA",
            ExtractionMethod::Hybrid => "Extração híbrida (padrões de texto e IA)",
        }
    }

    /// Method after an oracle-driven revision
    pub fn revised(self) -> Self {
        match self {
            ExtractionMethod::Regex => ExtractionMethod::Hybrid,
            other => other,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PropertyType {
    #[default]
    #[serde(rename = "rural")]
    Rural,
    #[serde(rename = "urbano", alias = "urban")]
    Urbano,
}

/// Output of the extraction oracle after coercion
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExtractedMatricula {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matricula: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registry_office: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub property_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub property_type: Option<PropertyType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub area_declared: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub perimeter_declared: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub utm_coordinates: Option<UtmAnchor>,
    pub segments: Vec<SegmentInput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub urban_dimensions: Option<UrbanDimensions>,
}

impl ExtractedMatricula {
    /// Explicit property type, else urban when only dimensions were extracted
    pub fn resolved_property_type(&self) -> PropertyType {
        match self.property_type {
            Some(kind) => kind,
            None if self.segments.is_empty()
                && self.urban_dimensions.as_ref().is_some_and(UrbanDimensions::has_dimensions) =>
            {
                PropertyType::Urbano
            }
            None => PropertyType::Rural,
        }
    }

    /// Human title for a project created from this extraction
    pub fn title(&self) -> String {
        match (&self.matricula, &self.city) {
            (Some(m), Some(city)) => format!("Matrícula {} - {}", m, city),
            (Some(m), None) => format!("Matrícula {}", m),
            (None, Some(city)) => format!("Imóvel em {}", city),
            (None, None) => "Imóvel sem matrícula".to_string(),
        }
    }
}

/// Authored state of a result. Everything else in [`ParcelResult`] is
/// derived from it.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ParcelSnapshot {
    pub segments: Vec<Segment>,
    pub area_declared: Option<f64>,
    pub extraction_method: ExtractionMethod,
}

/// Computed snapshot of one traverse.
///
/// Immutable: a revision produces a new result. Deserializing recomputes
/// every derived field from the segments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "ParcelSnapshot")]
pub struct ParcelResult {
    pub(crate) segments: Vec<Segment>,
    pub(crate) vertices: Vec<Vertex>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) area_declared: Option<f64>,
    pub(crate) area_computed: f64,
    pub(crate) perimeter_computed: f64,
    pub(crate) closure_error: f64,
    pub(crate) closure_ratio: Option<f64>,
    pub(crate) confidence_score: u8,
    pub(crate) warnings: Vec<Warning>,
    pub(crate) extraction_method: ExtractionMethod,
    pub(crate) quality: QualityIndicator,
    pub(crate) report_status: ReportStatus,
}

impl From<ParcelSnapshot> for ParcelResult {
    fn from(snapshot: ParcelSnapshot) -> Self {
        crate::pipeline::compute_parcel(
            snapshot.segments,
            snapshot.area_declared,
            snapshot.extraction_method,
        )
    }
}

impl ParcelResult {
    #[inline]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Local vertices, `segments().len() + 1` entries starting at the origin
    #[inline]
    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    #[inline]
    pub fn area_declared(&self) -> Option<f64> {
        self.area_declared
    }

    #[inline]
    pub fn area_computed(&self) -> f64 {
        self.area_computed
    }

    #[inline]
    pub fn perimeter_computed(&self) -> f64 {
        self.perimeter_computed
    }

    #[inline]
    pub fn closure_error(&self) -> f64 {
        self.closure_error
    }

    #[inline]
    pub fn closure_ratio(&self) -> Option<f64> {
        self.closure_ratio
    }

    #[inline]
    pub fn confidence_score(&self) -> u8 {
        self.confidence_score
    }

    #[inline]
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    #[inline]
    pub fn extraction_method(&self) -> ExtractionMethod {
        self.extraction_method
    }

    #[inline]
    pub fn quality(&self) -> &QualityIndicator {
        &self.quality
    }

    #[inline]
    pub fn report_status(&self) -> ReportStatus {
        self.report_status
    }

    /// Owned traverse of the segments
    pub fn traverse(&self) -> Traverse {
        Traverse::new(self.segments.clone())
    }

    /// Authored state, enough to rebuild the result
    pub fn snapshot(&self) -> ParcelSnapshot {
        ParcelSnapshot {
            segments: self.segments.clone(),
            area_declared: self.area_declared,
            extraction_method: self.extraction_method,
        }
    }
}

/// Result of the full pipeline for one extraction
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParcelOutcome {
    pub result: ParcelResult,
    /// Georeferenced first vertex; `None` when absent or rejected
    pub anchor: Option<LatLng>,
    pub map_center: LatLng,
    /// Polygon corners placed around the anchor (or the default map centre)
    pub map_coordinates: Vec<LatLng>,
    pub property_type: PropertyType,
}
