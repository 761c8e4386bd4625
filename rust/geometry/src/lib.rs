// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! GeoMatricula Geometry
//!
//! Survey-to-polygon engine: segments are reconstructed into a traverse with
//! nalgebra, measured (Shoelace area, perimeter, closure error), classified
//! into a confidence score and quality tier, and exported to DXF and KML.

pub mod error;
pub mod export;
pub mod metrics;
pub mod placement;
pub mod quality;
pub mod segment;
pub mod traverse;
pub mod urban;

// Re-export nalgebra types for convenience
pub use nalgebra::{Point2, Vector2};

pub use error::{Error, Result};
pub use export::{export_file_name, generate_dxf, generate_kml, truncate_label, DxfDocument, KmlDocument};
pub use metrics::{closure_error, perimeter, shoelace_area, PolygonMetrics};
pub use placement::{centroid, place_on_map};
pub use quality::{
    area_difference_percent, classify, confidence_score, generate_warnings, quality_indicator,
    quality_level, QualityAssessment, QualityIndicator, QualityLevel, ReportStatus, Severity,
    Warning, WarningKind,
};
pub use segment::{Segment, SegmentInput};
pub use traverse::{azimuth_of, displacement, Traverse};
pub use urban::{expand_deflections, expand_urban_dimensions, UrbanDimensions};
