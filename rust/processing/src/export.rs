// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! DXF and KML files for a computed result.

use geomatricula_core::LatLng;
use geomatricula_geometry::{
    export_file_name, generate_dxf, generate_kml, DxfDocument, KmlDocument, Point2,
};

use crate::error::Result;
use crate::pipeline::map_coordinates;
use crate::types::ParcelResult;

/// Rendered export with its download name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportFile {
    pub file_name: String,
    pub content_type: &'static str,
    pub content: String,
}

pub const DXF_CONTENT_TYPE: &str = "application/dxf";
pub const KML_CONTENT_TYPE: &str = "application/vnd.google-earth.kml+xml";

/// DXF drawing in local metres, optionally centred on the origin
pub fn export_dxf(result: &ParcelResult, project_name: &str, center: bool) -> Result<ExportFile> {
    let vertices: Vec<Point2<f64>> = result
        .vertices()
        .iter()
        .map(|[x, y]| Point2::new(*x, *y))
        .collect();

    let content = generate_dxf(&DxfDocument {
        project_name,
        segments: result.segments(),
        coordinates: &vertices,
        area_computed: result.area_computed(),
        perimeter_computed: result.perimeter_computed(),
        center,
    })?;

    tracing::debug!(bytes = content.len(), "DXF generated");
    Ok(ExportFile {
        file_name: export_file_name(project_name, "dxf"),
        content_type: DXF_CONTENT_TYPE,
        content,
    })
}

/// KML placemarks with the polygon placed around `anchor`
pub fn export_kml(result: &ParcelResult, project_name: &str, anchor: LatLng) -> Result<ExportFile> {
    let coordinates = map_coordinates(result, anchor);

    let content = generate_kml(&KmlDocument {
        project_name,
        segments: result.segments(),
        coordinates: &coordinates,
        area_computed: result.area_computed(),
        perimeter_computed: result.perimeter_computed(),
    })?;

    tracing::debug!(bytes = content.len(), "KML generated");
    Ok(ExportFile {
        file_name: export_file_name(project_name, "kml"),
        content_type: KML_CONTENT_TYPE,
        content,
    })
}
