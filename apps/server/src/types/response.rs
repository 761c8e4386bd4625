// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Response types for the API.

use geomatricula_core::{Hemisphere, LatLng};
use geomatricula_geometry::centroid;
use geomatricula_processing::{
    map_coordinates, ParcelOutcome, ParcelResult, ProjectRecord, Proposal, PropertyType,
    RevisionOutcome,
};
use serde::Serialize;

/// Result of a UTM conversion. `location` is `null` when the reading fails
/// a sanity gate.
#[derive(Debug, Clone, Serialize)]
pub struct GeorefResponse {
    pub location: Option<LatLng>,
    /// Zone actually used (explicit, inferred from the state, or the default)
    pub zone: u8,
    pub hemisphere: Hemisphere,
}

/// Batch results, in request order.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchResponse {
    pub outcomes: Vec<ParcelOutcome>,
    pub total_time_ms: u64,
}

/// A stored project as seen by clients.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectResponse {
    pub id: String,
    pub title: String,
    pub property_type: PropertyType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anchor: Option<LatLng>,
    pub map_center: LatLng,
    pub map_coordinates: Vec<LatLng>,
    pub result: ParcelResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pending: Option<Proposal>,
}

impl From<&ProjectRecord> for ProjectResponse {
    fn from(record: &ProjectRecord) -> Self {
        let anchor = record.map_anchor();
        let result = record.editor.current().clone();
        let map_coordinates = map_coordinates(&result, anchor);
        Self {
            id: record.id.clone(),
            title: record.title.clone(),
            property_type: record.property_type,
            anchor: record.anchor,
            map_center: centroid(&map_coordinates).unwrap_or(anchor),
            map_coordinates,
            result,
            pending: record.editor.pending().cloned(),
        }
    }
}

/// A revision request's outcome plus the project it left behind.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RevisionResponseBody {
    #[serde(flatten)]
    pub outcome: RevisionOutcome,
    pub project: ProjectResponse,
}
