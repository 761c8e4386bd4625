// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! UTM conversion endpoint.

use crate::error::ApiError;
use crate::types::{GeorefRequest, GeorefResponse};
use crate::AppState;
use axum::{extract::State, Json};
use geomatricula_core::{Hemisphere, UtmAnchor, UtmVertex};

/// POST /api/v1/georef/utm - UTM reading to WGS84.
///
/// An out-of-range reading is not an error: the location comes back `null`.
pub async fn utm(
    State(state): State<AppState>,
    Json(request): Json<GeorefRequest>,
) -> Result<Json<GeorefResponse>, ApiError> {
    let zone = match request.zone {
        Some(zone) if (1..=60).contains(&zone) => Some(zone as u8),
        Some(zone) => {
            return Err(ApiError::InvalidPayload(format!(
                "UTM zone {zone} is outside 1..=60"
            )))
        }
        None => None,
    };
    let hemisphere = request
        .hemisphere
        .as_deref()
        .map(str::parse::<Hemisphere>)
        .transpose()
        .map_err(|e| ApiError::InvalidPayload(e.to_string()))?;

    let anchor = UtmAnchor {
        zone,
        hemisphere,
        first_vertex: Some(UtmVertex {
            n: request.northing,
            e: request.easting,
        }),
    };
    let fallback = state.state_hint(request.state);

    let utm = anchor
        .to_utm(fallback.as_deref())
        .ok_or_else(|| ApiError::Internal("UTM anchor without a vertex".into()))?;
    let location = anchor.resolve(fallback.as_deref());
    if location.is_none() {
        tracing::warn!(?utm, "UTM reading rejected by sanity bounds");
    }

    Ok(Json(GeorefResponse {
        location,
        zone: utm.zone,
        hemisphere: utm.hemisphere,
    }))
}
