// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! UTM Georeferencing Support
//!
//! Converts a UTM reading of a parcel's first vertex into WGS84 latitude and
//! longitude so the locally reconstructed polygon can be placed on a map.
//! Deeds often omit the zone, so it can be inferred from the Brazilian state.

use std::str::FromStr;

use crate::error::{Error, Result};

/// WGS84 semi-major axis (metres)
pub const WGS84_A: f64 = 6_378_137.0;
/// WGS84 first eccentricity
pub const WGS84_E: f64 = 0.081819191;
/// Second eccentricity squared (e'²)
pub const WGS84_E1SQ: f64 = 0.006739497;
/// UTM scale factor on the central meridian
pub const UTM_K0: f64 = 0.9996;

const FALSE_EASTING: f64 = 500_000.0;
const SOUTH_FALSE_NORTHING: f64 = 10_000_000.0;

/// Zone used when neither a zone nor a known state is available
pub const DEFAULT_UTM_ZONE: u8 = 23;

/// Map centre used when a parcel has no usable georeference (São Paulo)
pub const DEFAULT_MAP_CENTER: LatLng = LatLng {
    lat: -23.5505,
    lng: -46.6333,
};

/// Accepted easting range for a first-vertex reading
pub const EASTING_RANGE: (f64, f64) = (100_000.0, 900_000.0);
/// Accepted northing range for a first-vertex reading
pub const NORTHING_RANGE: (f64, f64) = (1_000_000.0, 10_000_000.0);

/// Approximate bounding box of Brazil
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoBounds {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
}

impl GeoBounds {
    #[inline]
    pub fn contains(&self, point: LatLng) -> bool {
        point.lat >= self.min_lat
            && point.lat <= self.max_lat
            && point.lng >= self.min_lng
            && point.lng <= self.max_lng
    }
}

pub const BRAZIL_BOUNDS: GeoBounds = GeoBounds {
    min_lat: -35.0,
    max_lat: 6.0,
    min_lng: -75.0,
    max_lng: -28.0,
};

/// WGS84 position in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

/// UTM hemisphere. Brazil is almost entirely south of the equator, so
/// `South` is the default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Hemisphere {
    #[cfg_attr(feature = "serde", serde(rename = "N"))]
    North,
    #[default]
    #[cfg_attr(feature = "serde", serde(rename = "S"))]
    South,
}

impl FromStr for Hemisphere {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "n" | "north" | "norte" => Ok(Hemisphere::North),
            "s" | "south" | "sul" => Ok(Hemisphere::South),
            _ => Err(Error::InvalidHemisphere(s.to_string())),
        }
    }
}

/// A full UTM coordinate
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct UtmCoordinate {
    pub easting: f64,
    pub northing: f64,
    pub zone: u8,
    pub hemisphere: Hemisphere,
}

impl UtmCoordinate {
    /// Validating constructor: zone in 1..=60, finite easting/northing
    pub fn new(easting: f64, northing: f64, zone: i64, hemisphere: Hemisphere) -> Result<Self> {
        if !easting.is_finite() {
            return Err(Error::NonFiniteCoordinate("easting"));
        }
        if !northing.is_finite() {
            return Err(Error::NonFiniteCoordinate("northing"));
        }
        if !(1..=60).contains(&zone) {
            return Err(Error::InvalidZone(zone));
        }
        Ok(Self {
            easting,
            northing,
            zone: zone as u8,
            hemisphere,
        })
    }

    /// True when easting and northing fall inside the accepted input ranges
    #[inline]
    pub fn in_input_range(&self) -> bool {
        self.easting >= EASTING_RANGE.0
            && self.easting <= EASTING_RANGE.1
            && self.northing >= NORTHING_RANGE.0
            && self.northing <= NORTHING_RANGE.1
    }
}

/// First-vertex reading as printed in a deed (`N 7.394.000 / E 333.000`)
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct UtmVertex {
    pub n: f64,
    pub e: f64,
}

/// Optional georeferencing data attached to an extraction
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct UtmAnchor {
    #[cfg_attr(feature = "serde", serde(default))]
    pub zone: Option<u8>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub hemisphere: Option<Hemisphere>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub first_vertex: Option<UtmVertex>,
}

impl UtmAnchor {
    /// Fill in the zone (explicit, else from `fallback_state`, else 23) and the
    /// hemisphere (default south). `None` when there is no first vertex.
    pub fn to_utm(&self, fallback_state: Option<&str>) -> Option<UtmCoordinate> {
        let vertex = self.first_vertex?;
        let zone = self
            .zone
            .filter(|z| (1..=60).contains(z))
            .unwrap_or_else(|| fallback_state.map_or(DEFAULT_UTM_ZONE, zone_for_state));

        Some(UtmCoordinate {
            easting: vertex.e,
            northing: vertex.n,
            zone,
            hemisphere: self.hemisphere.unwrap_or_default(),
        })
    }

    /// Resolve to a map position, applying both sanity gates.
    #[inline]
    pub fn resolve(&self, fallback_state: Option<&str>) -> Option<LatLng> {
        self.to_utm(fallback_state)
            .and_then(|utm| utm_to_lat_lng_safe(&utm))
    }
}

/// Longitude of the central meridian of a zone
#[inline]
pub fn central_meridian(zone: u8) -> f64 {
    (zone as f64 - 1.0) * 6.0 - 180.0 + 3.0
}

/// Zone containing a longitude
#[inline]
pub fn zone_from_longitude(lng: f64) -> u8 {
    (((lng + 180.0) / 6.0).floor() as i64 + 1).clamp(1, 60) as u8
}

/// Representative zone for a Brazilian state code, if the state is known.
///
/// States spanning several zones (AM, PA, MT and others) map to a single
/// representative zone, so the result is approximate for those.
pub fn known_state_zone(state: &str) -> Option<u8> {
    let code = state.trim().to_ascii_uppercase();
    let zone = match code.as_str() {
        "AC" => 18,
        "AM" | "RR" => 20,
        "RO" | "MT" | "MS" => 21,
        "PA" | "AP" | "TO" | "GO" | "PR" | "SC" | "RS" => 22,
        "MA" | "PI" | "DF" | "MG" | "SP" | "RJ" => 23,
        "CE" | "SE" | "BA" | "ES" => 24,
        "RN" | "PB" | "PE" | "AL" => 25,
        _ => return None,
    };
    Some(zone)
}

/// Zone for a state code, falling back to zone 23
#[inline]
pub fn zone_for_state(state: &str) -> u8 {
    known_state_zone(state).unwrap_or(DEFAULT_UTM_ZONE)
}

/// Inverse transverse Mercator on the WGS84 ellipsoid.
///
/// No range checks; see [`utm_to_lat_lng_safe`].
pub fn utm_to_lat_lng(utm: &UtmCoordinate) -> LatLng {
    let e2 = WGS84_E.powi(2);
    let x = utm.easting - FALSE_EASTING;
    let y = match utm.hemisphere {
        Hemisphere::South => utm.northing - SOUTH_FALSE_NORTHING,
        Hemisphere::North => utm.northing,
    };

    // Footprint latitude
    let m = y / UTM_K0;
    let mu = m / (WGS84_A * (1.0 - e2 / 4.0 - 3.0 * e2.powi(2) / 64.0 - 5.0 * e2.powi(3) / 256.0));
    let e1 = (1.0 - (1.0 - e2).sqrt()) / (1.0 + (1.0 - e2).sqrt());

    let phi1 = mu
        + (3.0 * e1 / 2.0 - 27.0 * e1.powi(3) / 32.0) * (2.0 * mu).sin()
        + (21.0 * e1.powi(2) / 16.0 - 55.0 * e1.powi(4) / 32.0) * (4.0 * mu).sin()
        + (151.0 * e1.powi(3) / 96.0) * (6.0 * mu).sin();

    let sin_phi1 = phi1.sin();
    let n1 = WGS84_A / (1.0 - e2 * sin_phi1.powi(2)).sqrt();
    let t1 = phi1.tan().powi(2);
    let c1 = WGS84_E1SQ * phi1.cos().powi(2);
    let r1 = WGS84_A * (1.0 - e2) / (1.0 - e2 * sin_phi1.powi(2)).powf(1.5);
    let d = x / (n1 * UTM_K0);

    let lat = phi1
        - (n1 * phi1.tan() / r1)
            * (d.powi(2) / 2.0
                - (5.0 + 3.0 * t1 + 10.0 * c1 - 4.0 * c1.powi(2) - 9.0 * WGS84_E1SQ) * d.powi(4)
                    / 24.0
                + (61.0 + 90.0 * t1 + 298.0 * c1 + 45.0 * t1.powi(2)
                    - 252.0 * WGS84_E1SQ
                    - 3.0 * c1.powi(2))
                    * d.powi(6)
                    / 720.0);

    let delta_lng = (d - (1.0 + 2.0 * t1 + c1) * d.powi(3) / 6.0
        + (5.0 - 2.0 * c1 + 28.0 * t1 - 3.0 * c1.powi(2) + 8.0 * WGS84_E1SQ + 24.0 * t1.powi(2))
            * d.powi(5)
            / 120.0)
        / phi1.cos();

    // The series is in radians; the central meridian is in degrees
    LatLng {
        lat: lat.to_degrees(),
        lng: central_meridian(utm.zone) + delta_lng.to_degrees(),
    }
}

/// Gated conversion: `None` when the reading is outside the accepted input
/// ranges or the result falls outside Brazil.
pub fn utm_to_lat_lng_safe(utm: &UtmCoordinate) -> Option<LatLng> {
    if !utm.in_input_range() {
        return None;
    }
    let position = utm_to_lat_lng(utm);
    if !position.lat.is_finite() || !position.lng.is_finite() || !BRAZIL_BOUNDS.contains(position) {
        return None;
    }
    Some(position)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn sao_paulo() -> UtmCoordinate {
        UtmCoordinate::new(333_000.0, 7_394_000.0, 23, Hemisphere::South).unwrap()
    }

    #[test]
    fn test_central_meridian() {
        assert_eq!(central_meridian(23), -45.0);
        assert_eq!(central_meridian(18), -75.0);
        assert_eq!(central_meridian(1), -177.0);
    }

    #[test]
    fn test_zone_from_longitude() {
        assert_eq!(zone_from_longitude(-46.6), 23);
        assert_eq!(zone_from_longitude(-45.0), 23);
        assert_eq!(zone_from_longitude(-180.0), 1);
        assert_eq!(zone_from_longitude(180.0), 60);
    }

    #[test]
    fn test_state_zone_table() {
        assert_eq!(zone_for_state("AC"), 18);
        assert_eq!(zone_for_state("am"), 20);
        assert_eq!(zone_for_state("MT"), 21);
        assert_eq!(zone_for_state("PA"), 22);
        assert_eq!(zone_for_state("SP"), 23);
        assert_eq!(zone_for_state("BA"), 24);
        assert_eq!(zone_for_state("PE"), 25);
        assert_eq!(zone_for_state("XX"), 23);
        assert_eq!(known_state_zone("XX"), None);
    }

    #[test]
    fn test_utm_to_lat_lng_sao_paulo() {
        let position = utm_to_lat_lng(&sao_paulo());
        assert_abs_diff_eq!(position.lat, -23.5558, epsilon = 1e-3);
        assert_abs_diff_eq!(position.lng, -46.6362, epsilon = 1e-3);
    }

    #[test]
    fn test_central_meridian_easting() {
        let utm = UtmCoordinate::new(500_000.0, 7_394_000.0, 23, Hemisphere::South).unwrap();
        let position = utm_to_lat_lng(&utm);
        assert_abs_diff_eq!(position.lng, -45.0, epsilon = 1e-9);
    }

    #[test]
    fn test_safe_rejects_low_easting() {
        let utm = UtmCoordinate::new(50_000.0, 7_000_000.0, 23, Hemisphere::South).unwrap();
        assert!(utm_to_lat_lng_safe(&utm).is_none());
    }

    #[test]
    fn test_safe_rejects_outside_brazil() {
        // Wrong hemisphere lands in the arctic
        let utm = UtmCoordinate::new(333_000.0, 7_394_000.0, 23, Hemisphere::North).unwrap();
        assert!(utm_to_lat_lng_safe(&utm).is_none());

        // Wrong zone lands in the Pacific
        let utm = UtmCoordinate::new(333_000.0, 7_394_000.0, 18, Hemisphere::South).unwrap();
        assert!(utm_to_lat_lng_safe(&utm).is_none());

        assert!(utm_to_lat_lng_safe(&sao_paulo()).is_some());
    }

    #[test]
    fn test_strict_constructor() {
        assert_eq!(
            UtmCoordinate::new(1.0, 1.0, 0, Hemisphere::South),
            Err(Error::InvalidZone(0))
        );
        assert_eq!(
            UtmCoordinate::new(f64::NAN, 1.0, 23, Hemisphere::South),
            Err(Error::NonFiniteCoordinate("easting"))
        );
    }

    #[test]
    fn test_hemisphere_from_str() {
        assert_eq!("S".parse::<Hemisphere>().unwrap(), Hemisphere::South);
        assert_eq!("norte".parse::<Hemisphere>().unwrap(), Hemisphere::North);
        assert!("X".parse::<Hemisphere>().is_err());
        assert_eq!(Hemisphere::default(), Hemisphere::South);
    }

    #[test]
    fn test_anchor_resolution() {
        let anchor = UtmAnchor {
            zone: None,
            hemisphere: None,
            first_vertex: Some(UtmVertex {
                n: 7_394_000.0,
                e: 333_000.0,
            }),
        };
        // SP infers zone 23
        let position = anchor.resolve(Some("SP")).unwrap();
        assert_abs_diff_eq!(position.lng, -46.6362, epsilon = 1e-3);

        // AC infers zone 18, which puts the point outside Brazil
        assert!(anchor.resolve(Some("AC")).is_none());

        // zone 0 is treated as missing
        let zero_zone = UtmAnchor {
            zone: Some(0),
            ..anchor
        };
        assert_eq!(zero_zone.to_utm(None).unwrap().zone, 23);

        assert!(UtmAnchor::default().resolve(Some("SP")).is_none());
    }
}
