// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # GeoMatricula Core
//!
//! Text-level building blocks for reading Brazilian property registry
//! records ("matrículas"), built with [nom](https://docs.rs/nom).
//!
//! ## Overview
//!
//! - **Bearing parsing**: quadrant bearings, explicit azimuths and bare
//!   degrees, normalised to an azimuth in `[0, 360)`
//! - **Deed scanning**: boundary legs (bearing, distance, neighbour) read
//!   from the prose of a "memorial descritivo", including urban
//!   "deflete à direita/esquerda" descriptions
//! - **pt-BR numbers**: `48,72`, `1.234,56` and unit words
//! - **Georeferencing**: UTM to WGS84 with zone inference from the state
//!
//! ## Quick Start
//!
//! ```rust
//! use geomatricula_core::{parse_bearing_to_azimuth, scan_memorial};
//!
//! assert_eq!(parse_bearing_to_azimuth("S 30°0'0\"W"), 210.0);
//!
//! let legs = scan_memorial("segue N 45°00'E por 48,72m, confrontando com Lote 3;");
//! assert_eq!(legs.len(), 1);
//! assert_eq!(legs[0].confrontation.as_deref(), Some("Lote 3"));
//! ```
//!
//! ## Feature Flags
//!
//! - `serde`: Enable serialization support for parsed data

pub mod bearing;
pub mod error;
pub mod georef;
pub mod memorial;
pub mod units;

pub use bearing::{
    find_bearing, format_azimuth, normalize_azimuth, parse_bearing, parse_bearing_to_azimuth,
    quadrant_to_azimuth, Bearing, BearingMatch, BearingNotation, EastWest, NorthSouth,
};
pub use error::{Error, Result};
pub use georef::{
    central_meridian, known_state_zone, utm_to_lat_lng, utm_to_lat_lng_safe, zone_for_state,
    zone_from_longitude, GeoBounds, Hemisphere, LatLng, UtmAnchor, UtmCoordinate, UtmVertex,
    BRAZIL_BOUNDS, DEFAULT_MAP_CENTER, DEFAULT_UTM_ZONE,
};
pub use memorial::{
    find_confrontation, parse_deflections, scan_memorial, uses_deflections, DeflectionStep,
    MemorialLeg, MemorialScanner, Turn,
};
pub use units::{find_length, length_unit_multiplier, parse_decimal, parse_distance_m, LengthMatch};
