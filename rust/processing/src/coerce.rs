// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Oracle boundary coercion
//!
//! The extraction and revision oracles answer with loosely typed JSON:
//! Portuguese and English field names, numbers as strings, `"P3"` instead of
//! an index. Everything here is total. Unknown fields are dropped, derived
//! fields (`bearingAzimuth`, `deltaX`, `deltaY`) are never read.

use std::str::FromStr;

use geomatricula_core::georef::EASTING_RANGE;
use geomatricula_core::{parse_decimal, parse_distance_m, Hemisphere, UtmAnchor, UtmVertex};
use geomatricula_geometry::{SegmentInput, UrbanDimensions};
use serde_json::{Map, Value};

use crate::types::{ExtractedMatricula, PropertyType};

const BEARING_KEYS: &[&str] = &["bearingRaw", "rumo", "bearing", "azimute"];
const DISTANCE_KEYS: &[&str] = &["distanceM", "distancia", "distance"];
const NEIGHBOR_KEYS: &[&str] = &["confrontation", "confrontante", "neighbor"];

/// Pull the JSON object out of an LLM reply: a fenced ```` ```json ````
/// block, or the whole reply when it is a bare object. `None` means the
/// reply is plain text.
pub fn extract_json_payload(content: &str) -> Option<Value> {
    if let Some(open) = content.find("```") {
        let body = &content[open + 3..];
        let body = body
            .strip_prefix("json")
            .or_else(|| body.strip_prefix("JSON"))
            .unwrap_or(body);
        if let Some(close) = body.find("```") {
            return serde_json::from_str::<Value>(body[..close].trim())
                .ok()
                .filter(Value::is_object);
        }
    }

    let trimmed = content.trim();
    if trimmed.starts_with('{') {
        return serde_json::from_str::<Value>(trimmed)
            .ok()
            .filter(Value::is_object);
    }
    None
}

fn field<'a>(object: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|key| object.get(*key))
        .find(|value| !value.is_null())
}

/// Text of a string or number field, trimmed; empty counts as missing
fn text(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}

fn text_field(object: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    field(object, keys).and_then(text)
}

/// JSON number, or the leading number of a string (`"12.500,00 m²"`)
pub fn lenient_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let start = s.find(|c: char| c.is_ascii_digit())?;
            let negative = s[..start].trim_end().ends_with('-');
            let token: String = s[start..]
                .chars()
                .take_while(|c| c.is_ascii_digit() || *c == '.' || *c == ',')
                .collect();
            let token = token.trim_end_matches(['.', ',']);
            parse_decimal(token).map(|v| if negative { -v } else { v })
        }
        _ => None,
    }
    .filter(|v| v.is_finite())
}

fn number_field(object: &Map<String, Value>, keys: &[&str]) -> Option<f64> {
    field(object, keys).and_then(lenient_number)
}

fn distance(value: &Value) -> f64 {
    let distance = match value {
        Value::String(s) => parse_distance_m(s),
        other => lenient_number(other).unwrap_or(0.0),
    };
    if distance < 0.0 {
        tracing::warn!(distance, "Negative distance taken as its magnitude");
    }
    distance
}

/// `index` as a number or numeric string, else the digits of `point` (`"P3"`)
fn index_field(object: &Map<String, Value>) -> Option<u32> {
    if let Some(index) = field(object, &["index"]).and_then(lenient_number) {
        if index >= 1.0 && index.fract() == 0.0 && index <= f64::from(u32::MAX) {
            return Some(index as u32);
        }
    }
    let point = field(object, &["point", "ponto"]).and_then(text)?;
    let digits: String = point.chars().filter(char::is_ascii_digit).collect();
    digits.parse().ok().filter(|i| *i >= 1)
}

/// One segment entry; `None` when the entry is not an object.
///
/// The index is left empty when the entry carries none, so the caller can
/// tell authored indices from positions.
pub fn coerce_segment(value: &Value) -> Option<SegmentInput> {
    let object = value.as_object()?;
    Some(SegmentInput {
        index: index_field(object),
        bearing_raw: text_field(object, BEARING_KEYS).unwrap_or_default(),
        distance_m: field(object, DISTANCE_KEYS).map(distance).unwrap_or(0.0),
        neighbor: text_field(object, NEIGHBOR_KEYS),
        custom_name: text_field(object, &["customName", "name"]),
        source_text: text_field(object, &["sourceText"]),
    })
}

/// Segment array; non-arrays give nothing and non-object entries are skipped.
/// Entries without an index take their position.
pub fn coerce_segments(value: &Value) -> Vec<SegmentInput> {
    let Some(entries) = value.as_array() else {
        return Vec::new();
    };
    entries
        .iter()
        .filter_map(coerce_segment)
        .enumerate()
        .map(|(position, mut input)| {
            input.index = input.index.or(Some(position as u32 + 1));
            input
        })
        .collect()
}

fn coerce_property_type(value: &Value) -> Option<PropertyType> {
    let text = text(value)?.to_lowercase();
    match text.as_str() {
        "rural" => Some(PropertyType::Rural),
        "urbano" | "urbana" | "urban" => Some(PropertyType::Urbano),
        _ => None,
    }
}

/// UTM readings never have fewer than six integer digits, so a dotted
/// reading below the easting floor (`"333.000"`) is grouped thousands.
fn utm_number(value: &Value) -> Option<f64> {
    let number = lenient_number(value)?;
    match value {
        Value::String(s) if number < EASTING_RANGE.0 && s.contains('.') && !s.contains(',') => {
            lenient_number(&Value::String(s.replace('.', "")))
        }
        _ => Some(number),
    }
}

fn utm_field(object: &Map<String, Value>, keys: &[&str]) -> Option<f64> {
    field(object, keys).and_then(utm_number)
}

fn coerce_utm(value: &Value) -> Option<UtmAnchor> {
    let object = value.as_object()?;
    let zone = number_field(object, &["zone", "zona"])
        .filter(|z| (1.0..=60.0).contains(z))
        .map(|z| z as u8);
    let hemisphere = field(object, &["hemisphere", "hemisferio"])
        .and_then(text)
        .and_then(|h| Hemisphere::from_str(&h).ok());
    let first_vertex = field(object, &["firstVertex"])
        .and_then(Value::as_object)
        .and_then(|vertex| {
            Some(UtmVertex {
                n: utm_field(vertex, &["n", "N", "northing"])?,
                e: utm_field(vertex, &["e", "E", "easting"])?,
            })
        });

    Some(UtmAnchor {
        zone,
        hemisphere,
        first_vertex,
    })
}

fn coerce_urban(value: &Value) -> Option<UrbanDimensions> {
    let object = value.as_object()?;
    Some(UrbanDimensions {
        front: number_field(object, &["front", "frente"]),
        back: number_field(object, &["back", "fundos"]),
        right_side: number_field(object, &["rightSide", "ladoDireito"]),
        left_side: number_field(object, &["leftSide", "ladoEsquerdo"]),
        front_confrontation: text_field(object, &["frontConfrontation"]),
        back_confrontation: text_field(object, &["backConfrontation"]),
        right_confrontation: text_field(object, &["rightConfrontation"]),
        left_confrontation: text_field(object, &["leftConfrontation"]),
    })
}

/// Extraction oracle output. Anything that is not an object gives an
/// empty extraction.
pub fn coerce_extraction(value: &Value) -> ExtractedMatricula {
    let Some(object) = value.as_object() else {
        return ExtractedMatricula::default();
    };

    ExtractedMatricula {
        matricula: text_field(object, &["matricula"]),
        owner: text_field(object, &["owner", "proprietario"]),
        registry_office: text_field(object, &["registryOffice"]),
        city: text_field(object, &["city", "cidade"]),
        state: text_field(object, &["state", "estado", "uf"]),
        property_address: text_field(object, &["propertyAddress"]),
        property_type: field(object, &["propertyType"]).and_then(coerce_property_type),
        area_declared: number_field(object, &["areaDeclared", "area"]),
        perimeter_declared: number_field(object, &["perimeterDeclared"]),
        utm_coordinates: field(object, &["utmCoordinates"]).and_then(coerce_utm),
        segments: field(object, &["segments", "segmentos"])
            .map(coerce_segments)
            .unwrap_or_default(),
        urban_dimensions: field(object, &["urbanDimensions"]).and_then(coerce_urban),
    }
}

/// Revision oracle answer
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RevisionResponse {
    pub response_text: String,
    /// Raw replacement array, validated when the proposal is made
    pub updated_segments: Option<Value>,
    pub requires_confirmation: bool,
    pub warning_message: Option<String>,
    pub change_description: Option<String>,
}

impl RevisionResponse {
    pub fn from_value(value: &Value) -> Self {
        let Some(object) = value.as_object() else {
            return Self {
                response_text: text(value).unwrap_or_default(),
                ..Self::default()
            };
        };

        Self {
            response_text: text_field(object, &["responseText", "response"]).unwrap_or_default(),
            updated_segments: field(object, &["updatedSegments"]).cloned(),
            requires_confirmation: match field(object, &["requiresConfirmation"]) {
                Some(Value::Bool(flag)) => *flag,
                Some(Value::String(s)) => s.trim().eq_ignore_ascii_case("true"),
                _ => false,
            },
            warning_message: text_field(object, &["warningMessage"]),
            change_description: text_field(object, &["changeDescription"]),
        }
    }

    /// Raw reply text: JSON when there is any, otherwise a plain answer
    pub fn from_content(content: &str) -> Self {
        match extract_json_payload(content) {
            Some(value) => Self::from_value(&value),
            None => Self {
                response_text: content.trim().to_string(),
                ..Self::default()
            },
        }
    }
}
