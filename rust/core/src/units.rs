// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Length units and pt-BR number parsing
//!
//! Registry deeds write distances as `48,72m`, `120.00 metros` or
//! `1.234,56 m`. These helpers turn such text into metres.

use nom::{
    branch::alt,
    bytes::complete::tag_no_case,
    character::complete::{digit1, multispace0, one_of, satisfy},
    combinator::{not, peek, recognize},
    multi::many0,
    sequence::pair,
    IResult,
};

/// Multiplier that converts a length unit word to metres
#[inline]
pub fn length_unit_multiplier(unit: &str) -> f64 {
    match unit.to_ascii_lowercase().as_str() {
        "km" | "quilometro" | "quilometros" => 1e3,
        "cm" | "centimetro" | "centimetros" => 1e-2,
        "mm" | "milimetro" | "milimetros" => 1e-3,
        _ => 1.0, // m, metro(s), mts or no unit
    }
}

/// Parse a number written with either decimal convention.
///
/// - both `.` and `,` present: the one appearing last is the decimal mark
/// - only `,`: decimal comma (`48,72`)
/// - several `.`: thousands separators (`1.234.567`)
/// - a single `.`: decimal point (`120.00`, `125.375`)
pub fn parse_decimal(text: &str) -> Option<f64> {
    let text = text.trim();
    if text.is_empty() || !text.bytes().any(|b| b.is_ascii_digit()) {
        return None;
    }

    let last_dot = text.rfind('.');
    let last_comma = text.rfind(',');

    let normalized: String = match (last_dot, last_comma) {
        (Some(dot), Some(comma)) => {
            let (thousands, decimal) = if comma > dot { ('.', ',') } else { (',', '.') };
            text.chars()
                .filter(|c| *c != thousands)
                .map(|c| if c == decimal { '.' } else { c })
                .collect()
        }
        (None, Some(_)) => {
            if text.matches(',').count() > 1 {
                text.chars().filter(|c| *c != ',').collect()
            } else {
                text.replace(',', ".")
            }
        }
        (Some(_), None) => {
            if text.matches('.').count() > 1 {
                text.chars().filter(|c| *c != '.').collect()
            } else {
                text.to_string()
            }
        }
        (None, None) => text.to_string(),
    };

    fast_float::parse::<f64, _>(normalized.as_str())
        .ok()
        .filter(|v| v.is_finite())
}

/// Parse a free-form distance into metres.
///
/// Takes the first numeric token in the text (sign and other noise are
/// ignored) and applies the unit word that follows it. Unparseable text
/// yields `0.0`, so a segment always has a numeric distance.
pub fn parse_distance_m(raw: &str) -> f64 {
    let Some(start) = raw.find(|c: char| c.is_ascii_digit()) else {
        return 0.0;
    };
    let tail = &raw[start..];
    let Ok((rest, token)) = number_token(tail) else {
        return 0.0;
    };
    let Some(value) = parse_decimal(token) else {
        return 0.0;
    };

    let unit: String = rest
        .trim_start()
        .chars()
        .take_while(|c| c.is_ascii_alphabetic())
        .collect();

    value * length_unit_multiplier(&unit)
}

/// A distance literal found inside free text.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LengthMatch {
    /// Byte offset where the number starts
    pub start: usize,
    /// Byte offset just after the unit word
    pub end: usize,
    /// Value converted to metres
    pub meters: f64,
}

/// Find the first `<number> <unit>` literal in `text` (e.g. `48,72m`,
/// `120.00 metros`). Area units such as `m²` or `m2` are not lengths and are
/// skipped.
pub fn find_length(text: &str) -> Option<LengthMatch> {
    let mut previous: Option<char> = None;
    for (i, c) in text.char_indices() {
        let at_boundary = previous
            .map_or(true, |p| !(p.is_alphanumeric() || p == '.' || p == ','));
        if c.is_ascii_digit() && at_boundary {
            if let Ok((rest, meters)) = length_literal(&text[i..]) {
                return Some(LengthMatch {
                    start: i,
                    end: text.len() - rest.len(),
                    meters,
                });
            }
        }
        previous = Some(c);
    }
    None
}

/// Digits with optional `.`/`,` groups: `1.234,56`
pub(crate) fn number_token(input: &str) -> IResult<&str, &str> {
    recognize(pair(digit1, many0(pair(one_of(".,"), digit1))))(input)
}

/// Unit word at the end of a length literal
fn length_unit(input: &str) -> IResult<&str, &str> {
    alt((
        tag_no_case("metros"),
        tag_no_case("metro"),
        tag_no_case("mts"),
        tag_no_case("km"),
        tag_no_case("cm"),
        tag_no_case("mm"),
        tag_no_case("m"),
    ))(input)
}

/// `<number> <unit>` not followed by another letter or digit
pub(crate) fn length_literal(input: &str) -> IResult<&str, f64> {
    let (input, token) = number_token(input)?;
    let (input, _) = multispace0(input)?;
    let (input, unit) = length_unit(input)?;
    // `m²`/`m2` are areas
    let (input, _) = not(peek(satisfy(|c: char| c.is_alphanumeric())))(input)?;

    let value = parse_decimal(token).ok_or_else(|| {
        nom::Err::Error(nom::error::Error::new(input, nom::error::ErrorKind::Float))
    })?;
    Ok((input, value * length_unit_multiplier(unit)))
}
