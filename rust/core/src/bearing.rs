// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Bearing notation parser using nom
//!
//! Deeds mix several ways of writing a direction, sometimes within one
//! document:
//!
//! - quadrant bearings: `N 45°30'E`, `S12°30'15"W`, `Norte 10º L`
//! - explicit azimuths: `Az 135°20'`, `azimute 90°00'00"`
//! - bare degrees: `271°15'`
//!
//! Parsing is total. Text that matches none of the above falls back to the
//! first number in the string, then to `0°`, and the [`BearingNotation`]
//! tells the caller which rule produced the angle.

use nom::{
    branch::alt,
    bytes::complete::{tag, tag_no_case},
    character::complete::{char, digit1, one_of, satisfy, space0},
    combinator::{not, opt, peek, recognize},
    sequence::pair,
    IResult,
};

use crate::units::length_literal;

/// Which dialect a bearing string was read with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum BearingNotation {
    /// `N 45°30'E`
    Quadrant,
    /// `Az 135°20'`
    Azimuth,
    /// `271°15'` without quadrant letters
    BareDegrees,
    /// First number found anywhere in the text
    NumericScrape,
    /// Nothing numeric at all; azimuth defaults to 0
    Unparsed,
}

impl BearingNotation {
    /// True when the angle came from a structured notation rather than a fallback
    #[inline]
    pub fn is_structured(self) -> bool {
        matches!(self, Self::Quadrant | Self::Azimuth | Self::BareDegrees)
    }
}

/// Parsed bearing: azimuth in decimal degrees, clockwise from north, in `[0, 360)`
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Bearing {
    pub azimuth: f64,
    pub notation: BearingNotation,
}

/// Meridian side of a quadrant bearing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NorthSouth {
    North,
    South,
}

/// Turn side of a quadrant bearing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EastWest {
    East,
    West,
}

/// A bearing located inside free text
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BearingMatch {
    /// Byte offset of the first character of the bearing
    pub start: usize,
    /// Byte offset just past the bearing
    pub end: usize,
    pub bearing: Bearing,
}

/// Wrap any angle into `[0, 360)`. Non-finite input maps to `0`.
#[inline]
pub fn normalize_azimuth(degrees: f64) -> f64 {
    if !degrees.is_finite() {
        return 0.0;
    }
    let wrapped = degrees.rem_euclid(360.0);
    // rem_euclid of a tiny negative value rounds up to 360.0
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}

/// Convert a quadrant bearing to an azimuth.
///
/// | quadrant | azimuth |
/// |----------|---------|
/// | N..E     | a       |
/// | N..W     | 360 − a |
/// | S..E     | 180 − a |
/// | S..W     | 180 + a |
#[inline]
pub fn quadrant_to_azimuth(ns: NorthSouth, angle: f64, ew: EastWest) -> f64 {
    let azimuth = match (ns, ew) {
        (NorthSouth::North, EastWest::East) => angle,
        (NorthSouth::North, EastWest::West) => 360.0 - angle,
        (NorthSouth::South, EastWest::East) => 180.0 - angle,
        (NorthSouth::South, EastWest::West) => 180.0 + angle,
    };
    normalize_azimuth(azimuth)
}

/// Parse a bearing string, reporting the dialect used.
///
/// Precedence: quadrant bearing anywhere in the text, explicit azimuth
/// anywhere in the text, bare degrees at the start, first number, `0`.
///
/// A scraped first number is wrapped into `[0, 360)` like every other
/// dialect, so `"direção 400"` reads as 40° rather than being rejected.
pub fn parse_bearing(raw: &str) -> Bearing {
    if let Some(found) = scan(raw, quadrant_bearing) {
        return found.bearing;
    }
    if let Some(found) = scan(raw, explicit_azimuth) {
        return found.bearing;
    }
    if let Ok((_, degrees)) = bare_degrees(raw.trim_start()) {
        return Bearing {
            azimuth: normalize_azimuth(degrees),
            notation: BearingNotation::BareDegrees,
        };
    }
    // Out-of-range scrapes wrap: 400 becomes 40
    if let Some(value) = first_number(raw) {
        return Bearing {
            azimuth: normalize_azimuth(value),
            notation: BearingNotation::NumericScrape,
        };
    }
    Bearing {
        azimuth: 0.0,
        notation: BearingNotation::Unparsed,
    }
}

/// Parse a bearing string into an azimuth in `[0, 360)`. Never fails.
#[inline]
pub fn parse_bearing_to_azimuth(raw: &str) -> f64 {
    parse_bearing(raw).azimuth
}

/// Locate the earliest quadrant bearing or explicit azimuth in `text`.
pub fn find_bearing(text: &str) -> Option<BearingMatch> {
    scan(text, |i| alt((quadrant_bearing, explicit_azimuth))(i))
}

/// Format an azimuth as `Az 90°00'00"`, rounded to the second.
pub fn format_azimuth(azimuth: f64) -> String {
    let total_seconds = (normalize_azimuth(azimuth) * 3600.0).round() as u64 % (360 * 3600);
    let degrees = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;
    format!("Az {}°{:02}'{:02}\"", degrees, minutes, seconds)
}

/// Try `parser` at every word boundary of `text`, returning the first hit.
fn scan<F>(text: &str, mut parser: F) -> Option<BearingMatch>
where
    F: FnMut(&str) -> IResult<&str, Bearing>,
{
    let mut previous: Option<char> = None;
    for (start, c) in text.char_indices() {
        let at_boundary = previous.map_or(true, |p| !p.is_alphabetic());
        if at_boundary && c.is_alphabetic() {
            if let Ok((rest, bearing)) = parser(&text[start..]) {
                return Some(BearingMatch {
                    start,
                    end: text.len() - rest.len(),
                    bearing,
                });
            }
        }
        previous = Some(c);
    }
    None
}

/// Decimal number with `.` or `,` as decimal mark
fn number(input: &str) -> IResult<&str, f64> {
    let (rest, token) = recognize(pair(digit1, opt(pair(one_of(".,"), digit1))))(input)?;
    let normalized = token.replace(',', ".");
    match fast_float::parse::<f64, _>(normalized.as_str()) {
        Ok(value) if value.is_finite() => Ok((rest, value)),
        _ => Err(nom::Err::Error(nom::error::Error::new(
            input,
            nom::error::ErrorKind::Float,
        ))),
    }
}

fn degree_sign(input: &str) -> IResult<&str, char> {
    one_of("°º˚")(input)
}

fn minute_mark(input: &str) -> IResult<&str, &str> {
    alt((tag("'"), tag("′"), tag("’"), tag("´")))(input)
}

fn second_mark(input: &str) -> IResult<&str, &str> {
    alt((tag("''"), tag("’’"), tag("\""), tag("″"), tag("”")))(input)
}

/// Minutes or seconds: a number with an optional mark. A number that is
/// really a distance (`48,72m`) is not an angle component.
fn angle_component<'a, M>(mut mark: M) -> impl FnMut(&'a str) -> IResult<&'a str, f64>
where
    M: FnMut(&'a str) -> IResult<&'a str, &'a str>,
{
    move |input: &'a str| {
        let (input, _) = space0(input)?;
        let (input, _) = not(length_literal)(input)?;
        let (input, value) = number(input)?;
        let (input, _) = space0(input)?;
        let (input, _) = opt(|i| mark(i))(input)?;
        Ok((input, value))
    }
}

/// `deg[°] [min[']] [sec["]]` as decimal degrees
fn dms(input: &str, degree_sign_required: bool) -> IResult<&str, f64> {
    let (input, degrees) = number(input)?;
    let (input, _) = space0(input)?;
    let (input, sign) = opt(degree_sign)(input)?;
    if degree_sign_required && sign.is_none() {
        return Err(nom::Err::Error(nom::error::Error::new(
            input,
            nom::error::ErrorKind::Char,
        )));
    }
    let (input, minutes) = opt(angle_component(minute_mark))(input)?;
    let (input, seconds) = opt(angle_component(second_mark))(input)?;

    let value = degrees + minutes.unwrap_or(0.0) / 60.0 + seconds.unwrap_or(0.0) / 3600.0;
    Ok((input, value))
}

fn north_south(input: &str) -> IResult<&str, NorthSouth> {
    let (rest, word) = alt((
        tag_no_case("norte"),
        tag_no_case("north"),
        tag_no_case("sul"),
        tag_no_case("south"),
        tag_no_case("n"),
        tag_no_case("s"),
    ))(input)?;
    let ns = if word.eq_ignore_ascii_case("n")
        || word.eq_ignore_ascii_case("norte")
        || word.eq_ignore_ascii_case("north")
    {
        NorthSouth::North
    } else {
        NorthSouth::South
    };
    Ok((rest, ns))
}

fn east_west(input: &str) -> IResult<&str, EastWest> {
    let (rest, word) = alt((
        tag_no_case("leste"),
        tag_no_case("oeste"),
        tag_no_case("este"),
        tag_no_case("east"),
        tag_no_case("west"),
        tag_no_case("e"),
        tag_no_case("l"),
        tag_no_case("w"),
        tag_no_case("o"),
    ))(input)?;
    let ew = match word.to_ascii_lowercase().as_str() {
        "oeste" | "west" | "w" | "o" => EastWest::West,
        _ => EastWest::East,
    };
    Ok((rest, ew))
}

/// `N 45°30'E`
fn quadrant_bearing(input: &str) -> IResult<&str, Bearing> {
    let (input, ns) = north_south(input)?;
    let (input, _) = space0(input)?;
    let (input, angle) = dms(input, false)?;
    let (input, _) = space0(input)?;
    let (input, ew) = east_west(input)?;
    let (input, _) = not(peek(satisfy(|c: char| c.is_alphabetic())))(input)?;

    Ok((
        input,
        Bearing {
            azimuth: quadrant_to_azimuth(ns, angle, ew),
            notation: BearingNotation::Quadrant,
        },
    ))
}

/// `Az 135°20'`, `azimute: 90°`
fn explicit_azimuth(input: &str) -> IResult<&str, Bearing> {
    let (input, _) = alt((
        tag_no_case("azimute"),
        tag_no_case("azimuth"),
        tag_no_case("az"),
    ))(input)?;
    let (input, _) = opt(char('.'))(input)?;
    let (input, _) = space0(input)?;
    let (input, _) = opt(char(':'))(input)?;
    let (input, _) = space0(input)?;
    let (input, degrees) = dms(input, false)?;

    Ok((
        input,
        Bearing {
            azimuth: normalize_azimuth(degrees),
            notation: BearingNotation::Azimuth,
        },
    ))
}

/// `271°15'` at the start of the text; the degree sign is mandatory
fn bare_degrees(input: &str) -> IResult<&str, f64> {
    dms(input, true)
}

/// First `\d+([.,]\d+)?` anywhere in the text
fn first_number(text: &str) -> Option<f64> {
    let start = text.find(|c: char| c.is_ascii_digit())?;
    number(&text[start..]).ok().map(|(_, value)| value)
}
