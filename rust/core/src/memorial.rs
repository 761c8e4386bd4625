// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Deed-text scanner
//!
//! A "memorial descritivo" walks the boundary in prose:
//!
//! ```text
//! do marco P1 segue com azimute 112°30' por 48,72m até o ponto P2,
//! confrontando com Fazenda Boa Vista; dali segue N 35°20'W por 45,50 m ...
//! ```
//!
//! [`MemorialScanner`] yields one [`MemorialLeg`] per bearing occurrence.
//! Urban deeds that describe the outline with turns ("12 metros, deflete à
//! esquerda, 8,50 metros") are read with [`parse_deflections`] instead.

use memchr::memchr2_iter;

use crate::bearing::{find_bearing, BearingNotation};
use crate::units::find_length;

/// Phrases that introduce the neighbour along a leg
const CONFRONTATION_KEYWORDS: &[&str] = &[
    "confrontando com",
    "confronta com",
    "divisando com",
    "divisa com",
    "confrontante",
];

const DEFLECTION_KEYWORD: &[u8] = b"deflete";

/// One boundary leg read from deed text
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct MemorialLeg {
    /// Bearing exactly as written
    pub bearing_raw: String,
    pub notation: BearingNotation,
    /// Metres; `0` when the leg has no distance literal
    pub distance_m: f64,
    pub confrontation: Option<String>,
    /// The stretch of text the leg was read from
    pub source_text: String,
}

/// Iterator over the legs of a deed text
pub struct MemorialScanner<'a> {
    text: &'a str,
    position: usize,
}

impl<'a> MemorialScanner<'a> {
    pub fn new(text: &'a str) -> Self {
        Self { text, position: 0 }
    }
}

impl<'a> Iterator for MemorialScanner<'a> {
    type Item = MemorialLeg;

    fn next(&mut self) -> Option<Self::Item> {
        let remaining = self.text.get(self.position..)?;
        let found = find_bearing(remaining)?;

        let start = self.position + found.start;
        let bearing_end = self.position + found.end;

        // The leg runs until the next bearing
        let window_end = find_bearing(&self.text[bearing_end..])
            .map_or(self.text.len(), |next| bearing_end + next.start);
        let window = &self.text[bearing_end..window_end];

        self.position = window_end;

        Some(MemorialLeg {
            bearing_raw: self.text[start..bearing_end].trim().to_string(),
            notation: found.bearing.notation,
            distance_m: find_length(window).map_or(0.0, |m| m.meters),
            confrontation: find_confrontation(window),
            source_text: self.text[start..window_end]
                .trim()
                .trim_end_matches([';', ','])
                .trim_end()
                .to_string(),
        })
    }
}

/// Collect every leg of `text`
pub fn scan_memorial(text: &str) -> Vec<MemorialLeg> {
    MemorialScanner::new(text).collect()
}

/// Neighbour named after a confrontation keyword, cut at `;`, `,`, `.` or a
/// line break.
pub fn find_confrontation(text: &str) -> Option<String> {
    let (_, after) = text.char_indices().find_map(|(i, _)| {
        CONFRONTATION_KEYWORDS.iter().find_map(|keyword| {
            text.get(i..i + keyword.len())
                .filter(|candidate| candidate.eq_ignore_ascii_case(keyword))
                .map(|_| (i, i + keyword.len()))
        })
    })?;

    let phrase = text[after..].trim_start_matches(|c: char| c == ':' || c.is_whitespace());
    let end = phrase
        .find(|c: char| matches!(c, ';' | ',' | '.' | '\n'))
        .unwrap_or(phrase.len());
    let name = phrase[..end].trim();

    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

/// Direction of a deflection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Turn {
    Left,
    Right,
}

impl Turn {
    /// Azimuth change in degrees
    #[inline]
    pub fn delta_degrees(self) -> f64 {
        match self {
            Turn::Left => -90.0,
            Turn::Right => 90.0,
        }
    }
}

/// One leg of a deflection description. The first leg has no turn.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct DeflectionStep {
    pub turn: Option<Turn>,
    pub distance_m: f64,
}

/// Byte offsets of every `deflete` (ASCII case-insensitive)
fn deflection_offsets(text: &str) -> impl Iterator<Item = usize> + '_ {
    let bytes = text.as_bytes();
    memchr2_iter(b'd', b'D', bytes).filter(move |&i| {
        bytes
            .get(i..i + DEFLECTION_KEYWORD.len())
            .map_or(false, |w| w.eq_ignore_ascii_case(DEFLECTION_KEYWORD))
    })
}

/// True when the text describes its outline with turns
#[inline]
pub fn uses_deflections(text: &str) -> bool {
    deflection_offsets(text).next().is_some()
}

/// Read "12 metros, deflete à esquerda, 8,50 metros, deflete à direita, ..."
/// into steps. Chunks without a distance are skipped; a turn with no
/// direction word keeps the current heading.
pub fn parse_deflections(text: &str) -> Vec<DeflectionStep> {
    let mut boundaries: Vec<usize> = deflection_offsets(text).collect();
    boundaries.push(text.len());

    let mut steps = Vec::with_capacity(boundaries.len());
    let mut chunk_start = 0;
    let mut after_deflection = false;

    for boundary in boundaries {
        let chunk = &text[chunk_start..boundary];
        if let Some(length) = find_length(chunk) {
            let turn = if after_deflection {
                turn_direction(&chunk[..length.start])
            } else {
                None
            };
            steps.push(DeflectionStep {
                turn,
                distance_m: length.meters,
            });
        }
        chunk_start = (boundary + DEFLECTION_KEYWORD.len()).min(text.len());
        after_deflection = true;
    }

    steps
}

fn turn_direction(phrase: &str) -> Option<Turn> {
    let lower = phrase.to_lowercase();
    match (lower.find("esquerd"), lower.find("direit")) {
        (Some(l), Some(r)) => Some(if l < r { Turn::Left } else { Turn::Right }),
        (Some(_), None) => Some(Turn::Left),
        (None, Some(_)) => Some(Turn::Right),
        (None, None) => None,
    }
}
