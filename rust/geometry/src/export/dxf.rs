// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! AutoCAD R14 ASCII DXF
//!
//! Layers: `PARCEL_BOUNDARY` (polyline), `PARCEL_POINTS`, `PARCEL_TEXT`
//! (vertex labels, title, area line), `PARCEL_BEARINGS` and
//! `PARCEL_NEIGHBORS` (per-leg annotations at the leg midpoint).

use std::fmt::Write;

use nalgebra::Point2;

use super::{fixed, truncate_label};
use crate::error::{Error, Result};
use crate::segment::Segment;

/// Layer names with their AutoCAD colour index
const LAYERS: [(&str, u8); 5] = [
    ("PARCEL_BOUNDARY", 3),
    ("PARCEL_POINTS", 5),
    ("PARCEL_TEXT", 7),
    ("PARCEL_BEARINGS", 1),
    ("PARCEL_NEIGHBORS", 4),
];

/// Input of [`generate_dxf`]
#[derive(Debug, Clone, Copy)]
pub struct DxfDocument<'a> {
    pub project_name: &'a str,
    pub segments: &'a [Segment],
    /// Traverse vertices in local metres, `segments.len() + 1` entries
    /// (the last one is the traverse end point)
    pub coordinates: &'a [Point2<f64>],
    pub area_computed: f64,
    pub perimeter_computed: f64,
    /// Translate so the bounding box is centred on the drawing origin
    pub center: bool,
}

/// One-line DXF string value
fn text_value(text: &str) -> String {
    text.replace(['\r', '\n'], " ")
}

fn write_text(out: &mut String, layer: &str, x: f64, y: f64, height: &str, text: &str) {
    let _ = write!(
        out,
        "0\nTEXT\n8\n{}\n10\n{}\n20\n{}\n30\n0\n40\n{}\n1\n{}\n",
        layer,
        fixed(x, 4),
        fixed(y, 4),
        height,
        text_value(text)
    );
}

pub fn generate_dxf(doc: &DxfDocument<'_>) -> Result<String> {
    if doc.coordinates.len() < 4 {
        return Err(Error::DegeneratePolygon(format!(
            "DXF export needs at least 3 vertices, got {}",
            doc.coordinates.len().saturating_sub(1)
        )));
    }

    let (min, max) = doc.coordinates.iter().fold(
        (
            Point2::new(f64::INFINITY, f64::INFINITY),
            Point2::new(f64::NEG_INFINITY, f64::NEG_INFINITY),
        ),
        |(min, max), p| {
            (
                Point2::new(min.x.min(p.x), min.y.min(p.y)),
                Point2::new(max.x.max(p.x), max.y.max(p.y)),
            )
        },
    );
    let center = Point2::new((min.x + max.x) / 2.0, (min.y + max.y) / 2.0);

    let shift = if doc.center { center.coords } else { nalgebra::Vector2::zeros() };
    let coordinates: Vec<Point2<f64>> = doc.coordinates.iter().map(|p| p - shift).collect();
    let center = center - shift;
    let min_y = min.y - shift.y;

    let mut dxf = String::with_capacity(4096 + coordinates.len() * 256);

    // HEADER
    dxf.push_str("0\nSECTION\n2\nHEADER\n");
    dxf.push_str("9\n$ACADVER\n1\nAC1014\n");
    dxf.push_str("9\n$INSUNITS\n70\n6\n");
    dxf.push_str("0\nENDSEC\n");

    // TABLES
    dxf.push_str("0\nSECTION\n2\nTABLES\n");
    let _ = write!(dxf, "0\nTABLE\n2\nLAYER\n70\n{}\n", LAYERS.len());
    for (name, color) in LAYERS {
        let _ = write!(dxf, "0\nLAYER\n2\n{}\n70\n0\n62\n{}\n6\nCONTINUOUS\n", name, color);
    }
    dxf.push_str("0\nENDTAB\n");
    dxf.push_str("0\nENDSEC\n");

    // ENTITIES
    dxf.push_str("0\nSECTION\n2\nENTITIES\n");

    let _ = write!(
        dxf,
        "0\nLWPOLYLINE\n8\nPARCEL_BOUNDARY\n90\n{}\n70\n1\n",
        coordinates.len()
    );
    for p in &coordinates {
        let _ = write!(dxf, "10\n{}\n20\n{}\n", fixed(p.x, 4), fixed(p.y, 4));
    }

    let corner_count = coordinates.len() - 1;
    for (i, p) in coordinates[..corner_count].iter().enumerate() {
        let segment = doc.segments.get(i);
        let label = segment
            .and_then(Segment::custom_name)
            .map(str::to_string)
            .unwrap_or_else(|| format!("P{}", i + 1));

        let _ = write!(
            dxf,
            "0\nPOINT\n8\nPARCEL_POINTS\n10\n{}\n20\n{}\n30\n0\n",
            fixed(p.x, 4),
            fixed(p.y, 4)
        );
        write_text(&mut dxf, "PARCEL_TEXT", p.x + 2.0, p.y + 2.0, "2", &label);

        if let Some(segment) = segment {
            // the closing leg's midpoint wraps to the first vertex
            let next = if i + 1 < corner_count {
                coordinates[i + 1]
            } else {
                coordinates[0]
            };
            let mid = Point2::new((p.x + next.x) / 2.0, (p.y + next.y) / 2.0);

            let bearing_text = format!("{} - {:.2}m", segment.bearing_raw(), segment.distance_m());
            write_text(&mut dxf, "PARCEL_BEARINGS", mid.x, mid.y - 3.0, "1.5", &bearing_text);

            if let Some(neighbor) = segment.neighbor() {
                write_text(
                    &mut dxf,
                    "PARCEL_NEIGHBORS",
                    mid.x,
                    mid.y + 3.0,
                    "1.2",
                    &truncate_label(neighbor),
                );
            }
        }
    }

    write_text(&mut dxf, "PARCEL_TEXT", center.x, min_y - 10.0, "2.5", doc.project_name);
    let summary = format!(
        "Area: {:.2} m2 | Perimetro: {:.2} m",
        doc.area_computed, doc.perimeter_computed
    );
    write_text(&mut dxf, "PARCEL_TEXT", center.x, min_y - 15.0, "2", &summary);

    dxf.push_str("0\nENDSEC\n");
    dxf.push_str("0\nEOF\n");

    Ok(dxf)
}
