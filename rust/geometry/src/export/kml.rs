// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! OGC KML 2.2
//!
//! Coordinates are written `lng,lat,0`, the reverse of [`LatLng`] field
//! order. The polygon ring is always closed.

use std::fmt::Write;

use geomatricula_core::LatLng;
use quick_xml::escape::escape;

use super::truncate_label;
use crate::error::{Error, Result};
use crate::segment::Segment;

/// Input of [`generate_kml`]
#[derive(Debug, Clone, Copy)]
pub struct KmlDocument<'a> {
    pub project_name: &'a str,
    pub segments: &'a [Segment],
    /// Polygon corners on the map; may or may not repeat the first corner
    pub coordinates: &'a [LatLng],
    pub area_computed: f64,
    pub perimeter_computed: f64,
}

fn lng_lat(p: &LatLng) -> String {
    format!("{},{},0", p.lng, p.lat)
}

/// CDATA cannot contain its own terminator
fn cdata(text: &str) -> String {
    text.replace("]]>", "]]]]><![CDATA[>")
}

/// Close the ring by repeating the first corner when needed
pub fn closed_ring(coordinates: &[LatLng]) -> Vec<LatLng> {
    let mut ring = coordinates.to_vec();
    if let (Some(first), Some(last)) = (coordinates.first(), coordinates.last()) {
        if coordinates.len() > 1 && first != last {
            ring.push(*first);
        }
    }
    ring
}

pub fn generate_kml(doc: &KmlDocument<'_>) -> Result<String> {
    let ring = closed_ring(doc.coordinates);
    let corners = &ring[..ring.len().saturating_sub(1)];
    if corners.len() < 3 {
        return Err(Error::DegeneratePolygon(format!(
            "KML export needs at least 3 vertices, got {}",
            corners.len()
        )));
    }

    let name = escape(doc.project_name);
    let coords = ring.iter().map(lng_lat).collect::<Vec<_>>().join(" ");

    let mut kml = String::with_capacity(4096 + corners.len() * 512);
    kml.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    kml.push_str("<kml xmlns=\"http://www.opengis.net/kml/2.2\">\n");
    kml.push_str("  <Document>\n");
    let _ = writeln!(kml, "    <name>{}</name>", name);
    kml.push_str("    <description>\n");
    let _ = writeln!(kml, "      Área: {:.2} m²", doc.area_computed);
    let _ = writeln!(kml, "      Perímetro: {:.2} m", doc.perimeter_computed);
    kml.push_str("      Gerado por GeoMatrícula\n");
    kml.push_str("    </description>\n");

    kml.push_str(
        r#"
    <!-- Styles -->
    <Style id="polygonStyle">
      <LineStyle>
        <color>ff00b4a6</color>
        <width>3</width>
      </LineStyle>
      <PolyStyle>
        <color>4000b4a6</color>
      </PolyStyle>
    </Style>

    <Style id="vertexStyle">
      <IconStyle>
        <color>ff1a365d</color>
        <scale>0.8</scale>
        <Icon>
          <href>http://maps.google.com/mapfiles/kml/shapes/placemark_circle.png</href>
        </Icon>
      </IconStyle>
      <LabelStyle>
        <scale>0.8</scale>
      </LabelStyle>
    </Style>

    <!-- Polygon -->
"#,
    );

    kml.push_str("    <Placemark>\n");
    let _ = writeln!(kml, "      <name>{}</name>", name);
    kml.push_str("      <description><![CDATA[\n");
    let _ = writeln!(kml, "        <b>Área:</b> {:.2} m²<br/>", doc.area_computed);
    let _ = writeln!(kml, "        <b>Perímetro:</b> {:.2} m<br/>", doc.perimeter_computed);
    let _ = writeln!(kml, "        <b>Vértices:</b> {}", doc.segments.len());
    kml.push_str("      ]]></description>\n");
    kml.push_str("      <styleUrl>#polygonStyle</styleUrl>\n");
    kml.push_str("      <Polygon>\n        <outerBoundaryIs>\n          <LinearRing>\n");
    let _ = writeln!(kml, "            <coordinates>{}</coordinates>", coords);
    kml.push_str("          </LinearRing>\n        </outerBoundaryIs>\n      </Polygon>\n");
    kml.push_str("    </Placemark>\n\n");

    kml.push_str("    <!-- Vertices -->\n    <Folder>\n      <name>Vértices</name>\n");
    for (i, corner) in corners.iter().enumerate() {
        let segment = doc.segments.get(i);
        let label = segment
            .and_then(Segment::neighbor)
            .map(truncate_label)
            .unwrap_or_else(|| format!("Ponto {}", i + 1));
        let description = segment
            .map(|s| format!("Rumo: {}\nDistância: {:.2}m", s.bearing_raw(), s.distance_m()))
            .unwrap_or_default();

        kml.push_str("    <Placemark>\n");
        let _ = writeln!(kml, "      <name>P{}</name>", i + 1);
        let _ = writeln!(
            kml,
            "      <description><![CDATA[{}<br/>{}]]></description>",
            cdata(&label),
            cdata(&description)
        );
        kml.push_str("      <styleUrl>#vertexStyle</styleUrl>\n");
        kml.push_str("      <Point>\n");
        let _ = writeln!(kml, "        <coordinates>{}</coordinates>", lng_lat(corner));
        kml.push_str("      </Point>\n");
        kml.push_str("    </Placemark>\n");
    }
    kml.push_str("    </Folder>\n  </Document>\n</kml>\n");

    Ok(kml)
}
