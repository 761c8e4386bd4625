// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Extraction pipeline: segments to a computed, classified and placed parcel.

use geomatricula_core::{
    parse_deflections, scan_memorial, uses_deflections, LatLng, DEFAULT_MAP_CENTER,
};
use geomatricula_geometry::{
    area_difference_percent, centroid, classify, expand_deflections, expand_urban_dimensions,
    place_on_map, quality_indicator, PolygonMetrics, ReportStatus, Segment, Severity, Traverse,
    Warning, WarningKind,
};
use rayon::prelude::*;

use crate::types::{ExtractedMatricula, ExtractionMethod, ParcelOutcome, ParcelResult, PropertyType};

/// Reconstruct, measure and classify one traverse.
///
/// Beyond the classifier warnings, flags an empty traverse, legs without a
/// distance, bearings read only by the fallbacks, and oracle provenance.
pub fn compute_parcel(
    segments: Vec<Segment>,
    area_declared: Option<f64>,
    method: ExtractionMethod,
) -> ParcelResult {
    let traverse = Traverse::new(segments);
    let metrics = PolygonMetrics::of(&traverse);
    let assessment = classify(metrics.closure_error, area_declared, metrics.area);
    let area_difference = area_difference_percent(area_declared, metrics.area);

    let mut warnings = assessment.warnings;

    if traverse.is_empty() {
        warnings.push(Warning::new(
            WarningKind::MissingSegment,
            "Nenhum segmento extraído - o polígono não pôde ser reconstruído",
            Severity::Error,
        ));
    }

    for segment in traverse.segments() {
        if segment.distance_m() == 0.0 {
            warnings.push(Warning::new(
                WarningKind::MissingSegment,
                format!("Segmento {} sem distância", segment.index()),
                Severity::Warning,
            ));
        }
        if !segment.notation().is_structured() {
            tracing::warn!(
                index = segment.index(),
                bearing = %segment.bearing_raw(),
                azimuth = segment.bearing_azimuth(),
                "Bearing read by fallback"
            );
            warnings.push(Warning::new(
                WarningKind::LowConfidence,
                format!(
                    "Rumo do segmento {} não reconhecido (\"{}\"), azimute assumido {:.2}°",
                    segment.index(),
                    segment.bearing_raw(),
                    segment.bearing_azimuth()
                ),
                Severity::Info,
            ));
        }
    }

    if method != ExtractionMethod::Regex {
        warnings.push(Warning::new(
            WarningKind::AiAssisted,
            "Dados extraídos com auxílio de IA - confira com a matrícula original",
            Severity::Info,
        ));
    }

    tracing::debug!(
        segments = traverse.len(),
        area = metrics.area,
        perimeter = metrics.perimeter,
        closure_error = metrics.closure_error,
        confidence = assessment.confidence_score,
        "Parcel computed"
    );

    let vertices = traverse.vertices().iter().map(|p| [p.x, p.y]).collect();

    ParcelResult {
        segments: traverse.into_segments(),
        vertices,
        area_declared,
        area_computed: metrics.area,
        perimeter_computed: metrics.perimeter,
        closure_error: metrics.closure_error,
        closure_ratio: metrics.closure_ratio,
        confidence_score: assessment.confidence_score,
        warnings,
        extraction_method: method,
        quality: quality_indicator(metrics.closure_error, assessment.confidence_score, area_difference),
        report_status: ReportStatus::from_confidence(assessment.confidence_score),
    }
}

/// Polygon corners of a result placed around `anchor`
pub fn map_coordinates(result: &ParcelResult, anchor: LatLng) -> Vec<LatLng> {
    let corners = result.traverse().corners();
    place_on_map(&corners, anchor)
}

fn outcome(result: ParcelResult, anchor: Option<LatLng>, property_type: PropertyType) -> ParcelOutcome {
    let map_coordinates = map_coordinates(&result, anchor.unwrap_or(DEFAULT_MAP_CENTER));
    let map_center = centroid(&map_coordinates)
        .or(anchor)
        .unwrap_or(DEFAULT_MAP_CENTER);
    ParcelOutcome {
        result,
        anchor,
        map_center,
        map_coordinates,
        property_type,
    }
}

/// Segments of an extraction: explicit segments first, then urban dimensions.
pub fn extraction_segments(extraction: &ExtractedMatricula) -> Vec<Segment> {
    if !extraction.segments.is_empty() {
        return Traverse::from_inputs(extraction.segments.iter().cloned()).into_segments();
    }
    match &extraction.urban_dimensions {
        Some(dimensions) if dimensions.has_dimensions() => expand_urban_dimensions(dimensions),
        _ => Vec::new(),
    }
}

/// Run the pipeline on one coerced oracle extraction.
///
/// `fallback_state` is used for zone inference when the extraction names no
/// state of its own.
pub fn process_extraction(
    extraction: &ExtractedMatricula,
    method: ExtractionMethod,
    fallback_state: Option<&str>,
) -> ParcelOutcome {
    let segments = extraction_segments(extraction);
    let result = compute_parcel(segments, extraction.area_declared, method);

    let state = extraction.state.as_deref().or(fallback_state);
    let anchor = extraction
        .utm_coordinates
        .as_ref()
        .and_then(|utm| {
            let resolved = utm.resolve(state);
            if resolved.is_none() && utm.first_vertex.is_some() {
                tracing::warn!(?utm, state = ?state, "UTM anchor rejected by sanity bounds");
            }
            resolved
        });

    tracing::info!(
        matricula = ?extraction.matricula,
        segments = result.segments().len(),
        area = result.area_computed(),
        closure_error = result.closure_error(),
        confidence = result.confidence_score(),
        georeferenced = anchor.is_some(),
        "Extraction processed"
    );

    outcome(result, anchor, extraction.resolved_property_type())
}

/// Independent extractions in parallel, in input order
pub fn process_batch(
    extractions: &[ExtractedMatricula],
    method: ExtractionMethod,
    fallback_state: Option<&str>,
) -> Vec<ParcelOutcome> {
    let start = std::time::Instant::now();
    let outcomes: Vec<ParcelOutcome> = extractions
        .par_iter()
        .map(|extraction| process_extraction(extraction, method, fallback_state))
        .collect();

    tracing::info!(
        count = outcomes.len(),
        time_ms = start.elapsed().as_millis(),
        "Batch processed"
    );
    outcomes
}

/// Segments read from deed prose.
///
/// Bearing legs win. The deflection parser takes over only when the scanner
/// finds no legs or the text has more "deflete" steps than scanned legs.
pub fn memorial_segments(text: &str) -> (Vec<Segment>, PropertyType) {
    let legs = scan_memorial(text);

    if uses_deflections(text) {
        let steps = parse_deflections(text);
        if steps.len() > legs.len() {
            tracing::debug!(steps = steps.len(), legs = legs.len(), "Deflection description");
            return (expand_deflections(&steps), PropertyType::Urbano);
        }
    }

    let segments = legs
        .into_iter()
        .enumerate()
        .map(|(i, leg)| {
            let segment = Segment::new(i as u32 + 1, leg.bearing_raw, leg.distance_m)
                .with_source_text(leg.source_text);
            match leg.confrontation {
                Some(neighbor) => segment.with_neighbor(neighbor),
                None => segment,
            }
        })
        .collect();
    (segments, PropertyType::Rural)
}

/// Scan deed text and run the pipeline with `extractionMethod = regex`.
///
/// Deed text is never georeferenced: UTM readings in the prose are not
/// scanned, so the outcome has no anchor and the polygon is placed around
/// the default map centre. Use [`process_extraction`] with `utmCoordinates`
/// to place a parcel.
pub fn process_memorial_text(text: &str, area_declared: Option<f64>) -> ParcelOutcome {
    let (segments, property_type) = memorial_segments(text);
    let result = compute_parcel(segments, area_declared, ExtractionMethod::Regex);

    tracing::info!(
        segments = result.segments().len(),
        area = result.area_computed(),
        confidence = result.confidence_score(),
        "Memorial text processed"
    );

    outcome(result, None, property_type)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use geomatricula_core::{UtmAnchor, UtmVertex};
    use geomatricula_geometry::{QualityLevel, SegmentInput, UrbanDimensions};

    fn square_inputs() -> Vec<SegmentInput> {
        ["Az 90°", "Az 0°", "Az 270°", "Az 180°"]
            .iter()
            .map(|bearing| SegmentInput {
                bearing_raw: bearing.to_string(),
                distance_m: 20.0,
                ..SegmentInput::default()
            })
            .collect()
    }

    #[test]
    fn test_compute_closed_square() {
        let segments = Traverse::from_inputs(square_inputs()).into_segments();
        let result = compute_parcel(segments, Some(400.0), ExtractionMethod::Regex);

        assert_abs_diff_eq!(result.area_computed(), 400.0, epsilon = 1e-9);
        assert_abs_diff_eq!(result.perimeter_computed(), 80.0);
        assert!(result.closure_error() < 1e-9);
        assert_eq!(result.closure_ratio(), None);
        assert_eq!(result.confidence_score(), 95);
        assert!(result.warnings().is_empty());
        assert_eq!(result.quality().level, QualityLevel::Green);
        assert_eq!(result.report_status(), ReportStatus::Approved);
        assert_eq!(result.vertices().len(), 5);
    }

    #[test]
    fn test_pipeline_warnings() {
        let segments = vec![
            Segment::new(1, "Az 90°", 10.0),
            Segment::new(2, "rumo ilegível", 10.0),
            Segment::new(3, "Az 270°", 0.0),
        ];
        let result = compute_parcel(segments, None, ExtractionMethod::Ai);
        let kinds: Vec<WarningKind> = result.warnings().iter().map(|w| w.kind).collect();

        assert!(kinds.contains(&WarningKind::MissingSegment));
        assert!(kinds.contains(&WarningKind::LowConfidence));
        assert_eq!(kinds.last(), Some(&WarningKind::AiAssisted));
    }

    #[test]
    fn test_empty_traverse() {
        let result = compute_parcel(Vec::new(), Some(100.0), ExtractionMethod::Regex);
        assert_eq!(result.area_computed(), 0.0);
        assert_eq!(result.warnings()[0].kind, WarningKind::AreaMismatch);
        assert!(result
            .warnings()
            .iter()
            .any(|w| w.kind == WarningKind::MissingSegment && w.severity == Severity::Error));
    }

    #[test]
    fn test_extraction_prefers_segments() {
        let extraction = ExtractedMatricula {
            segments: square_inputs(),
            urban_dimensions: Some(UrbanDimensions {
                front: Some(1.0),
                ..UrbanDimensions::default()
            }),
            ..ExtractedMatricula::default()
        };
        let outcome = process_extraction(&extraction, ExtractionMethod::Ai, None);
        assert_abs_diff_eq!(outcome.result.area_computed(), 400.0, epsilon = 1e-9);
        assert_eq!(outcome.property_type, PropertyType::Rural);
    }

    #[test]
    fn test_extraction_urban_fallback() {
        let extraction = ExtractedMatricula {
            urban_dimensions: Some(UrbanDimensions {
                front: Some(10.0),
                right_side: Some(5.0),
                ..UrbanDimensions::default()
            }),
            ..ExtractedMatricula::default()
        };
        let outcome = process_extraction(&extraction, ExtractionMethod::Ai, None);
        assert_eq!(outcome.result.segments().len(), 4);
        assert_abs_diff_eq!(outcome.result.area_computed(), 50.0, epsilon = 1e-9);
        assert_eq!(outcome.property_type, PropertyType::Urbano);
        assert_eq!(outcome.anchor, None);
        assert_eq!(outcome.map_coordinates.len(), 4);
        assert_eq!(outcome.map_coordinates[0], DEFAULT_MAP_CENTER);
    }

    #[test]
    fn test_extraction_georeferenced() {
        let extraction = ExtractedMatricula {
            segments: square_inputs(),
            utm_coordinates: Some(UtmAnchor {
                zone: None,
                hemisphere: None,
                first_vertex: Some(UtmVertex { n: 7_394_000.0, e: 333_000.0 }),
            }),
            ..ExtractedMatricula::default()
        };
        let outcome = process_extraction(&extraction, ExtractionMethod::Ai, Some("SP"));
        let anchor = outcome.anchor.unwrap();
        assert_abs_diff_eq!(anchor.lat, -23.5558, epsilon = 1e-3);
        assert_abs_diff_eq!(anchor.lng, -46.6362, epsilon = 1e-3);
        assert_eq!(outcome.map_coordinates[0], anchor);
        assert!(outcome.map_center.lat > anchor.lat);
    }

    #[test]
    fn test_extraction_rejected_anchor_falls_back() {
        let extraction = ExtractedMatricula {
            segments: square_inputs(),
            utm_coordinates: Some(UtmAnchor {
                zone: Some(23),
                hemisphere: None,
                first_vertex: Some(UtmVertex { n: 7_000_000.0, e: 50_000.0 }),
            }),
            ..ExtractedMatricula::default()
        };
        let outcome = process_extraction(&extraction, ExtractionMethod::Ai, None);
        assert_eq!(outcome.anchor, None);
        assert_eq!(outcome.map_coordinates[0], DEFAULT_MAP_CENTER);
    }

    #[test]
    fn test_batch_keeps_order() {
        let extractions: Vec<ExtractedMatricula> = (1..=8)
            .map(|i| ExtractedMatricula {
                urban_dimensions: Some(UrbanDimensions {
                    front: Some(f64::from(i)),
                    right_side: Some(10.0),
                    ..UrbanDimensions::default()
                }),
                ..ExtractedMatricula::default()
            })
            .collect();
        let outcomes = process_batch(&extractions, ExtractionMethod::Ai, None);
        assert_eq!(outcomes.len(), 8);
        for (i, outcome) in outcomes.iter().enumerate() {
            assert_abs_diff_eq!(outcome.result.area_computed(), (i as f64 + 1.0) * 10.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_memorial_bearings() {
        let text = "Inicia no marco M1; segue N 0°00'00\" E por 20,00 metros, confrontando com Rua A; \
                    segue S 90°00'00\" E por 20,00 metros, confrontando com Lote 3; \
                    segue S 0°00'00\" E por 20,00 metros; segue N 90°00'00\" W por 20,00 metros, \
                    até o marco inicial.";
        let outcome = process_memorial_text(text, Some(400.0));
        let result = &outcome.result;

        assert_eq!(result.segments().len(), 4);
        assert_eq!(result.extraction_method(), ExtractionMethod::Regex);
        assert_eq!(result.segments()[0].neighbor(), Some("Rua A"));
        assert_abs_diff_eq!(result.area_computed(), 400.0, epsilon = 1e-6);
        assert_eq!(result.confidence_score(), 95);
        assert_eq!(outcome.property_type, PropertyType::Rural);
    }

    #[test]
    fn test_memorial_deflections() {
        let text = "Mede 12,00 metros de frente, deflete à esquerda 8,50 metros, \
                    deflete à esquerda 12,00 metros, deflete à esquerda 8,50 metros.";
        let outcome = process_memorial_text(text, None);
        assert_eq!(outcome.property_type, PropertyType::Urbano);
        assert_eq!(outcome.result.segments().len(), 4);
        assert_abs_diff_eq!(outcome.result.area_computed(), 102.0, epsilon = 1e-6);
        assert!(outcome.result.closure_error() < 1e-6);
    }

    #[test]
    fn test_memorial_bearings_win_over_stray_deflection() {
        let text = "Inicia no marco M1; segue N 0°00'00\" E por 20,00 metros; \
                    segue S 90°00'00\" E por 20,00 metros; dai deflete e segue \
                    S 0°00'00\" E por 20,00 metros; segue N 90°00'00\" W por 20,00 metros, \
                    até o marco inicial.";
        let (segments, property_type) = memorial_segments(text);
        assert_eq!(segments.len(), 4);
        assert_eq!(property_type, PropertyType::Rural);

        let outcome = process_memorial_text(text, Some(400.0));
        assert_abs_diff_eq!(outcome.result.area_computed(), 400.0, epsilon = 1e-6);
    }

    #[test]
    fn test_memorial_text_is_not_georeferenced() {
        let text = "Inicia no vértice de coordenadas UTM E=333000,00 e N=7394000,00; \
                    segue N 0°00'00\" E por 20,00 metros; segue S 90°00'00\" E por 20,00 metros; \
                    segue S 0°00'00\" E por 20,00 metros; segue N 90°00'00\" W por 20,00 metros.";
        let outcome = process_memorial_text(text, None);
        assert_eq!(outcome.anchor, None);
        assert_eq!(outcome.map_coordinates.len(), 4);
    }

    #[test]
    fn test_result_roundtrips_through_snapshot() {
        let segments = Traverse::from_inputs(square_inputs()).into_segments();
        let result = compute_parcel(segments, Some(390.0), ExtractionMethod::Hybrid);
        let json = serde_json::to_string(&result).unwrap();
        let back: ParcelResult = serde_json::from_str(&json).unwrap();
        assert_eq!(back, result);
    }
}
