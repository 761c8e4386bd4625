// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Quality and confidence classification
//!
//! Maps closure error and the declared-vs-computed area difference to a
//! confidence score, reviewer warnings and a green/yellow/red tier.

use serde::{Deserialize, Serialize};

pub const BASE_CONFIDENCE: u8 = 95;
pub const MIN_CONFIDENCE: u8 = 50;

/// Closure error thresholds in metres
pub const CLOSURE_FAIR_M: f64 = 0.5;
pub const CLOSURE_POOR_M: f64 = 1.0;
pub const CLOSURE_BAD_M: f64 = 2.0;

/// Area difference thresholds in percent
pub const AREA_NOTICE_PCT: f64 = 1.0;
pub const AREA_FAIR_PCT: f64 = 5.0;
pub const AREA_BAD_PCT: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    Closure,
    AreaMismatch,
    MissingSegment,
    LowConfidence,
    AiAssisted,
}

/// Reviewer-facing warning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Warning {
    #[serde(rename = "type")]
    pub kind: WarningKind,
    pub message: String,
    pub severity: Severity,
}

impl Warning {
    pub fn new(kind: WarningKind, message: impl Into<String>, severity: Severity) -> Self {
        Self {
            kind,
            message: message.into(),
            severity,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityLevel {
    Green,
    Yellow,
    Red,
}

impl QualityLevel {
    /// Banner message shown with the tier
    pub fn message(self) -> &'static str {
        match self {
            QualityLevel::Green => "Extração bem-sucedida - polígono válido",
            QualityLevel::Yellow => "Resultado aceitável com ressalvas - verifique os alertas",
            QualityLevel::Red => "Resultado requer revisão manual - inconsistências detectadas",
        }
    }
}

/// Status printed on the technical report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReportStatus {
    #[serde(rename = "APROVADO")]
    Approved,
    #[serde(rename = "APROVADO COM RESSALVAS")]
    ApprovedWithReservations,
    #[serde(rename = "PENDENTE DE REVISÃO")]
    PendingReview,
}

impl ReportStatus {
    pub fn from_confidence(confidence_score: u8) -> Self {
        match confidence_score {
            80..=u8::MAX => ReportStatus::Approved,
            60..=79 => ReportStatus::ApprovedWithReservations,
            _ => ReportStatus::PendingReview,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ReportStatus::Approved => "APROVADO",
            ReportStatus::ApprovedWithReservations => "APROVADO COM RESSALVAS",
            ReportStatus::PendingReview => "PENDENTE DE REVISÃO",
        }
    }
}

/// Score and warnings for one result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityAssessment {
    pub confidence_score: u8,
    pub warnings: Vec<Warning>,
}

/// Tier with the figures that produced it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityIndicator {
    pub level: QualityLevel,
    pub closure_error: f64,
    pub confidence_score: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub area_difference: Option<f64>,
    pub message: String,
}

/// Declared area usable for comparison: present, finite and positive
#[inline]
pub fn usable_declared_area(area_declared: Option<f64>) -> Option<f64> {
    area_declared.filter(|a| a.is_finite() && *a > 0.0)
}

/// `|computed − declared| / declared × 100`, when a usable declared area exists
pub fn area_difference_percent(area_declared: Option<f64>, area_computed: f64) -> Option<f64> {
    let declared = usable_declared_area(area_declared)?;
    Some(((area_computed - declared) / declared * 100.0).abs())
}

/// Base 95, stacked deductions, floor 50
pub fn confidence_score(closure_error: f64, area_difference: Option<f64>) -> u8 {
    let mut confidence = i32::from(BASE_CONFIDENCE);

    if closure_error > CLOSURE_FAIR_M {
        confidence -= 10;
    }
    if closure_error > CLOSURE_POOR_M {
        confidence -= 15;
    }
    if closure_error > CLOSURE_BAD_M {
        confidence -= 20;
    }

    if let Some(diff) = area_difference {
        if diff > AREA_FAIR_PCT {
            confidence -= 10;
        }
        if diff > AREA_BAD_PCT {
            confidence -= 15;
        }
    }

    confidence.max(i32::from(MIN_CONFIDENCE)) as u8
}

/// Closure and area-mismatch warnings, in that order
pub fn generate_warnings(closure_error: f64, area_difference: Option<f64>) -> Vec<Warning> {
    let mut warnings = Vec::new();

    if closure_error > CLOSURE_POOR_M {
        let severity = if closure_error > CLOSURE_BAD_M {
            Severity::Error
        } else {
            Severity::Warning
        };
        warnings.push(Warning::new(
            WarningKind::Closure,
            format!("Erro de fechamento alto: {:.2}m", closure_error),
            severity,
        ));
    }

    if let Some(diff) = area_difference.filter(|d| *d > AREA_NOTICE_PCT) {
        let severity = if diff > AREA_BAD_PCT {
            Severity::Error
        } else if diff > AREA_FAIR_PCT {
            Severity::Warning
        } else {
            Severity::Info
        };
        warnings.push(Warning::new(
            WarningKind::AreaMismatch,
            format!("Área calculada difere {:.2}% da área declarada", diff),
            severity,
        ));
    }

    warnings
}

/// `(closureError, areaDeclared?, areaComputed) -> {confidenceScore, warnings}`
pub fn classify(closure_error: f64, area_declared: Option<f64>, area_computed: f64) -> QualityAssessment {
    let diff = area_difference_percent(area_declared, area_computed);
    QualityAssessment {
        confidence_score: confidence_score(closure_error, diff),
        warnings: generate_warnings(closure_error, diff),
    }
}

/// Tier selection; red is checked before yellow.
pub fn quality_level(closure_error: f64, confidence_score: u8, area_difference: Option<f64>) -> QualityLevel {
    let diff = area_difference.unwrap_or(0.0);
    if closure_error > CLOSURE_POOR_M || confidence_score < 60 || diff > AREA_BAD_PCT {
        QualityLevel::Red
    } else if closure_error > CLOSURE_FAIR_M || confidence_score < 80 || diff > AREA_FAIR_PCT {
        QualityLevel::Yellow
    } else {
        QualityLevel::Green
    }
}

pub fn quality_indicator(
    closure_error: f64,
    confidence_score: u8,
    area_difference: Option<f64>,
) -> QualityIndicator {
    let level = quality_level(closure_error, confidence_score, area_difference);
    QualityIndicator {
        level,
        closure_error,
        confidence_score,
        area_difference,
        message: level.message().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tier(closure_error: f64) -> QualityLevel {
        let assessment = classify(closure_error, None, 0.0);
        quality_level(closure_error, assessment.confidence_score, None)
    }

    #[test]
    fn test_tier_boundaries() {
        assert_eq!(tier(0.49), QualityLevel::Green);
        assert_eq!(tier(0.5), QualityLevel::Green);
        assert_eq!(tier(0.51), QualityLevel::Yellow);
        assert_eq!(tier(1.0), QualityLevel::Yellow);
        assert_eq!(tier(1.01), QualityLevel::Red);
    }

    #[test]
    fn test_confidence_deductions_stack() {
        assert_eq!(confidence_score(0.0, None), 95);
        assert_eq!(confidence_score(0.6, None), 85);
        assert_eq!(confidence_score(1.5, None), 70);
        assert_eq!(confidence_score(2.5, None), 50);
        assert_eq!(confidence_score(0.0, Some(6.0)), 85);
        assert_eq!(confidence_score(0.0, Some(12.0)), 70);
        assert_eq!(confidence_score(0.6, Some(12.0)), 60);
        // floor
        assert_eq!(confidence_score(5.0, Some(50.0)), 50);
    }

    #[test]
    fn test_declared_area_must_be_positive() {
        assert_eq!(area_difference_percent(None, 100.0), None);
        assert_eq!(area_difference_percent(Some(0.0), 100.0), None);
        assert_eq!(area_difference_percent(Some(-10.0), 100.0), None);
        assert_eq!(area_difference_percent(Some(f64::NAN), 100.0), None);
        assert_eq!(area_difference_percent(Some(100.0), 90.0), Some(10.0));
    }

    #[test]
    fn test_warnings() {
        assert!(generate_warnings(0.9, Some(0.5)).is_empty());

        let warnings = generate_warnings(1.5, Some(3.0));
        assert_eq!(warnings.len(), 2);
        assert_eq!(warnings[0].kind, WarningKind::Closure);
        assert_eq!(warnings[0].severity, Severity::Warning);
        assert_eq!(warnings[0].message, "Erro de fechamento alto: 1.50m");
        assert_eq!(warnings[1].kind, WarningKind::AreaMismatch);
        assert_eq!(warnings[1].severity, Severity::Info);
        assert_eq!(warnings[1].message, "Área calculada difere 3.00% da área declarada");

        let warnings = generate_warnings(2.5, Some(7.0));
        assert_eq!(warnings[0].severity, Severity::Error);
        assert_eq!(warnings[1].severity, Severity::Warning);

        let warnings = generate_warnings(0.0, Some(11.0));
        assert_eq!(warnings[0].severity, Severity::Error);
    }

    #[test]
    fn test_red_takes_precedence() {
        // one red criterion plus several yellow ones
        assert_eq!(quality_level(0.6, 70, Some(10.5)), QualityLevel::Red);
        assert_eq!(quality_level(0.0, 59, None), QualityLevel::Red);
        assert_eq!(quality_level(0.0, 79, None), QualityLevel::Yellow);
        assert_eq!(quality_level(0.0, 95, Some(5.5)), QualityLevel::Yellow);
    }

    #[test]
    fn test_indicator_message() {
        let indicator = quality_indicator(0.1, 95, Some(0.2));
        assert_eq!(indicator.level, QualityLevel::Green);
        assert_eq!(indicator.message, "Extração bem-sucedida - polígono válido");
    }

    #[test]
    fn test_report_status() {
        assert_eq!(ReportStatus::from_confidence(95), ReportStatus::Approved);
        assert_eq!(ReportStatus::from_confidence(80), ReportStatus::Approved);
        assert_eq!(ReportStatus::from_confidence(79), ReportStatus::ApprovedWithReservations);
        assert_eq!(ReportStatus::from_confidence(60), ReportStatus::ApprovedWithReservations);
        assert_eq!(ReportStatus::from_confidence(59).label(), "PENDENTE DE REVISÃO");
    }

    #[test]
    fn test_warning_wire_format() {
        let warning = Warning::new(WarningKind::AreaMismatch, "x", Severity::Info);
        let json = serde_json::to_value(&warning).unwrap();
        assert_eq!(json["type"], "area_mismatch");
        assert_eq!(json["severity"], "info");
    }
}
