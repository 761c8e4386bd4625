// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Audit records of segment revisions.
//!
//! The revision protocol only builds records; where they go is up to the
//! host, through an [`AuditSink`].

use std::sync::Mutex;

use geomatricula_geometry::Segment;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    /// Safe proposal applied directly
    Applied,
    /// Risky proposal accepted by the user
    Confirmed,
    /// Risky proposal cancelled by the user
    Rejected,
    /// Pending proposal replaced by a newer one
    Superseded,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditRecord {
    pub proposal_id: String,
    pub action: AuditAction,
    pub before: Vec<Segment>,
    /// Equal to `before` for rejected and superseded proposals
    pub after: Vec<Segment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub change_description: Option<String>,
    pub risk_acknowledged: bool,
}

/// Destination of audit records
pub trait AuditSink: Send + Sync {
    fn record(&self, project_id: &str, record: &AuditRecord);
}

/// Emits every record as a `tracing` event on the `audit` target
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn record(&self, project_id: &str, record: &AuditRecord) {
        tracing::info!(
            target: "audit",
            project_id = %project_id,
            proposal_id = %record.proposal_id,
            action = ?record.action,
            segments_before = record.before.len(),
            segments_after = record.after.len(),
            risk_acknowledged = record.risk_acknowledged,
            change_description = record.change_description.as_deref().unwrap_or(""),
            "Segment revision"
        );
    }
}

/// Keeps records in memory
#[derive(Debug, Default)]
pub struct MemoryAuditSink {
    records: Mutex<Vec<(String, AuditRecord)>>,
}

impl MemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records so far, oldest first
    pub fn records(&self) -> Vec<(String, AuditRecord)> {
        self.records
            .lock()
            .map(|records| records.clone())
            .unwrap_or_default()
    }
}

impl AuditSink for MemoryAuditSink {
    fn record(&self, project_id: &str, record: &AuditRecord) {
        if let Ok(mut records) = self.records.lock() {
            records.push((project_id.to_string(), record.clone()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(action: AuditAction) -> AuditRecord {
        AuditRecord {
            proposal_id: "abc".into(),
            action,
            before: vec![Segment::new(1, "Az 0°", 1.0)],
            after: Vec::new(),
            change_description: None,
            risk_acknowledged: false,
        }
    }

    #[test]
    fn test_memory_sink_keeps_order() {
        let sink = MemoryAuditSink::new();
        sink.record("p1", &record(AuditAction::Superseded));
        sink.record("p1", &record(AuditAction::Confirmed));
        let records = sink.records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].1.action, AuditAction::Superseded);
        assert_eq!(records[1].0, "p1");
    }

    #[test]
    fn test_tracing_sink_does_not_panic() {
        TracingAuditSink.record("p1", &record(AuditAction::Applied));
    }

    #[test]
    fn test_wire_names() {
        let value = serde_json::to_value(record(AuditAction::Rejected)).unwrap();
        assert_eq!(value["action"], "rejected");
        assert_eq!(value["riskAcknowledged"], false);
        assert_eq!(value["proposalId"], "abc");
        assert!(value.get("changeDescription").is_none());
    }
}
