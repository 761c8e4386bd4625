// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Segment revision protocol.
//!
//! A proposal is always a full replacement of the segment array. Safe
//! proposals apply at once; risky ones wait for a confirm or reject. At most
//! one proposal is pending per parcel: a new one supersedes it.
//!
//! ```text
//! Proposed --submit--> Safe                       (terminal)
//!          --submit--> PendingConfirmation --confirm--> Confirmed   (terminal)
//!                                          --reject---> Rejected    (terminal)
//!                                          --supersede-> Superseded (terminal)
//! ```

use geomatricula_geometry::{Segment, SegmentInput, Traverse};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::audit::{AuditAction, AuditRecord};
use crate::coerce::{coerce_segment, RevisionResponse};
use crate::error::{Error, Result};
use crate::pipeline::compute_parcel;
use crate::types::ParcelResult;

/// Minimum size of a replacement traverse
pub const MIN_REVISION_SEGMENTS: usize = 3;

/// Validate a replacement segment array and rebuild its segments from the
/// authored fields only.
///
/// Rejected when it is not an array, is empty or shorter than
/// [`MIN_REVISION_SEGMENTS`], holds a non-object entry, or its indices are
/// not exactly `1..=n` (entries without an index take their position).
pub fn revision_segments(value: &Value) -> Result<Vec<Segment>> {
    let entries = value
        .as_array()
        .ok_or_else(|| Error::InvalidPayload("updatedSegments must be an array".into()))?;

    if entries.is_empty() {
        return Err(Error::PartialRevision("empty segment array".into()));
    }
    if entries.len() < MIN_REVISION_SEGMENTS {
        return Err(Error::PartialRevision(format!(
            "{} segments cannot close a polygon, a full replacement needs at least {}",
            entries.len(),
            MIN_REVISION_SEGMENTS
        )));
    }

    let mut inputs: Vec<SegmentInput> = Vec::with_capacity(entries.len());
    for (position, entry) in entries.iter().enumerate() {
        let mut input = coerce_segment(entry).ok_or_else(|| {
            Error::InvalidPayload(format!("segment at position {} is not an object", position + 1))
        })?;
        input.index = input.index.or(Some(position as u32 + 1));
        inputs.push(input);
    }

    let mut indices: Vec<u32> = inputs.iter().filter_map(|input| input.index).collect();
    indices.sort_unstable();
    let expected = 1..=inputs.len() as u32;
    if !indices.iter().copied().eq(expected) {
        return Err(Error::PartialRevision(format!(
            "indices {:?} are not 1..={}",
            indices,
            inputs.len()
        )));
    }

    Ok(Traverse::from_inputs(inputs).into_segments())
}

/// Content hash of a proposal: SHA-256 of the authored segment fields plus
/// the change description
pub fn proposal_id(segments: &[Segment], change_description: Option<&str>) -> String {
    let inputs: Vec<SegmentInput> = segments.iter().map(Segment::to_input).collect();
    let mut hasher = Sha256::new();
    // Vec<SegmentInput> always serializes
    hasher.update(serde_json::to_vec(&inputs).unwrap_or_default());
    hasher.update([0u8]);
    hasher.update(change_description.unwrap_or_default().as_bytes());
    hex::encode(hasher.finalize())
}

/// One replacement segment array
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Proposal {
    pub id: String,
    pub segments: Vec<Segment>,
    pub requires_confirmation: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub change_description: Option<String>,
}

impl Proposal {
    /// Validated proposal from an oracle answer; `Ok(None)` when the answer
    /// carries no segments.
    pub fn from_response(response: &RevisionResponse) -> Result<Option<Self>> {
        let Some(raw) = &response.updated_segments else {
            return Ok(None);
        };
        let segments = revision_segments(raw)?;
        Ok(Some(Self {
            id: proposal_id(&segments, response.change_description.as_deref()),
            segments,
            requires_confirmation: response.requires_confirmation,
            warning_message: response.warning_message.clone(),
            change_description: response.change_description.clone(),
        }))
    }
}

/// State of one proposal
#[derive(Debug, Clone, PartialEq)]
pub enum RevisionState {
    Proposed(Proposal),
    Safe(Proposal),
    PendingConfirmation(Proposal),
    Confirmed(Proposal),
    Rejected(Proposal),
    Superseded(Proposal),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevisionEvent {
    /// Route by the oracle's `requiresConfirmation`
    Submit,
    Confirm,
    Reject,
    /// A newer proposal arrived for the same parcel
    Supersede,
}

impl RevisionState {
    pub fn name(&self) -> &'static str {
        match self {
            RevisionState::Proposed(_) => "proposed",
            RevisionState::Safe(_) => "safe",
            RevisionState::PendingConfirmation(_) => "pending_confirmation",
            RevisionState::Confirmed(_) => "confirmed",
            RevisionState::Rejected(_) => "rejected",
            RevisionState::Superseded(_) => "superseded",
        }
    }

    pub fn proposal(&self) -> &Proposal {
        match self {
            RevisionState::Proposed(p)
            | RevisionState::Safe(p)
            | RevisionState::PendingConfirmation(p)
            | RevisionState::Confirmed(p)
            | RevisionState::Rejected(p)
            | RevisionState::Superseded(p) => p,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(
            self,
            RevisionState::Proposed(_) | RevisionState::PendingConfirmation(_)
        )
    }

    /// True when the proposal's segments replace the current ones
    pub fn applies(&self) -> bool {
        matches!(self, RevisionState::Safe(_) | RevisionState::Confirmed(_))
    }
}

impl RevisionEvent {
    fn name(self) -> &'static str {
        match self {
            RevisionEvent::Submit => "submit",
            RevisionEvent::Confirm => "confirm",
            RevisionEvent::Reject => "reject",
            RevisionEvent::Supersede => "supersede",
        }
    }
}

/// Pure transition function. Terminal states accept no event.
pub fn reduce(state: RevisionState, event: RevisionEvent) -> Result<RevisionState> {
    match (state, event) {
        (RevisionState::Proposed(p), RevisionEvent::Submit) => Ok(if p.requires_confirmation {
            RevisionState::PendingConfirmation(p)
        } else {
            RevisionState::Safe(p)
        }),
        (RevisionState::PendingConfirmation(p), RevisionEvent::Confirm) => {
            Ok(RevisionState::Confirmed(p))
        }
        (RevisionState::PendingConfirmation(p), RevisionEvent::Reject) => {
            Ok(RevisionState::Rejected(p))
        }
        (RevisionState::PendingConfirmation(p), RevisionEvent::Supersede) => {
            Ok(RevisionState::Superseded(p))
        }
        (state, event) => Err(Error::InvalidTransition {
            state: state.name(),
            event: event.name(),
        }),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RevisionStatus {
    /// The answer carried no segments
    Unchanged,
    Applied,
    PendingConfirmation,
    Confirmed,
    Rejected,
}

/// What a revision request did
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RevisionOutcome {
    pub status: RevisionStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proposal_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub change_description: Option<String>,
    /// Result after the request (the unchanged current result while pending)
    pub result: ParcelResult,
    /// What the parcel would look like if the pending proposal is confirmed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview: Option<ParcelResult>,
    /// Records for the audit sink, oldest first
    pub audit: Vec<AuditRecord>,
}

/// Current result of one parcel plus its pending proposal, if any
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParcelEditor {
    current: ParcelResult,
    pending: Option<Proposal>,
}

impl ParcelEditor {
    pub fn new(current: ParcelResult) -> Self {
        Self {
            current,
            pending: None,
        }
    }

    #[inline]
    pub fn current(&self) -> &ParcelResult {
        &self.current
    }

    #[inline]
    pub fn pending(&self) -> Option<&Proposal> {
        self.pending.as_ref()
    }

    fn recompute(&self, segments: Vec<Segment>) -> ParcelResult {
        compute_parcel(
            segments,
            self.current.area_declared(),
            self.current.extraction_method().revised(),
        )
    }

    fn record(&self, proposal: &Proposal, action: AuditAction, after: Vec<Segment>) -> AuditRecord {
        AuditRecord {
            proposal_id: proposal.id.clone(),
            action,
            before: self.current.segments().to_vec(),
            after,
            change_description: proposal.change_description.clone(),
            risk_acknowledged: action == AuditAction::Confirmed,
        }
    }

    /// Take a new proposal from an oracle answer.
    ///
    /// A malformed segment array rejects the whole answer and leaves the
    /// editor untouched, including any pending proposal.
    pub fn propose(&mut self, response: &RevisionResponse) -> Result<RevisionOutcome> {
        let Some(proposal) = Proposal::from_response(response)? else {
            return Ok(RevisionOutcome {
                status: RevisionStatus::Unchanged,
                proposal_id: None,
                warning_message: None,
                change_description: None,
                result: self.current.clone(),
                preview: None,
                audit: Vec::new(),
            });
        };

        let mut audit = Vec::new();
        if let Some(previous) = self.pending.take() {
            let superseded = reduce(RevisionState::PendingConfirmation(previous), RevisionEvent::Supersede)?;
            tracing::debug!(proposal_id = %superseded.proposal().id, "Pending proposal superseded");
            audit.push(self.record(
                superseded.proposal(),
                AuditAction::Superseded,
                self.current.segments().to_vec(),
            ));
        }

        match reduce(RevisionState::Proposed(proposal), RevisionEvent::Submit)? {
            RevisionState::Safe(proposal) => {
                let result = self.recompute(proposal.segments.clone());
                audit.push(self.record(&proposal, AuditAction::Applied, result.segments().to_vec()));
                tracing::info!(
                    proposal_id = %proposal.id,
                    segments = result.segments().len(),
                    area = result.area_computed(),
                    confidence = result.confidence_score(),
                    "Revision applied"
                );
                self.current = result;
                Ok(RevisionOutcome {
                    status: RevisionStatus::Applied,
                    proposal_id: Some(proposal.id),
                    warning_message: proposal.warning_message,
                    change_description: proposal.change_description,
                    result: self.current.clone(),
                    preview: None,
                    audit,
                })
            }
            RevisionState::PendingConfirmation(proposal) => {
                let preview = self.recompute(proposal.segments.clone());
                tracing::info!(proposal_id = %proposal.id, "Revision awaiting confirmation");
                let outcome = RevisionOutcome {
                    status: RevisionStatus::PendingConfirmation,
                    proposal_id: Some(proposal.id.clone()),
                    warning_message: proposal.warning_message.clone(),
                    change_description: proposal.change_description.clone(),
                    result: self.current.clone(),
                    preview: Some(preview),
                    audit,
                };
                self.pending = Some(proposal);
                Ok(outcome)
            }
            other => Err(Error::InvalidTransition {
                state: other.name(),
                event: RevisionEvent::Submit.name(),
            }),
        }
    }

    fn take_pending(&mut self, proposal_id: &str, event: RevisionEvent) -> Result<Proposal> {
        match &self.pending {
            None => Err(Error::InvalidTransition {
                state: "idle",
                event: event.name(),
            }),
            Some(pending) if pending.id != proposal_id => Err(Error::ProposalMismatch {
                requested: proposal_id.to_string(),
            }),
            Some(_) => self.pending.take().ok_or(Error::InvalidTransition {
                state: "idle",
                event: event.name(),
            }),
        }
    }

    /// Accept the pending proposal; metrics are recomputed on the way in.
    pub fn confirm(&mut self, proposal_id: &str) -> Result<RevisionOutcome> {
        let pending = self.take_pending(proposal_id, RevisionEvent::Confirm)?;
        let state = reduce(RevisionState::PendingConfirmation(pending), RevisionEvent::Confirm)?;
        let proposal = state.proposal().clone();

        let result = self.recompute(proposal.segments.clone());
        let record = self.record(&proposal, AuditAction::Confirmed, result.segments().to_vec());
        tracing::info!(
            proposal_id = %proposal.id,
            area = result.area_computed(),
            confidence = result.confidence_score(),
            "Revision confirmed"
        );
        self.current = result;

        Ok(RevisionOutcome {
            status: RevisionStatus::Confirmed,
            proposal_id: Some(proposal.id),
            warning_message: proposal.warning_message,
            change_description: proposal.change_description,
            result: self.current.clone(),
            preview: None,
            audit: vec![record],
        })
    }

    /// Discard the pending proposal; the current result is kept.
    pub fn reject(&mut self, proposal_id: &str) -> Result<RevisionOutcome> {
        let pending = self.take_pending(proposal_id, RevisionEvent::Reject)?;
        let state = reduce(RevisionState::PendingConfirmation(pending), RevisionEvent::Reject)?;
        let proposal = state.proposal();

        let record = self.record(proposal, AuditAction::Rejected, self.current.segments().to_vec());
        tracing::info!(proposal_id = %proposal.id, "Revision rejected");

        Ok(RevisionOutcome {
            status: RevisionStatus::Rejected,
            proposal_id: Some(proposal.id.clone()),
            warning_message: proposal.warning_message.clone(),
            change_description: proposal.change_description.clone(),
            result: self.current.clone(),
            preview: None,
            audit: vec![record],
        })
    }
}
