// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the processing pipeline.

use thiserror::Error;

/// Result type alias for processing operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised at the boundaries of the pipeline.
///
/// Extraction and computation never fail; these cover revision payloads,
/// revision transitions, exports and the project store.
#[derive(Error, Debug)]
pub enum Error {
    /// Payload of the wrong shape (not an array, non-object entries, ...).
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    /// Segment array that is not a full replacement.
    #[error("Partial revision rejected: {0}")]
    PartialRevision(String),

    /// Confirm/reject naming a proposal that is not the live one.
    #[error("Proposal {requested} is not the pending proposal")]
    ProposalMismatch { requested: String },

    /// Event not accepted in the current revision state.
    #[error("Invalid transition: {event} while {state}")]
    InvalidTransition {
        state: &'static str,
        event: &'static str,
    },

    #[error("Project not found: {0}")]
    NotFound(String),

    #[error("Repository error: {0}")]
    Repository(String),

    #[error("Geometry error: {0}")]
    Geometry(#[from] geomatricula_geometry::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
