// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Shared processing pipeline used by the server.
//!
//! Takes oracle output or deed text, coerces it at the boundary, runs the
//! geometry engine and wraps the result in the revision protocol.

pub mod audit;
pub mod coerce;
pub mod error;
pub mod export;
pub mod pipeline;
pub mod repository;
pub mod revision;
pub mod types;

pub use audit::{AuditAction, AuditRecord, AuditSink, MemoryAuditSink, TracingAuditSink};
pub use coerce::{
    coerce_extraction, coerce_segment, coerce_segments, extract_json_payload, lenient_number,
    RevisionResponse,
};
pub use error::{Error, Result};
pub use export::{export_dxf, export_kml, ExportFile, DXF_CONTENT_TYPE, KML_CONTENT_TYPE};
pub use pipeline::{
    compute_parcel, extraction_segments, map_coordinates, memorial_segments, process_batch,
    process_extraction, process_memorial_text,
};
pub use repository::{InMemoryRepository, ProjectRecord, ProjectRepository};
pub use revision::{
    proposal_id, reduce, revision_segments, ParcelEditor, Proposal, RevisionEvent,
    RevisionOutcome, RevisionState, RevisionStatus, MIN_REVISION_SEGMENTS,
};
pub use types::{
    ExtractedMatricula, ExtractionMethod, ParcelOutcome, ParcelResult, ParcelSnapshot,
    PropertyType, Vertex,
};
