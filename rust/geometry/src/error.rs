// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use thiserror::Error;

/// Result type for geometry operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during geometry processing
///
/// Reconstruction, metrics and classification are total; only the export
/// generators can fail.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Degenerate polygon: {0}")]
    DegeneratePolygon(String),

    #[error("Coordinate count mismatch: expected {expected}, got {actual}")]
    CoordinateMismatch { expected: usize, actual: usize },

    #[error("Core parser error: {0}")]
    CoreError(#[from] geomatricula_core::Error),
}
