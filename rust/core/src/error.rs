// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the core parsers.

use thiserror::Error;

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the strict constructors of the core types.
///
/// The bearing parser and the deed scanner are total and never produce these;
/// they only surface when a caller asks for validated georeferencing input.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Hemisphere text other than `N`/`S` (or the spelled-out forms).
    #[error("invalid hemisphere: {0:?}")]
    InvalidHemisphere(String),

    /// UTM zones are numbered 1 to 60.
    #[error("invalid UTM zone: {0}")]
    InvalidZone(i64),

    /// A coordinate that is not a finite number.
    #[error("non-finite coordinate: {0}")]
    NonFiniteCoordinate(&'static str),
}
