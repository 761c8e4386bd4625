// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! HTTP handlers.

pub mod export;
pub mod georef;
pub mod health;
pub mod parcel;
pub mod projects;
