// SPDX-FileCopyrightText: 2026 All contributors
//
// SPDX-License-Identifier: GPL-2.0-or-later

use serde::{Deserialize, Serialize};
use strum_macros::Display;

/// Outcome of every asynchronous adapter operation as seen by a client.
///
/// This is a status value and not a Rust error: `Success` is a regular outcome
/// that is delivered through the same response callbacks as the failures.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
pub enum LocationError {
    #[default]
    Success,
    GeneralFailure,
    /// The client registered no callback able to receive the requested data.
    CallbackMissing,
    /// Malformed options, bad assistance server type or an unresolvable host.
    InvalidParameter,
    /// The referenced session or request id does not exist or already resolved.
    IdUnknown,
    AlreadyStarted,
    NotSupported,
}

impl LocationError {
    pub fn is_success(self) -> bool {
        self == LocationError::Success
    }
}

/// A single terminal resolution for one session id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Response {
    pub id: u32,
    pub error: LocationError,
}

impl Response {
    pub fn new(id: u32, error: LocationError) -> Self {
        Response { id, error }
    }
}
