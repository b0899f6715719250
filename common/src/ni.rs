// SPDX-FileCopyrightText: 2026 All contributors
//
// SPDX-License-Identifier: GPL-2.0-or-later

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use strum_macros::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display)]
pub enum GnssNiType {
    #[default]
    Voice,
    SuplSession,
    ControlPlane,
    EmergencySupl,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display)]
pub enum GnssNiResponse {
    Accept,
    Deny,
    #[default]
    NoResponse,
    /// Resolves the request without telling the engine anything.
    Ignore,
}

bitflags! {
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct GnssNiOptions: u32 {
        const NOTIFICATION = 1 << 0;
        const VERIFICATION = 1 << 1;
        const PRIVACY_OVERRIDE = 1 << 2;
    }
}

/// A network initiated positioning request that needs user consent.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GnssNiNotification {
    pub ni_type: GnssNiType,
    pub options: GnssNiOptions,
    /// Seconds the user has to answer, 0 selects the configured default.
    pub timeout_secs: u32,
    pub timeout_response: GnssNiResponse,
    pub requestor: String,
    pub message: String,
    pub extras: String,
}

impl GnssNiNotification {
    pub fn is_emergency(&self) -> bool {
        self.ni_type == GnssNiType::EmergencySupl
    }
}

/// The notification as delivered to the NI callback.
#[derive(Debug, Clone, PartialEq)]
pub struct NiRequest {
    pub id: u32,
    pub notification: GnssNiNotification,
}

/// Opaque engine request the response has to be attached to.
///
/// Dropping the last clone releases it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NiPayload(Arc<[u8]>);

impl NiPayload {
    pub fn new(bytes: Vec<u8>) -> Self {
        NiPayload(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl From<Arc<[u8]>> for NiPayload {
    fn from(bytes: Arc<[u8]>) -> Self {
        NiPayload(bytes)
    }
}
