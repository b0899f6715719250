// SPDX-FileCopyrightText: 2026 All contributors
//
// SPDX-License-Identifier: GPL-2.0-or-later

use serde::{Deserialize, Serialize};
use strum_macros::Display;

/// Positioning mode requested by a client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, Serialize, Deserialize)]
pub enum GnssSuplMode {
    #[default]
    Standalone,
    Msb,
    Msa,
}

/// Options of one client tracking session.
///
/// A zero valued record (see [`Default`]) is invalid and gets rejected by the
/// adapter before it is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TrackingOptions {
    pub min_interval_ms: u32,
    pub min_distance_m: u32,
    pub mode: GnssSuplMode,
    valid: bool,
}

impl TrackingOptions {
    pub fn new(min_interval_ms: u32, mode: GnssSuplMode) -> Self {
        TrackingOptions {
            min_interval_ms,
            min_distance_m: 0,
            mode,
            valid: true,
        }
    }

    pub fn with_min_distance(mut self, min_distance_m: u32) -> Self {
        self.min_distance_m = min_distance_m;
        self
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display)]
pub enum PositionModeKind {
    #[default]
    Standalone,
    MsBased,
    MsAssisted,
}

/// The configuration commanded to the positioning engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PositionMode {
    pub kind: PositionModeKind,
    pub min_interval_ms: u32,
    pub share_position: bool,
}

impl From<&TrackingOptions> for PositionMode {
    fn from(options: &TrackingOptions) -> Self {
        let kind = match options.mode {
            GnssSuplMode::Msb => PositionModeKind::MsBased,
            GnssSuplMode::Msa => PositionModeKind::MsAssisted,
            GnssSuplMode::Standalone => PositionModeKind::Standalone,
        };
        PositionMode {
            kind,
            min_interval_ms: options.min_interval_ms,
            share_position: true,
        }
    }
}

/// Technology a control client votes power for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum TechnologyType {
    Gnss,
    Cell,
    Wifi,
}

/// Assistance data the engine should drop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GnssAidingData {
    pub delete_all: bool,
    pub ephemeris: bool,
    pub almanac: bool,
    pub position: bool,
    pub time: bool,
}
