// SPDX-FileCopyrightText: 2026 All contributors
//
// SPDX-License-Identifier: GPL-2.0-or-later

use crate::{
    report::PosTechMask,
    sv::{GnssSvUsedInPosition, SvType},
};
use bitflags::bitflags;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A geographical coordinate in decimal degrees.
///
/// Latitude ranges from -90.0 to 90.0 and longitude from -180.0 to 180.0.
///
/// # Example
///
/// ```rust
/// use common::position::Position;
///
/// let pos = Position::new(52.0270889, 11.2803483);
/// assert!(!pos.is_null_island());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
}

impl Position {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Position {
            latitude,
            longitude,
        }
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// True for the all-zero coordinate some engines use for "no position".
    pub fn is_null_island(&self) -> bool {
        self.latitude == 0.0 && self.longitude == 0.0
    }
}

bitflags! {
    /// Technologies that contributed to a [`Location`].
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct LocationTechnology: u32 {
        const GNSS = 1 << 0;
        const CELL = 1 << 1;
        const WIFI = 1 << 2;
        const SENSORS = 1 << 3;
    }
}

/// The plain location delivered to tracking callbacks.
///
/// Every optional field is only present when the engine reported it.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Location {
    pub position: Option<Position>,
    /// Altitude above the WGS-84 ellipsoid in meters.
    pub altitude: Option<f64>,
    /// Speed in meters per second.
    pub speed: Option<f32>,
    /// Bearing in degrees, 0 to 359.999.
    pub bearing: Option<f32>,
    pub horizontal_accuracy: Option<f32>,
    pub vertical_accuracy: Option<f32>,
    pub speed_accuracy: Option<f32>,
    pub bearing_accuracy: Option<f32>,
    /// UTC time of the fix in milliseconds since the unix epoch.
    pub timestamp_ms: u64,
    pub technology: LocationTechnology,
}

impl Location {
    pub fn utc_time(&self) -> Option<DateTime<Utc>> {
        i64::try_from(self.timestamp_ms)
            .ok()
            .and_then(DateTime::from_timestamp_millis)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Reliability {
    #[default]
    NotSet,
    VeryLow,
    Low,
    Medium,
    High,
}

/// Dilution of precision.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Dop {
    pub pdop: f32,
    pub hdop: f32,
    pub vdop: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ExtDop {
    pub pdop: f32,
    pub hdop: f32,
    pub vdop: f32,
    pub gdop: f32,
    pub tdop: f32,
}

/// Horizontal uncertainty ellipse, axes in meters and azimuth in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct UncertaintyEllipse {
    pub semi_major: f32,
    pub semi_minor: f32,
    pub azimuth: f32,
}

/// East/North/Up velocity components in meters per second.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Velocity {
    pub east: f32,
    pub north: f32,
    pub up: f32,
}

bitflags! {
    /// Corrections applied to the navigation solution.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct NavSolutionMask: u32 {
        const SBAS_CORRECTION_IONO = 1 << 0;
        const SBAS_CORRECTION_FAST = 1 << 1;
        const SBAS_CORRECTION_LONG = 1 << 2;
        const SBAS_INTEGRITY = 1 << 3;
        const DGNSS_CORRECTION = 1 << 4;
        const RTK_CORRECTION = 1 << 5;
        const PPP_CORRECTION = 1 << 6;
    }
}

/// Week and time of week of the fix in the time base of one constellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GnssSystemTime {
    pub constellation: SvType,
    pub week: u16,
    pub time_of_week_ms: u32,
}

/// A [`Location`] enriched with the quality and time information of the fix.
///
/// Delivered to location info callbacks in place of the plain location.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GnssLocationInfo {
    pub location: Location,
    pub altitude_mean_sea_level: Option<f32>,
    pub dop: Option<Dop>,
    pub ext_dop: Option<ExtDop>,
    pub magnetic_deviation: Option<f32>,
    pub horizontal_reliability: Option<Reliability>,
    pub vertical_reliability: Option<Reliability>,
    pub uncertainty_ellipse: Option<UncertaintyEllipse>,
    pub velocity: Option<Velocity>,
    pub velocity_uncertainty: Option<Velocity>,
    pub sv_used_in_position: Option<GnssSvUsedInPosition>,
    pub num_sv_used: Option<u16>,
    pub nav_solution: Option<NavSolutionMask>,
    pub pos_technology: Option<PosTechMask>,
    pub system_time: Option<GnssSystemTime>,
    pub leap_seconds: Option<u8>,
    pub time_uncertainty_ms: Option<f32>,
}
