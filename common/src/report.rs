// SPDX-FileCopyrightText: 2026 All contributors
//
// SPDX-License-Identifier: GPL-2.0-or-later

//! Events as they arrive from the positioning engine, before conversion.

use crate::{
    position::{
        Dop, ExtDop, GnssSystemTime, NavSolutionMask, Position, Reliability, UncertaintyEllipse,
        Velocity,
    },
    signal::GnssDataNotification,
    sv::GnssSvUsedInPosition,
};
use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Technologies the engine used to compute a fix.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct PosTechMask: u32 {
        const SATELLITE = 1 << 0;
        const CELLID = 1 << 1;
        const WIFI = 1 << 2;
        const SENSORS = 1 << 3;
        const REFERENCE_LOCATION = 1 << 4;
        const INJECTED_COARSE_POSITION = 1 << 5;
        const AFLT = 1 << 6;
        const HYBRID = 1 << 7;
        const PPE = 1 << 8;
    }
}

bitflags! {
    /// Event classes the engine is asked to report.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct EngineEventMask: u64 {
        const PARSED_POSITION_REPORT = 1 << 0;
        const SATELLITE_REPORT = 1 << 1;
        const NMEA_1HZ_REPORT = 1 << 2;
        const NI_NOTIFY_VERIFY_REQUEST = 1 << 3;
        const LOCATION_SERVER_REQUEST = 1 << 4;
        const GNSS_MEASUREMENT = 1 << 5;
        const GNSS_SV_POLYNOMIAL_REPORT = 1 << 6;
        const PARSED_UNPROPAGATED_POSITION_REPORT = 1 << 7;
        const LOC_SYSTEM_INFO = 1 << 8;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FixStatus {
    #[default]
    Success,
    Intermediate,
    Failure,
}

/// Where a position or SV event entered the adapter from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportSource {
    /// Raw report from the positioning engine.
    #[default]
    Engine,
    /// Report already routed through the secondary engine.
    EngineHub,
}

/// Core fix fields, each present only if the engine reported it.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawFix {
    pub position: Option<Position>,
    pub altitude: Option<f64>,
    pub speed: Option<f32>,
    pub bearing: Option<f32>,
    pub accuracy: Option<f32>,
    pub timestamp_ms: u64,
}

/// Extended fix fields, each present only if the engine reported it.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LocationExtended {
    pub altitude_mean_sea_level: Option<f32>,
    pub dop: Option<Dop>,
    pub ext_dop: Option<ExtDop>,
    pub magnetic_deviation: Option<f32>,
    pub horizontal_reliability: Option<Reliability>,
    pub vertical_reliability: Option<Reliability>,
    pub uncertainty_ellipse: Option<UncertaintyEllipse>,
    pub vertical_uncertainty: Option<f32>,
    pub speed_uncertainty: Option<f32>,
    pub bearing_uncertainty: Option<f32>,
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

/// A position event from the engine or from the secondary engine.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PositionReport {
    pub fix: RawFix,
    pub extended: LocationExtended,
    pub status: FixStatus,
    pub tech_mask: PosTechMask,
    /// Raw fix that has not been propagated to the report time.
    pub unpropagated: bool,
    /// Jammer and AGC data attached to the fix.
    pub data: Option<GnssDataNotification>,
    /// GPS millisecond in week of the attached data.
    pub ms_in_week: Option<u32>,
}

/// NMEA sentences delivered to clients.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GnssNmeaNotification {
    /// Wall clock time the sentences were produced, ms since the unix epoch.
    pub timestamp_ms: u64,
    pub nmea: String,
}

impl PositionReport {
    /// A fix at 0,0 without horizontal reliability carries no usable position.
    pub fn is_blank(&self) -> bool {
        let at_origin = self
            .fix
            .position
            .is_none_or(|position| position.is_null_island());
        let no_reliability = matches!(
            self.extended.horizontal_reliability,
            None | Some(Reliability::NotSet)
        );
        at_origin && no_reliability
    }
}
