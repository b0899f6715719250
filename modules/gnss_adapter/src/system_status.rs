// SPDX-FileCopyrightText: 2026 All contributors
//
// SPDX-License-Identifier: GPL-2.0-or-later

use common::report::PositionReport;

/// GPS time of the latest engine clock report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TimeAndClock {
    pub gps_week: u16,
    pub gps_tow_ms: u32,
    pub time_valid: bool,
}

/// Latest RF report. Values the engine marked invalid are `None`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RfAndParams {
    pub agc_gps: Option<f64>,
    pub agc_glonass: Option<f64>,
    pub agc_beidou: Option<f64>,
    pub agc_galileo: Option<f64>,
    pub jammer_gps: Option<f64>,
    pub jammer_glonass: Option<f64>,
    pub jammer_beidou: Option<f64>,
    pub jammer_galileo: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SystemStatusReport {
    pub time_and_clock: Option<TimeAndClock>,
    pub rf_and_params: Option<RfAndParams>,
}

/// Read only view of the engine's system status reports.
pub trait SystemStatus: Send + Sync {
    fn report(&self, latest_only: bool) -> SystemStatusReport;

    /// Sees every final fix before it is delivered.
    fn event_position(&self, _report: &PositionReport) {}

    /// Offers a modem NMEA sentence. Returns true if the sentence was a
    /// status sentence and must not be delivered to clients.
    fn set_nmea_string(&self, _nmea: &str) -> bool {
        false
    }
}

/// A system status without any reports.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoSystemStatus;

impl SystemStatus for NoSystemStatus {
    fn report(&self, _latest_only: bool) -> SystemStatusReport {
        SystemStatusReport::default()
    }
}
