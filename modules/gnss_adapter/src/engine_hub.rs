// SPDX-FileCopyrightText: 2026 All contributors
//
// SPDX-License-Identifier: GPL-2.0-or-later

use common::{
    report::PositionReport,
    signal::LocationSystemInfo,
    sv::GnssSvNotification,
    tracking::{GnssAidingData, PositionMode},
};

/// An optional secondary positioning engine.
///
/// When loaded it receives every raw engine report and becomes the only
/// source of reports delivered to clients. Its own reports enter the adapter
/// through [`EngineEvents`](crate::handle::EngineEvents) with
/// [`ReportSource::EngineHub`](common::report::ReportSource::EngineHub).
pub trait EngineHub: Send + Sync {
    /// Queried once when the adapter is built.
    fn is_loaded(&self) -> bool;

    fn set_fix_mode(&self, mode: &PositionMode);

    fn start_fix(&self);

    fn stop_fix(&self);

    fn report_position(&self, report: &PositionReport);

    fn report_sv(&self, svs: &GnssSvNotification);

    fn report_system_info(&self, info: &LocationSystemInfo);

    fn delete_aiding_data(&self, data: &GnssAidingData);
}

/// Stands in for a secondary engine that is not installed.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoEngineHub;

impl EngineHub for NoEngineHub {
    fn is_loaded(&self) -> bool {
        false
    }

    fn set_fix_mode(&self, _mode: &PositionMode) {}

    fn start_fix(&self) {}

    fn stop_fix(&self) {}

    fn report_position(&self, _report: &PositionReport) {}

    fn report_sv(&self, _svs: &GnssSvNotification) {}

    fn report_system_info(&self, _info: &LocationSystemInfo) {}

    fn delete_aiding_data(&self, _data: &GnssAidingData) {}
}
