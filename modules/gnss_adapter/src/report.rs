// SPDX-FileCopyrightText: 2026 All contributors
//
// SPDX-License-Identifier: GPL-2.0-or-later

//! Filtering, enrichment and fan out of engine reports.

use crate::{GnssAdapter, client::notify, system_status::SystemStatusReport};
use chrono::Utc;
use common::{
    config::{GpsConf, NmeaProvider},
    position::{GnssLocationInfo, Location, LocationTechnology},
    report::{FixStatus, GnssNmeaNotification, PosTechMask, PositionReport, ReportSource},
    signal::{
        GnssDataNotification, GnssMeasurementsNotification, GnssSignalData, GnssSignalType,
        LocationSystemInfo,
    },
    sv::{GnssSvNotification, QZSS_SV_PRN_MIN, SvType},
};
use tracing::{debug, trace};

/// Maximum distance between a report and the system status it is enriched
/// from, in milliseconds of GPS week.
pub const ENRICHMENT_TOLERANCE_MS: i64 = 2000;

/// Decides whether a position goes to the clients.
pub fn need_report(report: &PositionReport, hub_loaded: bool, conf: &GpsConf) -> bool {
    if hub_loaded {
        return true;
    }
    match report.status {
        FixStatus::Success => report
            .tech_mask
            .intersects(PosTechMask::SATELLITE | PosTechMask::SENSORS | PosTechMask::HYBRID),
        FixStatus::Intermediate => {
            conf.intermediate_pos
                && match report.fix.accuracy {
                    Some(accuracy) if conf.accuracy_thres != 0 => {
                        accuracy <= conf.accuracy_thres as f32
                    }
                    _ => true,
                }
        }
        FixStatus::Failure => false,
    }
}

pub fn convert_location(report: &PositionReport) -> Location {
    let mut technology = LocationTechnology::empty();
    let tech_mask = report.tech_mask;
    if tech_mask.contains(PosTechMask::SATELLITE) {
        technology |= LocationTechnology::GNSS;
    }
    if tech_mask.contains(PosTechMask::CELLID) {
        technology |= LocationTechnology::CELL;
    }
    if tech_mask.contains(PosTechMask::WIFI) {
        technology |= LocationTechnology::WIFI;
    }
    if tech_mask.contains(PosTechMask::SENSORS) {
        technology |= LocationTechnology::SENSORS;
    }

    Location {
        position: report.fix.position,
        altitude: report.fix.altitude,
        speed: report.fix.speed,
        bearing: report.fix.bearing,
        horizontal_accuracy: report.fix.accuracy,
        vertical_accuracy: report.extended.vertical_uncertainty,
        speed_accuracy: report.extended.speed_uncertainty,
        bearing_accuracy: report.extended.bearing_uncertainty,
        timestamp_ms: report.fix.timestamp_ms,
        technology,
    }
}

/// Builds the detailed record, copying only what the engine reported.
pub fn convert_location_info(report: &PositionReport) -> GnssLocationInfo {
    let extended = &report.extended;
    GnssLocationInfo {
        location: convert_location(report),
        altitude_mean_sea_level: extended.altitude_mean_sea_level,
        dop: extended.dop,
        ext_dop: extended.ext_dop,
        magnetic_deviation: extended.magnetic_deviation,
        horizontal_reliability: extended.horizontal_reliability,
        vertical_reliability: extended.vertical_reliability,
        uncertainty_ellipse: extended.uncertainty_ellipse,
        velocity: extended.velocity,
        velocity_uncertainty: extended.velocity_uncertainty,
        sv_used_in_position: extended.sv_used_in_position,
        num_sv_used: extended.num_sv_used,
        nav_solution: extended.nav_solution,
        pos_technology: extended.pos_technology,
        system_time: extended.system_time,
        leap_seconds: extended.leap_seconds,
        time_uncertainty_ms: extended.time_uncertainty_ms,
    }
}

fn within_tolerance(status: &SystemStatusReport, ms_in_week: u32) -> bool {
    status.time_and_clock.is_some_and(|time| {
        (i64::from(ms_in_week) - i64::from(time.gps_tow_ms)).abs() < ENRICHMENT_TOLERANCE_MS
    })
}

/// Replaces the signal data with the AGC and jammer values of the latest RF
/// report when that report is close enough in time.
pub fn enrich_data(data: &mut GnssDataNotification, status: &SystemStatusReport, ms_in_week: u32) {
    let Some(rf) = status.rf_and_params else {
        return;
    };
    if !within_tolerance(status, ms_in_week) {
        debug!("System status too far from {} ms in week, not enriching", ms_in_week);
        return;
    }

    data.signals.clear();
    let mut set = |signal: GnssSignalType, agc: Option<f64>, jammer: Option<f64>| {
        if agc.is_none() && jammer.is_none() {
            return;
        }
        let entry = data.signals.entry(signal).or_insert_with(GnssSignalData::default);
        if agc.is_some() {
            entry.agc = agc;
        }
        if jammer.is_some() {
            entry.jammer_ind = jammer;
        }
    };
    for signal in [
        GnssSignalType::GpsL1ca,
        GnssSignalType::QzssL1ca,
        GnssSignalType::SbasL1ca,
    ] {
        set(signal, rf.agc_gps, rf.jammer_gps);
    }
    set(GnssSignalType::GlonassG1, rf.agc_glonass, rf.jammer_glonass);
    set(GnssSignalType::BeidouB1i, rf.agc_beidou, rf.jammer_beidou);
    set(GnssSignalType::GalileoE1c, rf.agc_galileo, rf.jammer_galileo);
}

/// Fills the AGC level of each measurement from the latest RF report.
pub fn enrich_measurements(
    measurements: &mut GnssMeasurementsNotification,
    status: &SystemStatusReport,
    ms_in_week: u32,
) {
    let Some(rf) = status.rf_and_params else {
        return;
    };
    let time_valid = status.time_and_clock.is_some_and(|time| time.time_valid);
    if !time_valid || !within_tolerance(status, ms_in_week) {
        return;
    }

    for measurement in &mut measurements.measurements {
        let agc = match measurement.sv_type {
            SvType::Gps => rf.agc_gps,
            SvType::Galileo => rf.agc_galileo,
            SvType::Glonass => rf.agc_glonass,
            SvType::Beidou => rf.agc_beidou,
            SvType::Qzss | SvType::Sbas | SvType::Unknown => continue,
        };
        measurement.agc_level_db = agc;
    }
}

impl GnssAdapter {
    pub(crate) fn on_position(&mut self, report: PositionReport, source: ReportSource) {
        if source == ReportSource::Engine {
            self.engine_hub.report_position(&report);
            if report.unpropagated {
                return;
            }
            if self.engine_hub_loaded {
                trace!("Engine hub is loaded, dropping engine fix");
                return;
            }
        } else if report.unpropagated {
            return;
        }

        if report.status == FixStatus::Success {
            self.system_status.event_position(&report);
        }
        self.report_position(&report);

        if let Some(mut data) = report.data {
            if let Some(ms_in_week) = report.ms_in_week {
                enrich_data(&mut data, &self.system_status.report(true), ms_in_week);
            }
            self.report_data(data);
        }
    }

    fn report_position(&mut self, report: &PositionReport) {
        let conf = self.config.snapshot();
        let reported = need_report(report, self.engine_hub_loaded, &conf);
        let info = convert_location_info(report);

        if reported {
            if let Some(used) = report.extended.sv_used_in_position {
                self.sv_used_in_position = Some(used);
            }
            for callbacks in self.clients.callbacks() {
                if callbacks.location_info.is_some() {
                    notify(&callbacks.location_info, info.clone());
                } else {
                    notify(&callbacks.tracking, info.location.clone());
                }
            }
        } else {
            trace!("Not reporting {:?} fix with {:?}", report.status, report.tech_mask);
        }

        if conf.nmea_provider == NmeaProvider::Ap && !self.sessions.is_empty() {
            let with_position =
                reported && report.status != FixStatus::Failure && !report.is_blank();
            let sentences = self.nmea.position_sentences(&info, with_position);
            self.deliver_nmea(sentences, report.fix.timestamp_ms);
        }
    }

    pub(crate) fn on_sv(&mut self, mut svs: GnssSvNotification, source: ReportSource) {
        if source == ReportSource::Engine {
            self.engine_hub.report_sv(&svs);
            if self.engine_hub_loaded {
                return;
            }
        }

        let used = self.sv_used_in_position.take();
        for sv in &mut svs.svs {
            if used.is_some_and(|used| used.is_used(sv.sv_type, sv.sv_id)) {
                sv.used_in_fix = true;
            }
            if sv.sv_type == SvType::Qzss && sv.sv_id < QZSS_SV_PRN_MIN {
                sv.sv_id += QZSS_SV_PRN_MIN - 1;
            }
        }

        for callbacks in self.clients.callbacks() {
            notify(&callbacks.sv, svs.clone());
        }

        let conf = self.config.snapshot();
        if conf.nmea_provider == NmeaProvider::Ap && !self.sessions.is_empty() {
            let sentences = self.nmea.sv_sentences(&svs);
            self.deliver_nmea(sentences, now_ms());
        }
    }

    /// Sentences produced by the modem.
    pub(crate) fn on_nmea(&mut self, nmea: String) {
        if self.system_status.set_nmea_string(&nmea) {
            return;
        }
        if self.config.read(|conf| conf.nmea_provider) == NmeaProvider::Mp {
            self.deliver_nmea(vec![nmea], now_ms());
        }
    }

    fn deliver_nmea(&self, sentences: Vec<String>, timestamp_ms: u64) {
        for nmea in sentences {
            for callbacks in self.clients.callbacks() {
                notify(
                    &callbacks.nmea,
                    GnssNmeaNotification {
                        timestamp_ms,
                        nmea: nmea.clone(),
                    },
                );
            }
        }
    }

    pub(crate) fn on_data(&mut self, mut data: GnssDataNotification, ms_in_week: Option<u32>) {
        if let Some(ms_in_week) = ms_in_week {
            enrich_data(&mut data, &self.system_status.report(true), ms_in_week);
        }
        self.report_data(data);
    }

    fn report_data(&self, data: GnssDataNotification) {
        for (signal, values) in &data.signals {
            trace!("{}: agc {:?} jammer {:?}", signal, values.agc, values.jammer_ind);
        }
        for callbacks in self.clients.callbacks() {
            notify(&callbacks.data, data.clone());
        }
    }

    pub(crate) fn on_measurements(
        &mut self,
        mut measurements: GnssMeasurementsNotification,
        ms_in_week: Option<u32>,
    ) {
        if let Some(ms_in_week) = ms_in_week {
            enrich_measurements(&mut measurements, &self.system_status.report(true), ms_in_week);
        }
        for callbacks in self.clients.callbacks() {
            notify(&callbacks.measurements, measurements.clone());
        }
    }

    pub(crate) fn on_system_info(&mut self, info: LocationSystemInfo) {
        self.engine_hub.report_system_info(&info);
        self.system_info.merge(&info);
        if info.is_empty() {
            return;
        }
        for callbacks in self.clients.callbacks() {
            notify(&callbacks.system_info, info);
        }
    }
}

fn now_ms() -> u64 {
    u64::try_from(Utc::now().timestamp_millis()).unwrap_or_default()
}
