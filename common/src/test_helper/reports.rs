// SPDX-FileCopyrightText: 2026 All contributors
//
// SPDX-License-Identifier: GPL-2.0-or-later

//! Ready made engine events for tests.

use crate::{
    ni::{GnssNiNotification, GnssNiOptions, GnssNiResponse, GnssNiType},
    position::{Dop, Position, Reliability},
    report::{FixStatus, PosTechMask, PositionReport, RawFix},
    sv::{GnssSv, GnssSvNotification, SvType},
};

/// A final satellite fix at the given coordinate.
pub fn final_fix(latitude: f64, longitude: f64) -> PositionReport {
    let mut report = PositionReport {
        fix: RawFix {
            position: Some(Position::new(latitude, longitude)),
            altitude: Some(112.5),
            speed: Some(12.0),
            bearing: Some(87.0),
            accuracy: Some(4.0),
            timestamp_ms: 1_700_000_000_000,
        },
        status: FixStatus::Success,
        tech_mask: PosTechMask::SATELLITE,
        ..Default::default()
    };
    report.extended.horizontal_reliability = Some(Reliability::High);
    report.extended.altitude_mean_sea_level = Some(70.0);
    report.extended.dop = Some(Dop {
        pdop: 1.4,
        hdop: 0.9,
        vdop: 1.1,
    });
    report.extended.num_sv_used = Some(9);
    report
}

/// An intermediate fix with the given horizontal accuracy.
pub fn intermediate_fix(latitude: f64, longitude: f64, accuracy: Option<f32>) -> PositionReport {
    let mut report = final_fix(latitude, longitude);
    report.status = FixStatus::Intermediate;
    report.fix.accuracy = accuracy;
    report
}

pub fn sv(sv_type: SvType, sv_id: u16) -> GnssSv {
    GnssSv {
        sv_id,
        sv_type,
        cn0_dbhz: 38.5,
        elevation: 45.0,
        azimuth: 120.0,
        carrier_frequency_hz: Some(1_575_420_000.0),
        has_ephemeris: true,
        has_almanac: true,
        used_in_fix: false,
    }
}

pub fn sv_report(svs: &[(SvType, u16)]) -> GnssSvNotification {
    GnssSvNotification {
        svs: svs
            .iter()
            .map(|(sv_type, sv_id)| sv(*sv_type, *sv_id))
            .collect(),
    }
}

pub fn ni_notification(ni_type: GnssNiType, timeout_secs: u32) -> GnssNiNotification {
    GnssNiNotification {
        ni_type,
        options: GnssNiOptions::NOTIFICATION | GnssNiOptions::VERIFICATION,
        timeout_secs,
        timeout_response: GnssNiResponse::NoResponse,
        requestor: "network".to_string(),
        message: "location request".to_string(),
        extras: String::new(),
    }
}
