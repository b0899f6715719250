// SPDX-FileCopyrightText: 2026 All contributors
//
// SPDX-License-Identifier: GPL-2.0-or-later

//! NMEA 0183 sentence generation from fixes and satellite reports.

use chrono::{DateTime, Timelike, Utc};
use common::{
    position::{GnssLocationInfo, Position},
    sv::{GnssSv, GnssSvNotification, SvType},
};
use std::fmt::Write;

/// Knots per meter per second.
const KNOTS_PER_MPS: f32 = 1.943_844_5;

/// Formats fixes and satellite reports as NMEA sentences.
///
/// Implementations are stateless, every call depends on its arguments only.
pub trait NmeaGenerator: Send + Sync {
    /// Returns the sentences describing one fix.
    ///
    /// With `with_position` set to false the position fields are left empty,
    /// which is how an unusable fix is reported.
    fn position_sentences(&self, info: &GnssLocationInfo, with_position: bool) -> Vec<String>;

    /// Returns the GSV sentences for all reported satellites.
    fn sv_sentences(&self, svs: &GnssSvNotification) -> Vec<String>;
}

/// Generates GGA, RMC and GSV sentences.
#[derive(Debug, Default, Clone, Copy)]
pub struct BasicNmeaGenerator;

impl NmeaGenerator for BasicNmeaGenerator {
    fn position_sentences(&self, info: &GnssLocationInfo, with_position: bool) -> Vec<String> {
        let fix = match (with_position, info.location.position) {
            (true, Some(position)) => Some(position),
            _ => None,
        };
        vec![gga(info, fix), rmc(info, fix)]
    }

    fn sv_sentences(&self, svs: &GnssSvNotification) -> Vec<String> {
        let mut sentences = Vec::new();
        for sv_type in [
            SvType::Gps,
            SvType::Glonass,
            SvType::Galileo,
            SvType::Beidou,
            SvType::Qzss,
        ] {
            let visible: Vec<&GnssSv> = svs
                .svs
                .iter()
                .filter(|sv| sv.sv_type == sv_type)
                .collect();
            sentences.extend(gsv(talker(sv_type), &visible));
        }
        sentences
    }
}

fn talker(sv_type: SvType) -> &'static str {
    match sv_type {
        SvType::Glonass => "GL",
        SvType::Galileo => "GA",
        SvType::Beidou => "GB",
        SvType::Qzss => "GQ",
        _ => "GP",
    }
}

/// XOR of all bytes between `$` and `*`.
pub fn checksum(body: &str) -> u8 {
    body.bytes().fold(0, |sum, byte| sum ^ byte)
}

/// Wraps a sentence body into `$<body>*<checksum>`.
pub fn sentence(body: &str) -> String {
    format!("${}*{:02X}", body, checksum(body))
}

fn utc_time(info: &GnssLocationInfo) -> Option<DateTime<Utc>> {
    info.location.utc_time()
}

fn hhmmss(time: &DateTime<Utc>) -> String {
    format!(
        "{:02}{:02}{:02}.{:02}",
        time.hour(),
        time.minute(),
        time.second(),
        time.nanosecond() / 10_000_000
    )
}

fn latitude(position: &Position) -> String {
    let hemisphere = if position.latitude < 0.0 { 'S' } else { 'N' };
    let value = position.latitude.abs();
    let degrees = value.trunc();
    let minutes = (value - degrees) * 60.0;
    format!("{:02}{:07.4},{}", degrees as u32, minutes, hemisphere)
}

fn longitude(position: &Position) -> String {
    let hemisphere = if position.longitude < 0.0 { 'W' } else { 'E' };
    let value = position.longitude.abs();
    let degrees = value.trunc();
    let minutes = (value - degrees) * 60.0;
    format!("{:03}{:07.4},{}", degrees as u32, minutes, hemisphere)
}

fn gga(info: &GnssLocationInfo, fix: Option<Position>) -> String {
    let Some(position) = fix else {
        return sentence("GPGGA,,,,,,0,,,,,,,,");
    };
    let time = utc_time(info).map(|t| hhmmss(&t)).unwrap_or_default();
    let num_sv = info
        .num_sv_used
        .map(|n| format!("{:02}", n))
        .unwrap_or_default();
    let hdop = info
        .dop
        .map(|dop| format!("{:.1}", dop.hdop))
        .unwrap_or_default();
    let (altitude, separation) = match (info.altitude_mean_sea_level, info.location.altitude) {
        (Some(msl), Some(ellipsoid)) => (
            format!("{:.1}", msl),
            format!("{:.1}", ellipsoid - f64::from(msl)),
        ),
        (Some(msl), None) => (format!("{:.1}", msl), String::new()),
        _ => (String::new(), String::new()),
    };
    sentence(&format!(
        "GPGGA,{},{},{},1,{},{},{},M,{},M,,",
        time,
        latitude(&position),
        longitude(&position),
        num_sv,
        hdop,
        altitude,
        separation
    ))
}

fn rmc(info: &GnssLocationInfo, fix: Option<Position>) -> String {
    let Some(position) = fix else {
        return sentence("GPRMC,,V,,,,,,,,,,N");
    };
    let time = utc_time(info);
    let speed = info
        .location
        .speed
        .map(|speed| format!("{:.1}", speed * KNOTS_PER_MPS))
        .unwrap_or_default();
    let bearing = info
        .location
        .bearing
        .map(|bearing| format!("{:.1}", bearing))
        .unwrap_or_default();
    sentence(&format!(
        "GPRMC,{},A,{},{},{},{},{},,,A",
        time.map(|t| hhmmss(&t)).unwrap_or_default(),
        latitude(&position),
        longitude(&position),
        speed,
        bearing,
        time.map(|t| t.format("%d%m%y").to_string())
            .unwrap_or_default()
    ))
}

fn gsv(talker: &str, svs: &[&GnssSv]) -> Vec<String> {
    if svs.is_empty() {
        return Vec::new();
    }
    let total = svs.len().div_ceil(4);
    svs.chunks(4)
        .enumerate()
        .map(|(index, chunk)| {
            let mut body = format!("{}GSV,{},{},{:02}", talker, total, index + 1, svs.len());
            for sv in chunk {
                let _ = write!(
                    body,
                    ",{:02},{:02},{:03},{:02}",
                    sv.sv_id,
                    sv.elevation.round() as i32,
                    sv.azimuth.round() as i32,
                    sv.cn0_dbhz.round() as i32
                );
            }
            sentence(&body)
        })
        .collect()
}
