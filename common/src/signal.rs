// SPDX-FileCopyrightText: 2026 All contributors
//
// SPDX-License-Identifier: GPL-2.0-or-later

//! Jammer, AGC, measurement and system information events.

use crate::{position::GnssSystemTime, sv::SvType};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use strum_macros::Display;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, Serialize, Deserialize,
)]
pub enum GnssSignalType {
    GpsL1ca,
    GpsL1c,
    GpsL2,
    GpsL5,
    GlonassG1,
    GlonassG2,
    GalileoE1c,
    GalileoE5a,
    GalileoE5b,
    BeidouB1i,
    BeidouB1c,
    BeidouB2i,
    BeidouB2ai,
    QzssL1ca,
    QzssL1s,
    QzssL2,
    QzssL5,
    SbasL1ca,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GnssSignalData {
    pub agc: Option<f64>,
    pub jammer_ind: Option<f64>,
}

/// Jammer and AGC values per signal.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GnssDataNotification {
    pub signals: BTreeMap<GnssSignalType, GnssSignalData>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct GnssMeasurementsData {
    pub sv_id: u16,
    pub sv_type: SvType,
    pub cn0_dbhz: f64,
    pub pseudorange_rate_mps: f64,
    pub agc_level_db: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct GnssMeasurementsNotification {
    pub measurements: Vec<GnssMeasurementsData>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LeapSecondChange {
    pub gps_time: GnssSystemTime,
    pub leap_seconds_before: u8,
    pub leap_seconds_after: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LeapSecondSystemInfo {
    pub current: Option<u8>,
    pub change: Option<LeapSecondChange>,
}

/// System information reported by the engine piece by piece.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LocationSystemInfo {
    pub leap_second: Option<LeapSecondSystemInfo>,
}

impl LocationSystemInfo {
    pub fn is_empty(&self) -> bool {
        self.leap_second.is_none()
    }

    /// Merges the fields present in `update` into `self`, keeping the rest.
    ///
    /// A leap second change stays cached after the change completed, since
    /// reports during the transition may still refer to it.
    pub fn merge(&mut self, update: &LocationSystemInfo) {
        if let Some(src) = &update.leap_second {
            let dst = self.leap_second.get_or_insert_with(Default::default);
            if let Some(current) = src.current {
                dst.current = Some(current);
            }
            if let Some(change) = src.change {
                dst.change = Some(change);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_keeps_previous_change_info() {
        let change = LeapSecondChange {
            leap_seconds_before: 17,
            leap_seconds_after: 18,
            ..Default::default()
        };
        let mut cached = LocationSystemInfo {
            leap_second: Some(LeapSecondSystemInfo {
                current: Some(17),
                change: Some(change),
            }),
        };

        cached.merge(&LocationSystemInfo {
            leap_second: Some(LeapSecondSystemInfo {
                current: Some(18),
                change: None,
            }),
        });

        let leap = cached.leap_second.unwrap();
        assert_eq!(leap.current, Some(18));
        assert_eq!(leap.change, Some(change));
    }

    #[test]
    fn merge_without_leap_second_is_noop() {
        let mut cached = LocationSystemInfo::default();
        cached.merge(&LocationSystemInfo::default());
        assert!(cached.is_empty());
    }
}
