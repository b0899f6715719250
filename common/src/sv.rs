// SPDX-FileCopyrightText: 2026 All contributors
//
// SPDX-License-Identifier: GPL-2.0-or-later

use serde::{Deserialize, Serialize};
use strum_macros::Display;

/// First absolute PRN of the QZSS range.
pub const QZSS_SV_PRN_MIN: u16 = 193;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Display, Serialize, Deserialize,
)]
pub enum SvType {
    #[default]
    Unknown,
    Gps,
    Sbas,
    Glonass,
    Qzss,
    Beidou,
    Galileo,
}

/// One visible satellite.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GnssSv {
    pub sv_id: u16,
    pub sv_type: SvType,
    pub cn0_dbhz: f32,
    pub elevation: f32,
    pub azimuth: f32,
    pub carrier_frequency_hz: Option<f32>,
    pub has_ephemeris: bool,
    pub has_almanac: bool,
    pub used_in_fix: bool,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct GnssSvNotification {
    pub svs: Vec<GnssSv>,
}

/// Per-constellation masks of the SVs used in the last position fix.
///
/// Bit `n - 1` is set when SV `n` contributed to the fix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GnssSvUsedInPosition {
    pub gps: u64,
    pub glonass: u64,
    pub galileo: u64,
    pub beidou: u64,
    pub qzss: u64,
}

impl GnssSvUsedInPosition {
    pub fn mask_for(&self, sv_type: SvType) -> Option<u64> {
        match sv_type {
            SvType::Gps => Some(self.gps),
            SvType::Glonass => Some(self.glonass),
            SvType::Galileo => Some(self.galileo),
            SvType::Beidou => Some(self.beidou),
            SvType::Qzss => Some(self.qzss),
            SvType::Sbas | SvType::Unknown => None,
        }
    }

    /// Returns whether the SV with the engine-reported id was used in the fix.
    pub fn is_used(&self, sv_type: SvType, sv_id: u16) -> bool {
        if !(1..=64).contains(&sv_id) {
            return false;
        }
        self.mask_for(sv_type)
            .is_some_and(|mask| mask & (1u64 << (sv_id - 1)) != 0)
    }
}
