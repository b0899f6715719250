// SPDX-FileCopyrightText: 2026 All contributors
//
// SPDX-License-Identifier: GPL-2.0-or-later

//! Requested and persisted GNSS configuration.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter};

/// Seconds a user gets to answer an NI request that carries no timeout.
pub const DEFAULT_NI_TIMEOUT_SECS: u32 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GpsLock {
    #[default]
    None,
    /// Mobile originated sessions are locked.
    Mo,
    /// Network initiated sessions are locked.
    Ni,
    MoAndNi,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuplVersion {
    V1_0_0,
    #[default]
    V2_0_0,
    V2_0_2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LppProfile {
    #[default]
    RrlpOnLte,
    UserPlane,
    ControlPlane,
    UserPlaneAndControlPlane,
}

bitflags! {
    /// LPP extension technologies.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct LppeMask: u32 {
        const DBH = 1 << 0;
        const WLAN_AP_MEASUREMENTS = 1 << 1;
        const SRN_AP_MEASUREMENTS = 1 << 2;
        const SENSOR_BARO_MEASUREMENTS = 1 << 3;
    }
}

bitflags! {
    /// A-GLONASS positioning protocols.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct AGlonassProtocol: u32 {
        const RRC_CP = 1 << 0;
        const RRLP_UP = 1 << 1;
        const LLP_UP = 1 << 2;
        const LLP_CP = 1 << 3;
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct SuplModeMask: u32 {
        const MSB = 1 << 0;
        const MSA = 1 << 1;
    }
}

bitflags! {
    /// Capabilities of the device as configured by the carrier.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct CarrierCapabilities: u32 {
        const SCHEDULING = 1 << 0;
        const MSB = 1 << 1;
        const MSA = 1 << 2;
        const SINGLE_SHOT = 1 << 3;
        const ON_DEMAND_TIME = 1 << 4;
        const MEASUREMENTS = 1 << 6;
    }
}

bitflags! {
    /// Capabilities advertised to clients.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct LocationCapabilities: u32 {
        const TIME_BASED_TRACKING = 1 << 0;
        const GNSS_MSB = 1 << 1;
        const GNSS_MSA = 1 << 2;
        const GNSS_MEASUREMENTS = 1 << 3;
        const DEBUG_NMEA = 1 << 4;
    }
}

/// Which processor produces the NMEA stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NmeaProvider {
    /// Sentences are generated by the adapter from the fixes.
    #[default]
    Ap,
    /// Sentences come from the modem.
    Mp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum AssistanceType {
    Supl,
    C2k,
    Unknown(u32),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssistanceServer {
    pub kind: AssistanceType,
    pub host: String,
    pub port: u16,
}

/// The fields of a [`GnssConfig`] in bit order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum ConfigField {
    GpsLock,
    SuplVersion,
    AssistanceServer,
    LppProfile,
    LppeControlPlane,
    LppeUserPlane,
    AGlonassProtocol,
    EmergencyPdnForEmergencySupl,
    SuplEmergencyServices,
    SuplMode,
}

impl ConfigField {
    pub const fn bit(self) -> u32 {
        1 << self as u32
    }
}

/// A sparse configuration request, only the set fields are applied.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GnssConfig {
    pub gps_lock: Option<GpsLock>,
    pub supl_version: Option<SuplVersion>,
    pub assistance_server: Option<AssistanceServer>,
    pub lpp_profile: Option<LppProfile>,
    pub lppe_control_plane: Option<LppeMask>,
    pub lppe_user_plane: Option<LppeMask>,
    pub aglonass_protocol: Option<AGlonassProtocol>,
    pub emergency_pdn_for_emergency_supl: Option<bool>,
    pub supl_emergency_services: Option<bool>,
    pub supl_mode: Option<SuplModeMask>,
}

impl GnssConfig {
    pub fn contains(&self, field: ConfigField) -> bool {
        match field {
            ConfigField::GpsLock => self.gps_lock.is_some(),
            ConfigField::SuplVersion => self.supl_version.is_some(),
            ConfigField::AssistanceServer => self.assistance_server.is_some(),
            ConfigField::LppProfile => self.lpp_profile.is_some(),
            ConfigField::LppeControlPlane => self.lppe_control_plane.is_some(),
            ConfigField::LppeUserPlane => self.lppe_user_plane.is_some(),
            ConfigField::AGlonassProtocol => self.aglonass_protocol.is_some(),
            ConfigField::EmergencyPdnForEmergencySupl => {
                self.emergency_pdn_for_emergency_supl.is_some()
            }
            ConfigField::SuplEmergencyServices => self.supl_emergency_services.is_some(),
            ConfigField::SuplMode => self.supl_mode.is_some(),
        }
    }

    /// The set fields in bit order.
    pub fn fields(&self) -> Vec<ConfigField> {
        ConfigField::iter()
            .filter(|field| self.contains(*field))
            .collect()
    }

    pub fn flags(&self) -> u32 {
        self.fields().iter().fold(0, |flags, field| flags | field.bit())
    }
}

/// The persisted, process wide GNSS configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GpsConf {
    pub gps_lock: GpsLock,
    pub supl_version: SuplVersion,
    pub lpp_profile: LppProfile,
    pub lppe_cp_technology: LppeMask,
    pub lppe_up_technology: LppeMask,
    pub a_glonass_pos_protocol_select: AGlonassProtocol,
    pub use_emergency_pdn_for_emergency_supl: bool,
    pub supl_es: bool,
    pub supl_mode: SuplModeMask,
    /// Push AGPS related settings to the engine.
    pub agps_config_inject: bool,
    pub supl_host: String,
    pub supl_port: u16,
    pub capabilities: CarrierCapabilities,
    /// Deliver intermediate fixes to clients.
    pub intermediate_pos: bool,
    /// Accuracy threshold in meters for intermediate fixes, 0 disables it.
    pub accuracy_thres: u32,
    pub nmea_provider: NmeaProvider,
    pub ni_default_timeout_secs: u32,
}

impl Default for GpsConf {
    fn default() -> Self {
        GpsConf {
            gps_lock: GpsLock::None,
            supl_version: SuplVersion::V2_0_0,
            lpp_profile: LppProfile::RrlpOnLte,
            lppe_cp_technology: LppeMask::empty(),
            lppe_up_technology: LppeMask::empty(),
            a_glonass_pos_protocol_select: AGlonassProtocol::empty(),
            use_emergency_pdn_for_emergency_supl: true,
            supl_es: false,
            supl_mode: SuplModeMask::MSB | SuplModeMask::MSA,
            agps_config_inject: true,
            supl_host: String::new(),
            supl_port: 0,
            capabilities: CarrierCapabilities::SCHEDULING
                | CarrierCapabilities::MSB
                | CarrierCapabilities::MSA,
            intermediate_pos: false,
            accuracy_thres: 0,
            nmea_provider: NmeaProvider::Ap,
            ni_default_timeout_secs: DEFAULT_NI_TIMEOUT_SECS,
        }
    }
}

impl GpsConf {
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// Carrier capabilities restricted to the enabled SUPL modes.
    pub fn carrier_capabilities(&self) -> CarrierCapabilities {
        let mut capabilities = self.capabilities;
        if !self.supl_mode.contains(SuplModeMask::MSB) {
            capabilities.remove(CarrierCapabilities::MSB);
        }
        if !self.supl_mode.contains(SuplModeMask::MSA) {
            capabilities.remove(CarrierCapabilities::MSA);
        }
        capabilities
    }
}
