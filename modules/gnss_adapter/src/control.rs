// SPDX-FileCopyrightText: 2026 All contributors
//
// SPDX-License-Identifier: GPL-2.0-or-later

//! Control client operations and capabilities.

use crate::{
    GnssAdapter,
    client::{ClientId, notify},
    command::PendingOperation,
    config::ConfigPush,
    engine::Completion,
};
use common::{
    config::{CarrierCapabilities, GpsConf, GpsLock, LocationCapabilities, NmeaProvider},
    error::{LocationError, Response},
    tracking::{GnssAidingData, PositionMode, TechnologyType},
};
use tracing::{debug, info};

/// Capabilities advertised to clients for a configuration.
///
/// Assisted modes follow the carrier capabilities restricted to the enabled
/// SUPL modes. NMEA debugging is offered when the adapter generates NMEA.
pub fn capabilities(conf: &GpsConf) -> LocationCapabilities {
    let carrier = conf.carrier_capabilities();
    let mut capabilities = LocationCapabilities::TIME_BASED_TRACKING;
    if carrier.contains(CarrierCapabilities::MSB) {
        capabilities |= LocationCapabilities::GNSS_MSB;
    }
    if carrier.contains(CarrierCapabilities::MSA) {
        capabilities |= LocationCapabilities::GNSS_MSA;
    }
    if conf.capabilities.contains(CarrierCapabilities::MEASUREMENTS) {
        capabilities |= LocationCapabilities::GNSS_MEASUREMENTS;
    }
    if conf.nmea_provider == NmeaProvider::Ap {
        capabilities |= LocationCapabilities::DEBUG_NMEA;
    }
    capabilities
}

impl GnssAdapter {
    /// Takes the power vote. While held the engine runs unlocked.
    pub(crate) fn enable(&mut self, id: u32, technology: TechnologyType) {
        let error = if technology != TechnologyType::Gnss {
            LocationError::InvalidParameter
        } else if self.power_vote_id.is_some() {
            LocationError::AlreadyStarted
        } else {
            self.power_vote_id = Some(id);
            LocationError::Success
        };
        self.report_control_response(id, error);

        if error.is_success() {
            info!("Power vote {} taken", id);
            self.push_detached(vec![ConfigPush::GpsLock(GpsLock::None)]);
        }
    }

    pub(crate) fn disable(&mut self, id: u32) {
        if self.power_vote_id != Some(id) {
            self.report_control_response(id, LocationError::IdUnknown);
            return;
        }
        self.power_vote_id = None;
        self.report_control_response(id, LocationError::Success);

        info!("Power vote {} released", id);
        let lock = self.config.read(|conf| conf.gps_lock);
        self.push_detached(vec![ConfigPush::GpsLock(lock)]);
    }

    pub(crate) fn delete_aiding_data(&mut self, id: u32, data: GnssAidingData) {
        self.engine_hub.delete_aiding_data(&data);
        self.engine.delete_aiding_data(
            data,
            Completion::new(self.ctx.sender.clone(), PendingOperation::DeleteAidingData(id)),
        );
    }

    pub(crate) fn set_position_mode(&mut self, mode: PositionMode) {
        if self.position_mode == Some(mode) {
            debug!("Position mode unchanged");
            return;
        }
        self.position_mode = Some(mode);
        self.engine.set_position_mode(mode);
    }

    pub(crate) fn request_capabilities(&self, client: ClientId) {
        let capabilities = self.config.read(capabilities);
        let sent = self
            .clients
            .get(client)
            .is_some_and(|callbacks| notify(&callbacks.capabilities, capabilities));
        if !sent {
            debug!("{} has no capabilities callback", client);
        }
    }

    pub(crate) fn broadcast_capabilities(&self) {
        let capabilities = self.config.read(capabilities);
        for callbacks in self.clients.callbacks() {
            notify(&callbacks.capabilities, capabilities);
        }
    }

    pub(crate) fn report_control_response(&self, id: u32, error: LocationError) {
        if !notify(&self.control.response, Response::new(id, error)) {
            debug!("No control response callback for {}", id);
        }
    }
}
