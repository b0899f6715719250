// SPDX-FileCopyrightText: 2026 All contributors
//
// SPDX-License-Identifier: GPL-2.0-or-later

//! Entry points into a running adapter.
//!
//! Every call only enqueues a command, so all handles are cheap to clone and
//! may be used from any task or thread. Ids are handed out synchronously.

use crate::{
    client::{ClientId, ControlCallbacks, LocationCallbacks},
    command::Command,
};
use common::{
    agps::{AgpsType, ApnIpType},
    config::GnssConfig,
    ni::{GnssNiNotification, GnssNiResponse, NiPayload},
    report::{PositionReport, ReportSource},
    signal::{GnssDataNotification, GnssMeasurementsNotification, LocationSystemInfo},
    sv::GnssSvNotification,
    tracking::{GnssAidingData, PositionMode, TechnologyType, TrackingOptions},
};
use module_core::{CommandSender, QueueClosed};
use std::sync::{
    Arc,
    atomic::{AtomicU32, Ordering},
};
use tokio::sync::oneshot;
use tracing::debug;

/// Generates client and session ids. Zero is never handed out.
#[derive(Debug, Clone, Default)]
pub(crate) struct IdGenerator {
    sessions: Arc<AtomicU32>,
    clients: Arc<AtomicU32>,
}

fn next_id(counter: &AtomicU32) -> u32 {
    loop {
        let id = counter.fetch_add(1, Ordering::Relaxed).wrapping_add(1);
        if id != 0 {
            return id;
        }
    }
}

impl IdGenerator {
    pub(crate) fn session(&self) -> u32 {
        next_id(&self.sessions)
    }

    pub(crate) fn client(&self) -> ClientId {
        ClientId(next_id(&self.clients))
    }
}

/// The client and control API.
#[derive(Debug, Clone)]
pub struct AdapterHandle {
    sender: CommandSender<Command>,
    ids: IdGenerator,
}

impl AdapterHandle {
    pub(crate) fn new(sender: CommandSender<Command>, ids: IdGenerator) -> Self {
        AdapterHandle { sender, ids }
    }

    pub fn add_client(&self, callbacks: LocationCallbacks) -> Result<ClientId, QueueClosed> {
        let client = self.ids.client();
        self.sender.send(Command::AddClient { client, callbacks })?;
        Ok(client)
    }

    /// Replaces all callbacks of a registered client.
    pub fn update_callbacks(
        &self,
        client: ClientId,
        callbacks: LocationCallbacks,
    ) -> Result<(), QueueClosed> {
        self.sender.send(Command::AddClient { client, callbacks })
    }

    /// Removes a client after stopping its sessions. Resolves once the
    /// adapter forgot about the client.
    pub async fn remove_client(&self, client: ClientId) -> Result<(), QueueClosed> {
        let (done, removed) = oneshot::channel();
        self.sender.send(Command::RemoveClient {
            client,
            done: Some(done),
        })?;
        removed.await.map_err(|_| QueueClosed)
    }

    pub fn request_capabilities(&self, client: ClientId) -> Result<(), QueueClosed> {
        self.sender.send(Command::RequestCapabilities { client })
    }

    /// Starts a session. The outcome arrives on the client's response
    /// callback under the returned id.
    pub fn start_tracking(
        &self,
        client: ClientId,
        options: TrackingOptions,
    ) -> Result<u32, QueueClosed> {
        let id = self.ids.session();
        self.sender.send(Command::StartTracking {
            client,
            id,
            options,
        })?;
        Ok(id)
    }

    pub fn update_tracking_options(
        &self,
        client: ClientId,
        id: u32,
        options: TrackingOptions,
    ) -> Result<(), QueueClosed> {
        self.sender.send(Command::UpdateTracking {
            client,
            id,
            options,
        })
    }

    pub fn stop_tracking(&self, client: ClientId, id: u32) -> Result<(), QueueClosed> {
        self.sender.send(Command::StopTracking { client, id })
    }

    pub fn set_position_mode(&self, mode: PositionMode) -> Result<(), QueueClosed> {
        self.sender.send(Command::SetPositionMode { mode })
    }

    pub fn gnss_ni_response(
        &self,
        client: ClientId,
        id: u32,
        response: GnssNiResponse,
    ) -> Result<(), QueueClosed> {
        self.sender.send(Command::NiResponse {
            client,
            id,
            response,
        })
    }

    pub fn set_control_callbacks(&self, callbacks: ControlCallbacks) -> Result<(), QueueClosed> {
        self.sender.send(Command::SetControlCallbacks { callbacks })
    }

    pub fn enable(&self, technology: TechnologyType) -> Result<u32, QueueClosed> {
        let id = self.ids.session();
        self.sender.send(Command::Enable { id, technology })?;
        Ok(id)
    }

    pub fn disable(&self, id: u32) -> Result<(), QueueClosed> {
        self.sender.send(Command::Disable { id })
    }

    /// Requests a configuration change.
    ///
    /// Returns one id per set field, in field order. All of them are
    /// answered together on the collective response callback. A request
    /// without fields gets no ids and no response.
    pub fn gnss_update_config(&self, config: GnssConfig) -> Result<Vec<u32>, QueueClosed> {
        let ids: Vec<u32> = config.fields().iter().map(|_| self.ids.session()).collect();
        if ids.is_empty() {
            debug!("Ignoring configuration request without fields");
            return Ok(ids);
        }
        self.sender.send(Command::UpdateConfig {
            config,
            ids: ids.clone(),
        })?;
        Ok(ids)
    }

    pub fn gnss_delete_aiding_data(&self, data: GnssAidingData) -> Result<u32, QueueClosed> {
        let id = self.ids.session();
        self.sender.send(Command::DeleteAidingData { id, data })?;
        Ok(id)
    }

    /// Stops the adapter loop after the commands already queued.
    pub fn shutdown(&self) -> Result<(), QueueClosed> {
        self.sender.send(Command::Quit)
    }
}

/// Events from the engine and the engine hub.
#[derive(Debug, Clone)]
pub struct EngineEvents {
    sender: CommandSender<Command>,
}

impl EngineEvents {
    pub(crate) fn new(sender: CommandSender<Command>) -> Self {
        EngineEvents { sender }
    }

    /// The engine (re)started and lost its state.
    pub fn handle_engine_up(&self) -> Result<(), QueueClosed> {
        self.sender.send(Command::EngineUp)
    }

    pub fn report_position(
        &self,
        report: PositionReport,
        source: ReportSource,
    ) -> Result<(), QueueClosed> {
        self.sender.send(Command::Position {
            report: Box::new(report),
            source,
        })
    }

    pub fn report_sv(&self, svs: GnssSvNotification, source: ReportSource) -> Result<(), QueueClosed> {
        self.sender.send(Command::Sv { svs, source })
    }

    pub fn report_nmea(&self, nmea: impl Into<String>) -> Result<(), QueueClosed> {
        self.sender.send(Command::Nmea { nmea: nmea.into() })
    }

    pub fn report_data(
        &self,
        data: GnssDataNotification,
        ms_in_week: Option<u32>,
    ) -> Result<(), QueueClosed> {
        self.sender.send(Command::Data { data, ms_in_week })
    }

    pub fn report_measurements(
        &self,
        measurements: GnssMeasurementsNotification,
        ms_in_week: Option<u32>,
    ) -> Result<(), QueueClosed> {
        self.sender.send(Command::Measurements {
            measurements,
            ms_in_week,
        })
    }

    pub fn report_location_system_info(&self, info: LocationSystemInfo) -> Result<(), QueueClosed> {
        self.sender.send(Command::SystemInfo { info })
    }

    pub fn request_ni_notify(
        &self,
        notification: GnssNiNotification,
        payload: NiPayload,
    ) -> Result<(), QueueClosed> {
        self.sender.send(Command::NiNotify {
            notification,
            payload,
        })
    }

    pub fn request_atl(&self, handle: u32, agps_type: AgpsType) -> Result<(), QueueClosed> {
        self.sender.send(Command::RequestAtl { handle, agps_type })
    }

    pub fn request_supl_es(&self, handle: u32) -> Result<(), QueueClosed> {
        self.request_atl(handle, AgpsType::SuplEs)
    }

    pub fn release_atl(&self, handle: u32) -> Result<(), QueueClosed> {
        self.sender.send(Command::ReleaseAtl { handle })
    }

    pub fn report_data_call_opened(&self) -> Result<(), QueueClosed> {
        self.sender.send(Command::DataCallOpened)
    }

    pub fn report_data_call_closed(&self) -> Result<(), QueueClosed> {
        self.sender.send(Command::DataCallClosed)
    }
}

/// Outcomes of [`DataConnectivity`](crate::agps::DataConnectivity) requests.
#[derive(Debug, Clone)]
pub struct DataConnEvents {
    sender: CommandSender<Command>,
}

impl DataConnEvents {
    pub(crate) fn new(sender: CommandSender<Command>) -> Self {
        DataConnEvents { sender }
    }

    pub fn data_conn_open(
        &self,
        agps_type: AgpsType,
        apn: impl Into<String>,
        bearer: ApnIpType,
    ) -> Result<(), QueueClosed> {
        self.sender.send(Command::DataConnOpen {
            agps_type,
            apn: apn.into(),
            bearer,
        })
    }

    pub fn data_conn_closed(&self, agps_type: AgpsType) -> Result<(), QueueClosed> {
        self.sender.send(Command::DataConnClosed { agps_type })
    }

    pub fn data_conn_failed(&self, agps_type: AgpsType) -> Result<(), QueueClosed> {
        self.sender.send(Command::DataConnFailed { agps_type })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_skip_zero() {
        let ids = IdGenerator::default();
        ids.sessions.store(u32::MAX - 1, Ordering::Relaxed);
        assert_eq!(ids.session(), u32::MAX);
        assert_eq!(ids.session(), 1);
        assert_eq!(ids.client(), ClientId(1));
    }
}
