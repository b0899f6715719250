// SPDX-FileCopyrightText: 2026 All contributors
//
// SPDX-License-Identifier: GPL-2.0-or-later

//! GNSS adapter between location clients and one positioning engine.
//!
//! The adapter is a [`Module`]: one task owns all state and processes
//! [`Command`]s in the order they were queued. Clients talk to it through an
//! [`AdapterHandle`], the engine through [`EngineEvents`] and the data
//! connectivity subsystem through [`DataConnEvents`].

mod agps;
mod client;
mod command;
mod config;
mod control;
mod engine;
mod engine_hub;
mod handle;
mod ni;
mod report;
mod system_status;
mod tracking;

pub use agps::DataConnectivity;
pub use client::{Callback, ClientId, ClientRegistry, ControlCallbacks, LocationCallbacks};
pub use command::{Command, NiClass, PendingOperation};
pub use config::{ConfigStore, supl_server_url};
pub use control::capabilities;
pub use engine::{Completion, ConfigControl, FixControl, HardwareEngine};
pub use engine_hub::{EngineHub, NoEngineHub};
pub use handle::{AdapterHandle, DataConnEvents, EngineEvents};
pub use ni::{NI_TIMEOUT_GRACE_SECS, NiManager};
pub use report::{
    ENRICHMENT_TOLERANCE_MS, convert_location, convert_location_info, enrich_data,
    enrich_measurements, need_report,
};
pub use system_status::{
    NoSystemStatus, RfAndParams, SystemStatus, SystemStatusReport, TimeAndClock,
};
pub use tracking::{EngineAction, SessionTable, TrackingSessionKey};

use async_trait::async_trait;
use common::{
    agps::{AgpsType, ApnIpType},
    error::{LocationError, Response},
    report::EngineEventMask,
    signal::LocationSystemInfo,
    sv::GnssSvUsedInPosition,
    tracking::PositionMode,
};
use agps::AgpsManager;
use config::ConfigBatch;
use handle::IdGenerator;
use module_core::{CommandQueue, CommandSender, Module, ModuleCtx};
use nmea::{BasicNmeaGenerator, NmeaGenerator};
use std::{collections::VecDeque, sync::Arc};
use tracing::{debug, info, trace};

pub struct GnssAdapter {
    ctx: ModuleCtx<Command>,
    engine: Arc<dyn HardwareEngine>,
    engine_hub: Arc<dyn EngineHub>,
    engine_hub_loaded: bool,
    system_status: Arc<dyn SystemStatus>,
    nmea: Arc<dyn NmeaGenerator>,
    data_connectivity: Option<Arc<dyn DataConnectivity>>,
    config: ConfigStore,
    clients: ClientRegistry,
    control: ControlCallbacks,
    sessions: SessionTable,
    position_mode: Option<PositionMode>,
    /// Consumed by the next SV report.
    sv_used_in_position: Option<GnssSvUsedInPosition>,
    system_info: LocationSystemInfo,
    server_url: String,
    power_vote_id: Option<u32>,
    config_batches: VecDeque<ConfigBatch>,
    config_push_running: bool,
    ni: NiManager,
    agps: AgpsManager,
    ids: IdGenerator,
}

/// Collects the collaborators of a [`GnssAdapter`].
pub struct GnssAdapterBuilder {
    engine: Arc<dyn HardwareEngine>,
    config: ConfigStore,
    engine_hub: Arc<dyn EngineHub>,
    system_status: Arc<dyn SystemStatus>,
    nmea: Arc<dyn NmeaGenerator>,
    data_connectivity: Option<Arc<dyn DataConnectivity>>,
}

impl GnssAdapterBuilder {
    pub fn engine_hub(mut self, engine_hub: Arc<dyn EngineHub>) -> Self {
        self.engine_hub = engine_hub;
        self
    }

    pub fn system_status(mut self, system_status: Arc<dyn SystemStatus>) -> Self {
        self.system_status = system_status;
        self
    }

    pub fn nmea(mut self, nmea: Arc<dyn NmeaGenerator>) -> Self {
        self.nmea = nmea;
        self
    }

    pub fn data_connectivity(mut self, data_connectivity: Arc<dyn DataConnectivity>) -> Self {
        self.data_connectivity = Some(data_connectivity);
        self
    }

    pub fn build(self) -> GnssAdapter {
        let engine_hub_loaded = self.engine_hub.is_loaded();
        info!("Engine hub loaded: {}", engine_hub_loaded);
        GnssAdapter {
            ctx: CommandQueue::new().context(),
            engine: self.engine,
            engine_hub: self.engine_hub,
            engine_hub_loaded,
            system_status: self.system_status,
            nmea: self.nmea,
            data_connectivity: self.data_connectivity,
            config: self.config,
            clients: ClientRegistry::default(),
            control: ControlCallbacks::default(),
            sessions: SessionTable::default(),
            position_mode: None,
            sv_used_in_position: None,
            system_info: LocationSystemInfo::default(),
            server_url: String::new(),
            power_vote_id: None,
            config_batches: VecDeque::new(),
            config_push_running: false,
            ni: NiManager::default(),
            agps: AgpsManager::default(),
            ids: IdGenerator::default(),
        }
    }
}

impl GnssAdapter {
    pub fn builder(engine: Arc<dyn HardwareEngine>, config: ConfigStore) -> GnssAdapterBuilder {
        GnssAdapterBuilder {
            engine,
            config,
            engine_hub: Arc::new(NoEngineHub),
            system_status: Arc::new(NoSystemStatus),
            nmea: Arc::new(BasicNmeaGenerator),
            data_connectivity: None,
        }
    }

    pub fn handle(&self) -> AdapterHandle {
        AdapterHandle::new(self.ctx.sender.clone(), self.ids.clone())
    }

    pub fn engine_events(&self) -> EngineEvents {
        EngineEvents::new(self.ctx.sender.clone())
    }

    pub fn data_conn_events(&self) -> DataConnEvents {
        DataConnEvents::new(self.ctx.sender.clone())
    }

    /// Sender of the adapter's own queue.
    pub fn sender(&self) -> CommandSender<Command> {
        self.ctx.sender.clone()
    }

    pub fn config(&self) -> &ConfigStore {
        &self.config
    }

    fn handle_command(&mut self, command: Command) {
        trace!("Processing {}", <&'static str>::from(&command));
        match command {
            Command::Quit => {}
            Command::AddClient { client, callbacks } => self.add_client(client, callbacks),
            Command::RemoveClient { client, done } => {
                self.remove_client(client);
                if let Some(done) = done {
                    let _ = done.send(());
                }
            }
            Command::RequestCapabilities { client } => self.request_capabilities(client),
            Command::StartTracking {
                client,
                id,
                options,
            } => self.start_tracking(client, id, options),
            Command::UpdateTracking {
                client,
                id,
                options,
            } => self.update_tracking(client, id, options),
            Command::StopTracking { client, id } => self.stop_tracking(client, id),
            Command::SetPositionMode { mode } => self.set_position_mode(mode),
            Command::NiResponse {
                client,
                id,
                response,
            } => self.ni_response(client, id, response),
            Command::SetControlCallbacks { callbacks } => self.control = callbacks,
            Command::Enable { id, technology } => self.enable(id, technology),
            Command::Disable { id } => self.disable(id),
            Command::UpdateConfig { config, ids } => self.update_config(config, ids),
            Command::DeleteAidingData { id, data } => self.delete_aiding_data(id, data),
            Command::EngineUp => self.engine_up(),
            Command::Position { report, source } => self.on_position(*report, source),
            Command::Sv { svs, source } => self.on_sv(svs, source),
            Command::Nmea { nmea } => self.on_nmea(nmea),
            Command::Data { data, ms_in_week } => self.on_data(data, ms_in_week),
            Command::Measurements {
                measurements,
                ms_in_week,
            } => self.on_measurements(measurements, ms_in_week),
            Command::SystemInfo { info } => self.on_system_info(info),
            Command::NiNotify {
                notification,
                payload,
            } => self.request_ni_notify(notification, payload),
            Command::RequestAtl { handle, agps_type } => self.request_atl(handle, agps_type),
            Command::ReleaseAtl { handle } => self.release_atl(handle),
            Command::DataCallOpened => {
                self.data_conn_open(AgpsType::SuplEs, String::new(), ApnIpType::Ipv4)
            }
            Command::DataCallClosed => self.data_conn_closed(AgpsType::SuplEs),
            Command::DataConnOpen {
                agps_type,
                apn,
                bearer,
            } => self.data_conn_open(agps_type, apn, bearer),
            Command::DataConnClosed { agps_type } => self.data_conn_closed(agps_type),
            Command::DataConnFailed { agps_type } => self.data_conn_failed(agps_type),
            Command::EngineCompleted { operation, error } => {
                self.complete_operation(operation, error)
            }
            Command::ConfigPushed { responses } => self.config_pushed(responses),
            Command::NiTimeout { class, request_id } => self.ni_timeout(class, request_id),
        }
    }

    fn add_client(&mut self, client: ClientId, callbacks: LocationCallbacks) {
        if let Some(system_info) = &callbacks.system_info {
            if !self.system_info.is_empty() {
                let _ = system_info.send(self.system_info);
            }
        }
        self.clients.insert(client, callbacks);
        info!("{} registered", client);
        self.update_event_mask();
    }

    fn remove_client(&mut self, client: ClientId) {
        self.stop_client_sessions(client);
        if self.clients.remove(client).is_some() {
            info!("{} removed", client);
            self.update_event_mask();
        }
    }

    fn update_event_mask(&self) {
        let nmea_provider = self.config.read(|conf| conf.nmea_provider);
        let mut mask = self.clients.event_mask(nmea_provider);
        if self.engine_hub_loaded {
            mask |= EngineEventMask::GNSS_MEASUREMENT
                | EngineEventMask::GNSS_SV_POLYNOMIAL_REPORT
                | EngineEventMask::PARSED_UNPROPAGATED_POSITION_REPORT;
        }
        if self.data_connectivity.is_some() {
            mask |= EngineEventMask::LOCATION_SERVER_REQUEST;
        }
        mask |= EngineEventMask::LOC_SYSTEM_INFO;
        debug!("Engine event mask {:#x}", mask.bits());
        self.engine.update_event_mask(mask);
    }

    fn engine_up(&mut self) {
        info!("Engine up");
        self.ni.reset();
        self.push_startup_config();
        self.broadcast_capabilities();
        self.restart_sessions();
    }

    pub(crate) fn report_response(&self, client: ClientId, id: u32, error: LocationError) {
        let delivered = self
            .clients
            .get(client)
            .is_some_and(|callbacks| client::notify(&callbacks.response, Response::new(id, error)));
        if !delivered {
            debug!("Response {} for {} session {} not delivered", error, client, id);
        }
    }
}

#[async_trait]
impl Module for GnssAdapter {
    async fn run(&mut self) -> Result<(), ()> {
        info!("GNSS adapter running");
        while let Some(command) = self.ctx.next().await {
            if matches!(command, Command::Quit) {
                break;
            }
            self.handle_command(command);
        }
        self.ni.reset();
        info!("GNSS adapter stopped");
        Ok(())
    }
}
