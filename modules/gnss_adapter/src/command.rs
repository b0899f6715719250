// SPDX-FileCopyrightText: 2026 All contributors
//
// SPDX-License-Identifier: GPL-2.0-or-later

use crate::{
    client::{ClientId, ControlCallbacks, LocationCallbacks},
    tracking::TrackingSessionKey,
};
use common::{
    agps::{AgpsType, ApnIpType},
    config::GnssConfig,
    error::{LocationError, Response},
    ni::{GnssNiNotification, GnssNiResponse, NiPayload},
    report::{PositionReport, ReportSource},
    signal::{GnssDataNotification, GnssMeasurementsNotification, LocationSystemInfo},
    sv::GnssSvNotification,
    tracking::{GnssAidingData, PositionMode, TechnologyType, TrackingOptions},
};
use module_core::QueueCommand;
use strum_macros::IntoStaticStr;
use tokio::sync::oneshot;

/// Everything the adapter does is one of these, processed in enqueue order.
#[derive(Debug, IntoStaticStr)]
pub enum Command {
    Quit,

    AddClient {
        client: ClientId,
        callbacks: LocationCallbacks,
    },
    RemoveClient {
        client: ClientId,
        done: Option<oneshot::Sender<()>>,
    },
    RequestCapabilities {
        client: ClientId,
    },
    StartTracking {
        client: ClientId,
        id: u32,
        options: TrackingOptions,
    },
    UpdateTracking {
        client: ClientId,
        id: u32,
        options: TrackingOptions,
    },
    StopTracking {
        client: ClientId,
        id: u32,
    },
    SetPositionMode {
        mode: PositionMode,
    },
    NiResponse {
        client: ClientId,
        id: u32,
        response: GnssNiResponse,
    },

    SetControlCallbacks {
        callbacks: ControlCallbacks,
    },
    Enable {
        id: u32,
        technology: TechnologyType,
    },
    Disable {
        id: u32,
    },
    UpdateConfig {
        config: GnssConfig,
        ids: Vec<u32>,
    },
    DeleteAidingData {
        id: u32,
        data: GnssAidingData,
    },

    EngineUp,
    Position {
        report: Box<PositionReport>,
        source: ReportSource,
    },
    Sv {
        svs: GnssSvNotification,
        source: ReportSource,
    },
    Nmea {
        nmea: String,
    },
    Data {
        data: GnssDataNotification,
        ms_in_week: Option<u32>,
    },
    Measurements {
        measurements: GnssMeasurementsNotification,
        ms_in_week: Option<u32>,
    },
    SystemInfo {
        info: LocationSystemInfo,
    },
    NiNotify {
        notification: GnssNiNotification,
        payload: NiPayload,
    },
    RequestAtl {
        handle: u32,
        agps_type: AgpsType,
    },
    ReleaseAtl {
        handle: u32,
    },
    DataCallOpened,
    DataCallClosed,

    DataConnOpen {
        agps_type: AgpsType,
        apn: String,
        bearer: ApnIpType,
    },
    DataConnClosed {
        agps_type: AgpsType,
    },
    DataConnFailed {
        agps_type: AgpsType,
    },

    EngineCompleted {
        operation: PendingOperation,
        error: LocationError,
    },
    /// A configuration batch reached the engine. Carries the collective
    /// response when a client waits for one.
    ConfigPushed {
        responses: Option<Vec<Response>>,
    },
    NiTimeout {
        class: NiClass,
        request_id: u32,
    },
}

impl QueueCommand for Command {
    fn quit() -> Self {
        Command::Quit
    }
}

/// The adapter operation waiting for an asynchronous engine call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingOperation {
    /// Erase the session if the engine refused the start.
    Start(TrackingSessionKey),
    /// Restore the previous options if the engine refused the update.
    Update {
        key: TrackingSessionKey,
        previous: TrackingOptions,
    },
    Stop(TrackingSessionKey),
    DeleteAidingData(u32),
    /// Nobody waits for the answer.
    Silent,
}

/// The two independent NI slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NiClass {
    Normal,
    Emergency,
}
