// SPDX-FileCopyrightText: 2026 All contributors
//
// SPDX-License-Identifier: GPL-2.0-or-later

#![allow(dead_code)]

pub mod mock_engine;

use common::{
    config::{GpsConf, LocationCapabilities},
    error::Response,
    ni::NiRequest,
    position::{GnssLocationInfo, Location},
    report::GnssNmeaNotification,
    signal::{GnssDataNotification, GnssMeasurementsNotification, LocationSystemInfo},
    sv::GnssSvNotification,
};
use gnss_adapter::{
    AdapterHandle, ConfigStore, ControlCallbacks, DataConnEvents, EngineEvents, GnssAdapter,
    GnssAdapterBuilder, LocationCallbacks,
};
use mock_engine::{EngineCall, MockEngine};
use module_core::{CommandSender, Module, test_helper::stop_module};
use std::{sync::Arc, time::Duration};
use tokio::{
    sync::mpsc::{UnboundedReceiver, unbounded_channel},
    task::JoinHandle,
};

pub const TIMEOUT: Duration = Duration::from_millis(500);
pub const SILENCE: Duration = Duration::from_millis(50);

pub struct TestAdapter {
    pub handle: AdapterHandle,
    pub events: EngineEvents,
    pub data_conn: DataConnEvents,
    pub engine: Arc<MockEngine>,
    pub calls: UnboundedReceiver<EngineCall>,
    pub config: ConfigStore,
    sender: CommandSender<gnss_adapter::Command>,
    task: JoinHandle<Result<(), ()>>,
}

impl TestAdapter {
    pub fn start(conf: GpsConf) -> Self {
        Self::start_with(conf, |builder| builder)
    }

    /// Starts an adapter with extra collaborators set on the builder.
    pub fn start_with(
        conf: GpsConf,
        configure: impl FnOnce(GnssAdapterBuilder) -> GnssAdapterBuilder,
    ) -> Self {
        let (engine, calls) = MockEngine::new();
        let engine = Arc::new(engine);
        let config = ConfigStore::new(conf);
        let adapter = configure(GnssAdapter::builder(engine.clone(), config.clone())).build();

        let handle = adapter.handle();
        let events = adapter.engine_events();
        let data_conn = adapter.data_conn_events();
        let sender = adapter.sender();
        let task = tokio::spawn(async move {
            let mut adapter = adapter;
            adapter.run().await
        });

        TestAdapter {
            handle,
            events,
            data_conn,
            engine,
            calls,
            config,
            sender,
            task,
        }
    }

    pub async fn next_call(&mut self) -> EngineCall {
        module_core::test_helper::wait_for(&mut self.calls, TIMEOUT).await
    }

    pub async fn assert_no_call(&mut self) {
        module_core::test_helper::assert_no_message(&mut self.calls, SILENCE).await;
    }

    pub async fn stop(mut self) {
        stop_module(&self.sender, &mut self.task).await;
    }
}

/// Receiving ends of every callback a client can register.
pub struct TestClient {
    pub tracking: UnboundedReceiver<Location>,
    pub location_info: UnboundedReceiver<GnssLocationInfo>,
    pub sv: UnboundedReceiver<GnssSvNotification>,
    pub nmea: UnboundedReceiver<GnssNmeaNotification>,
    pub measurements: UnboundedReceiver<GnssMeasurementsNotification>,
    pub data: UnboundedReceiver<GnssDataNotification>,
    pub ni: UnboundedReceiver<NiRequest>,
    pub capabilities: UnboundedReceiver<LocationCapabilities>,
    pub response: UnboundedReceiver<Response>,
    pub system_info: UnboundedReceiver<LocationSystemInfo>,
}

impl TestClient {
    /// Callbacks for everything but detailed location info, which would
    /// replace the tracking callback.
    pub fn new() -> (LocationCallbacks, TestClient) {
        let (tracking, tracking_rx) = unbounded_channel();
        let (_, location_info_rx) = unbounded_channel();
        let (sv, sv_rx) = unbounded_channel();
        let (nmea, nmea_rx) = unbounded_channel();
        let (measurements, measurements_rx) = unbounded_channel();
        let (data, data_rx) = unbounded_channel();
        let (ni, ni_rx) = unbounded_channel();
        let (capabilities, capabilities_rx) = unbounded_channel();
        let (response, response_rx) = unbounded_channel();
        let (system_info, system_info_rx) = unbounded_channel();

        let callbacks = LocationCallbacks {
            tracking: Some(tracking),
            location_info: None,
            sv: Some(sv),
            nmea: Some(nmea),
            measurements: Some(measurements),
            data: Some(data),
            ni: Some(ni),
            capabilities: Some(capabilities),
            response: Some(response),
            system_info: Some(system_info),
        };
        let client = TestClient {
            tracking: tracking_rx,
            location_info: location_info_rx,
            sv: sv_rx,
            nmea: nmea_rx,
            measurements: measurements_rx,
            data: data_rx,
            ni: ni_rx,
            capabilities: capabilities_rx,
            response: response_rx,
            system_info: system_info_rx,
        };
        (callbacks, client)
    }

    /// Like [`TestClient::new`] but fixes arrive as detailed location info.
    pub fn with_location_info() -> (LocationCallbacks, TestClient) {
        let (mut callbacks, mut client) = Self::new();
        let (location_info, location_info_rx) = unbounded_channel();
        callbacks.location_info = Some(location_info);
        client.location_info = location_info_rx;
        (callbacks, client)
    }

    pub async fn next_response(&mut self) -> Response {
        module_core::test_helper::wait_for(&mut self.response, TIMEOUT).await
    }
}

/// Receiving ends of the control client callbacks.
pub struct TestControl {
    pub response: UnboundedReceiver<Response>,
    pub collective: UnboundedReceiver<Vec<Response>>,
}

impl TestControl {
    /// Registers the control callbacks on the adapter.
    pub fn register(handle: &AdapterHandle) -> TestControl {
        let (response, response_rx) = unbounded_channel();
        let (collective, collective_rx) = unbounded_channel();
        handle
            .set_control_callbacks(ControlCallbacks {
                response: Some(response),
                collective_response: Some(collective),
            })
            .unwrap();
        TestControl {
            response: response_rx,
            collective: collective_rx,
        }
    }

    pub async fn next_response(&mut self) -> Response {
        module_core::test_helper::wait_for(&mut self.response, TIMEOUT).await
    }

    pub async fn next_collective(&mut self) -> Vec<Response> {
        module_core::test_helper::wait_for(&mut self.collective, TIMEOUT).await
    }
}
