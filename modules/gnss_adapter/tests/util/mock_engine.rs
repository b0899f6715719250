// SPDX-FileCopyrightText: 2026 All contributors
//
// SPDX-License-Identifier: GPL-2.0-or-later

use common::{
    agps::{AgpsType, ApnIpType},
    config::{AGlonassProtocol, GpsLock, LppProfile, LppeMask, SuplVersion},
    error::LocationError,
    ni::{GnssNiResponse, NiPayload},
    report::{EngineEventMask, PositionReport},
    signal::LocationSystemInfo,
    sv::GnssSvNotification,
    tracking::{GnssAidingData, PositionMode},
};
use gnss_adapter::{
    Completion, ConfigControl, DataConnectivity, EngineHub, FixControl, SystemStatus,
    SystemStatusReport,
};
use std::{
    net::Ipv4Addr,
    sync::{
        Mutex,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};

/// Every engine call the adapter makes, in call order.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineCall {
    StartFix(PositionMode),
    StopFix,
    SetPositionMode(PositionMode),
    DeleteAidingData(GnssAidingData),
    NiResponse(GnssNiResponse, Vec<u8>),
    AtlOpen {
        handle: u32,
        success: bool,
        apn: String,
        bearer: ApnIpType,
        agps_type: AgpsType,
    },
    AtlClose {
        handle: u32,
        success: bool,
    },
    OpenDataCall,
    StopDataCall,
    GpsLock(GpsLock),
    Server(String),
    C2kServer(Ipv4Addr, u16),
    SuplVersion(SuplVersion),
    LppProfile(LppProfile),
    LppeControlPlane(LppeMask),
    LppeUserPlane(LppeMask),
    AGlonassProtocol(AGlonassProtocol),
}

/// Records calls and answers them with configurable outcomes.
pub struct MockEngine {
    calls: UnboundedSender<EngineCall>,
    event_masks: Mutex<Vec<EngineEventMask>>,
    fix_result: Mutex<LocationError>,
    config_result: Mutex<LocationError>,
    data_call_result: Mutex<LocationError>,
    hold_completions: AtomicBool,
    held: Mutex<Vec<Completion>>,
    slow_gps_lock: Mutex<Option<(GpsLock, Duration)>>,
}

impl MockEngine {
    pub fn new() -> (Self, UnboundedReceiver<EngineCall>) {
        let (calls, calls_rx) = unbounded_channel();
        let engine = MockEngine {
            calls,
            event_masks: Mutex::new(Vec::new()),
            fix_result: Mutex::new(LocationError::Success),
            config_result: Mutex::new(LocationError::Success),
            data_call_result: Mutex::new(LocationError::Success),
            hold_completions: AtomicBool::new(false),
            held: Mutex::new(Vec::new()),
            slow_gps_lock: Mutex::new(None),
        };
        (engine, calls_rx)
    }

    /// Outcome of the following start, stop and delete calls.
    pub fn set_fix_result(&self, error: LocationError) {
        *self.fix_result.lock().unwrap() = error;
    }

    /// Outcome of the following blocking configuration calls.
    pub fn set_config_result(&self, error: LocationError) {
        *self.config_result.lock().unwrap() = error;
    }

    pub fn set_data_call_result(&self, error: LocationError) {
        *self.data_call_result.lock().unwrap() = error;
    }

    /// Blocks every following call setting `lock` for `delay`.
    pub fn slow_gps_lock(&self, lock: GpsLock, delay: Duration) {
        *self.slow_gps_lock.lock().unwrap() = Some((lock, delay));
    }

    /// Keeps completions until [`MockEngine::release_completions`].
    pub fn hold_completions(&self, hold: bool) {
        self.hold_completions.store(hold, Ordering::SeqCst);
    }

    pub fn release_completions(&self) {
        let held: Vec<Completion> = self.held.lock().unwrap().drain(..).collect();
        let error = *self.fix_result.lock().unwrap();
        for completion in held {
            completion.complete(error);
        }
    }

    pub fn last_event_mask(&self) -> Option<EngineEventMask> {
        self.event_masks.lock().unwrap().last().copied()
    }

    fn record(&self, call: EngineCall) {
        let _ = self.calls.send(call);
    }

    fn complete(&self, completion: Completion) {
        if self.hold_completions.load(Ordering::SeqCst) {
            self.held.lock().unwrap().push(completion);
        } else {
            completion.complete(*self.fix_result.lock().unwrap());
        }
    }

    fn config(&self, call: EngineCall) -> LocationError {
        self.record(call);
        *self.config_result.lock().unwrap()
    }
}

impl FixControl for MockEngine {
    fn start_fix(&self, mode: PositionMode, completion: Completion) {
        self.record(EngineCall::StartFix(mode));
        self.complete(completion);
    }

    fn stop_fix(&self, completion: Completion) {
        self.record(EngineCall::StopFix);
        self.complete(completion);
    }

    fn set_position_mode(&self, mode: PositionMode) {
        self.record(EngineCall::SetPositionMode(mode));
    }

    fn delete_aiding_data(&self, data: GnssAidingData, completion: Completion) {
        self.record(EngineCall::DeleteAidingData(data));
        self.complete(completion);
    }

    fn inform_ni_response(&self, response: GnssNiResponse, payload: NiPayload) {
        self.record(EngineCall::NiResponse(response, payload.as_bytes().to_vec()));
    }

    fn update_event_mask(&self, mask: EngineEventMask) {
        self.event_masks.lock().unwrap().push(mask);
    }

    fn atl_open_status(
        &self,
        handle: u32,
        success: bool,
        apn: &str,
        bearer: ApnIpType,
        agps_type: AgpsType,
    ) {
        self.record(EngineCall::AtlOpen {
            handle,
            success,
            apn: apn.to_string(),
            bearer,
            agps_type,
        });
    }

    fn atl_close_status(&self, handle: u32, success: bool) {
        self.record(EngineCall::AtlClose { handle, success });
    }

    fn open_and_start_data_call(&self) -> LocationError {
        self.record(EngineCall::OpenDataCall);
        *self.data_call_result.lock().unwrap()
    }

    fn stop_data_call(&self) {
        self.record(EngineCall::StopDataCall);
    }
}

impl ConfigControl for MockEngine {
    fn set_gps_lock_sync(&self, lock: GpsLock) -> LocationError {
        let slow = *self.slow_gps_lock.lock().unwrap();
        if let Some((slow_lock, delay)) = slow {
            if slow_lock == lock {
                std::thread::sleep(delay);
            }
        }
        self.config(EngineCall::GpsLock(lock))
    }

    fn set_server_sync(&self, url: &str) -> LocationError {
        self.config(EngineCall::Server(url.to_string()))
    }

    fn set_c2k_server_sync(&self, ip: Ipv4Addr, port: u16) -> LocationError {
        self.config(EngineCall::C2kServer(ip, port))
    }

    fn set_supl_version_sync(&self, version: SuplVersion) -> LocationError {
        self.config(EngineCall::SuplVersion(version))
    }

    fn set_lpp_config_sync(&self, profile: LppProfile) -> LocationError {
        self.config(EngineCall::LppProfile(profile))
    }

    fn set_lppe_cp_sync(&self, mask: LppeMask) -> LocationError {
        self.config(EngineCall::LppeControlPlane(mask))
    }

    fn set_lppe_up_sync(&self, mask: LppeMask) -> LocationError {
        self.config(EngineCall::LppeUserPlane(mask))
    }

    fn set_aglonass_protocol_sync(&self, protocol: AGlonassProtocol) -> LocationError {
        self.config(EngineCall::AGlonassProtocol(protocol))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DataCall {
    Request(AgpsType),
    Release(AgpsType),
}

pub struct MockDataConnectivity {
    calls: UnboundedSender<DataCall>,
}

impl MockDataConnectivity {
    pub fn new() -> (Self, UnboundedReceiver<DataCall>) {
        let (calls, calls_rx) = unbounded_channel();
        (MockDataConnectivity { calls }, calls_rx)
    }
}

impl DataConnectivity for MockDataConnectivity {
    fn request_data_call(&self, agps_type: AgpsType) {
        let _ = self.calls.send(DataCall::Request(agps_type));
    }

    fn release_data_call(&self, agps_type: AgpsType) {
        let _ = self.calls.send(DataCall::Release(agps_type));
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum HubCall {
    SetFixMode(PositionMode),
    StartFix,
    StopFix,
    Position(PositionReport),
    Sv(GnssSvNotification),
    SystemInfo(LocationSystemInfo),
    DeleteAidingData(GnssAidingData),
}

/// A secondary engine that records what it is given.
pub struct MockEngineHub {
    loaded: bool,
    calls: UnboundedSender<HubCall>,
}

impl MockEngineHub {
    pub fn new(loaded: bool) -> (Self, UnboundedReceiver<HubCall>) {
        let (calls, calls_rx) = unbounded_channel();
        (MockEngineHub { loaded, calls }, calls_rx)
    }

    fn record(&self, call: HubCall) {
        let _ = self.calls.send(call);
    }
}

impl EngineHub for MockEngineHub {
    fn is_loaded(&self) -> bool {
        self.loaded
    }

    fn set_fix_mode(&self, mode: &PositionMode) {
        self.record(HubCall::SetFixMode(*mode));
    }

    fn start_fix(&self) {
        self.record(HubCall::StartFix);
    }

    fn stop_fix(&self) {
        self.record(HubCall::StopFix);
    }

    fn report_position(&self, report: &PositionReport) {
        self.record(HubCall::Position(report.clone()));
    }

    fn report_sv(&self, svs: &GnssSvNotification) {
        self.record(HubCall::Sv(svs.clone()));
    }

    fn report_system_info(&self, info: &LocationSystemInfo) {
        self.record(HubCall::SystemInfo(*info));
    }

    fn delete_aiding_data(&self, data: &GnssAidingData) {
        self.record(HubCall::DeleteAidingData(*data));
    }
}

/// System status with a fixed report that swallows `$PQWM` sentences.
#[derive(Default)]
pub struct MockSystemStatus {
    pub report: Mutex<SystemStatusReport>,
}

impl SystemStatus for MockSystemStatus {
    fn report(&self, _latest_only: bool) -> SystemStatusReport {
        *self.report.lock().unwrap()
    }

    fn set_nmea_string(&self, nmea: &str) -> bool {
        nmea.starts_with("$PQWM")
    }
}
