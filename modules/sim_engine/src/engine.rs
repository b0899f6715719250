// SPDX-FileCopyrightText: 2026 All contributors
//
// SPDX-License-Identifier: GPL-2.0-or-later

use crate::track::Track;
use chrono::Utc;
use common::{
    agps::{AgpsType, ApnIpType},
    config::{AGlonassProtocol, GpsLock, LppProfile, LppeMask, SuplVersion},
    error::LocationError,
    ni::{GnssNiResponse, NiPayload},
    position::{Dop, Reliability},
    report::{EngineEventMask, FixStatus, PosTechMask, PositionReport, RawFix, ReportSource},
    sv::{GnssSv, GnssSvNotification, GnssSvUsedInPosition, SvType},
    tracking::{GnssAidingData, PositionMode},
};
use gnss_adapter::{Completion, ConfigControl, EngineEvents, FixControl};
use std::{
    net::Ipv4Addr,
    sync::{Arc, Mutex, MutexGuard, OnceLock},
    time::Duration,
};
use tokio::{runtime::Handle, task::AbortHandle, time::Instant};
use tracing::{debug, info, warn};

/// Report interval of a fix started without one.
pub const DEFAULT_FIX_INTERVAL_MS: u32 = 1000;

/// Satellites in view: type, id, elevation, azimuth and whether it is used.
const SKY: [(SvType, u16, f32, f32, bool); 8] = [
    (SvType::Gps, 2, 67.0, 41.0, true),
    (SvType::Gps, 5, 34.0, 122.0, true),
    (SvType::Gps, 12, 51.0, 268.0, true),
    (SvType::Gps, 15, 12.0, 311.0, false),
    (SvType::Gps, 24, 45.0, 190.0, true),
    (SvType::Glonass, 3, 58.0, 77.0, true),
    (SvType::Glonass, 9, 22.0, 215.0, false),
    (SvType::Galileo, 11, 39.0, 160.0, true),
];

/// What the adapter configured through the blocking calls.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineSettings {
    pub gps_lock: GpsLock,
    pub supl_server: String,
    pub c2k_server: Option<(Ipv4Addr, u16)>,
    pub supl_version: SuplVersion,
    pub lpp_profile: LppProfile,
    pub lppe_control_plane: LppeMask,
    pub lppe_user_plane: LppeMask,
    pub aglonass_protocol: AGlonassProtocol,
    pub event_mask: EngineEventMask,
}

#[derive(Debug, Default)]
struct SimState {
    mode: Option<PositionMode>,
    ticker: Option<AbortHandle>,
    settings: EngineSettings,
}

/// Positioning engine that drives along a [`Track`] at constant speed.
///
/// The adapter is created with the engine, so its events are attached
/// afterwards with [`SimulatedEngine::attach`].
pub struct SimulatedEngine {
    track: Arc<Track>,
    speed_mps: f64,
    events: OnceLock<EngineEvents>,
    state: Mutex<SimState>,
}

impl SimulatedEngine {
    pub fn new(track: Track, speed_mps: f64) -> Self {
        SimulatedEngine {
            track: Arc::new(track),
            speed_mps,
            events: OnceLock::new(),
            state: Mutex::new(SimState::default()),
        }
    }

    /// Sets where reports go. Only the first call has an effect.
    pub fn attach(&self, events: EngineEvents) {
        if self.events.set(events).is_err() {
            warn!("Simulated engine is already attached");
        }
    }

    pub fn settings(&self) -> EngineSettings {
        self.state().settings.clone()
    }

    pub fn is_running(&self) -> bool {
        self.state().ticker.is_some()
    }

    fn state(&self) -> MutexGuard<'_, SimState> {
        self.state.lock().unwrap_or_else(|state| state.into_inner())
    }

    fn configure(&self, update: impl FnOnce(&mut EngineSettings)) -> LocationError {
        update(&mut self.state().settings);
        LocationError::Success
    }

    fn stop_ticker(&self) -> bool {
        match self.state().ticker.take() {
            Some(ticker) => {
                ticker.abort();
                true
            }
            None => false,
        }
    }
}

impl Drop for SimulatedEngine {
    fn drop(&mut self) {
        self.stop_ticker();
    }
}

impl FixControl for SimulatedEngine {
    fn start_fix(&self, mode: PositionMode, completion: Completion) {
        let (Some(events), Ok(runtime)) = (self.events.get(), Handle::try_current()) else {
            warn!("Simulated engine can't start without adapter events and runtime");
            completion.complete(LocationError::GeneralFailure);
            return;
        };
        let interval_ms = match mode.min_interval_ms {
            0 => DEFAULT_FIX_INTERVAL_MS,
            interval_ms => interval_ms,
        };

        self.stop_ticker();
        let ticker = runtime.spawn(drive(
            self.track.clone(),
            self.speed_mps,
            events.clone(),
            Duration::from_millis(interval_ms.into()),
        ));
        let mut state = self.state();
        state.mode = Some(mode);
        state.ticker = Some(ticker.abort_handle());
        drop(state);

        info!("Fix started, reporting every {} ms", interval_ms);
        completion.complete(LocationError::Success);
    }

    fn stop_fix(&self, completion: Completion) {
        if self.stop_ticker() {
            info!("Fix stopped");
        }
        completion.complete(LocationError::Success);
    }

    fn set_position_mode(&self, mode: PositionMode) {
        debug!("Position mode {:?}", mode);
        self.state().mode = Some(mode);
    }

    fn delete_aiding_data(&self, data: GnssAidingData, completion: Completion) {
        debug!("Deleting aiding data {:?}", data);
        completion.complete(LocationError::Success);
    }

    fn inform_ni_response(&self, response: GnssNiResponse, payload: NiPayload) {
        info!(
            "NI response {} for a {} byte request",
            response,
            payload.as_bytes().len()
        );
    }

    fn update_event_mask(&self, mask: EngineEventMask) {
        self.state().settings.event_mask = mask;
    }

    fn atl_open_status(
        &self,
        handle: u32,
        success: bool,
        apn: &str,
        bearer: ApnIpType,
        agps_type: AgpsType,
    ) {
        debug!(
            "ATL {} ({}) open: {} on '{}' {}",
            handle, agps_type, success, apn, bearer
        );
    }

    fn atl_close_status(&self, handle: u32, success: bool) {
        debug!("ATL {} closed: {}", handle, success);
    }

    fn open_and_start_data_call(&self) -> LocationError {
        match self.events.get() {
            Some(events) if events.report_data_call_opened().is_ok() => LocationError::Success,
            _ => LocationError::GeneralFailure,
        }
    }

    fn stop_data_call(&self) {
        if let Some(events) = self.events.get() {
            let _ = events.report_data_call_closed();
        }
    }
}

impl ConfigControl for SimulatedEngine {
    fn set_gps_lock_sync(&self, lock: GpsLock) -> LocationError {
        self.configure(|settings| settings.gps_lock = lock)
    }

    fn set_server_sync(&self, url: &str) -> LocationError {
        self.configure(|settings| settings.supl_server = url.to_string())
    }

    fn set_c2k_server_sync(&self, ip: Ipv4Addr, port: u16) -> LocationError {
        self.configure(|settings| settings.c2k_server = Some((ip, port)))
    }

    fn set_supl_version_sync(&self, version: SuplVersion) -> LocationError {
        self.configure(|settings| settings.supl_version = version)
    }

    fn set_lpp_config_sync(&self, profile: LppProfile) -> LocationError {
        self.configure(|settings| settings.lpp_profile = profile)
    }

    fn set_lppe_cp_sync(&self, mask: LppeMask) -> LocationError {
        self.configure(|settings| settings.lppe_control_plane = mask)
    }

    fn set_lppe_up_sync(&self, mask: LppeMask) -> LocationError {
        self.configure(|settings| settings.lppe_user_plane = mask)
    }

    fn set_aglonass_protocol_sync(&self, protocol: AGlonassProtocol) -> LocationError {
        self.configure(|settings| settings.aglonass_protocol = protocol)
    }
}

/// Reports the track position every `interval` until the adapter goes away.
async fn drive(track: Arc<Track>, speed_mps: f64, events: EngineEvents, interval: Duration) {
    let started = Instant::now();
    let mut timer = tokio::time::interval(interval);
    loop {
        timer.tick().await;
        let distance = started.elapsed().as_secs_f64() * speed_mps;
        let Some(point) = track.point_at(distance) else {
            warn!("Track point at {:.1} m can't be converted", distance);
            continue;
        };

        let mut report = PositionReport {
            fix: RawFix {
                position: Some(point.position),
                altitude: Some(0.0),
                speed: Some(speed_mps as f32),
                bearing: Some(point.bearing),
                accuracy: Some(3.5),
                timestamp_ms: Utc::now().timestamp_millis().max(0) as u64,
            },
            status: FixStatus::Success,
            tech_mask: PosTechMask::SATELLITE,
            ..Default::default()
        };
        report.extended.horizontal_reliability = Some(Reliability::High);
        report.extended.dop = Some(Dop {
            pdop: 1.6,
            hdop: 0.9,
            vdop: 1.3,
        });
        report.extended.sv_used_in_position = Some(sv_used());
        report.extended.num_sv_used = Some(SKY.iter().filter(|sv| sv.4).count() as u16);

        let sent = events
            .report_position(report, ReportSource::Engine)
            .and_then(|_| events.report_sv(sky(), ReportSource::Engine));
        if sent.is_err() {
            debug!("Adapter is gone, stopping the track");
            break;
        }
    }
}

fn sv_used() -> GnssSvUsedInPosition {
    SKY.iter()
        .filter(|(_, _, _, _, used)| *used)
        .fold(GnssSvUsedInPosition::default(), |mut mask, (sv_type, sv_id, ..)| {
            let bit = 1u64 << (sv_id - 1);
            match sv_type {
                SvType::Gps => mask.gps |= bit,
                SvType::Glonass => mask.glonass |= bit,
                SvType::Galileo => mask.galileo |= bit,
                SvType::Beidou => mask.beidou |= bit,
                SvType::Qzss => mask.qzss |= bit,
                SvType::Sbas | SvType::Unknown => {}
            }
            mask
        })
}

/// The satellites in view. Usage is left to the adapter.
fn sky() -> GnssSvNotification {
    GnssSvNotification {
        svs: SKY
            .iter()
            .map(|(sv_type, sv_id, elevation, azimuth, _)| GnssSv {
                sv_id: *sv_id,
                sv_type: *sv_type,
                cn0_dbhz: 20.0 + elevation / 3.0,
                elevation: *elevation,
                azimuth: *azimuth,
                carrier_frequency_hz: None,
                has_ephemeris: true,
                has_almanac: true,
                used_in_fix: false,
            })
            .collect(),
    }
}
