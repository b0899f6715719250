// SPDX-FileCopyrightText: 2026 All contributors
//
// SPDX-License-Identifier: GPL-2.0-or-later

//! Interfaces of the positioning engine.
//!
//! Fix control calls are fire and forget and hand their outcome to a
//! [`Completion`]. Configuration calls block the calling thread and return
//! their outcome directly, the adapter only invokes them from the blocking
//! pool.

use crate::command::{Command, PendingOperation};
use common::{
    agps::{AgpsType, ApnIpType},
    config::{AGlonassProtocol, GpsLock, LppProfile, LppeMask, SuplVersion},
    error::LocationError,
    ni::{GnssNiResponse, NiPayload},
    report::EngineEventMask,
    tracking::{GnssAidingData, PositionMode},
};
use module_core::CommandSender;
use std::net::Ipv4Addr;
use tracing::debug;

/// Completion handler of an asynchronous engine call.
///
/// The engine calls [`Completion::complete`] once, from any thread. The
/// outcome is processed by the adapter in queue order.
#[must_use = "the adapter waits for the completion"]
pub struct Completion {
    sender: CommandSender<Command>,
    operation: PendingOperation,
}

impl Completion {
    pub(crate) fn new(sender: CommandSender<Command>, operation: PendingOperation) -> Self {
        Completion { sender, operation }
    }

    pub fn complete(self, error: LocationError) {
        let operation = self.operation;
        if self
            .sender
            .send(Command::EngineCompleted { operation, error })
            .is_err()
        {
            debug!("Adapter stopped before {:?} completed", operation);
        }
    }
}

impl std::fmt::Debug for Completion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Completion")
            .field("operation", &self.operation)
            .finish()
    }
}

/// Asynchronous part of the engine interface.
pub trait FixControl: Send + Sync {
    /// Starts, or restarts with a new configuration, the one engine session.
    fn start_fix(&self, mode: PositionMode, completion: Completion);

    /// Stops the engine session.
    fn stop_fix(&self, completion: Completion);

    /// Changes the mode of the running session without restarting it.

    fn set_position_mode(&self, mode: PositionMode);

    fn delete_aiding_data(&self, data: GnssAidingData, completion: Completion);

    /// Answers an NI request with the payload the engine attached to it.
    fn inform_ni_response(&self, response: GnssNiResponse, payload: NiPayload);

    /// Selects the reports the engine sends.
    fn update_event_mask(&self, mask: EngineEventMask);

    /// Acknowledges an ATL request. The engine blocks until it gets this.
    fn atl_open_status(
        &self,
        handle: u32,
        success: bool,
        apn: &str,
        bearer: ApnIpType,
        agps_type: AgpsType,
    );

    fn atl_close_status(&self, handle: u32, success: bool);

    /// Opens the emergency data call through the modem's own data service.
    ///
    /// The outcome arrives later as a data call opened or closed event.
    fn open_and_start_data_call(&self) -> LocationError;

    fn stop_data_call(&self);
}

/// Blocking part of the engine interface.
///
/// The adapter makes these calls off its task, one at a time, in the order
/// they were requested.
pub trait ConfigControl: Send + Sync {
    /// Locks positioning sessions by their origin.
    fn set_gps_lock_sync(&self, lock: GpsLock) -> LocationError;

    /// Sets the SUPL server as `host:port`, an empty URL clears it.
    fn set_server_sync(&self, url: &str) -> LocationError;

    /// Sets a C2K PDE server by address.
    fn set_c2k_server_sync(&self, ip: Ipv4Addr, port: u16) -> LocationError;

    fn set_supl_version_sync(&self, version: SuplVersion) -> LocationError;

    fn set_lpp_config_sync(&self, profile: LppProfile) -> LocationError;

    fn set_lppe_cp_sync(&self, mask: LppeMask) -> LocationError;

    fn set_lppe_up_sync(&self, mask: LppeMask) -> LocationError;

    fn set_aglonass_protocol_sync(&self, protocol: AGlonassProtocol) -> LocationError;
}

/// A complete positioning engine.
pub trait HardwareEngine: FixControl + ConfigControl {}

impl<T: FixControl + ConfigControl + ?Sized> HardwareEngine for T {}
