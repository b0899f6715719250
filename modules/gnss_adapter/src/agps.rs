// SPDX-FileCopyrightText: 2026 All contributors
//
// SPDX-License-Identifier: GPL-2.0-or-later

//! Data calls the engine needs for assisted positioning.
//!
//! The engine asks for a connection per ATL handle. Handles of the same
//! AGPS type share one connection, which is acquired for the first handle
//! and torn down when the last one is released. The engine blocks on every
//! request until it gets the matching open or close status.
//!
//! A request that arrives while the connection of its type is still being
//! torn down waits for the close and then acquires a fresh connection.

use crate::GnssAdapter;
use common::{
    agps::{AgpsType, ApnIpType},
    config::CarrierCapabilities,
    error::LocationError,
};
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::{debug, info, warn};

/// The subsystem that brings data connections up and down.
///
/// Outcomes are reported back through
/// [`DataConnEvents`](crate::handle::DataConnEvents).
pub trait DataConnectivity: Send + Sync {
    fn request_data_call(&self, agps_type: AgpsType);

    fn release_data_call(&self, agps_type: AgpsType);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AtlState {
    Requested,
    Open,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct AtlHandle {
    agps_type: AgpsType,
    state: AtlState,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Connection {
    apn: String,
    bearer: ApnIpType,
}

#[derive(Debug, Default)]
pub(crate) struct AgpsManager {
    handles: BTreeMap<u32, AtlHandle>,
    connections: HashMap<AgpsType, Connection>,
    /// Types whose teardown has not been confirmed yet.
    releasing: HashSet<AgpsType>,
}

impl AgpsManager {
    fn has_handles(&self, agps_type: AgpsType) -> bool {
        self.handles.values().any(|atl| atl.agps_type == agps_type)
    }

    /// Removes and returns all handles of a type.
    fn take_handles(&mut self, agps_type: AgpsType) -> Vec<(u32, AtlState)> {
        let taken: Vec<(u32, AtlState)> = self
            .handles
            .iter()
            .filter(|(_, atl)| atl.agps_type == agps_type)
            .map(|(handle, atl)| (*handle, atl.state))
            .collect();
        for (handle, _) in &taken {
            self.handles.remove(handle);
        }
        taken
    }
}

impl GnssAdapter {
    fn agps_enabled(&self) -> bool {
        self.data_connectivity.is_some()
            && self.config.read(|conf| {
                conf.capabilities
                    .intersects(CarrierCapabilities::MSB | CarrierCapabilities::MSA)
            })
    }

    /// Emergency SUPL without the emergency PDN goes through the engine's
    /// own data service.
    fn uses_engine_data_call(&self, agps_type: AgpsType) -> bool {
        agps_type == AgpsType::SuplEs
            && !self
                .config
                .read(|conf| conf.use_emergency_pdn_for_emergency_supl)
    }

    pub(crate) fn request_atl(&mut self, handle: u32, agps_type: AgpsType) {
        if !self.agps_enabled() {
            warn!("AGPS disabled, refusing ATL {} for {}", handle, agps_type);
            self.engine
                .atl_open_status(handle, false, "", ApnIpType::default(), agps_type);
            return;
        }

        if let Some(connection) = self.agps.connections.get(&agps_type) {
            debug!("ATL {} shares open {} connection", handle, agps_type);
            self.engine
                .atl_open_status(handle, true, &connection.apn, connection.bearer, agps_type);
            self.agps.handles.insert(
                handle,
                AtlHandle {
                    agps_type,
                    state: AtlState::Open,
                },
            );
            return;
        }

        let first = !self.agps.has_handles(agps_type);
        self.agps.handles.insert(
            handle,
            AtlHandle {
                agps_type,
                state: AtlState::Requested,
            },
        );
        if self.agps.releasing.contains(&agps_type) {
            debug!("ATL {} waits for the {} teardown", handle, agps_type);
        } else if first {
            info!("Requesting {} data call for ATL {}", agps_type, handle);
            self.acquire_data_call(agps_type);
        }
    }

    fn acquire_data_call(&mut self, agps_type: AgpsType) {
        if self.uses_engine_data_call(agps_type) {
            let error = self.engine.open_and_start_data_call();
            if error != LocationError::Success {
                warn!("Engine data call failed to start: {}", error);
                self.data_conn_failed(agps_type);
            }
        } else if let Some(data_connectivity) = &self.data_connectivity {
            data_connectivity.request_data_call(agps_type);
        }
    }

    fn tear_down_data_call(&mut self, agps_type: AgpsType) {
        self.agps.releasing.insert(agps_type);
        if self.uses_engine_data_call(agps_type) {
            self.engine.stop_data_call();
        } else if let Some(data_connectivity) = &self.data_connectivity {
            data_connectivity.release_data_call(agps_type);
        }
    }

    pub(crate) fn data_conn_open(&mut self, agps_type: AgpsType, apn: String, bearer: ApnIpType) {
        self.agps.releasing.remove(&agps_type);
        let requested: Vec<u32> = self
            .agps
            .handles
            .iter_mut()
            .filter(|(_, atl)| atl.agps_type == agps_type && atl.state == AtlState::Requested)
            .map(|(handle, atl)| {
                atl.state = AtlState::Open;
                *handle
            })
            .collect();

        if !self.agps.has_handles(agps_type) {
            debug!("{} data call opened without users, releasing it", agps_type);
            self.tear_down_data_call(agps_type);
            return;
        }

        info!("{} data call open on '{}' ({})", agps_type, apn, bearer);
        for handle in requested {
            self.engine
                .atl_open_status(handle, true, &apn, bearer, agps_type);
        }
        self.agps
            .connections
            .insert(agps_type, Connection { apn, bearer });
    }

    pub(crate) fn data_conn_closed(&mut self, agps_type: AgpsType) {
        self.agps.connections.remove(&agps_type);
        if self.reacquire_after_teardown(agps_type) {
            return;
        }
        for (handle, state) in self.agps.take_handles(agps_type) {
            match state {
                AtlState::Open => self.engine.atl_close_status(handle, true),
                AtlState::Requested => {
                    self.engine
                        .atl_open_status(handle, false, "", ApnIpType::default(), agps_type)
                }
            }
        }
        debug!("{} data call closed", agps_type);
    }

    pub(crate) fn data_conn_failed(&mut self, agps_type: AgpsType) {
        self.agps.connections.remove(&agps_type);
        if self.reacquire_after_teardown(agps_type) {
            return;
        }
        for (handle, state) in self.agps.take_handles(agps_type) {
            warn!("{} data call failed for ATL {}", agps_type, handle);
            match state {
                AtlState::Open => self.engine.atl_close_status(handle, false),
                AtlState::Requested => {
                    self.engine
                        .atl_open_status(handle, false, "", ApnIpType::default(), agps_type)
                }
            }
        }
    }

    /// Finishes a teardown this adapter started.
    ///
    /// Handles requested in the meantime keep waiting and a new connection
    /// is acquired for them. Returns false if no teardown was pending.
    fn reacquire_after_teardown(&mut self, agps_type: AgpsType) -> bool {
        if !self.agps.releasing.remove(&agps_type) {
            return false;
        }
        debug!("{} data call torn down", agps_type);
        if self.agps.has_handles(agps_type) {
            info!("Requesting {} data call for waiting ATLs", agps_type);
            self.acquire_data_call(agps_type);
        }
        true
    }

    /// Releases the connection of a handle. Unknown handles are ignored.
    pub(crate) fn release_atl(&mut self, handle: u32) {
        let Some(atl) = self.agps.handles.remove(&handle) else {
            debug!("Ignoring release of unknown ATL {}", handle);
            return;
        };
        if !self.agps.has_handles(atl.agps_type) {
            info!("Releasing {} data call", atl.agps_type);
            self.agps.connections.remove(&atl.agps_type);
            self.tear_down_data_call(atl.agps_type);
        }
        self.engine.atl_close_status(handle, true);
    }
}
