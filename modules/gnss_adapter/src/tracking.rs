// SPDX-FileCopyrightText: 2026 All contributors
//
// SPDX-License-Identifier: GPL-2.0-or-later

//! Tracking sessions and their multiplexing onto the one engine session.
//!
//! Every client session is kept in a [`SessionTable`]. The engine always
//! runs with the options of the session with the smallest interval. A
//! session change only reaches the engine when it moves that minimum, all
//! other changes are acknowledged right away.

use crate::{
    GnssAdapter,
    client::ClientId,
    command::PendingOperation,
    engine::Completion,
};
use common::{
    error::LocationError,
    tracking::{PositionMode, TrackingOptions},
};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// Identity of one tracking session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TrackingSessionKey {
    pub client: ClientId,
    pub id: u32,
}

impl TrackingSessionKey {
    pub fn new(client: ClientId, id: u32) -> Self {
        TrackingSessionKey { client, id }
    }
}

/// What the engine has to do after a session change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineAction {
    /// The effective options did not move.
    None,
    /// (Re)start the engine with these options.
    Start(TrackingOptions),
    /// The last session is gone.
    Stop,
}

/// All live sessions, ordered by client and session id.
///
/// On equal intervals the first session in key order is the effective one.
#[derive(Debug, Default)]
pub struct SessionTable {
    sessions: BTreeMap<TrackingSessionKey, TrackingOptions>,
}

impl SessionTable {
    /// Adds a session or replaces the options of an existing one.
    pub fn insert(&mut self, key: TrackingSessionKey, options: TrackingOptions) {
        self.sessions.insert(key, options);
    }

    /// Removes a session, returning its options.
    pub fn remove(&mut self, key: &TrackingSessionKey) -> Option<TrackingOptions> {
        self.sessions.remove(key)
    }

    /// Options of a running session.
    pub fn get(&self, key: &TrackingSessionKey) -> Option<&TrackingOptions> {
        self.sessions.get(key)
    }

    pub fn get_mut(&mut self, key: &TrackingSessionKey) -> Option<&mut TrackingOptions> {
        self.sessions.get_mut(key)
    }

    /// True while no client is tracking.
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Sessions owned by `client`.
    pub fn keys_of(&self, client: ClientId) -> Vec<TrackingSessionKey> {
        self.sessions
            .keys()
            .filter(|key| key.client == client)
            .copied()
            .collect()
    }

    /// The options the engine should run with, `None` without sessions.
    pub fn effective(&self) -> Option<TrackingOptions> {
        self.smallest_excluding(None)
    }

    fn smallest_excluding(&self, excluded: Option<&TrackingSessionKey>) -> Option<TrackingOptions> {
        let mut smallest: Option<TrackingOptions> = None;
        for (key, options) in &self.sessions {
            if Some(key) == excluded {
                continue;
            }
            match smallest {
                Some(current) if current.min_interval_ms <= options.min_interval_ms => {}
                _ => smallest = Some(*options),
            }
        }
        smallest
    }

    /// Engine action for adding a new session with `options`.
    pub fn plan_start(&self, options: &TrackingOptions) -> EngineAction {
        match self.effective() {
            Some(current) if current.min_interval_ms <= options.min_interval_ms => EngineAction::None,
            _ => EngineAction::Start(*options),
        }
    }

    /// Engine action for replacing the options of the existing session `key`.
    pub fn plan_update(&self, key: &TrackingSessionKey, options: &TrackingOptions) -> EngineAction {
        let Some(previous) = self.get(key) else {
            return EngineAction::None;
        };
        match self.smallest_excluding(Some(key)) {
            None => EngineAction::Start(*options),
            Some(other) if options.min_interval_ms < other.min_interval_ms => {
                EngineAction::Start(*options)
            }
            Some(other) if previous.min_interval_ms < other.min_interval_ms => {
                EngineAction::Start(other)
            }
            Some(_) => EngineAction::None,
        }
    }

    /// Engine action for removing the existing session `key`.
    pub fn plan_stop(&self, key: &TrackingSessionKey) -> EngineAction {
        let Some(previous) = self.get(key) else {
            return EngineAction::None;
        };
        match self.smallest_excluding(Some(key)) {
            None => EngineAction::Stop,
            Some(other) if previous.min_interval_ms < other.min_interval_ms => {
                EngineAction::Start(other)
            }
            Some(_) => EngineAction::None,
        }
    }
}

impl GnssAdapter {
    pub(crate) fn start_tracking(&mut self, client: ClientId, id: u32, options: TrackingOptions) {
        let can_track = self
            .clients
            .get(client)
            .is_some_and(|callbacks| callbacks.can_track());
        if !can_track {
            warn!("{} has no callback for fixes, rejecting session {}", client, id);
            self.report_response(client, id, LocationError::CallbackMissing);
            return;
        }
        if !options.is_valid() {
            self.report_response(client, id, LocationError::InvalidParameter);
            return;
        }

        let key = TrackingSessionKey::new(client, id);
        let action = self.sessions.plan_start(&options);
        self.sessions.insert(key, options);
        debug!("Session {:?} started with {:?}, engine {:?}", key, options, action);
        self.apply_engine_action(action, PendingOperation::Start(key));
    }

    /// Unknown sessions are ignored, the request may target another adapter.
    pub(crate) fn update_tracking(&mut self, client: ClientId, id: u32, options: TrackingOptions) {
        let key = TrackingSessionKey::new(client, id);
        let Some(previous) = self.sessions.get(&key).copied() else {
            debug!("Ignoring update of unknown session {:?}", key);
            return;
        };
        if !options.is_valid() {
            self.report_response(client, id, LocationError::InvalidParameter);
            return;
        }

        let action = self.sessions.plan_update(&key, &options);
        self.sessions.insert(key, options);
        debug!("Session {:?} updated to {:?}, engine {:?}", key, options, action);
        self.apply_engine_action(action, PendingOperation::Update { key, previous });
    }

    /// Unknown sessions are ignored, the request may target another adapter.
    pub(crate) fn stop_tracking(&mut self, client: ClientId, id: u32) {
        let key = TrackingSessionKey::new(client, id);
        if self.sessions.get(&key).is_none() {
            debug!("Ignoring stop of unknown session {:?}", key);
            return;
        }

        let action = self.sessions.plan_stop(&key);
        self.sessions.remove(&key);
        debug!("Session {:?} stopped, engine {:?}", key, action);
        self.apply_engine_action(action, PendingOperation::Stop(key));
    }

    /// Stops every session of a client that goes away. Nobody is told.
    pub(crate) fn stop_client_sessions(&mut self, client: ClientId) {
        for key in self.sessions.keys_of(client) {
            let action = self.sessions.plan_stop(&key);
            self.sessions.remove(&key);
            self.apply_engine_action(action, PendingOperation::Silent);
        }
    }

    /// Puts the engine back into the effective session after it restarted.
    pub(crate) fn restart_sessions(&mut self) {
        if let Some(options) = self.sessions.effective() {
            info!("Restarting engine session with {:?}", options);
            self.start_engine(&options, PendingOperation::Silent);
        }
    }

    fn apply_engine_action(&mut self, action: EngineAction, operation: PendingOperation) {
        match action {
            EngineAction::Start(options) => self.start_engine(&options, operation),
            EngineAction::Stop => self.stop_engine(operation),
            EngineAction::None => self.complete_operation(operation, LocationError::Success),
        }
    }

    fn start_engine(&mut self, options: &TrackingOptions, operation: PendingOperation) {
        let mode = PositionMode::from(options);
        self.engine_hub.set_fix_mode(&mode);
        self.engine_hub.start_fix();
        self.engine
            .start_fix(mode, Completion::new(self.ctx.sender.clone(), operation));
    }

    fn stop_engine(&mut self, operation: PendingOperation) {
        self.engine_hub.stop_fix();
        self.engine
            .stop_fix(Completion::new(self.ctx.sender.clone(), operation));
    }

    /// Finishes an operation once the engine answered, or right away if the
    /// engine was not involved.
    ///
    /// A refused start erases the session and a refused update restores the
    /// previous options before the client hears about it.
    pub(crate) fn complete_operation(&mut self, operation: PendingOperation, error: LocationError) {
        match operation {
            PendingOperation::Start(key) => {
                if !error.is_success() {
                    warn!("Engine refused session {:?}: {}", key, error);
                    self.sessions.remove(&key);
                }
                self.report_response(key.client, key.id, error);
            }
            PendingOperation::Update { key, previous } => {
                if !error.is_success() {
                    warn!("Engine refused update of session {:?}: {}", key, error);
                    if let Some(options) = self.sessions.get_mut(&key) {
                        *options = previous;
                    }
                }
                self.report_response(key.client, key.id, error);
            }
            PendingOperation::Stop(key) => self.report_response(key.client, key.id, error),
            PendingOperation::DeleteAidingData(id) => self.report_control_response(id, error),
            PendingOperation::Silent => {
                if !error.is_success() {
                    debug!("Engine answered {} to an internal request", error);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::tracking::GnssSuplMode;

    fn key(client: u32, id: u32) -> TrackingSessionKey {
        TrackingSessionKey::new(ClientId(client), id)
    }

    fn options(interval: u32) -> TrackingOptions {
        TrackingOptions::new(interval, GnssSuplMode::Standalone)
    }

    #[test]
    fn first_session_starts_engine() {
        let table = SessionTable::default();
        assert_eq!(table.plan_start(&options(1000)), EngineAction::Start(options(1000)));
    }

    #[test]
    fn larger_or_equal_interval_does_not_restart() {
        let mut table = SessionTable::default();
        table.insert(key(1, 1), options(500));
        assert_eq!(table.plan_start(&options(1000)), EngineAction::None);
        assert_eq!(table.plan_start(&options(500)), EngineAction::None);
        assert_eq!(table.plan_start(&options(200)), EngineAction::Start(options(200)));
    }

    #[test]
    fn update_of_minimum_falls_back_to_next_smallest() {
        let mut table = SessionTable::default();
        table.insert(key(1, 1), options(500));
        table.insert(key(2, 1), options(1000));

        assert_eq!(
            table.plan_update(&key(1, 1), &options(2000)),
            EngineAction::Start(options(1000))
        );
        assert_eq!(
            table.plan_update(&key(2, 1), &options(100)),
            EngineAction::Start(options(100))
        );
        assert_eq!(table.plan_update(&key(2, 1), &options(700)), EngineAction::None);
        assert_eq!(
            table.plan_update(&key(1, 1), &options(300)),
            EngineAction::Start(options(300))
        );
    }

    #[test]
    fn stop_plans() {
        let mut table = SessionTable::default();
        table.insert(key(1, 1), options(500));
        assert_eq!(table.plan_stop(&key(1, 1)), EngineAction::Stop);

        table.insert(key(2, 1), options(1000));
        assert_eq!(table.plan_stop(&key(2, 1)), EngineAction::None);
        assert_eq!(table.plan_stop(&key(1, 1)), EngineAction::Start(options(1000)));
        assert_eq!(table.plan_stop(&key(3, 1)), EngineAction::None);
    }

    #[test]
    fn ties_resolve_to_lowest_key() {
        let mut table = SessionTable::default();
        let msb = TrackingOptions::new(500, GnssSuplMode::Msb);
        let msa = TrackingOptions::new(500, GnssSuplMode::Msa);
        table.insert(key(2, 1), msa);
        table.insert(key(1, 4), msb);
        assert_eq!(table.effective(), Some(msb));
    }

    /// Replays random operations and checks that the engine always ends up
    /// with the minimum interval of the live sessions.
    #[test]
    fn engine_interval_tracks_minimum() {
        let mut seed: u64 = 0x2545_f491_4f6c_dd1d;
        let mut next = move |bound: u64| {
            seed = seed
                .wrapping_mul(6_364_136_223_846_793_005)
                .wrapping_add(1_442_695_040_888_963_407);
            (seed >> 33) % bound
        };

        let mut table = SessionTable::default();
        let mut engine: Option<u32> = None;
        for _ in 0..2000 {
            let session = key(next(4) as u32 + 1, next(3) as u32 + 1);
            let interval = (next(8) as u32 + 1) * 250;
            let action = match next(3) {
                0 if table.get(&session).is_none() => {
                    let action = table.plan_start(&options(interval));
                    table.insert(session, options(interval));
                    action
                }
                1 if table.get(&session).is_some() => {
                    let action = table.plan_update(&session, &options(interval));
                    table.insert(session, options(interval));
                    action
                }
                2 if table.get(&session).is_some() => {
                    let action = table.plan_stop(&session);
                    table.remove(&session);
                    action
                }
                _ => EngineAction::None,
            };
            match action {
                EngineAction::Start(started) => engine = Some(started.min_interval_ms),
                EngineAction::Stop => engine = None,
                EngineAction::None => {}
            }
            assert_eq!(engine, table.effective().map(|o| o.min_interval_ms));
        }
    }
}
