// SPDX-FileCopyrightText: 2026 All contributors
//
// SPDX-License-Identifier: GPL-2.0-or-later

//! Persisted configuration and its reconciliation with the engine.

use crate::{GnssAdapter, client::notify, command::Command, engine::HardwareEngine};
use common::{
    config::{
        AGlonassProtocol, AssistanceServer, AssistanceType, ConfigField, GnssConfig, GpsConf,
        GpsLock, LppProfile, LppeMask, SuplVersion,
    },
    error::{LocationError, Response},
};
use std::{
    net::{IpAddr, Ipv4Addr, ToSocketAddrs},
    sync::{Arc, RwLock},
};
use tracing::{debug, error, info, warn};

/// Shared handle to the persisted configuration.
///
/// Everybody may read it. Only the adapter writes it.
#[derive(Debug, Clone, Default)]
pub struct ConfigStore {
    conf: Arc<RwLock<GpsConf>>,
}

impl ConfigStore {
    pub fn new(conf: GpsConf) -> Self {
        ConfigStore {
            conf: Arc::new(RwLock::new(conf)),
        }
    }

    pub fn snapshot(&self) -> GpsConf {
        self.read(GpsConf::clone)
    }

    pub fn read<R>(&self, f: impl FnOnce(&GpsConf) -> R) -> R {
        let conf = self.conf.read().unwrap_or_else(|conf| conf.into_inner());
        f(&conf)
    }

    pub(crate) fn update<R>(&self, f: impl FnOnce(&mut GpsConf) -> R) -> R {
        let mut conf = self.conf.write().unwrap_or_else(|conf| conf.into_inner());
        f(&mut conf)
    }
}

/// One blocking engine call of a configuration push.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ConfigPush {
    GpsLock(GpsLock),
    SuplServer(String),
    C2kServer { host: String, port: u16 },
    SuplVersion(SuplVersion),
    LppProfile(LppProfile),
    LppeControlPlane(LppeMask),
    LppeUserPlane(LppeMask),
    AGlonassProtocol(AGlonassProtocol),
}

impl ConfigPush {
    pub(crate) fn apply(&self, engine: &dyn HardwareEngine) -> LocationError {
        match self {
            ConfigPush::GpsLock(lock) => engine.set_gps_lock_sync(*lock),
            ConfigPush::SuplServer(url) => engine.set_server_sync(url),
            ConfigPush::C2kServer { host, port } => match resolve_ipv4(host, *port) {
                Some(ip) => engine.set_c2k_server_sync(ip, *port),
                None => {
                    error!("C2K server '{}' cannot be resolved", host);
                    LocationError::InvalidParameter
                }
            },
            ConfigPush::SuplVersion(version) => engine.set_supl_version_sync(*version),
            ConfigPush::LppProfile(profile) => engine.set_lpp_config_sync(*profile),
            ConfigPush::LppeControlPlane(mask) => engine.set_lppe_cp_sync(*mask),
            ConfigPush::LppeUserPlane(mask) => engine.set_lppe_up_sync(*mask),
            ConfigPush::AGlonassProtocol(protocol) => engine.set_aglonass_protocol_sync(*protocol),
        }
    }
}

/// Engine calls of one request, run back to back.
#[derive(Debug)]
pub(crate) struct ConfigBatch {
    /// Each push with the response slot it answers.
    pushes: Vec<(usize, ConfigPush)>,
    errors: Vec<LocationError>,
    /// Request ids of the collective response, `None` if nobody waits.
    ids: Option<Vec<u32>>,
}

impl ConfigBatch {
    fn collective(
        pushes: Vec<(usize, ConfigPush)>,
        errors: Vec<LocationError>,
        ids: Vec<u32>,
    ) -> Self {
        ConfigBatch {
            pushes,
            errors,
            ids: Some(ids),
        }
    }

    fn detached(pushes: Vec<ConfigPush>) -> Self {
        let errors = vec![LocationError::Success; pushes.len()];
        ConfigBatch {
            pushes: pushes.into_iter().enumerate().collect(),
            errors,
            ids: None,
        }
    }

    /// Applies every push and returns the collective response, if any.
    fn run(mut self, engine: &dyn HardwareEngine) -> Option<Vec<Response>> {
        for (index, push) in &self.pushes {
            let error = push.apply(engine);
            if !error.is_success() {
                warn!("Engine refused {:?}: {}", push, error);
            }
            self.errors[*index] = error;
        }
        self.responses()
    }

    fn responses(self) -> Option<Vec<Response>> {
        let errors = self.errors;
        self.ids.map(|ids| {
            ids.into_iter()
                .zip(errors)
                .map(|(id, error)| Response::new(id, error))
                .collect()
        })
    }
}

/// Resolves a host name, falling back to a literal address.
fn resolve_ipv4(host: &str, port: u16) -> Option<Ipv4Addr> {
    let resolved = (host, port).to_socket_addrs().ok().and_then(|mut addrs| {
        addrs.find_map(|addr| match addr.ip() {
            IpAddr::V4(ip) => Some(ip),
            IpAddr::V6(_) => None,
        })
    });
    resolved.or_else(|| host.parse().ok())
}

/// The SUPL server URL for a host and port.
///
/// Returns `Some("")` to clear the server and `None` if nothing changes.
pub fn supl_server_url(host: &str, port: u16) -> Option<String> {
    if host.is_empty() || host.eq_ignore_ascii_case("NONE") {
        Some(String::new())
    } else if port > 0 {
        Some(format!("{}:{}", host, port))
    } else {
        None
    }
}

impl GnssAdapter {
    /// Applies the requested fields to the persisted configuration and
    /// pushes what changed to the engine.
    ///
    /// `ids` holds one id per set field, in field order. Every field is
    /// answered once, all together, through the collective response.
    pub(crate) fn update_config(&mut self, config: GnssConfig, ids: Vec<u32>) {
        let fields = config.fields();
        let mut errors = vec![LocationError::Success; fields.len()];
        let mut pushes: Vec<(usize, ConfigPush)> = Vec::new();
        let old_server_url = self.server_url.clone();
        let power_vote_held = self.power_vote_id.is_some();
        let mut capabilities_changed = false;

        for (index, field) in fields.iter().enumerate() {
            match field {
                ConfigField::GpsLock => {
                    if let Some(lock) = config.gps_lock {
                        self.config.update(|conf| conf.gps_lock = lock);
                        if !power_vote_held {
                            pushes.push((index, ConfigPush::GpsLock(lock)));
                        }
                    }
                }
                ConfigField::SuplVersion => {
                    if let Some(version) = config.supl_version {
                        let changed = self.config.update(|conf| {
                            let changed =
                                conf.agps_config_inject && conf.supl_version != version;
                            if changed {
                                conf.supl_version = version;
                            }
                            changed
                        });
                        if changed {
                            pushes.push((index, ConfigPush::SuplVersion(version)));
                        }
                    }
                }
                ConfigField::AssistanceServer => {
                    if let Some(server) = &config.assistance_server {
                        match self.assistance_server_push(server, &old_server_url) {
                            Ok(Some(push)) => pushes.push((index, push)),
                            Ok(None) => {}
                            Err(err) => errors[index] = err,
                        }
                    }
                }
                ConfigField::LppProfile => {
                    if let Some(profile) = config.lpp_profile {
                        let changed = self.config.update(|conf| {
                            let changed = conf.agps_config_inject && conf.lpp_profile != profile;
                            if changed {
                                conf.lpp_profile = profile;
                            }
                            changed
                        });
                        if changed {
                            pushes.push((index, ConfigPush::LppProfile(profile)));
                        }
                    }
                }
                ConfigField::LppeControlPlane => {
                    if let Some(mask) = config.lppe_control_plane {
                        let changed = self.config.update(|conf| {
                            std::mem::replace(&mut conf.lppe_cp_technology, mask) != mask
                        });
                        if changed {
                            pushes.push((index, ConfigPush::LppeControlPlane(mask)));
                        }
                    }
                }
                ConfigField::LppeUserPlane => {
                    if let Some(mask) = config.lppe_user_plane {
                        let changed = self.config.update(|conf| {
                            std::mem::replace(&mut conf.lppe_up_technology, mask) != mask
                        });
                        if changed {
                            pushes.push((index, ConfigPush::LppeUserPlane(mask)));
                        }
                    }
                }
                ConfigField::AGlonassProtocol => {
                    if let Some(protocol) = config.aglonass_protocol {
                        let changed = self.config.update(|conf| {
                            let changed = conf.agps_config_inject
                                && conf.a_glonass_pos_protocol_select != protocol;
                            if changed {
                                conf.a_glonass_pos_protocol_select = protocol;
                            }
                            changed
                        });
                        if changed {
                            pushes.push((index, ConfigPush::AGlonassProtocol(protocol)));
                        }
                    }
                }
                ConfigField::EmergencyPdnForEmergencySupl => {
                    if let Some(enabled) = config.emergency_pdn_for_emergency_supl {
                        self.config
                            .update(|conf| conf.use_emergency_pdn_for_emergency_supl = enabled);
                    }
                }
                ConfigField::SuplEmergencyServices => {
                    if let Some(enabled) = config.supl_emergency_services {
                        self.config.update(|conf| conf.supl_es = enabled);
                    }
                }
                ConfigField::SuplMode => {
                    if let Some(mode) = config.supl_mode {
                        capabilities_changed = self
                            .config
                            .update(|conf| std::mem::replace(&mut conf.supl_mode, mode) != mode);
                    }
                }
            }
        }

        if capabilities_changed {
            self.broadcast_capabilities();
        }

        self.queue_config_batch(ConfigBatch::collective(pushes, errors, ids));
    }

    /// Bookkeeping of an assistance server request.
    fn assistance_server_push(
        &mut self,
        server: &AssistanceServer,
        old_server_url: &str,
    ) -> Result<Option<ConfigPush>, LocationError> {
        match server.kind {
            AssistanceType::Supl => {
                self.set_supl_host_server(&server.host, server.port);
                if !self.server_url.is_empty() && self.server_url != old_server_url {
                    Ok(Some(ConfigPush::SuplServer(self.server_url.clone())))
                } else {
                    Ok(None)
                }
            }
            AssistanceType::C2k => Ok(Some(ConfigPush::C2kServer {
                host: server.host.clone(),
                port: server.port,
            })),
            AssistanceType::Unknown(kind) => {
                error!("Invalid assistance server type {}", kind);
                Err(LocationError::InvalidParameter)
            }
        }
    }

    fn set_supl_host_server(&mut self, host: &str, port: u16) {
        if !self.config.read(|conf| conf.agps_config_inject) {
            return;
        }
        if let Some(url) = supl_server_url(host, port) {
            if !url.eq_ignore_ascii_case(&self.server_url) {
                info!("SUPL server set to '{}'", url);
                self.server_url = url;
            }
        }
    }

    /// Pushes the persisted configuration after the engine came up.
    pub(crate) fn push_startup_config(&mut self) {
        let conf = self.config.snapshot();
        let old_server_url = self.server_url.clone();
        self.set_supl_host_server(&conf.supl_host, conf.supl_port);

        let mut pushes = Vec::new();
        if conf.agps_config_inject {
            pushes.push(ConfigPush::SuplVersion(conf.supl_version));
            pushes.push(ConfigPush::LppProfile(conf.lpp_profile));
            pushes.push(ConfigPush::AGlonassProtocol(conf.a_glonass_pos_protocol_select));
        }
        if !self.server_url.is_empty() && self.server_url != old_server_url {
            pushes.push(ConfigPush::SuplServer(self.server_url.clone()));
        }
        pushes.push(ConfigPush::LppeControlPlane(conf.lppe_cp_technology));
        pushes.push(ConfigPush::LppeUserPlane(conf.lppe_up_technology));
        if self.power_vote_id.is_none() {
            pushes.push(ConfigPush::GpsLock(conf.gps_lock));
        }

        self.push_detached(pushes);
    }

    /// Runs pushes nobody waits for. Failures are only logged.
    pub(crate) fn push_detached(&mut self, pushes: Vec<ConfigPush>) {
        self.queue_config_batch(ConfigBatch::detached(pushes));
    }

    /// Appends a batch to the push queue.
    ///
    /// Batches reach the engine one at a time, in queue order. A batch
    /// without pushes still waits for the ones queued before it.
    fn queue_config_batch(&mut self, batch: ConfigBatch) {
        self.config_batches.push_back(batch);
        self.run_next_config_batch();
    }

    fn run_next_config_batch(&mut self) {
        while !self.config_push_running {
            let Some(batch) = self.config_batches.pop_front() else {
                return;
            };
            if batch.pushes.is_empty() {
                if let Some(responses) = batch.responses() {
                    self.report_collective_response(responses);
                }
                continue;
            }

            debug!("Pushing {} configuration fields", batch.pushes.len());
            self.config_push_running = true;
            let engine = self.engine.clone();
            let sender = self.ctx.sender.clone();
            tokio::task::spawn_blocking(move || {
                let responses = batch.run(engine.as_ref());
                let _ = sender.send(Command::ConfigPushed { responses });
            });
        }
    }

    /// The running batch is done. Starts the next one.
    pub(crate) fn config_pushed(&mut self, responses: Option<Vec<Response>>) {
        self.config_push_running = false;
        if let Some(responses) = responses {
            self.report_collective_response(responses);
        }
        self.run_next_config_batch();
    }

    pub(crate) fn report_collective_response(&self, responses: Vec<Response>) {
        if !notify(&self.control.collective_response, responses) {
            debug!("No collective response callback");
        }
    }
}
