// SPDX-FileCopyrightText: 2026 All contributors
//
// SPDX-License-Identifier: GPL-2.0-or-later

use common::{
    config::{LocationCapabilities, NmeaProvider},
    error::Response,
    ni::NiRequest,
    position::{GnssLocationInfo, Location},
    report::{EngineEventMask, GnssNmeaNotification},
    signal::{GnssDataNotification, GnssMeasurementsNotification, LocationSystemInfo},
    sv::GnssSvNotification,
};
use std::collections::BTreeMap;
use tokio::sync::mpsc::UnboundedSender;
use tracing::debug;

/// Identity of a registered client, handed out by the adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClientId(pub u32);

impl std::fmt::Display for ClientId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "client-{}", self.0)
    }
}

/// Events are delivered by sending them to the client's channel.
pub type Callback<T> = UnboundedSender<T>;

/// The callbacks a client is interested in. Unset callbacks get no events.
#[derive(Debug, Clone, Default)]
pub struct LocationCallbacks {
    pub tracking: Option<Callback<Location>>,
    pub location_info: Option<Callback<GnssLocationInfo>>,
    pub sv: Option<Callback<GnssSvNotification>>,
    pub nmea: Option<Callback<GnssNmeaNotification>>,
    pub measurements: Option<Callback<GnssMeasurementsNotification>>,
    pub data: Option<Callback<GnssDataNotification>>,
    pub ni: Option<Callback<NiRequest>>,
    pub capabilities: Option<Callback<LocationCapabilities>>,
    pub response: Option<Callback<Response>>,
    pub system_info: Option<Callback<LocationSystemInfo>>,
}

impl LocationCallbacks {
    /// A client may only track if something receives its fixes.
    pub fn can_track(&self) -> bool {
        self.tracking.is_some() || self.location_info.is_some() || self.measurements.is_some()
    }

    fn event_mask(&self, nmea_provider: NmeaProvider) -> EngineEventMask {
        let mut mask = EngineEventMask::empty();
        if self.tracking.is_some() || self.location_info.is_some() {
            mask |= EngineEventMask::PARSED_POSITION_REPORT;
        }
        if self.ni.is_some() {
            mask |= EngineEventMask::NI_NOTIFY_VERIFY_REQUEST;
        }
        if self.sv.is_some() {
            mask |= EngineEventMask::SATELLITE_REPORT;
        }
        if self.nmea.is_some() && nmea_provider == NmeaProvider::Mp {
            mask |= EngineEventMask::NMEA_1HZ_REPORT;
        }
        if self.measurements.is_some() {
            mask |= EngineEventMask::GNSS_MEASUREMENT;
        }
        if self.data.is_some() {
            mask |= EngineEventMask::PARSED_POSITION_REPORT | EngineEventMask::NMEA_1HZ_REPORT;
        }
        mask
    }
}

/// Callbacks of the control client.
#[derive(Debug, Clone, Default)]
pub struct ControlCallbacks {
    pub response: Option<Callback<Response>>,
    pub collective_response: Option<Callback<Vec<Response>>>,
}

/// Sends `event` if the callback is set. A client that dropped its receiver
/// is treated like one without the callback.
pub(crate) fn notify<T>(callback: &Option<Callback<T>>, event: T) -> bool {
    match callback {
        Some(sender) => sender.send(event).is_ok(),
        None => false,
    }
}

/// All registered clients and their callbacks.
#[derive(Debug, Default)]
pub struct ClientRegistry {
    clients: BTreeMap<ClientId, LocationCallbacks>,
}

impl ClientRegistry {
    /// Adds a client or replaces the callbacks of a known one.
    pub fn insert(&mut self, client: ClientId, callbacks: LocationCallbacks) {
        if self.clients.insert(client, callbacks).is_some() {
            debug!("Replaced callbacks of {}", client);
        }
    }

    /// Forgets a client and hands back its callbacks.
    pub fn remove(&mut self, client: ClientId) -> Option<LocationCallbacks> {
        self.clients.remove(&client)
    }

    /// Callbacks of a registered client.
    pub fn get(&self, client: ClientId) -> Option<&LocationCallbacks> {
        self.clients.get(&client)
    }

    /// Callbacks of every client, in id order.
    pub fn callbacks(&self) -> impl Iterator<Item = &LocationCallbacks> {
        self.clients.values()
    }

    /// Union of the engine events the registered callbacks need.
    pub fn event_mask(&self, nmea_provider: NmeaProvider) -> EngineEventMask {
        self.callbacks()
            .fold(EngineEventMask::empty(), |mask, callbacks| {
                mask | callbacks.event_mask(nmea_provider)
            })
    }

    /// The first client, in id order, that answers NI requests.
    pub fn ni_client(&self) -> Option<(ClientId, &Callback<NiRequest>)> {
        self.clients
            .iter()
            .find_map(|(client, callbacks)| callbacks.ni.as_ref().map(|ni| (*client, ni)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc::unbounded_channel;

    #[test]
    fn event_mask_follows_callbacks() {
        let (tracking, _tracking_rx) = unbounded_channel();
        let (nmea, _nmea_rx) = unbounded_channel();
        let mut registry = ClientRegistry::default();
        registry.insert(
            ClientId(1),
            LocationCallbacks {
                tracking: Some(tracking),
                nmea: Some(nmea),
                ..Default::default()
            },
        );

        let mask = registry.event_mask(NmeaProvider::Ap);
        assert_eq!(mask, EngineEventMask::PARSED_POSITION_REPORT);

        let mask = registry.event_mask(NmeaProvider::Mp);
        assert!(mask.contains(EngineEventMask::NMEA_1HZ_REPORT));
    }

    #[test]
    fn measurements_alone_can_track() {
        let (measurements, _rx) = unbounded_channel();
        let callbacks = LocationCallbacks {
            measurements: Some(measurements),
            ..Default::default()
        };
        assert!(callbacks.can_track());
        assert!(!LocationCallbacks::default().can_track());
    }

    #[test]
    fn ni_client_is_lowest_id_with_callback() {
        let (ni_a, _rx_a) = unbounded_channel();
        let (ni_b, _rx_b) = unbounded_channel();
        let mut registry = ClientRegistry::default();
        registry.insert(ClientId(7), LocationCallbacks::default());
        registry.insert(
            ClientId(9),
            LocationCallbacks {
                ni: Some(ni_b),
                ..Default::default()
            },
        );
        registry.insert(
            ClientId(8),
            LocationCallbacks {
                ni: Some(ni_a),
                ..Default::default()
            },
        );
        assert_eq!(registry.ni_client().map(|(id, _)| id), Some(ClientId(8)));
    }
}
