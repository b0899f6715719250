// SPDX-FileCopyrightText: 2026 All contributors
//
// SPDX-License-Identifier: GPL-2.0-or-later

//! Network initiated requests waiting for user consent.
//!
//! There is one slot for ordinary and one for emergency requests. Each slot
//! holds at most one request, its engine payload and a deadline timer. The
//! timer posts [`Command::NiTimeout`] into the queue, so a slot is only ever
//! resolved by the adapter task.

use crate::{
    GnssAdapter,
    client::ClientId,
    command::{Command, NiClass},
};
use common::{
    error::LocationError,
    ni::{GnssNiNotification, GnssNiResponse, NiPayload, NiRequest},
};
use module_core::CommandSender;
use std::time::Duration;
use tokio::task::AbortHandle;
use tracing::{debug, info, warn};

/// Seconds added to the user timeout before a request auto resolves.
pub const NI_TIMEOUT_GRACE_SECS: u64 = 5;

#[derive(Debug, Default)]
struct NiSlot {
    request_id: u32,
    payload: Option<NiPayload>,
    timer: Option<AbortHandle>,
}

impl NiSlot {
    fn is_pending(&self) -> bool {
        self.payload.is_some()
    }

    /// Empties the slot and hands out the payload of the pending request.
    fn clear(&mut self) -> Option<NiPayload> {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
        self.request_id = 0;
        self.payload.take()
    }
}

/// The two NI slots and the request id counter they share.
#[derive(Debug)]
pub struct NiManager {
    normal: NiSlot,
    emergency: NiSlot,
    next_request_id: u32,
}

impl Default for NiManager {
    fn default() -> Self {
        NiManager {
            normal: NiSlot::default(),
            emergency: NiSlot::default(),
            next_request_id: 1,
        }
    }
}

impl NiManager {
    fn slot_mut(&mut self, class: NiClass) -> &mut NiSlot {
        match class {
            NiClass::Normal => &mut self.normal,
            NiClass::Emergency => &mut self.emergency,
        }
    }

    pub fn is_pending(&self, class: NiClass) -> bool {
        match class {
            NiClass::Normal => self.normal.is_pending(),
            NiClass::Emergency => self.emergency.is_pending(),
        }
    }

    pub fn pending_id(&self, class: NiClass) -> Option<u32> {
        let slot = match class {
            NiClass::Normal => &self.normal,
            NiClass::Emergency => &self.emergency,
        };
        slot.is_pending().then_some(slot.request_id)
    }

    /// Whether a new request of `class` has to be dropped.
    ///
    /// An emergency request only waits for the emergency slot, an ordinary
    /// one is also held back by a pending emergency request.
    fn is_busy(&self, class: NiClass) -> bool {
        match class {
            NiClass::Emergency => self.emergency.is_pending(),
            NiClass::Normal => self.normal.is_pending() || self.emergency.is_pending(),
        }
    }

    fn allocate_id(&mut self) -> u32 {
        let id = self.next_request_id;
        self.next_request_id = self.next_request_id.wrapping_add(1).max(1);
        id
    }

    /// Occupies the slot and arms its deadline.
    fn store(
        &mut self,
        class: NiClass,
        payload: NiPayload,
        deadline: Duration,
        sender: CommandSender<Command>,
    ) -> u32 {
        let request_id = self.allocate_id();
        let timer = tokio::spawn(async move {
            tokio::time::sleep(deadline).await;
            let _ = sender.send(Command::NiTimeout { class, request_id });
        });
        let slot = self.slot_mut(class);
        slot.request_id = request_id;
        slot.payload = Some(payload);
        slot.timer = Some(timer.abort_handle());
        request_id
    }

    /// Drops both pending requests without answering the engine.
    pub fn reset(&mut self) {
        for class in [NiClass::Normal, NiClass::Emergency] {
            if self.slot_mut(class).clear().is_some() {
                debug!("Released pending {:?} NI request", class);
            }
        }
    }
}

impl GnssAdapter {
    pub(crate) fn request_ni_notify(&mut self, notification: GnssNiNotification, payload: NiPayload) {
        let Some((client, ni_callback)) = self.clients.ni_client() else {
            debug!("No client answers NI requests, dropping {}", notification.ni_type);
            return;
        };
        let ni_callback = ni_callback.clone();

        let class = if notification.is_emergency() {
            NiClass::Emergency
        } else {
            NiClass::Normal
        };
        if self.ni.is_busy(class) {
            warn!("{:?} NI request pending, dropping new {}", class, notification.ni_type);
            return;
        }

        let timeout_secs = match notification.timeout_secs {
            0 => self.config.read(|conf| conf.ni_default_timeout_secs),
            timeout => timeout,
        };
        let deadline = Duration::from_secs(u64::from(timeout_secs) + NI_TIMEOUT_GRACE_SECS);
        let id = self
            .ni
            .store(class, payload, deadline, self.ctx.sender.clone());
        info!("NI request {} for {} times out in {:?}", id, client, deadline);

        if ni_callback
            .send(NiRequest { id, notification })
            .is_err()
        {
            debug!("{} stopped listening for NI requests", client);
        }
    }

    pub(crate) fn ni_response(&mut self, client: ClientId, id: u32, response: GnssNiResponse) {
        let has_ni_callback = self
            .clients
            .get(client)
            .is_some_and(|callbacks| callbacks.ni.is_some());

        let error = if !has_ni_callback {
            LocationError::IdUnknown
        } else if self.ni.pending_id(NiClass::Emergency) == Some(id) {
            if response == GnssNiResponse::Accept && self.ni.is_pending(NiClass::Normal) {
                info!("Emergency NI request accepted, ignoring the ordinary one");
                self.resolve_ni(NiClass::Normal, GnssNiResponse::Ignore);
            }
            self.resolve_ni(NiClass::Emergency, response);
            LocationError::Success
        } else if self.ni.pending_id(NiClass::Normal) == Some(id) {
            self.resolve_ni(NiClass::Normal, response);
            LocationError::Success
        } else {
            LocationError::IdUnknown
        };

        self.report_response(client, id, error);
    }

    /// The deadline of a request passed. Stale timers are ignored.
    pub(crate) fn ni_timeout(&mut self, class: NiClass, request_id: u32) {
        if self.ni.pending_id(class) != Some(request_id) {
            debug!("Ignoring stale NI timeout for request {}", request_id);
            return;
        }
        info!("NI request {} timed out", request_id);
        self.resolve_ni(class, GnssNiResponse::NoResponse);
    }

    fn resolve_ni(&mut self, class: NiClass, response: GnssNiResponse) {
        let Some(payload) = self.ni.slot_mut(class).clear() else {
            return;
        };
        if response == GnssNiResponse::Ignore {
            debug!("Releasing ignored {:?} NI request", class);
            return;
        }
        self.engine.inform_ni_response(response, payload);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use module_core::CommandQueue;

    #[tokio::test]
    async fn ids_increase_across_slots() {
        let queue = CommandQueue::<Command>::new();
        let mut manager = NiManager::default();
        let long = Duration::from_secs(60);

        let normal = manager.store(NiClass::Normal, NiPayload::new(vec![1]), long, queue.sender());
        let emergency = manager.store(
            NiClass::Emergency,
            NiPayload::new(vec![2]),
            long,
            queue.sender(),
        );
        assert!(emergency > normal);
        assert_eq!(manager.pending_id(NiClass::Normal), Some(normal));

        manager.reset();
        assert_eq!(manager.pending_id(NiClass::Normal), None);
        assert_eq!(manager.pending_id(NiClass::Emergency), None);
    }

    #[tokio::test]
    async fn emergency_blocks_ordinary_requests() {
        let queue = CommandQueue::<Command>::new();
        let mut manager = NiManager::default();
        manager.store(
            NiClass::Emergency,
            NiPayload::new(vec![1]),
            Duration::from_secs(60),
            queue.sender(),
        );
        assert!(manager.is_busy(NiClass::Normal));
        assert!(manager.is_busy(NiClass::Emergency));
    }
}
