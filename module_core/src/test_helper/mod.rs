// SPDX-FileCopyrightText: 2026 All contributors
//
// SPDX-License-Identifier: GPL-2.0-or-later

use crate::{CommandSender, QueueCommand};
use std::{fmt::Debug, time::Duration};
use tokio::{sync::mpsc::UnboundedReceiver, task::JoinHandle, time::timeout};
use tracing::debug;

/// Sends the quit command to a running module and waits for it to stop.
///
/// # Arguments
/// * `sender` – Sender of the module's command queue.
/// * `handle` – The [`JoinHandle`] of the running module task.
///
/// # Panics
/// This function panics if the module does not stop within 100ms or if the
/// module returns an error.
pub async fn stop_module<C: QueueCommand>(
    sender: &CommandSender<C>,
    handle: &mut JoinHandle<Result<(), ()>>,
) {
    let _ = sender.send(C::quit());
    timeout(Duration::from_millis(100), handle)
        .await
        .expect("Module doesn't handle quit command in timeout")
        .expect("Module task panicked")
        .expect("Module returned an error");
}

/// Waits for the next message on a callback channel.
///
/// # Arguments
/// * `rx` – The receiving side of a registered callback.
/// * `duration` – The maximum amount of time to wait.
///
/// # Panics
/// This function panics if no message arrives within `duration` or if the
/// channel is closed.
pub async fn wait_for<T>(rx: &mut UnboundedReceiver<T>, duration: Duration) -> T {
    match timeout(duration, rx.recv()).await {
        Ok(Some(message)) => message,
        Ok(None) => panic!("Channel closed while waiting for a message"),
        Err(_) => panic!("Failed to receive a message within {:?}", duration),
    }
}

/// Asserts that no message arrives on a callback channel within `duration`.
pub async fn assert_no_message<T: Debug>(rx: &mut UnboundedReceiver<T>, duration: Duration) {
    if let Ok(Some(message)) = timeout(duration, rx.recv()).await {
        panic!("Received unexpected message {:?}", message);
    }
}

/// Takes every message that is already queued on a callback channel.
pub fn drain<T: Debug>(rx: &mut UnboundedReceiver<T>) -> Vec<T> {
    let mut messages = Vec::new();
    while let Ok(message) = rx.try_recv() {
        messages.push(message);
    }
    debug!("Drained {} messages", messages.len());
    messages
}
