// SPDX-FileCopyrightText: 2026 All contributors
//
// SPDX-License-Identifier: GPL-2.0-or-later

use common::{
    config::GpsConf,
    error::{LocationError, Response},
    ni::{GnssNiResponse, GnssNiType, NiPayload},
    test_helper::reports::ni_notification,
};
use gnss_adapter::LocationCallbacks;
use module_core::test_helper::{assert_no_message, drain, wait_for};
use std::{sync::Arc, time::Duration};
use util::{SILENCE, TIMEOUT, TestAdapter, TestClient, mock_engine::EngineCall};
mod util;

fn conf() -> GpsConf {
    GpsConf {
        ni_default_timeout_secs: 20,
        ..Default::default()
    }
}

#[tokio::test(start_paused = true)]
#[test_log::test]
async fn unanswered_request_times_out_with_grace() {
    let mut adapter = TestAdapter::start(conf());
    let (callbacks, mut client) = TestClient::new();
    let client_id = adapter.handle.add_client(callbacks).unwrap();

    adapter
        .events
        .request_ni_notify(
            ni_notification(GnssNiType::SuplSession, 10),
            NiPayload::new(vec![1, 2, 3]),
        )
        .unwrap();
    let first = wait_for(&mut client.ni, TIMEOUT).await;
    assert_eq!(first.notification.timeout_secs, 10);

    tokio::time::sleep(Duration::from_secs(14)).await;
    adapter.assert_no_call().await;

    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(
        adapter.next_call().await,
        EngineCall::NiResponse(GnssNiResponse::NoResponse, vec![1, 2, 3])
    );

    // The slot is free again.
    adapter
        .events
        .request_ni_notify(
            ni_notification(GnssNiType::SuplSession, 10),
            NiPayload::new(vec![4]),
        )
        .unwrap();
    let second = wait_for(&mut client.ni, TIMEOUT).await;
    assert_ne!(second.id, first.id);

    // A late answer to the expired request is unknown.
    adapter
        .handle
        .gnss_ni_response(client_id, first.id, GnssNiResponse::Accept)
        .unwrap();
    assert_eq!(
        client.next_response().await,
        Response::new(first.id, LocationError::IdUnknown)
    );
    adapter.assert_no_call().await;
    adapter.stop().await;
}

#[tokio::test(start_paused = true)]
#[test_log::test]
async fn missing_timeout_uses_configured_default() {
    let mut adapter = TestAdapter::start(conf());
    let (callbacks, mut client) = TestClient::new();
    adapter.handle.add_client(callbacks).unwrap();

    adapter
        .events
        .request_ni_notify(
            ni_notification(GnssNiType::Voice, 0),
            NiPayload::new(vec![9]),
        )
        .unwrap();
    wait_for(&mut client.ni, TIMEOUT).await;

    tokio::time::sleep(Duration::from_secs(24)).await;
    adapter.assert_no_call().await;
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(
        adapter.next_call().await,
        EngineCall::NiResponse(GnssNiResponse::NoResponse, vec![9])
    );
    adapter.stop().await;
}

#[tokio::test(start_paused = true)]
#[test_log::test]
async fn second_request_of_a_class_is_dropped() {
    let mut adapter = TestAdapter::start(conf());
    let (callbacks, mut client) = TestClient::new();
    let client_id = adapter.handle.add_client(callbacks).unwrap();

    adapter
        .events
        .request_ni_notify(
            ni_notification(GnssNiType::SuplSession, 30),
            NiPayload::new(vec![1]),
        )
        .unwrap();
    let pending = wait_for(&mut client.ni, TIMEOUT).await;

    let dropped: Arc<[u8]> = Arc::from(vec![2u8]);
    let dropped_ref = Arc::downgrade(&dropped);
    adapter
        .events
        .request_ni_notify(
            ni_notification(GnssNiType::SuplSession, 30),
            NiPayload::from(dropped),
        )
        .unwrap();

    // Capabilities are answered after the dropped request was processed.
    adapter.handle.request_capabilities(client_id).unwrap();
    wait_for(&mut client.capabilities, TIMEOUT).await;
    assert!(dropped_ref.upgrade().is_none());
    assert!(drain(&mut client.ni).is_empty());

    adapter
        .handle
        .gnss_ni_response(client_id, pending.id, GnssNiResponse::Accept)
        .unwrap();
    assert_eq!(
        client.next_response().await,
        Response::new(pending.id, LocationError::Success)
    );
    assert_eq!(
        adapter.next_call().await,
        EngineCall::NiResponse(GnssNiResponse::Accept, vec![1])
    );
    adapter.stop().await;
}

#[tokio::test(start_paused = true)]
#[test_log::test]
async fn accepted_emergency_request_ignores_ordinary_one() {
    let mut adapter = TestAdapter::start(conf());
    let (callbacks, mut client) = TestClient::new();
    let client_id = adapter.handle.add_client(callbacks).unwrap();

    adapter
        .events
        .request_ni_notify(
            ni_notification(GnssNiType::SuplSession, 30),
            NiPayload::new(vec![1]),
        )
        .unwrap();
    adapter
        .events
        .request_ni_notify(
            ni_notification(GnssNiType::EmergencySupl, 30),
            NiPayload::new(vec![2]),
        )
        .unwrap();
    let normal = wait_for(&mut client.ni, TIMEOUT).await;
    let emergency = wait_for(&mut client.ni, TIMEOUT).await;
    assert!(emergency.notification.is_emergency());

    adapter
        .handle
        .gnss_ni_response(client_id, emergency.id, GnssNiResponse::Accept)
        .unwrap();
    assert_eq!(
        client.next_response().await,
        Response::new(emergency.id, LocationError::Success)
    );
    assert_eq!(
        adapter.next_call().await,
        EngineCall::NiResponse(GnssNiResponse::Accept, vec![2])
    );
    adapter.assert_no_call().await;

    adapter
        .handle
        .gnss_ni_response(client_id, normal.id, GnssNiResponse::Deny)
        .unwrap();
    assert_eq!(
        client.next_response().await,
        Response::new(normal.id, LocationError::IdUnknown)
    );

    // Neither deadline fires later.
    tokio::time::sleep(Duration::from_secs(60)).await;
    adapter.assert_no_call().await;
    adapter.stop().await;
}

#[tokio::test(start_paused = true)]
#[test_log::test]
async fn ordinary_request_waits_for_emergency() {
    let mut adapter = TestAdapter::start(conf());
    let (callbacks, mut client) = TestClient::new();
    let client_id = adapter.handle.add_client(callbacks).unwrap();

    adapter
        .events
        .request_ni_notify(
            ni_notification(GnssNiType::EmergencySupl, 30),
            NiPayload::new(vec![2]),
        )
        .unwrap();
    adapter
        .events
        .request_ni_notify(
            ni_notification(GnssNiType::SuplSession, 30),
            NiPayload::new(vec![1]),
        )
        .unwrap();
    let emergency = wait_for(&mut client.ni, TIMEOUT).await;
    assert_no_message(&mut client.ni, SILENCE).await;

    adapter
        .handle
        .gnss_ni_response(client_id, emergency.id, GnssNiResponse::Deny)
        .unwrap();
    assert_eq!(
        adapter.next_call().await,
        EngineCall::NiResponse(GnssNiResponse::Deny, vec![2])
    );
    adapter.stop().await;
}

#[tokio::test]
#[test_log::test]
async fn responses_to_unknown_requests() {
    let mut adapter = TestAdapter::start(conf());
    let (callbacks, mut client) = TestClient::new();
    let client_id = adapter.handle.add_client(callbacks).unwrap();
    let (response, mut response_rx) = tokio::sync::mpsc::unbounded_channel();
    let no_ni = adapter
        .handle
        .add_client(LocationCallbacks {
            response: Some(response),
            ..Default::default()
        })
        .unwrap();

    adapter
        .handle
        .gnss_ni_response(client_id, 77, GnssNiResponse::Accept)
        .unwrap();
    assert_eq!(
        client.next_response().await,
        Response::new(77, LocationError::IdUnknown)
    );

    adapter
        .events
        .request_ni_notify(
            ni_notification(GnssNiType::SuplSession, 30),
            NiPayload::new(vec![1]),
        )
        .unwrap();
    let request = wait_for(&mut client.ni, TIMEOUT).await;
    adapter
        .handle
        .gnss_ni_response(no_ni, request.id, GnssNiResponse::Accept)
        .unwrap();
    assert_eq!(
        wait_for(&mut response_rx, TIMEOUT).await,
        Response::new(request.id, LocationError::IdUnknown)
    );
    adapter.assert_no_call().await;
    adapter.stop().await;
}

#[tokio::test]
#[test_log::test]
async fn requests_without_ni_client_are_dropped() {
    let mut adapter = TestAdapter::start(conf());
    let (mut callbacks, mut client) = TestClient::new();
    callbacks.ni = None;
    adapter.handle.add_client(callbacks).unwrap();

    adapter
        .events
        .request_ni_notify(
            ni_notification(GnssNiType::SuplSession, 30),
            NiPayload::new(vec![1]),
        )
        .unwrap();
    assert_no_message(&mut client.ni, SILENCE).await;
    adapter.assert_no_call().await;
    adapter.stop().await;
}

#[tokio::test]
#[test_log::test]
async fn engine_restart_releases_pending_requests() {
    let mut adapter = TestAdapter::start(conf());
    let (callbacks, mut client) = TestClient::new();
    let client_id = adapter.handle.add_client(callbacks).unwrap();

    adapter
        .events
        .request_ni_notify(
            ni_notification(GnssNiType::SuplSession, 30),
            NiPayload::new(vec![1]),
        )
        .unwrap();
    let request = wait_for(&mut client.ni, TIMEOUT).await;

    adapter.events.handle_engine_up().unwrap();
    adapter
        .handle
        .gnss_ni_response(client_id, request.id, GnssNiResponse::Accept)
        .unwrap();
    assert_eq!(
        client.next_response().await,
        Response::new(request.id, LocationError::IdUnknown)
    );
    let calls = drain(&mut adapter.calls);
    assert!(
        !calls
            .iter()
            .any(|call| matches!(call, EngineCall::NiResponse(..)))
    );
    adapter.stop().await;
}
