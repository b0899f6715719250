// SPDX-FileCopyrightText: 2026 All contributors
//
// SPDX-License-Identifier: GPL-2.0-or-later

mod conf;

use clap::Parser;
use common::tracking::{GnssSuplMode, TrackingOptions};
use gnss_adapter::{AdapterHandle, ClientId, ConfigStore, GnssAdapter, LocationCallbacks};
use module_core::{Module, QueueClosed};
use sim_engine::{SimulatedEngine, Track, TrackError, read_track_file};
use std::{path::PathBuf, sync::Arc};
use thiserror::Error;
use tokio::sync::mpsc::{UnboundedReceiver, unbounded_channel};
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// CSV file with longitude,latitude track points.
    #[arg(short, long)]
    track: PathBuf,
    /// JSON configuration, defaults to gnss-adapter/gps.json in the config directory.
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Speed along the track in m/s.
    #[arg(short, long, default_value_t = 10.0)]
    speed: f64,
    #[arg(short, long, default_value_t = 1000)]
    interval_ms: u32,
    /// Log the NMEA sentences.
    #[arg(short, long)]
    nmea: bool,
}

#[derive(Debug, Error)]
enum HeadlessError {
    #[error(transparent)]
    Config(#[from] conf::ConfigError),
    #[error("Failed to load track: {0}")]
    Track(#[from] TrackError),
    #[error("Failed to install signal handler: {0}")]
    Signal(#[from] ctrlc::Error),
    #[error("Adapter stopped unexpectedly: {0}")]
    Adapter(#[from] QueueClosed),
}

/// Logs what the adapter reports to a client.
fn spawn_logger<T: std::fmt::Debug + Send + 'static>(
    name: &'static str,
    mut receiver: UnboundedReceiver<T>,
) {
    tokio::spawn(async move {
        while let Some(event) = receiver.recv().await {
            info!("{}: {:?}", name, event);
        }
        debug!("{} logger stopped", name);
    });
}

fn register_client(handle: &AdapterHandle, nmea: bool) -> Result<ClientId, HeadlessError> {
    let (tracking, tracking_rx) = unbounded_channel();
    let (response, response_rx) = unbounded_channel();
    let (capabilities, capabilities_rx) = unbounded_channel();
    let (ni, ni_rx) = unbounded_channel();
    spawn_logger("location", tracking_rx);
    spawn_logger("response", response_rx);
    spawn_logger("capabilities", capabilities_rx);
    spawn_logger("ni request", ni_rx);

    let mut callbacks = LocationCallbacks {
        tracking: Some(tracking),
        response: Some(response),
        capabilities: Some(capabilities),
        ni: Some(ni),
        ..Default::default()
    };
    if nmea {
        let (nmea, nmea_rx) = unbounded_channel();
        spawn_logger("nmea", nmea_rx);
        callbacks.nmea = Some(nmea);
    }

    let client = handle.add_client(callbacks)?;
    handle.request_capabilities(client)?;
    Ok(client)
}

async fn run(cli: Cli) -> Result<(), HeadlessError> {
    let config_path = match cli.config {
        Some(path) => path,
        None => conf::default_config_path()?,
    };
    let conf = conf::load(&config_path)?;
    let track = Track::new(&read_track_file(&cli.track)?)?;
    info!(
        "Track with {} points, {:.0} m per lap",
        track.len(),
        track.length_m()
    );

    let engine = Arc::new(SimulatedEngine::new(track, cli.speed));
    let mut adapter = GnssAdapter::builder(engine.clone(), ConfigStore::new(conf)).build();
    engine.attach(adapter.engine_events());
    let handle = adapter.handle();
    let events = adapter.engine_events();

    let signal_handle = handle.clone();
    ctrlc::set_handler(move || {
        info!("Shutting down");
        let _ = signal_handle.shutdown();
    })?;

    let adapter_task = tokio::spawn(async move { adapter.run().await });

    events.handle_engine_up()?;
    let client = register_client(&handle, cli.nmea)?;
    let session = handle.start_tracking(
        client,
        TrackingOptions::new(cli.interval_ms, GnssSuplMode::Standalone),
    )?;
    info!("Tracking session {} started", session);

    match adapter_task.await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(())) | Err(_) => {
            error!("Adapter task failed");
            Err(QueueClosed.into())
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), ()> {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    run(cli).await.map_err(|err| {
        error!("{}", err);
    })
}
