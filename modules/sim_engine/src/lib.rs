// SPDX-FileCopyrightText: 2026 All contributors
//
// SPDX-License-Identifier: GPL-2.0-or-later

//! A positioning engine that drives along a recorded track.
//!
//! [`SimulatedEngine`] answers every engine call the adapter makes and, while
//! a fix is running, reports positions and satellites of a [`Track`] at the
//! commanded interval.

mod engine;
mod track;

pub use engine::{DEFAULT_FIX_INTERVAL_MS, EngineSettings, SimulatedEngine};
pub use track::{Track, TrackError, TrackPoint, read_track, read_track_file};
