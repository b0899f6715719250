// SPDX-FileCopyrightText: 2026 All contributors
//
// SPDX-License-Identifier: GPL-2.0-or-later

//! Common module of the GNSS adapter
//!
//! Provides the data types that are exchanged between the clients, the adapter
//! and the positioning engine.

pub mod agps;
pub mod config;
pub mod error;
pub mod ni;
pub mod position;
pub mod report;
pub mod signal;
pub mod sv;
pub mod test_helper;
pub mod tracking;
