// SPDX-FileCopyrightText: 2026 All contributors
//
// SPDX-License-Identifier: GPL-2.0-or-later

use serde::{Deserialize, Serialize};
use strum_macros::Display;

/// Kind of data connection the engine asks for.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, Serialize, Deserialize,
)]
pub enum AgpsType {
    Supl,
    /// Emergency SUPL.
    SuplEs,
    Internet,
    C2k,
}

/// IP type of the bearer of an open data connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, Serialize, Deserialize)]
pub enum ApnIpType {
    #[default]
    Ipv4,
    Ipv6,
    Ipv4v6,
}
