// SPDX-FileCopyrightText: 2026 All contributors
//
// SPDX-License-Identifier: GPL-2.0-or-later

use common::config::GpsConf;
use dirs::config_dir;
use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Could not determine the configuration directory")]
    NoConfigDir,
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid configuration in {path}: {source}")]
    Format {
        path: PathBuf,
        source: serde_json::Error,
    },
}

pub fn default_config_path() -> Result<PathBuf, ConfigError> {
    let mut path = config_dir().ok_or(ConfigError::NoConfigDir)?;
    path.push("gnss-adapter");
    path.push("gps.json");
    Ok(path)
}

/// Loads the persisted configuration. A missing file yields the defaults.
pub fn load(path: &Path) -> Result<GpsConf, ConfigError> {
    let json = match std::fs::read_to_string(path) {
        Ok(json) => json,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            info!("{} not found, using the default configuration", path.display());
            return Ok(GpsConf::default());
        }
        Err(source) => {
            return Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            });
        }
    };
    GpsConf::from_json(&json).map_err(|source| ConfigError::Format {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::config::NmeaProvider;

    fn temp_file(name: &str, content: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("gnss_headless_{}_{}", std::process::id(), name));
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn missing_file_gives_defaults() {
        let path = std::env::temp_dir().join("gnss_headless_does_not_exist.json");
        assert_eq!(load(&path).unwrap(), GpsConf::default());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let path = temp_file("partial.json", r#"{ "nmea_provider": "mp", "supl_port": 7275 }"#);
        let conf = load(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(conf.nmea_provider, NmeaProvider::Mp);
        assert_eq!(conf.supl_port, 7275);
        assert_eq!(conf.ni_default_timeout_secs, GpsConf::default().ni_default_timeout_secs);
    }

    #[test]
    fn malformed_file_is_reported() {
        let path = temp_file("malformed.json", "{ supl_port: }");
        let result = load(&path);
        std::fs::remove_file(&path).unwrap();
        assert!(matches!(result, Err(ConfigError::Format { .. })));
    }
}
