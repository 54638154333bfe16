//! Application configuration validation and typed settings.

use crate::domain::error::PortmixError;
use crate::ports::config_port::ConfigPort;
use std::path::PathBuf;

pub const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Where price and portfolio data is read from.
#[derive(Debug, Clone, PartialEq)]
pub enum DataSource {
    Sqlite { path: PathBuf, pool_size: u32 },
    Csv { dir: PathBuf },
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppSettings {
    pub data_source: DataSource,
    pub log_level: String,
    pub pretty_output: bool,
}

/// Validates the configuration and reads it into [`AppSettings`].
pub fn load_settings(config: &dyn ConfigPort) -> Result<AppSettings, PortmixError> {
    Ok(AppSettings {
        data_source: data_source(config)?,
        log_level: log_level(config)?,
        pretty_output: config.get_bool("output", "pretty", true),
    })
}

fn data_source(config: &dyn ConfigPort) -> Result<DataSource, PortmixError> {
    let source = config
        .get_string("data", "source")
        .map(|s| s.trim().to_lowercase())
        .unwrap_or_else(|| "sqlite".to_string());

    match source.as_str() {
        "sqlite" => {
            let path = config.require_string("sqlite", "path")?;
            let pool_size = config.get_int("sqlite", "pool_size", 4);
            if !(1..=64).contains(&pool_size) {
                return Err(PortmixError::ConfigInvalid {
                    section: "sqlite".to_string(),
                    key: "pool_size".to_string(),
                    reason: "pool_size must be between 1 and 64".to_string(),
                });
            }
            Ok(DataSource::Sqlite {
                path: PathBuf::from(path),
                pool_size: pool_size as u32,
            })
        }
        "csv" => {
            let dir = config.require_string("csv", "dir")?;
            Ok(DataSource::Csv {
                dir: PathBuf::from(dir),
            })
        }
        other => Err(PortmixError::ConfigInvalid {
            section: "data".to_string(),
            key: "source".to_string(),
            reason: format!("unknown data source '{}', expected sqlite or csv", other),
        }),
    }
}

fn log_level(config: &dyn ConfigPort) -> Result<String, PortmixError> {
    let level = config
        .get_string("logging", "level")
        .map(|s| s.trim().to_lowercase())
        .unwrap_or_else(|| "info".to_string());
    if !LOG_LEVELS.contains(&level.as_str()) {
        return Err(PortmixError::ConfigInvalid {
            section: "logging".to_string(),
            key: "level".to_string(),
            reason: format!("unknown log level '{}'", level),
        });
    }
    Ok(level)
}
