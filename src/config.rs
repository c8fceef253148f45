use crate::models::DEFAULT_BMR;
use std::{env, path::PathBuf, time::Duration};

/// Settings for the widget server, read from the environment.
#[derive(Debug, Clone)]
pub struct Config {
    pub data_path: PathBuf,
    pub device_id_path: PathBuf,
    pub port: u16,
    pub sync_url: Option<String>,
    pub sync_debounce: Duration,
    pub tick_interval: Duration,
    pub default_bmr: i64,
}

impl Config {
    pub fn from_env() -> Self {
        let data_path = env::var("APP_DATA_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("data/state.json"));
        let device_id_path = env::var("CC_DEVICE_ID_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| data_path.with_file_name("device_id"));
        let sync_url = env::var("CC_SYNC_URL")
            .ok()
            .map(|url| url.trim().trim_end_matches('/').to_string())
            .filter(|url| !url.is_empty());

        Self {
            data_path,
            device_id_path,
            port: parse_var("PORT").unwrap_or(8080),
            sync_url,
            sync_debounce: Duration::from_millis(parse_var("CC_SYNC_DEBOUNCE_MS").unwrap_or(2000)),
            tick_interval: Duration::from_millis(parse_var("CC_TICK_MS").unwrap_or(1000)),
            default_bmr: parse_var("CC_DEFAULT_BMR")
                .filter(|bmr: &i64| *bmr > 0)
                .unwrap_or(DEFAULT_BMR),
        }
    }
}

/// Settings for the sync service binary.
#[derive(Debug, Clone)]
pub struct SyncServerConfig {
    pub data_path: PathBuf,
    pub port: u16,
}

impl SyncServerConfig {
    pub fn from_env() -> Self {
        Self {
            data_path: env::var("SYNC_DATA_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("data/sync.json")),
            port: parse_var("PORT").unwrap_or(8787),
        }
    }
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|value| value.trim().parse::<T>().ok())
}
