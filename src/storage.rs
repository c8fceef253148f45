use crate::errors::AppError;
use crate::migrate::{migrate_state, parse_state};
use crate::models::{ExportFile, LedgerState, EXPORT_VERSION};
use serde::Deserialize;
use std::path::Path;
use tokio::fs;
use tracing::{error, warn};
use uuid::Uuid;

/// Loads the ledger document; anything unreadable counts as absent.
pub async fn load_state(path: &Path) -> Option<LedgerState> {
    match fs::read(path).await {
        Ok(bytes) => match parse_state(&bytes) {
            Ok(state) => Some(state),
            Err(err) => {
                error!("discarding stored state: {err}");
                None
            }
        },
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => None,
        Err(err) => {
            error!("failed to read data file: {err}");
            None
        }
    }
}

pub async fn persist_state(path: &Path, state: &LedgerState) -> Result<(), AppError> {
    let payload = serde_json::to_vec_pretty(state).map_err(AppError::internal)?;
    fs::write(path, payload).await.map_err(AppError::internal)?;
    Ok(())
}

pub fn export_file(state: &LedgerState, now: i64) -> ExportFile {
    ExportFile {
        version: EXPORT_VERSION,
        timestamp: now,
        state: state.clone(),
    }
}

#[derive(Debug, Deserialize)]
struct ImportEnvelope {
    version: Option<u32>,
    state: Option<serde_json::Value>,
}

/// Validates an export file and returns the canonical state it carries.
pub fn parse_import(bytes: &[u8]) -> Result<LedgerState, AppError> {
    let envelope: ImportEnvelope = serde_json::from_slice(bytes)
        .map_err(|err| AppError::bad_request(format!("invalid import file: {err}")))?;
    let (Some(version), Some(state)) = (envelope.version, envelope.state) else {
        return Err(AppError::bad_request("invalid data format"));
    };
    if version == 0 {
        return Err(AppError::bad_request("invalid data format"));
    }
    if version > EXPORT_VERSION {
        warn!("importing export file version {version}");
    }
    migrate_state(state).map_err(|err| AppError::bad_request(format!("invalid import file: {err}")))
}

/// Reads the stored device id, generating and saving a fresh one if needed.
pub async fn load_or_create_device_id(path: &Path) -> Result<String, std::io::Error> {
    match fs::read_to_string(path).await {
        Ok(contents) => {
            let id = contents.trim().to_string();
            if !id.is_empty() {
                return Ok(id);
            }
        }
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
        Err(err) => return Err(err),
    }

    let id = Uuid::new_v4().to_string();
    save_device_id(path, &id).await?;
    Ok(id)
}

pub async fn save_device_id(path: &Path, id: &str) -> Result<(), std::io::Error> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }
    fs::write(path, id).await
}
