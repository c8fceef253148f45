//! Client side of the per-device state store.
//!
//! Mutations never wait on the network. Handlers hand snapshots to the
//! [`SyncHandle`]; a background task waits for a quiet period, pushes only
//! the newest snapshot, and publishes the outcome as a [`SyncStatus`].

use crate::ledger::Ledger;
use crate::migrate::migrate_state;
use crate::models::{LedgerState, PutResponse, RemoteDocument};
use reqwest::{StatusCode, Url};
use serde::Serialize;
use std::fmt;
use std::future::Future;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

pub const MIN_DEVICE_ID_LEN: usize = 10;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

pub fn is_valid_device_id(id: &str) -> bool {
    id.len() >= MIN_DEVICE_ID_LEN
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncStatus {
    Idle,
    Syncing,
    Synced,
    Error,
    Offline,
}

#[derive(Debug)]
pub enum SyncError {
    InvalidDeviceId,
    InvalidUrl(String),
    /// The server could not be reached at all.
    Offline(String),
    Http(StatusCode),
    Decode(String),
    Request(String),
}

impl SyncError {
    pub fn status(&self) -> SyncStatus {
        match self {
            SyncError::Offline(_) => SyncStatus::Offline,
            _ => SyncStatus::Error,
        }
    }
}

impl fmt::Display for SyncError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncError::InvalidDeviceId => write!(
                f,
                "device id must be at least {MIN_DEVICE_ID_LEN} characters"
            ),
            SyncError::InvalidUrl(url) => write!(f, "invalid sync url: {url}"),
            SyncError::Offline(e) => write!(f, "sync server unreachable: {e}"),
            SyncError::Http(status) => write!(f, "sync server returned {status}"),
            SyncError::Decode(e) => write!(f, "unexpected sync response: {e}"),
            SyncError::Request(e) => write!(f, "sync request failed: {e}"),
        }
    }
}

impl std::error::Error for SyncError {}

impl From<reqwest::Error> for SyncError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_connect() || err.is_timeout() {
            SyncError::Offline(err.to_string())
        } else if err.is_decode() {
            SyncError::Decode(err.to_string())
        } else if let Some(status) = err.status() {
            SyncError::Http(status)
        } else {
            SyncError::Request(err.to_string())
        }
    }
}

/// Destination for debounced pushes.
pub trait RemoteStore: Send + Sync + 'static {
    /// Stores the whole document; returns the server's timestamp.
    fn push(
        &self,
        device_id: &str,
        state: &LedgerState,
    ) -> impl Future<Output = Result<i64, SyncError>> + Send;
}

#[derive(Debug, Clone)]
pub struct HttpRemote {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpRemote {
    pub fn new(base_url: &str) -> Result<Self, SyncError> {
        let base_url =
            Url::parse(base_url).map_err(|_| SyncError::InvalidUrl(base_url.to_string()))?;
        if base_url.cannot_be_a_base() {
            return Err(SyncError::InvalidUrl(base_url.to_string()));
        }
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|err| SyncError::Request(err.to_string()))?;
        Ok(Self { client, base_url })
    }

    fn state_url(&self, device_id: &str, tail: &[&str]) -> Result<Url, SyncError> {
        if !is_valid_device_id(device_id) {
            return Err(SyncError::InvalidDeviceId);
        }
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| SyncError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .push("state")
            .push(device_id)
            .extend(tail);
        Ok(url)
    }

    /// Fetches the stored envelope, `None` when the device has nothing stored.
    pub async fn fetch(&self, device_id: &str) -> Result<Option<RemoteDocument>, SyncError> {
        let response = self.client.get(self.state_url(device_id, &[])?).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = response.error_for_status()?;
        Ok(Some(response.json().await?))
    }

    /// Merges partial day-record fields into one stored day.
    pub async fn patch_day(
        &self,
        device_id: &str,
        date: &str,
        fields: &serde_json::Value,
    ) -> Result<(), SyncError> {
        let url = self.state_url(device_id, &["daily", date])?;
        self.client
            .patch(url)
            .json(fields)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

impl RemoteStore for HttpRemote {
    async fn push(&self, device_id: &str, state: &LedgerState) -> Result<i64, SyncError> {
        let url = self.state_url(device_id, &[])?;
        let response = self
            .client
            .put(url)
            .json(state)
            .send()
            .await?
            .error_for_status()?;
        let body: PutResponse = response.json().await?;
        Ok(body.last_updated)
    }
}

/// Fetches the remote copy in canonical form; malformed remote documents
/// are ignored.
pub async fn pull(remote: &HttpRemote, device_id: &str) -> Result<Option<LedgerState>, SyncError> {
    let Some(document) = remote.fetch(device_id).await? else {
        return Ok(None);
    };
    match migrate_state(document.state) {
        Ok(state) => Ok(Some(state)),
        Err(err) => {
            warn!("ignoring remote state: {err}");
            Ok(None)
        }
    }
}

/// Last writer wins: the remote copy replaces the local one only if it is
/// strictly newer.
pub fn adopt_if_newer(ledger: &mut Ledger, remote: LedgerState) -> bool {
    if remote.last_updated <= ledger.state().last_updated {
        return false;
    }
    info!(
        remote = remote.last_updated,
        local = ledger.state().last_updated,
        "adopting remote state"
    );
    let _ = ledger.replace(remote);
    true
}

#[derive(Debug, Clone)]
pub struct Snapshot {
    pub device_id: String,
    pub state: LedgerState,
}

#[derive(Debug)]
enum Command {
    Schedule(Snapshot),
    Flush(Snapshot),
}

impl Command {
    fn into_parts(self) -> (Snapshot, bool) {
        match self {
            Command::Schedule(snapshot) => (snapshot, false),
            Command::Flush(snapshot) => (snapshot, true),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SyncHandle {
    tx: mpsc::UnboundedSender<Command>,
    status: watch::Receiver<SyncStatus>,
}

impl SyncHandle {
    /// Queues a push after the quiet period, superseding any pending one.
    pub fn schedule(&self, snapshot: Snapshot) {
        self.send(Command::Schedule(snapshot));
    }

    /// Pushes without waiting for the quiet period.
    pub fn flush(&self, snapshot: Snapshot) {
        self.send(Command::Flush(snapshot));
    }

    pub fn status(&self) -> SyncStatus {
        *self.status.borrow()
    }

    fn send(&self, command: Command) {
        if self.tx.send(command).is_err() {
            warn!("sync scheduler has stopped; dropping snapshot");
        }
    }
}

pub fn spawn_scheduler<R: RemoteStore>(remote: R, debounce: Duration) -> SyncHandle {
    let (tx, rx) = mpsc::unbounded_channel();
    let (status_tx, status_rx) = watch::channel(SyncStatus::Idle);
    tokio::spawn(run_scheduler(remote, debounce, rx, status_tx));
    SyncHandle {
        tx,
        status: status_rx,
    }
}

async fn run_scheduler<R: RemoteStore>(
    remote: R,
    debounce: Duration,
    mut rx: mpsc::UnboundedReceiver<Command>,
    status: watch::Sender<SyncStatus>,
) {
    while let Some(first) = rx.recv().await {
        status.send_replace(SyncStatus::Syncing);
        let (mut snapshot, mut flush) = first.into_parts();

        while !flush {
            tokio::select! {
                next = rx.recv() => match next {
                    Some(command) => {
                        (snapshot, flush) = command.into_parts();
                    }
                    None => break,
                },
                _ = tokio::time::sleep(debounce) => break,
            }
        }

        let next_status = match remote.push(&snapshot.device_id, &snapshot.state).await {
            Ok(server_time) => {
                debug!(server_time, "pushed state");
                SyncStatus::Synced
            }
            Err(err) => {
                warn!("cloud save failed: {err}");
                err.status()
            }
        };
        status.send_replace(next_status);
    }
}
