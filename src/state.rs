use crate::clock::Clock;
use crate::config::Config;
use crate::ledger::{Change, Ledger};
use crate::storage::persist_state;
use crate::sync::{HttpRemote, Snapshot, SyncHandle};
use std::{path::PathBuf, sync::Arc, time::Duration};
use tokio::{sync::Mutex, task::JoinHandle};
use tracing::error;

#[derive(Clone)]
pub struct AppState {
    pub data_path: PathBuf,
    pub device_id_path: PathBuf,
    pub default_bmr: i64,
    pub ledger: Arc<Mutex<Ledger>>,
    pub device_id: Arc<Mutex<String>>,
    pub clock: Arc<dyn Clock>,
    pub sync: Option<SyncHandle>,
    pub remote: Option<HttpRemote>,
}

impl AppState {
    pub fn new(
        config: &Config,
        ledger: Ledger,
        device_id: String,
        clock: Arc<dyn Clock>,
        remote: Option<HttpRemote>,
        sync: Option<SyncHandle>,
    ) -> Self {
        Self {
            data_path: config.data_path.clone(),
            device_id_path: config.device_id_path.clone(),
            default_bmr: config.default_bmr,
            ledger: Arc::new(Mutex::new(ledger)),
            device_id: Arc::new(Mutex::new(device_id)),
            clock,
            sync,
            remote,
        }
    }

    pub fn now(&self) -> i64 {
        self.clock.now_ms()
    }

    /// Saves the ledger after a mutation and queues a remote push when the
    /// change asks for one. Call while still holding the ledger lock so
    /// saves stay ordered with mutations.
    pub async fn commit(&self, ledger: &Ledger, change: Change) {
        if !change.is_dirty() {
            return;
        }
        if let Err(err) = persist_state(&self.data_path, ledger.state()).await {
            error!("failed to save state: {}", err.message);
        }
        if change == Change::PersistAndSync {
            if let Some(sync) = &self.sync {
                sync.schedule(self.snapshot(ledger).await);
            }
        }
    }

    pub async fn snapshot(&self, ledger: &Ledger) -> Snapshot {
        Snapshot {
            device_id: self.device_id.lock().await.clone(),
            state: ledger.snapshot(),
        }
    }

    /// Re-checks the day boundary on a fixed interval.
    pub fn spawn_ticker(&self, every: Duration) -> JoinHandle<()> {
        let state = self.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                let mut ledger = state.ledger.lock().await;
                let change = ledger.roll_over(state.now());
                state.commit(&ledger, change).await;
            }
        })
    }
}
