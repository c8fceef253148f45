pub mod app;
pub mod clock;
pub mod config;
pub mod dates;
pub mod errors;
pub mod handlers;
pub mod kv;
pub mod ledger;
pub mod migrate;
pub mod models;
pub mod state;
pub mod stats;
pub mod storage;
pub mod sync;
pub mod ui;

pub use app::router;
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{Config, SyncServerConfig};
pub use kv::{load_documents, sync_router, KvState};
pub use ledger::{Change, Ledger};
pub use state::AppState;
pub use storage::{load_or_create_device_id, load_state};
