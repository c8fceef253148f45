use calorie_counter::sync::{adopt_if_newer, pull, spawn_scheduler, HttpRemote};
use calorie_counter::{
    load_or_create_device_id, load_state, router, AppState, Change, Clock, Config, Ledger,
    SystemClock,
};
use std::{net::SocketAddr, sync::Arc};
use tokio::fs;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let config = Config::from_env();
    if let Some(parent) = config.data_path.parent() {
        fs::create_dir_all(parent).await?;
    }

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let now = clock.now_ms();
    let mut ledger = match load_state(&config.data_path).await {
        Some(state) => Ledger::new(state),
        None => {
            info!("starting a fresh ledger");
            Ledger::fresh(now, config.default_bmr)
        }
    };
    let device_id = load_or_create_device_id(&config.device_id_path).await?;

    let remote = match &config.sync_url {
        Some(url) => match HttpRemote::new(url) {
            Ok(remote) => Some(remote),
            Err(err) => {
                warn!("cloud sync disabled: {err}");
                None
            }
        },
        None => None,
    };

    let mut change = Change::Unchanged;
    if let Some(remote) = &remote {
        match pull(remote, &device_id).await {
            Ok(Some(remote_state)) => {
                if adopt_if_newer(&mut ledger, remote_state) {
                    change = Change::Persist;
                }
            }
            Ok(None) => info!("no remote state for this device yet"),
            Err(err) => warn!("cloud load failed: {err}"),
        }
    }
    change = change.merge(ledger.roll_over(now));

    let sync = remote
        .clone()
        .map(|remote| spawn_scheduler(remote, config.sync_debounce));
    let state = AppState::new(&config, ledger, device_id, clock, remote, sync);
    {
        let ledger = state.ledger.lock().await;
        state.commit(&ledger, change).await;
    }
    state.spawn_ticker(config.tick_interval);

    let app = router(state);
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));

    info!("listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!("failed to listen for shutdown signal: {err}");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}
