//! sprout-daemon: the mission and progression service.
//!
//! Single OS process running a Tokio async runtime. Clients talk to
//! the daemon via JSON-RPC over a Unix socket.

mod commands;
mod config;
mod events;
mod rpc;

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::{error, info};

use sprout_engine::calendar::{Calendar, LocalCalendar};

use crate::config::DaemonConfig;
use crate::events::{EventBus, EventSubscription};
use crate::rpc::RpcServer;

/// Daemon-wide shared state.
pub struct DaemonState {
    /// Database connection.
    pub db: Arc<tokio::sync::Mutex<rusqlite::Connection>>,
    /// Configuration.
    pub config: DaemonConfig,
    /// Event bus for pushing events to subscribers.
    pub event_bus: EventBus,
    /// Registered event subscriptions, keyed by subscription id.
    pub subscriptions: tokio::sync::Mutex<HashMap<String, EventSubscription>>,
    /// Clock and local-date source shared by every handler.
    pub calendar: LocalCalendar,
    /// Shutdown signal sender.
    pub shutdown_tx: broadcast::Sender<()>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("sprout=info".parse()?),
        )
        .init();

    info!("Sprout daemon starting");

    // 1. Load config
    let config = DaemonConfig::load()?;
    let data_dir = config.data_dir();
    let calendar = LocalCalendar::new(config.time.utc_offset_hours);

    // Ensure data directory exists
    std::fs::create_dir_all(&data_dir)?;

    // 2. Open database and install seed data on first start
    let db_path = data_dir.join("sprout.db");
    let conn = sprout_db::open(&db_path)?;
    sprout_db::seed::install_defaults(&conn, calendar.now())?;
    let db = Arc::new(tokio::sync::Mutex::new(conn));

    // 3. Create event bus
    let event_bus = EventBus::new(config.advanced.event_capacity);

    // 4. Create shutdown channel
    let (shutdown_tx, _shutdown_rx) = broadcast::channel(1);

    // 5. Build daemon state
    let state = Arc::new(DaemonState {
        db,
        config,
        event_bus,
        subscriptions: tokio::sync::Mutex::new(HashMap::new()),
        calendar,
        shutdown_tx: shutdown_tx.clone(),
    });

    // 6. Start IPC server
    let socket_path = data_dir.join("daemon.sock");
    let rpc_server = RpcServer::new(state.clone(), socket_path.clone());

    info!("Starting JSON-RPC server on {:?}", socket_path);

    // 7. Emit DaemonStarted event
    state.event_bus.emit(events::Event {
        event_type: "DaemonStarted".to_string(),
        timestamp: calendar.now().max(0) as u64,
        payload: serde_json::json!({
            "version": env!("CARGO_PKG_VERSION"),
        }),
    });

    // 8. Run the RPC server until shutdown
    let mut shutdown_rx = shutdown_tx.subscribe();
    tokio::select! {
        result = rpc_server.run() => {
            if let Err(e) = result {
                error!("RPC server error: {}", e);
            }
        }
        _ = shutdown_rx.recv() => {
            info!("Shutdown signal received");
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Ctrl-C received, shutting down");
        }
    }

    // Graceful shutdown
    info!("Daemon shutting down gracefully");

    // Clean up socket file
    let _ = std::fs::remove_file(&socket_path);

    info!("Daemon stopped");
    Ok(())
}
