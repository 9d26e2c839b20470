//! Platematch Server - realtime group restaurant matching.
//!
//! Friends open a shared voting session, swipe on candidate restaurants,
//! and every member is notified the instant the whole group likes the
//! same place.
//!
//! Core Features:
//! - WebSocket sessions with connect-time token authentication
//! - Live group membership with reconnect-without-leave semantics
//! - Idempotent, toggling votes with O(1) unanimous match detection
//! - Best-effort broadcast that survives half-closed connections
//! - Liveness probing so silently dead peers are reaped
//! - Fire-and-forget notice bus for collaborating persistence layers

use std::time::Duration;

use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, error, info, warn, Level};
use tracing_subscriber::EnvFilter;

use platematch_server::config::ServerConfig;
use platematch_server::state::AppState;

/// Parse command-line arguments. Exits the process if `--help` or
/// `--version` is requested; configuration itself comes from the
/// environment.
fn parse_args() {
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--help" | "-h" => {
                println!("Platematch Server v{}", env!("CARGO_PKG_VERSION"));
                println!();
                println!("Realtime WebSocket coordination server for group restaurant matching.");
                println!();
                println!("USAGE:");
                println!("    platematch-server [OPTIONS]");
                println!();
                println!("OPTIONS:");
                println!("    -h, --help              Print help information");
                println!("    -V, --version           Print version information");
                println!();
                println!("ENVIRONMENT:");
                println!("    RUST_LOG                          Log level filter (e.g., debug, info, warn)");
                println!("    PLATEMATCH_HOST                   Bind host (default: 0.0.0.0)");
                println!("    PLATEMATCH_PORT                   Bind port (default: 8765)");
                println!("    PLATEMATCH_JWT_SECRET             HS256 secret for token verification");
                println!("    PLATEMATCH_PING_INTERVAL_SECS     Liveness probe interval (default: 30)");
                println!("    PLATEMATCH_STATUS_INTERVAL_SECS   Status log interval (default: 60)");
                println!();
                println!("EXAMPLES:");
                println!("    platematch-server");
                println!("    PLATEMATCH_PORT=9001 platematch-server");
                println!("    RUST_LOG=debug platematch-server");
                std::process::exit(0);
            }
            "--version" | "-V" => {
                println!("platematch-server {}", env!("CARGO_PKG_VERSION"));
                std::process::exit(0);
            }
            arg => {
                eprintln!("error: unknown argument '{}'", arg);
                eprintln!("Usage: platematch-server [OPTIONS]");
                eprintln!("Try 'platematch-server --help' for more information.");
                std::process::exit(1);
            }
        }
    }
}

#[tokio::main]
async fn main() {
    parse_args();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .init();

    info!("Platematch Server v{} starting...", env!("CARGO_PKG_VERSION"));

    let config = ServerConfig::from_env();
    let state = AppState::new(config);

    // Record coordination notices (matches, dissolutions, group GC).
    // Persistence collaborators subscribe to the same bus; the server
    // itself only logs them.
    {
        let mut notices = state.coordinator.subscribe_notices();
        tokio::spawn(async move {
            loop {
                match notices.recv().await {
                    Ok(notice) => info!(notice = %notice.to_json(), "coordination notice"),
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "notice subscriber lagged")
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        });
    }

    // Periodic status reporter.
    {
        let coordinator = state.coordinator.clone();
        let interval_secs = state.config.status_interval_secs;
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));
            loop {
                interval.tick().await;
                let stats = coordinator.stats().await;
                info!(
                    connections = stats.connections,
                    groups = stats.groups.len(),
                    "status"
                );
                for group in &stats.groups {
                    debug!(
                        group_code = %group.group_code,
                        members = group.members,
                        candidates = group.candidates,
                        "group status"
                    );
                }
            }
        });
    }

    if let Err(e) = platematch_server::start_server(state).await {
        error!("Server error: {}", e);
        std::process::exit(1);
    }
}
