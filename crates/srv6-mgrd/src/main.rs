//! SRv6 route programming agent entry point.

use std::net::SocketAddr;
use std::sync::Arc;

use srv6_mgrd::{InterfaceCache, Srv6Manager};
use srv6_rpc::AgentServer;
use tracing::{error, info};

/// Listen address when `SRV6_MGRD_LISTEN` is not set.
const DEFAULT_LISTEN: &str = "[::]:12345";

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_target(false)
        .with_thread_ids(true)
        .init();

    info!("Starting srv6-mgrd");

    let listen = std::env::var("SRV6_MGRD_LISTEN").unwrap_or_else(|_| DEFAULT_LISTEN.to_string());
    let listen: SocketAddr = match listen.parse() {
        Ok(addr) => addr,
        Err(_) => {
            error!("Invalid SRV6_MGRD_LISTEN address: {}", listen);
            std::process::exit(1);
        }
    };

    // Enumerate local interfaces once at startup; the cache stays as-is
    // until an explicit refresh.
    let ifaces = match InterfaceCache::load().await {
        Ok(ifaces) => ifaces,
        Err(e) => {
            error!("Failed to enumerate interfaces: {}", e);
            std::process::exit(1);
        }
    };
    info!(
        default_device = ifaces.default_device().unwrap_or("<none>"),
        "Interface cache built"
    );

    let manager = Arc::new(Srv6Manager::new(ifaces));

    let mut server = match AgentServer::bind(listen).await {
        Ok(server) => server,
        Err(e) => {
            error!("Failed to bind {}: {}", listen, e);
            std::process::exit(1);
        }
    };
    if let Ok(token) = std::env::var("SRV6_MGRD_AUTH_TOKEN") {
        server = server.with_auth_token(token);
        info!("Request authentication enabled");
    }

    info!("srv6-mgrd initialized successfully");

    if let Err(e) = server.serve(manager).await {
        error!("Server error: {}", e);
        std::process::exit(1);
    }
}
