//! Shared utilities for integration tests.

use std::net::SocketAddr;

use tokio::net::TcpListener;
use tokio::sync::mpsc;

use sockjs_gateway::config::GatewayConfig;
use sockjs_gateway::{HttpServer, Shutdown};

/// A gateway running in the background. Stops when dropped.
pub struct Gateway {
    pub addr: SocketAddr,
    pub config_updates: mpsc::UnboundedSender<GatewayConfig>,
    shutdown: Shutdown,
}

impl Gateway {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    #[allow(dead_code)]
    pub fn ws_url(&self, path: &str) -> String {
        format!("ws://{}{}", self.addr, path)
    }
}

impl Drop for Gateway {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Bind `addr` and serve the gateway on it with `config`.
pub async fn start_gateway(addr: &str, mut config: GatewayConfig) -> Gateway {
    let addr: SocketAddr = addr.parse().unwrap();
    config.listener.bind_address = addr.to_string();

    let listener = TcpListener::bind(addr).await.unwrap();
    let shutdown = Shutdown::new();
    let (config_updates, updates_rx) = mpsc::unbounded_channel();
    let server = HttpServer::new(config);
    let server_shutdown = shutdown.subscribe();

    tokio::spawn(async move {
        let _ = server.run(listener, updates_rx, server_shutdown).await;
    });

    Gateway { addr, config_updates, shutdown }
}

/// Client without connection pooling or system proxies.
#[allow(dead_code)]
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
