//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Mount the SockJS service below the configured path prefix
//! - Wire up middleware (tracing, body limit, request ID)
//! - Serve until the shutdown signal fires
//! - Apply configuration updates from the watcher

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{Request, Response},
    response::IntoResponse,
    routing::any,
    Router,
};
use tokio::net::TcpListener;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tower::ServiceBuilder;
use tower_http::{
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::config::{GatewayConfig, ListenerConfig};
use crate::lifecycle::ShutdownSignal;
use crate::observability::metrics;
use crate::sockjs::{
    RawWebSocketHandler, SharedHandler, SockJsService, TaskScheduler, TransportHandler,
};
use crate::transport::{EchoHandler, WebSocketTransport};

type DefaultService = SockJsService<WebSocketTransport, WebSocketTransport>;

struct Endpoint<R, T> {
    service: Arc<SockJsService<R, T>>,
    prefix: Arc<str>,
    handler: SharedHandler,
}

impl<R, T> Clone for Endpoint<R, T> {
    fn clone(&self) -> Self {
        Self {
            service: self.service.clone(),
            prefix: self.prefix.clone(),
            handler: self.handler.clone(),
        }
    }
}

/// Router serving `service` at `prefix`, `prefix/` and everything below.
///
/// `prefix` must start with `/` and must not end with one.
pub fn sockjs_router<R, T>(service: Arc<SockJsService<R, T>>, prefix: &str, handler: SharedHandler) -> Router
where
    R: RawWebSocketHandler,
    T: TransportHandler,
{
    let endpoint = Endpoint {
        service,
        prefix: Arc::from(prefix),
        handler,
    };
    Router::new()
        .route(prefix, any(sockjs_endpoint::<R, T>))
        .route(&format!("{prefix}/"), any(sockjs_endpoint::<R, T>))
        .route(&format!("{prefix}/{{*path}}"), any(sockjs_endpoint::<R, T>))
        .with_state(endpoint)
}

async fn sockjs_endpoint<R, T>(State(endpoint): State<Endpoint<R, T>>, request: Request<Body>) -> Response<Body>
where
    R: RawWebSocketHandler,
    T: TransportHandler,
{
    let sockjs_path = request
        .uri()
        .path()
        .strip_prefix(&*endpoint.prefix)
        .map(str::to_owned);

    let mut response = Response::new(Body::empty());
    match endpoint
        .service
        .handle_request(request, &mut response, sockjs_path.as_deref(), endpoint.handler.clone())
        .await
    {
        Ok(()) => response,
        Err(e) => e.into_response(),
    }
}

/// HTTP server for the SockJS gateway.
pub struct HttpServer {
    config: GatewayConfig,
    handler: SharedHandler,
}

impl HttpServer {
    /// Server answering sessions with [`EchoHandler`].
    pub fn new(config: GatewayConfig) -> Self {
        Self::with_handler(config, Arc::new(EchoHandler))
    }

    /// Server dispatching session messages to `handler`.
    pub fn with_handler(config: GatewayConfig, handler: SharedHandler) -> Self {
        Self { config, handler }
    }

    fn build_router(listener: &ListenerConfig, service: Arc<DefaultService>, handler: SharedHandler) -> Router {
        sockjs_router(service, &listener.path_prefix, handler).layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(RequestBodyLimitLayer::new(listener.max_body_size)),
        )
    }

    /// Run the server until `shutdown` fires, applying `config_updates` as they arrive.
    pub async fn run(
        self,
        listener: TcpListener,
        mut config_updates: mpsc::UnboundedReceiver<GatewayConfig>,
        mut shutdown: ShutdownSignal,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        let service = Arc::new(SockJsService::new(
            self.config.sockjs.clone(),
            TaskScheduler::new(Handle::current()),
            WebSocketTransport,
            WebSocketTransport,
        ));
        let app = Self::build_router(&self.config.listener, service.clone(), self.handler);

        tracing::info!(
            address = %addr,
            prefix = %self.config.listener.path_prefix,
            "HTTP server starting"
        );

        let listener_config = self.config.listener;
        let mut reload_shutdown = shutdown.clone();
        let reload = tokio::spawn(async move {
            loop {
                let config = tokio::select! {
                    _ = reload_shutdown.wait() => break,
                    update = config_updates.recv() => match update {
                        Some(config) => config,
                        None => break,
                    },
                };
                if config.listener != listener_config {
                    tracing::warn!("Listener settings changed; restart required to apply them");
                }
                service.update_config(config.sockjs);
                metrics::record_config_reload();
            }
        });

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                shutdown.wait().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        let _ = reload.await;
        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }
}
