//! SockJS request dispatch.
//!
//! # Responsibilities
//! - Serve the fixed protocol endpoints (`/`, `/info`, `/iframe*.html`)
//! - Apply origin policy, CORS and cache headers
//! - Hand raw WebSocket and session requests to the collaborators
//! - Answer every malformed or disabled request with a bare 404

use std::sync::Arc;

use arc_swap::ArcSwap;
use axum::body::Body;
use axum::http::header::{CONTENT_TYPE, X_FRAME_OPTIONS};
use axum::http::{HeaderValue, Request, Response, StatusCode};
use tracing::Level;

use crate::config::ServiceConfig;
use crate::observability::metrics;
use crate::sockjs::error::SockJsResult;
use crate::sockjs::handler::{RawWebSocketHandler, SharedHandler, TransportContext, TransportHandler};
use crate::sockjs::path::{self, InvalidPath, SockJsPath};
use crate::sockjs::scheduler::TaskScheduler;
use crate::sockjs::{iframe, info};

const WELCOME: &str = "Welcome to SockJS!\n";
const TEXT_PLAIN_UTF8: &str = "text/plain;charset=UTF-8";

/// The SockJS service: one instance per endpoint, shared by all requests.
pub struct SockJsService<R, T> {
    config: ArcSwap<ServiceConfig>,
    scheduler: TaskScheduler,
    raw_websocket: R,
    transport: T,
}

impl<R, T> SockJsService<R, T>
where
    R: RawWebSocketHandler,
    T: TransportHandler,
{
    pub fn new(config: ServiceConfig, scheduler: TaskScheduler, raw_websocket: R, transport: T) -> Self {
        tracing::info!(
            name = %config.name,
            websocket_enabled = config.websocket_enabled,
            allowed_origins = ?config.allowed_origins,
            "SockJS service created"
        );
        Self {
            config: ArcSwap::from_pointee(config),
            scheduler,
            raw_websocket,
            transport,
        }
    }

    /// Current configuration snapshot.
    pub fn config(&self) -> Arc<ServiceConfig> {
        self.config.load_full()
    }

    /// Replace the configuration. Requests in flight keep the old snapshot.
    pub fn update_config(&self, config: ServiceConfig) {
        tracing::info!(
            name = %config.name,
            websocket_enabled = config.websocket_enabled,
            allowed_origins = ?config.allowed_origins,
            "SockJS configuration updated"
        );
        self.config.store(Arc::new(config));
    }

    pub fn name(&self) -> String {
        self.config.load().name.clone()
    }

    /// Scheduler handed to transports for heartbeat timers.
    pub fn task_scheduler(&self) -> &TaskScheduler {
        &self.scheduler
    }

    /// Handle one request below the endpoint prefix.
    ///
    /// `sockjs_path` is the request path with the prefix removed, `None` if
    /// the request did not carry one. Status and headers are written into
    /// `response`; a response left untouched means the default (200, empty).
    pub async fn handle_request(
        &self,
        request: Request<Body>,
        response: &mut Response<Body>,
        sockjs_path: Option<&str>,
        handler: SharedHandler,
    ) -> SockJsResult<()> {
        let Some(sockjs_path) = sockjs_path else {
            tracing::warn!(uri = %request.uri(), "Expected SockJS path. Failing request");
            *response.status_mut() = StatusCode::NOT_FOUND;
            return Ok(());
        };

        // Content-Type is never parsed: SockJS payloads are JSON whatever is declared.
        let config = self.config.load_full();
        let request_info = tracing::enabled!(Level::DEBUG)
            .then(|| format!("{} {}", request.method(), request.uri()));

        let path = path::classify(sockjs_path);
        let kind = path.kind();
        let result = self
            .dispatch(request, response, sockjs_path, path, config, request_info.as_deref(), handler)
            .await;

        metrics::record_request(kind, response.status().as_u16());
        if let Err(e) = &result {
            tracing::error!(error = %e, session_id = ?e.session_id(), "SockJS request failed");
        }
        result
    }

    #[allow(clippy::too_many_arguments)]
    async fn dispatch(
        &self,
        request: Request<Body>,
        response: &mut Response<Body>,
        sockjs_path: &str,
        path: SockJsPath,
        config: Arc<ServiceConfig>,
        request_info: Option<&str>,
        handler: SharedHandler,
    ) -> SockJsResult<()> {
        match path {
            SockJsPath::Root => {
                log_processing(request_info);
                response
                    .headers_mut()
                    .insert(CONTENT_TYPE, HeaderValue::from_static(TEXT_PLAIN_UTF8));
                *response.body_mut() = Body::from(WELCOME);
            }

            SockJsPath::Info => {
                log_processing(request_info);
                info::handle_info(&request, response, &config)?;
            }

            SockJsPath::Iframe { .. } => {
                if config.restricts_origins() {
                    if let Some(info) = request_info {
                        tracing::debug!(
                            request = info,
                            "Iframe support is disabled when an origin check is required. Ignoring transport request"
                        );
                    }
                    *response.status_mut() = StatusCode::NOT_FOUND;
                    return Ok(());
                }
                if config.allowed_origins.is_empty() {
                    response
                        .headers_mut()
                        .insert(X_FRAME_OPTIONS, HeaderValue::from_static("SAMEORIGIN"));
                }
                log_processing(request_info);
                iframe::handle_iframe(&request, response, &config.client_library_url)?;
            }

            SockJsPath::RawWebSocket => {
                if config.websocket_enabled {
                    log_processing(request_info);
                    self.raw_websocket
                        .handle_raw_websocket_request(request, response, handler)
                        .await?;
                } else if let Some(info) = request_info {
                    tracing::debug!(request = info, "WebSocket disabled. Ignoring transport request");
                }
            }

            SockJsPath::Session { server_id, session_id, transport } => {
                if !config.websocket_enabled && transport == "websocket" {
                    if let Some(info) = request_info {
                        tracing::debug!(request = info, "WebSocket disabled. Ignoring transport request");
                    }
                    *response.status_mut() = StatusCode::NOT_FOUND;
                    return Ok(());
                }
                if !self.transport.validate_request(&server_id, &session_id, &transport) {
                    log_ignoring(request_info);
                    *response.status_mut() = StatusCode::NOT_FOUND;
                    return Ok(());
                }

                log_processing(request_info);
                let context = TransportContext {
                    server_id,
                    session_id,
                    transport,
                    config,
                    scheduler: self.scheduler.clone(),
                };
                self.transport
                    .handle_transport_request(request, response, handler, context)
                    .await?;
            }

            SockJsPath::Invalid(reason) => {
                match reason {
                    InvalidPath::WrongSegmentCount => tracing::warn!(
                        path = sockjs_path,
                        "Invalid SockJS path - required to have 3 path segments"
                    ),
                    InvalidPath::DotNotAllowed => tracing::warn!(
                        path = sockjs_path,
                        "Either server or session contains a \".\" which is not allowed by SockJS protocol"
                    ),
                    InvalidPath::BadEncoding => tracing::warn!(
                        path = sockjs_path,
                        "SockJS path is not valid UTF-8 once percent-decoded"
                    ),
                }
                log_ignoring(request_info);
                *response.status_mut() = StatusCode::NOT_FOUND;
            }
        }
        Ok(())
    }
}

fn log_processing(request_info: Option<&str>) {
    if let Some(info) = request_info {
        tracing::debug!(request = info, "Processing transport request");
    }
}

fn log_ignoring(request_info: Option<&str>) {
    if let Some(info) = request_info {
        tracing::debug!(request = info, "Ignoring transport request");
    }
}
