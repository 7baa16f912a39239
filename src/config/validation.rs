//! Configuration validation.
//!
//! Serde handles syntax; this module checks value ranges, the mount prefix
//! shape and the allowed-origin entries. All problems are reported, not just
//! the first one.

use std::net::SocketAddr;
use thiserror::Error;
use url::Url;

use crate::config::schema::GatewayConfig;

/// A single semantic problem found in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("listener.bind_address '{0}' is not a socket address")]
    BindAddress(String),

    #[error("listener.path_prefix '{0}' must start with '/' and must not end with '/'")]
    PathPrefix(String),

    #[error("{0} must be greater than zero")]
    NotPositive(&'static str),

    #[error("sockjs.client_library_url must not be empty")]
    EmptyClientLibraryUrl,

    #[error("allowed origin '{0}' must be \"*\" or an http(s) origin such as \"https://example.org\"")]
    AllowedOrigin(String),
}

/// Validate a loaded configuration.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let listener = &config.listener;
    if listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(listener.bind_address.clone()));
    }
    let prefix = &listener.path_prefix;
    if !prefix.starts_with('/') || prefix.len() < 2 || prefix.ends_with('/') {
        errors.push(ValidationError::PathPrefix(prefix.clone()));
    }
    if listener.max_body_size == 0 {
        errors.push(ValidationError::NotPositive("listener.max_body_size"));
    }

    let sockjs = &config.sockjs;
    if sockjs.client_library_url.trim().is_empty() {
        errors.push(ValidationError::EmptyClientLibraryUrl);
    }
    if sockjs.stream_bytes_limit == 0 {
        errors.push(ValidationError::NotPositive("sockjs.stream_bytes_limit"));
    }
    if sockjs.heartbeat_interval_ms == 0 {
        errors.push(ValidationError::NotPositive("sockjs.heartbeat_interval_ms"));
    }
    if sockjs.disconnect_delay_ms == 0 {
        errors.push(ValidationError::NotPositive("sockjs.disconnect_delay_ms"));
    }
    if sockjs.http_message_cache_size == 0 {
        errors.push(ValidationError::NotPositive("sockjs.http_message_cache_size"));
    }
    for origin in &sockjs.allowed_origins {
        if !is_valid_origin_entry(origin) {
            errors.push(ValidationError::AllowedOrigin(origin.clone()));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn is_valid_origin_entry(origin: &str) -> bool {
    if origin == "*" {
        return true;
    }
    match Url::parse(origin) {
        Ok(url) => matches!(url.scheme(), "http" | "https") && url.host_str().is_some(),
        Err(_) => false,
    }
}
