//! Configuration file watcher for hot reload.
//!
//! The parent directory is watched rather than the file itself, so editors
//! that save by renaming a temporary file over the original are picked up.

use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::config::loader::{parse_config, ConfigError};
use crate::config::schema::GatewayConfig;

/// Watches one TOML file and emits every valid new version of it.
pub struct ConfigWatcher {
    path: PathBuf,
    update_tx: mpsc::UnboundedSender<GatewayConfig>,
}

impl ConfigWatcher {
    /// Returns the watcher and a receiver for validated configuration updates.
    pub fn new(path: &Path) -> (Self, mpsc::UnboundedReceiver<GatewayConfig>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();
        let watcher = Self {
            path: path.to_path_buf(),
            update_tx,
        };
        (watcher, update_rx)
    }

    /// Start watching. Watching stops when the returned handle is dropped.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let path = self.path;
        let dir = match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let file_name = path.file_name().map(|n| n.to_os_string());
        let tx = self.update_tx;
        let last_seen = Mutex::new(std::fs::read_to_string(&path).ok());

        let event_path = path.clone();
        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    let relevant = (event.kind.is_modify() || event.kind.is_create())
                        && event
                            .paths
                            .iter()
                            .any(|p| p.file_name().map(|n| n.to_os_string()) == file_name);
                    if !relevant {
                        return;
                    }
                    let Ok(mut last_seen) = last_seen.lock() else {
                        return;
                    };
                    match reload(&event_path, &mut last_seen) {
                        Ok(Some(config)) => {
                            tracing::info!(path = ?event_path, "Config file changed, reloaded");
                            let _ = tx.send(config);
                        }
                        Ok(None) => {}
                        Err(e) => {
                            tracing::error!(error = %e, "Failed to reload config, keeping current configuration");
                        }
                    }
                }
                Err(e) => tracing::error!(error = ?e, "Watch error"),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&dir, RecursiveMode::NonRecursive)?;
        tracing::info!(path = ?path, "Config watcher started");
        Ok(watcher)
    }
}

/// Re-read `path`. `Ok(None)` when the content is what was seen last.
fn reload(path: &Path, last_seen: &mut Option<String>) -> Result<Option<GatewayConfig>, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
    if last_seen.as_deref() == Some(content.as_str()) {
        return Ok(None);
    }
    let config = parse_config(&content)?;
    *last_seen = Some(content);
    Ok(Some(config))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_reload_skips_unchanged_content() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[sockjs]\nwebsocket_enabled = false\n").unwrap();

        let mut last_seen = None;
        let config = reload(file.path(), &mut last_seen).unwrap().unwrap();
        assert!(!config.sockjs.websocket_enabled);
        assert!(reload(file.path(), &mut last_seen).unwrap().is_none());

        write!(file, "suppress_cors = true\n").unwrap();
        let config = reload(file.path(), &mut last_seen).unwrap().unwrap();
        assert!(config.sockjs.suppress_cors);
    }

    #[test]
    fn test_reload_rejects_invalid_config() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[listener]\npath_prefix = \"no-slash\"\n").unwrap();

        let mut last_seen = None;
        assert!(matches!(
            reload(file.path(), &mut last_seen),
            Err(ConfigError::Validation(_))
        ));
        assert!(last_seen.is_none());
    }
}
