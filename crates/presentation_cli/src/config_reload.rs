//! Hot-reloadable configuration support
//!
//! SIGHUP re-reads the configuration sources and swaps the result in
//! atomically. Subscribers get a version bump on a watch channel and pull
//! the new snapshot with [`ReloadableConfig::load`].

use std::sync::Arc;

use arc_swap::ArcSwap;
use infrastructure::{AppConfig, ConfigSource};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// A wrapper around `AppConfig` that supports atomic reload via SIGHUP
#[derive(Debug, Clone)]
pub struct ReloadableConfig {
    inner: Arc<ArcSwap<AppConfig>>,
    source: ConfigSource,
    /// Notifier for config change events
    notify: watch::Sender<u64>,
    /// Receiver for config change events
    receiver: watch::Receiver<u64>,
}

impl ReloadableConfig {
    /// Wrap an already loaded configuration and remember where it came from
    #[must_use]
    pub fn new(config: AppConfig, source: ConfigSource) -> Self {
        let (notify, receiver) = watch::channel(0);
        Self {
            inner: Arc::new(ArcSwap::from_pointee(config)),
            source,
            notify,
            receiver,
        }
    }

    /// Get the current configuration
    #[must_use]
    pub fn load(&self) -> Arc<AppConfig> {
        self.inner.load_full()
    }

    /// Current version; bumped on every successful reload
    #[must_use]
    pub fn version(&self) -> u64 {
        *self.notify.borrow()
    }

    /// Re-read the configuration sources
    ///
    /// Returns `true` if the reload was successful. An invalid configuration
    /// is rejected and the previous one stays active.
    pub fn reload(&self) -> bool {
        match self.source.load() {
            Ok(new_config) => {
                self.apply(new_config);
                info!(version = self.version(), "Configuration reloaded successfully");
                true
            },
            Err(e) => {
                error!(error = %e, "Failed to reload configuration");
                false
            },
        }
    }

    /// Swap in a new configuration and notify subscribers
    pub fn apply(&self, config: AppConfig) {
        self.inner.store(Arc::new(config));
        self.notify.send_modify(|version| *version += 1);
    }

    /// Subscribe to configuration change notifications
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.receiver.clone()
    }
}

/// Spawn a background task that reloads configuration on SIGHUP
///
/// The task ends when `shutdown` is cancelled.
#[cfg(unix)]
pub fn spawn_config_reload_handler(config: ReloadableConfig, shutdown: CancellationToken) {
    use tokio::signal::unix::{SignalKind, signal};

    tokio::spawn(async move {
        let mut sighup = match signal(SignalKind::hangup()) {
            Ok(s) => s,
            Err(e) => {
                error!(error = %e, "Failed to install SIGHUP handler");
                return;
            },
        };

        loop {
            tokio::select! {
                received = sighup.recv() => {
                    if received.is_none() {
                        break;
                    }
                },
                () = shutdown.cancelled() => break,
            }

            info!("Received SIGHUP, reloading configuration");
            if !config.reload() {
                warn!("Configuration reload failed, keeping previous config");
            }
        }
    });
}

/// No-op on non-Unix systems
#[cfg(not(unix))]
pub fn spawn_config_reload_handler(_config: ReloadableConfig, _shutdown: CancellationToken) {
    warn!("SIGHUP config reload not supported on this platform");
}
