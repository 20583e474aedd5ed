pub mod config;

pub use self::config::{load_config, parse_config, validate_config};

use std::sync::Arc;
use tokio::sync::RwLock;

use crate::types::server_config::AppConfig;

/// A cheaply-cloneable, live config handle.
///
/// All clones share the same underlying `RwLock<AppConfig>`, so a call to
/// [`reload`](LiveConfig::reload) is visible to every holder on its next read.
/// Streams that are already running keep the snapshot they started with.
///
/// # Usage
/// ```rust,no_run
/// // Copy what you need out of the guard before awaiting
/// // let delay = state.config.read().await.stream.delay();
/// ```
#[derive(Clone, Debug)]
pub struct LiveConfig(Arc<RwLock<AppConfig>>);

impl LiveConfig {
    /// Wrap an `AppConfig` in a new `LiveConfig`.
    pub fn new(config: AppConfig) -> Self {
        Self(Arc::new(RwLock::new(config)))
    }

    /// Acquire a read guard. Keep it short-lived; never hold across `.await`.
    pub async fn read(&self) -> tokio::sync::RwLockReadGuard<'_, AppConfig> {
        self.0.read().await
    }

    /// Atomically swap in a new config.
    pub async fn reload(&self, new: AppConfig) {
        *self.0.write().await = new;
    }
}
