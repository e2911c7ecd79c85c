//! Storage manager owning the session store and its services

use crate::repositories::SessionStore;
use crate::services::ConfigMerger;
use crate::Result;
use agent_smith_core::config::Settings;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Main storage manager
///
/// Owns one [`SessionStore`] and the services built on it. Instances are
/// independent of each other, so tests construct their own.
pub struct StorageManager {
    settings: Settings,
    sessions: Arc<SessionStore>,
    merger: Arc<ConfigMerger>,
    sweeper: Mutex<Option<JoinHandle<()>>>,
}

impl StorageManager {
    /// Create a new storage manager
    pub fn new(settings: Settings) -> Result<Self> {
        settings.validate()?;

        let sessions = Arc::new(SessionStore::new(settings.session_timeout()));
        let merger = Arc::new(ConfigMerger::new(sessions.clone(), &settings));
        info!(
            "Storage manager ready (session timeout {:?}, limits {}/{})",
            settings.session_timeout(),
            settings.max_agents_per_project,
            settings.max_tools_per_project
        );

        Ok(Self {
            settings,
            sessions,
            merger,
            sweeper: Mutex::new(None),
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Get the session store
    pub fn sessions(&self) -> Arc<SessionStore> {
        self.sessions.clone()
    }

    /// Get the configuration merger
    pub fn merger(&self) -> Arc<ConfigMerger> {
        self.merger.clone()
    }

    /// Start the background expiry sweeper if it is enabled and not running
    ///
    /// Must be called from within a Tokio runtime. Returns whether a
    /// sweeper is running afterwards.
    pub fn start_sweeper(&self) -> bool {
        let Some(period) = self.settings.sweep_interval() else {
            info!("Session sweeper disabled");
            return false;
        };

        let mut sweeper = self.sweeper.lock();
        if sweeper.as_ref().is_some_and(|handle| !handle.is_finished()) {
            return true;
        }
        *sweeper = Some(self.sessions.spawn_sweeper(period));
        true
    }

    /// Stop the background sweeper
    pub fn shutdown(&self) {
        if let Some(handle) = self.sweeper.lock().take() {
            info!("Stopping session sweeper");
            handle.abort();
        }
    }

    /// Get storage statistics
    pub async fn stats(&self) -> StorageStats {
        let sessions = self.sessions.list().await;
        StorageStats {
            active_sessions: sessions.len(),
            agents_count: sessions.iter().map(|s| s.agent_count).sum(),
            tools_count: sessions.iter().map(|s| s.tool_count).sum(),
        }
    }
}

impl Drop for StorageManager {
    fn drop(&mut self) {
        if let Some(handle) = self.sweeper.get_mut().take() {
            if !handle.is_finished() {
                warn!("Storage manager dropped without shutdown; aborting sweeper");
            }
            handle.abort();
        }
    }
}

/// Storage statistics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageStats {
    pub active_sessions: usize,
    pub agents_count: usize,
    pub tools_count: usize,
}
