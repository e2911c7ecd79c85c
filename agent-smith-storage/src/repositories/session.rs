//! In-memory session repository

use crate::session::{Session, SessionInfo};
use crate::{Error, Result};
use agent_smith_core::project::Project;
use dashmap::DashMap;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info};
use uuid::Uuid;

type SessionHandle = Arc<RwLock<Session>>;

/// Holds every live session, keyed by session id
///
/// The map only guards membership. Each session carries its own lock, and
/// map guards are released before any lock is awaited.
#[derive(Debug)]
pub struct SessionStore {
    sessions: DashMap<String, SessionHandle>,
    timeout: Duration,
}

impl SessionStore {
    /// Create an empty store whose sessions expire after `timeout` idle
    pub fn new(timeout: Duration) -> Self {
        Self {
            sessions: DashMap::new(),
            timeout,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Open a session over a fresh, empty project
    pub fn create<S: Into<String>>(&self, name: S) -> String {
        self.insert(Project::blank(name))
    }

    /// Open a session over an existing project
    pub fn insert(&self, project: Project) -> String {
        let session_id = Uuid::new_v4().to_string();
        info!(
            "Created session {} for project '{}'",
            session_id, project.name
        );
        let session = Session::new(session_id.clone(), project, self.timeout);
        self.sessions
            .insert(session_id.clone(), Arc::new(RwLock::new(session)));
        session_id
    }

    /// Snapshot of the session's project
    pub async fn get(&self, session_id: &str) -> Result<Project> {
        self.inspect(session_id, Project::clone).await
    }

    /// Run `f` against the project under the session's exclusive lock
    ///
    /// `f` works on a staged copy that replaces the stored project only when
    /// it returns `Ok`, so a failed mutation leaves nothing behind.
    pub async fn update<F, T>(&self, session_id: &str, f: F) -> Result<T>
    where
        F: FnOnce(&mut Project) -> agent_smith_core::Result<T>,
    {
        let handle = self.handle(session_id)?;
        let mut session = handle.write().await;
        if session.is_expired() {
            drop(session);
            self.evict(session_id, &handle);
            return Err(Error::session_not_found(session_id));
        }

        session.touch();
        let mut staged = session.project.clone();
        let output = f(&mut staged)?;
        session.project = staged;
        Ok(output)
    }

    /// Run `f` against the project without modifying it
    pub async fn inspect<F, T>(&self, session_id: &str, f: F) -> Result<T>
    where
        F: FnOnce(&Project) -> T,
    {
        let handle = self.handle(session_id)?;
        let mut session = handle.write().await;
        if session.is_expired() {
            drop(session);
            self.evict(session_id, &handle);
            return Err(Error::session_not_found(session_id));
        }

        session.touch();
        Ok(f(&session.project))
    }

    /// Remove a session; returns whether one was present
    pub fn delete(&self, session_id: &str) -> bool {
        let removed = self.sessions.remove(session_id).is_some();
        if removed {
            info!("Deleted session {}", session_id);
        } else {
            debug!("Delete of unknown session {} ignored", session_id);
        }
        removed
    }

    /// Active sessions ordered by id
    pub async fn list(&self) -> Vec<SessionInfo> {
        let mut infos = Vec::new();
        for handle in self.handles() {
            let session = handle.read().await;
            if !session.is_expired() {
                infos.push(session.info());
            }
        }
        infos.sort_by(|a, b| a.session_id.cmp(&b.session_id));
        infos
    }

    /// Evict every expired session and return their ids
    pub async fn sweep_expired(&self) -> Vec<String> {
        let mut expired = Vec::new();
        for handle in self.handles() {
            let session_id = {
                let session = handle.read().await;
                if !session.is_expired() {
                    continue;
                }
                session.id.clone()
            };
            if self.evict(&session_id, &handle) {
                expired.push(session_id);
            }
        }

        if !expired.is_empty() {
            info!("Swept {} expired sessions", expired.len());
        }
        expired
    }

    /// Periodically sweep expired sessions until the store is dropped
    pub fn spawn_sweeper(self: &Arc<Self>, period: Duration) -> JoinHandle<()> {
        let store: Weak<Self> = Arc::downgrade(self);
        info!("Starting session sweeper every {:?}", period);

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            // the first tick completes immediately
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let Some(store) = store.upgrade() else {
                    debug!("Session store dropped, stopping sweeper");
                    break;
                };
                store.sweep_expired().await;
            }
        })
    }

    /// Number of stored sessions, including expired ones not yet evicted
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    fn handle(&self, session_id: &str) -> Result<SessionHandle> {
        self.sessions
            .get(session_id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| Error::session_not_found(session_id))
    }

    fn handles(&self) -> Vec<SessionHandle> {
        self.sessions
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect()
    }

    /// Remove the entry only if it still holds `handle`
    fn evict(&self, session_id: &str, handle: &SessionHandle) -> bool {
        let evicted = self
            .sessions
            .remove_if(session_id, |_, current| Arc::ptr_eq(current, handle))
            .is_some();
        if evicted {
            info!("Session {} expired after {:?} idle", session_id, self.timeout);
        }
        evicted
    }
}
