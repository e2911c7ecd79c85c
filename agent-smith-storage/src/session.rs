//! Session records held by the store

use agent_smith_core::project::Project;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A time-scoped handle over exactly one project
#[derive(Debug, Clone)]
pub struct Session {
    pub id: String,
    pub project: Project,
    pub last_activity: DateTime<Utc>,
    pub timeout: Duration,
}

impl Session {
    pub fn new(id: String, project: Project, timeout: Duration) -> Self {
        Self {
            id,
            project,
            last_activity: Utc::now(),
            timeout,
        }
    }

    /// Whether the session has been idle longer than its timeout at `now`
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        match now.signed_duration_since(self.last_activity).to_std() {
            Ok(idle) => idle > self.timeout,
            // last_activity lies in the future
            Err(_) => false,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    pub fn touch(&mut self) {
        self.last_activity = Utc::now();
    }

    pub fn info(&self) -> SessionInfo {
        SessionInfo {
            session_id: self.id.clone(),
            name: self.project.name.clone(),
            agent_count: self.project.agent_count(),
            tool_count: self.project.tool_count(),
            updated_at: self.project.updated_at,
        }
    }
}

/// Listing entry for an active session
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionInfo {
    pub session_id: String,
    pub name: String,
    pub agent_count: usize,
    pub tool_count: usize,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expiry_is_strictly_after_timeout() {
        let project = Project::new("demo").unwrap();
        let session = Session::new("s1".to_string(), project, Duration::from_secs(60));
        let start = session.last_activity;

        assert!(!session.is_expired_at(start));
        assert!(!session.is_expired_at(start + chrono::Duration::seconds(60)));
        assert!(session.is_expired_at(start + chrono::Duration::seconds(61)));
        assert!(!session.is_expired_at(start - chrono::Duration::seconds(5)));
    }

    #[test]
    fn test_info_reflects_project() {
        let project = Project::new("demo").unwrap();
        let session = Session::new("s1".to_string(), project, Duration::from_secs(60));
        let info = session.info();
        assert_eq!(info.session_id, "s1");
        assert_eq!(info.name, "demo");
        assert_eq!(info.agent_count, 0);
    }
}
