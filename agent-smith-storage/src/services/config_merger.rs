//! Configuration merging service

use crate::repositories::SessionStore;
use crate::session::SessionInfo;
use crate::{Error, Result};
use agent_smith_core::{
    agent::{AgentConfig, AgentPatch},
    config::Settings,
    project::{
        BuildContext, BuildContextPatch, ConfigSummary, Metadata, MetadataPatch, Project,
        ProjectLimits,
    },
    tool::{ToolConfig, ToolPatch},
};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Mutation and query API over session-scoped projects
///
/// Every operation runs against one session and is all-or-nothing: patches
/// are checked before anything is written, and a failed operation leaves
/// the stored project exactly as it was.
pub struct ConfigMerger {
    store: Arc<SessionStore>,
    limits: ProjectLimits,
    default_model: String,
}

impl ConfigMerger {
    /// Create a merger using the limits and default model from `settings`
    pub fn new(store: Arc<SessionStore>, settings: &Settings) -> Self {
        Self::with_limits(
            store,
            ProjectLimits::from(settings),
            settings.default_model.clone(),
        )
    }

    pub fn with_limits<S: Into<String>>(
        store: Arc<SessionStore>,
        limits: ProjectLimits,
        default_model: S,
    ) -> Self {
        Self {
            store,
            limits,
            default_model: default_model.into(),
        }
    }

    pub fn limits(&self) -> ProjectLimits {
        self.limits
    }

    pub fn store(&self) -> Arc<SessionStore> {
        self.store.clone()
    }

    /// Start a new session with an empty project
    pub async fn create_project(&self, name: &str) -> Result<String> {
        let project = Project::new(name)?;
        let session_id = self.store.insert(project);
        info!("Created project '{}' in session {}", name, session_id);
        Ok(session_id)
    }

    /// Shallow-merge metadata and return the resulting mapping
    pub async fn update_project_metadata(
        &self,
        session_id: &str,
        patch: MetadataPatch,
    ) -> Result<Metadata> {
        debug!(
            "Updating metadata keys {:?} in session {}",
            patch.keys().collect::<Vec<_>>(),
            session_id
        );
        self.store
            .update(session_id, |project| {
                project.merge_metadata(patch)?;
                Ok(project.metadata.clone())
            })
            .await
            .map_err(|e| log_failure("update_project_metadata", session_id, e))
    }

    /// Add an agent; a missing model is filled with the default model
    pub async fn add_agent_to_config(
        &self,
        session_id: &str,
        mut agent: AgentConfig,
    ) -> Result<AgentConfig> {
        if agent.model.trim().is_empty() {
            agent.model = self.default_model.clone();
        }
        let name = agent.name.clone();
        let limits = self.limits;

        let added = self
            .store
            .update(session_id, |project| project.add_agent(agent, &limits).cloned())
            .await
            .map_err(|e| log_failure("add_agent_to_config", session_id, e))?;

        info!("Added agent '{}' to session {}", name, session_id);
        Ok(added)
    }

    /// Patch an existing agent and return its new state
    pub async fn update_agent_in_config(
        &self,
        session_id: &str,
        name: &str,
        patch: AgentPatch,
    ) -> Result<AgentConfig> {
        if patch.is_empty() && !patch.replace_references {
            debug!("Empty patch for agent '{}' in session {}", name, session_id);
        }

        let updated = self
            .store
            .update(session_id, |project| project.update_agent(name, patch).cloned())
            .await
            .map_err(|e| log_failure("update_agent_in_config", session_id, e))?;

        info!("Updated agent '{}' in session {}", name, session_id);
        Ok(updated)
    }

    pub async fn add_tool_to_config(&self, session_id: &str, tool: ToolConfig) -> Result<ToolConfig> {
        let name = tool.name.clone();
        let limits = self.limits;

        let added = self
            .store
            .update(session_id, |project| project.add_tool(tool, &limits).cloned())
            .await
            .map_err(|e| log_failure("add_tool_to_config", session_id, e))?;

        info!(
            "Added {:?} tool '{}' to session {}",
            added.kind, name, session_id
        );
        Ok(added)
    }

    pub async fn update_tool_in_config(
        &self,
        session_id: &str,
        name: &str,
        patch: ToolPatch,
    ) -> Result<ToolConfig> {
        let updated = self
            .store
            .update(session_id, |project| project.update_tool(name, patch).cloned())
            .await
            .map_err(|e| log_failure("update_tool_in_config", session_id, e))?;

        info!("Updated tool '{}' in session {}", name, session_id);
        Ok(updated)
    }

    /// Copy of the full project
    pub async fn get_full_config(&self, session_id: &str) -> Result<Project> {
        self.store.get(session_id).await
    }

    pub async fn get_config_summary(&self, session_id: &str) -> Result<ConfigSummary> {
        self.store.inspect(session_id, Project::summary).await
    }

    /// Merge into the build context
    ///
    /// The primary agent is not required to exist yet; the validator
    /// reports it if it never appears.
    pub async fn update_build_context(
        &self,
        session_id: &str,
        patch: BuildContextPatch,
    ) -> Result<BuildContext> {
        let context = self
            .store
            .update(session_id, |project| project.update_build_context(patch).cloned())
            .await
            .map_err(|e| log_failure("update_build_context", session_id, e))?;

        info!("Updated build context in session {}", session_id);
        Ok(context)
    }

    /// Drop a session; deleting an unknown session is not an error
    pub async fn delete_session(&self, session_id: &str) -> bool {
        self.store.delete(session_id)
    }

    pub async fn list_sessions(&self) -> Vec<SessionInfo> {
        self.store.list().await
    }
}

fn log_failure(operation: &str, session_id: &str, err: Error) -> Error {
    warn!(
        "{} failed for session {} ({}): {}",
        operation,
        session_id,
        err.category(),
        err
    );
    err
}

#[cfg(test)]
mod tests {
    include!("config_merger_tests.rs");
}
