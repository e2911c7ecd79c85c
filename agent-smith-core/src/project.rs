//! Project domain model and related types
//!
//! A [`Project`] is the unit of configuration being assembled: agents,
//! tools, free-form metadata and the build context that steers code
//! generation. All structural invariants that can be checked locally
//! (non-empty names, uniqueness, count limits) are enforced here;
//! cross-references are left to the validator.
//!
//! # Examples
//!
//! ```rust
//! use agent_smith_core::agent::AgentConfig;
//! use agent_smith_core::project::*;
//!
//! let mut project = Project::new("demo").unwrap();
//! let limits = ProjectLimits::default();
//!
//! project
//!     .add_agent(AgentConfig::new("root", "gemini-2.0-flash").unwrap(), &limits)
//!     .unwrap();
//!
//! assert_eq!(project.agent_count(), 1);
//! assert_eq!(project.root_agent_name(), Some("root"));
//! ```

use crate::agent::{dedup, merge_references, validate_name, AgentConfig, AgentPatch};
use crate::config::Settings;
use crate::tool::{ToolConfig, ToolPatch};
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use uuid::Uuid;

/// Free-form metadata; merged key by key
pub type Metadata = BTreeMap<String, Value>;

/// Metadata patch; keys overwrite, nothing is removed
pub type MetadataPatch = BTreeMap<String, Value>;

/// Capacity limits applied when adding agents and tools
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProjectLimits {
    pub max_agents: usize,
    pub max_tools: usize,
}

impl Default for ProjectLimits {
    fn default() -> Self {
        Self {
            max_agents: 10,
            max_tools: 20,
        }
    }
}

impl From<&Settings> for ProjectLimits {
    fn from(settings: &Settings) -> Self {
        Self {
            max_agents: settings.max_agents_per_project,
            max_tools: settings.max_tools_per_project,
        }
    }
}

/// Generation-time settings of a project
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct BuildContext {
    pub output_directory: Option<String>,
    pub primary_agent_name: Option<String>,
    pub flags: BTreeMap<String, Value>,
    /// Extra pip requirement lines
    pub requirements: Vec<String>,
    /// Example environment variables for `.env.example`
    pub environment: BTreeMap<String, String>,
}

/// Partial update for the build context
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct BuildContextPatch {
    pub output_directory: Option<String>,
    pub primary_agent_name: Option<String>,
    pub flags: BTreeMap<String, Value>,
    pub requirements: Option<Vec<String>>,
    pub environment: BTreeMap<String, String>,
}

impl BuildContext {
    /// Boolean flag lookup with a fallback for absent or non-boolean values
    pub fn flag(&self, key: &str, default: bool) -> bool {
        self.flags
            .get(key)
            .and_then(Value::as_bool)
            .unwrap_or(default)
    }

    /// Merge a patch; the patch is checked before any field is written
    pub fn apply_patch(&mut self, patch: BuildContextPatch) -> Result<()> {
        patch.validate()?;

        if let Some(output_directory) = patch.output_directory {
            self.output_directory = Some(output_directory);
        }
        if let Some(primary) = patch.primary_agent_name {
            self.primary_agent_name = Some(primary);
        }
        self.flags.extend(patch.flags);
        if let Some(requirements) = patch.requirements {
            self.requirements = merge_references(&self.requirements, requirements, false);
        }
        self.environment.extend(patch.environment);
        Ok(())
    }
}

impl BuildContextPatch {
    /// Check the patch without applying it
    pub fn validate(&self) -> Result<()> {
        if let Some(ref dir) = self.output_directory {
            if dir.trim().is_empty() {
                return Err(Error::invalid_input("Output directory cannot be empty"));
            }
        }
        if let Some(ref primary) = self.primary_agent_name {
            validate_name("Primary agent", primary)?;
        }
        if let Some(ref requirements) = self.requirements {
            if requirements.iter().any(|r| r.trim().is_empty()) {
                return Err(Error::invalid_input("Requirement lines cannot be empty"));
            }
            for requirement in requirements {
                validate_single_line("Requirement", requirement)?;
            }
        }
        for (key, value) in &self.environment {
            if key.trim().is_empty() || key.contains('=') {
                return Err(Error::invalid_input(
                    "Environment variable names cannot be empty or contain '='",
                ));
            }
            validate_single_line("Environment variable name", key)?;
            validate_single_line("Environment variable value", value)?;
        }
        Ok(())
    }
}

/// Reject values that would break out of a line in generated files
fn validate_single_line(kind: &str, value: &str) -> Result<()> {
    if value.contains(['\n', '\r']) {
        return Err(Error::invalid_input(format!(
            "{} cannot contain line breaks: {:?}",
            kind, value
        )));
    }
    Ok(())
}

fn validate_project_name(name: &str) -> Result<()> {
    validate_name("Project", name)?;
    validate_single_line("Project name", name)
}

/// The multi-agent system being assembled in one session
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Project {
    pub id: Uuid,
    pub name: String,
    pub metadata: Metadata,
    pub agents: Vec<AgentConfig>,
    pub tools: Vec<ToolConfig>,
    pub build_context: BuildContext,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Cheap status view of a project
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConfigSummary {
    pub project_id: Uuid,
    pub name: String,
    pub agent_names: Vec<String>,
    pub tool_names: Vec<String>,
    pub agent_count: usize,
    pub tool_count: usize,
    pub build_context: BuildContext,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Project {
    /// Create a new empty project
    pub fn new<S: Into<String>>(name: S) -> Result<Self> {
        let name = name.into();
        validate_project_name(&name)?;
        Ok(Self::blank(name))
    }

    /// Create an empty project without checking the name
    pub fn blank<S: Into<String>>(name: S) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            metadata: Metadata::new(),
            agents: Vec::new(),
            tools: Vec::new(),
            build_context: BuildContext::default(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Update the project's updated_at timestamp
    pub fn update_timestamp(&mut self) {
        self.updated_at = Utc::now();
    }

    pub fn agent_count(&self) -> usize {
        self.agents.len()
    }

    pub fn tool_count(&self) -> usize {
        self.tools.len()
    }

    pub fn agent(&self, name: &str) -> Option<&AgentConfig> {
        self.agents.iter().find(|a| a.name == name)
    }

    pub fn tool(&self, name: &str) -> Option<&ToolConfig> {
        self.tools.iter().find(|t| t.name == name)
    }

    pub fn has_agent(&self, name: &str) -> bool {
        self.agent(name).is_some()
    }

    pub fn has_tool(&self, name: &str) -> bool {
        self.tool(name).is_some()
    }

    pub fn agent_names(&self) -> Vec<String> {
        self.agents.iter().map(|a| a.name.clone()).collect()
    }

    pub fn tool_names(&self) -> Vec<String> {
        self.tools.iter().map(|t| t.name.clone()).collect()
    }

    /// Metadata description, if one was recorded as a string
    pub fn description(&self) -> Option<&str> {
        self.metadata.get("description").and_then(Value::as_str)
    }

    /// Shallow-merge a metadata patch
    ///
    /// A string `name` entry renames the project rather than being stored.
    pub fn merge_metadata(&mut self, mut patch: MetadataPatch) -> Result<()> {
        let rename = match patch.remove("name") {
            Some(Value::String(name)) => {
                validate_project_name(&name)?;
                Some(name)
            }
            Some(other) => {
                return Err(Error::invalid_input(format!(
                    "Project name must be a string, got {}",
                    other
                )))
            }
            None => None,
        };

        if let Some(name) = rename {
            self.name = name;
        }
        self.metadata.extend(patch);
        self.update_timestamp();
        Ok(())
    }

    /// Append an agent, enforcing the count limit and name uniqueness
    pub fn add_agent(&mut self, mut agent: AgentConfig, limits: &ProjectLimits) -> Result<&AgentConfig> {
        agent.validate()?;
        if self.agents.len() >= limits.max_agents {
            return Err(Error::AgentLimitExceeded {
                limit: limits.max_agents,
            });
        }
        if self.has_agent(&agent.name) {
            return Err(Error::duplicate_name("agent", agent.name));
        }

        agent.normalize();
        self.agents.push(agent);
        self.update_timestamp();
        Ok(&self.agents[self.agents.len() - 1])
    }

    /// Patch an existing agent
    pub fn update_agent(&mut self, name: &str, patch: AgentPatch) -> Result<&AgentConfig> {
        let index = self
            .agents
            .iter()
            .position(|a| a.name == name)
            .ok_or_else(|| Error::AgentNotFound {
                name: name.to_string(),
            })?;

        self.agents[index].apply_patch(patch)?;
        self.update_timestamp();
        Ok(&self.agents[index])
    }

    /// Append a tool, enforcing the count limit and name uniqueness
    pub fn add_tool(&mut self, mut tool: ToolConfig, limits: &ProjectLimits) -> Result<&ToolConfig> {
        tool.validate()?;
        if self.tools.len() >= limits.max_tools {
            return Err(Error::ToolLimitExceeded {
                limit: limits.max_tools,
            });
        }
        if self.has_tool(&tool.name) {
            return Err(Error::duplicate_name("tool", tool.name));
        }

        tool.normalize();
        self.tools.push(tool);
        self.update_timestamp();
        Ok(&self.tools[self.tools.len() - 1])
    }

    /// Patch an existing tool
    pub fn update_tool(&mut self, name: &str, patch: ToolPatch) -> Result<&ToolConfig> {
        let index = self
            .tools
            .iter()
            .position(|t| t.name == name)
            .ok_or_else(|| Error::ToolNotFound {
                name: name.to_string(),
            })?;

        self.tools[index].apply_patch(patch)?;
        self.update_timestamp();
        Ok(&self.tools[index])
    }

    /// Merge into the build context
    pub fn update_build_context(&mut self, patch: BuildContextPatch) -> Result<&BuildContext> {
        self.build_context.apply_patch(patch)?;
        self.update_timestamp();
        Ok(&self.build_context)
    }

    /// Name of the agent exposed as the system's root
    ///
    /// The configured primary agent wins. Otherwise the first declared agent
    /// that no other agent lists as a sub-agent, falling back to the first
    /// declared agent when every agent is referenced.
    pub fn root_agent_name(&self) -> Option<&str> {
        if let Some(ref primary) = self.build_context.primary_agent_name {
            return Some(primary.as_str());
        }
        self.agents
            .iter()
            .find(|candidate| {
                !self
                    .agents
                    .iter()
                    .any(|a| a.name != candidate.name && a.delegates_to(&candidate.name))
            })
            .or_else(|| self.agents.first())
            .map(|a| a.name.as_str())
    }

    /// Extra requirement lines, deduplicated
    pub fn requirements(&self) -> Vec<String> {
        dedup(self.build_context.requirements.clone())
    }

    /// Build the status summary
    pub fn summary(&self) -> ConfigSummary {
        ConfigSummary {
            project_id: self.id,
            name: self.name.clone(),
            agent_names: self.agent_names(),
            tool_names: self.tool_names(),
            agent_count: self.agent_count(),
            tool_count: self.tool_count(),
            build_context: self.build_context.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn agent(name: &str) -> AgentConfig {
        AgentConfig::new(name, "m1").unwrap()
    }

    #[test]
    fn test_project_creation() {
        let project = Project::new("demo").unwrap();
        assert_eq!(project.name, "demo");
        assert_eq!(project.agent_count(), 0);
        assert_eq!(project.tool_count(), 0);
        assert!(project.root_agent_name().is_none());
        assert!(Project::new(" ").is_err());
    }

    #[test]
    fn test_agent_limit_leaves_agents_unchanged() {
        let mut project = Project::new("demo").unwrap();
        let limits = ProjectLimits {
            max_agents: 2,
            max_tools: 2,
        };
        project.add_agent(agent("a"), &limits).unwrap();
        project.add_agent(agent("b"), &limits).unwrap();

        let result = project.add_agent(agent("c"), &limits);
        assert_eq!(result.unwrap_err(), Error::AgentLimitExceeded { limit: 2 });
        assert_eq!(project.agent_names(), vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_duplicate_agent_is_rejected() {
        let mut project = Project::new("demo").unwrap();
        let limits = ProjectLimits::default();
        let original = AgentConfig::builder()
            .name("root")
            .model("m1")
            .instruction("original")
            .build()
            .unwrap();
        project.add_agent(original.clone(), &limits).unwrap();

        let result = project.add_agent(agent("root"), &limits);
        assert!(matches!(result, Err(Error::DuplicateName { .. })));
        assert_eq!(project.agent("root"), Some(&original));
    }

    #[test]
    fn test_names_are_case_sensitive() {
        let mut project = Project::new("demo").unwrap();
        let limits = ProjectLimits::default();
        project.add_agent(agent("root"), &limits).unwrap();
        assert!(project.add_agent(agent("Root"), &limits).is_ok());
    }

    #[test]
    fn test_tool_limit_and_duplicates() {
        let mut project = Project::new("demo").unwrap();
        let limits = ProjectLimits {
            max_agents: 1,
            max_tools: 1,
        };
        project
            .add_tool(ToolConfig::builtin("google_search"), &limits)
            .unwrap();
        let result = project.add_tool(ToolConfig::builtin("google_search"), &limits);
        assert!(matches!(result, Err(Error::ToolLimitExceeded { limit: 1 })));

        let mut project = Project::new("demo").unwrap();
        let limits = ProjectLimits::default();
        project
            .add_tool(ToolConfig::generated("calc", "return 1"), &limits)
            .unwrap();
        let result = project.add_tool(ToolConfig::generated("calc", "return 2"), &limits);
        assert!(matches!(result, Err(Error::DuplicateName { .. })));
        assert_eq!(project.tool("calc").unwrap().code, "return 1");
    }

    #[test]
    fn test_update_missing_agent_and_tool() {
        let mut project = Project::new("demo").unwrap();
        let result = project.update_agent("ghost", AgentPatch::default());
        assert!(matches!(result, Err(Error::AgentNotFound { .. })));
        let result = project.update_tool("ghost", ToolPatch::default());
        assert!(matches!(result, Err(Error::ToolNotFound { .. })));
    }

    #[test]
    fn test_metadata_merge_is_shallow() {
        let mut project = Project::new("demo").unwrap();
        project
            .merge_metadata(BTreeMap::from([
                ("description".to_string(), json!("first")),
                ("tags".to_string(), json!(["a"])),
            ]))
            .unwrap();
        project
            .merge_metadata(BTreeMap::from([
                ("description".to_string(), json!("second")),
                ("author".to_string(), json!("ops")),
            ]))
            .unwrap();

        assert_eq!(project.description(), Some("second"));
        assert_eq!(project.metadata["tags"], json!(["a"]));
        assert_eq!(project.metadata["author"], json!("ops"));
    }

    #[test]
    fn test_metadata_name_renames_project() {
        let mut project = Project::new("demo").unwrap();
        project
            .merge_metadata(BTreeMap::from([("name".to_string(), json!("support desk"))]))
            .unwrap();
        assert_eq!(project.name, "support desk");
        assert!(!project.metadata.contains_key("name"));

        let result =
            project.merge_metadata(BTreeMap::from([("name".to_string(), json!(42))]));
        assert!(result.is_err());
        assert_eq!(project.name, "support desk");
    }

    #[test]
    fn test_root_agent_inference() {
        let mut project = Project::new("demo").unwrap();
        let limits = ProjectLimits::default();
        project.add_agent(agent("helper"), &limits).unwrap();
        project
            .add_agent(
                AgentConfig::builder()
                    .name("root")
                    .model("m1")
                    .sub_agent("helper")
                    .build()
                    .unwrap(),
                &limits,
            )
            .unwrap();
        assert_eq!(project.root_agent_name(), Some("root"));

        project
            .update_build_context(BuildContextPatch {
                primary_agent_name: Some("helper".to_string()),
                ..BuildContextPatch::default()
            })
            .unwrap();
        assert_eq!(project.root_agent_name(), Some("helper"));
    }

    #[test]
    fn test_build_context_merge() {
        let mut project = Project::new("demo").unwrap();
        project
            .update_build_context(BuildContextPatch {
                output_directory: Some("out".to_string()),
                flags: BTreeMap::from([("quick_start".to_string(), json!(false))]),
                requirements: Some(vec!["httpx>=0.25".to_string()]),
                ..BuildContextPatch::default()
            })
            .unwrap();
        project
            .update_build_context(BuildContextPatch {
                requirements: Some(vec!["httpx>=0.25".to_string(), "pydantic".to_string()]),
                environment: BTreeMap::from([("API_URL".to_string(), "http://x".to_string())]),
                ..BuildContextPatch::default()
            })
            .unwrap();

        let ctx = &project.build_context;
        assert_eq!(ctx.output_directory.as_deref(), Some("out"));
        assert!(!ctx.flag("quick_start", true));
        assert!(ctx.flag("missing", true));
        assert_eq!(ctx.requirements.len(), 2);
        assert_eq!(ctx.environment["API_URL"], "http://x");
    }

    #[test]
    fn test_line_breaks_are_rejected() {
        assert!(Project::new("demo\nINJECTED=1").is_err());

        let mut project = Project::new("demo").unwrap();
        let rename = project.merge_metadata(BTreeMap::from([(
            "name".to_string(),
            json!("demo\r\nINJECTED=1"),
        )]));
        assert!(matches!(rename, Err(Error::InvalidInput { .. })));
        assert_eq!(project.name, "demo");

        let patches = vec![
            BuildContextPatch {
                requirements: Some(vec!["httpx\ninjected".to_string()]),
                ..BuildContextPatch::default()
            },
            BuildContextPatch {
                environment: BTreeMap::from([("API\nKEY".to_string(), "x".to_string())]),
                ..BuildContextPatch::default()
            },
            BuildContextPatch {
                environment: BTreeMap::from([("API_KEY".to_string(), "x\nEXTRA=1".to_string())]),
                ..BuildContextPatch::default()
            },
        ];
        for patch in patches {
            assert!(project.update_build_context(patch).is_err());
        }
        assert!(project.build_context.requirements.is_empty());
        assert!(project.build_context.environment.is_empty());
    }

    #[test]
    fn test_summary_reflects_contents() {
        let mut project = Project::new("demo").unwrap();
        let limits = ProjectLimits::default();
        project.add_agent(agent("root"), &limits).unwrap();
        project
            .add_tool(ToolConfig::builtin("google_search"), &limits)
            .unwrap();

        let summary = project.summary();
        assert_eq!(summary.agent_names, vec!["root".to_string()]);
        assert_eq!(summary.tool_names, vec!["google_search".to_string()]);
        assert_eq!(summary.agent_count, 1);
        assert_eq!(summary.tool_count, 1);
        assert_eq!(summary.project_id, project.id);
    }
}
