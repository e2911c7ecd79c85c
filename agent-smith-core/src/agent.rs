//! Agent configuration model and related types
//!
//! An [`AgentConfig`] describes one agent of the system being assembled.
//! References to tools and sub-agents are plain names, resolved by the
//! validator once the project is complete, so agents and their
//! dependencies can be added in any order.
//!
//! # Examples
//!
//! ```rust
//! use agent_smith_core::agent::*;
//!
//! let agent = AgentConfig::builder()
//!     .name("root")
//!     .model("gemini-2.0-flash")
//!     .description("Routes customer requests")
//!     .instruction("Delegate billing questions to the billing agent.")
//!     .tool("web_search")
//!     .sub_agent("billing")
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(agent.sub_agents, vec!["billing".to_string()]);
//! ```

use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Configuration of a single agent within a project
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct AgentConfig {
    pub name: String,
    pub model: String,
    pub description: String,
    pub instruction: String,
    pub tools: Vec<String>,
    pub sub_agents: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,
}

/// Partial update for an existing agent
///
/// Scalar fields overwrite when present. Reference lists are unioned with
/// the stored ones unless `replace_references` is set.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct AgentPatch {
    pub model: Option<String>,
    pub description: Option<String>,
    pub instruction: Option<String>,
    pub tools: Option<Vec<String>>,
    pub sub_agents: Option<Vec<String>>,
    pub temperature: Option<f64>,
    pub max_output_tokens: Option<u32>,
    pub replace_references: bool,
}

impl AgentConfig {
    /// Create a new agent with validation
    pub fn new<S1: Into<String>, S2: Into<String>>(name: S1, model: S2) -> Result<Self> {
        let agent = Self {
            name: name.into(),
            model: model.into(),
            ..Self::default()
        };
        agent.validate()?;
        Ok(agent)
    }

    /// Create a builder for constructing an AgentConfig
    pub fn builder() -> AgentConfigBuilder {
        AgentConfigBuilder::new()
    }

    /// Check field-level invariants
    pub fn validate(&self) -> Result<()> {
        validate_name("Agent", &self.name)?;
        if self.model.trim().is_empty() {
            return Err(Error::invalid_input(format!(
                "Agent '{}' must name a model",
                self.name
            )));
        }
        validate_references("tool", &self.tools)?;
        validate_references("sub-agent", &self.sub_agents)?;
        validate_generation(self.temperature, self.max_output_tokens)?;
        Ok(())
    }

    /// Collapse duplicate references, keeping first occurrences
    pub fn normalize(&mut self) {
        self.tools = dedup(std::mem::take(&mut self.tools));
        self.sub_agents = dedup(std::mem::take(&mut self.sub_agents));
    }

    /// Whether the agent lists `tool` among its tools
    pub fn uses_tool(&self, tool: &str) -> bool {
        self.tools.iter().any(|t| t == tool)
    }

    /// Whether the agent lists `agent` among its sub-agents
    pub fn delegates_to(&self, agent: &str) -> bool {
        self.sub_agents.iter().any(|a| a == agent)
    }

    /// Whether generation settings were provided
    pub fn has_generation_settings(&self) -> bool {
        self.temperature.is_some() || self.max_output_tokens.is_some()
    }

    /// Apply a patch; the patch is checked before any field is written
    pub fn apply_patch(&mut self, patch: AgentPatch) -> Result<()> {
        patch.validate()?;

        if let Some(model) = patch.model {
            self.model = model;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(instruction) = patch.instruction {
            self.instruction = instruction;
        }
        if let Some(tools) = patch.tools {
            self.tools = merge_references(&self.tools, tools, patch.replace_references);
        }
        if let Some(sub_agents) = patch.sub_agents {
            self.sub_agents =
                merge_references(&self.sub_agents, sub_agents, patch.replace_references);
        }
        if patch.temperature.is_some() {
            self.temperature = patch.temperature;
        }
        if patch.max_output_tokens.is_some() {
            self.max_output_tokens = patch.max_output_tokens;
        }
        Ok(())
    }
}

impl AgentPatch {
    /// Check the patch without applying it
    pub fn validate(&self) -> Result<()> {
        if let Some(ref model) = self.model {
            if model.trim().is_empty() {
                return Err(Error::invalid_input("Agent model cannot be empty"));
            }
        }
        if let Some(ref tools) = self.tools {
            validate_references("tool", tools)?;
        }
        if let Some(ref sub_agents) = self.sub_agents {
            validate_references("sub-agent", sub_agents)?;
        }
        validate_generation(self.temperature, self.max_output_tokens)
    }

    /// Whether the patch would change anything
    pub fn is_empty(&self) -> bool {
        self.model.is_none()
            && self.description.is_none()
            && self.instruction.is_none()
            && self.tools.is_none()
            && self.sub_agents.is_none()
            && self.temperature.is_none()
            && self.max_output_tokens.is_none()
    }
}

/// Validate a collection key such as an agent or tool name
pub(crate) fn validate_name(kind: &str, name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(Error::invalid_input(format!("{} name cannot be empty", kind)));
    }
    Ok(())
}

pub(crate) fn validate_references(kind: &str, references: &[String]) -> Result<()> {
    if references.iter().any(|r| r.trim().is_empty()) {
        return Err(Error::invalid_input(format!(
            "{} references cannot be empty",
            kind
        )));
    }
    Ok(())
}

fn validate_generation(temperature: Option<f64>, max_output_tokens: Option<u32>) -> Result<()> {
    if let Some(t) = temperature {
        if !(0.0..=2.0).contains(&t) {
            return Err(Error::invalid_input(format!(
                "Temperature must be between 0.0 and 2.0, got {}",
                t
            )));
        }
    }
    if max_output_tokens == Some(0) {
        return Err(Error::invalid_input("max_output_tokens must be positive"));
    }
    Ok(())
}

/// Union (or replace) an ordered reference set
pub(crate) fn merge_references(
    current: &[String],
    incoming: Vec<String>,
    replace: bool,
) -> Vec<String> {
    if replace {
        return dedup(incoming);
    }
    let mut merged = current.to_vec();
    merged.extend(incoming);
    dedup(merged)
}

pub(crate) fn dedup(values: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    values
        .into_iter()
        .filter(|v| seen.insert(v.clone()))
        .collect()
}

/// Builder for constructing AgentConfig instances with validation
#[derive(Debug, Clone, Default)]
pub struct AgentConfigBuilder {
    agent: AgentConfig,
}

impl AgentConfigBuilder {
    /// Create a new agent builder
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name<S: Into<String>>(mut self, name: S) -> Self {
        self.agent.name = name.into();
        self
    }

    pub fn model<S: Into<String>>(mut self, model: S) -> Self {
        self.agent.model = model.into();
        self
    }

    pub fn description<S: Into<String>>(mut self, description: S) -> Self {
        self.agent.description = description.into();
        self
    }

    pub fn instruction<S: Into<String>>(mut self, instruction: S) -> Self {
        self.agent.instruction = instruction.into();
        self
    }

    /// Add a tool reference
    pub fn tool<S: Into<String>>(mut self, tool: S) -> Self {
        self.agent.tools.push(tool.into());
        self
    }

    /// Add a sub-agent reference
    pub fn sub_agent<S: Into<String>>(mut self, agent: S) -> Self {
        self.agent.sub_agents.push(agent.into());
        self
    }

    pub fn temperature(mut self, temperature: f64) -> Self {
        self.agent.temperature = Some(temperature);
        self
    }

    pub fn max_output_tokens(mut self, tokens: u32) -> Self {
        self.agent.max_output_tokens = Some(tokens);
        self
    }

    /// Build the agent, normalizing reference sets
    pub fn build(self) -> Result<AgentConfig> {
        let mut agent = self.agent;
        agent.validate()?;
        agent.normalize();
        Ok(agent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_agent() -> AgentConfig {
        AgentConfig::builder()
            .name("root")
            .model("m1")
            .description("Front desk")
            .instruction("Be polite.")
            .tool("search")
            .sub_agent("helper")
            .build()
            .unwrap()
    }

    #[test]
    fn test_agent_creation_with_builder() {
        let agent = sample_agent();
        assert_eq!(agent.name, "root");
        assert_eq!(agent.model, "m1");
        assert!(agent.uses_tool("search"));
        assert!(agent.delegates_to("helper"));
        assert!(!agent.has_generation_settings());
    }

    #[test]
    fn test_agent_name_validation() {
        assert!(AgentConfig::new("", "m1").is_err());
        assert!(AgentConfig::new("   ", "m1").is_err());
        assert!(AgentConfig::new("root", "").is_err());
        assert!(AgentConfig::new("Root Agent", "m1").is_ok());
    }

    #[test]
    fn test_builder_dedups_references() {
        let agent = AgentConfig::builder()
            .name("root")
            .model("m1")
            .tool("a")
            .tool("b")
            .tool("a")
            .build()
            .unwrap();
        assert_eq!(agent.tools, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_empty_reference_rejected() {
        let result = AgentConfig::builder().name("root").model("m1").tool(" ").build();
        assert!(matches!(result, Err(Error::InvalidInput { .. })));
    }

    #[test]
    fn test_patch_overwrites_scalars_only_when_present() {
        let mut agent = sample_agent();
        agent
            .apply_patch(AgentPatch {
                instruction: Some("Be brief.".to_string()),
                ..AgentPatch::default()
            })
            .unwrap();

        assert_eq!(agent.instruction, "Be brief.");
        assert_eq!(agent.model, "m1");
        assert_eq!(agent.description, "Front desk");
        assert_eq!(agent.tools, vec!["search".to_string()]);
    }

    #[test]
    fn test_patch_unions_references() {
        let mut agent = sample_agent();
        agent
            .apply_patch(AgentPatch {
                tools: Some(vec!["search".to_string(), "calculator".to_string()]),
                ..AgentPatch::default()
            })
            .unwrap();
        assert_eq!(
            agent.tools,
            vec!["search".to_string(), "calculator".to_string()]
        );
    }

    #[test]
    fn test_patch_replaces_references_when_asked() {
        let mut agent = sample_agent();
        agent
            .apply_patch(AgentPatch {
                sub_agents: Some(vec![]),
                replace_references: true,
                ..AgentPatch::default()
            })
            .unwrap();
        assert!(agent.sub_agents.is_empty());
        // tools were not part of the patch
        assert_eq!(agent.tools, vec!["search".to_string()]);
    }

    #[test]
    fn test_invalid_patch_leaves_agent_untouched() {
        let mut agent = sample_agent();
        let before = agent.clone();
        let result = agent.apply_patch(AgentPatch {
            instruction: Some("changed".to_string()),
            temperature: Some(3.5),
            ..AgentPatch::default()
        });
        assert!(result.is_err());
        assert_eq!(agent, before);
    }

    #[test]
    fn test_agent_deserializes_with_defaults() {
        let agent: AgentConfig = serde_json::from_value(serde_json::json!({
            "name": "helper",
            "model": "m1"
        }))
        .unwrap();
        assert!(agent.tools.is_empty());
        assert!(agent.sub_agents.is_empty());
        assert!(agent.temperature.is_none());

        let patch: AgentPatch = serde_json::from_value(serde_json::json!({
            "tools": ["search"],
            "replace_references": true
        }))
        .unwrap();
        assert!(patch.replace_references);
        assert!(!patch.is_empty());
    }
}
