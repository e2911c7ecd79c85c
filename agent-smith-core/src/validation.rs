//! Referential integrity and well-formedness checks
//!
//! The [`Validator`] never fails: it walks the whole project and collects
//! every problem it finds into a [`ValidationReport`]. Generation is only
//! allowed for projects whose report is empty.

use crate::naming::{agent_variable, is_identifier, module_name, tool_function};
use crate::project::Project;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;
use tracing::debug;

/// Symbols every rendered agent module defines or imports itself
const RESERVED_SYMBOLS: &[&str] = &["Agent", "types", "INSTRUCTION"];

/// A single structural problem blocking generation
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValidationFinding {
    #[error("Agent '{agent}' references unknown tool '{tool}'")]
    UnresolvedTool { agent: String, tool: String },

    #[error("Agent '{agent}' references unknown sub-agent '{sub_agent}'")]
    UnresolvedSubAgent { agent: String, sub_agent: String },

    #[error("Sub-agent cycle: {}", .path.join(" -> "))]
    SubAgentCycle { path: Vec<String> },

    #[error("Primary agent '{name}' does not exist")]
    UnresolvedPrimaryAgent { name: String },

    #[error("Generated tool '{tool}' has no code")]
    MissingToolCode { tool: String },

    #[error("Project declares no agents")]
    NoAgents,

    #[error("Tool '{tool}' parameter '{parameter}': {reason}")]
    InvalidToolParameter {
        tool: String,
        parameter: String,
        reason: String,
    },

    #[error("Builtin tool '{tool}' references '{reference}', which is not a valid identifier")]
    InvalidBuiltinReference { tool: String, reference: String },

    #[error("Identifier '{identifier}' is derived from both {first} and {second}")]
    IdentifierCollision {
        identifier: String,
        first: String,
        second: String,
    },
}

impl ValidationFinding {
    /// Short machine-readable tag, matching the serialized `kind`
    pub fn kind(&self) -> &'static str {
        match self {
            Self::UnresolvedTool { .. } => "unresolved_tool",
            Self::UnresolvedSubAgent { .. } => "unresolved_sub_agent",
            Self::SubAgentCycle { .. } => "sub_agent_cycle",
            Self::UnresolvedPrimaryAgent { .. } => "unresolved_primary_agent",
            Self::MissingToolCode { .. } => "missing_tool_code",
            Self::NoAgents => "no_agents",
            Self::InvalidToolParameter { .. } => "invalid_tool_parameter",
            Self::InvalidBuiltinReference { .. } => "invalid_builtin_reference",
            Self::IdentifierCollision { .. } => "identifier_collision",
        }
    }
}

/// Outcome of validating a project
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ValidationReport {
    pub findings: Vec<ValidationFinding>,
}

impl ValidationReport {
    pub fn is_ok(&self) -> bool {
        self.findings.is_empty()
    }

    pub fn len(&self) -> usize {
        self.findings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.findings.is_empty()
    }

    /// Human-readable messages, one per finding
    pub fn messages(&self) -> Vec<String> {
        self.findings.iter().map(ToString::to_string).collect()
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_ok() {
            return write!(f, "configuration is valid");
        }
        write!(f, "{} validation finding(s): ", self.findings.len())?;
        write!(f, "{}", self.messages().join("; "))
    }
}

/// Stateless project validator
#[derive(Debug, Clone, Copy, Default)]
pub struct Validator;

impl Validator {
    pub fn new() -> Self {
        Self
    }

    /// Run every check and collect all findings
    pub fn validate(&self, project: &Project) -> ValidationReport {
        let mut findings = Vec::new();

        check_tool_references(project, &mut findings);
        check_sub_agent_references(project, &mut findings);
        check_cycles(project, &mut findings);
        check_primary_agent(project, &mut findings);
        check_tool_code(project, &mut findings);
        if project.agents.is_empty() {
            findings.push(ValidationFinding::NoAgents);
        }
        check_tool_parameters(project, &mut findings);
        check_builtin_references(project, &mut findings);
        check_identifier_collisions(project, &mut findings);

        debug!(
            "Validated project {} ({}): {} finding(s)",
            project.name,
            project.id,
            findings.len()
        );
        ValidationReport { findings }
    }
}

fn check_tool_references(project: &Project, findings: &mut Vec<ValidationFinding>) {
    for agent in &project.agents {
        for tool in agent.tools.iter().filter(|t| !project.has_tool(t)) {
            findings.push(ValidationFinding::UnresolvedTool {
                agent: agent.name.clone(),
                tool: tool.clone(),
            });
        }
    }
}

fn check_sub_agent_references(project: &Project, findings: &mut Vec<ValidationFinding>) {
    for agent in &project.agents {
        for sub_agent in agent.sub_agents.iter().filter(|a| !project.has_agent(a)) {
            findings.push(ValidationFinding::UnresolvedSubAgent {
                agent: agent.name.clone(),
                sub_agent: sub_agent.clone(),
            });
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Visit {
    Unvisited,
    OnStack,
    Done,
}

/// Depth-first search over resolvable sub-agent edges; every back edge
/// onto the recursion stack yields one cycle finding.
fn check_cycles(project: &Project, findings: &mut Vec<ValidationFinding>) {
    let mut index: HashMap<&str, usize> = HashMap::new();
    for (i, agent) in project.agents.iter().enumerate() {
        index.entry(agent.name.as_str()).or_insert(i);
    }
    let edges: Vec<Vec<usize>> = project
        .agents
        .iter()
        .map(|agent| {
            agent
                .sub_agents
                .iter()
                .filter_map(|name| index.get(name.as_str()).copied())
                .collect()
        })
        .collect();

    let mut state = vec![Visit::Unvisited; project.agents.len()];
    let mut stack = Vec::new();
    for start in 0..project.agents.len() {
        if state[start] == Visit::Unvisited {
            visit(start, &edges, &mut state, &mut stack, project, findings);
        }
    }
}

fn visit(
    node: usize,
    edges: &[Vec<usize>],
    state: &mut [Visit],
    stack: &mut Vec<usize>,
    project: &Project,
    findings: &mut Vec<ValidationFinding>,
) {
    state[node] = Visit::OnStack;
    stack.push(node);

    for &next in &edges[node] {
        match state[next] {
            Visit::Unvisited => visit(next, edges, state, stack, project, findings),
            Visit::OnStack => {
                let from = stack.iter().position(|&n| n == next).unwrap_or(0);
                let mut path: Vec<String> = stack[from..]
                    .iter()
                    .map(|&n| project.agents[n].name.clone())
                    .collect();
                path.push(project.agents[next].name.clone());
                findings.push(ValidationFinding::SubAgentCycle { path });
            }
            Visit::Done => {}
        }
    }

    stack.pop();
    state[node] = Visit::Done;
}

fn check_primary_agent(project: &Project, findings: &mut Vec<ValidationFinding>) {
    if let Some(ref name) = project.build_context.primary_agent_name {
        if !project.has_agent(name) {
            findings.push(ValidationFinding::UnresolvedPrimaryAgent { name: name.clone() });
        }
    }
}

fn check_tool_code(project: &Project, findings: &mut Vec<ValidationFinding>) {
    for tool in project.tools.iter().filter(|t| t.is_generated()) {
        if tool.code.trim().is_empty() {
            findings.push(ValidationFinding::MissingToolCode {
                tool: tool.name.clone(),
            });
        }
    }
}

fn check_tool_parameters(project: &Project, findings: &mut Vec<ValidationFinding>) {
    for tool in project.tools.iter().filter(|t| t.is_generated()) {
        let mut seen: Vec<&str> = Vec::new();
        let mut default_seen = false;

        for parameter in &tool.parameters {
            let reason = if !is_identifier(&parameter.name) {
                Some("not a valid identifier")
            } else if seen.contains(&parameter.name.as_str()) {
                Some("declared more than once")
            } else if default_seen && parameter.default.is_none() {
                Some("parameter without a default follows one with a default")
            } else {
                None
            };

            if let Some(reason) = reason {
                findings.push(ValidationFinding::InvalidToolParameter {
                    tool: tool.name.clone(),
                    parameter: parameter.name.clone(),
                    reason: reason.to_string(),
                });
            }
            seen.push(&parameter.name);
            default_seen |= parameter.default.is_some();
        }
    }
}

fn check_builtin_references(project: &Project, findings: &mut Vec<ValidationFinding>) {
    for tool in project.tools.iter().filter(|t| !t.is_generated()) {
        let reference = tool.builtin_reference();
        if !is_identifier(reference) {
            findings.push(ValidationFinding::InvalidBuiltinReference {
                tool: tool.name.clone(),
                reference: reference.to_string(),
            });
        }
    }
}

/// Rendered modules and symbols must map back to exactly one definition.
///
/// Agent modules share the `agents/` package. Agent variables, generated
/// tool functions and builtin imports share one symbol namespace because
/// the entry point and agent modules import them side by side. Several
/// builtin tools may bind the same framework symbol.
fn check_identifier_collisions(project: &Project, findings: &mut Vec<ValidationFinding>) {
    let mut modules: HashMap<String, String> = HashMap::new();
    let mut symbols: HashMap<String, (String, bool)> = HashMap::new();
    for reserved in RESERVED_SYMBOLS {
        symbols.insert(
            reserved.to_string(),
            (format!("the reserved name '{}'", reserved), false),
        );
    }

    let mut collide = |identifier: String, first: &str, second: String| {
        findings.push(ValidationFinding::IdentifierCollision {
            identifier,
            first: first.to_string(),
            second,
        });
    };

    for agent in &project.agents {
        let owner = format!("agent '{}'", agent.name);
        let module = module_name(&agent.name);
        if let Some(first) = modules.get(&module) {
            collide(module, first, owner);
            continue;
        }
        modules.insert(module, owner.clone());

        let variable = agent_variable(&agent.name);
        match symbols.get(&variable) {
            Some((first, _)) => collide(variable, first, owner),
            None => {
                symbols.insert(variable, (owner, false));
            }
        }
    }

    for tool in &project.tools {
        let owner = format!("tool '{}'", tool.name);
        let (symbol, builtin) = if tool.is_generated() {
            (tool_function(&tool.name), false)
        } else if is_identifier(tool.builtin_reference()) {
            (tool.builtin_reference().to_string(), true)
        } else {
            continue;
        };

        match symbols.get(&symbol) {
            Some((_, true)) if builtin => {}
            Some((first, _)) => collide(symbol, first, owner),
            None => {
                symbols.insert(symbol, (owner, builtin));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::AgentConfig;
    use crate::project::{BuildContextPatch, ProjectLimits};
    use crate::tool::{ToolConfig, ToolParameter};

    fn agent(name: &str, sub_agents: &[&str], tools: &[&str]) -> AgentConfig {
        let mut builder = AgentConfig::builder().name(name).model("m1");
        for sub_agent in sub_agents {
            builder = builder.sub_agent(*sub_agent);
        }
        for tool in tools {
            builder = builder.tool(*tool);
        }
        builder.build().unwrap()
    }

    fn project(agents: Vec<AgentConfig>, tools: Vec<ToolConfig>) -> Project {
        let mut project = Project::new("demo").unwrap();
        let limits = ProjectLimits::default();
        for a in agents {
            project.add_agent(a, &limits).unwrap();
        }
        for t in tools {
            project.add_tool(t, &limits).unwrap();
        }
        project
    }

    #[test]
    fn test_valid_project_has_no_findings() {
        let project = project(
            vec![
                agent("root", &["helper"], &["google_search"]),
                agent("helper", &[], &["calc"]),
            ],
            vec![
                ToolConfig::builtin("google_search"),
                ToolConfig::generated("calc", "return 1"),
            ],
        );
        let report = Validator::new().validate(&project);
        assert!(report.is_ok(), "{}", report);
        assert_eq!(report.to_string(), "configuration is valid");
    }

    #[test]
    fn test_dangling_sub_agent_yields_single_finding() {
        let project = project(vec![agent("root", &["helper"], &[])], vec![]);
        let report = Validator::new().validate(&project);
        assert_eq!(
            report.findings,
            vec![ValidationFinding::UnresolvedSubAgent {
                agent: "root".to_string(),
                sub_agent: "helper".to_string(),
            }]
        );
    }

    #[test]
    fn test_unresolved_tool_and_primary() {
        let mut project = project(vec![agent("root", &[], &["search"])], vec![]);
        project
            .update_build_context(BuildContextPatch {
                primary_agent_name: Some("main".to_string()),
                ..BuildContextPatch::default()
            })
            .unwrap();

        let report = Validator::new().validate(&project);
        let kinds: Vec<&str> = report.findings.iter().map(|f| f.kind()).collect();
        assert_eq!(kinds, vec!["unresolved_tool", "unresolved_primary_agent"]);
    }

    #[test]
    fn test_two_agent_cycle_reports_path() {
        let project = project(
            vec![agent("a", &["b"], &[]), agent("b", &["a"], &[])],
            vec![],
        );
        let report = Validator::new().validate(&project);
        assert_eq!(
            report.findings,
            vec![ValidationFinding::SubAgentCycle {
                path: vec!["a".to_string(), "b".to_string(), "a".to_string()],
            }]
        );
        assert!(report.to_string().contains("a -> b -> a"));
    }

    #[test]
    fn test_self_reference_is_a_cycle() {
        let project = project(vec![agent("loop", &["loop"], &[])], vec![]);
        let report = Validator::new().validate(&project);
        assert_eq!(
            report.findings,
            vec![ValidationFinding::SubAgentCycle {
                path: vec!["loop".to_string(), "loop".to_string()],
            }]
        );
    }

    #[test]
    fn test_diamond_is_not_a_cycle() {
        let project = project(
            vec![
                agent("root", &["left", "right"], &[]),
                agent("left", &["leaf"], &[]),
                agent("right", &["leaf"], &[]),
                agent("leaf", &[], &[]),
            ],
            vec![],
        );
        assert!(Validator::new().validate(&project).is_ok());
    }

    #[test]
    fn test_generated_tool_without_code() {
        let project = project(
            vec![agent("root", &[], &["calc"])],
            vec![ToolConfig::generated("calc", "  \n")],
        );
        let report = Validator::new().validate(&project);
        assert_eq!(
            report.findings,
            vec![ValidationFinding::MissingToolCode {
                tool: "calc".to_string()
            }]
        );
    }

    #[test]
    fn test_empty_project_has_no_agents() {
        let report = Validator::new().validate(&Project::new("empty").unwrap());
        assert_eq!(report.findings, vec![ValidationFinding::NoAgents]);
    }

    #[test]
    fn test_malformed_parameters() {
        let tool = ToolConfig::generated("lookup", "return None")
            .with_parameter(ToolParameter::new("query").with_default("''"))
            .with_parameter(ToolParameter::new("limit"))
            .with_parameter(ToolParameter::new("query"))
            .with_parameter(ToolParameter::new("bad name"));
        let project = project(vec![agent("root", &[], &["lookup"])], vec![tool]);

        let report = Validator::new().validate(&project);
        let parameters: Vec<&str> = report
            .findings
            .iter()
            .filter_map(|f| match f {
                ValidationFinding::InvalidToolParameter { parameter, .. } => {
                    Some(parameter.as_str())
                }
                _ => None,
            })
            .collect();
        assert_eq!(parameters, vec!["limit", "query", "bad name"]);
    }

    #[test]
    fn test_builtin_reference_must_be_identifier() {
        let project = project(
            vec![agent("root", &[], &["web search"])],
            vec![ToolConfig::builtin("web search")],
        );
        let report = Validator::new().validate(&project);
        assert_eq!(
            report.findings,
            vec![ValidationFinding::InvalidBuiltinReference {
                tool: "web search".to_string(),
                reference: "web search".to_string(),
            }]
        );
    }

    #[test]
    fn test_identifier_collisions() {
        let project = project(
            vec![agent("Helper", &[], &[]), agent("helper", &[], &[])],
            vec![
                ToolConfig::generated("Calc", "return 1"),
                ToolConfig::generated("calc", "return 2"),
                ToolConfig::builtin("search").with_builtin_type("google_search"),
                ToolConfig::builtin("google_search"),
            ],
        );
        let report = Validator::new().validate(&project);
        let identifiers: Vec<&str> = report
            .findings
            .iter()
            .filter_map(|f| match f {
                ValidationFinding::IdentifierCollision { identifier, .. } => {
                    Some(identifier.as_str())
                }
                _ => None,
            })
            .collect();
        assert_eq!(identifiers, vec!["helper", "calc"]);
    }

    #[test]
    fn test_findings_serialize_with_kind_tag() {
        let finding = ValidationFinding::UnresolvedSubAgent {
            agent: "root".to_string(),
            sub_agent: "helper".to_string(),
        };
        let value = serde_json::to_value(&finding).unwrap();
        assert_eq!(value["kind"], "unresolved_sub_agent");
        assert_eq!(value["sub_agent"], "helper");
        assert_eq!(finding.kind(), "unresolved_sub_agent");
    }
}
