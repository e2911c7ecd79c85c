//! Project to source file rendering
//!
//! Rendering is a pure function of the project's agents, tools, metadata
//! and build context. Ids and timestamps never reach the output, so the
//! same project always produces byte-identical files.

use crate::{helpers, templates, Error, Result};
use agent_smith_core::agent::AgentConfig;
use agent_smith_core::naming::{agent_variable, module_name, tool_function};
use agent_smith_core::project::Project;
use agent_smith_core::tool::ToolConfig;
use handlebars::Handlebars;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

/// Ordered mapping of relative path to file content
pub type FileSet = BTreeMap<String, String>;

/// Build-context flag controlling `quick_start.py`
pub const QUICK_START_FLAG: &str = "quick_start";

/// Top-level files a render may produce
pub const PACKAGE_FILES: &[&str] = &[
    "__init__.py",
    "agent.py",
    "requirements.txt",
    ".env.example",
    "quick_start.py",
];

/// Directories whose Python modules belong to the package
pub const PACKAGE_DIRECTORIES: &[&str] = &["agents", "tools"];

const ADK_REQUIREMENT: &str = "google-adk";

#[derive(Serialize)]
struct AgentView {
    summary: String,
    imports: String,
    instruction: String,
    variable: String,
    module: String,
    model: String,
    description: String,
    tools: Vec<String>,
    sub_agents: Vec<String>,
    generation_config: Option<String>,
}

#[derive(Serialize)]
struct ToolView {
    summary: String,
    imports: String,
    function: String,
    parameters: Vec<String>,
    description: String,
    code: String,
}

#[derive(Serialize)]
struct EntryPointView {
    project_name: String,
    imports: String,
    root_variable: String,
}

#[derive(Serialize)]
struct PackageView {
    project_name: String,
    package: String,
}

#[derive(Serialize)]
struct LinesView {
    project_name: String,
    lines: String,
}

/// Renders projects into the files of a Python agent package
#[derive(Debug, Clone)]
pub struct CodeRenderer {
    handlebars: Handlebars<'static>,
}

impl CodeRenderer {
    /// Create a renderer with every template compiled
    pub fn new() -> Result<Self> {
        let mut handlebars = Handlebars::new();
        handlebars.set_strict_mode(true);
        handlebars.register_escape_fn(handlebars::no_escape);
        handlebars.register_helper("py_str", Box::new(helpers::py_str));
        handlebars.register_helper("py_doc", Box::new(helpers::py_doc));
        handlebars.register_helper("join", Box::new(helpers::join));
        handlebars.register_helper("indent", Box::new(helpers::indent));

        for (name, template) in templates::ALL {
            handlebars.register_template_string(name, template)?;
        }

        Ok(Self { handlebars })
    }

    /// Render every file of the package
    ///
    /// The project is expected to have passed validation; unresolved
    /// references are reported as rendering errors.
    pub fn render(&self, project: &Project) -> Result<FileSet> {
        let mut files = FileSet::new();

        for agent in &project.agents {
            let path = format!("agents/{}.py", module_name(&agent.name));
            files.insert(path, self.render_agent(project, agent)?);
        }

        let generated: Vec<&ToolConfig> = project
            .tools
            .iter()
            .filter(|t| t.is_generated())
            .collect();
        for tool in &generated {
            let path = format!("tools/{}.py", module_name(&tool.name));
            files.insert(path, self.render_tool(tool)?);
        }

        let package = PackageView {
            project_name: project.name.clone(),
            package: module_name(&project.name),
        };
        files.insert(
            "agent.py".to_string(),
            self.render_entry_point(project)?,
        );
        files.insert(
            "__init__.py".to_string(),
            self.handlebars
                .render(templates::PACKAGE_INIT_TEMPLATE, &package)?,
        );
        files.insert(
            "agents/__init__.py".to_string(),
            self.handlebars
                .render(templates::AGENTS_INIT_TEMPLATE, &package)?,
        );
        if !generated.is_empty() {
            files.insert(
                "tools/__init__.py".to_string(),
                self.handlebars
                    .render(templates::TOOLS_INIT_TEMPLATE, &package)?,
            );
        }

        files.insert(
            "requirements.txt".to_string(),
            self.handlebars.render(
                templates::REQUIREMENTS_TEMPLATE,
                &LinesView {
                    project_name: project.name.clone(),
                    lines: requirements(project).join("\n"),
                },
            )?,
        );
        files.insert(
            ".env.example".to_string(),
            self.handlebars.render(
                templates::ENV_EXAMPLE_TEMPLATE,
                &LinesView {
                    project_name: comment_text(&project.name),
                    lines: environment(project).join("\n"),
                },
            )?,
        );
        if project.build_context.flag(QUICK_START_FLAG, true) {
            files.insert(
                "quick_start.py".to_string(),
                self.handlebars
                    .render(templates::QUICK_START_TEMPLATE, &package)?,
            );
        }

        debug!(
            "Rendered {} files for project '{}'",
            files.len(),
            project.name
        );
        Ok(files)
    }

    fn render_agent(&self, project: &Project, agent: &AgentConfig) -> Result<String> {
        let mut imports = vec!["from google.adk.agents import Agent".to_string()];
        let generation_config = generation_config(agent);
        if generation_config.is_some() {
            imports.push("from google.genai import types".to_string());
        }

        let mut tool_symbols = Vec::new();
        let mut generated_imports = Vec::new();
        for name in &agent.tools {
            let tool = project.tool(name).ok_or_else(|| {
                Error::TemplateRendering(format!(
                    "Agent '{}' references unknown tool '{}'",
                    agent.name, name
                ))
            })?;
            let symbol = if tool.is_generated() {
                let function = tool_function(&tool.name);
                generated_imports.push(format!(
                    "from ..tools.{} import {}",
                    module_name(&tool.name),
                    function
                ));
                function
            } else {
                let symbol = tool.builtin_reference().to_string();
                push_unique(&mut imports, format!("from google.adk.tools import {}", symbol));
                symbol
            };
            if !tool_symbols.contains(&symbol) {
                tool_symbols.push(symbol);
            }
        }
        for line in generated_imports {
            push_unique(&mut imports, line);
        }

        let mut sub_agents = Vec::new();
        for name in &agent.sub_agents {
            let sub_agent = project.agent(name).ok_or_else(|| {
                Error::TemplateRendering(format!(
                    "Agent '{}' references unknown sub-agent '{}'",
                    agent.name, name
                ))
            })?;
            let variable = agent_variable(&sub_agent.name);
            push_unique(
                &mut imports,
                format!("from .{} import {}", module_name(&sub_agent.name), variable),
            );
            sub_agents.push(variable);
        }

        let view = AgentView {
            summary: if agent.description.trim().is_empty() {
                format!("{} agent.", agent.name)
            } else {
                format!("{}: {}", agent.name, agent.description)
            },
            imports: imports.join("\n"),
            instruction: agent.instruction.clone(),
            variable: agent_variable(&agent.name),
            module: module_name(&agent.name),
            model: agent.model.clone(),
            description: agent.description.clone(),
            tools: tool_symbols,
            sub_agents,
            generation_config,
        };
        Ok(self.handlebars.render(templates::AGENT_MODULE_TEMPLATE, &view)?)
    }

    fn render_tool(&self, tool: &ToolConfig) -> Result<String> {
        let imports: Vec<String> = tool.imports.iter().map(|i| import_line(i)).collect();
        let view = ToolView {
            summary: format!("Implementation of the {} tool.", tool.name),
            imports: if imports.is_empty() {
                String::new()
            } else {
                format!("{}\n\n\n", imports.join("\n"))
            },
            function: tool_function(&tool.name),
            parameters: tool.parameters.iter().map(|p| p.signature()).collect(),
            description: if tool.description.trim().is_empty() {
                format!("Run the {} tool.", tool.name)
            } else {
                tool.description.clone()
            },
            code: tool.code.clone(),
        };
        Ok(self.handlebars.render(templates::TOOL_MODULE_TEMPLATE, &view)?)
    }

    fn render_entry_point(&self, project: &Project) -> Result<String> {
        let root = project
            .root_agent_name()
            .and_then(|name| project.agent(name))
            .ok_or_else(|| {
                Error::TemplateRendering("Project has no root agent to expose".to_string())
            })?;

        let imports: Vec<String> = project
            .agents
            .iter()
            .map(|agent| {
                format!(
                    "from .agents.{} import {}",
                    module_name(&agent.name),
                    agent_variable(&agent.name)
                )
            })
            .collect();

        let view = EntryPointView {
            project_name: project.name.clone(),
            imports: imports.join("\n"),
            root_variable: agent_variable(&root.name),
        };
        Ok(self.handlebars.render(templates::ENTRY_POINT_TEMPLATE, &view)?)
    }
}

fn push_unique(lines: &mut Vec<String>, line: String) {
    if !lines.contains(&line) {
        lines.push(line);
    }
}

/// Bare module names become `import x`; full statements pass through
fn import_line(import: &str) -> String {
    let import = import.trim();
    if import.starts_with("import ") || import.starts_with("from ") {
        import.to_string()
    } else {
        format!("import {}", import)
    }
}

fn generation_config(agent: &AgentConfig) -> Option<String> {
    if !agent.has_generation_settings() {
        return None;
    }
    let mut arguments = Vec::new();
    if let Some(temperature) = agent.temperature {
        arguments.push(format!("temperature={}", temperature));
    }
    if let Some(tokens) = agent.max_output_tokens {
        arguments.push(format!("max_output_tokens={}", tokens));
    }
    Some(format!(
        "types.GenerateContentConfig({})",
        arguments.join(", ")
    ))
}

fn requirements(project: &Project) -> Vec<String> {
    let mut lines = vec![ADK_REQUIREMENT.to_string()];
    lines.extend(
        project
            .requirements()
            .into_iter()
            .map(|r| r.trim().to_string())
            .filter(|r| r != ADK_REQUIREMENT),
    );
    lines
}

/// Collapse line breaks so the text stays inside a `#` comment
fn comment_text(text: &str) -> String {
    text.split(['\n', '\r'])
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn environment(project: &Project) -> Vec<String> {
    let mut variables = BTreeMap::from([
        ("GOOGLE_API_KEY".to_string(), "your-api-key".to_string()),
        ("GOOGLE_GENAI_USE_VERTEXAI".to_string(), "FALSE".to_string()),
    ]);
    variables.extend(project.build_context.environment.clone());
    variables
        .into_iter()
        .map(|(key, value)| format!("{}={}", key, value))
        .collect()
}
