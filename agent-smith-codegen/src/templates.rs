//! Handlebars templates for the generated Python package
//!
//! Block helpers are only ever used inline so that no template line
//! depends on standalone-tag whitespace handling.

pub const AGENT_MODULE_TEMPLATE: &str = "agent_module";
pub const TOOL_MODULE_TEMPLATE: &str = "tool_module";
pub const ENTRY_POINT_TEMPLATE: &str = "entry_point";
pub const PACKAGE_INIT_TEMPLATE: &str = "package_init";
pub const AGENTS_INIT_TEMPLATE: &str = "agents_init";
pub const TOOLS_INIT_TEMPLATE: &str = "tools_init";
pub const REQUIREMENTS_TEMPLATE: &str = "requirements";
pub const ENV_EXAMPLE_TEMPLATE: &str = "env_example";
pub const QUICK_START_TEMPLATE: &str = "quick_start";

/// One module per agent under `agents/`
pub const AGENT_MODULE: &str = r#""""{{py_doc summary}}"""

{{imports}}

INSTRUCTION = """{{py_doc instruction}}"""

{{variable}} = Agent(
    name={{py_str module}},
    model={{py_str model}},
    description={{py_str description}},
    instruction=INSTRUCTION,
    tools=[{{join tools ", "}}],
    sub_agents=[{{join sub_agents ", "}}],{{#if generation_config}}
    generate_content_config={{generation_config}},{{/if}}
)
"#;

/// One module per generated tool under `tools/`
pub const TOOL_MODULE: &str = r#""""{{py_doc summary}}"""

{{imports}}def {{function}}({{join parameters ", "}}):
    """{{py_doc description}}"""
{{indent code 4}}
"#;

/// `agent.py`, the module the agent runtime loads
pub const ENTRY_POINT: &str = r#""""Entry point for the {{py_doc project_name}} agent system."""

{{imports}}

root_agent = {{root_variable}}

__all__ = ["root_agent"]
"#;

pub const PACKAGE_INIT: &str = r#""""{{py_doc project_name}} agent package."""

from . import agent
"#;

pub const AGENTS_INIT: &str = r#""""Agent definitions for {{py_doc project_name}}."""
"#;

pub const TOOLS_INIT: &str = r#""""Tool implementations for {{py_doc project_name}}."""
"#;

pub const REQUIREMENTS: &str = "{{lines}}\n";

pub const ENV_EXAMPLE: &str = r#"# Environment for {{project_name}}. Copy to .env and fill in real values.
{{lines}}
"#;

/// Interactive console runner, started with `python -m <package>.quick_start`
pub const QUICK_START: &str = r#""""Chat with the {{py_doc project_name}} agent system from a terminal.

Run from the directory containing the package:

    python -m {{package}}.quick_start
"""

import asyncio

from google.adk.runners import InMemoryRunner
from google.genai import types

from .agent import root_agent

APP_NAME = {{py_str package}}
USER_ID = "local_user"


async def main() -> None:
    runner = InMemoryRunner(agent=root_agent, app_name=APP_NAME)
    session = await runner.session_service.create_session(
        app_name=APP_NAME, user_id=USER_ID
    )
    print("Type 'exit' to quit.")
    while True:
        text = input("> ").strip()
        if text.lower() in {"exit", "quit"}:
            break
        if not text:
            continue
        message = types.Content(role="user", parts=[types.Part(text=text)])
        async for event in runner.run_async(
            user_id=USER_ID, session_id=session.id, new_message=message
        ):
            if event.content and event.content.parts:
                for part in event.content.parts:
                    if part.text:
                        print(part.text)


if __name__ == "__main__":
    asyncio.run(main())
"#;

/// Every template with its registration name
pub const ALL: &[(&str, &str)] = &[
    (AGENT_MODULE_TEMPLATE, AGENT_MODULE),
    (TOOL_MODULE_TEMPLATE, TOOL_MODULE),
    (ENTRY_POINT_TEMPLATE, ENTRY_POINT),
    (PACKAGE_INIT_TEMPLATE, PACKAGE_INIT),
    (AGENTS_INIT_TEMPLATE, AGENTS_INIT),
    (TOOLS_INIT_TEMPLATE, TOOLS_INIT),
    (REQUIREMENTS_TEMPLATE, REQUIREMENTS),
    (ENV_EXAMPLE_TEMPLATE, ENV_EXAMPLE),
    (QUICK_START_TEMPLATE, QUICK_START),
];
