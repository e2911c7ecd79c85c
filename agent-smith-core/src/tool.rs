//! Tool configuration model
//!
//! Tools are either references to framework builtins or functions whose
//! body is produced by the orchestration layer and stored verbatim.

use crate::agent::{merge_references, validate_name};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Kind of tool
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ToolKind {
    /// Binds to a builtin tool shipped with the agent framework
    Builtin,
    /// A function rendered from stored code
    #[default]
    #[serde(alias = "custom_function", alias = "function")]
    Generated,
}

/// One `(name, type hint, default)` parameter of a generated tool
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ToolParameter {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_hint: Option<String>,
    /// Default value as source text, e.g. `"10"` or `"'en'"`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
}

impl ToolParameter {
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            type_hint: None,
            default: None,
        }
    }

    pub fn with_type_hint<S: Into<String>>(mut self, type_hint: S) -> Self {
        self.type_hint = Some(type_hint.into());
        self
    }

    pub fn with_default<S: Into<String>>(mut self, default: S) -> Self {
        self.default = Some(default.into());
        self
    }

    /// Render as a signature fragment: `name: hint = default`
    pub fn signature(&self) -> String {
        let mut fragment = self.name.clone();
        if let Some(ref hint) = self.type_hint {
            fragment.push_str(": ");
            fragment.push_str(hint);
        }
        if let Some(ref default) = self.default {
            fragment.push_str(if self.type_hint.is_some() { " = " } else { "=" });
            fragment.push_str(default);
        }
        fragment
    }
}

/// Configuration of a single callable tool
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct ToolConfig {
    pub name: String,
    pub kind: ToolKind,
    pub description: String,
    pub parameters: Vec<ToolParameter>,
    pub code: String,
    pub imports: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub builtin_type: Option<String>,
}

/// Partial update for an existing tool
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct ToolPatch {
    pub kind: Option<ToolKind>,
    pub description: Option<String>,
    /// Replaces the stored parameter list
    pub parameters: Option<Vec<ToolParameter>>,
    pub code: Option<String>,
    pub imports: Option<Vec<String>>,
    pub builtin_type: Option<String>,
    pub replace_imports: bool,
}

impl ToolConfig {
    /// Create a generated tool with the given body
    pub fn generated<S1: Into<String>, S2: Into<String>>(name: S1, code: S2) -> Self {
        Self {
            name: name.into(),
            kind: ToolKind::Generated,
            code: code.into(),
            ..Self::default()
        }
    }

    /// Create a reference to a framework builtin
    pub fn builtin<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            kind: ToolKind::Builtin,
            ..Self::default()
        }
    }

    pub fn with_description<S: Into<String>>(mut self, description: S) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_parameter(mut self, parameter: ToolParameter) -> Self {
        self.parameters.push(parameter);
        self
    }

    pub fn with_import<S: Into<String>>(mut self, import: S) -> Self {
        self.imports.push(import.into());
        self
    }

    pub fn with_builtin_type<S: Into<String>>(mut self, builtin_type: S) -> Self {
        self.builtin_type = Some(builtin_type.into());
        self
    }

    /// Check field-level invariants
    ///
    /// Code presence and parameter well-formedness are validation findings,
    /// not input errors: tools may be added before their code is written.
    pub fn validate(&self) -> Result<()> {
        validate_name("Tool", &self.name)?;
        validate_imports(&self.imports)?;
        if self.parameters.iter().any(|p| p.name.trim().is_empty()) {
            return Err(Error::invalid_input(format!(
                "Tool '{}' has a parameter without a name",
                self.name
            )));
        }
        Ok(())
    }

    /// Collapse duplicate imports, keeping first occurrences
    pub fn normalize(&mut self) {
        self.imports = crate::agent::dedup(std::mem::take(&mut self.imports));
    }

    pub fn is_generated(&self) -> bool {
        self.kind == ToolKind::Generated
    }

    /// The framework symbol a builtin tool binds to
    pub fn builtin_reference(&self) -> &str {
        self.builtin_type.as_deref().unwrap_or(&self.name)
    }

    /// Apply a patch; the patch is checked before any field is written
    pub fn apply_patch(&mut self, patch: ToolPatch) -> Result<()> {
        patch.validate()?;

        if let Some(kind) = patch.kind {
            self.kind = kind;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(parameters) = patch.parameters {
            self.parameters = parameters;
        }
        if let Some(code) = patch.code {
            self.code = code;
        }
        if let Some(imports) = patch.imports {
            self.imports = merge_references(&self.imports, imports, patch.replace_imports);
        }
        if patch.builtin_type.is_some() {
            self.builtin_type = patch.builtin_type;
        }
        Ok(())
    }
}

impl ToolPatch {
    /// Check the patch without applying it
    pub fn validate(&self) -> Result<()> {
        if let Some(ref imports) = self.imports {
            validate_imports(imports)?;
        }
        if let Some(ref parameters) = self.parameters {
            if parameters.iter().any(|p| p.name.trim().is_empty()) {
                return Err(Error::invalid_input("Tool parameters must be named"));
            }
        }
        if let Some(ref builtin_type) = self.builtin_type {
            if builtin_type.trim().is_empty() {
                return Err(Error::invalid_input("Builtin type cannot be empty"));
            }
        }
        Ok(())
    }
}

fn validate_imports(imports: &[String]) -> Result<()> {
    if imports.iter().any(|i| i.trim().is_empty()) {
        return Err(Error::invalid_input("Tool imports cannot be empty"));
    }
    Ok(())
}
