//! Python identifier derivation for rendered modules and symbols
//!
//! Agent and tool names are free-form labels. Everything the generator
//! emits into source files goes through these functions so that the
//! validator and the renderer agree on the identifiers in use.

const PYTHON_KEYWORDS: &[&str] = &[
    "False", "None", "True", "and", "as", "assert", "async", "await", "break", "class",
    "continue", "def", "del", "elif", "else", "except", "finally", "for", "from", "global",
    "if", "import", "in", "is", "lambda", "nonlocal", "not", "or", "pass", "raise", "return",
    "try", "while", "with", "yield",
];

/// Convert a free-form name into a snake_case Python module name.
///
/// `"BankingAgent"` becomes `banking_agent`, `"web search"` becomes
/// `web_search`. Names without any ASCII alphanumerics map to `unnamed`.
pub fn module_name(name: &str) -> String {
    let mut ident = String::with_capacity(name.len() + 4);
    let mut prev: Option<char> = None;

    for c in name.trim().chars() {
        if c.is_ascii_alphanumeric() {
            let boundary = c.is_ascii_uppercase()
                && prev.is_some_and(|p| p.is_ascii_lowercase() || p.is_ascii_digit());
            if boundary && !ident.ends_with('_') {
                ident.push('_');
            }
            ident.push(c.to_ascii_lowercase());
        } else if !ident.ends_with('_') {
            ident.push('_');
        }
        prev = Some(c);
    }

    let mut ident = ident.trim_matches('_').to_string();
    if ident.is_empty() {
        return "unnamed".to_string();
    }
    if ident.starts_with(|c: char| c.is_ascii_digit()) {
        ident.insert(0, '_');
    }
    if is_keyword(&ident) {
        ident.push('_');
    }
    ident
}

/// Variable name bound to an agent instance in its module
pub fn agent_variable(name: &str) -> String {
    let module = module_name(name);
    if module == "agent" || module.ends_with("_agent") {
        module
    } else {
        format!("{}_agent", module)
    }
}

/// Function name of a generated tool
pub fn tool_function(name: &str) -> String {
    module_name(name)
}

/// Whether `value` can be used verbatim as a Python identifier
pub fn is_identifier(value: &str) -> bool {
    let mut chars = value.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    (first.is_ascii_alphabetic() || first == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !is_keyword(value)
}

fn is_keyword(value: &str) -> bool {
    PYTHON_KEYWORDS.contains(&value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_name_conversion() {
        assert_eq!(module_name("root"), "root");
        assert_eq!(module_name("BankingAgent"), "banking_agent");
        assert_eq!(module_name("web search"), "web_search");
        assert_eq!(module_name("  help-desk API "), "help_desk_api");
        assert_eq!(module_name("agent2Go"), "agent2_go");
        assert_eq!(module_name("--"), "unnamed");
        assert_eq!(module_name("3d_render"), "_3d_render");
        assert_eq!(module_name("class"), "class_");
    }

    #[test]
    fn test_agent_variable() {
        assert_eq!(agent_variable("helper"), "helper_agent");
        assert_eq!(agent_variable("BankingAgent"), "banking_agent");
        assert_eq!(agent_variable("agent"), "agent");
    }

    #[test]
    fn test_is_identifier() {
        assert!(is_identifier("query"));
        assert!(is_identifier("_private"));
        assert!(is_identifier("customer_id2"));
        assert!(!is_identifier(""));
        assert!(!is_identifier("2fast"));
        assert!(!is_identifier("with space"));
        assert!(!is_identifier("lambda"));
    }
}
