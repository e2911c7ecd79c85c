//! Error types for the core domain

use thiserror::Error;

/// Core error type for project model operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("Agent not found: {name}")]
    AgentNotFound { name: String },

    #[error("Tool not found: {name}")]
    ToolNotFound { name: String },

    #[error("Duplicate {kind} name: {name}")]
    DuplicateName { kind: String, name: String },

    #[error("Agent limit exceeded: a project holds at most {limit} agents")]
    AgentLimitExceeded { limit: usize },

    #[error("Tool limit exceeded: a project holds at most {limit} tools")]
    ToolLimitExceeded { limit: usize },

    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

impl From<config::ConfigError> for Error {
    fn from(err: config::ConfigError) -> Self {
        Error::Configuration {
            message: err.to_string(),
        }
    }
}

impl Error {
    /// Create an invalid input error with a formatted message
    pub fn invalid_input<S: Into<String>>(message: S) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Create a duplicate name error for a collection kind ("agent", "tool")
    pub fn duplicate_name<S1: Into<String>, S2: Into<String>>(kind: S1, name: S2) -> Self {
        Self::DuplicateName {
            kind: kind.into(),
            name: name.into(),
        }
    }

    /// Create a configuration error
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Check if this error is a not found error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::AgentNotFound { .. } | Error::ToolNotFound { .. })
    }

    /// Check if this error is a capacity error
    pub fn is_limit_exceeded(&self) -> bool {
        matches!(
            self,
            Error::AgentLimitExceeded { .. } | Error::ToolLimitExceeded { .. }
        )
    }

    /// Get the error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            Error::InvalidInput { .. } => "invalid_input",
            Error::AgentNotFound { .. } => "agent_not_found",
            Error::ToolNotFound { .. } => "tool_not_found",
            Error::DuplicateName { .. } => "duplicate_name",
            Error::AgentLimitExceeded { .. } => "agent_limit_exceeded",
            Error::ToolLimitExceeded { .. } => "tool_limit_exceeded",
            Error::Configuration { .. } => "configuration",
        }
    }
}

/// Convenience result type for core operations
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = Error::invalid_input("Agent name cannot be empty");
        assert!(!err.is_not_found());
        assert_eq!(err.category(), "invalid_input");

        let err = Error::AgentNotFound {
            name: "helper".to_string(),
        };
        assert!(err.is_not_found());
        assert_eq!(err.category(), "agent_not_found");

        let err = Error::ToolLimitExceeded { limit: 20 };
        assert!(err.is_limit_exceeded());
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_error_display() {
        let err = Error::duplicate_name("agent", "root");
        let display_str = format!("{}", err);
        assert!(display_str.contains("Duplicate agent name"));
        assert!(display_str.contains("root"));

        let err = Error::AgentLimitExceeded { limit: 10 };
        assert!(err.to_string().contains("10"));
    }

    #[test]
    fn test_config_error_conversion() {
        let err: Error = config::ConfigError::Message("bad value".to_string()).into();
        assert_eq!(err.category(), "configuration");
        assert!(err.to_string().contains("bad value"));
    }
}
