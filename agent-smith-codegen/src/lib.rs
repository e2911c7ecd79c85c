//! Code generation for Agent Smith
//!
//! This crate validates assembled projects and renders them into a Python
//! package for the Google Agent Development Kit: one module per agent, one
//! per generated tool, and an `agent.py` exposing `root_agent`.

pub mod error;
pub mod generator;
pub mod helpers;
pub mod renderer;
pub mod service;
pub mod templates;

pub use error::{Error, Result};
pub use generator::{CodeGenerator, GenerationReport};
pub use renderer::{CodeRenderer, FileSet};
pub use service::GenerationService;

/// Re-export core types for convenience
pub use agent_smith_core as core;
pub use agent_smith_storage as storage;
