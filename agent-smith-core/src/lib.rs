//! Core domain models for Agent Smith
//!
//! This crate holds the project model assembled by an orchestration layer
//! (agents, tools, build context), the identifier rules shared by the
//! validator and the code renderer, the validator itself, and the settings
//! and logging bootstrap used by the other workspace crates.

pub mod agent;
pub mod config;
pub mod error;
pub mod naming;
pub mod project;
pub mod telemetry;
pub mod tool;
pub mod validation;

pub use error::{Error, Result};
