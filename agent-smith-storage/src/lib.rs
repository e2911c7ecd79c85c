//! Session storage layer for Agent Smith
//!
//! This crate keeps each project being assembled inside a time-scoped
//! session and exposes the merge operations the orchestration layer uses
//! to grow it. Nothing is persisted beyond the lifetime of the process.

pub mod error;
pub mod manager;
pub mod repositories;
pub mod services;
pub mod session;

pub use error::{Error, Result};
pub use manager::StorageManager;
pub use repositories::SessionStore;
pub use services::ConfigMerger;
pub use session::{Session, SessionInfo};

/// Re-export core types for convenience
pub use agent_smith_core as core;
