//! Service layer for business logic

pub mod config_merger;

pub use config_merger::ConfigMerger;
