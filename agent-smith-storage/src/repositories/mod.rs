//! Repository implementations

pub mod session;

pub use session::SessionStore;
