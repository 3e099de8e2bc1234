//! Cribl Search client modules
//!
//! The client is split into focused components: credential resolution,
//! token exchange and caching, the raw HTTP endpoint layer, and the
//! job orchestration facade.

pub mod api;
pub mod auth;
pub mod blocking;
pub mod config;
pub mod error;
pub mod service;

#[cfg(test)]
mod tests;

// Re-export main types for convenience
pub use blocking::BlockingClient;
pub use config::{QueryOptions, SearchConfig};
pub use error::ClientError;
pub use service::CriblSearch;

pub type Result<T> = std::result::Result<T, ClientError>;
