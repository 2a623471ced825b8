//! Core utilities and types shared across all Mailroom crates

pub mod error_builder;
pub mod problemdetails;
pub mod types;
pub mod vault;

pub use problemdetails::ProblemDetails;

// Re-export commonly used types
pub use error_builder::*;
pub use types::DBDateTime;
pub use vault::{SecretsVault, VaultError, CIPHERTEXT_MARKER};

// Re-export external dependencies
pub use anyhow;
pub use async_trait;
pub use chrono;
pub use serde;
pub use serde_json;
pub use thiserror;
pub use tokio;
pub use tracing;
pub use uuid;
