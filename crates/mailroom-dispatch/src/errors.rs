//! Error types for email dispatch operations

use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Provider request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unsupported provider: {0}")]
    UnsupportedProvider(String),

    #[error("No default provider is configured")]
    NoDefaultProvider,

    #[error("Provider not found: {0}")]
    ProviderNotFound(String),

    #[error("Tenant not found: {0}")]
    TenantNotFound(Uuid),

    #[error("Tenant name already in use: {0}")]
    DuplicateTenantName(String),

    #[error("Email not found: {0}")]
    EmailNotFound(String),

    #[error("Webhook signature verification failed")]
    WebhookAuthentication,

    #[error("Invalid webhook payload: {0}")]
    InvalidWebhookPayload(String),

    #[error("Template rendering failed: {reason}; supplied variables: [{supplied_keys}]")]
    TemplateRender {
        reason: String,
        supplied_keys: String,
    },

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Settings decryption failed: {0}")]
    Decryption(String),
}

impl From<mailroom_core::VaultError> for DispatchError {
    fn from(err: mailroom_core::VaultError) -> Self {
        DispatchError::Decryption(err.to_string())
    }
}
