//! Request/response types for the HTTP API

use std::collections::HashMap;
use std::sync::Arc;

use mailroom_entities::{emails, tenants};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::{IntoParams, ToSchema};

use crate::providers::traits::{Attachment, Personalization};
use crate::services::{EmailService, EmailStatistics, TenantService, WebhookService};

/// Shared state for all API handlers
pub struct AppState {
    pub email_service: Arc<EmailService>,
    pub tenant_service: Arc<TenantService>,
    pub webhook_service: Arc<WebhookService>,
}

impl AppState {
    pub fn new(
        email_service: Arc<EmailService>,
        tenant_service: Arc<TenantService>,
        webhook_service: Arc<WebhookService>,
    ) -> Self {
        Self {
            email_service,
            tenant_service,
            webhook_service,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SendEmailRequestBody {
    /// Owning project; omitted sends go through the default provider
    #[schema(example = "550e8400-e29b-41d4-a716-446655440000")]
    pub project_id: Option<String>,
    #[schema(example = "hello@updates.example.com")]
    pub from_email: String,
    #[schema(example = "Welcome aboard")]
    pub subject: String,
    /// HTML body template
    #[schema(example = "<h1>Hello {{name}}</h1>")]
    pub html: Option<String>,
    /// Plain text body template
    pub text: Option<String>,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    pub personalization: Personalization,
    pub template_id: Option<String>,
    /// Variables substituted into the html and text templates
    #[serde(default)]
    pub template_variables: HashMap<String, Value>,
    #[serde(default)]
    pub custom_headers: HashMap<String, String>,
    pub priority: Option<i32>,
    pub idempotency_key: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct EmailResponse {
    pub id: String,
    pub from_email: String,
    pub to_email: String,
    pub subject: String,
    pub body: String,
    #[schema(example = "sent")]
    pub status: String,
    pub sent_at: Option<String>,
    pub provider: String,
    pub provider_message_id: Option<String>,
    pub project_id: Option<String>,
    pub error_message: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<emails::Model> for EmailResponse {
    fn from(email: emails::Model) -> Self {
        Self {
            id: email.id.to_string(),
            from_email: email.from_email,
            to_email: email.to_email,
            subject: email.subject,
            body: email.body,
            status: email.status,
            sent_at: email.sent_at.map(|at| at.to_rfc3339()),
            provider: email.provider,
            provider_message_id: email.provider_message_id,
            project_id: email.project_id.map(|id| id.to_string()),
            error_message: email.error_message,
            created_at: email.created_at.to_rfc3339(),
            updated_at: email.updated_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaginatedEmailsResponse {
    pub data: Vec<EmailResponse>,
    pub total: u64,
    pub page: u64,
    pub page_size: u64,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct ListEmailsQuery {
    /// Restrict to one project's emails
    pub project_id: Option<String>,
    /// Restrict to one status (queued, sent, failed)
    pub status: Option<String>,
    pub page: Option<u64>,
    pub page_size: Option<u64>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct EmailStatsQuery {
    pub project_id: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct EmailStatsResponse {
    pub total: u64,
    pub sent: u64,
    pub failed: u64,
    pub queued: u64,
}

impl From<EmailStatistics> for EmailStatsResponse {
    fn from(stats: EmailStatistics) -> Self {
        Self {
            total: stats.total,
            sent: stats.sent,
            failed: stats.failed,
            queued: stats.queued,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateTenantRequestBody {
    #[schema(example = "acme")]
    pub name: String,
    /// Registered provider slug this tenant routes through
    #[schema(example = "postmark")]
    pub provider: String,
    /// Provider settings, stored encrypted and never echoed back
    #[schema(example = json!({ "server_token": "pm-server-token" }))]
    pub settings: Option<Value>,
}

/// Omitted fields are left unchanged. Pass an empty settings object to
/// clear the stored settings.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateTenantRequestBody {
    pub name: Option<String>,
    pub provider: Option<String>,
    pub settings: Option<Value>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TenantResponse {
    pub id: String,
    pub name: String,
    pub provider: String,
    /// Whether encrypted provider settings are stored for this tenant
    pub settings_configured: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<tenants::Model> for TenantResponse {
    fn from(tenant: tenants::Model) -> Self {
        Self {
            id: tenant.id.to_string(),
            name: tenant.name,
            provider: tenant.provider,
            settings_configured: tenant.settings.is_some(),
            created_at: tenant.created_at.to_rfc3339(),
            updated_at: tenant.updated_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaginatedTenantsResponse {
    pub data: Vec<TenantResponse>,
    pub total: u64,
    pub page: u64,
    pub page_size: u64,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct ListTenantsQuery {
    pub page: Option<u64>,
    pub page_size: Option<u64>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct ListProvidersQuery {
    /// Only include adapters that are enabled for use
    pub enabled_only: Option<bool>,
}
