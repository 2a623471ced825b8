//! Provider abstraction and the canonical send/event model
//!
//! Every integrated email provider implements [`EmailProvider`] against the
//! same canonical request and event types. Orchestration, persistence and
//! webhook correlation only ever see these types; provider wire formats stay
//! inside the individual adapter modules.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use http::HeaderMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::errors::DispatchError;

/// A file attached to an outgoing email
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Attachment {
    #[schema(example = "invoice.pdf")]
    pub filename: String,
    /// Base64-encoded file content
    pub content_bytes_b64: String,
    #[serde(default = "default_mime_type")]
    #[schema(example = "application/octet-stream")]
    pub mime_type: String,
}

fn default_mime_type() -> String {
    "application/octet-stream".to_string()
}

/// Recipient lists for a single message
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Personalization {
    #[schema(example = json!(["user@example.com"]))]
    pub to: Vec<String>,
    #[serde(default)]
    pub cc: Vec<String>,
    #[serde(default)]
    pub bcc: Vec<String>,
}

/// Canonical send request passed to every provider adapter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendEmailRequest {
    /// Owning project for tenant-routed sends; `None` uses the default provider
    pub project_id: Option<Uuid>,
    pub from_email: String,
    pub subject: String,
    pub html: Option<String>,
    pub text: Option<String>,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    pub personalization: Personalization,
    pub template_id: Option<String>,
    #[serde(default)]
    pub template_variables: HashMap<String, Value>,
    #[serde(default)]
    pub custom_headers: HashMap<String, String>,
    pub priority: Option<i32>,
    pub idempotency_key: Option<String>,
}

/// Outcome of a single provider send attempt.
///
/// `ok == false` means the provider accepted the request but rejected the
/// message (invalid recipient, suppressed address, quota). Transport-level
/// failures never produce a result; they surface as errors from
/// [`EmailProvider::send`].
#[derive(Debug, Clone)]
pub struct SendEmailResult {
    pub ok: bool,
    pub provider_message_id: Option<String>,
    pub error_code: Option<String>,
    pub error_message: Option<String>,
    /// Raw provider response for diagnostics
    pub provider_meta: Value,
}

/// Normalized delivery event vocabulary.
///
/// Adapters map provider-specific event names into this closed set; anything
/// they cannot map degrades to `Unknown` instead of failing the webhook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryEventType {
    Sent,
    Delivered,
    Opened,
    Clicked,
    Bounced,
    Complained,
    Dropped,
    Deferred,
    Spam,
    Unsubscribed,
    Failed,
    Unknown,
}

impl DeliveryEventType {
    /// Total parse over arbitrary provider strings
    pub fn parse(value: &str) -> Self {
        match value.to_lowercase().as_str() {
            "sent" => Self::Sent,
            "delivered" => Self::Delivered,
            "opened" => Self::Opened,
            "clicked" => Self::Clicked,
            "bounced" => Self::Bounced,
            "complained" => Self::Complained,
            "dropped" => Self::Dropped,
            "deferred" => Self::Deferred,
            "spam" => Self::Spam,
            "unsubscribed" => Self::Unsubscribed,
            "failed" => Self::Failed,
            _ => Self::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sent => "sent",
            Self::Delivered => "delivered",
            Self::Opened => "opened",
            Self::Clicked => "clicked",
            Self::Bounced => "bounced",
            Self::Complained => "complained",
            Self::Dropped => "dropped",
            Self::Deferred => "deferred",
            Self::Spam => "spam",
            Self::Unsubscribed => "unsubscribed",
            Self::Failed => "failed",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for DeliveryEventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A delivery event normalized out of a provider webhook
#[derive(Debug, Clone)]
pub struct DeliveryEvent {
    /// Tenant routing id; adapters leave this unset and correlation fills it
    pub project_id: Option<Uuid>,
    pub provider: String,
    pub provider_message_id: String,
    pub event_type: DeliveryEventType,
    pub occurred_at: DateTime<Utc>,
    pub raw_payload: Value,
}

/// Static metadata describing a registry entry
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProviderMetadata {
    /// Stable slug used in routes and persisted email rows
    #[schema(example = "postmark")]
    pub id: String,
    #[schema(example = "Postmark")]
    pub name: String,
    pub enabled: bool,
    pub default: bool,
    #[schema(example = "https://postmarkapp.com")]
    pub site: Option<String>,
}

/// Strategy interface implemented once per integrated email provider
#[async_trait]
pub trait EmailProvider: Send + Sync {
    /// Issue exactly one outbound call to the provider's send endpoint.
    ///
    /// Provider-reported rejections come back as `ok == false` results;
    /// only transport-level failures return an error.
    async fn send(&self, request: &SendEmailRequest) -> Result<SendEmailResult, DispatchError>;

    /// Normalize a webhook payload into zero or more delivery events.
    ///
    /// Malformed or unrecognized fields degrade individual events rather
    /// than failing the whole payload.
    fn parse_webhook(&self, payload: &Value, headers: &HeaderMap) -> Vec<DeliveryEvent>;

    /// Authenticate the webhook sender against the raw body bytes.
    fn verify_webhook(&self, body: &[u8], headers: &HeaderMap) -> bool;
}
