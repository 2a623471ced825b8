//! Mock provider adapter
//!
//! A fully scriptable adapter used in development environments and tests.
//! Behavior is driven by the same settings bag every other adapter receives:
//!
//! - `"ok": false` makes sends come back as provider rejections
//! - `"send_error": true` makes sends fail at the transport level
//! - `"provider_message_id"` fixes the message id assigned on success
//! - `"error_code"` / `"error_message"` shape the rejection details
//! - `"verify": false` makes webhook verification fail
//!
//! Webhook payloads use a plain `{"events": [...]}` envelope where each entry
//! carries `provider_message_id`, `type` and an optional RFC 3339 `timestamp`.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use http::HeaderMap;
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use super::traits::{
    DeliveryEvent, DeliveryEventType, EmailProvider, SendEmailRequest, SendEmailResult,
};
use crate::errors::DispatchError;

pub struct MockProvider {
    settings: Value,
    send_count: Arc<AtomicUsize>,
}

impl MockProvider {
    pub const SLUG: &'static str = "mock";

    pub fn new(settings: Value) -> Self {
        Self {
            settings,
            send_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn send_call_count(&self) -> usize {
        self.send_count.load(Ordering::SeqCst)
    }

    fn flag(&self, key: &str, default: bool) -> bool {
        self.settings.get(key).and_then(Value::as_bool).unwrap_or(default)
    }

    fn text(&self, key: &str) -> Option<String> {
        self.settings
            .get(key)
            .and_then(Value::as_str)
            .map(str::to_string)
    }
}

#[async_trait]
impl EmailProvider for MockProvider {
    async fn send(&self, request: &SendEmailRequest) -> Result<SendEmailResult, DispatchError> {
        self.send_count.fetch_add(1, Ordering::SeqCst);
        debug!("Mock send from {} to {:?}", request.from_email, request.personalization.to);

        if self.flag("send_error", false) {
            return Err(DispatchError::Provider(
                "Mock transport failure".to_string(),
            ));
        }

        if !self.flag("ok", true) {
            return Ok(SendEmailResult {
                ok: false,
                provider_message_id: None,
                error_code: Some(self.text("error_code").unwrap_or_else(|| "mock_error".to_string())),
                error_message: Some(
                    self.text("error_message")
                        .unwrap_or_else(|| "Mock send rejected".to_string()),
                ),
                provider_meta: serde_json::json!({ "mock": true }),
            });
        }

        let message_id = self
            .text("provider_message_id")
            .unwrap_or_else(|| format!("mock-{}", Uuid::new_v4()));

        Ok(SendEmailResult {
            ok: true,
            provider_message_id: Some(message_id),
            error_code: None,
            error_message: None,
            provider_meta: serde_json::json!({ "mock": true }),
        })
    }

    fn parse_webhook(&self, payload: &Value, _headers: &HeaderMap) -> Vec<DeliveryEvent> {
        let Some(entries) = payload.get("events").and_then(Value::as_array) else {
            return Vec::new();
        };

        entries
            .iter()
            .map(|entry| DeliveryEvent {
                project_id: None,
                provider: Self::SLUG.to_string(),
                provider_message_id: entry
                    .get("provider_message_id")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
                event_type: entry
                    .get("type")
                    .and_then(Value::as_str)
                    .map(DeliveryEventType::parse)
                    .unwrap_or(DeliveryEventType::Unknown),
                occurred_at: entry
                    .get("timestamp")
                    .and_then(Value::as_str)
                    .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
                    .map(|parsed| parsed.with_timezone(&Utc))
                    .unwrap_or_else(Utc::now),
                raw_payload: entry.clone(),
            })
            .collect()
    }

    fn verify_webhook(&self, _body: &[u8], _headers: &HeaderMap) -> bool {
        self.flag("verify", true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;

    use super::super::traits::Personalization;

    fn request() -> SendEmailRequest {
        SendEmailRequest {
            project_id: None,
            from_email: "sender@example.com".to_string(),
            subject: "Test".to_string(),
            html: Some("<p>Hi</p>".to_string()),
            text: None,
            attachments: Vec::new(),
            personalization: Personalization {
                to: vec!["user@example.com".to_string()],
                cc: Vec::new(),
                bcc: Vec::new(),
            },
            template_id: None,
            template_variables: HashMap::new(),
            custom_headers: HashMap::new(),
            priority: None,
            idempotency_key: None,
        }
    }

    #[tokio::test]
    async fn test_send_success_with_fixed_message_id() {
        let provider = MockProvider::new(json!({ "provider_message_id": "MID-1" }));

        let result = provider.send(&request()).await.unwrap();
        assert!(result.ok);
        assert_eq!(result.provider_message_id.as_deref(), Some("MID-1"));
        assert_eq!(provider.send_call_count(), 1);
    }

    #[tokio::test]
    async fn test_send_rejection_carries_error_details() {
        let provider = MockProvider::new(json!({
            "ok": false,
            "error_code": "E1",
            "error_message": "boom"
        }));

        let result = provider.send(&request()).await.unwrap();
        assert!(!result.ok);
        assert_eq!(result.error_code.as_deref(), Some("E1"));
        assert_eq!(result.error_message.as_deref(), Some("boom"));
        assert!(result.provider_message_id.is_none());
    }

    #[tokio::test]
    async fn test_send_transport_error() {
        let provider = MockProvider::new(json!({ "send_error": true }));

        let result = provider.send(&request()).await;
        assert!(matches!(result, Err(DispatchError::Provider(_))));
        assert_eq!(provider.send_call_count(), 1);
    }

    #[test]
    fn test_parse_webhook_event_envelope() {
        let provider = MockProvider::new(json!({}));
        let payload = json!({
            "events": [
                { "provider_message_id": "MID-1", "type": "delivered" },
                { "provider_message_id": "MID-2", "type": "somethingelse" },
                { "provider_message_id": "MID-3" }
            ]
        });

        let events = provider.parse_webhook(&payload, &HeaderMap::new());
        assert_eq!(events.len(), 3);
        assert_eq!(events[0].event_type, DeliveryEventType::Delivered);
        assert_eq!(events[1].event_type, DeliveryEventType::Unknown);
        assert_eq!(events[2].event_type, DeliveryEventType::Unknown);
    }

    #[test]
    fn test_parse_webhook_without_envelope_yields_nothing() {
        let provider = MockProvider::new(json!({}));
        assert!(provider
            .parse_webhook(&json!({ "RecordType": "Delivery" }), &HeaderMap::new())
            .is_empty());
    }

    #[test]
    fn test_verify_webhook_scripted() {
        assert!(MockProvider::new(json!({})).verify_webhook(b"{}", &HeaderMap::new()));
        assert!(!MockProvider::new(json!({ "verify": false }))
            .verify_webhook(b"{}", &HeaderMap::new()));
    }
}
