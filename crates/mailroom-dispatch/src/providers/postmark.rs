//! Postmark provider adapter
//!
//! Talks to the Postmark transactional API. Postmark reports request-level
//! failures inside the response body (`ErrorCode`), so the HTTP status alone
//! never decides the outcome of a send.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use http::HeaderMap;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use sha2::Sha256;
use tracing::{debug, error};

use super::traits::{
    DeliveryEvent, DeliveryEventType, EmailProvider, SendEmailRequest, SendEmailResult,
};
use crate::errors::DispatchError;

type HmacSha256 = Hmac<Sha256>;

const SIGNATURE_HEADER: &str = "X-Postmark-Webhook-Signature";

pub struct PostmarkProvider {
    client: Client,
    settings: Value,
}

#[derive(Debug, Serialize)]
struct PostmarkSendRequest {
    #[serde(rename = "From")]
    from: String,
    #[serde(rename = "To")]
    to: String,
    #[serde(rename = "Subject")]
    subject: String,
    #[serde(rename = "HtmlBody", skip_serializing_if = "Option::is_none")]
    html_body: Option<String>,
    #[serde(rename = "TextBody", skip_serializing_if = "Option::is_none")]
    text_body: Option<String>,
}

impl PostmarkProvider {
    const BASE_URL: &'static str = "https://api.postmarkapp.com";

    pub const SLUG: &'static str = "postmark";

    pub fn new(settings: Value) -> Self {
        Self {
            client: Client::new(),
            settings,
        }
    }

    fn server_token(&self) -> &str {
        self.settings
            .get("server_token")
            .and_then(Value::as_str)
            .unwrap_or_default()
    }

    fn webhook_secret(&self) -> Option<&str> {
        self.settings
            .get("webhook_secret")
            .and_then(Value::as_str)
            .filter(|secret| !secret.is_empty())
    }
}

#[async_trait]
impl EmailProvider for PostmarkProvider {
    async fn send(&self, request: &SendEmailRequest) -> Result<SendEmailResult, DispatchError> {
        debug!(
            "Sending email via Postmark from {} with subject '{}'",
            request.from_email, request.subject
        );

        // Postmark takes a single To address per message
        let to = request
            .personalization
            .to
            .first()
            .cloned()
            .unwrap_or_default();

        let wire_request = PostmarkSendRequest {
            from: request.from_email.clone(),
            to,
            subject: request.subject.clone(),
            html_body: request.html.clone(),
            text_body: request.text.clone(),
        };

        let response = self
            .client
            .post(format!("{}/email", Self::BASE_URL))
            .header("Accept", "application/json")
            .header("X-Postmark-Server-Token", self.server_token())
            .json(&wire_request)
            .send()
            .await
            .map_err(|e| {
                error!("Postmark request failed: {}", e);
                e
            })?;

        let body: Value = response.json().await.map_err(|e| {
            error!("Failed to parse Postmark response: {}", e);
            e
        })?;

        let error_code = body.get("ErrorCode").and_then(Value::as_i64).unwrap_or(-1);
        if error_code == 0 {
            let message_id = body
                .get("MessageID")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            debug!("Postmark accepted message, id: {}", message_id);
            Ok(SendEmailResult {
                ok: true,
                provider_message_id: Some(message_id),
                error_code: None,
                error_message: None,
                provider_meta: body,
            })
        } else {
            let message = body
                .get("Message")
                .and_then(Value::as_str)
                .unwrap_or("Unknown Postmark error")
                .to_string();
            debug!("Postmark rejected message: {} ({})", message, error_code);
            Ok(SendEmailResult {
                ok: false,
                provider_message_id: None,
                error_code: Some(error_code.to_string()),
                error_message: Some(message),
                provider_meta: body,
            })
        }
    }

    fn parse_webhook(&self, payload: &Value, _headers: &HeaderMap) -> Vec<DeliveryEvent> {
        let record_type = payload
            .get("RecordType")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_lowercase();

        // Postmark is inconsistent about the casing of the message id field
        let message_id = payload
            .get("MessageID")
            .or_else(|| payload.get("MessageId"))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        let occurred_at = ["ReceivedAt", "DeliveredAt", "BouncedAt", "Timestamp"]
            .iter()
            .find_map(|key| payload.get(*key).and_then(Value::as_str))
            .and_then(parse_event_timestamp)
            .unwrap_or_else(Utc::now);

        let secondary = payload.get("Type").and_then(Value::as_str);
        let event_type = map_record_type(&record_type, secondary);

        vec![DeliveryEvent {
            project_id: None,
            provider: Self::SLUG.to_string(),
            provider_message_id: message_id,
            event_type,
            occurred_at,
            raw_payload: payload.clone(),
        }]
    }

    fn verify_webhook(&self, body: &[u8], headers: &HeaderMap) -> bool {
        // Without a configured secret there is nothing to check against
        let Some(secret) = self.webhook_secret() else {
            return true;
        };

        let Some(signature) = headers
            .get(SIGNATURE_HEADER)
            .and_then(|value| value.to_str().ok())
        else {
            return false;
        };

        let mut mac =
            HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size");
        mac.update(body);
        let expected = hex::encode(mac.finalize().into_bytes());

        signature.eq_ignore_ascii_case(&expected)
    }
}

/// Map Postmark's `RecordType` onto the normalized vocabulary.
///
/// The payload-level `Type` field is only consulted when `RecordType` is
/// absent, which some older webhook configurations still produce.
fn map_record_type(record_type: &str, secondary: Option<&str>) -> DeliveryEventType {
    match record_type {
        "delivery" => DeliveryEventType::Delivered,
        "open" => DeliveryEventType::Opened,
        "click" => DeliveryEventType::Clicked,
        "bounce" => DeliveryEventType::Bounced,
        "spamcomplaint" => DeliveryEventType::Complained,
        "subscriptionchange" => DeliveryEventType::Unsubscribed,
        "" => secondary
            .map(DeliveryEventType::parse)
            .unwrap_or(DeliveryEventType::Unknown),
        other => DeliveryEventType::parse(other),
    }
}

fn parse_event_timestamp(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|parsed| parsed.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use http::HeaderValue;
    use serde_json::json;

    fn provider_with(settings: Value) -> PostmarkProvider {
        PostmarkProvider::new(settings)
    }

    fn sign(secret: &str, body: &[u8]) -> String {
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(body);
        hex::encode(mac.finalize().into_bytes())
    }

    #[test]
    fn test_wire_request_uses_postmark_field_names() {
        let wire_request = PostmarkSendRequest {
            from: "sender@example.com".to_string(),
            to: "user@example.com".to_string(),
            subject: "Hello".to_string(),
            html_body: Some("<p>Hi</p>".to_string()),
            text_body: None,
        };
        let value = serde_json::to_value(&wire_request).unwrap();

        assert_eq!(value["From"], "sender@example.com");
        assert_eq!(value["To"], "user@example.com");
        assert_eq!(value["Subject"], "Hello");
        assert_eq!(value["HtmlBody"], "<p>Hi</p>");
        // Absent bodies are omitted, not serialized as null
        assert!(value.get("TextBody").is_none());
    }

    #[test]
    fn test_record_type_mapping() {
        assert_eq!(map_record_type("delivery", None), DeliveryEventType::Delivered);
        assert_eq!(map_record_type("open", None), DeliveryEventType::Opened);
        assert_eq!(map_record_type("click", None), DeliveryEventType::Clicked);
        assert_eq!(map_record_type("bounce", None), DeliveryEventType::Bounced);
        assert_eq!(map_record_type("spamcomplaint", None), DeliveryEventType::Complained);
        assert_eq!(
            map_record_type("subscriptionchange", None),
            DeliveryEventType::Unsubscribed
        );
    }

    #[test]
    fn test_record_type_falls_back_to_secondary_type() {
        assert_eq!(map_record_type("", Some("delivered")), DeliveryEventType::Delivered);
        assert_eq!(map_record_type("", None), DeliveryEventType::Unknown);
        assert_eq!(map_record_type("somethingnew", None), DeliveryEventType::Unknown);
    }

    #[test]
    fn test_parse_webhook_delivery_event() {
        let provider = provider_with(json!({}));
        let payload = json!({
            "RecordType": "Delivery",
            "MessageID": "pm-123",
            "DeliveredAt": "2026-01-10T12:30:00Z",
            "Recipient": "user@example.com"
        });

        let events = provider.parse_webhook(&payload, &HeaderMap::new());
        assert_eq!(events.len(), 1);

        let event = &events[0];
        assert_eq!(event.provider, "postmark");
        assert_eq!(event.provider_message_id, "pm-123");
        assert_eq!(event.event_type, DeliveryEventType::Delivered);
        assert_eq!(
            event.occurred_at,
            Utc.with_ymd_and_hms(2026, 1, 10, 12, 30, 0).unwrap()
        );
        assert_eq!(event.raw_payload, payload);
        assert!(event.project_id.is_none());
    }

    #[test]
    fn test_parse_webhook_message_id_casing_fallback() {
        let provider = provider_with(json!({}));
        let payload = json!({ "RecordType": "Open", "MessageId": "pm-456" });

        let events = provider.parse_webhook(&payload, &HeaderMap::new());
        assert_eq!(events[0].provider_message_id, "pm-456");
        assert_eq!(events[0].event_type, DeliveryEventType::Opened);
    }

    #[test]
    fn test_parse_webhook_timestamp_priority() {
        let provider = provider_with(json!({}));
        let payload = json!({
            "RecordType": "Bounce",
            "MessageID": "pm-789",
            "ReceivedAt": "2026-01-10T08:00:00Z",
            "BouncedAt": "2026-01-10T09:00:00Z"
        });

        let events = provider.parse_webhook(&payload, &HeaderMap::new());
        assert_eq!(
            events[0].occurred_at,
            Utc.with_ymd_and_hms(2026, 1, 10, 8, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_parse_webhook_unparseable_timestamp_degrades_to_now() {
        let provider = provider_with(json!({}));
        let payload = json!({
            "RecordType": "Delivery",
            "MessageID": "pm-1",
            "DeliveredAt": "not a timestamp"
        });

        let before = Utc::now();
        let events = provider.parse_webhook(&payload, &HeaderMap::new());
        assert!(events[0].occurred_at >= before);
    }

    #[test]
    fn test_parse_webhook_missing_fields_degrades_to_unknown() {
        let provider = provider_with(json!({}));
        let events = provider.parse_webhook(&json!({}), &HeaderMap::new());

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type, DeliveryEventType::Unknown);
        assert_eq!(events[0].provider_message_id, "");
    }

    #[test]
    fn test_verify_webhook_without_secret_accepts() {
        let provider = provider_with(json!({}));
        assert!(provider.verify_webhook(b"{}", &HeaderMap::new()));
    }

    #[test]
    fn test_verify_webhook_valid_signature() {
        let provider = provider_with(json!({ "webhook_secret": "s3cret" }));
        let body = br#"{"RecordType":"Delivery"}"#;

        let mut headers = HeaderMap::new();
        headers.insert(
            SIGNATURE_HEADER,
            HeaderValue::from_str(&sign("s3cret", body)).unwrap(),
        );

        assert!(provider.verify_webhook(body, &headers));
    }

    #[test]
    fn test_verify_webhook_rejects_bad_signature() {
        let provider = provider_with(json!({ "webhook_secret": "s3cret" }));
        let body = br#"{"RecordType":"Delivery"}"#;

        let mut headers = HeaderMap::new();
        headers.insert(
            SIGNATURE_HEADER,
            HeaderValue::from_str(&sign("wrong-secret", body)).unwrap(),
        );

        assert!(!provider.verify_webhook(body, &headers));
    }

    #[test]
    fn test_verify_webhook_rejects_missing_header() {
        let provider = provider_with(json!({ "webhook_secret": "s3cret" }));
        assert!(!provider.verify_webhook(b"{}", &HeaderMap::new()));
    }
}
