//! Webhook intake and delivery event correlation
//!
//! Providers post delivery notifications here. The adapter for the slug
//! authenticates the payload and normalizes it into canonical events, which
//! are then correlated back to persisted emails by provider and message id.
//! Events are processed with per-event isolation; one bad event never takes
//! down its siblings.

use std::sync::Arc;

use http::HeaderMap;
use mailroom_entities::{email_events, emails, prelude::*};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::errors::DispatchError;
use crate::providers::registry;
use crate::providers::traits::DeliveryEvent;

/// One event the batch could not apply
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DeliveryEventFailure {
    pub provider_message_id: String,
    pub error: String,
}

/// Summary of one processed webhook payload
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DeliveryEventsOutcome {
    /// `success` when anything was applied (or the payload was empty),
    /// `partial_failure` when every event failed
    #[schema(example = "success")]
    pub status: String,
    pub provider: String,
    pub events_received: usize,
    pub events_processed: usize,
    pub events_failed: usize,
    pub failures: Option<Vec<DeliveryEventFailure>>,
}

pub struct WebhookService {
    db: Arc<DatabaseConnection>,
    /// Settings bag handed to adapters resolved on the webhook path
    provider_settings: Value,
}

impl WebhookService {
    pub fn new(db: Arc<DatabaseConnection>, provider_settings: Value) -> Self {
        Self {
            db,
            provider_settings,
        }
    }

    /// Authenticate, normalize and correlate one webhook payload.
    pub async fn process_delivery_events(
        &self,
        slug: &str,
        body: &[u8],
        headers: &HeaderMap,
    ) -> Result<DeliveryEventsOutcome, DispatchError> {
        let adapter = registry::resolve(slug, self.provider_settings.clone())
            .map_err(|_| DispatchError::ProviderNotFound(slug.to_string()))?;

        if !adapter.verify_webhook(body, headers) {
            warn!("Rejected webhook for {}: signature verification failed", slug);
            return Err(DispatchError::WebhookAuthentication);
        }

        let payload: Value = serde_json::from_slice(body)
            .map_err(|e| DispatchError::InvalidWebhookPayload(e.to_string()))?;

        let events = adapter.parse_webhook(&payload, headers);
        let events_received = events.len();

        let mut events_processed = 0;
        let mut failures = Vec::new();

        for event in &events {
            match self.correlate_event(event).await {
                Ok(Some(_)) => events_processed += 1,
                Ok(None) => {
                    failures.push(DeliveryEventFailure {
                        provider_message_id: event.provider_message_id.clone(),
                        error: format!(
                            "Email not found for provider_message_id: {}",
                            event.provider_message_id
                        ),
                    });
                }
                Err(e) => {
                    warn!(
                        "Failed to apply delivery event for {}: {}",
                        event.provider_message_id, e
                    );
                    failures.push(DeliveryEventFailure {
                        provider_message_id: event.provider_message_id.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }

        let events_failed = failures.len();
        let status = if events_processed > 0 || events_received == 0 {
            "success"
        } else {
            "partial_failure"
        };

        info!(
            "Processed {} webhook: received={}, processed={}, failed={}",
            slug, events_received, events_processed, events_failed
        );

        Ok(DeliveryEventsOutcome {
            status: status.to_string(),
            provider: slug.to_string(),
            events_received,
            events_processed,
            events_failed,
            failures: if failures.is_empty() {
                None
            } else {
                Some(failures)
            },
        })
    }

    /// Attach one event to the email it belongs to.
    ///
    /// `Ok(None)` means no email matched the provider and message id; that is
    /// data for the caller, not an error.
    async fn correlate_event(
        &self,
        event: &DeliveryEvent,
    ) -> Result<Option<email_events::Model>, DispatchError> {
        let email = Emails::find()
            .filter(emails::Column::Provider.eq(event.provider.as_str()))
            .filter(emails::Column::ProviderMessageId.eq(event.provider_message_id.as_str()))
            .one(self.db.as_ref())
            .await?;

        let Some(email) = email else {
            return Ok(None);
        };

        let row = email_events::ActiveModel {
            id: Set(Uuid::new_v4()),
            email_id: Set(email.id),
            event_type: Set(event.event_type.to_string()),
            event_timestamp: Set(event.occurred_at),
            details: Set(event.raw_payload.clone()),
            created_at: Set(chrono::Utc::now()),
        }
        .insert(self.db.as_ref())
        .await?;

        Ok(Some(row))
    }
}
