//! Send orchestration and the email query surface
//!
//! A send resolves exactly one provider adapter, renders the body templates,
//! persists a queued row, performs a single provider call and settles the row
//! as sent or failed. There is no queueing or retry behind this service; one
//! request maps to at most one provider call.

use std::sync::Arc;

use chrono::Utc;
use mailroom_entities::{email_events, emails, prelude::*};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use serde_json::{json, Value};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::errors::DispatchError;
use crate::providers::registry;
use crate::providers::traits::{DeliveryEventType, EmailProvider, SendEmailRequest};
use crate::services::tenant_service::TenantService;
use crate::template::render_body;

pub struct ListEmailsOptions {
    pub project_id: Option<Uuid>,
    pub status: Option<String>,
    pub page: Option<u64>,
    pub page_size: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailStatistics {
    pub total: u64,
    pub sent: u64,
    pub failed: u64,
    pub queued: u64,
}

pub struct EmailService {
    db: Arc<DatabaseConnection>,
    tenant_service: Arc<TenantService>,
    /// Settings handed to the default adapter for sends without a project
    default_settings: Value,
}

impl EmailService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        tenant_service: Arc<TenantService>,
        default_settings: Value,
    ) -> Self {
        Self {
            db,
            tenant_service,
            default_settings,
        }
    }

    /// Dispatch a single email and return the settled row.
    ///
    /// Provider rejections settle the row as `failed` and still return `Ok`;
    /// only transport-level failures propagate, leaving the row `queued`.
    pub async fn send(&self, request: SendEmailRequest) -> Result<emails::Model, DispatchError> {
        let (provider_slug, adapter) = self.resolve_adapter(request.project_id).await?;

        // Render before anything is persisted so a bad template aborts cleanly
        let rendered_html = match &request.html {
            Some(template) => Some(render_body(template, &request.template_variables)?),
            None => None,
        };
        let rendered_text = match &request.text {
            Some(template) => Some(render_body(template, &request.template_variables)?),
            None => None,
        };

        let to_email = request
            .personalization
            .to
            .first()
            .cloned()
            .unwrap_or_default();
        let body = rendered_html
            .clone()
            .or_else(|| rendered_text.clone())
            .unwrap_or_default();

        let now = Utc::now();
        let email = emails::ActiveModel {
            id: Set(Uuid::new_v4()),
            from_email: Set(request.from_email.clone()),
            to_email: Set(to_email),
            subject: Set(request.subject.clone()),
            body: Set(body),
            status: Set("queued".to_string()),
            sent_at: Set(None),
            provider: Set(provider_slug.clone()),
            provider_message_id: Set(None),
            project_id: Set(request.project_id),
            error_message: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        };
        let email = email.insert(self.db.as_ref()).await?;
        debug!("Queued email {} via {}", email.id, provider_slug);

        let mut outbound = request;
        outbound.html = rendered_html;
        outbound.text = rendered_text;

        // A transport failure propagates here and leaves the row queued
        let result = adapter.send(&outbound).await?;

        if result.ok {
            let mut active: emails::ActiveModel = email.into();
            active.status = Set("sent".to_string());
            active.sent_at = Set(Some(Utc::now()));
            active.provider_message_id = Set(result.provider_message_id.clone());
            active.updated_at = Set(Utc::now());
            let updated = active.update(self.db.as_ref()).await?;
            info!(
                "Email {} sent via {}, provider message id: {}",
                updated.id,
                updated.provider,
                updated.provider_message_id.as_deref().unwrap_or("-")
            );
            Ok(updated)
        } else {
            let error_message = result
                .error_message
                .clone()
                .unwrap_or_else(|| "Provider rejected the message".to_string());

            let email_id = email.id;
            let mut active: emails::ActiveModel = email.into();
            active.status = Set("failed".to_string());
            active.error_message = Set(Some(error_message.clone()));
            active.updated_at = Set(Utc::now());
            let updated = active.update(self.db.as_ref()).await?;

            let event = email_events::ActiveModel {
                id: Set(Uuid::new_v4()),
                email_id: Set(email_id),
                event_type: Set(DeliveryEventType::Failed.to_string()),
                event_timestamp: Set(Utc::now()),
                details: Set(json!({
                    "error_code": result.error_code,
                    "error_message": result.error_message,
                })),
                created_at: Set(Utc::now()),
            };
            event.insert(self.db.as_ref()).await?;

            warn!("Email {} failed via {}: {}", updated.id, updated.provider, error_message);
            Ok(updated)
        }
    }

    pub async fn get(&self, id: Uuid) -> Result<emails::Model, DispatchError> {
        Emails::find_by_id(id)
            .one(self.db.as_ref())
            .await?
            .ok_or_else(|| DispatchError::EmailNotFound(id.to_string()))
    }

    pub async fn list(
        &self,
        opts: ListEmailsOptions,
    ) -> Result<(Vec<emails::Model>, u64), DispatchError> {
        let page = opts.page.unwrap_or(1).max(1);
        let page_size = std::cmp::min(opts.page_size.unwrap_or(20), 100);

        let mut query = Emails::find();
        if let Some(project_id) = opts.project_id {
            query = query.filter(emails::Column::ProjectId.eq(project_id));
        }
        if let Some(status) = &opts.status {
            query = query.filter(emails::Column::Status.eq(status.as_str()));
        }

        let paginator = query
            .order_by_desc(emails::Column::CreatedAt)
            .paginate(self.db.as_ref(), page_size);

        let total = paginator.num_items().await?;
        let emails = paginator.fetch_page(page - 1).await?;
        Ok((emails, total))
    }

    pub async fn stats(
        &self,
        project_id: Option<Uuid>,
    ) -> Result<EmailStatistics, DispatchError> {
        let scoped = || {
            let mut query = Emails::find();
            if let Some(project_id) = project_id {
                query = query.filter(emails::Column::ProjectId.eq(project_id));
            }
            query
        };

        let total = scoped().count(self.db.as_ref()).await?;
        let sent = scoped()
            .filter(emails::Column::Status.eq("sent"))
            .count(self.db.as_ref())
            .await?;
        let failed = scoped()
            .filter(emails::Column::Status.eq("failed"))
            .count(self.db.as_ref())
            .await?;
        let queued = scoped()
            .filter(emails::Column::Status.eq("queued"))
            .count(self.db.as_ref())
            .await?;

        Ok(EmailStatistics {
            total,
            sent,
            failed,
            queued,
        })
    }

    async fn resolve_adapter(
        &self,
        project_id: Option<Uuid>,
    ) -> Result<(String, Box<dyn EmailProvider>), DispatchError> {
        match project_id {
            Some(project_id) => {
                let tenant = self.tenant_service.get(project_id).await?;
                let settings = self.tenant_service.settings(&tenant)?;
                let adapter = registry::resolve(&tenant.provider, settings)?;
                debug!(
                    "Routing send for project {} through provider {}",
                    project_id, tenant.provider
                );
                Ok((tenant.provider, adapter))
            }
            None => {
                let (metadata, adapter) = registry::default_provider(self.default_settings.clone())?;
                debug!("Routing send through default provider {}", metadata.id);
                Ok((metadata.id, adapter))
            }
        }
    }
}
