//! HTTP handlers for the dispatch API

mod emails;
mod providers;
mod tenants;
mod types;

pub use types::AppState;

use axum::Router;
use std::sync::Arc;
use utoipa::OpenApi;

/// Configure dispatch API routes
pub fn configure_routes() -> Router<Arc<AppState>> {
    Router::new()
        .merge(emails::routes())
        .merge(providers::routes())
        .merge(tenants::routes())
}

#[derive(OpenApi)]
#[openapi(
    paths(
        // Emails
        emails::send_email,
        emails::list_emails,
        emails::get_email,
        emails::get_email_stats,
        // Providers
        providers::list_providers,
        providers::receive_delivery_events,
        // Tenants
        tenants::create_tenant,
        tenants::list_tenants,
        tenants::get_tenant,
        tenants::update_tenant,
        tenants::delete_tenant,
    ),
    components(
        schemas(
            // Email types
            types::SendEmailRequestBody,
            types::EmailResponse,
            types::PaginatedEmailsResponse,
            types::EmailStatsResponse,
            crate::providers::traits::Attachment,
            crate::providers::traits::Personalization,
            // Provider types
            crate::providers::traits::ProviderMetadata,
            crate::services::DeliveryEventsOutcome,
            crate::services::DeliveryEventFailure,
            // Tenant types
            types::CreateTenantRequestBody,
            types::UpdateTenantRequestBody,
            types::TenantResponse,
            types::PaginatedTenantsResponse,
        )
    ),
    tags(
        (name = "Emails", description = "Email dispatch and delivery history"),
        (name = "Providers", description = "Provider adapters and webhook intake"),
        (name = "Tenants", description = "Tenant management and provider settings")
    )
)]
pub struct DispatchApiDoc;
