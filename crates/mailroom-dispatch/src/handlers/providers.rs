//! Provider listing and webhook intake endpoints

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use http::HeaderMap;
use mailroom_core::problemdetails::Problem;
use mailroom_core::{bad_request, internal_server_error, not_found, unauthorized, ProblemDetails};
use tracing::error;

use super::types::{AppState, ListProvidersQuery};
use crate::errors::DispatchError;
use crate::providers::registry;
use crate::providers::traits::ProviderMetadata;
use crate::services::DeliveryEventsOutcome;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/providers", get(list_providers))
        .route(
            "/providers/{slug}/delivery-events",
            post(receive_delivery_events),
        )
}

#[utoipa::path(
    get,
    path = "/providers",
    tag = "Providers",
    params(ListProvidersQuery),
    responses(
        (status = 200, description = "Registered provider adapters", body = Vec<ProviderMetadata>)
    )
)]
pub async fn list_providers(
    Query(query): Query<ListProvidersQuery>,
) -> Result<impl IntoResponse, Problem> {
    let providers = registry::list(query.enabled_only.unwrap_or(false));
    Ok(Json(providers))
}

#[utoipa::path(
    post,
    path = "/providers/{slug}/delivery-events",
    tag = "Providers",
    params(("slug" = String, Path, description = "Provider slug the webhook is registered under")),
    request_body = serde_json::Value,
    responses(
        (status = 200, description = "Webhook processed with per-event outcomes", body = DeliveryEventsOutcome),
        (status = 400, description = "Payload is not valid JSON", body = ProblemDetails),
        (status = 401, description = "Signature verification failed", body = ProblemDetails),
        (status = 404, description = "No adapter registered under this slug", body = ProblemDetails)
    )
)]
pub async fn receive_delivery_events(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, Problem> {
    match state
        .webhook_service
        .process_delivery_events(&slug, &body, &headers)
        .await
    {
        Ok(outcome) => Ok(Json(outcome)),
        Err(DispatchError::ProviderNotFound(slug)) => Err(not_found()
            .detail(format!("Provider not found: {slug}"))
            .build()),
        Err(DispatchError::WebhookAuthentication) => Err(unauthorized()
            .detail("Webhook signature verification failed")
            .build()),
        Err(DispatchError::InvalidWebhookPayload(reason)) => Err(bad_request()
            .detail(format!("Invalid webhook payload: {reason}"))
            .build()),
        Err(e) => {
            error!("Failed to process {} webhook: {}", slug, e);
            Err(internal_server_error().build())
        }
    }
}
