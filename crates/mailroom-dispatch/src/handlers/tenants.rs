//! Tenant management endpoints
//!
//! Responses only ever expose whether settings are configured; decrypted
//! settings never leave the service layer.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use mailroom_core::problemdetails::Problem;
use mailroom_core::{bad_request, internal_server_error, not_found, ProblemDetails};
use tracing::error;
use uuid::Uuid;

use super::types::{
    AppState, CreateTenantRequestBody, ListTenantsQuery, PaginatedTenantsResponse, TenantResponse,
    UpdateTenantRequestBody,
};
use crate::errors::DispatchError;
use crate::services::{CreateTenant, ListTenantsOptions, UpdateTenant};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/tenants", post(create_tenant).get(list_tenants))
        .route(
            "/tenants/{id}",
            get(get_tenant).put(update_tenant).delete(delete_tenant),
        )
}

fn parse_tenant_id(raw: &str) -> Result<Uuid, Problem> {
    Uuid::parse_str(raw).map_err(|_| bad_request().detail("Invalid tenant ID format").build())
}

#[utoipa::path(
    post,
    path = "/tenants",
    tag = "Tenants",
    request_body = CreateTenantRequestBody,
    responses(
        (status = 201, description = "Tenant created", body = TenantResponse),
        (status = 400, description = "Duplicate name or unsupported provider", body = ProblemDetails)
    )
)]
pub async fn create_tenant(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateTenantRequestBody>,
) -> Result<impl IntoResponse, Problem> {
    if body.name.trim().is_empty() {
        return Err(bad_request().detail("Tenant name is required").build());
    }

    match state
        .tenant_service
        .create(CreateTenant {
            name: body.name,
            provider: body.provider,
            settings: body.settings,
        })
        .await
    {
        Ok(tenant) => Ok((StatusCode::CREATED, Json(TenantResponse::from(tenant)))),
        Err(DispatchError::DuplicateTenantName(name)) => Err(bad_request()
            .detail(format!("Tenant name already in use: {name}"))
            .build()),
        Err(DispatchError::UnsupportedProvider(slug)) => Err(bad_request()
            .detail(format!("Unsupported provider: {slug}"))
            .build()),
        Err(e) => {
            error!("Failed to create tenant: {}", e);
            Err(internal_server_error().build())
        }
    }
}

#[utoipa::path(
    get,
    path = "/tenants",
    tag = "Tenants",
    params(ListTenantsQuery),
    responses(
        (status = 200, description = "Page of tenants, newest first", body = PaginatedTenantsResponse)
    )
)]
pub async fn list_tenants(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListTenantsQuery>,
) -> Result<impl IntoResponse, Problem> {
    match state
        .tenant_service
        .list(ListTenantsOptions {
            page: query.page,
            page_size: query.page_size,
        })
        .await
    {
        Ok((tenants, total)) => Ok(Json(PaginatedTenantsResponse {
            data: tenants.into_iter().map(TenantResponse::from).collect(),
            total,
            page: query.page.unwrap_or(1).max(1),
            page_size: query.page_size.unwrap_or(20).min(100),
        })),
        Err(e) => {
            error!("Failed to list tenants: {}", e);
            Err(internal_server_error().build())
        }
    }
}

#[utoipa::path(
    get,
    path = "/tenants/{id}",
    tag = "Tenants",
    params(("id" = String, Path, description = "Tenant ID")),
    responses(
        (status = 200, description = "Tenant found", body = TenantResponse),
        (status = 400, description = "Invalid tenant ID", body = ProblemDetails),
        (status = 404, description = "Tenant not found", body = ProblemDetails)
    )
)]
pub async fn get_tenant(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, Problem> {
    let id = parse_tenant_id(&id)?;

    match state.tenant_service.get(id).await {
        Ok(tenant) => Ok(Json(TenantResponse::from(tenant))),
        Err(DispatchError::TenantNotFound(_)) => {
            Err(not_found().detail("Tenant not found").build())
        }
        Err(e) => {
            error!("Failed to get tenant {}: {}", id, e);
            Err(internal_server_error().build())
        }
    }
}

#[utoipa::path(
    put,
    path = "/tenants/{id}",
    tag = "Tenants",
    params(("id" = String, Path, description = "Tenant ID")),
    request_body = UpdateTenantRequestBody,
    responses(
        (status = 200, description = "Tenant updated", body = TenantResponse),
        (status = 400, description = "Invalid update", body = ProblemDetails),
        (status = 404, description = "Tenant not found", body = ProblemDetails)
    )
)]
pub async fn update_tenant(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<UpdateTenantRequestBody>,
) -> Result<impl IntoResponse, Problem> {
    let id = parse_tenant_id(&id)?;

    match state
        .tenant_service
        .update(
            id,
            UpdateTenant {
                name: body.name,
                provider: body.provider,
                settings: body.settings,
            },
        )
        .await
    {
        Ok(tenant) => Ok(Json(TenantResponse::from(tenant))),
        Err(DispatchError::TenantNotFound(_)) => {
            Err(not_found().detail("Tenant not found").build())
        }
        Err(DispatchError::DuplicateTenantName(name)) => Err(bad_request()
            .detail(format!("Tenant name already in use: {name}"))
            .build()),
        Err(DispatchError::UnsupportedProvider(slug)) => Err(bad_request()
            .detail(format!("Unsupported provider: {slug}"))
            .build()),
        Err(e) => {
            error!("Failed to update tenant {}: {}", id, e);
            Err(internal_server_error().build())
        }
    }
}

#[utoipa::path(
    delete,
    path = "/tenants/{id}",
    tag = "Tenants",
    params(("id" = String, Path, description = "Tenant ID")),
    responses(
        (status = 204, description = "Tenant deleted"),
        (status = 400, description = "Invalid tenant ID", body = ProblemDetails),
        (status = 404, description = "Tenant not found", body = ProblemDetails)
    )
)]
pub async fn delete_tenant(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, Problem> {
    let id = parse_tenant_id(&id)?;

    match state.tenant_service.delete(id).await {
        Ok(()) => Ok(StatusCode::NO_CONTENT),
        Err(DispatchError::TenantNotFound(_)) => {
            Err(not_found().detail("Tenant not found").build())
        }
        Err(e) => {
            error!("Failed to delete tenant {}: {}", id, e);
            Err(internal_server_error().build())
        }
    }
}
