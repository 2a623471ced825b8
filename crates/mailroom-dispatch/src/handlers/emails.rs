//! Email dispatch and query endpoints

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use mailroom_core::problemdetails::Problem;
use mailroom_core::{bad_gateway, bad_request, internal_server_error, not_found, ProblemDetails};
use tracing::error;
use uuid::Uuid;

use super::types::{
    AppState, EmailResponse, EmailStatsQuery, EmailStatsResponse, ListEmailsQuery,
    PaginatedEmailsResponse, SendEmailRequestBody,
};
use crate::errors::DispatchError;
use crate::providers::traits::SendEmailRequest;
use crate::services::ListEmailsOptions;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/emails", post(send_email).get(list_emails))
        .route("/emails/stats", get(get_email_stats))
        .route("/emails/{id}", get(get_email))
}

fn parse_project_id(raw: Option<&str>) -> Result<Option<Uuid>, Problem> {
    match raw {
        None => Ok(None),
        Some(raw) => Uuid::parse_str(raw)
            .map(Some)
            .map_err(|_| bad_request().detail("Invalid project ID format").build()),
    }
}

#[utoipa::path(
    post,
    path = "/emails",
    tag = "Emails",
    request_body = SendEmailRequestBody,
    responses(
        (status = 200, description = "Email dispatched; provider rejections come back with status failed", body = EmailResponse),
        (status = 400, description = "Invalid request or template rendering failure", body = ProblemDetails),
        (status = 404, description = "Project not found", body = ProblemDetails),
        (status = 502, description = "Provider could not be reached", body = ProblemDetails)
    )
)]
pub async fn send_email(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SendEmailRequestBody>,
) -> Result<impl IntoResponse, Problem> {
    if body.personalization.to.is_empty() {
        return Err(bad_request()
            .detail("At least one recipient is required")
            .build());
    }
    if body.html.is_none() && body.text.is_none() {
        return Err(bad_request()
            .detail("Either an html or a text body is required")
            .build());
    }

    let project_id = parse_project_id(body.project_id.as_deref())?;

    let request = SendEmailRequest {
        project_id,
        from_email: body.from_email,
        subject: body.subject,
        html: body.html,
        text: body.text,
        attachments: body.attachments,
        personalization: body.personalization,
        template_id: body.template_id,
        template_variables: body.template_variables,
        custom_headers: body.custom_headers,
        priority: body.priority,
        idempotency_key: body.idempotency_key,
    };

    match state.email_service.send(request).await {
        Ok(email) => Ok(Json(EmailResponse::from(email))),
        Err(DispatchError::TenantNotFound(id)) => Err(not_found()
            .detail(format!("Tenant not found: {id}"))
            .build()),
        Err(e @ DispatchError::TemplateRender { .. }) => {
            Err(bad_request().detail(e.to_string()).build())
        }
        Err(DispatchError::UnsupportedProvider(slug)) => Err(bad_request()
            .detail(format!("Unsupported provider: {slug}"))
            .build()),
        Err(DispatchError::NoDefaultProvider) => Err(bad_request()
            .detail("No default provider is configured")
            .build()),
        Err(e @ (DispatchError::Http(_) | DispatchError::Provider(_))) => {
            error!("Provider transport failure: {}", e);
            Err(bad_gateway()
                .detail("The email provider could not be reached")
                .build())
        }
        Err(e) => {
            error!("Failed to send email: {}", e);
            Err(internal_server_error().build())
        }
    }
}

#[utoipa::path(
    get,
    path = "/emails",
    tag = "Emails",
    params(ListEmailsQuery),
    responses(
        (status = 200, description = "Page of emails, newest first", body = PaginatedEmailsResponse),
        (status = 400, description = "Invalid query parameters", body = ProblemDetails)
    )
)]
pub async fn list_emails(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListEmailsQuery>,
) -> Result<impl IntoResponse, Problem> {
    let project_id = parse_project_id(query.project_id.as_deref())?;

    match state
        .email_service
        .list(ListEmailsOptions {
            project_id,
            status: query.status,
            page: query.page,
            page_size: query.page_size,
        })
        .await
    {
        Ok((emails, total)) => Ok(Json(PaginatedEmailsResponse {
            data: emails.into_iter().map(EmailResponse::from).collect(),
            total,
            page: query.page.unwrap_or(1).max(1),
            page_size: query.page_size.unwrap_or(20).min(100),
        })),
        Err(e) => {
            error!("Failed to list emails: {}", e);
            Err(internal_server_error().build())
        }
    }
}

#[utoipa::path(
    get,
    path = "/emails/{id}",
    tag = "Emails",
    params(("id" = String, Path, description = "Email ID")),
    responses(
        (status = 200, description = "Email found", body = EmailResponse),
        (status = 400, description = "Invalid email ID", body = ProblemDetails),
        (status = 404, description = "Email not found", body = ProblemDetails)
    )
)]
pub async fn get_email(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, Problem> {
    let id = Uuid::parse_str(&id)
        .map_err(|_| bad_request().detail("Invalid email ID format").build())?;

    match state.email_service.get(id).await {
        Ok(email) => Ok(Json(EmailResponse::from(email))),
        Err(DispatchError::EmailNotFound(_)) => {
            Err(not_found().detail("Email not found").build())
        }
        Err(e) => {
            error!("Failed to get email {}: {}", id, e);
            Err(internal_server_error().build())
        }
    }
}

#[utoipa::path(
    get,
    path = "/emails/stats",
    tag = "Emails",
    params(EmailStatsQuery),
    responses(
        (status = 200, description = "Email counts by status", body = EmailStatsResponse),
        (status = 400, description = "Invalid query parameters", body = ProblemDetails)
    )
)]
pub async fn get_email_stats(
    State(state): State<Arc<AppState>>,
    Query(query): Query<EmailStatsQuery>,
) -> Result<impl IntoResponse, Problem> {
    let project_id = parse_project_id(query.project_id.as_deref())?;

    match state.email_service.stats(project_id).await {
        Ok(stats) => Ok(Json(EmailStatsResponse::from(stats))),
        Err(e) => {
            error!("Failed to compute email stats: {}", e);
            Err(internal_server_error().build())
        }
    }
}
