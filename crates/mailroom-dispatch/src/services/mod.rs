//! Business logic services

pub mod email_service;
pub mod tenant_service;
pub mod webhook_service;

pub use email_service::{EmailService, EmailStatistics, ListEmailsOptions};
pub use tenant_service::{CreateTenant, ListTenantsOptions, TenantService, UpdateTenant};
pub use webhook_service::{DeliveryEventFailure, DeliveryEventsOutcome, WebhookService};
