//! Multi-tenant email dispatch
//!
//! One send request maps to exactly one provider call: the orchestrator
//! resolves a provider adapter (per tenant or the registry default), renders
//! the body templates, persists the email and settles it against the
//! provider's verdict. Provider webhooks flow back through the same adapters
//! and are correlated to persisted emails as delivery events.

pub mod errors;
pub mod handlers;
pub mod providers;
pub mod services;
pub mod template;

pub use errors::DispatchError;
pub use handlers::{configure_routes, AppState, DispatchApiDoc};
pub use providers::{
    DeliveryEvent, DeliveryEventType, EmailProvider, ProviderMetadata, SendEmailRequest,
    SendEmailResult,
};
pub use services::{EmailService, TenantService, WebhookService};
