use std::future::IntoFuture;
use std::sync::Arc;

use anyhow::Context;
use axum::Router;
use clap::Args;
use mailroom_config::{Environment, ServerConfig};
use mailroom_core::{SecretsVault, VaultError};
use mailroom_dispatch::{
    configure_routes, AppState, DispatchApiDoc, EmailService, TenantService, WebhookService,
};
use serde_json::json;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(Args)]
pub struct ServeCommand {
    /// Address to bind the HTTP server to
    #[arg(long, default_value = "127.0.0.1:3000", env = "MAILROOM_ADDRESS")]
    address: String,

    /// Database connection URL
    #[arg(
        long,
        default_value = "sqlite://mailroom.db?mode=rwc",
        env = "MAILROOM_DATABASE_URL"
    )]
    database_url: String,

    /// Runtime environment (development, test, production)
    #[arg(long, default_value = "development", env = "MAILROOM_ENVIRONMENT")]
    environment: String,

    /// Hex-encoded 32-byte key for encrypting tenant settings
    #[arg(long, env = "MAILROOM_ENCRYPTION_KEY")]
    encryption_key: Option<String>,

    /// Passphrase for deriving the encryption key when no key is given
    #[arg(long, env = "MAILROOM_ENCRYPTION_PASSPHRASE")]
    encryption_passphrase: Option<String>,

    /// Salt for the passphrase key derivation
    #[arg(long, env = "MAILROOM_ENCRYPTION_SALT")]
    encryption_salt: Option<String>,

    /// Server token for the default provider, used when a send names no tenant
    #[arg(long, env = "MAILROOM_PROVIDER_TOKEN")]
    provider_token: Option<String>,

    /// Shared secret for verifying incoming webhook signatures
    #[arg(long, env = "MAILROOM_WEBHOOK_SECRET")]
    webhook_secret: Option<String>,
}

impl ServeCommand {
    pub fn execute(self) -> anyhow::Result<()> {
        let environment: Environment = self.environment.parse()?;

        let mut config = ServerConfig::new(self.address, self.database_url, environment);
        if let Some(key) = self.encryption_key {
            config.encryption_key = Some(key);
        }
        if let Some(passphrase) = self.encryption_passphrase {
            config.encryption_passphrase = passphrase;
        }
        if let Some(salt) = self.encryption_salt {
            config.encryption_salt = salt;
        }
        config.default_provider_token = self.provider_token;
        config.webhook_secret = self.webhook_secret;

        let vault = build_vault(&config)?;

        let runtime = tokio::runtime::Runtime::new()?;
        runtime.block_on(run(config, vault))
    }
}

/// Builds the settings vault from the resolved configuration.
///
/// Production requires an explicit key; development and test fall back to
/// passphrase derivation so the server starts without any setup.
fn build_vault(config: &ServerConfig) -> anyhow::Result<SecretsVault> {
    if config.encryption_key.is_none() && !config.is_production() {
        warn!("No encryption key configured, deriving one from the passphrase");
    }

    SecretsVault::from_key_material(
        config.encryption_key.as_deref(),
        &config.encryption_passphrase,
        &config.encryption_salt,
        config.is_production(),
    )
    .map_err(|e| match e {
        VaultError::MissingKey => anyhow::anyhow!(
            "MAILROOM_ENCRYPTION_KEY is required in production; \
             run `mailroom generate-key` to create one"
        ),
        other => anyhow::Error::new(other).context("Invalid encryption key configuration"),
    })
}

async fn run(config: ServerConfig, vault: SecretsVault) -> anyhow::Result<()> {
    let db = mailroom_database::establish_connection(&config.database_url).await?;

    let default_settings = match &config.default_provider_token {
        Some(token) => json!({ "server_token": token }),
        None => json!({}),
    };
    let webhook_settings = match &config.webhook_secret {
        Some(secret) => json!({ "webhook_secret": secret }),
        None => json!({}),
    };

    let tenant_service = Arc::new(TenantService::new(db.clone(), vault));
    let email_service = Arc::new(EmailService::new(
        db.clone(),
        tenant_service.clone(),
        default_settings,
    ));
    let webhook_service = Arc::new(WebhookService::new(db.clone(), webhook_settings));

    let state = AppState::new(email_service, tenant_service, webhook_service);

    let app = Router::new()
        .merge(configure_routes().with_state(Arc::new(state)))
        .merge(
            SwaggerUi::new("/swagger-ui")
                .url("/api-docs/openapi.json", DispatchApiDoc::openapi()),
        )
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );

    let listener = TcpListener::bind(&config.address)
        .await
        .with_context(|| format!("Failed to bind {}", config.address))?;
    info!("Listening on {}", config.address);
    info!("Swagger UI available at http://{}/swagger-ui", config.address);

    axum::serve(listener, app).into_future().await?;

    Ok(())
}
