use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Salt used for key derivation when none is configured.
pub const DEFAULT_ENCRYPTION_SALT: &str = "default-salt";

/// Passphrase used for key derivation when none is configured.
/// Only ever consulted outside production; see the vault's key policy.
pub const DEFAULT_ENCRYPTION_PASSPHRASE: &str = "mailroom-dev";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Unknown environment: {0}")]
    UnknownEnvironment(String),

    #[error("Invalid configuration: {details}")]
    InvalidConfiguration { details: String },
}

/// Deployment environment the server runs in. Production tightens the
/// encryption key policy (no derived fallback keys).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl Environment {
    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }
}

impl FromStr for Environment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "test" => Ok(Environment::Test),
            "production" | "prod" => Ok(Environment::Production),
            other => Err(ConfigError::UnknownEnvironment(other.to_string())),
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// Resolved server configuration, built once at startup from CLI flags and
/// environment variables and passed down explicitly.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ServerConfig {
    pub address: String,
    pub database_url: String,
    pub environment: Environment,

    // Vault key material; the key policy itself lives in the vault
    pub encryption_key: Option<String>,
    pub encryption_passphrase: String,
    pub encryption_salt: String,

    // Settings applied when a send carries no project id (single-tenant mode)
    pub default_provider_token: Option<String>,

    // Shared secret for inbound delivery-event webhook signatures
    pub webhook_secret: Option<String>,
}

impl ServerConfig {
    pub fn new(address: String, database_url: String, environment: Environment) -> Self {
        Self {
            address,
            database_url,
            environment,
            encryption_key: None,
            encryption_passphrase: DEFAULT_ENCRYPTION_PASSPHRASE.to_string(),
            encryption_salt: DEFAULT_ENCRYPTION_SALT.to_string(),
            default_provider_token: None,
            webhook_secret: None,
        }
    }

    pub fn is_production(&self) -> bool {
        self.environment.is_production()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_environment_parsing() {
        assert_eq!(
            "development".parse::<Environment>().unwrap(),
            Environment::Development
        );
        assert_eq!("dev".parse::<Environment>().unwrap(), Environment::Development);
        assert_eq!("TEST".parse::<Environment>().unwrap(), Environment::Test);
        assert_eq!(
            "production".parse::<Environment>().unwrap(),
            Environment::Production
        );
        assert_eq!("prod".parse::<Environment>().unwrap(), Environment::Production);
        assert!("staging".parse::<Environment>().is_err());
    }

    #[test]
    fn test_only_production_is_production() {
        assert!(Environment::Production.is_production());
        assert!(!Environment::Development.is_production());
        assert!(!Environment::Test.is_production());
    }

    #[test]
    fn test_new_applies_derivation_defaults() {
        let config = ServerConfig::new(
            "127.0.0.1:3000".to_string(),
            "postgres://localhost/mailroom".to_string(),
            Environment::Development,
        );

        assert!(config.encryption_key.is_none());
        assert_eq!(config.encryption_salt, DEFAULT_ENCRYPTION_SALT);
        assert_eq!(config.encryption_passphrase, DEFAULT_ENCRYPTION_PASSPHRASE);
        assert!(!config.is_production());
    }

    #[test]
    fn test_environment_round_trips_through_display() {
        for env in [
            Environment::Development,
            Environment::Test,
            Environment::Production,
        ] {
            assert_eq!(env.to_string().parse::<Environment>().unwrap(), env);
        }
    }
}
