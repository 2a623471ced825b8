mod service;

pub use service::{
    ConfigError, Environment, ServerConfig, DEFAULT_ENCRYPTION_PASSPHRASE,
    DEFAULT_ENCRYPTION_SALT,
};
