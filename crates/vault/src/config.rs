//! Configuration loading and validation for the sealing service.
//!
//! All values are read from environment variables at startup. The process will
//! exit with a clear error message if any required variable is missing or invalid.

use std::fmt;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::crypto::SecretKey;
use crate::records::RecordBinding;

/// Validated service configuration.
#[derive(Clone, Deserialize)]
pub struct Config {
    /// Standard base64 of the 32-byte AES-256 key. **Required.**
    pub encryption_key: String,

    /// Port the HTTP server listens on.
    #[serde(default = "default_listen_port")]
    pub listen_port: u16,

    /// Bind row identifiers into the authentication tag.
    #[serde(default = "default_bind_record_context")]
    pub bind_record_context: bool,

    /// Optional OTLP collector endpoint. JSON logs only when unset.
    #[serde(default)]
    pub otel_exporter_otlp_endpoint: Option<String>,

    /// Tracing log level (e.g. `"info"`, `"debug"`).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_listen_port() -> u16 {
    8080
}
fn default_bind_record_context() -> bool {
    true
}
fn default_log_level() -> String {
    "info".into()
}

impl Config {
    /// Load and validate configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if any required variable is absent or cannot be parsed.
    pub fn from_env() -> Result<Self> {
        let cfg = config::Config::builder()
            .add_source(config::Environment::default().try_parsing(true))
            .build()
            .context("failed to build configuration from environment")?;

        let c: Config = cfg
            .try_deserialize()
            .context("failed to deserialise configuration")?;

        c.validate()?;
        Ok(c)
    }

    /// Decode the configured key.
    ///
    /// # Errors
    ///
    /// Returns an error if `ENCRYPTION_KEY` is not base64 of exactly 32 bytes.
    pub fn secret_key(&self) -> Result<SecretKey> {
        SecretKey::from_base64(&self.encryption_key)
            .context("ENCRYPTION_KEY must be standard base64 of exactly 32 bytes")
    }

    /// Record binding selected by `BIND_RECORD_CONTEXT`.
    pub fn record_binding(&self) -> RecordBinding {
        RecordBinding::from_flag(self.bind_record_context)
    }

    /// Validate all fields, returning a descriptive error on the first failure.
    fn validate(&self) -> Result<()> {
        if self.encryption_key.trim().is_empty() {
            anyhow::bail!("ENCRYPTION_KEY is required and must not be empty");
        }
        self.secret_key()?;

        if self.listen_port == 0 {
            anyhow::bail!("LISTEN_PORT must be > 0");
        }
        if let Some(endpoint) = &self.otel_exporter_otlp_endpoint {
            if endpoint.trim().is_empty() {
                anyhow::bail!("OTEL_EXPORTER_OTLP_ENDPOINT must not be empty when set");
            }
        }
        Ok(())
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("encryption_key", &"[REDACTED]")
            .field("listen_port", &self.listen_port)
            .field("bind_record_context", &self.bind_record_context)
            .field("otel_exporter_otlp_endpoint", &self.otel_exporter_otlp_endpoint)
            .field("log_level", &self.log_level)
            .finish()
    }
}
