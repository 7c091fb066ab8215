//! Configuration loading and validation for the token service.
//!
//! All values are read from environment variables at startup. The process will
//! exit with a clear error message if any variable is invalid. Error messages
//! name the offending variable but never echo key material.

use anyhow::{Context, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use cryptor::KeyMaterial;
use serde::Deserialize;

use crate::server::state::DEFAULT_MAX_TTL_SECS;

/// Validated token service configuration.
#[derive(Clone, Deserialize)]
pub struct Config {
    /// Standard base64 of the 32-byte AES-256 key. Set together with
    /// `hash_key`; when both are absent the placeholder keys are used.
    #[serde(default)]
    pub cipher_key: Option<String>,

    /// Standard base64 of the HKDF key (any non-zero length).
    #[serde(default)]
    pub hash_key: Option<String>,

    /// Port the HTTP server listens on.
    #[serde(default = "default_listen_port")]
    pub listen_port: u16,

    /// Largest `ttl_secs` accepted by `POST /tokens`.
    #[serde(default = "default_max_ttl")]
    pub max_ttl_secs: u64,

    /// OTLP gRPC endpoint for span export. Logs only when unset.
    #[serde(default)]
    pub otel_exporter_otlp_endpoint: Option<String>,

    /// Tracing log level (e.g. `"info"`, `"debug"`).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_listen_port() -> u16 {
    8080
}
fn default_max_ttl() -> u64 {
    DEFAULT_MAX_TTL_SECS
}
fn default_log_level() -> String {
    "info".into()
}

impl Config {
    /// Load and validate configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if any variable cannot be parsed or fails validation.
    pub fn from_env() -> Result<Self> {
        let cfg = config::Config::builder()
            .add_source(config::Environment::default())
            .build()
            .context("failed to build configuration from environment")?;

        let c: Config = cfg
            .try_deserialize()
            .context("failed to deserialise configuration")?;

        c.validate()?;
        Ok(c)
    }

    /// Decode the configured keys, falling back to the placeholder pair when
    /// neither key is set.
    ///
    /// # Errors
    ///
    /// Returns an error if only one key is set, a key is not valid base64, or
    /// the decoded keys have unusable lengths.
    pub fn key_material(&self) -> Result<KeyMaterial> {
        match (&self.cipher_key, &self.hash_key) {
            (None, None) => Ok(KeyMaterial::placeholder()),
            (Some(cipher_key), Some(hash_key)) => {
                let cipher_key = decode_key(cipher_key, "CIPHER_KEY")?;
                let hash_key = decode_key(hash_key, "HASH_KEY")?;
                KeyMaterial::new(&cipher_key, &hash_key).context("invalid key material")
            }
            _ => anyhow::bail!("CIPHER_KEY and HASH_KEY must be set together"),
        }
    }

    /// Validate all fields, returning a descriptive error on the first failure.
    fn validate(&self) -> Result<()> {
        if let Some(key) = &self.cipher_key {
            ensure_non_empty(key, "CIPHER_KEY")?;
        }
        if let Some(key) = &self.hash_key {
            ensure_non_empty(key, "HASH_KEY")?;
        }
        self.key_material()?;

        if self.max_ttl_secs == 0 {
            anyhow::bail!("MAX_TTL_SECS must be > 0");
        }
        if let Some(endpoint) = &self.otel_exporter_otlp_endpoint {
            ensure_non_empty(endpoint, "OTEL_EXPORTER_OTLP_ENDPOINT")?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("cipher_key", &self.cipher_key.as_ref().map(|_| "[REDACTED]"))
            .field("hash_key", &self.hash_key.as_ref().map(|_| "[REDACTED]"))
            .field("listen_port", &self.listen_port)
            .field("max_ttl_secs", &self.max_ttl_secs)
            .field("otel_exporter_otlp_endpoint", &self.otel_exporter_otlp_endpoint)
            .field("log_level", &self.log_level)
            .finish()
    }
}

fn decode_key(value: &str, name: &str) -> Result<Vec<u8>> {
    // The decoder's own error names the offending byte; keep it out of logs.
    STANDARD
        .decode(value.trim())
        .map_err(|_| anyhow::anyhow!("{name} must be standard base64"))
}

fn ensure_non_empty(value: &str, name: &str) -> Result<()> {
    if value.trim().is_empty() {
        anyhow::bail!("{name} must not be empty when set");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> Config {
        Config {
            cipher_key: None,
            hash_key: None,
            listen_port: default_listen_port(),
            max_ttl_secs: default_max_ttl(),
            otel_exporter_otlp_endpoint: None,
            log_level: default_log_level(),
        }
    }

    fn with_keys(cipher_key: &str, hash_key: &str) -> Config {
        Config {
            cipher_key: Some(cipher_key.into()),
            hash_key: Some(hash_key.into()),
            ..base_config()
        }
    }

    #[test]
    fn defaults_are_correct() {
        assert_eq!(default_listen_port(), 8080);
        assert_eq!(default_max_ttl(), 2_592_000);
        assert_eq!(default_log_level(), "info");
    }

    #[test]
    fn no_keys_falls_back_to_placeholder() {
        let cfg = base_config();
        assert!(cfg.validate().is_ok());
        assert!(cfg.key_material().unwrap().is_placeholder());
    }

    #[test]
    fn accepts_valid_keys() {
        let cfg = with_keys(&STANDARD.encode([7u8; 32]), &STANDARD.encode(b"hkdf"));
        assert!(cfg.validate().is_ok());
        assert!(!cfg.key_material().unwrap().is_placeholder());
    }

    #[test]
    fn validate_rejects_single_key() {
        let cfg = Config {
            cipher_key: Some(STANDARD.encode([7u8; 32])),
            ..base_config()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn validate_rejects_short_cipher_key() {
        let cfg = with_keys(&STANDARD.encode([7u8; 16]), &STANDARD.encode(b"hkdf"));
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn validate_rejects_empty_key() {
        let cfg = with_keys(&STANDARD.encode([7u8; 32]), "  ");
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn bad_base64_error_does_not_echo_key() {
        let cfg = with_keys("not*base64*secret", &STANDARD.encode(b"hkdf"));
        let err = cfg.validate().unwrap_err();
        let msg = format!("{err:#}");
        assert!(msg.contains("CIPHER_KEY"));
        assert!(!msg.contains("secret"));
    }

    #[test]
    fn validate_rejects_zero_max_ttl() {
        let cfg = Config {
            max_ttl_secs: 0,
            ..base_config()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn debug_redacts_keys() {
        let cfg = with_keys("c2VjcmV0", "aGFzaA==");
        let printed = format!("{cfg:?}");
        assert!(printed.contains("REDACTED"));
        assert!(!printed.contains("c2VjcmV0"));
    }
}
