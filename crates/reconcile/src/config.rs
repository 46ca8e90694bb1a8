//! Provider configuration
//!
//! Settings come from the manifest's `[provider]` table (optionally
//! overridden on the command line) and fall back to the environment for the
//! connection target and credential. The result is an immutable
//! [`ProviderConfig`], built once and handed by reference to everything that
//! needs it.

use crate::error::{Error, Result};
use crate::model::validate_token;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Environment fallback for the RCON address
pub const ADDRESS_ENV: &str = "MINECRAFT_ADDRESS";
/// Environment fallback for the RCON password
pub const PASSWORD_ENV: &str = "MINECRAFT_PASSWORD";

/// Material written when a block or region is cleared
pub const DEFAULT_CLEAR_MATERIAL: &str = "minecraft:air";
/// Namespace prepended to bare entity types
pub const DEFAULT_ENTITY_NAMESPACE: &str = "minecraft";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

const SUBJECT: &str = "provider";

/// Unresolved provider settings, every field optional
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderSettings {
    /// RCON address, `host:port`
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    /// Socket read/write timeout
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    #[serde(default)]
    pub clear_material: Option<String>,
    #[serde(default)]
    pub entity_namespace: Option<String>,
}

impl ProviderSettings {
    /// Layer `overrides` on top of `self`; values set in `overrides` win
    pub fn merge(self, overrides: ProviderSettings) -> Self {
        Self {
            address: overrides.address.or(self.address),
            password: overrides.password.or(self.password),
            timeout_secs: overrides.timeout_secs.or(self.timeout_secs),
            clear_material: overrides.clear_material.or(self.clear_material),
            entity_namespace: overrides.entity_namespace.or(self.entity_namespace),
        }
    }
}

/// Resolved, validated provider configuration
#[derive(Clone)]
pub struct ProviderConfig {
    address: String,
    password: String,
    timeout: Duration,
    clear_material: String,
    entity_namespace: String,
}

impl ProviderConfig {
    /// Configuration with default command settings
    pub fn new(address: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            password: password.into(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            clear_material: DEFAULT_CLEAR_MATERIAL.to_string(),
            entity_namespace: DEFAULT_ENTITY_NAMESPACE.to_string(),
        }
    }

    /// Resolve settings, consulting `env` for anything the settings omit.
    ///
    /// An explicitly configured value is used as-is, even when empty; the
    /// environment is only a fallback for values that were never set.
    pub fn resolve<F>(settings: ProviderSettings, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let address = settings
            .address
            .or_else(|| env(ADDRESS_ENV))
            .unwrap_or_default();
        if address.trim().is_empty() {
            return Err(Error::validation(
                SUBJECT,
                "address",
                format!("cannot be an empty string (set it in [provider] or {ADDRESS_ENV})"),
            ));
        }

        let password = settings
            .password
            .or_else(|| env(PASSWORD_ENV))
            .unwrap_or_default();
        if password.is_empty() {
            return Err(Error::validation(
                SUBJECT,
                "password",
                format!("cannot be an empty string (set it in [provider] or {PASSWORD_ENV})"),
            ));
        }

        let timeout_secs = settings.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS);
        if timeout_secs == 0 {
            return Err(Error::validation(
                SUBJECT,
                "timeout_secs",
                "must be greater than zero",
            ));
        }

        let clear_material = settings
            .clear_material
            .unwrap_or_else(|| DEFAULT_CLEAR_MATERIAL.to_string());
        validate_token(SUBJECT, "clear_material", &clear_material)?;

        let entity_namespace = settings
            .entity_namespace
            .unwrap_or_else(|| DEFAULT_ENTITY_NAMESPACE.to_string());
        validate_token(SUBJECT, "entity_namespace", &entity_namespace)?;
        if entity_namespace.contains(':') {
            return Err(Error::validation(
                SUBJECT,
                "entity_namespace",
                "must not contain ':'",
            ));
        }

        Ok(Self {
            address: address.trim().to_string(),
            password,
            timeout: Duration::from_secs(timeout_secs),
            clear_material,
            entity_namespace,
        })
    }

    /// Resolve with the process environment as fallback
    pub fn from_settings(settings: ProviderSettings) -> Result<Self> {
        Self::resolve(settings, |key| std::env::var(key).ok())
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn clear_material(&self) -> &str {
        &self.clear_material
    }

    pub fn entity_namespace(&self) -> &str {
        &self.entity_namespace
    }

    pub fn with_clear_material(mut self, material: impl Into<String>) -> Self {
        self.clear_material = material.into();
        self
    }
}

impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("address", &self.address)
            .field("password", &"<redacted>")
            .field("timeout", &self.timeout)
            .field("clear_material", &self.clear_material)
            .field("entity_namespace", &self.entity_namespace)
            .finish()
    }
}
