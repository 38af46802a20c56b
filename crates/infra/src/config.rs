//! Configuration loading and representation.
//!
//! Everything comes from environment variables; see [`AppConfig::from_env`].

use std::net::SocketAddr;

use thiserror::Error;

use pharmacie_reorder::{DEFAULT_MIN_SUPPLIERS, DEFAULT_SIGNATURE, FailurePolicy};

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required setting {0}")]
    Missing(&'static str),

    #[error("invalid value for {key}: {message}")]
    Invalid { key: &'static str, message: String },
}

/// Mail transport selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotifierConfig {
    /// Write messages to the log instead of sending them.
    Log,
    Mailgun {
        api_key: String,
        domain: String,
        from_email: String,
        /// Base URL of the Mailgun API (overridable for EU region or tests).
        base_url: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    /// `Some` when the Postgres stores are enabled.
    pub database_url: Option<String>,
    pub notifier: NotifierConfig,
    pub failure_policy: FailurePolicy,
    pub min_suppliers_per_category: usize,
    pub signature: String,
}

impl AppConfig {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key lookup (tests pass a map).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let bind_addr = get("BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::Invalid {
                key: "BIND_ADDR",
                message: e.to_string(),
            })?;

        let use_persistent = match get("USE_PERSISTENT_STORES") {
            None => false,
            Some(v) => v.trim().parse::<bool>().map_err(|e| ConfigError::Invalid {
                key: "USE_PERSISTENT_STORES",
                message: e.to_string(),
            })?,
        };
        let database_url = if use_persistent {
            Some(get("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?)
        } else {
            None
        };

        let notifier = match get("NOTIFIER").as_deref().map(str::trim) {
            None | Some("log") => NotifierConfig::Log,
            Some("mailgun") => NotifierConfig::Mailgun {
                api_key: get("MAILGUN_API_KEY").ok_or(ConfigError::Missing("MAILGUN_API_KEY"))?,
                domain: get("MAILGUN_DOMAIN").ok_or(ConfigError::Missing("MAILGUN_DOMAIN"))?,
                from_email: get("MAILGUN_FROM_EMAIL")
                    .ok_or(ConfigError::Missing("MAILGUN_FROM_EMAIL"))?,
                base_url: get("MAILGUN_BASE_URL")
                    .unwrap_or_else(|| crate::notifier::mailgun::DEFAULT_BASE_URL.to_string()),
            },
            Some(other) => {
                return Err(ConfigError::Invalid {
                    key: "NOTIFIER",
                    message: format!("expected log or mailgun, got {other:?}"),
                });
            }
        };

        let failure_policy = match get("QUOTE_FAILURE_POLICY") {
            None => FailurePolicy::default(),
            Some(v) => v.parse::<FailurePolicy>().map_err(|e| ConfigError::Invalid {
                key: "QUOTE_FAILURE_POLICY",
                message: e.to_string(),
            })?,
        };

        let min_suppliers_per_category = match get("MIN_SUPPLIERS_PER_CATEGORY") {
            None => DEFAULT_MIN_SUPPLIERS,
            Some(v) => v.trim().parse::<usize>().map_err(|e| ConfigError::Invalid {
                key: "MIN_SUPPLIERS_PER_CATEGORY",
                message: e.to_string(),
            })?,
        };

        let signature = get("PHARMACY_SIGNATURE").unwrap_or_else(|| DEFAULT_SIGNATURE.to_string());

        Ok(Self {
            bind_addr,
            database_url,
            notifier,
            failure_policy,
            min_suppliers_per_category,
            signature,
        })
    }
}
