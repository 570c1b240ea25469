//! Configuration loading and representation.
//!
//! Built **once** at startup and passed into collaborator constructors; nothing
//! else in the workspace reads the environment. Secret values are redacted in
//! `Debug` output, and error messages name the variable, never its value.

use std::collections::HashMap;

use thiserror::Error;
use tracing::warn;

use fulfillsync_inventory::ShortagePolicy;
use fulfillsync_observability::LogFormat;

pub const AMAZON_REFRESH_TOKEN: &str = "AMAZON_REFRESH_TOKEN";
pub const AMAZON_CLIENT_ID: &str = "AMAZON_CLIENT_ID";
pub const AMAZON_CLIENT_SECRET: &str = "AMAZON_CLIENT_SECRET";
pub const AMAZON_AWS_ACCESS_KEY: &str = "AMAZON_AWS_ACCESS_KEY";
pub const AMAZON_AWS_SECRET_KEY: &str = "AMAZON_AWS_SECRET_KEY";
pub const AMAZON_ROLE_ARN: &str = "AMAZON_ROLE_ARN";
pub const AMAZON_MARKETPLACE: &str = "AMAZON_MARKETPLACE";
pub const TIKTOK_APP_KEY: &str = "TIKTOK_APP_KEY";
pub const TIKTOK_APP_SECRET: &str = "TIKTOK_APP_SECRET";
pub const TIKTOK_ACCESS_TOKEN: &str = "TIKTOK_ACCESS_TOKEN";
pub const SHORTAGE_POLICY: &str = "FULFILLSYNC_SHORTAGE_POLICY";
pub const LOG_FORMAT: &str = "FULFILLSYNC_LOG_FORMAT";

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required environment variables: {}", .0.join(", "))]
    MissingVars(Vec<&'static str>),

    #[error("invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Fulfillment-provider marketplace.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Marketplace {
    #[default]
    Us,
    Ca,
    Uk,
    De,
    Fr,
}

impl Marketplace {
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_ascii_uppercase().as_str() {
            "US" => Some(Marketplace::Us),
            "CA" => Some(Marketplace::Ca),
            "UK" | "GB" => Some(Marketplace::Uk),
            "DE" => Some(Marketplace::De),
            "FR" => Some(Marketplace::Fr),
            _ => None,
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            Marketplace::Us => "US",
            Marketplace::Ca => "CA",
            Marketplace::Uk => "UK",
            Marketplace::De => "DE",
            Marketplace::Fr => "FR",
        }
    }

    pub fn marketplace_id(self) -> &'static str {
        match self {
            Marketplace::Us => "ATVPDKIKX0DER",
            Marketplace::Ca => "A2EUQ1WTGCTBG2",
            Marketplace::Uk => "A1F83G8C2ARO7P",
            Marketplace::De => "A1PA6795UKMFR9",
            Marketplace::Fr => "A13V1IB3VIYZZH",
        }
    }
}

/// Credentials for the fulfillment provider (selling partner API).
#[derive(Clone)]
pub struct AmazonCredentials {
    pub refresh_token: String,
    pub client_id: String,
    pub client_secret: String,
    pub aws_access_key: String,
    pub aws_secret_key: String,
    pub role_arn: String,
}

impl std::fmt::Debug for AmazonCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AmazonCredentials")
            .field("refresh_token", &"<REDACTED>")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<REDACTED>")
            .field("aws_access_key", &"<REDACTED>")
            .field("aws_secret_key", &"<REDACTED>")
            .field("role_arn", &self.role_arn)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct AmazonConfig {
    pub credentials: AmazonCredentials,
    pub marketplace: Marketplace,
}

/// Credentials for the sales channel (order source and status sink).
#[derive(Clone)]
pub struct TikTokCredentials {
    pub app_key: String,
    pub app_secret: String,
    pub access_token: String,
}

impl std::fmt::Debug for TikTokCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TikTokCredentials")
            .field("app_key", &self.app_key)
            .field("app_secret", &"<REDACTED>")
            .field("access_token", &"<REDACTED>")
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub amazon: AmazonConfig,
    pub tiktok: TikTokCredentials,
    pub shortage_policy: ShortagePolicy,
    pub log_format: LogFormat,
}

impl EngineConfig {
    /// Load configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration from a fixed set of variables (tests, embedding).
    pub fn from_map(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        Self::from_lookup(|name| vars.get(name).cloned())
    }

    /// Load configuration through `lookup`.
    ///
    /// Every required variable is checked before failing, so one error lists all
    /// missing names. Empty values count as missing.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut missing = Vec::new();
        let mut require = |name: &'static str| -> String {
            match lookup(name).filter(|v| !v.trim().is_empty()) {
                Some(v) => v,
                None => {
                    missing.push(name);
                    String::new()
                }
            }
        };

        let credentials = AmazonCredentials {
            refresh_token: require(AMAZON_REFRESH_TOKEN),
            client_id: require(AMAZON_CLIENT_ID),
            client_secret: require(AMAZON_CLIENT_SECRET),
            aws_access_key: require(AMAZON_AWS_ACCESS_KEY),
            aws_secret_key: require(AMAZON_AWS_SECRET_KEY),
            role_arn: require(AMAZON_ROLE_ARN),
        };
        let tiktok = TikTokCredentials {
            app_key: require(TIKTOK_APP_KEY),
            app_secret: require(TIKTOK_APP_SECRET),
            access_token: require(TIKTOK_ACCESS_TOKEN),
        };

        if !missing.is_empty() {
            return Err(ConfigError::MissingVars(missing));
        }

        let marketplace = match lookup(AMAZON_MARKETPLACE).filter(|v| !v.trim().is_empty()) {
            None => Marketplace::default(),
            Some(code) => Marketplace::from_code(&code).unwrap_or_else(|| {
                warn!(marketplace = %code, "unknown marketplace code, falling back to US");
                Marketplace::Us
            }),
        };

        let shortage_policy = match lookup(SHORTAGE_POLICY).filter(|v| !v.trim().is_empty()) {
            None => ShortagePolicy::default(),
            Some(raw) => raw.parse().map_err(|e: fulfillsync_inventory::UnknownShortagePolicy| {
                ConfigError::Invalid {
                    name: SHORTAGE_POLICY,
                    reason: e.to_string(),
                }
            })?,
        };

        let log_format = match lookup(LOG_FORMAT).filter(|v| !v.trim().is_empty()) {
            None => LogFormat::default(),
            Some(raw) => raw.parse().map_err(|e: fulfillsync_observability::UnknownLogFormat| {
                ConfigError::Invalid {
                    name: LOG_FORMAT,
                    reason: e.to_string(),
                }
            })?,
        };

        Ok(Self {
            amazon: AmazonConfig {
                credentials,
                marketplace,
            },
            tiktok,
            shortage_policy,
            log_format,
        })
    }
}
