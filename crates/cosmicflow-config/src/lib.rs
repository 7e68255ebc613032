//! Provider configuration
//!
//! The provider is configured once, from the settings block the host runtime
//! hands over. Every setting falls back to a `COSMIC_*` environment variable.
//! Credentials come either directly (`api_url`, `api_key`, `secret_key`,
//! `zone`) or from a named profile in an ini file (`config`, `profile`).

pub mod error;

pub use error::*;

use cosmicflow_cloud::{BatchExecutor, PollConfig, RetryConfig};
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

pub const ENV_API_URL: &str = "COSMIC_API_URL";
pub const ENV_API_KEY: &str = "COSMIC_API_KEY";
pub const ENV_SECRET_KEY: &str = "COSMIC_SECRET_KEY";
pub const ENV_ZONE: &str = "COSMIC_ZONE";
pub const ENV_HTTP_GET_ONLY: &str = "COSMIC_HTTP_GET_ONLY";
pub const ENV_TIMEOUT: &str = "COSMIC_TIMEOUT";
pub const ENV_CONFIG: &str = "COSMIC_CONFIG";
pub const ENV_PROFILE: &str = "COSMIC_PROFILE";

/// Default async job timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 900;

/// Provider settings as supplied by the host, all optional
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProviderSettings {
    pub api_url: Option<String>,
    pub api_key: Option<String>,
    pub secret_key: Option<String>,
    pub zone: Option<String>,
    pub http_get_only: Option<bool>,
    /// Async job timeout in seconds
    pub timeout: Option<u64>,
    /// Path of an ini file holding credential profiles
    pub config: Option<String>,
    pub profile: Option<String>,
}

/// Resolved provider configuration
#[derive(Clone, PartialEq, Eq)]
pub struct ProviderConfig {
    pub api_url: String,
    pub api_key: String,
    pub secret_key: String,
    pub zone: String,
    pub http_get_only: bool,

    /// How long the client waits for an async job before giving up
    pub timeout: Duration,

    pub retry: RetryConfig,
    pub batch: BatchExecutor,

    /// Readiness polling of freshly registered templates
    pub template_poll: PollConfig,
}

impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_url", &self.api_url)
            .field("api_key", &self.api_key)
            .field("secret_key", &"<redacted>")
            .field("zone", &self.zone)
            .field("http_get_only", &self.http_get_only)
            .field("timeout", &self.timeout)
            .field("retry", &self.retry)
            .field("batch", &self.batch)
            .field("template_poll", &self.template_poll)
            .finish()
    }
}

impl ProviderConfig {
    /// Configuration with explicit credentials and default tuning
    pub fn new(
        api_url: impl Into<String>,
        api_key: impl Into<String>,
        secret_key: impl Into<String>,
        zone: impl Into<String>,
    ) -> Self {
        Self {
            api_url: api_url.into(),
            api_key: api_key.into(),
            secret_key: secret_key.into(),
            zone: zone.into(),
            http_get_only: false,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            retry: RetryConfig::default(),
            batch: BatchExecutor::default(),
            template_poll: PollConfig::default(),
        }
    }

    /// Resolve host settings, falling back to the process environment
    pub fn from_settings(settings: ProviderSettings) -> Result<Self> {
        resolve(settings, |name| std::env::var(name).ok())
    }

    /// Resolve from the process environment only
    pub fn from_env() -> Result<Self> {
        Self::from_settings(ProviderSettings::default())
    }
}

/// Resolve settings with `env` as the fallback source for unset values
pub fn resolve(settings: ProviderSettings, env: impl Fn(&str) -> Option<String>) -> Result<ProviderConfig> {
    let pick = |value: Option<String>, name: &str| value.or_else(|| env(name)).filter(|v| !v.is_empty());

    let api_url = pick(settings.api_url, ENV_API_URL);
    let api_key = pick(settings.api_key, ENV_API_KEY);
    let secret_key = pick(settings.secret_key, ENV_SECRET_KEY);
    let zone = pick(settings.zone, ENV_ZONE);
    let config = pick(settings.config, ENV_CONFIG);
    let profile = pick(settings.profile, ENV_PROFILE);

    let http_get_only = match settings.http_get_only {
        Some(v) => v,
        None => match env(ENV_HTTP_GET_ONLY).filter(|v| !v.is_empty()) {
            Some(v) => parse_bool(&v).ok_or(ConfigError::InvalidValue {
                name: ENV_HTTP_GET_ONLY,
                value: v,
            })?,
            None => false,
        },
    };

    let timeout = match settings.timeout {
        Some(v) => v,
        None => match env(ENV_TIMEOUT).filter(|v| !v.is_empty()) {
            Some(v) => v
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidValue { name: ENV_TIMEOUT, value: v })?,
            None => DEFAULT_TIMEOUT_SECS,
        },
    };

    let direct = [
        ("api_url", &api_url),
        ("api_key", &api_key),
        ("secret_key", &secret_key),
        ("zone", &zone),
    ];
    let any_direct = direct.iter().any(|(_, v)| v.is_some());
    let any_profile = config.is_some() || profile.is_some();

    let credentials = if any_direct {
        if any_profile {
            let name = direct
                .iter()
                .find(|(_, v)| v.is_some())
                .map_or("api_url", |(name, _)| *name);
            return Err(ConfigError::Conflict(name.to_string()));
        }
        match (api_url, api_key, secret_key, zone) {
            (Some(url), Some(key), Some(secret), Some(zone)) => Credentials {
                api_url: url,
                api_key: key,
                secret_key: secret,
                zone,
            },
            _ => return Err(ConfigError::IncompleteCredentials),
        }
    } else if any_profile {
        match (config, profile) {
            (Some(config), Some(profile)) => read_profile(&config, &profile)?,
            _ => return Err(ConfigError::IncompleteProfile),
        }
    } else {
        return Err(ConfigError::MissingCredentials);
    };

    tracing::debug!(
        api_url = %credentials.api_url,
        zone = %credentials.zone,
        http_get_only,
        timeout,
        "provider configured"
    );

    Ok(ProviderConfig {
        http_get_only,
        timeout: Duration::from_secs(timeout),
        ..ProviderConfig::new(
            credentials.api_url,
            credentials.api_key,
            credentials.secret_key,
            credentials.zone,
        )
    })
}

/// Credentials read from a profile
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub api_url: String,
    pub api_key: String,
    pub secret_key: String,
    pub zone: String,
}

/// Read the `url`, `apikey`, `secretkey` and `zone` keys of `profile` from
/// the ini file at `path`
pub fn read_profile(path: &str, profile: &str) -> Result<Credentials> {
    let path = expand_home(path)?;
    let path_str = path.to_string_lossy().to_string();

    let settings = config::Config::builder()
        .add_source(config::File::new(&path_str, config::FileFormat::Ini))
        .build()?;

    // Section names are lowercased by some versions of the ini source
    let section: HashMap<String, config::Value> = settings
        .get_table(profile)
        .or_else(|_| settings.get_table(&profile.to_lowercase()))
        .map_err(|_| ConfigError::ProfileNotFound {
            profile: profile.to_string(),
            path: path_str.clone(),
        })?;

    let value = |key: &'static str| -> Result<String> {
        section
            .get(key)
            .and_then(|v| v.clone().into_string().ok())
            .filter(|v| !v.is_empty())
            .ok_or(ConfigError::MissingProfileValue(key))
    };

    tracing::debug!(path = %path_str, profile, "reading credentials from profile");

    Ok(Credentials {
        api_url: value("url")?,
        api_key: value("apikey")?,
        secret_key: value("secretkey")?,
        zone: value("zone")?,
    })
}

/// Expand a leading `~` to the home directory
pub fn expand_home(path: &str) -> Result<PathBuf> {
    if path == "~" {
        return dirs::home_dir().ok_or(ConfigError::HomeDirNotFound);
    }
    match path.strip_prefix("~/") {
        Some(rest) => Ok(dirs::home_dir().ok_or(ConfigError::HomeDirNotFound)?.join(rest)),
        None => Ok(PathBuf::from(path)),
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim() {
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Some(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" => Some(false),
        _ => None,
    }
}
