//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All variables are optional.
//!
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `STOREFRONT_CATALOG_PATH` - Product catalog JSON (default: crates/storefront/content/catalog.json)
//! - `STOREFRONT_STATIC_DIR` - Static asset directory (default: crates/storefront/static)
//! - `ORDER_WEBHOOK_URL` - Endpoint receiving order JSON. Orders are only logged when unset.
//! - `ORDER_WEBHOOK_MODE` - `opaque` (default) or `acknowledged`
//! - `ORDER_WEBHOOK_TIMEOUT_SECS` - Request timeout (default: 10)
//! - `CHECKOUT_CLEAR_ON_UNKNOWN` - Clear the cart when delivery cannot be confirmed (default: true)
//! - `WIDGET_IDLE_MINUTES` - Drop a page's cart after this long without activity (default: 30)
//! - `WIDGET_MAX_ACTIVE` - Maximum number of live carts (default: 10000)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use bazaar_core::CheckoutPolicy;
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use url::Url;

/// Blocklist of placeholder patterns (case-insensitive) left in copied
/// deployment snippets, e.g. `YOUR_WEB_APP_URL_HERE`.
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your_",
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "xxx",
    "todo",
    "insert",
    "paste",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Product catalog file
    pub catalog_path: PathBuf,
    /// Directory served under `/static`
    pub static_dir: PathBuf,
    /// Order webhook, if configured
    pub webhook: Option<WebhookConfig>,
    /// What to do with the cart after an unconfirmed submission
    pub checkout_policy: CheckoutPolicy,
    /// Live cart limits
    pub widgets: WidgetStoreConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
}

/// How the order webhook reports results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WebhookMode {
    /// The receiver's response is not trusted; a completed request means
    /// "sent, verdict unknown".
    #[default]
    Opaque,
    /// The receiver answers 2xx for accepted orders.
    Acknowledged,
}

impl FromStr for WebhookMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "opaque" => Ok(Self::Opaque),
            "acknowledged" => Ok(Self::Acknowledged),
            other => Err(format!("expected `opaque` or `acknowledged`, got `{other}`")),
        }
    }
}

/// Order webhook configuration.
///
/// Implements `Debug` manually to redact the URL, which usually embeds a
/// deployment key.
#[derive(Clone)]
pub struct WebhookConfig {
    /// Endpoint receiving order JSON
    pub url: SecretString,
    /// Response handling
    pub mode: WebhookMode,
    /// Request timeout
    pub timeout: Duration,
}

impl std::fmt::Debug for WebhookConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookConfig")
            .field("url", &"[REDACTED]")
            .field("mode", &self.mode)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Limits for the in-memory cart store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WidgetStoreConfig {
    /// Carts untouched for this long are dropped.
    pub idle_timeout: Duration,
    /// Maximum number of carts kept at once.
    pub max_active: u64,
}

impl Default for WidgetStoreConfig {
    fn default() -> Self {
        Self {
            idle_timeout: Duration::from_secs(30 * 60),
            max_active: 10_000,
        }
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but invalid.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let env = Env(&lookup);

        let host = env.parse_or("STOREFRONT_HOST", "127.0.0.1".parse::<IpAddr>().ok())?;
        let port = env.parse_or("STOREFRONT_PORT", Some(3000_u16))?;
        let catalog_path = env
            .get("STOREFRONT_CATALOG_PATH")
            .map_or_else(|| PathBuf::from("crates/storefront/content/catalog.json"), PathBuf::from);
        let static_dir = env
            .get("STOREFRONT_STATIC_DIR")
            .map_or_else(|| PathBuf::from("crates/storefront/static"), PathBuf::from);

        let webhook = match env.get("ORDER_WEBHOOK_URL") {
            Some(url) => Some(WebhookConfig {
                url: validate_webhook_url(&url, "ORDER_WEBHOOK_URL")?,
                mode: env.parse_or("ORDER_WEBHOOK_MODE", Some(WebhookMode::Opaque))?,
                timeout: Duration::from_secs(env.parse_or("ORDER_WEBHOOK_TIMEOUT_SECS", Some(10_u64))?),
            }),
            None => None,
        };

        let clear_on_unknown = env
            .get("CHECKOUT_CLEAR_ON_UNKNOWN")
            .map(|value| parse_bool(&value, "CHECKOUT_CLEAR_ON_UNKNOWN"))
            .transpose()?
            .unwrap_or(true);

        let idle_minutes: u64 = env.parse_or("WIDGET_IDLE_MINUTES", Some(30))?;
        let widgets = WidgetStoreConfig {
            idle_timeout: Duration::from_secs(idle_minutes.saturating_mul(60)),
            max_active: env.parse_or("WIDGET_MAX_ACTIVE", Some(10_000))?,
        };

        Ok(Self {
            host,
            port,
            catalog_path,
            static_dir,
            webhook,
            checkout_policy: CheckoutPolicy { clear_on_unknown },
            widgets,
            sentry_dsn: env.get("SENTRY_DSN"),
            sentry_environment: env.get("SENTRY_ENVIRONMENT"),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Environment lookup that treats blank values as unset.
struct Env<'a, F: Fn(&str) -> Option<String>>(&'a F);

impl<F: Fn(&str) -> Option<String>> Env<'_, F> {
    fn get(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|value| !value.trim().is_empty())
    }

    /// Parse a variable, falling back to `default` when unset.
    fn parse_or<T>(&self, key: &str, default: Option<T>) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match self.get(key) {
            Some(value) => value
                .trim()
                .parse::<T>()
                .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string())),
            None => default.ok_or_else(|| ConfigError::MissingEnvVar(key.to_string())),
        }
    }
}

fn parse_bool(value: &str, key: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("expected a boolean, got `{other}`"),
        )),
    }
}

/// Validate the webhook URL: parseable, not a placeholder, and https unless
/// it points at this machine.
fn validate_webhook_url(value: &str, var_name: &str) -> Result<SecretString, ConfigError> {
    let lower = value.to_lowercase();
    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InvalidEnvVar(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let url = Url::parse(value.trim())
        .map_err(|e| ConfigError::InvalidEnvVar(var_name.to_string(), e.to_string()))?;

    let is_local = matches!(
        url.host_str(),
        Some("localhost" | "127.0.0.1" | "[::1]")
    );
    match url.scheme() {
        "https" => {}
        "http" if is_local => {}
        scheme => {
            return Err(ConfigError::InvalidEnvVar(
                var_name.to_string(),
                format!("scheme `{scheme}` not allowed; use https"),
            ));
        }
    }

    Ok(SecretString::from(url.to_string()))
}

/// Expose the webhook URL for sending. Kept here so the secret is only
/// unwrapped in one place.
#[must_use]
pub fn webhook_url(config: &WebhookConfig) -> &str {
    config.url.expose_secret()
}
