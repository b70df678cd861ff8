use serde::Deserialize;
use serde_json::{Map, Value};

use crate::utils::constants::{
    DEFAULT_PAGE_SIZE, DEFAULT_SAFETY_MARGIN_SECS, DEFAULT_SLUG, NATIONBUILDER_DOMAIN,
};

/// ================================
/// Typed view over the tap config file
/// ================================
///
/// The raw JSON object stays the source of truth (it is written back on every
/// token refresh); this struct is re-derived from it whenever a typed value is
/// needed.
#[derive(Debug, Deserialize, Clone)]
pub struct TapSettings {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    pub refresh_token: String,
    pub access_token: Option<String>,
    pub expires_in: Option<u64>,

    /// nation slug, e.g. `hotglue` for hotglue.nationbuilder.com
    pub slug: Option<String>,
    pub api_url: Option<String>,
    pub auth_endpoint: Option<String>,
    /// used when the token response has no `expires_in`
    pub default_expiration: Option<u64>,
    pub safety_margin_seconds: Option<u64>,
    pub page_size: Option<u32>,
    /// accepted for compatibility; contacts have no replication key
    pub start_date: Option<String>,
    pub user_agent: Option<String>,
    pub logging: Option<LoggingConfig>,
}

impl TapSettings {
    pub fn from_snapshot(snapshot: &Map<String, Value>) -> serde_json::Result<Self> {
        serde_json::from_value(Value::Object(snapshot.clone()))
    }

    fn slug(&self) -> &str {
        self.slug.as_deref().unwrap_or(DEFAULT_SLUG)
    }

    pub fn api_url(&self) -> String {
        self.api_url
            .as_ref()
            .map(|url| url.trim_end_matches('/').to_owned())
            .unwrap_or_else(|| format!("https://{}.{}/api/v1", self.slug(), NATIONBUILDER_DOMAIN))
    }

    pub fn auth_endpoint(&self) -> String {
        self.auth_endpoint
            .clone()
            .unwrap_or_else(|| format!("https://{}.{}/oauth/token", self.slug(), NATIONBUILDER_DOMAIN))
    }

    pub fn safety_margin_seconds(&self) -> u64 {
        self.safety_margin_seconds.unwrap_or(DEFAULT_SAFETY_MARGIN_SECS)
    }

    pub fn page_size(&self) -> u32 {
        self.page_size.unwrap_or(DEFAULT_PAGE_SIZE)
    }

    pub fn user_agent(&self) -> String {
        self.user_agent
            .clone()
            .unwrap_or_else(|| format!("tap-nationbuilder/{}", env!("CARGO_PKG_VERSION")))
    }
}

/// ================================
/// Logging
/// ================================
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub level: String, // allowed: trace, debug, info, warn, error
    #[serde(default)]
    pub format: LogFormat,
}

impl LoggingConfig {
    pub fn new(level: String, format: LogFormat) -> Self {
        Self { level, format }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self::new("info".to_owned(), LogFormat::Compact)
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    #[default]
    Compact,
}
