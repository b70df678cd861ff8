use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::auth::token_context::TokenContext;
use crate::config::settings::TapSettings;
use crate::config::store::{ConfigAccess, RotatedCredentials};
use crate::helpers::time::{now_i64, now_utc};
use crate::utils::constants::TOKEN_REQUEST_TIMEOUT_SECS;

static GRANT_TYPE_REFRESH_TOKEN: &str = "refresh_token";

/// Form body of the refresh-token grant.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct OAuthRequestBody {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    pub refresh_token: String,
    pub grant_type: &'static str,
}

/// Fields taken from a successful token response. Only `access_token` is
/// required; anything else malformed is treated as absent so a rotated
/// refresh token is never dropped.
#[derive(Debug, PartialEq, Eq)]
struct TokenResponse {
    access_token: String,
    refresh_token: Option<String>,
    expires_in: Option<u64>,
}

impl TokenResponse {
    fn parse(text: &str) -> Result<Self> {
        let json: Value =
            serde_json::from_str(text).map_err(|err| anyhow!("OAuth token response is not valid JSON: {}", err))?;

        let access_token = json
            .get("access_token")
            .and_then(Value::as_str)
            .filter(|token| !token.is_empty())
            .ok_or_else(|| anyhow!("OAuth token response has no access_token"))?
            .to_owned();
        let refresh_token = json
            .get("refresh_token")
            .and_then(Value::as_str)
            .filter(|token| !token.is_empty())
            .map(str::to_owned);

        let expires_in = match json.get("expires_in") {
            None | Some(Value::Null) => None,
            Some(raw) => {
                let parsed = parse_expires_in(raw);
                if parsed.is_none() {
                    debug!("ignoring unusable expires_in in OAuth response: {}", raw);
                }
                parsed
            }
        };

        Ok(Self { access_token, refresh_token, expires_in })
    }
}

/// Seconds from an integer, an integral float or a numeric string.
fn parse_expires_in(raw: &Value) -> Option<u64> {
    match raw {
        Value::Number(n) => n.as_u64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && *f >= 0.0 && *f <= u64::MAX as f64)
                .map(|f| f as u64)
        }),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<u64>().ok().or_else(|| s.parse::<f64>().ok().and_then(|f| parse_expires_in(&Value::from(f))))
        }
        _ => None,
    }
}

/// OAuth2 refresh-token authenticator shared by every stream of a run.
///
/// Every refresh rotates the refresh token at NationBuilder, so the new
/// credentials are written to the config file before `refresh` returns.
pub struct NationBuilderAuthenticator {
    config: Arc<dyn ConfigAccess>,
    client: Client,
    auth_endpoint: String,
    default_expiration: Option<u64>,
    safety_margin_seconds: u64,
    // also serializes refreshes
    token: Mutex<TokenContext>,
}

impl NationBuilderAuthenticator {
    pub fn new(config: Arc<dyn ConfigAccess>, client: Client) -> Result<Self> {
        let settings = TapSettings::from_snapshot(&config.snapshot())
            .context("invalid OAuth settings in config")?;

        Ok(Self {
            auth_endpoint: settings.auth_endpoint(),
            default_expiration: settings.default_expiration,
            safety_margin_seconds: settings.safety_margin_seconds(),
            token: Mutex::new(TokenContext::new(settings.access_token, settings.expires_in)),
            config,
            client,
        })
    }

    #[cfg(test)]
    pub(crate) fn auth_endpoint(&self) -> &str {
        &self.auth_endpoint
    }

    /// Refresh-token grant payload built from the current config snapshot.
    pub fn build_request_body(&self) -> Result<OAuthRequestBody> {
        let settings = TapSettings::from_snapshot(&self.config.snapshot())
            .context("invalid OAuth settings in config")?;

        Ok(OAuthRequestBody {
            client_id: settings.client_id,
            client_secret: settings.client_secret,
            redirect_uri: settings.redirect_uri,
            refresh_token: settings.refresh_token,
            grant_type: GRANT_TYPE_REFRESH_TOKEN,
        })
    }

    pub async fn is_token_valid(&self) -> bool {
        self.token.lock().await.is_valid_at(now_i64(), self.safety_margin_seconds)
    }

    #[cfg(test)]
    pub(crate) async fn token_context(&self) -> TokenContext {
        self.token.lock().await.clone()
    }

    /// Exchange the refresh token for a new access token and persist the result.
    pub async fn refresh(&self) -> Result<()> {
        let mut token = self.token.lock().await;
        self.refresh_locked(&mut token).await
    }

    /// `Authorization` header for API requests, refreshing first when needed.
    pub async fn auth_headers(&self) -> Result<HeaderMap> {
        let mut token = self.token.lock().await;
        if !token.is_valid_at(now_i64(), self.safety_margin_seconds) {
            debug!("access token missing or expired, refreshing");
            self.refresh_locked(&mut token).await?;
        }

        let access_token = token
            .access_token
            .as_deref()
            .ok_or_else(|| anyhow!("no access token available after refresh"))?;
        let mut value = HeaderValue::from_str(&format!("Bearer {}", access_token))
            .context("access token is not a valid header value")?;
        value.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, value);
        Ok(headers)
    }

    async fn refresh_locked(&self, token: &mut TokenContext) -> Result<()> {
        let body = self.build_request_body()?;
        let request_time = now_utc();

        let response = self
            .client
            .post(&self.auth_endpoint)
            .timeout(Duration::from_secs(TOKEN_REQUEST_TIMEOUT_SECS))
            .form(&body)
            .send()
            .await
            .with_context(|| format!("OAuth token request to {} failed", self.auth_endpoint))?;

        let status = response.status();
        let text = response.text().await.context("failed to read OAuth token response")?;
        if !status.is_success() {
            return Err(anyhow!("Failed OAuth login, response was '{}'. HTTP {}", text, status));
        }

        let token_response = TokenResponse::parse(&text)?;
        info!("OAuth authorization attempt was successful");

        let refresh_token = match token_response.refresh_token {
            Some(rotated) => rotated,
            None => {
                info!("OAuth response has no refresh_token, keeping the current one");
                body.refresh_token
            }
        };

        let expires_in = token_response.expires_in.or(self.default_expiration);
        if expires_in.is_none() {
            debug!("no expires_in in OAuth response and no default_expiration set, token treated as never expiring");
        }

        let rotated = RotatedCredentials {
            access_token: token_response.access_token,
            refresh_token,
            expires_in,
        };
        self.config.persist_credentials(&rotated)?;

        token.access_token = Some(rotated.access_token);
        token.expires_in = rotated.expires_in;
        token.last_refreshed = Some(request_time);
        Ok(())
    }
}
