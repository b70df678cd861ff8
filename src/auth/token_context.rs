use chrono::{DateTime, Utc};

/// In-memory access token state of the authenticator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenContext {
    pub access_token: Option<String>,
    /// token lifetime in seconds, `None` means it never expires
    pub expires_in: Option<u64>,
    /// set only by a refresh in this process
    pub last_refreshed: Option<DateTime<Utc>>,
}

impl TokenContext {
    pub fn new(access_token: Option<String>, expires_in: Option<u64>) -> Self {
        Self { access_token, expires_in, last_refreshed: None }
    }

    /// Check if token can still be used at `now` (unix seconds).
    ///
    /// The safety margin is capped at half the token lifetime so short-lived
    /// tokens are not refreshed on every request.
    pub fn is_valid_at(&self, now: i64, safety_margin_seconds: u64) -> bool {
        let Some(last_refreshed) = self.last_refreshed else {
            return false;
        };
        if self.access_token.is_none() {
            return false;
        }
        match self.expires_in {
            None => true,
            Some(expires_in) => {
                let margin = safety_margin_seconds.min(expires_in / 2);
                let lifetime = i64::try_from(expires_in - margin).unwrap_or(i64::MAX);
                now < last_refreshed.timestamp().saturating_add(lifetime)
            }
        }
    }
}
