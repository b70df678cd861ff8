// tests/common/mod.rs
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use httpmock::Method::POST;
use httpmock::{Mock, MockServer};
use reqwest::Client;
use serde_json::{json, Value};
use tempfile::TempDir;

use crate::auth::NationBuilderAuthenticator;
use crate::config::store::{ConfigAccess, ConfigStore};

pub const TOKEN_PATH: &str = "/oauth/token";
pub const INITIAL_REFRESH_TOKEN: &str = "refresh-0";

/// Config pointing both endpoints at the mock server.
pub fn base_config(server: &MockServer) -> Value {
    json!({
        "client_id": "client-123",
        "client_secret": "secret-456",
        "redirect_uri": "https://example.com/callback",
        "refresh_token": INITIAL_REFRESH_TOKEN,
        "access_token": "stale-access",
        "expires_in": 7200,
        "api_url": server.url("/api/v1"),
        "auth_endpoint": server.url(TOKEN_PATH),
        "start_date": "2020-01-01T00:00:00Z"
    })
}

/// Write `config` as the tap config file in a fresh temp dir.
/// The TempDir must outlive the test.
pub fn write_config(config: &Value) -> Result<(TempDir, PathBuf)> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("config.json");
    fs::write(&path, serde_json::to_string_pretty(config)?)?;
    Ok((dir, path))
}

pub fn load_authenticator(path: &PathBuf) -> Result<(Arc<ConfigStore>, Arc<NationBuilderAuthenticator>)> {
    let store = Arc::new(ConfigStore::load(path)?);
    let config: Arc<dyn ConfigAccess> = store.clone();
    let authenticator = Arc::new(NationBuilderAuthenticator::new(config, Client::new())?);
    Ok((store, authenticator))
}

pub async fn mock_token_success<'a>(server: &'a MockServer, body: Value) -> Mock<'a> {
    server
        .mock_async(|when, then| {
            when.method(POST)
                .path(TOKEN_PATH)
                .header("content-type", "application/x-www-form-urlencoded");
            then.status(200)
                .header("Content-Type", "application/json")
                .json_body(body);
        })
        .await
}

pub async fn mock_token_failure<'a>(server: &'a MockServer, status: u16, body: &str) -> Mock<'a> {
    let body = body.to_owned();
    server
        .mock_async(|when, then| {
            when.method(POST).path(TOKEN_PATH);
            then.status(status)
                .header("Content-Type", "application/json")
                .body(body);
        })
        .await
}

pub fn read_config(path: &PathBuf) -> Result<serde_json::Map<String, Value>> {
    Ok(serde_json::from_str(&fs::read_to_string(path)?)?)
}
