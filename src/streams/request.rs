use anyhow::{anyhow, Context, Result};
use reqwest::header::HeaderMap;
use reqwest::{Client, Response, Url};
use serde_json::Value;
use tracing::debug;

/// GET `url` with `headers` and decode the JSON body of a 2xx response.
pub async fn get_json(client: &Client, url: Url, headers: HeaderMap) -> Result<Value> {
    debug!("GET {}", url.path());
    let response = client
        .get(url.clone())
        .headers(headers)
        .send()
        .await
        .with_context(|| format!("request to {} failed", url.path()))?;

    validate_response(&url, response).await
}

async fn validate_response(url: &Url, response: Response) -> Result<Value> {
    let status = response.status();
    let body = response
        .text()
        .await
        .with_context(|| format!("failed to read response body of {}", url.path()))?;

    if !status.is_success() {
        let kind = if status.is_client_error() { "Client" } else { "Server" };
        return Err(anyhow!(
            "{} {} Error: {} for path: {}, body: {}",
            status.as_u16(),
            kind,
            status.canonical_reason().unwrap_or("Unknown"),
            url.path(),
            body
        ));
    }

    serde_json::from_str(&body).with_context(|| format!("response of {} is not valid JSON", url.path()))
}
