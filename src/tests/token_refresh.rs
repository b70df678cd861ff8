#[cfg(test)]
mod tests {
    use std::fs;

    use anyhow::Result;
    use httpmock::MockServer;
    use serde_json::{json, Value};

    use crate::config::store::ConfigAccess;
    use crate::tests::common::{
        base_config, load_authenticator, mock_token_failure, mock_token_success, read_config,
        write_config, INITIAL_REFRESH_TOKEN,
    };

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn refresh_persists_rotated_credentials() -> Result<()> {
        let server = MockServer::start_async().await;
        let token_mock = mock_token_success(
            &server,
            json!({
                "access_token": "access-1",
                "refresh_token": "refresh-1",
                "expires_in": 7200,
                "token_type": "bearer"
            }),
        )
        .await;

        let (_dir, path) = write_config(&base_config(&server))?;
        let (store, authenticator) = load_authenticator(&path)?;

        authenticator.refresh().await?;
        token_mock.assert_async().await;

        // file on disk is exactly the in-memory snapshot
        let on_disk = read_config(&path)?;
        assert_eq!(on_disk, store.snapshot());
        assert_eq!(on_disk["access_token"], "access-1");
        assert_eq!(on_disk["refresh_token"], "refresh-1");
        assert_eq!(on_disk["expires_in"], 7200);
        // untouched keys survive
        assert_eq!(on_disk["client_id"], "client-123");
        assert_eq!(on_disk["start_date"], "2020-01-01T00:00:00Z");

        let token = authenticator.token_context().await;
        assert_eq!(token.access_token.as_deref(), Some("access-1"));
        assert!(token.last_refreshed.is_some());
        assert!(authenticator.is_token_valid().await);

        // next grant uses the rotated refresh token
        assert_eq!(authenticator.build_request_body()?.refresh_token, "refresh-1");
        Ok(())
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn refresh_without_refresh_token_keeps_previous_one() -> Result<()> {
        let server = MockServer::start_async().await;
        mock_token_success(&server, json!({ "access_token": "access-1", "expires_in": 60 })).await;

        let (_dir, path) = write_config(&base_config(&server))?;
        let (store, authenticator) = load_authenticator(&path)?;

        authenticator.refresh().await?;

        let on_disk = read_config(&path)?;
        assert_eq!(on_disk, store.snapshot());
        assert_eq!(on_disk["refresh_token"], INITIAL_REFRESH_TOKEN);
        assert_eq!(on_disk["access_token"], "access-1");
        assert_eq!(on_disk["expires_in"], 60);
        Ok(())
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn rejected_refresh_is_fatal_and_writes_nothing() -> Result<()> {
        let server = MockServer::start_async().await;
        let body = r#"{"error":"invalid_grant"}"#;
        mock_token_failure(&server, 401, body).await;

        let (_dir, path) = write_config(&base_config(&server))?;
        let before = fs::read_to_string(&path)?;
        let (store, authenticator) = load_authenticator(&path)?;

        let err = authenticator.refresh().await.unwrap_err();
        let message = format!("{:#}", err);
        assert!(message.contains(body), "error should carry the response body: {}", message);
        assert!(message.contains("401"), "error should carry the status: {}", message);

        assert_eq!(fs::read_to_string(&path)?, before);
        assert_eq!(store.snapshot()["refresh_token"], INITIAL_REFRESH_TOKEN);
        assert!(!authenticator.is_token_valid().await);
        Ok(())
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn response_without_access_token_is_fatal() -> Result<()> {
        let server = MockServer::start_async().await;
        mock_token_success(&server, json!({ "refresh_token": "refresh-1" })).await;

        let (_dir, path) = write_config(&base_config(&server))?;
        let before = fs::read_to_string(&path)?;
        let (_store, authenticator) = load_authenticator(&path)?;

        assert!(authenticator.refresh().await.is_err());
        assert_eq!(fs::read_to_string(&path)?, before);
        Ok(())
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn missing_expires_in_falls_back_to_default_expiration() -> Result<()> {
        let server = MockServer::start_async().await;
        mock_token_success(&server, json!({ "access_token": "access-1", "refresh_token": "refresh-1" })).await;

        let mut config = base_config(&server);
        config["default_expiration"] = json!(3600);
        let (_dir, path) = write_config(&config)?;
        let (_store, authenticator) = load_authenticator(&path)?;

        authenticator.refresh().await?;

        assert_eq!(read_config(&path)?["expires_in"], 3600);
        assert_eq!(authenticator.token_context().await.expires_in, Some(3600));
        Ok(())
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn missing_expires_in_without_default_never_expires() -> Result<()> {
        let server = MockServer::start_async().await;
        mock_token_success(&server, json!({ "access_token": "access-1", "refresh_token": "refresh-1" })).await;

        let (_dir, path) = write_config(&base_config(&server))?;
        let (_store, authenticator) = load_authenticator(&path)?;

        authenticator.refresh().await?;

        assert_eq!(read_config(&path)?["expires_in"], Value::Null);
        assert_eq!(authenticator.token_context().await.expires_in, None);
        assert!(authenticator.is_token_valid().await);
        Ok(())
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn auth_headers_refresh_only_when_needed() -> Result<()> {
        let server = MockServer::start_async().await;
        let token_mock = mock_token_success(
            &server,
            json!({ "access_token": "access-1", "refresh_token": "refresh-1", "expires_in": 7200 }),
        )
        .await;

        let (_dir, path) = write_config(&base_config(&server))?;
        let (_store, authenticator) = load_authenticator(&path)?;

        let first = authenticator.auth_headers().await?;
        let second = authenticator.auth_headers().await?;

        assert_eq!(first["authorization"], "Bearer access-1");
        assert_eq!(second["authorization"], "Bearer access-1");
        assert_eq!(token_mock.hits_async().await, 1);
        Ok(())
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn short_lived_token_is_reused_for_half_its_lifetime() -> Result<()> {
        let server = MockServer::start_async().await;
        // lifetime shorter than the default 120s margin
        let token_mock = mock_token_success(
            &server,
            json!({ "access_token": "access-1", "refresh_token": "refresh-1", "expires_in": 60 }),
        )
        .await;

        let (_dir, path) = write_config(&base_config(&server))?;
        let (_store, authenticator) = load_authenticator(&path)?;

        authenticator.auth_headers().await?;
        authenticator.auth_headers().await?;

        assert_eq!(token_mock.hits_async().await, 1);
        Ok(())
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn zero_lifetime_token_is_refreshed_every_time() -> Result<()> {
        let server = MockServer::start_async().await;
        let token_mock = mock_token_success(
            &server,
            json!({ "access_token": "access-1", "refresh_token": "refresh-1", "expires_in": 0 }),
        )
        .await;

        let (_dir, path) = write_config(&base_config(&server))?;
        let (_store, authenticator) = load_authenticator(&path)?;

        authenticator.auth_headers().await?;
        authenticator.auth_headers().await?;

        assert_eq!(token_mock.hits_async().await, 2);
        Ok(())
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn string_expires_in_keeps_rotated_refresh_token() -> Result<()> {
        let server = MockServer::start_async().await;
        mock_token_success(
            &server,
            json!({ "access_token": "access-1", "refresh_token": "refresh-new", "expires_in": "86400" }),
        )
        .await;

        let (_dir, path) = write_config(&base_config(&server))?;
        let (_store, authenticator) = load_authenticator(&path)?;

        authenticator.refresh().await?;

        let on_disk = read_config(&path)?;
        assert_eq!(on_disk["refresh_token"], "refresh-new");
        assert_eq!(on_disk["expires_in"], 86400);
        assert_eq!(authenticator.token_context().await.expires_in, Some(86400));
        Ok(())
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn unusable_expires_in_falls_back_to_default_expiration() -> Result<()> {
        let server = MockServer::start_async().await;
        mock_token_success(
            &server,
            json!({ "access_token": "access-1", "refresh_token": "refresh-new", "expires_in": "soon" }),
        )
        .await;

        let mut config = base_config(&server);
        config["default_expiration"] = json!(3600);
        let (_dir, path) = write_config(&config)?;
        let (_store, authenticator) = load_authenticator(&path)?;

        authenticator.refresh().await?;

        let on_disk = read_config(&path)?;
        assert_eq!(on_disk["refresh_token"], "refresh-new");
        assert_eq!(on_disk["expires_in"], 3600);
        Ok(())
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn huge_expires_in_is_accepted() -> Result<()> {
        let server = MockServer::start_async().await;
        let token_mock = mock_token_success(
            &server,
            json!({ "access_token": "access-1", "refresh_token": "refresh-1", "expires_in": u64::MAX }),
        )
        .await;

        let (_dir, path) = write_config(&base_config(&server))?;
        let (_store, authenticator) = load_authenticator(&path)?;

        authenticator.auth_headers().await?;
        assert!(authenticator.is_token_valid().await);
        authenticator.auth_headers().await?;

        assert_eq!(token_mock.hits_async().await, 1);
        Ok(())
    }
}
