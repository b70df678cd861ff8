use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use reqwest::{Client, Url};
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::auth::NationBuilderAuthenticator;
use crate::streams::request::get_json;
use crate::streams::schema::PropertiesList;

pub const CONTACTS_STREAM_NAME: &str = "Contacts";
const PATH: &str = "/people";
const PRIMARY_KEYS: [&str; 1] = ["id"];
/// record used as the schema sample
const SAMPLE_RECORD_ID: u64 = 1;
const SAMPLE_WRAPPER_KEY: &str = "person";
const RESULTS_KEY: &str = "results";
const NEXT_KEY: &str = "next";

/// NationBuilder people, exposed as the `Contacts` stream.
pub struct ContactsStream {
    authenticator: Arc<NationBuilderAuthenticator>,
    client: Client,
    url_base: String,
    page_size: u32,
    /// filled once by `discover` or `use_schema`, read-only afterwards
    schema: Option<Value>,
}

impl ContactsStream {
    pub fn new(
        authenticator: Arc<NationBuilderAuthenticator>,
        client: Client,
        url_base: String,
        page_size: u32,
    ) -> Self {
        Self { authenticator, client, url_base, page_size, schema: None }
    }

    pub fn name(&self) -> &str {
        CONTACTS_STREAM_NAME
    }

    pub fn path(&self) -> &str {
        PATH
    }

    pub fn primary_keys(&self) -> Vec<String> {
        PRIMARY_KEYS.iter().map(|k| k.to_string()).collect()
    }

    pub fn schema(&self) -> Option<&Value> {
        self.schema.as_ref()
    }

    /// Take the schema from a catalog instead of fetching a sample.
    pub fn use_schema(&mut self, schema: Value) {
        if self.schema.is_none() {
            self.schema = Some(schema);
        }
    }

    /// Populate the schema on first call; later calls return the cached one.
    pub async fn discover(&mut self) -> Result<&Value> {
        if self.schema.is_none() {
            let properties = self.discover_schema().await?;
            info!(stream = CONTACTS_STREAM_NAME, properties = properties.len(), "schema discovered");
            self.schema = Some(properties.to_json_schema());
        }
        self.schema
            .as_ref()
            .ok_or_else(|| anyhow!("schema of stream '{}' is not set", CONTACTS_STREAM_NAME))
    }

    /// Fetch the sample person and infer one property per field.
    pub async fn discover_schema(&self) -> Result<PropertiesList> {
        let url = self.url(&format!("{}/{}", self.path(), SAMPLE_RECORD_ID))?;
        let headers = self.authenticator.auth_headers().await?;
        let body = get_json(&self.client, url, headers)
            .await
            .context("schema discovery request failed")?;

        Ok(properties_from_sample(&body))
    }

    /// Page through `/people`, handing every record to `emit`.
    /// Returns the number of records emitted.
    pub async fn sync_records<F>(&self, mut emit: F) -> Result<u64>
    where
        F: FnMut(Map<String, Value>) -> Result<()>,
    {
        let mut count = 0u64;
        let mut next = Some(self.list_url()?);

        while let Some(url) = next.take() {
            let headers = self.authenticator.auth_headers().await?;
            let page = get_json(&self.client, url.clone(), headers).await?;

            for record in page.get(RESULTS_KEY).and_then(Value::as_array).into_iter().flatten() {
                match record {
                    Value::Object(record) => {
                        emit(record.clone())?;
                        count += 1;
                    }
                    other => warn!("skipping non-object record: {}", other),
                }
            }

            next = self.next_page_url(&page)?;
            if next.as_ref() == Some(&url) {
                return Err(anyhow!("pagination loop detected, next page is {}", url));
            }
            debug!(records = count, has_next = next.is_some(), "page processed");
        }

        Ok(count)
    }

    fn url(&self, path: &str) -> Result<Url> {
        let raw = format!("{}{}", self.url_base, path);
        Url::parse(&raw).with_context(|| format!("invalid API url '{}'", raw))
    }

    fn list_url(&self) -> Result<Url> {
        let mut url = self.url(self.path())?;
        url.query_pairs_mut().append_pair("limit", &self.page_size.to_string());
        Ok(url)
    }

    /// `next` is usually an absolute path such as `/api/v1/people?__nonce=..`
    fn next_page_url(&self, page: &Value) -> Result<Option<Url>> {
        match page.get(NEXT_KEY).and_then(Value::as_str) {
            Some(next) if !next.is_empty() => {
                let base = self.url(self.path())?;
                let url = base
                    .join(next)
                    .with_context(|| format!("invalid next page link '{}'", next))?;
                Ok(Some(url))
            }
            _ => Ok(None),
        }
    }
}

/// Properties of the `person` object in a sample response. A missing or
/// non-object `person` yields an empty list.
pub fn properties_from_sample(body: &Value) -> PropertiesList {
    match body.get(SAMPLE_WRAPPER_KEY) {
        Some(Value::Object(person)) => PropertiesList::from_sample(person),
        _ => PropertiesList::default(),
    }
}
