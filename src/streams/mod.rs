use std::sync::Arc;

use anyhow::Result;
use reqwest::Client;
use serde_json::{Map, Value};

use crate::auth::NationBuilderAuthenticator;
use crate::config::settings::TapSettings;

pub mod contacts;
pub mod request;
pub mod schema;

use contacts::ContactsStream;

/// Every stream the tap exposes.
pub enum StreamKind {
    Contacts(ContactsStream),
}

impl StreamKind {
    pub fn name(&self) -> &str {
        match self {
            StreamKind::Contacts(s) => s.name(),
        }
    }

    pub fn primary_keys(&self) -> Vec<String> {
        match self {
            StreamKind::Contacts(s) => s.primary_keys(),
        }
    }

    pub fn schema(&self) -> Option<&Value> {
        match self {
            StreamKind::Contacts(s) => s.schema(),
        }
    }

    pub fn use_schema(&mut self, schema: Value) {
        match self {
            StreamKind::Contacts(s) => s.use_schema(schema),
        }
    }

    pub async fn discover(&mut self) -> Result<&Value> {
        match self {
            StreamKind::Contacts(s) => s.discover().await,
        }
    }

    pub async fn sync_records<F>(&self, emit: F) -> Result<u64>
    where
        F: FnMut(Map<String, Value>) -> Result<()>,
    {
        match self {
            StreamKind::Contacts(s) => s.sync_records(emit).await,
        }
    }
}

/// Build all streams around the one shared authenticator.
pub fn discover_streams(
    authenticator: &Arc<NationBuilderAuthenticator>,
    client: &Client,
    settings: &TapSettings,
) -> Vec<StreamKind> {
    vec![StreamKind::Contacts(ContactsStream::new(
        authenticator.clone(),
        client.clone(),
        settings.api_url(),
        settings.page_size(),
    ))]
}
