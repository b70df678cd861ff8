use std::io::Write;
use std::sync::Arc;

use anyhow::{Context, Result};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::Client;
use serde_json::Value;
use tracing::info;

use crate::auth::NationBuilderAuthenticator;
use crate::config::settings::TapSettings;
use crate::config::store::{ConfigAccess, ConfigStore};
use crate::singer::state::final_state;
use crate::singer::{Catalog, CatalogEntry, Message, MessageWriter};
use crate::streams::{discover_streams, StreamKind};

/// One tap run: one authenticator and the streams sharing it.
pub struct Tap {
    authenticator: Arc<NationBuilderAuthenticator>,
    streams: Vec<StreamKind>,
}

impl Tap {
    pub fn new(store: Arc<ConfigStore>) -> Result<Self> {
        let settings = store.settings()?;
        let client = build_client(&settings)?;

        let config: Arc<dyn ConfigAccess> = store;
        let authenticator = Arc::new(NationBuilderAuthenticator::new(config, client.clone())?);
        let streams = discover_streams(&authenticator, &client, &settings);

        Ok(Self { authenticator, streams })
    }

    #[cfg(test)]
    pub(crate) fn authenticator(&self) -> &Arc<NationBuilderAuthenticator> {
        &self.authenticator
    }

    /// Discover every stream's schema and describe them as a catalog.
    pub async fn discover(&mut self) -> Result<Catalog> {
        let mut catalog = Catalog::default();
        for stream in self.streams.iter_mut() {
            let schema = stream.discover().await?.clone();
            catalog
                .streams
                .push(CatalogEntry::discovered(stream.name(), schema, stream.primary_keys()));
        }
        Ok(catalog)
    }

    /// Sync selected streams in order and emit the final state.
    ///
    /// Without a catalog every stream is synced with a discovered schema;
    /// with one, only selected entries are synced using the catalog schema.
    pub async fn sync<W: Write>(
        &mut self,
        catalog: Option<&Catalog>,
        state: Option<Value>,
        writer: &mut MessageWriter<W>,
    ) -> Result<Value> {
        let mut synced = Vec::new();

        for stream in self.streams.iter_mut() {
            let name = stream.name().to_owned();

            if let Some(catalog) = catalog {
                match catalog.entry(&name) {
                    Some(entry) if entry.is_selected() => stream.use_schema(entry.schema.clone()),
                    _ => {
                        info!(stream = %name, "stream not selected, skipping");
                        continue;
                    }
                }
            }

            let schema = stream.discover().await?.clone();
            writer.write(&Message::schema(&name, schema, stream.primary_keys()))?;

            info!(stream = %name, "sync started");
            let count = stream
                .sync_records(|record| writer.write(&Message::record(&name, record)))
                .await
                .with_context(|| format!("sync of stream '{}' failed", name))?;
            info!(stream = %name, records = count, "sync finished");

            synced.push(name);
        }

        let state = final_state(state, &synced);
        writer.write(&Message::state(state.clone()))?;
        writer.flush()?;
        Ok(state)
    }
}

fn build_client(settings: &TapSettings) -> Result<Client> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

    Client::builder()
        .user_agent(settings.user_agent())
        .default_headers(headers)
        .build()
        .context("failed to build HTTP client")
}
