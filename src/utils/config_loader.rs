use std::path::Path;
use anyhow::{anyhow, Result};

use crate::config::store::ConfigStore;

pub fn run(config_path: &Path) -> Result<ConfigStore> {
    let store = ConfigStore::load(config_path)?;
    // fail fast on missing credentials instead of at the first refresh
    store.settings().map_err(|e| anyhow!("Invalid config format: {:#}", e))?;
    Ok(store)
}
