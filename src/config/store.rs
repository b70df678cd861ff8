use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use anyhow::{anyhow, Context, Result};
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::config::settings::TapSettings;
use crate::utils::constants::{ACCESS_TOKEN_KEY, EXPIRES_IN_KEY, REFRESH_TOKEN_KEY};

/// Credentials issued by a successful refresh, written back to the config.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RotatedCredentials {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: Option<u64>,
}

/// What the authenticator needs from whoever owns the config.
pub trait ConfigAccess: Send + Sync {
    /// Current in-memory config object.
    fn snapshot(&self) -> Map<String, Value>;

    /// Overwrite the rotated keys and write the whole config to disk.
    /// On error neither the file nor the in-memory snapshot change.
    fn persist_credentials(&self, credentials: &RotatedCredentials) -> Result<()>;
}

/// JSON config file mirrored in memory. Single writer per process.
#[derive(Debug)]
pub struct ConfigStore {
    path: PathBuf,
    snapshot: RwLock<Map<String, Value>>,
}

impl ConfigStore {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file '{}'", path.display()))?;
        let value: Value = serde_json::from_str(&content)
            .with_context(|| format!("config file '{}' is not valid JSON", path.display()))?;
        let Value::Object(snapshot) = value else {
            return Err(anyhow!("config file '{}' must contain a JSON object", path.display()));
        };

        debug!("config loaded from {}", path.display());
        Ok(Self::new(path.to_path_buf(), snapshot))
    }

    pub fn new(path: PathBuf, snapshot: Map<String, Value>) -> Self {
        Self { path, snapshot: RwLock::new(snapshot) }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn settings(&self) -> Result<TapSettings> {
        TapSettings::from_snapshot(&self.snapshot())
            .with_context(|| format!("invalid tap config in '{}'", self.path.display()))
    }
}

impl ConfigAccess for ConfigStore {
    fn snapshot(&self) -> Map<String, Value> {
        match self.snapshot.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn persist_credentials(&self, credentials: &RotatedCredentials) -> Result<()> {
        let mut guard = self
            .snapshot
            .write()
            .map_err(|_| anyhow!("config snapshot lock poisoned"))?;

        let mut updated = guard.clone();
        updated.insert(ACCESS_TOKEN_KEY.to_owned(), Value::String(credentials.access_token.clone()));
        updated.insert(REFRESH_TOKEN_KEY.to_owned(), Value::String(credentials.refresh_token.clone()));
        updated.insert(
            EXPIRES_IN_KEY.to_owned(),
            credentials.expires_in.map(Value::from).unwrap_or(Value::Null),
        );

        write_config_atomic(&self.path, &updated)?;
        *guard = updated;
        info!("rotated credentials written to {}", self.path.display());
        Ok(())
    }
}

/// Serialize with a 4-space indent.
pub fn to_config_json(config: &Map<String, Value>) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    let formatter = PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    config.serialize(&mut serializer)?;
    Ok(buf)
}

/// tmp -> rename, so a crash never leaves a half-written config behind.
fn write_config_atomic(path: &Path, config: &Map<String, Value>) -> Result<()> {
    let content = to_config_json(config)?;
    let tmp = path.with_extension("tmp");

    fs::write(&tmp, &content)
        .with_context(|| format!("failed to write temp config '{}'", tmp.display()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(&tmp, fs::Permissions::from_mode(0o600))?;
    }

    fs::rename(&tmp, path).with_context(|| {
        format!("failed to replace config '{}' with '{}'", path.display(), tmp.display())
    })?;
    Ok(())
}
