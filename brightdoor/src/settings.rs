//! Persisted integration settings and the save/disconnect flow around them.
//!
//! Settings are a small JSON document owned by the host. Each sync receives a
//! read-only snapshot; only the settings flow writes them.
use crate::api::ContactApiClient;
use crate::credentials::CredentialContext;
use crate::gateway::HttpGateway;
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use tokio::sync::Mutex;
use url::Url;

pub const SETTINGS_UPDATED: &str = "Your settings has been updated!";
pub const SETTINGS_DISCARDED: &str = "Your settings have been discarded";

#[derive(thiserror::Error, Debug)]
pub enum SettingsError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("could not parse settings: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("settings lock poisoned")]
    Poisoned,
}

#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct IntegrationSettings {
    pub api_key: String,
    pub api_user: String,
    pub bdc_client: String,
    pub bdc_database: String,
    #[serde(deserialize_with = "lenient_status")]
    pub status: bool,
}

impl fmt::Debug for IntegrationSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IntegrationSettings")
            .field("api_key", &"<redacted>")
            .field("api_user", &self.api_user)
            .field("bdc_client", &self.bdc_client)
            .field("bdc_database", &self.bdc_database)
            .field("status", &self.status)
            .finish()
    }
}

// Older hosts stored the flag as "1"/"" rather than a JSON bool.
fn lenient_status<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Bool(b) => b,
        Value::Number(n) => n.as_u64().is_some_and(|n| n != 0),
        Value::String(s) => matches!(s.as_str(), "1" | "true"),
        _ => false,
    })
}

/// Credentials as submitted from the settings form.
#[derive(Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SettingsInput {
    pub api_key: String,
    pub api_user: String,
    pub bdc_client: String,
    pub bdc_database: String,
}

impl fmt::Debug for SettingsInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SettingsInput")
            .field("api_user", &self.api_user)
            .field("bdc_client", &self.bdc_client)
            .field("bdc_database", &self.bdc_database)
            .finish_non_exhaustive()
    }
}

pub trait SettingsStore: Send + Sync {
    fn load(&self) -> Result<IntegrationSettings, SettingsError>;
    fn store(&self, settings: &IntegrationSettings) -> Result<(), SettingsError>;
}

/// Settings kept as a JSON file. A missing file reads as empty settings.
pub struct FileSettingsStore {
    path: PathBuf,
}

impl FileSettingsStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        FileSettingsStore {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl SettingsStore for FileSettingsStore {
    fn load(&self) -> Result<IntegrationSettings, SettingsError> {
        match fs::read(&self.path) {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(IntegrationSettings::default()),
            Err(e) => Err(e.into()),
        }
    }

    fn store(&self, settings: &IntegrationSettings) -> Result<(), SettingsError> {
        let dir = match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        // Each write gets its own temp file, renamed over the target in one step.
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(&serde_json::to_vec_pretty(settings)?)?;
        tmp.persist(&self.path).map_err(|e| e.error)?;
        tracing::debug!(path = %self.path.display(), "Stored integration settings");
        Ok(())
    }
}

#[derive(Default)]
pub struct MemorySettingsStore {
    settings: RwLock<IntegrationSettings>,
}

impl MemorySettingsStore {
    pub fn new(settings: IntegrationSettings) -> Self {
        MemorySettingsStore {
            settings: RwLock::new(settings),
        }
    }
}

impl SettingsStore for MemorySettingsStore {
    fn load(&self) -> Result<IntegrationSettings, SettingsError> {
        Ok(self
            .settings
            .read()
            .map_err(|_| SettingsError::Poisoned)?
            .clone())
    }

    fn store(&self, settings: &IntegrationSettings) -> Result<(), SettingsError> {
        *self.settings.write().map_err(|_| SettingsError::Poisoned)? = settings.clone();
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    /// Credentials verified and stored with `status=true`.
    Updated,
    /// A required field was empty; stored settings were reset.
    Discarded,
    /// Credentials stored with `status=false` because they did not verify.
    Rejected(String),
}

impl SaveOutcome {
    pub fn status(&self) -> bool {
        matches!(self, SaveOutcome::Updated)
    }

    pub fn message(&self) -> &str {
        match self {
            SaveOutcome::Updated => SETTINGS_UPDATED,
            SaveOutcome::Discarded => SETTINGS_DISCARDED,
            SaveOutcome::Rejected(message) => message,
        }
    }
}

pub struct SettingsManager {
    store: Arc<dyn SettingsStore>,
    client: reqwest::Client,
    base_url: Url,
    // Serializes save and disconnect so one read-modify-write cannot interleave with another.
    write_lock: Mutex<()>,
}

impl SettingsManager {
    pub fn new(store: Arc<dyn SettingsStore>, base_url: Url) -> Self {
        SettingsManager {
            store,
            client: reqwest::Client::new(),
            base_url,
            write_lock: Mutex::new(()),
        }
    }

    pub fn snapshot(&self) -> Result<IntegrationSettings, SettingsError> {
        self.store.load()
    }

    pub fn is_configured(&self) -> Result<bool, SettingsError> {
        Ok(self.store.load()?.status)
    }

    /// Stores new credentials and marks them usable only if the auth test passes.
    pub async fn save(&self, input: SettingsInput) -> Result<SaveOutcome, SettingsError> {
        let _guard = self.write_lock.lock().await;
        let mut settings = IntegrationSettings {
            api_key: input.api_key.trim().to_string(),
            api_user: input.api_user.trim().to_string(),
            bdc_client: input.bdc_client.trim().to_string(),
            bdc_database: input.bdc_database.trim().to_string(),
            status: false,
        };

        if settings.api_key.is_empty() || settings.api_user.is_empty() || settings.bdc_client.is_empty()
        {
            self.store.store(&IntegrationSettings::default())?;
            tracing::info!("BrightDoor settings discarded");
            return Ok(SaveOutcome::Discarded);
        }

        self.store.store(&settings)?;

        let credentials = match CredentialContext::from_settings(&settings) {
            Ok(credentials) => credentials,
            Err(e) => return Ok(SaveOutcome::Rejected(e.to_string())),
        };
        let api = ContactApiClient::new(HttpGateway::with_client(
            self.client.clone(),
            self.base_url.clone(),
            credentials,
        ));

        match api.auth_test().await {
            Ok(_) => {
                settings.status = true;
                self.store.store(&settings)?;
                tracing::info!(api_user = %settings.api_user, "BrightDoor settings verified");
                Ok(SaveOutcome::Updated)
            }
            Err(e) => {
                tracing::info!(error = %e, "BrightDoor settings could not be verified");
                Ok(SaveOutcome::Rejected(e.to_string()))
            }
        }
    }

    /// Forgets the API key and marks the integration unconfigured.
    pub async fn disconnect(&self) -> Result<IntegrationSettings, SettingsError> {
        let _guard = self.write_lock.lock().await;
        let mut settings = self.store.load()?;
        settings.api_key.clear();
        settings.status = false;
        self.store.store(&settings)?;
        tracing::info!("BrightDoor disconnected");
        Ok(settings)
    }

    /// Custom field listing for the admin mapping UI; empty when not connected.
    pub async fn custom_fields(&self) -> Result<IndexMap<String, String>, SettingsError> {
        let settings = self.store.load()?;
        let Ok(credentials) = CredentialContext::from_settings(&settings) else {
            return Ok(IndexMap::new());
        };
        let api = ContactApiClient::new(HttpGateway::with_client(
            self.client.clone(),
            self.base_url.clone(),
            credentials,
        ));
        Ok(api.get_custom_fields().await)
    }
}
