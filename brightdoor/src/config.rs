use crate::gateway::DEFAULT_BASE_URL;
use serde::Deserialize;
use std::path::PathBuf;
use thiserror::Error;
use url::Url;

#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Port cannot be 0")]
    InvalidPort,

    #[error("Empty listener host")]
    EmptyHost,

    #[error("BrightDoor base URL must be http or https, got {0}")]
    UnsupportedScheme(String),

    #[error("Settings path cannot be empty")]
    EmptySettingsPath,
}

#[derive(Clone, Deserialize, Debug, PartialEq)]
pub struct Listener {
    pub host: String,
    pub port: u16,
}

impl Default for Listener {
    fn default() -> Self {
        Listener {
            host: "127.0.0.1".into(),
            port: 3000,
        }
    }
}

impl Listener {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.host.is_empty() {
            return Err(ValidationError::EmptyHost);
        }
        if self.port == 0 {
            return Err(ValidationError::InvalidPort);
        }
        Ok(())
    }
}

#[derive(Clone, Deserialize, Debug, PartialEq)]
pub struct BrightDoor {
    /// Root of the API. Requests go to `{base_url}/Contact/{action}`.
    #[serde(default = "default_base_url")]
    pub base_url: Url,
}

impl Default for BrightDoor {
    fn default() -> Self {
        BrightDoor {
            base_url: default_base_url(),
        }
    }
}

fn default_base_url() -> Url {
    Url::parse(DEFAULT_BASE_URL).unwrap_or_else(|_| unreachable!("default base URL is valid"))
}

#[derive(Clone, Deserialize, Debug, PartialEq)]
pub struct Settings {
    /// JSON file holding the integration credentials.
    pub path: PathBuf,
}

#[derive(Clone, Deserialize, Debug, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub listener: Listener,
    #[serde(default)]
    pub brightdoor: BrightDoor,
    pub settings: Settings,
}

impl Config {
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.listener.validate()?;

        let scheme = self.brightdoor.base_url.scheme();
        if scheme != "http" && scheme != "https" {
            return Err(ValidationError::UnsupportedScheme(scheme.to_string()));
        }

        if self.settings.path.as_os_str().is_empty() {
            return Err(ValidationError::EmptySettingsPath);
        }
        Ok(())
    }
}
