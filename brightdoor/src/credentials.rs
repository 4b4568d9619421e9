use crate::errors::{BrightDoorError, Result};
use crate::settings::IntegrationSettings;
use serde::Serialize;
use std::fmt;

/// Static credentials attached to every BrightDoor request.
///
/// All four fields are guaranteed non-empty; construction fails otherwise.
#[derive(Clone, PartialEq, Eq)]
pub struct CredentialContext {
    api_user: String,
    api_key: String,
    client_id: String,
    database: String,
}

/// Wire form of the credentials, used both as query parameters and as the
/// `UserDetails` object of POST bodies.
#[derive(Serialize, Debug, PartialEq)]
pub struct AuthParams<'a> {
    #[serde(rename = "Username")]
    pub username: &'a str,
    #[serde(rename = "Password")]
    pub password: &'a str,
    #[serde(rename = "BDCClient")]
    pub client: &'a str,
    #[serde(rename = "BDCDatabase")]
    pub database: &'a str,
}

impl CredentialContext {
    pub fn new<U, K, C, D>(api_user: U, api_key: K, client_id: C, database: D) -> Result<Self>
    where
        U: Into<String>,
        K: Into<String>,
        C: Into<String>,
        D: Into<String>,
    {
        let credentials = CredentialContext {
            api_user: api_user.into(),
            api_key: api_key.into(),
            client_id: client_id.into(),
            database: database.into(),
        };
        credentials.validate()?;
        Ok(credentials)
    }

    pub fn from_settings(settings: &IntegrationSettings) -> Result<Self> {
        Self::new(
            settings.api_user.trim(),
            settings.api_key.trim(),
            settings.bdc_client.trim(),
            settings.bdc_database.trim(),
        )
    }

    fn validate(&self) -> Result<()> {
        let fields = [
            ("apiUser", &self.api_user),
            ("apiKey", &self.api_key),
            ("bdcClient", &self.client_id),
            ("bdcDatabase", &self.database),
        ];
        for (name, value) in fields {
            if value.is_empty() {
                return Err(BrightDoorError::InvalidCredentials(name));
            }
        }
        Ok(())
    }

    pub fn auth_params(&self) -> AuthParams<'_> {
        AuthParams {
            username: &self.api_user,
            password: &self.api_key,
            client: &self.client_id,
            database: &self.database,
        }
    }
}

// The password must never end up in logs.
impl fmt::Debug for CredentialContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialContext")
            .field("api_user", &self.api_user)
            .field("api_key", &"<redacted>")
            .field("client_id", &self.client_id)
            .field("database", &self.database)
            .finish()
    }
}
