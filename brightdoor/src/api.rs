//! Typed calls against the BrightDoor `Contact` API.
//!
//! API documentation: <https://api.brightdoor.com/swagger/index.html>

use crate::errors::{BrightDoorError, Result};
use crate::gateway::{GatewayResponse, HttpGateway, RequestMethod};
use crate::types::{ContactId, LookupOutcome, SyncResult};
use async_trait::async_trait;
use http::StatusCode;
use indexmap::IndexMap;
use serde_json::{Map, Value, json};

const AUTH_TEST: &str = "GetPortalGreetings";
const GET_BY_EMAIL: &str = "GetContactByEmail";
const CREATE_OR_UPDATE: &str = "CreateOrUpdate";
const GET_BY_ID: &str = "GetContactById";

// Contact 1 exists in every BrightDoor database, so greetings for it are always readable.
const AUTH_TEST_CONTACT_ID: u64 = 1;
// The BrightDoor demo contact ("Mr & Mrs BrightDoor") carries every attribute definition.
const ATTRIBUTE_TEMPLATE_CONTACT_ID: u64 = 2;

/// Contact operations the sync pipeline depends on.
#[async_trait]
pub trait ContactApi: Send + Sync {
    async fn lookup_by_email(&self, email: &str) -> Result<LookupOutcome>;
    async fn sync_contact(&self, payload: &Value) -> Result<SyncResult>;
}

#[derive(Clone)]
pub struct ContactApiClient {
    gateway: HttpGateway,
}

impl ContactApiClient {
    pub fn new(gateway: HttpGateway) -> Self {
        ContactApiClient { gateway }
    }

    /// Checks the credentials against the API.
    ///
    /// Any status other than 200 means the credentials were refused. A 200 that
    /// is not JSON means the base URL does not point at the BrightDoor API.
    pub async fn auth_test(&self) -> Result<bool> {
        let response = self
            .call(
                RequestMethod::Get,
                AUTH_TEST,
                json!({ "ContactId": AUTH_TEST_CONTACT_ID }),
            )
            .await?;

        if !response.is_ok() {
            tracing::info!(status = %response.status, "BrightDoor rejected credentials");
            return Err(BrightDoorError::Auth("Invalid API Credentials.".to_string()));
        }
        if !response.is_json() {
            tracing::info!(
                content_type = response.content_type.as_deref().unwrap_or(""),
                "BrightDoor auth test returned a non-JSON response"
            );
            return Err(BrightDoorError::Auth("Invalid API URL.".to_string()));
        }
        Ok(true)
    }

    /// A missing contact is `NotFound`. Only statuses other than 200/404 are errors.
    pub async fn lookup_by_email(&self, email: &str) -> Result<LookupOutcome> {
        let response = self
            .call(RequestMethod::Get, GET_BY_EMAIL, json!({ "EmailAddress": email }))
            .await?;

        if !response.is_ok() && response.status != StatusCode::NOT_FOUND {
            return Err(rejection(&response));
        }

        let id = response
            .data()
            .and_then(|data| data.get("id"))
            .and_then(ContactId::from_value);

        Ok(match id {
            Some(id) => LookupOutcome::Found(id),
            None => LookupOutcome::NotFound,
        })
    }

    /// Creates or updates a contact; BrightDoor updates when the payload has an `Id`.
    pub async fn sync_contact(&self, payload: &Value) -> Result<SyncResult> {
        let response = self
            .call(
                RequestMethod::Post,
                CREATE_OR_UPDATE,
                json!({ "ContactDetails": payload }),
            )
            .await?;

        if !response.is_ok() {
            return Err(rejection(&response));
        }

        let id = response
            .data()
            .and_then(|data| data.get("id"))
            .and_then(ContactId::from_value);

        Ok(SyncResult {
            id,
            raw: response.body,
        })
    }

    /// Lists contact attribute definitions as `id -> label`.
    ///
    /// Reads the attributes of the BrightDoor template contact, which is the only
    /// listing the API offers. Any failure or unexpected shape yields an empty map.
    pub async fn get_custom_fields(&self) -> IndexMap<String, String> {
        let response = match self
            .call(
                RequestMethod::Get,
                GET_BY_ID,
                json!({ "id": ATTRIBUTE_TEMPLATE_CONTACT_ID }),
            )
            .await
        {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(error = %e, "Could not load BrightDoor custom fields");
                return IndexMap::new();
            }
        };

        let Some(attributes) = response
            .data()
            .and_then(|data| data.get("contactAttributes"))
            .and_then(Value::as_array)
        else {
            tracing::debug!(status = %response.status, "Unexpected custom field response shape");
            return IndexMap::new();
        };

        attributes
            .iter()
            .filter_map(|attribute| {
                let id = match attribute.get("contactAttributeDefId")? {
                    Value::String(s) => s.clone(),
                    Value::Number(n) => n.to_string(),
                    _ => return None,
                };
                let label = attribute.get("contactAttributeDefLbl")?.as_str()?;
                Some((id, label.to_string()))
            })
            .collect()
    }

    async fn call(
        &self,
        method: RequestMethod,
        action: &'static str,
        data: Value,
    ) -> Result<GatewayResponse> {
        let data = match data {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        self.gateway
            .request(method, action, data)
            .await?
            .ok_or(BrightDoorError::EmptyRequest(action))
    }
}

#[async_trait]
impl ContactApi for ContactApiClient {
    async fn lookup_by_email(&self, email: &str) -> Result<LookupOutcome> {
        ContactApiClient::lookup_by_email(self, email).await
    }

    async fn sync_contact(&self, payload: &Value) -> Result<SyncResult> {
        ContactApiClient::sync_contact(self, payload).await
    }
}

fn rejection(response: &GatewayResponse) -> BrightDoorError {
    let message = response
        .body
        .get("result_message")
        .and_then(Value::as_str)
        .filter(|m| !m.is_empty())
        .map(String::from)
        .unwrap_or_else(|| format!("BrightDoor responded with status {}", response.status));

    BrightDoorError::RemoteRejection {
        status: response.status,
        message,
    }
}
