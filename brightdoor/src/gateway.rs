use crate::credentials::CredentialContext;
use crate::errors::Result;
use crate::metrics_defs::{REQUEST_DURATION, REQUEST_TRANSPORT_ERROR};
use http::StatusCode;
use http::header::CONTENT_TYPE;
use serde_json::{Map, Value};
use shared::{counter, histogram};
use std::time::Instant;
use url::Url;

pub const DEFAULT_BASE_URL: &str = "https://api.brightdoor.com/";

const CONTACT_PATH: &str = "Contact";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestMethod {
    Get,
    Post,
}

impl RequestMethod {
    pub const fn as_str(&self) -> &'static str {
        match self {
            RequestMethod::Get => "GET",
            RequestMethod::Post => "POST",
        }
    }
}

/// A response that made it back over the wire, whatever its status.
#[derive(Debug, Clone)]
pub struct GatewayResponse {
    pub status: StatusCode,
    pub content_type: Option<String>,
    /// Decoded JSON body, or `Value::Null` if the body was not JSON.
    pub body: Value,
    pub raw: String,
}

impl GatewayResponse {
    pub fn is_ok(&self) -> bool {
        self.status == StatusCode::OK
    }

    pub fn is_json(&self) -> bool {
        self.content_type
            .as_deref()
            .is_some_and(|ct| ct.to_ascii_lowercase().contains("application/json"))
    }

    /// The `data` object most BrightDoor responses wrap their payload in.
    pub fn data(&self) -> Option<&Map<String, Value>> {
        self.body.get("data").and_then(Value::as_object)
    }
}

/// Sends requests to the BrightDoor `Contact` API.
///
/// GET parameters (credentials included) go into the query string. POST data is
/// sent as a JSON body with the credentials nested under `UserDetails`.
#[derive(Clone)]
pub struct HttpGateway {
    client: reqwest::Client,
    base_url: Url,
    credentials: CredentialContext,
}

impl HttpGateway {
    pub fn new(base_url: Url, credentials: CredentialContext) -> Self {
        Self::with_client(reqwest::Client::new(), base_url, credentials)
    }

    /// Reuses an existing client so the connection pool is shared between syncs.
    pub fn with_client(client: reqwest::Client, base_url: Url, credentials: CredentialContext) -> Self {
        HttpGateway {
            client,
            base_url,
            credentials,
        }
    }

    pub fn endpoint(&self, action: &str) -> String {
        format!(
            "{}/{}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            CONTACT_PATH,
            action
        )
    }

    /// Returns `Ok(None)` without touching the network when `data` is empty.
    pub async fn request(
        &self,
        method: RequestMethod,
        action: &'static str,
        data: Map<String, Value>,
    ) -> Result<Option<GatewayResponse>> {
        if data.is_empty() {
            tracing::warn!(action, "Skipping BrightDoor request with empty data");
            return Ok(None);
        }

        let url = self.endpoint(action);
        let builder = match method {
            RequestMethod::Get => {
                let mut params = query_pairs(&serde_json::to_value(self.credentials.auth_params())?);
                // Call-specific data wins over credentials with the same name.
                for (key, value) in query_pairs(&Value::Object(data)) {
                    params.retain(|(existing, _)| existing != &key);
                    params.push((key, value));
                }
                self.client.get(&url).query(&params)
            }
            RequestMethod::Post => {
                let mut body = data;
                body.insert(
                    "UserDetails".to_string(),
                    serde_json::to_value(self.credentials.auth_params())?,
                );
                self.client
                    .post(&url)
                    .header(CONTENT_TYPE, "application/json")
                    .json(&body)
            }
        };

        tracing::debug!(action, method = method.as_str(), "Sending BrightDoor request");
        let started = Instant::now();
        let result = send(builder).await;
        histogram!(REQUEST_DURATION, "action" => action).record(started.elapsed().as_secs_f64());

        match result {
            Ok(response) => {
                tracing::debug!(action, status = %response.status, "BrightDoor responded");
                Ok(Some(response))
            }
            Err(e) => {
                counter!(REQUEST_TRANSPORT_ERROR, "action" => action).increment(1);
                tracing::warn!(action, error = %e, "BrightDoor request failed");
                Err(e.into())
            }
        }
    }
}

async fn send(builder: reqwest::RequestBuilder) -> std::result::Result<GatewayResponse, reqwest::Error> {
    let response = builder.send().await?;
    let status = response.status();
    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(String::from);
    let raw = response.text().await?;
    let body = serde_json::from_str(&raw).unwrap_or(Value::Null);

    Ok(GatewayResponse {
        status,
        content_type,
        body,
        raw,
    })
}

/// Flattens a JSON object into form-style query pairs. Nested values use
/// bracket notation (`a[b]=c`, `a[0]=c`), booleans become `1`/`0` and nulls
/// are dropped.
fn query_pairs(value: &Value) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    if let Value::Object(map) = value {
        for (key, value) in map {
            push_pairs(key.clone(), value, &mut pairs);
        }
    }
    pairs
}

fn push_pairs(prefix: String, value: &Value, pairs: &mut Vec<(String, String)>) {
    match value {
        Value::Null => {}
        Value::Bool(b) => pairs.push((prefix, if *b { "1" } else { "0" }.to_string())),
        Value::Number(n) => pairs.push((prefix, n.to_string())),
        Value::String(s) => pairs.push((prefix, s.clone())),
        Value::Array(items) => {
            for (i, item) in items.iter().enumerate() {
                push_pairs(format!("{prefix}[{i}]"), item, pairs);
            }
        }
        Value::Object(map) => {
            for (key, item) in map {
                push_pairs(format!("{prefix}[{key}]"), item, pairs);
            }
        }
    }
}
