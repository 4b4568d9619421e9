//! HTTP surface the host form platform talks to.
use crate::config::Config;
use crate::feed::{FeedConfig, SubmissionRecord};
use crate::settings::{
    FileSettingsStore, SETTINGS_DISCARDED, SettingsError, SettingsInput, SettingsManager,
    SettingsStore,
};
use crate::sync::{ResultSink, SyncOrchestrator, SyncReport};
use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::net::TcpListener;

#[derive(thiserror::Error, Debug)]
pub enum ServiceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Settings error: {0}")]
    Settings(#[from] SettingsError),
}

#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<SettingsManager>,
    pub orchestrator: Arc<SyncOrchestrator>,
}

pub async fn serve(config: Config, sink: Arc<dyn ResultSink>) -> Result<(), ServiceError> {
    let store: Arc<dyn SettingsStore> = Arc::new(FileSettingsStore::new(&config.settings.path));
    let state = AppState {
        settings: Arc::new(SettingsManager::new(
            store,
            config.brightdoor.base_url.clone(),
        )),
        orchestrator: Arc::new(SyncOrchestrator::new(config.brightdoor.base_url.clone(), sink)),
    };

    let addr = format!("{}:{}", config.listener.host, config.listener.port);
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "Listening");

    axum::serve(listener, router(state)).await?;
    Ok(())
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/notify", post(notify))
        .route("/settings", post(save_settings).delete(disconnect))
        .route("/custom-fields", get(custom_fields))
        .route("/health", get(health))
        .route("/ready", get(ready))
        .with_state(state)
}

#[derive(Deserialize, Debug)]
struct NotifyRequest {
    feed: FeedConfig,
    submission: SubmissionRecord,
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
pub struct StatusResponse {
    pub status: bool,
    pub message: String,
}

#[derive(Serialize)]
struct ApiErrorResponse {
    error_message: String,
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        tracing::error!(error = %self, "Request failed");
        let body = Json(ApiErrorResponse {
            error_message: self.to_string(),
        });
        (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
    }
}

async fn notify(
    State(state): State<AppState>,
    Json(request): Json<NotifyRequest>,
) -> Result<Json<SyncReport>, ServiceError> {
    let settings = state.settings.snapshot()?;
    let outcome = state
        .orchestrator
        .notify(&settings, &request.feed, &request.submission)
        .await;
    Ok(Json(outcome.report))
}

async fn save_settings(
    State(state): State<AppState>,
    Json(input): Json<SettingsInput>,
) -> Result<Response, ServiceError> {
    let outcome = state.settings.save(input).await?;
    let code = if outcome.status() {
        StatusCode::OK
    } else {
        StatusCode::BAD_REQUEST
    };
    let body = Json(StatusResponse {
        status: outcome.status(),
        message: outcome.message().to_string(),
    });
    Ok((code, body).into_response())
}

async fn disconnect(State(state): State<AppState>) -> Result<Json<StatusResponse>, ServiceError> {
    state.settings.disconnect().await?;
    Ok(Json(StatusResponse {
        status: false,
        message: SETTINGS_DISCARDED.to_string(),
    }))
}

async fn custom_fields(
    State(state): State<AppState>,
) -> Result<Json<IndexMap<String, String>>, ServiceError> {
    Ok(Json(state.settings.custom_fields().await?))
}

async fn health() -> &'static str {
    "ok"
}

async fn ready(State(state): State<AppState>) -> Result<StatusCode, ServiceError> {
    Ok(if state.settings.is_configured()? {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{IntegrationSettings, MemorySettingsStore};
    use crate::sync::{LogSink, SKIPPED_NO_EMAIL, SYNCED, SyncStatus};
    use crate::testutils::{base_url, settings};
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    struct TestService {
        url: String,
        store: Arc<MemorySettingsStore>,
        client: reqwest::Client,
    }

    async fn spawn_service(server: &MockServer, settings: IntegrationSettings) -> TestService {
        let store = Arc::new(MemorySettingsStore::new(settings));
        let state = AppState {
            settings: Arc::new(SettingsManager::new(store.clone(), base_url(server))),
            orchestrator: Arc::new(SyncOrchestrator::new(base_url(server), Arc::new(LogSink))),
        };

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router(state)).await.unwrap();
        });

        TestService {
            url: format!("http://{addr}"),
            store,
            client: reqwest::Client::new(),
        }
    }

    #[tokio::test]
    async fn health_and_ready() {
        let server = MockServer::start().await;
        let service = spawn_service(&server, IntegrationSettings::default()).await;

        let health = service
            .client
            .get(format!("{}/health", service.url))
            .send()
            .await
            .unwrap();
        assert_eq!(health.status(), 200);
        assert_eq!(health.text().await.unwrap(), "ok");

        let ready = service
            .client
            .get(format!("{}/ready", service.url))
            .send()
            .await
            .unwrap();
        assert_eq!(ready.status(), 503);

        service.store.store(&settings()).unwrap();
        let ready = service
            .client
            .get(format!("{}/ready", service.url))
            .send()
            .await
            .unwrap();
        assert_eq!(ready.status(), 200);
    }

    #[tokio::test]
    async fn notify_creates_contact() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/Contact/CreateOrUpdate"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {"id": 9}})))
            .expect(1)
            .mount(&server)
            .await;
        let service = spawn_service(&server, settings()).await;

        let report: SyncReport = service
            .client
            .post(format!("{}/notify", service.url))
            .json(&json!({
                "feed": {"name": "Contact", "emailAddress": "email", "firstName": "Jo"},
                "submission": {"email": "jo@example.com"},
            }))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();

        assert_eq!(report.status, SyncStatus::Success);
        assert_eq!(report.message, SYNCED);
    }

    #[tokio::test]
    async fn notify_without_email_is_skipped() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;
        let service = spawn_service(&server, settings()).await;

        let response = service
            .client
            .post(format!("{}/notify", service.url))
            .json(&json!({
                "feed": {"emailAddress": "email"},
                "submission": {"email": "not-an-email"},
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
        let report: SyncReport = response.json().await.unwrap();
        assert_eq!(report.status, SyncStatus::Skipped);
        assert_eq!(report.message, SKIPPED_NO_EMAIL);
    }

    #[tokio::test]
    async fn save_settings_responses() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/Contact/GetPortalGreetings"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
            .mount(&server)
            .await;
        let service = spawn_service(&server, IntegrationSettings::default()).await;

        let response = service
            .client
            .post(format!("{}/settings", service.url))
            .json(&json!({
                "apiKey": "secret",
                "apiUser": "user",
                "bdcClient": "client",
                "bdcDatabase": "db",
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
        let body: StatusResponse = response.json().await.unwrap();
        assert_eq!(
            body,
            StatusResponse {
                status: true,
                message: "Your settings has been updated!".into(),
            }
        );
        assert!(service.store.load().unwrap().status);

        let response = service
            .client
            .post(format!("{}/settings", service.url))
            .json(&json!({"apiUser": "user"}))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 400);
        let body: StatusResponse = response.json().await.unwrap();
        assert!(!body.status);
        assert_eq!(body.message, "Your settings have been discarded");
        assert_eq!(service.store.load().unwrap(), IntegrationSettings::default());
    }

    #[tokio::test]
    async fn disconnect_route() {
        let server = MockServer::start().await;
        let service = spawn_service(&server, settings()).await;

        let response = service
            .client
            .delete(format!("{}/settings", service.url))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 200);

        let stored = service.store.load().unwrap();
        assert_eq!(stored.api_key, "");
        assert!(!stored.status);
    }

    #[tokio::test]
    async fn custom_fields_route() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/Contact/GetContactById"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {"contactAttributes": [
                    {"contactAttributeDefId": 3, "contactAttributeDefLbl": "Honorific"}
                ]}
            })))
            .mount(&server)
            .await;
        let service = spawn_service(&server, settings()).await;

        let fields: serde_json::Value = service
            .client
            .get(format!("{}/custom-fields", service.url))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(fields, json!({"3": "Honorific"}));
    }
}
