use crate::api::ContactApiClient;
use crate::credentials::CredentialContext;
use crate::gateway::HttpGateway;
use crate::settings::IntegrationSettings;
use url::Url;
use wiremock::MockServer;

pub fn credentials() -> CredentialContext {
    CredentialContext::new("user", "secret", "client", "db").unwrap()
}

pub fn settings() -> IntegrationSettings {
    IntegrationSettings {
        api_key: "secret".into(),
        api_user: "user".into(),
        bdc_client: "client".into(),
        bdc_database: "db".into(),
        status: true,
    }
}

pub fn base_url(server: &MockServer) -> Url {
    Url::parse(&server.uri()).unwrap()
}

pub fn gateway(server: &MockServer) -> HttpGateway {
    HttpGateway::new(base_url(server), credentials())
}

pub fn api_client(server: &MockServer) -> ContactApiClient {
    ContactApiClient::new(gateway(server))
}
