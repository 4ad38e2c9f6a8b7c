// keep in sync with api.rs of backend
use common::{
    req::{
        FeedQuery, LoginRequest, LoginResponse, MessageResponse, RegisterRequest, SessionInfo,
        StationFeed, StationInfo,
    },
    session::SessionMarker,
};
use reqwest::{
    header::{ACCEPT, AUTHORIZATION},
    RequestBuilder,
};
use serde::de::DeserializeOwned;

const FALLBACK_HOST: &str = "http://127.0.0.1:8081";

#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    /// The backend answered with an error status and a message.
    #[error("{message}")]
    Api { status: u16, message: String },
    #[error("Connection error. Is the server running?")]
    Network(#[from] reqwest::Error),
}

impl RequestError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Api { status: 401, .. })
    }

    /// Unknown account or wrong password.
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, Self::Api { status: 401 | 404, .. })
    }
}

pub type Result<T> = std::result::Result<T, RequestError>;

fn api_url(endpoint: &str) -> String {
    let host_url = host_url();
    format!("{host_url}/{endpoint}")
}

// the backend listens on 8081 of the host that served the app
fn host_url() -> String {
    let Some(location) = web_sys::window().map(|w| w.location()) else {
        return FALLBACK_HOST.to_owned();
    };
    match (location.protocol(), location.hostname()) {
        (Ok(protocol), Ok(hostname)) => format!("{protocol}//{hostname}:8081"),
        _ => FALLBACK_HOST.to_owned(),
    }
}

async fn send<T: DeserializeOwned>(request: RequestBuilder) -> Result<T> {
    let resp = request.header(ACCEPT, "application/json").send().await?;
    let status = resp.status();

    if status.is_success() {
        return Ok(resp.json::<T>().await?);
    }

    let message = match resp.json::<MessageResponse>().await {
        Ok(body) => body.message,
        Err(_) => status
            .canonical_reason()
            .unwrap_or("Request failed")
            .to_owned(),
    };
    Err(RequestError::Api {
        status: status.as_u16(),
        message,
    })
}

fn authorized(request: RequestBuilder, marker: &SessionMarker) -> RequestBuilder {
    request.header(AUTHORIZATION, marker.authorization())
}

pub async fn register(form: &RegisterRequest) -> Result<MessageResponse> {
    let client = reqwest::Client::new();
    send(client.post(api_url("register")).json(form)).await
}

pub async fn login(form: &LoginRequest) -> Result<LoginResponse> {
    let client = reqwest::Client::new();
    send(client.post(api_url("login")).json(form)).await
}

pub async fn logout(marker: &SessionMarker) -> Result<MessageResponse> {
    let client = reqwest::Client::new();
    send(authorized(client.post(api_url("logout")), marker)).await
}

pub async fn session(marker: &SessionMarker) -> Result<SessionInfo> {
    let client = reqwest::Client::new();
    send(authorized(client.get(api_url("api/session")), marker)).await
}

pub async fn stations() -> Result<Vec<StationInfo>> {
    let client = reqwest::Client::new();
    send(client.get(api_url("api/stations"))).await
}

pub async fn feeds(marker: &SessionMarker, query: &FeedQuery) -> Result<StationFeed> {
    let client = reqwest::Client::new();
    send(authorized(client.get(api_url("api/feeds")), marker).query(query)).await
}
