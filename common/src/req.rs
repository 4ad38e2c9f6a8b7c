// request and response bodies of the backend api, shared with the frontend
use chrono::{DateTime, Utc};

use crate::feed::{FeedReport, LooseNumber};

/// `POST /register`. Every field is optional on the wire so that missing
/// fields surface as a validation error instead of a decode failure.
#[derive(Debug, Clone, Default, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RegisterRequest {
    pub user_name: Option<String>,
    pub school_email: Option<String>,
    pub phone_number: Option<String>,
    pub address: Option<String>,
    pub lat: Option<LooseNumber>,
    pub lon: Option<LooseNumber>,
    pub password: Option<String>,
}

/// `POST /login`. `user_id` is the account email.
#[derive(Debug, Clone, Default, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoginRequest {
    pub user_id: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    pub user_name: Option<String>,
    pub school_email: String,
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub message: String,
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub user: UserInfo,
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfo {
    pub user: UserInfo,
    pub expires_at: DateTime<Utc>,
}

/// Body of every non-data response, errors included.
#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
pub struct StationInfo {
    pub location: String,
}

/// Query of `GET /api/feeds`.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
pub struct FeedQuery {
    pub location: String,
    pub date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub results: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct StationFeed {
    pub location: String,
    #[serde(flatten)]
    pub report: FeedReport,
}
