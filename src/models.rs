use chrono::NaiveDate;
use serde::Deserialize;
use std::fmt;

/// App and user identity used for every token exchange.
#[derive(Clone)]
pub struct Credentials {
    pub app_name: String,
    pub app_id: String,
    pub app_secret: String,
    pub user_id: String,
    pub user_access_token: String, // short-lived, valid about one day
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("app_name", &self.app_name)
            .field("app_id", &self.app_id)
            .field("app_secret", &"[REDACTED]")
            .field("user_id", &self.user_id)
            .field("user_access_token", &"[REDACTED]")
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LongLivedToken {
    pub token: String,
    pub issued_on: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageCredentials {
    pub page_id: String,
    pub page_access_token: String,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct PageAccount {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

/// Body of `{user-id}/accounts`.
#[derive(Debug, Deserialize)]
pub struct AccountsResponse {
    #[serde(default)]
    pub data: Option<Vec<PageAccount>>,
    pub error: Option<GraphError>,
}

/// Body of `oauth/access_token`: either a token or a Graph error envelope.
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: Option<String>,
    pub error: Option<GraphError>,
}

#[derive(Debug, Deserialize)]
pub struct GraphError {
    pub message: String,
    #[serde(default)]
    pub code: Option<i64>,
}
