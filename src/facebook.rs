use crate::config::Config;
use crate::constants::{
    EXCHANGE_GRANT_TYPE,
    FACEBOOK_API_VERSION,
    FB_PAGE_FIELDS,
    TOKEN_EXCHANGE_PATH,
    TRANSIENT_RETRIES,
};
use crate::models::{AccountsResponse, PageAccount, TokenResponse};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum FacebookApiError {
    #[error("API request failed: {0}")]
    RequestFailed(String),
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
    #[error("Graph API error: {message}")]
    Api { message: String, code: Option<i64> },
    #[error("no pages found for user {0}")]
    NoPages(String),
}

impl FacebookApiError {
    /// Graph code 190: the access token is expired, revoked or malformed.
    pub fn is_invalid_token(&self) -> bool {
        matches!(self, FacebookApiError::Api { code: Some(190), .. })
    }
}

/// The two Graph API calls token acquisition depends on.
#[async_trait]
pub trait GraphApi: Send + Sync {
    /// Trades `token` for a longer-lived one through `oauth/access_token`.
    async fn exchange_token(&self, token: &str) -> Result<String, FacebookApiError>;

    /// Lists the pages `user_id` manages. Never returns an empty list.
    async fn list_pages(
        &self,
        user_id: &str,
        access_token: &str,
    ) -> Result<Vec<PageAccount>, FacebookApiError>;
}

pub struct FacebookAPI {
    client: Client,
    app_id: String,
    app_secret: String,
    base_url: String,
}

impl FacebookAPI {
    pub fn new(config: &Config) -> Result<Self, FacebookApiError> {
        let client = Client::builder()
            .timeout(config.http_timeout)
            .user_agent(config.credentials.app_name.clone())
            .build()
            .map_err(|e| FacebookApiError::RequestFailed(e.to_string()))?;

        Ok(Self {
            client,
            app_id: config.credentials.app_id.clone(),
            app_secret: config.credentials.app_secret.clone(),
            base_url: config.graph_url.clone(),
        })
    }

    /// GET with a single retry on connect errors and timeouts.
    async fn get(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<(StatusCode, String), FacebookApiError> {
        let mut attempt = 0;
        loop {
            match self.client.get(url).query(query).send().await {
                Ok(response) => {
                    let status = response.status();
                    let body = response.text().await.map_err(|e| {
                        FacebookApiError::InvalidResponse(e.without_url().to_string())
                    })?;
                    debug!(%url, %status, "Graph API responded");
                    return Ok((status, body));
                }
                Err(e) if attempt < TRANSIENT_RETRIES && (e.is_connect() || e.is_timeout()) => {
                    attempt += 1;
                    // Query strings carry the app secret, keep the URL out of logs
                    warn!(
                        %url,
                        attempt,
                        error = %e.without_url(),
                        "transient request failure, retrying"
                    );
                }
                Err(e) => {
                    return Err(FacebookApiError::RequestFailed(
                        e.without_url().to_string(),
                    ))
                }
            }
        }
    }
}

#[async_trait]
impl GraphApi for FacebookAPI {
    async fn exchange_token(&self, token: &str) -> Result<String, FacebookApiError> {
        let url = format!("{}/{}", self.base_url, TOKEN_EXCHANGE_PATH);

        let (status, body) = self
            .get(
                &url,
                &[
                    ("grant_type", EXCHANGE_GRANT_TYPE),
                    ("client_id", self.app_id.as_str()),
                    ("client_secret", self.app_secret.as_str()),
                    ("fb_exchange_token", token),
                ],
            )
            .await?;

        parse_token_response(status, &body)
    }

    async fn list_pages(
        &self,
        user_id: &str,
        access_token: &str,
    ) -> Result<Vec<PageAccount>, FacebookApiError> {
        let url = format!(
            "{}/{}/{}/accounts",
            self.base_url, FACEBOOK_API_VERSION, user_id
        );

        let (status, body) = self
            .get(
                &url,
                &[("access_token", access_token), ("fields", FB_PAGE_FIELDS)],
            )
            .await?;

        parse_accounts_response(user_id, status, &body)
    }
}

/// A token wins over everything, then the Graph error message, then the HTTP status.
pub fn parse_token_response(status: StatusCode, body: &str) -> Result<String, FacebookApiError> {
    match serde_json::from_str::<TokenResponse>(body) {
        Ok(TokenResponse {
            access_token: Some(token),
            ..
        }) if !token.is_empty() => Ok(token),
        Ok(TokenResponse {
            error: Some(error), ..
        }) => Err(FacebookApiError::Api {
            message: error.message,
            code: error.code,
        }),
        Ok(_) | Err(_) if !status.is_success() => Err(FacebookApiError::RequestFailed(format!(
            "Graph API returned {}: {}",
            status, body
        ))),
        Ok(_) => Err(FacebookApiError::InvalidResponse(
            "missing access_token".to_string(),
        )),
        Err(e) => Err(FacebookApiError::InvalidResponse(e.to_string())),
    }
}

pub fn parse_accounts_response(
    user_id: &str,
    status: StatusCode,
    body: &str,
) -> Result<Vec<PageAccount>, FacebookApiError> {
    match serde_json::from_str::<AccountsResponse>(body) {
        Ok(AccountsResponse {
            error: Some(error), ..
        }) => Err(FacebookApiError::Api {
            message: error.message,
            code: error.code,
        }),
        Ok(_) | Err(_) if !status.is_success() => Err(FacebookApiError::RequestFailed(format!(
            "Graph API returned {}: {}",
            status, body
        ))),
        Ok(AccountsResponse { data, .. }) => match data {
            Some(pages) if !pages.is_empty() => Ok(pages),
            _ => Err(FacebookApiError::NoPages(user_id.to_string())),
        },
        Err(e) => Err(FacebookApiError::InvalidResponse(e.to_string())),
    }
}
