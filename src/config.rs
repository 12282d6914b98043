use crate::constants::{DEFAULT_CACHE_DIR, DEFAULT_HTTP_TIMEOUT_SECS, FACEBOOK_BASE_URL};
use crate::models::Credentials;
use dotenv::dotenv;
use std::collections::HashMap;
use std::env;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use url::Url;

const APP_NAME: &str = "APP_NAME";
const APP_ID: &str = "APP_ID";
const USER_ID: &str = "USER_ID";
const APP_SECRET: &str = "APP_SECRET";
const USER_ACCESS_TOKEN: &str = "USER_ACCESS_TOKEN";
const PAGE_ID: &str = "PAGE_ID";
const PAGE_NAME: &str = "PAGE_NAME";
const TOKEN_CACHE_DIR: &str = "TOKEN_CACHE_DIR";
const FACEBOOK_GRAPH_URL: &str = "FACEBOOK_GRAPH_URL";
const HTTP_TIMEOUT_SECS: &str = "HTTP_TIMEOUT_SECS";

const KNOWN_KEYS: [&str; 10] = [
    APP_NAME,
    APP_ID,
    USER_ID,
    APP_SECRET,
    USER_ACCESS_TOKEN,
    PAGE_ID,
    PAGE_NAME,
    TOKEN_CACHE_DIR,
    FACEBOOK_GRAPH_URL,
    HTTP_TIMEOUT_SECS,
];

/// How the target page is identified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageSelector {
    /// Fixed page id, no lookup.
    Static(String),
    /// Resolve through the user's account list, optionally matching a page name.
    Lookup { name: Option<String> },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub credentials: Credentials,
    pub page: PageSelector,
    pub cache_dir: PathBuf,
    pub graph_url: String,
    pub http_timeout: Duration,
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Environment variable not found: {0}")]
    MissingEnv(String),
    #[error("Invalid Graph API URL: {0}")]
    InvalidUrl(String),
    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv().ok();

        let vars: HashMap<String, String> = KNOWN_KEYS
            .iter()
            .filter_map(|key| env::var(key).ok().map(|value| (key.to_string(), value)))
            .collect();

        Self::from_map(&vars)
    }

    /// Builds the configuration from named entries. Blank values count as unset.
    pub fn from_map(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let lookup = |key: &str| {
            vars.get(key)
                .map(|v| v.trim())
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };
        let required =
            |key: &str| lookup(key).ok_or_else(|| ConfigError::MissingEnv(key.to_string()));

        let credentials = Credentials {
            app_name: lookup(APP_NAME).unwrap_or_else(|| env!("CARGO_PKG_NAME").to_string()),
            app_id: required(APP_ID)?,
            app_secret: required(APP_SECRET)?,
            user_id: required(USER_ID)?,
            user_access_token: required(USER_ACCESS_TOKEN)?,
        };

        let page = match lookup(PAGE_ID) {
            Some(id) => PageSelector::Static(id),
            None => PageSelector::Lookup {
                name: lookup(PAGE_NAME),
            },
        };

        let graph_url =
            lookup(FACEBOOK_GRAPH_URL).unwrap_or_else(|| FACEBOOK_BASE_URL.to_string());
        Url::parse(&graph_url).map_err(|e| ConfigError::InvalidUrl(e.to_string()))?;

        let http_timeout = match lookup(HTTP_TIMEOUT_SECS) {
            Some(raw) => match raw.parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => {
                    return Err(ConfigError::InvalidValue {
                        key: HTTP_TIMEOUT_SECS.to_string(),
                        value: raw,
                    })
                }
            },
            None => Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
        };

        let cache_dir = lookup(TOKEN_CACHE_DIR).unwrap_or_else(|| DEFAULT_CACHE_DIR.to_string());

        Ok(Self {
            credentials,
            page,
            cache_dir: PathBuf::from(cache_dir),
            graph_url: graph_url.trim_end_matches('/').to_string(),
            http_timeout,
        })
    }
}
