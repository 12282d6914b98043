//! Long-lived user token and page token acquisition.
//!
//! Each token is read from its cache entry when still usable and fetched
//! from the Graph API otherwise:
//!
//! ```text
//! short-lived user token --exchange--> long-lived user token (cached 59 days)
//! long-lived user token  --lookup----> page id (static override or /accounts)
//! long-lived user token  --exchange--> page access token (cached, no expiry)
//! ```
//!
//! The service keeps no token state of its own; every getter returns the
//! token by value.

use crate::cache::{CacheError, TokenCache};
use crate::config::PageSelector;
use crate::constants::{
    CACHE_DATE_FORMAT, LONG_TOKEN_CACHE_KEY, LONG_TOKEN_VALID_DAYS, PAGE_TOKEN_CACHE_KEY,
};
use crate::facebook::{FacebookApiError, GraphApi};
use crate::models::{Credentials, LongLivedToken, PageCredentials};
use chrono::{Local, NaiveDate};
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

#[derive(Error, Debug)]
pub enum TokenError {
    #[error(transparent)]
    Cache(CacheError),
    #[error("Corrupt token cache: {0}")]
    CacheCorrupt(String),
    #[error(transparent)]
    Facebook(#[from] FacebookApiError),
    #[error("page not found: {0}")]
    PageNotFound(String),
}

impl From<CacheError> for TokenError {
    fn from(err: CacheError) -> Self {
        match err {
            CacheError::Corrupt { .. } => TokenError::CacheCorrupt(err.to_string()),
            other => TokenError::Cache(other),
        }
    }
}

impl LongLivedToken {
    /// Parses the two-line cache format: issuance date, then token.
    pub fn parse(contents: &str) -> Result<Self, TokenError> {
        let mut lines = contents.lines().map(str::trim);

        let date = lines
            .next()
            .ok_or_else(|| TokenError::CacheCorrupt("missing issuance date".to_string()))?;
        let issued_on = NaiveDate::parse_from_str(date, CACHE_DATE_FORMAT).map_err(|e| {
            TokenError::CacheCorrupt(format!("unparsable issuance date {date:?}: {e}"))
        })?;

        let token = lines
            .next()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| TokenError::CacheCorrupt("missing long-lived token".to_string()))?;

        Ok(Self {
            token: token.to_string(),
            issued_on,
        })
    }

    pub fn serialize(&self) -> String {
        format!("{}\n{}\n", self.issued_on.format(CACHE_DATE_FORMAT), self.token)
    }

    /// Valid while at most `LONG_TOKEN_VALID_DAYS` days have passed since issuance.
    pub fn is_valid_on(&self, today: NaiveDate) -> bool {
        (today - self.issued_on).num_days() <= LONG_TOKEN_VALID_DAYS
    }
}

type Clock = Box<dyn Fn() -> NaiveDate + Send + Sync>;

pub struct TokenService<C, A> {
    credentials: Credentials,
    page: PageSelector,
    cache: C,
    api: A,
    today: Clock,
}

impl<C: TokenCache, A: GraphApi> TokenService<C, A> {
    pub fn new(credentials: Credentials, page: PageSelector, cache: C, api: A) -> Self {
        Self {
            credentials,
            page,
            cache,
            api,
            today: Box::new(|| Local::now().date_naive()),
        }
    }

    /// Replaces the calendar used for the validity window.
    pub fn with_clock(mut self, today: impl Fn() -> NaiveDate + Send + Sync + 'static) -> Self {
        self.today = Box::new(today);
        self
    }

    /// Runs the whole sequence: long-lived token, page id, page token.
    pub async fn acquire(&self) -> Result<PageCredentials, TokenError> {
        let long_token = self.get_long_lived_user_token().await?;
        let page_id = self.get_page_id(&long_token).await?;
        let page_access_token = self.get_page_access_token(&long_token).await?;

        info!(app = %self.credentials.app_name, %page_id, "page credentials ready");
        Ok(PageCredentials {
            page_id,
            page_access_token,
        })
    }

    #[instrument(skip(self), fields(user_id = %self.credentials.user_id))]
    pub async fn get_long_lived_user_token(&self) -> Result<String, TokenError> {
        let today = (self.today)();

        if let Some(contents) = self.cache.read(LONG_TOKEN_CACHE_KEY).await? {
            let cached = LongLivedToken::parse(&contents)?;
            if cached.is_valid_on(today) {
                debug!(issued_on = %cached.issued_on, "using cached long-lived token");
                return Ok(cached.token);
            }
            info!(issued_on = %cached.issued_on, "cached long-lived token expired");
        }

        let token = self
            .api
            .exchange_token(&self.credentials.user_access_token)
            .await
            .map_err(|e| {
                if e.is_invalid_token() {
                    warn!("USER_ACCESS_TOKEN was rejected, generate a new short-lived token");
                }
                e
            })?;

        let fresh = LongLivedToken {
            token,
            issued_on: today,
        };
        self.cache
            .write(LONG_TOKEN_CACHE_KEY, &fresh.serialize())
            .await?;

        info!(
            issued_on = %fresh.issued_on,
            token_len = fresh.token.len(),
            "stored new long-lived token"
        );
        Ok(fresh.token)
    }

    pub async fn get_page_id(&self, long_token: &str) -> Result<String, TokenError> {
        let name = match &self.page {
            PageSelector::Static(id) => return Ok(id.clone()),
            PageSelector::Lookup { name } => name.as_deref(),
        };

        let pages = self
            .api
            .list_pages(&self.credentials.user_id, long_token)
            .await?;

        let page = match name {
            Some(name) => pages
                .into_iter()
                .find(|p| p.name == name)
                .ok_or_else(|| TokenError::PageNotFound(name.to_string()))?,
            None => pages
                .into_iter()
                .next()
                .ok_or_else(|| FacebookApiError::NoPages(self.credentials.user_id.clone()))?,
        };

        debug!(page_id = %page.id, page_name = %page.name, "resolved page");
        Ok(page.id)
    }

    #[instrument(skip(self, long_token))]
    pub async fn get_page_access_token(&self, long_token: &str) -> Result<String, TokenError> {
        if let Some(contents) = self.cache.read(PAGE_TOKEN_CACHE_KEY).await? {
            if let Some(token) = contents.lines().map(str::trim).find(|l| !l.is_empty()) {
                debug!("using cached page access token");
                return Ok(token.to_string());
            }
        }

        let token = self.api.exchange_token(long_token).await?;
        self.cache.write(PAGE_TOKEN_CACHE_KEY, &token).await?;

        info!(token_len = token.len(), "stored new page access token");
        Ok(token)
    }
}
