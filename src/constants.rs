// API Versions
pub const FACEBOOK_API_VERSION: &str = "v20.0";

// API Base URLs
pub const FACEBOOK_BASE_URL: &str = "https://graph.facebook.com";
pub const TOKEN_EXCHANGE_PATH: &str = "oauth/access_token";
pub const EXCHANGE_GRANT_TYPE: &str = "fb_exchange_token";

// Cache keys (file names under the cache directory)
pub const LONG_TOKEN_CACHE_KEY: &str = "storage_long_token.txt";
pub const PAGE_TOKEN_CACHE_KEY: &str = "permanent_page_access_token.txt";
pub const DEFAULT_CACHE_DIR: &str = ".";

// Token lifetimes
pub const LONG_TOKEN_VALID_DAYS: i64 = 59; // issued tokens live 60 days
pub const CACHE_DATE_FORMAT: &str = "%Y-%m-%d";

// HTTP Settings
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;
pub const TRANSIENT_RETRIES: u32 = 1;

// Graph API Fields
pub const FB_PAGE_FIELDS: &str = "id,name";
