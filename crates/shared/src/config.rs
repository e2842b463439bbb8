//! Application configuration management.

use std::path::PathBuf;

use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// JWT configuration.
    pub jwt: JwtSettings,
    /// Exchange rate configuration.
    #[serde(default)]
    pub currency: CurrencyConfig,
    /// Invoice rendering configuration.
    #[serde(default)]
    pub invoice: InvoiceConfig,
    /// Object storage configuration.
    #[serde(default)]
    pub storage: StorageSettings,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

/// JWT configuration as read from config sources.
#[derive(Debug, Clone, Deserialize)]
pub struct JwtSettings {
    /// Secret key shared with the identity provider.
    pub secret: String,
    /// Access token expiration in seconds.
    #[serde(default = "default_access_token_expiry")]
    pub access_token_expiry_secs: u64,
}

fn default_access_token_expiry() -> u64 {
    3600 // 1 hour
}

/// Exchange rate source and refresh policy.
#[derive(Debug, Clone, Deserialize)]
pub struct CurrencyConfig {
    /// Endpoint returning `{"rates": {...}}` keyed by the base currency.
    #[serde(default = "default_rate_api_url")]
    pub api_url: String,
    /// Minimum wait after a failed fetch before the next attempt.
    #[serde(default = "default_retry_after_failure_secs")]
    pub retry_after_failure_secs: u64,
    /// Minimum age of the cached table before a refresh re-fetches.
    #[serde(default = "default_refresh_interval_hours")]
    pub refresh_interval_hours: u64,
    /// Timeout for a single rate fetch.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// How often the background task checks whether a refresh is due.
    #[serde(default = "default_background_tick_secs")]
    pub background_tick_secs: u64,
}

impl Default for CurrencyConfig {
    fn default() -> Self {
        Self {
            api_url: default_rate_api_url(),
            retry_after_failure_secs: default_retry_after_failure_secs(),
            refresh_interval_hours: default_refresh_interval_hours(),
            request_timeout_secs: default_request_timeout_secs(),
            background_tick_secs: default_background_tick_secs(),
        }
    }
}

fn default_rate_api_url() -> String {
    "https://open.er-api.com/v6/latest/SGD".to_string()
}

fn default_retry_after_failure_secs() -> u64 {
    60
}

fn default_refresh_interval_hours() -> u64 {
    24
}

fn default_request_timeout_secs() -> u64 {
    10
}

fn default_background_tick_secs() -> u64 {
    3600
}

/// Invoice rendering configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InvoiceConfig {
    /// Optional `.xlsx` template; the built-in layout is used when unset.
    #[serde(default)]
    pub template_path: Option<PathBuf>,
    /// Storage prefix for generated invoices.
    #[serde(default = "default_output_prefix")]
    pub output_prefix: String,
}

fn default_output_prefix() -> String {
    "invoices".to_string()
}

/// Object store behind profile images and invoices.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    /// Directory on the local filesystem.
    #[default]
    Local,
    /// S3-compatible bucket.
    S3,
}

/// Object storage configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageSettings {
    /// Which backend to use.
    #[serde(default)]
    pub backend: StorageBackend,
    /// Root directory for the local filesystem provider.
    #[serde(default = "default_storage_root")]
    pub root: PathBuf,
    /// Bucket settings, required when `backend` is `s3`.
    #[serde(default)]
    pub s3: Option<S3Settings>,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            root: default_storage_root(),
            s3: None,
        }
    }
}

/// S3-compatible bucket (AWS, Cloudflare R2, Supabase, DigitalOcean Spaces).
#[derive(Clone, Deserialize)]
pub struct S3Settings {
    /// Endpoint URL.
    pub endpoint: String,
    /// Bucket name.
    pub bucket: String,
    /// Access key id.
    pub access_key_id: String,
    /// Secret access key.
    pub secret_access_key: String,
    /// Region; R2 accepts `auto`.
    #[serde(default = "default_s3_region")]
    pub region: String,
}

impl std::fmt::Debug for S3Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3Settings")
            .field("endpoint", &self.endpoint)
            .field("bucket", &self.bucket)
            .field("access_key_id", &"[hidden]")
            .field("secret_access_key", &"[hidden]")
            .field("region", &self.region)
            .finish()
    }
}

fn default_s3_region() -> String {
    "auto".to_string()
}

fn default_storage_root() -> PathBuf {
    PathBuf::from("./data")
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("ORDERDESK").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}
