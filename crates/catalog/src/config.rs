use std::time::Duration;

/// Default catalog base URL for local development.
pub const DEFAULT_CATALOG_URL: &str = "http://tutorialcenter-back.test";

/// Catalog client configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    /// Base URL of the catalog service, without the `/api` suffix.
    pub base_url: String,
    /// Per-request timeout in seconds (default: `10`).
    pub request_timeout_secs: u64,
}

impl CatalogConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                           |
    /// |------------------------|-----------------------------------|
    /// | `CATALOG_API_URL`      | `http://tutorialcenter-back.test` |
    /// | `CATALOG_TIMEOUT_SECS` | `10`                              |
    pub fn from_env() -> Self {
        let base_url =
            std::env::var("CATALOG_API_URL").unwrap_or_else(|_| DEFAULT_CATALOG_URL.into());

        let request_timeout_secs: u64 = std::env::var("CATALOG_TIMEOUT_SECS")
            .unwrap_or_else(|_| "10".into())
            .parse()
            .expect("CATALOG_TIMEOUT_SECS must be a valid u64");

        Self {
            base_url,
            request_timeout_secs,
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_CATALOG_URL.to_string(),
            request_timeout_secs: 10,
        }
    }
}
