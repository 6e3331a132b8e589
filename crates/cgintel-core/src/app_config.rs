use std::net::SocketAddr;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    /// Static admin secret. `None` only allowed in development.
    pub admin_token: Option<String>,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    pub scraper_request_timeout_secs: u64,
    pub scraper_user_agent: String,
    pub scraper_inter_request_delay_ms: u64,
    pub obf_base_url: String,
    pub amazon_base_url: String,
    /// Vendor column written into the Shopify export.
    pub store_vendor: String,
}

impl AppConfig {
    #[must_use]
    pub fn is_development(&self) -> bool {
        self.env == Environment::Development
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("database_url", &"[redacted]")
            .field("admin_token", &self.admin_token.as_ref().map(|_| "[redacted]"))
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field(
                "scraper_request_timeout_secs",
                &self.scraper_request_timeout_secs,
            )
            .field("scraper_user_agent", &self.scraper_user_agent)
            .field(
                "scraper_inter_request_delay_ms",
                &self.scraper_inter_request_delay_ms,
            )
            .field("obf_base_url", &self.obf_base_url)
            .field("amazon_base_url", &self.amazon_base_url)
            .field("store_vendor", &self.store_vendor)
            .finish()
    }
}
