use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::AdminError;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub list: ListSettings,
    pub server: ServerConfig,
    pub admin: AdminCredentials,
}

/// Where the admin client sends its requests
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub base_url: Option<String>,
    pub timeout_ms: u64,
}

/// Paging and input timing shared by every list page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListSettings {
    pub page_size: u32,
    pub debounce_ms: u64,
    pub tab_snapshot_limit: u32,
}

/// Bind address of the mock backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Credentials accepted by the mock backend's `/login`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminCredentials {
    pub email: String,
    pub password: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout_ms: 10_000,
        }
    }
}

impl Default for ListSettings {
    fn default() -> Self {
        Self {
            page_size: 15,
            debounce_ms: 400,
            tab_snapshot_limit: 15,
        }
    }
}

impl ListSettings {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.max(1);
        self
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3001,
        }
    }
}

impl Default for AdminCredentials {
    fn default() -> Self {
        Self {
            email: "admin@guinness.local".to_string(),
            password: "admin123".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from defaults, an optional `config` file and `GUINNESS_*` variables
    ///
    /// Nested keys use a double underscore, e.g. `GUINNESS_LIST__PAGE_SIZE=20`.
    pub fn load() -> anyhow::Result<Self> {
        let mut config = config::Config::builder();

        config = config.add_source(config::Config::try_from(&AppConfig::default())?);

        config = config.add_source(config::File::with_name("config").required(false));

        config = config.add_source(
            config::Environment::with_prefix("GUINNESS")
                .separator("__")
                .prefix_separator("_"),
        );

        let config = config.build()?;
        let app_config: AppConfig = config.try_deserialize()?;

        Ok(app_config)
    }

    /// The backend base URL without trailing slashes
    pub fn api_base_url(&self) -> Result<String, AdminError> {
        normalize_base_url(self.api.base_url.as_deref().unwrap_or_default())
    }

    pub fn api_timeout(&self) -> Duration {
        Duration::from_millis(self.api.timeout_ms.max(250))
    }

    /// Get the server bind address
    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

pub fn normalize_base_url(base_url: &str) -> Result<String, AdminError> {
    let trimmed = base_url.trim();
    if trimmed.is_empty() {
        return Err(AdminError::Config(
            "api.base_url is not defined. Set GUINNESS_API__BASE_URL in your environment.".to_string(),
        ));
    }
    Ok(trimmed.trim_end_matches('/').to_string())
}
