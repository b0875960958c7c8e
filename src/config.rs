use std::fmt;
use std::time::Duration;

use clap::Args;

/// Marketing Cloud connection settings, read from flags or the environment.
#[derive(Args, Clone)]
pub struct ApiConfig {
    /// Installed package client id
    #[arg(long, env = "SFMC_CLIENT_ID")]
    pub client_id: String,

    /// Installed package client secret
    #[arg(long, env = "SFMC_CLIENT_SECRET", hide_env_values = true)]
    pub client_secret: String,

    /// OAuth token endpoint
    #[arg(long, env = "SFMC_AUTH_URL")]
    pub auth_url: String,

    /// REST base URL of the tenant
    #[arg(long, env = "SFMC_BASE_URL")]
    pub base_url: String,

    /// External key of the Data Extension to report on
    #[arg(long = "de-key", env = "SFMC_DE_KEY")]
    pub data_extension_key: String,

    /// HTTP timeout for each request, in seconds
    #[arg(long, env = "SFMC_TIMEOUT_SECS", default_value_t = 30)]
    pub timeout_secs: u64,
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }

    pub fn rowset_url(&self) -> String {
        format!(
            "{}/data/v1/customobjectdata/key/{}/rowset",
            self.base_url.trim_end_matches('/'),
            self.data_extension_key
        )
    }
}

impl fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("auth_url", &self.auth_url)
            .field("base_url", &self.base_url)
            .field("data_extension_key", &self.data_extension_key)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}
