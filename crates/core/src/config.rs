use anyhow::{Context, Result};
use std::env;

pub const API_TOKEN_VAR: &str = "NETLIFY_API_KEY";
pub const API_BASE_VAR: &str = "NETLIFY_API_BASE";
pub const ADMIN_BASE_VAR: &str = "NETLIFY_ADMIN_BASE";
pub const CLEANUP_VAR: &str = "SITEDROP_CLEANUP_ON_FAILURE";

pub const DEFAULT_API_BASE: &str = "https://api.netlify.com/api/v1";
pub const DEFAULT_ADMIN_BASE: &str = "https://app.netlify.com/sites";

/// Deploy configuration, read once and handed to the handler
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployConfig {
    /// Bearer credential; `None` makes every deploy fail with a configuration error
    pub api_token: Option<String>,
    pub api_base: String,
    pub admin_base: String,
    /// Delete the freshly created site when its upload fails
    pub cleanup_on_failure: bool,
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            api_token: None,
            api_base: DEFAULT_API_BASE.to_string(),
            admin_base: DEFAULT_ADMIN_BASE.to_string(),
            cleanup_on_failure: false,
        }
    }
}

impl DeployConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from any key lookup (useful for testing)
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_blank = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let cleanup_on_failure = match non_blank(CLEANUP_VAR) {
            Some(raw) => parse_flag(&raw)
                .with_context(|| format!("{CLEANUP_VAR} must be true or false, got {raw:?}"))?,
            None => false,
        };

        Ok(Self {
            api_token: non_blank(API_TOKEN_VAR).map(|v| v.trim().to_string()),
            api_base: non_blank(API_BASE_VAR)
                .map(|v| v.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            admin_base: non_blank(ADMIN_BASE_VAR)
                .map(|v| v.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_ADMIN_BASE.to_string()),
            cleanup_on_failure,
        })
    }

    pub fn with_api_token(mut self, token: impl Into<String>) -> Self {
        self.api_token = Some(token.into());
        self
    }

    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = base.into().trim_end_matches('/').to_string();
        self
    }

    /// Admin console URL for a site, keyed by the name the caller typed
    pub fn admin_url(&self, website_name: &str) -> String {
        format!("{}/{}", self.admin_base, website_name)
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
